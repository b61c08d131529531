use super::{DeviceProfile, InputProperty, RawAxisInfo};
use crate::input::event::{
    ABS_MT_POSITION_X, ABS_MT_POSITION_Y, ABS_MT_PRESSURE, ABS_MT_SLOT, ABS_MT_TOUCH_MAJOR,
    ABS_MT_TRACKING_ID, INPUT_EVENT_SIZE_64,
};

/// reMarkable Paper Pro touch panel.
///
/// Display: 1620×2160 pixels (11.8", 229 dpi), aarch64 so events are 24 bytes.
pub fn rmpp() -> DeviceProfile {
    let mut profile = DeviceProfile::new("reMarkable Paper Pro touch")
        .with_display(1620, 2160)
        .with_property(InputProperty::Direct)
        .with_axis(ABS_MT_SLOT, RawAxisInfo::new(0, 9))
        .with_axis(ABS_MT_TOUCH_MAJOR, RawAxisInfo::new(0, 255))
        .with_axis(ABS_MT_POSITION_X, RawAxisInfo::new(0, 2064).with_resolution(9))
        .with_axis(ABS_MT_POSITION_Y, RawAxisInfo::new(0, 2832).with_resolution(9))
        .with_axis(ABS_MT_TRACKING_ID, RawAxisInfo::new(0, 65535))
        .with_axis(ABS_MT_PRESSURE, RawAxisInfo::new(0, 255))
        .with_config("touch.deviceType", "touchScreen")
        .with_config("touch.size.calibration", "diameter");
    profile.input_event_size = INPUT_EVENT_SIZE_64;
    profile
}
