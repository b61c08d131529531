use super::{DeviceProfile, InputProperty, RawAxisInfo};
use crate::input::event::{
    ABS_MT_ORIENTATION, ABS_MT_POSITION_X, ABS_MT_POSITION_Y, ABS_MT_PRESSURE, ABS_MT_SLOT,
    ABS_MT_TOOL_TYPE, ABS_MT_TOUCH_MAJOR, ABS_MT_TOUCH_MINOR, ABS_MT_TRACKING_ID,
};

/// reMarkable 2 capacitive touch panel.
///
/// 1404×1872 display, ~210×158 mm, so roughly 9 units/mm. The panel reports
/// protocol B slots.
pub fn rm2() -> DeviceProfile {
    DeviceProfile::new("reMarkable 2 touch")
        .with_display(1404, 1872)
        .with_property(InputProperty::Direct)
        .with_axis(ABS_MT_SLOT, RawAxisInfo::new(0, 31))
        .with_axis(ABS_MT_TOUCH_MAJOR, RawAxisInfo::new(0, 255))
        .with_axis(ABS_MT_TOUCH_MINOR, RawAxisInfo::new(0, 255))
        .with_axis(ABS_MT_ORIENTATION, RawAxisInfo::new(-127, 127))
        .with_axis(ABS_MT_POSITION_X, RawAxisInfo::new(0, 1403).with_resolution(9))
        .with_axis(ABS_MT_POSITION_Y, RawAxisInfo::new(0, 1871).with_resolution(9))
        .with_axis(ABS_MT_TOOL_TYPE, RawAxisInfo::new(0, 1))
        .with_axis(ABS_MT_TRACKING_ID, RawAxisInfo::new(0, 65535))
        .with_axis(ABS_MT_PRESSURE, RawAxisInfo::new(0, 255))
        .with_config("touch.deviceType", "touchScreen")
        .with_config("touch.orientation.calibration", "interpolated")
}
