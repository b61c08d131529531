//! Calibration models and device parameters read from the device's property map.

use crate::config::PropertyMap;
use crate::device::{DeviceInfo, InputProperty};
use crate::input::event::{REL_X, REL_Y};

use super::surface::RawPointerAxes;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SizeCalibration {
    #[default]
    Default,
    None,
    Geometric,
    Diameter,
    Area,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PressureCalibration {
    #[default]
    Default,
    None,
    Physical,
    Amplitude,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrientationCalibration {
    #[default]
    Default,
    None,
    Interpolated,
    /// Two signed nibbles packed into one byte, decoded as a vector.
    Vector,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DistanceCalibration {
    #[default]
    Default,
    None,
    Scaled,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Calibration {
    pub size: SizeCalibration,
    pub size_scale: Option<f32>,
    pub size_bias: Option<f32>,
    pub size_is_summed: Option<bool>,
    pub pressure: PressureCalibration,
    pub pressure_scale: Option<f32>,
    pub orientation: OrientationCalibration,
    pub distance: DistanceCalibration,
    pub distance_scale: Option<f32>,
}

/// Match `value` against the accepted names; `default` and unknown values
/// (with a warning) give `None`.
fn parse_choice<T: Copy>(props: &PropertyMap, key: &str, choices: &[(&str, T)]) -> Option<T> {
    let value = props.get(key)?;
    if let Some((_, choice)) = choices.iter().find(|(name, _)| *name == value) {
        return Some(*choice);
    }
    if value != "default" {
        log::warn!("Invalid value for {}: '{}'", key, value);
    }
    None
}

impl Calibration {
    pub fn parse(props: &PropertyMap) -> Self {
        Self {
            size: parse_choice(
                props,
                "touch.size.calibration",
                &[
                    ("none", SizeCalibration::None),
                    ("geometric", SizeCalibration::Geometric),
                    ("diameter", SizeCalibration::Diameter),
                    ("area", SizeCalibration::Area),
                ],
            )
            .unwrap_or_default(),
            size_scale: props.parse("touch.size.scale"),
            size_bias: props.parse("touch.size.bias"),
            size_is_summed: props.parse_bool("touch.size.isSummed"),
            pressure: parse_choice(
                props,
                "touch.pressure.calibration",
                &[
                    ("none", PressureCalibration::None),
                    ("physical", PressureCalibration::Physical),
                    ("amplitude", PressureCalibration::Amplitude),
                ],
            )
            .unwrap_or_default(),
            pressure_scale: props.parse("touch.pressure.scale"),
            orientation: parse_choice(
                props,
                "touch.orientation.calibration",
                &[
                    ("none", OrientationCalibration::None),
                    ("interpolated", OrientationCalibration::Interpolated),
                    ("vector", OrientationCalibration::Vector),
                ],
            )
            .unwrap_or_default(),
            distance: parse_choice(
                props,
                "touch.distance.calibration",
                &[
                    ("none", DistanceCalibration::None),
                    ("scaled", DistanceCalibration::Scaled),
                ],
            )
            .unwrap_or_default(),
            distance_scale: props.parse("touch.distance.scale"),
        }
    }

    /// Replace `Default` models with what the device's axes support, and
    /// disable models whose axis is missing.
    pub fn resolve(&mut self, axes: &RawPointerAxes) {
        if axes.touch_major.is_some() || axes.tool_major.is_some() {
            if self.size == SizeCalibration::Default {
                self.size = SizeCalibration::Geometric;
            }
        } else {
            self.size = SizeCalibration::None;
        }

        if axes.pressure.is_some() {
            if self.pressure == PressureCalibration::Default {
                self.pressure = PressureCalibration::Physical;
            }
        } else {
            self.pressure = PressureCalibration::None;
        }

        if axes.orientation.is_some() {
            if self.orientation == OrientationCalibration::Default {
                self.orientation = OrientationCalibration::Interpolated;
            }
        } else {
            self.orientation = OrientationCalibration::None;
        }

        if axes.distance.is_some() {
            if self.distance == DistanceCalibration::Default {
                self.distance = DistanceCalibration::Scaled;
            }
        } else {
            self.distance = DistanceCalibration::None;
        }
    }

    /// Apply the configured linear scale and bias, clamping at zero.
    pub fn apply_size_scale_and_bias(&self, size: f32) -> f32 {
        let mut out = size;
        if let Some(scale) = self.size_scale {
            out *= scale;
        }
        if let Some(bias) = self.size_bias {
            out += bias;
        }
        out.max(0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceType {
    TouchScreen,
    TouchPad,
    Pointer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceParameters {
    pub device_type: DeviceType,
    /// Follow the display rotation.
    pub orientation_aware: bool,
}

impl DeviceParameters {
    pub fn configure(device: &dyn DeviceInfo) -> Self {
        let mut device_type = if device.has_input_property(InputProperty::Direct) {
            DeviceType::TouchScreen
        } else if device.has_input_property(InputProperty::Pointer) {
            DeviceType::Pointer
        } else if device.has_rel_axis(REL_X) || device.has_rel_axis(REL_Y) {
            // A cursor device with a touch pad attached.
            DeviceType::TouchPad
        } else {
            DeviceType::Pointer
        };

        let props = device.configuration();
        if let Some(t) = parse_choice(
            &props,
            "touch.deviceType",
            &[
                ("touchScreen", DeviceType::TouchScreen),
                ("touchPad", DeviceType::TouchPad),
                ("pointer", DeviceType::Pointer),
            ],
        ) {
            device_type = t;
        }

        let orientation_aware = props
            .parse_bool("touch.orientationAware")
            .unwrap_or(device_type == DeviceType::TouchScreen);

        Self {
            device_type,
            orientation_aware,
        }
    }
}
