//! Mapping from raw device units into oriented surface coordinates.

use std::f32::consts::PI;

use crate::config::GestureConfig;
use crate::device::{DeviceInfo, RawAxisInfo};
use crate::input::event::*;
use crate::orientation::{Orientation, RawBounds};

use super::calibration::{
    Calibration, DeviceParameters, DeviceType, DistanceCalibration, OrientationCalibration,
    PressureCalibration, SizeCalibration,
};
use super::notify::Source;
use super::pointer::{CookedPointerData, PointerCoords, PointerProperties, RawContact, RawPointerData};

/// The absolute axes a touch device reports, whichever protocol it speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RawPointerAxes {
    pub x: Option<RawAxisInfo>,
    pub y: Option<RawAxisInfo>,
    pub pressure: Option<RawAxisInfo>,
    pub touch_major: Option<RawAxisInfo>,
    pub touch_minor: Option<RawAxisInfo>,
    pub tool_major: Option<RawAxisInfo>,
    pub tool_minor: Option<RawAxisInfo>,
    pub orientation: Option<RawAxisInfo>,
    pub distance: Option<RawAxisInfo>,
    pub tilt_x: Option<RawAxisInfo>,
    pub tilt_y: Option<RawAxisInfo>,
    pub tracking_id: Option<RawAxisInfo>,
    pub slot: Option<RawAxisInfo>,
}

impl RawPointerAxes {
    pub fn configure(device: &dyn DeviceInfo, multi_touch: bool) -> Self {
        let axis = |code| device.abs_axis_info(code);
        if multi_touch {
            Self {
                x: axis(ABS_MT_POSITION_X),
                y: axis(ABS_MT_POSITION_Y),
                pressure: axis(ABS_MT_PRESSURE),
                touch_major: axis(ABS_MT_TOUCH_MAJOR),
                touch_minor: axis(ABS_MT_TOUCH_MINOR),
                tool_major: axis(ABS_MT_WIDTH_MAJOR),
                tool_minor: axis(ABS_MT_WIDTH_MINOR),
                orientation: axis(ABS_MT_ORIENTATION),
                distance: axis(ABS_MT_DISTANCE),
                tilt_x: None,
                tilt_y: None,
                tracking_id: axis(ABS_MT_TRACKING_ID),
                slot: axis(ABS_MT_SLOT),
            }
        } else {
            Self {
                x: axis(ABS_X),
                y: axis(ABS_Y),
                pressure: axis(ABS_PRESSURE),
                tool_major: axis(ABS_TOOL_WIDTH),
                distance: axis(ABS_DISTANCE),
                tilt_x: axis(ABS_TILT_X),
                tilt_y: axis(ABS_TILT_Y),
                ..Default::default()
            }
        }
    }

    pub fn bounds(&self) -> Option<RawBounds> {
        let (x, y) = (self.x?, self.y?);
        Some(RawBounds {
            x_min: x.min,
            x_max: x.max,
            y_min: y.min,
            y_max: y.max,
        })
    }

    /// Number of raw units along X, counting both ends.
    pub fn raw_width(&self) -> i32 {
        self.x.map_or(0, |x| x.max - x.min + 1)
    }

    pub fn raw_height(&self) -> i32 {
        self.y.map_or(0, |y| y.max - y.min + 1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeviceMode {
    /// Input is dropped.
    #[default]
    Disabled,
    /// Touch screen: pointers land where they touch.
    Direct,
    /// Touch pad reporting in raw units.
    Unscaled,
    /// Touch pad driving a pointer through gestures.
    Pointer,
}

impl DeviceMode {
    /// Pick the mode and input source for a device.
    pub fn select(
        params: &DeviceParameters,
        gestures_enabled: bool,
        has_display: bool,
        has_stylus: bool,
    ) -> (Self, Source) {
        let stylus = if has_stylus { Source::STYLUS } else { Source::empty() };
        match params.device_type {
            DeviceType::Pointer if gestures_enabled => (DeviceMode::Pointer, Source::MOUSE | stylus),
            DeviceType::TouchScreen if has_display => {
                (DeviceMode::Direct, Source::TOUCHSCREEN | stylus)
            }
            DeviceType::TouchScreen => (DeviceMode::Disabled, Source::TOUCHSCREEN | stylus),
            _ => (DeviceMode::Unscaled, Source::TOUCHPAD),
        }
    }
}

fn avg(a: i32, b: i32) -> f32 {
    (a as f32 + b as f32) * 0.5
}

fn sign_extend_nibble(value: i32) -> i32 {
    if value >= 8 {
        value - 16
    } else {
        value
    }
}

/// Scale factors derived once per configuration from the raw axes, the
/// calibration and the surface the device is mapped onto.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SurfaceGeometry {
    pub axes: RawPointerAxes,
    pub calibration: Calibration,
    pub orientation: Orientation,
    pub width: i32,
    pub height: i32,
    pub oriented_width: i32,
    pub oriented_height: i32,
    pub x_scale: f32,
    pub y_scale: f32,
    pub x_precision: f32,
    pub y_precision: f32,
    pub oriented_x_precision: f32,
    pub oriented_y_precision: f32,
    pub geometric_scale: f32,
    pub size_scale: f32,
    pub pressure_scale: f32,
    pub have_tilt: bool,
    tilt_x_center: f32,
    tilt_x_scale: f32,
    tilt_y_center: f32,
    tilt_y_scale: f32,
    orientation_center: f32,
    orientation_scale: f32,
    pub distance_scale: f32,
    /// Pointer mode: raw delta to display pixels.
    pub movement_scale: f32,
    /// Pointer mode: raw finger spread to display pixels for freeform gestures.
    pub zoom_scale: f32,
    /// Pointer mode: widest two-finger spread, in raw units, still treated as a swipe.
    pub max_swipe_width: f32,
}

impl SurfaceGeometry {
    /// `width`/`height` is the display for direct and pointer devices and
    /// the raw axis extent otherwise.
    pub fn configure(
        axes: RawPointerAxes,
        calibration: Calibration,
        width: i32,
        height: i32,
        orientation: Orientation,
        display: (i32, i32),
        gestures: &GestureConfig,
    ) -> Self {
        let raw_width = axes.raw_width();
        let raw_height = axes.raw_height();
        let scale = |size: i32, raw: i32| if raw > 0 { size as f32 / raw as f32 } else { 0.0 };
        let precision = |scale: f32| if scale > 0.0 { 1.0 / scale } else { 0.0 };

        let x_scale = scale(width, raw_width);
        let y_scale = scale(height, raw_height);

        let size_scale = if calibration.size == SizeCalibration::None {
            0.0
        } else {
            match (axes.touch_major, axes.tool_major) {
                (Some(touch), _) if touch.max != 0 => 1.0 / touch.max as f32,
                (_, Some(tool)) if tool.max != 0 => 1.0 / tool.max as f32,
                _ => 0.0,
            }
        };

        let pressure_scale = match calibration.pressure {
            PressureCalibration::Physical | PressureCalibration::Amplitude => {
                match (calibration.pressure_scale, axes.pressure) {
                    (Some(scale), _) => scale,
                    (None, Some(p)) if p.max != 0 => 1.0 / p.max as f32,
                    _ => 0.0,
                }
            }
            _ => 0.0,
        };

        let mut geometry = Self {
            axes,
            calibration,
            orientation,
            width,
            height,
            x_scale,
            y_scale,
            x_precision: precision(x_scale),
            y_precision: precision(y_scale),
            geometric_scale: (x_scale + y_scale) * 0.5,
            size_scale,
            pressure_scale,
            ..Default::default()
        };

        if let (Some(tx), Some(ty)) = (axes.tilt_x, axes.tilt_y) {
            geometry.have_tilt = true;
            geometry.tilt_x_center = avg(tx.min, tx.max);
            geometry.tilt_y_center = avg(ty.min, ty.max);
            geometry.tilt_x_scale = PI / 180.0;
            geometry.tilt_y_scale = PI / 180.0;
        } else if calibration.orientation == OrientationCalibration::Interpolated {
            if let Some(o) = axes.orientation {
                geometry.orientation_center = avg(o.min, o.max);
                if o.max != o.min {
                    geometry.orientation_scale = PI / (o.max - o.min) as f32;
                }
            }
        }

        if calibration.distance == DistanceCalibration::Scaled {
            geometry.distance_scale = calibration.distance_scale.unwrap_or(1.0);
        }

        let (ow, oh) = orientation.output_dimensions(width, height);
        geometry.oriented_width = ow;
        geometry.oriented_height = oh;
        if orientation.is_transposed() {
            geometry.oriented_x_precision = geometry.y_precision;
            geometry.oriented_y_precision = geometry.x_precision;
        } else {
            geometry.oriented_x_precision = geometry.x_precision;
            geometry.oriented_y_precision = geometry.y_precision;
        }

        let raw_diagonal = (raw_width as f32).hypot(raw_height as f32);
        let display_diagonal = (display.0 as f32).hypot(display.1 as f32);
        if raw_diagonal > 0.0 {
            geometry.movement_scale = gestures.movement_speed_ratio * display_diagonal / raw_diagonal;
            geometry.zoom_scale = gestures.zoom_speed_ratio * display_diagonal / raw_diagonal;
        }
        geometry.max_swipe_width = gestures.swipe_max_width_ratio * raw_diagonal;

        geometry
    }

    /// Whether a raw position lies on the touch surface proper.
    pub fn contains_raw(&self, x: i32, y: i32) -> bool {
        match self.axes.bounds() {
            Some(b) => x >= b.x_min && x <= b.x_max && y >= b.y_min && y <= b.y_max,
            None => false,
        }
    }

    /// Cook every raw pointer of a frame. The output is index-aligned with
    /// the input.
    pub fn cook(&self, raw: &RawPointerData, out: &mut CookedPointerData) {
        out.clear();
        let touching = raw.touching_ids.count();
        let all = raw.all_ids();
        for p in &raw.pointers {
            if !all.contains(p.id) {
                continue;
            }
            let coords = self.cook_one(p, touching);
            let properties = PointerProperties {
                id: p.id,
                tool_type: p.tool_type,
            };
            out.push(coords, properties, raw.hovering_ids.contains(p.id));
        }
    }

    fn cook_one(&self, p: &RawContact, touching: usize) -> PointerCoords {
        let cal = &self.calibration;
        let axes = &self.axes;

        let (mut touch_major, mut touch_minor, mut tool_major, mut tool_minor, mut size) =
            (0.0f32, 0.0f32, 0.0f32, 0.0f32, 0.0f32);
        if matches!(
            cal.size,
            SizeCalibration::Geometric | SizeCalibration::Diameter | SizeCalibration::Area
        ) {
            let pick = |major: i32, minor: i32, has_minor: bool| {
                let minor = if has_minor { minor } else { major };
                let size = if has_minor { avg(major, minor) } else { major as f32 };
                (major as f32, minor as f32, size)
            };
            match (axes.touch_major.is_some(), axes.tool_major.is_some()) {
                (true, true) => {
                    let (ma, mi, s) = pick(p.touch_major, p.touch_minor, axes.touch_minor.is_some());
                    let (tma, tmi, _) = pick(p.tool_major, p.tool_minor, axes.tool_minor.is_some());
                    (touch_major, touch_minor, tool_major, tool_minor, size) = (ma, mi, tma, tmi, s);
                }
                (true, false) => {
                    let (ma, mi, s) = pick(p.touch_major, p.touch_minor, axes.touch_minor.is_some());
                    (touch_major, touch_minor, tool_major, tool_minor, size) = (ma, mi, ma, mi, s);
                }
                (false, true) => {
                    let (ma, mi, s) = pick(p.tool_major, p.tool_minor, axes.tool_minor.is_some());
                    (touch_major, touch_minor, tool_major, tool_minor, size) = (ma, mi, ma, mi, s);
                }
                (false, false) => {}
            }

            if cal.size_is_summed == Some(true) && touching > 1 {
                let n = touching as f32;
                touch_major /= n;
                touch_minor /= n;
                tool_major /= n;
                tool_minor /= n;
                size /= n;
            }

            match cal.size {
                SizeCalibration::Geometric => {
                    touch_major *= self.geometric_scale;
                    touch_minor *= self.geometric_scale;
                    tool_major *= self.geometric_scale;
                    tool_minor *= self.geometric_scale;
                }
                SizeCalibration::Area => {
                    touch_major = if touch_major > 0.0 { touch_major.sqrt() } else { 0.0 };
                    touch_minor = touch_major;
                    tool_major = if tool_major > 0.0 { tool_major.sqrt() } else { 0.0 };
                    tool_minor = tool_major;
                }
                SizeCalibration::Diameter => {
                    touch_minor = touch_major;
                    tool_minor = tool_major;
                }
                _ => {}
            }

            touch_major = cal.apply_size_scale_and_bias(touch_major);
            touch_minor = cal.apply_size_scale_and_bias(touch_minor);
            tool_major = cal.apply_size_scale_and_bias(tool_major);
            tool_minor = cal.apply_size_scale_and_bias(tool_minor);
            size *= self.size_scale;
        }

        let pressure = match cal.pressure {
            PressureCalibration::Physical | PressureCalibration::Amplitude => {
                p.pressure as f32 * self.pressure_scale
            }
            _ if p.is_hovering => 0.0,
            _ => 1.0,
        };

        let mut tilt = 0.0;
        let mut orientation = 0.0;
        if self.have_tilt {
            let tx = (p.tilt_x as f32 - self.tilt_x_center) * self.tilt_x_scale;
            let ty = (p.tilt_y as f32 - self.tilt_y_center) * self.tilt_y_scale;
            orientation = (-tx.sin()).atan2(ty.sin());
            tilt = (tx.cos() * ty.cos()).acos();
        } else {
            match cal.orientation {
                OrientationCalibration::Interpolated => {
                    orientation = (p.orientation as f32 - self.orientation_center) * self.orientation_scale;
                }
                OrientationCalibration::Vector => {
                    let c1 = sign_extend_nibble((p.orientation & 0xf0) >> 4);
                    let c2 = sign_extend_nibble(p.orientation & 0x0f);
                    if c1 != 0 || c2 != 0 {
                        orientation = (c1 as f32).atan2(c2 as f32) * 0.5;
                        let confidence = (c1 as f32).hypot(c2 as f32);
                        let scale = 1.0 + confidence / 16.0;
                        touch_major *= scale;
                        touch_minor /= scale;
                        tool_major *= scale;
                        tool_minor /= scale;
                    }
                }
                _ => {}
            }
        }

        let distance = match cal.distance {
            DistanceCalibration::Scaled => p.distance as f32 * self.distance_scale,
            _ => 0.0,
        };

        let (x, y) = self.map_point(p.x, p.y);
        PointerCoords {
            x,
            y,
            pressure,
            size,
            touch_major,
            touch_minor,
            tool_major,
            tool_minor,
            orientation: self.orientation.adjust_angle(orientation, self.have_tilt),
            tilt,
            distance,
            vscroll: 0.0,
            hscroll: 0.0,
        }
    }

    /// Raw device position to oriented surface position.
    pub fn map_point(&self, x: i32, y: i32) -> (f32, f32) {
        let Some(b) = self.axes.bounds() else {
            return (0.0, 0.0);
        };
        let (rx, ry) = self.orientation.remap_raw(x, y, &b);
        if self.orientation.is_transposed() {
            ((rx - b.y_min) as f32 * self.y_scale, (ry - b.x_min) as f32 * self.x_scale)
        } else {
            ((rx - b.x_min) as f32 * self.x_scale, (ry - b.y_min) as f32 * self.y_scale)
        }
    }

    /// Oriented surface position back to raw device units. `None` when the
    /// geometry is degenerate.
    pub fn unmap_point(&self, x: f32, y: f32) -> Option<(f32, f32)> {
        let b = self.axes.bounds()?;
        if self.x_scale == 0.0 || self.y_scale == 0.0 {
            return None;
        }
        let (x_min, x_max) = (b.x_min as f32, b.x_max as f32);
        let (y_min, y_max) = (b.y_min as f32, b.y_max as f32);
        let (sx, sy) = (self.x_scale, self.y_scale);
        Some(match self.orientation {
            Orientation::Natural => (x / sx + x_min, y / sy + y_min),
            Orientation::Rotated90 => (x_max - y / sx, x / sy + y_min),
            Orientation::Rotated180 => (x_max - x / sx, y_max - y / sy),
            Orientation::Rotated270 => (y / sx + x_min, y_max - x / sy),
        })
    }
}
