//! Engine tunables shared by every touch device.

use std::time::Duration;

use serde::Deserialize;

use crate::orientation::Orientation;
use crate::touch::velocity::VelocityControlParameters;

/// The display a touch screen is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DisplayConfig {
    pub width: i32,
    pub height: i32,
    #[serde(default)]
    pub orientation: Orientation,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ReaderConfig {
    pub display: Option<DisplayConfig>,
    /// Virtual keys are ignored for this long after any on-screen touch.
    pub virtual_key_quiet_time_ms: u64,
    pub pointer_velocity: VelocityControlParameters,
    pub wheel_velocity: VelocityControlParameters,
    pub gestures: GestureConfig,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            display: None,
            virtual_key_quiet_time_ms: 0,
            pointer_velocity: VelocityControlParameters::new(1.0, 500.0, 3000.0, 3.0),
            wheel_velocity: VelocityControlParameters::new(1.0, 15.0, 50.0, 4.0),
            gestures: GestureConfig::default(),
        }
    }
}

impl ReaderConfig {
    pub fn virtual_key_quiet_time(&self) -> Duration {
        Duration::from_millis(self.virtual_key_quiet_time_ms)
    }
}

/// Timing and distance thresholds for pointer gestures on touch pads.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct GestureConfig {
    pub enabled: bool,
    /// Quiet period after a multi-finger gesture or button release.
    pub quiet_interval_ms: u64,
    /// Minimum speed (px/s) for another finger to take over a button drag.
    pub drag_min_switch_speed: f32,
    /// Maximum down-to-up time for a tap.
    pub tap_interval_ms: u64,
    /// Time after a tap during which a new touch becomes a drag.
    pub tap_drag_interval_ms: u64,
    /// Maximum movement (px) between tap down and up.
    pub tap_slop: f32,
    /// Time for the fingers of a multi-finger gesture to land.
    pub multitouch_settle_interval_ms: u64,
    /// Movement (px) before a multi-finger press becomes a swipe or freeform.
    pub multitouch_min_distance: f32,
    /// Cosine of the largest angle between two fingers still treated as a swipe.
    pub swipe_transition_angle_cosine: f32,
    /// Largest finger spread for a swipe, as a fraction of the surface diagonal.
    pub swipe_max_width_ratio: f32,
    /// Pointer speed relative to finger speed, scaled by the display diagonal.
    pub movement_speed_ratio: f32,
    /// Gesture spread relative to finger spread, scaled by the display diagonal.
    pub zoom_speed_ratio: f32,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            quiet_interval_ms: 100,
            drag_min_switch_speed: 50.0,
            tap_interval_ms: 150,
            tap_drag_interval_ms: 150,
            tap_slop: 10.0,
            multitouch_settle_interval_ms: 100,
            multitouch_min_distance: 15.0,
            // cos(75°)
            swipe_transition_angle_cosine: 0.2588,
            swipe_max_width_ratio: 0.25,
            movement_speed_ratio: 0.8,
            zoom_speed_ratio: 0.3,
        }
    }
}

impl GestureConfig {
    pub fn quiet_interval(&self) -> Duration {
        Duration::from_millis(self.quiet_interval_ms)
    }

    pub fn tap_interval(&self) -> Duration {
        Duration::from_millis(self.tap_interval_ms)
    }

    pub fn tap_drag_interval(&self) -> Duration {
        Duration::from_millis(self.tap_drag_interval_ms)
    }

    pub fn multitouch_settle_interval(&self) -> Duration {
        Duration::from_millis(self.multitouch_settle_interval_ms)
    }
}
