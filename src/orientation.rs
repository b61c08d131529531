//! Display rotation handling for touch coordinate transforms.

use serde::Deserialize;
use std::f32::consts::{FRAC_PI_2, PI};
use std::fmt;
use std::str::FromStr;

/// Display rotation relative to the panel's natural orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Orientation {
    /// No rotation.
    #[default]
    Natural,
    /// Display rotated 90° clockwise.
    Rotated90,
    /// Display upside down.
    Rotated180,
    /// Display rotated 90° counter-clockwise.
    Rotated270,
}

/// Inclusive raw coordinate range of a touch surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawBounds {
    pub x_min: i32,
    pub x_max: i32,
    pub y_min: i32,
    pub y_max: i32,
}

impl Orientation {
    pub fn degrees(&self) -> u32 {
        match self {
            Orientation::Natural => 0,
            Orientation::Rotated90 => 90,
            Orientation::Rotated180 => 180,
            Orientation::Rotated270 => 270,
        }
    }

    /// True when the surface X axis runs along the raw Y axis.
    pub fn is_transposed(&self) -> bool {
        matches!(self, Orientation::Rotated90 | Orientation::Rotated270)
    }

    /// Remap raw coordinates into the rotated frame while staying in raw units.
    ///
    /// For transposed rotations the returned X lies in the raw Y range and the
    /// returned Y in the raw X range.
    pub fn remap_raw(&self, x: i32, y: i32, b: &RawBounds) -> (i32, i32) {
        match self {
            Orientation::Natural => (x, y),
            Orientation::Rotated90 => (y, b.x_max - x + b.x_min),
            Orientation::Rotated180 => (b.x_max - x + b.x_min, b.y_max - y + b.y_min),
            Orientation::Rotated270 => (b.y_max - y + b.y_min, x),
        }
    }

    /// Rotate a relative motion vector from raw surface space into display space.
    pub fn rotate_delta(&self, dx: f32, dy: f32) -> (f32, f32) {
        match self {
            Orientation::Natural => (dx, dy),
            Orientation::Rotated90 => (dy, -dx),
            Orientation::Rotated180 => (-dx, -dy),
            Orientation::Rotated270 => (-dy, dx),
        }
    }

    /// Shift an angle by the rotation.
    ///
    /// Ellipse orientations live in (-π/2, π/2]. Tilt-derived orientations
    /// cover the full circle and wrap into (-π, π].
    pub fn adjust_angle(&self, angle: f32, full_circle: bool) -> f32 {
        let shifted = match self {
            Orientation::Natural => return angle,
            Orientation::Rotated90 => angle - FRAC_PI_2,
            Orientation::Rotated180 => angle + PI,
            Orientation::Rotated270 => angle + FRAC_PI_2,
        };
        if full_circle {
            wrap(shifted, PI)
        } else {
            wrap(shifted, FRAC_PI_2)
        }
    }

    /// Output dimensions after rotation.
    pub fn output_dimensions(&self, width: i32, height: i32) -> (i32, i32) {
        if self.is_transposed() {
            (height, width)
        } else {
            (width, height)
        }
    }
}

fn wrap(mut angle: f32, half_range: f32) -> f32 {
    let range = half_range * 2.0;
    while angle <= -half_range {
        angle += range;
    }
    while angle > half_range {
        angle -= range;
    }
    angle
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Orientation::Natural => write!(f, "natural"),
            Orientation::Rotated90 => write!(f, "rotated-90"),
            Orientation::Rotated180 => write!(f, "rotated-180"),
            Orientation::Rotated270 => write!(f, "rotated-270"),
        }
    }
}

impl FromStr for Orientation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "natural" | "0" | "rotated-0" => Ok(Orientation::Natural),
            "rotated-90" | "rotated_90" | "90" => Ok(Orientation::Rotated90),
            "rotated-180" | "rotated_180" | "180" | "inverted" => Ok(Orientation::Rotated180),
            "rotated-270" | "rotated_270" | "270" => Ok(Orientation::Rotated270),
            _ => Err(format!(
                "Invalid orientation '{}'. Valid values: natural, rotated-90, rotated-180, rotated-270",
                s
            )),
        }
    }
}
