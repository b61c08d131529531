//! Touch input engine for evdev multi-touch devices: protocol decoding,
//! pointer id tracking, calibration, virtual keys and touch pad gestures.

pub mod config;
pub mod context;
pub mod device;
pub mod dump;
pub mod error;
pub mod input;
pub mod orientation;
pub mod replay;
pub mod touch;

pub use error::{Error, Result};
