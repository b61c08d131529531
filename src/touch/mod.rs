pub mod assign;
pub mod buttons;
pub mod calibration;
pub mod cursor;
pub mod gesture;
pub mod mapper;
pub mod notify;
pub mod pointer;
pub mod simple;
pub mod slots;
pub mod surface;
pub mod velocity;
pub mod virtual_keys;

#[cfg(test)]
mod scenarios;

pub use gesture::GestureMode;
pub use mapper::{Output, TouchMapper};
pub use notify::{KeyAction, MotionAction, Notification, NotifyKeyArgs, NotifyMotionArgs};
pub use simple::PointerUsage;
pub use surface::DeviceMode;
