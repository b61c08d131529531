pub mod event;

pub use event::{parse_input_event, RawEvent};
