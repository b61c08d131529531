use std::time::Duration;

use evdevil::event::{EventType, InputEvent};

pub const INPUT_EVENT_SIZE_32: usize = 16;
pub const INPUT_EVENT_SIZE_64: usize = 24;

pub const EV_SYN: u16 = 0x00;
pub const EV_KEY: u16 = 0x01;
pub const EV_REL: u16 = 0x02;
pub const EV_ABS: u16 = 0x03;

pub const SYN_REPORT: u16 = 0;
pub const SYN_MT_REPORT: u16 = 2;
pub const SYN_DROPPED: u16 = 3;

pub const REL_X: u16 = 0x00;
pub const REL_Y: u16 = 0x01;
pub const REL_HWHEEL: u16 = 0x06;
pub const REL_WHEEL: u16 = 0x08;

pub const ABS_X: u16 = 0x00;
pub const ABS_Y: u16 = 0x01;
pub const ABS_PRESSURE: u16 = 0x18;
pub const ABS_DISTANCE: u16 = 0x19;
pub const ABS_TILT_X: u16 = 0x1a;
pub const ABS_TILT_Y: u16 = 0x1b;
pub const ABS_TOOL_WIDTH: u16 = 0x1c;
pub const ABS_MT_SLOT: u16 = 0x2f;
pub const ABS_MT_TOUCH_MAJOR: u16 = 0x30;
pub const ABS_MT_TOUCH_MINOR: u16 = 0x31;
pub const ABS_MT_WIDTH_MAJOR: u16 = 0x32;
pub const ABS_MT_WIDTH_MINOR: u16 = 0x33;
pub const ABS_MT_ORIENTATION: u16 = 0x34;
pub const ABS_MT_POSITION_X: u16 = 0x35;
pub const ABS_MT_POSITION_Y: u16 = 0x36;
pub const ABS_MT_TOOL_TYPE: u16 = 0x37;
pub const ABS_MT_TRACKING_ID: u16 = 0x39;
pub const ABS_MT_PRESSURE: u16 = 0x3a;
pub const ABS_MT_DISTANCE: u16 = 0x3b;

pub const BTN_LEFT: u16 = 0x110;
pub const BTN_RIGHT: u16 = 0x111;
pub const BTN_MIDDLE: u16 = 0x112;
pub const BTN_SIDE: u16 = 0x113;
pub const BTN_EXTRA: u16 = 0x114;
pub const BTN_FORWARD: u16 = 0x115;
pub const BTN_BACK: u16 = 0x116;
pub const BTN_TOOL_PEN: u16 = 0x140;
pub const BTN_TOOL_RUBBER: u16 = 0x141;
pub const BTN_TOOL_BRUSH: u16 = 0x142;
pub const BTN_TOOL_PENCIL: u16 = 0x143;
pub const BTN_TOOL_AIRBRUSH: u16 = 0x144;
pub const BTN_TOOL_FINGER: u16 = 0x145;
pub const BTN_TOOL_MOUSE: u16 = 0x146;
pub const BTN_TOOL_LENS: u16 = 0x147;
pub const BTN_TOOL_QUINTTAP: u16 = 0x148;
pub const BTN_TOUCH: u16 = 0x14a;
pub const BTN_STYLUS: u16 = 0x14b;
pub const BTN_STYLUS2: u16 = 0x14c;
pub const BTN_TOOL_DOUBLETAP: u16 = 0x14d;
pub const BTN_TOOL_TRIPLETAP: u16 = 0x14e;
pub const BTN_TOOL_QUADTAP: u16 = 0x14f;

pub const MT_TOOL_FINGER: i32 = 0;
pub const MT_TOOL_PEN: i32 = 1;

/// One raw `input_event` with its kernel timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawEvent {
    pub when: Duration,
    pub event_type: u16,
    pub code: u16,
    pub value: i32,
}

impl RawEvent {
    pub fn new(when: Duration, event_type: u16, code: u16, value: i32) -> Self {
        Self {
            when,
            event_type,
            code,
            value,
        }
    }

    pub fn abs(when: Duration, code: u16, value: i32) -> Self {
        Self::new(when, EV_ABS, code, value)
    }

    pub fn key(when: Duration, code: u16, pressed: bool) -> Self {
        Self::new(when, EV_KEY, code, pressed as i32)
    }

    pub fn rel(when: Duration, code: u16, value: i32) -> Self {
        Self::new(when, EV_REL, code, value)
    }

    pub fn sync(when: Duration) -> Self {
        Self::new(when, EV_SYN, SYN_REPORT, 0)
    }

    pub fn mt_report(when: Duration) -> Self {
        Self::new(when, EV_SYN, SYN_MT_REPORT, 0)
    }

    pub fn dropped(when: Duration) -> Self {
        Self::new(when, EV_SYN, SYN_DROPPED, 0)
    }

    pub fn is_sync_report(&self) -> bool {
        self.event_type == EV_SYN && self.code == SYN_REPORT
    }

    fn from_input_event(when: Duration, ev: InputEvent) -> Self {
        Self::new(when, ev.event_type().raw(), ev.raw_code(), ev.raw_value())
    }
}

/// Parse a Linux input_event from raw bytes (32-bit or 64-bit format).
pub fn parse_input_event(buf: &[u8]) -> Option<RawEvent> {
    match buf.len() {
        INPUT_EVENT_SIZE_32 => parse_input_event_32(buf),
        INPUT_EVENT_SIZE_64 => parse_input_event_64(buf),
        len if len >= INPUT_EVENT_SIZE_64 => parse_input_event_64(buf),
        len if len >= INPUT_EVENT_SIZE_32 => parse_input_event_32(buf),
        _ => None,
    }
}

fn parse_input_event_32(buf: &[u8]) -> Option<RawEvent> {
    let sec = i32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]);
    let usec = i32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]);
    let ty = u16::from_le_bytes([buf[8], buf[9]]);
    let code = u16::from_le_bytes([buf[10], buf[11]]);
    let value = i32::from_le_bytes([buf[12], buf[13], buf[14], buf[15]]);

    let when = timestamp(i64::from(sec), i64::from(usec))?;
    let ev = InputEvent::new(EventType::from_raw(ty), code, value);
    Some(RawEvent::from_input_event(when, ev))
}

fn parse_input_event_64(buf: &[u8]) -> Option<RawEvent> {
    let mut sec = [0u8; 8];
    let mut usec = [0u8; 8];
    sec.copy_from_slice(&buf[0..8]);
    usec.copy_from_slice(&buf[8..16]);
    let ty = u16::from_le_bytes([buf[16], buf[17]]);
    let code = u16::from_le_bytes([buf[18], buf[19]]);
    let value = i32::from_le_bytes([buf[20], buf[21], buf[22], buf[23]]);

    let when = timestamp(i64::from_le_bytes(sec), i64::from_le_bytes(usec))?;
    let ev = InputEvent::new(EventType::from_raw(ty), code, value);
    Some(RawEvent::from_input_event(when, ev))
}

fn timestamp(sec: i64, usec: i64) -> Option<Duration> {
    if sec < 0 || !(0..1_000_000).contains(&usec) {
        return None;
    }
    Some(Duration::from_secs(sec as u64) + Duration::from_micros(usec as u64))
}

/// Human-readable name for an event type/code pair.
pub fn code_name(ty: u16, code: u16) -> String {
    match ty {
        EV_SYN => match code {
            SYN_REPORT => "SYN_REPORT".into(),
            SYN_MT_REPORT => "SYN_MT_REPORT".into(),
            SYN_DROPPED => "SYN_DROPPED".into(),
            _ => format!("SYN/{}", code),
        },
        EV_KEY => {
            let key = match code {
                BTN_LEFT => "LEFT",
                BTN_RIGHT => "RIGHT",
                BTN_MIDDLE => "MIDDLE",
                BTN_SIDE => "SIDE",
                BTN_EXTRA => "EXTRA",
                BTN_FORWARD => "FORWARD",
                BTN_BACK => "BACK",
                BTN_TOOL_PEN => "TOOL_PEN",
                BTN_TOOL_RUBBER => "TOOL_RUBBER",
                BTN_TOOL_FINGER => "TOOL_FINGER",
                BTN_TOOL_MOUSE => "TOOL_MOUSE",
                BTN_TOUCH => "TOUCH",
                BTN_STYLUS => "STYLUS",
                BTN_STYLUS2 => "STYLUS2",
                BTN_TOOL_DOUBLETAP => "TOOL_DOUBLETAP",
                BTN_TOOL_TRIPLETAP => "TOOL_TRIPLETAP",
                BTN_TOOL_QUADTAP => "TOOL_QUADTAP",
                _ => return format!("KEY/{}", code),
            };
            format!("BTN_{}({})", key, code)
        }
        EV_REL => {
            let rel = match code {
                REL_X => "X",
                REL_Y => "Y",
                REL_HWHEEL => "HWHEEL",
                REL_WHEEL => "WHEEL",
                _ => "?",
            };
            format!("REL_{}({})", rel, code)
        }
        EV_ABS => format!("ABS_{}({})", abs_name(code).unwrap_or("?"), code),
        _ => format!("type{} code{}", ty, code),
    }
}

const ABS_NAMES: &[(u16, &str)] = &[
    (ABS_X, "X"),
    (ABS_Y, "Y"),
    (ABS_PRESSURE, "PRESSURE"),
    (ABS_DISTANCE, "DISTANCE"),
    (ABS_TILT_X, "TILT_X"),
    (ABS_TILT_Y, "TILT_Y"),
    (ABS_TOOL_WIDTH, "TOOL_WIDTH"),
    (ABS_MT_SLOT, "MT_SLOT"),
    (ABS_MT_TOUCH_MAJOR, "MT_TOUCH_MAJOR"),
    (ABS_MT_TOUCH_MINOR, "MT_TOUCH_MINOR"),
    (ABS_MT_WIDTH_MAJOR, "MT_WIDTH_MAJOR"),
    (ABS_MT_WIDTH_MINOR, "MT_WIDTH_MINOR"),
    (ABS_MT_ORIENTATION, "MT_ORIENTATION"),
    (ABS_MT_POSITION_X, "MT_POSITION_X"),
    (ABS_MT_POSITION_Y, "MT_POSITION_Y"),
    (ABS_MT_TOOL_TYPE, "MT_TOOL_TYPE"),
    (ABS_MT_TRACKING_ID, "MT_TRACKING_ID"),
    (ABS_MT_PRESSURE, "MT_PRESSURE"),
    (ABS_MT_DISTANCE, "MT_DISTANCE"),
];

pub fn abs_name(code: u16) -> Option<&'static str> {
    ABS_NAMES.iter().find(|(c, _)| *c == code).map(|(_, n)| *n)
}

/// Look up an absolute axis by its short name (`mt_position_x`, `pressure`, ...).
pub fn abs_code_from_name(name: &str) -> Option<u16> {
    let upper = name.to_ascii_uppercase();
    let upper = upper.strip_prefix("ABS_").unwrap_or(&upper);
    ABS_NAMES
        .iter()
        .find(|(_, n)| *n == upper)
        .map(|(c, _)| *c)
}
