//! Key and relative-axis state accumulated between sync reports.

use crate::device::DeviceInfo;
use crate::input::event::*;
use crate::input::RawEvent;

use super::notify::ButtonState;
use super::pointer::ToolType;

/// BTN_TOUCH, stylus buttons and BTN_TOOL_* state.
#[derive(Debug, Clone, Default)]
pub struct TouchButtonAccumulator {
    have_btn_touch: bool,
    have_stylus: bool,
    btn_touch: bool,
    btn_stylus: bool,
    btn_stylus2: bool,
    tool_finger: bool,
    tool_pen: bool,
    tool_rubber: bool,
    tool_brush: bool,
    tool_pencil: bool,
    tool_airbrush: bool,
    tool_mouse: bool,
    tool_lens: bool,
    tool_double_tap: bool,
    tool_triple_tap: bool,
    tool_quad_tap: bool,
}

impl TouchButtonAccumulator {
    pub fn configure(&mut self, device: &dyn DeviceInfo) {
        self.have_btn_touch = device.has_key(BTN_TOUCH);
        self.have_stylus = [
            BTN_TOOL_PEN,
            BTN_TOOL_RUBBER,
            BTN_TOOL_BRUSH,
            BTN_TOOL_PENCIL,
            BTN_TOOL_AIRBRUSH,
        ]
        .iter()
        .any(|&code| device.has_key(code));
    }

    /// Reload the button state from the device.
    pub fn reset(&mut self, device: &dyn DeviceInfo) {
        self.btn_touch = device.is_key_pressed(BTN_TOUCH);
        self.btn_stylus = device.is_key_pressed(BTN_STYLUS);
        self.btn_stylus2 = device.is_key_pressed(BTN_STYLUS2);
        self.tool_finger = device.is_key_pressed(BTN_TOOL_FINGER);
        self.tool_pen = device.is_key_pressed(BTN_TOOL_PEN);
        self.tool_rubber = device.is_key_pressed(BTN_TOOL_RUBBER);
        self.tool_brush = device.is_key_pressed(BTN_TOOL_BRUSH);
        self.tool_pencil = device.is_key_pressed(BTN_TOOL_PENCIL);
        self.tool_airbrush = device.is_key_pressed(BTN_TOOL_AIRBRUSH);
        self.tool_mouse = device.is_key_pressed(BTN_TOOL_MOUSE);
        self.tool_lens = device.is_key_pressed(BTN_TOOL_LENS);
        self.tool_double_tap = device.is_key_pressed(BTN_TOOL_DOUBLETAP);
        self.tool_triple_tap = device.is_key_pressed(BTN_TOOL_TRIPLETAP);
        self.tool_quad_tap = device.is_key_pressed(BTN_TOOL_QUADTAP);
    }

    pub fn process(&mut self, ev: &RawEvent) {
        if ev.event_type != EV_KEY {
            return;
        }
        let down = ev.value != 0;
        match ev.code {
            BTN_TOUCH => self.btn_touch = down,
            BTN_STYLUS => self.btn_stylus = down,
            BTN_STYLUS2 => self.btn_stylus2 = down,
            BTN_TOOL_FINGER => self.tool_finger = down,
            BTN_TOOL_PEN => self.tool_pen = down,
            BTN_TOOL_RUBBER => self.tool_rubber = down,
            BTN_TOOL_BRUSH => self.tool_brush = down,
            BTN_TOOL_PENCIL => self.tool_pencil = down,
            BTN_TOOL_AIRBRUSH => self.tool_airbrush = down,
            BTN_TOOL_MOUSE => self.tool_mouse = down,
            BTN_TOOL_LENS => self.tool_lens = down,
            BTN_TOOL_DOUBLETAP => self.tool_double_tap = down,
            BTN_TOOL_TRIPLETAP => self.tool_triple_tap = down,
            BTN_TOOL_QUADTAP => self.tool_quad_tap = down,
            _ => {}
        }
    }

    pub fn button_state(&self) -> ButtonState {
        let mut state = ButtonState::empty();
        if self.btn_stylus {
            state |= ButtonState::SECONDARY;
        }
        if self.btn_stylus2 {
            state |= ButtonState::TERTIARY;
        }
        state
    }

    pub fn tool_type(&self) -> ToolType {
        if self.tool_mouse || self.tool_lens {
            ToolType::Mouse
        } else if self.tool_rubber {
            ToolType::Eraser
        } else if self.tool_pen || self.tool_brush || self.tool_pencil || self.tool_airbrush {
            ToolType::Stylus
        } else if self.tool_finger || self.tool_double_tap || self.tool_triple_tap || self.tool_quad_tap {
            ToolType::Finger
        } else {
            ToolType::Unknown
        }
    }

    pub fn is_tool_active(&self) -> bool {
        self.btn_touch
            || self.tool_finger
            || self.tool_pen
            || self.tool_rubber
            || self.tool_brush
            || self.tool_pencil
            || self.tool_airbrush
            || self.tool_mouse
            || self.tool_lens
            || self.tool_double_tap
            || self.tool_triple_tap
            || self.tool_quad_tap
    }

    /// The device reports proximity through BTN_TOUCH and it is released.
    pub fn is_hovering(&self) -> bool {
        self.have_btn_touch && !self.btn_touch
    }

    pub fn has_stylus(&self) -> bool {
        self.have_stylus
    }
}

/// Mouse-style buttons on touch pads and pen tablets.
#[derive(Debug, Clone, Default)]
pub struct CursorButtonAccumulator {
    left: bool,
    right: bool,
    middle: bool,
    back: bool,
    side: bool,
    forward: bool,
    extra: bool,
}

impl CursorButtonAccumulator {
    pub fn reset(&mut self, device: &dyn DeviceInfo) {
        self.left = device.is_key_pressed(BTN_LEFT);
        self.right = device.is_key_pressed(BTN_RIGHT);
        self.middle = device.is_key_pressed(BTN_MIDDLE);
        self.back = device.is_key_pressed(BTN_BACK);
        self.side = device.is_key_pressed(BTN_SIDE);
        self.forward = device.is_key_pressed(BTN_FORWARD);
        self.extra = device.is_key_pressed(BTN_EXTRA);
    }

    pub fn process(&mut self, ev: &RawEvent) {
        if ev.event_type != EV_KEY {
            return;
        }
        let down = ev.value != 0;
        match ev.code {
            BTN_LEFT => self.left = down,
            BTN_RIGHT => self.right = down,
            BTN_MIDDLE => self.middle = down,
            BTN_BACK => self.back = down,
            BTN_SIDE => self.side = down,
            BTN_FORWARD => self.forward = down,
            BTN_EXTRA => self.extra = down,
            _ => {}
        }
    }

    pub fn button_state(&self) -> ButtonState {
        let mut state = ButtonState::empty();
        if self.left {
            state |= ButtonState::PRIMARY;
        }
        if self.right {
            state |= ButtonState::SECONDARY;
        }
        if self.middle {
            state |= ButtonState::TERTIARY;
        }
        if self.back || self.side {
            state |= ButtonState::BACK;
        }
        if self.forward || self.extra {
            state |= ButtonState::FORWARD;
        }
        state
    }
}

/// REL_WHEEL / REL_HWHEEL deltas for the current frame.
#[derive(Debug, Clone, Default)]
pub struct ScrollAccumulator {
    have_vwheel: bool,
    have_hwheel: bool,
    vwheel: i32,
    hwheel: i32,
}

impl ScrollAccumulator {
    pub fn configure(&mut self, device: &dyn DeviceInfo) {
        self.have_vwheel = device.has_rel_axis(REL_WHEEL);
        self.have_hwheel = device.has_rel_axis(REL_HWHEEL);
    }

    pub fn reset(&mut self) {
        self.vwheel = 0;
        self.hwheel = 0;
    }

    pub fn process(&mut self, ev: &RawEvent) {
        if ev.event_type != EV_REL {
            return;
        }
        match ev.code {
            REL_WHEEL => self.vwheel += ev.value,
            REL_HWHEEL => self.hwheel += ev.value,
            _ => {}
        }
    }

    pub fn finish_sync(&mut self) {
        self.reset();
    }

    pub fn have_wheel(&self) -> bool {
        self.have_vwheel || self.have_hwheel
    }

    pub fn vwheel(&self) -> f32 {
        self.vwheel as f32
    }

    pub fn hwheel(&self) -> f32 {
        self.hwheel as f32
    }
}
