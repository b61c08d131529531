//! Key and motion notifications produced by the touch engine.

use std::fmt;
use std::time::Duration;

use bitflags::bitflags;

use super::pointer::{IdSet, PointerCoords, PointerProperties};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ButtonState: u32 {
        const PRIMARY = 1 << 0;
        const SECONDARY = 1 << 1;
        const TERTIARY = 1 << 2;
        const BACK = 1 << 3;
        const FORWARD = 1 << 4;
    }
}

impl ButtonState {
    pub fn is_pointer_down(self) -> bool {
        self.intersects(ButtonState::PRIMARY | ButtonState::SECONDARY | ButtonState::TERTIARY)
    }
}

bitflags! {
    /// Classes of input a device produces.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Source: u32 {
        const KEYBOARD = 1 << 0;
        const TOUCHSCREEN = 1 << 1;
        const MOUSE = 1 << 2;
        const STYLUS = 1 << 3;
        const TOUCHPAD = 1 << 4;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct KeyFlags: u32 {
        const FROM_SYSTEM = 1 << 0;
        const VIRTUAL_HARD_KEY = 1 << 1;
        const CANCELED = 1 << 2;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct PolicyFlags: u32 {
        /// Initial down on an external device; should wake the system.
        const WAKE_DROPPED = 1 << 0;
        /// Generated from a virtual key region.
        const VIRTUAL = 1 << 1;
    }
}

pub const KEYCODE_BACK: i32 = 4;
pub const KEYCODE_FORWARD: i32 = 125;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Down,
    Up,
}

/// Motion action; pointer up/down carry the index of the changed pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionAction {
    Down,
    Up,
    Move,
    Cancel,
    PointerDown(usize),
    PointerUp(usize),
    HoverEnter,
    HoverMove,
    HoverExit,
    Scroll,
}

impl fmt::Display for MotionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MotionAction::Down => write!(f, "DOWN"),
            MotionAction::Up => write!(f, "UP"),
            MotionAction::Move => write!(f, "MOVE"),
            MotionAction::Cancel => write!(f, "CANCEL"),
            MotionAction::PointerDown(i) => write!(f, "POINTER_DOWN({})", i),
            MotionAction::PointerUp(i) => write!(f, "POINTER_UP({})", i),
            MotionAction::HoverEnter => write!(f, "HOVER_ENTER"),
            MotionAction::HoverMove => write!(f, "HOVER_MOVE"),
            MotionAction::HoverExit => write!(f, "HOVER_EXIT"),
            MotionAction::Scroll => write!(f, "SCROLL"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NotifyKeyArgs {
    pub when: Duration,
    pub device_id: i32,
    pub source: Source,
    pub policy_flags: PolicyFlags,
    pub action: KeyAction,
    pub flags: KeyFlags,
    pub key_code: i32,
    pub scan_code: i32,
    pub meta_state: i32,
    pub down_time: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NotifyMotionArgs {
    pub when: Duration,
    pub device_id: i32,
    pub source: Source,
    pub policy_flags: PolicyFlags,
    pub action: MotionAction,
    pub meta_state: i32,
    pub button_state: ButtonState,
    pub properties: Vec<PointerProperties>,
    pub coords: Vec<PointerCoords>,
    pub x_precision: f32,
    pub y_precision: f32,
    pub down_time: Duration,
}

impl NotifyMotionArgs {
    pub fn pointer_ids(&self) -> Vec<u32> {
        self.properties.iter().map(|p| p.id).collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    Key(NotifyKeyArgs),
    Motion(NotifyMotionArgs),
}

impl Notification {
    pub fn as_motion(&self) -> Option<&NotifyMotionArgs> {
        match self {
            Notification::Motion(m) => Some(m),
            Notification::Key(_) => None,
        }
    }

    pub fn as_key(&self) -> Option<&NotifyKeyArgs> {
        match self {
            Notification::Key(k) => Some(k),
            Notification::Motion(_) => None,
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notification::Key(k) => write!(
                f,
                "{:>12.3}ms KEY {:?} keyCode={} scanCode={} flags={:?} downTime={:.3}ms",
                k.when.as_secs_f64() * 1e3,
                k.action,
                k.key_code,
                k.scan_code,
                k.flags,
                k.down_time.as_secs_f64() * 1e3
            ),
            Notification::Motion(m) => {
                write!(
                    f,
                    "{:>12.3}ms MOTION {} buttons={:?} downTime={:.3}ms",
                    m.when.as_secs_f64() * 1e3,
                    m.action,
                    m.button_state,
                    m.down_time.as_secs_f64() * 1e3
                )?;
                for (p, c) in m.properties.iter().zip(&m.coords) {
                    write!(
                        f,
                        " [id={} {} x={:.1} y={:.1} p={:.2}",
                        p.id, p.tool_type, c.x, c.y, c.pressure
                    )?;
                    if c.vscroll != 0.0 || c.hscroll != 0.0 {
                        write!(f, " vscroll={:.2} hscroll={:.2}", c.vscroll, c.hscroll)?;
                    }
                    write!(f, "]")?;
                }
                Ok(())
            }
        }
    }
}

/// Fields shared by every motion of one dispatch pass.
#[derive(Debug, Clone, Copy)]
pub struct MotionTemplate {
    pub when: Duration,
    pub source: Source,
    pub policy_flags: PolicyFlags,
    pub meta_state: i32,
    pub button_state: ButtonState,
    pub x_precision: f32,
    pub y_precision: f32,
    pub down_time: Duration,
}

/// Collects notifications for one engine call. Nothing is delivered until the
/// caller takes the batch, after all engine state has been updated.
#[derive(Debug, Default)]
pub struct Emitter {
    pub device_id: i32,
    pending: Vec<Notification>,
}

impl Emitter {
    pub fn new(device_id: i32) -> Self {
        Self {
            device_id,
            pending: Vec::new(),
        }
    }

    pub fn take(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.pending)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn key(
        &mut self,
        when: Duration,
        source: Source,
        policy_flags: PolicyFlags,
        action: KeyAction,
        flags: KeyFlags,
        key_code: i32,
        scan_code: i32,
        meta_state: i32,
        down_time: Duration,
    ) {
        self.pending.push(Notification::Key(NotifyKeyArgs {
            when,
            device_id: self.device_id,
            source,
            policy_flags,
            action,
            flags,
            key_code,
            scan_code,
            meta_state,
            down_time,
        }));
    }

    /// Emit a motion for the pointers of `properties`/`coords` whose ids are in
    /// `ids`, ordered by id.
    ///
    /// For pointer up/down, `changed_id` names the pointer; its position among
    /// the emitted pointers becomes the action index, and a lone pointer turns
    /// the action into a plain DOWN or UP.
    pub fn motion(
        &mut self,
        tpl: &MotionTemplate,
        action: MotionAction,
        properties: &[PointerProperties],
        coords: &[PointerCoords],
        ids: IdSet,
        changed_id: Option<u32>,
    ) {
        let mut out_props = Vec::with_capacity(ids.count());
        let mut out_coords = Vec::with_capacity(ids.count());
        let mut changed_index = None;
        for id in ids.iter() {
            let Some(index) = properties.iter().position(|p| p.id == id) else {
                continue;
            };
            let Some(c) = coords.get(index) else {
                continue;
            };
            if changed_id == Some(id) {
                changed_index = Some(out_props.len());
            }
            out_props.push(properties[index]);
            out_coords.push(*c);
        }
        if out_props.is_empty() {
            log::debug!("Dropping {} with no pointers", action);
            return;
        }

        let single = out_props.len() == 1;
        let action = match (action, changed_index) {
            (MotionAction::PointerDown(_), Some(_)) if single => MotionAction::Down,
            (MotionAction::PointerUp(_), Some(_)) if single => MotionAction::Up,
            (MotionAction::PointerDown(_), Some(i)) => MotionAction::PointerDown(i),
            (MotionAction::PointerUp(_), Some(i)) => MotionAction::PointerUp(i),
            (other, _) => other,
        };

        self.pending.push(Notification::Motion(NotifyMotionArgs {
            when: tpl.when,
            device_id: self.device_id,
            source: tpl.source,
            policy_flags: tpl.policy_flags,
            action,
            meta_state: tpl.meta_state,
            button_state: tpl.button_state,
            properties: out_props,
            coords: out_coords,
            x_precision: tpl.x_precision,
            y_precision: tpl.y_precision,
            down_time: tpl.down_time,
        }));
    }
}

/// Copy the properties and coordinates of `ids` from `src` into `dst`.
/// Returns whether anything changed.
pub fn update_moved_pointers(
    src_props: &[PointerProperties],
    src_coords: &[PointerCoords],
    dst_props: &mut [PointerProperties],
    dst_coords: &mut [PointerCoords],
    ids: IdSet,
) -> bool {
    let mut changed = false;
    for (sp, sc) in src_props.iter().zip(src_coords) {
        if !ids.contains(sp.id) {
            continue;
        }
        for (dp, dc) in dst_props.iter_mut().zip(dst_coords.iter_mut()) {
            if dp.id != sp.id {
                continue;
            }
            if dp != sp {
                *dp = *sp;
                changed = true;
            }
            if dc != sc {
                *dc = *sc;
                changed = true;
            }
        }
    }
    changed
}

/// Emit BACK/FORWARD key events for mouse buttons that changed state.
#[allow(clippy::too_many_arguments)]
pub fn synthesize_button_keys(
    emitter: &mut Emitter,
    action: KeyAction,
    when: Duration,
    source: Source,
    policy_flags: PolicyFlags,
    meta_state: i32,
    last: ButtonState,
    current: ButtonState,
) {
    for (button, key_code) in [(ButtonState::BACK, KEYCODE_BACK), (ButtonState::FORWARD, KEYCODE_FORWARD)] {
        let fire = match action {
            KeyAction::Down => !last.contains(button) && current.contains(button),
            KeyAction::Up => last.contains(button) && !current.contains(button),
        };
        if fire {
            emitter.key(
                when,
                source,
                policy_flags,
                action,
                KeyFlags::empty(),
                key_code,
                0,
                meta_state,
                when,
            );
        }
    }
}
