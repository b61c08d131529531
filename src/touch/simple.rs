//! Single-pointer usages of a pointer-mode device: a stylus positioned
//! absolutely, or a mouse tool moved by relative deltas.

use std::time::Duration;

use crate::orientation::Orientation;

use super::cursor::PointerCursor;
use super::notify::{ButtonState, Emitter, MotionAction, MotionTemplate};
use super::pointer::{CookedPointerData, IdSet, PointerCoords, PointerProperties, RawPointerData};
use super::velocity::VelocityControl;

/// What a pointer-mode device is currently driving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PointerUsage {
    #[default]
    None,
    Gestures,
    Stylus,
    Mouse,
}

/// Relative-motion inputs for the mouse tool.
#[derive(Debug, Clone, Copy)]
pub struct MouseInput<'a> {
    pub when: Duration,
    pub current: &'a RawPointerData,
    pub last: &'a RawPointerData,
    pub cooked: &'a CookedPointerData,
    pub mouse_ids: IdSet,
    pub last_mouse_ids: IdSet,
    pub button_state: ButtonState,
    pub movement_scale: f32,
    pub orientation: Orientation,
}

/// State of the single reported pointer.
#[derive(Debug, Clone, Default)]
pub struct PointerSimple {
    down: bool,
    hovering: bool,
    down_time: Duration,
    current_properties: PointerProperties,
    current_coords: PointerCoords,
    last_properties: PointerProperties,
    last_coords: PointerCoords,
}

impl PointerSimple {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_down(&self) -> bool {
        self.down
    }

    pub fn is_hovering(&self) -> bool {
        self.hovering
    }

    fn clear_current(&mut self) {
        self.current_properties = PointerProperties::default();
        self.current_coords = PointerCoords::default();
    }

    /// Place the pointer at the first stylus. Returns `(down, hovering)`.
    pub fn prepare_stylus(
        &mut self,
        cooked: &CookedPointerData,
        stylus_ids: IdSet,
        cursor: &mut PointerCursor,
    ) -> (bool, bool) {
        self.clear_current();
        let Some(id) = stylus_ids.first() else {
            return (false, false);
        };
        let coords = *cooked.coords_for_id(id);
        cursor.set_position(coords.x, coords.y);
        let (x, y) = cursor.position();

        self.current_coords = PointerCoords { x, y, ..coords };
        self.current_properties = PointerProperties {
            id: 0,
            tool_type: cooked.properties_for_id(id).tool_type,
        };
        let hovering = cooked.hovering_ids.contains(id);
        (!hovering, hovering)
    }

    /// Move the pointer by the first mouse tool's delta. Returns `(down, hovering)`.
    pub fn prepare_mouse(
        &mut self,
        input: &MouseInput<'_>,
        cursor: &mut PointerCursor,
        velocity: &mut VelocityControl,
    ) -> (bool, bool) {
        self.clear_current();
        let Some(id) = input.mouse_ids.first() else {
            velocity.reset();
            return (false, false);
        };

        if input.last_mouse_ids.contains(id) {
            let current = input.current.pointer_for_id(id);
            let last = input.last.pointer_for_id(id);
            let dx = (current.x - last.x) as f32 * input.movement_scale;
            let dy = (current.y - last.y) as f32 * input.movement_scale;
            let (dx, dy) = input.orientation.rotate_delta(dx, dy);
            let (dx, dy) = velocity.apply(input.when, dx, dy);
            cursor.move_by(dx, dy);
        } else {
            velocity.reset();
        }

        let down = input.button_state.is_pointer_down();
        let (x, y) = cursor.position();
        self.current_coords = PointerCoords {
            x,
            y,
            pressure: if down { 1.0 } else { 0.0 },
            ..*input.cooked.coords_for_id(id)
        };
        self.current_properties = PointerProperties {
            id: 0,
            tool_type: input.cooked.properties_for_id(id).tool_type,
        };
        (down, !down)
    }

    /// Emit the transitions from the previous pointer state to `(down, hovering)`,
    /// then a SCROLL if the wheel moved.
    ///
    /// `base` carries the shared fields; button state and down time are
    /// filled in per motion.
    pub fn dispatch(
        &mut self,
        base: &MotionTemplate,
        last_button_state: ButtonState,
        down: bool,
        hovering: bool,
        scroll: Option<(f32, f32)>,
        emitter: &mut Emitter,
    ) {
        let ids = IdSet::from_iter([0]);

        if self.down && !down {
            self.down = false;
            let tpl = MotionTemplate {
                button_state: last_button_state,
                down_time: self.down_time,
                ..*base
            };
            emitter.motion(&tpl, MotionAction::Up, &[self.last_properties], &[self.last_coords], ids, None);
        }

        if self.hovering && !hovering {
            self.hovering = false;
            let tpl = MotionTemplate {
                button_state: last_button_state,
                down_time: self.down_time,
                ..*base
            };
            emitter.motion(
                &tpl,
                MotionAction::HoverExit,
                &[self.last_properties],
                &[self.last_coords],
                ids,
                None,
            );
        }

        let props = [self.current_properties];
        let coords = [self.current_coords];

        if down {
            if !self.down {
                self.down = true;
                self.down_time = base.when;
                let tpl = MotionTemplate {
                    down_time: self.down_time,
                    ..*base
                };
                emitter.motion(&tpl, MotionAction::Down, &props, &coords, ids, None);
            }
            let tpl = MotionTemplate {
                down_time: self.down_time,
                ..*base
            };
            emitter.motion(&tpl, MotionAction::Move, &props, &coords, ids, None);
        }

        if hovering {
            let tpl = MotionTemplate {
                down_time: self.down_time,
                ..*base
            };
            if !self.hovering {
                self.hovering = true;
                emitter.motion(&tpl, MotionAction::HoverEnter, &props, &coords, ids, None);
            }
            emitter.motion(&tpl, MotionAction::HoverMove, &props, &coords, ids, None);
        }

        if let Some((vscroll, hscroll)) = scroll {
            let tpl = MotionTemplate {
                down_time: self.down_time,
                ..*base
            };
            let scrolled = [PointerCoords {
                vscroll,
                hscroll,
                ..self.current_coords
            }];
            emitter.motion(&tpl, MotionAction::Scroll, &props, &scrolled, ids, None);
        }

        if down || hovering {
            self.last_properties = self.current_properties;
            self.last_coords = self.current_coords;
        } else {
            self.reset();
        }
    }

    /// Lift or un-hover the pointer.
    pub fn abort(&mut self, base: &MotionTemplate, last_button_state: ButtonState, emitter: &mut Emitter) {
        self.clear_current();
        self.dispatch(base, last_button_state, false, false, None, emitter);
    }
}
