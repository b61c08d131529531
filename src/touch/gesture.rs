//! Turns finger contacts on a touch pad into pointer gestures.
//!
//! One finger moves the pointer (hover) or drags after a tap, two or more
//! fingers press, swipe or manipulate freely, and a held button clicks or
//! drags at the pointer location.

use std::fmt;
use std::time::Duration;

use crate::config::GestureConfig;
use crate::orientation::Orientation;

use super::cursor::PointerCursor;
use super::notify::{
    update_moved_pointers, ButtonState, Emitter, MotionAction, MotionTemplate, PolicyFlags, Source,
};
use super::pointer::{IdSet, PointerCoords, PointerProperties, RawPointerData, ToolType, MAX_POINTER_ID};
use super::velocity::{VelocityControl, VelocityTracker};

const ID_SLOTS: usize = MAX_POINTER_ID as usize + 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GestureMode {
    /// No fingers down.
    #[default]
    Neutral,
    /// Input ignored for a moment after a multi-finger gesture or a button release.
    Quiet,
    /// One finger moving the pointer without pressing.
    Hover,
    /// A tap just finished; waiting to see whether a drag follows.
    Tap,
    /// A finger went down right after a tap and drags at the pointer.
    TapDrag,
    /// Two or more fingers resting; a single down at the pointer.
    Press,
    /// Two fingers moving together.
    Swipe,
    /// Fingers moving independently; each finger gets its own pointer.
    Freeform,
    /// The button is held and the active finger drags the pointer.
    ButtonClickOrDrag,
}

impl GestureMode {
    /// Modes that hold a pointer down.
    pub fn is_down(self) -> bool {
        matches!(
            self,
            GestureMode::Tap
                | GestureMode::TapDrag
                | GestureMode::ButtonClickOrDrag
                | GestureMode::Press
                | GestureMode::Swipe
                | GestureMode::Freeform
        )
    }
}

impl fmt::Display for GestureMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            GestureMode::Neutral => "NEUTRAL",
            GestureMode::Quiet => "QUIET",
            GestureMode::Hover => "HOVER",
            GestureMode::Tap => "TAP",
            GestureMode::TapDrag => "TAP_DRAG",
            GestureMode::Press => "PRESS",
            GestureMode::Swipe => "SWIPE",
            GestureMode::Freeform => "FREEFORM",
            GestureMode::ButtonClickOrDrag => "BUTTON_CLICK_OR_DRAG",
        };
        f.write_str(s)
    }
}

/// How the previous gesture ends before the current one is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Transition {
    /// Abandon the previous gesture with CANCEL.
    pub cancel: bool,
    /// Lift every pointer of the previous gesture.
    pub finish: bool,
}

/// The frames a gesture decision is made from.
#[derive(Debug, Clone, Copy)]
pub struct GestureInput<'a> {
    pub when: Duration,
    pub current: &'a RawPointerData,
    pub last: &'a RawPointerData,
    pub current_fingers: IdSet,
    pub last_fingers: IdSet,
    pub button_state: ButtonState,
}

/// Fields shared by the motions of one gesture dispatch.
#[derive(Debug, Clone, Copy)]
pub struct DispatchContext {
    pub when: Duration,
    pub source: Source,
    pub policy_flags: PolicyFlags,
    pub meta_state: i32,
    pub button_state: ButtonState,
    pub last_button_state: ButtonState,
}

/// Surface-derived scales the classifier works with.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GestureScales {
    pub movement: f32,
    pub zoom: f32,
    pub max_swipe_width: f32,
    pub orientation: Orientation,
}

#[derive(Debug, Clone)]
pub struct PointerGestures {
    config: GestureConfig,
    scales: GestureScales,

    first_touch_time: Option<Duration>,
    active_touch_id: Option<u32>,
    active_gesture_id: Option<u32>,

    current_mode: GestureMode,
    current_ids: IdSet,
    current_properties: Vec<PointerProperties>,
    current_coords: Vec<PointerCoords>,

    last_mode: GestureMode,
    last_ids: IdSet,
    last_properties: Vec<PointerProperties>,
    last_coords: Vec<PointerCoords>,

    down_time: Duration,

    tap_down_time: Option<Duration>,
    tap_up_time: Option<Duration>,
    tap_x: f32,
    tap_y: f32,

    quiet_time: Option<Duration>,

    reference_ids: IdSet,
    reference_touch: (f32, f32),
    reference_gesture: (f32, f32),
    reference_deltas: [(f32, f32); ID_SLOTS],

    freeform_touch_to_gesture: [u32; ID_SLOTS],

    velocity_tracker: VelocityTracker,
}

impl Default for PointerGestures {
    fn default() -> Self {
        Self::new(GestureConfig::default(), GestureScales::default())
    }
}

/// Combine two per-axis deltas into the movement they share: the smaller
/// one when they point the same way, nothing when they disagree.
fn common_component(a: f32, b: f32) -> f32 {
    if a > 0.0 && b > 0.0 {
        a.min(b)
    } else if a < 0.0 && b < 0.0 {
        a.max(b)
    } else {
        0.0
    }
}

impl PointerGestures {
    pub fn new(config: GestureConfig, scales: GestureScales) -> Self {
        Self {
            config,
            scales,
            first_touch_time: None,
            active_touch_id: None,
            active_gesture_id: None,
            current_mode: GestureMode::Neutral,
            current_ids: IdSet::empty(),
            current_properties: Vec::new(),
            current_coords: Vec::new(),
            last_mode: GestureMode::Neutral,
            last_ids: IdSet::empty(),
            last_properties: Vec::new(),
            last_coords: Vec::new(),
            down_time: Duration::ZERO,
            tap_down_time: None,
            tap_up_time: None,
            tap_x: 0.0,
            tap_y: 0.0,
            quiet_time: None,
            reference_ids: IdSet::empty(),
            reference_touch: (0.0, 0.0),
            reference_gesture: (0.0, 0.0),
            reference_deltas: [(0.0, 0.0); ID_SLOTS],
            freeform_touch_to_gesture: [0; ID_SLOTS],
            velocity_tracker: VelocityTracker::new(),
        }
    }

    pub fn configure(&mut self, config: GestureConfig, scales: GestureScales) {
        self.config = config;
        self.scales = scales;
    }

    pub fn reset(&mut self) {
        self.first_touch_time = None;
        self.active_touch_id = None;
        self.active_gesture_id = None;
        self.current_mode = GestureMode::Neutral;
        self.current_ids.clear();
        self.current_properties.clear();
        self.current_coords.clear();
        self.last_mode = GestureMode::Neutral;
        self.last_ids.clear();
        self.last_properties.clear();
        self.last_coords.clear();
        self.down_time = Duration::ZERO;
        self.velocity_tracker.clear();
        self.reset_tap();
        self.quiet_time = None;
    }

    fn reset_tap(&mut self) {
        self.tap_down_time = None;
        self.tap_up_time = None;
    }

    /// Mode decided by the latest dispatch.
    pub fn mode(&self) -> GestureMode {
        self.last_mode
    }

    /// Gesture ids currently held down.
    pub fn active_ids(&self) -> IdSet {
        self.last_ids
    }

    /// When a pending tap turns into a click if no finger lands.
    pub fn next_timeout(&self) -> Option<Duration> {
        if self.last_mode == GestureMode::Tap {
            self.tap_up_time.map(|t| t + self.config.tap_drag_interval())
        } else {
            None
        }
    }

    fn set_single(&mut self, id: u32, x: f32, y: f32, pressure: f32) {
        self.current_ids = IdSet::from_iter([id]);
        self.current_properties.clear();
        self.current_properties.push(PointerProperties {
            id,
            tool_type: ToolType::Finger,
        });
        self.current_coords.clear();
        self.current_coords.push(PointerCoords {
            pressure,
            ..PointerCoords::at(x, y)
        });
    }

    fn clear_current(&mut self) {
        self.current_ids.clear();
        self.current_properties.clear();
        self.current_coords.clear();
    }

    /// Move the cursor by the active finger's motion since the last frame.
    fn follow(
        &self,
        id: u32,
        input: &GestureInput<'_>,
        cursor: &mut PointerCursor,
        velocity: &mut VelocityControl,
    ) {
        if !input.last_fingers.contains(id) {
            velocity.reset();
            return;
        }
        let current = input.current.pointer_for_id(id);
        let last = input.last.pointer_for_id(id);
        let dx = (current.x - last.x) as f32 * self.scales.movement;
        let dy = (current.y - last.y) as f32 * self.scales.movement;
        let (dx, dy) = self.scales.orientation.rotate_delta(dx, dy);
        let (dx, dy) = velocity.apply(input.when, dx, dy);
        cursor.move_by(dx, dy);
    }

    /// Handle an expired timeout. Returns `None` when nothing is due.
    pub fn prepare_timeout(
        &mut self,
        when: Duration,
        velocity: &mut VelocityControl,
    ) -> Option<Transition> {
        log::trace!("Gestures: processing timeout");
        if self.last_mode != GestureMode::Tap {
            return None;
        }
        let deadline = self.next_timeout()?;
        // Inclusive: callers hand back the exact value from `next_timeout`.
        if when < deadline {
            return None;
        }
        log::debug!("Gestures: TAP finished");
        self.active_gesture_id = None;
        self.current_mode = GestureMode::Neutral;
        self.clear_current();
        velocity.reset();
        Some(Transition {
            cancel: false,
            finish: true,
        })
    }

    /// Classify the current frame and compute the gesture pointers.
    pub fn prepare(
        &mut self,
        input: &GestureInput<'_>,
        cursor: &mut PointerCursor,
        velocity: &mut VelocityControl,
    ) -> Transition {
        let mut t = Transition::default();
        let when = input.when;
        let fingers = input.current_fingers;
        let finger_count = fingers.count();
        let last_finger_count = input.last_fingers.count();

        let positions: Vec<(f32, f32)> = fingers
            .iter()
            .map(|id| {
                let p = input.current.pointer_for_id(id);
                (p.x as f32 * self.scales.movement, p.y as f32 * self.scales.movement)
            })
            .collect();
        self.velocity_tracker.add_movement(when, fingers, &positions);

        // Keep the same active touch for as long as it stays down.
        match self.active_touch_id {
            None => {
                if let Some(first) = fingers.first() {
                    self.active_touch_id = Some(first);
                    self.first_touch_time = Some(when);
                }
            }
            Some(id) if !fingers.contains(id) => self.active_touch_id = fingers.first(),
            Some(_) => {}
        }

        let mut is_quiet = false;
        match self.active_touch_id {
            None => self.quiet_time = None,
            Some(_) => {
                is_quiet = self
                    .quiet_time
                    .is_some_and(|q| when < q + self.config.quiet_interval());
                if !is_quiet {
                    if matches!(
                        self.last_mode,
                        GestureMode::Press | GestureMode::Swipe | GestureMode::Freeform
                    ) && finger_count < 2
                    {
                        // A finger left over from a multi-finger gesture must not fling the pointer.
                        is_quiet = true;
                    } else if self.last_mode == GestureMode::ButtonClickOrDrag
                        && finger_count >= 2
                        && !input.button_state.is_pointer_down()
                    {
                        // The finger that pressed the button may still be resting.
                        is_quiet = true;
                    }
                    if is_quiet {
                        self.quiet_time = Some(when);
                    }
                }
            }
        }

        if is_quiet {
            log::debug!("Gestures: QUIET");
            if self.last_mode != GestureMode::Quiet {
                t.finish = true;
            }
            self.active_gesture_id = None;
            self.current_mode = GestureMode::Quiet;
            self.clear_current();
            velocity.reset();
        } else if input.button_state.is_pointer_down() {
            self.prepare_button_drag(input, cursor, velocity, &mut t);
        } else if finger_count == 0 {
            self.prepare_no_fingers(input, cursor, velocity, last_finger_count, &mut t);
        } else if finger_count == 1 {
            self.prepare_one_finger(input, cursor, velocity, last_finger_count, &mut t);
        } else {
            self.prepare_multi_finger(input, cursor, velocity, &mut t);
        }

        log::trace!(
            "Gestures: finish={} cancel={} mode={} ids={:?} last mode={} last ids={:?}",
            t.finish,
            t.cancel,
            self.current_mode,
            self.current_ids,
            self.last_mode,
            self.last_ids
        );
        t
    }

    fn prepare_button_drag(
        &mut self,
        input: &GestureInput<'_>,
        cursor: &mut PointerCursor,
        velocity: &mut VelocityControl,
        t: &mut Transition,
    ) {
        if self.last_mode != GestureMode::ButtonClickOrDrag {
            t.finish = true;
            self.active_gesture_id = Some(0);
        }

        // Follow the fastest finger so a second finger can take over the drag.
        if let Some(active) = self.active_touch_id {
            if input.current_fingers.count() > 1 {
                let mut best: Option<(u32, f32)> = None;
                for id in input.current_fingers.iter() {
                    if let Some((vx, vy)) = self.velocity_tracker.velocity(id) {
                        let speed = vx.hypot(vy);
                        let threshold = best.map_or(self.config.drag_min_switch_speed, |b| b.1);
                        if speed > threshold {
                            best = Some((id, speed));
                        }
                    }
                }
                if let Some((id, speed)) = best {
                    if id != active {
                        log::debug!(
                            "Gestures: BUTTON_CLICK_OR_DRAG switched pointers, id={} speed={:.3}",
                            id,
                            speed
                        );
                        self.active_touch_id = Some(id);
                    }
                }
            }
        }

        match self.active_touch_id {
            Some(id) => self.follow(id, input, cursor, velocity),
            None => velocity.reset(),
        }

        let (x, y) = cursor.position();
        self.current_mode = GestureMode::ButtonClickOrDrag;
        let id = self.active_gesture_id.unwrap_or(0);
        self.set_single(id, x, y, 1.0);
    }

    fn prepare_no_fingers(
        &mut self,
        input: &GestureInput<'_>,
        cursor: &PointerCursor,
        velocity: &mut VelocityControl,
        last_finger_count: usize,
        t: &mut Transition,
    ) {
        let when = input.when;
        if self.last_mode != GestureMode::Neutral {
            t.finish = true;
        }

        // Taps come out of HOVER, or out of TAP_DRAG for double taps.
        let mut tapped = false;
        if matches!(self.last_mode, GestureMode::Hover | GestureMode::TapDrag) && last_finger_count == 1 {
            let in_time = self
                .tap_down_time
                .is_some_and(|down| when <= down + self.config.tap_interval());
            if in_time {
                let (x, y) = cursor.position();
                if (x - self.tap_x).abs() <= self.config.tap_slop
                    && (y - self.tap_y).abs() <= self.config.tap_slop
                {
                    log::debug!("Gestures: TAP");
                    self.tap_up_time = Some(when);
                    self.active_gesture_id = Some(0);
                    self.current_mode = GestureMode::Tap;
                    self.set_single(0, self.tap_x, self.tap_y, 1.0);
                    tapped = true;
                } else {
                    log::debug!(
                        "Gestures: not a TAP, dx={:.3} dy={:.3}",
                        x - self.tap_x,
                        y - self.tap_y
                    );
                }
            } else {
                log::debug!("Gestures: not a TAP, held too long");
            }
        }

        velocity.reset();

        if !tapped {
            log::debug!("Gestures: NEUTRAL");
            self.active_gesture_id = None;
            self.current_mode = GestureMode::Neutral;
            self.clear_current();
        }
    }

    fn prepare_one_finger(
        &mut self,
        input: &GestureInput<'_>,
        cursor: &mut PointerCursor,
        velocity: &mut VelocityControl,
        last_finger_count: usize,
        t: &mut Transition,
    ) {
        let when = input.when;
        self.current_mode = GestureMode::Hover;
        if self.last_mode == GestureMode::Tap {
            let in_time = self
                .tap_up_time
                .is_some_and(|up| when <= up + self.config.tap_drag_interval());
            if in_time {
                let (x, y) = cursor.position();
                if (x - self.tap_x).abs() <= self.config.tap_slop
                    && (y - self.tap_y).abs() <= self.config.tap_slop
                {
                    self.current_mode = GestureMode::TapDrag;
                } else {
                    log::debug!(
                        "Gestures: not a TAP_DRAG, dx={:.3} dy={:.3}",
                        x - self.tap_x,
                        y - self.tap_y
                    );
                }
            } else {
                log::debug!("Gestures: not a TAP_DRAG, too long since up");
            }
        } else if self.last_mode == GestureMode::TapDrag {
            self.current_mode = GestureMode::TapDrag;
        }

        if let Some(id) = self.active_touch_id {
            self.follow(id, input, cursor, velocity);
        }

        let down = if self.current_mode == GestureMode::TapDrag {
            log::debug!("Gestures: TAP_DRAG");
            true
        } else {
            log::trace!("Gestures: HOVER");
            if self.last_mode != GestureMode::Hover {
                t.finish = true;
            }
            self.active_gesture_id = Some(0);
            false
        };

        let (x, y) = cursor.position();
        let id = self.active_gesture_id.unwrap_or(0);
        self.set_single(id, x, y, if down { 1.0 } else { 0.0 });

        if last_finger_count == 0 {
            self.reset_tap();
            self.tap_down_time = Some(when);
            self.tap_x = x;
            self.tap_y = y;
        }
    }

    fn prepare_multi_finger(
        &mut self,
        input: &GestureInput<'_>,
        cursor: &PointerCursor,
        velocity: &mut VelocityControl,
        t: &mut Transition,
    ) {
        let when = input.when;
        let fingers = input.current_fingers;
        let finger_count = fingers.count();
        let settled = self
            .first_touch_time
            .is_some_and(|first| when >= first + self.config.multitouch_settle_interval());

        if !matches!(
            self.last_mode,
            GestureMode::Press | GestureMode::Swipe | GestureMode::Freeform
        ) {
            t.finish = true;
        } else if !settled && finger_count > input.last_fingers.count() {
            log::debug!("Gestures: more fingers landed before settling, restarting");
            t.cancel = true;
        } else {
            self.current_mode = self.last_mode;
        }

        if t.finish || t.cancel {
            self.current_mode = GestureMode::Press;
            self.active_gesture_id = Some(0);
            self.reference_ids.clear();
            velocity.reset();
            self.reference_touch = input.current.centroid_of_touching();
            self.reference_gesture = cursor.position();
        }

        for id in fingers.difference(self.reference_ids).iter() {
            self.reference_deltas[id as usize] = (0.0, 0.0);
        }
        self.reference_ids = fingers;

        let mut common = (0.0f32, 0.0f32);
        let mut first = true;
        for id in input.last_fingers.intersection(fingers).iter() {
            let current = input.current.pointer_for_id(id);
            let last = input.last.pointer_for_id(id);
            let delta = &mut self.reference_deltas[id as usize];
            delta.0 += (current.x - last.x) as f32;
            delta.1 += (current.y - last.y) as f32;
            if first {
                common = *delta;
                first = false;
            } else {
                common.0 = common_component(common.0, delta.0);
                common.1 = common_component(common.1, delta.1);
            }
        }

        let zoom = self.scales.zoom;
        let min_distance = self.config.multitouch_min_distance;
        if self.current_mode == GestureMode::Press {
            let distance = |deltas: &[(f32, f32); ID_SLOTS], id: u32| {
                let (dx, dy) = deltas[id as usize];
                (dx * zoom).hypot(dy * zoom)
            };
            let moved = self
                .reference_ids
                .iter()
                .filter(|&id| distance(&self.reference_deltas, id) > min_distance)
                .count();

            // Wait until at least two fingers travelled.
            if moved >= 2 {
                if finger_count > 2 {
                    log::debug!("Gestures: PRESS -> FREEFORM, {} fingers", finger_count);
                    t.cancel = true;
                    self.current_mode = GestureMode::Freeform;
                } else {
                    let mut ids = fingers.iter();
                    if let (Some(id1), Some(id2)) = (ids.next(), ids.next()) {
                        let p1 = input.current.pointer_for_id(id1);
                        let p2 = input.current.pointer_for_id(id2);
                        let mutual = ((p1.x - p2.x) as f32).hypot((p1.y - p2.y) as f32);
                        if mutual > self.scales.max_swipe_width {
                            log::debug!(
                                "Gestures: PRESS -> FREEFORM, spread {:.3} > {:.3}",
                                mutual,
                                self.scales.max_swipe_width
                            );
                            t.cancel = true;
                            self.current_mode = GestureMode::Freeform;
                        } else {
                            let dist1 = distance(&self.reference_deltas, id1);
                            let dist2 = distance(&self.reference_deltas, id2);
                            if dist1 >= min_distance && dist2 >= min_distance {
                                let d1 = self.reference_deltas[id1 as usize];
                                let d2 = self.reference_deltas[id2 as usize];
                                let dot = d1.0 * zoom * d2.0 * zoom + d1.1 * zoom * d2.1 * zoom;
                                let cosine = dot / (dist1 * dist2);
                                if cosine >= self.config.swipe_transition_angle_cosine {
                                    log::debug!("Gestures: PRESS -> SWIPE, cosine {:.3}", cosine);
                                    self.current_mode = GestureMode::Swipe;
                                } else {
                                    log::debug!("Gestures: PRESS -> FREEFORM, cosine {:.3}", cosine);
                                    t.cancel = true;
                                    self.current_mode = GestureMode::Freeform;
                                }
                            }
                        }
                    }
                }
            }
        } else if self.current_mode == GestureMode::Swipe && finger_count > 2 {
            log::debug!("Gestures: SWIPE -> FREEFORM, {} fingers", finger_count);
            t.cancel = true;
            self.current_mode = GestureMode::Freeform;
        }

        // The group moves the reference point, except while a press is undecided.
        if self.current_mode != GestureMode::Press && (common.0 != 0.0 || common.1 != 0.0) {
            for id in self.reference_ids.iter() {
                self.reference_deltas[id as usize] = (0.0, 0.0);
            }
            self.reference_touch.0 += common.0;
            self.reference_touch.1 += common.1;

            let (dx, dy) = self
                .scales
                .orientation
                .rotate_delta(common.0 * self.scales.movement, common.1 * self.scales.movement);
            let (dx, dy) = velocity.apply(when, dx, dy);
            self.reference_gesture.0 += dx;
            self.reference_gesture.1 += dy;
        }

        match self.current_mode {
            GestureMode::Press | GestureMode::Swipe => {
                let id = self.active_gesture_id.unwrap_or(0);
                let (x, y) = self.reference_gesture;
                self.set_single(id, x, y, 1.0);
            }
            GestureMode::Freeform => self.assign_freeform(input, t),
            _ => {}
        }
    }

    /// Give every finger its own gesture id, keeping the ids of fingers that
    /// were already mapped.
    fn assign_freeform(&mut self, input: &GestureInput<'_>, t: &Transition) {
        let fingers = input.current_fingers;
        let mut mapped = IdSet::empty();
        let mut used = IdSet::empty();

        if self.last_mode != GestureMode::Freeform {
            match (t.cancel, self.active_touch_id, self.active_gesture_id) {
                (false, Some(touch), Some(gesture)) => {
                    mapped.insert(touch);
                    used.insert(gesture);
                    self.freeform_touch_to_gesture[touch as usize] = gesture;
                }
                _ => self.active_gesture_id = None,
            }
        } else {
            mapped = input.last_fingers.intersection(fingers);
            used = self.last_ids;

            let lifted = input.last_fingers.difference(fingers);
            if lifted
                .iter()
                .any(|id| Some(self.freeform_touch_to_gesture[id as usize]) == self.active_gesture_id)
            {
                self.active_gesture_id = None;
            }
        }

        self.clear_current();
        let zoom = self.scales.zoom;
        for touch in fingers.iter() {
            let gesture = if mapped.contains(touch) {
                self.freeform_touch_to_gesture[touch as usize]
            } else {
                let Some(gesture) = used.insert_first_free() else {
                    log::warn!("Gestures: no free gesture id for touch {}", touch);
                    continue;
                };
                self.freeform_touch_to_gesture[touch as usize] = gesture;
                gesture
            };
            self.current_ids.insert(gesture);

            let p = input.current.pointer_for_id(touch);
            let (dx, dy) = self.scales.orientation.rotate_delta(
                (p.x as f32 - self.reference_touch.0) * zoom,
                (p.y as f32 - self.reference_touch.1) * zoom,
            );
            self.current_properties.push(PointerProperties {
                id: gesture,
                tool_type: ToolType::Finger,
            });
            self.current_coords.push(PointerCoords {
                pressure: 1.0,
                ..PointerCoords::at(self.reference_gesture.0 + dx, self.reference_gesture.1 + dy)
            });
        }

        if self.active_gesture_id.is_none() {
            self.active_gesture_id = self.current_ids.first();
            log::debug!("Gestures: FREEFORM active gesture id {:?}", self.active_gesture_id);
        }
    }

    fn template(&self, ctx: &DispatchContext) -> MotionTemplate {
        MotionTemplate {
            when: ctx.when,
            source: ctx.source,
            policy_flags: ctx.policy_flags,
            meta_state: ctx.meta_state,
            button_state: ctx.button_state,
            x_precision: 0.0,
            y_precision: 0.0,
            down_time: self.down_time,
        }
    }

    /// Emit the motions that take the previous gesture to the current one.
    pub fn dispatch(
        &mut self,
        transition: Transition,
        ctx: &DispatchContext,
        cursor_position: (f32, f32),
        emitter: &mut Emitter,
    ) {
        let finish = transition.finish;
        let cancel = transition.cancel && !finish;
        let mode = self.current_mode;
        let down = mode.is_down();

        // Refresh the last coordinates of moved pointers so they are seen
        // together with any pointers going up.
        let mut move_needed = false;
        if down && !cancel && !finish && !self.last_ids.is_empty() && !self.current_ids.is_empty() {
            let moved = self.current_ids.intersection(self.last_ids);
            move_needed = update_moved_pointers(
                &self.current_properties,
                &self.current_coords,
                &mut self.last_properties,
                &mut self.last_coords,
                moved,
            );
            if ctx.button_state != ctx.last_button_state {
                move_needed = true;
            }
        }

        let mut dispatched = self.last_ids;
        if !dispatched.is_empty() {
            let tpl = self.template(ctx);
            if cancel {
                emitter.motion(
                    &tpl,
                    MotionAction::Cancel,
                    &self.last_properties,
                    &self.last_coords,
                    dispatched,
                    None,
                );
                dispatched.clear();
            } else {
                let up = if finish {
                    dispatched
                } else {
                    dispatched.difference(self.current_ids)
                };
                for id in up.iter() {
                    emitter.motion(
                        &tpl,
                        MotionAction::PointerUp(0),
                        &self.last_properties,
                        &self.last_coords,
                        dispatched,
                        Some(id),
                    );
                    dispatched.remove(id);
                }
            }
        }

        if move_needed {
            emitter.motion(
                &self.template(ctx),
                MotionAction::Move,
                &self.current_properties,
                &self.current_coords,
                dispatched,
                None,
            );
        }

        if down {
            for id in self.current_ids.difference(dispatched).iter() {
                dispatched.insert(id);
                if dispatched.count() == 1 {
                    self.down_time = ctx.when;
                }
                emitter.motion(
                    &self.template(ctx),
                    MotionAction::PointerDown(0),
                    &self.current_properties,
                    &self.current_coords,
                    dispatched,
                    Some(id),
                );
            }
        }

        if mode == GestureMode::Hover {
            emitter.motion(
                &self.template(ctx),
                MotionAction::HoverMove,
                &self.current_properties,
                &self.current_coords,
                self.current_ids,
                None,
            );
        } else if dispatched.is_empty() && !self.last_ids.is_empty() {
            // Everything went up: report the pointer hovering again so the
            // next touch starts from a fresh hover.
            let props = [PointerProperties {
                id: 0,
                tool_type: ToolType::Finger,
            }];
            let coords = [PointerCoords::at(cursor_position.0, cursor_position.1)];
            emitter.motion(
                &self.template(ctx),
                MotionAction::HoverMove,
                &props,
                &coords,
                IdSet::from_iter([0]),
                None,
            );
        }

        if self.last_mode != mode {
            log::debug!("Gestures: {} -> {}", self.last_mode, mode);
        }
        self.last_mode = mode;
        if down {
            self.last_ids = self.current_ids;
            self.last_properties.clone_from(&self.current_properties);
            self.last_coords.clone_from(&self.current_coords);
        } else {
            self.last_ids.clear();
            self.last_properties.clear();
            self.last_coords.clear();
        }
    }

    /// Cancel whatever is down and start over.
    pub fn abort(&mut self, ctx: &DispatchContext, emitter: &mut Emitter) {
        if !self.last_ids.is_empty() {
            emitter.motion(
                &self.template(ctx),
                MotionAction::Cancel,
                &self.last_properties,
                &self.last_coords,
                self.last_ids,
                None,
            );
        }
        self.reset();
    }
}
