//! The touch engine for one device: decodes each frame, cooks it, and
//! dispatches the touches directly or through a pointer.

use std::time::Duration;

use crate::config::ReaderConfig;
use crate::context::ReaderContext;
use crate::device::DeviceInfo;
use crate::input::event::{EV_SYN, SYN_DROPPED};
use crate::input::RawEvent;
use crate::orientation::Orientation;

use super::assign::{assign_pointer_ids, PointerIdAllocator};
use super::buttons::{CursorButtonAccumulator, ScrollAccumulator, TouchButtonAccumulator};
use super::calibration::{Calibration, DeviceParameters};
use super::cursor::PointerCursor;
use super::gesture::{DispatchContext, GestureInput, GestureMode, GestureScales, PointerGestures};
use super::notify::{
    synthesize_button_keys, update_moved_pointers, ButtonState, Emitter, KeyAction, MotionAction,
    MotionTemplate, Notification, PolicyFlags, Source,
};
use super::pointer::{CookedPointerData, IdSet, RawPointerData, ToolType};
use super::simple::{MouseInput, PointerSimple, PointerUsage};
use super::slots::MotionAccumulator;
use super::surface::{DeviceMode, RawPointerAxes, SurfaceGeometry};
use super::velocity::VelocityControl;
use super::virtual_keys::{KeyState, VirtualKeyDetector};

/// What one engine call produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Output {
    /// Notifications in emission order. Engine state is final by the time
    /// the caller sees them.
    pub notifications: Vec<Notification>,
    /// Call [`TouchMapper::timeout_expired`] no earlier than this.
    pub next_timeout: Option<Duration>,
}

#[derive(Debug)]
pub struct TouchMapper {
    name: String,
    external: bool,
    config: ReaderConfig,
    parameters: DeviceParameters,
    mode: DeviceMode,
    source: Source,
    geometry: SurfaceGeometry,
    virtual_keys: VirtualKeyDetector,

    motion: MotionAccumulator,
    touch_buttons: TouchButtonAccumulator,
    cursor_buttons: CursorButtonAccumulator,
    scroll: ScrollAccumulator,
    allocator: PointerIdAllocator,
    pressure_valid: bool,

    current_raw: RawPointerData,
    last_raw: RawPointerData,
    current_cooked: CookedPointerData,
    last_cooked: CookedPointerData,
    current_buttons: ButtonState,
    last_buttons: ButtonState,
    current_vscroll: f32,
    current_hscroll: f32,
    current_finger_ids: IdSet,
    last_finger_ids: IdSet,
    current_stylus_ids: IdSet,
    last_stylus_ids: IdSet,
    current_mouse_ids: IdSet,
    last_mouse_ids: IdSet,
    sent_hover_enter: bool,
    down_time: Duration,

    usage: PointerUsage,
    gestures: PointerGestures,
    simple: PointerSimple,
    cursor: PointerCursor,
    pointer_velocity: VelocityControl,
    wheel_x_velocity: VelocityControl,
    wheel_y_velocity: VelocityControl,

    emitter: Emitter,
    dropping: bool,
}

impl TouchMapper {
    pub fn new(device_id: i32, device: &dyn DeviceInfo, config: &ReaderConfig) -> Self {
        let mut mapper = Self {
            name: device.name().to_string(),
            external: device.is_external(),
            config: config.clone(),
            parameters: DeviceParameters::configure(device),
            mode: DeviceMode::Disabled,
            source: Source::empty(),
            geometry: SurfaceGeometry::default(),
            virtual_keys: VirtualKeyDetector::default(),
            motion: MotionAccumulator::configure(device),
            touch_buttons: TouchButtonAccumulator::default(),
            cursor_buttons: CursorButtonAccumulator::default(),
            scroll: ScrollAccumulator::default(),
            allocator: PointerIdAllocator::new(),
            pressure_valid: false,
            current_raw: RawPointerData::new(),
            last_raw: RawPointerData::new(),
            current_cooked: CookedPointerData::new(),
            last_cooked: CookedPointerData::new(),
            current_buttons: ButtonState::empty(),
            last_buttons: ButtonState::empty(),
            current_vscroll: 0.0,
            current_hscroll: 0.0,
            current_finger_ids: IdSet::empty(),
            last_finger_ids: IdSet::empty(),
            current_stylus_ids: IdSet::empty(),
            last_stylus_ids: IdSet::empty(),
            current_mouse_ids: IdSet::empty(),
            last_mouse_ids: IdSet::empty(),
            sent_hover_enter: false,
            down_time: Duration::ZERO,
            usage: PointerUsage::None,
            gestures: PointerGestures::default(),
            simple: PointerSimple::default(),
            cursor: PointerCursor::default(),
            pointer_velocity: VelocityControl::new(config.pointer_velocity),
            wheel_x_velocity: VelocityControl::new(config.wheel_velocity),
            wheel_y_velocity: VelocityControl::new(config.wheel_velocity),
            emitter: Emitter::new(device_id),
            dropping: false,
        };
        mapper.configure(device, config);
        mapper.reset_state(device);
        mapper
    }

    fn configure(&mut self, device: &dyn DeviceInfo, config: &ReaderConfig) {
        self.config = config.clone();
        self.name = device.name().to_string();
        self.external = device.is_external();
        self.parameters = DeviceParameters::configure(device);
        self.motion = MotionAccumulator::configure(device);
        self.touch_buttons.configure(device);
        self.scroll.configure(device);

        let axes = RawPointerAxes::configure(device, self.motion.is_multi_touch());
        self.pressure_valid = axes.pressure.is_some();
        let mut calibration = Calibration::parse(&device.configuration());
        calibration.resolve(&axes);

        let has_stylus = self.touch_buttons.has_stylus() || self.motion.has_stylus();
        let display = config.display.as_ref();
        let (mut mode, source) = DeviceMode::select(
            &self.parameters,
            config.gestures.enabled,
            display.is_some(),
            has_stylus,
        );
        if axes.bounds().is_none() {
            log::warn!(
                "Touch device '{}' did not report support for X or Y axis; it will be inoperable",
                self.name
            );
            mode = DeviceMode::Disabled;
        } else if mode == DeviceMode::Disabled {
            log::info!(
                "Touch device '{}' has no display; it will be inoperable until one is configured",
                self.name
            );
        }

        let (width, height, orientation) = match (mode, display) {
            (DeviceMode::Direct | DeviceMode::Pointer, Some(d)) => {
                let orientation = if self.parameters.orientation_aware {
                    d.orientation
                } else {
                    Orientation::Natural
                };
                (d.width, d.height, orientation)
            }
            _ => (axes.raw_width(), axes.raw_height(), Orientation::Natural),
        };

        self.mode = mode;
        self.source = source;
        self.geometry = SurfaceGeometry::configure(
            axes,
            calibration,
            width,
            height,
            orientation,
            (width, height),
            &config.gestures,
        );
        self.virtual_keys = VirtualKeyDetector::configure(device, &self.geometry);

        self.cursor
            .configure(self.geometry.oriented_width, self.geometry.oriented_height);
        self.gestures.configure(
            config.gestures.clone(),
            GestureScales {
                movement: self.geometry.movement_scale,
                zoom: self.geometry.zoom_scale,
                max_swipe_width: self.geometry.max_swipe_width,
                orientation,
            },
        );
        self.pointer_velocity.set_parameters(config.pointer_velocity);
        self.wheel_x_velocity.set_parameters(config.wheel_velocity);
        self.wheel_y_velocity.set_parameters(config.wheel_velocity);

        log::info!(
            "Touch device '{}': mode {:?}, source {:?}, surface {}x{} {}, {} virtual keys",
            self.name,
            self.mode,
            self.source,
            width,
            height,
            orientation,
            self.virtual_keys.keys().len()
        );
    }

    /// Apply a new configuration. Live pointers are cancelled first.
    pub fn reconfigure(
        &mut self,
        when: Duration,
        device: &dyn DeviceInfo,
        config: &ReaderConfig,
        ctx: &ReaderContext,
    ) -> Output {
        self.cancel_live(when, ctx);
        self.virtual_keys.abort(when, ctx, &mut self.emitter);
        self.configure(device, config);
        self.reset_state(device);
        self.output()
    }

    /// Cancel everything in flight and reload state from the device.
    pub fn reset(&mut self, when: Duration, device: &dyn DeviceInfo, ctx: &ReaderContext) -> Output {
        self.cancel_live(when, ctx);
        self.virtual_keys.abort(when, ctx, &mut self.emitter);
        self.reset_state(device);
        self.output()
    }

    fn reset_state(&mut self, device: &dyn DeviceInfo) {
        self.cursor_buttons.reset(device);
        self.scroll.reset();
        self.touch_buttons.reset(device);
        self.motion.reset(device);
        self.allocator.reset();

        self.pointer_velocity.reset();
        self.wheel_x_velocity.reset();
        self.wheel_y_velocity.reset();

        self.current_raw.clear();
        self.last_raw.clear();
        self.current_cooked.clear();
        self.last_cooked.clear();
        self.current_buttons = ButtonState::empty();
        self.last_buttons = ButtonState::empty();
        self.current_vscroll = 0.0;
        self.current_hscroll = 0.0;
        self.current_finger_ids.clear();
        self.last_finger_ids.clear();
        self.current_stylus_ids.clear();
        self.last_stylus_ids.clear();
        self.current_mouse_ids.clear();
        self.last_mouse_ids.clear();
        self.usage = PointerUsage::None;
        self.sent_hover_enter = false;
        self.down_time = Duration::ZERO;

        self.virtual_keys.reset();
        self.gestures.reset();
        self.simple.reset();
    }

    /// Terminate every pointer that is down or hovering.
    fn cancel_live(&mut self, when: Duration, ctx: &ReaderContext) {
        match self.mode {
            DeviceMode::Pointer => self.abort_pointer_usage(when, PolicyFlags::empty(), ctx),
            DeviceMode::Direct | DeviceMode::Unscaled => {
                let tpl = self.direct_template(when, PolicyFlags::empty(), ctx, self.last_buttons);
                if !self.last_cooked.touching_ids.is_empty() {
                    self.emitter.motion(
                        &tpl,
                        MotionAction::Cancel,
                        &self.last_cooked.properties,
                        &self.last_cooked.coords,
                        self.last_cooked.touching_ids,
                        None,
                    );
                }
                if self.sent_hover_enter {
                    self.emitter.motion(
                        &tpl,
                        MotionAction::HoverExit,
                        &self.last_cooked.properties,
                        &self.last_cooked.coords,
                        self.last_cooked.hovering_ids,
                        None,
                    );
                    self.sent_hover_enter = false;
                }
            }
            DeviceMode::Disabled => {}
        }
    }

    /// Feed one raw event.
    ///
    /// A `SYN_DROPPED` cancels everything and the events up to and including
    /// the next `SYN_REPORT` are discarded.
    pub fn process(&mut self, event: &RawEvent, device: &dyn DeviceInfo, ctx: &mut ReaderContext) -> Output {
        if event.event_type == EV_SYN && event.code == SYN_DROPPED {
            log::info!("Touch device '{}' dropped events; resetting", self.name);
            self.dropping = true;
            return self.reset(event.when, device, ctx);
        }
        if self.dropping {
            if event.is_sync_report() {
                log::debug!("Touch device '{}' resynchronized", self.name);
                self.dropping = false;
            }
            return self.output();
        }

        self.cursor_buttons.process(event);
        self.scroll.process(event);
        self.touch_buttons.process(event);
        self.motion.process(event);

        if event.is_sync_report() {
            self.sync(event.when, ctx);
        }
        self.output()
    }

    /// Handle a deadline previously returned in [`Output::next_timeout`].
    pub fn timeout_expired(&mut self, when: Duration, ctx: &ReaderContext) -> Output {
        if self.mode == DeviceMode::Pointer && self.usage == PointerUsage::Gestures {
            self.dispatch_pointer_gestures(when, PolicyFlags::empty(), true, ctx);
        }
        self.output()
    }

    fn output(&mut self) -> Output {
        Output {
            notifications: self.emitter.take(),
            next_timeout: self.next_timeout(),
        }
    }

    pub fn next_timeout(&self) -> Option<Duration> {
        if self.mode == DeviceMode::Pointer && self.usage == PointerUsage::Gestures {
            self.gestures.next_timeout()
        } else {
            None
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn device_mode(&self) -> DeviceMode {
        self.mode
    }

    pub fn sources(&self) -> Source {
        self.source
    }

    pub fn geometry(&self) -> &SurfaceGeometry {
        &self.geometry
    }

    pub fn gesture_mode(&self) -> GestureMode {
        self.gestures.mode()
    }

    pub fn pointer_usage(&self) -> PointerUsage {
        self.usage
    }

    pub fn cursor_position(&self) -> (f32, f32) {
        self.cursor.position()
    }

    pub fn key_code_state(&self, key_code: i32) -> KeyState {
        self.virtual_keys.key_code_state(key_code)
    }

    pub fn scan_code_state(&self, scan_code: i32) -> KeyState {
        self.virtual_keys.scan_code_state(scan_code)
    }

    fn sync(&mut self, when: Duration, ctx: &mut ReaderContext) {
        self.current_buttons = self.touch_buttons.button_state() | self.cursor_buttons.button_state();
        self.current_vscroll = self.scroll.vwheel();
        self.current_hscroll = self.scroll.hwheel();
        self.scroll.finish_sync();

        let have_ids = self.motion.sync(
            &mut self.current_raw,
            &self.last_raw,
            &self.touch_buttons,
            self.pressure_valid,
            &mut self.allocator,
        );

        self.current_finger_ids.clear();
        self.current_stylus_ids.clear();
        self.current_mouse_ids.clear();
        self.current_cooked.clear();

        if self.mode == DeviceMode::Disabled {
            self.current_raw.clear();
            self.current_buttons = ButtonState::empty();
        } else {
            if !have_ids {
                assign_pointer_ids(&self.last_raw, &mut self.current_raw, &mut self.allocator);
            }
            log::trace!(
                "sync: {} -> {} pointers, touching {:?} -> {:?}, hovering {:?} -> {:?}",
                self.last_raw.len(),
                self.current_raw.len(),
                self.last_raw.touching_ids,
                self.current_raw.touching_ids,
                self.last_raw.hovering_ids,
                self.current_raw.hovering_ids
            );

            let mut policy = PolicyFlags::empty();
            let initial_down = self.last_raw.is_empty() && !self.current_raw.is_empty();
            let buttons_pressed = !self.current_buttons.difference(self.last_buttons).is_empty();
            if (initial_down || buttons_pressed) && self.external {
                policy |= PolicyFlags::WAKE_DROPPED;
            }

            synthesize_button_keys(
                &mut self.emitter,
                KeyAction::Down,
                when,
                self.source,
                policy,
                ctx.meta_state,
                self.last_buttons,
                self.current_buttons,
            );

            if self.virtual_keys.consume_raw_touches(
                when,
                policy,
                &self.current_raw,
                &self.last_raw,
                &self.geometry,
                self.config.virtual_key_quiet_time(),
                ctx,
                &mut self.emitter,
            ) {
                self.current_raw.clear();
            }

            self.geometry.cook(&self.current_raw, &mut self.current_cooked);

            if self.mode == DeviceMode::Pointer {
                self.classify_tools();
                let usage = if !self.current_stylus_ids.is_empty() {
                    self.current_mouse_ids.clear();
                    self.current_finger_ids.clear();
                    PointerUsage::Stylus
                } else if !self.current_mouse_ids.is_empty() {
                    self.current_finger_ids.clear();
                    PointerUsage::Mouse
                } else if !self.current_finger_ids.is_empty() || self.current_buttons.is_pointer_down() {
                    PointerUsage::Gestures
                } else {
                    self.usage
                };
                self.dispatch_pointer_usage(when, policy, usage, ctx);
            } else {
                self.dispatch_hover_exit(when, policy, ctx);
                self.dispatch_touches(when, policy, ctx);
                self.dispatch_hover_enter_and_move(when, policy, ctx);
            }

            synthesize_button_keys(
                &mut self.emitter,
                KeyAction::Up,
                when,
                self.source,
                policy,
                ctx.meta_state,
                self.last_buttons,
                self.current_buttons,
            );
        }

        self.last_raw.clone_from(&self.current_raw);
        self.last_cooked.clone_from(&self.current_cooked);
        self.last_buttons = self.current_buttons;
        self.last_finger_ids = self.current_finger_ids;
        self.last_stylus_ids = self.current_stylus_ids;
        self.last_mouse_ids = self.current_mouse_ids;

        self.current_vscroll = 0.0;
        self.current_hscroll = 0.0;
    }

    fn classify_tools(&mut self) {
        for p in &self.current_raw.pointers {
            match p.tool_type {
                ToolType::Stylus | ToolType::Eraser => self.current_stylus_ids.insert(p.id),
                ToolType::Finger | ToolType::Unknown => self.current_finger_ids.insert(p.id),
                ToolType::Mouse => self.current_mouse_ids.insert(p.id),
            }
        }
    }

    fn direct_template(
        &self,
        when: Duration,
        policy_flags: PolicyFlags,
        ctx: &ReaderContext,
        button_state: ButtonState,
    ) -> MotionTemplate {
        MotionTemplate {
            when,
            source: self.source,
            policy_flags,
            meta_state: ctx.meta_state,
            button_state,
            x_precision: self.geometry.oriented_x_precision,
            y_precision: self.geometry.oriented_y_precision,
            down_time: self.down_time,
        }
    }

    fn dispatch_touches(&mut self, when: Duration, policy: PolicyFlags, ctx: &ReaderContext) {
        let current_ids = self.current_cooked.touching_ids;
        let last_ids = self.last_cooked.touching_ids;
        let mut tpl = self.direct_template(when, policy, ctx, self.current_buttons);

        if current_ids == last_ids {
            if !current_ids.is_empty() {
                self.emitter.motion(
                    &tpl,
                    MotionAction::Move,
                    &self.current_cooked.properties,
                    &self.current_cooked.coords,
                    current_ids,
                    None,
                );
            }
            return;
        }

        let up_ids = last_ids.difference(current_ids);
        let down_ids = current_ids.difference(last_ids);
        let move_ids = last_ids.intersection(current_ids);
        let mut dispatched = last_ids;

        // Refresh the last coordinates of moved pointers so ups report them
        // at their new location.
        let mut move_needed = update_moved_pointers(
            &self.current_cooked.properties,
            &self.current_cooked.coords,
            &mut self.last_cooked.properties,
            &mut self.last_cooked.coords,
            move_ids,
        );
        if self.current_buttons != self.last_buttons {
            move_needed = true;
        }

        for id in up_ids.iter() {
            self.emitter.motion(
                &tpl,
                MotionAction::PointerUp(0),
                &self.last_cooked.properties,
                &self.last_cooked.coords,
                dispatched,
                Some(id),
            );
            dispatched.remove(id);
        }

        if move_needed {
            self.emitter.motion(
                &tpl,
                MotionAction::Move,
                &self.current_cooked.properties,
                &self.current_cooked.coords,
                dispatched,
                None,
            );
        }

        // New pointers go down in frame order, which survives id pool wraparound.
        let down_order: Vec<u32> = self
            .current_cooked
            .properties
            .iter()
            .map(|p| p.id)
            .filter(|&id| down_ids.contains(id))
            .collect();
        for id in down_order {
            dispatched.insert(id);
            if dispatched.count() == 1 {
                self.down_time = when;
                tpl.down_time = when;
            }
            self.emitter.motion(
                &tpl,
                MotionAction::PointerDown(0),
                &self.current_cooked.properties,
                &self.current_cooked.coords,
                dispatched,
                Some(id),
            );
        }
    }

    fn dispatch_hover_exit(&mut self, when: Duration, policy: PolicyFlags, ctx: &ReaderContext) {
        if self.sent_hover_enter
            && (self.current_cooked.hovering_ids.is_empty() || !self.current_cooked.touching_ids.is_empty())
        {
            let tpl = self.direct_template(when, policy, ctx, self.last_buttons);
            self.emitter.motion(
                &tpl,
                MotionAction::HoverExit,
                &self.last_cooked.properties,
                &self.last_cooked.coords,
                self.last_cooked.hovering_ids,
                None,
            );
            self.sent_hover_enter = false;
        }
    }

    fn dispatch_hover_enter_and_move(&mut self, when: Duration, policy: PolicyFlags, ctx: &ReaderContext) {
        if !self.current_cooked.touching_ids.is_empty() || self.current_cooked.hovering_ids.is_empty() {
            return;
        }
        let tpl = self.direct_template(when, policy, ctx, self.current_buttons);
        let hovering = self.current_cooked.hovering_ids;
        if !self.sent_hover_enter {
            self.emitter.motion(
                &tpl,
                MotionAction::HoverEnter,
                &self.current_cooked.properties,
                &self.current_cooked.coords,
                hovering,
                None,
            );
            self.sent_hover_enter = true;
        }
        self.emitter.motion(
            &tpl,
            MotionAction::HoverMove,
            &self.current_cooked.properties,
            &self.current_cooked.coords,
            hovering,
            None,
        );
    }

    fn dispatch_pointer_usage(
        &mut self,
        when: Duration,
        policy: PolicyFlags,
        usage: PointerUsage,
        ctx: &ReaderContext,
    ) {
        if usage != self.usage {
            self.abort_pointer_usage(when, policy, ctx);
            self.usage = usage;
        }

        match self.usage {
            PointerUsage::Gestures => self.dispatch_pointer_gestures(when, policy, false, ctx),
            PointerUsage::Stylus => {
                let (down, hovering) =
                    self.simple
                        .prepare_stylus(&self.current_cooked, self.current_stylus_ids, &mut self.cursor);
                self.dispatch_pointer_simple(when, policy, down, hovering, ctx);
            }
            PointerUsage::Mouse => {
                let input = MouseInput {
                    when,
                    current: &self.current_raw,
                    last: &self.last_raw,
                    cooked: &self.current_cooked,
                    mouse_ids: self.current_mouse_ids,
                    last_mouse_ids: self.last_mouse_ids,
                    button_state: self.current_buttons,
                    movement_scale: self.geometry.movement_scale,
                    orientation: self.geometry.orientation,
                };
                let (down, hovering) =
                    self.simple
                        .prepare_mouse(&input, &mut self.cursor, &mut self.pointer_velocity);
                self.dispatch_pointer_simple(when, policy, down, hovering, ctx);
            }
            PointerUsage::None => {}
        }
    }

    fn abort_pointer_usage(&mut self, when: Duration, policy: PolicyFlags, ctx: &ReaderContext) {
        match self.usage {
            PointerUsage::Gestures => {
                let dctx = self.gesture_context(when, policy, ctx);
                self.gestures.abort(&dctx, &mut self.emitter);
                self.pointer_velocity.reset();
            }
            PointerUsage::Stylus => {
                let base = self.direct_template(when, policy, ctx, self.current_buttons);
                self.simple.abort(&base, self.last_buttons, &mut self.emitter);
            }
            PointerUsage::Mouse => {
                let base = self.direct_template(when, policy, ctx, self.current_buttons);
                self.simple.abort(&base, self.last_buttons, &mut self.emitter);
                self.pointer_velocity.reset();
            }
            PointerUsage::None => {}
        }
        self.usage = PointerUsage::None;
    }

    fn gesture_context(&self, when: Duration, policy: PolicyFlags, ctx: &ReaderContext) -> DispatchContext {
        DispatchContext {
            when,
            source: self.source,
            policy_flags: policy,
            meta_state: ctx.meta_state,
            button_state: self.current_buttons,
            last_button_state: self.last_buttons,
        }
    }

    fn dispatch_pointer_gestures(
        &mut self,
        when: Duration,
        policy: PolicyFlags,
        is_timeout: bool,
        ctx: &ReaderContext,
    ) {
        let transition = if is_timeout {
            match self.gestures.prepare_timeout(when, &mut self.pointer_velocity) {
                Some(t) => t,
                None => return,
            }
        } else {
            let input = GestureInput {
                when,
                current: &self.current_raw,
                last: &self.last_raw,
                current_fingers: self.current_finger_ids,
                last_fingers: self.last_finger_ids,
                button_state: self.current_buttons,
            };
            self.gestures
                .prepare(&input, &mut self.cursor, &mut self.pointer_velocity)
        };

        let dctx = self.gesture_context(when, policy, ctx);
        self.gestures
            .dispatch(transition, &dctx, self.cursor.position(), &mut self.emitter);
    }

    fn dispatch_pointer_simple(
        &mut self,
        when: Duration,
        policy: PolicyFlags,
        down: bool,
        hovering: bool,
        ctx: &ReaderContext,
    ) {
        let scroll = if self.current_vscroll != 0.0 || self.current_hscroll != 0.0 {
            let (_, vscroll) = self.wheel_y_velocity.apply(when, 0.0, self.current_vscroll);
            let (hscroll, _) = self.wheel_x_velocity.apply(when, self.current_hscroll, 0.0);
            Some((vscroll, hscroll))
        } else {
            None
        };
        let base = self.direct_template(when, policy, ctx, self.current_buttons);
        self.simple
            .dispatch(&base, self.last_buttons, down, hovering, scroll, &mut self.emitter);
    }
}
