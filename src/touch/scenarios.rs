//! End-to-end runs of the engine from raw events to notifications.

use std::time::Duration;

use crate::config::{DisplayConfig, ReaderConfig};
use crate::context::ReaderContext;
use crate::device::{DeviceProfile, InputProperty, RawAxisInfo, VirtualKeyDefinition};
use crate::input::event::*;
use crate::input::RawEvent;
use crate::orientation::Orientation;

use super::gesture::GestureMode;
use super::mapper::{Output, TouchMapper};
use super::notify::{ButtonState, KeyAction, KeyFlags, MotionAction, Notification, PolicyFlags, Source};
use super::pointer::IdSet;
use super::simple::PointerUsage;
use super::velocity::VelocityControlParameters;
use super::virtual_keys::KeyState;

fn ms(v: u64) -> Duration {
    Duration::from_millis(v)
}

struct Rig {
    device: DeviceProfile,
    mapper: TouchMapper,
    ctx: ReaderContext,
}

impl Rig {
    fn new(device: DeviceProfile, config: ReaderConfig) -> Self {
        let mapper = TouchMapper::new(3, &device, &config);
        Self {
            device,
            mapper,
            ctx: ReaderContext::new(),
        }
    }

    fn event(&mut self, ev: RawEvent) -> Output {
        self.device.observe(&ev);
        self.mapper.process(&ev, &self.device, &mut self.ctx)
    }

    /// Feed ABS events followed by SYN_REPORT, all stamped `when`.
    fn frame(&mut self, when: u64, abs: &[(u16, i32)]) -> Output {
        let mut out = Output::default();
        for &(code, value) in abs {
            out.notifications
                .extend(self.event(RawEvent::abs(ms(when), code, value)).notifications);
        }
        let sync = self.event(RawEvent::sync(ms(when)));
        out.notifications.extend(sync.notifications);
        out.next_timeout = sync.next_timeout;
        out
    }
}

fn display(width: i32, height: i32) -> ReaderConfig {
    ReaderConfig {
        display: Some(DisplayConfig {
            width,
            height,
            orientation: Orientation::Natural,
        }),
        ..Default::default()
    }
}

fn touch_screen() -> DeviceProfile {
    DeviceProfile::new("panel")
        .with_property(InputProperty::Direct)
        .with_axis(ABS_MT_SLOT, RawAxisInfo::new(0, 9))
        .with_axis(ABS_MT_TRACKING_ID, RawAxisInfo::new(0, 65535))
        .with_axis(ABS_MT_POSITION_X, RawAxisInfo::new(0, 999))
        .with_axis(ABS_MT_POSITION_Y, RawAxisInfo::new(0, 1999))
}

fn touch_pad() -> DeviceProfile {
    DeviceProfile::new("pad")
        .with_axis(ABS_MT_SLOT, RawAxisInfo::new(0, 9))
        .with_axis(ABS_MT_TRACKING_ID, RawAxisInfo::new(0, 65535))
        .with_axis(ABS_MT_POSITION_X, RawAxisInfo::new(0, 999))
        .with_axis(ABS_MT_POSITION_Y, RawAxisInfo::new(0, 499))
}

fn actions(out: &Output) -> Vec<MotionAction> {
    out.notifications
        .iter()
        .filter_map(Notification::as_motion)
        .map(|m| m.action)
        .collect()
}

#[test]
fn test_new_contacts_in_one_frame_share_down_time() {
    let mut rig = Rig::new(touch_screen(), display(500, 1000));
    let out = rig.frame(
        10,
        &[
            (ABS_MT_SLOT, 0),
            (ABS_MT_TRACKING_ID, 5),
            (ABS_MT_POSITION_X, 100),
            (ABS_MT_POSITION_Y, 100),
            (ABS_MT_SLOT, 1),
            (ABS_MT_TRACKING_ID, 7),
            (ABS_MT_POSITION_X, 300),
            (ABS_MT_POSITION_Y, 300),
        ],
    );
    assert_eq!(actions(&out), vec![MotionAction::Down, MotionAction::PointerDown(1)]);

    let first = out.notifications[0].as_motion().unwrap();
    let second = out.notifications[1].as_motion().unwrap();
    assert_eq!(first.pointer_ids(), vec![0]);
    assert_eq!(second.pointer_ids(), vec![0, 1]);
    assert_eq!(first.down_time, ms(10));
    assert_eq!(second.down_time, ms(10));
    assert_eq!(first.source, Source::TOUCHSCREEN);
    assert_eq!(first.device_id, 3);
    assert_eq!((second.coords[1].x, second.coords[1].y), (150.0, 150.0));
    assert_eq!(out.next_timeout, None);

    let out = rig.frame(20, &[(ABS_MT_SLOT, 0), (ABS_MT_TRACKING_ID, -1)]);
    assert_eq!(actions(&out), vec![MotionAction::PointerUp(0)]);
    assert_eq!(out.notifications[0].as_motion().unwrap().down_time, ms(10));

    let out = rig.frame(30, &[(ABS_MT_SLOT, 1), (ABS_MT_TRACKING_ID, -1)]);
    assert_eq!(actions(&out), vec![MotionAction::Up]);
    assert_eq!(out.notifications[0].as_motion().unwrap().pointer_ids(), vec![1]);
}

#[test]
fn test_tap_then_tap_drag() {
    let mut config = ReaderConfig::default();
    config.gestures.tap_interval_ms = 180;
    let mut rig = Rig::new(touch_pad(), config);

    rig.frame(
        0,
        &[
            (ABS_MT_SLOT, 0),
            (ABS_MT_TRACKING_ID, 1),
            (ABS_MT_POSITION_X, 400),
            (ABS_MT_POSITION_Y, 200),
        ],
    );
    assert_eq!(rig.mapper.pointer_usage(), PointerUsage::Gestures);
    assert_eq!(rig.mapper.gesture_mode(), GestureMode::Hover);

    rig.frame(60, &[(ABS_MT_POSITION_X, 402)]);
    assert_eq!(rig.mapper.gesture_mode(), GestureMode::Hover);

    let out = rig.frame(120, &[(ABS_MT_TRACKING_ID, -1)]);
    assert_eq!(rig.mapper.gesture_mode(), GestureMode::Tap);
    assert_eq!(actions(&out), vec![MotionAction::Down]);
    assert_eq!(out.next_timeout, Some(ms(270)));
    assert_eq!(rig.mapper.next_timeout(), Some(ms(270)));

    let out = rig.frame(
        200,
        &[
            (ABS_MT_TRACKING_ID, 2),
            (ABS_MT_POSITION_X, 402),
            (ABS_MT_POSITION_Y, 200),
        ],
    );
    assert_eq!(rig.mapper.gesture_mode(), GestureMode::TapDrag);
    assert!(!actions(&out).contains(&MotionAction::Down));
    assert_eq!(out.next_timeout, None);
}

#[test]
fn test_tap_times_out_into_click() {
    let mut rig = Rig::new(touch_pad(), ReaderConfig::default());
    rig.frame(
        0,
        &[
            (ABS_MT_SLOT, 0),
            (ABS_MT_TRACKING_ID, 1),
            (ABS_MT_POSITION_X, 400),
            (ABS_MT_POSITION_Y, 200),
        ],
    );
    let out = rig.frame(50, &[(ABS_MT_TRACKING_ID, -1)]);
    assert_eq!(out.next_timeout, Some(ms(200)));

    let early = rig.mapper.timeout_expired(ms(150), &rig.ctx);
    assert!(early.notifications.is_empty());
    assert_eq!(early.next_timeout, Some(ms(200)));

    let out = rig.mapper.timeout_expired(ms(200), &rig.ctx);
    assert_eq!(actions(&out), vec![MotionAction::Up, MotionAction::HoverMove]);
    assert_eq!(out.next_timeout, None);
    assert_eq!(rig.mapper.gesture_mode(), GestureMode::Neutral);
}

#[test]
fn test_released_slot_keeps_stale_fields() {
    let mut rig = Rig::new(touch_screen(), display(500, 1000));
    let out = rig.frame(
        0,
        &[
            (ABS_MT_SLOT, 2),
            (ABS_MT_TRACKING_ID, 40),
            (ABS_MT_POSITION_X, 300),
            (ABS_MT_POSITION_Y, 400),
        ],
    );
    assert_eq!(actions(&out), vec![MotionAction::Down]);

    let out = rig.frame(10, &[(ABS_MT_TRACKING_ID, -1)]);
    assert_eq!(actions(&out), vec![MotionAction::Up]);
    let up = out.notifications[0].as_motion().unwrap();
    assert_eq!((up.coords[0].x, up.coords[0].y), (150.0, 200.0));

    // Nothing is left touching or hovering.
    let out = rig.frame(15, &[]);
    assert!(out.notifications.is_empty());

    // Only Y is reported for the new contact; X comes from the old slot data.
    let out = rig.frame(20, &[(ABS_MT_TRACKING_ID, 41), (ABS_MT_POSITION_Y, 500)]);
    assert_eq!(actions(&out), vec![MotionAction::Down]);
    let down = out.notifications[0].as_motion().unwrap();
    assert_eq!((down.coords[0].x, down.coords[0].y), (150.0, 250.0));
    // The id pool cycles instead of reusing the id just released.
    assert_eq!(down.pointer_ids(), vec![1]);
}

#[test]
fn test_three_fingers_press_then_freeform() {
    let mut rig = Rig::new(touch_pad(), ReaderConfig::default());
    let out = rig.frame(
        0,
        &[
            (ABS_MT_SLOT, 0),
            (ABS_MT_TRACKING_ID, 1),
            (ABS_MT_POSITION_X, 300),
            (ABS_MT_POSITION_Y, 200),
            (ABS_MT_SLOT, 1),
            (ABS_MT_TRACKING_ID, 2),
            (ABS_MT_POSITION_X, 500),
            (ABS_MT_POSITION_Y, 200),
            (ABS_MT_SLOT, 2),
            (ABS_MT_TRACKING_ID, 3),
            (ABS_MT_POSITION_X, 700),
            (ABS_MT_POSITION_Y, 200),
        ],
    );
    assert_eq!(rig.mapper.gesture_mode(), GestureMode::Press);
    assert_eq!(actions(&out), vec![MotionAction::Down]);

    let out = rig.frame(
        150,
        &[
            (ABS_MT_SLOT, 0),
            (ABS_MT_POSITION_X, 200),
            (ABS_MT_SLOT, 2),
            (ABS_MT_POSITION_X, 800),
        ],
    );
    assert_eq!(rig.mapper.gesture_mode(), GestureMode::Freeform);
    assert_eq!(
        actions(&out),
        vec![
            MotionAction::Cancel,
            MotionAction::Down,
            MotionAction::PointerDown(1),
            MotionAction::PointerDown(2),
        ]
    );
    let last = out.notifications[3].as_motion().unwrap();
    assert_eq!(last.pointer_ids(), vec![0, 1, 2]);
}

#[test]
fn test_dropped_events_cancel_then_resume() {
    let mut rig = Rig::new(touch_screen(), display(500, 1000));
    let out = rig.frame(
        0,
        &[
            (ABS_MT_SLOT, 0),
            (ABS_MT_TRACKING_ID, 9),
            (ABS_MT_POSITION_X, 100),
            (ABS_MT_POSITION_Y, 100),
        ],
    );
    assert_eq!(actions(&out), vec![MotionAction::Down]);

    let out = rig.event(RawEvent::dropped(ms(10)));
    assert_eq!(actions(&out), vec![MotionAction::Cancel]);
    assert_eq!(out.notifications[0].as_motion().unwrap().pointer_ids(), vec![0]);

    // Everything up to and including the next SYN_REPORT is discarded.
    let out = rig.frame(12, &[(ABS_MT_POSITION_X, 120)]);
    assert!(out.notifications.is_empty());

    let out = rig.frame(
        20,
        &[
            (ABS_MT_TRACKING_ID, 10),
            (ABS_MT_POSITION_X, 140),
            (ABS_MT_POSITION_Y, 100),
        ],
    );
    assert_eq!(actions(&out), vec![MotionAction::Down]);
    let down = out.notifications[0].as_motion().unwrap();
    assert_eq!(down.pointer_ids(), vec![0]);
    assert_eq!(down.coords[0].x, 70.0);
    assert_eq!(down.down_time, ms(20));
}

fn keyed_screen() -> DeviceProfile {
    // Raw Y runs past the 100x100 display; rows 100..119 hold the key.
    DeviceProfile::new("keyed")
        .with_property(InputProperty::Direct)
        .with_axis(ABS_MT_SLOT, RawAxisInfo::new(0, 9))
        .with_axis(ABS_MT_TRACKING_ID, RawAxisInfo::new(0, 65535))
        .with_axis(ABS_MT_POSITION_X, RawAxisInfo::new(0, 99))
        .with_axis(ABS_MT_POSITION_Y, RawAxisInfo::new(0, 99))
        .with_virtual_key(
            VirtualKeyDefinition {
                scan_code: 158,
                center_x: 25,
                center_y: 110,
                width: 50,
                height: 20,
            },
            4,
        )
}

fn touch(id: i32, x: i32, y: i32) -> [(u16, i32); 4] {
    [
        (ABS_MT_SLOT, 0),
        (ABS_MT_TRACKING_ID, id),
        (ABS_MT_POSITION_X, x),
        (ABS_MT_POSITION_Y, y),
    ]
}

#[test]
fn test_virtual_key_press_release_and_reset() {
    let mut rig = Rig::new(keyed_screen(), display(100, 100));

    let out = rig.frame(0, &touch(1, 10, 110));
    assert_eq!(out.notifications.len(), 1);
    let down = out.notifications[0].as_key().unwrap();
    assert_eq!(down.action, KeyAction::Down);
    assert_eq!((down.key_code, down.scan_code), (4, 158));
    assert!(down.policy_flags.contains(PolicyFlags::VIRTUAL));
    assert_eq!(rig.mapper.key_code_state(4), KeyState::Virtual);
    assert_eq!(rig.mapper.scan_code_state(158), KeyState::Virtual);

    let out = rig.frame(10, &[(ABS_MT_TRACKING_ID, -1)]);
    let up = out.notifications[0].as_key().unwrap();
    assert_eq!(up.action, KeyAction::Up);
    assert!(!up.flags.contains(KeyFlags::CANCELED));
    assert_eq!(rig.mapper.key_code_state(4), KeyState::Up);

    rig.frame(20, &touch(2, 10, 112));
    let out = rig.mapper.reset(ms(30), &rig.device, &rig.ctx);
    let cancel = out.notifications[0].as_key().unwrap();
    assert_eq!(cancel.action, KeyAction::Up);
    assert!(cancel.flags.contains(KeyFlags::CANCELED));
    assert_eq!(rig.mapper.key_code_state(4), KeyState::Up);
}

#[test]
fn test_virtual_key_quiet_time() {
    let mut config = display(100, 100);
    config.virtual_key_quiet_time_ms = 50;
    let mut rig = Rig::new(keyed_screen(), config);

    let out = rig.frame(100, &touch(1, 50, 50));
    assert_eq!(actions(&out), vec![MotionAction::Down]);
    let out = rig.frame(105, &[(ABS_MT_TRACKING_ID, -1)]);
    assert_eq!(actions(&out), vec![MotionAction::Up]);

    let out = rig.frame(120, &touch(2, 10, 110));
    assert!(out.notifications.is_empty());
    let out = rig.frame(130, &[(ABS_MT_TRACKING_ID, -1)]);
    assert!(out.notifications.is_empty());

    let out = rig.frame(200, &touch(3, 10, 110));
    assert_eq!(out.notifications[0].as_key().unwrap().action, KeyAction::Down);
}

#[test]
fn test_direct_hover_enter_touch_and_exit() {
    let device = touch_screen().with_axis(ABS_MT_PRESSURE, RawAxisInfo::new(0, 255));
    let mut rig = Rig::new(device, display(500, 1000));

    let out = rig.frame(
        0,
        &[
            (ABS_MT_SLOT, 0),
            (ABS_MT_TRACKING_ID, 1),
            (ABS_MT_POSITION_X, 100),
            (ABS_MT_POSITION_Y, 100),
            (ABS_MT_PRESSURE, 0),
        ],
    );
    assert_eq!(actions(&out), vec![MotionAction::HoverEnter, MotionAction::HoverMove]);

    let out = rig.frame(10, &[(ABS_MT_PRESSURE, 80)]);
    assert_eq!(actions(&out), vec![MotionAction::HoverExit, MotionAction::Down]);

    let out = rig.frame(20, &[(ABS_MT_PRESSURE, 0)]);
    assert_eq!(
        actions(&out),
        vec![MotionAction::Up, MotionAction::HoverEnter, MotionAction::HoverMove]
    );

    let out = rig.frame(30, &[(ABS_MT_TRACKING_ID, -1)]);
    assert_eq!(actions(&out), vec![MotionAction::HoverExit]);
}

#[test]
fn test_stylus_takes_over_from_fingers() {
    let device = touch_pad().with_axis(ABS_MT_TOOL_TYPE, RawAxisInfo::new(0, 2));
    let mut rig = Rig::new(device, ReaderConfig::default());
    assert!(rig.mapper.sources().contains(Source::STYLUS));

    let out = rig.frame(
        0,
        &[
            (ABS_MT_SLOT, 0),
            (ABS_MT_TRACKING_ID, 1),
            (ABS_MT_POSITION_X, 100),
            (ABS_MT_POSITION_Y, 100),
        ],
    );
    assert_eq!(actions(&out), vec![MotionAction::HoverMove]);

    let out = rig.frame(
        10,
        &[
            (ABS_MT_SLOT, 1),
            (ABS_MT_TRACKING_ID, 3),
            (ABS_MT_TOOL_TYPE, MT_TOOL_PEN),
            (ABS_MT_POSITION_X, 600),
            (ABS_MT_POSITION_Y, 300),
        ],
    );
    assert_eq!(rig.mapper.pointer_usage(), PointerUsage::Stylus);
    assert_eq!(actions(&out), vec![MotionAction::Down, MotionAction::Move]);
    assert_eq!(rig.mapper.cursor_position(), (600.0, 300.0));

    let out = rig.frame(20, &[(ABS_MT_TRACKING_ID, -1)]);
    assert_eq!(rig.mapper.pointer_usage(), PointerUsage::Gestures);
    assert_eq!(actions(&out), vec![MotionAction::Up, MotionAction::HoverMove]);
}

#[test]
fn test_wrapped_id_pool_keeps_frame_order() {
    let mut rig = Rig::new(touch_screen(), display(500, 1000));
    for i in 0..31 {
        rig.frame(i * 10, &touch(100 + i as i32, 100, 100));
        rig.frame(i * 10 + 5, &[(ABS_MT_TRACKING_ID, -1)]);
    }

    // Slot 0 gets the last id of the pool and slot 1 wraps around to 0.
    let out = rig.frame(
        400,
        &[
            (ABS_MT_SLOT, 0),
            (ABS_MT_TRACKING_ID, 500),
            (ABS_MT_POSITION_X, 100),
            (ABS_MT_POSITION_Y, 100),
            (ABS_MT_SLOT, 1),
            (ABS_MT_TRACKING_ID, 501),
            (ABS_MT_POSITION_X, 300),
            (ABS_MT_POSITION_Y, 300),
        ],
    );
    assert_eq!(actions(&out), vec![MotionAction::Down, MotionAction::PointerDown(0)]);

    let first = out.notifications[0].as_motion().unwrap();
    assert_eq!(first.pointer_ids(), vec![31]);
    assert_eq!(first.coords[0].x, 50.0);

    let second = out.notifications[1].as_motion().unwrap();
    assert_eq!(second.pointer_ids(), vec![0, 31]);
    assert_eq!((second.coords[0].x, second.coords[1].x), (150.0, 50.0));
}

#[test]
fn test_down_up_balanced_over_many_cycles() {
    let mut rig = Rig::new(touch_screen(), display(500, 1000));
    let mut seed = 0x2545_f491u32;
    let mut next = move || {
        seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        seed >> 8
    };

    let mut active = [false; 3];
    let mut tracking_id = 0;
    let mut down = IdSet::empty();
    let mut downs = 0;

    let mut check = |out: &Output, down: &mut IdSet| {
        for m in out.notifications.iter().filter_map(Notification::as_motion) {
            let ids = m.pointer_ids();
            match m.action {
                MotionAction::Down => {
                    assert_eq!(ids.len(), 1);
                    assert!(!down.contains(ids[0]), "id {} went down twice", ids[0]);
                    down.insert(ids[0]);
                    downs += 1;
                }
                MotionAction::PointerDown(index) => {
                    assert!(!down.contains(ids[index]), "id {} went down twice", ids[index]);
                    down.insert(ids[index]);
                    downs += 1;
                }
                MotionAction::Up => {
                    assert_eq!(ids.len(), 1);
                    assert!(down.contains(ids[0]));
                    down.remove(ids[0]);
                }
                MotionAction::PointerUp(index) => {
                    assert!(down.contains(ids[index]));
                    down.remove(ids[index]);
                }
                MotionAction::Cancel => ids.iter().for_each(|&id| down.remove(id)),
                MotionAction::Move => assert!(ids.iter().all(|&id| down.contains(id))),
                _ => {}
            }
        }
    };

    for frame in 0..200u64 {
        let mut abs = Vec::new();
        for (slot, live) in active.iter_mut().enumerate() {
            let choice = next() % 4;
            if choice == 0 || (!*live && choice == 1) {
                abs.push((ABS_MT_SLOT, slot as i32));
                if *live {
                    abs.push((ABS_MT_TRACKING_ID, -1));
                } else {
                    tracking_id += 1;
                    abs.push((ABS_MT_TRACKING_ID, tracking_id));
                    abs.push((ABS_MT_POSITION_X, (next() % 1000) as i32));
                    abs.push((ABS_MT_POSITION_Y, (next() % 2000) as i32));
                }
                *live = !*live;
            } else if *live {
                abs.push((ABS_MT_SLOT, slot as i32));
                abs.push((ABS_MT_POSITION_X, (next() % 1000) as i32));
            }
        }
        let out = rig.frame(frame * 10, &abs);
        check(&out, &mut down);
    }

    let mut lift = Vec::new();
    for (slot, live) in active.iter().enumerate() {
        if *live {
            lift.push((ABS_MT_SLOT, slot as i32));
            lift.push((ABS_MT_TRACKING_ID, -1));
        }
    }
    let out = rig.frame(2000, &lift);
    check(&out, &mut down);

    assert!(down.is_empty());
    assert!(downs > 40, "only {} downs", downs);
}

#[test]
fn test_mouse_tool_moves_relative_and_clicks() {
    let mut config = ReaderConfig::default();
    config.pointer_velocity = VelocityControlParameters::new(1.0, 500.0, 3000.0, 1.0);
    let mut rig = Rig::new(touch_pad(), config);

    rig.event(RawEvent::key(ms(0), BTN_TOOL_MOUSE, true));
    let out = rig.frame(
        0,
        &[
            (ABS_MT_SLOT, 0),
            (ABS_MT_TRACKING_ID, 1),
            (ABS_MT_POSITION_X, 400),
            (ABS_MT_POSITION_Y, 200),
        ],
    );
    assert_eq!(rig.mapper.pointer_usage(), PointerUsage::Mouse);
    assert_eq!(actions(&out), vec![MotionAction::HoverEnter, MotionAction::HoverMove]);
    // A new mouse contact does not move the cursor.
    let (x0, y0) = rig.mapper.cursor_position();
    assert_eq!((x0, y0), (499.5, 249.5));

    let out = rig.frame(10, &[(ABS_MT_POSITION_X, 410)]);
    assert_eq!(actions(&out), vec![MotionAction::HoverMove]);
    let step = 10.0 * rig.mapper.geometry().movement_scale;
    assert_eq!(rig.mapper.cursor_position(), (x0 + step, y0));
    assert_eq!(out.notifications[0].as_motion().unwrap().coords[0].x, x0 + step);

    rig.event(RawEvent::key(ms(20), BTN_LEFT, true));
    let out = rig.frame(20, &[]);
    assert_eq!(
        actions(&out),
        vec![MotionAction::HoverExit, MotionAction::Down, MotionAction::Move]
    );
    let down = out.notifications[1].as_motion().unwrap();
    assert!(down.button_state.contains(ButtonState::PRIMARY));
    assert_eq!(down.coords[0].pressure, 1.0);
    assert_eq!(down.down_time, ms(20));

    rig.event(RawEvent::key(ms(30), BTN_LEFT, false));
    let out = rig.frame(30, &[]);
    assert_eq!(
        actions(&out),
        vec![MotionAction::Up, MotionAction::HoverEnter, MotionAction::HoverMove]
    );

    rig.event(RawEvent::key(ms(40), BTN_TOOL_MOUSE, false));
    let out = rig.frame(40, &[(ABS_MT_TRACKING_ID, -1)]);
    assert_eq!(actions(&out), vec![MotionAction::HoverExit]);
}

#[test]
fn test_external_device_wakes_on_initial_down_and_button_press() {
    let mut device = touch_screen();
    device.external = true;
    let mut rig = Rig::new(device, display(500, 1000));

    let out = rig.frame(0, &touch(1, 100, 100));
    assert_eq!(actions(&out), vec![MotionAction::Down]);
    assert!(out.notifications[0]
        .as_motion()
        .unwrap()
        .policy_flags
        .contains(PolicyFlags::WAKE_DROPPED));

    let out = rig.frame(10, &[(ABS_MT_POSITION_X, 120)]);
    assert_eq!(actions(&out), vec![MotionAction::Move]);
    assert!(!out.notifications[0]
        .as_motion()
        .unwrap()
        .policy_flags
        .contains(PolicyFlags::WAKE_DROPPED));

    rig.event(RawEvent::key(ms(20), BTN_LEFT, true));
    let out = rig.frame(20, &[]);
    assert_eq!(actions(&out), vec![MotionAction::Move]);
    assert!(out.notifications[0]
        .as_motion()
        .unwrap()
        .policy_flags
        .contains(PolicyFlags::WAKE_DROPPED));

    let out = rig.frame(30, &[(ABS_MT_POSITION_X, 130)]);
    assert!(!out.notifications[0]
        .as_motion()
        .unwrap()
        .policy_flags
        .contains(PolicyFlags::WAKE_DROPPED));

    // Built-in devices never ask to wake.
    let mut rig = Rig::new(touch_screen(), display(500, 1000));
    let out = rig.frame(0, &touch(1, 100, 100));
    assert!(!out.notifications[0]
        .as_motion()
        .unwrap()
        .policy_flags
        .contains(PolicyFlags::WAKE_DROPPED));
}
