//! Touch regions outside the display that act as keys.

use std::time::Duration;

use crate::context::ReaderContext;
use crate::device::DeviceInfo;

use super::notify::{Emitter, KeyAction, KeyFlags, PolicyFlags, Source};
use super::pointer::RawPointerData;
use super::surface::SurfaceGeometry;

/// A virtual key with its hit box in raw touch coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VirtualKey {
    pub key_code: i32,
    pub scan_code: i32,
    pub hit_left: i32,
    pub hit_top: i32,
    pub hit_right: i32,
    pub hit_bottom: i32,
}

impl VirtualKey {
    pub fn is_hit(&self, x: i32, y: i32) -> bool {
        x >= self.hit_left && x <= self.hit_right && y >= self.hit_top && y <= self.hit_bottom
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyState {
    Unknown,
    Up,
    Down,
    /// Held through a virtual key region.
    Virtual,
}

#[derive(Debug, Clone, Copy, Default)]
struct CurrentVirtualKey {
    down: bool,
    ignored: bool,
    down_time: Duration,
    key_code: i32,
    scan_code: i32,
}

#[derive(Debug, Clone, Default)]
pub struct VirtualKeyDetector {
    keys: Vec<VirtualKey>,
    current: CurrentVirtualKey,
}

impl VirtualKeyDetector {
    /// Convert the device's key definitions from display coordinates into
    /// raw hit boxes.
    pub fn configure(device: &dyn DeviceInfo, geometry: &SurfaceGeometry) -> Self {
        let mut keys = Vec::new();
        let Some(bounds) = geometry.axes.bounds() else {
            return Self::default();
        };
        let touch_width = geometry.axes.raw_width();
        let touch_height = geometry.axes.raw_height();
        if geometry.width <= 0 || geometry.height <= 0 {
            return Self::default();
        }

        for def in device.virtual_key_definitions() {
            let Some(key_code) = device.map_key(def.scan_code) else {
                log::warn!("VirtualKey {}: could not obtain key code, ignoring", def.scan_code);
                continue;
            };
            let half_width = def.width / 2;
            let half_height = def.height / 2;
            keys.push(VirtualKey {
                key_code,
                scan_code: def.scan_code,
                hit_left: (def.center_x - half_width) * touch_width / geometry.width + bounds.x_min,
                hit_right: (def.center_x + half_width) * touch_width / geometry.width + bounds.x_min,
                hit_top: (def.center_y - half_height) * touch_height / geometry.height + bounds.y_min,
                hit_bottom: (def.center_y + half_height) * touch_height / geometry.height
                    + bounds.y_min,
            });
        }
        Self {
            keys,
            current: CurrentVirtualKey::default(),
        }
    }

    pub fn keys(&self) -> &[VirtualKey] {
        &self.keys
    }

    pub fn is_key_down(&self) -> bool {
        self.current.down
    }

    pub fn reset(&mut self) {
        self.current = CurrentVirtualKey::default();
    }

    fn find_hit(&self, x: i32, y: i32) -> Option<&VirtualKey> {
        self.keys.iter().find(|k| k.is_hit(x, y))
    }

    fn dispatch(
        &self,
        emitter: &mut Emitter,
        ctx: &ReaderContext,
        when: Duration,
        policy_flags: PolicyFlags,
        action: KeyAction,
        flags: KeyFlags,
    ) {
        emitter.key(
            when,
            Source::KEYBOARD,
            policy_flags | PolicyFlags::VIRTUAL,
            action,
            flags,
            self.current.key_code,
            self.current.scan_code,
            ctx.meta_state,
            self.current.down_time,
        );
    }

    /// Handle off-surface touches. Returns true when the frame's touches
    /// belong to a virtual key and must not reach pointer dispatch.
    #[allow(clippy::too_many_arguments)]
    pub fn consume_raw_touches(
        &mut self,
        when: Duration,
        policy_flags: PolicyFlags,
        current: &RawPointerData,
        last: &RawPointerData,
        geometry: &SurfaceGeometry,
        quiet_time: Duration,
        ctx: &mut ReaderContext,
        emitter: &mut Emitter,
    ) -> bool {
        let system = KeyFlags::FROM_SYSTEM | KeyFlags::VIRTUAL_HARD_KEY;

        if self.current.down {
            if current.touching_ids.is_empty() {
                self.current.down = false;
                if !self.current.ignored {
                    log::debug!(
                        "VirtualKeys: key up keyCode={} scanCode={}",
                        self.current.key_code,
                        self.current.scan_code
                    );
                    self.dispatch(emitter, ctx, when, policy_flags, KeyAction::Up, system);
                }
                return true;
            }

            if current.touching_ids.count() == 1 {
                if let Some(id) = current.touching_ids.first() {
                    let p = current.pointer_for_id(id);
                    if self
                        .find_hit(p.x, p.y)
                        .is_some_and(|k| k.key_code == self.current.key_code)
                    {
                        return true;
                    }
                }
            }

            // Slid off the key or a second finger landed. Cancel the key but
            // let the touch through.
            self.current.down = false;
            if !self.current.ignored {
                log::debug!(
                    "VirtualKeys: canceling keyCode={} scanCode={}",
                    self.current.key_code,
                    self.current.scan_code
                );
                self.dispatch(
                    emitter,
                    ctx,
                    when,
                    policy_flags,
                    KeyAction::Up,
                    system | KeyFlags::CANCELED,
                );
            }
        }

        if last.touching_ids.is_empty() {
            if let Some(id) = current.touching_ids.first() {
                let p = *current.pointer_for_id(id);
                if !geometry.contains_raw(p.x, p.y) {
                    // Several fingers landing off surface drop the whole stroke.
                    if current.touching_ids.count() == 1 {
                        if let Some(key) = self.find_hit(p.x, p.y).copied() {
                            self.current = CurrentVirtualKey {
                                down: true,
                                ignored: ctx.should_drop_virtual_key(when, key.key_code, key.scan_code),
                                down_time: when,
                                key_code: key.key_code,
                                scan_code: key.scan_code,
                            };
                            if !self.current.ignored {
                                log::debug!(
                                    "VirtualKeys: key down keyCode={} scanCode={}",
                                    key.key_code,
                                    key.scan_code
                                );
                                self.dispatch(emitter, ctx, when, policy_flags, KeyAction::Down, system);
                            }
                        }
                    }
                    return true;
                }
            }
        }

        if !quiet_time.is_zero() && !current.touching_ids.is_empty() {
            ctx.disable_virtual_keys_until(when + quiet_time);
        }
        false
    }

    /// Cancel a key that is still held. Used when the stream is reset.
    pub fn abort(&mut self, when: Duration, ctx: &ReaderContext, emitter: &mut Emitter) {
        if self.current.down && !self.current.ignored {
            self.dispatch(
                emitter,
                ctx,
                when,
                PolicyFlags::empty(),
                KeyAction::Up,
                KeyFlags::FROM_SYSTEM | KeyFlags::VIRTUAL_HARD_KEY | KeyFlags::CANCELED,
            );
        }
        self.reset();
    }

    pub fn key_code_state(&self, key_code: i32) -> KeyState {
        if self.current.down && self.current.key_code == key_code {
            return KeyState::Virtual;
        }
        if self.keys.iter().any(|k| k.key_code == key_code) {
            KeyState::Up
        } else {
            KeyState::Unknown
        }
    }

    pub fn scan_code_state(&self, scan_code: i32) -> KeyState {
        if self.current.down && self.current.scan_code == scan_code {
            return KeyState::Virtual;
        }
        if self.keys.iter().any(|k| k.scan_code == scan_code) {
            KeyState::Up
        } else {
            KeyState::Unknown
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GestureConfig;
    use crate::device::{DeviceProfile, RawAxisInfo, VirtualKeyDefinition};
    use crate::input::event::{ABS_MT_POSITION_X, ABS_MT_POSITION_Y};
    use crate::orientation::Orientation;
    use crate::touch::calibration::Calibration;
    use crate::touch::notify::Notification;
    use crate::touch::pointer::{RawContact, ToolType};
    use crate::touch::surface::RawPointerAxes;

    const KEY_BACK: i32 = 158;

    // Raw Y extends past the 100x100 display: rows 100..119 hold the keys.
    fn device() -> DeviceProfile {
        DeviceProfile::new("keys")
            .with_axis(ABS_MT_POSITION_X, RawAxisInfo::new(0, 99))
            .with_axis(ABS_MT_POSITION_Y, RawAxisInfo::new(0, 99))
            .with_virtual_key(
                VirtualKeyDefinition {
                    scan_code: KEY_BACK,
                    center_x: 25,
                    center_y: 110,
                    width: 50,
                    height: 20,
                },
                4,
            )
    }

    fn geometry(device: &DeviceProfile) -> SurfaceGeometry {
        SurfaceGeometry::configure(
            RawPointerAxes::configure(device, true),
            Calibration::default(),
            100,
            100,
            Orientation::Natural,
            (100, 100),
            &GestureConfig::default(),
        )
    }

    fn frame(points: &[(i32, i32)]) -> RawPointerData {
        let mut data = RawPointerData::new();
        for (i, &(x, y)) in points.iter().enumerate() {
            data.pointers.push(RawContact {
                id: i as u32,
                x,
                y,
                tool_type: ToolType::Finger,
                ..Default::default()
            });
        }
        data.mark_ids_from_pointers();
        data
    }

    struct Harness {
        detector: VirtualKeyDetector,
        geometry: SurfaceGeometry,
        ctx: ReaderContext,
        emitter: Emitter,
        last: RawPointerData,
    }

    impl Harness {
        fn new() -> Self {
            let device = device();
            let geometry = geometry(&device);
            Self {
                detector: VirtualKeyDetector::configure(&device, &geometry),
                geometry,
                ctx: ReaderContext::new(),
                emitter: Emitter::new(1),
                last: RawPointerData::new(),
            }
        }

        fn step(&mut self, ms: u64, points: &[(i32, i32)]) -> (bool, Vec<Notification>) {
            let current = frame(points);
            let consumed = self.detector.consume_raw_touches(
                Duration::from_millis(ms),
                PolicyFlags::empty(),
                &current,
                &self.last,
                &self.geometry,
                Duration::from_millis(50),
                &mut self.ctx,
                &mut self.emitter,
            );
            self.last = current;
            (consumed, self.emitter.take())
        }
    }

    #[test]
    fn test_hit_boxes() {
        let h = Harness::new();
        let key = h.detector.keys()[0];
        assert_eq!(key.key_code, 4);
        assert_eq!((key.hit_left, key.hit_right), (0, 50));
        assert_eq!((key.hit_top, key.hit_bottom), (100, 120));
        assert!(key.is_hit(50, 120));
        assert!(!key.is_hit(51, 120));
    }

    #[test]
    fn test_unmapped_key_is_dropped() {
        let device = DeviceProfile::new("no layout")
            .with_axis(ABS_MT_POSITION_X, RawAxisInfo::new(0, 99))
            .with_axis(ABS_MT_POSITION_Y, RawAxisInfo::new(0, 99));
        let detector = VirtualKeyDetector::configure(&device, &geometry(&device));
        assert!(detector.keys().is_empty());
    }

    #[test]
    fn test_press_and_release() {
        let mut h = Harness::new();
        let (consumed, out) = h.step(0, &[(10, 110)]);
        assert!(consumed);
        let down = out[0].as_key().unwrap();
        assert_eq!(down.action, KeyAction::Down);
        assert_eq!(down.key_code, 4);
        assert!(down.policy_flags.contains(PolicyFlags::VIRTUAL));
        assert_eq!(h.detector.key_code_state(4), KeyState::Virtual);
        assert_eq!(h.detector.scan_code_state(KEY_BACK), KeyState::Virtual);

        let (consumed, out) = h.step(10, &[(12, 111)]);
        assert!(consumed);
        assert!(out.is_empty());

        let (consumed, out) = h.step(20, &[]);
        assert!(consumed);
        let up = out[0].as_key().unwrap();
        assert_eq!(up.action, KeyAction::Up);
        assert!(!up.flags.contains(KeyFlags::CANCELED));
        assert_eq!(up.down_time, Duration::ZERO);
        assert_eq!(h.detector.key_code_state(4), KeyState::Up);
        assert_eq!(h.detector.key_code_state(5), KeyState::Unknown);
    }

    #[test]
    fn test_sliding_onto_surface_cancels() {
        let mut h = Harness::new();
        h.step(0, &[(10, 110)]);
        let (consumed, out) = h.step(10, &[(10, 50)]);
        assert!(!consumed);
        let up = out[0].as_key().unwrap();
        assert!(up.flags.contains(KeyFlags::CANCELED));
        assert!(!h.detector.is_key_down());
    }

    #[test]
    fn test_quiet_time_drops_key() {
        let mut h = Harness::new();
        // On-surface touch arms the quiet window.
        assert!(!h.step(0, &[(50, 50)]).0);
        h.step(5, &[]);
        let (consumed, out) = h.step(20, &[(10, 110)]);
        assert!(consumed);
        assert!(out.is_empty());
        // Ignored keys stay silent on release too.
        let (_, out) = h.step(30, &[]);
        assert!(out.is_empty());
    }

    #[test]
    fn test_off_surface_miss_is_swallowed() {
        let mut h = Harness::new();
        let (consumed, out) = h.step(0, &[(90, 110)]);
        assert!(consumed);
        assert!(out.is_empty());
    }
}
