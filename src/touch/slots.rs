//! Decoding of per-axis touch events into one frame of raw contacts.
//!
//! Multi-touch devices use either the anonymous protocol, where each contact
//! is terminated by SYN_MT_REPORT and ids must be inferred, or the slotted
//! protocol, where ABS_MT_SLOT selects a contact and ABS_MT_TRACKING_ID
//! names it. Single-touch devices report one contact through ABS_X/ABS_Y.

use crate::device::DeviceInfo;
use crate::input::event::*;
use crate::input::RawEvent;

use super::assign::PointerIdAllocator;
use super::buttons::TouchButtonAccumulator;
use super::pointer::{IdSet, RawContact, RawPointerData, ToolType, MAX_POINTERS, MAX_POINTER_ID};

/// Most slots tracked for a slotted device.
pub const MAX_SLOTS: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    /// Contacts separated by SYN_MT_REPORT, no stable ids.
    Anonymous,
    /// ABS_MT_SLOT / ABS_MT_TRACKING_ID.
    Slotted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub in_use: bool,
    have_touch_minor: bool,
    have_width_minor: bool,
    have_pressure: bool,
    have_tool_type: bool,
    pub x: i32,
    pub y: i32,
    pub touch_major: i32,
    touch_minor: i32,
    pub width_major: i32,
    width_minor: i32,
    pub orientation: i32,
    pub tracking_id: i32,
    pub pressure: i32,
    pub distance: i32,
    tool_type: i32,
}

impl Default for Slot {
    fn default() -> Self {
        Self {
            in_use: false,
            have_touch_minor: false,
            have_width_minor: false,
            have_pressure: false,
            have_tool_type: false,
            x: 0,
            y: 0,
            touch_major: 0,
            touch_minor: 0,
            width_major: 0,
            width_minor: 0,
            orientation: 0,
            tracking_id: -1,
            pressure: 0,
            distance: 0,
            tool_type: 0,
        }
    }
}

impl Slot {
    pub fn touch_minor(&self) -> i32 {
        if self.have_touch_minor {
            self.touch_minor
        } else {
            self.touch_major
        }
    }

    pub fn tool_minor(&self) -> i32 {
        if self.have_width_minor {
            self.width_minor
        } else {
            self.width_major
        }
    }

    pub fn have_pressure(&self) -> bool {
        self.have_pressure
    }

    pub fn tool_type(&self) -> ToolType {
        if !self.have_tool_type {
            return ToolType::Unknown;
        }
        match self.tool_type {
            MT_TOOL_FINGER => ToolType::Finger,
            MT_TOOL_PEN => ToolType::Stylus,
            _ => ToolType::Unknown,
        }
    }
}

/// Slot storage for multi-touch devices plus the tracking id → pointer id map.
#[derive(Debug, Clone)]
pub struct MultiTouchAccumulator {
    protocol: Protocol,
    slots: Vec<Slot>,
    current_slot: i32,
    have_tool_type_axis: bool,
    pointer_ids: IdSet,
    tracking_ids: [i32; MAX_POINTER_ID as usize + 1],
}

impl MultiTouchAccumulator {
    /// Choose the protocol from the axes the device exposes.
    pub fn configure(device: &dyn DeviceInfo) -> Self {
        let tracking = device.abs_axis_info(ABS_MT_TRACKING_ID);
        let slot = device.abs_axis_info(ABS_MT_SLOT);
        let (protocol, count) = match (tracking, slot) {
            (Some(_), Some(slot)) if slot.min == 0 && slot.max > 0 => {
                let mut count = slot.max as usize + 1;
                if count > MAX_SLOTS {
                    log::warn!(
                        "{} reports {} slots, only the first {} are tracked",
                        device.name(),
                        count,
                        MAX_SLOTS
                    );
                    count = MAX_SLOTS;
                }
                (Protocol::Slotted, count)
            }
            _ => (Protocol::Anonymous, MAX_POINTERS),
        };
        log::debug!("{}: {:?} multi-touch protocol, {} slots", device.name(), protocol, count);

        Self {
            protocol,
            slots: vec![Slot::default(); count],
            current_slot: -1,
            have_tool_type_axis: device.abs_axis_info(ABS_MT_TOOL_TYPE).is_some(),
            pointer_ids: IdSet::empty(),
            tracking_ids: [-1; MAX_POINTER_ID as usize + 1],
        }
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    pub fn slot(&self, index: usize) -> Option<&Slot> {
        self.slots.get(index)
    }

    pub fn has_stylus(&self) -> bool {
        self.have_tool_type_axis
    }

    /// Slot contents cannot be read back from the kernel, so everything starts
    /// zeroed. The slotted protocol resumes at the device's current slot.
    pub fn reset(&mut self, device: &dyn DeviceInfo) {
        let initial = match self.protocol {
            Protocol::Slotted => device.abs_value(ABS_MT_SLOT).unwrap_or_else(|| {
                log::debug!("Could not read the current multi-touch slot of {}", device.name());
                -1
            }),
            Protocol::Anonymous => -1,
        };
        self.clear_slots(initial);
        self.pointer_ids.clear();
    }

    fn clear_slots(&mut self, initial: i32) {
        self.slots.iter_mut().for_each(|s| *s = Slot::default());
        self.current_slot = initial;
    }

    pub fn process(&mut self, ev: &RawEvent) {
        if ev.event_type == EV_SYN && ev.code == SYN_MT_REPORT {
            self.current_slot += 1;
            return;
        }
        if ev.event_type != EV_ABS {
            return;
        }

        let mut new_slot = false;
        match self.protocol {
            Protocol::Slotted if ev.code == ABS_MT_SLOT => {
                self.current_slot = ev.value;
                new_slot = true;
            }
            Protocol::Anonymous if self.current_slot < 0 => self.current_slot = 0,
            _ => {}
        }

        let index = self.current_slot;
        let protocol = self.protocol;
        let Some(slot) = usize::try_from(index).ok().and_then(|i| self.slots.get_mut(i)) else {
            if new_slot {
                log::debug!(
                    "Ignoring invalid slot index {}, expected 0..{}",
                    index,
                    self.slots.len()
                );
            }
            return;
        };

        match ev.code {
            ABS_MT_POSITION_X => {
                slot.in_use = true;
                slot.x = ev.value;
            }
            ABS_MT_POSITION_Y => {
                slot.in_use = true;
                slot.y = ev.value;
            }
            ABS_MT_TOUCH_MAJOR => {
                slot.in_use = true;
                slot.touch_major = ev.value;
            }
            ABS_MT_TOUCH_MINOR => {
                slot.in_use = true;
                slot.touch_minor = ev.value;
                slot.have_touch_minor = true;
            }
            ABS_MT_WIDTH_MAJOR => {
                slot.in_use = true;
                slot.width_major = ev.value;
            }
            ABS_MT_WIDTH_MINOR => {
                slot.in_use = true;
                slot.width_minor = ev.value;
                slot.have_width_minor = true;
            }
            ABS_MT_ORIENTATION => {
                slot.in_use = true;
                slot.orientation = ev.value;
            }
            ABS_MT_TRACKING_ID => {
                if protocol == Protocol::Slotted && ev.value < 0 {
                    // Released; the old contents stay around for the next contact.
                    slot.in_use = false;
                } else {
                    slot.in_use = true;
                    slot.tracking_id = ev.value;
                }
            }
            ABS_MT_PRESSURE => {
                slot.in_use = true;
                slot.pressure = ev.value;
                slot.have_pressure = true;
            }
            ABS_MT_DISTANCE => {
                slot.in_use = true;
                slot.distance = ev.value;
            }
            ABS_MT_TOOL_TYPE => {
                slot.in_use = true;
                slot.tool_type = ev.value;
                slot.have_tool_type = true;
            }
            _ => {}
        }
    }

    /// Build the frame from the in-use slots. Returns whether every contact
    /// carried a usable tracking id.
    fn sync(
        &mut self,
        out: &mut RawPointerData,
        buttons: &TouchButtonAccumulator,
        pressure_valid: bool,
        allocator: &mut PointerIdAllocator,
    ) -> bool {
        let mut have_ids = true;
        let mut new_ids = IdSet::empty();

        for slot in self.slots.iter().filter(|s| s.in_use) {
            if out.len() >= MAX_POINTERS {
                log::debug!("More than {} contacts in one frame, ignoring the rest", MAX_POINTERS);
                break;
            }

            let mut tool_type = slot.tool_type();
            if tool_type == ToolType::Unknown {
                tool_type = buttons.tool_type();
            }
            if tool_type == ToolType::Unknown {
                tool_type = ToolType::Finger;
            }
            let is_hovering = buttons.tool_type() != ToolType::Mouse
                && (buttons.is_hovering()
                    || (pressure_valid && slot.have_pressure && slot.pressure <= 0));

            let index = out.len();
            out.pointers.push(RawContact {
                id: 0,
                x: slot.x,
                y: slot.y,
                pressure: slot.pressure,
                touch_major: slot.touch_major,
                touch_minor: slot.touch_minor(),
                tool_major: slot.width_major,
                tool_minor: slot.tool_minor(),
                orientation: slot.orientation,
                distance: slot.distance,
                tilt_x: 0,
                tilt_y: 0,
                tool_type,
                is_hovering,
            });

            if !have_ids {
                continue;
            }
            let id = if slot.tracking_id >= 0 {
                let known = self
                    .pointer_ids
                    .iter()
                    .find(|&n| self.tracking_ids[n as usize] == slot.tracking_id);
                Some(known.unwrap_or_else(|| {
                    let id = allocator.fetch(self.pointer_ids.union(new_ids));
                    self.pointer_ids.insert(id);
                    self.tracking_ids[id as usize] = slot.tracking_id;
                    id
                }))
            } else {
                None
            };
            match id {
                Some(id) => {
                    out.mark_id(index, id, is_hovering);
                    new_ids.insert(id);
                }
                None => {
                    have_ids = false;
                    out.clear_ids();
                    new_ids.clear();
                }
            }
        }

        self.pointer_ids = new_ids;
        if self.protocol == Protocol::Anonymous {
            self.clear_slots(-1);
        }
        have_ids
    }
}

/// ABS_X/ABS_Y style single contact devices.
#[derive(Debug, Clone, Default)]
pub struct SingleTouchAccumulator {
    x: i32,
    y: i32,
    pressure: i32,
    tool_width: i32,
    distance: i32,
    tilt_x: i32,
    tilt_y: i32,
}

impl SingleTouchAccumulator {
    pub fn reset(&mut self, device: &dyn DeviceInfo) {
        let value = |code| device.abs_value(code).unwrap_or(0);
        self.x = value(ABS_X);
        self.y = value(ABS_Y);
        self.pressure = value(ABS_PRESSURE);
        self.tool_width = value(ABS_TOOL_WIDTH);
        self.distance = value(ABS_DISTANCE);
        self.tilt_x = value(ABS_TILT_X);
        self.tilt_y = value(ABS_TILT_Y);
    }

    pub fn process(&mut self, ev: &RawEvent) {
        if ev.event_type != EV_ABS {
            return;
        }
        match ev.code {
            ABS_X => self.x = ev.value,
            ABS_Y => self.y = ev.value,
            ABS_PRESSURE => self.pressure = ev.value,
            ABS_TOOL_WIDTH => self.tool_width = ev.value,
            ABS_DISTANCE => self.distance = ev.value,
            ABS_TILT_X => self.tilt_x = ev.value,
            ABS_TILT_Y => self.tilt_y = ev.value,
            _ => {}
        }
    }

    fn sync(
        &self,
        out: &mut RawPointerData,
        last: &RawPointerData,
        buttons: &TouchButtonAccumulator,
        pressure_valid: bool,
    ) -> bool {
        if !buttons.is_tool_active() {
            return true;
        }
        let is_hovering = buttons.tool_type() != ToolType::Mouse
            && (buttons.is_hovering() || (pressure_valid && self.pressure <= 0));
        let tool_type = match buttons.tool_type() {
            ToolType::Unknown => ToolType::Finger,
            other => other,
        };
        out.pointers.push(RawContact {
            id: 0,
            x: self.x,
            y: self.y,
            pressure: self.pressure,
            touch_major: 0,
            touch_minor: 0,
            tool_major: self.tool_width,
            tool_minor: self.tool_width,
            orientation: 0,
            distance: self.distance,
            tilt_x: self.tilt_x,
            tilt_y: self.tilt_y,
            tool_type,
            is_hovering,
        });
        if last.len() == 1 {
            out.mark_id(0, last.pointers[0].id, is_hovering);
            true
        } else {
            false
        }
    }
}

/// The decoder for one device, fixed at configuration time.
#[derive(Debug, Clone)]
pub enum MotionAccumulator {
    Single(SingleTouchAccumulator),
    Multi(MultiTouchAccumulator),
}

impl MotionAccumulator {
    /// Multi-touch when the device has MT position axes, single-touch otherwise.
    pub fn configure(device: &dyn DeviceInfo) -> Self {
        if device.abs_axis_info(ABS_MT_POSITION_X).is_some()
            && device.abs_axis_info(ABS_MT_POSITION_Y).is_some()
        {
            MotionAccumulator::Multi(MultiTouchAccumulator::configure(device))
        } else {
            MotionAccumulator::Single(SingleTouchAccumulator::default())
        }
    }

    pub fn is_multi_touch(&self) -> bool {
        matches!(self, MotionAccumulator::Multi(_))
    }

    pub fn reset(&mut self, device: &dyn DeviceInfo) {
        match self {
            MotionAccumulator::Single(acc) => acc.reset(device),
            MotionAccumulator::Multi(acc) => acc.reset(device),
        }
    }

    pub fn process(&mut self, ev: &RawEvent) {
        match self {
            MotionAccumulator::Single(acc) => acc.process(ev),
            MotionAccumulator::Multi(acc) => acc.process(ev),
        }
    }

    pub fn has_stylus(&self) -> bool {
        match self {
            MotionAccumulator::Single(_) => false,
            MotionAccumulator::Multi(acc) => acc.has_stylus(),
        }
    }

    /// Fill `out` with this frame's contacts.
    ///
    /// Returns `false` when ids could not be derived from the hardware and
    /// must be assigned by distance.
    pub fn sync(
        &mut self,
        out: &mut RawPointerData,
        last: &RawPointerData,
        buttons: &TouchButtonAccumulator,
        pressure_valid: bool,
        allocator: &mut PointerIdAllocator,
    ) -> bool {
        out.clear();
        match self {
            MotionAccumulator::Single(acc) => acc.sync(out, last, buttons, pressure_valid),
            MotionAccumulator::Multi(acc) => acc.sync(out, buttons, pressure_valid, allocator),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{DeviceProfile, RawAxisInfo};
    use std::time::Duration;

    fn abs(code: u16, value: i32) -> RawEvent {
        RawEvent::abs(Duration::ZERO, code, value)
    }

    fn slotted_device(max_slot: i32) -> DeviceProfile {
        DeviceProfile::new("slotted")
            .with_axis(ABS_MT_POSITION_X, RawAxisInfo::new(0, 1000))
            .with_axis(ABS_MT_POSITION_Y, RawAxisInfo::new(0, 1000))
            .with_axis(ABS_MT_SLOT, RawAxisInfo::new(0, max_slot))
            .with_axis(ABS_MT_TRACKING_ID, RawAxisInfo::new(0, 65535))
    }

    fn anonymous_device() -> DeviceProfile {
        DeviceProfile::new("anonymous")
            .with_axis(ABS_MT_POSITION_X, RawAxisInfo::new(0, 1000))
            .with_axis(ABS_MT_POSITION_Y, RawAxisInfo::new(0, 1000))
    }

    fn sync(acc: &mut MotionAccumulator, last: &RawPointerData) -> (RawPointerData, bool) {
        let mut out = RawPointerData::new();
        let mut alloc = PointerIdAllocator::new();
        let have_ids = acc.sync(&mut out, last, &TouchButtonAccumulator::default(), false, &mut alloc);
        (out, have_ids)
    }

    #[test]
    fn test_protocol_selection() {
        let MotionAccumulator::Multi(acc) = MotionAccumulator::configure(&slotted_device(9)) else {
            panic!("expected multi-touch");
        };
        assert_eq!(acc.protocol(), Protocol::Slotted);
        assert_eq!(acc.slots.len(), 10);

        let MotionAccumulator::Multi(acc) = MotionAccumulator::configure(&slotted_device(63)) else {
            panic!("expected multi-touch");
        };
        assert_eq!(acc.slots.len(), MAX_SLOTS);

        let MotionAccumulator::Multi(acc) = MotionAccumulator::configure(&anonymous_device()) else {
            panic!("expected multi-touch");
        };
        assert_eq!(acc.protocol(), Protocol::Anonymous);

        let single = MotionAccumulator::configure(&DeviceProfile::new("st"));
        assert!(!single.is_multi_touch());
    }

    #[test]
    fn test_released_slot_keeps_stale_data() {
        let device = slotted_device(9);
        let mut acc = MotionAccumulator::configure(&device);
        acc.reset(&device);
        for ev in [
            abs(ABS_MT_SLOT, 2),
            abs(ABS_MT_TRACKING_ID, 40),
            abs(ABS_MT_POSITION_X, 300),
            abs(ABS_MT_POSITION_Y, 400),
        ] {
            acc.process(&ev);
        }
        let (frame, have_ids) = sync(&mut acc, &RawPointerData::new());
        assert!(have_ids);
        assert_eq!(frame.touching_ids.count(), 1);

        acc.process(&abs(ABS_MT_SLOT, 2));
        acc.process(&abs(ABS_MT_TRACKING_ID, -1));
        let MotionAccumulator::Multi(multi) = &acc else {
            panic!("expected multi-touch");
        };
        let slot = multi.slot(2).unwrap();
        assert!(!slot.in_use);
        assert_eq!((slot.x, slot.y, slot.tracking_id), (300, 400, 40));

        let (frame, _) = sync(&mut acc, &frame);
        assert!(frame.is_empty());
        assert!(frame.touching_ids.is_empty() && frame.hovering_ids.is_empty());
    }

    #[test]
    fn test_out_of_range_slot_is_dropped() {
        let device = slotted_device(3);
        let mut acc = MotionAccumulator::configure(&device);
        acc.reset(&device);
        acc.process(&abs(ABS_MT_SLOT, 0));
        acc.process(&abs(ABS_MT_TRACKING_ID, 1));
        acc.process(&abs(ABS_MT_POSITION_X, 10));
        acc.process(&abs(ABS_MT_SLOT, 7));
        acc.process(&abs(ABS_MT_TRACKING_ID, 2));
        acc.process(&abs(ABS_MT_POSITION_X, 20));

        let (frame, have_ids) = sync(&mut acc, &RawPointerData::new());
        assert!(have_ids);
        assert_eq!(frame.len(), 1);
        assert_eq!(frame.pointers[0].x, 10);
    }

    #[test]
    fn test_tracking_ids_map_to_stable_pointer_ids() {
        let device = slotted_device(9);
        let mut acc = MotionAccumulator::configure(&device);
        acc.reset(&device);
        let mut alloc = PointerIdAllocator::new();
        let buttons = TouchButtonAccumulator::default();

        for ev in [
            abs(ABS_MT_SLOT, 0),
            abs(ABS_MT_TRACKING_ID, 5),
            abs(ABS_MT_SLOT, 1),
            abs(ABS_MT_TRACKING_ID, 7),
        ] {
            acc.process(&ev);
        }
        let mut first = RawPointerData::new();
        assert!(acc.sync(&mut first, &RawPointerData::new(), &buttons, false, &mut alloc));
        assert_eq!(first.pointers.iter().map(|p| p.id).collect::<Vec<_>>(), vec![0, 1]);

        acc.process(&abs(ABS_MT_SLOT, 0));
        acc.process(&abs(ABS_MT_TRACKING_ID, -1));
        acc.process(&abs(ABS_MT_SLOT, 1));
        acc.process(&abs(ABS_MT_POSITION_X, 99));
        let mut second = RawPointerData::new();
        assert!(acc.sync(&mut second, &first, &buttons, false, &mut alloc));
        assert_eq!(second.len(), 1);
        assert_eq!(second.pointers[0].id, 1);
    }

    #[test]
    fn test_anonymous_protocol_needs_assignment() {
        let device = anonymous_device();
        let mut acc = MotionAccumulator::configure(&device);
        acc.reset(&device);
        let t = Duration::ZERO;
        acc.process(&abs(ABS_MT_POSITION_X, 10));
        acc.process(&abs(ABS_MT_POSITION_Y, 20));
        acc.process(&RawEvent::mt_report(t));
        acc.process(&abs(ABS_MT_POSITION_X, 30));
        acc.process(&abs(ABS_MT_POSITION_Y, 40));
        acc.process(&RawEvent::mt_report(t));

        let (frame, have_ids) = sync(&mut acc, &RawPointerData::new());
        assert!(!have_ids);
        assert_eq!(frame.len(), 2);
        assert_eq!(frame.pointers[1].x, 30);
        assert_eq!(frame.pointers[0].tool_type, ToolType::Finger);

        // Slots are cleared after every frame.
        let (frame, _) = sync(&mut acc, &frame);
        assert!(frame.is_empty());
    }

    #[test]
    fn test_single_touch_carries_id() {
        let device = DeviceProfile::new("st")
            .with_key(BTN_TOUCH)
            .with_axis(ABS_X, RawAxisInfo::new(0, 100))
            .with_axis(ABS_Y, RawAxisInfo::new(0, 100));
        let mut acc = MotionAccumulator::configure(&device);
        let mut buttons = TouchButtonAccumulator::default();
        buttons.configure(&device);
        buttons.process(&RawEvent::key(Duration::ZERO, BTN_TOUCH, true));
        acc.process(&abs(ABS_X, 42));

        let mut alloc = PointerIdAllocator::new();
        let mut first = RawPointerData::new();
        assert!(!acc.sync(&mut first, &RawPointerData::new(), &buttons, false, &mut alloc));
        assert_eq!(first.pointers[0].x, 42);

        first.mark_id(0, 6, false);
        let mut second = RawPointerData::new();
        assert!(acc.sync(&mut second, &first, &buttons, false, &mut alloc));
        assert!(second.touching_ids.contains(6));
    }
}
