//! Per-frame pointer records: raw contacts, cooked coordinates and id sets.

use std::fmt;

/// Largest pointer id handed out by the allocator.
pub const MAX_POINTER_ID: u32 = 31;
/// Most contacts carried in one frame.
pub const MAX_POINTERS: usize = 16;

/// A set of pointer ids in `0..=MAX_POINTER_ID`.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct IdSet(u32);

impl IdSet {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn count(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn contains(&self, id: u32) -> bool {
        id <= MAX_POINTER_ID && self.0 & (1 << id) != 0
    }

    pub fn insert(&mut self, id: u32) {
        debug_assert!(id <= MAX_POINTER_ID);
        self.0 |= 1 << id;
    }

    pub fn remove(&mut self, id: u32) {
        if id <= MAX_POINTER_ID {
            self.0 &= !(1 << id);
        }
    }

    pub fn clear(&mut self) {
        self.0 = 0;
    }

    /// Smallest id in the set.
    pub fn first(&self) -> Option<u32> {
        (!self.is_empty()).then(|| self.0.trailing_zeros())
    }

    /// Remove and return the smallest id.
    pub fn pop_first(&mut self) -> Option<u32> {
        let id = self.first()?;
        self.remove(id);
        Some(id)
    }

    /// Insert and return the smallest id not yet in the set.
    pub fn insert_first_free(&mut self) -> Option<u32> {
        let free = (!self.0).trailing_zeros();
        if free > MAX_POINTER_ID {
            return None;
        }
        self.insert(free);
        Some(free)
    }

    /// Number of ids below `id`.
    pub fn index_of(&self, id: u32) -> usize {
        let below = if id == 0 { 0 } else { self.0 & (u32::MAX >> (32 - id)) };
        below.count_ones() as usize
    }

    pub fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub fn intersection(self, other: Self) -> Self {
        Self(self.0 & other.0)
    }

    pub fn difference(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> {
        let mut bits = *self;
        std::iter::from_fn(move || bits.pop_first())
    }
}

impl FromIterator<u32> for IdSet {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        let mut set = Self::empty();
        for id in iter {
            set.insert(id);
        }
        set
    }
}

impl fmt::Debug for IdSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToolType {
    #[default]
    Unknown,
    Finger,
    Stylus,
    Mouse,
    Eraser,
}

impl fmt::Display for ToolType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ToolType::Unknown => "unknown",
            ToolType::Finger => "finger",
            ToolType::Stylus => "stylus",
            ToolType::Mouse => "mouse",
            ToolType::Eraser => "eraser",
        };
        f.write_str(s)
    }
}

/// One hardware contact as decoded from a frame, in raw device units.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RawContact {
    pub id: u32,
    pub x: i32,
    pub y: i32,
    pub pressure: i32,
    pub touch_major: i32,
    pub touch_minor: i32,
    pub tool_major: i32,
    pub tool_minor: i32,
    pub orientation: i32,
    pub distance: i32,
    pub tilt_x: i32,
    pub tilt_y: i32,
    pub tool_type: ToolType,
    pub is_hovering: bool,
}

/// All contacts of one sync cycle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawPointerData {
    pub pointers: Vec<RawContact>,
    pub touching_ids: IdSet,
    pub hovering_ids: IdSet,
    id_to_index: [u8; MAX_POINTER_ID as usize + 1],
}

impl RawPointerData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.pointers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pointers.is_empty()
    }

    pub fn clear(&mut self) {
        self.pointers.clear();
        self.clear_ids();
    }

    pub fn clear_ids(&mut self) {
        self.touching_ids.clear();
        self.hovering_ids.clear();
    }

    /// Record pointer `index`'s id in the touching or hovering set.
    pub fn mark_id(&mut self, index: usize, id: u32, hovering: bool) {
        self.pointers[index].id = id;
        self.id_to_index[id as usize] = index as u8;
        if hovering {
            self.hovering_ids.insert(id);
            self.touching_ids.remove(id);
        } else {
            self.touching_ids.insert(id);
            self.hovering_ids.remove(id);
        }
    }

    /// Rebuild the id sets from the ids already stored on each pointer.
    pub fn mark_ids_from_pointers(&mut self) {
        self.clear_ids();
        for i in 0..self.pointers.len() {
            let p = self.pointers[i];
            self.mark_id(i, p.id, p.is_hovering);
        }
    }

    pub fn index_of(&self, id: u32) -> usize {
        self.id_to_index[id as usize] as usize
    }

    pub fn pointer_for_id(&self, id: u32) -> &RawContact {
        &self.pointers[self.index_of(id)]
    }

    pub fn all_ids(&self) -> IdSet {
        self.touching_ids.union(self.hovering_ids)
    }

    /// Average raw position of the touching pointers.
    pub fn centroid_of_touching(&self) -> (f32, f32) {
        let count = self.touching_ids.count();
        if count == 0 {
            return (0.0, 0.0);
        }
        let (mut x, mut y) = (0.0f32, 0.0f32);
        for id in self.touching_ids.iter() {
            let p = self.pointer_for_id(id);
            x += p.x as f32;
            y += p.y as f32;
        }
        (x / count as f32, y / count as f32)
    }
}

/// Pointer axes in surface units.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerCoords {
    pub x: f32,
    pub y: f32,
    pub pressure: f32,
    pub size: f32,
    pub touch_major: f32,
    pub touch_minor: f32,
    pub tool_major: f32,
    pub tool_minor: f32,
    pub orientation: f32,
    pub tilt: f32,
    pub distance: f32,
    pub vscroll: f32,
    pub hscroll: f32,
}

impl PointerCoords {
    pub fn at(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PointerProperties {
    pub id: u32,
    pub tool_type: ToolType,
}

/// Cooked pointers of one frame, index-aligned with the raw frame they came from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CookedPointerData {
    pub coords: Vec<PointerCoords>,
    pub properties: Vec<PointerProperties>,
    pub touching_ids: IdSet,
    pub hovering_ids: IdSet,
    id_to_index: [u8; MAX_POINTER_ID as usize + 1],
}

impl CookedPointerData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.coords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    pub fn clear(&mut self) {
        self.coords.clear();
        self.properties.clear();
        self.touching_ids.clear();
        self.hovering_ids.clear();
    }

    pub fn push(&mut self, coords: PointerCoords, properties: PointerProperties, hovering: bool) {
        let index = self.coords.len();
        let id = properties.id;
        self.coords.push(coords);
        self.properties.push(properties);
        self.id_to_index[id as usize] = index as u8;
        if hovering {
            self.hovering_ids.insert(id);
        } else {
            self.touching_ids.insert(id);
        }
    }

    pub fn index_of(&self, id: u32) -> usize {
        self.id_to_index[id as usize] as usize
    }

    pub fn coords_for_id(&self, id: u32) -> &PointerCoords {
        &self.coords[self.index_of(id)]
    }

    pub fn properties_for_id(&self, id: u32) -> &PointerProperties {
        &self.properties[self.index_of(id)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_set_ordering() {
        let mut set: IdSet = [7, 2, 31].into_iter().collect();
        assert_eq!(set.count(), 3);
        assert_eq!(set.first(), Some(2));
        assert_eq!(set.index_of(7), 1);
        assert_eq!(set.index_of(31), 2);
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![2, 7, 31]);
        assert_eq!(set.pop_first(), Some(2));
        assert!(!set.contains(2));
        assert!(!set.contains(40));
    }

    #[test]
    fn test_id_set_first_free() {
        let mut set: IdSet = [0, 1, 3].into_iter().collect();
        assert_eq!(set.insert_first_free(), Some(2));
        assert_eq!(set.insert_first_free(), Some(4));

        let mut full: IdSet = (0..=MAX_POINTER_ID).collect();
        assert_eq!(full.insert_first_free(), None);
    }

    #[test]
    fn test_set_algebra() {
        let a: IdSet = [1, 2, 3].into_iter().collect();
        let b: IdSet = [2, 3, 4].into_iter().collect();
        assert_eq!(a.intersection(b), [2, 3].into_iter().collect());
        assert_eq!(a.difference(b), [1].into_iter().collect());
        assert_eq!(a.union(b).count(), 4);
    }

    #[test]
    fn test_touching_and_hovering_disjoint() {
        let mut frame = RawPointerData::new();
        frame.pointers.push(RawContact::default());
        frame.mark_id(0, 5, false);
        frame.mark_id(0, 5, true);
        assert!(frame.hovering_ids.contains(5));
        assert!(!frame.touching_ids.contains(5));
        assert_eq!(frame.index_of(5), 0);
    }

    #[test]
    fn test_centroid() {
        let mut frame = RawPointerData::new();
        frame.pointers.push(RawContact { x: 0, y: 10, ..Default::default() });
        frame.pointers.push(RawContact { x: 20, y: 30, ..Default::default() });
        frame.pointers.push(RawContact { x: 500, y: 500, ..Default::default() });
        frame.mark_id(0, 0, false);
        frame.mark_id(1, 1, false);
        frame.mark_id(2, 2, true);
        assert_eq!(frame.centroid_of_touching(), (10.0, 20.0));
    }
}
