//! Stable pointer ids for devices that do not report them.

use super::pointer::{IdSet, RawPointerData, MAX_POINTER_ID};

/// Cycles through `0..=MAX_POINTER_ID`, skipping ids that are still live.
#[derive(Debug, Clone, Default)]
pub struct PointerIdAllocator {
    next: u32,
}

impl PointerIdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.next = 0;
    }

    /// Hand out the next id not contained in `live`.
    ///
    /// At most `MAX_POINTERS` contacts exist at once so a free id always exists.
    pub fn fetch(&mut self, live: IdSet) -> u32 {
        loop {
            let id = self.next;
            self.next = if self.next >= MAX_POINTER_ID { 0 } else { self.next + 1 };
            if !live.contains(id) {
                return id;
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    current: usize,
    last: usize,
    distance: u64,
}

fn sift_down(heap: &mut [Candidate], mut parent: usize) {
    loop {
        let mut child = parent * 2 + 1;
        if child >= heap.len() {
            break;
        }
        if child + 1 < heap.len() && heap[child + 1].distance < heap[child].distance {
            child += 1;
        }
        if heap[parent].distance <= heap[child].distance {
            break;
        }
        heap.swap(parent, child);
        parent = child;
    }
}

fn pop_min(heap: &mut Vec<Candidate>) -> Option<Candidate> {
    if heap.is_empty() {
        return None;
    }
    let min = heap.swap_remove(0);
    sift_down(heap, 0);
    Some(min)
}

/// Give every pointer in `current` an id, carrying ids over from `last` for
/// the nearest pointers of the same tool type.
///
/// Pairs are matched greedily by increasing squared distance. Equal distances
/// resolve in heap extraction order, which depends only on the pointer order
/// within each frame.
pub fn assign_pointer_ids(
    last: &RawPointerData,
    current: &mut RawPointerData,
    allocator: &mut PointerIdAllocator,
) {
    current.clear_ids();

    if current.is_empty() {
        return;
    }

    if last.is_empty() {
        for i in 0..current.len() {
            let id = allocator.fetch(current.all_ids());
            let hovering = current.pointers[i].is_hovering;
            current.mark_id(i, id, hovering);
        }
        return;
    }

    if current.len() == 1 && last.len() == 1 && current.pointers[0].tool_type == last.pointers[0].tool_type {
        let id = last.pointers[0].id;
        let hovering = current.pointers[0].is_hovering;
        current.mark_id(0, id, hovering);
        return;
    }

    let mut heap = Vec::with_capacity(current.len() * last.len());
    for (ci, cur) in current.pointers.iter().enumerate() {
        for (li, prev) in last.pointers.iter().enumerate() {
            if cur.tool_type != prev.tool_type {
                continue;
            }
            let dx = i64::from(cur.x) - i64::from(prev.x);
            let dy = i64::from(cur.y) - i64::from(prev.y);
            heap.push(Candidate {
                current: ci,
                last: li,
                distance: (dx * dx + dy * dy) as u64,
            });
        }
    }
    for start in (0..heap.len() / 2).rev() {
        sift_down(&mut heap, start);
    }

    let mut matched_current = IdSet::empty();
    let mut matched_last = IdSet::empty();
    let mut remaining = current.len().min(last.len());
    while remaining > 0 {
        let Some(c) = pop_min(&mut heap) else {
            break;
        };
        if matched_current.contains(c.current as u32) || matched_last.contains(c.last as u32) {
            continue;
        }
        matched_current.insert(c.current as u32);
        matched_last.insert(c.last as u32);
        remaining -= 1;

        let id = last.pointers[c.last].id;
        let hovering = current.pointers[c.current].is_hovering;
        current.mark_id(c.current, id, hovering);
        log::trace!(
            "matched current={} last={} id={} distance={}",
            c.current,
            c.last,
            id,
            c.distance
        );
    }

    // Fresh ids must also avoid ids carried over above.
    for i in 0..current.len() {
        if matched_current.contains(i as u32) {
            continue;
        }
        let id = allocator.fetch(current.all_ids().union(last.all_ids()));
        let hovering = current.pointers[i].is_hovering;
        current.mark_id(i, id, hovering);
        log::trace!("assigned current={} id={}", i, id);
    }
}
