use crate::handle::Handle;
use crate::trace::{Trace, Tracer};

enum Slot<T> {
    Occupied {
        value: T,
        marked: bool,
        generation: u32,
    },
    Vacant {
        generation: u32,
    },
}

/// Outcome of a single [`Heap::sweep`] pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepStats {
    /// Values reclaimed by this sweep.
    pub reclaimed: usize,
    /// Values that survived this sweep (still live afterward).
    pub survivors: usize,
}

/// A generational arena of `T` values, swept by a mark-and-sweep collector.
///
/// `Heap` never moves a live value once allocated (slot indices are stable
/// across sweeps), and it never frees anything the caller hasn't first
/// failed to mark in a call to [`Heap::mark`].
pub struct Heap<T: Trace> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    live_count: usize,
}

impl<T: Trace> Default for Heap<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Trace> Heap<T> {
    /// Create an empty heap.
    #[must_use]
    pub fn new() -> Self {
        Heap {
            slots: Vec::new(),
            free: Vec::new(),
            live_count: 0,
        }
    }

    /// Number of values currently live in the heap.
    #[must_use]
    pub fn len(&self) -> usize {
        self.live_count
    }

    /// True if nothing is currently allocated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live_count == 0
    }

    /// Allocate `value` and return a handle to it. The value starts
    /// unmarked; it survives only if reachable the next time [`Heap::mark`]
    /// runs before [`Heap::sweep`].
    pub fn alloc(&mut self, value: T) -> Handle<T> {
        self.live_count += 1;
        if let Some(index) = self.free.pop() {
            let generation = match &self.slots[index as usize] {
                Slot::Vacant { generation } => *generation,
                Slot::Occupied { .. } => unreachable!("free list pointed at an occupied slot"),
            };
            self.slots[index as usize] = Slot::Occupied {
                value,
                marked: false,
                generation,
            };
            Handle::new(index, generation)
        } else {
            let index = u32::try_from(self.slots.len()).expect("heap grew past u32::MAX slots");
            self.slots.push(Slot::Occupied {
                value,
                marked: false,
                generation: 0,
            });
            Handle::new(index, 0)
        }
    }

    /// Dereference `handle`.
    ///
    /// # Panics
    ///
    /// Panics if `handle` refers to a slot that has been swept and possibly
    /// reused since the handle was obtained. Under a correctly rooted
    /// evaluator this can never happen (spec §4.3 GC soundness); if it does,
    /// it indicates a root was not marked before a sweep.
    #[must_use]
    pub fn get(&self, handle: Handle<T>) -> &T {
        match self.slots.get(handle.index as usize) {
            Some(Slot::Occupied {
                value, generation, ..
            }) if *generation == handle.generation => value,
            _ => panic!("vesper-gc: dereferenced a stale or out-of-range handle"),
        }
    }

    /// Mutably dereference `handle`. See [`Heap::get`] for panic conditions.
    pub fn get_mut(&mut self, handle: Handle<T>) -> &mut T {
        match self.slots.get_mut(handle.index as usize) {
            Some(Slot::Occupied {
                value, generation, ..
            }) if *generation == handle.generation => value,
            _ => panic!("vesper-gc: dereferenced a stale or out-of-range handle"),
        }
    }

    /// Mark `root` and everything transitively reachable from it via
    /// [`Trace::trace`]. Safe to call multiple times with different roots
    /// before a single [`Heap::sweep`]; already-marked values are not
    /// retraced.
    pub fn mark(&mut self, root: Handle<T>) {
        let mut worklist = vec![root];
        while let Some(handle) = worklist.pop() {
            let Some(slot) = self.slots.get_mut(handle.index as usize) else {
                continue;
            };
            let Slot::Occupied {
                value,
                marked,
                generation,
            } = slot
            else {
                continue;
            };
            if *generation != handle.generation || *marked {
                continue;
            }
            *marked = true;
            let mut tracer = Tracer::new(&mut worklist);
            value.trace(&mut tracer);
        }
    }

    /// Reclaim every value that was not marked since the last sweep, and
    /// clear the mark bit on every survivor.
    #[cfg_attr(feature = "tracing", tracing::instrument(level = "trace", skip(self)))]
    pub fn sweep(&mut self) -> SweepStats {
        let mut stats = SweepStats::default();
        for (index, slot) in self.slots.iter_mut().enumerate() {
            match slot {
                Slot::Occupied { marked, .. } if *marked => {
                    *marked = false;
                    stats.survivors += 1;
                }
                Slot::Occupied { generation, .. } => {
                    let next_generation = generation.wrapping_add(1);
                    *slot = Slot::Vacant {
                        generation: next_generation,
                    };
                    self.free.push(u32::try_from(index).unwrap());
                    stats.reclaimed += 1;
                }
                Slot::Vacant { .. } => {}
            }
        }
        self.live_count -= stats.reclaimed;
        #[cfg(feature = "tracing")]
        tracing::trace!(reclaimed = stats.reclaimed, survivors = stats.survivors, "gc sweep");
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    enum Leaf {
        Int(i64),
        Cons(Handle<Leaf>, Handle<Leaf>),
    }

    impl Trace for Leaf {
        fn trace(&self, tracer: &mut Tracer<'_, Self>) {
            if let Leaf::Cons(a, b) = self {
                tracer.visit(*a);
                tracer.visit(*b);
            }
        }
    }

    #[test]
    fn alloc_and_get_roundtrip() {
        let mut heap: Heap<Leaf> = Heap::new();
        let h = heap.alloc(Leaf::Int(42));
        match heap.get(h) {
            Leaf::Int(n) => assert_eq!(*n, 42),
            Leaf::Cons(..) => panic!("wrong variant"),
        }
    }

    #[test]
    fn unreachable_values_are_reclaimed() {
        let mut heap: Heap<Leaf> = Heap::new();
        let root = heap.alloc(Leaf::Int(1));
        let _garbage = heap.alloc(Leaf::Int(2));
        assert_eq!(heap.len(), 2);

        heap.mark(root);
        let stats = heap.sweep();
        assert_eq!(stats.reclaimed, 1);
        assert_eq!(stats.survivors, 1);
        assert_eq!(heap.len(), 1);
    }

    #[test]
    fn reachable_children_survive_transitively() {
        let mut heap: Heap<Leaf> = Heap::new();
        let leaf_a = heap.alloc(Leaf::Int(1));
        let leaf_b = heap.alloc(Leaf::Int(2));
        let cons = heap.alloc(Leaf::Cons(leaf_a, leaf_b));

        heap.mark(cons);
        let stats = heap.sweep();
        assert_eq!(stats.reclaimed, 0);
        assert_eq!(stats.survivors, 3);
    }

    #[test]
    fn stale_handle_after_sweep_panics() {
        let mut heap: Heap<Leaf> = Heap::new();
        let root = heap.alloc(Leaf::Int(1));
        let garbage = heap.alloc(Leaf::Int(2));
        heap.mark(root);
        heap.sweep();

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| heap.get(garbage)));
        assert!(result.is_err());
    }

    #[test]
    fn repeated_sweeps_without_marking_reclaim_everything() {
        let mut heap: Heap<Leaf> = Heap::new();
        heap.alloc(Leaf::Int(1));
        heap.alloc(Leaf::Int(2));
        heap.alloc(Leaf::Int(3));
        let stats = heap.sweep();
        assert_eq!(stats.reclaimed, 3);
        assert!(heap.is_empty());
    }

    #[test]
    fn freed_slots_are_reused_on_next_alloc() {
        let mut heap: Heap<Leaf> = Heap::new();
        heap.alloc(Leaf::Int(1));
        heap.sweep();
        let h = heap.alloc(Leaf::Int(2));
        assert_eq!(heap.len(), 1);
        match heap.get(h) {
            Leaf::Int(n) => assert_eq!(*n, 2),
            Leaf::Cons(..) => panic!("wrong variant"),
        }
    }
}
