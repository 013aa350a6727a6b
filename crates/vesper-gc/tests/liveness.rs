//! spec §8 GC liveness: after many statements producing unreachable
//! temporaries, the registry size must not grow without bound.

use vesper_gc::{Handle, Heap, Trace, Tracer};

enum Scratch {
    Value(i64),
}

impl Trace for Scratch {
    fn trace(&self, _tracer: &mut Tracer<'_, Self>) {}
}

#[test]
fn repeated_alloc_and_sweep_caps_heap_size() {
    let mut heap: Heap<Scratch> = Heap::new();
    let root: Handle<Scratch> = heap.alloc(Scratch::Value(0));

    for i in 0..10_000 {
        let _temporary = heap.alloc(Scratch::Value(i));
        if i % 100 == 0 {
            heap.mark(root);
            heap.sweep();
        }
    }
    heap.mark(root);
    heap.sweep();

    assert_eq!(heap.len(), 1);
}
