//! A heap of handles forms a DAG in this interpreter (spec §9: arrays hold
//! handles, functions reference the AST not the heap), but the collector
//! must still tolerate a value that references itself without looping
//! forever.

use vesper_gc::{Handle, Heap, Trace, Tracer};

enum Node {
    Leaf,
    Self_(Handle<Node>),
    Pair(Handle<Node>, Handle<Node>),
}

impl Trace for Node {
    fn trace(&self, tracer: &mut Tracer<'_, Self>) {
        match self {
            Node::Leaf => {}
            Node::Self_(h) => tracer.visit(*h),
            Node::Pair(a, b) => {
                tracer.visit(*a);
                tracer.visit(*b);
            }
        }
    }
}

#[test]
fn self_referential_node_does_not_hang_marking() {
    let mut heap: Heap<Node> = Heap::new();
    // Allocate as a leaf first, then patch it into a self-loop, since
    // `alloc` needs the value before a handle to it can exist.
    let root = heap.alloc(Node::Leaf);
    *heap.get_mut(root) = Node::Self_(root);

    heap.mark(root);
    let stats = heap.sweep();
    assert_eq!(stats.reclaimed, 0);
    assert_eq!(stats.survivors, 1);
}

#[test]
fn disjoint_subgraph_is_collected() {
    let mut heap: Heap<Node> = Heap::new();
    let reachable = heap.alloc(Node::Leaf);
    let root = heap.alloc(Node::Self_(reachable));

    let orphan_a = heap.alloc(Node::Leaf);
    let _orphan_pair = heap.alloc(Node::Pair(orphan_a, orphan_a));

    heap.mark(root);
    let stats = heap.sweep();
    assert_eq!(stats.survivors, 2);
    assert_eq!(stats.reclaimed, 2);
}
