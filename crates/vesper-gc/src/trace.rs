use crate::handle::Handle;

/// Types that can live inside a [`crate::Heap<T>`] must know how to hand the
/// collector every handle they hold onto directly.
///
/// `trace` is called once per mark pass for every value reachable from a
/// root; implementations should call [`Tracer::visit`] for each `Handle<T>`
/// they own, and nothing else — the collector takes care of recursion and
/// of not revisiting an already-marked value.
pub trait Trace: Sized {
    /// Report every handle this value directly references.
    fn trace(&self, tracer: &mut Tracer<'_, Self>);
}

/// Passed to [`Trace::trace`]; accumulates the handles discovered during one
/// step of marking so the collector can continue the walk.
pub struct Tracer<'a, T> {
    worklist: &'a mut Vec<Handle<T>>,
}

impl<'a, T> Tracer<'a, T> {
    pub(crate) fn new(worklist: &'a mut Vec<Handle<T>>) -> Self {
        Tracer { worklist }
    }

    /// Record that `handle` is reachable from the value currently being
    /// traced. The collector marks it (if not already marked) and will
    /// trace its children in turn.
    pub fn visit(&mut self, handle: Handle<T>) {
        self.worklist.push(handle);
    }
}
