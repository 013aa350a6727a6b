//! Lexical environments.
//!
//! An `Environment` is not managed by `vesper-gc`: its lifetime is tied to
//! the evaluator's own call stack (global at startup, one more per function
//! invocation, dropped when the call returns), not to reachability from GC
//! roots. `Rc<RefCell<_>>` gives the sharing a `ref` binding needs — one
//! environment's binding can point at a slot owned by another — without
//! pulling environments into the mark-sweep heap they are not part of.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::value::Value;

pub type EnvRef = Rc<RefCell<Environment>>;

enum Binding {
    Owned(Value),
    /// Redirects to the binding named `1` in environment `0`, which is
    /// always the environment that actually owns the value (ref chains are
    /// resolved to their target at `ref_set` time, never nested).
    Reference(EnvRef, Rc<str>),
}

pub struct Environment {
    bindings: HashMap<Rc<str>, Binding>,
    outer: Option<EnvRef>,
}

impl Environment {
    #[must_use]
    pub fn new_global() -> EnvRef {
        Rc::new(RefCell::new(Environment {
            bindings: HashMap::new(),
            outer: None,
        }))
    }

    #[must_use]
    pub fn new_enclosed(outer: &EnvRef) -> EnvRef {
        Rc::new(RefCell::new(Environment {
            bindings: HashMap::new(),
            outer: Some(Rc::clone(outer)),
        }))
    }

    /// Look up `name`, following reference bindings and enclosing
    /// environments outward. `None` if unbound anywhere in the chain.
    #[must_use]
    pub fn get(env: &EnvRef, name: &str) -> Option<Value> {
        let local = {
            let env_ref = env.borrow();
            match env_ref.bindings.get(name) {
                Some(Binding::Owned(v)) => Some(Ok(*v)),
                Some(Binding::Reference(target, target_name)) => {
                    Some(Err((Rc::clone(target), Rc::clone(target_name))))
                }
                None => None,
            }
        };
        match local {
            Some(Ok(v)) => Some(v),
            Some(Err((target, target_name))) => Environment::get(&target, &target_name),
            None => {
                let outer = env.borrow().outer.clone();
                outer.and_then(|outer| Environment::get(&outer, name))
            }
        }
    }

    /// `let name = value;` — creates or overwrites an *owning* binding in
    /// `env` itself, regardless of any reference binding previously present
    /// there.
    pub fn set(env: &EnvRef, name: Rc<str>, value: Value) {
        env.borrow_mut().bindings.insert(name, Binding::Owned(value));
    }

    /// `ref name = value;` — search `env`'s enclosing environments (not
    /// `env` itself) outward for an existing binding of `name`; if found,
    /// bind `name` in `env` as a reference to that owning slot and write
    /// `value` through to it. Returns `false` if no such binding exists
    /// anywhere outward.
    pub fn ref_set(env: &EnvRef, name: Rc<str>, value: Value) -> bool {
        let mut cursor = env.borrow().outer.clone();
        while let Some(candidate) = cursor {
            let found = {
                let candidate_ref = candidate.borrow();
                match candidate_ref.bindings.get(&name) {
                    Some(Binding::Owned(_)) => Some(Rc::clone(&candidate)),
                    Some(Binding::Reference(target, target_name)) => {
                        Some(Environment::owning_env(target, target_name))
                    }
                    None => None,
                }
            };
            if let Some(owner) = found {
                Environment::set(&owner, Rc::clone(&name), value);
                env.borrow_mut()
                    .bindings
                    .insert(Rc::clone(&name), Binding::Reference(owner, name));
                return true;
            }
            cursor = candidate.borrow().outer.clone();
        }
        false
    }

    /// Resolve a `Reference` binding down to the environment that actually
    /// owns the value (references are never chained more than one hop deep
    /// by construction, but this stays correct even if that changes).
    fn owning_env(env: &EnvRef, name: &Rc<str>) -> EnvRef {
        let next = {
            let env_ref = env.borrow();
            match env_ref.bindings.get(name.as_ref()) {
                Some(Binding::Reference(target, target_name)) => {
                    Some((Rc::clone(target), Rc::clone(target_name)))
                }
                _ => None,
            }
        };
        match next {
            Some((target, target_name)) => Environment::owning_env(&target, &target_name),
            None => Rc::clone(env),
        }
    }

    /// Mark every heap value reachable from `env`'s bindings and its outer
    /// chain. `Reference` bindings hold no payload of their own — the value
    /// they redirect to lives in an owning binding that is itself reached by
    /// walking the outer chain, since `ref_set` only ever points outward.
    pub(crate) fn mark_roots(env: &EnvRef, heap: &mut vesper_gc::Heap<crate::value::HeapObject>) {
        let env_ref = env.borrow();
        for binding in env_ref.bindings.values() {
            if let Binding::Owned(v) = binding {
                if let Some(h) = v.heap_handle() {
                    heap.mark(h);
                }
            }
        }
        if let Some(outer) = &env_ref.outer {
            Environment::mark_roots(outer, heap);
        }
    }
}
