//! Runtime values and the heap-allocated objects they may point into.
//!
//! `Value` carries its own kind tag (`Integer`, `Str`, `Array`, ...) rather
//! than requiring a heap lookup to answer "what kind of thing is this" —
//! `Boolean`, `Null` and `Builtin` need no heap payload at all, and the
//! handle-bearing variants already know their own kind by construction.

use std::rc::Rc;

use vesper_gc::{Handle, Tracer};

use crate::ast::BlockStatement;

pub type ObjHandle = Handle<HeapObject>;

/// A builtin function, identified by a closed enum rather than by name
/// lookup at call time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Print,
    Len,
    First,
    Last,
    Rest,
}

impl Builtin {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Builtin::Print => "print",
            Builtin::Len => "len",
            Builtin::First => "first",
            Builtin::Last => "last",
            Builtin::Rest => "rest",
        }
    }

    #[must_use]
    pub fn lookup(name: &str) -> Option<Self> {
        Some(match name {
            "print" => Builtin::Print,
            "len" => Builtin::Len,
            "first" => Builtin::First,
            "last" => Builtin::Last,
            "rest" => Builtin::Rest,
            _ => return None,
        })
    }
}

/// A runtime value. Copy: heap-backed kinds hold only a handle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Integer(ObjHandle),
    Str(ObjHandle),
    Array(ObjHandle),
    Function(ObjHandle),
    ReturnValue(ObjHandle),
    Error(ObjHandle),
    Boolean(bool),
    Builtin(Builtin),
    Null,
}

impl Value {
    pub const TRUE: Value = Value::Boolean(true);
    pub const FALSE: Value = Value::Boolean(false);

    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Integer(_) => "INTEGER",
            Value::Str(_) => "STRING",
            Value::Array(_) => "ARRAY",
            Value::Function(_) => "FUNCTION",
            Value::ReturnValue(_) => "RETURN_VALUE",
            Value::Error(_) => "ERROR",
            Value::Boolean(_) => "BOOLEAN",
            Value::Builtin(_) => "BUILTIN",
            Value::Null => "NULL",
        }
    }

    /// The handle this value points into the heap with, if any.
    #[must_use]
    pub fn heap_handle(&self) -> Option<ObjHandle> {
        match *self {
            Value::Integer(h)
            | Value::Str(h)
            | Value::Array(h)
            | Value::Function(h)
            | Value::ReturnValue(h)
            | Value::Error(h) => Some(h),
            Value::Boolean(_) | Value::Builtin(_) | Value::Null => None,
        }
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    #[must_use]
    pub fn is_return_value(&self) -> bool {
        matches!(self, Value::ReturnValue(_))
    }

    /// Boolean-context truthiness: everything is truthy except `false` and
    /// `null`. Integer 0 is truthy — only `Boolean` and `Null` participate.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Boolean(false) | Value::Null)
    }

    /// Render this value the way `print` and the REPL do.
    #[must_use]
    pub fn inspect(self, heap: &vesper_gc::Heap<HeapObject>) -> String {
        match self {
            Value::Integer(h) => match heap.get(h) {
                HeapObject::Integer(n) => n.to_string(),
                _ => unreachable!("Value::Integer handle must point at HeapObject::Integer"),
            },
            Value::Str(h) => match heap.get(h) {
                HeapObject::Str(s) => s.clone(),
                _ => unreachable!("Value::Str handle must point at HeapObject::Str"),
            },
            Value::Array(h) => match heap.get(h) {
                HeapObject::Array(elems) => {
                    let rendered: Vec<String> = elems.iter().map(|v| v.inspect(heap)).collect();
                    format!("[{}]", rendered.join(", "))
                }
                _ => unreachable!("Value::Array handle must point at HeapObject::Array"),
            },
            Value::Function(h) => match heap.get(h) {
                HeapObject::Function { parameters, .. } => {
                    format!("fn({}){{...}}", parameters.join(", "))
                }
                _ => unreachable!("Value::Function handle must point at HeapObject::Function"),
            },
            Value::ReturnValue(h) => match heap.get(h) {
                HeapObject::ReturnValue(v) => v.inspect(heap),
                _ => unreachable!("Value::ReturnValue handle must point at HeapObject::ReturnValue"),
            },
            Value::Error(h) => match heap.get(h) {
                HeapObject::Error(msg) => format!("ERROR: {msg}"),
                _ => unreachable!("Value::Error handle must point at HeapObject::Error"),
            },
            Value::Boolean(b) => b.to_string(),
            Value::Builtin(b) => format!("builtin function: {}", b.name()),
            Value::Null => "null".to_string(),
        }
    }
}

/// Heap-allocated runtime objects. Every `Value` variant that is not
/// `Boolean`, `Builtin` or `Null` stores its payload here.
pub enum HeapObject {
    Integer(i64),
    Str(String),
    Array(Vec<Value>),
    Function {
        parameters: Rc<[Rc<str>]>,
        body: Rc<BlockStatement>,
    },
    ReturnValue(Value),
    Error(String),
}

impl vesper_gc::Trace for HeapObject {
    fn trace(&self, tracer: &mut Tracer<'_, Self>) {
        match self {
            HeapObject::Array(elements) => {
                for v in elements {
                    if let Some(h) = v.heap_handle() {
                        tracer.visit(h);
                    }
                }
            }
            HeapObject::ReturnValue(v) => {
                if let Some(h) = v.heap_handle() {
                    tracer.visit(h);
                }
            }
            // Functions reference the AST, which is not heap-managed.
            HeapObject::Function { .. } | HeapObject::Integer(_) | HeapObject::Str(_) | HeapObject::Error(_) => {}
        }
    }
}
