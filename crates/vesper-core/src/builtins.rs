//! Builtin functions. Unlike user functions these are not heap-allocated —
//! there is a fixed, closed set of them, so `Value::Builtin` carries the
//! enum tag directly and dispatch is a match rather than a heap lookup.

use vesper_gc::Heap;

use crate::value::{Builtin, HeapObject, Value};

/// Evaluate a call to `builtin` with already-evaluated `args`. `heap` is
/// needed to allocate the result (or an error) and to read argument payloads.
pub fn call(builtin: Builtin, args: &[Value], heap: &mut Heap<HeapObject>) -> Value {
    match builtin {
        Builtin::Print => {
            let rendered: Vec<String> = args.iter().map(|a| a.inspect(heap)).collect();
            println!("{}", rendered.join(" "));
            Value::Null
        }
        Builtin::Len => len(args, heap),
        Builtin::First => first(args, heap),
        Builtin::Last => last(args, heap),
        Builtin::Rest => rest(args, heap),
    }
}

fn error(heap: &mut Heap<HeapObject>, message: impl Into<String>) -> Value {
    Value::Error(heap.alloc(HeapObject::Error(message.into())))
}

fn expect_single_array<'h>(args: &[Value], heap: &'h Heap<HeapObject>, name: &str) -> Result<&'h [Value], String> {
    if args.len() != 1 {
        return Err(format!(
            "argument length({}) not equal to parameter length (1)",
            args.len()
        ));
    }
    match args[0] {
        Value::Array(h) => match heap.get(h) {
            HeapObject::Array(elems) => Ok(elems),
            _ => unreachable!("Value::Array handle must point at HeapObject::Array"),
        },
        other => Err(format!("argument to `{name}` not supported, got {}", other.kind())),
    }
}

fn len(args: &[Value], heap: &mut Heap<HeapObject>) -> Value {
    if args.len() != 1 {
        return error(
            heap,
            format!("argument length({}) not equal to parameter length (1)", args.len()),
        );
    }
    match args[0] {
        Value::Array(h) => match heap.get(h) {
            HeapObject::Array(elems) => {
                let n = elems.len() as i64;
                Value::Integer(heap.alloc(HeapObject::Integer(n)))
            }
            _ => unreachable!("Value::Array handle must point at HeapObject::Array"),
        },
        Value::Str(h) => match heap.get(h) {
            HeapObject::Str(s) => {
                let n = s.chars().count() as i64;
                Value::Integer(heap.alloc(HeapObject::Integer(n)))
            }
            _ => unreachable!("Value::Str handle must point at HeapObject::Str"),
        },
        other => error(heap, format!("argument to `len` not supported, got {}", other.kind())),
    }
}

fn first(args: &[Value], heap: &mut Heap<HeapObject>) -> Value {
    match expect_single_array(args, heap, "first") {
        Ok(elems) => elems.first().copied().unwrap_or(Value::Null),
        Err(message) => error(heap, message),
    }
}

fn last(args: &[Value], heap: &mut Heap<HeapObject>) -> Value {
    match expect_single_array(args, heap, "last") {
        Ok(elems) => elems.last().copied().unwrap_or(Value::Null),
        Err(message) => error(heap, message),
    }
}

fn rest(args: &[Value], heap: &mut Heap<HeapObject>) -> Value {
    let rest: Vec<Value> = match expect_single_array(args, heap, "rest") {
        Ok(elems) if elems.is_empty() => return Value::Null,
        Ok(elems) => elems[1..].to_vec(),
        Err(message) => return error(heap, message),
    };
    Value::Array(heap.alloc(HeapObject::Array(rest)))
}
