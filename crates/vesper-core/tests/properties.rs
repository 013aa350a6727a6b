//! Universal properties from spec §8 not already pinned by the six
//! end-to-end scenarios in `tests/scenarios.rs`.

use vesper_core::environment::Environment;
use vesper_core::eval::Evaluator;
use vesper_core::value::Value;

fn eval(src: &str) -> (Value, Evaluator) {
    let mut evaluator = Evaluator::new();
    let env = Environment::new_global();
    let value = vesper_core::run_in(src, &mut evaluator, &env).expect("source must parse");
    (value, evaluator)
}

#[test]
fn truthiness_false_null_and_zero() {
    let (value, _) = eval("!false;");
    assert_eq!(value, Value::TRUE);
    let (value, _) = eval("let a = if (false) { 1 }; !a;");
    assert_eq!(value, Value::TRUE);
    // Integer 0 is truthy (only Boolean/Null participate in falsiness).
    let (value, _) = eval("if (0) { true } else { false };");
    assert_eq!(value, Value::TRUE);
}

#[test]
fn singleton_identity_of_booleans() {
    let (a, _) = eval("true;");
    let (b, _) = eval("true;");
    assert_eq!(a, b);
    assert_eq!(a, Value::TRUE);
}

#[test]
fn empty_program_evaluates_to_null() {
    let (value, _) = eval("");
    assert_eq!(value, Value::Null);
}

#[test]
fn empty_block_evaluates_to_null() {
    let (value, _) = eval("if (true) {};");
    assert_eq!(value, Value::Null);
}

#[test]
fn return_unwraps_at_top_level() {
    let (value, evaluator) = eval("return 42;");
    match value {
        Value::Integer(h) => {
            let vesper_core::value::HeapObject::Integer(n) = evaluator.heap.get(h) else {
                unreachable!()
            };
            assert_eq!(*n, 42);
        }
        other => panic!("expected a plain Integer, got {}", other.kind()),
    }
}

#[test]
fn block_does_not_unwrap_return_to_outer_statement_list() {
    // `if` without `else`, returning from inside, must still propagate a
    // ReturnValue out of the enclosing block rather than stopping at `if`'s
    // own block boundary — pinned by the fact that the statement after the
    // `if` never runs.
    let (value, evaluator) = eval("let f = fn() { if (true) { return 7; } return 99; }; f();");
    match value {
        Value::Integer(h) => {
            let vesper_core::value::HeapObject::Integer(n) = evaluator.heap.get(h) else {
                unreachable!()
            };
            assert_eq!(*n, 7);
        }
        other => panic!("expected a plain Integer, got {}", other.kind()),
    }
}

#[test]
fn short_circuits_on_error_without_evaluating_later_operands() {
    // The right operand of `+` must never be reached once the left is an
    // Error: a reference to an unbound name on the right would itself error
    // with a different message if evaluated, so seeing the left's message
    // confirms evaluation stopped there.
    let (value, evaluator) = eval("undefined_name + also_undefined;");
    assert!(value.is_error());
    assert_eq!(
        value.inspect(&evaluator.heap),
        "ERROR: identifier not found: undefined_name"
    );
}

#[test]
fn closures_do_not_capture_defining_environment() {
    // Per SPEC_FULL.md §9 decision 2: `make_adder`'s `n` is not visible
    // inside the returned function once called from a different scope,
    // because the call extends the *caller's* environment, not the
    // function's defining one.
    let (value, evaluator) = eval(
        r"
        let make_adder = fn(n) { fn() { n; } };
        let add_five = make_adder(5);
        add_five();
        ",
    );
    assert!(value.is_error(), "expected an unbound-identifier error, got {:?}", value);
    assert_eq!(value.inspect(&evaluator.heap), "ERROR: identifier not found: n");
}

#[test]
fn division_and_modulo_by_zero_are_unknown_operator_errors() {
    let (value, evaluator) = eval("1 / 0;");
    assert_eq!(value.inspect(&evaluator.heap), "ERROR: unknown operator: INTEGER / INTEGER");
    let (value, evaluator) = eval("1 % 0;");
    assert_eq!(value.inspect(&evaluator.heap), "ERROR: unknown operator: INTEGER % INTEGER");
}

#[test]
fn builtin_array_helpers() {
    let (value, evaluator) = eval("len([1, 2, 3]);");
    assert_eq!(value.inspect(&evaluator.heap), "3");
    let (value, evaluator) = eval("first([1, 2, 3]);");
    assert_eq!(value.inspect(&evaluator.heap), "1");
    let (value, evaluator) = eval("last([1, 2, 3]);");
    assert_eq!(value.inspect(&evaluator.heap), "3");
    let (value, evaluator) = eval("rest([1, 2, 3]);");
    assert_eq!(value.inspect(&evaluator.heap), "[2, 3]");
    let (value, evaluator) = eval("rest([]);");
    assert_eq!(value.inspect(&evaluator.heap), "null");
}

#[test]
fn not_a_function_error() {
    let (value, evaluator) = eval("let x = 5; x();");
    assert_eq!(value.inspect(&evaluator.heap), "ERROR: not a function: INTEGER");
}

#[test]
fn let_and_ref_statements_evaluate_to_the_bound_value() {
    let (value, evaluator) = eval("if (true) { let y = 5; };");
    assert_eq!(value.inspect(&evaluator.heap), "5");
    let (value, evaluator) = eval("let x = 1; fn() { ref x = 9; }(); x;");
    assert_eq!(value.inspect(&evaluator.heap), "9");
}

#[test]
fn null_comparisons_and_mismatched_kind_comparisons() {
    let (value, _) = eval("let a = if (false) { 1 }; a == null;");
    assert_eq!(value, Value::Null);
    let (value, _) = eval("5 == null;");
    assert_eq!(value, Value::Null);
    let (value, evaluator) = eval("true == 1;");
    assert_eq!(value.inspect(&evaluator.heap), "ERROR: type mismatch: BOOLEAN == INTEGER");
}

#[test]
fn wrong_arity_call_error() {
    let (value, evaluator) = eval("let f = fn(a, b) { a + b; }; f(1);");
    assert_eq!(
        value.inspect(&evaluator.heap),
        "ERROR: argument length(1) not equal to parameter length (2)"
    );
}
