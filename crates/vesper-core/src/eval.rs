//! Tree-walking evaluator.
//!
//! Garbage collection is cooperative: every 100 statements evaluated (at any
//! nesting depth — a function body's statements count the same as top-level
//! ones) the evaluator marks from the current environment chain plus a small
//! stack of "temporary roots" and sweeps. The temporary-root stack exists
//! because a sub-expression can hold a heap value in a plain Rust local
//! (the left operand of an infix while the right is being evaluated, the
//! array being indexed while the index expression runs, already-evaluated
//! call arguments while later ones are evaluated) that is not yet reachable
//! from any environment; without it, a sweep triggered by a nested call
//! could reclaim a value still live on the Rust stack.

use std::rc::Rc;

use tracing::trace;
use vesper_gc::Heap;

use crate::ast::{BlockStatement, Expr, Program, Stmt};
use crate::builtins;
use crate::environment::{EnvRef, Environment};
use crate::value::{Builtin, HeapObject, Value};

const DEFAULT_GC_THRESHOLD: usize = 100;

pub struct Evaluator {
    pub heap: Heap<HeapObject>,
    gc_threshold: usize,
    statement_count: usize,
    temp_roots: Vec<Value>,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl Evaluator {
    #[must_use]
    pub fn new() -> Self {
        Evaluator {
            heap: Heap::new(),
            gc_threshold: DEFAULT_GC_THRESHOLD,
            statement_count: 0,
            temp_roots: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_gc_threshold(gc_threshold: usize) -> Self {
        Evaluator {
            gc_threshold: gc_threshold.max(1),
            ..Self::new()
        }
    }

    fn error(&mut self, message: impl Into<String>) -> Value {
        Value::Error(self.heap.alloc(HeapObject::Error(message.into())))
    }

    fn alloc_integer(&mut self, n: i64) -> Value {
        Value::Integer(self.heap.alloc(HeapObject::Integer(n)))
    }

    fn alloc_string(&mut self, s: String) -> Value {
        Value::Str(self.heap.alloc(HeapObject::Str(s)))
    }

    fn push_temp_root(&mut self, value: Value) {
        self.temp_roots.push(value);
    }

    fn pop_temp_root(&mut self) {
        self.temp_roots.pop();
    }

    /// Run `f` with `value` kept alive (reachable from the temp-root stack)
    /// for the duration of the call, then release it.
    fn with_temp_root<R>(&mut self, value: Value, f: impl FnOnce(&mut Self) -> R) -> R {
        self.push_temp_root(value);
        let result = f(self);
        self.pop_temp_root();
        result
    }

    /// Account for one more evaluated statement, collecting garbage every
    /// `gc_threshold` statements.
    fn tick(&mut self, env: &EnvRef) {
        self.statement_count += 1;
        if self.statement_count >= self.gc_threshold {
            self.statement_count = 0;
            Environment::mark_roots(env, &mut self.heap);
            for root in &self.temp_roots {
                if let Some(h) = root.heap_handle() {
                    self.heap.mark(h);
                }
            }
            let stats = self.heap.sweep();
            trace!(reclaimed = stats.reclaimed, survivors = stats.survivors, "gc sweep");
        }
    }

    /// Evaluate a full program in `env`, returning the value of its last
    /// statement (or `Null` for an empty program).
    pub fn run_program(&mut self, program: &Program, env: &EnvRef) -> Value {
        let mut result = Value::Null;
        for stmt in &program.statements {
            result = self.eval_statement(stmt, env);
            self.tick(env);
            if let Value::ReturnValue(h) = result {
                return self.unwrap_return(h);
            }
            if result.is_error() {
                return result;
            }
        }
        result
    }

    fn eval_block(&mut self, block: &BlockStatement, env: &EnvRef) -> Value {
        let mut result = Value::Null;
        for stmt in &block.statements {
            result = self.eval_statement(stmt, env);
            self.tick(env);
            // A return or error propagates up without unwrapping, so an
            // outer block (or the call boundary) can see that execution
            // should stop rather than continue with the next statement.
            if result.is_return_value() || result.is_error() {
                return result;
            }
        }
        result
    }

    fn unwrap_return(&self, h: vesper_gc::Handle<HeapObject>) -> Value {
        match self.heap.get(h) {
            HeapObject::ReturnValue(v) => *v,
            _ => unreachable!("Value::ReturnValue handle must point at HeapObject::ReturnValue"),
        }
    }

    fn eval_statement(&mut self, stmt: &Stmt, env: &EnvRef) -> Value {
        match stmt {
            Stmt::Let { name, value } => {
                let v = self.eval_expr(value, env);
                if v.is_error() {
                    return v;
                }
                Environment::set(env, Rc::clone(name), v);
                v
            }
            Stmt::Ref { name, value } => {
                let v = self.eval_expr(value, env);
                if v.is_error() {
                    return v;
                }
                if Environment::ref_set(env, Rc::clone(name), v) {
                    v
                } else {
                    self.error(format!("identifier not found: {name}"))
                }
            }
            Stmt::Return(expr) => {
                let v = self.eval_expr(expr, env);
                if v.is_error() {
                    return v;
                }
                Value::ReturnValue(self.heap.alloc(HeapObject::ReturnValue(v)))
            }
            Stmt::Expr(expr) => self.eval_expr(expr, env),
        }
    }

    fn eval_expr(&mut self, expr: &Expr, env: &EnvRef) -> Value {
        match expr {
            Expr::IntegerLiteral(n) => self.alloc_integer(*n),
            Expr::BooleanLiteral(b) => {
                if *b {
                    Value::TRUE
                } else {
                    Value::FALSE
                }
            }
            Expr::StringLiteral(s) => self.alloc_string(s.to_string()),
            Expr::Identifier(name) => self.eval_identifier(name, env),
            Expr::ArrayLiteral(elements) => self.eval_array_literal(elements, env),
            Expr::FunctionLiteral { parameters, body } => {
                Value::Function(self.heap.alloc(HeapObject::Function {
                    parameters: Rc::clone(parameters),
                    body: Rc::clone(body),
                }))
            }
            Expr::Prefix { operator, right } => {
                let r = self.eval_expr(right, env);
                if r.is_error() {
                    return r;
                }
                self.eval_prefix(operator, r)
            }
            Expr::Infix { operator, left, right } => self.eval_infix_expr(operator, left, right, env),
            Expr::If {
                condition,
                consequence,
                alternative,
            } => self.eval_if_expr(condition, consequence, alternative.as_deref(), env),
            Expr::While { condition, body } => self.eval_while_expr(condition, body, env),
            Expr::Call { function, arguments } => self.eval_call_expr(function, arguments, env),
            Expr::Index { left, index } => self.eval_index_expr(left, index, env),
        }
    }

    fn eval_identifier(&mut self, name: &str, env: &EnvRef) -> Value {
        match Environment::get(env, name) {
            Some(v) => v,
            None => match Builtin::lookup(name) {
                Some(b) => Value::Builtin(b),
                None => self.error(format!("identifier not found: {name}")),
            },
        }
    }

    fn eval_array_literal(&mut self, elements: &[Expr], env: &EnvRef) -> Value {
        let roots_at_entry = self.temp_roots.len();
        let mut values = Vec::with_capacity(elements.len());
        for elem in elements {
            let v = self.eval_expr(elem, env);
            if v.is_error() {
                self.temp_roots.truncate(roots_at_entry);
                return v;
            }
            values.push(v);
            // Keep everything evaluated so far alive while evaluating the
            // rest of the literal.
            self.push_temp_root(v);
        }
        self.temp_roots.truncate(roots_at_entry);
        Value::Array(self.heap.alloc(HeapObject::Array(values)))
    }

    fn eval_prefix(&mut self, operator: &str, right: Value) -> Value {
        match operator {
            "!" => Value::Boolean(!right.is_truthy()),
            "-" => match right {
                Value::Integer(h) => {
                    let HeapObject::Integer(n) = self.heap.get(h) else {
                        unreachable!("Value::Integer handle must point at HeapObject::Integer")
                    };
                    let n = -*n;
                    self.alloc_integer(n)
                }
                other => self.error(format!("unknown operator: -{}", other.kind())),
            },
            other => self.error(format!("unknown operator: {other}")),
        }
    }

    fn eval_infix_expr(&mut self, operator: &str, left: &Expr, right: &Expr, env: &EnvRef) -> Value {
        let l = self.eval_expr(left, env);
        if l.is_error() {
            return l;
        }
        self.with_temp_root(l, |this| {
            let r = this.eval_expr(right, env);
            if r.is_error() {
                return r;
            }
            this.eval_infix(operator, l, r)
        })
    }

    fn eval_infix(&mut self, operator: &str, left: Value, right: Value) -> Value {
        match (left, right) {
            (Value::Integer(lh), Value::Integer(rh)) => {
                let (a, b) = match (self.heap.get(lh), self.heap.get(rh)) {
                    (HeapObject::Integer(a), HeapObject::Integer(b)) => (*a, *b),
                    _ => unreachable!("Value::Integer handles must point at HeapObject::Integer"),
                };
                self.eval_integer_infix(operator, a, b)
            }
            (Value::Str(lh), Value::Str(rh)) => {
                if operator != "+" {
                    return self.error(format!("unknown operator: STRING {operator} STRING"));
                }
                let (a, b) = match (self.heap.get(lh), self.heap.get(rh)) {
                    (HeapObject::Str(a), HeapObject::Str(b)) => (a.clone(), b.clone()),
                    _ => unreachable!("Value::Str handles must point at HeapObject::Str"),
                };
                self.alloc_string(a + &b)
            }
            (Value::Null, _) | (_, Value::Null) => Value::Null,
            (l, r) if l.kind() != r.kind() => {
                self.error(format!("type mismatch: {} {operator} {}", l.kind(), r.kind()))
            }
            (l, r) if operator == "==" => Value::Boolean(identity_eq(l, r)),
            (l, r) if operator == "!=" => Value::Boolean(!identity_eq(l, r)),
            (l, r) => self.error(format!("unknown operator: {} {operator} {}", l.kind(), r.kind())),
        }
    }

    fn eval_integer_infix(&mut self, operator: &str, a: i64, b: i64) -> Value {
        match operator {
            "+" => self.alloc_integer(a + b),
            "-" => self.alloc_integer(a - b),
            "*" => self.alloc_integer(a * b),
            "/" => {
                if b == 0 {
                    self.error("unknown operator: INTEGER / INTEGER".to_string())
                } else {
                    self.alloc_integer(a / b)
                }
            }
            "%" => {
                if b == 0 {
                    self.error("unknown operator: INTEGER % INTEGER".to_string())
                } else {
                    self.alloc_integer(a % b)
                }
            }
            "<" => Value::Boolean(a < b),
            ">" => Value::Boolean(a > b),
            "<=" => Value::Boolean(a <= b),
            ">=" => Value::Boolean(a >= b),
            "==" => Value::Boolean(a == b),
            "!=" => Value::Boolean(a != b),
            other => self.error(format!("unknown operator: INTEGER {other} INTEGER")),
        }
    }

    fn eval_if_expr(
        &mut self,
        condition: &Expr,
        consequence: &Rc<BlockStatement>,
        alternative: Option<&BlockStatement>,
        env: &EnvRef,
    ) -> Value {
        let cond = self.eval_expr(condition, env);
        if cond.is_error() {
            return cond;
        }
        if cond.is_truthy() {
            self.eval_block(consequence, env)
        } else if let Some(alt) = alternative {
            self.eval_block(alt, env)
        } else {
            Value::Null
        }
    }

    fn eval_while_expr(&mut self, condition: &Expr, body: &BlockStatement, env: &EnvRef) -> Value {
        loop {
            let cond = self.eval_expr(condition, env);
            if cond.is_error() {
                return cond;
            }
            if !cond.is_truthy() {
                return Value::Null;
            }
            let result = self.eval_block(body, env);
            if result.is_return_value() || result.is_error() {
                return result;
            }
        }
    }

    fn eval_call_expr(&mut self, function: &Expr, arguments: &[Expr], env: &EnvRef) -> Value {
        let func = self.eval_expr(function, env);
        if func.is_error() {
            return func;
        }
        self.with_temp_root(func, |this| {
            let roots_at_entry = this.temp_roots.len();
            let mut args = Vec::with_capacity(arguments.len());
            for arg in arguments {
                let v = this.eval_expr(arg, env);
                if v.is_error() {
                    this.temp_roots.truncate(roots_at_entry);
                    return v;
                }
                args.push(v);
                this.push_temp_root(v);
            }
            let result = this.apply_function(func, &args, env);
            this.temp_roots.truncate(roots_at_entry);
            result
        })
    }

    fn apply_function(&mut self, func: Value, args: &[Value], caller_env: &EnvRef) -> Value {
        match func {
            Value::Builtin(b) => builtins::call(b, args, &mut self.heap),
            Value::Function(h) => {
                let (parameters, body) = match self.heap.get(h) {
                    HeapObject::Function { parameters, body } => (Rc::clone(parameters), Rc::clone(body)),
                    _ => unreachable!("Value::Function handle must point at HeapObject::Function"),
                };
                if parameters.len() != args.len() {
                    return self.error(format!(
                        "argument length({}) not equal to parameter length ({})",
                        args.len(),
                        parameters.len()
                    ));
                }
                // Functions do not capture a defining environment; a call
                // extends the *caller's* current environment, so `outer`
                // chains mirror the dynamic call stack rather than lexical
                // nesting at definition time.
                let call_env = Environment::new_enclosed(caller_env);
                for (param, arg) in parameters.iter().zip(args) {
                    Environment::set(&call_env, Rc::clone(param), *arg);
                }
                let result = self.eval_block(&body, &call_env);
                match result {
                    Value::ReturnValue(h) => self.unwrap_return(h),
                    other => other,
                }
            }
            other => self.error(format!("not a function: {}", other.kind())),
        }
    }

    fn eval_index_expr(&mut self, left: &Expr, index: &Expr, env: &EnvRef) -> Value {
        let l = self.eval_expr(left, env);
        if l.is_error() {
            return l;
        }
        self.with_temp_root(l, |this| {
            let idx = this.eval_expr(index, env);
            if idx.is_error() {
                return idx;
            }
            this.apply_index(l, idx)
        })
    }

    fn apply_index(&mut self, left: Value, index: Value) -> Value {
        match (left, index) {
            (Value::Array(h), Value::Integer(ih)) => {
                let i = match self.heap.get(ih) {
                    HeapObject::Integer(n) => *n,
                    _ => unreachable!("Value::Integer handle must point at HeapObject::Integer"),
                };
                let len = match self.heap.get(h) {
                    HeapObject::Array(elems) => elems.len(),
                    _ => unreachable!("Value::Array handle must point at HeapObject::Array"),
                };
                if i < 0 || i as usize >= len {
                    return self.error(format!("index {i} out of range"));
                }
                match self.heap.get(h) {
                    HeapObject::Array(elems) => elems[i as usize],
                    _ => unreachable!("Value::Array handle must point at HeapObject::Array"),
                }
            }
            (Value::Str(h), Value::Integer(ih)) => {
                let i = match self.heap.get(ih) {
                    HeapObject::Integer(n) => *n,
                    _ => unreachable!("Value::Integer handle must point at HeapObject::Integer"),
                };
                let ch = match self.heap.get(h) {
                    HeapObject::Str(s) => {
                        if i < 0 {
                            None
                        } else {
                            s.chars().nth(i as usize)
                        }
                    }
                    _ => unreachable!("Value::Str handle must point at HeapObject::Str"),
                };
                match ch {
                    Some(c) => self.alloc_string(c.to_string()),
                    None => self.error(format!("index {i} out of range")),
                }
            }
            (l, _) => self.error(format!("index operator not supported: {}", l.kind())),
        }
    }
}

/// `==`/`!=` compare `Integer`/`Str` structurally and everything else
/// (including two different-kind values) by handle/payload identity.
fn identity_eq(a: Value, b: Value) -> bool {
    match (a, b) {
        (Value::Boolean(x), Value::Boolean(y)) => x == y,
        (Value::Null, Value::Null) => true,
        _ => a == b,
    }
}
