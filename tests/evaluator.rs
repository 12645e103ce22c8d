//! Integration tests against the public `Interpreter` API, in the table-driven style of the
//! original interpreter's own test suite: a list of `(input, expected)` / `(input, expected
//! error text)` pairs run through one assertion helper.

use gamma_scheme::interpreter::value::{self, structural_eq, Value};
use gamma_scheme::{parse_one, Interpreter};

fn eval(source: &str) -> Result<Value, String> {
  let mut interpreter = Interpreter::with_default_environment();
  let expr = parse_one(source).map_err(|err| err.to_string())?;
  interpreter.evaluate(expr).map_err(|err| err.to_string())
}

fn assert_evaluates_to(input: &str, expected: Value) {
  match eval(input) {
    Ok(actual) => assert!(
      structural_eq(&actual, &expected),
      "expected {} but was {} for {}",
      expected,
      actual,
      input
    ),
    Err(err) => panic!("could not evaluate {}: {}", input, err),
  }
}

fn assert_fails_with(input: &str, expected_message: &str) {
  match eval(input) {
    Ok(actual) => panic!("expected {:?} but evaluation of {} succeeded with {}", expected_message, input, actual),
    Err(message) => assert_eq!(message, expected_message, "wrong error text for {}", input),
  }
}

#[test]
fn positive_scenarios() {
  let cases: Vec<(&str, Value)> = vec![
    ("'(a b c d)", value::list(vec![Value::symbol("a"), Value::symbol("b"), Value::symbol("c"), Value::symbol("d")])),
    ("(car '(a b))", Value::symbol("a")),
    ("(cdr '(a b))", value::list(vec![Value::symbol("b")])),
    ("(cons 'a '(b))", value::list(vec![Value::symbol("a"), Value::symbol("b")])),
    ("(cons 'a 'b)", value::cons(Value::symbol("a"), Value::symbol("b"))),
    ("(call/cc (lambda (c) (c 'a)))", Value::symbol("a")),
    ("(call/cc (lambda (cc) ((lambda (y) (cc 'bar)) 'foo)))", Value::symbol("bar")),
    ("(null? '())", Value::Boolean(true)),
    ("(eq? 'a 'a)", Value::Boolean(true)),
    ("(eq? 'a 'b)", Value::Boolean(false)),
    ("(symbol? 'a)", Value::Boolean(true)),
    ("(symbol? '())", Value::Boolean(false)),
    ("(null? 'a)", Value::Boolean(false)),
    ("((lambda (x) (cond (x 'a) (else 'b))) #t)", Value::symbol("a")),
    ("((lambda (x) (cond (x 'a) (else 'b))) #f)", Value::symbol("b")),
    ("(+ 1 1)", Value::Integer(2)),
    ("(+ 1 1 15)", Value::Integer(17)),
    ("(* 2 5)", Value::Integer(10)),
    ("(* 2 5 3)", Value::Integer(30)),
    ("(/ 16 4)", Value::Integer(4)),
    ("(/ 36 4 3)", Value::Integer(3)),
    ("(- 1 1)", Value::Integer(0)),
    ("(- 4 2 1)", Value::Integer(1)),
    ("((lambda x 'foo) 'bar)", Value::symbol("foo")),
    ("((lambda x x) 'foo 'bar 'baz)", value::list(vec![Value::symbol("foo"), Value::symbol("bar"), Value::symbol("baz")])),
    ("(if #t 'yes 'no)", Value::symbol("yes")),
    ("(if #f 'yes 'no)", Value::symbol("no")),
    ("(if (null? '()) 'empty 'nonempty)", Value::symbol("empty")),
  ];
  for (input, expected) in cases {
    assert_evaluates_to(input, expected);
  }
}

#[test]
fn negative_scenarios() {
  let cases = vec![
    ("a", "environment lookup failed for symbol \"a\""),
    ("(car (a b))", "environment lookup failed for symbol \"a\""),
    ("(lambda)", "missing parameter list in function literal: (lambda)"),
    ("(lambda a)", "missing body in function literal: (lambda a)"),
    ("(define)", "missing symbol in define: (define)"),
    ("(define a)", "missing expression in define: (define a)"),
    ("(cond)", "invalid empty cond block"),
    ("(cond (else))", "missing expression in cond clause: (else)"),
    ("(cond (x))", "missing expression in cond clause: (x)"),
    ("(cond ())", "invalid empty cond condition"),
    ("(cons 'a)", "<built-in cons> expects 2 arguments but was given 1"),
    ("(cons)", "<built-in cons> expects 2 arguments but was given 0"),
    ("(eq? 'a)", "<built-in eq?> expects 2 arguments but was given 1"),
    ("(eq?)", "<built-in eq?> expects 2 arguments but was given 0"),
    ("(symbol?)", "<built-in symbol?> expects 1 arguments but was given 0"),
    ("(null?)", "<built-in null?> expects 1 arguments but was given 0"),
    ("(apply 'a)", "<built-in apply> expects 2 arguments but was given 1"),
    ("(apply)", "<built-in apply> expects 2 arguments but was given 0"),
    ("(call/cc)", "<built-in call/cc> expects 1 arguments but was given 0"),
    ("((lambda (x) 'a))", "<closure> expects 1 arguments but was given 0"),
  ];
  for (input, expected_message) in cases {
    assert_fails_with(input, expected_message);
  }
}

#[test]
fn define_binds_a_symbol_in_the_top_level_environment() {
  let mut interpreter = Interpreter::with_default_environment();
  interpreter.evaluate(parse_one("(define a '(a))").unwrap()).unwrap();
  let result = interpreter.evaluate(parse_one("a").unwrap()).unwrap();
  assert!(structural_eq(&result, &value::list(vec![Value::symbol("a")])));
}

#[test]
fn define_supports_direct_recursion() {
  let mut interpreter = Interpreter::with_default_environment();
  interpreter
    .evaluate(parse_one("(define len (lambda (x) (cond ((null? x) 0) (else (+ 1 (len (cdr x)))))))").unwrap())
    .unwrap();
  let result = interpreter.evaluate(parse_one("(len '(a b c d))").unwrap()).unwrap();
  assert_eq!(result, Value::Integer(4));
}

#[test]
fn formatting_a_recursive_closure_does_not_recurse_into_its_own_environment() {
  let mut interpreter = Interpreter::with_default_environment();
  interpreter
    .evaluate(parse_one("(define len (lambda (x) (cond ((null? x) 0) (else (+ 1 (len (cdr x)))))))").unwrap())
    .unwrap();
  let closure = interpreter.evaluate(parse_one("len").unwrap()).unwrap();
  // If Display recursed through the closure's captured environment (which contains the
  // closure itself, via the self-binding trick), this would overflow the stack.
  let _ = format!("{}", closure);
}

#[test]
fn deeply_tail_recursive_program_does_not_exhaust_the_host_stack() {
  let mut interpreter = Interpreter::with_default_environment();
  interpreter
    .evaluate(parse_one("(define count (lambda (n acc) (cond ((eq? n 0) acc) (else (count (- n 1) (+ acc 1))))))").unwrap())
    .unwrap();
  let result = interpreter.evaluate(parse_one("(count 20000 0)").unwrap()).unwrap();
  assert_eq!(result, Value::Integer(20000));
}

#[test]
fn a_captured_continuation_can_be_invoked_more_than_once_with_the_same_result() {
  // A lambda's body is a single expression (no implicit `begin`), so capturing the
  // continuation and returning a value in one step means handing `define` the
  // continuation directly: `(define k (call/cc (lambda (c) c)))` binds `k` to the
  // continuation waiting on that `define`. Invoking `k` later re-runs that same
  // `define` with a new answer, which always yields `()` — deterministically, no
  // matter how many times or with what argument it is re-entered.
  let mut interpreter = Interpreter::with_default_environment();
  interpreter.evaluate(parse_one("(define k (call/cc (lambda (c) c)))").unwrap()).unwrap();
  let first = interpreter.evaluate(parse_one("(k 41)").unwrap()).unwrap();
  let second = interpreter.evaluate(parse_one("(k 99)").unwrap()).unwrap();
  assert_eq!(first, Value::Null);
  assert_eq!(second, Value::Null);
  assert_eq!(first, second);
}

#[test]
fn a_closures_free_variables_resolve_to_capture_not_later_defines() {
  let mut interpreter = Interpreter::with_default_environment();
  interpreter.evaluate(parse_one("(define x 1)").unwrap()).unwrap();
  interpreter.evaluate(parse_one("(define get-x (lambda () x))").unwrap()).unwrap();
  interpreter.evaluate(parse_one("(define x 2)").unwrap()).unwrap();
  let result = interpreter.evaluate(parse_one("(get-x)").unwrap()).unwrap();
  assert_eq!(result, Value::Integer(1));
}

#[test]
fn round_trip_and_idempotence_properties() {
  let a = Value::symbol("a");
  let b = Value::symbol("b");
  let pair = value::cons(a.clone(), b.clone());
  assert_eq!(value::car(&pair).unwrap(), a);
  assert_eq!(value::cdr(&pair).unwrap(), b);
  assert_eq!(eval("(eq? 'x 'x)").unwrap(), Value::Boolean(true));
  assert_eq!(eval("(null? '())").unwrap(), Value::Boolean(true));
  assert_eq!(eval("(null? 'a)").unwrap(), Value::Boolean(false));
}

#[test]
fn evaluating_a_pure_program_twice_is_deterministic() {
  let source = "(+ (* 2 3) (- 10 4))";
  assert_eq!(eval(source).unwrap(), eval(source).unwrap());
}
