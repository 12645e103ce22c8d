/*!

  A `Value` is the universe of S-expressions the evaluator manipulates: every
  literal, every intermediate result, and every reified closure or
  continuation is a `Value`.

  A `Value` is an *atom* if and only if it is a fixed point of evaluation:
  `Null`, `Boolean`, `Integer`, and `Float`. Everything else either denotes
  something else (`Symbol`), is syntax that evaluates to something else
  (`Pair`, `Quoted`), or is a value that can never appear as source syntax
  (`Invariant`, `Closure`, `Continuation`).

*/

use std::fmt;
use std::rc::Rc;

use ordered_float::OrderedFloat;

use super::closure::Closure;
use super::continuation::Frame;
use super::primitive::Invariant;

/// A cons cell. Lists are right-nested chains of `Pair`s terminated by `Value::Null`.
#[derive(Debug)]
pub struct Pair {
  pub car: Value,
  pub cdr: Value,
}

#[derive(Clone, Debug)]
pub enum Value {
  /// The empty list. A unique sentinel.
  Null,
  Boolean(bool),
  Integer(i64),
  Float(OrderedFloat<f64>),
  /// Not self-evaluating; resolved via the environment.
  Symbol(Rc<str>),
  Pair(Rc<Pair>),
  /// Wraps a literal datum that is unwrapped, not evaluated, when it is evaluated.
  Quoted(Rc<Value>),
  Invariant(Invariant),
  Closure(Rc<Closure>),
  Continuation(Rc<Frame>),
}

impl Value {
  pub fn symbol(name: &str) -> Value {
    Value::Symbol(Rc::from(name))
  }
}

/// Atom-level equality, i.e. `eq?`. Atoms, symbols, invariants, and continuations (by frame
/// identity) compare by value; every composite/reference variant — pairs, closures, quoted
/// forms — is never `eq?` to anything, including itself.
impl PartialEq for Value {
  fn eq(&self, other: &Self) -> bool {
    match (self, other) {
      (Value::Null, Value::Null) => true,
      (Value::Boolean(a), Value::Boolean(b)) => a == b,
      (Value::Integer(a), Value::Integer(b)) => a == b,
      (Value::Float(a), Value::Float(b)) => a == b,
      (Value::Symbol(a), Value::Symbol(b)) => a == b,
      (Value::Invariant(a), Value::Invariant(b)) => a == b,
      (Value::Continuation(a), Value::Continuation(b)) => Rc::ptr_eq(a, b),
      _ => false,
    }
  }
}

/// Constructs a new pair `(car . cdr)`.
pub fn cons(car: Value, cdr: Value) -> Value {
  Value::Pair(Rc::new(Pair { car, cdr }))
}

/// Builds a right-nested, `Null`-terminated list from the given values.
pub fn list(values: Vec<Value>) -> Value {
  let mut result = Value::Null;
  for value in values.into_iter().rev() {
    result = cons(value, result);
  }
  result
}

/// Collects a proper list into a `Vec`, in order. Returns `None` if `value` is not a proper,
/// `Null`-terminated list.
pub fn to_vec(value: &Value) -> Option<Vec<Value>> {
  let mut items = Vec::new();
  let mut cur = value.clone();
  loop {
    match cur {
      Value::Null => return Some(items),
      Value::Pair(pair) => {
        items.push(pair.car.clone());
        cur = pair.cdr.clone();
      }
      _ => return None,
    }
  }
}

/// Counts the elements of a proper list; used by arity checks. Stops at the first non-pair tail.
pub fn list_len(value: &Value) -> usize {
  let mut len = 0;
  let mut cur = value.clone();
  while let Value::Pair(pair) = cur {
    len += 1;
    cur = pair.cdr.clone();
  }
  len
}

pub fn is_symbol(value: &Value) -> bool {
  matches!(value, Value::Symbol(_))
}

pub fn is_null(value: &Value) -> bool {
  matches!(value, Value::Null)
}

pub fn is_pair(value: &Value) -> bool {
  matches!(value, Value::Pair(_))
}

/// See the module documentation for a definition of an atom.
pub fn is_atom(value: &Value) -> bool {
  matches!(value, Value::Null | Value::Boolean(_) | Value::Integer(_) | Value::Float(_))
}

pub fn is_number(value: &Value) -> bool {
  matches!(value, Value::Integer(_) | Value::Float(_))
}

pub fn car(value: &Value) -> Result<Value, String> {
  match value {
    Value::Pair(pair) => Ok(pair.car.clone()),
    other => Err(format!("car on non-pair: {}", other)),
  }
}

pub fn cdr(value: &Value) -> Result<Value, String> {
  match value {
    Value::Pair(pair) => Ok(pair.cdr.clone()),
    other => Err(format!("cdr on non-pair: {}", other)),
  }
}

pub fn caar(value: &Value) -> Result<Value, String> {
  car(&car(value)?)
}

pub fn cadr(value: &Value) -> Result<Value, String> {
  car(&cdr(value)?)
}

pub fn cdar(value: &Value) -> Result<Value, String> {
  cdr(&car(value)?)
}

pub fn caddr(value: &Value) -> Result<Value, String> {
  car(&cdr(&cdr(value)?)?)
}

pub fn cadar(value: &Value) -> Result<Value, String> {
  car(&cdr(&car(value)?)?)
}

impl fmt::Display for Value {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Value::Null => write!(f, "()"),
      Value::Boolean(true) => write!(f, "#t"),
      Value::Boolean(false) => write!(f, "#f"),
      Value::Integer(i) => write!(f, "{}", i),
      Value::Float(x) => write!(f, "{}", x.0),
      Value::Symbol(name) => write!(f, "{}", name),
      Value::Quoted(inner) => write!(f, "'{}", inner),
      Value::Invariant(name) => write!(f, "<built-in {}>", name),
      Value::Closure(_) => write!(f, "<closure>"),
      Value::Continuation(_) => write!(f, "<continuation>"),
      Value::Pair(pair) => write!(f, "({})", format_pair_tail(pair)),
    }
  }
}

fn format_pair_tail(pair: &Pair) -> String {
  match &pair.cdr {
    Value::Null => format!("{}", pair.car),
    Value::Pair(rest) => format!("{} {}", pair.car, format_pair_tail(rest)),
    other => format!("{} . {}", pair.car, other),
  }
}

/// Structural equality: recurses through `Pair`s comparing `car`/`cdr`, falling back to `eq?`
/// (`PartialEq`) everywhere else. This is strictly more permissive than `eq?` and is a
/// test-harness utility only — the language's own `eq?` built-in is always `#f` on pairs.
pub fn structural_eq(a: &Value, b: &Value) -> bool {
  match (a, b) {
    (Value::Pair(pa), Value::Pair(pb)) => structural_eq(&pa.car, &pb.car) && structural_eq(&pa.cdr, &pb.cdr),
    _ => a == b,
  }
}
