/*!

  The fixed set of primitive operators the default environment binds `Invariant` values to.
  Unlike closures, an `Invariant` carries no captured state — it is just a tag the evaluator's
  `appValue` step dispatches on.

*/

use strum::{Display, EnumString};

use super::value::{list_len, to_vec, Value};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumString)]
pub enum Invariant {
  #[strum(serialize = "car")]
  Car,
  #[strum(serialize = "cdr")]
  Cdr,
  #[strum(serialize = "cons")]
  Cons,
  #[strum(serialize = "eq?")]
  Eq,
  #[strum(serialize = "symbol?")]
  IsSymbol,
  #[strum(serialize = "null?")]
  IsNull,
  #[strum(serialize = "apply")]
  Apply,
  #[strum(serialize = "call/cc")]
  CallCc,
  #[strum(serialize = "exit")]
  Exit,
  #[strum(serialize = "env")]
  Env,
  #[strum(serialize = "time")]
  Time,
  #[strum(serialize = "sleep")]
  Sleep,
  #[strum(serialize = "+")]
  Add,
  #[strum(serialize = "-")]
  Subtract,
  #[strum(serialize = "*")]
  Multiply,
  #[strum(serialize = "/")]
  Divide,
}

impl Invariant {
  /// Fixed arity, or `None` for the variadic arithmetic operators.
  pub fn arity(self) -> Option<usize> {
    match self {
      Invariant::Car => Some(1),
      Invariant::Cdr => Some(1),
      Invariant::Cons => Some(2),
      Invariant::Eq => Some(2),
      Invariant::IsSymbol => Some(1),
      Invariant::IsNull => Some(1),
      Invariant::Apply => Some(2),
      Invariant::CallCc => Some(1),
      Invariant::Exit => Some(0),
      Invariant::Env => Some(0),
      Invariant::Time => Some(0),
      Invariant::Sleep => Some(1),
      Invariant::Add | Invariant::Subtract | Invariant::Multiply | Invariant::Divide => None,
    }
  }
}

/// Enumerates every built-in name, for populating the default environment.
pub fn all() -> [Invariant; 16] {
  [
    Invariant::Car,
    Invariant::Cdr,
    Invariant::Cons,
    Invariant::Eq,
    Invariant::IsSymbol,
    Invariant::IsNull,
    Invariant::Apply,
    Invariant::CallCc,
    Invariant::Exit,
    Invariant::Env,
    Invariant::Time,
    Invariant::Sleep,
    Invariant::Add,
    Invariant::Subtract,
    Invariant::Multiply,
    Invariant::Divide,
  ]
}

/// Fails with `<rator> expects N arguments but was given M` if `rand_list`'s length doesn't
/// match `expected`. Ported from the Go original's `checkLen`/`randLength`.
pub fn arity_check(expected: usize, rator_display: &str, rand_list: &Value) -> Result<(), String> {
  let actual = list_len(rand_list);
  if actual != expected {
    return Err(format!("{} expects {} arguments but was given {}", rator_display, expected, actual));
  }
  Ok(())
}

fn type_name(value: &Value) -> &'static str {
  match value {
    Value::Null => "Null",
    Value::Boolean(_) => "Boolean",
    Value::Integer(_) => "Integer",
    Value::Float(_) => "Float",
    Value::Symbol(_) => "Symbol",
    Value::Pair(_) => "Pair",
    Value::Quoted(_) => "Quoted",
    Value::Invariant(_) => "Invariant",
    Value::Closure(_) => "Closure",
    Value::Continuation(_) => "Continuation",
  }
}

/// Mirrors the Go original's nested type switch: `a`'s type is checked before `b`'s, so when
/// both operands are the wrong type the error names `a`, not `b`.
fn numeric_op(
  op: &str,
  a: &Value,
  b: &Value,
  on_ints: impl FnOnce(i64, i64) -> Result<Value, String>,
  on_floats: impl FnOnce(f64, f64) -> Value,
) -> Result<Value, String> {
  match a {
    Value::Integer(x) => match b {
      Value::Integer(y) => on_ints(*x, *y),
      Value::Float(y) => Ok(on_floats(*x as f64, y.0)),
      other => Err(format!("Cannot {} type {}", op, type_name(other))),
    },
    Value::Float(x) => match b {
      Value::Integer(y) => Ok(on_floats(x.0, *y as f64)),
      Value::Float(y) => Ok(on_floats(x.0, y.0)),
      other => Err(format!("Cannot {} type {}", op, type_name(other))),
    },
    other => Err(format!("Cannot {} type {}", op, type_name(other))),
  }
}

fn plus(a: &Value, b: &Value) -> Result<Value, String> {
  numeric_op(
    "add",
    a,
    b,
    |x, y| Ok(Value::Integer(x + y)),
    |x, y| Value::Float((x + y).into()),
  )
}

fn minus(a: &Value, b: &Value) -> Result<Value, String> {
  numeric_op(
    "subtract",
    a,
    b,
    |x, y| Ok(Value::Integer(x - y)),
    |x, y| Value::Float((x - y).into()),
  )
}

fn multiply(a: &Value, b: &Value) -> Result<Value, String> {
  numeric_op(
    "multiply",
    a,
    b,
    |x, y| Ok(Value::Integer(x * y)),
    |x, y| Value::Float((x * y).into()),
  )
}

fn divide(a: &Value, b: &Value) -> Result<Value, String> {
  numeric_op(
    "divide",
    a,
    b,
    |x, y| {
      if y == 0 {
        Err("division by zero".to_string())
      } else {
        Ok(Value::Integer(x / y))
      }
    },
    |x, y| Value::Float((x / y).into()),
  )
}

/// Left-fold over a proper list with identity 0.
pub fn sum(operands: &Value) -> Result<Value, String> {
  let items = to_vec(operands).ok_or_else(|| "sum expects a proper list".to_string())?;
  let mut result = Value::Integer(0);
  for item in &items {
    result = plus(item, &result)?;
  }
  Ok(result)
}

/// `result = first - rest`, folded left to right. Requires at least one operand.
pub fn subtract(operands: &Value) -> Result<Value, String> {
  let items = to_vec(operands).ok_or_else(|| "subtract expects a proper list".to_string())?;
  let mut iter = items.iter();
  let mut result = iter.next().ok_or_else(|| "subtraction expects at least one parameter".to_string())?.clone();
  for item in iter {
    result = minus(&result, item)?;
  }
  Ok(result)
}

/// Left-fold over a proper list with identity 1.
pub fn product(operands: &Value) -> Result<Value, String> {
  let items = to_vec(operands).ok_or_else(|| "product expects a proper list".to_string())?;
  let mut result = Value::Integer(1);
  for item in &items {
    result = multiply(item, &result)?;
  }
  Ok(result)
}

/// `result = first / rest`, folded left to right. Requires at least one operand.
pub fn quotient(operands: &Value) -> Result<Value, String> {
  let items = to_vec(operands).ok_or_else(|| "quotient expects a proper list".to_string())?;
  let mut iter = items.iter();
  let mut result = iter.next().ok_or_else(|| "division expects at least one parameter".to_string())?.clone();
  for item in iter {
    result = divide(&result, item)?;
  }
  Ok(result)
}

#[cfg(test)]
mod tests {
  use super::*;
  use super::super::value::list;

  #[test]
  fn sum_folds_left_with_zero_identity() {
    let operands = list(vec![Value::Integer(1), Value::Integer(1), Value::Integer(15)]);
    assert_eq!(sum(&operands), Ok(Value::Integer(17)));
  }

  #[test]
  fn subtract_uses_first_operand_as_base() {
    let operands = list(vec![Value::Integer(4), Value::Integer(2), Value::Integer(1)]);
    assert_eq!(subtract(&operands), Ok(Value::Integer(1)));
  }

  #[test]
  fn mixed_integer_and_float_promotes_to_float() {
    let operands = list(vec![Value::Integer(1), Value::Float(1.5.into())]);
    assert_eq!(sum(&operands), Ok(Value::Float(2.5.into())));
  }

  #[test]
  fn divide_by_zero_integer_is_an_error() {
    let operands = list(vec![Value::Integer(1), Value::Integer(0)]);
    assert!(quotient(&operands).is_err());
  }

  #[test]
  fn arity_check_reports_builtin_name_and_counts() {
    let err = arity_check(2, "<built-in cons>", &list(vec![Value::Integer(1)])).unwrap_err();
    assert_eq!(err, "<built-in cons> expects 2 arguments but was given 1");
  }

  #[test]
  fn invariant_display_matches_source_names() {
    assert_eq!(Invariant::Cons.to_string(), "cons");
    assert_eq!(Invariant::CallCc.to_string(), "call/cc");
  }
}
