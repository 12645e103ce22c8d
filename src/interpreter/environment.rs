/*!

  An `Environment` is literally a [`Value`]: a persistent, `Null`-terminated chain of
  `(symbol . value)` pairs, most-recent binding first. `get` walks the chain and returns the
  first match, which gives later `put`s shadowing priority over earlier ones for free. `put`
  never mutates an existing chain — it conses a new head in front of it — so a closure's captured
  environment cannot observe bindings a later `put` adds to a shared prefix.

*/

use super::value::{cons, Value};

/// Looks up `symbol` in `env`, walking from most-recent to oldest binding.
pub fn get(env: &Value, symbol: &str) -> Option<Value> {
  let mut cur = env.clone();
  while let Value::Pair(pair) = cur {
    if let Value::Pair(entry) = &pair.car {
      if let Value::Symbol(name) = &entry.car {
        if name.as_ref() == symbol {
          return Some(entry.cdr.clone());
        }
      }
    }
    cur = pair.cdr.clone();
  }
  None
}

/// Returns a new environment in which `symbol` is bound to `value`, shadowing any prior binding
/// without disturbing it.
pub fn put(env: &Value, symbol: Value, value: Value) -> Value {
  cons(cons(symbol, value), env.clone())
}

/// Builds an environment from a finite symbol -> value mapping. Insertion order does not affect
/// lookup results since the names are assumed distinct.
pub fn from_pairs(bindings: Vec<(Value, Value)>) -> Value {
  let mut env = Value::Null;
  for (symbol, value) in bindings {
    env = put(&env, symbol, value);
  }
  env
}

#[cfg(test)]
mod tests {
  use super::*;
  use super::super::value::Value;

  #[test]
  fn put_then_get_returns_the_bound_value() {
    let env = put(&Value::Null, Value::symbol("x"), Value::Integer(5));
    assert_eq!(get(&env, "x"), Some(Value::Integer(5)));
  }

  #[test]
  fn get_on_unbound_symbol_is_none() {
    let env = put(&Value::Null, Value::symbol("x"), Value::Integer(5));
    assert_eq!(get(&env, "y"), None);
  }

  #[test]
  fn shadowing_prefers_the_most_recent_binding() {
    let env = put(&Value::Null, Value::symbol("x"), Value::Integer(1));
    let env = put(&env, Value::symbol("x"), Value::Integer(2));
    assert_eq!(get(&env, "x"), Some(Value::Integer(2)));
  }

  #[test]
  fn put_does_not_disturb_the_prior_environment() {
    let base = put(&Value::Null, Value::symbol("x"), Value::Integer(1));
    let _shadowed = put(&base, Value::symbol("x"), Value::Integer(2));
    assert_eq!(get(&base, "x"), Some(Value::Integer(1)));
  }
}
