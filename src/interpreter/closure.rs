/*!

  A `Closure` pairs a lambda's formal parameters and body with the environment in which it was
  created. Applying a closure extends that captured environment with fresh bindings for the
  arguments, never the caller's environment — this is what gives the language lexical scoping.

*/

use std::cell::RefCell;

use super::value::Value;

#[derive(Debug)]
pub struct Closure {
  /// Either a proper list of symbols (fixed arity) or a single symbol (a rest parameter that
  /// collects all arguments into one list), mirroring `lambda`'s two parameter-list forms.
  pub params: Value,
  pub body: Value,
  /// Mutable so that `define` can tie the self-reference knot after construction: the closure's
  /// own name is bound into this environment, in place, once the closure exists.
  pub env: RefCell<Value>,
}

impl Closure {
  pub fn new(params: Value, body: Value, env: Value) -> Closure {
    Closure { params, body, env: RefCell::new(env) }
  }
}
