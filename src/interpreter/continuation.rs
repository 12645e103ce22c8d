/*!

  A `Frame` is one suspended step of the evaluator, holding exactly the registers it needs to
  resume plus a pointer to its predecessor. The chain of frames rooted at `K0` *is* the current
  continuation; `call/cc` reifies the current frame as an ordinary `Value` by cloning the `Rc`.

  Per-variant payloads are used instead of one wide record: each frame only carries what its
  `applyC` arm actually reads, which is both smaller and lets the compiler catch mismatched
  register access.

*/

use std::rc::Rc;

use super::primitive::Invariant;
use super::value::Value;

/// Which arithmetic fold a `Kb` frame completes with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fold {
  Sum,
  Subtract,
  Product,
  Quotient,
}

#[derive(Debug)]
pub enum Frame {
  /// "Return to caller"; terminal.
  K0,
  /// After evaluating the operator of `(f a b ...)`; still must evaluate the argument list.
  K1 { expr: Value, env: Value, next: Rc<Frame> },
  /// After evaluating all arguments; must apply the operator to the argument list.
  K2 { rator: Value, env: Value, next: Rc<Frame> },
  /// Iteration of argument-list evaluation: the unevaluated tail still pending.
  K3 { expr_list: Value, env: Value, next: Rc<Frame> },
  /// Pairs the already-evaluated head back onto the rest of the evaluated argument list.
  K4 { head: Value, next: Rc<Frame> },
  /// After evaluating a cond test: the remaining clauses to fall through to.
  K5 { clauses: Value, env: Value, next: Rc<Frame> },
  /// After augmenting the environment with parameters; resume with the closure body.
  K6 { closure: Value, next: Rc<Frame> },
  /// After evaluating a `define`'s value expression; the symbol being bound.
  K8 { symbol: Value, next: Rc<Frame> },
  /// After evaluating an `if` test; the then- and else-branches, and the environment they must
  /// be evaluated in (the `if`'s own environment, not the test's answer).
  K9 { then_branch: Value, else_branch: Value, env: Value, next: Rc<Frame> },
  /// After evaluating the arguments of a variadic arithmetic built-in.
  Kb { fold: Fold, next: Rc<Frame> },
}

impl Frame {
  pub fn terminal() -> Rc<Frame> {
    Rc::new(Frame::K0)
  }
}

/// Invariant built-ins that install a `Kb` fold frame rather than dispatching synchronously.
pub fn fold_for(invariant: Invariant) -> Option<Fold> {
  match invariant {
    Invariant::Add => Some(Fold::Sum),
    Invariant::Subtract => Some(Fold::Subtract),
    Invariant::Multiply => Some(Fold::Product),
    Invariant::Divide => Some(Fold::Quotient),
    _ => None,
  }
}
