/*!

  The evaluator's error taxonomy. Every fallible step of `Interpreter::evaluate` returns one of
  these variants rather than a bare `String`, so callers (the REPL, tests) can match on *kind*
  without parsing message text, while the message text itself still reproduces the original
  interpreter's wording.

*/

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
  #[error("{0}")]
  Syntax(String),

  #[error("environment lookup failed for symbol \"{0}\"")]
  Lookup(String),

  #[error("{0}")]
  TypeShape(String),

  #[error("{0}")]
  Arity(String),

  #[error("{0}")]
  Arithmetic(String),

  /// The `exit` built-in was invoked. Not a failure: the REPL treats this as a clean shutdown
  /// signal and exits with status 0.
  #[error("interpreter exited")]
  Exit,

  #[error("panic: {0}")]
  Panic(String),
}

impl EvalError {
  pub fn syntax(message: impl Into<String>) -> EvalError {
    EvalError::Syntax(message.into())
  }

  pub fn type_shape(message: impl Into<String>) -> EvalError {
    EvalError::TypeShape(message.into())
  }

  pub fn arity(message: impl Into<String>) -> EvalError {
    EvalError::Arity(message.into())
  }

  pub fn arithmetic(message: impl Into<String>) -> EvalError {
    EvalError::Arithmetic(message.into())
  }

  /// `true` for the terminal `exit` sentinel, which the REPL must not report as a user error.
  pub fn is_exit(&self) -> bool {
    matches!(self, EvalError::Exit)
  }
}
