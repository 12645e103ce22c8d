/*!

  A continuation-passing-style evaluator for a small Scheme-like language, with lexically scoped
  closures and first-class continuations reified through `call/cc`.

*/

pub mod interpreter;
pub mod parser;
pub mod repl;

pub use interpreter::{EvalError, Interpreter};
pub use parser::{parse_all, parse_one, ParseError};
