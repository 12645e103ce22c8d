/*!

  The REPL shell and batch driver: reads one top-level form, evaluates it, and prints the result
  unless it is `Null`. Exit-code policy: `exit` sentinel → 0, a parse failure in batch mode → 1,
  an evaluation failure in batch mode → 2. The interactive shell never exits on a user error — it
  logs the failure and keeps reading — matching the error-handling design's split between
  "logging-and-continuing" (interactive) and "exiting with a nonzero code" (batch).

*/

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::interpreter::trace::TraceFrame;
use crate::interpreter::{EvalError, Interpreter, Value};
use crate::parser::{self, ParseError};

pub const EXIT_OK: i32 = 0;
pub const EXIT_PARSE_ERROR: i32 = 1;
pub const EXIT_EVAL_ERROR: i32 = 2;

fn print_result(value: &Value) {
  if !matches!(value, Value::Null) {
    println!("{}", value);
  }
}

fn dump_trace(interpreter: &Interpreter, trace_lines: usize) {
  if trace_lines == 0 {
    return;
  }
  let frames: Vec<TraceFrame> = interpreter.trace().last(trace_lines);
  eprintln!("--- TRACE({}) ---", frames.len());
  for frame in &frames {
    eprintln!("{}", frame);
  }
  eprintln!("--- END TRACE ---");
}

/// Evaluates every top-level form in `source` in order, stopping at the first error. Returns the
/// process exit code.
pub fn run_batch(interpreter: &mut Interpreter, source: &str, trace_lines: usize) -> i32 {
  let exprs = match parser::parse_all(source) {
    Ok(exprs) => exprs,
    Err(err) => {
      log::warn!("parse error: {}", err);
      eprintln!("parse error: {}", err);
      return EXIT_PARSE_ERROR;
    }
  };
  for expr in exprs {
    match interpreter.evaluate(expr) {
      Ok(value) => print_result(&value),
      Err(err) if err.is_exit() => {
        log::info!("evaluation stopped by (exit)");
        return EXIT_OK;
      }
      Err(err) => {
        log::warn!("evaluation error: {}", err);
        eprintln!("error: {}", err);
        dump_trace(interpreter, trace_lines);
        return EXIT_EVAL_ERROR;
      }
    }
  }
  EXIT_OK
}

/// Runs an interactive read-eval-print loop against stdin/stdout until `exit` is called or the
/// user sends EOF (Ctrl-D). Returns the process exit code.
pub fn run_interactive(interpreter: &mut Interpreter, trace_lines: usize) -> i32 {
  let mut editor = match DefaultEditor::new() {
    Ok(editor) => editor,
    Err(err) => {
      log::warn!("could not start line editor: {}", err);
      return EXIT_EVAL_ERROR;
    }
  };
  log::info!("gamma_scheme REPL ready");
  loop {
    match editor.readline("> ") {
      Ok(line) => {
        if line.trim().is_empty() {
          continue;
        }
        let _ = editor.add_history_entry(line.as_str());
        match parse_and_evaluate(interpreter, &line) {
          Ok(Some(value)) => print_result(&value),
          Ok(None) => return EXIT_OK,
          Err(message) => {
            println!("error: {}", message);
            dump_trace(interpreter, trace_lines);
          }
        }
      }
      Err(ReadlineError::Interrupted) => continue,
      Err(ReadlineError::Eof) => return EXIT_OK,
      Err(err) => {
        log::warn!("line editor error: {}", err);
        return EXIT_EVAL_ERROR;
      }
    }
  }
}

/// `Ok(Some(value))` on a normal result, `Ok(None)` on the `exit` sentinel, `Err(message)` on
/// either a parse or evaluation failure — the interactive loop treats both the same way.
fn parse_and_evaluate(interpreter: &mut Interpreter, line: &str) -> Result<Option<Value>, String> {
  let expr = parser::parse_one(line).map_err(|err: ParseError| err.to_string())?;
  match interpreter.evaluate(expr) {
    Ok(value) => Ok(Some(value)),
    Err(err) if err.is_exit() => Ok(None),
    Err(err) => Err(describe(err)),
  }
}

fn describe(err: EvalError) -> String {
  err.to_string()
}
