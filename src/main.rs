use std::fs;
use std::process::ExitCode;

use clap::Parser;

use gamma_scheme::interpreter::Interpreter;
use gamma_scheme::repl;

/// A continuation-passing-style evaluator for a small Scheme-like language.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
  /// Evaluate this file's top-level forms in sequence, then exit, instead of starting the
  /// interactive shell.
  file: Option<String>,

  /// Print the trace buffer's last `--trace-depth` frames to stderr when an evaluation fails.
  #[arg(short, long)]
  trace: bool,

  /// How many trailing trace-buffer frames `--trace` shows.
  #[arg(long, default_value_t = 8)]
  trace_depth: usize,
}

fn main() -> ExitCode {
  env_logger::init();
  let cli = Cli::parse();
  let mut interpreter = Interpreter::with_default_environment();
  let trace_lines = if cli.trace { cli.trace_depth } else { 0 };

  let code = match cli.file {
    Some(path) => match fs::read_to_string(&path) {
      Ok(source) => repl::run_batch(&mut interpreter, &source, trace_lines),
      Err(err) => {
        eprintln!("could not read {}: {}", path, err);
        repl::EXIT_PARSE_ERROR
      }
    },
    None => repl::run_interactive(&mut interpreter, trace_lines),
  };

  ExitCode::from(code as u8)
}
