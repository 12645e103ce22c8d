/*!

  A fixed-capacity ring buffer of state-machine transitions, used to diagnose a failing
  evaluation after the fact. Ported from the Go original's `stack.go`, which backs
  `Interpreter.trace` with a ring buffer capped at `TraceMaxSize` (1024) frames.

*/

use std::collections::VecDeque;
use std::fmt;

const TRACE_MAX_SIZE: usize = 1024;

#[derive(Clone, Debug)]
pub struct TraceFrame {
  pub state: &'static str,
  pub registers: String,
}

impl fmt::Display for TraceFrame {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}\n  {}", self.state, self.registers)
  }
}

/// Ring-buffered trace of the last `TRACE_MAX_SIZE` transitions. Oldest frames are dropped once
/// the buffer is full; this never blocks and never grows unbounded memory.
#[derive(Clone, Debug, Default)]
pub struct TraceBuffer {
  frames: VecDeque<TraceFrame>,
  /// Set by the symbol-lookup inner step so its own transition isn't recorded, matching the
  /// original's `ignoreNextTrace`: one enqueue is suppressed, then recording resumes.
  suppress_next: bool,
}

impl TraceBuffer {
  pub fn new() -> TraceBuffer {
    TraceBuffer { frames: VecDeque::with_capacity(TRACE_MAX_SIZE), suppress_next: false }
  }

  pub fn push(&mut self, state: &'static str, registers: String) {
    if self.suppress_next {
      self.suppress_next = false;
      return;
    }
    if self.frames.len() == TRACE_MAX_SIZE {
      self.frames.pop_front();
    }
    self.frames.push_back(TraceFrame { state, registers });
  }

  pub fn ignore_next(&mut self) {
    self.suppress_next = true;
  }

  /// The trailing `n` frames, oldest first, for `--trace` diagnostic dumps.
  pub fn last(&self, n: usize) -> Vec<TraceFrame> {
    let start = self.frames.len().saturating_sub(n);
    self.frames.iter().skip(start).cloned().collect()
  }

  pub fn all(&self) -> Vec<TraceFrame> {
    self.frames.iter().cloned().collect()
  }

  pub fn len(&self) -> usize {
    self.frames.len()
  }

  pub fn is_empty(&self) -> bool {
    self.frames.is_empty()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn push_and_last_round_trip() {
    let mut trace = TraceBuffer::new();
    trace.push("exprValue", "expr=1".to_string());
    trace.push("symValue", "sym=x".to_string());
    let last = trace.last(1);
    assert_eq!(last.len(), 1);
    assert_eq!(last[0].state, "symValue");
  }

  #[test]
  fn ignore_next_suppresses_exactly_one_push() {
    let mut trace = TraceBuffer::new();
    trace.ignore_next();
    trace.push("symValue", "sym=x".to_string());
    trace.push("symValue", "sym=y".to_string());
    assert_eq!(trace.len(), 1);
  }

  #[test]
  fn capacity_is_bounded_at_max_size() {
    let mut trace = TraceBuffer::new();
    for i in 0..(TRACE_MAX_SIZE + 10) {
      trace.push("exprValue", format!("expr={}", i));
    }
    assert_eq!(trace.len(), TRACE_MAX_SIZE);
  }
}
