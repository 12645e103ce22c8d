/*!

  The CPS evaluator: a single re-entrant state machine that interleaves expression evaluation,
  argument-list evaluation, `cond` chains, environment augmentation, and continuation
  application. Every transition is a plain function call returning the next [`State`] — never a
  recursive call into `run` itself — so the evaluator's host-stack depth is bounded regardless of
  how deeply the evaluated program recurses in tail position.

*/

use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use super::closure::Closure;
use super::continuation::{fold_for, Fold, Frame};
use super::environment;
use super::error::EvalError;
use super::primitive::{self, Invariant};
use super::trace::TraceBuffer;
use super::value::{self, Value};

/// One pending step of the state machine. Each variant carries exactly the registers its
/// transition function reads.
enum State {
  ExprValue { expr: Value, env: Value, c: Rc<Frame> },
  ExprListValue { expr_list: Value, env: Value, c: Rc<Frame> },
  SymValue { sym: Value, env: Value, c: Rc<Frame> },
  CondValue { clauses: Value, env: Value, c: Rc<Frame> },
  AppValue { rator: Value, rand_list: Value, env: Value, c: Rc<Frame> },
  AugmentedEnv { sym_list: Value, rand_list: Value, env: Value, c: Rc<Frame> },
  ApplyC { answer: Value, c: Rc<Frame> },
}

enum ApplyCResult {
  Done(Value),
  Next(State),
}

fn is_literal(value: &Value, name: &str) -> bool {
  matches!(value, Value::Symbol(s) if s.as_ref() == name)
}

fn is_false(value: &Value) -> bool {
  matches!(value, Value::Boolean(false))
}

fn current_time_millis() -> i64 {
  SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis() as i64).unwrap_or(0)
}

/// The default environment: every built-in named in the operator table, bound to its
/// `Invariant` tag.
pub fn default_environment() -> Value {
  let bindings = primitive::all()
    .iter()
    .copied()
    .map(|invariant| (Value::symbol(&invariant.to_string()), Value::Invariant(invariant)))
    .collect();
  environment::from_pairs(bindings)
}

pub struct Interpreter {
  env: Value,
  trace: TraceBuffer,
}

impl Interpreter {
  pub fn new(env: Value) -> Interpreter {
    Interpreter { env, trace: TraceBuffer::new() }
  }

  pub fn with_default_environment() -> Interpreter {
    Interpreter::new(default_environment())
  }

  /// The interpreter's current top-level environment, as mutated by `define`.
  pub fn environment(&self) -> &Value {
    &self.env
  }

  pub fn trace(&self) -> &TraceBuffer {
    &self.trace
  }

  fn record(&mut self, state: &'static str, registers: String) {
    log::trace!("{}: {}", state, registers);
    self.trace.push(state, registers);
  }

  /// Evaluates `expr` against the current top-level environment. A host panic during evaluation
  /// is caught and reported as [`EvalError::Panic`] rather than unwinding past this call.
  pub fn evaluate(&mut self, expr: Value) -> Result<Value, EvalError> {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.run(expr)));
    outcome.unwrap_or_else(|payload| Err(EvalError::Panic(describe_panic(payload))))
  }

  fn run(&mut self, expr: Value) -> Result<Value, EvalError> {
    let mut state = State::ExprValue { expr, env: self.env.clone(), c: Frame::terminal() };
    loop {
      state = match state {
        State::ExprValue { expr, env, c } => self.expr_value(expr, env, c)?,
        State::ExprListValue { expr_list, env, c } => self.expr_list_value(expr_list, env, c)?,
        State::SymValue { sym, env, c } => self.sym_value(sym, env, c)?,
        State::CondValue { clauses, env, c } => self.cond_value(clauses, env, c)?,
        State::AppValue { rator, rand_list, env, c } => self.app_value(rator, rand_list, env, c)?,
        State::AugmentedEnv { sym_list, rand_list, env, c } => {
          self.augmented_env(sym_list, rand_list, env, c)?
        }
        State::ApplyC { answer, c } => match self.apply_c(answer, c)? {
          ApplyCResult::Done(value) => return Ok(value),
          ApplyCResult::Next(next) => next,
        },
      };
    }
  }

  fn expr_value(&mut self, expr: Value, env: Value, c: Rc<Frame>) -> Result<State, EvalError> {
    self.record("exprValue", format!("expr={} env={}", expr, env));
    match &expr {
      Value::Null
      | Value::Boolean(_)
      | Value::Integer(_)
      | Value::Float(_)
      | Value::Invariant(_)
      | Value::Closure(_)
      | Value::Continuation(_) => Ok(State::ApplyC { answer: expr, c }),

      Value::Symbol(_) => Ok(State::SymValue { sym: expr, env, c }),

      Value::Quoted(inner) => Ok(State::ApplyC { answer: (**inner).clone(), c }),

      Value::Pair(_) => {
        let head = value::car(&expr).expect("Pair always has a car");

        if is_literal(&head, "cond") {
          let clauses = value::cdr(&expr).expect("Pair always has a cdr");
          Ok(State::CondValue { clauses, env, c })
        } else if is_literal(&head, "if") {
          let (test, then_branch, else_branch) = if_parts(&expr)?;
          let k9 = Rc::new(Frame::K9 { then_branch, else_branch, env: env.clone(), next: c });
          Ok(State::ExprValue { expr: test, env, c: k9 })
        } else if is_literal(&head, "lambda") {
          let params = value::cadr(&expr)
            .map_err(|_| EvalError::syntax(format!("missing parameter list in function literal: {}", expr)))?;
          let body = value::caddr(&expr)
            .map_err(|_| EvalError::syntax(format!("missing body in function literal: {}", expr)))?;
          let closure = Value::Closure(Rc::new(Closure::new(params, body, env)));
          Ok(State::ApplyC { answer: closure, c })
        } else if is_literal(&head, "define") {
          let symbol = value::cadr(&expr)
            .map_err(|_| EvalError::syntax(format!("missing symbol in define: {}", expr)))?;
          if !value::is_symbol(&symbol) {
            return Err(EvalError::syntax(format!("missing symbol in define: {}", expr)));
          }
          let body = value::caddr(&expr)
            .map_err(|_| EvalError::syntax(format!("missing expression in define: {}", expr)))?;
          let k8 = Rc::new(Frame::K8 { symbol, next: c });
          Ok(State::ExprValue { expr: body, env, c: k8 })
        } else {
          let k1 = Rc::new(Frame::K1 { expr: expr.clone(), env: env.clone(), next: c });
          Ok(State::ExprValue { expr: head, env, c: k1 })
        }
      }
    }
  }

  fn expr_list_value(&mut self, expr_list: Value, env: Value, c: Rc<Frame>) -> Result<State, EvalError> {
    self.record("exprListValue", format!("exprList={}", expr_list));
    if value::is_null(&expr_list) {
      return Ok(State::ApplyC { answer: Value::Null, c });
    }
    let head = value::car(&expr_list).map_err(EvalError::type_shape)?;
    let k3 = Rc::new(Frame::K3 { expr_list, env: env.clone(), next: c });
    Ok(State::ExprValue { expr: head, env, c: k3 })
  }

  /// Walks `env` looking for `sym`'s binding. Every recursive step but the first suppresses its
  /// own trace entry, mirroring the original interpreter's `ignoreNextTrace` so a long lookup
  /// chain doesn't flood the trace buffer with one entry per link.
  fn sym_value(&mut self, sym: Value, mut env: Value, c: Rc<Frame>) -> Result<State, EvalError> {
    let name: Rc<str> = match &sym {
      Value::Symbol(name) => name.clone(),
      _ => unreachable!("sym_value is only ever entered with a Symbol"),
    };
    loop {
      self.record("symValue", format!("sym={} env={}", sym, env));
      match &env {
        Value::Pair(pair) => {
          if let Value::Pair(entry) = &pair.car {
            if let Value::Symbol(bound) = &entry.car {
              if bound == &name {
                return Ok(State::ApplyC { answer: entry.cdr.clone(), c });
              }
            }
          }
          let next_env = pair.cdr.clone();
          self.trace.ignore_next();
          env = next_env;
        }
        _ => return Err(EvalError::Lookup(name.to_string())),
      }
    }
  }

  fn cond_value(&mut self, clauses: Value, env: Value, c: Rc<Frame>) -> Result<State, EvalError> {
    self.record("condValue", format!("clauses={}", clauses));
    if value::is_null(&clauses) {
      return Err(EvalError::syntax("invalid empty cond block"));
    }
    let clause = value::car(&clauses).map_err(EvalError::type_shape)?;
    if value::is_null(&clause) {
      return Err(EvalError::syntax("invalid empty cond condition"));
    }
    let condition = value::car(&clause)
      .map_err(|_| EvalError::syntax(format!("missing condition in cond clause: {}", clause)))?;
    let clause_expr = value::cadr(&clause)
      .map_err(|_| EvalError::syntax(format!("missing expression in cond clause: {}", clause)))?;
    if is_literal(&condition, "else") {
      Ok(State::ExprValue { expr: clause_expr, env, c })
    } else {
      let k5 = Rc::new(Frame::K5 { clauses, env: env.clone(), next: c });
      Ok(State::ExprValue { expr: condition, env, c: k5 })
    }
  }

  fn app_value(&mut self, rator: Value, rand_list: Value, env: Value, c: Rc<Frame>) -> Result<State, EvalError> {
    self.record("appValue", format!("rator={} randList={}", rator, rand_list));
    match &rator {
      Value::Invariant(invariant) => self.apply_invariant(*invariant, &rator, rand_list, env, c),

      Value::Closure(closure) => {
        if let Some(expected) = fixed_arity(&closure.params) {
          primitive::arity_check(expected, "<closure>", &rand_list).map_err(EvalError::arity)?;
        }
        let captured_env = closure.env.borrow().clone();
        let k6 = Rc::new(Frame::K6 { closure: rator.clone(), next: c });
        Ok(State::AugmentedEnv { sym_list: closure.params.clone(), rand_list, env: captured_env, c: k6 })
      }

      Value::Continuation(frame) => {
        let answer = value::car(&rand_list).map_err(EvalError::type_shape)?;
        Ok(State::ApplyC { answer, c: frame.clone() })
      }

      other => Err(EvalError::type_shape(format!("unknown operator: {}", other))),
    }
  }

  fn apply_invariant(
    &mut self,
    invariant: Invariant,
    rator: &Value,
    rand_list: Value,
    env: Value,
    c: Rc<Frame>,
  ) -> Result<State, EvalError> {
    if let Some(fold) = fold_for(invariant) {
      let kb = Rc::new(Frame::Kb { fold, next: c });
      return Ok(State::ApplyC { answer: rand_list, c: kb });
    }

    let display = format!("{}", rator);
    let arity = |n: usize, rand_list: &Value| primitive::arity_check(n, &display, rand_list).map_err(EvalError::arity);

    match invariant {
      Invariant::Car => {
        arity(1, &rand_list)?;
        let first = value::car(&rand_list).map_err(EvalError::type_shape)?;
        let result = value::car(&first).map_err(EvalError::type_shape)?;
        Ok(State::ApplyC { answer: result, c })
      }
      Invariant::Cdr => {
        arity(1, &rand_list)?;
        let first = value::car(&rand_list).map_err(EvalError::type_shape)?;
        let result = value::cdr(&first).map_err(EvalError::type_shape)?;
        Ok(State::ApplyC { answer: result, c })
      }
      Invariant::Cons => {
        arity(2, &rand_list)?;
        let first = value::car(&rand_list).map_err(EvalError::type_shape)?;
        let second = value::cadr(&rand_list).map_err(EvalError::type_shape)?;
        Ok(State::ApplyC { answer: value::cons(first, second), c })
      }
      Invariant::Eq => {
        arity(2, &rand_list)?;
        let first = value::car(&rand_list).map_err(EvalError::type_shape)?;
        let second = value::cadr(&rand_list).map_err(EvalError::type_shape)?;
        Ok(State::ApplyC { answer: Value::Boolean(first == second), c })
      }
      Invariant::IsSymbol => {
        arity(1, &rand_list)?;
        let first = value::car(&rand_list).map_err(EvalError::type_shape)?;
        Ok(State::ApplyC { answer: Value::Boolean(value::is_symbol(&first)), c })
      }
      Invariant::IsNull => {
        arity(1, &rand_list)?;
        let first = value::car(&rand_list).map_err(EvalError::type_shape)?;
        Ok(State::ApplyC { answer: Value::Boolean(value::is_null(&first)), c })
      }
      Invariant::Apply => {
        arity(2, &rand_list)?;
        let new_rator = value::car(&rand_list).map_err(EvalError::type_shape)?;
        let new_rand_list = value::cadr(&rand_list).map_err(EvalError::type_shape)?;
        Ok(State::AppValue { rator: new_rator, rand_list: new_rand_list, env, c })
      }
      Invariant::CallCc => {
        arity(1, &rand_list)?;
        let operator = value::car(&rand_list).map_err(EvalError::type_shape)?;
        let reified = Value::Continuation(c.clone());
        let new_rand_list = value::list(vec![reified]);
        Ok(State::AppValue { rator: operator, rand_list: new_rand_list, env, c })
      }
      Invariant::Exit => {
        arity(0, &rand_list)?;
        Err(EvalError::Exit)
      }
      Invariant::Env => {
        arity(0, &rand_list)?;
        Ok(State::ApplyC { answer: env, c })
      }
      Invariant::Time => {
        arity(0, &rand_list)?;
        Ok(State::ApplyC { answer: Value::Integer(current_time_millis()), c })
      }
      Invariant::Sleep => {
        arity(1, &rand_list)?;
        let seconds = match value::car(&rand_list).map_err(EvalError::type_shape)? {
          Value::Integer(n) => n,
          other => return Err(EvalError::type_shape(format!("sleep expects an Integer, got {}", other))),
        };
        std::thread::sleep(Duration::from_secs(seconds.max(0) as u64));
        Ok(State::ApplyC { answer: Value::Integer(current_time_millis()), c })
      }
      Invariant::Add | Invariant::Subtract | Invariant::Multiply | Invariant::Divide => {
        unreachable!("arithmetic invariants are dispatched through fold_for above")
      }
    }
  }

  fn augmented_env(&mut self, sym_list: Value, rand_list: Value, env: Value, c: Rc<Frame>) -> Result<State, EvalError> {
    self.record("augmentedEnv", format!("symList={} randList={}", sym_list, rand_list));
    match &sym_list {
      Value::Null => Ok(State::ApplyC { answer: env, c }),

      Value::Symbol(_) => {
        let augmented = environment::put(&env, sym_list, rand_list);
        Ok(State::ApplyC { answer: augmented, c })
      }

      Value::Pair(_) => {
        let name = value::car(&sym_list).map_err(EvalError::type_shape)?;
        let bound_value = value::car(&rand_list).map_err(EvalError::type_shape)?;
        let augmented = environment::put(&env, name, bound_value);
        let rest_syms = value::cdr(&sym_list).map_err(EvalError::type_shape)?;
        let rest_rands = value::cdr(&rand_list).map_err(EvalError::type_shape)?;
        Ok(State::AugmentedEnv { sym_list: rest_syms, rand_list: rest_rands, env: augmented, c })
      }

      other => Err(EvalError::type_shape(format!("invalid parameter list: {}", other))),
    }
  }

  fn apply_c(&mut self, answer: Value, c: Rc<Frame>) -> Result<ApplyCResult, EvalError> {
    self.record("applyC", format!("answer={}", answer));
    match c.as_ref() {
      Frame::K0 => Ok(ApplyCResult::Done(answer)),

      Frame::Kb { fold, next } => {
        let result = match fold {
          Fold::Sum => primitive::sum(&answer),
          Fold::Subtract => primitive::subtract(&answer),
          Fold::Product => primitive::product(&answer),
          Fold::Quotient => primitive::quotient(&answer),
        }
        .map_err(EvalError::arithmetic)?;
        Ok(ApplyCResult::Next(State::ApplyC { answer: result, c: next.clone() }))
      }

      Frame::K1 { expr, env, next } => {
        let expr_list = value::cdr(expr).map_err(EvalError::type_shape)?;
        let k2 = Rc::new(Frame::K2 { rator: answer, env: env.clone(), next: next.clone() });
        Ok(ApplyCResult::Next(State::ExprListValue { expr_list, env: env.clone(), c: k2 }))
      }

      Frame::K2 { rator, env, next } => Ok(ApplyCResult::Next(State::AppValue {
        rator: rator.clone(),
        rand_list: answer,
        env: env.clone(),
        c: next.clone(),
      })),

      Frame::K3 { expr_list, env, next } => {
        let tail = value::cdr(expr_list).map_err(EvalError::type_shape)?;
        let k4 = Rc::new(Frame::K4 { head: answer, next: next.clone() });
        Ok(ApplyCResult::Next(State::ExprListValue { expr_list: tail, env: env.clone(), c: k4 }))
      }

      Frame::K4 { head, next } => {
        let result = value::cons(head.clone(), answer);
        Ok(ApplyCResult::Next(State::ApplyC { answer: result, c: next.clone() }))
      }

      Frame::K5 { clauses, env, next } => {
        if !is_false(&answer) {
          let clause = value::car(clauses).map_err(EvalError::type_shape)?;
          let clause_expr = value::cadr(&clause).map_err(EvalError::type_shape)?;
          Ok(ApplyCResult::Next(State::ExprValue { expr: clause_expr, env: env.clone(), c: next.clone() }))
        } else {
          let rest = value::cdr(clauses).map_err(EvalError::type_shape)?;
          Ok(ApplyCResult::Next(State::CondValue { clauses: rest, env: env.clone(), c: next.clone() }))
        }
      }

      Frame::K6 { closure, next } => {
        let body = match closure {
          Value::Closure(closure) => closure.body.clone(),
          _ => unreachable!("K6 always captures a Closure"),
        };
        Ok(ApplyCResult::Next(State::ExprValue { expr: body, env: answer, c: next.clone() }))
      }

      Frame::K8 { symbol, next } => {
        if let Value::Closure(closure) = &answer {
          let augmented = {
            let captured = closure.env.borrow();
            environment::put(&captured, symbol.clone(), answer.clone())
          };
          *closure.env.borrow_mut() = augmented;
        }
        self.env = environment::put(&self.env, symbol.clone(), answer);
        Ok(ApplyCResult::Next(State::ApplyC { answer: Value::Null, c: next.clone() }))
      }

      Frame::K9 { then_branch, else_branch, env, next } => {
        let branch = if !is_false(&answer) { then_branch.clone() } else { else_branch.clone() };
        Ok(ApplyCResult::Next(State::ExprValue { expr: branch, env: env.clone(), c: next.clone() }))
      }
    }
  }
}

/// `Some(n)` for a fixed-arity parameter list of length `n`; `None` for a rest-parameter form
/// (a lone `Symbol`), which accepts any number of arguments.
fn fixed_arity(params: &Value) -> Option<usize> {
  match params {
    Value::Symbol(_) => None,
    other => Some(value::list_len(other)),
  }
}

fn if_parts(expr: &Value) -> Result<(Value, Value, Value), EvalError> {
  let rest = value::cdr(expr).map_err(|_| EvalError::syntax(format!("missing clause in if expression: {}", expr)))?;
  let parts = value::to_vec(&rest).filter(|parts| parts.len() == 3);
  match parts {
    Some(parts) => Ok((parts[0].clone(), parts[1].clone(), parts[2].clone())),
    None => Err(EvalError::syntax(format!("missing clause in if expression: {}", expr))),
  }
}

fn describe_panic(payload: Box<dyn std::any::Any + Send>) -> String {
  if let Some(message) = payload.downcast_ref::<&str>() {
    message.to_string()
  } else if let Some(message) = payload.downcast_ref::<String>() {
    message.clone()
  } else {
    "unknown panic".to_string()
  }
}
