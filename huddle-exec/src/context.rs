//! Per-run scratch state for the local line simulators.

use std::collections::HashMap;
use std::fmt;

/// Dynamically typed simulator value: a string or a number
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(String),
    Int(i64),
    Float(f64),
}

impl Value {
    /// `+` with host coercion: numbers add, anything with a string concatenates
    pub fn plus(&self, rhs: &Value) -> Value {
        match (self, rhs) {
            (Value::Int(a), Value::Int(b)) => match a.checked_add(*b) {
                Some(sum) => Value::Int(sum),
                None => Value::Float(*a as f64 + *b as f64),
            },
            (Value::Int(a), Value::Float(b)) => Value::Float(*a as f64 + b),
            (Value::Float(a), Value::Int(b)) => Value::Float(a + *b as f64),
            (Value::Float(a), Value::Float(b)) => Value::Float(a + b),
            (lhs, rhs) => Value::Str(format!("{}{}", lhs, rhs)),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => f.write_str(s),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(x) if x.fract() == 0.0 && x.is_finite() => write!(f, "{:.1}", x),
            Value::Float(x) => write!(f, "{}", x),
        }
    }
}

/// Scratch state owned by exactly one simulator run.
///
/// The input cursor only moves forward; output and errors are append-only.
#[derive(Debug, Default)]
pub struct ExecutionContext {
    input_lines: Vec<String>,
    cursor: usize,
    variables: HashMap<String, Value>,
    output: Vec<String>,
    errors: Vec<String>,
}

impl ExecutionContext {
    pub fn new(input_lines: Vec<String>) -> Self {
        Self {
            input_lines,
            ..Default::default()
        }
    }

    /// Consumes the next input line, `None` once the input is exhausted.
    pub fn next_input(&mut self) -> Option<String> {
        let line = self.input_lines.get(self.cursor).cloned()?;
        self.cursor += 1;
        Some(line)
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn set_var(&mut self, name: impl Into<String>, value: Value) {
        self.variables.insert(name.into(), value);
    }

    pub fn var(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    pub fn emit(&mut self, fragment: impl Into<String>) {
        self.output.push(fragment.into());
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// All output fragments in emission order
    pub fn stdout(&self) -> String {
        self.output.concat()
    }
}
