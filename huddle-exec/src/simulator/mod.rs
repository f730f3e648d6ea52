//! Heuristic line simulators for the secondary languages.
//!
//! A simulator never runs real control flow. It checks bracket and quote
//! balance, then walks the source once, top to bottom, classifying each line
//! into a [`Statement`] and dispatching it to a handler that works on an
//! [`ExecutionContext`]. Lines it does not understand are skipped.

mod cpp;
mod csharp;
pub(crate) mod expr;
mod java;
mod python;
pub(crate) mod syntax;

pub use cpp::CppDialect;
pub use csharp::CSharpDialect;
pub use java::JavaDialect;
pub use python::PythonDialect;

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, error};

use crate::{
    context::{ExecutionContext, Value},
    report::ReportBuilder,
    types::{ExecutionResult, Language, StatusKind},
};
pub use syntax::{SyntaxIssue, SyntaxRules};

const MAX_INLINE_READS: usize = 16;

const INTERNAL_FAULT: &str = "Internal simulator error: this code could not be simulated.";

/// Target type of an input conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conversion {
    Text,
    Int,
    Float,
}

impl Conversion {
    /// Conversion matching the type a variable already holds
    fn of(value: &Value) -> Self {
        match value {
            Value::Str(_) => Conversion::Text,
            Value::Int(_) => Conversion::Int,
            Value::Float(_) => Conversion::Float,
        }
    }

    fn apply(&self, raw: &str) -> Option<Value> {
        match self {
            Conversion::Text => Some(Value::Str(raw.to_string())),
            Conversion::Int => raw.trim().parse().ok().map(Value::Int),
            Conversion::Float => expr::parse_float(raw.trim()).map(Value::Float),
        }
    }

    /// Value a failed read leaves behind
    fn fallback(&self) -> Value {
        match self {
            Conversion::Text => Value::Str(String::new()),
            Conversion::Int => Value::Int(0),
            Conversion::Float => Value::Float(0.0),
        }
    }
}

/// One classified source line
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// `name = expr`
    Assignment { name: String, expr: String },
    /// Typed declaration without initializer (`int x;`)
    Declaration { names: Vec<String>, conversion: Conversion },
    /// Output statement; parts are rendered, joined and terminated
    Output {
        parts: Vec<String>,
        separator: String,
        terminator: String,
    },
    /// Reads one input line per target. `None` uses the declared type.
    Input {
        targets: Vec<String>,
        conversion: Option<Conversion>,
        prompt: Option<String>,
    },
    /// Start of a guarded block (`try:`)
    TryStart,
    /// Exception handler header (`except ...:`)
    Handler,
    Unrecognized,
}

/// Runtime faults a simulated program can hit
#[derive(Debug, Clone, PartialEq)]
pub enum Fault {
    Conversion { raw: String, target: Conversion },
    EndOfInput,
}

/// Language-specific parts of a simulator
pub trait Dialect: Sync {
    fn language(&self) -> Language;

    fn syntax_rules(&self) -> SyntaxRules;

    fn classify(&self, line: &str) -> Statement;

    /// One compiler/interpreter diagnostic for a balance issue
    fn syntax_diagnostic(&self, issue: &SyntaxIssue, source_line: &str) -> String;

    /// Full report text for the collected diagnostics
    fn syntax_report(&self, diagnostics: &[String]) -> String {
        diagnostics.concat()
    }

    fn runtime_error(&self, line: usize, fault: &Fault) -> String;

    /// Whether `try`/`except` blocks are tracked by indentation
    fn indentation_blocks(&self) -> bool {
        false
    }

    /// Function that reads a line when called inside an expression
    fn inline_input(&self) -> Option<&'static str> {
        None
    }
}

pub fn dialect_for(language: Language) -> Option<&'static dyn Dialect> {
    match language {
        Language::Rhai => None,
        Language::Python => Some(&PythonDialect),
        Language::Java => Some(&JavaDialect),
        Language::Cpp => Some(&CppDialect),
        Language::CSharp => Some(&CSharpDialect),
    }
}

/// Simulates `code` and formats the report. Never panics past this boundary.
pub fn simulate(dialect: &dyn Dialect, code: &str, stdin: &[String]) -> ExecutionResult {
    let language = dialect.language();
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        Simulation::new(dialect, stdin.to_vec()).run(code)
    }));

    match outcome {
        Ok(result) => result,
        Err(_) => {
            error!("Simulator for {} failed internally", language);
            let report = ReportBuilder::new(language.local_banner(), language)
                .runtime_error("", INTERNAL_FAULT)
                .finish();
            ExecutionResult::new(StatusKind::RuntimeError, report)
        }
    }
}

struct TryFrame {
    indent: usize,
    pending: Vec<String>,
}

struct Simulation<'a> {
    dialect: &'a dyn Dialect,
    ctx: ExecutionContext,
    declared: HashMap<String, Conversion>,
    try_frames: Vec<TryFrame>,
    /// Lines indented deeper than this are skipped
    skip_deeper_than: Option<usize>,
    line_no: usize,
}

impl<'a> Simulation<'a> {
    fn new(dialect: &'a dyn Dialect, stdin: Vec<String>) -> Self {
        Self {
            dialect,
            ctx: ExecutionContext::new(stdin),
            declared: HashMap::new(),
            try_frames: Vec::new(),
            skip_deeper_than: None,
            line_no: 0,
        }
    }

    fn run(mut self, code: &str) -> ExecutionResult {
        let language = self.dialect.language();

        let issues = syntax::scan(code, self.dialect.syntax_rules());
        if !issues.is_empty() {
            let lines: Vec<&str> = code.lines().collect();
            for issue in &issues {
                let source = lines.get(issue.line - 1).copied().unwrap_or_default();
                self.ctx
                    .error(self.dialect.syntax_diagnostic(issue, source.trim()));
            }
            debug!("{} syntax issues, skipping interpretation", issues.len());
            let report = self.dialect.syntax_report(self.ctx.errors());
            return ExecutionResult::new(StatusKind::CompileError, report);
        }

        for (idx, raw) in code.lines().enumerate() {
            self.line_no = idx + 1;
            self.step(raw);
        }
        while let Some(frame) = self.try_frames.pop() {
            for message in frame.pending {
                self.ctx.error(message);
            }
        }

        let stdout = self.ctx.stdout();
        let builder = ReportBuilder::new(language.local_banner(), language);
        if self.ctx.has_errors() {
            let report = builder
                .runtime_error(&stdout, &self.ctx.errors().join("\n"))
                .finish();
            ExecutionResult::new(StatusKind::RuntimeError, report)
        } else {
            ExecutionResult::new(StatusKind::Success, builder.success(&stdout).finish())
        }
    }

    fn step(&mut self, raw: &str) {
        let line = strip_comment(raw, self.dialect.syntax_rules().line_comment).trim();
        if line.is_empty() {
            return;
        }

        let statement = self.dialect.classify(line);

        if self.dialect.indentation_blocks() {
            let indent = indentation(raw);
            if let Some(limit) = self.skip_deeper_than {
                if indent > limit {
                    return;
                }
                self.skip_deeper_than = None;
            }
            if !self.close_try_frames(indent, &statement) {
                return;
            }
        }

        debug!("line {}: {:?}", self.line_no, statement);
        match statement {
            Statement::Assignment { name, expr } => self.assign(&name, &expr),
            Statement::Declaration { names, conversion } => {
                for name in names {
                    self.ctx.set_var(name.clone(), conversion.fallback());
                    self.declared.insert(name, conversion);
                }
            }
            Statement::Output {
                parts,
                separator,
                terminator,
            } => self.output(&parts, &separator, &terminator),
            Statement::Input {
                targets,
                conversion,
                prompt,
            } => self.input(&targets, conversion, prompt.as_deref()),
            Statement::TryStart => self.try_frames.push(TryFrame {
                indent: indentation(raw),
                pending: Vec::new(),
            }),
            Statement::Handler | Statement::Unrecognized => {}
        }
    }

    /// Resolves open `try` frames against a line at `indent`.
    /// Returns `false` when the line opens a handler block that is skipped.
    fn close_try_frames(&mut self, indent: usize, statement: &Statement) -> bool {
        let is_handler = matches!(statement, Statement::Handler);

        while let Some(frame) = self.try_frames.last() {
            if indent > frame.indent {
                break;
            }
            let Some(frame) = self.try_frames.pop() else {
                break;
            };
            if is_handler && indent == frame.indent {
                if frame.pending.is_empty() {
                    self.skip_deeper_than = Some(indent);
                    return false;
                }
                // the handler runs and the fault counts as handled
                return true;
            }
            for message in frame.pending {
                self.ctx.error(message);
            }
        }

        if is_handler {
            // a second handler after one already matched
            self.skip_deeper_than = Some(indent);
            return false;
        }
        true
    }

    fn fault(&mut self, fault: Fault) {
        let message = self.dialect.runtime_error(self.line_no, &fault);
        match self.try_frames.last_mut() {
            Some(frame) => frame.pending.push(message),
            None => self.ctx.error(message),
        }
    }

    fn assign(&mut self, name: &str, expr: &str) {
        let expr = match self.dialect.inline_input() {
            Some(function) => self.read_inline(expr, function),
            None => expr.to_string(),
        };
        if let Some(value) = expr::eval(&expr, &self.ctx) {
            self.ctx.set_var(name, value);
        }
    }

    /// Replaces each `function(...)` call in `expr` with a literal holding
    /// the line it reads, left to right.
    fn read_inline(&mut self, expr: &str, function: &str) -> String {
        let mut expr = expr.to_string();
        for _ in 0..MAX_INLINE_READS {
            let Some(call) = expr::find_call(&expr, function) else {
                break;
            };
            let (start, end) = (call.start, call.end);
            let prompt = call.args.trim().to_string();
            if !prompt.is_empty() {
                let text = expr::render(&prompt, &self.ctx);
                self.ctx.emit(text);
            }

            let conversion = wrapping_conversion(&expr[..start], &expr[end..]);
            let value = match self.ctx.next_input() {
                Some(raw) => match conversion.apply(&raw) {
                    Some(value) => value,
                    None => {
                        self.fault(Fault::Conversion {
                            raw,
                            target: conversion,
                        });
                        conversion.fallback()
                    }
                },
                None => {
                    self.fault(Fault::EndOfInput);
                    conversion.fallback()
                }
            };
            let literal = match value {
                Value::Str(text) => expr::quote(&text),
                other => other.to_string(),
            };
            expr.replace_range(start..end, &literal);
        }
        expr
    }

    fn output(&mut self, parts: &[String], separator: &str, terminator: &str) {
        let rendered: Vec<String> = parts
            .iter()
            .map(|part| expr::render(part, &self.ctx))
            .collect();
        let mut text = rendered.join(separator);
        text.push_str(terminator);
        self.ctx.emit(text);
    }

    fn input(&mut self, targets: &[String], conversion: Option<Conversion>, prompt: Option<&str>) {
        if let Some(prompt) = prompt {
            let text = expr::render(prompt, &self.ctx);
            self.ctx.emit(text);
        }
        for target in targets {
            let conversion = conversion
                .or_else(|| self.declared.get(target).copied())
                .or_else(|| self.ctx.var(target).map(Conversion::of))
                .unwrap_or(Conversion::Text);
            let Some(raw) = self.ctx.next_input() else {
                self.ctx.set_var(target.clone(), conversion.fallback());
                self.fault(Fault::EndOfInput);
                continue;
            };
            match conversion.apply(&raw) {
                Some(value) => self.ctx.set_var(target.clone(), value),
                None => {
                    self.ctx.set_var(target.clone(), conversion.fallback());
                    self.fault(Fault::Conversion {
                        raw,
                        target: conversion,
                    });
                }
            }
        }
    }
}

/// `int` or `float` when the call spanning the gap between `before` and
/// `after` is their only argument
fn wrapping_conversion(before: &str, after: &str) -> Conversion {
    if !after.trim_start().starts_with(')') {
        return Conversion::Text;
    }
    let Some(head) = before.trim_end().strip_suffix('(') else {
        return Conversion::Text;
    };
    let name = head
        .trim_end()
        .rsplit(|c: char| !(c.is_alphanumeric() || c == '_'))
        .next()
        .unwrap_or_default();
    match name {
        "int" => Conversion::Int,
        "float" => Conversion::Float,
        _ => Conversion::Text,
    }
}

fn indentation(raw: &str) -> usize {
    raw.chars()
        .take_while(|c| c.is_whitespace())
        .map(|c| if c == '\t' { 4 } else { 1 })
        .sum()
}

/// Cuts a trailing line comment that is not inside a string literal
fn strip_comment<'l>(line: &'l str, marker: &str) -> &'l str {
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (i, c) in line.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        if c == '"' || c == '\'' {
            quote = Some(c);
        } else if line[i..].starts_with(marker) {
            return &line[..i];
        }
    }
    line
}

/// Splits a comma-separated declarator list, keeping only plain names
pub(crate) fn declared_names(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty() && name.chars().all(|c| c.is_alphanumeric() || c == '_'))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_comment_ignores_markers_in_strings() {
        assert_eq!(strip_comment("x = 1  # note", "#"), "x = 1  ");
        assert_eq!(strip_comment("print(\"#1\")", "#"), "print(\"#1\")");
        assert_eq!(strip_comment("int a; // c", "//"), "int a; ");
    }

    #[test]
    fn test_wrapping_conversion() {
        assert_eq!(wrapping_conversion("x + int(", ") + 1"), Conversion::Int);
        assert_eq!(wrapping_conversion("float( ", " )"), Conversion::Float);
        assert_eq!(wrapping_conversion("str(", ")"), Conversion::Text);
        assert_eq!(wrapping_conversion("int(", ".strip())"), Conversion::Text);
        assert_eq!(wrapping_conversion("", ""), Conversion::Text);
    }

    #[test]
    fn test_indentation_counts_tabs() {
        assert_eq!(indentation("    x"), 4);
        assert_eq!(indentation("\tx"), 4);
        assert_eq!(indentation("x"), 0);
    }

    #[test]
    fn test_every_secondary_language_has_a_dialect() {
        for language in Language::ALL {
            assert_eq!(dialect_for(language).is_some(), !language.is_primary());
        }
    }
}
