//! In-process evaluation of the primary language (Rhai).
//!
//! Every call builds its own [`Engine`] with its own console capture and
//! input queue, so concurrent runs never share adapters.

use rhai::{Dynamic, Engine, EvalAltResult, Position};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::debug;

use crate::report::ReportBuilder;
use crate::types::{ExecutionResult, Language, StatusKind};

pub const NO_MORE_INPUT: &str = "No more input available";

const MAX_FRAMES: usize = 5;
const PROGRESS_CHECK_INTERVAL: u64 = 1024;

/// Captured `print`/`debug` output of one call
#[derive(Clone, Default)]
struct ConsoleCapture {
    buffer: Arc<Mutex<String>>,
}

impl ConsoleCapture {
    fn line(&self, text: &str) {
        if let Ok(mut buffer) = self.buffer.lock() {
            buffer.push_str(text);
            buffer.push('\n');
        }
    }

    /// Drains everything written so far
    fn take(&self) -> String {
        match self.buffer.lock() {
            Ok(mut buffer) => std::mem::take(&mut *buffer),
            Err(_) => String::new(),
        }
    }
}

/// Queued stdin lines consumed by `readline()` and `input()`
#[derive(Clone)]
struct InputQueue {
    lines: Arc<Mutex<VecDeque<String>>>,
    console: ConsoleCapture,
}

impl InputQueue {
    fn new(stdin: &[String], console: ConsoleCapture) -> Self {
        Self {
            lines: Arc::new(Mutex::new(stdin.iter().cloned().collect())),
            console,
        }
    }

    fn next_line(&self) -> String {
        let next = self.lines.lock().ok().and_then(|mut lines| lines.pop_front());
        match next {
            Some(line) => {
                self.console.line(&format!("> {}", line));
                line
            }
            None => {
                self.console.line(NO_MORE_INPUT);
                String::new()
            }
        }
    }

    fn next_value(&self) -> Dynamic {
        let line = self.next_line();
        let trimmed = line.trim();
        if let Ok(n) = trimmed.parse::<rhai::INT>() {
            Dynamic::from(n)
        } else if let Ok(x) = trimmed.parse::<rhai::FLOAT>() {
            Dynamic::from(x)
        } else {
            Dynamic::from(line)
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PrimaryEvaluator {
    time_limit: Duration,
}

impl Default for PrimaryEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl PrimaryEvaluator {
    /// Matches the CPU limit the remote judge applies
    pub const TIME_LIMIT: Duration = Duration::from_secs(5);

    pub fn new() -> Self {
        Self {
            time_limit: Self::TIME_LIMIT,
        }
    }

    pub fn with_time_limit(mut self, time_limit: Duration) -> Self {
        self.time_limit = time_limit;
        self
    }

    /// Runs `code` to completion or until `deadline`, whichever is sooner.
    /// Blocks the calling thread.
    pub fn evaluate(&self, code: &str, stdin: &[String], deadline: Instant) -> ExecutionResult {
        let deadline = deadline.min(Instant::now() + self.time_limit);
        let console = ConsoleCapture::default();
        let engine = build_engine(console.clone(), InputQueue::new(stdin, console.clone()), deadline);
        let builder = ReportBuilder::new(Language::Rhai.local_banner(), Language::Rhai);

        let ast = match engine.compile(code) {
            Ok(ast) => ast,
            Err(err) => {
                debug!("Rhai parse error: {}", err);
                let report = builder.compile_output(&err.to_string()).finish();
                return ExecutionResult::new(StatusKind::CompileError, report);
            }
        };

        let outcome = engine.run_ast(&ast);
        let stdout = console.take();
        match outcome {
            Ok(()) => ExecutionResult::new(StatusKind::Success, builder.success(&stdout).finish()),
            Err(err) => {
                let (root, frames) = unwind(&err);
                if matches!(
                    root,
                    EvalAltResult::ErrorTerminated(..) | EvalAltResult::ErrorTooManyOperations(..)
                ) {
                    debug!("Rhai run stopped at the deadline");
                    let report = builder.time_limit(&stdout).finish();
                    return ExecutionResult::new(StatusKind::TimeLimitExceeded, report);
                }
                let mut details = root.to_string();
                for frame in frames {
                    details.push_str("\n  at ");
                    details.push_str(&frame);
                }
                let report = builder.runtime_error(&stdout, &details).finish();
                ExecutionResult::new(StatusKind::RuntimeError, report)
            }
        }
    }
}

fn build_engine(console: ConsoleCapture, input: InputQueue, deadline: Instant) -> Engine {
    let mut engine = Engine::new();

    engine.set_max_call_levels(64);
    engine.set_max_expr_depths(64, 32);
    engine.set_max_string_size(1 << 20);
    engine.set_max_array_size(100_000);
    engine.set_max_map_size(100_000);

    let out = console.clone();
    engine.on_print(move |text| out.line(text));
    let out = console;
    engine.on_debug(move |text, _source, _pos| out.line(text));

    engine.on_progress(move |ops| {
        if ops % PROGRESS_CHECK_INTERVAL == 0 && Instant::now() >= deadline {
            Some(Dynamic::UNIT)
        } else {
            None
        }
    });

    let reader = input.clone();
    engine.register_fn("readline", move || -> String { reader.next_line() });
    engine.register_fn("input", move || -> Dynamic { input.next_value() });

    engine
}

/// Walks nested function-call errors down to the root cause and collects the
/// named frames, innermost first. Closures are left out.
fn unwind(err: &EvalAltResult) -> (&EvalAltResult, Vec<String>) {
    let mut frames = Vec::new();
    let mut current = err;
    while let EvalAltResult::ErrorInFunctionCall(name, _, inner, pos) = current {
        if !name.starts_with("anon$") {
            frames.push(frame_label(name, *pos));
        }
        current = inner.as_ref();
    }
    frames.reverse();
    frames.truncate(MAX_FRAMES);
    (current, frames)
}

fn frame_label(name: &str, pos: Position) -> String {
    match pos.line() {
        Some(line) => format!("{} (line {})", name, line),
        None => name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(code: &str, input: &[&str]) -> ExecutionResult {
        let stdin: Vec<String> = input.iter().map(|s| s.to_string()).collect();
        PrimaryEvaluator::new().evaluate(code, &stdin, Instant::now() + Duration::from_secs(5))
    }

    #[test]
    fn test_print_is_captured() {
        let result = run("print(\"hi\");\nlet x = 40 + 2;\nprint(x);", &[]);
        assert_eq!(result.status, StatusKind::Success);
        assert!(result.report.starts_with("Rhai (embedded interpreter)\nExecuting `rhai` code...\n\n"));
        assert!(result.report.contains("hi\n42\n\nExecution completed successfully.\n"));
    }

    #[test]
    fn test_input_adapters_echo_values() {
        let code = "let name = readline();\nlet n = input();\nprint(name);\nprint(n + 1);";
        let result = run(code, &["Ann", "7"]);
        assert_eq!(result.status, StatusKind::Success);
        assert!(result.report.contains("> Ann\n> 7\nAnn\n8\n"));
    }

    #[test]
    fn test_exhausted_input_degrades() {
        let result = run("let a = readline();\nprint(a.len());", &[]);
        assert_eq!(result.status, StatusKind::Success);
        assert!(result.report.contains("No more input available\n0\n"));
    }

    #[test]
    fn test_parse_error_is_compile_error() {
        let result = run("let x = ;", &[]);
        assert_eq!(result.status, StatusKind::CompileError);
        assert!(result.report.contains("Compilation Error:\n"));
    }

    #[test]
    fn test_runtime_error_lists_named_frames() {
        let code = "fn inner(x) { x / 0 }\nfn outer() { inner(1) }\nprint(\"before\");\nouter();";
        let result = run(code, &[]);
        assert_eq!(result.status, StatusKind::RuntimeError);
        assert!(result.report.contains("Program output before error:\nbefore\n"));
        assert!(result.report.contains("Division by zero"));
        let inner = result.report.find("at inner").unwrap();
        let outer = result.report.find("at outer").unwrap();
        assert!(inner < outer);
    }

    #[test]
    fn test_endless_loop_hits_time_limit() {
        let evaluator = PrimaryEvaluator::new().with_time_limit(Duration::from_millis(50));
        let result = evaluator.evaluate(
            "print(\"start\");\nlet i = 0;\nloop { i += 1; }",
            &[],
            Instant::now() + Duration::from_secs(30),
        );
        assert_eq!(result.status, StatusKind::TimeLimitExceeded);
        assert!(result.report.contains("Program output before the limit:\nstart\n"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_runs_do_not_share_adapters() {
        const CODE: &str = "let a = readline();\nlet b = readline();\nprint(a + b);";
        let spawn = || {
            tokio::task::spawn_blocking(|| {
                let stdin = vec!["Ann".to_string(), "7".to_string()];
                PrimaryEvaluator::new().evaluate(CODE, &stdin, Instant::now() + Duration::from_secs(5))
            })
        };
        let (first, second) = tokio::join!(spawn(), spawn());

        for result in [first.unwrap(), second.unwrap()] {
            assert_eq!(result.status, StatusKind::Success);
            assert!(result.report.contains("> Ann\n> 7\nAnn7\n"));
            assert_eq!(result.report.matches("> Ann").count(), 1);
            assert!(!result.report.contains(NO_MORE_INPUT));
        }
    }
}
