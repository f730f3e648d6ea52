//! Report formatting shared by the remote and local execution paths.
//!
//! Every report has the same shape: a toolchain banner, the
//! ``Executing `<language>` code...`` marker, an optional compilation section,
//! the outcome section and an optional timing footer.

use judge_client::{JudgeOutcome, SubmissionReport, VerdictKind};

use crate::types::{ExecutionResult, Language, StatusKind};

pub const NO_OUTPUT: &str = "(No output)";
pub const SUCCESS_MARKER: &str = "Execution completed successfully.";
pub const EMPTY_CODE: &str = "No code to execute. Write some code in the editor and press Run.";

const TIME_LIMIT_MESSAGE: &str =
    "Time Limit Exceeded: the program ran longer than the allowed 5 seconds.";
const TIMEOUT_MESSAGE: &str = "Execution timed out. The code may contain an infinite loop, \
or the execution service is busy. Please try again.";

const RUNTIME_HINTS: &[&str] = &[
    "IndexError: make sure list indices stay within the list length",
    "KeyError: check that a dictionary key exists before reading it",
    "ZeroDivisionError: guard divisions against a zero divisor",
    "EOFError: provide one input line for every input() call",
];

/// Builds a report section by section
#[derive(Debug)]
pub struct ReportBuilder {
    out: String,
}

impl ReportBuilder {
    pub fn new(banner: &str, language: Language) -> Self {
        Self {
            out: format!("{}\nExecuting `{}` code...\n\n", banner, language),
        }
    }

    /// Emits the compilation section when `text` is non-empty
    pub fn compile_output(mut self, text: &str) -> Self {
        if !text.trim().is_empty() {
            self.out.push_str("Compilation Error:\n");
            self.push_block(text);
        }
        self
    }

    pub fn success(mut self, stdout: &str) -> Self {
        if stdout.is_empty() {
            self.push_block(NO_OUTPUT);
        } else {
            self.push_block(stdout);
        }
        self.out.push('\n');
        self.out.push_str(SUCCESS_MARKER);
        self.out.push('\n');
        self
    }

    pub fn time_limit(mut self, stdout: &str) -> Self {
        if !stdout.is_empty() {
            self.out.push_str("Program output before the limit:\n");
            self.push_block(stdout);
            self.out.push('\n');
        }
        self.push_block(TIME_LIMIT_MESSAGE);
        self
    }

    pub fn runtime_error(mut self, stdout: &str, stderr: &str) -> Self {
        if !stdout.is_empty() {
            self.out.push_str("Program output before error:\n");
            self.push_block(stdout);
            self.out.push('\n');
        }
        self.out.push_str("Runtime Error:\n");
        if stderr.trim().is_empty() {
            self.push_block("(no error details)");
        } else {
            self.push_block(stderr);
        }
        self
    }

    pub fn hints(mut self) -> Self {
        self.out.push_str("\nHints:\n");
        for hint in RUNTIME_HINTS {
            self.out.push_str("  - ");
            self.out.push_str(hint);
            self.out.push('\n');
        }
        self
    }

    pub fn status(mut self, description: &str, stderr: &str) -> Self {
        self.out.push_str("Status: ");
        self.push_block(description);
        if !stderr.trim().is_empty() {
            self.push_block(stderr);
        }
        self
    }

    pub fn message(mut self, text: &str) -> Self {
        self.push_block(text);
        self
    }

    /// Emits the timing footer when either value is known
    pub fn footer(mut self, time_secs: Option<&str>, memory_kb: Option<u64>) -> Self {
        let mut parts = Vec::new();
        if let Some(time) = time_secs {
            parts.push(format!("Time: {} s", time.trim()));
        }
        if let Some(memory) = memory_kb {
            parts.push(format!("Memory: {} KB", memory));
        }
        if !parts.is_empty() {
            self.out.push('\n');
            self.out.push_str(&parts.join(" | "));
            self.out.push('\n');
        }
        self
    }

    pub fn finish(self) -> String {
        self.out
    }

    fn push_block(&mut self, text: &str) {
        self.out.push_str(text);
        if !text.ends_with('\n') {
            self.out.push('\n');
        }
    }
}

pub fn empty_code() -> ExecutionResult {
    ExecutionResult::new(StatusKind::Success, format!("{}\n", EMPTY_CODE))
}

pub fn timed_out(language: Language, banner: &str) -> ExecutionResult {
    let report = ReportBuilder::new(banner, language)
        .message(TIMEOUT_MESSAGE)
        .finish();
    ExecutionResult::new(StatusKind::Timeout, report)
}

pub fn transport_error(language: Language, detail: &str) -> ExecutionResult {
    let report = ReportBuilder::new(language.judge_banner(), language)
        .message(&format!("Execution service unavailable: {}", detail))
        .message("Please try again in a moment.")
        .finish();
    ExecutionResult::new(StatusKind::TransportError, report)
}

/// Turns a judging session outcome into the room report
pub fn format_outcome(language: Language, outcome: &JudgeOutcome) -> ExecutionResult {
    match outcome {
        JudgeOutcome::Finished { kind, report } => format_verdict(language, kind, report),
        JudgeOutcome::Transport(detail) => transport_error(language, detail),
        JudgeOutcome::TimedOut => timed_out(language, language.judge_banner()),
    }
}

fn format_verdict(
    language: Language,
    kind: &VerdictKind,
    verdict: &SubmissionReport,
) -> ExecutionResult {
    let stdout = verdict.stdout.as_deref().unwrap_or_default();
    let stderr = verdict.stderr.as_deref().unwrap_or_default();
    let compile_output = verdict.compile_output.as_deref().unwrap_or_default();

    let builder =
        ReportBuilder::new(language.judge_banner(), language).compile_output(compile_output);

    let (status, builder) = match kind {
        VerdictKind::Accepted => (StatusKind::Success, builder.success(stdout)),
        VerdictKind::CompilationError if compile_output.trim().is_empty() => (
            StatusKind::CompileError,
            builder.status(&verdict.status.description, stderr),
        ),
        VerdictKind::CompilationError => (StatusKind::CompileError, builder),
        VerdictKind::TimeLimitExceeded => {
            (StatusKind::TimeLimitExceeded, builder.time_limit(stdout))
        }
        VerdictKind::RuntimeError => (
            StatusKind::RuntimeError,
            builder.runtime_error(stdout, stderr),
        ),
        VerdictKind::NonZeroExit => {
            let builder = builder.runtime_error(stdout, stderr);
            let builder = if language == Language::Python {
                builder.hints()
            } else {
                builder
            };
            (StatusKind::RuntimeError, builder)
        }
        VerdictKind::Unknown(description) => {
            (StatusKind::RuntimeError, builder.status(description, stderr))
        }
    };

    let report = builder
        .footer(verdict.time.as_deref(), verdict.memory)
        .finish();

    ExecutionResult {
        status,
        report,
        timing_ms: verdict.time_ms(),
        memory_kb: verdict.memory,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use judge_client::SubmissionStatus;

    fn verdict(id: u32, stdout: Option<&str>, stderr: Option<&str>) -> SubmissionReport {
        SubmissionReport {
            status: SubmissionStatus {
                id,
                description: "desc".to_string(),
            },
            stdout: stdout.map(str::to_string),
            stderr: stderr.map(str::to_string),
            compile_output: None,
            time: Some("0.05".to_string()),
            memory: Some(1024),
        }
    }

    fn finished(report: SubmissionReport) -> JudgeOutcome {
        JudgeOutcome::Finished {
            kind: report.classify(),
            report,
        }
    }

    #[test]
    fn test_success_report_shape() {
        let result = format_outcome(Language::Python, &finished(verdict(3, Some("hi\n"), None)));

        assert_eq!(result.status, StatusKind::Success);
        assert_eq!(
            result.report,
            "Python (3.8.1)\nExecuting `python` code...\n\nhi\n\n\
             Execution completed successfully.\n\nTime: 0.05 s | Memory: 1024 KB\n"
        );
        assert_eq!(result.timing_ms, Some(50));
        assert_eq!(result.memory_kb, Some(1024));
    }

    #[test]
    fn test_empty_stdout_placeholder() {
        let result = format_outcome(Language::Java, &finished(verdict(3, None, None)));
        assert!(result.report.contains("\n(No output)\n"));
    }

    #[test]
    fn test_compile_error_section() {
        let mut report = verdict(6, None, None);
        report.compile_output = Some("Main.java:3: error: ';' expected".to_string());
        let result = format_outcome(Language::Java, &finished(report));

        assert_eq!(result.status, StatusKind::CompileError);
        assert!(result
            .report
            .contains("Compilation Error:\nMain.java:3: error: ';' expected\n"));
        assert!(!result.report.contains(SUCCESS_MARKER));
    }

    #[test]
    fn test_compile_error_without_compiler_text() {
        let mut report = verdict(6, None, Some("g++ crashed"));
        report.status.description = "Compilation Error".to_string();
        let result = format_outcome(Language::Cpp, &finished(report));

        assert_eq!(result.status, StatusKind::CompileError);
        assert!(result
            .report
            .contains("code...\n\nStatus: Compilation Error\ng++ crashed\n"));
    }

    #[test]
    fn test_runtime_error_with_partial_output() {
        let result = format_outcome(
            Language::Cpp,
            &finished(verdict(7, Some("step 1\n"), Some("Segmentation fault"))),
        );

        assert_eq!(result.status, StatusKind::RuntimeError);
        let before = result.report.find("Program output before error:").unwrap();
        let error = result.report.find("Runtime Error:").unwrap();
        assert!(before < error);
        assert!(!result.report.contains("Hints:"));
    }

    #[test]
    fn test_python_nonzero_exit_hints() {
        let result = format_outcome(
            Language::Python,
            &finished(verdict(11, None, Some("ZeroDivisionError: division by zero"))),
        );

        assert!(result.report.contains("Hints:\n"));
        assert!(result.report.contains("ZeroDivisionError: guard divisions"));
        assert!(!result.report.contains("Program output before error:"));
    }

    #[test]
    fn test_time_limit_message() {
        let result = format_outcome(Language::CSharp, &finished(verdict(5, None, None)));
        assert_eq!(result.status, StatusKind::TimeLimitExceeded);
        assert!(result.report.contains(TIME_LIMIT_MESSAGE));
    }

    #[test]
    fn test_unknown_status_passthrough() {
        let mut report = verdict(13, None, Some("boom"));
        report.status.description = "Internal Error".to_string();
        let result = format_outcome(Language::Python, &finished(report));
        assert!(result.report.contains("Status: Internal Error\nboom\n"));
    }

    #[test]
    fn test_transport_and_timeout_reports() {
        let transport =
            format_outcome(Language::Java, &JudgeOutcome::Transport("refused".to_string()));
        assert_eq!(transport.status, StatusKind::TransportError);
        assert!(transport.report.contains("Execution service unavailable: refused"));

        let timeout = format_outcome(Language::Java, &JudgeOutcome::TimedOut);
        assert_eq!(timeout.status, StatusKind::Timeout);
        assert!(timeout.report.contains("infinite loop"));
    }
}
