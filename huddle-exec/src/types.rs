use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Supported programming languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// Primary language, interpreted in-process
    Rhai,
    Python,
    Java,
    Cpp,
    CSharp,
}

impl Language {
    pub const ALL: [Language; 5] = [
        Language::Rhai,
        Language::Python,
        Language::Java,
        Language::Cpp,
        Language::CSharp,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Rhai => "rhai",
            Language::Python => "python",
            Language::Java => "java",
            Language::Cpp => "cpp",
            Language::CSharp => "csharp",
        }
    }

    pub fn is_primary(&self) -> bool {
        matches!(self, Language::Rhai)
    }

    /// Judge0 language id, `None` when the remote judge cannot run it
    pub fn judge_language_id(&self) -> Option<u32> {
        match self {
            Language::Rhai => None,
            Language::Python => Some(71),
            Language::Java => Some(62),
            Language::Cpp => Some(54),
            Language::CSharp => Some(51),
        }
    }

    /// Toolchain identity of the remote judge runtime
    pub fn judge_banner(&self) -> &'static str {
        match self {
            Language::Rhai => "Rhai (embedded interpreter)",
            Language::Python => "Python (3.8.1)",
            Language::Java => "Java (OpenJDK 13.0.1)",
            Language::Cpp => "C++ (GCC 9.2.0)",
            Language::CSharp => "C# (Mono 6.6.0.161)",
        }
    }

    /// Identity line of the local engine
    pub fn local_banner(&self) -> &'static str {
        match self {
            Language::Rhai => "Rhai (embedded interpreter)",
            Language::Python => "Python 3 (simulated)",
            Language::Java => "Java (simulated)",
            Language::Cpp => "C++ (simulated)",
            Language::CSharp => "C# (simulated)",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rhai" => Ok(Language::Rhai),
            "python" | "py" => Ok(Language::Python),
            "java" => Ok(Language::Java),
            "cpp" | "c++" => Ok(Language::Cpp),
            "csharp" | "c#" | "cs" => Ok(Language::CSharp),
            other => Err(Error::UnsupportedLanguage(other.to_string())),
        }
    }
}

/// Identifier of the room a run belongs to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationKey(String);

impl CorrelationKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CorrelationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Code execution request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionRequest {
    /// Programming language
    pub language: Language,
    /// Source code to execute
    pub code: String,
    /// Input lines, consumed in order
    #[serde(default)]
    pub stdin: Vec<String>,
    /// Room that receives the report
    pub correlation_key: CorrelationKey,
}

impl ExecutionRequest {
    pub fn new(language: Language, code: impl Into<String>, key: CorrelationKey) -> Self {
        Self {
            language,
            code: code.into(),
            stdin: Vec::new(),
            correlation_key: key,
        }
    }

    /// Splits free-form input text into lines, dropping blank ones.
    pub fn with_raw_input(self, input: &str) -> Self {
        self.with_stdin(input.lines().filter(|line| !line.trim().is_empty()))
    }

    pub fn with_stdin<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stdin = lines.into_iter().map(Into::into).collect();
        self
    }

    /// Input lines joined back into a stdin stream
    pub fn stdin_text(&self) -> String {
        self.stdin.join("\n")
    }
}

/// Terminal classification of one run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    Success,
    CompileError,
    RuntimeError,
    TimeLimitExceeded,
    TransportError,
    Timeout,
}

impl StatusKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusKind::Success => "success",
            StatusKind::CompileError => "compile_error",
            StatusKind::RuntimeError => "runtime_error",
            StatusKind::TimeLimitExceeded => "time_limit_exceeded",
            StatusKind::TransportError => "transport_error",
            StatusKind::Timeout => "timeout",
        }
    }
}

impl fmt::Display for StatusKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Execution result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Execution status
    pub status: StatusKind,
    /// Formatted report shown to the room
    pub report: String,
    #[serde(default)]
    pub timing_ms: Option<u64>,
    #[serde(default)]
    pub memory_kb: Option<u64>,
}

impl ExecutionResult {
    pub fn new(status: StatusKind, report: impl Into<String>) -> Self {
        Self {
            status,
            report: report.into(),
            timing_ms: None,
            memory_kb: None,
        }
    }
}
