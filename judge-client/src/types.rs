use serde::{Deserialize, Serialize};

/// Resource limits attached to every submission
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SubmissionLimits {
    /// CPU time limit (seconds)
    pub cpu_time_limit: f64,
    /// Grace period on top of the CPU limit (seconds)
    pub cpu_extra_time: f64,
    /// Wall clock limit (seconds)
    pub wall_time_limit: f64,
    /// Memory limit (kilobytes)
    pub memory_limit: u64,
    /// Stack limit (kilobytes)
    pub stack_limit: u64,
    pub enable_network: bool,
}

impl Default for SubmissionLimits {
    fn default() -> Self {
        Self {
            cpu_time_limit: 5.0,
            cpu_extra_time: 1.0,
            wall_time_limit: 10.0,
            memory_limit: 256 * 1024, // 256MB
            stack_limit: 64 * 1024,   // 64MB
            enable_network: false,
        }
    }
}

/// Body of `POST /submissions`
#[derive(Debug, Clone, Serialize)]
pub struct Submission {
    pub source_code: String,
    pub language_id: u32,
    pub stdin: String,
    #[serde(flatten)]
    pub limits: SubmissionLimits,
}

impl Submission {
    pub fn new(source_code: impl Into<String>, language_id: u32, stdin: impl Into<String>) -> Self {
        Self {
            source_code: source_code.into(),
            language_id,
            stdin: stdin.into(),
            limits: SubmissionLimits::default(),
        }
    }
}

/// Response of `POST /submissions`
#[derive(Debug, Clone, Deserialize)]
pub struct SubmissionReceipt {
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionStatus {
    pub id: u32,
    #[serde(default)]
    pub description: String,
}

/// Response of `GET /submissions/{token}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionReport {
    pub status: SubmissionStatus,
    #[serde(default)]
    pub stdout: Option<String>,
    #[serde(default)]
    pub stderr: Option<String>,
    #[serde(default)]
    pub compile_output: Option<String>,
    /// CPU time in seconds, reported as a decimal string
    #[serde(default)]
    pub time: Option<String>,
    /// Peak memory in kilobytes
    #[serde(default)]
    pub memory: Option<u64>,
}

impl SubmissionReport {
    /// Queued (1) and processing (2) are the only non-terminal states.
    pub fn is_terminal(&self) -> bool {
        !matches!(self.status.id, 1 | 2)
    }

    pub fn classify(&self) -> VerdictKind {
        match self.status.id {
            3 | 4 => VerdictKind::Accepted,
            5 => VerdictKind::TimeLimitExceeded,
            6 => VerdictKind::CompilationError,
            11 => VerdictKind::NonZeroExit,
            7..=10 | 12 => VerdictKind::RuntimeError,
            _ => VerdictKind::Unknown(self.status.description.clone()),
        }
    }

    pub fn time_ms(&self) -> Option<u64> {
        self.time
            .as_deref()
            .and_then(|t| t.trim().parse::<f64>().ok())
            .map(|secs| (secs * 1000.0).round() as u64)
    }
}

/// Classified terminal verdict
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerdictKind {
    Accepted,
    CompilationError,
    TimeLimitExceeded,
    RuntimeError,
    /// Runtime error reported as an abnormal (non-zero) exit
    NonZeroExit,
    Unknown(String),
}

/// Terminal outcome of one judging session
#[derive(Debug, Clone, PartialEq)]
pub enum JudgeOutcome {
    Finished {
        kind: VerdictKind,
        report: SubmissionReport,
    },
    /// The judge could not be reached or returned nothing usable
    Transport(String),
    /// The poll budget or the caller's deadline ran out
    TimedOut,
}
