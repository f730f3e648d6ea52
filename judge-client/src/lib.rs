//! # Judge Client
//!
//! Client for Judge0-compatible remote judging services.
//!
//! The protocol is submit-then-poll: a submission returns an opaque token,
//! and the verdict is fetched with exponential backoff until it leaves the
//! queued/processing states or the poll budget runs out.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use judge_client::{JudgeClient, JudgeConfig, JudgeSession, Submission};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = JudgeConfig::new(
//!         "https://judge0-ce.p.rapidapi.com".to_string(),
//!         "your-api-key".to_string(),
//!     );
//!     let session = JudgeSession::new(Arc::new(JudgeClient::new(config)?));
//!
//!     let deadline = tokio::time::Instant::now() + Duration::from_secs(30);
//!     let outcome = session
//!         .run(&Submission::new("print('hi')", 71, ""), deadline)
//!         .await;
//!
//!     println!("{:?}", outcome);
//!     Ok(())
//! }
//! ```

mod client;
mod config;
mod error;
mod session;
mod types;

pub use client::{JudgeApi, JudgeClient};
pub use config::JudgeConfig;
pub use error::Error;
pub use session::{poll_delay, JudgeSession, MAX_POLL_ATTEMPTS};
pub use types::{
    JudgeOutcome, Submission, SubmissionLimits, SubmissionReceipt, SubmissionReport,
    SubmissionStatus, VerdictKind,
};
