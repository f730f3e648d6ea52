use async_trait::async_trait;
use judge_client::{Error, JudgeApi, Submission, SubmissionReport, SubmissionStatus};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::service::ReportSink;
use crate::types::{CorrelationKey, ExecutionRequest, ExecutionResult, Language};

pub const ROOM: &str = "room-1";

pub fn request(language: Language, code: &str, input: &str) -> ExecutionRequest {
    ExecutionRequest::new(language, code, CorrelationKey::new(ROOM)).with_raw_input(input)
}

pub fn accepted(stdout: &str) -> SubmissionReport {
    SubmissionReport {
        status: SubmissionStatus {
            id: 3,
            description: "Accepted".to_string(),
        },
        stdout: Some(stdout.to_string()),
        stderr: None,
        compile_output: None,
        time: Some("0.010".to_string()),
        memory: Some(1024),
    }
}

/// Judge that answers every poll with the same report and counts calls
pub struct CountingJudge {
    calls: AtomicUsize,
    report: SubmissionReport,
}

impl CountingJudge {
    pub fn new(report: SubmissionReport) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            report,
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl JudgeApi for CountingJudge {
    async fn submit(&self, _submission: &Submission) -> Result<String, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok("token".to_string())
    }

    async fn fetch(&self, _token: &str) -> Result<SubmissionReport, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.report.clone())
    }
}

/// Judge whose submissions never complete
pub struct HangingJudge;

#[async_trait]
impl JudgeApi for HangingJudge {
    async fn submit(&self, _submission: &Submission) -> Result<String, Error> {
        std::future::pending().await
    }

    async fn fetch(&self, _token: &str) -> Result<SubmissionReport, Error> {
        std::future::pending().await
    }
}

/// Sink that keeps every published report
pub struct RecordingSink {
    published: Mutex<Vec<(CorrelationKey, ExecutionResult)>>,
    fail: bool,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            published: Mutex::new(Vec::new()),
            fail: false,
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            published: Mutex::new(Vec::new()),
            fail: true,
        })
    }

    pub fn published(&self) -> Vec<(CorrelationKey, ExecutionResult)> {
        self.published.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReportSink for RecordingSink {
    async fn publish(
        &self,
        key: &CorrelationKey,
        result: &ExecutionResult,
    ) -> Result<(), crate::Error> {
        if self.fail {
            return Err(crate::Error::Delivery("room closed".to_string()));
        }
        self.published
            .lock()
            .unwrap()
            .push((key.clone(), result.clone()));
        Ok(())
    }
}
