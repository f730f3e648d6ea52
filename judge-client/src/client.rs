use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use tracing::debug;

use crate::{
    config::JudgeConfig,
    error::Error,
    types::{Submission, SubmissionReceipt, SubmissionReport},
};

const REPORT_FIELDS: &str = "stdout,stderr,compile_output,status,time,memory";

/// Wire operations of a judging service
#[async_trait]
pub trait JudgeApi: Send + Sync {
    /// Submit source code and return the submission token
    async fn submit(&self, submission: &Submission) -> Result<String, Error>;

    /// Fetch the current state of a submission
    async fn fetch(&self, token: &str) -> Result<SubmissionReport, Error>;
}

/// HTTP client for a Judge0-compatible API
pub struct JudgeClient {
    client: Client,
    config: JudgeConfig,
}

impl JudgeClient {
    /// Create a new JudgeClient with the given configuration
    pub fn new(config: JudgeConfig) -> Result<Self, Error> {
        config.validate()?;
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(Error::HttpClient)?;

        Ok(Self { client, config })
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request.header("X-RapidAPI-Key", &self.config.api_key);
        match &self.config.api_host {
            Some(host) => request.header("X-RapidAPI-Host", host),
            None => request,
        }
    }
}

#[async_trait]
impl JudgeApi for JudgeClient {
    async fn submit(&self, submission: &Submission) -> Result<String, Error> {
        let response = self
            .authorize(
                self.client
                    .post(format!("{}/submissions", self.config.api_url))
                    .query(&[("base64_encoded", "false"), ("wait", "false")]),
            )
            .header("Content-Type", "application/json")
            .json(submission)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::Api {
                status_code: response.status().as_u16(),
                message: response.text().await?,
            });
        }

        let receipt = response.json::<SubmissionReceipt>().await?;
        let token = receipt
            .token
            .filter(|t| !t.is_empty())
            .ok_or(Error::MissingToken)?;
        debug!("Submission accepted with token {}", token);
        Ok(token)
    }

    async fn fetch(&self, token: &str) -> Result<SubmissionReport, Error> {
        let response = self
            .authorize(
                self.client
                    .get(format!("{}/submissions/{}", self.config.api_url, token))
                    .query(&[("base64_encoded", "false"), ("fields", REPORT_FIELDS)]),
            )
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::Api {
                status_code: response.status().as_u16(),
                message: response.text().await?,
            });
        }

        response
            .json::<SubmissionReport>()
            .await
            .map_err(Error::HttpClient)
    }
}
