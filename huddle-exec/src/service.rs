use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

use crate::{
    error::Error,
    router::ExecutionRouter,
    types::{CorrelationKey, ExecutionRequest, ExecutionResult},
};

/// Destination of finished reports, keyed by room
#[async_trait]
pub trait ReportSink: Send + Sync {
    async fn publish(&self, key: &CorrelationKey, result: &ExecutionResult) -> Result<(), Error>;
}

#[derive(Clone)]
pub struct ExecutionService {
    router: Arc<ExecutionRouter>,
    sink: Arc<dyn ReportSink>,
    semaphore: Arc<Semaphore>,
}

impl ExecutionService {
    pub fn new(
        router: ExecutionRouter,
        sink: Arc<dyn ReportSink>,
        max_concurrent_runs: usize,
    ) -> Self {
        Self {
            router: Arc::new(router),
            sink,
            semaphore: Arc::new(Semaphore::new(max_concurrent_runs)),
        }
    }

    /// Runs the request and publishes its report to the request's room.
    /// The report is published exactly once, after the run is terminal.
    pub async fn run_and_broadcast(
        &self,
        request: ExecutionRequest,
    ) -> Result<ExecutionResult, Error> {
        let run_id = Uuid::new_v4();
        let span = info_span!(
            "run",
            %run_id,
            room = %request.correlation_key,
            language = %request.language
        );

        async move {
            let _permit = self
                .semaphore
                .acquire()
                .await
                .map_err(|e| Error::System(format!("Failed to acquire execution permit: {}", e)))?;

            info!("Starting run");
            let result = self.router.execute(&request).await;
            info!(status = %result.status, "Run finished");

            if let Err(e) = self.sink.publish(&request.correlation_key, &result).await {
                error!("Report delivery failed: {}", e);
                return Err(e);
            }
            Ok(result)
        }
        .instrument(span)
        .await
    }

    pub fn available_slots(&self) -> usize {
        self.semaphore.available_permits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::utils::{request, RecordingSink, ROOM};
    use crate::types::{Language, StatusKind};

    #[tokio::test]
    async fn test_report_published_once_to_room() -> Result<(), Error> {
        let sink = RecordingSink::new();
        let service = ExecutionService::new(ExecutionRouter::local(), sink.clone(), 2);

        let result = service
            .run_and_broadcast(request(Language::Python, "print(\"age:\", 30)", ""))
            .await?;

        assert_eq!(result.status, StatusKind::Success);
        let published = sink.published();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].0.as_str(), ROOM);
        assert_eq!(published[0].1, result);
        assert_eq!(service.available_slots(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_delivery_failure_is_reported() {
        let sink = RecordingSink::failing();
        let service = ExecutionService::new(ExecutionRouter::local(), sink, 1);

        let outcome = service
            .run_and_broadcast(request(Language::Java, "int x = 1;", ""))
            .await;

        assert!(matches!(outcome, Err(Error::Delivery(_))));
    }
}
