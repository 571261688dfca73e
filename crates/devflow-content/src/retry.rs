use std::time::Duration;

use futures::future::BoxFuture;
use tracing::warn;

use devflow_core::config::RetryConfig;
use devflow_core::content::{ContentPayload, ContentRequest};
use devflow_core::error::{DevflowError, Result};
use devflow_core::traits::ContentService;

/// A content service that retries failed requests with backoff.
///
/// This is the only retry in the system: the engine treats a content
/// fault as fatal for the run, so transient-failure policy lives here
/// at the collaborator boundary.
pub struct RetryingService {
    inner: Box<dyn ContentService>,
    retry_config: RetryConfig,
}

impl RetryingService {
    pub fn new(inner: Box<dyn ContentService>, retry_config: RetryConfig) -> Self {
        Self {
            inner,
            retry_config,
        }
    }
}

fn is_retryable(e: &DevflowError) -> bool {
    match e {
        DevflowError::ContentService(msg) => {
            msg.contains("429")
                || msg.contains("500")
                || msg.contains("502")
                || msg.contains("503")
                || msg.contains("timeout")
                || msg.contains("connection")
        }
        // A malformed reply may parse on a fresh sample
        DevflowError::SchemaMismatch { .. } => true,
        _ => false,
    }
}

fn calculate_backoff(attempt: u32, config: &RetryConfig) -> Duration {
    let ms = (config.initial_backoff_ms * 2u64.pow(attempt)).min(config.max_backoff_ms);
    // Add jitter: 0.8x to 1.2x
    let jitter = 0.8 + rand::random::<f64>() * 0.4;
    Duration::from_millis((ms as f64 * jitter) as u64)
}

impl ContentService for RetryingService {
    fn generate(&self, request: &ContentRequest) -> BoxFuture<'_, Result<ContentPayload>> {
        let request = request.clone();

        Box::pin(async move {
            let max_retries = self.retry_config.max_retries;
            let mut last_err = None;

            for attempt in 0..=max_retries {
                match self.inner.generate(&request).await {
                    Ok(payload) => return Ok(payload),
                    Err(e) => {
                        if is_retryable(&e) && attempt < max_retries {
                            let backoff = calculate_backoff(attempt, &self.retry_config);
                            warn!(
                                template = %request.template,
                                attempt = attempt + 1,
                                max_retries,
                                backoff_ms = backoff.as_millis() as u64,
                                error = %e,
                                "Retrying content request"
                            );
                            tokio::time::sleep(backoff).await;
                            last_err = Some(e);
                            continue;
                        }
                        return Err(e);
                    }
                }
            }

            Err(last_err
                .unwrap_or_else(|| DevflowError::ContentService("retries exhausted".into())))
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use super::*;
    use devflow_core::content::TemplateId;

    struct FlakyService {
        calls: Arc<AtomicU32>,
        fail_first: u32,
    }

    impl ContentService for FlakyService {
        fn generate(&self, _request: &ContentRequest) -> BoxFuture<'_, Result<ContentPayload>> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move {
                if n < self.fail_first {
                    Err(DevflowError::ContentService("HTTP 503: overloaded".into()))
                } else {
                    Ok(ContentPayload::Stories {
                        stories: vec!["s1".into()],
                    })
                }
            })
        }
    }

    fn fast_retry(max_retries: u32) -> RetryConfig {
        RetryConfig {
            max_retries,
            initial_backoff_ms: 1,
            max_backoff_ms: 2,
        }
    }

    #[tokio::test]
    async fn test_retries_transient_then_succeeds() {
        let calls = Arc::new(AtomicU32::new(0));
        let service = RetryingService::new(
            Box::new(FlakyService {
                calls: calls.clone(),
                fail_first: 2,
            }),
            fast_retry(3),
        );

        let request = ContentRequest::new(TemplateId::StoryGeneration).var("requirements", "r");
        let payload = service.generate(&request).await.unwrap();
        assert!(matches!(payload, ContentPayload::Stories { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let calls = Arc::new(AtomicU32::new(0));
        let service = RetryingService::new(
            Box::new(FlakyService {
                calls: calls.clone(),
                fail_first: 10,
            }),
            fast_retry(2),
        );

        let request = ContentRequest::new(TemplateId::StoryGeneration).var("requirements", "r");
        let err = service.generate(&request).await.unwrap_err();
        assert!(matches!(err, DevflowError::ContentService(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_non_retryable() {
        assert!(!is_retryable(&DevflowError::InvalidInput("x".into())));
        assert!(is_retryable(&DevflowError::ContentService(
            "HTTP 429: rate limited".into()
        )));
    }
}
