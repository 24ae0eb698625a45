//! Mock publisher for testing
//!
//! Simulates each classified publish outcome without network access, and
//! records calls and content for verification in integration tests.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;

use crate::error::{PublishError, Result};
use crate::publisher::Publisher;

/// Outcome the mock produces once any scripted initial failures are spent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockBehavior {
    Success,
    DuplicateRejected,
    RateLimited,
    Transient,
}

#[derive(Debug, Clone)]
pub struct MockConfig {
    pub name: String,
    pub behavior: MockBehavior,
    /// Error detail for failure behaviors
    pub error: Option<String>,
    /// Number of leading calls that fail transiently before `behavior`
    /// applies (exercises retry loops)
    pub fail_first: u32,
    /// Simulated network latency
    pub delay: Duration,
    pub publish_call_count: Arc<Mutex<u32>>,
    pub published_content: Arc<Mutex<Vec<String>>>,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            name: "mock".to_string(),
            behavior: MockBehavior::Success,
            error: None,
            fail_first: 0,
            delay: Duration::from_millis(0),
            publish_call_count: Arc::new(Mutex::new(0)),
            published_content: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

pub struct MockPublisher {
    config: MockConfig,
}

impl MockPublisher {
    pub fn new(config: MockConfig) -> Self {
        Self { config }
    }

    /// Mock that always publishes successfully
    pub fn success(name: &str) -> Self {
        Self::new(MockConfig {
            name: name.to_string(),
            ..Default::default()
        })
    }

    /// Mock that always reports the content as a remote duplicate
    pub fn duplicate(name: &str) -> Self {
        Self::new(MockConfig {
            name: name.to_string(),
            behavior: MockBehavior::DuplicateRejected,
            ..Default::default()
        })
    }

    /// Mock that always reports a rate limit
    pub fn rate_limited(name: &str) -> Self {
        Self::new(MockConfig {
            name: name.to_string(),
            behavior: MockBehavior::RateLimited,
            ..Default::default()
        })
    }

    /// Mock that always fails transiently
    pub fn failing(name: &str) -> Self {
        Self::new(MockConfig {
            name: name.to_string(),
            behavior: MockBehavior::Transient,
            ..Default::default()
        })
    }

    /// Mock that fails transiently `fail_first` times, then succeeds
    pub fn failing_then_success(name: &str, fail_first: u32) -> Self {
        Self::new(MockConfig {
            name: name.to_string(),
            fail_first,
            ..Default::default()
        })
    }

    pub fn publish_call_count(&self) -> u32 {
        *self.config.publish_call_count.lock().unwrap()
    }

    /// All content that was successfully published
    pub fn published_content(&self) -> Vec<String> {
        self.config.published_content.lock().unwrap().clone()
    }
}

#[async_trait]
impl Publisher for MockPublisher {
    async fn publish(&self, text: &str) -> Result<String> {
        let call = {
            let mut count = self.config.publish_call_count.lock().unwrap();
            *count += 1;
            *count
        };

        if !self.config.delay.is_zero() {
            sleep(self.config.delay).await;
        }

        if call <= self.config.fail_first {
            return Err(
                PublishError::Transient(format!("scripted failure {}", call)).into(),
            );
        }

        let detail = |fallback: &str| {
            self.config
                .error
                .clone()
                .unwrap_or_else(|| fallback.to_string())
        };

        match self.config.behavior {
            MockBehavior::Success => {
                self.config
                    .published_content
                    .lock()
                    .unwrap()
                    .push(text.to_string());
                Ok(format!("{}:mock-{}", self.config.name, uuid::Uuid::new_v4()))
            }
            MockBehavior::DuplicateRejected => {
                Err(PublishError::DuplicateRejected(detail("mock duplicate")).into())
            }
            MockBehavior::RateLimited => {
                Err(PublishError::RateLimited(detail("mock rate limit")).into())
            }
            MockBehavior::Transient => {
                Err(PublishError::Transient(detail("mock failure")).into())
            }
        }
    }

    fn name(&self) -> &str {
        &self.config.name
    }
}
