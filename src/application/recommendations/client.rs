//! Recommendation client
//!
//! Wraps a [`TextGenerator`] with a timeout, one retry on transient
//! failure, a result cache and the rule-based fallback. `recommend` never
//! fails: any generator problem degrades to the fallback list.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::cache::RecommendationCache;
use super::generator::{ServiceUnavailable, TextGenerator};
use super::parser::parse_recommendations;
use super::prompt::Prompt;
use crate::domain::DomainError;
use crate::shared::{retry_with_backoff, RetryConfig};

/// At most one retry after the first attempt.
const MAX_RETRIES: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationSource {
    Ai,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendationOutcome {
    pub recommendations: Vec<String>,
    pub source: RecommendationSource,
    /// Model that produced the items; absent for fallbacks.
    pub model: Option<String>,
    pub cached: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub degraded_reason: Option<String>,
}

impl RecommendationOutcome {
    fn fallback(recommendations: Vec<String>, reason: String) -> Self {
        Self {
            recommendations,
            source: RecommendationSource::Fallback,
            model: None,
            cached: false,
            degraded_reason: Some(reason),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.source == RecommendationSource::Fallback
    }
}

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub model: String,
    pub timeout: Duration,
    pub max_retries: u32,
    pub retry_delay: Duration,
    pub cache_ttl: Duration,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            timeout: Duration::from_secs(10),
            max_retries: MAX_RETRIES,
            retry_delay: Duration::from_millis(250),
            cache_ttl: Duration::from_secs(300),
        }
    }
}

pub struct RecommendationClient {
    generator: Arc<dyn TextGenerator>,
    model: String,
    timeout: Duration,
    retry: RetryConfig,
    cache: RecommendationCache,
}

impl RecommendationClient {
    pub fn new(generator: Arc<dyn TextGenerator>, settings: ClientSettings) -> Self {
        Self {
            generator,
            model: settings.model,
            timeout: settings.timeout,
            retry: RetryConfig::with_retries(settings.max_retries.min(MAX_RETRIES))
                .with_initial_delay(settings.retry_delay),
            cache: RecommendationCache::new(settings.cache_ttl),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.generator.is_configured()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn cache_enabled(&self) -> bool {
        self.cache.is_enabled()
    }

    /// Ask the generator, falling back to `fallback()` when it is
    /// unconfigured, fails, or returns nothing usable.
    pub async fn recommend<F>(&self, scope: &str, prompt: &Prompt, fallback: F) -> RecommendationOutcome
    where
        F: FnOnce() -> Vec<String>,
    {
        if !self.generator.is_configured() {
            debug!(scope, kind = prompt.kind.as_str(), "Generator not configured, using fallback");
            return RecommendationOutcome::fallback(
                fallback(),
                ServiceUnavailable::NotConfigured.to_string(),
            );
        }

        let key = RecommendationCache::key(scope, prompt);
        if let Some(recommendations) = self.cache.get(&key) {
            debug!(scope, kind = prompt.kind.as_str(), "Recommendation cache hit");
            return RecommendationOutcome {
                recommendations,
                source: RecommendationSource::Ai,
                model: Some(self.model.clone()),
                cached: true,
                degraded_reason: None,
            };
        }

        match self.generate(prompt).await {
            Ok(recommendations) => {
                info!(
                    scope,
                    kind = prompt.kind.as_str(),
                    count = recommendations.len(),
                    "Generated recommendations"
                );
                self.cache.insert(key, recommendations.clone());
                RecommendationOutcome {
                    recommendations,
                    source: RecommendationSource::Ai,
                    model: Some(self.model.clone()),
                    cached: false,
                    degraded_reason: None,
                }
            }
            Err(e) => {
                let err = DomainError::from(e);
                warn!(scope, kind = prompt.kind.as_str(), error = %err, "Falling back to rule-based recommendations");
                RecommendationOutcome::fallback(fallback(), err.to_string())
            }
        }
    }

    async fn generate(&self, prompt: &Prompt) -> Result<Vec<String>, ServiceUnavailable> {
        let timeout = self.timeout;
        let text = retry_with_backoff(
            self.retry.clone(),
            || async move {
                match tokio::time::timeout(timeout, self.generator.generate(prompt, &self.model)).await
                {
                    Ok(result) => result,
                    Err(_) => Err(ServiceUnavailable::Timeout(timeout)),
                }
            },
            ServiceUnavailable::is_transient,
            "generate_recommendations",
        )
        .await?;

        let items = parse_recommendations(&text);
        if items.is_empty() {
            return Err(ServiceUnavailable::Malformed(
                "reply contained no recommendations".to_string(),
            ));
        }
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::recommendations::prompt::PromptKind;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Replays canned replies in order.
    struct Scripted {
        replies: Mutex<VecDeque<Result<String, ServiceUnavailable>>>,
        calls: AtomicUsize,
    }

    impl Scripted {
        fn new(replies: Vec<Result<String, ServiceUnavailable>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TextGenerator for Scripted {
        fn is_configured(&self) -> bool {
            true
        }

        async fn generate(&self, _: &Prompt, _: &str) -> Result<String, ServiceUnavailable> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ServiceUnavailable::Network("script exhausted".into())))
        }
    }

    struct Unconfigured;

    #[async_trait]
    impl TextGenerator for Unconfigured {
        fn is_configured(&self) -> bool {
            false
        }

        async fn generate(&self, _: &Prompt, _: &str) -> Result<String, ServiceUnavailable> {
            panic!("unconfigured generator must not be called");
        }
    }

    struct Slow;

    #[async_trait]
    impl TextGenerator for Slow {
        fn is_configured(&self) -> bool {
            true
        }

        async fn generate(&self, _: &Prompt, _: &str) -> Result<String, ServiceUnavailable> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok("1. Too late".into())
        }
    }

    fn settings() -> ClientSettings {
        ClientSettings {
            timeout: Duration::from_millis(50),
            retry_delay: Duration::from_millis(1),
            ..ClientSettings::default()
        }
    }

    fn prompt() -> Prompt {
        Prompt {
            kind: PromptKind::Recommendations,
            system: "s".into(),
            user: "u".into(),
            temperature: 0.7,
            max_tokens: 100,
        }
    }

    fn fallback() -> Vec<String> {
        vec!["Turn things off".to_string()]
    }

    #[tokio::test]
    async fn parses_generated_list() {
        let gen = Scripted::new(vec![Ok("1. Lower the thermostat\n2. Use LEDs".into())]);
        let client = RecommendationClient::new(gen.clone(), settings());

        let out = client.recommend("user:1", &prompt(), fallback).await;
        assert_eq!(out.source, RecommendationSource::Ai);
        assert_eq!(out.recommendations, vec!["Lower the thermostat", "Use LEDs"]);
        assert_eq!(out.model.as_deref(), Some("gpt-4o-mini"));
        assert!(out.degraded_reason.is_none());
    }

    #[tokio::test]
    async fn unconfigured_uses_fallback_without_calling() {
        let client = RecommendationClient::new(Arc::new(Unconfigured), settings());
        let out = client.recommend("user:1", &prompt(), fallback).await;
        assert!(out.is_degraded());
        assert_eq!(out.recommendations, fallback());
        assert!(out.degraded_reason.unwrap().contains("not configured"));
    }

    #[tokio::test]
    async fn retries_once_on_transient_error() {
        let gen = Scripted::new(vec![
            Err(ServiceUnavailable::Status { status: 503, body: "busy".into() }),
            Ok("- Seal drafts".into()),
        ]);
        let client = RecommendationClient::new(gen.clone(), settings());

        let out = client.recommend("user:1", &prompt(), fallback).await;
        assert_eq!(gen.calls(), 2);
        assert_eq!(out.recommendations, vec!["Seal drafts"]);
    }

    #[tokio::test]
    async fn gives_up_after_one_retry() {
        let gen = Scripted::new(vec![
            Err(ServiceUnavailable::Network("reset".into())),
            Err(ServiceUnavailable::Network("reset".into())),
            Ok("1. never reached".into()),
        ]);
        let client = RecommendationClient::new(gen.clone(), settings());

        let out = client.recommend("user:1", &prompt(), fallback).await;
        assert_eq!(gen.calls(), 2);
        assert!(out.is_degraded());
    }

    #[tokio::test]
    async fn permanent_errors_are_not_retried() {
        let gen = Scripted::new(vec![Err(ServiceUnavailable::Status {
            status: 401,
            body: "bad key".into(),
        })]);
        let client = RecommendationClient::new(gen.clone(), settings());

        let out = client.recommend("user:1", &prompt(), fallback).await;
        assert_eq!(gen.calls(), 1);
        assert!(out.degraded_reason.unwrap().contains("401"));
    }

    #[tokio::test]
    async fn empty_reply_falls_back() {
        let gen = Scripted::new(vec![Ok("\n\n".into())]);
        let client = RecommendationClient::new(gen, settings());
        let out = client.recommend("user:1", &prompt(), fallback).await;
        assert!(out.is_degraded());
        assert!(!out.recommendations.is_empty());
    }

    #[tokio::test]
    async fn slow_generator_times_out() {
        let client = RecommendationClient::new(Arc::new(Slow), settings());
        let started = std::time::Instant::now();
        let out = client.recommend("user:1", &prompt(), fallback).await;
        assert!(out.is_degraded());
        assert!(started.elapsed() < Duration::from_secs(2));
        assert!(out.degraded_reason.unwrap().contains("no response"));
    }

    #[tokio::test]
    async fn second_call_hits_cache() {
        let gen = Scripted::new(vec![Ok("1. Insulate the loft".into())]);
        let client = RecommendationClient::new(gen.clone(), settings());

        client.recommend("user:1", &prompt(), fallback).await;
        let out = client.recommend("user:1", &prompt(), fallback).await;
        assert!(out.cached);
        assert_eq!(gen.calls(), 1);
        assert_eq!(out.recommendations, vec!["Insulate the loft"]);
    }
}
