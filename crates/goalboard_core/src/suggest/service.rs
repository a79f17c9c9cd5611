//! Suggestion orchestration with bounded provider wait.

use crate::config::AppConfig;
use crate::suggest::fallback::fallback_plan;
use crate::suggest::provider::{validate_plan, ProviderError, SuggestionProvider};
use crate::suggest::{SuggestionContext, SuggestionPlan, SuggestionSource};
use log::{info, warn};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Produces subtask suggestions, preferring the provider when one is set.
pub struct SuggestionService {
    provider: Option<Arc<dyn SuggestionProvider>>,
    timeout: Duration,
}

impl SuggestionService {
    /// Service that asks `provider` first and waits at most `timeout`.
    pub fn new(provider: Arc<dyn SuggestionProvider>, timeout: Duration) -> Self {
        Self {
            provider: Some(provider),
            timeout,
        }
    }

    /// Service bounded by `config.suggest_timeout`; fallback only when
    /// `provider` is `None`.
    pub fn from_config(
        config: &AppConfig,
        provider: Option<Arc<dyn SuggestionProvider>>,
    ) -> Self {
        Self {
            provider,
            timeout: config.suggest_timeout,
        }
    }

    /// Returns a plan for `description`. Never fails.
    ///
    /// Provider errors, timeouts and malformed payloads are logged and
    /// replaced by [`fallback_plan`].
    pub fn suggest(&self, description: &str, context: &SuggestionContext) -> SuggestionPlan {
        let started_at = Instant::now();
        let Some(provider) = &self.provider else {
            info!("event=suggest module=suggest status=ok source=fallback reason=no_provider");
            return fallback_plan(description, context);
        };

        match self.call_provider(Arc::clone(provider), description, context) {
            Ok(plan) => {
                info!(
                    "event=suggest module=suggest status=ok source=provider provider_id={} items={} duration_ms={}",
                    provider.provider_id(),
                    plan.subtasks.len(),
                    started_at.elapsed().as_millis()
                );
                plan
            }
            Err(err) => {
                warn!(
                    "event=suggest module=suggest status=degraded source=fallback provider_id={} error_code={} duration_ms={}",
                    provider.provider_id(),
                    err.code(),
                    started_at.elapsed().as_millis()
                );
                fallback_plan(description, context)
            }
        }
    }

    fn call_provider(
        &self,
        provider: Arc<dyn SuggestionProvider>,
        description: &str,
        context: &SuggestionContext,
    ) -> Result<SuggestionPlan, ProviderError> {
        let (sender, receiver) = mpsc::channel();
        let description = description.to_string();
        let context = context.clone();

        // A late answer lands in a dropped channel and is discarded.
        thread::Builder::new()
            .name("goalboard-suggest".to_string())
            .spawn(move || {
                let _ = sender.send(provider.generate(&description, &context));
            })
            .map_err(|err| ProviderError::Unavailable(format!("worker spawn failed: {err}")))?;

        let plan = match receiver.recv_timeout(self.timeout) {
            Ok(result) => result?,
            Err(mpsc::RecvTimeoutError::Timeout) => {
                return Err(ProviderError::Timeout(self.timeout))
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                return Err(ProviderError::Request(
                    "provider worker exited without a result".to_string(),
                ))
            }
        };

        let mut plan = validate_plan(plan)?;
        plan.source = SuggestionSource::Provider;
        Ok(plan)
    }
}
