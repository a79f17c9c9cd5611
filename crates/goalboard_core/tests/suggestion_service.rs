use goalboard_core::suggest::fallback::fallback_plan;
use goalboard_core::{
    AppConfig, ProviderError, SubtaskDraft, SuggestedTask, SuggestionContext, SuggestionPlan,
    SuggestionProvider, SuggestionService, SuggestionSource,
};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

struct FailingProvider;

impl SuggestionProvider for FailingProvider {
    fn provider_id(&self) -> &str {
        "failing"
    }

    fn generate(&self, _: &str, _: &SuggestionContext) -> Result<SuggestionPlan, ProviderError> {
        Err(ProviderError::Request("503 from upstream".to_string()))
    }
}

struct SlowProvider {
    delay: Duration,
}

impl SuggestionProvider for SlowProvider {
    fn provider_id(&self) -> &str {
        "slow"
    }

    fn generate(&self, _: &str, _: &SuggestionContext) -> Result<SuggestionPlan, ProviderError> {
        thread::sleep(self.delay);
        Ok(SuggestionPlan {
            subtasks: vec![task("late answer", 1.0)],
            total_hours: None,
            tips: Vec::new(),
            source: SuggestionSource::Provider,
        })
    }
}

struct FixedProvider {
    plan: SuggestionPlan,
}

impl SuggestionProvider for FixedProvider {
    fn provider_id(&self) -> &str {
        "fixed"
    }

    fn generate(&self, _: &str, _: &SuggestionContext) -> Result<SuggestionPlan, ProviderError> {
        Ok(self.plan.clone())
    }
}

fn task(title: &str, hours: f64) -> SuggestedTask {
    SuggestedTask {
        title: title.to_string(),
        description: None,
        estimated_hours: hours,
        category: Some("development".to_string()),
        skills: vec!["rust".to_string()],
        dependencies: Vec::new(),
    }
}

fn solo() -> SuggestionContext {
    SuggestionContext {
        team_size: Some(1),
        ..SuggestionContext::default()
    }
}

const CHECKOUT: &str = "build and test a checkout flow";

#[test]
fn failing_provider_falls_back() {
    let service = SuggestionService::new(Arc::new(FailingProvider), Duration::from_secs(1));
    let plan = service.suggest(CHECKOUT, &solo());

    assert_eq!(plan, fallback_plan(CHECKOUT, &solo()));
    let titles: Vec<&str> = plan.subtasks.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(
        titles,
        vec![
            "Define scope and requirements",
            "Set up development environment",
            "Implement core functionality",
            "Write and run tests",
            "Review and wrap up",
        ]
    );
}

#[test]
fn slow_provider_is_abandoned_after_timeout() {
    let provider = SlowProvider {
        delay: Duration::from_secs(2),
    };
    let service = SuggestionService::new(Arc::new(provider), Duration::from_millis(50));

    let started = Instant::now();
    let plan = service.suggest(CHECKOUT, &solo());

    assert!(started.elapsed() < Duration::from_secs(1));
    assert_eq!(plan.source, SuggestionSource::Fallback);
}

#[test]
fn configured_timeout_bounds_the_provider_wait() {
    let lookup = |key: &str| (key == "GOALBOARD_SUGGEST_TIMEOUT_MS").then(|| "50".to_string());
    let config = AppConfig::from_lookup(lookup).unwrap();
    let provider = SlowProvider {
        delay: Duration::from_secs(2),
    };
    let service = SuggestionService::from_config(&config, Some(Arc::new(provider)));

    let started = Instant::now();
    let plan = service.suggest(CHECKOUT, &solo());

    assert!(started.elapsed() < Duration::from_secs(1));
    assert_eq!(plan.source, SuggestionSource::Fallback);

    let without_provider = SuggestionService::from_config(&AppConfig::default(), None);
    assert_eq!(without_provider.suggest(CHECKOUT, &solo()), fallback_plan(CHECKOUT, &solo()));
}

#[test]
fn malformed_provider_payloads_fall_back() {
    let empty = SuggestionPlan {
        subtasks: Vec::new(),
        total_hours: None,
        tips: Vec::new(),
        source: SuggestionSource::Provider,
    };
    let blank_title = SuggestionPlan {
        subtasks: vec![task("   ", 2.0)],
        ..empty.clone()
    };
    let negative_hours = SuggestionPlan {
        subtasks: vec![task("valid", -3.0)],
        ..empty.clone()
    };

    for plan in [empty, blank_title, negative_hours] {
        let service =
            SuggestionService::new(Arc::new(FixedProvider { plan }), Duration::from_secs(1));
        let result = service.suggest(CHECKOUT, &solo());
        assert_eq!(result.source, SuggestionSource::Fallback);
    }
}

#[test]
fn valid_provider_plan_is_used_with_total_filled_in() {
    let plan = SuggestionPlan {
        subtasks: vec![task("Sketch UI", 2.5), task("Wire payments", 5.0)],
        total_hours: None,
        tips: vec!["Start with the happy path.".to_string()],
        source: SuggestionSource::Fallback,
    };
    let service = SuggestionService::new(Arc::new(FixedProvider { plan }), Duration::from_secs(1));

    let result = service.suggest(CHECKOUT, &solo());

    assert_eq!(result.source, SuggestionSource::Provider);
    assert_eq!(result.subtasks.len(), 2);
    assert_eq!(result.total_hours, Some(7.5));

    let draft = SubtaskDraft::from(&result.subtasks[1]);
    assert_eq!(draft.title, "Wire payments");
    assert_eq!(draft.estimated_hours, Some(5.0));
    assert!(!draft.completed);
}

#[test]
fn plan_serializes_with_camel_case_keys() {
    let plan = fallback_plan("launch the beta", &SuggestionContext::default());
    let value = serde_json::to_value(&plan).unwrap();

    assert_eq!(value["source"], "FALLBACK");
    assert!(value["totalHours"].is_number());
    assert!(value["subtasks"][0]["estimatedHours"].is_number());
}
