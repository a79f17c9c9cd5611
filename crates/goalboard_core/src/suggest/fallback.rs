//! Keyword-driven suggestion generator.
//!
//! # Invariants
//! - Pure: the same description and context always yield the same plan.
//! - Never fails; at most [`MAX_FALLBACK_ITEMS`] items are produced.
//! - Each item depends on the title of the item before it.

use crate::suggest::{SuggestedTask, SuggestionContext, SuggestionPlan, SuggestionSource};
use once_cell::sync::Lazy;
use regex::Regex;

pub const MAX_FALLBACK_ITEMS: usize = 6;

static BUILD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(build|develop|create)").expect("valid build regex"));
static TEST_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(test|qa)").expect("valid test regex"));
static DEPLOY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(deploy|launch|release)").expect("valid deploy regex"));

const FALLBACK_TIPS: [&str; 3] = [
    "Break large items into steps you can finish in a single sitting.",
    "Revisit estimates after the first completed subtask.",
    "Mark subtasks complete as you go so progress stays accurate.",
];

struct Template {
    title: &'static str,
    description: &'static str,
    category: &'static str,
    hours: f64,
    skills: &'static [&'static str],
}

const SCOPE: Template = Template {
    title: "Define scope and requirements",
    description: "Write down the expected outcome, constraints and acceptance criteria.",
    category: "planning",
    hours: 2.0,
    skills: &["planning"],
};
const SETUP: Template = Template {
    title: "Set up development environment",
    description: "Prepare tooling, repositories and access needed to start work.",
    category: "setup",
    hours: 3.0,
    skills: &["tooling"],
};
const IMPLEMENT: Template = Template {
    title: "Implement core functionality",
    description: "Build the main features described by the goal.",
    category: "development",
    hours: 8.0,
    skills: &["development"],
};
const TESTING: Template = Template {
    title: "Write and run tests",
    description: "Cover the main paths and fix the issues found.",
    category: "testing",
    hours: 4.0,
    skills: &["testing"],
};
const DEPLOY: Template = Template {
    title: "Deploy and release",
    description: "Ship the result and confirm it works where it is used.",
    category: "deployment",
    hours: 3.0,
    skills: &["operations"],
};
const COORDINATE: Template = Template {
    title: "Coordinate team responsibilities",
    description: "Assign owners and agree on a check-in cadence.",
    category: "coordination",
    hours: 2.0,
    skills: &["communication"],
};
const REVIEW: Template = Template {
    title: "Review and wrap up",
    description: "Check the outcome against the scope and note follow-ups.",
    category: "review",
    hours: 2.0,
    skills: &["review"],
};

/// Builds a plan from keywords in `description`.
///
/// Order: scope, setup + implementation (build/develop/create), testing
/// (test/qa), deployment (deploy/launch/release), coordination (team size
/// above one), review. The list is then cut to [`MAX_FALLBACK_ITEMS`].
pub fn fallback_plan(description: &str, context: &SuggestionContext) -> SuggestionPlan {
    let mut templates: Vec<&Template> = vec![&SCOPE];
    if BUILD_RE.is_match(description) {
        templates.push(&SETUP);
        templates.push(&IMPLEMENT);
    }
    if TEST_RE.is_match(description) {
        templates.push(&TESTING);
    }
    if DEPLOY_RE.is_match(description) {
        templates.push(&DEPLOY);
    }
    if context.team_size.is_some_and(|size| size > 1) {
        templates.push(&COORDINATE);
    }
    templates.push(&REVIEW);
    templates.truncate(MAX_FALLBACK_ITEMS);

    let mut subtasks: Vec<SuggestedTask> = Vec::with_capacity(templates.len());
    for template in templates {
        let dependencies = subtasks
            .last()
            .map(|previous| vec![previous.title.clone()])
            .unwrap_or_default();
        subtasks.push(SuggestedTask {
            title: template.title.to_string(),
            description: Some(template.description.to_string()),
            estimated_hours: template.hours,
            category: Some(template.category.to_string()),
            skills: template.skills.iter().map(|skill| skill.to_string()).collect(),
            dependencies,
        });
    }

    let mut plan = SuggestionPlan {
        subtasks,
        total_hours: None,
        tips: FALLBACK_TIPS.iter().map(|tip| tip.to_string()).collect(),
        source: SuggestionSource::Fallback,
    };
    plan.total_hours = Some(plan.summed_hours());
    plan
}

#[cfg(test)]
mod tests {
    use super::{fallback_plan, MAX_FALLBACK_ITEMS};
    use crate::suggest::{SuggestionContext, SuggestionSource};

    fn titles(description: &str, team_size: Option<u32>) -> Vec<String> {
        let context = SuggestionContext {
            team_size,
            ..SuggestionContext::default()
        };
        fallback_plan(description, &context)
            .subtasks
            .into_iter()
            .map(|task| task.title)
            .collect()
    }

    #[test]
    fn checkout_flow_for_solo_developer() {
        assert_eq!(
            titles("build and test a checkout flow", Some(1)),
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
    fn no_keywords_yields_scope_and_review() {
        assert_eq!(
            titles("learn to juggle", None),
            vec!["Define scope and requirements", "Review and wrap up"]
        );
    }

    #[test]
    fn matching_is_case_insensitive_on_word_prefixes() {
        let found = titles("Developing the QA harness before LAUNCHING", None);
        assert!(found.contains(&"Implement core functionality".to_string()));
        assert!(found.contains(&"Write and run tests".to_string()));
        assert!(found.contains(&"Deploy and release".to_string()));

        // "releasing" drops the final "e" of "release".
        assert!(!titles("releasing soon", None).contains(&"Deploy and release".to_string()));
        assert_eq!(
            titles("deploy", None),
            vec![
                "Define scope and requirements",
                "Deploy and release",
                "Review and wrap up",
            ]
        );

        // "rebuild" has no word boundary before "build".
        assert_eq!(titles("rebuild", None).len(), 2);
    }

    #[test]
    fn every_category_plus_team_is_truncated() {
        let plan = fallback_plan(
            "create, test and launch the app",
            &SuggestionContext {
                team_size: Some(4),
                ..SuggestionContext::default()
            },
        );
        assert_eq!(plan.subtasks.len(), MAX_FALLBACK_ITEMS);
        assert_eq!(
            plan.subtasks.last().map(|task| task.title.as_str()),
            Some("Coordinate team responsibilities")
        );
    }

    #[test]
    fn items_chain_dependencies_and_sum_hours() {
        let plan = fallback_plan("build it", &SuggestionContext::default());
        assert_eq!(plan.source, SuggestionSource::Fallback);
        assert!(plan.subtasks[0].dependencies.is_empty());
        for pair in plan.subtasks.windows(2) {
            assert_eq!(pair[1].dependencies, vec![pair[0].title.clone()]);
        }
        assert_eq!(plan.total_hours, Some(2.0 + 3.0 + 8.0 + 2.0));
        assert!(!plan.tips.is_empty());
    }

    #[test]
    fn same_input_same_output() {
        let context = SuggestionContext::default();
        assert_eq!(
            fallback_plan("deploy the site", &context),
            fallback_plan("deploy the site", &context)
        );
    }
}
