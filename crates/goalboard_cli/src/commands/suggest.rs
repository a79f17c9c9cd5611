// suggest.rs — Subtask suggestions, optionally applied to an existing goal.

use clap::Args;
use goalboard_core::{SubtaskDraft, SuggestionContext};
use uuid::Uuid;

use super::{print_json, App};

#[derive(Args)]
pub struct SuggestArgs {
    /// Free-text goal description.
    description: String,
    #[arg(long)]
    team_size: Option<u32>,
    #[arg(long)]
    priority: Option<String>,
    #[arg(long)]
    skill_level: Option<String>,
    #[arg(long)]
    complexity: Option<String>,
    /// Append the suggestions as subtasks of this goal (requires --owner).
    #[arg(long)]
    apply_to: Option<Uuid>,
}

pub fn execute(args: &SuggestArgs, app: &App, owner: Option<&str>) -> anyhow::Result<()> {
    let context = SuggestionContext {
        priority: args.priority.clone(),
        team_size: args.team_size,
        skill_level: args.skill_level.clone(),
        complexity: args.complexity.clone(),
        ..SuggestionContext::default()
    };
    let plan = app.suggestions.suggest(&args.description, &context);

    let Some(goal_id) = args.apply_to else {
        return print_json(&plan);
    };

    let owner_id = app.owner_id(owner)?;
    let drafts = plan.subtasks.iter().map(SubtaskDraft::from).collect();
    let goal = app.goals.add_subtasks(owner_id, goal_id, drafts)?;
    log::info!(
        "event=suggest_apply module=cli status=ok goal_id={} added={}",
        goal.id,
        plan.subtasks.len()
    );
    print_json(&goal)
}
