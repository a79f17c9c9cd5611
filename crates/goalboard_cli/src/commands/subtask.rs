// subtask.rs — Subtask subcommands: add, update, toggle, delete.

use clap::Subcommand;
use goalboard_core::{SubtaskDraft, SubtaskPatch};
use uuid::Uuid;

use super::{print_json, App};

#[derive(Subcommand)]
pub enum SubtaskCommands {
    /// Append a subtask to a goal.
    Add {
        goal_id: Uuid,
        title: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        hours: Option<f64>,
        #[arg(long)]
        category: Option<String>,
        /// Create it already completed.
        #[arg(long)]
        done: bool,
    },
    /// Change selected fields of a subtask.
    Update {
        goal_id: Uuid,
        subtask_id: Uuid,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        hours: Option<f64>,
        #[arg(long)]
        category: Option<String>,
        /// Set the completion flag explicitly.
        #[arg(long)]
        completed: Option<bool>,
    },
    /// Flip a subtask between done and not done.
    Toggle { goal_id: Uuid, subtask_id: Uuid },
    /// Remove a subtask.
    Delete { goal_id: Uuid, subtask_id: Uuid },
}

pub fn execute(cmd: &SubtaskCommands, app: &App, owner: Option<&str>) -> anyhow::Result<()> {
    let owner_id = app.owner_id(owner)?;

    let goal = match cmd {
        SubtaskCommands::Add {
            goal_id,
            title,
            description,
            hours,
            category,
            done,
        } => {
            let draft = SubtaskDraft {
                description: description.clone(),
                completed: *done,
                estimated_hours: *hours,
                category: category.clone(),
                ..SubtaskDraft::new(title.clone())
            };
            app.goals.add_subtask(owner_id, *goal_id, draft)?
        }
        SubtaskCommands::Update {
            goal_id,
            subtask_id,
            title,
            description,
            hours,
            category,
            completed,
        } => {
            let patch = SubtaskPatch {
                title: title.clone(),
                description: description.clone(),
                completed: *completed,
                estimated_hours: *hours,
                category: category.clone(),
                ..SubtaskPatch::default()
            };
            app.goals
                .update_subtask(owner_id, *goal_id, *subtask_id, patch)?
        }
        SubtaskCommands::Toggle {
            goal_id,
            subtask_id,
        } => app.goals.toggle_subtask(owner_id, *goal_id, *subtask_id)?,
        SubtaskCommands::Delete {
            goal_id,
            subtask_id,
        } => app.goals.delete_subtask(owner_id, *goal_id, *subtask_id)?,
    };

    print_json(&goal)
}
