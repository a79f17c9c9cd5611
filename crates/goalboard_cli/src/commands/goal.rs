// goal.rs — Goal subcommands: add, list, show, update, delete.

use chrono::NaiveDate;
use clap::Subcommand;
use goalboard_core::{GoalDraft, GoalListQuery, GoalPatch, GoalStatus, Priority, SubtaskDraft};
use uuid::Uuid;

use super::{print_json, App};

#[derive(Subcommand)]
pub enum GoalCommands {
    /// Create a goal, optionally with initial subtasks.
    Add {
        title: String,
        #[arg(long)]
        description: Option<String>,
        /// HIGH, MEDIUM or LOW.
        #[arg(long)]
        priority: Option<String>,
        /// Due date as YYYY-MM-DD.
        #[arg(long)]
        due: Option<String>,
        /// Subtask title; repeat for several.
        #[arg(long = "subtask")]
        subtasks: Vec<String>,
    },
    /// List the owner's goals.
    List {
        #[arg(long)]
        status: Option<GoalStatus>,
        #[arg(long)]
        priority: Option<Priority>,
        /// Earliest due date, inclusive.
        #[arg(long)]
        due_from: Option<NaiveDate>,
        /// Latest due date, inclusive.
        #[arg(long)]
        due_to: Option<NaiveDate>,
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long, default_value_t = 0)]
        offset: u32,
    },
    /// Show one goal with its subtasks.
    Show { id: Uuid },
    /// Change selected fields of a goal.
    Update {
        id: Uuid,
        #[arg(long)]
        title: Option<String>,
        /// Pass an empty string to clear.
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        priority: Option<String>,
        /// ACTIVE, COMPLETED, PAUSED or CANCELLED.
        #[arg(long)]
        status: Option<String>,
        /// Pass an empty string to clear.
        #[arg(long)]
        due: Option<String>,
    },
    /// Delete a goal and all of its subtasks.
    Delete { id: Uuid },
}

pub fn execute(cmd: &GoalCommands, app: &App, owner: Option<&str>) -> anyhow::Result<()> {
    let owner_id = app.owner_id(owner)?;

    match cmd {
        GoalCommands::Add {
            title,
            description,
            priority,
            due,
            subtasks,
        } => {
            let draft = GoalDraft {
                description: description.clone(),
                priority: priority.clone(),
                due_date: due.clone(),
                subtasks: subtasks.iter().map(SubtaskDraft::new).collect(),
                ..GoalDraft::new(title.clone())
            };
            print_json(&app.goals.create_goal(owner_id, draft)?)
        }
        GoalCommands::List {
            status,
            priority,
            due_from,
            due_to,
            limit,
            offset,
        } => {
            let query = GoalListQuery {
                status: *status,
                priority: *priority,
                due_from: *due_from,
                due_to: *due_to,
                limit: *limit,
                offset: *offset,
            };
            print_json(&app.goals.list_goals(owner_id, &query)?)
        }
        GoalCommands::Show { id } => print_json(&app.goals.get_goal(owner_id, *id)?),
        GoalCommands::Update {
            id,
            title,
            description,
            priority,
            status,
            due,
        } => {
            let patch = GoalPatch {
                title: title.clone(),
                description: description.clone(),
                priority: priority.clone(),
                status: status.clone(),
                due_date: due.clone(),
            };
            if patch.is_empty() {
                anyhow::bail!("nothing to update; pass at least one field");
            }
            print_json(&app.goals.update_goal(owner_id, *id, patch)?)
        }
        GoalCommands::Delete { id } => {
            app.goals.delete_goal(owner_id, *id)?;
            print_json(&serde_json::json!({ "deleted": id }))
        }
    }
}
