//! Financial task checklist

use crate::error::BuddyError;
use crate::models::{Task, TaskCategory};
use crate::storage::TaskStore;
use crate::Result;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Starter checklist seeded into an empty board.
pub fn default_tasks() -> Vec<Task> {
    vec![
        Task::new(
            "1",
            "Set aside $5 a week into savings",
            "Small, consistent savings build up over time. Start with just $5 each week.",
            TaskCategory::Savings,
        ),
        Task::new(
            "2",
            "Pay off your highest interest credit card first",
            "Focus on the card with the highest interest rate to save money long-term.",
            TaskCategory::Debt,
        ),
        Task::new(
            "3",
            "Review one subscription you can cancel this month",
            "Look through your monthly subscriptions and identify one you can live without.",
            TaskCategory::Budgeting,
        ),
        Task::new(
            "4",
            "Set up automatic bill payments",
            "Avoid late fees by setting up automatic payments for your recurring bills.",
            TaskCategory::Organization,
        ),
        Task::new(
            "5",
            "Create a simple monthly budget",
            "Outline your income and expenses to get a clear picture of your finances.",
            TaskCategory::Budgeting,
        ),
    ]
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TaskProgress {
    pub completed: usize,
    pub total: usize,
    /// Whole percent, rounded
    pub percent: u32,
    pub all_done: bool,
}

impl TaskProgress {
    pub fn of(tasks: &[Task]) -> Self {
        let total = tasks.len();
        let completed = tasks.iter().filter(|task| task.completed).count();
        let percent = if total == 0 {
            0
        } else {
            (completed as f64 / total as f64 * 100.0).round() as u32
        };

        Self {
            completed,
            total,
            percent,
            all_done: total > 0 && completed == total,
        }
    }
}

pub struct TaskBoard {
    store: TaskStore,
    tasks: Vec<Task>,
}

impl TaskBoard {
    /// Load the stored checklist, seeding the defaults when it is empty.
    pub async fn open(store: TaskStore) -> Self {
        let mut tasks = store.load().await;
        if tasks.is_empty() {
            info!("Seeding default tasks");
            tasks = default_tasks();
            store.save(&tasks).await;
        }

        Self { store, tasks }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Flip one task's completion and persist the checklist.
    pub async fn toggle(&mut self, id: &str) -> Result<&Task> {
        let index = self
            .tasks
            .iter()
            .position(|task| task.id == id)
            .ok_or_else(|| BuddyError::TaskNotFound(id.to_string()))?;

        let task = &mut self.tasks[index];
        task.completed = !task.completed;
        info!(task_id = id, completed = task.completed, "Task toggled");

        self.store.save(&self.tasks).await;
        Ok(&self.tasks[index])
    }

    pub fn progress(&self) -> TaskProgress {
        TaskProgress::of(&self.tasks)
    }
}
