/// Task model
///
/// A task is created by one user and assigned to another (or the same) user.
/// Reassignment overwrites `assignee_id` and stamps `last_updated`; no
/// assignment history is kept.
///
/// # State Machine
///
/// ```text
/// not_started ⇄ in_progress ⇄ completed
///      ↑______________________↓
/// ```
///
/// Every transition between two distinct states is legal for an actor allowed
/// to update status; `completed` is not terminal and reopening is a normal
/// operation. Nothing changes status automatically: an overdue task is only
/// reported as overdue.
///
/// # Example
///
/// ```
/// use chrono::{NaiveDate, Utc};
/// use teamtask_shared::models::task::{NewTask, Task, TaskStatus};
///
/// let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
/// let mut task = Task::create(NewTask {
///     title: "Quarterly report".to_string(),
///     description: String::new(),
///     assignee_id: "x1".to_string(),
///     assigned_date: today,
///     target_date: today,
///     priority: None,
///     tags: vec![],
/// }, "m1", Utc::now());
///
/// assert!(task.set_status(TaskStatus::InProgress, Utc::now()));
/// assert!(!task.is_overdue(today));
/// ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Task progress state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Assigned, no work reported yet
    NotStarted,

    /// Work in progress
    InProgress,

    /// Work finished (may be reopened)
    Completed,
}

impl TaskStatus {
    /// Converts status to its canonical label
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::NotStarted => "not_started",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
        }
    }

    /// Checks if transition to target status is valid
    ///
    /// Any change between distinct states is allowed; staying in the same
    /// state is not a transition.
    pub fn can_transition_to(&self, target: TaskStatus) -> bool {
        *self != target
    }
}

/// Task priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

/// A task tracked across the hierarchy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Unique task ID
    pub id: String,

    /// Short title
    pub title: String,

    /// Free-form description
    pub description: String,

    /// User the task is assigned to
    pub assignee_id: String,

    /// User who created the task
    pub created_by: String,

    /// Current progress state
    pub status: TaskStatus,

    /// Date the task was handed out
    pub assigned_date: NaiveDate,

    /// Date the task is due
    pub target_date: NaiveDate,

    /// Optional priority
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,

    /// Free-form labels
    #[serde(default)]
    pub tags: Vec<String>,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last changed (fields, status or assignee)
    pub last_updated: DateTime<Utc>,
}

/// Input for creating a task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub assignee_id: String,
    pub assigned_date: NaiveDate,
    pub target_date: NaiveDate,
    pub priority: Option<Priority>,
    pub tags: Vec<String>,
}

/// Field edits for an existing task
///
/// Only non-None fields are applied. Assignee and status have their own
/// operations since they are gated by different permissions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskEdit {
    pub title: Option<String>,
    pub description: Option<String>,
    pub target_date: Option<NaiveDate>,

    /// New priority (use Some(None) to clear)
    pub priority: Option<Option<Priority>>,

    pub tags: Option<Vec<String>>,
}

impl TaskEdit {
    /// Whether the edit changes nothing
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.target_date.is_none()
            && self.priority.is_none()
            && self.tags.is_none()
    }
}

impl Task {
    /// Creates a new task in `not_started` status
    pub fn create(data: NewTask, created_by: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: data.title,
            description: data.description,
            assignee_id: data.assignee_id,
            created_by: created_by.to_string(),
            status: TaskStatus::NotStarted,
            assigned_date: data.assigned_date,
            target_date: data.target_date,
            priority: data.priority,
            tags: data.tags,
            created_at: now,
            last_updated: now,
        }
    }

    /// Moves the task to a new status
    ///
    /// Returns false (and leaves the task untouched) when the status is
    /// already `target`.
    pub fn set_status(&mut self, target: TaskStatus, now: DateTime<Utc>) -> bool {
        if !self.status.can_transition_to(target) {
            return false;
        }
        self.status = target;
        self.last_updated = now;
        true
    }

    /// Overwrites the assignee
    pub fn reassign(&mut self, assignee_id: &str, now: DateTime<Utc>) {
        self.assignee_id = assignee_id.to_string();
        self.last_updated = now;
    }

    /// Applies field edits
    pub fn apply_edit(&mut self, edit: TaskEdit, now: DateTime<Utc>) {
        if edit.is_empty() {
            return;
        }
        if let Some(title) = edit.title {
            self.title = title;
        }
        if let Some(description) = edit.description {
            self.description = description;
        }
        if let Some(target_date) = edit.target_date {
            self.target_date = target_date;
        }
        if let Some(priority) = edit.priority {
            self.priority = priority;
        }
        if let Some(tags) = edit.tags {
            self.tags = tags;
        }
        self.last_updated = now;
    }

    /// Whether the task is past its target date and not completed
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.status != TaskStatus::Completed && self.target_date < today
    }
}
