//! Study tasks, as stored in the remote `tasks` table

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// The canonical date format used as a grouping key (`YYYY-MM-DD`, no time-of-day, no timezone).
pub const CANONICAL_DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a canonical `YYYY-MM-DD` date string.
///
/// This is deliberately strict: due dates are used as exact-equality grouping keys,
/// so anything carrying a time-of-day or timezone component must be rejected before
/// it reaches the store.
pub fn parse_canonical_date(text: &str) -> Result<NaiveDate, ValidationError> {
    let date = NaiveDate::parse_from_str(text, CANONICAL_DATE_FORMAT)
        .map_err(|_| ValidationError::MalformedDate(text.to_string()))?;
    // chrono accepts unpadded fields ("2024-6-1"); only the exact canonical
    // rendering is a valid grouping key
    if date.format(CANONICAL_DATE_FORMAT).to_string() != text {
        return Err(ValidationError::MalformedDate(text.to_string()));
    }
    Ok(date)
}

/// Errors caught before any remote call is made.
///
/// These are surfaced inline to the user by the calling screen and are never
/// logged as system errors.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ValidationError {
    #[error("the title must not be empty")]
    EmptyTitle,
    #[error("'{0}' is not a valid YYYY-MM-DD date")]
    MalformedDate(String),
    #[error("'{0}' does not look like an e-mail address")]
    MalformedEmail(String),
    #[error("the password must not be empty")]
    EmptyPassword,
}

/// Unique identifier of a task row, stable for the row's lifetime
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(Uuid);

impl TaskId {
    /// Generate a random TaskId
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Display for TaskId {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for TaskId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Task priority, one of the three buckets the planner screens filter on
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Display for Priority {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        match self {
            Priority::High => write!(f, "high"),
            Priority::Medium => write!(f, "medium"),
            Priority::Low => write!(f, "low"),
        }
    }
}

impl FromStr for Priority {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            other => Err(format!("unknown priority '{}'", other)),
        }
    }
}

/// Completion status of a task.
///
/// The backend treats this column as an open set: rows written by other (older or
/// newer) clients may carry values this crate does not know about. Such values are
/// kept as-is in [`TaskStatus::Other`] so that a round-trip through this crate
/// never rewrites them.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TaskStatus {
    Pending,
    Completed,
    Other(String),
}

impl TaskStatus {
    pub fn is_completed(&self) -> bool {
        match self {
            TaskStatus::Completed => true,
            _ => false,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Completed => "completed",
            TaskStatus::Other(s) => s.as_str(),
        }
    }
}

impl From<String> for TaskStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "pending" => TaskStatus::Pending,
            "completed" => TaskStatus::Completed,
            _ => TaskStatus::Other(s),
        }
    }
}

impl From<TaskStatus> for String {
    fn from(status: TaskStatus) -> Self {
        status.as_str().to_string()
    }
}

impl Display for TaskStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        write!(f, "{}", self.as_str())
    }
}

/// A study task row.
///
/// View models hold read-only copies of these; all mutations go through the store
/// as a [`NewTask`] or a [`TaskPatch`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// The row id
    id: TaskId,
    /// The display name of the task
    title: String,
    /// The canonical due date. Rows written by this crate always have one, but
    /// rows coming from the backend may not.
    #[serde(default)]
    due_date: Option<NaiveDate>,
    status: TaskStatus,
    priority: Priority,
    /// The user that created this row. The backend applies it as an implicit
    /// row filter; this crate never changes it.
    #[serde(default)]
    owner: Option<Uuid>,
}

impl Task {
    /// Create a task instance that may already exist on the server
    pub fn new_with_parameters(
        id: TaskId,
        title: String,
        due_date: Option<NaiveDate>,
        status: TaskStatus,
        priority: Priority,
        owner: Option<Uuid>,
    ) -> Self {
        Self { id, title, due_date, status, priority, owner }
    }

    pub fn id(&self) -> &TaskId {
        &self.id
    }
    pub fn title(&self) -> &str {
        &self.title
    }
    pub fn due_date(&self) -> Option<&NaiveDate> {
        self.due_date.as_ref()
    }
    pub fn status(&self) -> &TaskStatus {
        &self.status
    }
    pub fn priority(&self) -> Priority {
        self.priority
    }
    pub fn owner(&self) -> Option<&Uuid> {
        self.owner.as_ref()
    }
}

/// The payload for creating a task.
///
/// Validation happens here, before any remote call: the title must be non-empty
/// and the due date must be a canonical `YYYY-MM-DD` string.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NewTask {
    title: String,
    due_date: NaiveDate,
    status: TaskStatus,
    priority: Priority,
}

impl NewTask {
    pub fn new<S: AsRef<str>>(title: S, due_date: S, priority: Priority) -> Result<Self, ValidationError> {
        let title = title.as_ref().trim();
        if title.is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        let due_date = parse_canonical_date(due_date.as_ref())?;
        Ok(Self {
            title: title.to_string(),
            due_date,
            status: TaskStatus::Pending,
            priority,
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }
    pub fn due_date(&self) -> &NaiveDate {
        &self.due_date
    }
    pub fn status(&self) -> &TaskStatus {
        &self.status
    }
    pub fn priority(&self) -> Priority {
        self.priority
    }

    /// Turn this payload into a full row, as the backend would on insert
    pub(crate) fn into_task(self, id: TaskId, owner: Option<Uuid>) -> Task {
        Task {
            id,
            title: self.title,
            due_date: Some(self.due_date),
            status: self.status,
            priority: self.priority,
            owner,
        }
    }
}

/// A partial update to an existing task.
///
/// Only the fields that were explicitly set are serialized, so the generated
/// `PATCH` body leaves every other column untouched.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    due_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    priority: Option<Priority>,
}

impl TaskPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title<S: AsRef<str>>(mut self, title: S) -> Result<Self, ValidationError> {
        let title = title.as_ref().trim();
        if title.is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        self.title = Some(title.to_string());
        Ok(self)
    }

    pub fn with_due_date<S: AsRef<str>>(mut self, due_date: S) -> Result<Self, ValidationError> {
        self.due_date = Some(parse_canonical_date(due_date.as_ref())?);
        Ok(self)
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// True when no field was set (there is nothing to send)
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Apply this patch to an existing row, as the backend would
    pub(crate) fn apply_to(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(due_date) = &self.due_date {
            task.due_date = Some(*due_date);
        }
        if let Some(status) = &self.status {
            task.status = status.clone();
        }
        if let Some(priority) = &self.priority {
            task.priority = *priority;
        }
    }
}
