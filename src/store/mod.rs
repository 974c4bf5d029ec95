//! The remote task store, and the sources that implement it
//!
//! The planner screens never talk HTTP themselves: they go through the [`TaskStore`]
//! trait. The crate ships two sources: a [`RestStore`](rest::RestStore) that speaks
//! the hosted backend's REST dialect, and a [`MemoryStore`](memory::MemoryStore)
//! that keeps rows in memory (optionally mirrored to a JSON file) and is what the
//! test suite runs against.

use async_trait::async_trait;
use thiserror::Error;

use crate::task::{NewTask, Priority, Task, TaskId, TaskPatch, TaskStatus};

pub mod memory;
pub mod rest;

/// Errors surfaced by a task store.
///
/// The list and calendar view models swallow these into an empty result set
/// (see the `viewmodel` module); mutation paths propagate them to the caller.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("no task with id {0}")]
    NotFound(TaskId),
    #[error("not signed in")]
    Unauthenticated,
    #[error("the backend rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("scripted failure: {0}")]
    Scripted(String),
}

/// Which way to order by due date
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub(crate) fn as_order_suffix(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "asc",
            SortDirection::Descending => "desc",
        }
    }
}

/// An equality filter plus a due-date ordering, as understood by every store.
///
/// At most one of the two equality constraints is usually set (the screens filter
/// either by priority or by status), but nothing prevents combining them.
#[derive(Clone, Debug, PartialEq)]
pub struct TaskFilter {
    status: Option<TaskStatus>,
    priority: Option<Priority>,
    order: SortDirection,
}

impl TaskFilter {
    /// No equality constraint, ascending by due date
    pub fn all() -> Self {
        Self {
            status: None,
            priority: None,
            order: SortDirection::Ascending,
        }
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_order(mut self, order: SortDirection) -> Self {
        self.order = order;
        self
    }

    pub fn status(&self) -> Option<&TaskStatus> {
        self.status.as_ref()
    }
    pub fn priority(&self) -> Option<Priority> {
        self.priority
    }
    pub fn order(&self) -> SortDirection {
        self.order
    }

    /// Whether a row passes the equality constraints (the ordering is not this function's job)
    pub fn matches(&self, task: &Task) -> bool {
        if let Some(status) = &self.status {
            if task.status() != status {
                return false;
            }
        }
        if let Some(priority) = self.priority {
            if task.priority() != priority {
                return false;
            }
        }
        true
    }
}

impl Default for TaskFilter {
    fn default() -> Self {
        Self::all()
    }
}

/// A source of task rows (usually the hosted backend)
#[async_trait]
pub trait TaskStore {
    /// Return every row passing `filter`, ordered by due date as the filter requests.
    /// Rows without a due date come last regardless of direction.
    async fn select(&self, filter: &TaskFilter) -> Result<Vec<Task>, StoreError>;

    /// Return the single row with this id
    async fn select_by_id(&self, id: &TaskId) -> Result<Task, StoreError>;

    /// Create a row and return it as stored (with its server-assigned fields filled in)
    async fn insert(&self, new: NewTask) -> Result<Task, StoreError>;

    /// Update the given columns of an existing row
    async fn update(&self, id: &TaskId, patch: TaskPatch) -> Result<(), StoreError>;

    /// Delete a row
    async fn delete(&self, id: &TaskId) -> Result<(), StoreError>;
}

// Screens sometimes share one store handle (e.g. the dashboard and the calendar
// over the same backend client), so the trait is also usable through an Arc.
#[async_trait]
impl<T: TaskStore + Send + Sync + ?Sized> TaskStore for std::sync::Arc<T> {
    async fn select(&self, filter: &TaskFilter) -> Result<Vec<Task>, StoreError> {
        (**self).select(filter).await
    }
    async fn select_by_id(&self, id: &TaskId) -> Result<Task, StoreError> {
        (**self).select_by_id(id).await
    }
    async fn insert(&self, new: NewTask) -> Result<Task, StoreError> {
        (**self).insert(new).await
    }
    async fn update(&self, id: &TaskId, patch: TaskPatch) -> Result<(), StoreError> {
        (**self).update(id, patch).await
    }
    async fn delete(&self, id: &TaskId) -> Result<(), StoreError> {
        (**self).delete(id).await
    }
}

/// Order rows by due date, rows without one last. Used by stores that sort
/// client-side, and by the list view model to enforce its ordering contract.
pub(crate) fn sort_by_due_date(tasks: &mut Vec<Task>, direction: SortDirection) {
    tasks.sort_by(|a, b| match (a.due_date(), b.due_date()) {
        (Some(da), Some(db)) => match direction {
            SortDirection::Ascending => da.cmp(db),
            SortDirection::Descending => db.cmp(da),
        },
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::Priority;

    fn task(title: &str, due_date: Option<&str>, priority: Priority, status: TaskStatus) -> Task {
        Task::new_with_parameters(
            TaskId::random(),
            title.to_string(),
            due_date.map(|d| crate::task::parse_canonical_date(d).unwrap()),
            status,
            priority,
            None,
        )
    }

    #[test]
    fn filters_match_on_equality() {
        let high = task("a", Some("2024-06-01"), Priority::High, TaskStatus::Pending);
        let low = task("b", Some("2024-06-02"), Priority::Low, TaskStatus::Completed);

        let by_priority = TaskFilter::all().with_priority(Priority::High);
        assert!(by_priority.matches(&high));
        assert!(!by_priority.matches(&low));

        let by_status = TaskFilter::all().with_status(TaskStatus::Completed);
        assert!(!by_status.matches(&high));
        assert!(by_status.matches(&low));

        assert!(TaskFilter::all().matches(&high));
        assert!(TaskFilter::all().matches(&low));
    }

    #[test]
    fn sorting_puts_dateless_rows_last() {
        let mut tasks = vec![
            task("later", Some("2024-07-01"), Priority::Low, TaskStatus::Pending),
            task("dateless", None, Priority::Low, TaskStatus::Pending),
            task("sooner", Some("2024-06-01"), Priority::Low, TaskStatus::Pending),
        ];

        sort_by_due_date(&mut tasks, SortDirection::Ascending);
        let titles: Vec<&str> = tasks.iter().map(|t| t.title()).collect();
        assert_eq!(titles, vec!["sooner", "later", "dateless"]);

        sort_by_due_date(&mut tasks, SortDirection::Descending);
        let titles: Vec<&str> = tasks.iter().map(|t| t.title()).collect();
        assert_eq!(titles, vec!["later", "sooner", "dateless"]);
    }
}
