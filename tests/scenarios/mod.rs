//! Shared fixtures for the view-model integration tests

use std::collections::HashMap;

use chrono::NaiveDate;

use study_satchel::store::memory::MemoryStore;
use study_satchel::{parse_canonical_date, Priority, Task, TaskId, TaskStatus};

/// One task row to seed the store with
pub struct Fixture {
    pub title: &'static str,
    /// Canonical date, or None for a row without a due date
    pub due_date: Option<&'static str>,
    pub priority: Priority,
    pub status: TaskStatus,
}

impl Fixture {
    pub fn pending(title: &'static str, due_date: &'static str, priority: Priority) -> Self {
        Self {
            title,
            due_date: Some(due_date),
            priority,
            status: TaskStatus::Pending,
        }
    }

    pub fn completed(title: &'static str, due_date: &'static str, priority: Priority) -> Self {
        Self {
            title,
            due_date: Some(due_date),
            priority,
            status: TaskStatus::Completed,
        }
    }

    pub fn dateless(title: &'static str, priority: Priority) -> Self {
        Self {
            title,
            due_date: None,
            priority,
            status: TaskStatus::Pending,
        }
    }
}

pub fn date(text: &str) -> NaiveDate {
    parse_canonical_date(text).unwrap()
}

/// Seed a store with the given rows, bypassing call counters.
/// Returns the created ids, keyed by title
pub fn populate(fixtures: &[Fixture]) -> (MemoryStore, HashMap<&'static str, TaskId>) {
    let store = MemoryStore::new();
    let mut ids = HashMap::new();

    for fixture in fixtures {
        let id = TaskId::random();
        let task = Task::new_with_parameters(
            id,
            fixture.title.to_string(),
            fixture.due_date.map(date),
            fixture.status.clone(),
            fixture.priority,
            None,
        );
        store.put(task);
        ids.insert(fixture.title, id);
    }

    (store, ids)
}
