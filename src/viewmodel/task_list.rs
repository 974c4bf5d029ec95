//! View model for the task list screens (dashboard, urgent, upcoming, history)
//!
//! Each of those screens is the same machine with a different filter: fetch a
//! filtered slice of tasks ordered by due date, expose loading/empty state,
//! reload on focus and on pull-to-refresh.

use async_trait::async_trait;

use crate::store::{sort_by_due_date, TaskFilter, TaskStore};
use crate::task::Task;
use crate::viewmodel::{FocusAware, LoadState, RequestSequence};

/// An ordered, filtered view of tasks for one screen instance
pub struct TaskListViewModel<S: TaskStore> {
    store: S,
    filter: TaskFilter,
    state: LoadState,
    tasks: Vec<Task>,
    requests: RequestSequence,
}

impl<S: TaskStore + Send + Sync> TaskListViewModel<S> {
    /// Create a view model that will fetch tasks passing `filter`.
    /// Nothing is fetched until the first [`Self::load`]/[`Self::refresh`]/focus event
    pub fn new(store: S, filter: TaskFilter) -> Self {
        Self {
            store,
            filter,
            state: LoadState::Idle,
            tasks: Vec::new(),
            requests: RequestSequence::new(),
        }
    }

    /// Replace the filter and fetch
    pub async fn load(&mut self, filter: TaskFilter) {
        self.filter = filter;
        self.fetch().await;
    }

    /// Re-fetch with the current filter (pull-to-refresh).
    /// Concurrent refreshes are not coalesced; the request sequence makes sure
    /// only the most recent one commits its result
    pub async fn refresh(&mut self) {
        self.fetch().await;
    }

    async fn fetch(&mut self) {
        let token = self.requests.begin();
        self.state = LoadState::Loading;

        let result = self.store.select(&self.filter).await;

        if !self.requests.is_current(token) {
            log::debug!("Dropping a stale task list response");
            return;
        }

        match result {
            Ok(mut tasks) => {
                // The ordering is part of this view's contract, whatever the
                // store actually returned
                sort_by_due_date(&mut tasks, self.filter.order());
                self.tasks = tasks;
            }
            Err(err) => {
                // Fail soft: the screen shows an empty list rather than hanging
                // on a network hiccup. See the crate docs for the trade-off.
                log::warn!("Error fetching tasks: {}", err);
                self.tasks.clear();
            }
        }
        self.state = LoadState::Ready;
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    /// The last committed slice of tasks, in display order
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Whether the screen should show its "no tasks" placeholder
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn filter(&self) -> &TaskFilter {
        &self.filter
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

#[async_trait]
impl<S: TaskStore + Send + Sync> FocusAware for TaskListViewModel<S> {
    async fn on_focus(&mut self) {
        self.refresh().await;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::mock_behaviour::MockBehaviour;
    use crate::store::memory::MemoryStore;
    use crate::store::SortDirection;
    use crate::task::{NewTask, Priority, TaskStatus};

    async fn store_with_fixtures() -> MemoryStore {
        let store = MemoryStore::new();
        for (title, due, priority) in &[
            ("essay draft", "2024-07-01", Priority::High),
            ("flashcards", "2024-06-01", Priority::High),
            ("laundry", "2024-06-15", Priority::Low),
        ] {
            store
                .insert(NewTask::new(*title, *due, *priority).unwrap())
                .await
                .unwrap();
        }
        store
    }

    #[tokio::test]
    async fn load_filters_and_orders_ascending() {
        let _ = env_logger::builder().is_test(true).try_init();
        let store = store_with_fixtures().await;
        let mut vm = TaskListViewModel::new(store, TaskFilter::all().with_priority(Priority::High));

        assert_eq!(vm.state(), LoadState::Idle);
        vm.refresh().await;
        assert_eq!(vm.state(), LoadState::Ready);

        let titles: Vec<&str> = vm.tasks().iter().map(|t| t.title()).collect();
        assert_eq!(titles, vec!["flashcards", "essay draft"]);
    }

    #[tokio::test]
    async fn history_screen_orders_descending() {
        let store = store_with_fixtures().await;
        let completed = store.select(&TaskFilter::all()).await.unwrap();
        store
            .update(
                completed[0].id(),
                crate::task::TaskPatch::new().with_status(TaskStatus::Completed),
            )
            .await
            .unwrap();

        let filter = TaskFilter::all()
            .with_status(TaskStatus::Completed)
            .with_order(SortDirection::Descending);
        let mut vm = TaskListViewModel::new(store, filter);
        vm.refresh().await;

        assert_eq!(vm.tasks().len(), 1);
        assert!(vm.tasks()[0].status().is_completed());
    }

    #[tokio::test]
    async fn remote_failure_fails_soft_to_empty() {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut store = store_with_fixtures().await;
        store.set_mock_behaviour(Some(Arc::new(Mutex::new(MockBehaviour::fail_now(1)))));

        let mut vm = TaskListViewModel::new(store, TaskFilter::all());
        vm.refresh().await;

        // resolved, not stuck in Loading, and empty
        assert_eq!(vm.state(), LoadState::Ready);
        assert!(vm.is_empty());

        // the store has recovered; the next refresh repopulates the list
        vm.refresh().await;
        assert_eq!(vm.tasks().len(), 3);
    }

    #[tokio::test]
    async fn focus_event_triggers_a_fetch() {
        use crate::viewmodel::{drive_screen_events, screen_event_channel, ScreenEvent};

        let store = store_with_fixtures().await;
        let mut vm = TaskListViewModel::new(store, TaskFilter::all());

        let (sender, mut receiver) = screen_event_channel();
        sender.send(ScreenEvent::Focused).unwrap();
        sender.send(ScreenEvent::Focused).unwrap();
        drop(sender);
        drive_screen_events(&mut vm, &mut receiver).await;

        assert_eq!(vm.state(), LoadState::Ready);
        assert_eq!(vm.tasks().len(), 3);
        assert_eq!(vm.store().call_counts().select, 2);
    }
}
