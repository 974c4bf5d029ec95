//! View model for the calendar screen
//!
//! The calendar shows one dot per task on each day, and highlights the selected
//! day. The marker map driving this is derived locally from the last full fetch:
//! tapping a different day re-derives the highlight in place and never goes back
//! to the store.

use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use chrono::{Local, NaiveDate};

use crate::store::{TaskFilter, TaskStore};
use crate::task::{Task, TaskId};
use crate::viewmodel::{FocusAware, LoadState, RequestSequence};

/// The derived per-date aggregation record that drives calendar marking.
///
/// Markers are ephemeral: they are rebuilt on every fetch and every selection
/// change, and carry no persisted identity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DateMarker {
    date: NaiveDate,
    task_ids: HashSet<TaskId>,
    selected: bool,
}

impl DateMarker {
    fn new(date: NaiveDate) -> Self {
        Self {
            date,
            task_ids: HashSet::new(),
            selected: false,
        }
    }

    pub fn date(&self) -> &NaiveDate {
        &self.date
    }

    /// The tasks due on this date (order irrelevant). The calendar renders one
    /// dot per id
    pub fn task_ids(&self) -> &HashSet<TaskId> {
        &self.task_ids
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }
}

/// Maintains the selected date and the derived marker map for one calendar screen
pub struct CalendarViewModel<S: TaskStore> {
    store: S,
    selected_date: NaiveDate,
    /// The last-fetched full task set
    tasks: Vec<Task>,
    markers: BTreeMap<NaiveDate, DateMarker>,
    state: LoadState,
    requests: RequestSequence,
}

impl<S: TaskStore + Send + Sync> CalendarViewModel<S> {
    /// Create a view model with "today" (local calendar) selected
    pub fn new(store: S) -> Self {
        Self::with_selected_date(store, Local::now().date_naive())
    }

    /// Create a view model with a chosen initial selection.
    /// This is what tests use instead of depending on the wall clock
    pub fn with_selected_date(store: S, selected_date: NaiveDate) -> Self {
        Self {
            store,
            selected_date,
            tasks: Vec::new(),
            markers: BTreeMap::new(),
            state: LoadState::Idle,
            requests: RequestSequence::new(),
        }
    }

    /// Fetch the complete task set and rebuild the marker map.
    ///
    /// Remote failures fail soft: the calendar shows no dots rather than an
    /// error, and the cause is only logged
    pub async fn load_all(&mut self) {
        let token = self.requests.begin();
        self.state = LoadState::Loading;

        let result = self.store.select(&TaskFilter::all()).await;

        if !self.requests.is_current(token) {
            log::debug!("Dropping a stale calendar response");
            return;
        }

        match result {
            Ok(tasks) => self.tasks = tasks,
            Err(err) => {
                log::warn!("Error fetching tasks for the calendar: {}", err);
                self.tasks.clear();
            }
        }
        self.rebuild_markers();
        self.state = LoadState::Ready;
    }

    /// Change the selected date and re-derive the highlight in place.
    ///
    /// This never touches the store: it only walks the existing marker map.
    /// Calling it twice with the same date is a no-op the second time
    pub fn select_date(&mut self, date: NaiveDate) {
        if self.state != LoadState::Ready {
            log::debug!("Ignoring a date selection while no task set is loaded");
            return;
        }
        self.selected_date = date;
        self.apply_selection();
    }

    /// The full task records due on the selected date.
    /// Recomputed from the retained task set on each call
    pub fn tasks_for_selected_date(&self) -> impl Iterator<Item = &Task> + '_ {
        let selected = self.selected_date;
        self.tasks
            .iter()
            .filter(move |task| task.due_date() == Some(&selected))
    }

    pub fn selected_date(&self) -> &NaiveDate {
        &self.selected_date
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    /// The derived marker map, keyed by date
    pub fn markers(&self) -> &BTreeMap<NaiveDate, DateMarker> {
        &self.markers
    }

    pub fn marker(&self, date: &NaiveDate) -> Option<&DateMarker> {
        self.markers.get(date)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Rebuild the marker map from the retained task set: one marker per
    /// distinct due date, holding every id due that day
    fn rebuild_markers(&mut self) {
        self.markers.clear();
        for task in &self.tasks {
            let date = match task.due_date() {
                // Rows without a due date cannot be placed on the calendar
                None => continue,
                Some(d) => *d,
            };
            self.markers
                .entry(date)
                .or_insert_with(|| DateMarker::new(date))
                .task_ids
                .insert(*task.id());
        }
        self.apply_selection();
    }

    /// Make exactly the selected date's marker highlighted.
    ///
    /// The selected date is always present afterwards (inserted empty if it had
    /// no tasks); markers left both unselected and empty are dropped so the map
    /// stays sparse.
    fn apply_selection(&mut self) {
        let selected_date = self.selected_date;
        self.markers
            .entry(selected_date)
            .or_insert_with(|| DateMarker::new(selected_date));
        for (date, marker) in self.markers.iter_mut() {
            marker.selected = *date == selected_date;
        }
        self.markers
            .retain(|_, marker| marker.selected || !marker.task_ids.is_empty());
    }
}

#[async_trait]
impl<S: TaskStore + Send + Sync> FocusAware for CalendarViewModel<S> {
    async fn on_focus(&mut self) {
        self.load_all().await;
    }
}
