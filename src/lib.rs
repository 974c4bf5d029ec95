//! This crate is the client-side core of a study-planner app.
//!
//! The app's data lives in a hosted backend (a relational row store plus an auth
//! service), consumed through the [`TaskStore`](store::TaskStore) and
//! [`AuthSource`](auth::AuthSource) traits. The [`store::rest`] module talks to the
//! real backend; the [`store::memory`] module keeps rows locally and is what the
//! test suite runs against.
//!
//! On top of the store sit the two per-screen view models in [`viewmodel`]:
//!
//! * [`TaskListViewModel`](viewmodel::task_list::TaskListViewModel) produces the
//!   filtered, due-date-ordered slices behind the list screens, and
//! * [`CalendarViewModel`](viewmodel::calendar::CalendarViewModel) derives the
//!   per-date [`DateMarker`](viewmodel::calendar::DateMarker) map behind the
//!   calendar screen. Changing the selected day only re-derives that map; it never
//!   re-fetches.
//!
//! Both view models fail soft: a failed fetch resolves to an empty list (logged,
//! not surfaced), so a screen never hangs on a network hiccup. The flip side is
//! that the user cannot tell an empty account from an outage on those screens;
//! this mirrors the product's current choice.

pub mod auth;
pub mod config;
pub mod kv;
pub mod mock_behaviour;
pub mod store;
pub mod viewmodel;

mod task;
pub use task::{
    parse_canonical_date, NewTask, Priority, Task, TaskId, TaskPatch, TaskStatus, ValidationError,
};
pub use viewmodel::calendar::{CalendarViewModel, DateMarker};
pub use viewmodel::task_list::TaskListViewModel;
pub use viewmodel::LoadState;
