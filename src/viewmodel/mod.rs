//! Per-screen view models
//!
//! Each screen instance owns exactly one view model; nothing here is shared
//! between screens. A view model's remote fetch is its only suspending
//! operation, and its load-state always moves `Idle -> Loading -> Ready`
//! (and back to `Loading` on every reload).

use async_trait::async_trait;

pub mod calendar;
pub mod task_list;

/// Where a view model is in its fetch cycle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadState {
    /// No fetch has been requested yet
    Idle,
    /// A fetch is in flight
    Loading,
    /// The last fetch has resolved (possibly to an empty list, see the
    /// fail-soft policy)
    Ready,
}

/// A ticket for one issued fetch, handed out by [`RequestSequence`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct RequestToken(u64);

/// Monotonically increasing fetch numbering.
///
/// Rapid repeated focus events can start a fetch while an older one is still in
/// flight. Responses are only allowed to commit to the view model's state when
/// they carry the latest issued token, so a slow old response can never clobber
/// a newer one.
#[derive(Debug, Default)]
pub(crate) struct RequestSequence {
    issued: u64,
}

impl RequestSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number a new fetch
    pub fn begin(&mut self) -> RequestToken {
        self.issued += 1;
        RequestToken(self.issued)
    }

    /// Whether a response carrying this token may commit its result
    pub fn is_current(&self, token: RequestToken) -> bool {
        token.0 == self.issued
    }
}

/// The screen-level events a view model reacts to.
///
/// The triggering condition (the mobile shell's "this screen regained focus"
/// callback) is kept outside the crate; tests push events by hand.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScreenEvent {
    /// The screen became visible again and should show fresh data
    Focused,
}

pub type ScreenEventSender = tokio::sync::mpsc::UnboundedSender<ScreenEvent>;
pub type ScreenEventReceiver = tokio::sync::mpsc::UnboundedReceiver<ScreenEvent>;

/// Create a channel a screen shell can push [`ScreenEvent`]s into
pub fn screen_event_channel() -> (ScreenEventSender, ScreenEventReceiver) {
    tokio::sync::mpsc::unbounded_channel()
}

/// Implemented by view models that reload when their screen regains focus
#[async_trait]
pub trait FocusAware {
    async fn on_focus(&mut self);
}

/// Forward screen events to a view model until the sending side is dropped
pub async fn drive_screen_events<V>(view_model: &mut V, events: &mut ScreenEventReceiver)
where
    V: FocusAware + Send,
{
    while let Some(event) = events.recv().await {
        match event {
            ScreenEvent::Focused => view_model.on_focus().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_the_latest_token_commits() {
        let mut sequence = RequestSequence::new();

        let first = sequence.begin();
        assert!(sequence.is_current(first));

        // a newer fetch is issued while the first is in flight
        let second = sequence.begin();
        assert!(!sequence.is_current(first));
        assert!(sequence.is_current(second));

        let third = sequence.begin();
        assert!(!sequence.is_current(first));
        assert!(!sequence.is_current(second));
        assert!(sequence.is_current(third));
    }
}
