//! Single-value Actor
//!
//! An [`Actor`] is the read side of a value owned by one processing loop.
//! Only the loop holds the writer; everyone else observes through signals.

use futures_signals::signal::{Mutable, Signal};
use std::future::Future;

/// Reactive state container for the Actor+Relay architecture.
///
/// The owning loop receives events from relays and writes the state; views
/// bind to [`Actor::signal`]. Clones observe the same value.
///
/// # Core Principles
///
/// - **Sequential Processing**: one loop owns the writer and applies events
///   in order
/// - **Signal Access**: views subscribe instead of polling
/// - **Event-Driven**: every change originates from a relay event
///
/// # Examples
///
/// ```rust,ignore
/// use crate::dataflow::{Actor, relay};
/// use futures::StreamExt;
///
/// let (play_toggled_relay, mut play_toggled_stream) = relay::<()>();
///
/// let (is_playing, task) = Actor::new(false, async move |state| {
///     while play_toggled_stream.next().await.is_some() {
///         state.replace_with(|playing| !*playing);
///     }
/// });
/// wasm_bindgen_futures::spawn_local(task);
///
/// // Bind to the view
/// is_playing.signal()
/// ```
#[derive(Clone, Debug)]
pub struct Actor<T>
where
    T: Clone + Send + Sync + 'static,
{
    state: Mutable<T>,
}

impl<T> Actor<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Creates an actor with an initial value and its processing task.
    ///
    /// The processor receives the only writer and should loop over its relay
    /// streams. The returned task does nothing until the caller spawns it on
    /// an executor (`spawn_local` in the browser, `tokio::spawn` in tests).
    /// It should end when its streams end, i.e. once every relay feeding it
    /// is dropped.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let (seek_requested_relay, mut seek_requested_stream) = relay();
    /// let (position, task) = Actor::new(0, async move |state| {
    ///     while let Some(ms) = seek_requested_stream.next().await {
    ///         state.set_neq(ms);
    ///     }
    /// });
    /// tokio::spawn(task);
    /// ```
    pub fn new<F, Fut>(initial_state: T, processor: F) -> (Self, Fut)
    where
        F: FnOnce(Mutable<T>) -> Fut,
        Fut: Future<Output = ()>,
    {
        let (actor, writer) = Self::cell(initial_state);
        (actor, processor(writer))
    }

    /// Creates an actor plus its writer, for one loop that owns several
    /// actors and must update them in a fixed order.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let (state, state_writer) = Actor::cell(clock.state());
    /// let (snapshot, snapshot_writer) = Actor::cell(initial_snapshot);
    /// // move both writers into the same loop
    /// ```
    pub fn cell(initial_state: T) -> (Self, Mutable<T>) {
        let state = Mutable::new(initial_state);
        (Self { state: state.clone() }, state)
    }

    /// Signal of the current value, then of every change.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let slot_label = playback.state.signal().map(|state| state.slot.to_string());
    /// ```
    pub fn signal(&self) -> impl Signal<Item = T> + use<T> {
        self.state.signal_cloned()
    }

    /// Signal of a projection of the value, without cloning the whole value.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let nodes_seen = playback.snapshot.signal_ref(|snapshot| snapshot.visible_points.len());
    /// ```
    pub fn signal_ref<U>(&self, f: impl FnMut(&T) -> U) -> impl Signal<Item = U> {
        self.state.signal_ref(f)
    }

    /// Latest value, for timers and tests that sample instead of subscribing.
    pub fn current(&self) -> T {
        self.state.get_cloned()
    }
}
