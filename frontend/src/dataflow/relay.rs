//! Event relays
//!
//! A [`Relay`] is the write end of an event stream consumed by exactly one
//! actor loop. Several relays can be funneled into one queue so an actor sees
//! events from different sources in the order they were emitted.

use futures::channel::mpsc::{UnboundedReceiver, UnboundedSender, unbounded};
use std::fmt;
use std::sync::{Arc, Weak};

type Emit<T> = dyn Fn(T) -> Result<(), RelayError> + Send + Sync;

/// Typed event emitter for the Actor+Relay architecture.
///
/// Relays deliver events from UI controls, timers and loaders to the one
/// actor loop that owns the affected state. Clones share the same queue.
///
/// # Event-Source Naming Convention
///
/// Relays follow the `{source}_{event}_relay` naming pattern:
/// - `play_toggled_relay` - user pressed play / pause
/// - `seek_requested_relay` - user scrubbed to a position
/// - `ticker_fired_relay` - the playback ticker elapsed
///
/// # Examples
///
/// ```rust,ignore
/// use crate::dataflow::relay;
/// use futures::StreamExt;
///
/// let (seek_requested_relay, mut seek_requested_stream) = relay::<i64>();
///
/// // Emit from the scrubber
/// seek_requested_relay.send(4_000);
///
/// // Consume in the actor loop
/// while let Some(ms) = seek_requested_stream.next().await {
///     log::debug!("seek to {ms}ms");
/// }
/// ```
pub struct Relay<T>
where
    T: Send + 'static,
{
    emit: Arc<Emit<T>>,
}

/// Non-owning handle to a [`Relay`].
///
/// Holding it does not keep the actor's queue open: once every [`Relay`]
/// clone is dropped, sends fail with [`RelayError::ChannelClosed`]. Timers
/// and other background emitters use it so they stop together with the
/// view that owns the actor.
pub struct WeakRelay<T>
where
    T: Send + 'static,
{
    emit: Weak<Emit<T>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RelayError {
    /// The consuming actor is gone, or no owning relay is left.
    #[error("relay receiver was dropped")]
    ChannelClosed,
}

impl<T> Relay<T>
where
    T: Send + 'static,
{
    /// Creates a relay with its own receiver stream.
    ///
    /// Returns `(Relay, UnboundedReceiver)` following Rust's channel
    /// conventions. [`relay`] is the shorter spelling.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let (next_slot_pressed_relay, next_slot_pressed_stream) = Relay::<()>::new();
    /// ```
    pub fn new() -> (Self, UnboundedReceiver<T>) {
        let (sender, receiver) = unbounded();
        (Self::funnel(sender, |value| value), receiver)
    }

    /// Creates a relay that wraps each value with `wrap` and pushes it into
    /// a queue shared with other relays.
    ///
    /// Events from all relays funneled into one queue arrive in emission
    /// order, which separate channels polled with `select!` do not
    /// guarantee.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// enum PlayerEvent {
    ///     Seek(i64),
    ///     Toggle,
    /// }
    ///
    /// let (sender, mut events) = futures::channel::mpsc::unbounded();
    /// let seek_requested_relay = Relay::funnel(sender.clone(), PlayerEvent::Seek);
    /// let play_toggled_relay = Relay::funnel(sender, |()| PlayerEvent::Toggle);
    /// ```
    pub fn funnel<E>(sender: UnboundedSender<E>, wrap: fn(T) -> E) -> Self
    where
        E: Send + 'static,
    {
        Self {
            emit: Arc::new(move |value| {
                sender
                    .unbounded_send(wrap(value))
                    .map_err(|_| RelayError::ChannelClosed)
            }),
        }
    }

    /// Sends an event through the relay.
    ///
    /// If the actor has stopped (receiver dropped), the event is silently
    /// discarded. Use [`Relay::try_send`] to observe that.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// play_toggled_relay.send(());
    /// ```
    pub fn send(&self, value: T) {
        let _ = (self.emit)(value);
    }

    /// Sends an event, reporting a stopped actor as
    /// [`RelayError::ChannelClosed`].
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// if ticker_fired_relay.try_send(tick).is_err() {
    ///     // the playback actor is gone, stop ticking
    /// }
    /// ```
    pub fn try_send(&self, value: T) -> Result<(), RelayError> {
        (self.emit)(value)
    }

    /// Handle that can send while this relay (or a clone) is alive, without
    /// keeping the actor's queue open itself.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let ticker = ticker_fired_relay.downgrade();
    /// drop(ticker_fired_relay);
    /// assert!(ticker.try_send(tick).is_err());
    /// ```
    pub fn downgrade(&self) -> WeakRelay<T> {
        WeakRelay {
            emit: Arc::downgrade(&self.emit),
        }
    }
}

impl<T> WeakRelay<T>
where
    T: Send + 'static,
{
    pub fn try_send(&self, value: T) -> Result<(), RelayError> {
        match self.emit.upgrade() {
            Some(emit) => emit(value),
            None => Err(RelayError::ChannelClosed),
        }
    }

    /// False once every owning [`Relay`] clone has been dropped.
    pub fn is_connected(&self) -> bool {
        self.emit.strong_count() > 0
    }
}

impl<T> Clone for Relay<T>
where
    T: Send + 'static,
{
    fn clone(&self) -> Self {
        Self {
            emit: Arc::clone(&self.emit),
        }
    }
}

impl<T> Clone for WeakRelay<T>
where
    T: Send + 'static,
{
    fn clone(&self) -> Self {
        Self {
            emit: Weak::clone(&self.emit),
        }
    }
}

impl<T> fmt::Debug for Relay<T>
where
    T: Send + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Relay")
            .field("event", &std::any::type_name::<T>())
            .finish()
    }
}

impl<T> fmt::Debug for WeakRelay<T>
where
    T: Send + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakRelay")
            .field("event", &std::any::type_name::<T>())
            .field("connected", &self.is_connected())
            .finish()
    }
}

impl<T> Default for Relay<T>
where
    T: Send + 'static,
{
    /// Creates a relay whose receiver is immediately dropped.
    ///
    /// Every event sent through it is discarded. Useful as a placeholder in
    /// structs before the real actor is wired, and in tests that do not care
    /// about a particular event source.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// struct SlotControls {
    ///     mode_switched_relay: Relay<PlaybackMode>,
    /// }
    ///
    /// let controls = SlotControls {
    ///     mode_switched_relay: Relay::default(),
    /// };
    /// ```
    fn default() -> Self {
        let (relay, _receiver) = Self::new();
        relay
    }
}

/// Creates a relay with its own receiver stream.
///
/// The idiomatic way to create a relay for an actor loop.
///
/// # Examples
///
/// ```rust,ignore
/// use crate::dataflow::{Actor, relay};
/// use futures::StreamExt;
///
/// let (seek_requested_relay, mut seek_requested_stream) = relay::<i64>();
///
/// let (position, task) = Actor::new(0, async move |state| {
///     while let Some(ms) = seek_requested_stream.next().await {
///         state.set_neq(ms);
///     }
/// });
/// ```
pub fn relay<T>() -> (Relay<T>, UnboundedReceiver<T>)
where
    T: Send + 'static,
{
    Relay::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[derive(Debug, PartialEq)]
    enum Control {
        Seek(i64),
        Toggle(()),
    }

    #[tokio::test]
    async fn test_relay_delivers_events() {
        let (seek_requested_relay, mut seek_requested_stream) = relay::<i64>();

        seek_requested_relay.send(4_000);
        seek_requested_relay.send(-5);

        assert_eq!(seek_requested_stream.next().await, Some(4_000));
        assert_eq!(seek_requested_stream.next().await, Some(-5));
    }

    #[tokio::test]
    async fn test_relay_try_send_after_receiver_dropped() {
        let (relay, mut receiver) = Relay::new();

        assert!(relay.try_send("tick".to_string()).is_ok());
        assert_eq!(receiver.next().await, Some("tick".to_string()));

        drop(receiver);

        assert_eq!(relay.try_send("late".to_string()), Err(RelayError::ChannelClosed));
        relay.send("ignored".to_string());
    }

    #[tokio::test]
    async fn test_funneled_relays_keep_emission_order() {
        let (sender, mut queue) = unbounded();
        let seek_requested_relay = Relay::funnel(sender.clone(), Control::Seek);
        let play_toggled_relay = Relay::funnel(sender, Control::Toggle);

        seek_requested_relay.send(100);
        play_toggled_relay.send(());
        seek_requested_relay.clone().send(200);

        assert_eq!(queue.next().await, Some(Control::Seek(100)));
        assert_eq!(queue.next().await, Some(Control::Toggle(())));
        assert_eq!(queue.next().await, Some(Control::Seek(200)));
    }

    #[tokio::test]
    async fn test_default_relay_is_disconnected() {
        let relay = Relay::<u64>::default();
        assert_eq!(relay.try_send(1), Err(RelayError::ChannelClosed));
    }

    #[tokio::test]
    async fn test_weak_relay_does_not_hold_queue_open() {
        let (ticker_fired_relay, mut ticker_fired_stream) = relay::<u64>();
        let ticker = ticker_fired_relay.downgrade();

        assert!(ticker.is_connected());
        assert_eq!(ticker.try_send(7), Ok(()));
        assert_eq!(ticker_fired_stream.next().await, Some(7));

        let clone = ticker_fired_relay.clone();
        drop(ticker_fired_relay);
        assert!(ticker.is_connected());
        drop(clone);

        assert!(!ticker.is_connected());
        assert_eq!(ticker.try_send(8), Err(RelayError::ChannelClosed));
        assert_eq!(ticker_fired_stream.next().await, None);
    }
}
