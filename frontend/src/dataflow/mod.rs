//! Dataflow primitives
//!
//! - **[`Relay`]** - typed event emitter feeding one actor loop
//! - **[`Actor`]** - read side of a value owned by that loop
//!
//! Relays follow the `{source}_{event}_relay` naming pattern. State is only
//! written inside the owning loop; views subscribe to its signals.

pub mod actor;
pub mod relay;

pub use actor::Actor;
pub use relay::{Relay, RelayError, WeakRelay, relay};
