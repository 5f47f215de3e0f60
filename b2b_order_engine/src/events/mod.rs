//! Events published by the engine APIs.
//!
//! | event | published by |
//! |-------|--------------|
//! | [`UserRegisteredEvent`] | registration and email changes |
//! | [`PasswordResetRequestedEvent`] | password reset requests |
//! | [`OrdersPlacedEvent`] | basket placement |
//! | [`OrderStateChangedEvent`] | administrative state changes |
//!
//! Register hooks on [`EventHooks`], turn them into [`EventHandlers`], and hand the resulting [`EventProducers`] to
//! the APIs.
mod channel;
mod event_types;
mod hooks;

pub use channel::{EventHandler, EventProducer, Handler};
pub use event_types::{OrderStateChangedEvent, OrdersPlacedEvent, PasswordResetRequestedEvent, UserRegisteredEvent};
pub use hooks::{EventHandlers, EventHooks, EventProducers};
