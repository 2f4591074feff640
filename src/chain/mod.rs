//! Filter chain structure and change notification.

pub mod structure;
pub mod observer;

pub use structure::{ChainSnapshot, FilterChain};
pub use observer::{ChainEvent, ChainListener, SubscriptionId};
