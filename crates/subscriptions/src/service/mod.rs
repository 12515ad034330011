//! Remote subscription service abstraction
//!
//! The sync engine only sees [`SubscriptionService`]; the YouTube client and
//! the in-memory fake both implement it.

mod memory;
mod traits;

pub use memory::InMemorySubscriptionService;
pub use traits::{InsertError, SubscriptionPage, SubscriptionService};
