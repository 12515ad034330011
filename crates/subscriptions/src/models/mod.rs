//! Domain models

mod channel;
mod progress;

pub use channel::ChannelId;
pub use progress::ProgressRecord;
