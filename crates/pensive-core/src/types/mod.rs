//! Shared domain types used across all Pensive crates.

pub mod channel;
pub mod samples;
pub mod window;

pub use channel::ChannelId;
pub use samples::{ChannelTrace, SampleBuffer};
