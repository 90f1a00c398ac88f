//! Synthetic sample generation
//!
//! Channels with known information content, for validating estimates and for
//! the `simulate` command.

mod channel;

pub use channel::{ChannelInput, NoisyChannel};
