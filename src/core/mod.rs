//! Sampling core for netmon

mod sample_clock;
mod sample_state;
mod subscribers;

pub use sample_clock::{ClockError, SampleClock};
pub use sample_state::SampleState;
pub use subscribers::{SubscriptionId, Subscribers};
