//! Background jobs: the update-notification sweep and LTI grade passback.

pub mod notify;
pub mod outcome;
pub mod queue;
