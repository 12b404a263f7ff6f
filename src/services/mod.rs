//! Business logic services
//!
//! This module contains service layer components that encapsulate
//! business logic, separated from HTTP concerns.

pub mod clock;
pub mod lifecycle;

pub use clock::{Clock, ManualClock, SystemClock};
pub use lifecycle::SecretLifecycleManager;
