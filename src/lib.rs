//! terracheck — drive terraform `init`, `validate` and `plan` from tests and CI.
//!
//! Nothing is ever applied or destroyed. A run stops at the first failing
//! step and reports which half failed: init/validate or plan.

pub mod cli;
pub mod core;
pub mod logging;
pub mod transport;
pub mod tripwire;
