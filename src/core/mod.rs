//! Driver logic — options, argv, retries, plan parsing, and the run itself.

pub mod args;
pub mod driver;
pub mod error;
pub mod parser;
pub mod planner;
pub mod retry;
pub mod types;
