//! Error types for options loading, command execution, and the driver.

use super::types::Step;

/// A terraform command that could not be run or exited unsuccessfully.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// The binary could not be spawned (missing, not executable)
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The command ran and returned a failing exit code
    #[error("terraform {step} exited with code {exit_code}: {stderr}")]
    Failed {
        step: Step,
        exit_code: i32,
        stderr: String,
    },

    /// A retryable-error pattern did not compile, so the command was not run
    #[error("{0}")]
    RetryPattern(String),
}

/// Failure of a driver run. Each variant halts the run.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("terraform init or validate failed: {0}")]
    InitOrValidate(#[source] CommandError),

    #[error("terraform plan failed: {0}")]
    Plan(#[source] CommandError),

    #[error("cannot fingerprint definitions: {0}")]
    Fingerprint(String),
}

/// Failure to load or validate `TerraformOptions`.
#[derive(Debug, thiserror::Error)]
pub enum OptionsError {
    #[error("failed to read {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("YAML parse error: {0}")]
    Parse(String),

    #[error("{} validation error(s): {}", .0.len(), join(.0))]
    Invalid(Vec<String>),
}

fn join(errors: &[String]) -> String {
    errors.join("; ")
}
