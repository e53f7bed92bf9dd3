//! Options file parsing and validation.
//!
//! Parses terracheck.yaml and validates structural constraints:
//! - terraform_dir must exist and be a directory
//! - binary must not be empty
//! - var, env and backend-config names must be non-empty and free of `=`
//! - var files must exist
//! - retryable error patterns must compile

use super::error::OptionsError;
use super::retry::CompiledRetry;
use super::types::TerraformOptions;
use std::path::Path;

/// Validation error.
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Parse an options file from disk. Relative paths inside it resolve
/// against the file's own directory.
pub fn parse_options_file(path: &Path) -> Result<TerraformOptions, OptionsError> {
    let content = std::fs::read_to_string(path).map_err(|e| OptionsError::Read {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    let mut opts = parse_options(&content)?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));
    opts.resolve_paths(base);
    Ok(opts)
}

/// Parse options from a YAML string. Paths are left as written.
pub fn parse_options(yaml: &str) -> Result<TerraformOptions, OptionsError> {
    serde_yaml_ng::from_str(yaml).map_err(|e| OptionsError::Parse(e.to_string()))
}

/// Validate parsed options. Returns a list of errors (empty = valid).
pub fn validate_options(opts: &TerraformOptions) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut push = |message: String| errors.push(ValidationError { message });

    if !opts.terraform_dir.exists() {
        push(format!(
            "terraform_dir {} does not exist",
            opts.terraform_dir.display()
        ));
    } else if !opts.terraform_dir.is_dir() {
        push(format!(
            "terraform_dir {} is not a directory",
            opts.terraform_dir.display()
        ));
    }

    if opts.binary.trim().is_empty() {
        push("binary must not be empty".to_string());
    }

    let named = [
        ("var", opts.vars.keys().collect::<Vec<_>>()),
        ("env var", opts.env_vars.keys().collect()),
        ("backend config key", opts.backend_config.keys().collect()),
    ];
    for (kind, names) in named {
        for name in names {
            if name.is_empty() {
                push(format!("{} name must not be empty", kind));
            } else if name.contains('=') {
                push(format!("{} name '{}' must not contain '='", kind, name));
            }
        }
    }

    for file in &opts.var_files {
        if !file.is_file() {
            push(format!("var file {} does not exist", file.display()));
        }
    }

    if let Err(e) = CompiledRetry::compile(&opts.retry) {
        push(e);
    }

    errors
}

/// Validate and fold errors into a single `OptionsError`.
pub fn check_options(opts: &TerraformOptions) -> Result<(), OptionsError> {
    let errors = validate_options(opts);
    if errors.is_empty() {
        return Ok(());
    }
    Err(OptionsError::Invalid(
        errors.into_iter().map(|e| e.message).collect(),
    ))
}
