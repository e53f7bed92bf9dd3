//! Options and result types for a terraform driver run.
//!
//! Options derive Serialize/Deserialize so they can live in a YAML file next
//! to the infrastructure definitions. Result types serialize to JSON for
//! `terracheck check --json`.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

// ============================================================================
// Options
// ============================================================================

/// Everything needed to drive terraform against one directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerraformOptions {
    /// Directory holding the `.tf` definitions
    pub terraform_dir: PathBuf,

    /// Executable to invoke
    #[serde(default = "default_binary")]
    pub binary: String,

    /// `-var` overrides (order-preserving)
    #[serde(default)]
    pub vars: IndexMap<String, serde_yaml_ng::Value>,

    /// `-var-file` arguments
    #[serde(default)]
    pub var_files: Vec<PathBuf>,

    /// Environment passed to every terraform process
    #[serde(default)]
    pub env_vars: IndexMap<String, String>,

    /// `-backend-config=k=v` arguments for init
    #[serde(default)]
    pub backend_config: IndexMap<String, String>,

    /// Append `-no-color`
    #[serde(default = "default_true")]
    pub no_color: bool,

    /// `init -upgrade`
    #[serde(default)]
    pub upgrade: bool,

    /// `init -reconfigure`
    #[serde(default)]
    pub reconfigure: bool,

    /// `plan -lock`
    #[serde(default)]
    pub lock: bool,

    /// `plan -out`
    #[serde(default)]
    pub plan_file: Option<PathBuf>,

    /// `plan -detailed-exitcode` (exit 2 = changes present)
    #[serde(default)]
    pub detailed_exitcode: bool,

    /// Retry policy for transient failures
    #[serde(default)]
    pub retry: RetryPolicy,
}

fn default_binary() -> String {
    "terraform".to_string()
}

fn default_true() -> bool {
    true
}

impl TerraformOptions {
    /// Options for `dir` with every pass-through point left unset.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            terraform_dir: dir.into(),
            binary: default_binary(),
            vars: IndexMap::new(),
            var_files: Vec::new(),
            env_vars: IndexMap::new(),
            backend_config: IndexMap::new(),
            no_color: true,
            upgrade: false,
            reconfigure: false,
            lock: false,
            plan_file: None,
            detailed_exitcode: false,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    pub fn with_var(mut self, name: impl Into<String>, value: impl Into<serde_yaml_ng::Value>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    pub fn with_env(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_vars.insert(name.into(), value.into());
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Resolve relative paths against `base` (usually the options file's directory).
    pub fn resolve_paths(&mut self, base: &Path) {
        fn resolve(base: &Path, p: &Path) -> PathBuf {
            if p.is_absolute() {
                p.to_path_buf()
            } else {
                base.join(p)
            }
        }
        self.terraform_dir = resolve(base, &self.terraform_dir);
        self.var_files = self.var_files.iter().map(|f| resolve(base, f)).collect();
        if let Some(plan_file) = &self.plan_file {
            self.plan_file = Some(resolve(base, plan_file));
        }
    }
}

/// Re-run policy for failures whose output matches a known transient error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Extra attempts after the first (0 = never retry)
    #[serde(default)]
    pub max_retries: u32,

    /// Pause between attempts
    #[serde(default)]
    pub time_between_retries_secs: u64,

    /// Regex → human-readable description
    #[serde(default)]
    pub retryable_errors: IndexMap<String, String>,
}

// ============================================================================
// Steps
// ============================================================================

/// A terraform subcommand the driver runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Init,
    Validate,
    Plan,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Init => write!(f, "init"),
            Self::Validate => write!(f, "validate"),
            Self::Plan => write!(f, "plan"),
        }
    }
}

/// Outcome of one successful step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepReport {
    pub step: Step,
    pub exit_code: i32,
    /// Attempts made, including the successful one
    pub attempts: u32,
    pub duration_seconds: f64,
    #[serde(skip)]
    pub stdout: String,
}

// ============================================================================
// Plan
// ============================================================================

/// Resource counts from the `Plan:` line of terraform output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanSummary {
    pub to_add: u32,
    pub to_change: u32,
    pub to_destroy: u32,
}

impl PlanSummary {
    pub fn has_changes(&self) -> bool {
        self.to_add + self.to_change + self.to_destroy > 0
    }
}

impl fmt::Display for PlanSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} to add, {} to change, {} to destroy",
            self.to_add, self.to_change, self.to_destroy
        )
    }
}

// ============================================================================
// Run
// ============================================================================

/// Full result of `driver::run`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub terraform_dir: PathBuf,
    pub steps: Vec<StepReport>,
    /// `None` when plan output carried no recognizable summary line
    pub plan: Option<PlanSummary>,
    pub fingerprint_before: String,
    pub fingerprint_after: String,
}

impl RunReport {
    /// True if the definition files changed while the driver ran.
    pub fn definitions_changed(&self) -> bool {
        self.fingerprint_before != self.fingerprint_after
    }
}
