//! CLI subcommands — check, validate, plan, init, fingerprint.

use crate::core::{driver, parser, types};
use crate::tripwire::hasher;
use clap::{Args, Subcommand};
use std::path::{Path, PathBuf};

/// Where the options come from, plus command-line overrides.
#[derive(Args, Debug, Clone, Default)]
pub struct Target {
    /// Path to terracheck.yaml
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Terraform directory (overrides the file; no file needed)
    #[arg(short, long)]
    pub dir: Option<PathBuf>,

    /// Terraform variable, NAME=VALUE (repeatable)
    #[arg(long = "var", value_name = "NAME=VALUE")]
    pub vars: Vec<String>,

    /// Environment variable for terraform, NAME=VALUE (repeatable)
    #[arg(long = "env", value_name = "NAME=VALUE")]
    pub envs: Vec<String>,

    /// Terraform executable
    #[arg(long)]
    pub binary: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run init, validate and plan; stop on the first failure
    Check {
        #[command(flatten)]
        target: Target,

        /// Print the run report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run init and validate only
    Validate {
        #[command(flatten)]
        target: Target,
    },

    /// Run plan only (the directory must already be initialized)
    Plan {
        #[command(flatten)]
        target: Target,
    },

    /// Write a starter terracheck.yaml
    Init {
        /// Directory to initialize (default: current)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Terraform directory, relative to PATH
        #[arg(long, default_value = "terraform")]
        terraform_dir: PathBuf,
    },

    /// Print the BLAKE3 fingerprint of a directory's definition files
    Fingerprint {
        /// Terraform directory
        #[arg(short, long, default_value = ".")]
        dir: PathBuf,
    },
}

const DEFAULT_OPTIONS_FILE: &str = "terracheck.yaml";

/// Dispatch a CLI command.
pub fn dispatch(cmd: Commands) -> Result<(), String> {
    match cmd {
        Commands::Check { target, json } => cmd_check(&target, json),
        Commands::Validate { target } => cmd_validate(&target),
        Commands::Plan { target } => cmd_plan(&target),
        Commands::Init { path, terraform_dir } => cmd_init(&path, &terraform_dir),
        Commands::Fingerprint { dir } => cmd_fingerprint(&dir),
    }
}

/// Build options from the target: file (or bare `--dir`), then overrides,
/// then validation.
pub fn load_options(target: &Target) -> Result<types::TerraformOptions, String> {
    let mut opts = match (&target.file, &target.dir) {
        (Some(file), _) => parser::parse_options_file(file).map_err(|e| e.to_string())?,
        (None, Some(dir)) => types::TerraformOptions::new(dir),
        (None, None) => parser::parse_options_file(Path::new(DEFAULT_OPTIONS_FILE))
            .map_err(|e| format!("{} (pass --dir or --file)", e))?,
    };

    if let Some(dir) = &target.dir {
        opts.terraform_dir.clone_from(dir);
    }
    if let Some(binary) = &target.binary {
        opts.binary.clone_from(binary);
    }
    for kv in &target.vars {
        let (k, v) = parse_kv(kv)?;
        opts.vars.insert(k, serde_yaml_ng::Value::String(v));
    }
    for kv in &target.envs {
        let (k, v) = parse_kv(kv)?;
        opts.env_vars.insert(k, v);
    }

    parser::check_options(&opts).map_err(|e| e.to_string())?;
    Ok(opts)
}

/// Split `NAME=VALUE` at the first `=`.
fn parse_kv(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((k, v)) if !k.is_empty() => Ok((k.to_string(), v.to_string())),
        _ => Err(format!("expected NAME=VALUE, got '{}'", s)),
    }
}

fn cmd_check(target: &Target, json: bool) -> Result<(), String> {
    let opts = load_options(target)?;
    let report = driver::run(&opts).map_err(|e| e.to_string())?;

    if json {
        let out = serde_json::to_string_pretty(&report)
            .map_err(|e| format!("cannot serialize report: {}", e))?;
        println!("{}", out);
        return Ok(());
    }

    println!("Checked: {}", report.terraform_dir.display());
    for step in &report.steps {
        let retries = if step.attempts > 1 {
            format!(" ({} attempts)", step.attempts)
        } else {
            String::new()
        };
        println!("  ok  {:<8} {:.1}s{}", step.step, step.duration_seconds, retries);
    }
    print_summary(report.plan.as_ref());
    if report.definitions_changed() {
        println!("WARNING: definition files changed during the run");
    }
    Ok(())
}

fn cmd_validate(target: &Target) -> Result<(), String> {
    let opts = load_options(target)?;
    driver::init_and_validate(&opts).map_err(|e| e.to_string())?;
    println!("OK: {} (init + validate)", opts.terraform_dir.display());
    Ok(())
}

fn cmd_plan(target: &Target) -> Result<(), String> {
    let opts = load_options(target)?;
    let (_, summary) = driver::plan(&opts).map_err(|e| e.to_string())?;
    print_summary(summary.as_ref());
    Ok(())
}

fn print_summary(summary: Option<&types::PlanSummary>) {
    match summary {
        Some(s) if s.has_changes() => println!("Plan: {}.", s),
        Some(_) => println!("Plan: no changes."),
        None => println!("Plan: succeeded (no summary line in output)."),
    }
}

fn cmd_init(path: &Path, terraform_dir: &Path) -> Result<(), String> {
    let config_path = path.join(DEFAULT_OPTIONS_FILE);
    if config_path.exists() {
        return Err(format!("{} already exists", config_path.display()));
    }
    std::fs::create_dir_all(path)
        .map_err(|e| format!("cannot create {}: {}", path.display(), e))?;

    let template = format!(
        r#"# Relative paths resolve against this file's directory.
terraform_dir: {}
binary: terraform

# Passed as -var NAME=VALUE to plan.
vars: {{}}

# Environment for every terraform process.
env_vars: {{}}

no_color: true
lock: false

retry:
  max_retries: 0
  time_between_retries_secs: 5
  retryable_errors: {{}}
"#,
        terraform_dir.display()
    );
    std::fs::write(&config_path, template)
        .map_err(|e| format!("cannot write {}: {}", config_path.display(), e))?;

    println!("Initialized terracheck at {}", path.display());
    println!("  Created: {}", config_path.display());
    Ok(())
}

fn cmd_fingerprint(dir: &Path) -> Result<(), String> {
    let files = hasher::definition_files(dir)?;
    let hash = hasher::hash_definitions(dir)?;
    println!("{}  {} ({} files)", hash, dir.display(), files.len());
    Ok(())
}
