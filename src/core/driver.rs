//! Terraform driver — init, validate, then plan, stopping on the first failure.
//!
//! The driver never applies or destroys anything, so a run leaves no
//! resources behind. Each call is independent; nothing is shared between
//! concurrent runs except the terraform binary itself.

use super::args;
use super::error::{CommandError, DriverError};
use super::planner;
use super::retry::CompiledRetry;
use super::types::{PlanSummary, RunReport, Step, StepReport, TerraformOptions};
use crate::transport::{local, ExecOutput};
use crate::tripwire::hasher;
use std::time::Instant;

/// Run `terraform init` then `terraform validate`.
///
/// Validate is not attempted if init fails.
pub fn init_and_validate(opts: &TerraformOptions) -> Result<Vec<StepReport>, DriverError> {
    let retry = compile_retry(opts).map_err(DriverError::InitOrValidate)?;
    let mut reports = Vec::with_capacity(2);
    for step in [Step::Init, Step::Validate] {
        let report = run_step(step, opts, &retry).map_err(DriverError::InitOrValidate)?;
        reports.push(report);
    }
    Ok(reports)
}

/// Run `terraform plan` and parse its summary line.
///
/// With `detailed_exitcode`, exit code 2 (changes present) counts as success.
/// The summary is `None` when plan output carries no summary line.
pub fn plan(opts: &TerraformOptions) -> Result<(StepReport, Option<PlanSummary>), DriverError> {
    let retry = compile_retry(opts).map_err(DriverError::Plan)?;
    let report = run_step(Step::Plan, opts, &retry).map_err(DriverError::Plan)?;
    let summary = planner::parse_plan_summary(&report.stdout);
    Ok((report, summary))
}

/// Full run: fingerprint, init+validate, plan, fingerprint.
pub fn run(opts: &TerraformOptions) -> Result<RunReport, DriverError> {
    let dir = &opts.terraform_dir;
    let fingerprint_before = hasher::hash_definitions(dir).map_err(DriverError::Fingerprint)?;
    tracing::info!(dir = %dir.display(), fingerprint = %fingerprint_before, "starting terraform run");

    let mut steps = init_and_validate(opts)?;
    tracing::info!(dir = %dir.display(), "terraform init and validate successful");

    let (plan_report, summary) = plan(opts)?;
    match &summary {
        Some(s) => tracing::info!(dir = %dir.display(), plan = %s, "terraform plan successful"),
        None => tracing::info!(dir = %dir.display(), "terraform plan successful"),
    }
    steps.push(plan_report);

    let fingerprint_after = hasher::hash_definitions(dir).map_err(DriverError::Fingerprint)?;
    let report = RunReport {
        terraform_dir: dir.clone(),
        steps,
        plan: summary,
        fingerprint_before,
        fingerprint_after,
    };
    if report.definitions_changed() {
        tracing::warn!(
            dir = %dir.display(),
            before = %report.fingerprint_before,
            after = %report.fingerprint_after,
            "definition files changed during run"
        );
    }
    Ok(report)
}

fn compile_retry(opts: &TerraformOptions) -> Result<CompiledRetry, CommandError> {
    CompiledRetry::compile(&opts.retry).map_err(CommandError::RetryPattern)
}

/// Run one step, retrying while the policy allows it.
fn run_step(
    step: Step,
    opts: &TerraformOptions,
    retry: &CompiledRetry,
) -> Result<StepReport, CommandError> {
    let inv = args::invocation(step, opts);
    let start = Instant::now();
    let mut attempt = 1u32;
    loop {
        tracing::debug!(%step, attempt, command = %inv.display(), "running terraform");
        let out = local::exec_local(&inv).map_err(|source| CommandError::Spawn {
            program: inv.program.clone(),
            source,
        })?;

        if is_success(step, opts, &out) {
            return Ok(StepReport {
                step,
                exit_code: out.exit_code,
                attempts: attempt,
                duration_seconds: start.elapsed().as_secs_f64(),
                stdout: out.stdout,
            });
        }

        if let Some(reason) = retry.should_retry(attempt, &out.combined()) {
            tracing::warn!(
                %step,
                attempt,
                exit_code = out.exit_code,
                reason,
                "retryable terraform error, retrying"
            );
            std::thread::sleep(retry.pause());
            attempt += 1;
            continue;
        }

        tracing::error!(%step, attempt, exit_code = out.exit_code, "terraform failed");
        return Err(CommandError::Failed {
            step,
            exit_code: out.exit_code,
            stderr: failure_text(&out.stderr, &out.stdout),
        });
    }
}

/// Zero exit, or exit 2 from plan when `-detailed-exitcode` was requested.
fn is_success(step: Step, opts: &TerraformOptions, out: &ExecOutput) -> bool {
    out.success() || (step == Step::Plan && opts.detailed_exitcode && out.exit_code == 2)
}

/// Terraform prints diagnostics to stderr, but some wrappers use stdout.
fn failure_text(stderr: &str, stdout: &str) -> String {
    let text = if stderr.trim().is_empty() { stdout } else { stderr };
    text.trim().to_string()
}
