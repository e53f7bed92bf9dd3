//! Terraform argv construction for init, validate, and plan.
//!
//! Every command runs non-interactively: `-input=false` where terraform
//! accepts it, and `TF_IN_AUTOMATION`/`TF_INPUT` in the environment.

use super::types::{Step, TerraformOptions};
use crate::transport::Invocation;
use indexmap::IndexMap;
use serde_yaml_ng::Value;

/// Environment set on every terraform process before `env_vars`.
pub const AUTOMATION_ENV: [(&str, &str); 2] = [("TF_IN_AUTOMATION", "1"), ("TF_INPUT", "0")];

/// Arguments for `terraform init`.
pub fn init_args(opts: &TerraformOptions) -> Vec<String> {
    let mut args = vec![
        "init".to_string(),
        "-input=false".to_string(),
        format!("-upgrade={}", opts.upgrade),
    ];
    if opts.reconfigure {
        args.push("-reconfigure".to_string());
    }
    for (k, v) in &opts.backend_config {
        args.push(format!("-backend-config={}={}", k, v));
    }
    push_no_color(&mut args, opts);
    args
}

/// Arguments for `terraform validate`.
pub fn validate_args(opts: &TerraformOptions) -> Vec<String> {
    let mut args = vec!["validate".to_string()];
    push_no_color(&mut args, opts);
    args
}

/// Arguments for `terraform plan`.
pub fn plan_args(opts: &TerraformOptions) -> Vec<String> {
    let mut args = vec![
        "plan".to_string(),
        "-input=false".to_string(),
        format!("-lock={}", opts.lock),
    ];
    for (name, value) in &opts.vars {
        args.push("-var".to_string());
        args.push(format!("{}={}", name, render_var(value)));
    }
    for file in &opts.var_files {
        args.push(format!("-var-file={}", file.display()));
    }
    if let Some(out) = &opts.plan_file {
        args.push(format!("-out={}", out.display()));
    }
    if opts.detailed_exitcode {
        args.push("-detailed-exitcode".to_string());
    }
    push_no_color(&mut args, opts);
    args
}

fn push_no_color(args: &mut Vec<String>, opts: &TerraformOptions) {
    if opts.no_color {
        args.push("-no-color".to_string());
    }
}

/// Build the invocation for one step.
pub fn invocation(step: Step, opts: &TerraformOptions) -> Invocation {
    let args = match step {
        Step::Init => init_args(opts),
        Step::Validate => validate_args(opts),
        Step::Plan => plan_args(opts),
    };
    let mut env: IndexMap<String, String> = AUTOMATION_ENV
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    for (k, v) in &opts.env_vars {
        env.insert(k.clone(), v.clone());
    }
    Invocation {
        program: opts.binary.clone(),
        args,
        dir: opts.terraform_dir.clone(),
        env,
    }
}

/// Render a `-var` value. Top-level scalars pass through raw; collections
/// become HCL literals with quoted strings.
pub fn render_var(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => render_hcl(other),
    }
}

fn render_hcl(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => quote(s),
        Value::Sequence(items) => {
            let parts: Vec<String> = items.iter().map(render_hcl).collect();
            format!("[{}]", parts.join(", "))
        }
        Value::Mapping(map) => {
            let parts: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("{} = {}", quote(&scalar_key(k)), render_hcl(v)))
                .collect();
            format!("{{{}}}", parts.join(", "))
        }
        Value::Tagged(tagged) => render_hcl(&tagged.value),
    }
}

fn scalar_key(key: &Value) -> String {
    match key {
        Value::String(s) => s.clone(),
        other => render_hcl(other),
    }
}

fn quote(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}
