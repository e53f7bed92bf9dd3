//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};

/// Stand-in for terraform. Records every argv line to `$FAKE_TF_LOG` and the
/// TF_/AWS_ environment to `$FAKE_TF_LOG.env`, then behaves according to:
///
/// - `FAKE_TF_FAIL=<cmd>`: fail that subcommand with `FAKE_TF_ERROR`
/// - `FAKE_TF_FLAKY_STEP=<cmd>` + `FAKE_TF_FLAKY_TIMES=N` + `FAKE_TF_COUNTER=<file>`:
///   fail that subcommand N times with a provider-install timeout, then succeed
/// - `FAKE_TF_PLAN_EXIT=<code>`: exit code after a successful-looking plan
/// - `FAKE_TF_PLAN_OUTPUT=none`: plan prints no summary line
/// - `FAKE_TF_TOUCH=1`: plan appends to main.tf in the working directory
const FAKE_TERRAFORM: &str = r##"#!/usr/bin/env bash
cmd="$1"
if [ -n "$FAKE_TF_LOG" ]; then
  echo "$*" >> "$FAKE_TF_LOG"
  env | grep -E '^(TF_|AWS_)' | sort >> "$FAKE_TF_LOG.env"
fi

if [ "$FAKE_TF_FAIL" = "$cmd" ]; then
  echo "Error: ${FAKE_TF_ERROR:-simulated $cmd failure}" >&2
  exit 1
fi

if [ "$FAKE_TF_FLAKY_STEP" = "$cmd" ]; then
  n=$(cat "$FAKE_TF_COUNTER" 2>/dev/null || echo 0)
  if [ "$n" -lt "${FAKE_TF_FLAKY_TIMES:-0}" ]; then
    echo $((n + 1)) > "$FAKE_TF_COUNTER"
    echo "Error: Failed to install provider: i/o timeout" >&2
    exit 1
  fi
fi

case "$cmd" in
  init)
    mkdir -p .terraform
    echo "Terraform has been successfully initialized!"
    ;;
  validate)
    echo "Success! The configuration is valid."
    ;;
  plan)
    if [ "$FAKE_TF_TOUCH" = "1" ]; then
      echo "# touched" >> main.tf
    fi
    if [ "$FAKE_TF_PLAN_OUTPUT" = "none" ]; then
      echo "Changes to Outputs:"
    else
      echo "Terraform will perform the following actions:"
      echo "Plan: 1 to add, 0 to change, 0 to destroy."
    fi
    exit "${FAKE_TF_PLAN_EXIT:-0}"
    ;;
  *)
    echo "unexpected command: $cmd" >&2
    exit 1
    ;;
esac
"##;

/// Path of the fake terraform script, written once per test binary.
///
/// Every test that spawns processes must call this first: writing an
/// executable while another thread forks can fail the exec with ETXTBSY.
#[cfg(unix)]
pub fn fake_terraform() -> &'static Path {
    static FAKE: OnceLock<(tempfile::TempDir, PathBuf)> = OnceLock::new();
    let (_, path) = FAKE.get_or_init(|| {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("terraform");
        std::fs::write(&path, FAKE_TERRAFORM).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        (dir, path)
    });
    path
}

/// Route driver logs to the test harness output.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("terracheck=debug")
        .with_test_writer()
        .try_init();
}

/// In-memory sink for formatted log lines.
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl std::io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl LogCapture {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).to_string()
    }
}

/// Run `f` with an INFO-level subscriber scoped to this thread and return
/// its result together with everything it logged.
pub fn capture_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
    let capture = LogCapture::default();
    let writer = capture.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::INFO)
        .finish();
    let out = tracing::subscriber::with_default(subscriber, f);
    (out, capture.contents())
}

/// Repository's own terraform directory.
pub fn repo_terraform_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("terraform")
}

/// A fixture directory under tests/fixtures.
pub fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Copy the top-level definition files of `src` into a fresh temp dir.
pub fn copy_definitions(src: &Path) -> tempfile::TempDir {
    let dst = tempfile::tempdir().unwrap();
    for entry in std::fs::read_dir(src).unwrap() {
        let entry = entry.unwrap();
        let name = entry.file_name();
        let is_tf = name.to_string_lossy().ends_with(".tf");
        if entry.file_type().unwrap().is_file() && is_tf {
            std::fs::copy(entry.path(), dst.path().join(&name)).unwrap();
        }
    }
    dst
}

/// Lines recorded by the fake terraform, in invocation order.
pub fn logged_commands(log: &Path) -> Vec<String> {
    std::fs::read_to_string(log)
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}

/// First word of each recorded command.
pub fn logged_subcommands(log: &Path) -> Vec<String> {
    logged_commands(log)
        .iter()
        .filter_map(|l| l.split_whitespace().next().map(str::to_string))
        .collect()
}
