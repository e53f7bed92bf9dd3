//! Local execution transport.

use super::{ExecOutput, Invocation};
use std::process::{Command, Stdio};

/// Run an invocation locally and wait for it to exit.
///
/// Stdin is closed so a prompting terraform fails instead of hanging.
/// A process killed by a signal has no exit code and reports -1.
pub fn exec_local(inv: &Invocation) -> std::io::Result<ExecOutput> {
    let output = Command::new(&inv.program)
        .args(&inv.args)
        .current_dir(&inv.dir)
        .envs(&inv.env)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()?;

    Ok(ExecOutput {
        exit_code: output.status.code().unwrap_or(-1),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use indexmap::IndexMap;

    fn bash(script: &str) -> Invocation {
        Invocation {
            program: "bash".into(),
            args: vec!["-c".into(), script.into()],
            dir: std::env::temp_dir(),
            env: IndexMap::new(),
        }
    }

    #[test]
    fn test_local_echo() {
        let out = exec_local(&bash("echo hello")).unwrap();
        assert!(out.success());
        assert_eq!(out.stdout.trim(), "hello");
    }

    #[test]
    fn test_local_failure() {
        let out = exec_local(&bash("exit 42")).unwrap();
        assert!(!out.success());
        assert_eq!(out.exit_code, 42);
    }

    #[test]
    fn test_local_stderr() {
        let out = exec_local(&bash("echo err >&2")).unwrap();
        assert!(out.success());
        assert!(out.stderr.contains("err"));
    }

    #[test]
    fn test_local_signal_killed() {
        let out = exec_local(&bash("kill -9 $$")).unwrap();
        assert_eq!(out.exit_code, -1);
    }

    #[test]
    fn test_local_env_passed() {
        let mut inv = bash("echo \"$TC_MARKER\"");
        inv.env.insert("TC_MARKER".into(), "from-options".into());
        let out = exec_local(&inv).unwrap();
        assert_eq!(out.stdout.trim(), "from-options");
    }

    #[test]
    fn test_local_working_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("marker.tf"), "").unwrap();
        let mut inv = bash("ls");
        inv.dir = dir.path().to_path_buf();
        let out = exec_local(&inv).unwrap();
        assert!(out.stdout.contains("marker.tf"));
    }

    #[test]
    fn test_local_stdin_closed() {
        let out = exec_local(&bash("read line; echo \"got:$line\"")).unwrap();
        assert_eq!(out.stdout.trim(), "got:");
    }

    #[test]
    fn test_local_missing_program() {
        let inv = Invocation {
            program: "definitely-not-a-terraform-binary".into(),
            args: vec![],
            dir: std::env::temp_dir(),
            env: IndexMap::new(),
        };
        assert!(exec_local(&inv).is_err());
    }
}
