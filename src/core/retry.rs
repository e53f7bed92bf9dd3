//! Retry decisions for transient terraform failures.

use super::types::RetryPolicy;
use regex::Regex;
use std::time::Duration;

/// A policy with its patterns compiled once per run.
#[derive(Debug)]
pub struct CompiledRetry {
    patterns: Vec<(Regex, String)>,
    max_retries: u32,
    pause: Duration,
}

impl CompiledRetry {
    /// Compile every pattern. Fails on the first invalid regex.
    pub fn compile(policy: &RetryPolicy) -> Result<Self, String> {
        let mut patterns = Vec::with_capacity(policy.retryable_errors.len());
        for (pattern, description) in &policy.retryable_errors {
            let re = Regex::new(pattern)
                .map_err(|e| format!("invalid retryable error pattern '{}': {}", pattern, e))?;
            patterns.push((re, description.clone()));
        }
        Ok(Self {
            patterns,
            max_retries: policy.max_retries,
            pause: Duration::from_secs(policy.time_between_retries_secs),
        })
    }

    /// Description of the first pattern matching `output`.
    pub fn matching(&self, output: &str) -> Option<&str> {
        self.patterns
            .iter()
            .find(|(re, _)| re.is_match(output))
            .map(|(_, d)| d.as_str())
    }

    /// Whether attempt number `attempt` (1-based) may be followed by another.
    /// Returns the matched description when a retry is allowed.
    pub fn should_retry(&self, attempt: u32, output: &str) -> Option<&str> {
        if attempt > self.max_retries {
            return None;
        }
        self.matching(output)
    }

    pub fn pause(&self) -> Duration {
        self.pause
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(max_retries: u32) -> RetryPolicy {
        let mut p = RetryPolicy { max_retries, ..RetryPolicy::default() };
        p.retryable_errors.insert(
            "(?i)error installing provider".into(),
            "provider download flaked".into(),
        );
        p.retryable_errors.insert("timeout".into(), "network timeout".into());
        p
    }

    #[test]
    fn test_retry_default_never_retries() {
        let r = CompiledRetry::compile(&RetryPolicy::default()).unwrap();
        assert!(r.should_retry(1, "Error installing provider").is_none());
        assert_eq!(r.pause(), Duration::ZERO);
    }

    #[test]
    fn test_retry_matches_first_pattern() {
        let r = CompiledRetry::compile(&policy(2)).unwrap();
        assert_eq!(
            r.matching("Error Installing Provider \"aws\": timeout"),
            Some("provider download flaked")
        );
        assert_eq!(r.matching("dial tcp: i/o timeout"), Some("network timeout"));
        assert_eq!(r.matching("Reference to undeclared input variable"), None);
    }

    #[test]
    fn test_retry_respects_max() {
        let r = CompiledRetry::compile(&policy(2)).unwrap();
        assert!(r.should_retry(1, "timeout").is_some());
        assert!(r.should_retry(2, "timeout").is_some());
        assert!(r.should_retry(3, "timeout").is_none());
    }

    #[test]
    fn test_retry_invalid_pattern() {
        let mut p = RetryPolicy::default();
        p.retryable_errors.insert("([unclosed".into(), "bad".into());
        let err = CompiledRetry::compile(&p).unwrap_err();
        assert!(err.contains("([unclosed"));
    }
}
