use std::io::Read;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, warn};
use thiserror::Error;

use crate::blockchain::block::Evidence;

/// Failures are never fatal: callers fall back to the base difficulty.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OracleError {
    #[error("oracle unavailable: {0}")]
    Unavailable(String),
    #[error("oracle timed out after {0:?}")]
    TimedOut(Duration),
}

/// Judges whether a block's evidence really shows the label it claims.
pub trait EvidenceOracle: Send + Sync {
    fn affirms(&self, evidence: &Evidence) -> Result<bool, OracleError>;
}

impl<F> EvidenceOracle for F
where
    F: Fn(&Evidence) -> Result<bool, OracleError> + Send + Sync,
{
    fn affirms(&self, evidence: &Evidence) -> Result<bool, OracleError> {
        self(evidence)
    }
}

/// Oracle used when no classifier is wired in. Never relaxes difficulty.
#[derive(Debug, Default, Clone, Copy)]
pub struct DenyAll;

impl EvidenceOracle for DenyAll {
    fn affirms(&self, _evidence: &Evidence) -> Result<bool, OracleError> {
        Ok(false)
    }
}

/// Runs an external classifier with the descriptor as its last argument and
/// compares its trimmed stdout to the claimed label, ignoring ASCII case.
///
/// With a timeout set, a classifier still running at the deadline is killed
/// and reaped before `TimedOut` is returned.
#[derive(Debug, Clone)]
pub struct CommandOracle {
    program: String,
    args: Vec<String>,
    timeout: Option<Duration>,
}

/// How often a running classifier is checked for exit.
const WAIT_POLL: Duration = Duration::from_millis(5);

impl CommandOracle {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Split a whitespace-separated command line. `None` if it is blank.
    pub fn from_command_line(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self::new(program, parts.collect()))
    }
}

impl CommandOracle {
    fn unavailable(&self, reason: impl std::fmt::Display) -> OracleError {
        OracleError::Unavailable(format!("{}: {reason}", self.program))
    }

    /// Wait for `child` to exit, killing it once the deadline passes.
    fn wait_bounded(&self, child: &mut Child) -> Result<std::process::ExitStatus, OracleError> {
        let Some(timeout) = self.timeout else {
            return child.wait().map_err(|e| self.unavailable(e));
        };
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(status) = child.try_wait().map_err(|e| self.unavailable(e))? {
                return Ok(status);
            }
            if Instant::now() >= deadline {
                warn!("ORACLE - {} overran {:?}, killing pid {}", self.program, timeout, child.id());
                // it may have exited between try_wait and kill
                let _ = child.kill();
                let _ = child.wait();
                return Err(OracleError::TimedOut(timeout));
            }
            thread::sleep(WAIT_POLL);
        }
    }
}

impl EvidenceOracle for CommandOracle {
    fn affirms(&self, evidence: &Evidence) -> Result<bool, OracleError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg(&evidence.descriptor)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| self.unavailable(e))?;

        let status = self.wait_bounded(&mut child)?;
        if !status.success() {
            return Err(self.unavailable(format!("exited with {status}")));
        }

        let mut stdout = String::new();
        if let Some(mut pipe) = child.stdout.take() {
            pipe.read_to_string(&mut stdout).map_err(|e| self.unavailable(e))?;
        }
        let predicted = stdout.trim();
        debug!(
            "ORACLE - classifier said '{}' for '{}' (claimed '{}')",
            predicted, evidence.descriptor, evidence.label
        );
        Ok(predicted.eq_ignore_ascii_case(evidence.label.trim()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deny_all_never_affirms() {
        assert_eq!(DenyAll.affirms(&Evidence::new("x", "y")), Ok(false));
    }

    #[test]
    fn command_line_parsing() {
        assert!(CommandOracle::from_command_line("   ").is_none());
        let oracle = CommandOracle::from_command_line("python3 classify.py --top 1").unwrap();
        assert_eq!(oracle.program, "python3");
        assert_eq!(oracle.args, vec!["classify.py", "--top", "1"]);
    }

    #[test]
    fn missing_program_is_unavailable() {
        let oracle = CommandOracle::new("/nonexistent/classifier-binary", vec![]);
        assert!(matches!(
            oracle.affirms(&Evidence::new("img.png", "cat")),
            Err(OracleError::Unavailable(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn command_output_is_compared_to_label() {
        // `echo <args> <descriptor>` prints the descriptor back
        let oracle = CommandOracle::new("echo", vec![]);
        assert_eq!(oracle.affirms(&Evidence::new("Cat", "cat")), Ok(true));
        assert_eq!(oracle.affirms(&Evidence::new("dog", "cat")), Ok(false));
    }

    #[cfg(unix)]
    #[test]
    fn overrunning_classifier_is_killed() {
        // the script would create the file named by the descriptor after 300ms
        let marker = std::env::temp_dir().join(format!("pow-ledger-oracle-{}", std::process::id()));
        let _ = std::fs::remove_file(&marker);
        let oracle = CommandOracle::new(
            "sh",
            vec!["-c".into(), "sleep 0.3 && touch \"$0\"".into()],
        )
        .with_timeout(Duration::from_millis(50));

        let started = Instant::now();
        let ev = Evidence::new(marker.to_string_lossy(), "cat");
        assert_eq!(oracle.affirms(&ev), Err(OracleError::TimedOut(Duration::from_millis(50))));
        assert!(started.elapsed() < Duration::from_millis(300));

        thread::sleep(Duration::from_millis(600));
        assert!(!marker.exists(), "classifier kept running after the timeout");
    }

    #[cfg(unix)]
    #[test]
    fn fast_classifier_answers_within_timeout() {
        let oracle = CommandOracle::new("echo", vec![]).with_timeout(Duration::from_secs(5));
        assert_eq!(oracle.affirms(&Evidence::new("cat", "CAT")), Ok(true));
    }

    #[cfg(unix)]
    #[test]
    fn failing_classifier_is_unavailable() {
        let oracle = CommandOracle::new("false", vec![]).with_timeout(Duration::from_secs(5));
        assert!(matches!(
            oracle.affirms(&Evidence::new("img.png", "cat")),
            Err(OracleError::Unavailable(_))
        ));
    }
}
