//! Formatting of captured process output into task diagnostics.

use crate::io::process::ProcessOutput;

/// Turns a finished process into the diagnostic attached to a failed result.
pub trait ProcessFormatter: Send + Sync {
    fn format(&self, output: &ProcessOutput) -> String;
}

/// Trimmed stdout followed by trimmed stderr, separated by a newline.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawProcessFormatter;

impl ProcessFormatter for RawProcessFormatter {
    fn format(&self, output: &ProcessOutput) -> String {
        let stdout = output.stdout.trim();
        let stderr = output.stderr.trim();
        match (stdout.is_empty(), stderr.is_empty()) {
            (true, true) => match output.exit_code {
                Some(code) => format!("process exited with status {code}"),
                None => "process terminated without an exit status".to_string(),
            },
            (false, true) => stdout.to_string(),
            (true, false) => stderr.to_string(),
            (false, false) => format!("{stdout}\n{stderr}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(stdout: &str, stderr: &str, exit_code: Option<i32>) -> ProcessOutput {
        ProcessOutput {
            exit_code,
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
            timed_out: false,
        }
    }

    #[test]
    fn joins_both_streams() {
        let text = RawProcessFormatter.format(&output("lint error\n", "\nwarning\n", Some(1)));
        assert_eq!(text, "lint error\nwarning");
    }

    #[test]
    fn single_stream_is_returned_alone() {
        assert_eq!(RawProcessFormatter.format(&output("", "oops", Some(1))), "oops");
        assert_eq!(RawProcessFormatter.format(&output("bad", "  ", Some(1))), "bad");
    }

    #[test]
    fn silent_failure_mentions_exit_status() {
        let text = RawProcessFormatter.format(&output("", "", Some(2)));
        assert_eq!(text, "process exited with status 2");
    }
}
