use std::io;
use std::process::Command;

use anyhow::{Result, bail};

/// Run an external command, capture stdout, and require a zero exit.
///
/// Single-shot: no retries, no timeout. The caller decides whether a
/// failure aborts the whole run.
pub fn run_command(argv: &[String]) -> Result<String> {
    let Some((binary, args)) = argv.split_first() else {
        bail!("cannot run an empty command");
    };
    let output = match Command::new(binary).args(args).output() {
        Ok(output) => output,
        Err(error) if error.kind() == io::ErrorKind::NotFound => {
            bail!("Required command `{binary}` is not installed.")
        }
        Err(error) => bail!("Failed to execute `{binary}`: {error}"),
    };
    if !output.status.success() {
        let code = output
            .status
            .code()
            .map(|code| code.to_string())
            .unwrap_or_else(|| "<signal>".to_string());
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!(
            "Command `{}` failed with exit code {code}:\n{}",
            argv.join(" "),
            stderr.trim()
        );
    }
    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|part| part.to_string()).collect()
    }

    #[test]
    fn empty_command_is_rejected() {
        let error = run_command(&[]).expect_err("must fail");
        assert!(error.to_string().contains("empty command"));
    }

    #[test]
    fn missing_executable_names_the_binary() {
        let error =
            run_command(&argv(&["summarize-test-no-such-binary"])).expect_err("must fail");
        assert!(
            error
                .to_string()
                .contains("Required command `summarize-test-no-such-binary` is not installed.")
        );
    }

    #[cfg(unix)]
    #[test]
    fn captures_stdout_on_success() {
        let stdout = run_command(&argv(&["sh", "-c", "printf hello"])).expect("run");
        assert_eq!(stdout, "hello");
    }

    #[cfg(unix)]
    #[test]
    fn nonzero_exit_carries_code_and_stderr() {
        let error = run_command(&argv(&["sh", "-c", "echo boom >&2; exit 3"]))
            .expect_err("must fail");
        let message = error.to_string();
        assert!(message.contains("exit code 3"));
        assert!(message.contains("boom"));
    }
}
