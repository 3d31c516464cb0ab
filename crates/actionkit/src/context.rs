//! Execution context and capability traits
//!
//! Actions never touch the host directly. Subprocesses, privilege elevation,
//! read-only host queries and operator input all go through the traits in
//! this module, so every action and probe can be exercised against fakes.

use crate::error::ActionError;
use crate::fetch::Fetcher;
use crate::types::{ActionResult, CommandOutput, CommandSpec};
use std::io;
use std::path::{Path, PathBuf};

/// Runs subprocesses as the current user
pub trait CommandRunner {
    /// Run a command to completion and capture its output
    ///
    /// An `Err` means the process could not be started; a non-zero exit is
    /// reported through [`CommandOutput::success`].
    fn run(&self, spec: &CommandSpec) -> io::Result<CommandOutput>;
}

/// Provider for elevated privilege operations
///
/// The implementation decides how elevation happens (sudo, doas, ...) and
/// is expected to serialize privileged operations itself.
pub trait SudoProvider {
    /// Run a command with elevated privileges
    fn run(&self, spec: &CommandSpec) -> io::Result<CommandOutput>;

    /// Write `contents` to `path` with elevated privileges and the given mode
    ///
    /// Missing parent directories are created.
    fn write_file(&self, path: &Path, contents: &[u8], mode: u32) -> Result<(), ActionError>;
}

/// Read-only view of host state used by status probes
///
/// Implementations must not mutate the host. Query failures are reported as
/// "absent" (`false`) except for [`HostQuery::read_file`], whose error the
/// caller folds into "absent" itself.
pub trait HostQuery {
    /// Whether an executable with this name is on `PATH`
    fn command_exists(&self, name: &str) -> bool;

    fn path_exists(&self, path: &Path) -> bool;

    fn read_file(&self, path: &Path) -> io::Result<String>;

    /// Whether the file exists and has an executable bit set
    fn is_executable(&self, path: &Path) -> bool;

    /// Whether a user-scope service unit is enabled
    fn user_service_enabled(&self, unit: &str) -> bool;

    /// Whether a user-scope service unit is active
    fn user_service_active(&self, unit: &str) -> bool;
}

/// Operator input
///
/// Implementations only collect raw lines. Defaults and yes/no parsing are
/// decided by the provided methods, so every implementation resolves empty
/// or unavailable input the same way.
pub trait InputProvider {
    /// Read one line for `prompt`; `None` when no input could be collected
    fn read_line(&mut self, prompt: &str) -> Option<String>;

    /// Ask for a value, resolving empty or missing input to `default`
    fn text_or_default(&mut self, prompt: &str, default: &str) -> String {
        let prompt = format!("{prompt} (default: {default})");
        match self.read_line(&prompt) {
            Some(value) if !value.trim().is_empty() => value.trim().to_string(),
            _ => default.to_string(),
        }
    }

    /// Ask a yes/no question, resolving empty, missing or unrecognised input to `default`
    fn confirm(&mut self, prompt: &str, default: bool) -> bool {
        let hint = if default { "[Y/n]" } else { "[y/N]" };
        match self.read_line(&format!("{prompt} {hint}")) {
            Some(answer) => parse_yes_no(&answer).unwrap_or(default),
            None => default,
        }
    }
}

/// Parse a yes/no answer
pub fn parse_yes_no(answer: &str) -> Option<bool> {
    match answer.trim().to_lowercase().as_str() {
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}

/// Progress callback for execution
pub trait ProgressCallback {
    /// Called before an action executes
    fn on_action_start(&mut self, id: &str, label: &str);

    /// Called when an action enters a named step
    fn on_step(&mut self, step: &str);

    /// Called when an action finishes
    fn on_action_complete(&mut self, id: &str, result: &ActionResult);

    /// Called for a selected id that is not registered
    fn on_invalid(&mut self, id: &str);
}

/// No-op progress callback
pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn on_action_start(&mut self, _id: &str, _label: &str) {}
    fn on_step(&mut self, _step: &str) {}
    fn on_action_complete(&mut self, _id: &str, _result: &ActionResult) {}
    fn on_invalid(&mut self, _id: &str) {}
}

/// Context passed to action execution
///
/// Owned by exactly one executor run.
pub struct ExecutionContext<'a> {
    /// Ids selected for the current run, in order
    pub selected: Vec<String>,
    pub runner: &'a dyn CommandRunner,
    /// Optional privilege provider; actions that need it fail without it
    pub sudo: Option<&'a dyn SudoProvider>,
    pub host: &'a dyn HostQuery,
    pub input: &'a mut dyn InputProvider,
    pub progress: &'a mut dyn ProgressCallback,
    pub fetcher: &'a Fetcher,
    /// Scratch directory for downloads and source trees
    pub work_dir: PathBuf,
}

impl ExecutionContext<'_> {
    /// Get the sudo provider, or fail the action if not available
    pub fn require_sudo(&self) -> Result<&dyn SudoProvider, ActionError> {
        self.sudo
            .ok_or_else(|| ActionError::Privilege("no elevation mechanism configured".into()))
    }

    /// Announce a step to the progress callback
    pub fn step(&mut self, step: &str) {
        log::info!("{step}");
        self.progress.on_step(step);
    }

    /// Run a named step as the current user, returning its stdout
    pub fn run_step(&mut self, step: &str, spec: &CommandSpec) -> Result<String, ActionError> {
        self.step(step);
        log::debug!("running: {spec}");
        let output = self.runner.run(spec);
        check_output(step, spec, output)
    }

    /// Run a named step with elevated privileges, returning its stdout
    pub fn run_elevated(&mut self, step: &str, spec: &CommandSpec) -> Result<String, ActionError> {
        self.step(step);
        log::debug!("running elevated: {spec}");
        let output = self.require_sudo()?.run(spec);
        check_output(step, spec, output)
    }
}

fn check_output(
    step: &str,
    spec: &CommandSpec,
    output: io::Result<CommandOutput>,
) -> Result<String, ActionError> {
    let output = output.map_err(|source| ActionError::Spawn {
        command: spec.to_string(),
        source,
    })?;

    if output.success {
        return Ok(output.stdout_str());
    }

    let stderr = output.stderr_str();
    let diagnostic = if stderr.trim().is_empty() {
        output.stdout_str()
    } else {
        stderr
    };
    Err(ActionError::Subprocess {
        step: step.to_string(),
        command: spec.to_string(),
        stderr: diagnostic.trim().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockSudo, RecordingRunner, ScriptedInput, TestBed};

    #[test]
    fn test_parse_yes_no() {
        assert_eq!(parse_yes_no("y"), Some(true));
        assert_eq!(parse_yes_no(" YES "), Some(true));
        assert_eq!(parse_yes_no("n"), Some(false));
        assert_eq!(parse_yes_no("No"), Some(false));
        assert_eq!(parse_yes_no(""), None);
        assert_eq!(parse_yes_no("maybe"), None);
    }

    #[test]
    fn test_text_or_default_empty_input() {
        let mut input = ScriptedInput::new(["  "]);
        assert_eq!(input.text_or_default("Emacs version", "30.1"), "30.1");
    }

    #[test]
    fn test_text_or_default_no_input() {
        let mut input = ScriptedInput::empty();
        assert_eq!(input.text_or_default("Emacs version", "30.1"), "30.1");
    }

    #[test]
    fn test_text_or_default_value() {
        let mut input = ScriptedInput::new(["29.4"]);
        assert_eq!(input.text_or_default("Emacs version", "30.1"), "29.4");
        assert_eq!(input.prompts(), vec!["Emacs version (default: 30.1)"]);
    }

    #[test]
    fn test_confirm_defaults() {
        let mut input = ScriptedInput::new(["", "what"]);
        assert!(input.confirm("Continue?", true));
        assert!(!input.confirm("Continue?", false));
        assert!(input.confirm("Continue?", true));
    }

    #[test]
    fn test_run_step_maps_failure_to_subprocess_error() {
        let runner = RecordingRunner::new().fail("apt", "E: broken packages");
        let mut bed = TestBed::new();
        let mut ctx = bed.context(&runner, None);

        let err = ctx
            .run_step("Installing dev packages", &CommandSpec::new("apt", ["install"]))
            .unwrap_err();
        assert_eq!(err.to_string(), "Installing dev packages failed: E: broken packages");
    }

    #[test]
    fn test_run_step_unstartable_program() {
        let runner = RecordingRunner::new().missing("systemctl");
        let mut bed = TestBed::new();
        let mut ctx = bed.context(&runner, None);

        let err = ctx
            .run_step(
                "Reloading user services",
                &CommandSpec::new("systemctl", ["--user", "daemon-reload"]),
            )
            .unwrap_err();
        assert!(matches!(&err, ActionError::Spawn { command, .. } if command == "systemctl --user daemon-reload"));
    }

    #[test]
    fn test_run_step_returns_stdout() {
        let runner = RecordingRunner::new().stdout("nproc", "8\n");
        let mut bed = TestBed::new();
        let mut ctx = bed.context(&runner, None);

        let out = ctx
            .run_step("Counting CPUs", &CommandSpec::new("nproc", Vec::<String>::new()))
            .unwrap();
        assert_eq!(out.trim(), "8");
        assert_eq!(runner.programs(), vec!["nproc"]);
    }

    #[test]
    fn test_run_elevated_requires_sudo() {
        let runner = RecordingRunner::new();
        let mut bed = TestBed::new();
        let mut ctx = bed.context(&runner, None);

        let err = ctx
            .run_elevated("Installing", &CommandSpec::new("apt", ["install"]))
            .unwrap_err();
        assert!(matches!(err, ActionError::Privilege(_)));
    }

    #[test]
    fn test_run_elevated_uses_sudo_provider() {
        let runner = RecordingRunner::new();
        let sudo = MockSudo::new();
        let mut bed = TestBed::new();
        let mut ctx = bed.context(&runner, Some(&sudo));

        ctx.run_elevated("Installing", &CommandSpec::new("apt", ["install", "-y", "gcc"]))
            .unwrap();
        assert_eq!(sudo.commands(), vec!["apt install -y gcc"]);
        assert!(runner.programs().is_empty());
    }
}
