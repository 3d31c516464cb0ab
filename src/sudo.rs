//! Scoped sudo context
//!
//! Sudo is never requested for the entire process. Credentials are
//! validated the first time an action actually needs elevation and
//! invalidated again when the context is dropped.

use actionkit::{ActionError, CommandOutput, CommandSpec, SudoProvider};
use std::cell::Cell;
use std::io::{self, Write};
use std::path::Path;
use std::process::Command;

use crate::progress::Spinner;
use crate::runner;

/// Lazily validated sudo context - invalidates on drop
pub struct SudoContext {
    validated: Cell<bool>,
    spinner: Spinner,
}

impl SudoContext {
    /// A context that has not prompted yet, or `None` when sudo is not installed
    pub fn detect(spinner: Spinner) -> Option<Self> {
        if runner::command_exists("sudo") {
            Some(Self {
                validated: Cell::new(false),
                spinner,
            })
        } else {
            log::warn!("sudo not found; privileged actions will fail");
            None
        }
    }

    /// Validate credentials once, prompting if needed
    fn ensure(&self) -> io::Result<()> {
        if self.validated.get() {
            return Ok(());
        }

        let status = self.spinner.suspend(|| {
            eprintln!();
            eprintln!("  Sudo required for package installs and system files");
            eprintln!();
            Command::new("sudo").arg("-v").status()
        })?;
        if !status.success() {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "Failed to acquire sudo privileges",
            ));
        }

        self.validated.set(true);
        Ok(())
    }
}

/// `sudo`-prefixed form of a command
fn elevated(spec: &CommandSpec) -> CommandSpec {
    let mut args = Vec::with_capacity(spec.args.len() + 1);
    args.push(spec.program.clone());
    args.extend(spec.args.iter().cloned());
    CommandSpec {
        program: "sudo".to_string(),
        args,
        cwd: spec.cwd.clone(),
    }
}

/// Command that copies a staged file into place with `mode`
fn install_spec(staged: &Path, dest: &Path, mode: u32) -> CommandSpec {
    CommandSpec::new(
        "install",
        [
            "-D".to_string(),
            "-m".to_string(),
            format!("{mode:o}"),
            staged.display().to_string(),
            dest.display().to_string(),
        ],
    )
}

impl SudoProvider for SudoContext {
    fn run(&self, spec: &CommandSpec) -> io::Result<CommandOutput> {
        self.ensure()?;
        runner::command(&elevated(spec))
            .output()
            .map(CommandOutput::from)
    }

    fn write_file(&self, path: &Path, contents: &[u8], mode: u32) -> Result<(), ActionError> {
        let step = format!("Writing {}", path.display());
        self.ensure()
            .map_err(|e| ActionError::Privilege(e.to_string()))?;

        let mut staged =
            tempfile::NamedTempFile::new().map_err(|e| ActionError::io(&step, path, e))?;
        staged
            .write_all(contents)
            .and_then(|()| staged.flush())
            .map_err(|e| ActionError::io(&step, staged.path(), e))?;

        let spec = install_spec(staged.path(), path, mode);
        let output = self.run(&spec).map_err(|source| ActionError::Spawn {
            command: spec.to_string(),
            source,
        })?;
        if !output.success {
            return Err(ActionError::Subprocess {
                step,
                command: spec.to_string(),
                stderr: output.stderr_str().trim().to_string(),
            });
        }

        log::debug!("wrote {} ({mode:o})", path.display());
        Ok(())
    }
}

impl Drop for SudoContext {
    fn drop(&mut self) {
        if self.validated.get() {
            // Invalidate sudo timestamp to release privileges
            let _ = Command::new("sudo").arg("-k").status();
        }
    }
}
