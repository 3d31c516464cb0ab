//! Subprocess runner and read-only host queries backed by the real system

use actionkit::{CommandOutput, CommandRunner, CommandSpec, HostQuery};
use std::fs;
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::process::{Command, Stdio};

/// Build the `std::process::Command` for a spec
pub fn command(spec: &CommandSpec) -> Command {
    let mut cmd = Command::new(&spec.program);
    cmd.args(&spec.args);
    if let Some(dir) = &spec.cwd {
        cmd.current_dir(dir);
    }
    cmd
}

/// Runs commands as the current user, capturing output
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, spec: &CommandSpec) -> io::Result<CommandOutput> {
        command(spec).output().map(CommandOutput::from)
    }
}

/// Check if a command exists on `PATH`
pub fn command_exists(cmd: &str) -> bool {
    let Some(path) = std::env::var_os("PATH") else {
        return false;
    };
    std::env::split_paths(&path).any(|dir| is_executable(&dir.join(cmd)))
}

/// Whether `path` is a regular file with an executable bit set
pub fn is_executable(path: &Path) -> bool {
    fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

/// Run a command silently, returning success/failure
fn run_quiet(cmd: &str, args: &[&str]) -> bool {
    Command::new(cmd)
        .args(args)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Host state as seen from this machine
pub struct SystemHost;

impl HostQuery for SystemHost {
    fn command_exists(&self, name: &str) -> bool {
        command_exists(name)
    }

    fn path_exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn read_file(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(path)
    }

    fn is_executable(&self, path: &Path) -> bool {
        is_executable(path)
    }

    fn user_service_enabled(&self, unit: &str) -> bool {
        run_quiet("systemctl", &["--user", "is-enabled", "--quiet", unit])
    }

    fn user_service_active(&self, unit: &str) -> bool {
        run_quiet("systemctl", &["--user", "is-active", "--quiet", unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runner_captures_stdout() {
        let out = SystemRunner
            .run(&CommandSpec::new("sh", ["-c", "echo hello"]))
            .unwrap();
        assert!(out.success);
        assert_eq!(out.stdout_str().trim(), "hello");
    }

    #[test]
    fn test_runner_reports_failure() {
        let out = SystemRunner
            .run(&CommandSpec::new("sh", ["-c", "echo broken >&2; exit 3"]))
            .unwrap();
        assert!(!out.success);
        assert_eq!(out.stderr_str().trim(), "broken");
    }

    #[test]
    fn test_runner_uses_cwd() {
        let dir = tempfile::tempdir().unwrap();
        let out = SystemRunner
            .run(&CommandSpec::new("pwd", Vec::<String>::new()).in_dir(dir.path()))
            .unwrap();
        let reported = std::path::PathBuf::from(out.stdout_str().trim());
        assert_eq!(
            reported.canonicalize().unwrap(),
            dir.path().canonicalize().unwrap()
        );
    }

    #[test]
    fn test_runner_missing_program() {
        let result = SystemRunner.run(&CommandSpec::new("provisor-no-such-tool", ["x"]));
        assert!(result.is_err());
    }

    #[test]
    fn test_command_exists() {
        assert!(command_exists("sh"));
        assert!(!command_exists("provisor-no-such-tool"));
    }

    #[test]
    fn test_host_files() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("hotplug");
        fs::write(&script, "#!/bin/sh\n").unwrap();

        assert!(SystemHost.path_exists(&script));
        assert!(!SystemHost.is_executable(&script));

        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
        assert!(SystemHost.is_executable(&script));
        assert_eq!(SystemHost.read_file(&script).unwrap(), "#!/bin/sh\n");
        assert!(SystemHost.read_file(&dir.path().join("missing")).is_err());
    }
}
