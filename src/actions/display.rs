//! Switch output to the connected monitors of the running X session

use actionkit::{
    Action, ActionError, ActionResult, CommandRunner, CommandSpec, ExecutionContext, HostQuery,
    PollConfig, StatusState, Strategy, poll_first,
};
use manifest::Manifest;
use std::fs;
use std::path::{Path, PathBuf};

/// Where the X server keeps its sockets
pub const X11_SOCKET_DIR: &str = "/tmp/.X11-unix";

#[derive(Debug)]
pub struct SwitchDisplay {
    poll: PollConfig,
    socket_dir: PathBuf,
    /// Environment variable holding the display name
    env_var: String,
}

impl SwitchDisplay {
    pub fn new(poll: PollConfig) -> Self {
        Self {
            poll,
            socket_dir: PathBuf::from(X11_SOCKET_DIR),
            env_var: "DISPLAY".to_string(),
        }
    }

    #[cfg(test)]
    fn with_sources(mut self, socket_dir: &Path, env_var: &str) -> Self {
        self.socket_dir = socket_dir.to_path_buf();
        self.env_var = env_var.to_string();
        self
    }

    /// Find the display, trying each source in priority order every round
    pub fn detect(&self, runner: &dyn CommandRunner) -> Option<String> {
        let strategies = [
            Strategy::new("environment", || {
                std::env::var(&self.env_var)
                    .ok()
                    .filter(|d| !d.trim().is_empty())
            }),
            Strategy::new("X11 socket", || display_from_sockets(&self.socket_dir)),
            Strategy::new("who", || {
                let output = runner
                    .run(&CommandSpec::new("who", Vec::<String>::new()))
                    .ok()?;
                display_from_who(&output.stdout_str())
            }),
        ];
        poll_first(&self.poll, &strategies)
    }
}

impl Action for SwitchDisplay {
    fn id(&self) -> &str {
        "5"
    }

    fn label(&self) -> &str {
        "Switch display to connected monitors now"
    }

    /// Not idempotent, but still unavailable without xrandr
    fn status(&self, host: &dyn HostQuery) -> Option<StatusState> {
        (!host.command_exists("xrandr")).then_some(StatusState::Unavailable)
    }

    fn execute(
        &self,
        _manifest: &Manifest,
        ctx: &mut ExecutionContext<'_>,
    ) -> Result<ActionResult, ActionError> {
        if !ctx.host.command_exists("xrandr") {
            return Err(ActionError::PrerequisiteMissing(
                "requires command 'xrandr'".into(),
            ));
        }

        ctx.step("Detecting X display");
        let display = self.detect(ctx.runner).ok_or_else(|| {
            ActionError::step(
                "Detecting X display",
                format!("no X display found after {} attempts", self.poll.attempts),
            )
        })?;

        ctx.run_step(
            &format!("Switching display {display}"),
            &CommandSpec::new("xrandr", ["--display", display.as_str(), "--auto"]),
        )?;
        Ok(ActionResult::success_with(format!("display {display}")))
    }
}

/// Lowest `X<n>` socket in `dir`, as `:<n>`
fn display_from_sockets(dir: &Path) -> Option<String> {
    fs::read_dir(dir)
        .ok()?
        .filter_map(Result::ok)
        .filter_map(|e| {
            e.file_name()
                .to_str()
                .and_then(|name| name.strip_prefix('X'))
                .and_then(|n| n.parse::<u32>().ok())
        })
        .min()
        .map(|n| format!(":{n}"))
}

/// First `(:<n>)` login in `who` output
fn display_from_who(output: &str) -> Option<String> {
    output.lines().find_map(|line| {
        let start = line.find("(:")?;
        let rest = &line[start + 1..];
        let end = rest.find(')')?;
        let display = &rest[..end];
        display[1..]
            .chars()
            .all(|c| c.is_ascii_digit() || c == '.')
            .then(|| display.to_string())
            .filter(|d| d.len() > 1)
    })
}
