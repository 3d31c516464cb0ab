//! Desktop settings with status probes
//!
//! Each setting knows how to detect that it is already in place (its
//! [`Probe`]) and how to put it in place. Generated file contents live here
//! as constants.

use actionkit::{
    Action, ActionError, ActionResult, CommandSpec, ExecutionContext, Marker, Prerequisite, Probe,
    contains_line,
};
use manifest::Manifest;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

pub const LIBINPUT_CONF: &str = "/usr/share/X11/xorg.conf.d/40-libinput.conf";
pub const TOUCHPAD_CONF: &str = "/etc/X11/xorg.conf.d/40-touchpad.conf";
pub const TAPPING_LINE: &str = r#"Option "Tapping" "on""#;

const TOUCHPAD_CONTENT: &str = r#"Section "InputClass"
    Identifier "touchpad"
    MatchIsTouchpad "on"
    Driver "libinput"
    Option "Tapping" "on"
    Option "NaturalScrolling" "false"
EndSection
"#;

pub const EMACS_UNIT: &str = "emacs.service";

const EMACS_UNIT_CONTENT: &str = r#"[Unit]
Description=Emacs text editor
Documentation=info:emacs man:emacs(1) https://gnu.org/software/emacs/

[Service]
Type=notify
ExecStart=/usr/bin/env emacs --fg-daemon
ExecStop=/usr/bin/env emacsclient --eval "(kill-emacs)"
Restart=on-failure

[Install]
WantedBy=default.target
"#;

pub const LOCAL_BIN_LINE: &str = r#"export PATH="$HOME/.local/bin:$PATH""#;

pub const HOTPLUG_SCRIPT: &str = "/usr/local/bin/monitor-hotplug";
pub const HOTPLUG_RULE: &str = "/etc/udev/rules.d/95-monitor-hotplug.rules";

const HOTPLUG_SCRIPT_CONTENT: &str = r#"#!/bin/sh
# Re-apply the monitor layout when a display is connected or removed.
user=$(who | awk '/\(:[0-9]+\)/ { print $1; exit }')
display=$(who | sed -n 's/.*(\(:[0-9][0-9]*\)).*/\1/p' | head -n 1)
[ -n "$user" ] || exit 0
export DISPLAY="${display:-:0}"
export XAUTHORITY="/home/$user/.Xauthority"
exec xrandr --auto
"#;

const HOTPLUG_RULE_CONTENT: &str =
    "ACTION==\"change\", SUBSYSTEM==\"drm\", RUN+=\"/usr/local/bin/monitor-hotplug\"\n";

pub const DWM_SESSION: &str = "/usr/share/xsessions/dwm.desktop";

const DWM_SESSION_CONTENT: &str = "[Desktop Entry]
Encoding=UTF-8
Name=dwm
Comment=Dynamic window manager
Exec=dwm
Icon=dwm
Type=XSession
";

/// Append `line` unless the file already has it, creating the file if needed
///
/// Returns whether anything was written.
pub fn append_line_once(path: &Path, line: &str) -> io::Result<bool> {
    let existing = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e),
    };
    if contains_line(&existing, line) {
        return Ok(false);
    }

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    if !existing.is_empty() && !existing.ends_with('\n') {
        file.write_all(b"\n")?;
    }
    writeln!(file, "{line}")?;
    Ok(true)
}

#[derive(Debug)]
pub struct TouchpadTapping {
    probe: Probe,
}

impl TouchpadTapping {
    pub fn new() -> Self {
        Self {
            probe: Probe::new(Prerequisite::path(LIBINPUT_CONF))
                .marker(Marker::contains_line(TOUCHPAD_CONF, TAPPING_LINE)),
        }
    }
}

impl Action for TouchpadTapping {
    fn id(&self) -> &str {
        "0"
    }

    fn label(&self) -> &str {
        "Enable touchpad tap-to-click"
    }

    fn probe(&self) -> Option<&Probe> {
        Some(&self.probe)
    }

    fn execute(
        &self,
        _manifest: &Manifest,
        ctx: &mut ExecutionContext<'_>,
    ) -> Result<ActionResult, ActionError> {
        ctx.step("Writing touchpad configuration");
        ctx.require_sudo()?
            .write_file(Path::new(TOUCHPAD_CONF), TOUCHPAD_CONTENT.as_bytes(), 0o644)?;
        Ok(ActionResult::success_with("takes effect on the next X session"))
    }
}

#[derive(Debug)]
pub struct EmacsDaemon {
    unit_path: PathBuf,
    probe: Probe,
}

impl EmacsDaemon {
    pub fn new(home: &Path) -> Self {
        let unit_path = home.join(".config/systemd/user").join(EMACS_UNIT);
        Self {
            probe: Probe::new(Prerequisite::command("emacs"))
                .marker(Marker::exists(&unit_path))
                .marker(Marker::service_active(EMACS_UNIT)),
            unit_path,
        }
    }
}

impl Action for EmacsDaemon {
    fn id(&self) -> &str {
        "1"
    }

    fn label(&self) -> &str {
        "Run Emacs as a user daemon"
    }

    fn probe(&self) -> Option<&Probe> {
        Some(&self.probe)
    }

    fn execute(
        &self,
        _manifest: &Manifest,
        ctx: &mut ExecutionContext<'_>,
    ) -> Result<ActionResult, ActionError> {
        const STEP: &str = "Writing emacs.service";
        ctx.step(STEP);
        if let Some(dir) = self.unit_path.parent() {
            fs::create_dir_all(dir).map_err(|e| ActionError::io(STEP, dir, e))?;
        }
        fs::write(&self.unit_path, EMACS_UNIT_CONTENT)
            .map_err(|e| ActionError::io(STEP, &self.unit_path, e))?;

        ctx.run_step(
            "Reloading user services",
            &CommandSpec::new("systemctl", ["--user", "daemon-reload"]),
        )?;
        ctx.run_step(
            "Enabling emacs.service",
            &CommandSpec::new("systemctl", ["--user", "enable", "--now", EMACS_UNIT]),
        )?;
        Ok(ActionResult::success())
    }
}

#[derive(Debug)]
pub struct LocalBinPath {
    profile: PathBuf,
    probe: Probe,
}

impl LocalBinPath {
    pub fn new(home: &Path) -> Self {
        let profile = home.join(".profile");
        Self {
            probe: Probe::new(Prerequisite::None)
                .marker(Marker::contains_line(&profile, LOCAL_BIN_LINE)),
            profile,
        }
    }
}

impl Action for LocalBinPath {
    fn id(&self) -> &str {
        "2"
    }

    fn label(&self) -> &str {
        "Add ~/.local/bin to PATH"
    }

    fn probe(&self) -> Option<&Probe> {
        Some(&self.probe)
    }

    fn execute(
        &self,
        _manifest: &Manifest,
        ctx: &mut ExecutionContext<'_>,
    ) -> Result<ActionResult, ActionError> {
        const STEP: &str = "Updating ~/.profile";
        ctx.step(STEP);
        let appended = append_line_once(&self.profile, LOCAL_BIN_LINE)
            .map_err(|e| ActionError::io(STEP, &self.profile, e))?;
        Ok(if appended {
            ActionResult::success_with("log in again to pick up the new PATH")
        } else {
            ActionResult::success_with("already present")
        })
    }
}

#[derive(Debug)]
pub struct MonitorHotplug {
    probe: Probe,
}

impl MonitorHotplug {
    pub fn new() -> Self {
        Self {
            probe: Probe::new(Prerequisite::command("xrandr"))
                .marker(Marker::exists(HOTPLUG_RULE))
                .marker(Marker::executable(HOTPLUG_SCRIPT)),
        }
    }
}

impl Action for MonitorHotplug {
    fn id(&self) -> &str {
        "3"
    }

    fn label(&self) -> &str {
        "Switch monitors automatically on hotplug"
    }

    fn probe(&self) -> Option<&Probe> {
        Some(&self.probe)
    }

    fn execute(
        &self,
        _manifest: &Manifest,
        ctx: &mut ExecutionContext<'_>,
    ) -> Result<ActionResult, ActionError> {
        ctx.step("Installing hotplug script");
        let sudo = ctx.require_sudo()?;
        sudo.write_file(
            Path::new(HOTPLUG_SCRIPT),
            HOTPLUG_SCRIPT_CONTENT.as_bytes(),
            0o755,
        )?;
        sudo.write_file(Path::new(HOTPLUG_RULE), HOTPLUG_RULE_CONTENT.as_bytes(), 0o644)?;

        ctx.run_elevated(
            "Reloading udev rules",
            &CommandSpec::new("udevadm", ["control", "--reload"]),
        )?;
        Ok(ActionResult::success())
    }
}

#[derive(Debug)]
pub struct DwmSession {
    probe: Probe,
}

impl DwmSession {
    pub fn new() -> Self {
        Self {
            probe: Probe::new(Prerequisite::command("dwm")).marker(Marker::exists(DWM_SESSION)),
        }
    }
}

impl Action for DwmSession {
    fn id(&self) -> &str {
        "4"
    }

    fn label(&self) -> &str {
        "Add DWM to the login session list"
    }

    fn probe(&self) -> Option<&Probe> {
        Some(&self.probe)
    }

    fn execute(
        &self,
        _manifest: &Manifest,
        ctx: &mut ExecutionContext<'_>,
    ) -> Result<ActionResult, ActionError> {
        ctx.step("Writing dwm.desktop");
        ctx.require_sudo()?
            .write_file(Path::new(DWM_SESSION), DWM_SESSION_CONTENT.as_bytes(), 0o644)?;
        Ok(ActionResult::success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actionkit::StatusState;
    use actionkit::mock::{FakeHost, MockSudo, RecordingRunner, TestBed};
    use actionkit::{Executor, Registry};

    #[test]
    fn test_append_line_twice_leaves_one_marker() {
        let home = tempfile::tempdir().unwrap();
        let profile = home.path().join(".profile");
        fs::write(&profile, "umask 022").unwrap();

        assert!(append_line_once(&profile, LOCAL_BIN_LINE).unwrap());
        assert!(!append_line_once(&profile, LOCAL_BIN_LINE).unwrap());

        let content = fs::read_to_string(&profile).unwrap();
        assert_eq!(content.matches(LOCAL_BIN_LINE).count(), 1);
        assert_eq!(content, format!("umask 022\n{LOCAL_BIN_LINE}\n"));
    }

    #[test]
    fn test_append_creates_file() {
        let home = tempfile::tempdir().unwrap();
        let profile = home.path().join(".profile");

        assert!(append_line_once(&profile, LOCAL_BIN_LINE).unwrap());
        assert_eq!(fs::read_to_string(&profile).unwrap(), format!("{LOCAL_BIN_LINE}\n"));
    }

    #[test]
    fn test_local_bin_action_is_idempotent() {
        let home = tempfile::tempdir().unwrap();
        let action = LocalBinPath::new(home.path());
        let runner = RecordingRunner::new();
        let mut bed = TestBed::new();
        let mut ctx = bed.context(&runner, None);

        action.execute(&Manifest::new(), &mut ctx).unwrap();
        let again = action.execute(&Manifest::new(), &mut ctx).unwrap();

        assert_eq!(again, ActionResult::success_with("already present"));
        let content = fs::read_to_string(home.path().join(".profile")).unwrap();
        assert_eq!(content.matches(LOCAL_BIN_LINE).count(), 1);
    }

    #[test]
    fn test_local_bin_status_follows_file() {
        let home = tempfile::tempdir().unwrap();
        let action = LocalBinPath::new(home.path());
        let profile = home.path().join(".profile");

        let before = FakeHost::new();
        assert_eq!(action.status(&before), Some(StatusState::NotConfigured));

        let after = FakeHost::new().with_file(&profile, &format!("{LOCAL_BIN_LINE}\n"));
        assert_eq!(action.status(&after), Some(StatusState::Configured));
    }

    #[test]
    fn test_touchpad_status() {
        let action = TouchpadTapping::new();
        assert_eq!(action.status(&FakeHost::new()), Some(StatusState::Unavailable));

        let host = FakeHost::new()
            .with_file(LIBINPUT_CONF, "")
            .with_file(TOUCHPAD_CONF, TOUCHPAD_CONTENT);
        assert_eq!(action.status(&host), Some(StatusState::Configured));
    }

    #[test]
    fn test_touchpad_writes_privileged_file() {
        let runner = RecordingRunner::new();
        let sudo = MockSudo::new();
        let mut bed = TestBed::new();
        let mut ctx = bed.context(&runner, Some(&sudo));

        TouchpadTapping::new()
            .execute(&Manifest::new(), &mut ctx)
            .unwrap();

        let writes = sudo.writes();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].0, PathBuf::from(TOUCHPAD_CONF));
        assert!(contains_line(&String::from_utf8_lossy(&writes[0].1), TAPPING_LINE));
        assert_eq!(writes[0].2, 0o644);
    }

    #[test]
    fn test_emacs_daemon_writes_unit_and_enables() {
        let home = tempfile::tempdir().unwrap();
        let runner = RecordingRunner::new();
        let mut bed = TestBed::new();
        let mut ctx = bed.context(&runner, None);

        EmacsDaemon::new(home.path())
            .execute(&Manifest::new(), &mut ctx)
            .unwrap();

        assert!(home.path().join(".config/systemd/user/emacs.service").is_file());
        assert_eq!(
            runner.lines(),
            vec![
                "systemctl --user daemon-reload",
                "systemctl --user enable --now emacs.service"
            ]
        );
    }

    #[test]
    fn test_emacs_daemon_without_service_manager_fails() {
        let home = tempfile::tempdir().unwrap();
        let registry = Registry::new().register(EmacsDaemon::new(home.path()));
        let runner = RecordingRunner::new().missing("systemctl");
        let mut bed = TestBed::new().with_host(FakeHost::new().with_command("emacs"));
        let mut ctx = bed.context(&runner, None);

        let report = Executor::new(&registry).run(
            &["1".to_string()],
            &Manifest::new(),
            &mut ctx,
            &mut false,
        );

        let reason = report.outcomes[0].result.reason().unwrap();
        assert!(reason.starts_with("failed to execute systemctl --user daemon-reload"));
        // First systemctl call aborts the action.
        assert_eq!(runner.lines(), vec!["systemctl --user daemon-reload"]);
    }

    #[test]
    fn test_emacs_daemon_status_needs_active_service() {
        let home = Path::new("/home/u");
        let action = EmacsDaemon::new(home);
        let unit = home.join(".config/systemd/user/emacs.service");

        let enabled_only = FakeHost::new()
            .with_command("emacs")
            .with_file(&unit, EMACS_UNIT_CONTENT)
            .with_service(EMACS_UNIT, true, false);
        assert_eq!(action.status(&enabled_only), Some(StatusState::NotConfigured));

        let running = FakeHost::new()
            .with_command("emacs")
            .with_file(&unit, EMACS_UNIT_CONTENT)
            .with_service(EMACS_UNIT, true, true);
        assert_eq!(action.status(&running), Some(StatusState::Configured));
    }

    #[test]
    fn test_hotplug_installs_executable_script() {
        let runner = RecordingRunner::new();
        let sudo = MockSudo::new();
        let mut bed = TestBed::new();
        let mut ctx = bed.context(&runner, Some(&sudo));

        MonitorHotplug::new()
            .execute(&Manifest::new(), &mut ctx)
            .unwrap();

        let writes = sudo.writes();
        assert_eq!(writes[0].0, PathBuf::from(HOTPLUG_SCRIPT));
        assert_eq!(writes[0].2, 0o755);
        assert_eq!(writes[1].0, PathBuf::from(HOTPLUG_RULE));
        assert_eq!(sudo.commands(), vec!["udevadm control --reload"]);
    }

    #[test]
    fn test_hotplug_status_requires_executable() {
        let action = MonitorHotplug::new();
        let host = FakeHost::new()
            .with_command("xrandr")
            .with_file(HOTPLUG_RULE, HOTPLUG_RULE_CONTENT)
            .with_file(HOTPLUG_SCRIPT, HOTPLUG_SCRIPT_CONTENT);
        assert_eq!(action.status(&host), Some(StatusState::NotConfigured));

        let host = host.with_executable(HOTPLUG_SCRIPT);
        assert_eq!(action.status(&host), Some(StatusState::Configured));
    }

    #[test]
    fn test_dwm_session_without_sudo_fails() {
        let runner = RecordingRunner::new();
        let mut bed = TestBed::new();
        let mut ctx = bed.context(&runner, None);

        let err = DwmSession::new()
            .execute(&Manifest::new(), &mut ctx)
            .unwrap_err();
        assert!(matches!(err, ActionError::Privilege(_)));
    }
}
