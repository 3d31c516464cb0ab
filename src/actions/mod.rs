//! Action registries for each menu

pub mod apt;
pub mod display;
pub mod settings;
pub mod source;
pub mod suckless;

use actionkit::Registry;
use std::path::Path;

use crate::config::Config;

/// Package menu id that opens the external package menu
pub const EXTERNAL_MENU_ID: &str = "3";

/// Label shown for [`EXTERNAL_MENU_ID`]
pub const EXTERNAL_MENU_LABEL: &str = "External packages (build from source)";

pub fn package_menu(config: &Config) -> Registry {
    Registry::new()
        .register(apt::AptInstall::new(
            "0",
            "Install basic development packages",
            "dev",
            "basic development",
        ))
        .register(suckless::SucklessBuild::new("1", config.suckless_path()))
        .register(apt::AptInstall::new(
            "2",
            "Install basic utilities",
            "utils",
            "utilities",
        ))
}

pub fn external_menu(config: &Config) -> Registry {
    Registry::new()
        .register(source::EmacsBuild::new(
            "0",
            &config.emacs_default_version,
            config.emacs_mirrors.clone(),
            config.emacs_configure_flags.clone(),
        ))
        .register(source::StowBuild::new("1", config.stow_mirrors.clone()))
}

pub fn settings_menu(config: &Config, home: &Path) -> Registry {
    Registry::new()
        .register(settings::TouchpadTapping::new())
        .register(settings::EmacsDaemon::new(home))
        .register(settings::LocalBinPath::new(home))
        .register(settings::MonitorHotplug::new())
        .register(settings::DwmSession::new())
        .register(display::SwitchDisplay::new(config.poll()))
}
