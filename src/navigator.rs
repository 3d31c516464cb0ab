//! Menu state machine
//!
//! [`transition`] is the pure part: given the current menu and one line of
//! input it decides where to go or what to run. [`Navigator`] drives it,
//! rendering menus and handing selections to the executor.

use actionkit::{AskOperator, ExecutionContext, Executor, Registry, RunReport};
use manifest::Manifest;

use crate::actions::{EXTERNAL_MENU_ID, EXTERNAL_MENU_LABEL};
use crate::ui;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuState {
    Main,
    Packages,
    ExternalPackages,
    Settings,
    Exit,
}

/// What one line of input does in a given menu
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Goto(MenuState),
    /// Run these ids with the current menu's registry, then show it again
    Execute(Vec<String>),
    /// Unrecognised input; show the menu again
    Invalid(String),
}

/// The three action registries
pub struct Menus {
    pub packages: Registry,
    pub external: Registry,
    pub settings: Registry,
}

impl Menus {
    fn registry(&self, state: MenuState) -> Option<&Registry> {
        match state {
            MenuState::Packages => Some(&self.packages),
            MenuState::ExternalPackages => Some(&self.external),
            MenuState::Settings => Some(&self.settings),
            MenuState::Main | MenuState::Exit => None,
        }
    }
}

/// Where `b` (or closed input) leads from each menu
fn parent(state: MenuState) -> MenuState {
    match state {
        MenuState::Main | MenuState::Exit => MenuState::Exit,
        MenuState::Packages | MenuState::Settings => MenuState::Main,
        MenuState::ExternalPackages => MenuState::Packages,
    }
}

/// Decide the next step for `input` typed in `state`
///
/// `None` means input is closed: every sub-menu backs out and the main menu
/// exits, so `Exit` is still only ever entered from the main menu.
pub fn transition(state: MenuState, input: Option<&str>, menus: &Menus) -> Transition {
    let Some(input) = input.map(str::trim) else {
        return Transition::Goto(parent(state));
    };

    match state {
        MenuState::Main => match input.to_lowercase().as_str() {
            "1" => Transition::Goto(MenuState::Packages),
            "2" => Transition::Goto(MenuState::Settings),
            "q" => Transition::Goto(MenuState::Exit),
            _ => Transition::Invalid(input.to_string()),
        },
        MenuState::Exit => Transition::Goto(MenuState::Exit),
        _ if input.eq_ignore_ascii_case("b") => Transition::Goto(parent(state)),
        MenuState::Packages if input == EXTERNAL_MENU_ID => {
            Transition::Goto(MenuState::ExternalPackages)
        }
        MenuState::Packages => selection(input, &menus.packages),
        MenuState::ExternalPackages => selection(input, &menus.external),
        MenuState::Settings => {
            if input.eq_ignore_ascii_case("all") {
                Transition::Execute(menus.settings.ids())
            } else if input.is_empty() {
                Transition::Invalid(String::new())
            } else {
                Transition::Execute(vec![input.to_string()])
            }
        }
    }
}

/// `all` or a comma-separated id list
fn selection(input: &str, registry: &Registry) -> Transition {
    if input.eq_ignore_ascii_case("all") {
        return Transition::Execute(registry.ids());
    }
    let ids = ui::parse_selection(input);
    if ids.is_empty() {
        Transition::Invalid(input.to_string())
    } else {
        Transition::Execute(ids)
    }
}

/// Interactive driver for the menu state machine
pub struct Navigator<'a> {
    menus: &'a Menus,
    manifest: &'a Manifest,
    ctx: ExecutionContext<'a>,
    state: MenuState,
    shown: Vec<MenuState>,
    reports: Vec<RunReport>,
}

impl<'a> Navigator<'a> {
    pub fn new(menus: &'a Menus, manifest: &'a Manifest, ctx: ExecutionContext<'a>) -> Self {
        Self {
            menus,
            manifest,
            ctx,
            state: MenuState::Main,
            shown: Vec::new(),
            reports: Vec::new(),
        }
    }

    /// Run until the operator quits from the main menu
    pub fn run(&mut self) {
        while self.state() != MenuState::Exit {
            self.step();
        }
        log::debug!("exiting");
    }

    /// Show the current menu and handle one line of input
    pub fn step(&mut self) {
        self.shown.push(self.state);
        self.render();

        let input = self.ctx.input.read_line(prompt(self.state));
        match transition(self.state, input.as_deref(), self.menus) {
            Transition::Goto(next) => {
                log::debug!("{:?} -> {next:?}", self.state);
                self.state = next;
            }
            Transition::Invalid(input) => ui::warn(&format!("Invalid option: {input}")),
            Transition::Execute(ids) => self.execute(&ids),
        }
    }

    pub fn state(&self) -> MenuState {
        self.state
    }

    /// Every menu displayed so far, in order
    pub fn shown(&self) -> &[MenuState] {
        &self.shown
    }

    /// Reports of every executor run so far
    pub fn reports(&self) -> &[RunReport] {
        &self.reports
    }

    fn execute(&mut self, ids: &[String]) {
        let Some(registry) = self.menus.registry(self.state) else {
            return;
        };
        let report =
            Executor::new(registry).run(ids, self.manifest, &mut self.ctx, &mut AskOperator);
        summarize(&report);
        self.reports.push(report);
    }

    fn render(&self) {
        match self.state {
            MenuState::Main => {
                ui::header("PROVISOR");
                ui::item("1", "Install packages");
                ui::item("2", "Configure settings");
                ui::item("q", "Quit");
            }
            MenuState::Packages => {
                ui::header("DEBIAN PACKAGE INSTALLER");
                for action in self.menus.packages.iter() {
                    ui::item(action.id(), action.label());
                }
                ui::item(EXTERNAL_MENU_ID, EXTERNAL_MENU_LABEL);
                ui::item("b", "Back");
            }
            MenuState::ExternalPackages => {
                ui::header("EXTERNAL PACKAGES");
                for action in self.menus.external.iter() {
                    ui::item(action.id(), action.label());
                }
                ui::item("b", "Back");
            }
            MenuState::Settings => {
                ui::header("SETTINGS");
                // Probed on every display so out-of-band changes show up.
                for action in self.menus.settings.iter() {
                    let symbol = action
                        .status(self.ctx.host)
                        .map_or("-", |s| s.symbol());
                    ui::status_item(action.id(), symbol, action.label());
                }
                ui::item("b", "Back");
                ui::dim("O configured  X not configured  N unavailable");
            }
            MenuState::Exit => {}
        }
    }
}

fn prompt(state: MenuState) -> &'static str {
    match state {
        MenuState::Main => "Enter your choice",
        MenuState::Packages | MenuState::ExternalPackages => {
            "Enter your choice (e.g., 0,2 or 'all')"
        }
        MenuState::Settings => "Enter a setting (or 'all')",
        MenuState::Exit => "",
    }
}

fn summarize(report: &RunReport) {
    let total = report.outcomes.len();
    let succeeded = report.succeeded();
    if report.halted {
        ui::warn("Stopped; the remaining options were not run");
    }
    if succeeded == total {
        ui::success(&format!("{succeeded} of {total} option(s) succeeded"));
    } else {
        ui::info(&format!("{succeeded} of {total} option(s) succeeded"));
    }
}
