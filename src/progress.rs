//! Progress display for action execution.
//!
//! One spinner is shared between the progress callback, the prompt and the
//! sudo context, so prompts can suspend it instead of drawing over it.

use actionkit::{ActionResult, ProgressCallback};
use indicatif::{ProgressBar, ProgressStyle};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use crate::ui;

/// Handle to the spinner of the running step, if any
#[derive(Clone, Default)]
pub struct Spinner {
    bar: Rc<RefCell<Option<ProgressBar>>>,
}

impl Spinner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show `msg`, starting the spinner if none is running
    pub fn set(&self, msg: &str) {
        let mut bar = self.bar.borrow_mut();
        match bar.as_ref() {
            Some(pb) => pb.set_message(msg.to_string()),
            None => {
                let pb = ProgressBar::new_spinner();
                if let Ok(style) = ProgressStyle::with_template("{spinner:.green} {msg}") {
                    pb.set_style(style);
                }
                pb.set_message(msg.to_string());
                pb.enable_steady_tick(Duration::from_millis(100));
                *bar = Some(pb);
            }
        }
    }

    /// Remove the spinner
    pub fn clear(&self) {
        if let Some(pb) = self.bar.borrow_mut().take() {
            pb.finish_and_clear();
        }
    }

    /// Run `f` with the spinner hidden
    pub fn suspend<R>(&self, f: impl FnOnce() -> R) -> R {
        let bar = self.bar.borrow().clone();
        match bar {
            Some(pb) => pb.suspend(f),
            None => f(),
        }
    }

    #[cfg(test)]
    pub fn is_active(&self) -> bool {
        self.bar.borrow().is_some()
    }
}

/// Progress callback printing per-option results with `ui`
pub struct UiProgress {
    spinner: Spinner,
}

impl UiProgress {
    pub fn new(spinner: Spinner) -> Self {
        Self { spinner }
    }
}

impl ProgressCallback for UiProgress {
    fn on_action_start(&mut self, id: &str, label: &str) {
        ui::section(&format!("--- Executing option {id}: {label} ---"));
    }

    fn on_step(&mut self, step: &str) {
        self.spinner.set(step);
    }

    fn on_action_complete(&mut self, id: &str, result: &ActionResult) {
        self.spinner.clear();
        match result {
            ActionResult::Success { note: None } => {
                ui::success(&format!("Option {id} completed successfully"));
            }
            ActionResult::Success { note: Some(note) } => {
                ui::success(&format!("Option {id} completed successfully"));
                ui::dim(note);
            }
            ActionResult::Failure { reason } => {
                ui::error(&format!("Option {id} failed: {reason}"));
            }
        }
    }

    fn on_invalid(&mut self, id: &str) {
        ui::warn(&format!("Invalid option: {id}"));
    }
}
