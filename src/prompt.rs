//! Terminal input via dialoguer

use actionkit::InputProvider;
use dialoguer::Input;

use crate::progress::Spinner;

/// Reads operator answers from the terminal
///
/// Reads block without a timeout. A closed or non-interactive terminal is
/// the only way to get `None`, which callers resolve to their documented
/// default.
pub struct DialoguerInput {
    spinner: Spinner,
}

impl DialoguerInput {
    pub fn new(spinner: Spinner) -> Self {
        Self { spinner }
    }
}

impl InputProvider for DialoguerInput {
    fn read_line(&mut self, prompt: &str) -> Option<String> {
        let answer = self.spinner.suspend(|| {
            Input::<String>::new()
                .with_prompt(prompt)
                .allow_empty(true)
                .interact_text()
        });
        match answer {
            Ok(line) => Some(line),
            Err(e) => {
                log::debug!("no input for '{prompt}': {e}");
                None
            }
        }
    }
}
