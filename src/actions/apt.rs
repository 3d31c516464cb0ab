//! Package group installs from manifest sections

use actionkit::{Action, ActionError, ActionResult, CommandSpec, ExecutionContext};
use manifest::Manifest;

/// Install every item of one manifest section with `apt`
#[derive(Debug)]
pub struct AptInstall {
    id: String,
    label: String,
    section: String,
    /// What the packages are for, e.g. "basic development"
    purpose: String,
}

impl AptInstall {
    pub fn new(id: &str, label: &str, section: &str, purpose: &str) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            section: section.to_string(),
            purpose: purpose.to_string(),
        }
    }
}

impl Action for AptInstall {
    fn id(&self) -> &str {
        &self.id
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn execute(
        &self,
        manifest: &Manifest,
        ctx: &mut ExecutionContext<'_>,
    ) -> Result<ActionResult, ActionError> {
        let count = install_section(manifest, &self.section, &self.purpose, ctx)?;
        Ok(ActionResult::success_with(format!(
            "{count} {} package(s) installed",
            self.purpose
        )))
    }
}

/// Install the packages of `section`, returning how many were requested
///
/// A missing section is a missing prerequisite; an empty one installs nothing.
pub fn install_section(
    manifest: &Manifest,
    section: &str,
    purpose: &str,
    ctx: &mut ExecutionContext<'_>,
) -> Result<usize, ActionError> {
    let packages = manifest.section(section).ok_or_else(|| {
        ActionError::PrerequisiteMissing(format!("No '{section}' section found in package list"))
    })?;

    if packages.is_empty() {
        log::info!("section '{section}' is empty, nothing to install");
        return Ok(0);
    }

    let args = ["install", "-y"]
        .into_iter()
        .map(String::from)
        .chain(packages.iter().cloned());
    ctx.run_elevated(
        &format!("Installing {purpose} packages"),
        &CommandSpec::new("apt", args),
    )?;
    Ok(packages.len())
}
