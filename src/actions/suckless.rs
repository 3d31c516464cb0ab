//! DWM dependencies and the suckless source trees

use actionkit::{Action, ActionError, ActionResult, CommandSpec, ExecutionContext};
use manifest::Manifest;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::apt::install_section;

/// Programs that must be present, in build order
pub const PROGRAMS: [&str; 4] = ["dwm", "st", "dmenu", "slock"];

#[derive(Debug)]
pub struct SucklessBuild {
    id: String,
    dir: PathBuf,
}

impl SucklessBuild {
    pub fn new(id: &str, dir: impl Into<PathBuf>) -> Self {
        Self {
            id: id.to_string(),
            dir: dir.into(),
        }
    }
}

impl Action for SucklessBuild {
    fn id(&self) -> &str {
        &self.id
    }

    fn label(&self) -> &str {
        "Install DWM dependencies and compile suckless programs"
    }

    fn execute(
        &self,
        manifest: &Manifest,
        ctx: &mut ExecutionContext<'_>,
    ) -> Result<ActionResult, ActionError> {
        install_section(manifest, "dwm", "DWM dependencies", ctx)?;

        let trees = find_sources(&self.dir)?;
        for tree in &trees {
            let name = tree
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            ctx.run_step(
                &format!("Compiling {name}"),
                &CommandSpec::new("make", Vec::<String>::new()).in_dir(tree),
            )?;
        }

        Ok(ActionResult::success_with(format!(
            "compiled {} program(s)",
            trees.len()
        )))
    }
}

/// Directories to build, grouped by program in [`PROGRAMS`] order
///
/// Every program needs at least one entry named `<program>*` in `dir`;
/// the first one without a match is reported. Matching plain files are
/// accepted as present but not built.
pub fn find_sources(dir: &Path) -> Result<Vec<PathBuf>, ActionError> {
    let entries = fs::read_dir(dir).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => ActionError::PrerequisiteMissing(format!(
            "Suckless directory not found: {}",
            dir.display()
        )),
        _ => ActionError::io("Reading suckless directory", dir, e),
    })?;

    let mut names: Vec<(String, PathBuf)> = entries
        .filter_map(Result::ok)
        .map(|e| (e.file_name().to_string_lossy().into_owned(), e.path()))
        .collect();
    names.sort();

    let mut trees = Vec::new();
    for program in PROGRAMS {
        let matches: Vec<&PathBuf> = names
            .iter()
            .filter(|(name, _)| name.starts_with(program))
            .map(|(_, path)| path)
            .collect();
        if matches.is_empty() {
            return Err(ActionError::PrerequisiteMissing(format!(
                "Required program '{program}' not found in {}",
                dir.display()
            )));
        }
        for path in matches {
            if path.is_dir() && !trees.contains(path) {
                trees.push(path.clone());
            }
        }
    }
    Ok(trees)
}
