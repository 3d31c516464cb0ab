//! Builds from upstream release tarballs (Emacs, GNU Stow)
//!
//! Both follow the same shape: fetch the tarball through the mirror list,
//! unpack it into a fresh directory, then configure, make and install.
//! The first failing step ends the action; nothing is rolled back.

use actionkit::{
    Action, ActionError, ActionResult, CommandSpec, ExecutionContext, FetchReport,
    expand_templates,
};
use flate2::read::GzDecoder;
use manifest::Manifest;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tar::Archive;

use super::apt::install_section;

#[derive(Debug)]
pub struct EmacsBuild {
    id: String,
    default_version: String,
    mirrors: Vec<String>,
    configure_flags: Vec<String>,
}

impl EmacsBuild {
    pub fn new(
        id: &str,
        default_version: &str,
        mirrors: Vec<String>,
        configure_flags: Vec<String>,
    ) -> Self {
        Self {
            id: id.to_string(),
            default_version: default_version.to_string(),
            mirrors,
            configure_flags,
        }
    }
}

impl Action for EmacsBuild {
    fn id(&self) -> &str {
        &self.id
    }

    fn label(&self) -> &str {
        "Install Emacs from source"
    }

    fn execute(
        &self,
        manifest: &Manifest,
        ctx: &mut ExecutionContext<'_>,
    ) -> Result<ActionResult, ActionError> {
        let version = ctx
            .input
            .text_or_default("Enter Emacs version", &self.default_version);
        let candidates = expand_templates(&self.mirrors, &version);

        let archive = ctx.work_dir.join(format!("emacs-{version}.tar.gz"));
        let report = fetch(ctx, "Emacs", &candidates, &archive)?;

        let build_root = ctx.work_dir.join(format!("provisor-emacs-{version}"));
        ctx.step("Extracting Emacs");
        extract_targz(&archive, &build_root)?;
        let src = single_top_level(&build_root, "emacs-")?;

        install_section(manifest, "emacs", "Emacs dependencies", ctx)?;

        ctx.run_step(
            "Configuring Emacs",
            &CommandSpec::new(&script(&src, "configure"), self.configure_flags.clone())
                .in_dir(&src),
        )?;
        ctx.run_step(
            "Compiling Emacs",
            &CommandSpec::new("make", [format!("-j{}", cpu_count())]).in_dir(&src),
        )?;
        ctx.run_step(
            "Running Emacs tests",
            &CommandSpec::new("make", ["check"]).in_dir(&src),
        )?;
        ctx.run_elevated(
            "Installing Emacs",
            &CommandSpec::new("make", ["install"]).in_dir(&src),
        )?;

        Ok(ActionResult::success_with(format!(
            "Emacs {version} built from {}",
            report.source
        )))
    }
}

#[derive(Debug)]
pub struct StowBuild {
    id: String,
    mirrors: Vec<String>,
}

impl StowBuild {
    pub fn new(id: &str, mirrors: Vec<String>) -> Self {
        Self {
            id: id.to_string(),
            mirrors,
        }
    }
}

impl Action for StowBuild {
    fn id(&self) -> &str {
        &self.id
    }

    fn label(&self) -> &str {
        "Install GNU Stow from source"
    }

    fn execute(
        &self,
        _manifest: &Manifest,
        ctx: &mut ExecutionContext<'_>,
    ) -> Result<ActionResult, ActionError> {
        let archive = ctx.work_dir.join("stow-latest.tar.gz");
        let report = fetch(ctx, "GNU Stow", &self.mirrors, &archive)?;

        let build_root = ctx.work_dir.join("provisor-stow");
        ctx.step("Extracting GNU Stow");
        extract_targz(&archive, &build_root)?;
        let src = single_top_level(&build_root, "stow-")?;
        log::info!("Found extracted directory: {}", src.display());

        ctx.run_step(
            "Configuring GNU Stow",
            &CommandSpec::new(&script(&src, "configure"), Vec::<String>::new()).in_dir(&src),
        )?;
        ctx.run_step(
            "Compiling GNU Stow",
            &CommandSpec::new("make", Vec::<String>::new()).in_dir(&src),
        )?;
        ctx.run_elevated(
            "Installing GNU Stow",
            &CommandSpec::new("make", ["install"]).in_dir(&src),
        )?;

        let name = src
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(ActionResult::success_with(format!(
            "{name} built from {}",
            report.source
        )))
    }
}

/// Fetch through the mirror list, offering another pass when all fail
fn fetch(
    ctx: &mut ExecutionContext<'_>,
    what: &str,
    candidates: &[String],
    dest: &Path,
) -> Result<FetchReport, ActionError> {
    loop {
        ctx.step(&format!("Downloading {what}"));
        match ctx.fetcher.fetch(candidates, dest) {
            Ok(report) => {
                log::info!("{what}: {} bytes from {}", report.bytes, report.source);
                return Ok(report);
            }
            Err(err) => {
                log::warn!("{err}");
                let question = format!("Could not download {what}: {err}. Retry the mirror list?");
                if !ctx.input.confirm(&question, false) {
                    return Err(err.into());
                }
            }
        }
    }
}

/// Unpack a `.tar.gz` into a fresh `dest`
pub fn extract_targz(archive: &Path, dest: &Path) -> Result<(), ActionError> {
    const STEP: &str = "Extracting";

    if dest.exists() {
        fs::remove_dir_all(dest).map_err(|e| ActionError::io(STEP, dest, e))?;
    }
    fs::create_dir_all(dest).map_err(|e| ActionError::io(STEP, dest, e))?;

    let file = File::open(archive).map_err(|e| ActionError::io(STEP, archive, e))?;
    Archive::new(GzDecoder::new(file))
        .unpack(dest)
        .map_err(|e| ActionError::io(STEP, archive, e))
}

/// The one top-level directory named `<prefix>*` inside `root`
pub fn single_top_level(root: &Path, prefix: &str) -> Result<PathBuf, ActionError> {
    let entries = fs::read_dir(root).map_err(|e| ActionError::io("Extracting", root, e))?;
    let mut found: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .filter(|e| e.file_name().to_string_lossy().starts_with(prefix))
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect();

    match found.len() {
        1 => Ok(found.remove(0)),
        0 => Err(ActionError::PrerequisiteMissing(format!(
            "Could not find extracted {prefix}* directory in {}",
            root.display()
        ))),
        n => Err(ActionError::step(
            "Extracting",
            format!("archive has {n} top-level {prefix}* directories"),
        )),
    }
}

fn script(dir: &Path, name: &str) -> String {
    dir.join(name).display().to_string()
}

fn cpu_count() -> usize {
    std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get)
}
