//! # Manifest
//!
//! Parser for the flat, sectioned package list consumed by `provisor`.
//!
//! ```text
//! [dev]
//! gcc
//! make
//!
//! [utils]
//! htop
//! ```
//!
//! Blank lines and `#` comments are ignored. A `[name]` line opens a section;
//! every other line is an opaque item token of the currently open section.
//!
//! ## Example
//!
//! ```
//! let manifest = manifest::parse_str("[dev]\ngcc\nmake\n")?;
//! assert_eq!(manifest.section("dev"), Some(&["gcc".to_string(), "make".to_string()][..]));
//! # Ok::<(), manifest::Error>(())
//! ```

mod error;

pub use error::{Error, Result};

use std::path::Path;

/// Named sections of item tokens, in file order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    sections: Vec<Section>,
}

/// A single `[name]` block and its items
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// Section name without brackets
    pub name: String,
    /// Item tokens in file order
    pub items: Vec<String>,
}

impl Manifest {
    /// Create an empty manifest
    pub fn new() -> Self {
        Self::default()
    }

    /// Load and parse a manifest file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::NotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path).map_err(|source| Error::Read {
            path: path.to_path_buf(),
            source,
        })?;
        parse_str(&content)
    }

    /// Items of a section, if the section exists
    pub fn section(&self, name: &str) -> Option<&[String]> {
        self.sections
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.items.as_slice())
    }

    /// Iterate sections in file order
    pub fn sections(&self) -> impl Iterator<Item = &Section> {
        self.sections.iter()
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Append items to a section, creating it if needed
    ///
    /// A repeated header in a file extends the existing section.
    pub fn extend_section<I, S>(&mut self, name: &str, items: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let index = self.open_section(name);
        self.sections[index]
            .items
            .extend(items.into_iter().map(Into::into));
        self
    }

    fn open_section(&mut self, name: &str) -> usize {
        if let Some(index) = self.sections.iter().position(|s| s.name == name) {
            return index;
        }
        self.sections.push(Section {
            name: name.to_string(),
            items: Vec::new(),
        });
        self.sections.len() - 1
    }
}

/// Parse manifest text
pub fn parse_str(content: &str) -> Result<Manifest> {
    let mut manifest = Manifest::new();
    let mut current: Option<usize> = None;

    for (line_num, line) in content.lines().enumerate() {
        let line = line.trim();

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            let name = name.trim();
            if name.is_empty() {
                return Err(Error::EmptySectionName { line: line_num + 1 });
            }
            current = Some(manifest.open_section(name));
            continue;
        }

        match current {
            Some(index) => manifest.sections[index].items.push(line.to_string()),
            None => {
                return Err(Error::ItemOutsideSection {
                    line: line_num + 1,
                    item: line.to_string(),
                });
            }
        }
    }

    Ok(manifest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = "\
[dev]
gcc
make

[dwm]
libx11-dev
libxft-dev
  libxinerama-dev  

[utils]
htop
";

    #[test]
    fn test_parse_sections_in_order() {
        let manifest = parse_str(SAMPLE).unwrap();
        let names: Vec<_> = manifest.sections().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["dev", "dwm", "utils"]);
        assert_eq!(manifest.len(), 3);
    }

    #[test]
    fn test_items_are_trimmed() {
        let manifest = parse_str(SAMPLE).unwrap();
        assert_eq!(
            manifest.section("dwm").unwrap(),
            &["libx11-dev", "libxft-dev", "libxinerama-dev"]
        );
    }

    #[test]
    fn test_missing_section() {
        let manifest = parse_str(SAMPLE).unwrap();
        assert!(manifest.section("emacs").is_none());
    }

    #[test]
    fn test_item_before_section_is_error() {
        let err = parse_str("gcc\n[dev]\nmake\n").unwrap_err();
        match err {
            Error::ItemOutsideSection { line, item } => {
                assert_eq!(line, 1);
                assert_eq!(item, "gcc");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_blank_lines_and_comments_before_section() {
        let manifest = parse_str("\n\n# packages\n[dev]\ngcc\n").unwrap();
        assert_eq!(manifest.section("dev").unwrap(), &["gcc"]);
    }

    #[test]
    fn test_empty_section_name_is_error() {
        assert!(matches!(
            parse_str("[]\ngcc\n"),
            Err(Error::EmptySectionName { line: 1 })
        ));
    }

    #[test]
    fn test_empty_section_is_kept() {
        let manifest = parse_str("[dev]\n[utils]\nhtop\n").unwrap();
        assert_eq!(manifest.section("dev"), Some(&[][..]));
    }

    #[test]
    fn test_repeated_header_extends_section() {
        let manifest = parse_str("[dev]\ngcc\n[utils]\nhtop\n[dev]\nmake\n").unwrap();
        assert_eq!(manifest.section("dev").unwrap(), &["gcc", "make"]);
        assert_eq!(manifest.len(), 2);
    }

    #[test]
    fn test_extend_section_builder() {
        let mut manifest = Manifest::new();
        manifest.extend_section("dev", ["gcc", "make"]);
        assert_eq!(manifest.section("dev").unwrap(), &["gcc", "make"]);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("package_list.txt");
        assert!(matches!(Manifest::load(&path), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_load_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let manifest = Manifest::load(file.path()).unwrap();
        assert_eq!(manifest.section("dev").unwrap(), &["gcc", "make"]);
    }
}
