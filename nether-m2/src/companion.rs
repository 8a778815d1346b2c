//! Companion file naming and lookup
//!
//! Modern models keep their view geometry in `<stem>00.skin` and may keep
//! per-sequence keyframes in `<stem><id:04>-<sub:02>.anim`, where `<stem>` is
//! the primary file name minus its three-character `.m2` extension.

use std::io;
use std::path::PathBuf;

use hashbrown::HashMap;

/// Source of companion files, keyed by derived file name
pub trait CompanionProvider {
    fn open(&self, name: &str) -> io::Result<Vec<u8>>;
}

/// Opens companions from the filesystem.
///
/// Names derived from an absolute primary path are used as-is. Relative
/// names are joined onto `root` when one is set.
#[derive(Debug, Clone, Default)]
pub struct FsCompanions {
    root: Option<PathBuf>,
}

impl FsCompanions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }
}

impl CompanionProvider for FsCompanions {
    fn open(&self, name: &str) -> io::Result<Vec<u8>> {
        match &self.root {
            Some(root) => std::fs::read(root.join(name)),
            None => std::fs::read(name),
        }
    }
}

/// In-memory companions, e.g. extracted from an archive
impl CompanionProvider for HashMap<String, Vec<u8>> {
    fn open(&self, name: &str) -> io::Result<Vec<u8>> {
        self.get(name).cloned().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("no companion named '{}'", name))
        })
    }
}

/// Primary name with its trailing three characters replaced by `suffix`.
pub fn companion_name(primary: &str, suffix: &str) -> String {
    let cut = primary
        .char_indices()
        .rev()
        .nth(2)
        .map(|(i, _)| i)
        .unwrap_or(0);
    format!("{}{}", &primary[..cut], suffix)
}

pub fn skin_file_name(primary: &str) -> String {
    companion_name(primary, "00.skin")
}

pub fn anim_file_name(primary: &str, animation_id: u16, sub_animation_id: u16) -> String {
    companion_name(
        primary,
        &format!("{:04}-{:02}.anim", animation_id, sub_animation_id),
    )
}
