//! High-level [`Archive`] API: a container file on disk plus its decoded directory.
//!
//! ```no_run
//! use ggpack::archive::{Archive, ExtractOptions};
//!
//! let mut ar = Archive::open("Weird.ggpack1")?;
//! for f in ar.list()? {
//!     println!("{}\t{}", f.name, f.size);
//! }
//! let opts = ExtractOptions {
//!     pattern: Some(regex::Regex::new(r"\.wimpy$").unwrap()),
//!     ..ExtractOptions::default()
//! };
//! ar.extract(&opts)?;
//! # Ok::<(), ggpack::PackError>(())
//! ```

use log::{debug, info};
use regex::Regex;
use std::fs::{self, File};
use std::io;
use std::path::{Component, Path, PathBuf};

use crate::error::Result;
use crate::pack::{FileEntry, Pack};
use crate::value::DecodeOptions;

// ── ExtractOptions ────────────────────────────────────────────────────────────

/// Configuration for [`Archive::extract`].
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Only names containing a match are written.  `None` selects every file.
    pub pattern:    Option<Regex>,
    pub output_dir: PathBuf,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            pattern:    None,
            output_dir: PathBuf::from("."),
        }
    }
}

impl ExtractOptions {
    pub fn selects(&self, name: &str) -> bool {
        self.pattern.as_ref().map_or(true, |re| re.is_match(name))
    }
}

// ── Archive ───────────────────────────────────────────────────────────────────

pub struct Archive {
    path: PathBuf,
    file: File,
    pack: Pack,
}

impl Archive {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_options(path, &DecodeOptions::default())
    }

    pub fn open_with_options<P: AsRef<Path>>(path: P, options: &DecodeOptions) -> Result<Self> {
        let path = path.as_ref().to_owned();
        let mut file = File::open(&path)?;
        let pack = Pack::read_with_options(&mut file, options)?;
        debug!("Opened {} ({})", path.display(), pack.method());
        Ok(Self { path, file, pack })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn pack(&self) -> &Pack {
        &self.pack
    }

    pub fn list(&self) -> Result<Vec<FileEntry>> {
        self.pack.files()
    }

    pub fn stat(&self, name: &str) -> Result<Option<FileEntry>> {
        Ok(self.list()?.into_iter().find(|f| f.name == name))
    }

    /// Read and decipher one embedded file by name.
    pub fn read_file(&mut self, name: &str) -> Result<Vec<u8>> {
        let entry = self.stat(name)?.ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("File not found: {name}"))
        })?;
        self.read_entry(&entry)
    }

    pub fn read_entry(&mut self, entry: &FileEntry) -> Result<Vec<u8>> {
        self.pack.read_payload(&mut self.file, entry)
    }

    /// Write every selected file below `opts.output_dir`.  Returns the number
    /// of files written.
    pub fn extract(&mut self, opts: &ExtractOptions) -> Result<usize> {
        let mut written = 0;
        for entry in self.list()? {
            if !opts.selects(&entry.name) {
                continue;
            }
            let dest = output_path(&opts.output_dir, &entry.name)?;
            let data = self.read_entry(&entry)?;
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&dest, &data)?;
            info!("extracted {} ({} bytes)", dest.display(), data.len());
            written += 1;
        }
        Ok(written)
    }
}

/// Join an entry name onto `dir`, refusing names that escape it.
fn output_path(dir: &Path, name: &str) -> io::Result<PathBuf> {
    let rel = Path::new(name);
    let safe = rel.components().all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    if !safe || name.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("refusing to extract unsafe file name {name:?}"),
        ));
    }
    Ok(dir.join(rel))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_path_rejects_escapes() {
        let dir = Path::new("/tmp/out");
        assert_eq!(output_path(dir, "a/b.txt").unwrap(), dir.join("a/b.txt"));
        assert!(output_path(dir, "../evil").is_err());
        assert!(output_path(dir, "/etc/passwd").is_err());
        assert!(output_path(dir, "").is_err());
    }

    #[test]
    fn default_options_select_everything() {
        let opts = ExtractOptions::default();
        assert!(opts.selects("anything.png"));
        let opts = ExtractOptions { pattern: Some(Regex::new(r"\.png$").unwrap()), ..opts };
        assert!(opts.selects("ui/Button.png"));
        assert!(!opts.selects("Button.png.txt"));
    }
}
