//! Directory-tree fingerprints used to decide whether an installed app bundle
//! is the same as the local one.
//!
//! `TreeDigester` walks a directory, orders entries by relative path, and feeds
//! each entry's kind, path, and content into a blake3 hasher. The result only
//! depends on relative paths and bytes: traversal order, timestamps, ownership
//! and permissions do not contribute.

use simsync_schema::Digest;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

pub const DIGEST_PREFIX: &str = "blake3:";

#[derive(Debug, Error)]
pub enum DigestError {
    #[error("digest I/O error at '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("cannot digest '{0}': not a directory")]
    NotADirectory(String),
    #[error("cannot digest '{0}': directory is empty")]
    Empty(String),
}

/// Computes a content fingerprint for a directory tree.
pub trait DigestProvider {
    fn digest(&self, dir: &Path) -> Result<Digest, DigestError>;
}

/// blake3 over the sorted, recursively collected entries of a directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct TreeDigester;

impl TreeDigester {
    pub fn new() -> Self {
        Self
    }
}

enum EntryKind {
    Dir,
    File,
    Symlink,
}

struct Entry {
    rel: Vec<u8>,
    full: PathBuf,
    kind: EntryKind,
}

impl DigestProvider for TreeDigester {
    fn digest(&self, dir: &Path) -> Result<Digest, DigestError> {
        if !dir.is_dir() {
            return Err(DigestError::NotADirectory(dir.display().to_string()));
        }

        let mut entries = Vec::new();
        collect_entries(dir, dir, &mut entries)?;
        if entries.is_empty() {
            return Err(DigestError::Empty(dir.display().to_string()));
        }
        entries.sort_by(|a, b| a.rel.cmp(&b.rel));

        let mut hasher = blake3::Hasher::new();
        for entry in &entries {
            match entry.kind {
                EntryKind::Dir => {
                    hasher.update(b"d\0");
                    hasher.update(&entry.rel);
                    hasher.update(b"\0");
                }
                EntryKind::File => {
                    hasher.update(b"f\0");
                    hasher.update(&entry.rel);
                    hasher.update(b"\0");
                    hash_file(&mut hasher, &entry.full)?;
                }
                EntryKind::Symlink => {
                    let target = fs::read_link(&entry.full).map_err(|e| io_err(&entry.full, e))?;
                    hasher.update(b"l\0");
                    hasher.update(&entry.rel);
                    hasher.update(b"\0");
                    hasher.update(target.as_os_str().as_encoded_bytes());
                    hasher.update(b"\0");
                }
            }
        }

        let digest = Digest::new(format!("{DIGEST_PREFIX}{}", hasher.finalize().to_hex()));
        debug!(
            "digested {} entries under {}: {digest}",
            entries.len(),
            dir.display()
        );
        Ok(digest)
    }
}

fn hash_file(hasher: &mut blake3::Hasher, path: &Path) -> Result<(), DigestError> {
    let mut file = fs::File::open(path).map_err(|e| io_err(path, e))?;
    let len = file.metadata().map_err(|e| io_err(path, e))?.len();
    hasher.update(&len.to_le_bytes());
    let copied = io::copy(&mut file, hasher).map_err(|e| io_err(path, e))?;
    if copied != len {
        return Err(io_err(
            path,
            io::Error::other(format!("file changed while hashing ({copied} of {len} bytes)")),
        ));
    }
    Ok(())
}

/// Recursively collect entries keyed by their `/`-joined relative path.
fn collect_entries(root: &Path, current: &Path, out: &mut Vec<Entry>) -> Result<(), DigestError> {
    for entry in fs::read_dir(current).map_err(|e| io_err(current, e))? {
        let entry = entry.map_err(|e| io_err(current, e))?;
        let full = entry.path();
        let meta = full.symlink_metadata().map_err(|e| io_err(&full, e))?;
        let rel = relative_key(root, &full);

        if meta.is_dir() {
            out.push(Entry {
                rel,
                full: full.clone(),
                kind: EntryKind::Dir,
            });
            collect_entries(root, &full, out)?;
        } else if meta.is_file() {
            out.push(Entry {
                rel,
                full,
                kind: EntryKind::File,
            });
        } else if meta.file_type().is_symlink() {
            out.push(Entry {
                rel,
                full,
                kind: EntryKind::Symlink,
            });
        } else {
            warn!("skipping unsupported file type: {}", full.display());
        }
    }
    Ok(())
}

fn relative_key(root: &Path, full: &Path) -> Vec<u8> {
    let rel = full.strip_prefix(root).unwrap_or(full);
    let mut key = Vec::new();
    for component in rel.components() {
        if let Component::Normal(part) = component {
            if !key.is_empty() {
                key.push(b'/');
            }
            key.extend_from_slice(part.as_encoded_bytes());
        }
    }
    key
}

fn io_err(path: &Path, source: io::Error) -> DigestError {
    DigestError::Io {
        path: path.display().to_string(),
        source,
    }
}
