//! Persistent JSON document store.
//!
//! Resolution order for [`load_or_create`]:
//!
//! 1. the target exists: parse it (never fall through on failure)
//! 2. a template exists: load it, persist a copy at the target, return it
//! 3. otherwise build the default, persist it, return it
//!
//! Writes go to a temporary file in the destination directory and are renamed
//! into place, so a reader sees either the old or the new document.

use std::io::Write;
use std::path::Path;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::error::Category;

use crate::confirm::{Confirm, ProposedAction};
use crate::error::{Error, Result};
use crate::utils::{content_hash, short_hash};

/// How [`save`] treats an existing document at the destination.
#[derive(Clone, Copy)]
pub enum WritePolicy<'a> {
    /// Replace unconditionally (owned, mutable documents; the "force" flag)
    Replace,
    /// Ask before replacing a document whose content differs
    Confirm(&'a dyn Confirm),
}

/// What [`save`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveOutcome {
    /// SHA-256 of the bytes now on disk
    pub content_hash: String,
    /// Whether a different document was replaced
    pub replaced: bool,
    /// Whether the destination already held identical bytes
    pub unchanged: bool,
}

/// Load a document, creating it from a template or default when missing
pub fn load_or_create<T, F>(target: &Path, template: Option<&Path>, default: F) -> Result<T>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> T,
{
    if target.exists() {
        return read(target);
    }

    let document = match template.filter(|t| t.exists()) {
        Some(template) => {
            tracing::debug!(
                "Creating {} from template {}",
                target.display(),
                template.display()
            );
            read(template)?
        }
        None => {
            tracing::debug!("Creating {} from defaults", target.display());
            default()
        }
    };

    save(target, &document, WritePolicy::Replace)?;
    Ok(document)
}

/// Load a document if it exists
pub fn load<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }
    read(path).map(Some)
}

/// Read and parse an existing document
pub fn read<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::file_io(path, e))?;
    parse(path, &content)
}

fn parse<T: DeserializeOwned>(path: &Path, content: &str) -> Result<T> {
    serde_json::from_str(content).map_err(|e| match e.classify() {
        Category::Data => Error::validation(format!(
            "{} does not have the expected shape: {}",
            path.display(),
            e
        )),
        Category::Io => Error::file_io(path, std::io::Error::other(e.to_string())),
        Category::Syntax | Category::Eof => Error::corrupted(path, e.to_string()),
    })
}

/// Serialize a document the way it is stored
pub fn to_bytes<T: Serialize>(document: &T) -> Result<Vec<u8>> {
    let mut bytes = serde_json::to_vec_pretty(document)
        .map_err(|e| Error::validation(format!("document cannot be serialized: {}", e)))?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Write a document, creating parent directories as needed
pub fn save<T: Serialize>(path: &Path, document: &T, policy: WritePolicy<'_>) -> Result<SaveOutcome> {
    let bytes = to_bytes(document)?;
    let hash = content_hash(&bytes);
    let mut replaced = false;

    if path.exists() {
        let existing = std::fs::read(path).map_err(|e| Error::file_io(path, e))?;
        if content_hash(&existing) == hash {
            tracing::debug!("{} unchanged ({})", path.display(), short_hash(&hash));
            return Ok(SaveOutcome {
                content_hash: hash,
                replaced: false,
                unchanged: true,
            });
        }

        if let WritePolicy::Confirm(confirm) = policy {
            let action = ProposedAction::Overwrite {
                path: path.to_path_buf(),
            };
            if !confirm.confirm(&action) {
                return Err(Error::validation(format!(
                    "overwrite of {} was declined",
                    path.display()
                )));
            }
        }
        replaced = true;
    }

    write_atomic(path, &bytes)?;
    tracing::debug!("Wrote {} ({})", path.display(), short_hash(&hash));

    Ok(SaveOutcome {
        content_hash: hash,
        replaced,
        unchanged: false,
    })
}

/// Delete a document; returns whether it existed
pub fn remove(path: &Path) -> Result<bool> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(Error::file_io(path, e)),
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent).map_err(|e| Error::file_io(parent, e))?;

    let mut temp = tempfile::NamedTempFile::new_in(parent).map_err(|e| Error::file_io(parent, e))?;
    temp.write_all(bytes).map_err(|e| Error::file_io(path, e))?;
    temp.as_file().sync_all().map_err(|e| Error::file_io(path, e))?;
    temp.persist(path).map_err(|e| Error::file_io(path, e.error))?;
    Ok(())
}
