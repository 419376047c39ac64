//! Legacy identifier classification and resolution.
//!
//! A stored scalar is one of three things: an already-canonical 16-byte
//! binary identifier, a legacy numeric file id, or a legacy filesystem
//! path. Classification is first-match-wins in that order; resolution asks
//! the host's file index for the canonical identifier and keeps the
//! original bytes on a lookup miss.

use tracing::debug;

use crate::core::traits::FileIndex;
use crate::core::value::{strip_trailing_nul, LegacyValue};
use crate::error::Result;

/// Kind of a single stored scalar, in classification priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    /// Already a canonical 16-byte binary identifier.
    Binary,
    /// Legacy numeric file id.
    Numeric(u64),
    /// Legacy filesystem path.
    Path,
}

/// Classify one scalar after stripping trailing NUL padding.
///
/// A value counts as already-binary when its trimmed length is exactly 16
/// bytes, it is not purely numeric, and it does not start with the upload
/// root followed by a path separator. A 16-byte path fragment outside the
/// upload root is indistinguishable from an identifier and is left
/// untouched.
pub fn classify_scalar(raw: &[u8], upload_path: &str) -> ScalarKind {
    let trimmed = strip_trailing_nul(raw);

    let numeric = std::str::from_utf8(trimmed)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .filter(|n| *n > 0);

    let prefix = format!("{upload_path}/");
    let looks_like_path = trimmed.starts_with(prefix.as_bytes());

    if trimmed.len() == 16 && numeric.is_none() && !looks_like_path {
        return ScalarKind::Binary;
    }

    match numeric {
        Some(id) => ScalarKind::Numeric(id),
        None => ScalarKind::Path,
    }
}

/// Outcome of resolving one scalar.
enum Resolution {
    /// Already canonical; original bytes kept.
    Kept,
    /// Replaced with the canonical identifier from the file index.
    Replaced(Vec<u8>),
    /// No matching file record; original bytes kept.
    Miss,
}

/// A value with every resolvable scalar replaced, plus tallies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedValue {
    /// Same shape as the input, scalars replaced where lookups hit.
    pub value: LegacyValue,
    /// Scalars replaced by a canonical identifier.
    pub replaced: u64,
    /// Lookups that found no record.
    pub misses: u64,
}

/// Resolves legacy scalars against the host's file index.
pub struct Resolver<'a> {
    files: &'a dyn FileIndex,
    upload_path: &'a str,
}

impl<'a> Resolver<'a> {
    pub fn new(files: &'a dyn FileIndex, upload_path: &'a str) -> Self {
        Self { files, upload_path }
    }

    /// Resolve every scalar of a value, best effort.
    ///
    /// For multi-valued rows the whole value is classified by its first
    /// element: an already-binary first element means the row was written
    /// by a previous run and is returned unchanged. Otherwise every
    /// element is classified and resolved independently.
    pub async fn resolve_value(&self, value: LegacyValue) -> Result<ResolvedValue> {
        match value {
            LegacyValue::Single(raw) => {
                let (bytes, replaced, misses) = self.resolve_bytes(raw).await?;
                Ok(ResolvedValue {
                    value: LegacyValue::Single(bytes),
                    replaced,
                    misses,
                })
            }
            LegacyValue::Many(items) => {
                let already_binary = items
                    .first()
                    .map(|first| classify_scalar(first, self.upload_path) == ScalarKind::Binary)
                    .unwrap_or(true);

                if already_binary {
                    return Ok(ResolvedValue {
                        value: LegacyValue::Many(items),
                        replaced: 0,
                        misses: 0,
                    });
                }

                let mut resolved = Vec::with_capacity(items.len());
                let mut replaced = 0;
                let mut misses = 0;
                for item in items {
                    let (bytes, r, m) = self.resolve_bytes(item).await?;
                    replaced += r;
                    misses += m;
                    resolved.push(bytes);
                }
                Ok(ResolvedValue {
                    value: LegacyValue::Many(resolved),
                    replaced,
                    misses,
                })
            }
        }
    }

    async fn resolve_bytes(&self, raw: Vec<u8>) -> Result<(Vec<u8>, u64, u64)> {
        match self.resolve_scalar(&raw).await? {
            Resolution::Kept => Ok((raw, 0, 0)),
            Resolution::Replaced(bytes) => Ok((bytes, 1, 0)),
            Resolution::Miss => Ok((raw, 0, 1)),
        }
    }

    async fn resolve_scalar(&self, raw: &[u8]) -> Result<Resolution> {
        let trimmed = strip_trailing_nul(raw);

        match classify_scalar(raw, self.upload_path) {
            ScalarKind::Binary => Ok(Resolution::Kept),
            ScalarKind::Numeric(id) => match self.files.find_by_id(id).await? {
                Some(record) => Ok(Resolution::Replaced(record.uuid.as_bytes().to_vec())),
                None => {
                    debug!("no file record for legacy id {id}");
                    Ok(Resolution::Miss)
                }
            },
            ScalarKind::Path => {
                // A path that is not valid UTF-8 cannot exist in the file
                // index; count it as a miss.
                let Ok(path) = std::str::from_utf8(trimmed) else {
                    return Ok(Resolution::Miss);
                };
                match self.files.find_by_path(path).await? {
                    Some(record) => Ok(Resolution::Replaced(record.uuid.as_bytes().to_vec())),
                    None => {
                        debug!("no file record for legacy path {path:?}");
                        Ok(Resolution::Miss)
                    }
                }
            }
        }
    }
}
