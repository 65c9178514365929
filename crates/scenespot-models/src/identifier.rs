//! Artifact identifiers.
//!
//! An identifier is derived from the uploaded file's name and doubles as the
//! cache key and the artifact's file stem, so it is restricted to characters
//! that are safe in a single path component.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Longest identifier kept, in bytes.
pub const MAX_IDENTIFIER_LEN: usize = 200;

/// Hex characters of the content digest used by [`CacheKeyPolicy::ContentHash`].
const CONTENT_HASH_PREFIX_LEN: usize = 16;

/// Hex characters of the name digest added when normalization drops information.
const NAME_TAG_LEN: usize = 8;

/// Longer suffixes are not treated as a file extension.
const MAX_EXTENSION_LEN: usize = 16;

/// Errors that can occur while deriving an identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    #[error("file name is empty")]
    Empty,

    #[error("file name has no name component: {0:?}")]
    NoUsableCharacters(String),
}

/// Result type for identifier derivation.
pub type IdentifierResult<T> = Result<T, IdentifierError>;

/// How uploads map to cache keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CacheKeyPolicy {
    /// Key by normalized file name only. Re-uploading a different video under
    /// an existing name returns the old index.
    #[default]
    Filename,
    /// Prefix the normalized name with a digest of the video bytes, so the
    /// same name with different content is indexed separately.
    ContentHash,
}

impl CacheKeyPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheKeyPolicy::Filename => "filename",
            CacheKeyPolicy::ContentHash => "content_hash",
        }
    }
}

impl FromStr for CacheKeyPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "filename" | "name" => Ok(CacheKeyPolicy::Filename),
            "content" | "content_hash" | "hash" => Ok(CacheKeyPolicy::ContentHash),
            other => Err(format!("unknown cache key policy: {}", other)),
        }
    }
}

impl fmt::Display for CacheKeyPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Normalized artifact identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identifier(String);

impl Identifier {
    /// Normalize a client-supplied file name.
    ///
    /// - Only the final path component is used
    /// - Spaces become underscores
    /// - Anything outside `[A-Za-z0-9._-]` becomes an underscore
    /// - Leading dots are stripped (no hidden files, no `..`)
    ///
    /// When a character other than a space is replaced, leading dots are
    /// stripped, or the name is cut to length, a digest of the original name
    /// is added before the extension (`_____-1a2b3c4d.mp4`). Distinct names
    /// therefore never share an identifier, and an identifier normalizes to
    /// itself.
    pub fn from_filename(raw: &str) -> IdentifierResult<Self> {
        Self::normalize(raw, MAX_IDENTIFIER_LEN)
    }

    /// Derive the identifier for an upload under the given policy.
    pub fn for_upload(raw_name: &str, content: &[u8], policy: CacheKeyPolicy) -> IdentifierResult<Self> {
        match policy {
            CacheKeyPolicy::Filename => Self::from_filename(raw_name),
            CacheKeyPolicy::ContentHash => {
                let name =
                    Self::normalize(raw_name, MAX_IDENTIFIER_LEN - CONTENT_HASH_PREFIX_LEN - 1)?;
                let digest = format!("{:x}", Sha256::digest(content));
                Ok(Self(format!("{}_{}", &digest[..CONTENT_HASH_PREFIX_LEN], name.0)))
            }
        }
    }

    fn normalize(raw: &str, max_len: usize) -> IdentifierResult<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(IdentifierError::Empty);
        }

        let base = trimmed
            .rsplit(|c: char| c == '/' || c == '\\')
            .next()
            .unwrap_or(trimmed);

        let mut lossy = false;
        let mapped: String = base
            .chars()
            .map(|c| {
                let n = normalize_char(c);
                lossy |= n != c && c != ' ';
                n
            })
            .collect();

        let stripped = mapped.trim_start_matches('.');
        if stripped.is_empty() {
            return Err(IdentifierError::NoUsableCharacters(raw.to_string()));
        }
        lossy |= stripped.len() != mapped.len() || stripped.len() > max_len;

        if !lossy {
            return Ok(Self(stripped.to_string()));
        }

        // Every character left in `stripped` is ASCII, so byte slicing is safe.
        let digest = format!("{:x}", Sha256::digest(base.as_bytes()));
        let tag = &digest[..NAME_TAG_LEN];
        let (stem, ext) = split_extension(stripped);
        let room = max_len - ext.len() - tag.len() - 1;
        let stem = &stem[..stem.len().min(room)];

        Ok(Self(format!("{}-{}{}", stem, tag, ext)))
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File name of the artifact stored for this identifier.
    pub fn artifact_file_name(&self) -> String {
        format!("{}.json", self.0)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn normalize_char(c: char) -> char {
    if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
        c
    } else {
        '_'
    }
}

/// Split `name` into stem and extension (with its dot).
fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(i) if i > 0 && name.len() - i <= MAX_EXTENSION_LEN => name.split_at(i),
        _ => (name, ""),
    }
}
