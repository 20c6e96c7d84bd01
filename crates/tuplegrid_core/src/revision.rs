//! Optimistic-concurrency revision tokens.
//!
//! A revision is captured when a document is loaded and sent back as a
//! precondition when it is written. A write whose expected revision differs
//! from the stored one fails with [`GridError::StaleState`].

use std::fmt;
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{GridError, GridResult};
use crate::key::Key;

/// An opaque document revision token.
///
/// Tokens minted by [`Revision::first`] and [`Revision::successor`] have the
/// form `<generation>-<digest>`, where the digest is the first 8 bytes of
/// the SHA-256 of the document's canonical bytes, hex encoded. Backends with
/// native tokens wrap them with [`Revision::from_token`] instead.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Revision(String);

impl Revision {
    /// Revision of a freshly inserted document.
    #[must_use]
    pub fn first(content: &[u8]) -> Self {
        Self::mint(1, content)
    }

    /// Revision following this one after a write of `content`.
    #[must_use]
    pub fn successor(&self, content: &[u8]) -> Self {
        Self::following(self.generation(), content)
    }

    /// Revision one generation past `generation` for a write of `content`.
    #[must_use]
    pub fn following(generation: u64, content: &[u8]) -> Self {
        Self::mint(generation.saturating_add(1), content)
    }

    /// Wraps a backend-native token.
    pub fn from_token(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Generation counter, or 0 for tokens not minted here.
    pub fn generation(&self) -> u64 {
        self.0
            .split_once('-')
            .and_then(|(generation, _)| generation.parse().ok())
            .unwrap_or(0)
    }

    /// Returns the token text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn mint(generation: u64, content: &[u8]) -> Self {
        let digest = Sha256::digest(content);
        let mut token = format!("{generation}-");
        for byte in &digest[..8] {
            let _ = write!(token, "{byte:02x}");
        }
        Self(token)
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Verifies that the stored revision is the one the writer loaded.
///
/// `None` on either side means "no document": inserting expects `None`, and
/// writing to a document that has since been removed sees `None`.
///
/// # Errors
///
/// Returns [`GridError::StaleState`] when the revisions differ.
pub fn check_revision(
    key: &Key,
    expected: Option<&Revision>,
    actual: Option<&Revision>,
) -> GridResult<()> {
    if expected == actual {
        return Ok(());
    }
    tracing::debug!(%key, ?expected, ?actual, "revision conflict");
    Err(GridError::StaleState {
        key: key.clone(),
        expected: expected.cloned(),
        actual: actual.cloned(),
    })
}
