//! Core value types for the index access layer.
//!
//! These types form the vocabulary shared between the [`GitRepo`](crate::GitRepo) trait and
//! the merge-index driver. They contain no gix types; the backend is an
//! implementation detail.

use std::cmp::Ordering;
use std::ffi::OsString;
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// GitOid
// ---------------------------------------------------------------------------

/// Width of a SHA-1 object id in bytes.
pub const SHA1_LEN: usize = 20;

/// Width of a SHA-256 object id in bytes.
pub const SHA256_LEN: usize = 32;

/// A git object identifier, either SHA-1 (20 bytes) or SHA-256 (32 bytes).
///
/// Stored inline so it stays `Copy`. Displays as lowercase hex of exactly
/// the hash width (40 or 64 characters).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GitOid {
    bytes: [u8; SHA256_LEN],
    len: usize,
}

impl GitOid {
    /// The SHA-1 zero OID (`0000...0000`).
    pub const ZERO: Self = Self {
        bytes: [0; SHA256_LEN],
        len: SHA1_LEN,
    };

    /// Create a SHA-1 `GitOid` from raw bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; SHA1_LEN]) -> Self {
        let mut buf = [0u8; SHA256_LEN];
        let mut i = 0;
        while i < SHA1_LEN {
            buf[i] = bytes[i];
            i += 1;
        }
        Self {
            bytes: buf,
            len: SHA1_LEN,
        }
    }

    /// Create a `GitOid` from a raw digest of either supported width.
    ///
    /// # Errors
    /// Returns an error if `raw` is neither 20 nor 32 bytes long.
    pub fn from_slice(raw: &[u8]) -> Result<Self, OidParseError> {
        if raw.len() != SHA1_LEN && raw.len() != SHA256_LEN {
            return Err(OidParseError {
                value: format!("<{} raw bytes>", raw.len()),
                reason: format!(
                    "expected {SHA1_LEN} or {SHA256_LEN} bytes, got {}",
                    raw.len()
                ),
            });
        }
        let mut bytes = [0u8; SHA256_LEN];
        bytes[..raw.len()].copy_from_slice(raw);
        Ok(Self {
            bytes,
            len: raw.len(),
        })
    }

    /// Return the raw digest bytes (20 or 32 of them).
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    /// Number of hex characters this id renders to.
    #[must_use]
    pub fn hex_len(&self) -> usize {
        self.len * 2
    }

    /// Return `true` if every byte is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.as_bytes().iter().all(|b| *b == 0)
    }
}

impl fmt::Display for GitOid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.as_bytes() {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for GitOid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GitOid({self})")
    }
}

impl FromStr for GitOid {
    type Err = OidParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != SHA1_LEN * 2 && s.len() != SHA256_LEN * 2 {
            return Err(OidParseError {
                value: s.to_owned(),
                reason: format!(
                    "expected {} or {} hex characters, got {}",
                    SHA1_LEN * 2,
                    SHA256_LEN * 2,
                    s.len()
                ),
            });
        }
        let mut raw = Vec::with_capacity(s.len() / 2);
        for chunk in s.as_bytes().chunks(2) {
            let hi = hex_digit(chunk[0]).ok_or_else(|| OidParseError {
                value: s.to_owned(),
                reason: format!("invalid hex digit '{}'", chunk[0] as char),
            })?;
            let lo = hex_digit(chunk[1]).ok_or_else(|| OidParseError {
                value: s.to_owned(),
                reason: format!("invalid hex digit '{}'", chunk[1] as char),
            })?;
            raw.push((hi << 4) | lo);
        }
        Self::from_slice(&raw)
    }
}

/// Error from building a [`GitOid`] out of hex text or raw bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OidParseError {
    /// The raw value that failed.
    pub value: String,
    /// Why it failed.
    pub reason: String,
}

impl fmt::Display for OidParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid OID {:?}: {}", self.value, self.reason)
    }
}

impl std::error::Error for OidParseError {}

const fn hex_digit(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Stage
// ---------------------------------------------------------------------------

/// The conflict side an index entry belongs to.
///
/// `Resolved` (stage 0) is a normal, merged entry. The other three only exist
/// while a path is unmerged. Which participant each conflict stage stands
/// for is the caller's business; this layer only carries the number.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    /// Stage 0: not in conflict.
    Resolved = 0,
    /// Stage 1: common ancestor.
    Base = 1,
    /// Stage 2: our side.
    Ours = 2,
    /// Stage 3: their side.
    Theirs = 3,
}

impl Stage {
    /// The three conflict stages in slot order.
    pub const CONFLICT: [Self; 3] = [Self::Base, Self::Ours, Self::Theirs];

    /// Convert a raw stage number.
    ///
    /// # Errors
    /// Returns the rejected value if it is above 3.
    pub const fn from_raw(raw: u8) -> Result<Self, u8> {
        match raw {
            0 => Ok(Self::Resolved),
            1 => Ok(Self::Base),
            2 => Ok(Self::Ours),
            3 => Ok(Self::Theirs),
            other => Err(other),
        }
    }

    /// The raw stage number.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// `true` for stages 1 through 3.
    #[must_use]
    pub const fn is_conflict(self) -> bool {
        !matches!(self, Self::Resolved)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

// ---------------------------------------------------------------------------
// IndexPath
// ---------------------------------------------------------------------------

/// A repository-relative, `/`-separated path exactly as the index stores it.
///
/// Git paths are byte strings and need not be valid UTF-8. `Display` is
/// lossy and meant for diagnostics only; use [`IndexPath::to_os_string`] to
/// hand the path to another program unchanged.
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IndexPath(Vec<u8>);

impl IndexPath {
    /// Wrap raw path bytes.
    #[must_use]
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// The raw path bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Convert to an OS string without loss on unix.
    #[must_use]
    pub fn to_os_string(&self) -> OsString {
        #[cfg(unix)]
        {
            std::os::unix::ffi::OsStringExt::from_vec(self.0.clone())
        }
        #[cfg(not(unix))]
        {
            OsString::from(String::from_utf8_lossy(&self.0).into_owned())
        }
    }

    /// Build from a command-line argument without loss on unix.
    #[must_use]
    pub fn from_os_string(s: OsString) -> Self {
        #[cfg(unix)]
        {
            Self(std::os::unix::ffi::OsStringExt::into_vec(s))
        }
        #[cfg(not(unix))]
        {
            Self(s.to_string_lossy().into_owned().into_bytes())
        }
    }
}

impl AsRef<[u8]> for IndexPath {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<&str> for IndexPath {
    fn from(s: &str) -> Self {
        Self(s.as_bytes().to_vec())
    }
}

impl From<String> for IndexPath {
    fn from(s: String) -> Self {
        Self(s.into_bytes())
    }
}

impl From<Vec<u8>> for IndexPath {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl PartialEq<str> for IndexPath {
    fn eq(&self, other: &str) -> bool {
        self.0 == other.as_bytes()
    }
}

impl PartialEq<&str> for IndexPath {
    fn eq(&self, other: &&str) -> bool {
        self.0 == other.as_bytes()
    }
}

impl fmt::Display for IndexPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.0))
    }
}

impl fmt::Debug for IndexPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", String::from_utf8_lossy(&self.0))
    }
}

// ---------------------------------------------------------------------------
// IndexEntry
// ---------------------------------------------------------------------------

/// A single record in the git index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IndexEntry {
    /// Path relative to the repository root, `/`-separated.
    pub path: IndexPath,
    /// Conflict side of this record.
    pub stage: Stage,
    /// Raw mode bits as stored in the index (e.g. `0o100644`).
    pub mode: u32,
    /// Content identity of the blob, gitlink or collapsed tree.
    pub oid: GitOid,
    /// `true` for a sparse-index placeholder standing in for a whole
    /// directory. Placeholders are always [`Stage::Resolved`].
    pub sparse_dir: bool,
}

impl IndexEntry {
    /// Order entries the way git sorts its index: path bytes, then stage.
    #[must_use]
    pub fn sort_key_cmp(&self, other: &Self) -> Ordering {
        compare_key(self.path.as_bytes(), self.stage, other.path.as_bytes(), other.stage)
    }
}

/// Compare two `(path, stage)` keys in index order.
pub(crate) fn compare_key(a_path: &[u8], a_stage: Stage, b_path: &[u8], b_stage: Stage) -> Ordering {
    a_path.cmp(b_path).then(a_stage.cmp(&b_stage))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
