//! Content identifiers.
//!
//! A [`ContentIdentifier`] wraps a parsed CID plus an optional path suffix.
//! Only the canonical fields are kept: the multibase a CID arrived in is
//! forgotten, and the canonical string is base58btc for CIDv0 and
//! base32-lower for CIDv1.
//!
//! Equality is version-insensitive: two identifiers are equal when their
//! codec, multihash code and digest agree. The path suffix does not take
//! part in equality; use [`ContentIdentifier::has_path`] to tell a resolved
//! sub-path apart from a bare root.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::io::Cursor;
use std::str::FromStr;

use cid::multihash::Multihash;
use cid::{Cid, Version};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CoreError;

/// A parsed CID, optionally qualified by a path (`root/sub/path`).
#[derive(Clone)]
pub struct ContentIdentifier {
    inner: Cid,
    path: Option<String>,
}

impl ContentIdentifier {
    /// Parse a textual CID, optionally followed by `/path`.
    pub fn parse(text: &str) -> Result<Self, CoreError> {
        let (root, path) = match text.split_once('/') {
            Some((root, path)) => (root, Some(path)),
            None => (text, None),
        };

        if root.is_empty() {
            return Err(CoreError::malformed(text, "empty root identifier"));
        }
        if matches!(path, Some(p) if p.is_empty()) {
            return Err(CoreError::malformed(text, "empty path suffix"));
        }

        let inner = Cid::try_from(root).map_err(|e| CoreError::malformed(text, e))?;
        Ok(Self {
            inner,
            path: path.map(str::to_owned),
        })
    }

    /// Build a CIDv1 from its structural fields.
    pub fn new_v1(codec: u64, multihash_code: u64, digest: &[u8]) -> Result<Self, CoreError> {
        let hash = Multihash::<64>::wrap(multihash_code, digest)
            .map_err(|e| CoreError::malformed(hex::encode(digest), e))?;
        Ok(Self::from_cid(Cid::new_v1(codec, hash)))
    }

    /// Wrap an already-decoded CID.
    pub fn from_cid(inner: Cid) -> Self {
        Self { inner, path: None }
    }

    /// Decode a binary CID from the front of `bytes`.
    ///
    /// Returns the identifier and the number of bytes it occupied.
    pub fn read_bytes(bytes: &[u8]) -> Result<(Self, usize), CoreError> {
        let mut cursor = Cursor::new(bytes);
        let inner = Cid::read_bytes(&mut cursor)
            .map_err(|e| CoreError::container(format!("invalid block CID: {e}")))?;
        Ok((Self::from_cid(inner), cursor.position() as usize))
    }

    /// CID version (0 or 1).
    pub fn version(&self) -> u64 {
        match self.inner.version() {
            Version::V0 => 0,
            Version::V1 => 1,
        }
    }

    /// Multicodec code of the content.
    pub fn codec(&self) -> u64 {
        self.inner.codec()
    }

    /// Multihash function code.
    pub fn multihash_code(&self) -> u64 {
        self.inner.hash().code()
    }

    /// Digest bytes carried by the identifier.
    pub fn digest(&self) -> &[u8] {
        self.inner.hash().digest()
    }

    /// The path suffix, without the leading slash.
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Whether this identifier names a resolved sub-path.
    pub fn has_path(&self) -> bool {
        self.path.is_some()
    }

    /// The bare root identifier.
    pub fn root(&self) -> Self {
        Self::from_cid(self.inner)
    }

    /// Borrow the underlying CID.
    pub fn as_cid(&self) -> &Cid {
        &self.inner
    }

    /// Binary encoding of the root CID.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.inner.to_bytes()
    }
}

impl PartialEq for ContentIdentifier {
    fn eq(&self, other: &Self) -> bool {
        self.codec() == other.codec()
            && self.multihash_code() == other.multihash_code()
            && self.digest() == other.digest()
    }
}

impl Eq for ContentIdentifier {}

impl Hash for ContentIdentifier {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.codec().hash(state);
        self.multihash_code().hash(state);
        self.digest().hash(state);
    }
}

impl fmt::Display for ContentIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner)?;
        if let Some(path) = &self.path {
            write!(f, "/{path}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for ContentIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentIdentifier({self})")
    }
}

impl FromStr for ContentIdentifier {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<Cid> for ContentIdentifier {
    fn from(inner: Cid) -> Self {
        Self::from_cid(inner)
    }
}

impl Serialize for ContentIdentifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ContentIdentifier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).map_err(serde::de::Error::custom)
    }
}
