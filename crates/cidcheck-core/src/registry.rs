//! Codec and multihash registry.
//!
//! The registry is a fixed table built once at startup. Lookups on a missing
//! code fail with [`ValidationError::UnsupportedCodec`] or
//! [`ValidationError::UnsupportedMultihash`]; there is no fallback.

use std::collections::BTreeMap;
use std::fmt;

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use sha2::Sha256;

use crate::error::ValidationError;

/// Multicodec codes for the content codecs gateways commonly serve.
pub mod codes {
    pub const DAG_PB: u64 = 0x70;
    pub const DAG_CBOR: u64 = 0x71;
    pub const DAG_JSON: u64 = 0x0129;
    pub const RAW: u64 = 0x55;
    pub const JSON: u64 = 0x0200;

    pub const SHA2_256: u64 = 0x12;
    pub const BLAKE2B_256: u64 = 0xb220;
    pub const BLAKE3: u64 = 0x1e;
}

/// A registered content codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Codec {
    pub code: u64,
    pub name: &'static str,
}

/// A registered multihash function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashFunction {
    Sha2_256,
    Blake2b256,
    Blake3,
}

impl HashFunction {
    /// The multihash code for this function.
    pub const fn code(self) -> u64 {
        match self {
            HashFunction::Sha2_256 => codes::SHA2_256,
            HashFunction::Blake2b256 => codes::BLAKE2B_256,
            HashFunction::Blake3 => codes::BLAKE3,
        }
    }

    /// The multihash table name.
    pub const fn name(self) -> &'static str {
        match self {
            HashFunction::Sha2_256 => "sha2-256",
            HashFunction::Blake2b256 => "blake2b-256",
            HashFunction::Blake3 => "blake3",
        }
    }

    /// Hash `data`, returning the raw digest bytes.
    pub fn digest(self, data: &[u8]) -> Vec<u8> {
        match self {
            HashFunction::Sha2_256 => Sha256::digest(data).to_vec(),
            HashFunction::Blake2b256 => Blake2b::<U32>::digest(data).to_vec(),
            HashFunction::Blake3 => blake3::hash(data).as_bytes().to_vec(),
        }
    }
}

impl fmt::Display for HashFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Lookup table of supported codecs and multihash functions.
#[derive(Debug, Clone)]
pub struct Registry {
    codecs: BTreeMap<u64, Codec>,
    hashers: BTreeMap<u64, HashFunction>,
}

impl Registry {
    /// The standard table: dag-pb, dag-cbor, dag-json, raw and json codecs;
    /// sha2-256, blake2b-256 and blake3 hashes.
    pub fn standard() -> Self {
        Self::builder()
            .codec(codes::DAG_PB, "dag-pb")
            .codec(codes::DAG_CBOR, "dag-cbor")
            .codec(codes::DAG_JSON, "dag-json")
            .codec(codes::RAW, "raw")
            .codec(codes::JSON, "json")
            .hasher(HashFunction::Sha2_256)
            .hasher(HashFunction::Blake2b256)
            .hasher(HashFunction::Blake3)
            .build()
    }

    /// Start an empty table.
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Whether the codec is registered.
    pub fn supports(&self, codec: u64) -> bool {
        self.codecs.contains_key(&codec)
    }

    /// Whether a hash function is registered for the multihash code.
    pub fn supports_multihash(&self, code: u64) -> bool {
        self.hashers.contains_key(&code)
    }

    /// Look up a codec.
    pub fn codec(&self, code: u64) -> Result<Codec, ValidationError> {
        self.codecs
            .get(&code)
            .copied()
            .ok_or(ValidationError::UnsupportedCodec(code))
    }

    /// Look up a hash function.
    pub fn hasher(&self, code: u64) -> Result<HashFunction, ValidationError> {
        self.hashers
            .get(&code)
            .copied()
            .ok_or(ValidationError::UnsupportedMultihash(code))
    }

    /// Hash `data` with the function registered under `code`.
    pub fn hash(&self, code: u64, data: &[u8]) -> Result<Vec<u8>, ValidationError> {
        Ok(self.hasher(code)?.digest(data))
    }

    /// Registered codecs in code order.
    pub fn codecs(&self) -> impl Iterator<Item = &Codec> {
        self.codecs.values()
    }

    /// Registered hash functions in code order.
    pub fn hashers(&self) -> impl Iterator<Item = HashFunction> + '_ {
        self.hashers.values().copied()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::standard()
    }
}

/// Builder for a [`Registry`]. The table is frozen by [`RegistryBuilder::build`].
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    codecs: BTreeMap<u64, Codec>,
    hashers: BTreeMap<u64, HashFunction>,
}

impl RegistryBuilder {
    pub fn codec(mut self, code: u64, name: &'static str) -> Self {
        self.codecs.insert(code, Codec { code, name });
        self
    }

    pub fn hasher(mut self, function: HashFunction) -> Self {
        self.hashers.insert(function.code(), function);
        self
    }

    pub fn build(self) -> Registry {
        Registry {
            codecs: self.codecs,
            hashers: self.hashers,
        }
    }
}
