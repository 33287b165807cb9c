//! Proptest generators for property-based testing.

use proptest::prelude::*;

use cidcheck_core::registry::codes;
use cidcheck_core::{Block, ContentIdentifier, HashFunction};

use crate::fixtures::{cid_for, CarFixture};

/// Generate one of the registered hash functions.
pub fn hash_function() -> impl Strategy<Value = HashFunction> {
    prop_oneof![
        Just(HashFunction::Sha2_256),
        Just(HashFunction::Blake2b256),
        Just(HashFunction::Blake3),
    ]
}

/// Generate one of the registered codec codes.
pub fn codec() -> impl Strategy<Value = u64> {
    prop_oneof![
        Just(codes::DAG_PB),
        Just(codes::DAG_CBOR),
        Just(codes::DAG_JSON),
        Just(codes::RAW),
        Just(codes::JSON),
    ]
}

/// Generate payload bytes of specified max length.
pub fn payload(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=max_len)
}

/// Generate a correctly addressed block.
pub fn block(max_len: usize) -> impl Strategy<Value = Block> {
    (codec(), hash_function(), payload(max_len))
        .prop_map(|(codec, hash, data)| Block::new(cid_for(codec, hash, &data), data))
}

/// Generate a CIDv1.
pub fn content_identifier() -> impl Strategy<Value = ContentIdentifier> {
    (codec(), hash_function(), payload(64)).prop_map(|(codec, hash, data)| cid_for(codec, hash, &data))
}

/// Generate a URL-safe path suffix.
pub fn path() -> impl Strategy<Value = String> {
    "[a-z0-9_-]{1,12}(/[a-z0-9_.-]{1,12}){0,3}".prop_map(String::from)
}

/// Generate a valid CAR body of 1..=max_blocks blocks.
pub fn car(max_blocks: usize, max_len: usize) -> impl Strategy<Value = CarFixture> {
    prop::collection::vec(block(max_len), 1..=max_blocks).prop_map(|blocks| {
        blocks
            .into_iter()
            .fold(CarFixture::new(), |car, block| car.block(block))
    })
}
