//! # cidcheck testkit
//!
//! Testing utilities for cidcheck.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Golden vectors**: Well-known CIDs with their expected decoded fields
//! - **Generators**: Proptest strategies for blocks, identifiers and CAR bodies
//! - **Fixtures**: Block and CAR builders, scripted gateways
//!
//! ## Golden Vectors
//!
//! ```rust
//! use cidcheck_testkit::vectors::verify_all_vectors;
//!
//! assert!(verify_all_vectors().is_empty());
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use cidcheck_testkit::fixtures::{hit, uniform_gateway, CarFixture, SOURCES};
//!
//! let car = CarFixture::new().raw(b"root").raw(b"leaf");
//! let gateway = uniform_gateway(&SOURCES, &car.root().to_string(), hit(car.to_bytes()));
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{cid_for, hit, raw_block, raw_cid, uniform_gateway, CarFixture, SOURCES};
pub use vectors::{all_vectors, check_vector, verify_all_vectors, GoldenVector};
