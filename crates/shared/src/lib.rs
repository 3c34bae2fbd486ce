//! Shared utilities and common types for the attendance backend.
//!
//! This crate provides common functionality used across all other crates:
//! - Injected wall-clock capability
//! - Cryptographic utilities (hashing, nonce generation)
//! - Spherical-earth distance math
//! - Scan-token codec for check-in credentials
//! - Common validation logic

pub mod clock;
pub mod crypto;
pub mod geo;
pub mod token;
pub mod validation;
