//! Domain layer for the attendance backend.
//!
//! This crate contains:
//! - Domain models (Event, AttendanceRecord, AttendanceGroup)
//! - The check-in engine services (occurrence resolution, authorization,
//!   credential validation, integrity flagging, status classification,
//!   conflict-safe recording)
//! - The tagged failure outcome threaded through every engine stage

pub mod models;
pub mod outcome;
pub mod services;
