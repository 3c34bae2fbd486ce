//! Domain models for the attendance backend.

pub mod attendance;
pub mod event;
pub mod group;
