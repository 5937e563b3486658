//! # Domain Layer
//!
//! Admission context, gas accounting, fee math and signature checks.
//! No I/O: everything stateful is reached through the outbound ports.

pub mod context;
pub mod errors;
pub mod fees;
pub mod gas;
pub mod ordering;
pub mod params;
pub mod signing;
