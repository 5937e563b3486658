//! # Integration Tests
//!
//! End-to-end admission flows: a fully wired pipeline over the in-memory
//! capability providers, driven through the public `AdmissionApi`.

pub mod admission_flows;
