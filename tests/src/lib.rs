//! # Quantum-Chain Test Suite
//!
//! Unified test crate for the admission pipeline.
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── benches/
//! │   └── admission_benchmarks.rs   # Composed handler throughput
//! └── src/
//!     └── integration/
//!         └── admission_flows.rs    # End-to-end flows through AdmissionApi
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p qc-tests
//!
//! # Integration flows only
//! cargo test -p qc-tests integration::
//!
//! # Benchmarks
//! cargo bench -p qc-tests
//! ```

#![allow(unused_variables)]
#![allow(unused_imports)]
#![allow(dead_code)]

pub mod integration;
