//! # Ports Layer
//!
//! Trait definitions for the hexagonal architecture.
//! - **Inbound (Driving)**: API the consensus engine calls
//! - **Outbound (Driven)**: Capabilities the pipeline consumes

pub mod inbound;
pub mod outbound;
