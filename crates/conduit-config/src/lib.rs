//! TOML graph descriptions for conduit.
//!
//! This crate lets a processing graph live in a file: nodes with named ports
//! and delays, connections written as `node.port` pairs, and the root node to
//! compile for. Descriptions are validated as a whole and then built into a
//! [`conduit_core::Graph`] whose payloads are the node names.
//!
//! # Features
//!
//! - **Descriptions**: Load and save graphs as TOML
//! - **Validation**: Report every inconsistency in a file at once
//! - **Building**: Turn a description into a graph ready to compile
//!
//! # Example
//!
//! ```rust
//! use conduit_config::GraphDescription;
//!
//! let desc = GraphDescription::from_toml(r#"
//!     name = "chain"
//!     root = "fx"
//!
//!     [[nodes]]
//!     name = "in"
//!     outputs = ["out"]
//!
//!     [[nodes]]
//!     name = "fx"
//!     delay = 32
//!     inputs = ["in"]
//!     outputs = ["out"]
//!
//!     [[connections]]
//!     from = "in.out"
//!     to = "fx.in"
//! "#).unwrap();
//!
//! let built = desc.build().unwrap();
//! let schedule = built.compile().unwrap();
//! assert_eq!(schedule.len(), 2);
//! assert_eq!(schedule.total_latency(), 32);
//! ```

mod builder;
mod description;
mod error;

/// Graph description validation.
pub mod validation;

pub use builder::BuiltGraph;
pub use description::{ConnectionDescription, Endpoint, GraphDescription, NodeDescription};
pub use error::{ConfigError, IoOp};
pub use validation::{ValidationError, ValidationResult};
