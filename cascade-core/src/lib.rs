//! Cascade Core
//!
//! This crate provides a reactive dependency-graph engine. Cells hold values,
//! some computed from others by a recompute function ("thunk"), and the
//! engine:
//!
//! - Discovers dependencies while thunks run, on every evaluation
//! - Propagates changes to dependants in dependency order
//! - Batches the cascade caused by one external change into one reaction
//! - Notifies listeners only with settled values
//!
//! # Architecture
//!
//! - `graph`: arena nodes and the recalculation scheduler
//! - `reactive`: cell handles, evaluation scopes, reactions and listeners
//! - `config`: runtime tunables
//! - `error`: the crate's error type
//!
//! # Example
//!
//! ```rust
//! use cascade_core::Runtime;
//!
//! let mut rt = Runtime::new();
//!
//! let name = rt.leaf("Howard".to_string());
//! let upper = rt.create(move |s| s.read(name).to_uppercase())?;
//! let greeting = rt.create(move |s| format!("Hello, {}!", s.read(upper)))?;
//!
//! rt.on_change(greeting, |value| println!("{value}"));
//! // prints "Hello, HOWARD!"
//!
//! rt.force(name, "Suzy".to_string())?;
//! // prints "Hello, SUZY!"
//!
//! assert_eq!(rt.read(greeting), "Hello, SUZY!");
//! # Ok::<(), cascade_core::CascadeError>(())
//! ```

pub mod config;
pub mod error;
pub mod graph;
pub mod reactive;

pub use config::RuntimeConfig;
pub use error::{BoxError, CascadeError, ReactionReport, Result};
pub use graph::{CellId, CellValue, NodeKind};
pub use reactive::{Cell, ListenerId, Runtime, Scope, SharedRuntime};
