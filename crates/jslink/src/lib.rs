//! Links the JavaScript output of separately compiled modules into a single program.
//!
//! Every module is classified into requires, members and exports, the dependencies between
//! them are collected into one graph, and anything not reachable from the entry points is
//! dropped before the surviving modules are written out in dependency order.

pub mod bundle;
pub mod classifier;
pub mod codegen;
pub mod dependency_analyzer;
pub mod eliminator;
pub mod error;
pub mod graph;
pub mod options;
pub mod sequencer;
pub mod source;
pub mod source_map;
pub mod types;
mod utils;

pub use bundle::{bundle, BundleOutput};
pub use error::{BundleError, BundleResult};
pub use options::{BundleOptions, BundleOptionsBuilder};
pub use source_map::{LineMapping, SourceMapping};
pub use types::*;
