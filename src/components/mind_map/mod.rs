//! Mind-map editor: graph store, viewport, connection routing, pointer
//! and keyboard interaction, suggestions, and the canvas component.

mod component;
pub mod config;
pub mod env;
pub mod error;
pub mod interaction;
pub mod relax;
mod render;
pub mod router;
pub mod snapshot;
mod state;
pub mod store;
pub mod suggest;
pub mod types;
pub mod viewport;

#[cfg(test)]
mod property_tests;

pub use component::MindMapCanvas;
pub use config::MapConfig;
pub use snapshot::MapSnapshot;
pub use types::{Cluster, ContentBlock, Edge, EdgeKind, Node, NodeId, NodeKind, Position};
