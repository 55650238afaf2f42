//! External Adapters (C10): narrow seams to optional collaborators
//! (knowledge graph, search index) that this service can run without.

pub mod null;

pub use null::{NullGraphAdapter, NullSearchSink};
