pub mod config;
pub mod config_processors;
pub mod dataframeutils;
pub mod error;
pub mod graph;
pub mod io;
pub mod logging;
pub mod pipeline;
pub mod sessions;
pub mod stopwatch;

pub use error::{GraphError, Result};
pub use graph::{build_global_graph, infer_num_nodes, GlobalGraph, GraphBuilder, ItemId, Session, Weight};
