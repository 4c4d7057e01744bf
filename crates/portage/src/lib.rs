//! Portage: the conversion routing core of a universal file converter.
//!
//! Given a heterogeneous set of format handlers, each supporting a
//! subset of input and output formats, portage answers one question:
//! what sequence of handler invocations carries a file from format A to
//! format B, optimally under a cost model reflecting conversion quality,
//! handler preference, and semantic plausibility? It then drives the
//! actual multi-hop conversion, attempting candidate routes in cost
//! order until one succeeds.

mod cache;
mod executor;
mod format;
mod graph;
mod handler;
mod heap;
mod mime;
mod registry;
mod search;
pub mod testing;

pub use cache::{CacheError, FormatCache};
pub use executor::{ConversionCore, ConversionOutcome};
pub use format::{Category, FileData, FormatDescriptor};
pub use graph::{
    CategoryAdaptiveCost, CategoryChangeCost, EdgeData, FormatGraph, GraphData, NodeData,
    DEFAULT_CATEGORY_CHANGE_COST, DEPTH_COST, FORMAT_PRIORITY_COST, HANDLER_PRIORITY_COST,
    LOG_FREQUENCY, LOSSY_COST_MULTIPLIER,
};
pub use handler::{Handler, HandlerError};
pub use heap::MinHeap;
pub use mime::{mime_major, normalize_mime};
pub use registry::{
    declared_handlers, normalized_formats, DeclaredHandler, FormatOption, Registry, RegistryError,
};
pub use search::{Route, RouteNode, RouteSearch, SearchEvent};
