//! Driving conversions along candidate routes.
//!
//! `ConversionCore` bundles the handler list, the registry, and the
//! graph behind one lifecycle: `init` builds both, `try_convert` pulls
//! candidate routes lazily and attempts each one until a pipeline
//! succeeds or the candidates run out. A failing step never aborts the
//! overall conversion; it abandons the current candidate.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::cache::FormatCache;
use crate::format::FileData;
use crate::graph::FormatGraph;
use crate::handler::Handler;
use crate::registry::{normalized_formats, FormatOption, Registry, RegistryError};
use crate::search::RouteNode;

/// A finished conversion: the output files and the route that produced
/// them.
#[derive(Debug)]
pub struct ConversionOutcome {
    pub files: Vec<FileData>,
    pub route: Vec<RouteNode>,
}

/// Owner of the registry and graph, and the entry point for running
/// multi-hop conversions.
pub struct ConversionCore {
    registry: Registry,
    graph: FormatGraph,
    simple_mode: bool,
}

impl ConversionCore {
    pub fn new(handlers: Vec<Arc<dyn Handler>>) -> Result<Self, RegistryError> {
        Self::with_cache(handlers, FormatCache::new())
    }

    /// Build over a previously persisted cache, so cached handlers skip
    /// initialization.
    pub fn with_cache(
        handlers: Vec<Arc<dyn Handler>>,
        cache: FormatCache,
    ) -> Result<Self, RegistryError> {
        Ok(Self {
            registry: Registry::with_cache(handlers, cache)?,
            graph: FormatGraph::new(),
            simple_mode: false,
        })
    }

    /// Relax terminal-handler identity: any route reaching the target
    /// MIME is acceptable regardless of which handler ends it.
    pub fn simple_mode(mut self, simple: bool) -> Self {
        self.simple_mode = simple;
        self
    }

    pub fn strict_categories(mut self, strict: bool) -> Self {
        self.graph = std::mem::take(&mut self.graph).with_strict_categories(strict);
        self
    }

    pub fn safety_filter(mut self, enabled: bool) -> Self {
        self.graph = std::mem::take(&mut self.graph).with_safety_filter(enabled);
        self
    }

    /// Initialize uncached handlers and rebuild the graph.
    ///
    /// Also the way cost-table mutations take effect: mutate through
    /// `graph_mut`, then call this again. Rebuilds are idempotent for
    /// equal inputs and never touch an in-flight search.
    pub async fn init(&mut self) {
        self.registry.init().await;
        self.graph
            .rebuild(self.registry.handlers(), self.registry.cache());
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn graph(&self) -> &FormatGraph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut FormatGraph {
        &mut self.graph
    }

    /// Try candidate routes from `source` to `target` until one
    /// pipeline succeeds. Returns `None` when every candidate fails or
    /// no route exists.
    pub async fn try_convert(
        &mut self,
        files: &[FileData],
        source: &FormatOption,
        target: &FormatOption,
    ) -> Option<ConversionOutcome> {
        let source_node = RouteNode::new(Arc::clone(&source.handler), source.format.clone());
        let target_node = RouteNode::new(Arc::clone(&target.handler), target.format.clone());

        let Self {
            registry,
            graph,
            simple_mode,
        } = self;

        let mut search = graph.search(&source_node, &target_node, *simple_mode);
        while let Some(mut route) = search.next() {
            // When the route already ends on the requested handler, pin
            // the user's exact target option; several options can share
            // a MIME on one handler.
            if let Some(last) = route.nodes.last_mut() {
                if last.handler.name() == target_node.handler.name() {
                    *last = target_node.clone();
                }
            }

            debug!(
                cost = route.cost,
                steps = route.nodes.len().saturating_sub(1),
                "attempting candidate route"
            );
            match attempt_route(registry.cache_mut(), files.to_vec(), &route.nodes).await {
                Some(files) => {
                    return Some(ConversionOutcome {
                        files,
                        route: route.nodes,
                    });
                }
                None => continue,
            }
        }
        None
    }
}

/// Run one candidate pipeline to completion. Any failure abandons the
/// whole candidate and returns `None`.
async fn attempt_route(
    cache: &mut FormatCache,
    mut files: Vec<FileData>,
    route: &[RouteNode],
) -> Option<Vec<FileData>> {
    for pair in route.windows(2) {
        let (prev, next) = (&pair[0], &pair[1]);
        let handler = &next.handler;

        if !handler.ready() {
            if let Err(error) = handler.init().await {
                warn!(handler = handler.name(), %error, "handler failed to initialize");
                return None;
            }
        }
        cache.fill(handler.name(), normalized_formats(handler.as_ref()));

        let Some(input) = normalized_formats(handler.as_ref())
            .into_iter()
            .find(|f| f.from && f.mime == prev.format.mime)
        else {
            warn!(
                handler = handler.name(),
                mime = %prev.format.mime,
                "handler no longer accepts the intermediate format"
            );
            return None;
        };

        let step = handler.convert(files, &input, &next.format);
        let (result, ()) = tokio::join!(step, yield_barrier());
        match result {
            Ok(output) => {
                if output.iter().any(|f| f.bytes.is_empty()) {
                    warn!(handler = handler.name(), "conversion produced empty output");
                    return None;
                }
                files = output;
            }
            Err(error) => {
                warn!(handler = handler.name(), %error, "conversion step failed");
                return None;
            }
        }
    }
    Some(files)
}

/// Two scheduling points, run alongside each conversion step.
///
/// A no-op for correctness; it hands control back to the host between
/// steps so a single-threaded runtime cannot be starved.
async fn yield_barrier() {
    tokio::task::yield_now().await;
    tokio::task::yield_now().await;
}
