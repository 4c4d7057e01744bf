//! The weighted format graph.
//!
//! Vertices are formats keyed by normalized MIME; edges are direct
//! conversions mediated by one handler. Edge costs combine hop depth,
//! category transitions, handler and format priority, and lossiness;
//! multi-hop adaptive penalties are applied during the search, on top of
//! the static edge costs.
//!
//! The graph is rebuilt whenever the handler set, the format cache, or
//! the cost tables change. Rebuilds are deterministic for a fixed input
//! ordering: handlers in list order, formats in declaration order.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::cache::FormatCache;
use crate::format::FormatDescriptor;
use crate::handler::Handler;
use crate::search::{RouteNode, RouteSearch};

/// Per-hop base cost.
pub const DEPTH_COST: f64 = 1.0;
/// Category-change cost when no table entry applies.
pub const DEFAULT_CATEGORY_CHANGE_COST: f64 = 0.6;
/// Multiplier applied whenever the target format is lossy.
pub const LOSSY_COST_MULTIPLIER: f64 = 1.4;
/// Penalty slope per handler position in the declared order.
pub const HANDLER_PRIORITY_COST: f64 = 0.2;
/// Penalty slope per format position within a handler's own list.
pub const FORMAT_PRIORITY_COST: f64 = 0.05;
/// Diagnostic log interval during search, in popped frames.
pub const LOG_FREQUENCY: u64 = 1000;

/// Cost applied when an edge crosses from one category to another,
/// optionally scoped to a single handler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryChangeCost {
    pub from: String,
    pub to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handler: Option<String>,
    pub cost: f64,
}

/// Cost applied to a route whose trailing category sequence matches the
/// given pattern. Captures multi-hop semantic degradation that no single
/// edge can see.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryAdaptiveCost {
    pub categories: Vec<String>,
    pub cost: f64,
}

fn default_change_costs() -> Vec<CategoryChangeCost> {
    let entries: &[(&str, &str, Option<&str>, f64)] = &[
        ("image", "video", None, 0.2),
        ("video", "image", None, 0.4),
        ("image", "audio", Some("ffmpeg"), 100.0),
        ("audio", "image", Some("ffmpeg"), 100.0),
        ("text", "audio", Some("ffmpeg"), 100.0),
        ("audio", "text", Some("ffmpeg"), 100.0),
        ("image", "audio", None, 1.4),
        ("audio", "image", None, 1.0),
        ("video", "audio", None, 1.4),
        ("audio", "video", None, 1.0),
        ("text", "image", None, 0.5),
        ("image", "text", None, 0.5),
        ("text", "audio", None, 0.6),
    ];
    entries
        .iter()
        .map(|(from, to, handler, cost)| CategoryChangeCost {
            from: (*from).to_owned(),
            to: (*to).to_owned(),
            handler: handler.map(str::to_owned),
            cost: *cost,
        })
        .collect()
}

fn default_adaptive_costs() -> Vec<CategoryAdaptiveCost> {
    let entries: &[(&[&str], f64)] = &[
        (&["text", "image", "audio"], 15.0),
        (&["image", "video", "audio"], 10_000.0),
        (&["audio", "video", "image"], 10_000.0),
    ];
    entries
        .iter()
        .map(|(categories, cost)| CategoryAdaptiveCost {
            categories: categories.iter().map(|c| (*c).to_owned()).collect(),
            cost: *cost,
        })
        .collect()
}

#[derive(Debug)]
struct Vertex {
    mime: String,
    edges: Vec<usize>,
}

#[derive(Debug)]
pub(crate) struct Edge {
    pub from: FormatDescriptor,
    pub to: FormatDescriptor,
    pub handler: String,
    pub cost: f64,
}

/// Handler names carried by handler-specific change-cost entries, keyed
/// by category pair. A generic entry is suppressed for exactly the
/// handlers that have a specific entry on the same pair.
struct HandlerPairs(HashMap<(String, String), Vec<String>>);

impl HandlerPairs {
    fn build(entries: &[CategoryChangeCost]) -> Self {
        let mut map: HashMap<(String, String), Vec<String>> = HashMap::new();
        for entry in entries {
            if let Some(handler) = &entry.handler {
                map.entry((entry.from.clone(), entry.to.clone()))
                    .or_default()
                    .push(handler.clone());
            }
        }
        Self(map)
    }

    fn names(&self, from: &str, to: &str, handler: &str) -> bool {
        self.0
            .get(&(from.to_owned(), to.to_owned()))
            .is_some_and(|handlers| handlers.iter().any(|h| h == handler))
    }
}

/// Deep copy of the graph structure and both cost tables, for debugging
/// and inspection. Shares no storage with the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphData {
    pub nodes: Vec<NodeData>,
    pub edges: Vec<EdgeData>,
    pub category_change_costs: Vec<CategoryChangeCost>,
    pub category_adaptive_costs: Vec<CategoryAdaptiveCost>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeData {
    pub mime: String,
    pub edges: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeData {
    pub from: FormatDescriptor,
    pub to: FormatDescriptor,
    pub handler: String,
    pub cost: f64,
}

/// The format graph, its cost tables, and the handlers edges refer to.
pub struct FormatGraph {
    vertices: Vec<Vertex>,
    edges: Vec<Edge>,
    vertex_by_mime: HashMap<String, usize>,
    handlers: Vec<Arc<dyn Handler>>,
    change_costs: Vec<CategoryChangeCost>,
    adaptive_costs: Vec<CategoryAdaptiveCost>,
    strict_categories: bool,
    safety_filter: bool,
}

impl Default for FormatGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl FormatGraph {
    /// An empty graph with the shipped cost tables, lenient category
    /// handling, and the safety filter enabled.
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            edges: Vec::new(),
            vertex_by_mime: HashMap::new(),
            handlers: Vec::new(),
            change_costs: default_change_costs(),
            adaptive_costs: default_adaptive_costs(),
            strict_categories: false,
            safety_filter: true,
        }
    }

    /// Strict mode sums over every change-cost entry instead of taking
    /// the best applicable one; it over-penalizes category shifts and
    /// yields more literal routes.
    pub fn with_strict_categories(mut self, strict: bool) -> Self {
        self.strict_categories = strict;
        self
    }

    /// Disable the hard-coded rejection of routes whose categories run
    /// `image, video, audio` in a row.
    pub fn with_safety_filter(mut self, enabled: bool) -> Self {
        self.safety_filter = enabled;
        self
    }

    /// Rebuild vertices and edges from the cache, iterating handlers in
    /// the given order and formats in declaration order.
    pub fn rebuild(&mut self, handlers: &[Arc<dyn Handler>], cache: &FormatCache) {
        self.vertices.clear();
        self.edges.clear();
        self.vertex_by_mime.clear();
        self.handlers = handlers.to_vec();

        let pairs = HandlerPairs::build(&self.change_costs);

        for (handler_idx, handler) in handlers.iter().enumerate() {
            let Some(formats) = cache.get(handler.name()) else {
                continue;
            };
            let from_set: Vec<&FormatDescriptor> = formats
                .iter()
                .filter(|f| f.from && !f.mime.is_empty())
                .collect();
            let to_set: Vec<&FormatDescriptor> = formats
                .iter()
                .filter(|f| f.to && !f.mime.is_empty())
                .collect();

            for format in from_set.iter().chain(to_set.iter()) {
                self.vertex_index_or_insert(&format.mime);
            }

            for from in &from_set {
                for to in &to_set {
                    if from.mime == to.mime {
                        continue;
                    }
                    let position = cache.format_position(handler.name(), to).unwrap_or(0);
                    let cost =
                        self.edge_cost(&pairs, from, to, handler_idx, handler.name(), position);
                    let edge_idx = self.edges.len();
                    self.edges.push(Edge {
                        from: (*from).clone(),
                        to: (*to).clone(),
                        handler: handler.name().to_owned(),
                        cost,
                    });
                    let source = self.vertex_by_mime[&from.mime];
                    self.vertices[source].edges.push(edge_idx);
                }
            }
        }
    }

    fn vertex_index_or_insert(&mut self, mime: &str) -> usize {
        if let Some(&idx) = self.vertex_by_mime.get(mime) {
            return idx;
        }
        let idx = self.vertices.len();
        self.vertices.push(Vertex {
            mime: mime.to_owned(),
            edges: Vec::new(),
        });
        self.vertex_by_mime.insert(mime.to_owned(), idx);
        idx
    }

    fn edge_cost(
        &self,
        pairs: &HandlerPairs,
        from: &FormatDescriptor,
        to: &FormatDescriptor,
        handler_idx: usize,
        handler: &str,
        format_position: usize,
    ) -> f64 {
        let mut cost = DEPTH_COST;
        cost += self.category_component(pairs, from.category_tags(), to.category_tags(), handler);
        cost += HANDLER_PRIORITY_COST * handler_idx as f64;
        cost += FORMAT_PRIORITY_COST * format_position as f64;
        if !to.lossless {
            cost *= LOSSY_COST_MULTIPLIER;
        }
        cost
    }

    fn category_component(
        &self,
        pairs: &HandlerPairs,
        from_cats: &[String],
        to_cats: &[String],
        handler: &str,
    ) -> f64 {
        if from_cats.is_empty() && to_cats.is_empty() {
            return 0.0;
        }
        if from_cats.is_empty() || to_cats.is_empty() {
            return DEFAULT_CATEGORY_CHANGE_COST;
        }

        if self.strict_categories {
            return self
                .change_costs
                .iter()
                .map(|entry| {
                    let applies = from_cats.contains(&entry.from)
                        && to_cats.contains(&entry.to)
                        && entry.handler.as_deref().map_or(true, |h| h == handler);
                    if applies {
                        entry.cost
                    } else {
                        DEFAULT_CATEGORY_CHANGE_COST
                    }
                })
                .sum();
        }

        if from_cats.iter().any(|c| to_cats.contains(c)) {
            return 0.0;
        }

        let mut best: Option<f64> = None;
        for entry in &self.change_costs {
            if !from_cats.contains(&entry.from) || !to_cats.contains(&entry.to) {
                continue;
            }
            let eligible = match entry.handler.as_deref() {
                Some(h) => h == handler,
                // A generic entry is shadowed when a handler-specific
                // entry on the same pair names this handler.
                None => !pairs.names(&entry.from, &entry.to, handler),
            };
            if eligible {
                best = Some(best.map_or(entry.cost, |b: f64| b.min(entry.cost)));
            }
        }
        best.unwrap_or(DEFAULT_CATEGORY_CHANGE_COST)
    }

    /// Adaptive penalty for a route's category sequence.
    ///
    /// Each entry is matched against the end of the sequence, collapsing
    /// same-category runs, so the contribution depends only on a suffix
    /// of the route and stays well-defined at each expansion.
    pub(crate) fn adaptive_cost(&self, categories: &[&str]) -> f64 {
        self.adaptive_costs
            .iter()
            .filter(|entry| !entry.categories.is_empty())
            .filter(|entry| matches_suffix(categories, &entry.categories))
            .map(|entry| entry.cost)
            .sum()
    }

    // Change-cost table mutation. None of these re-cost existing edges;
    // callers rebuild afterwards.

    pub fn add_category_change_cost(
        &mut self,
        from: &str,
        to: &str,
        handler: Option<&str>,
        cost: f64,
    ) {
        if let Some(entry) = self.find_change_cost_mut(from, to, handler) {
            entry.cost = cost;
        } else {
            self.change_costs.push(CategoryChangeCost {
                from: from.to_owned(),
                to: to.to_owned(),
                handler: handler.map(str::to_owned),
                cost,
            });
        }
    }

    pub fn update_category_change_cost(
        &mut self,
        from: &str,
        to: &str,
        handler: Option<&str>,
        cost: f64,
    ) -> bool {
        match self.find_change_cost_mut(from, to, handler) {
            Some(entry) => {
                entry.cost = cost;
                true
            }
            None => false,
        }
    }

    pub fn remove_category_change_cost(
        &mut self,
        from: &str,
        to: &str,
        handler: Option<&str>,
    ) -> bool {
        let before = self.change_costs.len();
        self.change_costs
            .retain(|e| !(e.from == from && e.to == to && e.handler.as_deref() == handler));
        self.change_costs.len() != before
    }

    pub fn has_category_change_cost(&self, from: &str, to: &str, handler: Option<&str>) -> bool {
        self.change_costs
            .iter()
            .any(|e| e.from == from && e.to == to && e.handler.as_deref() == handler)
    }

    fn find_change_cost_mut(
        &mut self,
        from: &str,
        to: &str,
        handler: Option<&str>,
    ) -> Option<&mut CategoryChangeCost> {
        self.change_costs
            .iter_mut()
            .find(|e| e.from == from && e.to == to && e.handler.as_deref() == handler)
    }

    // Adaptive table mutation, keyed by the full category sequence.

    pub fn add_category_adaptive_cost(&mut self, categories: &[&str], cost: f64) {
        if let Some(entry) = self
            .adaptive_costs
            .iter_mut()
            .find(|e| sequence_eq(&e.categories, categories))
        {
            entry.cost = cost;
        } else {
            self.adaptive_costs.push(CategoryAdaptiveCost {
                categories: categories.iter().map(|c| (*c).to_owned()).collect(),
                cost,
            });
        }
    }

    pub fn update_category_adaptive_cost(&mut self, categories: &[&str], cost: f64) -> bool {
        match self
            .adaptive_costs
            .iter_mut()
            .find(|e| sequence_eq(&e.categories, categories))
        {
            Some(entry) => {
                entry.cost = cost;
                true
            }
            None => false,
        }
    }

    pub fn remove_category_adaptive_cost(&mut self, categories: &[&str]) -> bool {
        let before = self.adaptive_costs.len();
        self.adaptive_costs
            .retain(|e| !sequence_eq(&e.categories, categories));
        self.adaptive_costs.len() != before
    }

    pub fn has_category_adaptive_cost(&self, categories: &[&str]) -> bool {
        self.adaptive_costs
            .iter()
            .any(|e| sequence_eq(&e.categories, categories))
    }

    /// Start a lazy search for routes from `source` to `target`, in
    /// non-decreasing cost order. Each call creates fresh search state.
    pub fn search(
        &self,
        source: &RouteNode,
        target: &RouteNode,
        simple_mode: bool,
    ) -> RouteSearch<'_> {
        RouteSearch::new(self, source, target, simple_mode)
    }

    /// Deep copy of the structure and tables; shares nothing with the
    /// graph's own storage.
    pub fn data(&self) -> GraphData {
        GraphData {
            nodes: self
                .vertices
                .iter()
                .map(|v| NodeData {
                    mime: v.mime.clone(),
                    edges: v.edges.clone(),
                })
                .collect(),
            edges: self
                .edges
                .iter()
                .map(|e| EdgeData {
                    from: e.from.clone(),
                    to: e.to.clone(),
                    handler: e.handler.clone(),
                    cost: e.cost,
                })
                .collect(),
            category_change_costs: self.change_costs.clone(),
            category_adaptive_costs: self.adaptive_costs.clone(),
        }
    }

    pub(crate) fn vertex_index(&self, mime: &str) -> Option<usize> {
        self.vertex_by_mime.get(mime).copied()
    }

    pub(crate) fn vertex_edges(&self, idx: usize) -> &[usize] {
        &self.vertices[idx].edges
    }

    pub(crate) fn edge(&self, idx: usize) -> &Edge {
        &self.edges[idx]
    }

    pub(crate) fn handler_by_name(&self, name: &str) -> Option<&Arc<dyn Handler>> {
        self.handlers.iter().find(|h| h.name() == name)
    }

    pub(crate) fn safety_filter_enabled(&self) -> bool {
        self.safety_filter
    }
}

fn sequence_eq(entry: &[String], wanted: &[&str]) -> bool {
    entry.len() == wanted.len() && entry.iter().zip(wanted).all(|(a, b)| a == b)
}

/// End-anchored match of `wanted` against `path`, treating a token equal
/// to the most recently matched category as an interior repeat.
fn matches_suffix(path: &[&str], wanted: &[String]) -> bool {
    let mut i = path.len() as isize - 1;
    let mut j = wanted.len() as isize - 1;
    while i >= 0 && j >= 0 {
        let token = path[i as usize];
        if token == wanted[j as usize] {
            i -= 1;
            j -= 1;
        } else if (j as usize) + 1 < wanted.len() && token == wanted[(j as usize) + 1] {
            i -= 1;
        } else {
            break;
        }
    }
    j < 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockHandler;

    fn png() -> FormatDescriptor {
        FormatDescriptor::new("PNG", "png", "png", "image/png")
            .accepting()
            .producing()
            .lossless()
            .category("image")
    }

    fn jpeg() -> FormatDescriptor {
        FormatDescriptor::new("JPEG", "jpeg", "jpg", "image/jpeg")
            .accepting()
            .producing()
            .category("image")
    }

    fn mp3() -> FormatDescriptor {
        FormatDescriptor::new("MPEG Audio Layer III", "mp3", "mp3", "audio/mpeg")
            .accepting()
            .producing()
            .category("audio")
    }

    fn handler(name: &str, formats: Vec<FormatDescriptor>) -> Arc<dyn Handler> {
        Arc::new(MockHandler::new(name, formats))
    }

    fn cache_for(entries: &[(&str, Vec<FormatDescriptor>)]) -> FormatCache {
        let mut cache = FormatCache::new();
        for (name, formats) in entries {
            cache.fill(name, formats.clone());
        }
        cache
    }

    fn built(
        handlers: Vec<Arc<dyn Handler>>,
        cache: &FormatCache,
        strict: bool,
    ) -> FormatGraph {
        let mut graph = FormatGraph::new().with_strict_categories(strict);
        graph.rebuild(&handlers, cache);
        graph
    }

    #[test]
    fn test_no_self_loops_and_positive_costs() {
        let cache = cache_for(&[("canvas", vec![png(), jpeg()])]);
        let graph = built(vec![handler("canvas", vec![])], &cache, false);

        let data = graph.data();
        assert!(!data.edges.is_empty());
        for edge in &data.edges {
            assert_ne!(edge.from.mime, edge.to.mime);
            assert!(edge.cost > 0.0 && edge.cost.is_finite());
        }
    }

    #[test]
    fn test_every_input_mime_has_a_vertex() {
        let cache = cache_for(&[
            ("canvas", vec![png(), jpeg()]),
            ("ffmpeg", vec![mp3()]),
        ]);
        let graph = built(
            vec![handler("canvas", vec![]), handler("ffmpeg", vec![])],
            &cache,
            false,
        );
        for (name, formats) in cache.iter() {
            for format in formats.iter().filter(|f| f.from) {
                assert!(
                    graph.vertex_index(&format.mime).is_some(),
                    "{} input {} has no vertex",
                    name,
                    format.mime
                );
            }
        }
    }

    #[test]
    fn test_rebuild_is_deterministic() {
        let cache = cache_for(&[("canvas", vec![png(), jpeg()]), ("ffmpeg", vec![mp3(), png()])]);
        let handlers = vec![handler("canvas", vec![]), handler("ffmpeg", vec![])];

        let mut graph = FormatGraph::new();
        graph.rebuild(&handlers, &cache);
        let first = graph.data();
        graph.rebuild(&handlers, &cache);
        assert_eq!(graph.data(), first);
    }

    #[test]
    fn test_same_category_edge_cost() {
        let cache = cache_for(&[("canvas", vec![png(), jpeg()])]);
        let graph = built(vec![handler("canvas", vec![])], &cache, false);

        let data = graph.data();
        let edge = data
            .edges
            .iter()
            .find(|e| e.from.format == "png" && e.to.format == "jpeg")
            .unwrap();
        // depth 1, same category, handler 0, jpeg at position 1, lossy.
        let expected = (DEPTH_COST + FORMAT_PRIORITY_COST) * LOSSY_COST_MULTIPLIER;
        assert!((edge.cost - expected).abs() < 1e-9);
    }

    #[test]
    fn test_handler_specific_entry_shadows_generic() {
        let formats = vec![png(), mp3()];
        let cache = cache_for(&[("ffmpeg", formats.clone()), ("other", formats)]);
        let graph = built(
            vec![handler("ffmpeg", vec![]), handler("other", vec![])],
            &cache,
            false,
        );

        let data = graph.data();
        let by = |name: &str| {
            data.edges
                .iter()
                .find(|e| e.handler == name && e.from.format == "png" && e.to.format == "mp3")
                .map(|e| e.cost)
                .unwrap()
        };
        // ffmpeg pays its dedicated image->audio rate of 100; the other
        // handler falls through to the generic 1.4 entry.
        let ffmpeg = (DEPTH_COST + 100.0 + FORMAT_PRIORITY_COST) * LOSSY_COST_MULTIPLIER;
        let other =
            (DEPTH_COST + 1.4 + HANDLER_PRIORITY_COST + FORMAT_PRIORITY_COST) * LOSSY_COST_MULTIPLIER;
        assert!((by("ffmpeg") - ffmpeg).abs() < 1e-9);
        assert!((by("other") - other).abs() < 1e-9);
    }

    #[test]
    fn test_strict_mode_sums_over_all_entries() {
        let cache = cache_for(&[("ffmpeg", vec![png(), mp3()])]);
        let graph = built(vec![handler("ffmpeg", vec![])], &cache, true);

        let data = graph.data();
        let edge = data
            .edges
            .iter()
            .find(|e| e.from.format == "png" && e.to.format == "mp3")
            .unwrap();

        let component: f64 = data
            .category_change_costs
            .iter()
            .map(|entry| {
                let applies = entry.from == "image"
                    && entry.to == "audio"
                    && entry.handler.as_deref().map_or(true, |h| h == "ffmpeg");
                if applies {
                    entry.cost
                } else {
                    DEFAULT_CATEGORY_CHANGE_COST
                }
            })
            .sum();
        let expected = (DEPTH_COST + component + FORMAT_PRIORITY_COST) * LOSSY_COST_MULTIPLIER;
        assert!((edge.cost - expected).abs() < 1e-9);
    }

    #[test]
    fn test_uncategorized_edge_costs() {
        let bare_in = FormatDescriptor::new("Raw", "raw", "raw", "application/raw").accepting();
        let bare_out =
            FormatDescriptor::new("Blob", "blob", "blob", "application/blob").producing();
        let tagged_out = FormatDescriptor::new("CSV", "csv", "csv", "text/csv")
            .producing()
            .category("text");
        let cache = cache_for(&[("x", vec![bare_in, bare_out, tagged_out])]);
        let graph = built(vec![handler("x", vec![])], &cache, false);

        let data = graph.data();
        let cost_to = |fmt: &str| {
            data.edges
                .iter()
                .find(|e| e.to.format == fmt)
                .map(|e| e.cost)
                .unwrap()
        };
        // Both ends untagged: no category component at all.
        let both_empty = (DEPTH_COST + FORMAT_PRIORITY_COST) * LOSSY_COST_MULTIPLIER;
        // Exactly one end untagged: the default applies.
        let one_empty = (DEPTH_COST + DEFAULT_CATEGORY_CHANGE_COST + 2.0 * FORMAT_PRIORITY_COST)
            * LOSSY_COST_MULTIPLIER;
        assert!((cost_to("blob") - both_empty).abs() < 1e-9);
        assert!((cost_to("csv") - one_empty).abs() < 1e-9);
    }

    #[test]
    fn test_change_cost_table_operations() {
        let mut graph = FormatGraph::new();
        assert!(graph.has_category_change_cost("image", "video", None));
        assert!(graph.has_category_change_cost("image", "audio", Some("ffmpeg")));
        assert!(!graph.has_category_change_cost("image", "audio", Some("magick")));

        graph.add_category_change_cost("image", "audio", Some("magick"), 3.0);
        assert!(graph.has_category_change_cost("image", "audio", Some("magick")));

        // Re-adding the same key replaces rather than duplicates.
        let before = graph.data().category_change_costs.len();
        graph.add_category_change_cost("image", "audio", Some("magick"), 5.0);
        assert_eq!(graph.data().category_change_costs.len(), before);

        assert!(graph.update_category_change_cost("image", "audio", Some("magick"), 7.0));
        assert!(!graph.update_category_change_cost("image", "audio", Some("nope"), 7.0));

        assert!(graph.remove_category_change_cost("image", "audio", Some("magick")));
        assert!(!graph.remove_category_change_cost("image", "audio", Some("magick")));
    }

    #[test]
    fn test_adaptive_table_operations() {
        let mut graph = FormatGraph::new();
        assert!(graph.has_category_adaptive_cost(&["image", "video", "audio"]));
        assert!(!graph.has_category_adaptive_cost(&["image", "video"]));

        graph.add_category_adaptive_cost(&["image", "audio"], 20_000.0);
        assert!(graph.has_category_adaptive_cost(&["image", "audio"]));
        graph.add_category_adaptive_cost(&["image", "audio"], 30_000.0);
        assert_eq!(
            graph
                .data()
                .category_adaptive_costs
                .iter()
                .filter(|e| sequence_eq(&e.categories, &["image", "audio"]))
                .count(),
            1
        );

        assert!(graph.remove_category_adaptive_cost(&["image", "audio"]));
        assert!(!graph.has_category_adaptive_cost(&["image", "audio"]));
    }

    #[test]
    fn test_adaptive_suffix_matching() {
        let mut graph = FormatGraph::new();
        graph.add_category_adaptive_cost(&["text", "image", "audio"], 15.0);

        // Plain suffix match.
        assert_eq!(graph.adaptive_cost(&["text", "image", "audio"]), 15.0);
        // Interior repeats collapse.
        assert_eq!(graph.adaptive_cost(&["text", "image", "image", "audio"]), 15.0);
        assert_eq!(
            graph.adaptive_cost(&["data", "text", "image", "audio", "audio"]),
            15.0
        );
        // Anything after the pattern's tail breaks the match.
        assert_eq!(graph.adaptive_cost(&["text", "image", "audio", "video"]), 0.0);
        // Partial patterns contribute nothing.
        assert_eq!(graph.adaptive_cost(&["image", "audio"]), 0.0);
        assert_eq!(graph.adaptive_cost(&[]), 0.0);
    }

    #[test]
    fn test_data_shares_no_storage() {
        let cache = cache_for(&[("canvas", vec![png(), jpeg()])]);
        let graph = built(vec![handler("canvas", vec![])], &cache, false);

        let mut copy = graph.data();
        copy.nodes.clear();
        copy.edges.clear();
        copy.category_change_costs.clear();

        let fresh = graph.data();
        assert!(!fresh.nodes.is_empty());
        assert!(!fresh.edges.is_empty());
        assert!(!fresh.category_change_costs.is_empty());
    }
}
