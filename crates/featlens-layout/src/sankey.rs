#![forbid(unsafe_code)]

//! Sankey (alluvial) layout of the feature split tree.
//!
//! Nodes are placed in columns by `stage`, ordered by [`compare_nodes`],
//! sized by flow value, and relaxed vertically toward the weighted centre of
//! their neighbours. Link order inside a node follows the order of the
//! opposite endpoints, so it is fixed once columns are sorted.
//!
//! # Invariants
//!
//! 1. The output is a pure function of `(data, width, height, config)`.
//! 2. Every node lies inside the inner area (`width x height` minus margin)
//!    horizontally. Vertically it does too unless the column cannot fit.
//! 3. Link indices in [`PositionedLink`] point into the same layout's
//!    `nodes`, before and after [`apply_right_to_left_transform`].
//! 4. [`apply_right_to_left_transform`] is an involution.
//!
//! # Failure Modes
//!
//! | Condition | Behavior |
//! |-----------|----------|
//! | Link references a missing node | Dropped, `tracing::warn!` |
//! | Inner area narrower than a node | Laid out anyway, `tracing::warn!` |
//! | No nodes after filtering | `Err(EmptyNodes)` |
//! | No links and more than two nodes | `Err(MissingLinks)` |
//! | Every node has an incoming link | `Err(NoRoot)` |
//! | Links form a cycle | `Err(Cycle)` |

use std::collections::{BTreeMap, VecDeque};
use std::fmt;

use featlens_core::{
    BranchIndex, Category, NodeKind, NodeRef, NodeSpec, Rect, SankeyDataset, Sides, Size,
};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::error::{LayoutError, Result};
use crate::order::{compare_nodes, order_keys};

/// Shift below which collision resolution leaves a node alone.
const COLLISION_EPSILON: f64 = 1e-6;

// ============================================================================
// Configuration
// ============================================================================

/// Sankey solver parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SankeyConfig {
    /// Width of a standard node in pixels.
    pub node_width: f64,
    /// Vertical gap between nodes of one column.
    pub node_padding: f64,
    /// Relaxation passes.
    pub iterations: usize,
    /// Space reserved around the plotting area.
    pub margin: Sides,
    /// Width multiplier for [`NodeKind::VerticalBar`] nodes.
    pub vertical_bar_expansion: f64,
    /// Height of a lone root node.
    pub root_only_height: f64,
    /// Top/bottom inset of both nodes in the two-node layout.
    pub two_node_inset: f64,
}

impl Default for SankeyConfig {
    fn default() -> Self {
        Self {
            node_width: 15.0,
            node_padding: 10.0,
            iterations: 6,
            margin: Sides::new(10.0, 80.0, 10.0, 80.0),
            vertical_bar_expansion: 6.0,
            root_only_height: 200.0,
            two_node_inset: 20.0,
        }
    }
}

impl SankeyConfig {
    #[must_use]
    pub fn node_width(mut self, width: f64) -> Self {
        self.node_width = width;
        self
    }

    #[must_use]
    pub fn node_padding(mut self, padding: f64) -> Self {
        self.node_padding = padding;
        self
    }

    #[must_use]
    pub fn iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    #[must_use]
    pub fn margin(mut self, margin: impl Into<Sides>) -> Self {
        self.margin = margin.into();
        self
    }

    #[must_use]
    pub fn vertical_bar_expansion(mut self, factor: f64) -> Self {
        self.vertical_bar_expansion = factor;
        self
    }
}

// ============================================================================
// Output types
// ============================================================================

/// Horizontal flow direction of a layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowDirection {
    #[default]
    LeftToRight,
    RightToLeft,
}

impl FlowDirection {
    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            Self::LeftToRight => Self::RightToLeft,
            Self::RightToLeft => Self::LeftToRight,
        }
    }
}

/// A node with pixel geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionedNode {
    pub id: String,
    /// Index of the source [`NodeSpec`] in the input dataset.
    pub input_index: usize,
    pub stage: u32,
    pub depth: u32,
    pub category: Category,
    pub kind: NodeKind,
    pub branch: Option<BranchIndex>,
    pub color: Option<String>,
    pub feature_count: usize,
    /// Flow through the node: max of incoming and outgoing link values.
    pub value: f64,
    /// Position within the node's column, top to bottom.
    pub order: usize,
    pub x0: f64,
    pub x1: f64,
    pub y0: f64,
    pub y1: f64,
    /// Outgoing link indices, ordered top to bottom.
    pub source_links: Vec<usize>,
    /// Incoming link indices, ordered top to bottom.
    pub target_links: Vec<usize>,
}

impl PositionedNode {
    fn from_spec(spec: &NodeSpec, input_index: usize) -> Self {
        Self {
            id: spec.id.clone(),
            input_index,
            stage: spec.stage,
            depth: spec.depth,
            category: spec.category,
            kind: spec.kind,
            branch: spec.branch,
            color: spec.color.clone(),
            feature_count: spec.feature_count,
            value: 0.0,
            order: 0,
            x0: 0.0,
            x1: 0.0,
            y0: 0.0,
            y1: 0.0,
            source_links: Vec::new(),
            target_links: Vec::new(),
        }
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }

    #[must_use]
    pub fn rect(&self) -> Rect {
        Rect::new(self.x0, self.y0, self.width(), self.height())
    }

    fn shift_y(&mut self, dy: f64) {
        self.y0 += dy;
        self.y1 += dy;
    }
}

/// A link with pixel geometry. `y0`/`y1` are the band centres at the source
/// and target ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionedLink {
    /// Index into [`SankeyLayout::nodes`].
    pub source: usize,
    /// Index into [`SankeyLayout::nodes`].
    pub target: usize,
    pub source_id: String,
    pub target_id: String,
    pub value: f64,
    pub width: f64,
    pub y0: f64,
    pub y1: f64,
}

/// Endpoints of one link band, ready for drawing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinkPath {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
    pub width: f64,
}

impl LinkPath {
    /// Horizontal cubic curve through the band centre, as an SVG `d` string.
    #[must_use]
    pub fn svg_path(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for LinkPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let xm = (self.x0 + self.x1) / 2.0;
        write!(
            f,
            "M{:.2},{:.2}C{:.2},{:.2},{:.2},{:.2},{:.2},{:.2}",
            self.x0, self.y0, xm, self.y0, xm, self.y1, self.x1, self.y1
        )
    }
}

/// Result of [`calculate_sankey_layout`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SankeyLayout {
    pub nodes: Vec<PositionedNode>,
    pub links: Vec<PositionedLink>,
    /// Node indices per column, left to right, each sorted top to bottom.
    pub columns: Vec<Vec<usize>>,
    /// Inner plotting area.
    pub extent: Rect,
    /// Full container size.
    pub size: Size,
    pub direction: FlowDirection,
    /// Links dropped because an endpoint did not resolve.
    pub dropped_links: usize,
}

impl SankeyLayout {
    #[must_use]
    pub fn node_index(&self, id: &str) -> Option<usize> {
        self.nodes.iter().position(|n| n.id == id)
    }

    #[must_use]
    pub fn node(&self, id: &str) -> Option<&PositionedNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Node ids per column, top to bottom.
    #[must_use]
    pub fn column_ids(&self) -> Vec<Vec<&str>> {
        self.columns
            .iter()
            .map(|col| col.iter().map(|&i| self.nodes[i].id.as_str()).collect())
            .collect()
    }

    /// Drawable band of link `index`. Bands leave the source on its
    /// downstream side, which is the right edge left-to-right and the left
    /// edge right-to-left.
    #[must_use]
    pub fn link_path(&self, index: usize) -> Option<LinkPath> {
        let link = self.links.get(index)?;
        let source = self.nodes.get(link.source)?;
        let target = self.nodes.get(link.target)?;
        let (x0, x1) = match self.direction {
            FlowDirection::LeftToRight => (source.x1, target.x0),
            FlowDirection::RightToLeft => (source.x0, target.x1),
        };
        Some(LinkPath {
            x0,
            y0: link.y0,
            x1,
            y1: link.y1,
            width: link.width,
        })
    }

    #[must_use]
    pub fn link_paths(&self) -> Vec<LinkPath> {
        (0..self.links.len())
            .filter_map(|i| self.link_path(i))
            .collect()
    }
}

// ============================================================================
// Entry points
// ============================================================================

/// Lay out `data` inside a `width x height` container.
///
/// # Preconditions
///
/// `width` and `height` must be finite. Sizes that pass
/// [`validate_dimensions`](crate::validate_dimensions) always leave room
/// for the default margins. Smaller sizes still return `Ok`, but once the
/// inner area is narrower than one node the columns overlap the margin and
/// later stages can land left of the root.
pub fn calculate_sankey_layout(
    data: &SankeyDataset,
    width: f64,
    height: f64,
    config: &SankeyConfig,
) -> Result<SankeyLayout> {
    debug_assert!(
        width.is_finite() && height.is_finite(),
        "sankey size must be finite, got {width}x{height}"
    );
    let size = Size::new(width, height);
    let extent = Rect::from_size(width, height).inner(config.margin);
    if extent.is_empty() || extent.width < config.node_width {
        tracing::warn!(
            width,
            height,
            inner_width = extent.width,
            inner_height = extent.height,
            "sankey.extent.degenerate"
        );
    }

    // --- resolve link endpoints --------------------------------------------
    let mut by_id: FxHashMap<&str, usize> = FxHashMap::default();
    for (i, node) in data.nodes.iter().enumerate() {
        by_id.entry(node.id.as_str()).or_insert(i);
    }
    let resolve = |r: &NodeRef| match r {
        NodeRef::Index(i) => (*i < data.nodes.len()).then_some(*i),
        NodeRef::Id(id) => by_id.get(id.as_str()).copied(),
    };

    let mut resolved = Vec::with_capacity(data.links.len());
    let mut dropped_links = 0;
    for link in &data.links {
        match (resolve(&link.source), resolve(&link.target)) {
            (Some(s), Some(t)) => resolved.push((s, t, link.value.max(0.0))),
            _ => {
                dropped_links += 1;
                tracing::warn!(
                    source = ?link.source,
                    target = ?link.target,
                    "sankey.link.dangling"
                );
            }
        }
    }

    // --- filter nodes --------------------------------------------------------
    let referenced: FxHashSet<usize> = resolved.iter().flat_map(|&(s, t, _)| [s, t]).collect();
    let kept: Vec<usize> = (0..data.nodes.len())
        .filter(|i| referenced.contains(i) || data.nodes[*i].feature_count > 0)
        .collect();
    if kept.is_empty() {
        return Err(LayoutError::EmptyNodes);
    }
    if resolved.is_empty() && kept.len() > 2 {
        return Err(LayoutError::MissingLinks {
            node_count: kept.len(),
        });
    }

    let to_layout: FxHashMap<usize, usize> =
        kept.iter().enumerate().map(|(l, &i)| (i, l)).collect();
    let mut nodes: Vec<PositionedNode> = kept
        .iter()
        .map(|&i| PositionedNode::from_spec(&data.nodes[i], i))
        .collect();
    let mut links: Vec<PositionedLink> = resolved
        .iter()
        .filter_map(|&(s, t, value)| {
            let (source, target) = (*to_layout.get(&s)?, *to_layout.get(&t)?);
            Some(PositionedLink {
                source,
                target,
                source_id: nodes[source].id.clone(),
                target_id: nodes[target].id.clone(),
                value,
                width: 0.0,
                y0: 0.0,
                y1: 0.0,
            })
        })
        .collect();
    for (li, link) in links.iter().enumerate() {
        nodes[link.source].source_links.push(li);
        nodes[link.target].target_links.push(li);
    }

    // --- topology ------------------------------------------------------------
    if !links.is_empty() {
        if nodes.iter().all(|n| !n.target_links.is_empty()) {
            return Err(LayoutError::NoRoot);
        }
        if let Some(i) = find_cycle(&nodes, &links) {
            return Err(LayoutError::Cycle {
                id: nodes[i].id.clone(),
            });
        }
    }

    compute_node_values(&mut nodes, &links);

    let columns = if nodes.len() == 1 {
        layout_single(&mut nodes, extent, config)
    } else if nodes.len() == 2
        && (links.is_empty() || nodes.iter().any(|n| n.kind == NodeKind::Placeholder))
    {
        layout_pair(&mut nodes, &mut links, extent, config)
    } else {
        layout_columns(&mut nodes, &mut links, data, extent, config)
    };

    expand_vertical_bars(&mut nodes, extent, config);

    tracing::debug!(
        nodes = nodes.len(),
        links = links.len(),
        columns = columns.len(),
        dropped_links,
        width,
        height,
        "sankey.layout"
    );

    Ok(SankeyLayout {
        nodes,
        links,
        columns,
        extent,
        size,
        direction: FlowDirection::LeftToRight,
        dropped_links,
    })
}

/// Mirror every node horizontally inside the inner area.
///
/// `x' = left + right - x`, with `x0`/`x1` swapped so `x0 <= x1` still
/// holds. Links keep their indices, so they point at the mirrored nodes.
#[must_use]
pub fn apply_right_to_left_transform(layout: &SankeyLayout) -> SankeyLayout {
    let axis = layout.extent.left() + layout.extent.right();
    let mut mirrored = layout.clone();
    for node in &mut mirrored.nodes {
        let (x0, x1) = (node.x0, node.x1);
        node.x0 = axis - x1;
        node.x1 = axis - x0;
    }
    mirrored.direction = layout.direction.flipped();
    mirrored
}

// ============================================================================
// Topology helpers
// ============================================================================

/// Kahn's algorithm; returns a node on a cycle, if any.
fn find_cycle(nodes: &[PositionedNode], links: &[PositionedLink]) -> Option<usize> {
    let mut indegree: Vec<usize> = nodes.iter().map(|n| n.target_links.len()).collect();
    let mut queue: VecDeque<usize> = (0..nodes.len()).filter(|&i| indegree[i] == 0).collect();
    let mut visited = 0;
    while let Some(i) = queue.pop_front() {
        visited += 1;
        for &li in &nodes[i].source_links {
            let t = links[li].target;
            indegree[t] -= 1;
            if indegree[t] == 0 {
                queue.push_back(t);
            }
        }
    }
    if visited == nodes.len() {
        None
    } else {
        indegree.iter().position(|&d| d > 0)
    }
}

fn compute_node_values(nodes: &mut [PositionedNode], links: &[PositionedLink]) {
    for node in nodes.iter_mut() {
        let incoming: f64 = node.target_links.iter().map(|&l| links[l].value).sum();
        let outgoing: f64 = node.source_links.iter().map(|&l| links[l].value).sum();
        node.value = incoming.max(outgoing);
        if node.value <= 0.0 {
            node.value = node.feature_count as f64;
        }
    }
}

// ============================================================================
// Degenerate layouts
// ============================================================================

fn layout_single(
    nodes: &mut [PositionedNode],
    extent: Rect,
    config: &SankeyConfig,
) -> Vec<Vec<usize>> {
    let h = config.root_only_height.min(extent.height).max(0.0);
    let node = &mut nodes[0];
    node.x0 = extent.left();
    node.x1 = extent.left() + config.node_width;
    node.y0 = extent.top() + (extent.height - h) / 2.0;
    node.y1 = node.y0 + h;
    vec![vec![0]]
}

fn layout_pair(
    nodes: &mut [PositionedNode],
    links: &mut [PositionedLink],
    extent: Rect,
    config: &SankeyConfig,
) -> Vec<Vec<usize>> {
    let mut order = [0usize, 1];
    order.sort_by_key(|&i| {
        (
            !nodes[i].target_links.is_empty(),
            nodes[i].stage,
            nodes[i].input_index,
        )
    });
    let [first, second] = order;

    let inset = if 2.0 * config.two_node_inset < extent.height {
        config.two_node_inset
    } else {
        0.0
    };
    for (&i, x0) in [first, second]
        .iter()
        .zip([extent.left(), extent.right() - config.node_width])
    {
        let node = &mut nodes[i];
        node.x0 = x0;
        node.x1 = x0 + config.node_width;
        node.y0 = extent.top() + inset;
        node.y1 = extent.bottom() - inset;
    }

    for link in links.iter_mut() {
        let (s, t) = (&nodes[link.source], &nodes[link.target]);
        link.width = s.height().min(t.height());
        link.y0 = (s.y0 + s.y1) / 2.0;
        link.y1 = (t.y0 + t.y1) / 2.0;
    }
    vec![vec![first], vec![second]]
}

// ============================================================================
// Column layout
// ============================================================================

fn layout_columns(
    nodes: &mut [PositionedNode],
    links: &mut [PositionedLink],
    data: &SankeyDataset,
    extent: Rect,
    config: &SankeyConfig,
) -> Vec<Vec<usize>> {
    // Parent by first incoming link, falling back to the declared parent id.
    let by_id: FxHashMap<&str, usize> = nodes
        .iter()
        .enumerate()
        .map(|(i, n)| (n.id.as_str(), i))
        .collect();
    let parents: Vec<Option<usize>> = nodes
        .iter()
        .map(|n| match n.target_links.first() {
            Some(&l) => Some(links[l].source),
            None => data.nodes[n.input_index]
                .parent_id
                .as_deref()
                .and_then(|p| by_id.get(p).copied()),
        })
        .collect();
    let keys = order_keys(
        nodes.len(),
        |i| parents[i],
        |i| {
            let n = &nodes[i];
            (n.stage, n.depth, n.branch, n.input_index)
        },
    );

    let mut by_stage: BTreeMap<u32, Vec<usize>> = BTreeMap::new();
    for (i, node) in nodes.iter().enumerate() {
        by_stage.entry(node.stage).or_default().push(i);
    }
    let mut columns: Vec<Vec<usize>> = by_stage.into_values().collect();
    for col in &mut columns {
        col.sort_by(|&a, &b| compare_nodes(&keys[a], &keys[b]));
        for (pos, &i) in col.iter().enumerate() {
            nodes[i].order = pos;
        }
    }

    // Link order follows the opposite endpoint; fixed from here on.
    for i in 0..nodes.len() {
        let mut outgoing = std::mem::take(&mut nodes[i].source_links);
        outgoing.sort_by_key(|&l| {
            let t = &nodes[links[l].target];
            (t.stage, t.order, l)
        });
        nodes[i].source_links = outgoing;
        let mut incoming = std::mem::take(&mut nodes[i].target_links);
        incoming.sort_by_key(|&l| {
            let s = &nodes[links[l].source];
            (s.stage, s.order, l)
        });
        nodes[i].target_links = incoming;
    }

    // --- horizontal ----------------------------------------------------------
    let max_stage = nodes.iter().map(|n| n.stage).max().unwrap_or(0);
    let kx = if max_stage > 0 {
        (extent.width - config.node_width) / f64::from(max_stage)
    } else {
        0.0
    };
    for node in nodes.iter_mut() {
        node.x0 = extent.left() + f64::from(node.stage) * kx;
        node.x1 = node.x0 + config.node_width;
    }

    // --- vertical ------------------------------------------------------------
    let max_len = columns.iter().map(Vec::len).max().unwrap_or(1);
    let py = if max_len > 1 {
        config
            .node_padding
            .min(extent.height / (max_len - 1) as f64)
    } else {
        config.node_padding
    };
    initialize_breadths(nodes, links, &columns, extent, py);
    for i in 0..config.iterations {
        let alpha = 0.99f64.powi(i as i32);
        let beta = (1.0 - alpha).max((i + 1) as f64 / config.iterations as f64);
        relax_right_to_left(nodes, links, &columns, alpha, beta, py, extent);
        relax_left_to_right(nodes, links, &columns, alpha, beta, py, extent);
    }
    compute_link_breadths(nodes, links);
    columns
}

fn initialize_breadths(
    nodes: &mut [PositionedNode],
    links: &mut [PositionedLink],
    columns: &[Vec<usize>],
    extent: Rect,
    py: f64,
) {
    let ky = columns
        .iter()
        .filter_map(|col| {
            let total: f64 = col.iter().map(|&i| nodes[i].value).sum();
            (total > 0.0).then(|| (extent.height - (col.len() as f64 - 1.0) * py) / total)
        })
        .fold(f64::INFINITY, f64::min);
    let ky = if ky.is_finite() { ky.max(0.0) } else { 0.0 };

    for col in columns {
        let mut y = extent.top();
        for &i in col {
            let node = &mut nodes[i];
            node.y0 = y;
            node.y1 = y + node.value * ky;
            y = node.y1 + py;
        }
        let gap = (extent.bottom() - y + py) / (col.len() as f64 + 1.0);
        for (k, &i) in col.iter().enumerate() {
            nodes[i].shift_y(gap * (k as f64 + 1.0));
        }
    }
    for link in links.iter_mut() {
        link.width = link.value * ky;
    }
}

fn relax_left_to_right(
    nodes: &mut [PositionedNode],
    links: &[PositionedLink],
    columns: &[Vec<usize>],
    alpha: f64,
    beta: f64,
    py: f64,
    extent: Rect,
) {
    for col in columns.iter().skip(1) {
        for &t in col {
            let (mut y, mut w) = (0.0, 0.0);
            for &l in &nodes[t].target_links {
                let link = &links[l];
                let s = link.source;
                let v = link.value * f64::from(nodes[t].stage.saturating_sub(nodes[s].stage));
                y += target_top(nodes, links, py, s, t) * v;
                w += v;
            }
            if w > 0.0 {
                let dy = (y / w - nodes[t].y0) * alpha;
                nodes[t].shift_y(dy);
            }
        }
        resolve_collisions(nodes, col, beta, py, extent);
    }
}

fn relax_right_to_left(
    nodes: &mut [PositionedNode],
    links: &[PositionedLink],
    columns: &[Vec<usize>],
    alpha: f64,
    beta: f64,
    py: f64,
    extent: Rect,
) {
    for col in columns.iter().rev().skip(1) {
        for &s in col {
            let (mut y, mut w) = (0.0, 0.0);
            for &l in &nodes[s].source_links {
                let link = &links[l];
                let t = link.target;
                let v = link.value * f64::from(nodes[t].stage.saturating_sub(nodes[s].stage));
                y += source_top(nodes, links, py, s, t) * v;
                w += v;
            }
            if w > 0.0 {
                let dy = (y / w - nodes[s].y0) * alpha;
                nodes[s].shift_y(dy);
            }
        }
        resolve_collisions(nodes, col, beta, py, extent);
    }
}

/// Where `target` would start if its incoming band from `source` lined up
/// with that band's position on `source`.
fn target_top(nodes: &[PositionedNode], links: &[PositionedLink], py: f64, s: usize, t: usize) -> f64 {
    let source = &nodes[s];
    let target = &nodes[t];
    let mut y = source.y0 - (source.source_links.len() as f64 - 1.0) * py / 2.0;
    for &l in &source.source_links {
        if links[l].target == t {
            break;
        }
        y += links[l].width + py;
    }
    for &l in &target.target_links {
        if links[l].source == s {
            break;
        }
        y -= links[l].width;
    }
    y
}

/// Mirror of [`target_top`] for the upstream pass.
fn source_top(nodes: &[PositionedNode], links: &[PositionedLink], py: f64, s: usize, t: usize) -> f64 {
    let source = &nodes[s];
    let target = &nodes[t];
    let mut y = target.y0 - (target.target_links.len() as f64 - 1.0) * py / 2.0;
    for &l in &target.target_links {
        if links[l].source == s {
            break;
        }
        y += links[l].width + py;
    }
    for &l in &source.source_links {
        if links[l].target == t {
            break;
        }
        y -= links[l].width;
    }
    y
}

/// Push overlapping nodes apart, working outward from the middle node and
/// then back in from the edges.
fn resolve_collisions(nodes: &mut [PositionedNode], col: &[usize], alpha: f64, py: f64, extent: Rect) {
    if col.is_empty() {
        return;
    }
    let mid = col.len() / 2;
    let (top, bottom) = (nodes[col[mid]].y0, nodes[col[mid]].y1);
    collisions_bottom_to_top(nodes, &col[..mid], top - py, alpha, py);
    collisions_top_to_bottom(nodes, &col[mid + 1..], bottom + py, alpha, py);
    collisions_bottom_to_top(nodes, col, extent.bottom(), alpha, py);
    collisions_top_to_bottom(nodes, col, extent.top(), alpha, py);
}

fn collisions_top_to_bottom(nodes: &mut [PositionedNode], col: &[usize], mut y: f64, alpha: f64, py: f64) {
    for &i in col {
        let dy = (y - nodes[i].y0) * alpha;
        if dy > COLLISION_EPSILON {
            nodes[i].shift_y(dy);
        }
        y = nodes[i].y1 + py;
    }
}

fn collisions_bottom_to_top(nodes: &mut [PositionedNode], col: &[usize], mut y: f64, alpha: f64, py: f64) {
    for &i in col.iter().rev() {
        let dy = (nodes[i].y1 - y) * alpha;
        if dy > COLLISION_EPSILON {
            nodes[i].shift_y(-dy);
        }
        y = nodes[i].y0 - py;
    }
}

/// Stack link bands inside each node in link order.
fn compute_link_breadths(nodes: &[PositionedNode], links: &mut [PositionedLink]) {
    for node in nodes {
        let mut y = node.y0;
        for &l in &node.source_links {
            links[l].y0 = y + links[l].width / 2.0;
            y += links[l].width;
        }
        let mut y = node.y0;
        for &l in &node.target_links {
            links[l].y1 = y + links[l].width / 2.0;
            y += links[l].width;
        }
    }
}

fn expand_vertical_bars(nodes: &mut [PositionedNode], extent: Rect, config: &SankeyConfig) {
    let width = config.node_width * config.vertical_bar_expansion;
    for node in nodes.iter_mut().filter(|n| n.kind == NodeKind::VerticalBar) {
        node.x1 = node.x0 + width;
        if node.x1 > extent.right() {
            node.x1 = extent.right();
            node.x0 = extent.right() - width;
        }
    }
}
