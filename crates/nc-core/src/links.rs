//! Link graph: `[[target]]` references between notes.
//!
//! Text-note content is scanned for bracketed reference tokens
//! (`[[target]]`, `[[target|display]]`). Each target is normalized and
//! resolved first against canvas-link cards (by target canvas id), then
//! against backing-file names. The edge list is a derived view. Rebuild it
//! whenever note content or the note set changes, and never persist it.
//!
//! Built on `winnow` 0.7 for token scanning and `petgraph` for backlink
//! queries.

use crate::id::NoteId;
use crate::model::{NoteKind, NoteSet};
use crate::name::normalize_name;
use crate::transform::{Point, WorldRect};
use petgraph::Direction;
use petgraph::graphmap::DiGraphMap;
use serde::Serialize;
use smallvec::SmallVec;
use std::collections::{HashMap, HashSet};
use winnow::combinator::{delimited, opt, preceded};
use winnow::prelude::*;
use winnow::token::take_till;

/// Connector lines are skipped when note centers are closer than this.
pub const MIN_CONNECTOR_DISTANCE: f64 = 10.0;

/// A directed link between two notes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct LinkEdge {
    pub from: NoteId,
    pub to: NoteId,
}

// ─── Token scanning ──────────────────────────────────────────────────────

/// A `[[...]]` token found in note text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkToken<'a> {
    pub target: &'a str,
    pub display: Option<&'a str>,
    /// `![[...]]` is an embedded image, not a link.
    pub embed: bool,
    /// Byte offset of the opening `[[`.
    pub offset: usize,
}

fn parse_wikilink<'a>(input: &mut &'a str) -> ModalResult<(&'a str, Option<&'a str>)> {
    delimited(
        "[[",
        (
            take_till(1.., ['|', '[', ']', '\n']),
            opt(preceded('|', take_till(0.., ['[', ']', '\n']))),
        ),
        "]]",
    )
    .parse_next(input)
}

/// Find every well-formed `[[target]]` / `[[target|display]]` token.
pub fn scan_tokens(content: &str) -> SmallVec<[LinkToken<'_>; 4]> {
    let mut tokens = SmallVec::new();
    let mut cursor = 0;
    while let Some(found) = content.get(cursor..).and_then(|s| s.find("[[")) {
        let start = cursor + found;
        let mut rest = &content[start..];
        match parse_wikilink.parse_next(&mut rest) {
            Ok((target, display)) if !target.trim().is_empty() => {
                let embed = content[..start].ends_with('!');
                tokens.push(LinkToken {
                    target: target.trim(),
                    display: display.map(str::trim),
                    embed,
                    offset: start,
                });
                cursor = content.len() - rest.len();
            }
            _ => cursor = start + 1,
        }
    }
    tokens
}

// ─── Resolution ──────────────────────────────────────────────────────────

/// Name → note lookup tables, built once per resolution pass.
struct Resolver {
    cards: HashMap<String, NoteId>,
    files: HashMap<String, NoteId>,
}

impl Resolver {
    fn new(notes: &NoteSet) -> Self {
        let mut cards = HashMap::new();
        let mut files = HashMap::new();
        for note in notes.iter() {
            if let NoteKind::CanvasLinkCard { target } = &note.kind {
                cards.entry(normalize_name(target.as_str())).or_insert(note.id);
            }
            if let Some(name) = note.file_name() {
                files.entry(normalize_name(name)).or_insert(note.id);
            }
        }
        Self { cards, files }
    }

    fn resolve(&self, target: &str) -> Option<NoteId> {
        let key = normalize_name(target);
        self.cards
            .get(&key)
            .or_else(|| self.files.get(&key))
            .copied()
    }
}

/// Compute the deduplicated edge list, in note paint order then token order.
pub fn resolve_links(notes: &NoteSet) -> Vec<LinkEdge> {
    let resolver = Resolver::new(notes);
    let mut seen = HashSet::new();
    let mut edges = Vec::new();
    for note in notes.iter() {
        let Some(content) = note.text_content() else {
            continue;
        };
        for token in scan_tokens(content).iter().filter(|t| !t.embed) {
            let Some(to) = resolver.resolve(token.target) else {
                continue;
            };
            let edge = LinkEdge { from: note.id, to };
            if to != note.id && seen.insert(edge) {
                edges.push(edge);
            }
        }
    }
    log::trace!("resolved {} link edge(s) across {} note(s)", edges.len(), notes.len());
    edges
}

/// Link edges plus a directed graph for outgoing/backlink queries.
#[derive(Debug, Clone, Default)]
pub struct LinkGraph {
    edges: Vec<LinkEdge>,
    graph: DiGraphMap<NoteId, ()>,
}

impl LinkGraph {
    pub fn build(notes: &NoteSet) -> Self {
        let edges = resolve_links(notes);
        let mut graph = DiGraphMap::new();
        for note in notes.iter() {
            graph.add_node(note.id);
        }
        for edge in &edges {
            graph.add_edge(edge.from, edge.to, ());
        }
        Self { edges, graph }
    }

    pub fn edges(&self) -> &[LinkEdge] {
        &self.edges
    }

    pub fn outgoing(&self, id: NoteId) -> Vec<NoteId> {
        self.graph.neighbors_directed(id, Direction::Outgoing).collect()
    }

    /// Notes whose content links to `id`.
    pub fn backlinks(&self, id: NoteId) -> Vec<NoteId> {
        self.graph.neighbors_directed(id, Direction::Incoming).collect()
    }
}

// ─── Connector geometry ──────────────────────────────────────────────────

/// A renderable connector line in world space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Connector {
    pub from: NoteId,
    pub to: NoteId,
    pub start: Point,
    pub end: Point,
}

/// Fraction of `(dx, dy)` at which a ray from the rect center exits the rect.
fn exit_fraction(rect: &WorldRect, dx: f64, dy: f64) -> f64 {
    let fx = if dx == 0.0 { f64::INFINITY } else { (rect.width / 2.0) / dx.abs() };
    let fy = if dy == 0.0 { f64::INFINITY } else { (rect.height / 2.0) / dy.abs() };
    fx.min(fy)
}

/// Segment from the edge of `from` toward the edge of `to`, along the line
/// between their centers. `None` when the centers nearly coincide or the
/// geometry is not finite.
pub fn connector_segment(from: &WorldRect, to: &WorldRect) -> Option<(Point, Point)> {
    if !from.is_finite() || !to.is_finite() {
        return None;
    }
    let c1 = from.center();
    let c2 = to.center();
    let (dx, dy) = (c2.x - c1.x, c2.y - c1.y);
    if c1.distance(c2) < MIN_CONNECTOR_DISTANCE {
        return None;
    }
    let s1 = exit_fraction(from, dx, dy);
    let s2 = exit_fraction(to, dx, dy);
    let start = Point::new(c1.x + dx * s1, c1.y + dy * s1);
    let end = Point::new(c2.x - dx * s2, c2.y - dy * s2);
    (start.is_finite() && end.is_finite()).then_some((start, end))
}

/// Connector lines for every edge whose endpoints are both well-formed notes.
pub fn connectors(notes: &NoteSet, edges: &[LinkEdge]) -> Vec<Connector> {
    edges
        .iter()
        .filter_map(|edge| {
            let from = notes.get(edge.from).filter(|n| n.is_well_formed())?;
            let to = notes.get(edge.to).filter(|n| n.is_well_formed())?;
            let (start, end) = connector_segment(&from.bounds(), &to.bounds())?;
            Some(Connector {
                from: edge.from,
                to: edge.to,
                start,
                end,
            })
        })
        .collect()
}
