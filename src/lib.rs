//! Canvas Layout - constraint-based box packing and spatial lookup for canvas items
//!
//! This library provides a constraint container built on a Cassowary solver, a
//! box packer that derives its constraints from a packing list, and spatial
//! indexes answering point and rectangle queries over the packed items.
//!
//! # Example
//!
//! ```rust
//! use canvas_layout::layout::{BoxPacker, LayoutConfig, PackOptions, Rect, SimpleItem, Size};
//!
//! let mut packer = BoxPacker::horizontal(LayoutConfig::default());
//! packer.set_spacing(10.0);
//! let a = packer.pack_start(
//!     SimpleItem::new("a", Size::new(50.0, 20.0)),
//!     PackOptions::EXPAND | PackOptions::FILL,
//!     PackOptions::empty(),
//! );
//! let b = packer.pack_start(
//!     SimpleItem::new("b", Size::new(50.0, 20.0)),
//!     PackOptions::EXPAND | PackOptions::FILL,
//!     PackOptions::empty(),
//! );
//!
//! let applied = packer.size_allocate(Rect::new(0.0, 0.0, 210.0, 20.0)).unwrap();
//! assert!((applied.get(b).unwrap().x - 110.0).abs() < 0.01);
//! assert_eq!(packer.container().ids().collect::<Vec<_>>(), vec![a, b]);
//! ```

pub mod document;
pub mod error;
pub mod layout;
pub mod lookup;

use std::fmt;
use std::sync::Once;

pub use document::BoxDocument;
pub use error::DocumentError;
pub use layout::{BoxPacker, ConstraintContainer, LayoutConfig, LayoutError, LayoutItem};
pub use lookup::{LookupTable, SpatialIndex};

use layout::{Point, Rect, Size};
use thiserror::Error;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debug output.
///
/// Call this once at startup. Safe to call multiple times.
/// Enable with `RUST_LOG=canvas_layout=debug` or `RUST_LOG=canvas_layout=trace`.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        // Only initialize if RUST_LOG is set
        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(true)
                        .with_level(true),
                )
                .with(filter)
                .init();
        }
    });
}

/// Errors that can occur while laying out a document
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error("layout error: {0}")]
    Layout(#[from] LayoutError),
}

/// Overrides and queries for [`run_document`]
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Allocated width; defaults to the document's allocation, then to the natural width
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub points: Vec<Point>,
    pub rects: Vec<Rect>,
}

impl RunOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn with_point(mut self, point: Point) -> Self {
        self.points.push(point);
        self
    }

    pub fn with_rect(mut self, rect: Rect) -> Self {
        self.rects.push(rect);
        self
    }
}

/// A spatial query run against the packed items
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    Point(Point),
    Rect(Rect),
}

/// Geometry of a laid out document and the answers to its queries
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutReport {
    pub allocation: Size,
    /// Item names and rectangles, in document order
    pub items: Vec<(String, Rect)>,
    /// Each query with the names of the items it hit, back to front
    pub queries: Vec<(Query, Vec<String>)>,
}

impl fmt::Display for LayoutReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "allocation: w={} h={}",
            num(self.allocation.width),
            num(self.allocation.height)
        )?;
        for (name, r) in &self.items {
            write!(
                f,
                "\n{}: x={} y={} w={} h={}",
                name,
                num(r.x),
                num(r.y),
                num(r.width),
                num(r.height)
            )?;
        }
        for (query, hits) in &self.queries {
            let hits = if hits.is_empty() {
                "-".to_string()
            } else {
                hits.join(" ")
            };
            match query {
                Query::Point(p) => write!(f, "\npoint {},{}: {}", num(p.x), num(p.y), hits)?,
                Query::Rect(r) => write!(
                    f,
                    "\nrect {},{},{},{}: {}",
                    num(r.x),
                    num(r.y),
                    num(r.width),
                    num(r.height),
                    hits
                )?,
            }
        }
        Ok(())
    }
}

/// Two decimals, without a sign on zero
fn num(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    let rounded = if rounded == 0.0 { 0.0 } else { rounded };
    format!("{:.2}", rounded)
}

/// Parse a box document, allocate it and run the queries in `options`
pub fn run_document(source: &str, options: &RunOptions) -> Result<LayoutReport, Error> {
    let document = BoxDocument::parse(source)?;
    let (mut packer, ids) = document.build();

    // An explicit size wins over the document, which wins over the natural size
    let (width, height) = match (options.width, options.height, document.allocation) {
        (Some(w), Some(h), _) => (w, h),
        (w, h, Some(a)) => (w.unwrap_or(a.width), h.unwrap_or(a.height)),
        (w, h, None) => {
            let natural = packer.size_request()?.natural;
            (w.unwrap_or(natural.width), h.unwrap_or(natural.height))
        }
    };
    let allocation = Size::new(width, height);
    tracing::debug!(width, height, items = ids.len(), "allocating document");

    let applied = packer.size_allocate(Rect::from_size(allocation))?;

    let name_of = |id| {
        packer
            .container()
            .item(id)
            .map(|item| item.name().to_string())
            .unwrap_or_else(|| id.to_string())
    };
    let items = ids
        .iter()
        .map(|&id| (name_of(id), applied.get(id).unwrap_or_default()))
        .collect();

    let mut queries = Vec::new();
    for &point in &options.points {
        let hits = packer.items_at_point(point).into_iter().map(name_of).collect();
        queries.push((Query::Point(point), hits));
    }
    for &rect in &options.rects {
        let hits = packer.get(rect).into_iter().map(name_of).collect();
        queries.push((Query::Rect(rect), hits));
    }

    Ok(LayoutReport {
        allocation,
        items,
        queries,
    })
}
