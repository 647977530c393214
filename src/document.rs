//! TOML description of a box layout
//!
//! A document describes one [`BoxPacker`] of [`SimpleItem`]s:
//!
//! ```toml
//! orientation = "horizontal"
//! spacing = 10
//! margin = [4, 8]
//!
//! [allocation]
//! width = 300
//! height = 40
//!
//! [[items]]
//! name = "sidebar"
//! natural = [60, 20]
//!
//! [[items]]
//! name = "content"
//! natural = [100, 20]
//! primary = ["expand", "fill"]
//! ```

use std::collections::HashSet;

use serde::Deserialize;
use toml::Spanned;

use crate::error::DocumentError;
use crate::layout::{
    BoxPacker, ItemId, LayoutConfig, Orientation, PackOptions, Requisition, SimpleItem, Size,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
enum OrientationSpec {
    #[default]
    Horizontal,
    Vertical,
}

impl From<OrientationSpec> for Orientation {
    fn from(spec: OrientationSpec) -> Self {
        match spec {
            OrientationSpec::Horizontal => Orientation::Horizontal,
            OrientationSpec::Vertical => Orientation::Vertical,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Flag {
    Expand,
    Fill,
    Shrink,
}

fn pack_options(flags: &[Flag]) -> PackOptions {
    flags.iter().fold(PackOptions::empty(), |acc, flag| {
        acc | match flag {
            Flag::Expand => PackOptions::EXPAND,
            Flag::Fill => PackOptions::FILL,
            Flag::Shrink => PackOptions::SHRINK,
        }
    })
}

/// Which end of the box an item is packed from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackFrom {
    #[default]
    Start,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AllocationSpec {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct IndexSpec {
    items_per_cell: Option<usize>,
    dumb_lookup_threshold: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct ItemSpec {
    name: Spanned<String>,
    natural: [f64; 2],
    minimum: Option<[f64; 2]>,
    #[serde(default)]
    pack: PackFrom,
    #[serde(default)]
    primary: Vec<Flag>,
    #[serde(default)]
    secondary: Vec<Flag>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawDocument {
    #[serde(default)]
    orientation: OrientationSpec,
    #[serde(default)]
    spacing: f64,
    margin: Option<Spanned<Vec<f64>>>,
    padding: Option<Spanned<Vec<f64>>>,
    #[serde(default)]
    homogenous: bool,
    allocation: Option<AllocationSpec>,
    #[serde(default)]
    index: IndexSpec,
    #[serde(default)]
    items: Vec<ItemSpec>,
}

/// One item of a parsed document
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentItem {
    pub name: String,
    pub requisition: Requisition,
    pub pack: PackFrom,
    pub primary: PackOptions,
    pub secondary: PackOptions,
}

/// A validated box document
#[derive(Debug, Clone, PartialEq)]
pub struct BoxDocument {
    pub orientation: Orientation,
    pub spacing: f64,
    pub margin: Vec<f64>,
    pub padding: Vec<f64>,
    pub homogenous: bool,
    pub allocation: Option<AllocationSpec>,
    pub config: LayoutConfig,
    pub items: Vec<DocumentItem>,
}

impl BoxDocument {
    /// Parse and validate a document
    pub fn parse(source: &str) -> Result<Self, DocumentError> {
        let raw: RawDocument = toml::from_str(source)?;

        let margin = shorthand("margin", raw.margin)?;
        let padding = shorthand("padding", raw.padding)?;

        let mut config = LayoutConfig::new();
        if let Some(items_per_cell) = raw.index.items_per_cell {
            config = config.with_items_per_cell(items_per_cell);
        }
        if let Some(threshold) = raw.index.dumb_lookup_threshold {
            config = config.with_dumb_lookup_threshold(threshold);
        }

        let mut seen = HashSet::new();
        let mut items = Vec::with_capacity(raw.items.len());
        for spec in raw.items {
            let span = spec.name.span();
            let name = spec.name.into_inner();
            if !seen.insert(name.clone()) {
                return Err(DocumentError::invalid(
                    format!("duplicate item name '{}'", name),
                    Some(span),
                ));
            }
            let natural = Size::new(spec.natural[0], spec.natural[1]);
            let minimum = spec
                .minimum
                .map(|[w, h]| Size::new(w, h))
                .unwrap_or(natural);
            if minimum.width > natural.width || minimum.height > natural.height {
                return Err(DocumentError::invalid(
                    format!("minimum size of '{}' exceeds its natural size", name),
                    Some(span),
                ));
            }
            items.push(DocumentItem {
                name,
                requisition: Requisition::new(minimum, natural),
                pack: spec.pack,
                primary: pack_options(&spec.primary),
                secondary: pack_options(&spec.secondary),
            });
        }

        Ok(BoxDocument {
            orientation: raw.orientation.into(),
            spacing: raw.spacing,
            margin,
            padding,
            homogenous: raw.homogenous,
            allocation: raw.allocation,
            config,
            items,
        })
    }

    /// Build the packer described by the document.
    ///
    /// Returns the packer and the id of every item, in document order.
    pub fn build(&self) -> (BoxPacker<SimpleItem>, Vec<ItemId>) {
        let mut packer = BoxPacker::new(self.orientation, self.config);
        packer.set_spacing(self.spacing);
        if !self.margin.is_empty() {
            packer.set_margin(&self.margin);
        }
        if !self.padding.is_empty() {
            packer.set_padding(&self.padding);
        }
        packer.set_homogenous(self.homogenous);

        let ids = self
            .items
            .iter()
            .map(|spec| {
                let item = SimpleItem::with_requisition(spec.name.clone(), spec.requisition);
                match spec.pack {
                    PackFrom::Start => packer.pack_start(item, spec.primary, spec.secondary),
                    PackFrom::End => packer.pack_end(item, spec.primary, spec.secondary),
                }
            })
            .collect();
        (packer, ids)
    }
}

fn shorthand(what: &str, values: Option<Spanned<Vec<f64>>>) -> Result<Vec<f64>, DocumentError> {
    let Some(values) = values else {
        return Ok(Vec::new());
    };
    let span = values.span();
    let values = values.into_inner();
    if values.is_empty() || values.len() > 4 {
        return Err(DocumentError::invalid(
            format!("{} takes 1 to 4 values, got {}", what, values.len()),
            Some(span),
        ));
    }
    Ok(values)
}
