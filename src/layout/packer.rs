//! Box packing on top of the constraint container
//!
//! A [`BoxPacker`] keeps an ordered list of packed items and, on every
//! allocation, turns that list into constraints: item sizes along the packing
//! axis, symmetric padding for items that expand without filling, and a chain
//! of leading edges that places each item after its predecessor.

use super::config::LayoutConfig;
use super::constrained::{AxisVariables, Orientation, PackOptions};
use super::container::{Applied, ConstraintContainer, Entry};
use super::error::LayoutError;
use super::item::LayoutItem;
use super::solver::{Constraint, Expression, LinearSolver, SolverError, Strength};
use super::types::{ItemId, Point, Rect, Requisition, Size};

/// Per-side lengths of a margin or padding
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Sides {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Sides {
    pub fn new(top: f64, right: f64, bottom: f64, left: f64) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    pub fn uniform(value: f64) -> Self {
        Self::new(value, value, value, value)
    }

    /// Expand up to four values given in top, right, bottom, left order.
    ///
    /// A side without a value repeats the last value supplied, so `[10, 20]`
    /// gives `top = 10` and 20 everywhere else. Returns `None` for an empty slice;
    /// values past the fourth are ignored.
    pub fn rolling(values: &[f64]) -> Option<Self> {
        let last = *values.last()?;
        let side = |i: usize| values.get(i).copied().unwrap_or(last);
        Some(Self::new(side(0), side(1), side(2), side(3)))
    }

    /// Length on the side where packing along `orientation` starts
    pub fn leading(&self, orientation: Orientation) -> f64 {
        match orientation {
            Orientation::Horizontal => self.left,
            Orientation::Vertical => self.top,
        }
    }

    pub fn trailing(&self, orientation: Orientation) -> f64 {
        match orientation {
            Orientation::Horizontal => self.right,
            Orientation::Vertical => self.bottom,
        }
    }

    fn plus(self, other: Sides) -> Sides {
        Sides::new(
            self.top + other.top,
            self.right + other.right,
            self.bottom + other.bottom,
            self.left + other.left,
        )
    }
}

/// Everything the constraint emission needs from the packer, by value
#[derive(Debug, Clone, Copy)]
struct PackParams {
    orientation: Orientation,
    spacing: f64,
    inset: Sides,
    homogenous: bool,
}

/// A constraint container that lays its children out in a row or a column
#[derive(Debug)]
pub struct BoxPacker<I> {
    container: ConstraintContainer<I>,
    orientation: Orientation,
    spacing: f64,
    margin: Sides,
    padding: Sides,
    homogenous: bool,
}

impl<I: LayoutItem> BoxPacker<I> {
    pub fn new(orientation: Orientation, config: LayoutConfig) -> Self {
        Self {
            container: ConstraintContainer::new(config),
            orientation,
            spacing: 0.0,
            margin: Sides::default(),
            padding: Sides::default(),
            homogenous: false,
        }
    }

    pub fn horizontal(config: LayoutConfig) -> Self {
        Self::new(Orientation::Horizontal, config)
    }

    pub fn vertical(config: LayoutConfig) -> Self {
        Self::new(Orientation::Vertical, config)
    }

    /// Append `item` to the packing list, flagged as packed from the leading edge
    pub fn pack_start(&mut self, item: I, primary: PackOptions, secondary: PackOptions) -> ItemId {
        self.container
            .add_packed(item, primary | PackOptions::FROM_START, secondary)
    }

    /// Append `item` to the packing list, flagged as packed from the trailing edge.
    ///
    /// The flag is informational: the list is always laid out in insertion order.
    pub fn pack_end(&mut self, item: I, primary: PackOptions, secondary: PackOptions) -> ItemId {
        self.container
            .add_packed(item, primary | PackOptions::FROM_END, secondary)
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn set_orientation(&mut self, orientation: Orientation) {
        self.orientation = orientation;
        self.container.queue_constraint_update();
    }

    pub fn spacing(&self) -> f64 {
        self.spacing
    }

    /// Gap between consecutive items along the packing axis
    pub fn set_spacing(&mut self, spacing: f64) {
        self.spacing = spacing;
        self.container.queue_constraint_update();
    }

    pub fn padding(&self) -> Sides {
        self.padding
    }

    /// Set the padding from one to four values (see [`Sides::rolling`])
    pub fn set_padding(&mut self, values: &[f64]) {
        if let Some(sides) = shorthand("padding", values) {
            self.padding = sides;
            self.container.queue_constraint_update();
        }
    }

    pub fn margin(&self) -> Sides {
        self.margin
    }

    /// Set the margin from one to four values (see [`Sides::rolling`])
    pub fn set_margin(&mut self, values: &[f64]) {
        if let Some(sides) = shorthand("margin", values) {
            self.margin = sides;
            self.container.queue_constraint_update();
        }
    }

    pub fn homogenous(&self) -> bool {
        self.homogenous
    }

    /// Give every item the same share of the packing axis
    pub fn set_homogenous(&mut self, homogenous: bool) {
        self.homogenous = homogenous;
        self.container.queue_constraint_update();
    }

    /// Margin and padding together: the distance from the box edges to its items
    pub fn inset(&self) -> Sides {
        self.margin.plus(self.padding)
    }

    fn params(&self) -> PackParams {
        PackParams {
            orientation: self.orientation,
            spacing: self.spacing,
            inset: self.inset(),
            homogenous: self.homogenous,
        }
    }

    /// Pack the items into `allocation` and apply the result.
    ///
    /// The packing constraints depend on the allocated size, so the constraint
    /// graph is rebuilt on every call.
    pub fn size_allocate(&mut self, allocation: Rect) -> Result<Applied, LayoutError> {
        let params = self.params();
        self.container.queue_constraint_update();
        self.container
            .allocate_with(allocation, move |solver, entries, size| {
                emit(params, solver, entries, size)
            })
    }

    /// Minimum and natural size of the box.
    ///
    /// The minimum is the plain sum of the children's minimum sizes along the
    /// packing axis (plus spacing and insets) and the largest minimum across it.
    /// The natural size is measured by packing the children at their natural sizes.
    pub fn size_request(&mut self) -> Result<Requisition, LayoutError> {
        if let Some(size) = self.container.intrinsic_size() {
            return Ok(Requisition::fixed(size));
        }
        let along = self.orientation;
        let across = along.cross();
        let inset = self.inset();
        let requisitions = self.container.requisitions();
        let gaps = requisitions.len().saturating_sub(1) as f64 * self.spacing;

        let bounds = |pick: fn(&Requisition) -> Size| {
            let primary = requisitions
                .iter()
                .map(|r| along.extent(pick(r)))
                .sum::<f64>()
                + gaps
                + inset.leading(along)
                + inset.trailing(along);
            let secondary = requisitions
                .iter()
                .map(|r| across.extent(pick(r)))
                .fold(0.0, f64::max)
                + inset.leading(across)
                + inset.trailing(across);
            along.size(primary, secondary)
        };
        let minimum = bounds(|r| r.minimum);
        let guess = bounds(|r| r.natural);

        let params = self.params();
        let measured = self
            .container
            .measure_with(guess, move |solver, entries, size| {
                emit(params, solver, entries, size)
            })?;
        let natural = Size::new(measured.width + inset.right, measured.height + inset.bottom);
        Ok(Requisition::new(minimum, natural.max(minimum)))
    }

    pub fn remove(&mut self, id: ItemId) -> Option<I> {
        self.container.remove(id)
    }

    /// Add a box-level constraint, applied after the packing constraints
    pub fn constrain(&mut self, constraint: Constraint) {
        self.container.constrain(constraint);
    }

    pub fn add_item_constraint(
        &mut self,
        id: ItemId,
        constraint: Constraint,
    ) -> Result<(), LayoutError> {
        self.container.add_item_constraint(id, constraint)
    }

    pub fn item_mut(&mut self, id: ItemId) -> Option<&mut I> {
        self.container.item_mut(id)
    }

    pub fn child_changed(&mut self, id: ItemId) {
        self.container.child_changed(id);
    }

    /// The underlying container, for geometry queries and inspection
    pub fn container(&self) -> &ConstraintContainer<I> {
        &self.container
    }

    pub fn bounding_box(&self) -> Option<Rect> {
        self.container.bounding_box()
    }

    pub fn get(&self, area: Rect) -> Vec<ItemId> {
        self.container.get(area)
    }

    pub fn items_at_point(&self, point: Point) -> Vec<ItemId> {
        self.container.items_at_point(point)
    }
}

fn shorthand(what: &str, values: &[f64]) -> Option<Sides> {
    if values.len() > 4 {
        tracing::warn!(what, given = values.len(), "only the first four values are used");
    }
    let sides = Sides::rolling(&values[..values.len().min(4)]);
    if sides.is_none() {
        tracing::warn!(what, "ignoring empty shorthand");
    }
    sides
}

/// What emission needs to know about one packed item
struct Slot {
    primary: AxisVariables,
    secondary: AxisVariables,
    primary_options: PackOptions,
    secondary_options: PackOptions,
    natural: Size,
    constraints: Vec<Constraint>,
}

/// Emit the packing constraints for the items of a box of the given size
#[tracing::instrument(level = "trace", skip_all, fields(items = entries.len()))]
fn emit<I: LayoutItem>(
    params: PackParams,
    solver: &mut LinearSolver,
    entries: &mut [Entry<I>],
    size: Size,
) -> Result<(), SolverError> {
    let along = params.orientation;
    let across = along.cross();

    let slots: Vec<Slot> = entries
        .iter_mut()
        .filter_map(|entry| {
            let boxed = entry.packing.as_boxed()?;
            Some(Slot {
                primary: boxed.axis(along),
                secondary: boxed.axis(across),
                primary_options: boxed.primary_options(),
                secondary_options: boxed.secondary_options(),
                natural: entry.item.preferred_size().natural,
                constraints: boxed.base().constraints().to_vec(),
            })
        })
        .collect();
    if slots.is_empty() {
        return Ok(());
    }

    let count = slots.len() as f64;
    let lead = params.inset.leading(along);
    let available = along.extent(size)
        - lead
        - params.inset.trailing(along)
        - (count - 1.0) * params.spacing;

    let share = if params.homogenous {
        Some(available / count)
    } else {
        let expanding = slots
            .iter()
            .filter(|s| s.primary_options.contains(PackOptions::EXPAND))
            .count();
        let used: f64 = slots
            .iter()
            .filter(|s| !s.primary_options.contains(PackOptions::EXPAND))
            .map(|s| along.extent(s.natural))
            .sum();
        (expanding > 0).then(|| (available - used) / expanding as f64)
    };
    tracing::trace!(?share, available, "primary axis share");

    let lead2 = params.inset.leading(across);
    let fill2 = across.extent(size) - lead2 - params.inset.trailing(across);

    let mut previous: Option<AxisVariables> = None;
    for slot in &slots {
        let p = slot.primary;
        let natural = along.extent(slot.natural);
        let claims_share = params.homogenous || slot.primary_options.contains(PackOptions::EXPAND);

        match share.filter(|_| claims_share) {
            Some(share) if slot.primary_options.contains(PackOptions::EXPAND | PackOptions::FILL) => {
                solver.add_constraint(Constraint::equal(p.size, share, Strength::Strong))?;
                pin_padding(solver, &p)?;
            }
            Some(share) => {
                solver.add_constraint(Constraint::equal(p.size, natural, Strength::Strong))?;
                solver.add_constraint(Constraint::equal(
                    p.leading_padding + p.trailing_padding + p.size,
                    share,
                    Strength::Required,
                ))?;
                solver.add_constraint(Constraint::equal(
                    p.leading_padding,
                    p.trailing_padding,
                    Strength::Required,
                ))?;
            }
            None => {
                solver.add_constraint(Constraint::equal(p.size, natural, Strength::Strong))?;
                pin_padding(solver, &p)?;
            }
        }

        let start = match previous {
            None => Expression::from(p.leading_padding) + lead,
            Some(prev) => prev.trailing + prev.trailing_padding + p.leading_padding + params.spacing,
        };
        solver.add_constraint(Constraint::equal(p.leading, start, Strength::Required))?;

        let s = slot.secondary;
        let natural2 = across.extent(slot.natural);
        if !slot.secondary_options.contains(PackOptions::EXPAND) && natural2 > 0.0 {
            solver.add_constraint(Constraint::equal(s.size, natural2, Strength::Strong))?;
        } else {
            solver.add_constraint(Constraint::equal(
                s.size,
                Expression::from(fill2) - s.trailing_padding,
                Strength::Strong,
            ))?;
        }
        solver.add_constraint(Constraint::equal(
            s.leading,
            s.leading_padding + lead2,
            Strength::Required,
        ))?;
        pin_padding(solver, &s)?;

        for axis in [&p, &s] {
            solver.add_constraint(Constraint::equal(
                axis.center,
                axis.leading + axis.size / 2.0,
                Strength::Required,
            ))?;
            solver.add_constraint(Constraint::equal(
                axis.trailing,
                axis.leading + axis.size,
                Strength::Required,
            ))?;
        }

        for constraint in &slot.constraints {
            solver.add_constraint(constraint.clone())?;
        }
        previous = Some(p);
    }
    Ok(())
}

fn pin_padding(solver: &mut LinearSolver, axis: &AxisVariables) -> Result<(), SolverError> {
    solver.add_constraint(Constraint::equal(axis.leading_padding, 0.0, Strength::Required))?;
    solver.add_constraint(Constraint::equal(axis.trailing_padding, 0.0, Strength::Required))
}

impl<I: LayoutItem> LayoutItem for BoxPacker<I> {
    fn preferred_size(&mut self) -> Requisition {
        match self.size_request() {
            Ok(requisition) => requisition,
            Err(e) => {
                tracing::warn!(error = %e, "box size request failed");
                self.container.record_error(e);
                Requisition::default()
            }
        }
    }

    fn size_allocate(&mut self, allocation: Rect) {
        if let Err(e) = BoxPacker::size_allocate(self, allocation) {
            tracing::error!(error = %e, "nested box allocation failed");
        }
    }

    fn bounding_box(&self) -> Option<Rect> {
        self.container.bounding_box()
    }

    fn item_to_parent(&self, rect: Rect) -> Rect {
        LayoutItem::item_to_parent(&self.container, rect)
    }
}
