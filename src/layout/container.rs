//! A container whose children are positioned by a linear constraint solver
//!
//! The container owns its children. Registering a child creates a
//! [`ConstrainedItem`] for it; constraints over those variables (and over the
//! container's own `width`/`height` edit variables) decide where every child
//! ends up. Each allocation pass either applies a complete solution to every
//! child or leaves all of them untouched.

use super::config::LayoutConfig;
use super::constrained::{BoxConstrainedItem, ConstrainedItem, PackOptions, Packing};
use super::error::LayoutError;
use super::item::LayoutItem;
use super::solver::{Constraint, LinearSolver, SolverError, Strength, Variable};
use super::types::{Cached, ItemId, Point, Rect, Requisition, Size};
use crate::lookup::{IndexedItem, LookupTable, SpatialIndex};

/// A registered child and its constraint record
#[derive(Debug)]
pub struct Entry<I> {
    pub(crate) id: ItemId,
    pub(crate) item: I,
    pub(crate) packing: Packing,
}

impl<I> Entry<I> {
    pub fn id(&self) -> ItemId {
        self.id
    }

    pub fn item(&self) -> &I {
        &self.item
    }

    pub fn packing(&self) -> &Packing {
        &self.packing
    }
}

/// Rectangles handed to the children by one allocation pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Applied {
    allocations: Vec<(ItemId, Rect)>,
}

impl Applied {
    pub fn get(&self, id: ItemId) -> Option<Rect> {
        self.allocations
            .iter()
            .find(|(item, _)| *item == id)
            .map(|(_, rect)| *rect)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(ItemId, Rect)> {
        self.allocations.iter()
    }

    pub fn len(&self) -> usize {
        self.allocations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.allocations.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Allocating,
}

/// Children positioned by explicit constraints
#[derive(Debug)]
pub struct ConstraintContainer<I> {
    config: LayoutConfig,
    entries: Vec<Entry<I>>,
    constraints: Vec<Constraint>,
    solver: LinearSolver,
    width: Variable,
    height: Variable,
    intrinsic_size: Option<Size>,
    allocation: Option<Rect>,
    // Rectangle of the last pass that failed, retried by `solve`
    requested: Option<Rect>,
    need_constraint_update: bool,
    needs_resize: bool,
    phase: Phase,
    // Children that reported a change while an allocation was in flight
    pending: Vec<ItemId>,
    bbox: Cached<Option<Rect>>,
    index: Cached<SpatialIndex>,
    next_id: u64,
    last_error: Option<LayoutError>,
}

impl<I: LayoutItem> ConstraintContainer<I> {
    pub fn new(config: LayoutConfig) -> Self {
        Self {
            config,
            entries: Vec::new(),
            constraints: Vec::new(),
            solver: LinearSolver::new(),
            width: Variable::new(),
            height: Variable::new(),
            intrinsic_size: None,
            allocation: None,
            requested: None,
            need_constraint_update: true,
            needs_resize: false,
            phase: Phase::Idle,
            pending: Vec::new(),
            bbox: Cached::new(),
            index: Cached::new(),
            next_id: 0,
            last_error: None,
        }
    }

    /// Give the container a fixed preferred size
    pub fn with_intrinsic_size(mut self, size: Size) -> Self {
        self.intrinsic_size = Some(size);
        self
    }

    pub fn set_intrinsic_size(&mut self, size: Option<Size>) {
        self.intrinsic_size = size;
        self.needs_resize = true;
    }

    pub fn intrinsic_size(&self) -> Option<Size> {
        self.intrinsic_size
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Edit variable holding the allocated width
    pub fn width(&self) -> Variable {
        self.width
    }

    /// Edit variable holding the allocated height
    pub fn height(&self) -> Variable {
        self.height
    }

    // ------------------------------------------------------------------
    // Registration
    // ------------------------------------------------------------------

    /// Register `item` on top of the existing children
    pub fn add(&mut self, item: I) -> ItemId {
        self.register(item, false, |id| Packing::Plain(ConstrainedItem::new(id)))
    }

    /// Register `item` below the existing children
    pub fn add_front(&mut self, item: I) -> ItemId {
        self.register(item, true, |id| Packing::Plain(ConstrainedItem::new(id)))
    }

    pub(crate) fn add_packed(
        &mut self,
        item: I,
        primary: PackOptions,
        secondary: PackOptions,
    ) -> ItemId {
        self.register(item, false, |id| {
            Packing::Boxed(BoxConstrainedItem::new(id, primary, secondary))
        })
    }

    fn register(&mut self, item: I, front: bool, packing: impl FnOnce(ItemId) -> Packing) -> ItemId {
        let id = ItemId(self.next_id);
        self.next_id += 1;
        let entry = Entry {
            id,
            item,
            packing: packing(id),
        };
        if front {
            self.entries.insert(0, entry);
        } else {
            self.entries.push(entry);
        }
        tracing::trace!(%id, front, "registered item");
        self.child_changed(id);
        id
    }

    /// Unregister an item and hand it back.
    ///
    /// Every stored constraint that references one of the item's variables is
    /// dropped with it, so the solver never sees a variable without an owner.
    pub fn remove(&mut self, id: ItemId) -> Option<I> {
        let pos = self.entries.iter().position(|e| e.id == id)?;
        let entry = self.entries.remove(pos);

        let before = self.constraints.len();
        self.constraints.retain(|c| !entry.packing.involved(c));
        let mut purged = before - self.constraints.len();
        for other in &mut self.entries {
            let owned = other.packing.base().constraints().len();
            other
                .packing
                .base_mut()
                .retain_constraints(|c| !entry.packing.involved(c));
            purged += owned - other.packing.base().constraints().len();
        }
        tracing::debug!(%id, purged, "removed item");

        self.invalidate_caches();
        self.need_constraint_update = true;
        self.needs_resize = true;
        Some(entry.item)
    }

    /// Add a container-level constraint; it takes effect at the next solve
    pub fn constrain(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
        self.need_constraint_update = true;
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Attach a constraint to one item
    pub fn add_item_constraint(
        &mut self,
        id: ItemId,
        constraint: Constraint,
    ) -> Result<(), LayoutError> {
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or(LayoutError::UnknownItem(id))?;
        entry.packing.base_mut().add_constraint(constraint);
        self.need_constraint_update = true;
        Ok(())
    }

    pub fn constrained(&self, id: ItemId) -> Option<&ConstrainedItem> {
        self.entry(id).map(|e| e.packing.base())
    }

    pub fn packing(&self, id: ItemId) -> Option<&Packing> {
        self.entry(id).map(|e| &e.packing)
    }

    pub fn item(&self, id: ItemId) -> Option<&I> {
        self.entry(id).map(|e| &e.item)
    }

    /// Mutable access to a child; counts as a change notification for it
    pub fn item_mut(&mut self, id: ItemId) -> Option<&mut I> {
        let pos = self.entries.iter().position(|e| e.id == id)?;
        self.child_changed(id);
        Some(&mut self.entries[pos].item)
    }

    fn entry(&self, id: ItemId) -> Option<&Entry<I>> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Children in z-order, back to front
    pub fn entries(&self) -> &[Entry<I>] {
        &self.entries
    }

    pub fn ids(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.entries.iter().map(|e| e.id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // ------------------------------------------------------------------
    // State
    // ------------------------------------------------------------------

    /// Rectangle of the last successful allocation, in the parent's coordinates
    pub fn allocation(&self) -> Option<Rect> {
        self.allocation
    }

    pub fn needs_constraint_update(&self) -> bool {
        self.need_constraint_update
    }

    /// True when a child changed since the last successful allocation
    pub fn needs_resize(&self) -> bool {
        self.needs_resize
    }

    pub fn in_allocation(&self) -> bool {
        self.phase == Phase::Allocating
    }

    /// Error of the last failed allocation or size request, cleared by the next success
    pub fn last_error(&self) -> Option<&LayoutError> {
        self.last_error.as_ref()
    }

    pub(crate) fn queue_constraint_update(&mut self) {
        self.need_constraint_update = true;
    }

    /// Ask every child for its preferred size, in z-order
    pub(crate) fn requisitions(&mut self) -> Vec<Requisition> {
        self.entries
            .iter_mut()
            .map(|e| e.item.preferred_size())
            .collect()
    }

    pub(crate) fn record_error(&mut self, error: LayoutError) {
        self.last_error = Some(error);
    }

    // ------------------------------------------------------------------
    // Solving
    // ------------------------------------------------------------------

    /// Solve for the last requested allocation (or the intrinsic size) and apply the result
    pub fn solve(&mut self) -> Result<Applied, LayoutError> {
        let allocation = self
            .requested
            .or(self.allocation)
            .or_else(|| self.intrinsic_size.map(Rect::from_size))
            .unwrap_or_default();
        self.size_allocate(allocation)
    }

    /// Solve for `allocation` and push the resulting rectangles into every child
    pub fn size_allocate(&mut self, allocation: Rect) -> Result<Applied, LayoutError> {
        self.allocate_with(allocation, |_, _, _| Ok(()))
    }

    /// Run one allocation pass.
    ///
    /// `structure` adds the constraints of a specialised container after the
    /// per-item size constraints and before the container-level ones.
    #[tracing::instrument(level = "debug", skip_all, fields(items = self.entries.len()))]
    pub(crate) fn allocate_with<F>(
        &mut self,
        allocation: Rect,
        structure: F,
    ) -> Result<Applied, LayoutError>
    where
        F: FnOnce(&mut LinearSolver, &mut [Entry<I>], Size) -> Result<(), SolverError>,
    {
        debug_assert_eq!(self.phase, Phase::Idle, "nested allocation of one container");
        self.phase = Phase::Allocating;

        let result = match self.solve_with(allocation.size(), structure) {
            Ok(rects) => Ok(self.apply(rects)),
            Err(e) => Err(e),
        };

        self.phase = Phase::Idle;
        self.flush_pending();

        match &result {
            Ok(applied) => {
                tracing::debug!(applied = applied.len(), "allocation applied");
                self.allocation = Some(allocation);
                self.requested = None;
                self.needs_resize = false;
                self.last_error = None;
            }
            Err(e) => {
                tracing::warn!(error = %e, "allocation failed, keeping previous layout");
                self.requested = Some(allocation);
                self.last_error = Some(e.clone());
            }
        }
        result
    }

    /// Preferred size of the container.
    ///
    /// Without an intrinsic size the children are solved for a best-guess size
    /// (the largest natural child size) and measured; the solver is reset
    /// afterwards so the query leaves nothing behind for the next allocation.
    pub fn size_request(&mut self) -> Result<Requisition, LayoutError> {
        if let Some(size) = self.intrinsic_size {
            return Ok(Requisition::fixed(size));
        }
        let guess = self
            .requisitions()
            .iter()
            .fold(Size::zero(), |acc, r| acc.max(r.natural));
        let natural = self.measure_with(guess, |_, _, _| Ok(()))?;
        Ok(Requisition::fixed(natural))
    }

    /// Solve for `guess` without touching the children and return the extent
    /// of the solved rectangles.
    pub(crate) fn measure_with<F>(&mut self, guess: Size, structure: F) -> Result<Size, LayoutError>
    where
        F: FnOnce(&mut LinearSolver, &mut [Entry<I>], Size) -> Result<(), SolverError>,
    {
        self.need_constraint_update = true;
        let result = self.solve_with(guess, structure);
        self.solver.reset();
        self.need_constraint_update = true;

        let rects = result.inspect_err(|e| {
            tracing::warn!(error = %e, "size request failed");
        })?;
        Ok(extent(rects.iter().map(|(_, r)| *r)))
    }

    fn solve_with<F>(&mut self, size: Size, structure: F) -> Result<Vec<(ItemId, Rect)>, LayoutError>
    where
        F: FnOnce(&mut LinearSolver, &mut [Entry<I>], Size) -> Result<(), SolverError>,
    {
        match self.try_solve(size, structure) {
            Ok(rects) => Ok(rects),
            Err(e) => {
                // Never keep a half-built graph around for the next query
                self.solver.reset();
                self.need_constraint_update = true;
                Err(e)
            }
        }
    }

    fn try_solve<F>(&mut self, size: Size, structure: F) -> Result<Vec<(ItemId, Rect)>, LayoutError>
    where
        F: FnOnce(&mut LinearSolver, &mut [Entry<I>], Size) -> Result<(), SolverError>,
    {
        if self.need_constraint_update {
            self.update_constraints(size, structure)?;
        }
        self.solver.suggest_value(self.width, size.width)?;
        self.solver.suggest_value(self.height, size.height)?;
        self.solver.update_variables();

        Ok(self
            .entries
            .iter()
            .map(|e| (e.id, e.packing.base().allocation(&self.solver)))
            .collect())
    }

    /// Rebuild the solver from scratch
    #[tracing::instrument(level = "debug", skip_all, fields(items = self.entries.len(), constraints = self.constraints.len()))]
    fn update_constraints<F>(&mut self, size: Size, structure: F) -> Result<(), SolverError>
    where
        F: FnOnce(&mut LinearSolver, &mut [Entry<I>], Size) -> Result<(), SolverError>,
    {
        self.solver.reset();
        self.solver.add_edit_variable(self.width, Strength::Strong)?;
        self.solver.add_edit_variable(self.height, Strength::Strong)?;

        for entry in &mut self.entries {
            let requisition = entry.item.preferred_size();
            let base = entry.packing.base();
            for constraint in base.size_constraints(requisition.minimum, requisition.natural) {
                self.solver.add_constraint(constraint)?;
            }
            // Box items get their geometry and own constraints from the packer
            if let Packing::Plain(item) = &entry.packing {
                for constraint in item.geometry_constraints() {
                    self.solver.add_constraint(constraint)?;
                }
                for constraint in item.constraints() {
                    self.solver.add_constraint(constraint.clone())?;
                }
            }
        }

        structure(&mut self.solver, &mut self.entries, size)?;

        for constraint in &self.constraints {
            self.solver.add_constraint(constraint.clone())?;
        }

        tracing::debug!(total = self.solver.constraint_count(), "constraint graph rebuilt");
        self.need_constraint_update = false;
        Ok(())
    }

    fn apply(&mut self, rects: Vec<(ItemId, Rect)>) -> Applied {
        let mut changed = Vec::new();
        for (entry, &(id, rect)) in self.entries.iter_mut().zip(&rects) {
            let before = entry.item.bounding_box_in_parent();
            entry.item.size_allocate(rect);
            if entry.item.bounding_box_in_parent() != before {
                changed.push(id);
            }
        }
        for id in changed {
            self.child_changed(id);
        }
        Applied { allocations: rects }
    }

    // ------------------------------------------------------------------
    // Change notification
    // ------------------------------------------------------------------

    /// Notification that a child's size or bounding box changed.
    ///
    /// While an allocation is in flight the notification is only recorded;
    /// it invalidates the cached geometry once the pass completes and never
    /// triggers another layout.
    pub fn child_changed(&mut self, id: ItemId) {
        match self.phase {
            Phase::Allocating => {
                if !self.pending.contains(&id) {
                    self.pending.push(id);
                }
            }
            Phase::Idle => {
                self.invalidate_caches();
                self.need_constraint_update = true;
                self.needs_resize = true;
            }
        }
    }

    fn flush_pending(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        tracing::trace!(changed = self.pending.len(), "children moved during allocation");
        self.pending.clear();
        self.invalidate_caches();
    }

    fn invalidate_caches(&mut self) {
        self.bbox.invalidate();
        self.index.invalidate();
    }

    // ------------------------------------------------------------------
    // Geometry queries
    // ------------------------------------------------------------------

    /// Union of the children's bounding boxes, in the container's coordinates
    pub fn bounding_box(&self) -> Option<Rect> {
        *self.bbox.get_or_compute(|| {
            self.entries
                .iter()
                .filter_map(|e| e.item.bounding_box_in_parent())
                .reduce(|a, b| a.union(&b))
        })
    }

    /// The spatial index over the children, rebuilt if anything changed
    pub fn lookup(&self) -> &SpatialIndex {
        self.index.get_or_compute(|| {
            let items = self
                .entries
                .iter()
                .map(|e| IndexedItem::new(e.id, e.item.bounding_box_in_parent(), e.item.visible()))
                .collect();
            SpatialIndex::build(
                items,
                self.bounding_box(),
                self.config.dumb_lookup_threshold,
                self.config.items_per_cell,
            )
        })
    }

    /// Children intersecting `area`, back to front
    pub fn get(&self, area: Rect) -> Vec<ItemId> {
        self.lookup().get(area)
    }

    /// Children covering `point`, back to front
    pub fn items_at_point(&self, point: Point) -> Vec<ItemId> {
        self.lookup().items_at_point(point)
    }

    pub fn has_item_at_point(&self, point: Point) -> bool {
        self.lookup().has_item_at_point(point)
    }
}

/// Size of the area from the origin to the far edges of `rects`
pub(crate) fn extent(rects: impl Iterator<Item = Rect>) -> Size {
    rects.fold(Size::zero(), |acc, r| {
        acc.max(Size::new(r.right().max(0.0), r.bottom().max(0.0)))
    })
}

impl<I: LayoutItem> LayoutItem for ConstraintContainer<I> {
    fn preferred_size(&mut self) -> Requisition {
        match self.size_request() {
            Ok(requisition) => requisition,
            Err(e) => {
                self.record_error(e);
                Requisition::default()
            }
        }
    }

    fn size_allocate(&mut self, allocation: Rect) {
        if let Err(e) = ConstraintContainer::size_allocate(self, allocation) {
            tracing::error!(error = %e, "nested container allocation failed");
        }
    }

    fn bounding_box(&self) -> Option<Rect> {
        ConstraintContainer::bounding_box(self)
    }

    fn item_to_parent(&self, rect: Rect) -> Rect {
        rect.translate(self.allocation.map(|a| a.origin()).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::item::SimpleItem;

    const EPS: f64 = 0.001;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < EPS
    }

    fn container() -> ConstraintContainer<SimpleItem> {
        ConstraintContainer::new(LayoutConfig::default())
    }

    fn pin<I: LayoutItem>(c: &mut ConstraintContainer<I>, id: ItemId, x: f64, y: f64) {
        let item = c.constrained(id).unwrap().clone();
        c.constrain(Constraint::equal(item.left(), x, Strength::Required));
        c.constrain(Constraint::equal(item.top(), y, Strength::Required));
    }

    #[test]
    fn test_unconstrained_items_get_natural_size() {
        let mut c = container();
        let a = c.add(SimpleItem::new("a", Size::new(40.0, 30.0)));

        let applied = c.size_allocate(Rect::new(0.0, 0.0, 200.0, 100.0)).unwrap();
        let rect = applied.get(a).unwrap();
        assert!(approx(rect.width, 40.0) && approx(rect.height, 30.0));
        assert_eq!(c.item(a).unwrap().allocation_count(), 1);
    }

    #[test]
    fn test_empty_container() {
        let mut c = container();
        assert_eq!(c.size_request().unwrap(), Requisition::fixed(Size::zero()));

        let applied = c.size_allocate(Rect::new(0.0, 0.0, 100.0, 100.0)).unwrap();
        assert!(applied.is_empty());
        assert_eq!(c.bounding_box(), None);
        assert!(!c.has_item_at_point(Point::new(0.0, 0.0)));
        assert!(c.last_error().is_none());
    }

    #[test]
    fn test_failed_solve_keeps_position_in_parent() {
        let mut c = container();
        let a = c.add(SimpleItem::new("a", Size::new(40.0, 30.0)));
        pin(&mut c, a, 0.0, 0.0);
        let first = Rect::new(10.0, 10.0, 200.0, 100.0);
        c.size_allocate(first).unwrap();
        let before = LayoutItem::bounding_box_in_parent(&c);

        let ca = c.constrained(a).unwrap().clone();
        c.constrain(Constraint::equal(ca.width(), 10.0, Strength::Required));
        c.constrain(Constraint::equal(ca.width(), 20.0, Strength::Required));
        assert!(c.size_allocate(Rect::new(50.0, 50.0, 200.0, 100.0)).is_err());

        assert_eq!(c.allocation(), Some(first));
        assert_eq!(LayoutItem::bounding_box_in_parent(&c), before);

        // A retry goes for the rectangle that failed
        assert!(c.solve().is_err());
        assert_eq!(c.allocation(), Some(first));
    }

    #[test]
    fn test_relative_constraint() {
        let mut c = container();
        let a = c.add(SimpleItem::new("a", Size::new(40.0, 30.0)));
        let b = c.add(SimpleItem::new("b", Size::new(20.0, 30.0)));
        let (ca, cb) = (c.constrained(a).unwrap().clone(), c.constrained(b).unwrap().clone());

        c.constrain(Constraint::equal(ca.left(), 5.0, Strength::Required));
        c.constrain(Constraint::equal(cb.left(), ca.right() + 10.0, Strength::Required));

        let applied = c.size_allocate(Rect::new(0.0, 0.0, 200.0, 100.0)).unwrap();
        assert!(approx(applied.get(b).unwrap().x, 55.0));
        assert!(approx(c.item(b).unwrap().allocation().x, 55.0));
    }

    #[test]
    fn test_constraint_against_container_width() {
        let mut c = container();
        let a = c.add(SimpleItem::new("a", Size::new(40.0, 30.0)));
        let ca = c.constrained(a).unwrap().clone();

        c.constrain(Constraint::equal(ca.left(), 0.0, Strength::Required));
        c.constrain(Constraint::equal(ca.right(), c.width(), Strength::Required));

        let applied = c.size_allocate(Rect::new(0.0, 0.0, 250.0, 100.0)).unwrap();
        assert!(approx(applied.get(a).unwrap().width, 250.0));

        // Same graph, new suggestion
        let applied = c.size_allocate(Rect::new(0.0, 0.0, 120.0, 100.0)).unwrap();
        assert!(approx(applied.get(a).unwrap().width, 120.0));
    }

    #[test]
    fn test_failed_solve_keeps_previous_geometry() {
        let mut c = container();
        let a = c.add(SimpleItem::new("a", Size::new(40.0, 30.0)));
        c.size_allocate(Rect::new(0.0, 0.0, 200.0, 100.0)).unwrap();
        let before = c.item(a).unwrap().allocation();

        let ca = c.constrained(a).unwrap().clone();
        c.constrain(Constraint::equal(ca.width(), 10.0, Strength::Required));
        c.constrain(Constraint::equal(ca.width(), 20.0, Strength::Required));

        let err = c.size_allocate(Rect::new(0.0, 0.0, 300.0, 100.0)).unwrap_err();
        assert!(err.is_unsatisfiable());
        assert!(c.last_error().is_some());
        assert!(c.needs_constraint_update());
        assert_eq!(c.item(a).unwrap().allocation(), before);
        assert_eq!(c.item(a).unwrap().allocation_count(), 1);
    }

    #[test]
    fn test_remove_purges_constraints() {
        let mut c = container();
        let a = c.add(SimpleItem::new("a", Size::new(40.0, 30.0)));
        let b = c.add(SimpleItem::new("b", Size::new(20.0, 30.0)));
        let (ca, cb) = (c.constrained(a).unwrap().clone(), c.constrained(b).unwrap().clone());

        c.constrain(Constraint::equal(cb.left(), ca.right(), Strength::Required));
        c.constrain(Constraint::equal(cb.top(), 7.0, Strength::Required));
        c.add_item_constraint(b, Constraint::greater_or_equal(cb.left(), ca.left(), Strength::Strong))
            .unwrap();

        let removed = c.remove(a).unwrap();
        assert_eq!(removed.name(), "a");
        assert_eq!(c.constraints().len(), 1);
        assert!(c.constrained(b).unwrap().constraints().is_empty());
        assert!(c.remove(a).is_none());

        let applied = c.size_allocate(Rect::new(0.0, 0.0, 100.0, 100.0)).unwrap();
        assert!(approx(applied.get(b).unwrap().y, 7.0));
    }

    #[test]
    fn test_unknown_item_constraint() {
        let mut c = container();
        let a = c.add(SimpleItem::new("a", Size::new(1.0, 1.0)));
        c.remove(a);
        let err = c
            .add_item_constraint(a, Constraint::equal(Variable::new(), 1.0, Strength::Weak))
            .unwrap_err();
        assert!(matches!(err, LayoutError::UnknownItem(id) if id == a));
    }

    #[test]
    fn test_size_request_is_idempotent() {
        let mut c = container();
        let a = c.add(SimpleItem::new("a", Size::new(40.0, 30.0)));
        let b = c.add(SimpleItem::new("b", Size::new(20.0, 10.0)));
        let (ca, cb) = (c.constrained(a).unwrap().clone(), c.constrained(b).unwrap().clone());
        pin(&mut c, a, 0.0, 0.0);
        c.constrain(Constraint::equal(cb.left(), ca.right() + 5.0, Strength::Required));
        c.constrain(Constraint::equal(cb.top(), 0.0, Strength::Required));

        let first = c.size_request().unwrap();
        let second = c.size_request().unwrap();
        assert!(approx(first.natural.width, second.natural.width));
        assert!(approx(first.natural.height, second.natural.height));
        assert!(approx(first.natural.width, 65.0));
        assert!(approx(first.natural.height, 30.0));
        // Measuring never allocates the children
        assert_eq!(c.item(a).unwrap().allocation_count(), 0);
    }

    #[test]
    fn test_intrinsic_size_short_circuits() {
        let mut c = container().with_intrinsic_size(Size::new(64.0, 48.0));
        c.add(SimpleItem::new("a", Size::new(400.0, 300.0)));
        assert_eq!(
            c.size_request().unwrap(),
            Requisition::fixed(Size::new(64.0, 48.0))
        );
    }

    #[test]
    fn test_change_notifications() {
        let mut c = container();
        let a = c.add(SimpleItem::new("a", Size::new(40.0, 30.0)));
        assert!(c.needs_resize());

        c.size_allocate(Rect::new(0.0, 0.0, 100.0, 100.0)).unwrap();
        assert!(!c.needs_resize());
        assert!(!c.in_allocation());

        c.item_mut(a)
            .unwrap()
            .set_requisition(Requisition::fixed(Size::new(80.0, 30.0)));
        assert!(c.needs_resize());
        assert!(c.needs_constraint_update());

        let applied = c.size_allocate(Rect::new(0.0, 0.0, 100.0, 100.0)).unwrap();
        assert!(approx(applied.get(a).unwrap().width, 80.0));
        assert_eq!(c.bounding_box().map(|b| b.width.round()), Some(80.0));
    }

    #[test]
    fn test_add_front_is_behind() {
        let mut c = container();
        let top = c.add(SimpleItem::new("top", Size::new(10.0, 10.0)));
        let back = c.add_front(SimpleItem::new("back", Size::new(10.0, 10.0)));

        assert_eq!(c.ids().collect::<Vec<_>>(), vec![back, top]);
        pin(&mut c, top, 0.0, 0.0);
        pin(&mut c, back, 0.0, 0.0);
        c.size_allocate(Rect::new(0.0, 0.0, 50.0, 50.0)).unwrap();
        assert_eq!(c.items_at_point(Point::new(5.0, 5.0)), vec![back, top]);
    }

    #[test]
    fn test_nested_container_reports_through_trait() {
        let mut inner = container();
        let leaf = inner.add(SimpleItem::new("leaf", Size::new(30.0, 20.0)));
        pin(&mut inner, leaf, 0.0, 0.0);

        let mut outer: ConstraintContainer<ConstraintContainer<SimpleItem>> =
            ConstraintContainer::new(LayoutConfig::default());
        let id = outer.add(inner);
        pin(&mut outer, id, 10.0, 10.0);

        outer.size_allocate(Rect::new(0.0, 0.0, 100.0, 100.0)).unwrap();
        let bbox = outer.bounding_box().unwrap();
        assert!(approx(bbox.x, 10.0) && approx(bbox.width, 30.0));
    }
}
