//! Per-item constraint variables
//!
//! A [`ConstrainedItem`] binds one registered item to the variables describing
//! its geometry. Box packing extends it with padding and margin variables and
//! the packing options given at `pack_start`/`pack_end` time.

use bitflags::bitflags;

use super::solver::{Constraint, LinearSolver, Strength, Variable};
use super::types::{ItemId, Rect, Size};

/// Geometry variables of one registered item
#[derive(Debug, Clone)]
pub struct ConstrainedItem {
    id: ItemId,
    left: Variable,
    top: Variable,
    right: Variable,
    bottom: Variable,
    width: Variable,
    height: Variable,
    center_x: Variable,
    center_y: Variable,
    constraints: Vec<Constraint>,
}

impl ConstrainedItem {
    pub fn new(id: ItemId) -> Self {
        Self {
            id,
            left: Variable::new(),
            top: Variable::new(),
            right: Variable::new(),
            bottom: Variable::new(),
            width: Variable::new(),
            height: Variable::new(),
            center_x: Variable::new(),
            center_y: Variable::new(),
            constraints: Vec::new(),
        }
    }

    pub fn id(&self) -> ItemId {
        self.id
    }

    pub fn left(&self) -> Variable {
        self.left
    }

    pub fn top(&self) -> Variable {
        self.top
    }

    pub fn right(&self) -> Variable {
        self.right
    }

    pub fn bottom(&self) -> Variable {
        self.bottom
    }

    pub fn width(&self) -> Variable {
        self.width
    }

    pub fn height(&self) -> Variable {
        self.height
    }

    pub fn center_x(&self) -> Variable {
        self.center_x
    }

    pub fn center_y(&self) -> Variable {
        self.center_y
    }

    /// All variables owned by this item
    pub fn variables(&self) -> [Variable; 8] {
        [
            self.left,
            self.top,
            self.right,
            self.bottom,
            self.width,
            self.height,
            self.center_x,
            self.center_y,
        ]
    }

    /// Constraints contributed by the item's owner, in insertion order
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn add_constraint(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
    }

    /// Keep only the constraints for which `keep` returns true
    pub(crate) fn retain_constraints(&mut self, keep: impl FnMut(&Constraint) -> bool) {
        self.constraints.retain(keep);
    }

    /// True if `constraint` references any variable of this item
    pub fn involved(&self, constraint: &Constraint) -> bool {
        self.variables().iter().any(|&v| constraint.involves(v))
    }

    /// Width/height bounded below by the minimum size and pulled towards the natural size
    pub(crate) fn size_constraints(&self, minimum: Size, natural: Size) -> [Constraint; 4] {
        [
            Constraint::greater_or_equal(self.width, minimum.width, Strength::Required),
            Constraint::greater_or_equal(self.height, minimum.height, Strength::Required),
            Constraint::equal(self.width, natural.width, Strength::Medium),
            Constraint::equal(self.height, natural.height, Strength::Medium),
        ]
    }

    /// Edges and centers expressed from left/top and width/height
    pub(crate) fn geometry_constraints(&self) -> [Constraint; 4] {
        [
            Constraint::equal(self.right, self.left + self.width, Strength::Required),
            Constraint::equal(self.bottom, self.top + self.height, Strength::Required),
            Constraint::equal(self.center_x, self.left + self.width / 2.0, Strength::Required),
            Constraint::equal(self.center_y, self.top + self.height / 2.0, Strength::Required),
        ]
    }

    /// Read the solved rectangle back out of the solver
    pub fn allocation(&self, solver: &LinearSolver) -> Rect {
        Rect::from_edges(
            solver.value(self.left),
            solver.value(self.top),
            solver.value(self.right),
            solver.value(self.bottom),
        )
    }
}

bitflags! {
    /// How an item claims space along one axis of a box
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PackOptions: u8 {
        /// Claim a share of the leftover space
        const EXPAND = 1 << 0;
        /// Grow the item itself instead of its padding when expanding
        const FILL = 1 << 1;
        /// Allow the item to go below its natural size
        const SHRINK = 1 << 2;
        const FROM_START = 1 << 3;
        const FROM_END = 1 << 4;
    }
}

/// Packing direction of a box
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Orientation {
    #[default]
    Horizontal,
    Vertical,
}

impl Orientation {
    pub fn cross(self) -> Orientation {
        match self {
            Orientation::Horizontal => Orientation::Vertical,
            Orientation::Vertical => Orientation::Horizontal,
        }
    }

    /// Extent of `size` along this axis
    pub fn extent(self, size: Size) -> f64 {
        match self {
            Orientation::Horizontal => size.width,
            Orientation::Vertical => size.height,
        }
    }

    /// Build a size from extents along this axis and across it
    pub fn size(self, along: f64, across: f64) -> Size {
        match self {
            Orientation::Horizontal => Size::new(along, across),
            Orientation::Vertical => Size::new(across, along),
        }
    }
}

/// The variables of a box item along one axis
#[derive(Debug, Clone, Copy)]
pub struct AxisVariables {
    pub leading: Variable,
    pub trailing: Variable,
    pub size: Variable,
    pub center: Variable,
    pub leading_padding: Variable,
    pub trailing_padding: Variable,
}

/// A constrained item packed into a box
#[derive(Debug, Clone)]
pub struct BoxConstrainedItem {
    base: ConstrainedItem,
    left_margin: Variable,
    right_margin: Variable,
    top_margin: Variable,
    bottom_margin: Variable,
    left_padding: Variable,
    right_padding: Variable,
    top_padding: Variable,
    bottom_padding: Variable,
    primary: PackOptions,
    secondary: PackOptions,
}

impl BoxConstrainedItem {
    pub fn new(id: ItemId, primary: PackOptions, secondary: PackOptions) -> Self {
        Self {
            base: ConstrainedItem::new(id),
            left_margin: Variable::new(),
            right_margin: Variable::new(),
            top_margin: Variable::new(),
            bottom_margin: Variable::new(),
            left_padding: Variable::new(),
            right_padding: Variable::new(),
            top_padding: Variable::new(),
            bottom_padding: Variable::new(),
            primary,
            secondary,
        }
    }

    pub fn base(&self) -> &ConstrainedItem {
        &self.base
    }

    pub fn base_mut(&mut self) -> &mut ConstrainedItem {
        &mut self.base
    }

    pub fn primary_options(&self) -> PackOptions {
        self.primary
    }

    pub fn secondary_options(&self) -> PackOptions {
        self.secondary
    }

    pub fn left_margin(&self) -> Variable {
        self.left_margin
    }

    pub fn right_margin(&self) -> Variable {
        self.right_margin
    }

    pub fn top_margin(&self) -> Variable {
        self.top_margin
    }

    pub fn bottom_margin(&self) -> Variable {
        self.bottom_margin
    }

    pub fn left_padding(&self) -> Variable {
        self.left_padding
    }

    pub fn right_padding(&self) -> Variable {
        self.right_padding
    }

    pub fn top_padding(&self) -> Variable {
        self.top_padding
    }

    pub fn bottom_padding(&self) -> Variable {
        self.bottom_padding
    }

    /// True if `constraint` references any variable of this item
    pub fn involved(&self, constraint: &Constraint) -> bool {
        self.base.involved(constraint)
            || [
                self.left_margin,
                self.right_margin,
                self.top_margin,
                self.bottom_margin,
                self.left_padding,
                self.right_padding,
                self.top_padding,
                self.bottom_padding,
            ]
            .iter()
            .any(|&v| constraint.involves(v))
    }

    /// Variables along the given axis
    pub fn axis(&self, orientation: Orientation) -> AxisVariables {
        match orientation {
            Orientation::Horizontal => AxisVariables {
                leading: self.base.left,
                trailing: self.base.right,
                size: self.base.width,
                center: self.base.center_x,
                leading_padding: self.left_padding,
                trailing_padding: self.right_padding,
            },
            Orientation::Vertical => AxisVariables {
                leading: self.base.top,
                trailing: self.base.bottom,
                size: self.base.height,
                center: self.base.center_y,
                leading_padding: self.top_padding,
                trailing_padding: self.bottom_padding,
            },
        }
    }
}

/// The constraint record a container keeps for each registered item
#[derive(Debug, Clone)]
pub enum Packing {
    /// Positioned only by explicit constraints
    Plain(ConstrainedItem),
    /// Positioned by a box packer
    Boxed(BoxConstrainedItem),
}

impl Packing {
    pub fn base(&self) -> &ConstrainedItem {
        match self {
            Packing::Plain(item) => item,
            Packing::Boxed(item) => item.base(),
        }
    }

    pub fn base_mut(&mut self) -> &mut ConstrainedItem {
        match self {
            Packing::Plain(item) => item,
            Packing::Boxed(item) => item.base_mut(),
        }
    }

    pub fn as_boxed(&self) -> Option<&BoxConstrainedItem> {
        match self {
            Packing::Boxed(item) => Some(item),
            Packing::Plain(_) => None,
        }
    }

    pub fn involved(&self, constraint: &Constraint) -> bool {
        match self {
            Packing::Plain(item) => item.involved(constraint),
            Packing::Boxed(item) => item.involved(constraint),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_involved_detects_own_variables() {
        let a = ConstrainedItem::new(ItemId(1));
        let b = ConstrainedItem::new(ItemId(2));
        let c = Constraint::equal(a.left(), b.right() + 10.0, Strength::Required);

        assert!(a.involved(&c));
        assert!(b.involved(&c));
        assert!(!ConstrainedItem::new(ItemId(3)).involved(&c));
    }

    #[test]
    fn test_box_item_involves_padding() {
        let item = BoxConstrainedItem::new(ItemId(1), PackOptions::EXPAND, PackOptions::empty());
        let c = Constraint::equal(item.left_padding(), 4.0, Strength::Required);

        assert!(item.involved(&c));
        assert!(!item.base().involved(&c));
        assert!(Packing::Boxed(item).involved(&c));
    }

    #[test]
    fn test_axis_variables() {
        let item = BoxConstrainedItem::new(ItemId(1), PackOptions::empty(), PackOptions::empty());
        let h = item.axis(Orientation::Horizontal);
        let v = item.axis(Orientation::Vertical);

        assert_eq!(h.leading, item.base().left());
        assert_eq!(h.size, item.base().width());
        assert_eq!(v.trailing, item.base().bottom());
        assert_eq!(v.trailing_padding, item.bottom_padding());
    }

    #[test]
    fn test_orientation_extent() {
        let size = Size::new(3.0, 7.0);
        assert_eq!(Orientation::Horizontal.extent(size), 3.0);
        assert_eq!(Orientation::Vertical.extent(size), 7.0);
        assert_eq!(Orientation::Vertical.size(7.0, 3.0), size);
        assert_eq!(Orientation::Horizontal.cross(), Orientation::Vertical);
    }
}
