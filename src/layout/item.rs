//! The interface between containers and the scene items they manage

use super::types::{Point, Rect, Requisition, Size};

/// A scene item that can be sized and positioned by a container.
///
/// Rectangles passed to [`LayoutItem::size_allocate`] are in the parent's
/// coordinate space; [`LayoutItem::bounding_box`] is in the item's own space and
/// is mapped back with [`LayoutItem::item_to_parent`].
pub trait LayoutItem {
    /// Minimum and natural size of the item
    fn preferred_size(&mut self) -> Requisition;

    /// Give the item its final geometry
    fn size_allocate(&mut self, allocation: Rect);

    /// Extent of the item in its own coordinates, `None` if it draws nothing
    fn bounding_box(&self) -> Option<Rect>;

    fn item_to_parent(&self, rect: Rect) -> Rect {
        rect
    }

    fn visible(&self) -> bool {
        true
    }

    /// Bounding box expressed in the parent's coordinates
    fn bounding_box_in_parent(&self) -> Option<Rect> {
        self.bounding_box().map(|bbox| self.item_to_parent(bbox))
    }
}

impl<T: LayoutItem + ?Sized> LayoutItem for Box<T> {
    fn preferred_size(&mut self) -> Requisition {
        (**self).preferred_size()
    }

    fn size_allocate(&mut self, allocation: Rect) {
        (**self).size_allocate(allocation)
    }

    fn bounding_box(&self) -> Option<Rect> {
        (**self).bounding_box()
    }

    fn item_to_parent(&self, rect: Rect) -> Rect {
        (**self).item_to_parent(rect)
    }

    fn visible(&self) -> bool {
        (**self).visible()
    }
}

/// A leaf item with a fixed requisition.
///
/// It takes whatever geometry it is allocated: the allocation origin becomes
/// its position in the parent and the allocation size its extent.
#[derive(Debug, Clone, PartialEq)]
pub struct SimpleItem {
    name: String,
    requisition: Requisition,
    position: Point,
    size: Size,
    visible: bool,
    allocations: usize,
}

impl SimpleItem {
    /// Item whose minimum and natural size are both `natural`
    pub fn new(name: impl Into<String>, natural: Size) -> Self {
        Self::with_requisition(name, Requisition::fixed(natural))
    }

    pub fn with_requisition(name: impl Into<String>, requisition: Requisition) -> Self {
        Self {
            name: name.into(),
            requisition,
            position: Point::default(),
            size: requisition.natural,
            visible: true,
            allocations: 0,
        }
    }

    /// Builder-style variant of [`SimpleItem::set_position`]
    pub fn at(mut self, position: Point) -> Self {
        self.position = position;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn requisition(&self) -> Requisition {
        self.requisition
    }

    pub fn set_requisition(&mut self, requisition: Requisition) {
        self.requisition = requisition;
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn set_position(&mut self, position: Point) {
        self.position = position;
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Geometry in the parent's coordinates
    pub fn allocation(&self) -> Rect {
        Rect::from_size(self.size).translate(self.position)
    }

    /// How many times a container has allocated this item
    pub fn allocation_count(&self) -> usize {
        self.allocations
    }
}

impl LayoutItem for SimpleItem {
    fn preferred_size(&mut self) -> Requisition {
        self.requisition
    }

    fn size_allocate(&mut self, allocation: Rect) {
        self.position = allocation.origin();
        self.size = allocation.size();
        self.allocations += 1;
    }

    fn bounding_box(&self) -> Option<Rect> {
        let bbox = Rect::from_size(self.size);
        (!bbox.is_empty()).then_some(bbox)
    }

    fn item_to_parent(&self, rect: Rect) -> Rect {
        rect.translate(self.position)
    }

    fn visible(&self) -> bool {
        self.visible
    }
}
