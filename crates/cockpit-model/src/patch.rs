//! Shallow field-merge updates
//!
//! A patch names only the fields an update touches. `None` leaves a field
//! alone; for nullable fields `Some(None)` clears it.
//!
//! Linked entity patches ([`ElementPatch`], [`SubElementPatch`]) also define
//! the mirrored subset: the fields copied onto other members of a link group.
//! Name, position, size and structure are never mirrored.

use crate::cockpit::{Category, Domain, GeoPoint, MapBounds, MapElement, TemplateType};
use crate::element::{Element, Linkable, Orientation, Position, Size, SubCategory, SubElement};
use crate::id::EntityId;
use crate::status::Status;

/// Overwrite `slot` when the patch carries a different value
fn set<T: PartialEq + Clone>(slot: &mut T, value: Option<&T>) -> bool {
    match value {
        Some(v) if slot != v => {
            *slot = v.clone();
            true
        }
        _ => false,
    }
}

/// Patch over a linkable entity kind
pub trait LinkedPatch: Clone + Default + std::fmt::Debug {
    /// Entity this patch applies to
    type Target: Linkable;

    /// Merge into `target`; returns whether anything changed
    fn apply_to(&self, target: &mut Self::Target) -> bool;

    /// Requested new name, if any
    fn new_name(&self) -> Option<&str>;

    /// Requested status, if any
    fn status(&self) -> Option<Status>;

    /// Replace the requested status
    fn set_status(&mut self, status: Status);

    /// Restrict to the mirrored allow-list
    #[must_use]
    fn mirrored(&self) -> Self;

    /// Mirrored fields of `target` as a patch
    fn mirror_of(target: &Self::Target) -> Self;

    /// True when no field is set
    fn is_empty(&self) -> bool;
}

/// Update for an [`Element`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementPatch {
    pub name: Option<String>,
    pub status: Option<Status>,
    pub icon: Option<Option<String>>,
    pub icon2: Option<Option<String>>,
    pub icon3: Option<Option<String>>,
    pub value: Option<Option<String>>,
    pub unit: Option<Option<String>>,
    pub show_value: Option<bool>,
    pub position: Option<Option<Position>>,
    pub size: Option<Option<Size>>,
}

impl ElementPatch {
    /// Empty patch
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[inline]
    #[must_use]
    pub fn with_status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    #[inline]
    #[must_use]
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(Some(icon.into()));
        self
    }

    #[inline]
    #[must_use]
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(Some(value.into()));
        self
    }

    #[inline]
    #[must_use]
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(Some(unit.into()));
        self
    }

    #[inline]
    #[must_use]
    pub fn with_show_value(mut self, show: bool) -> Self {
        self.show_value = Some(show);
        self
    }

    #[inline]
    #[must_use]
    pub fn with_position(mut self, position: Position) -> Self {
        self.position = Some(Some(position));
        self
    }
}

impl LinkedPatch for ElementPatch {
    type Target = Element;

    fn apply_to(&self, target: &mut Element) -> bool {
        let mut changed = false;
        changed |= set(&mut target.name, self.name.as_ref());
        changed |= set(&mut target.status, self.status.as_ref());
        changed |= set(&mut target.icon, self.icon.as_ref());
        changed |= set(&mut target.icon2, self.icon2.as_ref());
        changed |= set(&mut target.icon3, self.icon3.as_ref());
        changed |= set(&mut target.value, self.value.as_ref());
        changed |= set(&mut target.unit, self.unit.as_ref());
        changed |= set(&mut target.show_value, self.show_value.as_ref());
        changed |= set(&mut target.position, self.position.as_ref());
        changed |= set(&mut target.size, self.size.as_ref());
        changed
    }

    fn new_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn status(&self) -> Option<Status> {
        self.status
    }

    fn set_status(&mut self, status: Status) {
        self.status = Some(status);
    }

    fn mirrored(&self) -> Self {
        Self {
            status: self.status,
            icon: self.icon.clone(),
            icon2: self.icon2.clone(),
            icon3: self.icon3.clone(),
            value: self.value.clone(),
            unit: self.unit.clone(),
            show_value: self.show_value,
            ..Self::default()
        }
    }

    fn mirror_of(target: &Element) -> Self {
        Self {
            status: Some(target.status),
            icon: Some(target.icon.clone()),
            icon2: Some(target.icon2.clone()),
            icon3: Some(target.icon3.clone()),
            value: Some(target.value.clone()),
            unit: Some(target.unit.clone()),
            show_value: Some(target.show_value),
            ..Self::default()
        }
    }

    fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Update for a [`SubElement`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubElementPatch {
    pub name: Option<String>,
    pub status: Option<Status>,
    pub icon: Option<Option<String>>,
    pub value: Option<Option<String>>,
    pub unit: Option<Option<String>>,
}

impl SubElementPatch {
    /// Empty patch
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[inline]
    #[must_use]
    pub fn with_status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    #[inline]
    #[must_use]
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(Some(value.into()));
        self
    }
}

impl LinkedPatch for SubElementPatch {
    type Target = SubElement;

    fn apply_to(&self, target: &mut SubElement) -> bool {
        let mut changed = false;
        changed |= set(&mut target.name, self.name.as_ref());
        changed |= set(&mut target.status, self.status.as_ref());
        changed |= set(&mut target.icon, self.icon.as_ref());
        changed |= set(&mut target.value, self.value.as_ref());
        changed |= set(&mut target.unit, self.unit.as_ref());
        changed
    }

    fn new_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn status(&self) -> Option<Status> {
        self.status
    }

    fn set_status(&mut self, status: Status) {
        self.status = Some(status);
    }

    fn mirrored(&self) -> Self {
        Self {
            name: None,
            ..self.clone()
        }
    }

    fn mirror_of(target: &SubElement) -> Self {
        Self {
            name: None,
            status: Some(target.status),
            icon: Some(target.icon.clone()),
            value: Some(target.value.clone()),
            unit: Some(target.unit.clone()),
        }
    }

    fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Update for a [`Domain`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DomainPatch {
    pub name: Option<String>,
    pub template_type: Option<TemplateType>,
    pub map_bounds: Option<Option<MapBounds>>,
    pub background_image: Option<Option<String>>,
}

impl DomainPatch {
    /// Merge into `domain`; returns whether anything changed
    pub fn apply_to(&self, domain: &mut Domain) -> bool {
        let mut changed = false;
        changed |= set(&mut domain.name, self.name.as_ref());
        changed |= set(&mut domain.template_type, self.template_type.as_ref());
        changed |= set(&mut domain.map_bounds, self.map_bounds.as_ref());
        changed |= set(&mut domain.background_image, self.background_image.as_ref());
        changed
    }
}

/// Update for a [`Category`] or [`SubCategory`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerPatch {
    pub name: Option<String>,
    pub orientation: Option<Orientation>,
}

impl ContainerPatch {
    /// Merge into a category
    pub fn apply_to_category(&self, category: &mut Category) -> bool {
        set(&mut category.name, self.name.as_ref()) | set(&mut category.orientation, self.orientation.as_ref())
    }

    /// Merge into a sub-category
    pub fn apply_to_sub_category(&self, sub_category: &mut SubCategory) -> bool {
        set(&mut sub_category.name, self.name.as_ref())
            | set(&mut sub_category.orientation, self.orientation.as_ref())
    }
}

/// Update for a [`MapElement`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapElementPatch {
    pub name: Option<String>,
    pub point: Option<GeoPoint>,
    pub status: Option<Status>,
    pub icon: Option<Option<String>>,
    pub element_id: Option<Option<EntityId>>,
}

impl MapElementPatch {
    /// Merge into `point`; returns whether anything changed
    pub fn apply_to(&self, point: &mut MapElement) -> bool {
        let mut changed = false;
        changed |= set(&mut point.name, self.name.as_ref());
        if let Some(p) = self.point {
            if point.point() != p {
                point.lat = p.lat;
                point.lng = p.lng;
                changed = true;
            }
        }
        changed |= set(&mut point.status, self.status.as_ref());
        changed |= set(&mut point.icon, self.icon.as_ref());
        changed |= set(&mut point.element_id, self.element_id.as_ref());
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn element_patch_merges_shallowly() {
        let mut element = Element::new(EntityId::new("c"), "Pump", 0);
        element.unit = Some("bar".into());

        let patch = ElementPatch::new().with_status(Status::Minor).with_value("3");
        assert!(patch.apply_to(&mut element));

        assert_eq!(element.status, Status::Minor);
        assert_eq!(element.value.as_deref(), Some("3"));
        assert_eq!(element.unit.as_deref(), Some("bar"));
        assert!(!patch.apply_to(&mut element));
    }

    #[test]
    fn mirrored_subset_drops_name_and_layout() {
        let patch = ElementPatch::new()
            .with_name("Other")
            .with_status(Status::Fatal)
            .with_position(Position { x: 1.0, y: 2.0 })
            .with_icon("pump");

        let mirrored = patch.mirrored();

        assert_eq!(mirrored.name, None);
        assert_eq!(mirrored.position, None);
        assert_eq!(mirrored.status, Some(Status::Fatal));
        assert_eq!(mirrored.icon, Some(Some("pump".to_string())));
    }

    #[test]
    fn name_only_patch_has_empty_mirror() {
        assert!(ElementPatch::new().with_name("x").mirrored().is_empty());
        assert!(SubElementPatch::new().with_name("x").mirrored().is_empty());
    }

    #[test]
    fn mirror_of_copies_every_mirrored_field() {
        let mut element = Element::new(EntityId::new("c"), "Pump", 0);
        element.icon = Some("pump".into());
        element.status = Status::Critical;
        let mut other = Element::new(EntityId::new("c2"), "Other", 3);

        ElementPatch::mirror_of(&element).apply_to(&mut other);

        assert_eq!(other.icon, element.icon);
        assert_eq!(other.status, Status::Critical);
        assert_eq!(other.name, "Other");
    }

    #[test]
    fn nullable_fields_can_be_cleared() {
        let mut se = SubElement::new(EntityId::new("sc"), "V1", 0);
        se.value = Some("12".into());
        let patch = SubElementPatch {
            value: Some(None),
            ..SubElementPatch::default()
        };
        assert!(patch.apply_to(&mut se));
        assert_eq!(se.value, None);
    }

    #[test]
    fn map_patch_moves_point() {
        let mut point = MapElement::new(EntityId::new("d"), "Site", GeoPoint::new(1.0, 1.0));
        let patch = MapElementPatch {
            point: Some(GeoPoint::new(2.0, 3.0)),
            ..MapElementPatch::default()
        };
        assert!(patch.apply_to(&mut point));
        assert_eq!(point.point(), GeoPoint::new(2.0, 3.0));
    }
}
