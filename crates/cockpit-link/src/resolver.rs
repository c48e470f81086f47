//! Link resolution
//!
//! [`LinkKind`] abstracts over the two linkable entity kinds so propagation
//! is written once. Resolution is a pure query over the tree.

use cockpit_model::{
    most_critical_status, Cockpit, Element, ElementPatch, EntityId, LinkGroupId, Linkable,
    LinkedPatch, Status, SubElement, SubElementPatch,
};

/// A linkable entity kind and how to reach it inside a cockpit
pub trait LinkKind {
    /// Entity type
    type Entity: Linkable;

    /// Patch type with this kind's mirrored allow-list
    type Patch: LinkedPatch<Target = Self::Entity>;

    /// Short label for logs
    const LABEL: &'static str;

    /// Entity by id
    fn find<'a>(cockpit: &'a Cockpit, id: &EntityId) -> Option<&'a Self::Entity>;

    /// Entity by id, mutable
    fn find_mut<'a>(cockpit: &'a mut Cockpit, id: &EntityId) -> Option<&'a mut Self::Entity>;

    /// Every member of `group`, in document order
    fn members(cockpit: &Cockpit, group: &LinkGroupId) -> Vec<EntityId>;

    /// Remove the entity from its group; returns false if not found
    fn sever(cockpit: &mut Cockpit, id: &EntityId) -> bool;
}

/// Elements
#[derive(Debug, Clone, Copy, Default)]
pub struct Elements;

impl LinkKind for Elements {
    type Entity = Element;
    type Patch = ElementPatch;
    const LABEL: &'static str = "element";

    fn find<'a>(cockpit: &'a Cockpit, id: &EntityId) -> Option<&'a Element> {
        cockpit.element(id)
    }

    fn find_mut<'a>(cockpit: &'a mut Cockpit, id: &EntityId) -> Option<&'a mut Element> {
        cockpit.element_mut(id)
    }

    fn members(cockpit: &Cockpit, group: &LinkGroupId) -> Vec<EntityId> {
        cockpit.element_group_members(group)
    }

    /// Severs the element and every sub-element it owns
    fn sever(cockpit: &mut Cockpit, id: &EntityId) -> bool {
        match cockpit.element_mut(id) {
            Some(element) => {
                element.sever_links();
                true
            }
            None => false,
        }
    }
}

/// Sub-elements
#[derive(Debug, Clone, Copy, Default)]
pub struct SubElements;

impl LinkKind for SubElements {
    type Entity = SubElement;
    type Patch = SubElementPatch;
    const LABEL: &'static str = "sub_element";

    fn find<'a>(cockpit: &'a Cockpit, id: &EntityId) -> Option<&'a SubElement> {
        cockpit.sub_element(id)
    }

    fn find_mut<'a>(cockpit: &'a mut Cockpit, id: &EntityId) -> Option<&'a mut SubElement> {
        cockpit.sub_element_mut(id)
    }

    fn members(cockpit: &Cockpit, group: &LinkGroupId) -> Vec<EntityId> {
        cockpit.sub_element_group_members(group)
    }

    fn sever(cockpit: &mut Cockpit, id: &EntityId) -> bool {
        match cockpit.sub_element_mut(id) {
            Some(sub) => {
                sub.linked_group_id = None;
                true
            }
            None => false,
        }
    }
}

/// Other members of `id`'s link group, in document order
///
/// Empty when the entity is missing or unlinked.
#[must_use]
pub fn siblings<K: LinkKind>(cockpit: &Cockpit, id: &EntityId) -> Vec<EntityId> {
    let Some(group) = K::find(cockpit, id).and_then(|e| e.linked_group_id().cloned()) else {
        return Vec::new();
    };
    K::members(cockpit, &group)
        .into_iter()
        .filter(|member| member != id)
        .collect()
}

/// Element siblings
#[inline]
#[must_use]
pub fn element_siblings(cockpit: &Cockpit, id: &EntityId) -> Vec<EntityId> {
    siblings::<Elements>(cockpit, id)
}

/// Sub-element siblings
#[inline]
#[must_use]
pub fn sub_element_siblings(cockpit: &Cockpit, id: &EntityId) -> Vec<EntityId> {
    siblings::<SubElements>(cockpit, id)
}

/// Most severe status among `members`, starting from `seed`
#[must_use]
pub fn merged_status<K: LinkKind>(cockpit: &Cockpit, members: &[EntityId], seed: Status) -> Status {
    members
        .iter()
        .filter_map(|id| K::find(cockpit, id))
        .map(Linkable::status)
        .fold(seed, most_critical_status)
}

/// Sibling with the most severe status
///
/// Ties keep the earliest sibling in document order.
#[must_use]
pub fn most_critical_sibling<K: LinkKind>(cockpit: &Cockpit, id: &EntityId) -> Option<EntityId> {
    let mut best: Option<(EntityId, Status)> = None;
    for sibling in siblings::<K>(cockpit, id) {
        let Some(status) = K::find(cockpit, &sibling).map(Linkable::status) else {
            continue;
        };
        let replace = match &best {
            Some((_, current)) => most_critical_status(*current, status) != *current,
            None => true,
        };
        if replace {
            best = Some((sibling, status));
        }
    }
    best.map(|(sibling, _)| sibling)
}
