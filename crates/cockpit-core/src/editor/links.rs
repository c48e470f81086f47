//! Link groups and duplication from the editor
//!
//! All of these save immediately.

use super::{CockpitEditor, SaveMode};
use cockpit_link::{LinkOptions, LinkReport};
use cockpit_model::EntityId;

impl CockpitEditor {
    /// Link element `target` into the group of element `source`
    pub fn link_element(
        &self,
        target: &EntityId,
        source: &EntityId,
        options: LinkOptions,
    ) -> Option<LinkReport> {
        self.mutate(SaveMode::Immediate, |cockpit, _| {
            cockpit_link::link_element(cockpit, target, source, options)
        })
    }

    /// Link sub-element `target` into the group of sub-element `source`
    pub fn link_sub_element(&self, target: &EntityId, source: &EntityId) -> Option<LinkReport> {
        self.mutate(SaveMode::Immediate, |cockpit, _| {
            cockpit_link::link_sub_element(cockpit, target, source)
        })
    }

    /// Take an element (and its sub-elements) out of their groups
    pub fn unlink_element(&self, id: &EntityId) -> bool {
        self.mutate(SaveMode::Immediate, |cockpit, _| {
            cockpit_link::unlink_element(cockpit, id).then_some(())
        })
        .is_some()
    }

    pub fn unlink_sub_element(&self, id: &EntityId) -> bool {
        self.mutate(SaveMode::Immediate, |cockpit, _| {
            cockpit_link::unlink_sub_element(cockpit, id).then_some(())
        })
        .is_some()
    }

    /// Copy an element into `into` (or beside itself), unlinked
    pub fn duplicate_element(&self, id: &EntityId, into: Option<&EntityId>) -> Option<EntityId> {
        self.mutate(SaveMode::Immediate, |cockpit, _| {
            cockpit_link::duplicate_element(cockpit, id, into)
        })
    }

    /// Copy an element and link the copy with the original
    pub fn duplicate_element_linked(
        &self,
        id: &EntityId,
        into: Option<&EntityId>,
        options: LinkOptions,
    ) -> Option<EntityId> {
        self.mutate(SaveMode::Immediate, |cockpit, _| {
            cockpit_link::duplicate_element_linked(cockpit, id, into, options)
        })
    }

    /// Copy a sub-element and link the copy with the original
    pub fn duplicate_sub_element_linked(
        &self,
        id: &EntityId,
        into: Option<&EntityId>,
    ) -> Option<EntityId> {
        self.mutate(SaveMode::Immediate, |cockpit, _| {
            cockpit_link::duplicate_sub_element_linked(cockpit, id, into)
        })
    }

    /// Other members of an element's link group
    #[must_use]
    pub fn element_siblings(&self, id: &EntityId) -> Vec<EntityId> {
        self.with_current(|cockpit| cockpit_link::element_siblings(cockpit, id))
            .unwrap_or_default()
    }

    /// Other members of a sub-element's link group
    #[must_use]
    pub fn sub_element_siblings(&self, id: &EntityId) -> Vec<EntityId> {
        self.with_current(|cockpit| cockpit_link::sub_element_siblings(cockpit, id))
            .unwrap_or_default()
    }
}
