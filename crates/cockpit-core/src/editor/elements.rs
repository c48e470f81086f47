//! Elements and sub-elements
//!
//! Updates go through link propagation, so a direct edit on a linked entity
//! also rewrites its group. Moves re-derive order in both lists and the
//! moved entity's parent id.

use super::structure::reorder;
use super::{CockpitEditor, SaveMode};
use cockpit_link::{Origin, PropagationReport};
use cockpit_model::{
    order, Element, ElementPatch, EntityId, Ordered, SubElement, SubElementPatch,
};

impl CockpitEditor {
    /// Append an element to a category
    pub fn add_element(&self, category_id: &EntityId, name: impl Into<String>) -> Option<EntityId> {
        let name = name.into();
        self.mutate(SaveMode::Immediate, |cockpit, _| {
            let category = cockpit.category_mut(category_id)?;
            let element = Element::new(category.id.clone(), name, 0);
            let id = element.id.clone();
            order::push_last(&mut category.elements, element);
            tracing::debug!(element = %id, category = %category_id, "element added");
            Some(id)
        })
    }

    /// Apply a direct edit to an element and its link group
    pub fn update_element(&self, id: &EntityId, patch: &ElementPatch) -> PropagationReport {
        self.edit(SaveMode::Debounced, |cockpit, _| {
            let report = cockpit_link::update_element(cockpit, id, patch, Origin::Direct);
            let changed = report.changed || report.severed || !report.propagated.is_empty();
            (report, changed)
        })
        .unwrap_or_default()
    }

    pub fn delete_element(&self, id: &EntityId) -> bool {
        self.mutate(SaveMode::Immediate, |cockpit, _| {
            let location = cockpit.element_location(id)?;
            let category = cockpit.category_mut(&location.category_id)?;
            order::remove_by_id(&mut category.elements, id).map(|_| ())
        })
        .is_some()
    }

    pub fn reorder_elements(&self, category_id: &EntityId, from: usize, to: usize) -> bool {
        self.mutate(SaveMode::Debounced, |cockpit, _| {
            reorder(&mut cockpit.category_mut(category_id)?.elements, from, to)
        })
        .is_some()
    }

    /// Move an element into `category_id` at `position` (end when `None`)
    pub fn move_element(&self, id: &EntityId, category_id: &EntityId, position: Option<usize>) -> bool {
        self.mutate(SaveMode::Immediate, |cockpit, _| {
            let location = cockpit.element_location(id)?;
            cockpit.category(category_id)?;

            let source = cockpit.category_mut(&location.category_id)?;
            let mut element = order::remove_by_id(&mut source.elements, id)?;
            element.category_id = category_id.clone();

            let target = cockpit.category_mut(category_id)?;
            insert_at(&mut target.elements, element, position);
            tracing::debug!(element = %id, from = %location.category_id, to = %category_id, "element moved");
            Some(())
        })
        .is_some()
    }

    /// Append a sub-element to a sub-category
    pub fn add_sub_element(&self, sub_category_id: &EntityId, name: impl Into<String>) -> Option<EntityId> {
        let name = name.into();
        self.mutate(SaveMode::Immediate, |cockpit, _| {
            let sub_category = cockpit.sub_category_mut(sub_category_id)?;
            let sub = SubElement::new(sub_category.id.clone(), name, 0);
            let id = sub.id.clone();
            order::push_last(&mut sub_category.sub_elements, sub);
            Some(id)
        })
    }

    /// Apply a direct edit to a sub-element and its link group
    pub fn update_sub_element(&self, id: &EntityId, patch: &SubElementPatch) -> PropagationReport {
        self.edit(SaveMode::Debounced, |cockpit, _| {
            let report = cockpit_link::update_sub_element(cockpit, id, patch, Origin::Direct);
            let changed = report.changed || report.severed || !report.propagated.is_empty();
            (report, changed)
        })
        .unwrap_or_default()
    }

    pub fn delete_sub_element(&self, id: &EntityId) -> bool {
        self.mutate(SaveMode::Immediate, |cockpit, _| {
            let location = cockpit.sub_element_location(id)?;
            let sub_category = cockpit.sub_category_mut(&location.sub_category_id)?;
            order::remove_by_id(&mut sub_category.sub_elements, id).map(|_| ())
        })
        .is_some()
    }

    pub fn reorder_sub_elements(&self, sub_category_id: &EntityId, from: usize, to: usize) -> bool {
        self.mutate(SaveMode::Debounced, |cockpit, _| {
            reorder(&mut cockpit.sub_category_mut(sub_category_id)?.sub_elements, from, to)
        })
        .is_some()
    }

    /// Move a sub-element into `sub_category_id` at `position` (end when `None`)
    pub fn move_sub_element(
        &self,
        id: &EntityId,
        sub_category_id: &EntityId,
        position: Option<usize>,
    ) -> bool {
        self.mutate(SaveMode::Immediate, |cockpit, _| {
            let location = cockpit.sub_element_location(id)?;
            cockpit.sub_category(sub_category_id)?;

            let source = cockpit.sub_category_mut(&location.sub_category_id)?;
            let mut sub = order::remove_by_id(&mut source.sub_elements, id)?;
            sub.sub_category_id = sub_category_id.clone();

            let target = cockpit.sub_category_mut(sub_category_id)?;
            insert_at(&mut target.sub_elements, sub, position);
            Some(())
        })
        .is_some()
    }
}

/// Insert at `position`, clamped to the list, then reindex
fn insert_at<T: Ordered>(items: &mut Vec<T>, item: T, position: Option<usize>) {
    let idx = position.map_or(items.len(), |p| p.min(items.len()));
    items.insert(idx, item);
    order::reindex(items);
}
