//! Containers: the cockpit itself, domains, categories, sub-categories and
//! map points
//!
//! New entities are appended as the last sibling. Deletes and reorders
//! leave every sibling list densely ordered.

use super::{CockpitEditor, SaveMode};
use cockpit_model::{
    order, Category, ContainerPatch, Domain, DomainPatch, EntityId, GeoPoint, MapElement,
    MapElementPatch, Ordered, Status, SubCategory, TemplateType,
};

impl CockpitEditor {
    /// Rename the current cockpit
    pub fn rename_cockpit(&self, name: impl Into<String>) -> bool {
        let name = name.into();
        self.mutate(SaveMode::Debounced, |cockpit, _| {
            (cockpit.name != name).then(|| cockpit.name = name)
        })
        .is_some()
    }

    // Domains

    /// Append a domain
    pub fn add_domain(&self, name: impl Into<String>, template_type: TemplateType) -> Option<EntityId> {
        let name = name.into();
        self.mutate(SaveMode::Immediate, |cockpit, _| {
            let domain = Domain::new(name, template_type, 0);
            let id = domain.id.clone();
            order::push_last(&mut cockpit.domains, domain);
            tracing::debug!(domain = %id, "domain added");
            Some(id)
        })
    }

    pub fn update_domain(&self, id: &EntityId, patch: &DomainPatch) -> bool {
        self.mutate(SaveMode::Debounced, |cockpit, _| {
            patch.apply_to(cockpit.domain_mut(id)?).then_some(())
        })
        .is_some()
    }

    /// Delete a domain with everything it owns
    pub fn delete_domain(&self, id: &EntityId) -> bool {
        self.mutate(SaveMode::Immediate, |cockpit, _| {
            order::remove_by_id(&mut cockpit.domains, id).map(|_| ())
        })
        .is_some()
    }

    /// Move the domain at `from` to `to`
    pub fn reorder_domains(&self, from: usize, to: usize) -> bool {
        self.mutate(SaveMode::Debounced, |cockpit, _| reorder(&mut cockpit.domains, from, to))
            .is_some()
    }

    // Categories

    /// Append a category to a domain
    pub fn add_category(&self, domain_id: &EntityId, name: impl Into<String>) -> Option<EntityId> {
        let name = name.into();
        self.mutate(SaveMode::Immediate, |cockpit, _| {
            let domain = cockpit.domain_mut(domain_id)?;
            let category = Category::new(domain.id.clone(), name, 0);
            let id = category.id.clone();
            order::push_last(&mut domain.categories, category);
            Some(id)
        })
    }

    pub fn update_category(&self, id: &EntityId, patch: &ContainerPatch) -> bool {
        self.mutate(SaveMode::Debounced, |cockpit, _| {
            patch.apply_to_category(cockpit.category_mut(id)?).then_some(())
        })
        .is_some()
    }

    pub fn delete_category(&self, id: &EntityId) -> bool {
        self.mutate(SaveMode::Immediate, |cockpit, _| {
            let domain_id = cockpit.category(id)?.domain_id.clone();
            let domain = cockpit.domain_mut(&domain_id)?;
            order::remove_by_id(&mut domain.categories, id).map(|_| ())
        })
        .is_some()
    }

    pub fn reorder_categories(&self, domain_id: &EntityId, from: usize, to: usize) -> bool {
        self.mutate(SaveMode::Debounced, |cockpit, _| {
            reorder(&mut cockpit.domain_mut(domain_id)?.categories, from, to)
        })
        .is_some()
    }

    // Sub-categories

    /// Append a sub-category to an element
    pub fn add_sub_category(&self, element_id: &EntityId, name: impl Into<String>) -> Option<EntityId> {
        let name = name.into();
        self.mutate(SaveMode::Immediate, |cockpit, _| {
            let element = cockpit.element_mut(element_id)?;
            let sub_category = SubCategory::new(element.id.clone(), name, 0);
            let id = sub_category.id.clone();
            order::push_last(&mut element.sub_categories, sub_category);
            Some(id)
        })
    }

    pub fn update_sub_category(&self, id: &EntityId, patch: &ContainerPatch) -> bool {
        self.mutate(SaveMode::Debounced, |cockpit, _| {
            patch.apply_to_sub_category(cockpit.sub_category_mut(id)?).then_some(())
        })
        .is_some()
    }

    pub fn delete_sub_category(&self, id: &EntityId) -> bool {
        self.mutate(SaveMode::Immediate, |cockpit, _| {
            let element_id = cockpit.sub_category(id)?.element_id.clone();
            let element = cockpit.element_mut(&element_id)?;
            order::remove_by_id(&mut element.sub_categories, id).map(|_| ())
        })
        .is_some()
    }

    pub fn reorder_sub_categories(&self, element_id: &EntityId, from: usize, to: usize) -> bool {
        self.mutate(SaveMode::Debounced, |cockpit, _| {
            reorder(&mut cockpit.element_mut(element_id)?.sub_categories, from, to)
        })
        .is_some()
    }

    // Map points

    /// Add a point to a domain's map
    pub fn add_map_element(
        &self,
        domain_id: &EntityId,
        name: impl Into<String>,
        point: GeoPoint,
    ) -> Option<EntityId> {
        let name = name.into();
        self.mutate(SaveMode::Immediate, |cockpit, _| {
            let domain = cockpit.domain_mut(domain_id)?;
            let map_element = MapElement::new(domain.id.clone(), name, point);
            let id = map_element.id.clone();
            domain.map_elements.push(map_element);
            Some(id)
        })
    }

    pub fn update_map_element(&self, id: &EntityId, patch: &MapElementPatch) -> bool {
        self.mutate(SaveMode::Debounced, |cockpit, _| {
            patch.apply_to(cockpit.map_element_mut(id)?).then_some(())
        })
        .is_some()
    }

    pub fn delete_map_element(&self, id: &EntityId) -> bool {
        self.mutate(SaveMode::Immediate, |cockpit, _| {
            cockpit.domains.iter_mut().find_map(|domain| {
                let idx = order::position_of(&domain.map_elements, id)?;
                domain.map_elements.remove(idx);
                Some(())
            })
        })
        .is_some()
    }

    /// Set every element and sub-element of a domain back to `ok`
    ///
    /// Local to the domain: linked copies elsewhere keep their status.
    /// Returns how many entities changed.
    pub fn reset_statuses(&self, domain_id: &EntityId) -> usize {
        self.mutate(SaveMode::Immediate, |cockpit, _| {
            let domain = cockpit.domain_mut(domain_id)?;
            let mut reset = 0usize;
            for element in domain.categories.iter_mut().flat_map(|c| c.elements.iter_mut()) {
                reset += usize::from(set_ok(&mut element.status));
                for sub in element.sub_elements_mut() {
                    reset += usize::from(set_ok(&mut sub.status));
                }
            }
            tracing::info!(domain = %domain_id, reset, "statuses reset");
            (reset > 0).then_some(reset)
        })
        .unwrap_or(0)
    }
}

fn set_ok(status: &mut Status) -> bool {
    let changed = *status != Status::Ok;
    *status = Status::Ok;
    changed
}

/// Move `from` to `to`; `None` on bad indices or a no-op move
pub(super) fn reorder<T: Ordered>(items: &mut Vec<T>, from: usize, to: usize) -> Option<()> {
    if from == to {
        return None;
    }
    match order::move_item(items, from, to) {
        Ok(()) => Some(()),
        Err(e) => {
            tracing::debug!(error = %e, "reorder ignored");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cockpit_model::order::is_dense;

    #[test]
    fn reorder_rejects_bad_indices() {
        let mut domains: Vec<Domain> = (0..3)
            .map(|i| Domain::new(format!("d{i}"), TemplateType::Standard, i))
            .collect();
        assert!(reorder(&mut domains, 0, 3).is_none());
        assert!(reorder(&mut domains, 1, 1).is_none());
        assert!(reorder(&mut domains, 2, 0).is_some());
        assert_eq!(domains[0].name, "d2");
        assert!(is_dense(&domains));
    }
}
