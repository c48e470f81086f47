//! Structural copies with fresh identity
//!
//! A fresh copy regenerates every id in the copied subtree, rewrites parent
//! ids to point at the new ancestors, and clears every `linkedGroupId`.
//! Callers that want the copy linked assign group ids afterwards.

use crate::element::{Element, SubCategory, SubElement};
use crate::id::EntityId;

impl SubElement {
    /// Copy into `sub_category_id` with a fresh id and no link
    #[must_use]
    pub fn fresh_copy(&self, sub_category_id: &EntityId) -> Self {
        Self {
            id: EntityId::generate(),
            linked_group_id: None,
            sub_category_id: sub_category_id.clone(),
            ..self.clone()
        }
    }
}

impl SubCategory {
    /// Copy into `element_id`, regenerating every descendant id
    #[must_use]
    pub fn fresh_copy(&self, element_id: &EntityId) -> Self {
        let id = EntityId::generate();
        let sub_elements = self.sub_elements.iter().map(|se| se.fresh_copy(&id)).collect();
        Self {
            id,
            name: self.name.clone(),
            order: self.order,
            orientation: self.orientation,
            element_id: element_id.clone(),
            sub_elements,
            extra: self.extra.clone(),
        }
    }
}

impl Element {
    /// Copy into `category_id`, regenerating every descendant id and
    /// clearing all links
    #[must_use]
    pub fn fresh_copy(&self, category_id: &EntityId) -> Self {
        let id = EntityId::generate();
        let sub_categories = self
            .sub_categories
            .iter()
            .map(|sc| sc.fresh_copy(&id))
            .collect();
        Self {
            id,
            linked_group_id: None,
            category_id: category_id.clone(),
            sub_categories,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::LinkGroupId;
    use crate::status::Status;

    #[test]
    fn element_copy_regenerates_ids_and_severs_links() {
        let mut element = Element::new(EntityId::new("c1"), "Pump", 2).with_status(Status::Minor);
        element.linked_group_id = Some(LinkGroupId::new("g"));
        let mut sc = SubCategory::new(element.id.clone(), "Valves", 0);
        let mut se = SubElement::new(sc.id.clone(), "V1", 0);
        se.linked_group_id = Some(LinkGroupId::new("g2"));
        sc.sub_elements.push(se);
        element.sub_categories.push(sc);

        let copy = element.fresh_copy(&EntityId::new("c2"));

        assert_ne!(copy.id, element.id);
        assert_eq!(copy.name, element.name);
        assert_eq!(copy.status, Status::Minor);
        assert_eq!(copy.category_id.as_str(), "c2");
        assert!(copy.linked_group_id.is_none());

        let copy_sc = &copy.sub_categories[0];
        assert_ne!(copy_sc.id, element.sub_categories[0].id);
        assert_eq!(copy_sc.element_id, copy.id);
        let copy_se = &copy_sc.sub_elements[0];
        assert_ne!(copy_se.id, element.sub_categories[0].sub_elements[0].id);
        assert_eq!(copy_se.sub_category_id, copy_sc.id);
        assert!(copy_se.linked_group_id.is_none());
    }
}
