//! Tree navigation over a [`Cockpit`]
//!
//! Lookups are linear scans of the owned hierarchy. Documents are edited
//! interactively, so O(tree size) per call is fine.

use crate::cockpit::{Category, Cockpit, Domain, MapElement};
use crate::element::{Element, SubCategory, SubElement};
use crate::id::{EntityId, LinkGroupId};
use crate::order;

/// Where an element lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementLocation {
    pub domain_id: EntityId,
    pub category_id: EntityId,
}

/// Where a sub-element lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubElementLocation {
    pub domain_id: EntityId,
    pub category_id: EntityId,
    pub element_id: EntityId,
    pub sub_category_id: EntityId,
}

impl Cockpit {
    /// Domain by id
    #[must_use]
    pub fn domain(&self, id: &EntityId) -> Option<&Domain> {
        self.domains.iter().find(|d| &d.id == id)
    }

    /// Domain by id, mutable
    pub fn domain_mut(&mut self, id: &EntityId) -> Option<&mut Domain> {
        self.domains.iter_mut().find(|d| &d.id == id)
    }

    /// Every category in document order
    pub fn categories(&self) -> impl Iterator<Item = &Category> {
        self.domains.iter().flat_map(|d| d.categories.iter())
    }

    /// Category by id
    #[must_use]
    pub fn category(&self, id: &EntityId) -> Option<&Category> {
        self.categories().find(|c| &c.id == id)
    }

    /// Category by id, mutable
    pub fn category_mut(&mut self, id: &EntityId) -> Option<&mut Category> {
        self.domains
            .iter_mut()
            .flat_map(|d| d.categories.iter_mut())
            .find(|c| &c.id == id)
    }

    /// Every element in document order
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.categories().flat_map(|c| c.elements.iter())
    }

    /// Every element, mutable
    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.domains
            .iter_mut()
            .flat_map(|d| d.categories.iter_mut())
            .flat_map(|c| c.elements.iter_mut())
    }

    /// Element by id
    #[must_use]
    pub fn element(&self, id: &EntityId) -> Option<&Element> {
        self.elements().find(|e| &e.id == id)
    }

    /// Element by id, mutable
    pub fn element_mut(&mut self, id: &EntityId) -> Option<&mut Element> {
        self.elements_mut().find(|e| &e.id == id)
    }

    /// Domain and category holding an element
    #[must_use]
    pub fn element_location(&self, id: &EntityId) -> Option<ElementLocation> {
        self.domains.iter().find_map(|d| {
            d.categories.iter().find_map(|c| {
                c.elements.iter().any(|e| &e.id == id).then(|| ElementLocation {
                    domain_id: d.id.clone(),
                    category_id: c.id.clone(),
                })
            })
        })
    }

    /// Sub-category by id, mutable
    pub fn sub_category_mut(&mut self, id: &EntityId) -> Option<&mut SubCategory> {
        self.elements_mut()
            .flat_map(|e| e.sub_categories.iter_mut())
            .find(|sc| &sc.id == id)
    }

    /// Sub-category by id
    #[must_use]
    pub fn sub_category(&self, id: &EntityId) -> Option<&SubCategory> {
        self.elements()
            .flat_map(|e| e.sub_categories.iter())
            .find(|sc| &sc.id == id)
    }

    /// Every sub-element in document order
    pub fn sub_elements(&self) -> impl Iterator<Item = &SubElement> {
        self.elements().flat_map(Element::sub_elements)
    }

    /// Every sub-element, mutable
    pub fn sub_elements_mut(&mut self) -> impl Iterator<Item = &mut SubElement> {
        self.elements_mut().flat_map(Element::sub_elements_mut)
    }

    /// Sub-element by id
    #[must_use]
    pub fn sub_element(&self, id: &EntityId) -> Option<&SubElement> {
        self.sub_elements().find(|se| &se.id == id)
    }

    /// Sub-element by id, mutable
    pub fn sub_element_mut(&mut self, id: &EntityId) -> Option<&mut SubElement> {
        self.sub_elements_mut().find(|se| &se.id == id)
    }

    /// Full parent chain of a sub-element
    #[must_use]
    pub fn sub_element_location(&self, id: &EntityId) -> Option<SubElementLocation> {
        for d in &self.domains {
            for c in &d.categories {
                for e in &c.elements {
                    for sc in &e.sub_categories {
                        if sc.sub_elements.iter().any(|se| &se.id == id) {
                            return Some(SubElementLocation {
                                domain_id: d.id.clone(),
                                category_id: c.id.clone(),
                                element_id: e.id.clone(),
                                sub_category_id: sc.id.clone(),
                            });
                        }
                    }
                }
            }
        }
        None
    }

    /// Map element by id, mutable
    pub fn map_element_mut(&mut self, id: &EntityId) -> Option<&mut MapElement> {
        self.domains
            .iter_mut()
            .flat_map(|d| d.map_elements.iter_mut())
            .find(|m| &m.id == id)
    }

    /// Map element by id
    #[must_use]
    pub fn map_element(&self, id: &EntityId) -> Option<&MapElement> {
        self.domains
            .iter()
            .flat_map(|d| d.map_elements.iter())
            .find(|m| &m.id == id)
    }

    /// Ids of every element in a link group, in document order
    #[must_use]
    pub fn element_group_members(&self, group: &LinkGroupId) -> Vec<EntityId> {
        self.elements()
            .filter(|e| e.linked_group_id.as_ref() == Some(group))
            .map(|e| e.id.clone())
            .collect()
    }

    /// Ids of every sub-element in a link group, in document order
    #[must_use]
    pub fn sub_element_group_members(&self, group: &LinkGroupId) -> Vec<EntityId> {
        self.sub_elements()
            .filter(|se| se.linked_group_id.as_ref() == Some(group))
            .map(|se| se.id.clone())
            .collect()
    }

    /// Rewrite every child's parent ids from its actual container
    pub fn repair_parent_links(&mut self) {
        for domain in &mut self.domains {
            for category in &mut domain.categories {
                category.domain_id = domain.id.clone();
                for element in &mut category.elements {
                    element.category_id = category.id.clone();
                    for sc in &mut element.sub_categories {
                        sc.element_id = element.id.clone();
                        for se in &mut sc.sub_elements {
                            se.sub_category_id = sc.id.clone();
                        }
                    }
                }
            }
            for point in &mut domain.map_elements {
                point.domain_id = domain.id.clone();
            }
        }
    }

    /// Sort every sibling list by stored order and make it dense
    pub fn normalize_orders(&mut self) {
        order::normalize(&mut self.domains);
        for domain in &mut self.domains {
            order::normalize(&mut domain.categories);
            for category in &mut domain.categories {
                order::normalize(&mut category.elements);
                for element in &mut category.elements {
                    order::normalize(&mut element.sub_categories);
                    for sc in &mut element.sub_categories {
                        order::normalize(&mut sc.sub_elements);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cockpit::TemplateType;
    use crate::order::is_dense;

    fn tree() -> (Cockpit, EntityId, EntityId) {
        let mut cockpit = Cockpit::new("Plant");
        let mut domain = Domain::new("Water", TemplateType::Standard, 0);
        let mut category = Category::new(domain.id.clone(), "Pumps", 0);
        let mut element = Element::new(category.id.clone(), "Pump 1", 0);
        let mut sc = SubCategory::new(element.id.clone(), "Valves", 0);
        let se = SubElement::new(sc.id.clone(), "V1", 0);
        let element_id = element.id.clone();
        let se_id = se.id.clone();
        sc.sub_elements.push(se);
        element.sub_categories.push(sc);
        category.elements.push(element);
        domain.categories.push(category);
        cockpit.domains.push(domain);
        (cockpit, element_id, se_id)
    }

    #[test]
    fn finds_nested_entities() {
        let (cockpit, element_id, se_id) = tree();
        assert_eq!(cockpit.element(&element_id).unwrap().name, "Pump 1");
        assert_eq!(cockpit.sub_element(&se_id).unwrap().name, "V1");
        let loc = cockpit.sub_element_location(&se_id).unwrap();
        assert_eq!(loc.element_id, element_id);
        assert!(cockpit.element(&EntityId::new("missing")).is_none());
    }

    #[test]
    fn group_members_follow_document_order() {
        let (mut cockpit, element_id, _) = tree();
        let group = LinkGroupId::new("g");
        cockpit.element_mut(&element_id).unwrap().linked_group_id = Some(group.clone());
        assert_eq!(cockpit.element_group_members(&group), vec![element_id]);
        assert!(cockpit.sub_element_group_members(&group).is_empty());
    }

    #[test]
    fn normalize_orders_makes_lists_dense() {
        let (mut cockpit, _, _) = tree();
        cockpit.domains[0].order = 9;
        cockpit.domains[0].categories[0].elements[0].order = 4;
        cockpit.normalize_orders();
        assert!(is_dense(&cockpit.domains));
        assert!(is_dense(&cockpit.domains[0].categories[0].elements));
    }
}
