//! Duplication, plain and auto-linked
//!
//! Copies come from `fresh_copy`, so ids are regenerated and every link in
//! the copy starts cleared. Linked variants then put original and copy in a
//! shared group, minting one when the original has none.

use crate::link::LinkOptions;
use cockpit_model::{order, Cockpit, Element, EntityId, LinkGroupId, SubElement};

/// Copy an element as the last sibling of `into` (or its own category)
///
/// Returns the new element's id.
pub fn duplicate_element(
    cockpit: &mut Cockpit,
    id: &EntityId,
    into: Option<&EntityId>,
) -> Option<EntityId> {
    let (_, copy_id) = insert_element_copy(cockpit, id, into)?;
    tracing::debug!(%id, copy = %copy_id, "duplicated element");
    Some(copy_id)
}

/// Copy an element and link the copy with the original
///
/// With `link_sub_elements`, each copied sub-element is linked with the
/// original sub-element at the same position.
pub fn duplicate_element_linked(
    cockpit: &mut Cockpit,
    id: &EntityId,
    into: Option<&EntityId>,
    options: LinkOptions,
) -> Option<EntityId> {
    let (original, copy_id) = insert_element_copy(cockpit, id, into)?;

    let group = original.linked_group_id.clone().unwrap_or_else(LinkGroupId::generate);
    if let Some(element) = cockpit.element_mut(id) {
        element.linked_group_id = Some(group.clone());
    }

    let mut sub_groups = Vec::new();
    if options.link_sub_elements {
        if let Some(element) = cockpit.element_mut(id) {
            for sub in element.sub_elements_mut() {
                let group = sub
                    .linked_group_id
                    .get_or_insert_with(LinkGroupId::generate)
                    .clone();
                sub_groups.push(group);
            }
        }
    }

    if let Some(copy) = cockpit.element_mut(&copy_id) {
        copy.linked_group_id = Some(group.clone());
        for (sub, group) in copy.sub_elements_mut().zip(sub_groups) {
            sub.linked_group_id = Some(group);
        }
    }

    tracing::debug!(%id, copy = %copy_id, %group, "duplicated element with link");
    Some(copy_id)
}

/// Copy a sub-element and link the copy with the original
pub fn duplicate_sub_element_linked(
    cockpit: &mut Cockpit,
    id: &EntityId,
    into: Option<&EntityId>,
) -> Option<EntityId> {
    let original = cockpit.sub_element(id)?.clone();
    let container = match into {
        Some(sub_category) => sub_category.clone(),
        None => original.sub_category_id.clone(),
    };
    let group = original.linked_group_id.clone().unwrap_or_else(LinkGroupId::generate);

    let sub_category = cockpit.sub_category_mut(&container)?;
    let mut copy: SubElement = original.fresh_copy(&container);
    copy.linked_group_id = Some(group.clone());
    let copy_id = copy.id.clone();
    order::push_last(&mut sub_category.sub_elements, copy);

    if let Some(sub) = cockpit.sub_element_mut(id) {
        sub.linked_group_id = Some(group.clone());
    }
    tracing::debug!(%id, copy = %copy_id, %group, "duplicated sub-element with link");
    Some(copy_id)
}

/// Append a fresh copy of element `id` to `into`, or to its own category
fn insert_element_copy(
    cockpit: &mut Cockpit,
    id: &EntityId,
    into: Option<&EntityId>,
) -> Option<(Element, EntityId)> {
    let original = cockpit.element(id)?.clone();
    let container = match into {
        Some(category) => category.clone(),
        None => original.category_id.clone(),
    };
    let category = cockpit.category_mut(&container)?;
    let copy = original.fresh_copy(&container);
    let copy_id = copy.id.clone();
    order::push_last(&mut category.elements, copy);
    Some((original, copy_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cockpit_model::{Category, Domain, Status, SubCategory, TemplateType};

    fn plant() -> (Cockpit, EntityId, EntityId, EntityId) {
        let mut cockpit = Cockpit::new("Plant");
        let mut domain = Domain::new("Water", TemplateType::Standard, 0);
        let mut x = Category::new(domain.id.clone(), "X", 0);
        let y = Category::new(domain.id.clone(), "Y", 1);
        let mut pump = Element::new(x.id.clone(), "Pump 1", 0).with_status(Status::Minor);
        let mut sc = SubCategory::new(pump.id.clone(), "Valves", 0);
        sc.sub_elements.push(SubElement::new(sc.id.clone(), "V1", 0));
        sc.sub_elements.push(SubElement::new(sc.id.clone(), "V2", 1));
        pump.sub_categories.push(sc);
        let ids = (pump.id.clone(), x.id.clone(), y.id.clone());
        x.elements.push(pump);
        domain.categories.extend([x, y]);
        cockpit.domains.push(domain);
        (cockpit, ids.0, ids.1, ids.2)
    }

    #[test]
    fn plain_duplicate_is_unlinked_sibling() {
        let (mut cockpit, pump, x, _) = plant();

        let copy = duplicate_element(&mut cockpit, &pump, None).unwrap();

        let category = cockpit.category(&x).unwrap();
        assert_eq!(category.elements.len(), 2);
        assert_eq!(category.elements[1].id, copy);
        assert_eq!(category.elements[1].order, 1);
        assert!(cockpit.element(&copy).unwrap().linked_group_id.is_none());
        assert!(cockpit.element(&pump).unwrap().linked_group_id.is_none());
    }

    #[test]
    fn linked_duplicate_shares_a_new_group() {
        let (mut cockpit, pump, _, y) = plant();

        let copy = duplicate_element_linked(&mut cockpit, &pump, Some(&y), LinkOptions::default())
            .unwrap();

        let original = cockpit.element(&pump).unwrap();
        let duplicate = cockpit.element(&copy).unwrap();
        assert!(original.linked_group_id.is_some());
        assert_eq!(original.linked_group_id, duplicate.linked_group_id);
        assert_eq!(duplicate.category_id, y);
        assert_eq!(duplicate.status, Status::Minor);
        assert!(duplicate.sub_elements().all(|se| se.linked_group_id.is_none()));
    }

    #[test]
    fn linked_duplicate_reuses_existing_group() {
        let (mut cockpit, pump, ..) = plant();
        cockpit.element_mut(&pump).unwrap().linked_group_id = Some(LinkGroupId::new("g"));

        let copy = duplicate_element_linked(&mut cockpit, &pump, None, LinkOptions::default())
            .unwrap();

        assert_eq!(
            cockpit.element(&copy).unwrap().linked_group_id,
            Some(LinkGroupId::new("g"))
        );
    }

    #[test]
    fn sub_elements_pair_by_position() {
        let (mut cockpit, pump, ..) = plant();

        let copy = duplicate_element_linked(
            &mut cockpit,
            &pump,
            None,
            LinkOptions::default().with_sub_elements(),
        )
        .unwrap();

        let originals: Vec<_> = cockpit.element(&pump).unwrap().sub_elements().cloned().collect();
        let copies: Vec<_> = cockpit.element(&copy).unwrap().sub_elements().cloned().collect();
        assert_eq!(originals.len(), copies.len());
        for (o, c) in originals.iter().zip(&copies) {
            assert_eq!(o.name, c.name);
            assert!(o.linked_group_id.is_some());
            assert_eq!(o.linked_group_id, c.linked_group_id);
        }
        assert_ne!(originals[0].linked_group_id, originals[1].linked_group_id);
    }

    #[test]
    fn sub_element_duplicate_links_both() {
        let (mut cockpit, pump, ..) = plant();
        let v1 = cockpit.element(&pump).unwrap().sub_elements().next().unwrap().id.clone();

        let copy = duplicate_sub_element_linked(&mut cockpit, &v1, None).unwrap();

        let sc = &cockpit.element(&pump).unwrap().sub_categories[0];
        assert_eq!(sc.sub_elements.len(), 3);
        assert_eq!(sc.sub_elements[2].id, copy);
        assert_eq!(sc.sub_elements[2].order, 2);
        assert_eq!(
            cockpit.sub_element(&v1).unwrap().linked_group_id,
            cockpit.sub_element(&copy).unwrap().linked_group_id
        );
    }

    #[test]
    fn missing_ids_return_none() {
        let (mut cockpit, pump, ..) = plant();
        let ghost = EntityId::new("ghost");
        assert!(duplicate_element(&mut cockpit, &ghost, None).is_none());
        assert!(duplicate_element(&mut cockpit, &pump, Some(&ghost)).is_none());
        assert!(duplicate_sub_element_linked(&mut cockpit, &ghost, None).is_none());
    }
}
