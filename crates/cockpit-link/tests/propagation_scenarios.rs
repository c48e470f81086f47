//! Link propagation scenarios over a realistic cockpit

use cockpit_link::{
    duplicate_element_linked, element_siblings, link_element, update_element, LinkOptions, Origin,
};
use cockpit_model::{Cockpit, Element, ElementPatch, EntityId, LinkGroupId, Status};
use cockpit_test_utils::plant_cockpit;
use pretty_assertions::assert_eq;
use proptest::prelude::*;

/// Scenario A: duplicate with auto-link, then a status edit on the copy
/// reaches the original
#[test]
fn duplicate_linked_then_status_flows_back() {
    let (mut cockpit, ids) = plant_cockpit();

    let copy = duplicate_element_linked(
        &mut cockpit,
        &ids.pump,
        Some(&ids.pumps_y),
        LinkOptions::default(),
    )
    .unwrap();

    let original = cockpit.element(&ids.pump).unwrap();
    let duplicate = cockpit.element(&copy).unwrap();
    assert!(original.linked_group_id.is_some());
    assert_eq!(original.linked_group_id, duplicate.linked_group_id);

    update_element(
        &mut cockpit,
        &copy,
        &ElementPatch::new().with_status(Status::Critical),
        Origin::Direct,
    );

    assert_eq!(cockpit.element(&ids.pump).unwrap().status, Status::Critical);
    assert_eq!(cockpit.element(&copy).unwrap().status, Status::Critical);
}

/// Scenario B: renaming the copy severs it; later edits on the original
/// stay local
#[test]
fn rename_then_edit_does_not_propagate() {
    let (mut cockpit, ids) = plant_cockpit();
    let copy = duplicate_element_linked(
        &mut cockpit,
        &ids.pump,
        Some(&ids.pumps_y),
        LinkOptions::default(),
    )
    .unwrap();

    let report = update_element(
        &mut cockpit,
        &copy,
        &ElementPatch::new().with_name("Pump 1 (spare)"),
        Origin::Direct,
    );
    assert!(report.severed);
    assert!(cockpit.element(&copy).unwrap().linked_group_id.is_none());

    let report = update_element(
        &mut cockpit,
        &ids.pump,
        &ElementPatch::new().with_status(Status::Fatal),
        Origin::Direct,
    );

    assert!(report.propagated.is_empty());
    assert_eq!(cockpit.element(&ids.pump).unwrap().status, Status::Fatal);
    assert_eq!(cockpit.element(&copy).unwrap().status, Status::Ok);
}

/// Renaming one of two linked elements leaves the other's group intact and
/// clears the renamed one's sub-element links
#[test]
fn rename_severs_only_the_renamed_element() {
    let (mut cockpit, ids) = plant_cockpit();
    let copy = duplicate_element_linked(
        &mut cockpit,
        &ids.pump,
        None,
        LinkOptions::default().with_sub_elements(),
    )
    .unwrap();
    let group = cockpit.element(&ids.pump).unwrap().linked_group_id.clone();

    update_element(
        &mut cockpit,
        &ids.pump,
        &ElementPatch::new().with_name("Pump A"),
        Origin::Direct,
    );

    let renamed = cockpit.element(&ids.pump).unwrap();
    assert!(renamed.linked_group_id.is_none());
    assert!(renamed.sub_elements().all(|se| se.linked_group_id.is_none()));
    let other = cockpit.element(&copy).unwrap();
    assert_eq!(other.linked_group_id, group);
    assert!(other.sub_elements().all(|se| se.linked_group_id.is_some()));
}

/// Link union twice gives the same sub-trees as once
#[test]
fn link_union_is_idempotent() {
    let (mut cockpit, ids) = plant_cockpit();
    let category = ids.pumps_y.clone();
    let mut other = Element::new(category.clone(), "Pump 1", 0);
    let mut motors = cockpit_model::SubCategory::new(other.id.clone(), "Motors", 0);
    motors
        .sub_elements
        .push(cockpit_model::SubElement::new(motors.id.clone(), "M1", 0));
    other.sub_categories.push(motors);
    let other_id = other.id.clone();
    cockpit.category_mut(&category).unwrap().elements.push(other);

    let shape = |c: &Cockpit, id: &EntityId| -> Vec<(String, Vec<String>)> {
        c.element(id)
            .unwrap()
            .sub_categories
            .iter()
            .map(|sc| (sc.name.clone(), sc.sub_elements.iter().map(|se| se.name.clone()).collect()))
            .collect()
    };

    let options = LinkOptions::default().with_sub_elements();
    link_element(&mut cockpit, &other_id, &ids.pump, options).unwrap();
    let once = (shape(&cockpit, &ids.pump), shape(&cockpit, &other_id));
    link_element(&mut cockpit, &other_id, &ids.pump, options).unwrap();
    let twice = (shape(&cockpit, &ids.pump), shape(&cockpit, &other_id));

    assert_eq!(once, twice);
    assert_eq!(once.0.len(), 2);
    assert_eq!(element_siblings(&cockpit, &other_id), vec![ids.pump.clone()]);
}

/// Build a cockpit with one group of `n` linked elements in one category
fn group_of(n: usize) -> (Cockpit, Vec<EntityId>) {
    let (mut cockpit, ids) = plant_cockpit();
    let group = LinkGroupId::new("g");
    let category = cockpit.category_mut(&ids.pumps_y).unwrap();
    let mut members = Vec::new();
    for i in 0..n {
        let mut e = Element::new(category.id.clone(), "Meter", u32::try_from(i).unwrap());
        e.linked_group_id = Some(group.clone());
        members.push(e.id.clone());
        category.elements.push(e);
    }
    (cockpit, members)
}

proptest! {
    /// One mirrored edit on any member writes exactly N-1 siblings
    #[test]
    fn propagation_writes_each_sibling_once(n in 1usize..12, pick in 0usize..12, value in "[0-9]{1,4}") {
        let (mut cockpit, members) = group_of(n);
        let target = &members[pick % n];

        let report = update_element(
            &mut cockpit,
            target,
            &ElementPatch::new().with_value(value.clone()),
            Origin::Direct,
        );

        prop_assert_eq!(report.propagated.len(), n - 1);
        prop_assert!(!report.propagated.contains(target));
        for id in &members {
            prop_assert_eq!(cockpit.element(id).unwrap().value.as_deref(), Some(value.as_str()));
        }
    }

    /// Merged status is the most severe of the edit and every sibling
    #[test]
    fn merged_status_never_drops(statuses in prop::collection::vec(0usize..7, 2..8), edit in 0usize..7) {
        let n = statuses.len();
        let (mut cockpit, members) = group_of(n);
        for (id, s) in members.iter().zip(&statuses) {
            cockpit.element_mut(id).unwrap().status = Status::ALL[*s];
        }

        let report = update_element(
            &mut cockpit,
            &members[0],
            &ElementPatch::new().with_status(Status::ALL[edit]),
            Origin::Direct,
        );

        // member 0's prior status is replaced by the edit before merging
        let others_max = statuses[1..].iter().map(|s| Status::ALL[*s]).max().unwrap();
        let merged = report.merged_status.unwrap();
        prop_assert_eq!(merged, Status::ALL[edit].max(others_max));
        for id in &members {
            prop_assert_eq!(cockpit.element(id).unwrap().status, merged);
        }
    }
}
