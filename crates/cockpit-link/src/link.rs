//! Explicit linking and unlinking
//!
//! Linking a target to a source joins the target to the source's group
//! (minting one when the source has none). If the target already belonged
//! to another group, every member of that group is relabelled to the
//! source's group, so groups only ever merge, never overlap.
//!
//! Element linking also unions the two elements' sub-category trees by
//! case-insensitive name, and optionally links same-named sub-elements.

use crate::propagate::fan_out;
use crate::resolver::{merged_status, Elements, LinkKind, SubElements};
use cockpit_model::{
    names_match, order, Cockpit, EntityId, LinkGroupId, Linkable, LinkedPatch, Status,
    SubCategory,
};
use std::collections::HashSet;

/// Caller flags for element linking
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkOptions {
    /// Also link same-named sub-elements across the two elements
    pub link_sub_elements: bool,
}

impl LinkOptions {
    #[inline]
    #[must_use]
    pub fn with_sub_elements(mut self) -> Self {
        self.link_sub_elements = true;
        self
    }
}

/// Outcome of a link operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkReport {
    /// Group the target now belongs to
    pub group: LinkGroupId,
    /// Status shared by every group member
    pub merged_status: Status,
    /// Former members of the target's old group moved into `group`
    pub relabelled: Vec<EntityId>,
    /// Members that received the merged fields
    pub propagated: Vec<EntityId>,
    /// Sub-categories deep-copied across
    pub copied_sub_categories: usize,
    /// Sub-elements deep-copied into already matching sub-categories
    pub copied_sub_elements: usize,
    /// Same-named sub-element pairs linked
    pub linked_sub_elements: usize,
}

/// Which fields a pair link merges
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MergeMode {
    /// Source's mirrored fields plus merged status
    Full,
    /// Merged status only
    StatusOnly,
}

/// Result of joining two entities into one group
#[derive(Debug)]
struct PairOutcome {
    group: LinkGroupId,
    merged_status: Status,
    relabelled: Vec<EntityId>,
    propagated: Vec<EntityId>,
}

/// Link element `target` into the group of element `source`
///
/// Returns `None` when either element is missing or both ids are equal.
pub fn link_element(
    cockpit: &mut Cockpit,
    target: &EntityId,
    source: &EntityId,
    options: LinkOptions,
) -> Option<LinkReport> {
    let pair = link_pair::<Elements>(cockpit, target, source, MergeMode::Full)?;

    let (copied_sub_categories, copied_sub_elements) = union_sub_trees(cockpit, target, source);

    let linked_sub_elements = if options.link_sub_elements {
        link_matching_sub_elements(cockpit, target, source)
    } else {
        0
    };

    tracing::info!(
        %target,
        %source,
        group = %pair.group,
        status = %pair.merged_status,
        copied_sub_categories,
        copied_sub_elements,
        linked_sub_elements,
        "linked elements"
    );

    Some(LinkReport {
        group: pair.group,
        merged_status: pair.merged_status,
        relabelled: pair.relabelled,
        propagated: pair.propagated,
        copied_sub_categories,
        copied_sub_elements,
        linked_sub_elements,
    })
}

/// Link sub-element `target` into the group of sub-element `source`
pub fn link_sub_element(
    cockpit: &mut Cockpit,
    target: &EntityId,
    source: &EntityId,
) -> Option<LinkReport> {
    let pair = link_pair::<SubElements>(cockpit, target, source, MergeMode::Full)?;
    tracing::info!(%target, %source, group = %pair.group, "linked sub-elements");
    Some(LinkReport {
        group: pair.group,
        merged_status: pair.merged_status,
        relabelled: pair.relabelled,
        propagated: pair.propagated,
        copied_sub_categories: 0,
        copied_sub_elements: 0,
        linked_sub_elements: 0,
    })
}

/// Remove an element and all its sub-elements from their groups
///
/// Other members keep their group id.
pub fn unlink_element(cockpit: &mut Cockpit, id: &EntityId) -> bool {
    let severed = Elements::sever(cockpit, id);
    if severed {
        tracing::debug!(%id, "unlinked element");
    }
    severed
}

/// Remove a sub-element from its group
pub fn unlink_sub_element(cockpit: &mut Cockpit, id: &EntityId) -> bool {
    let severed = SubElements::sever(cockpit, id);
    if severed {
        tracing::debug!(%id, "unlinked sub-element");
    }
    severed
}

/// Join `target` to `source`'s group and mirror the merged fields
fn link_pair<K: LinkKind>(
    cockpit: &mut Cockpit,
    target: &EntityId,
    source: &EntityId,
    mode: MergeMode,
) -> Option<PairOutcome> {
    if target == source {
        return None;
    }
    let target_group = K::find(cockpit, target)?.linked_group_id().cloned();
    let source_entity = K::find(cockpit, source)?;
    let mirror = K::Patch::mirror_of(source_entity);
    let source_group = source_entity.linked_group_id().cloned();

    let group = match source_group {
        Some(group) => group,
        None => {
            let minted = LinkGroupId::generate();
            if let Some(entity) = K::find_mut(cockpit, source) {
                entity.set_linked_group_id(Some(minted.clone()));
            }
            minted
        }
    };

    let mut relabelled = Vec::new();
    if let Some(old) = target_group.filter(|old| old != &group) {
        for member in K::members(cockpit, &old) {
            if let Some(entity) = K::find_mut(cockpit, &member) {
                entity.set_linked_group_id(Some(group.clone()));
            }
            if &member != target {
                relabelled.push(member);
            }
        }
        tracing::debug!(kind = K::LABEL, from = %old, into = %group, moved = relabelled.len(), "merged link groups");
    }
    if let Some(entity) = K::find_mut(cockpit, target) {
        entity.set_linked_group_id(Some(group.clone()));
    }

    let members = K::members(cockpit, &group);
    let merged = merged_status::<K>(cockpit, &members, Status::Ok);

    let mut patch = match mode {
        MergeMode::Full => mirror,
        MergeMode::StatusOnly => K::Patch::default(),
    };
    patch.set_status(merged);

    let targets = members.into_iter().map(|m| (m, group.clone()));
    let propagated = fan_out::<K>(cockpit, targets, &patch, &mut HashSet::new());

    Some(PairOutcome {
        group,
        merged_status: merged,
        relabelled,
        propagated,
    })
}

/// Union sub-category trees of two elements by name, both directions
///
/// Works from snapshots taken before any copy, so nothing copied in one
/// direction is copied back. Returns (sub-categories, sub-elements) copied.
fn union_sub_trees(cockpit: &mut Cockpit, a: &EntityId, b: &EntityId) -> (usize, usize) {
    let (Some(a_tree), Some(b_tree)) = (
        cockpit.element(a).map(|e| e.sub_categories.clone()),
        cockpit.element(b).map(|e| e.sub_categories.clone()),
    ) else {
        return (0, 0);
    };

    let (sc_ab, se_ab) = copy_missing(cockpit, a, &b_tree);
    let (sc_ba, se_ba) = copy_missing(cockpit, b, &a_tree);
    (sc_ab + sc_ba, se_ab + se_ba)
}

/// Copy into element `into` whatever `from` has that it lacks by name
fn copy_missing(cockpit: &mut Cockpit, into: &EntityId, from: &[SubCategory]) -> (usize, usize) {
    let Some(element) = cockpit.element_mut(into) else {
        return (0, 0);
    };
    let mut sub_categories = 0;
    let mut sub_elements = 0;

    for theirs in from {
        let existing = element
            .sub_categories
            .iter_mut()
            .find(|sc| names_match(&sc.name, &theirs.name));
        match existing {
            Some(ours) => {
                for se in &theirs.sub_elements {
                    if ours.sub_element_named(&se.name).is_none() {
                        let copy = se.fresh_copy(&ours.id);
                        order::push_last(&mut ours.sub_elements, copy);
                        sub_elements += 1;
                    }
                }
            }
            None => {
                let copy = theirs.fresh_copy(&element.id);
                order::push_last(&mut element.sub_categories, copy);
                sub_categories += 1;
            }
        }
    }
    (sub_categories, sub_elements)
}

/// Link every sub-element pair whose sub-category and own names match
fn link_matching_sub_elements(cockpit: &mut Cockpit, target: &EntityId, source: &EntityId) -> usize {
    let (Some(t), Some(s)) = (cockpit.element(target), cockpit.element(source)) else {
        return 0;
    };

    let mut pairs = Vec::new();
    for t_sc in &t.sub_categories {
        let Some(s_sc) = s.sub_category_named(&t_sc.name) else {
            continue;
        };
        for t_se in &t_sc.sub_elements {
            if let Some(s_se) = s_sc.sub_element_named(&t_se.name) {
                pairs.push((t_se.id.clone(), s_se.id.clone()));
            }
        }
    }

    pairs
        .iter()
        .filter(|(t_se, s_se)| {
            link_pair::<SubElements>(cockpit, t_se, s_se, MergeMode::StatusOnly).is_some()
        })
        .count()
}
