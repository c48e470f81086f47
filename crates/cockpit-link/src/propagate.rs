//! Update propagation across link groups
//!
//! A direct edit on a linked entity is applied locally, then its mirrored
//! subset is re-applied to every other member of the group. Fan-out runs as
//! a worklist pass: each recipient is updated with [`Origin::Propagated`],
//! which never fans out again, and a visited set keyed by
//! `(entity id, group id)` guarantees at most one write per member.
//!
//! Status is never copied raw: the group's statuses are merged once per
//! direct edit (most severe wins) and the merged value is applied to every
//! member, the edited one included.

use crate::resolver::{merged_status, Elements, LinkKind, SubElements};
use cockpit_model::{
    Cockpit, ElementPatch, EntityId, LinkGroupId, Linkable, LinkedPatch, SubElementPatch,
};
use std::collections::{HashSet, VecDeque};

/// Where an update comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// User edit; may sever or fan out
    Direct,
    /// Mirror of another member's edit; applied locally only
    Propagated,
}

/// Outcome of an update
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropagationReport {
    /// Target entity was found
    pub applied: bool,
    /// Target entity changed
    pub changed: bool,
    /// Rename severed the target from its group
    pub severed: bool,
    /// Group status after merge, when status was part of the edit
    pub merged_status: Option<cockpit_model::Status>,
    /// Members that received a propagated write
    pub propagated: Vec<EntityId>,
}

/// Update an element and propagate to its link group
pub fn update_element(
    cockpit: &mut Cockpit,
    id: &EntityId,
    patch: &ElementPatch,
    origin: Origin,
) -> PropagationReport {
    update_linked::<Elements>(cockpit, id, patch, origin)
}

/// Update a sub-element and propagate to its link group
pub fn update_sub_element(
    cockpit: &mut Cockpit,
    id: &EntityId,
    patch: &SubElementPatch,
    origin: Origin,
) -> PropagationReport {
    update_linked::<SubElements>(cockpit, id, patch, origin)
}

/// Kind-generic update
pub fn update_linked<K: LinkKind>(
    cockpit: &mut Cockpit,
    id: &EntityId,
    patch: &K::Patch,
    origin: Origin,
) -> PropagationReport {
    let Some(target) = K::find_mut(cockpit, id) else {
        tracing::debug!(kind = K::LABEL, %id, "update target not found");
        return PropagationReport::default();
    };

    let renamed = patch.new_name().is_some_and(|name| name != target.name());
    let changed = patch.apply_to(target);
    let own_status = target.status();
    let group = target.linked_group_id().cloned();

    let mut report = PropagationReport {
        applied: true,
        changed,
        ..PropagationReport::default()
    };

    if origin == Origin::Propagated {
        return report;
    }
    let Some(group) = group else {
        return report;
    };

    if renamed {
        K::sever(cockpit, id);
        report.severed = true;
        tracing::debug!(kind = K::LABEL, %id, %group, "rename severed link");
        return report;
    }

    let mut mirrored = patch.mirrored();
    if mirrored.is_empty() {
        return report;
    }

    let members = K::members(cockpit, &group);
    if mirrored.status().is_some() {
        let others: Vec<EntityId> = members.iter().filter(|m| *m != id).cloned().collect();
        let merged = merged_status::<K>(cockpit, &others, own_status);
        mirrored.set_status(merged);
        report.merged_status = Some(merged);

        if merged != own_status {
            let mut status_only = K::Patch::default();
            status_only.set_status(merged);
            if let Some(target) = K::find_mut(cockpit, id) {
                report.changed |= status_only.apply_to(target);
            }
        }
    }

    let mut visited = HashSet::from([(id.clone(), group.clone())]);
    let targets = members.into_iter().map(|m| (m, group.clone()));
    report.propagated = fan_out::<K>(cockpit, targets, &mirrored, &mut visited);

    tracing::debug!(
        kind = K::LABEL,
        %id,
        %group,
        recipients = report.propagated.len(),
        "propagated linked update"
    );
    report
}

/// Apply `patch` once to every unvisited `(id, group)` pair
///
/// Recipients are updated with [`Origin::Propagated`], so this pass never
/// enqueues further work; the worklist drains in a single sweep.
pub(crate) fn fan_out<K: LinkKind>(
    cockpit: &mut Cockpit,
    targets: impl IntoIterator<Item = (EntityId, LinkGroupId)>,
    patch: &K::Patch,
    visited: &mut HashSet<(EntityId, LinkGroupId)>,
) -> Vec<EntityId> {
    let mut worklist: VecDeque<(EntityId, LinkGroupId)> = targets.into_iter().collect();
    let mut written = Vec::new();

    while let Some(key) = worklist.pop_front() {
        if !visited.insert(key.clone()) {
            continue;
        }
        let outcome = update_linked::<K>(cockpit, &key.0, patch, Origin::Propagated);
        if outcome.applied {
            written.push(key.0);
        }
    }
    written
}
