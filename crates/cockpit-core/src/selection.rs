//! Current selection within the open cockpit

use cockpit_model::{Cockpit, EntityId};

/// What the user is looking at
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub domain: Option<EntityId>,
    pub element: Option<EntityId>,
    pub sub_element: Option<EntityId>,
    pub map_element: Option<EntityId>,
}

impl Selection {
    /// True when nothing is selected
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.domain.is_none()
            && self.element.is_none()
            && self.sub_element.is_none()
            && self.map_element.is_none()
    }

    /// Drop every reference that no longer resolves in `cockpit`
    ///
    /// Returns whether anything was cleared.
    pub fn prune(&mut self, cockpit: &Cockpit) -> bool {
        let before = self.clone();
        clear_if(&mut self.domain, |id| cockpit.domain(id).is_none());
        clear_if(&mut self.element, |id| cockpit.element(id).is_none());
        clear_if(&mut self.sub_element, |id| cockpit.sub_element(id).is_none());
        clear_if(&mut self.map_element, |id| cockpit.map_element(id).is_none());
        let cleared = *self != before;
        if cleared {
            tracing::debug!(?before, after = ?self, "selection pruned");
        }
        cleared
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

fn clear_if(slot: &mut Option<EntityId>, dangling: impl Fn(&EntityId) -> bool) {
    if slot.as_ref().is_some_and(dangling) {
        *slot = None;
    }
}
