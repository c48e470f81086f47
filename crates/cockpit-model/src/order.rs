//! Sibling ordering
//!
//! Every ordered sibling list keeps its `order` fields as a dense,
//! zero-based permutation matching list position. All helpers here re-derive
//! `order` after touching a list.

use crate::cockpit::{Category, Domain, MapElement};
use crate::element::{Element, SubCategory, SubElement};
use crate::error::ModelError;
use crate::id::EntityId;

/// Entity addressable by id
pub trait Identified {
    /// Entity id
    fn id(&self) -> &EntityId;
}

/// Entity with a sibling `order` field
pub trait Ordered: Identified {
    /// Current order value
    fn order(&self) -> u32;

    /// Overwrite the order value
    fn set_order(&mut self, order: u32);
}

macro_rules! impl_ordered {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Identified for $ty {
                fn id(&self) -> &EntityId {
                    &self.id
                }
            }

            impl Ordered for $ty {
                fn order(&self) -> u32 {
                    self.order
                }

                fn set_order(&mut self, order: u32) {
                    self.order = order;
                }
            }
        )*
    };
}

impl_ordered!(Domain, Category, Element, SubCategory, SubElement);

impl Identified for MapElement {
    fn id(&self) -> &EntityId {
        &self.id
    }
}

/// Rewrite `order` to match list position
pub fn reindex<T: Ordered>(items: &mut [T]) {
    for (idx, item) in items.iter_mut().enumerate() {
        item.set_order(u32::try_from(idx).unwrap_or(u32::MAX));
    }
}

/// Sort by the stored `order` (stable), then reindex
///
/// Used on documents coming from the server whose lists may be out of
/// order or sparse.
pub fn normalize<T: Ordered>(items: &mut [T]) {
    items.sort_by_key(Ordered::order);
    reindex(items);
}

/// True when `order` fields are exactly `0..len` in list position
#[must_use]
pub fn is_dense<T: Ordered>(items: &[T]) -> bool {
    items
        .iter()
        .enumerate()
        .all(|(idx, item)| usize::try_from(item.order()).is_ok_and(|o| o == idx))
}

/// Move the item at `from` to position `to`, then reindex
///
/// # Errors
/// `ModelError::IndexOutOfBounds` when either index is outside the list
pub fn move_item<T: Ordered>(items: &mut Vec<T>, from: usize, to: usize) -> Result<(), ModelError> {
    let len = items.len();
    if from >= len {
        return Err(ModelError::out_of_bounds(from, len));
    }
    if to >= len {
        return Err(ModelError::out_of_bounds(to, len));
    }
    let item = items.remove(from);
    items.insert(to, item);
    reindex(items);
    Ok(())
}

/// Append an item as the last sibling, assigning its order
pub fn push_last<T: Ordered>(items: &mut Vec<T>, mut item: T) {
    item.set_order(u32::try_from(items.len()).unwrap_or(u32::MAX));
    items.push(item);
}

/// Position of the item with `id`
#[must_use]
pub fn position_of<T: Identified>(items: &[T], id: &EntityId) -> Option<usize> {
    items.iter().position(|item| item.id() == id)
}

/// Remove the item with `id`, reindexing the survivors
pub fn remove_by_id<T: Ordered>(items: &mut Vec<T>, id: &EntityId) -> Option<T> {
    let idx = position_of(items, id)?;
    let removed = items.remove(idx);
    reindex(items);
    Some(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cockpit::TemplateType;
    use proptest::prelude::*;

    fn domains(n: usize) -> Vec<Domain> {
        (0..n)
            .map(|i| Domain::new(format!("d{i}"), TemplateType::Standard, 0))
            .collect()
    }

    #[test]
    fn move_item_reorders_and_reindexes() {
        let mut list = domains(3);
        reindex(&mut list);
        let first = list[0].id.clone();

        move_item(&mut list, 0, 2).unwrap();

        assert_eq!(list[2].id, first);
        assert!(is_dense(&list));
    }

    #[test]
    fn move_item_rejects_out_of_bounds() {
        let mut list = domains(2);
        assert!(matches!(
            move_item(&mut list, 0, 5),
            Err(ModelError::IndexOutOfBounds { index: 5, len: 2 })
        ));
    }

    #[test]
    fn normalize_sorts_sparse_orders() {
        let mut list = domains(3);
        list[0].order = 10;
        list[1].order = 3;
        list[2].order = 7;
        let expected = vec![list[1].id.clone(), list[2].id.clone(), list[0].id.clone()];

        normalize(&mut list);

        let ids: Vec<_> = list.iter().map(|d| d.id.clone()).collect();
        assert_eq!(ids, expected);
        assert!(is_dense(&list));
    }

    #[test]
    fn remove_by_id_keeps_order_dense() {
        let mut list = domains(4);
        reindex(&mut list);
        let middle = list[1].id.clone();

        assert!(remove_by_id(&mut list, &middle).is_some());
        assert!(remove_by_id(&mut list, &middle).is_none());
        assert_eq!(list.len(), 3);
        assert!(is_dense(&list));
    }

    proptest! {
        #[test]
        fn any_move_keeps_order_dense(len in 1usize..12, from in 0usize..12, to in 0usize..12) {
            let mut list = domains(len);
            reindex(&mut list);
            let result = move_item(&mut list, from, to);
            prop_assert_eq!(result.is_ok(), from < len && to < len);
            prop_assert!(is_dense(&list));
            prop_assert_eq!(list.len(), len);
        }
    }
}
