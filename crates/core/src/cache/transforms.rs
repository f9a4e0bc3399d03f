//! Optimistic transforms over cached collections

/// Items addressable by a stable identifier.
pub trait Identified {
    type Id: PartialEq;

    fn id(&self) -> Self::Id;
}

/// Collection without the item `id`.
#[must_use]
pub fn remove_by_id<T: Identified + Clone>(items: &[T], id: &T::Id) -> Vec<T> {
    items.iter().filter(|item| item.id() != *id).cloned().collect()
}

/// Collection with `patch` applied to the item `id`.
#[must_use]
pub fn patch_by_id<T, F>(items: &[T], id: &T::Id, mut patch: F) -> Vec<T>
where
    T: Identified + Clone,
    F: FnMut(&mut T),
{
    items
        .iter()
        .cloned()
        .map(|mut item| {
            if item.id() == *id {
                patch(&mut item);
            }
            item
        })
        .collect()
}

/// Collection with `item` inserted at the front, e.g. a create placeholder.
#[must_use]
pub fn prepend<T: Clone>(items: &[T], item: T) -> Vec<T> {
    std::iter::once(item).chain(items.iter().cloned()).collect()
}

/// Collection with the item `id` swapped for `replacement`, e.g. a
/// placeholder swapped for the server-assigned entity.
#[must_use]
pub fn replace_by_id<T: Identified + Clone>(items: &[T], id: &T::Id, replacement: T) -> Vec<T> {
    let mut replacement = Some(replacement);
    items
        .iter()
        .map(|item| {
            if item.id() == *id {
                if let Some(new_item) = replacement.take() {
                    return new_item;
                }
            }
            item.clone()
        })
        .collect()
}
