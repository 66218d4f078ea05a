//! Collection merge strategies
//!
//! Applied to a slice's collections when a request is fulfilled. Each
//! strategy matches entities by [`Identified::id`]; entities without an id
//! never match anything.

/// An entity that carries a server-assigned id
pub trait Identified {
    /// Id type
    type Id: PartialEq;

    /// The entity's id, if the server sent one
    fn id(&self) -> Option<&Self::Id>;

    /// Whether this entity has the given id
    fn has_id(&self, id: &Self::Id) -> bool {
        self.id() == Some(id)
    }
}

/// Fetch-all: overwrite the collection with the server's items, in server order
pub fn replace<T>(collection: &mut Vec<T>, items: Vec<T>) {
    *collection = items;
}

/// Add: push the new entity to the end
pub fn append<T>(collection: &mut Vec<T>, item: T) {
    collection.push(item);
}

/// Add unless an entity with the same id is already present
///
/// Returns whether the item was appended.
pub fn append_unique<T: Identified>(collection: &mut Vec<T>, item: T) -> bool {
    let known = item
        .id()
        .is_some_and(|id| collection.iter().any(|existing| existing.has_id(id)));
    if known {
        return false;
    }
    collection.push(item);
    true
}

/// Delete: drop every entity with the given id
///
/// Returns the number of entities removed.
pub fn filter_out<T: Identified>(collection: &mut Vec<T>, id: &T::Id) -> usize {
    let before = collection.len();
    collection.retain(|item| !item.has_id(id));
    before - collection.len()
}

/// Update: replace the entity whose id matches `updated`, leaving the rest untouched
///
/// Returns whether an entity was replaced.
pub fn map_replace<T: Identified>(collection: &mut [T], updated: T) -> bool {
    let Some(id) = updated.id() else {
        return false;
    };
    match collection.iter().position(|item| item.has_id(id)) {
        Some(index) => {
            collection[index] = updated;
            true
        },
        None => false,
    }
}

/// Refresh the detail object when it shows the same entity as `updated`
pub fn refresh_detail<T: Identified + Clone>(detail: &mut Option<T>, updated: &T) {
    let same = match (detail.as_ref(), updated.id()) {
        (Some(current), Some(id)) => current.has_id(id),
        _ => false,
    };
    if same {
        *detail = Some(updated.clone());
    }
}
