use std::{
    collections::{hash_map, HashMap},
    fmt::Debug,
    hash::Hash,
};

use crate::api::{Comment, CommentId, CommentPatch};

/// Items that can live in a `PatchStore`
pub trait Patchable: Clone + Debug {
    type Id: Clone + Debug + Eq + Hash;
    type Patch: Clone + Debug;

    fn id(&self) -> &Self::Id;
    fn apply_patch(&mut self, patch: &Self::Patch);

    /// Accumulates `later` on top of `acc`
    fn merge_patch(acc: &mut Self::Patch, later: Self::Patch);
}

impl Patchable for Comment {
    type Id = CommentId;
    type Patch = CommentPatch;

    fn id(&self) -> &CommentId {
        &self.id
    }

    fn apply_patch(&mut self, patch: &CommentPatch) {
        patch.apply(self)
    }

    fn merge_patch(acc: &mut CommentPatch, later: CommentPatch) {
        acc.merge(later)
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Overlay<P> {
    Patch(P),
    Tombstone,
}

/// Unconfirmed changes layered over the last confirmed list of items.
///
/// Changes are never rolled back one by one: `rollback` drops everything that
/// happened since the last `confirm`.
#[derive(Clone, Debug)]
pub struct PatchStore<T: Patchable> {
    base: Vec<T>,
    overlay: HashMap<T::Id, Overlay<T::Patch>>,

    /// Newest first
    additions: Vec<T>,
    pending: bool,
}

impl<T: Patchable> PatchStore<T> {
    pub fn new(base: Vec<T>) -> PatchStore<T> {
        PatchStore {
            base,
            overlay: HashMap::new(),
            additions: Vec::new(),
            pending: false,
        }
    }

    /// The last confirmed items
    pub fn base(&self) -> &[T] {
        &self.base
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Additions, then the base items, with all patches and removals applied
    pub fn view(&self) -> Vec<T> {
        self.additions
            .iter()
            .chain(self.base.iter())
            .filter_map(|item| match self.overlay.get(item.id()) {
                None => Some(item.clone()),
                Some(Overlay::Tombstone) => None,
                Some(Overlay::Patch(p)) => {
                    let mut item = item.clone();
                    item.apply_patch(p);
                    Some(item)
                }
            })
            .collect()
    }

    pub fn add(&mut self, item: T) {
        self.additions.insert(0, item);
        self.pending = true;
    }

    pub fn update(&mut self, id: T::Id, patch: T::Patch) {
        match self.overlay.entry(id) {
            hash_map::Entry::Vacant(e) => {
                e.insert(Overlay::Patch(patch));
            }
            hash_map::Entry::Occupied(mut e) => match e.get_mut() {
                Overlay::Patch(acc) => T::merge_patch(acc, patch),
                // updating an item that is already removed does not bring it back
                Overlay::Tombstone => (),
            },
        }
        self.pending = true;
    }

    pub fn remove(&mut self, id: T::Id) {
        self.overlay.insert(id, Overlay::Tombstone);
        self.pending = true;
    }

    /// Makes the current view the new base. To be called once persistence of
    /// every pending change is known to have succeeded.
    pub fn confirm(&mut self) {
        self.base = self.view();
        self.overlay.clear();
        self.additions.clear();
        self.pending = false;
    }

    /// Drops every change made since the last `confirm`
    pub fn rollback(&mut self) {
        self.overlay.clear();
        self.additions.clear();
        self.pending = false;
    }

    /// Replaces the base wholesale, eg. after a fresh fetch. Pending changes
    /// stay layered on top.
    pub fn replace_base(&mut self, base: Vec<T>) {
        self.base = base;
    }
}

impl<T: Patchable> Default for PatchStore<T> {
    fn default() -> Self {
        PatchStore::new(Vec::new())
    }
}
