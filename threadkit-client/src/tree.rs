//! Pure functions over a comment forest.
//!
//! None of these ever fail: an id that is not (or no longer) in the forest
//! turns the operation into a no-op, and the very same `Forest` is handed
//! back so callers can detect it with `Forest::ptr_eq`. Operations that do
//! change something only reallocate the path from the root to the changed
//! node; every other subtree keeps its original `Arc`.

use std::{collections::HashMap, sync::Arc};

use crate::api::{Comment, CommentId, CommentPatch, Forest, ReactionId};

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum InsertPosition {
    #[default]
    Append,
    Prepend,
}

/// Builds a forest out of a flat list linked by `parent_id`.
///
/// Nodes whose parent is not in `flat` become roots. Nodes that only reach
/// each other through a parent cycle are promoted to roots too, after the
/// regular roots and in input order. Replies already present on the input
/// nodes are discarded.
pub fn build_tree(flat: Vec<Comment>) -> Forest {
    let mut index = HashMap::with_capacity(flat.len());
    for (i, c) in flat.iter().enumerate() {
        index.insert(c.id.clone(), i);
    }

    let mut children = vec![Vec::new(); flat.len()];
    let mut roots = Vec::new();
    for (i, c) in flat.iter().enumerate() {
        match c.parent_id.as_ref().and_then(|p| index.get(p)) {
            Some(&p) if p != i => children[p].push(i),
            _ => roots.push(i),
        }
    }

    let mut slots = flat.into_iter().map(Some).collect::<Vec<_>>();
    let mut res = roots
        .into_iter()
        .filter_map(|i| assemble(i, &mut slots, &children))
        .collect::<Vec<_>>();
    for i in 0..slots.len() {
        if slots[i].is_some() {
            tracing::warn!(id = ?slots[i].as_ref().map(|c| &c.id), "comment is part of a parent cycle, promoting it to root");
            res.extend(assemble(i, &mut slots, &children));
        }
    }
    res.into()
}

fn assemble(
    i: usize,
    slots: &mut [Option<Comment>],
    children: &[Vec<usize>],
) -> Option<Arc<Comment>> {
    // Already placed: only happens when walking a cycle
    let mut c = slots[i].take()?;
    c.replies = children[i]
        .iter()
        .filter_map(|&j| assemble(j, slots, children))
        .collect();
    Some(Arc::new(c))
}

/// Pre-order listing of the whole forest.
///
/// Emitted nodes have no `replies`, and every nested node has its `parent_id`
/// set to the comment it was nested in.
pub fn flatten(forest: &Forest) -> Vec<Comment> {
    let mut res = Vec::new();
    flatten_into(forest, None, &mut res);
    res
}

fn flatten_into(forest: &Forest, parent: Option<&CommentId>, res: &mut Vec<Comment>) {
    for c in forest {
        let mut flat = Comment::clone(c);
        if let Some(p) = parent {
            flat.parent_id = Some(p.clone());
        }
        flat.replies = Forest::new();
        res.push(flat);
        flatten_into(&c.replies, Some(&c.id), res);
    }
}

pub fn find_by_id<'a>(forest: &'a Forest, id: &CommentId) -> Option<&'a Arc<Comment>> {
    for c in forest {
        if c.id == *id {
            return Some(c);
        }
        if let Some(res) = find_by_id(&c.replies, id) {
            return Some(res);
        }
    }
    None
}

pub fn count_descendants(c: &Comment) -> usize {
    c.replies.iter().map(|r| 1 + count_descendants(r)).sum()
}

/// Inserts `node`, at root level or under `parent_id`.
///
/// If `parent_id` is not in the forest the node is inserted at root level
/// instead of being dropped.
pub fn add_node(
    forest: &Forest,
    node: Comment,
    parent_id: Option<&CommentId>,
    position: InsertPosition,
) -> Forest {
    let Some(parent_id) = parent_id else {
        return insert(forest, Arc::new(node), position);
    };
    let child = Arc::new(Comment {
        parent_id: Some(parent_id.clone()),
        ..node
    });
    let res = rewrite(forest, parent_id, &mut |parent| {
        let mut parent = parent.clone();
        parent.replies = insert(&parent.replies, child.clone(), position);
        Rewrite::Replace(parent)
    });
    match res {
        Outcome::Changed(forest) => forest,
        Outcome::NotFound | Outcome::Unchanged => {
            tracing::warn!(%parent_id, id = %child.id, "parent comment not found, inserting at root level");
            insert(forest, child, position)
        }
    }
}

/// Removes the comment and all of its replies
pub fn remove_node(forest: &Forest, id: &CommentId) -> Forest {
    rewrite(forest, id, &mut |_| Rewrite::Remove).or(forest)
}

pub fn update_node(forest: &Forest, id: &CommentId, patch: &CommentPatch) -> Forest {
    if patch.is_empty() {
        return forest.clone();
    }
    rewrite(forest, id, &mut |c| {
        let mut c = c.clone();
        patch.apply(&mut c);
        Rewrite::Replace(c)
    })
    .or(forest)
}

/// Swaps the comment for `node`, at the same place in the tree.
///
/// If `node` has no replies of its own, the replies of the replaced comment
/// are kept.
pub fn replace_node(forest: &Forest, id: &CommentId, node: Comment) -> Forest {
    let node = Arc::new(node);
    rewrite(forest, id, &mut |old| {
        let mut new = Comment::clone(&node);
        if new.replies.is_empty() {
            new.replies = old.replies.clone();
        }
        Rewrite::Replace(new)
    })
    .or(forest)
}

/// Flips the viewer's reaction `reaction_id` on comment `id`.
///
/// With `exclusive` set, activating a reaction also deactivates whichever
/// other reaction was active on the same comment.
pub fn toggle_reaction(
    forest: &Forest,
    id: &CommentId,
    reaction_id: &ReactionId,
    exclusive: bool,
) -> Forest {
    rewrite(forest, id, &mut |c| {
        let Some(target) = c.reactions.iter().position(|r| r.id == *reaction_id) else {
            return Rewrite::Keep;
        };
        let mut c = c.clone();
        let activating = !c.reactions[target].is_active;
        for (i, r) in c.reactions.iter_mut().enumerate() {
            if i == target || (exclusive && activating && r.is_active) {
                r.toggle();
            }
        }
        Rewrite::Replace(c)
    })
    .or(forest)
}

fn insert(forest: &Forest, node: Arc<Comment>, position: InsertPosition) -> Forest {
    let mut nodes = Vec::with_capacity(forest.len() + 1);
    match position {
        InsertPosition::Append => {
            nodes.extend(forest.iter().cloned());
            nodes.push(node);
        }
        InsertPosition::Prepend => {
            nodes.push(node);
            nodes.extend(forest.iter().cloned());
        }
    }
    nodes.into()
}

enum Rewrite {
    Keep,
    Replace(Comment),
    Remove,
}

enum Outcome {
    NotFound,
    Unchanged,
    Changed(Forest),
}

impl Outcome {
    fn or(self, forest: &Forest) -> Forest {
        match self {
            Outcome::Changed(f) => f,
            Outcome::NotFound | Outcome::Unchanged => forest.clone(),
        }
    }
}

/// Depth-first search for `id`, rebuilding the path to it with whatever `f`
/// decides to do with the first match
fn rewrite(
    forest: &Forest,
    id: &CommentId,
    f: &mut dyn FnMut(&Comment) -> Rewrite,
) -> Outcome {
    for (i, c) in forest.iter().enumerate() {
        let new = if c.id == *id {
            match f(c) {
                Rewrite::Keep => return Outcome::Unchanged,
                Rewrite::Replace(new) => Some(Arc::new(new)),
                Rewrite::Remove => None,
            }
        } else {
            match rewrite(&c.replies, id, f) {
                Outcome::NotFound => continue,
                Outcome::Unchanged => return Outcome::Unchanged,
                Outcome::Changed(replies) => {
                    let mut new = Comment::clone(c);
                    new.replies = replies;
                    Some(Arc::new(new))
                }
            }
        };
        let mut nodes = forest.to_vec();
        match new {
            Some(new) => nodes[i] = new,
            None => {
                nodes.remove(i);
            }
        }
        return Outcome::Changed(nodes.into());
    }
    Outcome::NotFound
}
