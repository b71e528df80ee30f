use std::sync::Arc;

use crate::api::{Comment, Forest};

/// Keeps the comments matching `predicate`, along with every ancestor of a
/// match so that results stay in context.
///
/// Subtrees that are kept whole are shared with the input, and the input
/// itself is returned when nothing was filtered out.
pub fn filter_comments(forest: &Forest, predicate: impl Fn(&Comment) -> bool) -> Forest {
    filter_with(forest, &predicate)
}

fn filter_with(forest: &Forest, predicate: &dyn Fn(&Comment) -> bool) -> Forest {
    let mut changed = false;
    let mut kept = Vec::with_capacity(forest.len());
    for c in forest {
        let replies = filter_with(&c.replies, predicate);
        if replies.is_empty() && !predicate(c) {
            changed = true;
            continue;
        }
        if Forest::ptr_eq(&replies, &c.replies) {
            kept.push(c.clone());
        } else {
            changed = true;
            let mut c = Comment::clone(c);
            c.replies = replies;
            kept.push(Arc::new(c));
        }
    }
    match changed {
        true => kept.into(),
        false => forest.clone(),
    }
}

/// Case-insensitive substring search on comment contents
pub fn search_comments(forest: &Forest, query: &str) -> Forest {
    if query.trim().is_empty() {
        return forest.clone();
    }
    let query = query.to_lowercase();
    filter_comments(forest, |c| c.content.to_lowercase().contains(&query))
}
