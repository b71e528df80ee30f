use std::{ops::Deref, sync::Arc};

use crate::{Reaction, ReactionId, Time, User, Uuid};

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, serde::Deserialize, serde::Serialize)]
pub struct CommentId(pub String);

impl CommentId {
    pub fn new(id: impl Into<String>) -> CommentId {
        CommentId(id.into())
    }

    /// Fresh id for a comment that has not been persisted yet
    pub fn pending() -> CommentId {
        CommentId(format!("pending-{}", Uuid::new_v4()))
    }
}

impl std::fmt::Display for CommentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Comment {
    pub id: CommentId,
    pub content: String,
    pub author: User,
    pub created_at: Time,

    #[serde(default)]
    pub updated_at: Option<Time>,

    /// Only meaningful in flat lists, the tree itself is held by `replies`
    #[serde(default)]
    pub parent_id: Option<CommentId>,

    /// Child comments, in display order
    #[serde(default)]
    pub replies: Forest,

    #[serde(default)]
    pub reactions: Vec<Reaction>,

    /// Set while an optimistic insert has not been confirmed by the adapter
    #[serde(default)]
    pub is_pending: bool,

    #[serde(default)]
    pub is_edited: bool,

    #[serde(default)]
    pub has_error: bool,

    #[serde(default)]
    pub error_message: Option<String>,
}

impl Comment {
    pub fn new(id: CommentId, author: User, content: impl Into<String>, created_at: Time) -> Comment {
        Comment {
            id,
            content: content.into(),
            author,
            created_at,
            updated_at: None,
            parent_id: None,
            replies: Forest::new(),
            reactions: Vec::new(),
            is_pending: false,
            is_edited: false,
            has_error: false,
            error_message: None,
        }
    }

    pub fn with_parent(mut self, parent_id: CommentId) -> Comment {
        self.parent_id = Some(parent_id);
        self
    }

    pub fn with_replies(mut self, replies: impl Into<Forest>) -> Comment {
        self.replies = replies.into();
        self
    }

    pub fn with_reactions(mut self, reactions: Vec<Reaction>) -> Comment {
        self.reactions = reactions;
        self
    }

    pub fn reaction(&self, id: &ReactionId) -> Option<&Reaction> {
        self.reactions.iter().find(|r| r.id == *id)
    }
}

/// An ordered list of comments, each of which owns its own replies.
///
/// Cloning a `Forest` is cheap and shares every node with the original.
/// Operations that leave a forest untouched hand back a clone of the very same
/// list, so `Forest::ptr_eq` tells whether anything changed without walking
/// the tree.
#[derive(Clone, Debug, Default, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Forest(Arc<Vec<Arc<Comment>>>);

impl Forest {
    pub fn new() -> Forest {
        Forest(Arc::new(Vec::new()))
    }

    pub fn ptr_eq(a: &Forest, b: &Forest) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }

    /// Deep-clones the comments out of the forest
    pub fn to_comments(&self) -> Vec<Comment> {
        self.0.iter().map(|c| Comment::clone(c)).collect()
    }
}

impl Deref for Forest {
    type Target = [Arc<Comment>];

    fn deref(&self) -> &[Arc<Comment>] {
        &self.0
    }
}

impl<'a> IntoIterator for &'a Forest {
    type Item = &'a Arc<Comment>;
    type IntoIter = std::slice::Iter<'a, Arc<Comment>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl From<Vec<Arc<Comment>>> for Forest {
    fn from(v: Vec<Arc<Comment>>) -> Forest {
        Forest(Arc::new(v))
    }
}

impl From<Vec<Comment>> for Forest {
    fn from(v: Vec<Comment>) -> Forest {
        v.into_iter().collect()
    }
}

impl FromIterator<Arc<Comment>> for Forest {
    fn from_iter<I: IntoIterator<Item = Arc<Comment>>>(iter: I) -> Forest {
        Forest(Arc::new(iter.into_iter().collect()))
    }
}

impl FromIterator<Comment> for Forest {
    fn from_iter<I: IntoIterator<Item = Comment>>(iter: I) -> Forest {
        iter.into_iter().map(Arc::new).collect()
    }
}

/// A partial update of a comment. Unset fields are left untouched.
#[derive(Clone, Debug, Default, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct CommentPatch {
    pub content: Option<String>,
    pub is_edited: Option<bool>,
    pub updated_at: Option<Time>,
    pub is_pending: Option<bool>,
    pub has_error: Option<bool>,
    pub error_message: Option<Option<String>>,
    pub reactions: Option<Vec<Reaction>>,
}

impl CommentPatch {
    /// The patch a local edit of the body produces
    pub fn edit(content: impl Into<String>, at: Time) -> CommentPatch {
        CommentPatch {
            content: Some(content.into()),
            is_edited: Some(true),
            updated_at: Some(at),
            ..CommentPatch::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == CommentPatch::default()
    }

    pub fn apply(&self, c: &mut Comment) {
        if let Some(content) = &self.content {
            c.content = content.clone();
        }
        if let Some(is_edited) = self.is_edited {
            c.is_edited = is_edited;
        }
        if let Some(updated_at) = self.updated_at {
            c.updated_at = Some(updated_at);
        }
        if let Some(is_pending) = self.is_pending {
            c.is_pending = is_pending;
        }
        if let Some(has_error) = self.has_error {
            c.has_error = has_error;
        }
        if let Some(error_message) = &self.error_message {
            c.error_message = error_message.clone();
        }
        if let Some(reactions) = &self.reactions {
            c.reactions = reactions.clone();
        }
    }

    /// Accumulates `later` on top of `self`, fields set in `later` winning
    pub fn merge(&mut self, later: CommentPatch) {
        macro_rules! take {
            ($($field:ident),*) => {
                $(
                    if later.$field.is_some() {
                        self.$field = later.$field;
                    }
                )*
            };
        }
        take!(content, is_edited, updated_at, is_pending, has_error, error_message, reactions);
    }
}
