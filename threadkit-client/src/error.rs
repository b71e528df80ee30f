use crate::api::{Capability, CommentId};

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum MutationKind {
    Create,
    Update,
    Delete,
    ToggleReaction,
}

impl MutationKind {
    /// What the adapter must support for this mutation to be persisted
    pub fn capability(&self) -> Capability {
        match self {
            MutationKind::Create => Capability::Create,
            MutationKind::Update => Capability::Update,
            MutationKind::Delete => Capability::Delete,
            MutationKind::ToggleReaction => Capability::ToggleReaction,
        }
    }
}

impl std::fmt::Display for MutationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            MutationKind::Create => "create",
            MutationKind::Update => "update",
            MutationKind::Delete => "delete",
            MutationKind::ToggleReaction => "toggle a reaction on",
        })
    }
}

/// Adapter failures, as surfaced by the coordinator once it has rolled back
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("failed loading comments: {0}")]
    Load(String),

    #[error("realtime feed failed: {0}")]
    Subscribe(String),

    #[error("failed to {op} comment {id}: {message}")]
    Mutation {
        op: MutationKind,
        id: CommentId,
        message: String,
    },
}

impl Error {
    pub(crate) fn mutation(op: MutationKind, id: CommentId, err: &anyhow::Error) -> Error {
        Error::Mutation {
            op,
            id,
            message: format!("{err:#}"),
        }
    }
}
