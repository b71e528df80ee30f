use crate::{Capability, CommentId};

#[derive(Debug, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("Unknown error: {0}")]
    Unknown(String),

    #[error("Comment not found {0}")]
    NotFound(CommentId),

    #[error("Adapter does not support {0}")]
    Unsupported(Capability),

    #[error("Null byte in string is not allowed {0:?}")]
    NullByteInString(String),

    #[error("Comment content is empty")]
    EmptyContent,
}
