use chrono::Utc;

pub use uuid::{uuid, Uuid};
pub type Time = chrono::DateTime<Utc>;

mod adapter;
pub use adapter::{Adapter, Capabilities, Capability};

mod comment;
pub use comment::{Comment, CommentId, CommentPatch, Forest};

mod error;
pub use error::Error;

mod query;
pub use query::{FetchOptions, FetchResult, SortOrder};

mod reaction;
pub use reaction::{Reaction, ReactionId};

mod user;
pub use user::{User, UserId};

pub fn now() -> Time {
    Utc::now()
}

// Strings may end up in any kind of backend, some of which (postgres, for one)
// refuse null bytes.
pub fn validate_string(s: &str) -> Result<(), Error> {
    match s.contains('\0') {
        true => Err(Error::NullByteInString(String::from(s))),
        false => Ok(()),
    }
}

/// Checks that `content` is worth submitting as a comment body.
///
/// The coordinator never calls this itself: rejecting empty input is the
/// caller's decision.
pub fn validate_content(content: &str) -> Result<(), Error> {
    if content.trim().is_empty() {
        return Err(Error::EmptyContent);
    }
    validate_string(content)
}
