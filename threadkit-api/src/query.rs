use crate::{Comment, CommentId};

#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Ascending creation date
    Oldest,

    /// Descending creation date
    #[default]
    Newest,

    /// Descending net reaction score
    Popular,
}

impl std::str::FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<SortOrder, String> {
        match s {
            "oldest" => Ok(SortOrder::Oldest),
            "newest" => Ok(SortOrder::Newest),
            "popular" => Ok(SortOrder::Popular),
            _ => Err(format!("unknown sort order {s:?}, expected oldest, newest or popular")),
        }
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct FetchOptions {
    /// Only fetch the replies of this comment
    pub parent_id: Option<CommentId>,

    /// Opaque pagination cursor, as returned by a previous `FetchResult::Page`
    pub cursor: Option<String>,

    pub limit: Option<usize>,
    pub sort_order: Option<SortOrder>,
}

#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize, serde::Serialize)]
pub enum FetchResult {
    List(Vec<Comment>),
    Page {
        comments: Vec<Comment>,
        next_cursor: Option<String>,
        has_more: bool,
        total_count: Option<usize>,
    },
}

impl FetchResult {
    pub fn into_comments(self) -> Vec<Comment> {
        match self {
            FetchResult::List(comments) => comments,
            FetchResult::Page { comments, .. } => comments,
        }
    }

    pub fn has_more(&self) -> bool {
        match self {
            FetchResult::List(_) => false,
            FetchResult::Page { has_more, .. } => *has_more,
        }
    }
}
