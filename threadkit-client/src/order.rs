use std::{cmp::Ordering, sync::Arc};

use crate::api::{Comment, Forest, SortOrder};

/// Reaction ids counted against a comment's score
pub const NEGATIVE_REACTIONS: [&str; 3] = ["dislike", "thumbs_down", "thumbsdown"];

pub fn net_score(c: &Comment) -> i64 {
    c.reactions
        .iter()
        .map(|r| match NEGATIVE_REACTIONS.contains(&r.id.0.as_str()) {
            true => -i64::from(r.count),
            false => i64::from(r.count),
        })
        .sum()
}

pub trait OrderExt {
    fn compare(&self, a: &Comment, b: &Comment) -> Ordering;

    /// Stable sort of a single level of comments
    fn sort(&self, comments: &mut [Arc<Comment>]) {
        comments.sort_by(|a, b| self.compare(a, b))
    }
}

impl OrderExt for SortOrder {
    fn compare(&self, a: &Comment, b: &Comment) -> Ordering {
        match self {
            SortOrder::Oldest => a.created_at.cmp(&b.created_at),
            SortOrder::Newest => b.created_at.cmp(&a.created_at),
            SortOrder::Popular => net_score(b).cmp(&net_score(a)),
        }
    }
}

pub enum SortBy<'a> {
    Order(SortOrder),
    Custom(&'a dyn Fn(&Comment, &Comment) -> Ordering),
}

impl From<SortOrder> for SortBy<'_> {
    fn from(o: SortOrder) -> Self {
        SortBy::Order(o)
    }
}

impl<'a, F> From<&'a F> for SortBy<'a>
where
    F: Fn(&Comment, &Comment) -> Ordering,
{
    fn from(f: &'a F) -> Self {
        SortBy::Custom(f)
    }
}

impl OrderExt for SortBy<'_> {
    fn compare(&self, a: &Comment, b: &Comment) -> Ordering {
        match self {
            SortBy::Order(o) => o.compare(a, b),
            SortBy::Custom(f) => f(a, b),
        }
    }
}

/// Sorts the top level of `forest`, and every nested reply list too if
/// `recursive` is set. Ties keep their relative order.
pub fn sort_comments<'a>(forest: &Forest, by: impl Into<SortBy<'a>>, recursive: bool) -> Forest {
    sort_with(forest, &by.into(), recursive)
}

fn sort_with(forest: &Forest, by: &SortBy<'_>, recursive: bool) -> Forest {
    let mut comments = forest.to_vec();
    by.sort(&mut comments);
    if recursive {
        for c in comments.iter_mut().filter(|c| !c.replies.is_empty()) {
            let replies = sort_with(&c.replies, by, true);
            Arc::make_mut(c).replies = replies;
        }
    }
    comments.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::*;

    fn ids(f: &Forest) -> Vec<&str> {
        f.iter().map(|c| c.id.0.as_str()).collect()
    }

    #[test]
    fn score_counts_negative_reactions_against() {
        let c = comment("1", "x").with_reactions(vec![
            reaction("like", 4, false),
            reaction("love", 2, false),
            reaction("dislike", 1, false),
            reaction("thumbs_down", 2, false),
            reaction("thumbsdown", 1, false),
        ]);
        assert_eq!(net_score(&c), 2);
    }

    #[test]
    fn popular_ignores_dates() {
        let c1 = Comment {
            created_at: at(0),
            ..comment("c1", "x").with_reactions(vec![reaction("like", 5, false)])
        };
        let c2 = Comment {
            created_at: at(100),
            ..comment("c2", "y").with_reactions(vec![reaction("dislike", 2, false)])
        };
        for input in [vec![c1.clone(), c2.clone()], vec![c2, c1]] {
            let sorted = sort_comments(&input.into(), SortOrder::Popular, false);
            assert_eq!(ids(&sorted), vec!["c1", "c2"]);
        }
    }

    #[test]
    fn date_orders() {
        let f: Forest = vec![
            Comment { created_at: at(2), ..comment("b", "") },
            Comment { created_at: at(1), ..comment("a", "") },
            Comment { created_at: at(3), ..comment("c", "") },
        ]
        .into();
        assert_eq!(ids(&sort_comments(&f, SortOrder::Oldest, false)), vec!["a", "b", "c"]);
        assert_eq!(ids(&sort_comments(&f, SortOrder::Newest, false)), vec!["c", "b", "a"]);
    }

    #[test]
    fn ties_are_stable() {
        let f: Forest = vec![comment("x", ""), comment("y", ""), comment("z", "")].into();
        assert_eq!(ids(&sort_comments(&f, SortOrder::Popular, false)), vec!["x", "y", "z"]);
    }

    #[test]
    fn recursive_sorts_replies() {
        let replies = vec![
            Comment { created_at: at(2), ..comment("r2", "") },
            Comment { created_at: at(1), ..comment("r1", "") },
        ];
        let f: Forest = vec![
            Comment { created_at: at(9), ..comment("late", "") },
            Comment { created_at: at(0), ..comment("early", "").with_replies(replies) },
        ]
        .into();

        let shallow = sort_comments(&f, SortOrder::Oldest, false);
        assert_eq!(ids(&shallow), vec!["early", "late"]);
        assert_eq!(ids(&shallow[0].replies), vec!["r2", "r1"]);

        let deep = sort_comments(&f, SortOrder::Oldest, true);
        assert_eq!(ids(&deep[0].replies), vec!["r1", "r2"]);
        // the input is left alone
        assert_eq!(ids(&f[1].replies), vec!["r2", "r1"]);
    }

    #[test]
    fn custom_comparator() {
        let f: Forest = vec![comment("1", "ccc"), comment("2", "a"), comment("3", "bb")].into();
        let by_length = |a: &Comment, b: &Comment| a.content.len().cmp(&b.content.len());
        assert_eq!(ids(&sort_comments(&f, &by_length, false)), vec!["2", "3", "1"]);
    }
}
