use std::ops::BitOr;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::{Comment, CommentId, Error, FetchOptions, FetchResult, ReactionId};

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Capability {
    Fetch,
    Create,
    Update,
    Delete,
    ToggleReaction,
    Subscribe,
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Capability::Fetch => "fetch",
            Capability::Create => "create",
            Capability::Update => "update",
            Capability::Delete => "delete",
            Capability::ToggleReaction => "toggle-reaction",
            Capability::Subscribe => "subscribe",
        })
    }
}

/// Which parts of the `Adapter` contract an adapter actually implements.
///
/// Operations whose capability is missing stay local-only: the optimistic
/// change is kept as-is and can never be rolled back.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Capabilities {
    pub fetch: bool,
    pub create: bool,
    pub update: bool,
    pub delete: bool,
    pub toggle_reaction: bool,
    pub subscribe: bool,
}

impl Capabilities {
    pub fn all() -> Capabilities {
        Self::all_or_nothing(true)
    }

    pub fn none() -> Capabilities {
        Self::all_or_nothing(false)
    }

    pub fn all_or_nothing(all: bool) -> Capabilities {
        Capabilities {
            fetch: all,
            create: all,
            update: all,
            delete: all,
            toggle_reaction: all,
            subscribe: all,
        }
    }

    pub fn only(c: Capability) -> Capabilities {
        let mut res = Capabilities::none();
        res.set(c, true);
        res
    }

    pub fn has(&self, c: Capability) -> bool {
        match c {
            Capability::Fetch => self.fetch,
            Capability::Create => self.create,
            Capability::Update => self.update,
            Capability::Delete => self.delete,
            Capability::ToggleReaction => self.toggle_reaction,
            Capability::Subscribe => self.subscribe,
        }
    }

    pub fn set(&mut self, c: Capability, enabled: bool) {
        let flag = match c {
            Capability::Fetch => &mut self.fetch,
            Capability::Create => &mut self.create,
            Capability::Update => &mut self.update,
            Capability::Delete => &mut self.delete,
            Capability::ToggleReaction => &mut self.toggle_reaction,
            Capability::Subscribe => &mut self.subscribe,
        };
        *flag = enabled;
    }

    pub fn without(mut self, c: Capability) -> Capabilities {
        self.set(c, false);
        self
    }
}

impl BitOr for Capabilities {
    type Output = Self;

    fn bitor(self, rhs: Capabilities) -> Capabilities {
        Capabilities {
            fetch: self.fetch || rhs.fetch,
            create: self.create || rhs.create,
            update: self.update || rhs.update,
            delete: self.delete || rhs.delete,
            toggle_reaction: self.toggle_reaction || rhs.toggle_reaction,
            subscribe: self.subscribe || rhs.subscribe,
        }
    }
}

impl BitOr<Capability> for Capabilities {
    type Output = Self;

    fn bitor(mut self, rhs: Capability) -> Capabilities {
        self.set(rhs, true);
        self
    }
}

/// The persistence boundary of a comment section.
///
/// Every method has a default body that fails with `Error::Unsupported`, so
/// implementors only write what they advertise in `capabilities`. Callers must
/// check `capabilities` first and never rely on the defaults being reached.
#[async_trait]
pub trait Adapter: Send + Sync {
    fn capabilities(&self) -> Capabilities;

    async fn fetch(&self, _opts: FetchOptions) -> anyhow::Result<FetchResult> {
        Err(Error::Unsupported(Capability::Fetch).into())
    }

    async fn create(
        &self,
        _content: String,
        _parent_id: Option<CommentId>,
    ) -> anyhow::Result<Comment> {
        Err(Error::Unsupported(Capability::Create).into())
    }

    async fn update(&self, _id: CommentId, _content: String) -> anyhow::Result<Comment> {
        Err(Error::Unsupported(Capability::Update).into())
    }

    async fn delete(&self, _id: CommentId) -> anyhow::Result<()> {
        Err(Error::Unsupported(Capability::Delete).into())
    }

    async fn toggle_reaction(
        &self,
        _comment_id: CommentId,
        _reaction_id: ReactionId,
    ) -> anyhow::Result<()> {
        Err(Error::Unsupported(Capability::ToggleReaction).into())
    }

    /// Opens a realtime feed of full comment lists. Dropping the receiver
    /// unsubscribes.
    async fn subscribe(&self) -> anyhow::Result<mpsc::UnboundedReceiver<Vec<Comment>>> {
        Err(Error::Unsupported(Capability::Subscribe).into())
    }

    /// Releases whatever the adapter holds (connections, feeds, in-flight
    /// requests it knows how to abort)
    fn dispose(&self) {}
}
