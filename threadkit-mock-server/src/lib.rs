use std::{collections::HashSet, time::Duration};

use async_trait::async_trait;
use parking_lot::Mutex;
use threadkit_client::{
    api::{
        self, Adapter, Capabilities, Capability, Comment, CommentId, Error, FetchOptions,
        FetchResult, ReactionId, User, Uuid,
    },
    build_tree, find_by_id, flatten, normalize, sort_comments,
};
use tokio::sync::mpsc;

#[derive(Clone, Debug)]
pub struct MockConfig {
    /// Author of the comments created through the server
    pub current_user: User,

    /// What the server advertises. Calls to anything else fail with
    /// `Error::Unsupported`.
    pub capabilities: Capabilities,

    /// Delay applied to every call before it touches the data
    pub latency: Option<Duration>,
}

impl Default for MockConfig {
    fn default() -> MockConfig {
        MockConfig {
            current_user: User::new("mock-user", "Mock User"),
            capabilities: Capabilities::all(),
            latency: None,
        }
    }
}

/// In-memory comment backend.
///
/// Comments are stored as a flat list linked by `parent_id`. Every write is
/// relayed, as a full nested list, to all the feeds opened by `subscribe`.
pub struct MockServer {
    config: MockConfig,
    db: Mutex<Db>,
}

#[derive(Debug, Default)]
struct Db {
    comments: Vec<Comment>,
    feeds: Vec<mpsc::UnboundedSender<Vec<Comment>>>,
    fail_next: HashSet<Capability>,
    fail_always: HashSet<Capability>,
}

impl Db {
    fn relay(&mut self) {
        let tree = build_tree(self.comments.clone()).to_comments();
        self.feeds.retain(|f| matches!(f.send(tree.clone()), Ok(())));
    }

    fn position(&self, id: &CommentId) -> Result<usize, Error> {
        self.comments
            .iter()
            .position(|c| c.id == *id)
            .ok_or_else(|| Error::NotFound(id.clone()))
    }
}

impl MockServer {
    pub fn new(config: MockConfig) -> MockServer {
        MockServer {
            config,
            db: Mutex::new(Db::default()),
        }
    }

    pub fn config(&self) -> &MockConfig {
        &self.config
    }

    /// Replaces the stored comments, flat or nested, without notifying feeds
    pub fn seed(&self, comments: Vec<Comment>) {
        self.db.lock().comments = flatten(&normalize(comments));
    }

    /// Replaces the stored comments and relays them, as another client would
    pub fn push(&self, comments: Vec<Comment>) {
        let mut db = self.db.lock();
        db.comments = flatten(&normalize(comments));
        db.relay();
    }

    /// The stored comments, flat, in insertion order
    pub fn comments(&self) -> Vec<Comment> {
        self.db.lock().comments.clone()
    }

    /// Number of feeds that are still being listened to
    pub fn num_feeds(&self) -> usize {
        let mut db = self.db.lock();
        db.feeds.retain(|f| !f.is_closed());
        db.feeds.len()
    }

    /// Makes the next call needing `c` fail
    pub fn fail_next(&self, c: Capability) {
        self.db.lock().fail_next.insert(c);
    }

    /// Makes every call needing `c` fail, until reset
    pub fn fail_always(&self, c: Capability, fail: bool) {
        let mut db = self.db.lock();
        match fail {
            true => db.fail_always.insert(c),
            false => db.fail_always.remove(&c),
        };
    }

    /// Simulates the latency then checks whether the call is allowed through
    async fn enter(&self, c: Capability) -> anyhow::Result<()> {
        if let Some(latency) = self.config.latency {
            tokio::time::sleep(latency).await;
        }
        if !self.config.capabilities.has(c) {
            return Err(Error::Unsupported(c).into());
        }
        let mut db = self.db.lock();
        if db.fail_always.contains(&c) || db.fail_next.remove(&c) {
            tracing::debug!(capability = %c, "injecting failure");
            return Err(Error::Unknown(format!("injected {c} failure")).into());
        }
        Ok(())
    }
}

impl Default for MockServer {
    fn default() -> MockServer {
        MockServer::new(MockConfig::default())
    }
}

#[async_trait]
impl Adapter for MockServer {
    fn capabilities(&self) -> Capabilities {
        self.config.capabilities
    }

    async fn fetch(&self, opts: FetchOptions) -> anyhow::Result<FetchResult> {
        self.enter(Capability::Fetch).await?;
        let db = self.db.lock();
        let tree = build_tree(db.comments.clone());
        let forest = match &opts.parent_id {
            None => tree,
            Some(parent_id) => find_by_id(&tree, parent_id)
                .map(|parent| parent.replies.clone())
                .ok_or_else(|| Error::NotFound(parent_id.clone()))?,
        };
        let forest = match opts.sort_order {
            Some(order) => sort_comments(&forest, order, true),
            None => forest,
        };

        let Some(limit) = opts.limit else {
            return Ok(FetchResult::List(forest.to_comments()));
        };
        let offset = match &opts.cursor {
            None => 0,
            Some(cursor) => cursor
                .parse::<usize>()
                .map_err(|_| Error::Unknown(format!("invalid cursor {cursor:?}")))?,
        };
        let total = forest.len();
        let end = offset.saturating_add(limit).min(total);
        let comments = forest
            .get(offset..end)
            .unwrap_or_default()
            .iter()
            .map(|c| Comment::clone(c))
            .collect();
        let has_more = end < total;
        Ok(FetchResult::Page {
            comments,
            next_cursor: has_more.then(|| end.to_string()),
            has_more,
            total_count: Some(total),
        })
    }

    async fn create(
        &self,
        content: String,
        parent_id: Option<CommentId>,
    ) -> anyhow::Result<Comment> {
        self.enter(Capability::Create).await?;
        api::validate_content(&content)?;
        let mut db = self.db.lock();
        if let Some(parent_id) = &parent_id {
            db.position(parent_id)?;
        }
        let mut comment = Comment::new(
            CommentId::new(Uuid::new_v4().to_string()),
            self.config.current_user.clone(),
            content,
            api::now(),
        );
        comment.parent_id = parent_id;
        tracing::debug!(id = %comment.id, "storing new comment");
        db.comments.push(comment.clone());
        db.relay();
        Ok(comment)
    }

    async fn update(&self, id: CommentId, content: String) -> anyhow::Result<Comment> {
        self.enter(Capability::Update).await?;
        api::validate_content(&content)?;
        let mut db = self.db.lock();
        let i = db.position(&id)?;
        let comment = &mut db.comments[i];
        comment.content = content;
        comment.is_edited = true;
        comment.updated_at = Some(api::now());
        let res = comment.clone();
        db.relay();
        Ok(res)
    }

    async fn delete(&self, id: CommentId) -> anyhow::Result<()> {
        self.enter(Capability::Delete).await?;
        let mut db = self.db.lock();
        db.position(&id)?;
        let mut doomed = HashSet::from([id]);
        loop {
            let before = doomed.len();
            for c in db.comments.iter() {
                if c.parent_id.as_ref().map_or(false, |p| doomed.contains(p)) {
                    doomed.insert(c.id.clone());
                }
            }
            if doomed.len() == before {
                break;
            }
        }
        tracing::debug!(num_comments = doomed.len(), "deleting comment subtree");
        db.comments.retain(|c| !doomed.contains(&c.id));
        db.relay();
        Ok(())
    }

    async fn toggle_reaction(
        &self,
        comment_id: CommentId,
        reaction_id: ReactionId,
    ) -> anyhow::Result<()> {
        self.enter(Capability::ToggleReaction).await?;
        let mut db = self.db.lock();
        let i = db.position(&comment_id)?;
        let reaction = db.comments[i]
            .reactions
            .iter_mut()
            .find(|r| r.id == reaction_id)
            .ok_or_else(|| {
                Error::Unknown(format!("comment {comment_id} has no reaction {reaction_id}"))
            })?;
        reaction.toggle();
        db.relay();
        Ok(())
    }

    async fn subscribe(&self) -> anyhow::Result<mpsc::UnboundedReceiver<Vec<Comment>>> {
        self.enter(Capability::Subscribe).await?;
        let (sender, receiver) = mpsc::unbounded_channel();
        self.db.lock().feeds.push(sender);
        Ok(receiver)
    }

    fn dispose(&self) {
        let mut db = self.db.lock();
        tracing::debug!(num_feeds = db.feeds.len(), "closing feeds");
        db.feeds.clear();
    }
}
