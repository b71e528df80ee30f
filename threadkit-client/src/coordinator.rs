use std::{
    future::Future,
    sync::{Arc, Weak},
};

use parking_lot::Mutex;
use tokio::{sync::watch, task::JoinHandle};

use crate::{
    api::{
        self, Adapter, Capabilities, Capability, Comment, CommentId, CommentPatch, FetchOptions,
        Forest, ReactionId, User,
    },
    tree::{self, InsertPosition},
    Error, MutationKind,
};

pub type ErrorCallback = Arc<dyn Fn(&Error) + Send + Sync>;

#[derive(Clone)]
pub struct CoordinatorOptions {
    /// Author of every comment created through the coordinator
    pub current_user: User,

    /// Starting comments, either flat (linked by `parent_id`) or nested
    pub initial: Vec<Comment>,

    /// Whether a viewer can only have one active reaction per comment
    pub exclusive_reactions: bool,

    /// Where new comments and replies are inserted among their siblings
    pub insert_position: InsertPosition,

    /// Called after each adapter failure, once the tree has been rolled back
    pub on_error: Option<ErrorCallback>,
}

impl CoordinatorOptions {
    pub fn new(current_user: User) -> CoordinatorOptions {
        CoordinatorOptions {
            current_user,
            initial: Vec::new(),
            exclusive_reactions: false,
            insert_position: InsertPosition::Append,
            on_error: None,
        }
    }

    pub fn initial(mut self, comments: Vec<Comment>) -> Self {
        self.initial = comments;
        self
    }

    pub fn exclusive_reactions(mut self, exclusive: bool) -> Self {
        self.exclusive_reactions = exclusive;
        self
    }

    pub fn insert_position(mut self, position: InsertPosition) -> Self {
        self.insert_position = position;
        self
    }

    pub fn on_error(mut self, f: impl Fn(&Error) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(f));
        self
    }
}

impl std::fmt::Debug for CoordinatorOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoordinatorOptions")
            .field("current_user", &self.current_user)
            .field("initial", &self.initial.len())
            .field("exclusive_reactions", &self.exclusive_reactions)
            .field("insert_position", &self.insert_position)
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

/// Turns whatever list an adapter or a caller hands over into a forest.
///
/// A list is considered flat if some comment has a `parent_id` and none has
/// nested replies; it then goes through `build_tree`. Anything else is taken
/// as already nested.
pub fn normalize(comments: Vec<Comment>) -> Forest {
    let is_flat = comments.iter().any(|c| c.parent_id.is_some())
        && comments.iter().all(|c| c.replies.is_empty());
    match is_flat {
        true => tree::build_tree(comments),
        false => comments.into(),
    }
}

struct Snapshot {
    ticket: u64,
    tree: Forest,
}

struct State {
    tree: Forest,

    /// Tree as it was right before the latest mutation. There is only one
    /// slot: each mutation overwrites the previous snapshot.
    snapshot: Option<Snapshot>,
    next_ticket: u64,

    is_loading: bool,
    error: Option<Error>,
}

struct Inner {
    state: Mutex<State>,
    updates: watch::Sender<Forest>,

    adapter: Option<Arc<dyn Adapter>>,
    capabilities: Capabilities,

    current_user: User,
    exclusive_reactions: bool,
    insert_position: InsertPosition,
    on_error: Option<ErrorCallback>,

    in_flight: Mutex<Vec<JoinHandle<()>>>,
    feed: Mutex<Option<JoinHandle<()>>>,
}

impl Inner {
    fn adapter_for(&self, c: Capability) -> Option<Arc<dyn Adapter>> {
        self.adapter
            .as_ref()
            .filter(|_| self.capabilities.has(c))
            .cloned()
    }

    fn set_tree(&self, state: &mut State, tree: Forest) {
        state.tree = tree.clone();
        self.updates.send_replace(tree);
    }

    /// Applies `change` to the tree after snapshotting it. Returns the ticket
    /// of the snapshot, or `None` if `change` turned out to be a no-op.
    fn apply(&self, change: impl FnOnce(&Forest) -> Forest) -> Option<u64> {
        let mut state = self.state.lock();
        let before = state.tree.clone();
        let after = change(&before);
        if Forest::ptr_eq(&before, &after) {
            return None;
        }
        let ticket = state.next_ticket;
        state.next_ticket += 1;
        state.snapshot = Some(Snapshot {
            ticket,
            tree: before,
        });
        self.set_tree(&mut state, after);
        Some(ticket)
    }

    /// Consumes the snapshot of `ticket`, if nothing overwrote it yet
    fn release(&self, state: &mut State, ticket: u64) {
        if state.snapshot.as_ref().map(|s| s.ticket) == Some(ticket) {
            state.snapshot = None;
        }
    }

    fn reconcile(&self, ticket: u64, change: impl FnOnce(&Forest) -> Forest) {
        let mut state = self.state.lock();
        self.release(&mut state, ticket);
        let after = change(&state.tree);
        if !Forest::ptr_eq(&after, &state.tree) {
            self.set_tree(&mut state, after);
        }
    }

    fn rollback(&self, op: MutationKind, id: CommentId, ticket: u64, err: anyhow::Error) {
        tracing::error!(?err, %op, %id, "adapter call failed, rolling back");
        let error = Error::mutation(op, id.clone(), &err);
        {
            let mut state = self.state.lock();
            match state.snapshot.take() {
                Some(snapshot) if snapshot.ticket == ticket => {
                    self.set_tree(&mut state, snapshot.tree)
                }
                other => {
                    // A later mutation owns the slot now: restoring it would
                    // undo that mutation too
                    state.snapshot = other;
                    let after = match op {
                        MutationKind::Create => {
                            tracing::warn!(%id, ticket, "snapshot was overwritten by a later mutation, dropping the unpersisted comment");
                            tree::remove_node(&state.tree, &id)
                        }
                        _ => {
                            tracing::warn!(%id, ticket, "snapshot was overwritten by a later mutation, flagging the comment instead");
                            let patch = CommentPatch {
                                has_error: Some(true),
                                error_message: Some(Some(error.to_string())),
                                ..CommentPatch::default()
                            };
                            tree::update_node(&state.tree, &id, &patch)
                        }
                    };
                    self.set_tree(&mut state, after);
                }
            }
        }
        self.report(error);
    }

    fn report(&self, error: Error) {
        self.state.lock().error = Some(error.clone());
        if let Some(on_error) = &self.on_error {
            on_error(&error);
        }
    }

    fn spawn(&self, fut: impl Future<Output = ()> + Send + 'static) {
        let handle = tokio::spawn(fut);
        let mut in_flight = self.in_flight.lock();
        in_flight.retain(|h| !h.is_finished());
        in_flight.push(handle);
    }

    /// Sends the mutation of `ticket` to the adapter in the background, if the
    /// adapter can take it. Otherwise the optimistic change is final.
    fn persist<T, Fut>(
        self: &Arc<Self>,
        op: MutationKind,
        id: CommentId,
        ticket: u64,
        call: impl FnOnce(Arc<dyn Adapter>) -> Fut,
        on_success: impl FnOnce(&Inner, T) + Send + 'static,
    ) where
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
        T: Send + 'static,
    {
        let Some(adapter) = self.adapter_for(op.capability()) else {
            tracing::debug!(%op, %id, "no adapter support, keeping the change local");
            return;
        };
        let call = call(adapter);
        let this = self.clone();
        self.spawn(async move {
            match call.await {
                Ok(res) => on_success(&*this, res),
                Err(err) => this.rollback(op, id, ticket, err),
            }
        });
    }

    async fn load(&self, adapter: Arc<dyn Adapter>) -> Result<(), Error> {
        self.state.lock().is_loading = true;
        let res = adapter.fetch(FetchOptions::default()).await;
        match res {
            Ok(res) => {
                let comments = res.into_comments();
                tracing::info!(num_comments = comments.len(), "loaded comments");
                let mut state = self.state.lock();
                state.is_loading = false;
                self.set_tree(&mut state, normalize(comments));
                Ok(())
            }
            Err(err) => {
                tracing::error!(?err, "failed loading comments");
                self.state.lock().is_loading = false;
                let error = Error::Load(format!("{err:#}"));
                self.report(error.clone());
                Err(error)
            }
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(feed) = self.feed.get_mut().take() {
            feed.abort();
        }
    }
}

async fn run_feed(weak: Weak<Inner>, adapter: Arc<dyn Adapter>) {
    let mut feed = match adapter.subscribe().await {
        Ok(feed) => feed,
        Err(err) => {
            tracing::error!(?err, "failed subscribing to realtime updates");
            if let Some(inner) = weak.upgrade() {
                inner.report(Error::Subscribe(format!("{err:#}")));
            }
            return;
        }
    };
    while let Some(comments) = feed.recv().await {
        let Some(inner) = weak.upgrade() else {
            return;
        };
        tracing::debug!(num_comments = comments.len(), "received realtime update");
        // Pushed lists replace the tree wholesale, including any optimistic
        // change still waiting on the adapter
        let mut state = inner.state.lock();
        inner.set_tree(&mut state, normalize(comments));
    }
    tracing::info!("realtime feed closed");
}

/// Owner of the authoritative comment tree.
///
/// Mutations apply to the tree immediately and return; persistence through
/// the adapter happens on a spawned task, which either reconciles the tree
/// with what the adapter returned or rolls it back. Handles are cheap to
/// clone and all share the same tree.
///
/// Constructing a coordinator whose adapter can fetch or subscribe, and any
/// mutation that reaches the adapter, must happen within a tokio runtime.
#[derive(Clone)]
pub struct Coordinator(Arc<Inner>);

impl Coordinator {
    /// Coordinator without persistence: every change is final
    pub fn local(opts: CoordinatorOptions) -> Coordinator {
        Coordinator::build(opts, None)
    }

    pub fn new(opts: CoordinatorOptions, adapter: Arc<dyn Adapter>) -> Coordinator {
        Coordinator::build(opts, Some(adapter))
    }

    fn build(opts: CoordinatorOptions, adapter: Option<Arc<dyn Adapter>>) -> Coordinator {
        let capabilities = adapter
            .as_ref()
            .map(|a| a.capabilities())
            .unwrap_or_else(Capabilities::none);
        let tree = normalize(opts.initial);
        let (updates, _) = watch::channel(tree.clone());
        let inner = Arc::new(Inner {
            state: Mutex::new(State {
                tree,
                snapshot: None,
                next_ticket: 0,
                is_loading: capabilities.fetch,
                error: None,
            }),
            updates,
            adapter,
            capabilities,
            current_user: opts.current_user,
            exclusive_reactions: opts.exclusive_reactions,
            insert_position: opts.insert_position,
            on_error: opts.on_error,
            in_flight: Mutex::new(Vec::new()),
            feed: Mutex::new(None),
        });

        if let Some(adapter) = inner.adapter_for(Capability::Fetch) {
            let this = inner.clone();
            inner.spawn(async move {
                // failures are already recorded by load
                let _ = this.load(adapter).await;
            });
        }
        if let Some(adapter) = inner.adapter_for(Capability::Subscribe) {
            let feed = tokio::spawn(run_feed(Arc::downgrade(&inner), adapter));
            *inner.feed.lock() = Some(feed);
        }

        Coordinator(inner)
    }

    /// Snapshot of the current tree
    pub fn tree(&self) -> Forest {
        self.0.state.lock().tree.clone()
    }

    pub fn find(&self, id: &CommentId) -> Option<Arc<Comment>> {
        tree::find_by_id(&self.tree(), id).cloned()
    }

    /// Receives a new snapshot after every change to the tree
    pub fn watch(&self) -> watch::Receiver<Forest> {
        self.0.updates.subscribe()
    }

    pub fn is_loading(&self) -> bool {
        self.0.state.lock().is_loading
    }

    /// Last adapter failure, if any
    pub fn error(&self) -> Option<Error> {
        self.0.state.lock().error.clone()
    }

    pub fn clear_error(&self) {
        self.0.state.lock().error = None;
    }

    pub fn current_user(&self) -> &User {
        &self.0.current_user
    }

    pub fn capabilities(&self) -> Capabilities {
        self.0.capabilities
    }

    pub fn add_comment(&self, content: impl Into<String>) -> Comment {
        self.add(None, content.into())
    }

    pub fn add_reply(&self, parent_id: &CommentId, content: impl Into<String>) -> Comment {
        self.add(Some(parent_id.clone()), content.into())
    }

    fn add(&self, parent_id: Option<CommentId>, content: String) -> Comment {
        let mut node = Comment::new(
            CommentId::pending(),
            self.0.current_user.clone(),
            content.clone(),
            api::now(),
        );
        node.parent_id = parent_id.clone();
        node.is_pending = true;

        let position = self.0.insert_position;
        let Some(ticket) = self
            .0
            .apply(|tree| tree::add_node(tree, node.clone(), parent_id.as_ref(), position))
        else {
            return node;
        };

        let pending_id = node.id.clone();
        self.0.persist(
            MutationKind::Create,
            pending_id.clone(),
            ticket,
            move |adapter| async move { adapter.create(content, parent_id).await },
            move |inner, persisted: Comment| {
                tracing::debug!(pending = %pending_id, id = %persisted.id, "comment persisted");
                let persisted = Comment {
                    is_pending: false,
                    ..persisted
                };
                inner.reconcile(ticket, |tree| {
                    if tree::find_by_id(tree, &pending_id).is_some() {
                        return tree::replace_node(tree, &pending_id, persisted);
                    }
                    if tree::find_by_id(tree, &persisted.id).is_some() {
                        return tree.clone();
                    }
                    // A fetch or push replaced the tree before the adapter
                    // answered, and did not know about this comment yet
                    tracing::debug!(id = %persisted.id, "pending comment was dropped, inserting the persisted one");
                    let parent_id = persisted.parent_id.clone();
                    tree::add_node(tree, persisted, parent_id.as_ref(), inner.insert_position)
                });
            },
        );
        node
    }

    /// Returns false if the comment is not in the tree, in which case nothing
    /// is sent to the adapter
    pub fn edit_comment(&self, id: &CommentId, content: impl Into<String>) -> bool {
        let content = content.into();
        let patch = CommentPatch::edit(content.clone(), api::now());
        let Some(ticket) = self.0.apply(|tree| tree::update_node(tree, id, &patch)) else {
            tracing::debug!(%id, "edited comment is not in the tree");
            return false;
        };

        let target = id.clone();
        let local = id.clone();
        self.0.persist(
            MutationKind::Update,
            id.clone(),
            ticket,
            move |adapter| async move { adapter.update(target, content).await },
            move |inner, persisted: Comment| {
                let patch = CommentPatch {
                    content: Some(persisted.content),
                    is_edited: Some(true),
                    updated_at: persisted.updated_at,
                    ..CommentPatch::default()
                };
                inner.reconcile(ticket, |tree| tree::update_node(tree, &local, &patch));
            },
        );
        true
    }

    /// Removes the comment and all its replies. Returns false if the comment
    /// is not in the tree.
    pub fn delete_comment(&self, id: &CommentId) -> bool {
        let Some(ticket) = self.0.apply(|tree| tree::remove_node(tree, id)) else {
            tracing::debug!(%id, "deleted comment is not in the tree");
            return false;
        };

        let target = id.clone();
        self.0.persist(
            MutationKind::Delete,
            id.clone(),
            ticket,
            move |adapter| async move { adapter.delete(target).await },
            move |inner, ()| inner.release(&mut inner.state.lock(), ticket),
        );
        true
    }

    /// Returns false if the comment or the reaction does not exist
    pub fn toggle_reaction(&self, id: &CommentId, reaction_id: &ReactionId) -> bool {
        let exclusive = self.0.exclusive_reactions;
        let Some(ticket) = self
            .0
            .apply(|tree| tree::toggle_reaction(tree, id, reaction_id, exclusive))
        else {
            tracing::debug!(%id, %reaction_id, "toggled reaction is not in the tree");
            return false;
        };

        let target = id.clone();
        let reaction = reaction_id.clone();
        self.0.persist(
            MutationKind::ToggleReaction,
            id.clone(),
            ticket,
            move |adapter| async move { adapter.toggle_reaction(target, reaction).await },
            move |inner, ()| inner.release(&mut inner.state.lock(), ticket),
        );
        true
    }

    /// Fetches the comments again, replacing the tree. Does nothing if the
    /// adapter cannot fetch.
    pub async fn reload(&self) -> Result<(), Error> {
        match self.0.adapter_for(Capability::Fetch) {
            Some(adapter) => self.0.load(adapter).await,
            None => Ok(()),
        }
    }

    /// Waits for the initial load and every adapter call issued so far,
    /// including the ones issued while waiting
    pub async fn settled(&self) {
        loop {
            let in_flight = std::mem::take(&mut *self.0.in_flight.lock());
            if in_flight.is_empty() {
                return;
            }
            for handle in in_flight {
                if let Err(err) = handle.await {
                    tracing::error!(?err, "adapter task did not run to completion");
                }
            }
        }
    }

    /// Stops listening to realtime updates and lets the adapter release its
    /// resources. In-flight adapter calls are not cancelled.
    pub fn dispose(&self) {
        if let Some(feed) = self.0.feed.lock().take() {
            feed.abort();
        }
        if let Some(adapter) = &self.0.adapter {
            adapter.dispose();
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::{api::FetchResult, test_util::*};

    fn options() -> CoordinatorOptions {
        CoordinatorOptions::new(User::new("me", "Me"))
    }

    fn seeded() -> CoordinatorOptions {
        options().initial(vec![
            comment("1", "first").with_reactions(vec![reaction("like", 1, false), reaction("love", 3, true)]),
            reply("2", "1", "reply"),
            comment("3", "second"),
        ])
    }

    struct Rejecting;

    #[async_trait]
    impl Adapter for Rejecting {
        fn capabilities(&self) -> Capabilities {
            Capabilities::all().without(Capability::Fetch).without(Capability::Subscribe)
        }

        async fn create(&self, _: String, _: Option<CommentId>) -> anyhow::Result<Comment> {
            Err(anyhow::anyhow!("backend is down"))
        }

        async fn update(&self, _: CommentId, _: String) -> anyhow::Result<Comment> {
            Err(anyhow::anyhow!("backend is down"))
        }

        async fn delete(&self, _: CommentId) -> anyhow::Result<()> {
            Err(anyhow::anyhow!("backend is down"))
        }

        async fn toggle_reaction(&self, _: CommentId, _: ReactionId) -> anyhow::Result<()> {
            Err(anyhow::anyhow!("backend is down"))
        }
    }

    struct Fixed(Vec<Comment>);

    #[async_trait]
    impl Adapter for Fixed {
        fn capabilities(&self) -> Capabilities {
            Capabilities::only(Capability::Fetch)
        }

        async fn fetch(&self, _: FetchOptions) -> anyhow::Result<FetchResult> {
            Ok(FetchResult::List(self.0.clone()))
        }
    }

    #[test]
    fn normalizes_flat_and_nested_input() {
        let flat = normalize(vec![comment("1", "a"), reply("2", "1", "b")]);
        assert_eq!(flat.len(), 1);
        assert_eq!(flat[0].replies[0].id, id("2"));

        let nested = normalize(vec![comment("1", "a").with_replies(vec![reply("2", "1", "b")])]);
        assert_eq!(nested, flat);

        let roots_only = normalize(vec![comment("1", "a"), comment("2", "b")]);
        assert_eq!(roots_only.len(), 2);
    }

    #[test]
    fn local_mutations_are_final() {
        let c = Coordinator::local(seeded());
        assert!(!c.is_loading());
        assert_eq!(c.capabilities(), Capabilities::none());

        let top = c.add_comment("hello");
        assert!(top.is_pending);
        assert_eq!(top.author, User::new("me", "Me"));
        let tree = c.tree();
        assert_eq!(tree.len(), 3);
        assert_eq!(tree[2].id, top.id);

        let reply = c.add_reply(&id("2"), "deep");
        assert_eq!(reply.parent_id, Some(id("2")));
        assert_eq!(c.tree()[0].replies[0].replies[0].id, reply.id);

        assert!(c.edit_comment(&id("3"), "changed"));
        let edited = c.find(&id("3")).expect("comment 3 is still there");
        assert_eq!(edited.content, "changed");
        assert!(edited.is_edited);
        assert!(edited.updated_at.is_some());

        assert!(c.delete_comment(&id("1")));
        assert!(c.find(&id("2")).is_none());
        assert!(c.find(&reply.id).is_none());
        assert!(c.error().is_none());
    }

    #[test]
    fn stale_ids_do_nothing() {
        let c = Coordinator::local(seeded());
        let before = c.tree();
        assert!(!c.edit_comment(&id("nope"), "x"));
        assert!(!c.delete_comment(&id("nope")));
        assert!(!c.toggle_reaction(&id("nope"), &ReactionId::new("like")));
        assert!(!c.toggle_reaction(&id("1"), &ReactionId::new("nope")));
        assert!(Forest::ptr_eq(&before, &c.tree()));
    }

    #[test]
    fn reply_to_unknown_parent_lands_at_root() {
        let c = Coordinator::local(seeded());
        let orphan = c.add_reply(&id("ghost"), "where am I");
        let tree = c.tree();
        assert_eq!(tree.len(), 3);
        assert_eq!(tree[2].id, orphan.id);
    }

    #[test]
    fn exclusive_mode_is_fixed_at_construction() {
        let like = ReactionId::new("like");

        let c = Coordinator::local(seeded().exclusive_reactions(true));
        assert!(c.toggle_reaction(&id("1"), &like));
        let node = c.find(&id("1")).expect("comment 1 exists");
        assert_eq!(node.reactions[0].count, 2);
        assert!(node.reactions[0].is_active);
        assert_eq!(node.reactions[1].count, 2);
        assert!(!node.reactions[1].is_active);

        let c = Coordinator::local(seeded());
        assert!(c.toggle_reaction(&id("1"), &like));
        let node = c.find(&id("1")).expect("comment 1 exists");
        assert!(node.reactions.iter().all(|r| r.is_active));
    }

    #[test]
    fn prepend_option() {
        let c = Coordinator::local(seeded().insert_position(InsertPosition::Prepend));
        let top = c.add_comment("on top");
        assert_eq!(c.tree()[0].id, top.id);
    }

    #[tokio::test]
    async fn watchers_see_every_change() {
        let c = Coordinator::local(seeded());
        let mut rx = c.watch();
        assert_eq!(rx.borrow_and_update().len(), 2);
        c.add_comment("hello");
        assert!(rx.has_changed().expect("coordinator is alive"));
        assert_eq!(rx.borrow_and_update().len(), 3);
    }

    #[tokio::test]
    async fn failed_create_rolls_back() {
        let errors = Arc::new(Mutex::new(Vec::new()));
        let seen = errors.clone();
        let c = Coordinator::new(
            options().on_error(move |e| seen.lock().push(e.clone())),
            Arc::new(Rejecting),
        );

        let node = c.add_comment("hello");
        assert!(node.is_pending);
        assert!(c.find(&node.id).is_some());
        assert!(c.error().is_none());

        c.settled().await;
        assert!(c.find(&node.id).is_none());
        assert!(c.tree().is_empty());
        match c.error() {
            Some(Error::Mutation { op, id, message }) => {
                assert_eq!(op, MutationKind::Create);
                assert_eq!(id, node.id);
                assert!(message.contains("backend is down"));
            }
            e => panic!("unexpected error {e:?}"),
        }
        assert_eq!(errors.lock().len(), 1);

        c.clear_error();
        assert!(c.error().is_none());
    }

    #[tokio::test]
    async fn failed_mutations_restore_snapshot() {
        let c = Coordinator::new(seeded(), Arc::new(Rejecting));
        let original = c.tree();

        assert!(c.edit_comment(&id("2"), "changed"));
        c.settled().await;
        assert_eq!(c.tree(), original);

        assert!(c.delete_comment(&id("1")));
        assert!(c.find(&id("2")).is_none());
        c.settled().await;
        assert_eq!(c.tree(), original);

        assert!(c.toggle_reaction(&id("1"), &ReactionId::new("like")));
        c.settled().await;
        assert_eq!(c.tree(), original);
        assert!(matches!(
            c.error(),
            Some(Error::Mutation {
                op: MutationKind::ToggleReaction,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn loads_once_at_construction() {
        let c = Coordinator::new(
            options(),
            Arc::new(Fixed(vec![comment("1", "a"), reply("2", "1", "b")])),
        );
        assert!(c.is_loading());
        c.settled().await;
        assert!(!c.is_loading());
        assert_eq!(c.tree()[0].replies[0].id, id("2"));

        // no create capability: the new comment stays local and pending
        let node = c.add_comment("local");
        c.settled().await;
        assert!(c.find(&node.id).expect("kept locally").is_pending);
        assert!(c.error().is_none());
    }
}
