mod coordinator;
pub use coordinator::{normalize, Coordinator, CoordinatorOptions, ErrorCallback};

mod error;
pub use error::{Error, MutationKind};

mod optimistic;
pub use optimistic::{Overlay, PatchStore, Patchable};

mod order;
pub use order::{net_score, sort_comments, OrderExt, SortBy, NEGATIVE_REACTIONS};

mod search;
pub use search::{filter_comments, search_comments};

pub mod tree;
pub use tree::{
    add_node, build_tree, count_descendants, find_by_id, flatten, remove_node, replace_node,
    toggle_reaction, update_node, InsertPosition,
};

pub mod api {
    pub use threadkit_api::*;
}

pub mod prelude {
    pub use crate::OrderExt;
}
