pub mod eval;
pub mod page;
pub mod plan;
pub mod reorder;
pub mod store;
pub mod trigram;

mod error;

pub use error::{Error, Result};
pub use page::{Page, PageMeta, PageRequest, RelationField, Window};
pub use plan::{Direction, ListPlan, Predicate, Relation, Resource, ResourceSpec, SortField, SortKey};
pub use reorder::{Reordered, restore_order};
pub use store::{BoxFuture, Hydrate, Keyed, ListStore, StoreError, StoreResult};
