use std::{future::Future, pin::Pin};

use uuid::Uuid;

use crate::{ListPlan, Window};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
	#[error("Store unavailable: {message}")]
	Unavailable { message: String },
	#[error("Store failure: {message}")]
	Backend { message: String },
}

/// Records that can be put back in id order after hydration.
pub trait Keyed {
	fn key(&self) -> Uuid;
}

/// Count and id-window phase of a list query.
pub trait ListStore
where
	Self: Send + Sync,
{
	/// Distinct records matching every predicate of `plan`.
	fn count<'a>(&'a self, plan: &'a ListPlan) -> BoxFuture<'a, StoreResult<u64>>;

	/// Ids of the ordered window `[offset, offset + limit)`.
	fn select_ids<'a>(
		&'a self,
		plan: &'a ListPlan,
		window: Window,
	) -> BoxFuture<'a, StoreResult<Vec<Uuid>>>;
}

/// Loads full records for ids chosen by [`ListStore::select_ids`].
///
/// Implementations re-apply the owner scope and archived flag of `plan` and may return rows in any
/// order. Ids that no longer qualify are simply absent.
pub trait Hydrate<R>
where
	Self: Send + Sync,
{
	fn hydrate<'a>(&'a self, plan: &'a ListPlan, ids: &'a [Uuid]) -> BoxFuture<'a, StoreResult<Vec<R>>>;
}
