//! In-memory list store backed by the domain evaluator.

use std::{
	collections::{BTreeMap, HashMap, HashSet},
	sync::{
		Mutex,
		atomic::{AtomicBool, AtomicUsize, Ordering},
	},
};

use time::OffsetDateTime;
use uuid::Uuid;

use singular_domain::{
	BoxFuture, Hydrate, Keyed, ListPlan, ListStore, Resource, StoreError, StoreResult, Window,
	eval::{self, Cell, Link, Row},
};

#[derive(Debug, Clone, PartialEq)]
enum Value {
	Uuid(Uuid),
	Text(String),
	Timestamp(OffsetDateTime),
	Bool(bool),
}

/// A loosely typed record. Missing columns read as `NULL`.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryRow {
	id: Uuid,
	cells: BTreeMap<String, Value>,
}
impl MemoryRow {
	pub fn new(id: Uuid) -> Self {
		let mut cells = BTreeMap::new();

		cells.insert("id".to_string(), Value::Uuid(id));

		Self { id, cells }
	}

	pub fn id(&self) -> Uuid {
		self.id
	}

	pub fn uuid(mut self, column: &str, value: Uuid) -> Self {
		self.cells.insert(column.to_string(), Value::Uuid(value));

		self
	}

	pub fn text(mut self, column: &str, value: impl Into<String>) -> Self {
		self.cells.insert(column.to_string(), Value::Text(value.into()));

		self
	}

	pub fn timestamp(mut self, column: &str, value: OffsetDateTime) -> Self {
		self.cells.insert(column.to_string(), Value::Timestamp(value));

		self
	}

	pub fn flag(mut self, column: &str, value: bool) -> Self {
		self.cells.insert(column.to_string(), Value::Bool(value));

		self
	}

	pub fn get_text(&self, column: &str) -> Option<&str> {
		match self.cells.get(column) {
			Some(Value::Text(text)) => Some(text.as_str()),
			_ => None,
		}
	}
}
impl Row for MemoryRow {
	fn cell(&self, column: &str) -> Cell<'_> {
		match self.cells.get(column) {
			Some(Value::Uuid(value)) => Cell::Uuid(*value),
			Some(Value::Text(value)) => Cell::Text(value),
			Some(Value::Timestamp(value)) => Cell::Timestamp(*value),
			Some(Value::Bool(value)) => Cell::Bool(*value),
			None => Cell::Null,
		}
	}
}
impl Keyed for MemoryRow {
	fn key(&self) -> Uuid {
		self.id
	}
}

/// Runs list plans against rows held in memory.
///
/// Hydration returns rows in reverse id order so callers must restore the window order themselves.
#[derive(Default)]
pub struct MemoryStore {
	rows: Mutex<HashMap<Resource, Vec<MemoryRow>>>,
	links: Mutex<Vec<Link>>,
	vanishing: Mutex<HashSet<Uuid>>,
	unavailable: AtomicBool,
	calls: AtomicUsize,
}
impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn insert(&self, resource: Resource, row: MemoryRow) {
		self.rows.lock().unwrap_or_else(|err| err.into_inner()).entry(resource).or_default().push(row);
	}

	pub fn link(&self, table: &'static str, record_id: Uuid, target_id: Uuid) {
		self.links.lock().unwrap_or_else(|err| err.into_inner()).push(Link {
			table,
			record_id,
			target_id,
		});
	}

	/// Sets `deleted_at` on a row, or clears it when `at` is `None`.
	pub fn set_deleted(&self, resource: Resource, id: Uuid, at: Option<OffsetDateTime>) {
		let column = resource.spec().deleted_column;
		let mut rows = self.rows.lock().unwrap_or_else(|err| err.into_inner());

		for row in rows.entry(resource).or_default().iter_mut().filter(|row| row.id == id) {
			if let Some(at) = at {
				row.cells.insert(column.to_string(), Value::Timestamp(at));
			} else {
				row.cells.remove(column);
			}
		}
	}

	/// Drops `id` between the id window and hydration, as a concurrent delete would.
	pub fn vanish_before_hydrate(&self, id: Uuid) {
		self.vanishing.lock().unwrap_or_else(|err| err.into_inner()).insert(id);
	}

	pub fn set_unavailable(&self, unavailable: bool) {
		self.unavailable.store(unavailable, Ordering::SeqCst);
	}

	/// Number of store operations served so far.
	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}

	fn begin(&self) -> StoreResult<()> {
		self.calls.fetch_add(1, Ordering::SeqCst);

		if self.unavailable.load(Ordering::SeqCst) {
			return Err(StoreError::Unavailable { message: "Memory store is offline.".to_string() });
		}

		Ok(())
	}

	fn matching(&self, plan: &ListPlan) -> Vec<MemoryRow> {
		let rows = self.rows.lock().unwrap_or_else(|err| err.into_inner());
		let links = self.links.lock().unwrap_or_else(|err| err.into_inner());
		let mut out: Vec<MemoryRow> = rows
			.get(&plan.resource())
			.into_iter()
			.flatten()
			.filter(|row| eval::matches(plan, *row, &links))
			.cloned()
			.collect();

		out.sort_by(|left, right| eval::compare(plan, left, right));

		out
	}
}
impl ListStore for MemoryStore {
	fn count<'a>(&'a self, plan: &'a ListPlan) -> BoxFuture<'a, StoreResult<u64>> {
		Box::pin(async move {
			self.begin()?;

			Ok(self.matching(plan).len() as u64)
		})
	}

	fn select_ids<'a>(
		&'a self,
		plan: &'a ListPlan,
		window: Window,
	) -> BoxFuture<'a, StoreResult<Vec<Uuid>>> {
		Box::pin(async move {
			self.begin()?;

			let offset = usize::try_from(window.offset).unwrap_or(usize::MAX);
			let limit = usize::try_from(window.limit).unwrap_or(usize::MAX);

			Ok(self.matching(plan).iter().skip(offset).take(limit).map(MemoryRow::id).collect())
		})
	}
}
impl Hydrate<MemoryRow> for MemoryStore {
	fn hydrate<'a>(
		&'a self,
		plan: &'a ListPlan,
		ids: &'a [Uuid],
	) -> BoxFuture<'a, StoreResult<Vec<MemoryRow>>> {
		Box::pin(async move {
			self.begin()?;

			let spec = plan.spec();
			let vanishing = self.vanishing.lock().unwrap_or_else(|err| err.into_inner()).clone();
			let rows = self.rows.lock().unwrap_or_else(|err| err.into_inner());
			let mut out: Vec<MemoryRow> = rows
				.get(&plan.resource())
				.into_iter()
				.flatten()
				.filter(|row| ids.contains(&row.id) && !vanishing.contains(&row.id))
				.filter(|row| row.cell(spec.owner_column) == Cell::Uuid(plan.owner()))
				.filter(|row| row.cell(spec.deleted_column).is_null() != plan.archived())
				.cloned()
				.collect();

			out.sort_by(|left, right| right.id.cmp(&left.id));

			Ok(out)
		})
	}
}
