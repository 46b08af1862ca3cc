use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use crate::Keyed;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reordered<R> {
	pub items: Vec<R>,
	/// Requested ids with no hydrated row, in request order.
	pub missing: Vec<Uuid>,
}

/// Puts hydrated rows back in the order of `ids`.
///
/// The first row for an id wins. Rows whose id was not requested are dropped.
pub fn restore_order<R>(ids: &[Uuid], rows: Vec<R>) -> Reordered<R>
where
	R: Keyed,
{
	let mut index = HashMap::with_capacity(ids.len());

	for id in ids {
		let next = index.len();

		index.entry(*id).or_insert(next);
	}

	let mut slots: Vec<Option<R>> = std::iter::repeat_with(|| None).take(index.len()).collect();

	for row in rows {
		if let Some(&slot) = index.get(&row.key())
			&& slots[slot].is_none()
		{
			slots[slot] = Some(row);
		}
	}

	let mut missing = Vec::new();
	let mut items = Vec::with_capacity(slots.len());
	let mut seen = HashSet::with_capacity(index.len());

	for id in ids {
		if !seen.insert(*id) {
			continue;
		}
		if slots[index[id]].is_none() {
			missing.push(*id);
		}
	}
	for row in slots.into_iter().flatten() {
		items.push(row);
	}

	Reordered { items, missing }
}
