//! In-memory evaluation of a [`ListPlan`].
//!
//! Mirrors what the Postgres store does with the same plan so list behaviour can be exercised
//! without a database. `NULL` sorts as the largest value, as in Postgres.

use std::cmp::Ordering;

use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
	plan::{Direction, ListPlan, Predicate, Relation, SortField},
	trigram,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cell<'a> {
	Uuid(Uuid),
	Text(&'a str),
	Timestamp(OffsetDateTime),
	Bool(bool),
	Null,
}
impl Cell<'_> {
	pub fn is_null(&self) -> bool {
		matches!(self, Self::Null)
	}

	fn as_text(&self) -> &str {
		match self {
			Self::Text(text) => text,
			_ => "",
		}
	}
}

pub trait Row {
	/// Value of `column`, or [`Cell::Null`] when the row has none.
	fn cell(&self, column: &str) -> Cell<'_>;
}

/// One row of a link table such as `note_tags`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Link {
	pub table: &'static str,
	pub record_id: Uuid,
	pub target_id: Uuid,
}

pub fn matches<R>(plan: &ListPlan, row: &R, links: &[Link]) -> bool
where
	R: Row,
{
	let id_column = plan.spec().id_column;

	plan.predicates().iter().all(|predicate| match predicate {
		Predicate::Equals { column, value } => row.cell(column) == Cell::Uuid(*value),
		Predicate::SoftDeleted { column, archived } => row.cell(column).is_null() != *archived,
		Predicate::InSet { relation: Relation::Column { column }, ids, .. } => match row.cell(column) {
			Cell::Uuid(value) => ids.contains(&value),
			_ => false,
		},
		Predicate::InSet { relation: Relation::Link { table, .. }, ids, .. } => {
			let Cell::Uuid(record_id) = row.cell(id_column) else {
				return false;
			};

			links.iter().any(|link| {
				link.table == *table && link.record_id == record_id && ids.contains(&link.target_id)
			})
		},
		Predicate::FuzzyMatch { columns, text } => {
			let needle = text.to_lowercase();

			columns.iter().any(|column| row.cell(column).as_text().to_lowercase().contains(&needle))
		},
	})
}

/// Best similarity across the fuzzy columns, or `None` when the plan does not rank.
pub fn score<R>(plan: &ListPlan, row: &R) -> Option<f32>
where
	R: Row,
{
	let (columns, text) = plan.fuzzy()?;

	Some(
		columns
			.iter()
			.map(|column| trigram::similarity(row.cell(column).as_text(), text))
			.fold(0.0, f32::max),
	)
}

pub fn compare<R>(plan: &ListPlan, left: &R, right: &R) -> Ordering
where
	R: Row,
{
	for key in plan.order() {
		let ordering = match key.field {
			SortField::Score => {
				let left = score(plan, left).unwrap_or_default();
				let right = score(plan, right).unwrap_or_default();

				left.total_cmp(&right)
			},
			SortField::Column(column) => compare_cells(left.cell(column), right.cell(column)),
		};
		let ordering = match key.direction {
			Direction::Asc => ordering,
			Direction::Desc => ordering.reverse(),
		};

		if ordering != Ordering::Equal {
			return ordering;
		}
	}

	Ordering::Equal
}

fn compare_cells(left: Cell<'_>, right: Cell<'_>) -> Ordering {
	match (left, right) {
		(Cell::Null, Cell::Null) => Ordering::Equal,
		(Cell::Null, _) => Ordering::Greater,
		(_, Cell::Null) => Ordering::Less,
		(Cell::Uuid(left), Cell::Uuid(right)) => left.cmp(&right),
		(Cell::Text(left), Cell::Text(right)) => left.cmp(right),
		(Cell::Timestamp(left), Cell::Timestamp(right)) => left.cmp(&right),
		(Cell::Bool(left), Cell::Bool(right)) => left.cmp(&right),
		_ => Ordering::Equal,
	}
}
