//! Declarative list plans.
//!
//! A [`ListPlan`] is the owner scope, archived flag, relation filters and optional fuzzy text of a
//! [`PageRequest`] folded into an ordered list of conjunctive [`Predicate`] values plus the sort
//! chain. Stores translate a plan into SQL; the evaluator in [`crate::eval`] runs it in memory.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, PageRequest, RelationField, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
	Notes,
	Projects,
	Tags,
	Users,
}
impl Resource {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Notes => "notes",
			Self::Projects => "projects",
			Self::Tags => "tags",
			Self::Users => "users",
		}
	}

	pub fn spec(self) -> &'static ResourceSpec {
		match self {
			Self::Notes => &NOTES,
			Self::Projects => &PROJECTS,
			Self::Tags => &TAGS,
			Self::Users => &USERS,
		}
	}
}

/// Static table layout of a listable resource.
#[derive(Debug)]
pub struct ResourceSpec {
	pub table: &'static str,
	pub id_column: &'static str,
	pub owner_column: &'static str,
	pub deleted_column: &'static str,
	pub updated_column: &'static str,
	pub text_columns: &'static [&'static str],
	/// Sort chain used when no search text is given, before the id tie-break.
	pub default_order: &'static [SortKey],
	pub relations: &'static [(RelationField, Relation)],
}
impl ResourceSpec {
	pub fn relation(&self, field: RelationField) -> Option<Relation> {
		self.relations.iter().find(|(candidate, _)| *candidate == field).map(|(_, relation)| *relation)
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
	/// Foreign key stored on the record itself.
	Column { column: &'static str },
	/// Many-to-many link table.
	Link { table: &'static str, record_column: &'static str, target_column: &'static str },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
	Equals { column: &'static str, value: Uuid },
	SoftDeleted { column: &'static str, archived: bool },
	InSet { field: RelationField, relation: Relation, ids: Vec<Uuid> },
	FuzzyMatch { columns: &'static [&'static str], text: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
	Asc,
	Desc,
}
impl Direction {
	pub fn as_sql(self) -> &'static str {
		match self {
			Self::Asc => "ASC",
			Self::Desc => "DESC",
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
	/// Best trigram similarity across the fuzzy match columns.
	Score,
	Column(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
	pub field: SortField,
	pub direction: Direction,
}
impl SortKey {
	pub const fn asc(column: &'static str) -> Self {
		Self { field: SortField::Column(column), direction: Direction::Asc }
	}

	pub const fn desc(column: &'static str) -> Self {
		Self { field: SortField::Column(column), direction: Direction::Desc }
	}

	pub const fn score() -> Self {
		Self { field: SortField::Score, direction: Direction::Desc }
	}
}

static NOTES: ResourceSpec = ResourceSpec {
	table: "notes",
	id_column: "id",
	owner_column: "user_id",
	deleted_column: "deleted_at",
	updated_column: "updated_at",
	text_columns: &["title", "content"],
	default_order: &[SortKey::desc("updated_at")],
	relations: &[
		(RelationField::Project, Relation::Column { column: "project_id" }),
		(
			RelationField::Tag,
			Relation::Link { table: "note_tags", record_column: "note_id", target_column: "tag_id" },
		),
	],
};
static PROJECTS: ResourceSpec = ResourceSpec {
	table: "projects",
	id_column: "id",
	owner_column: "owner_id",
	deleted_column: "deleted_at",
	updated_column: "updated_at",
	text_columns: &["name", "description"],
	default_order: &[SortKey::desc("pinned"), SortKey::desc("updated_at")],
	relations: &[],
};
static TAGS: ResourceSpec = ResourceSpec {
	table: "tags",
	id_column: "id",
	owner_column: "user_id",
	deleted_column: "deleted_at",
	updated_column: "updated_at",
	text_columns: &["name"],
	default_order: &[SortKey::asc("name")],
	relations: &[],
};
static USERS: ResourceSpec = ResourceSpec {
	table: "users",
	id_column: "id",
	owner_column: "id",
	deleted_column: "deleted_at",
	updated_column: "updated_at",
	text_columns: &["display_name", "first_name", "last_name"],
	default_order: &[SortKey::desc("updated_at")],
	relations: &[],
};

#[derive(Debug, Clone, PartialEq)]
pub struct ListPlan {
	resource: Resource,
	owner: Uuid,
	archived: bool,
	predicates: Vec<Predicate>,
	order: Vec<SortKey>,
}
impl ListPlan {
	/// Folds a request into predicates in a fixed order: owner scope, archived flag, relation
	/// filters, then fuzzy text.
	pub fn build(resource: Resource, owner: Uuid, req: &PageRequest) -> Result<Self> {
		let spec = resource.spec();
		let mut predicates = vec![
			Predicate::Equals { column: spec.owner_column, value: owner },
			Predicate::SoftDeleted { column: spec.deleted_column, archived: req.archived },
		];

		for (field, ids) in &req.filters {
			if ids.is_empty() {
				continue;
			}

			let Some(relation) = spec.relation(*field) else {
				return Err(Error::InvalidArgument {
					message: format!(
						"{} does not support the {} filter.",
						resource.as_str(),
						field.as_str()
					),
				});
			};

			predicates.push(Predicate::InSet {
				field: *field,
				relation,
				ids: ids.iter().copied().collect(),
			});
		}

		let mut order = Vec::with_capacity(spec.default_order.len() + 2);

		if let Some(text) = req.search_text() {
			if text.contains('\0') {
				return Err(Error::InvalidArgument {
					message: "text must not contain NUL characters.".to_string(),
				});
			}

			predicates
				.push(Predicate::FuzzyMatch { columns: spec.text_columns, text: text.to_string() });
			order.push(SortKey::score());
			order.push(SortKey::desc(spec.updated_column));
		} else {
			order.extend_from_slice(spec.default_order);
		}

		order.push(SortKey::asc(spec.id_column));

		Ok(Self { resource, owner, archived: req.archived, predicates, order })
	}

	pub fn resource(&self) -> Resource {
		self.resource
	}

	pub fn spec(&self) -> &'static ResourceSpec {
		self.resource.spec()
	}

	pub fn owner(&self) -> Uuid {
		self.owner
	}

	pub fn archived(&self) -> bool {
		self.archived
	}

	pub fn predicates(&self) -> &[Predicate] {
		&self.predicates
	}

	pub fn order(&self) -> &[SortKey] {
		&self.order
	}

	/// Search text when the plan ranks by similarity.
	pub fn search_text(&self) -> Option<&str> {
		self.predicates.iter().find_map(|predicate| match predicate {
			Predicate::FuzzyMatch { text, .. } => Some(text.as_str()),
			_ => None,
		})
	}

	/// Fuzzy columns and text when the plan ranks by similarity.
	pub fn fuzzy(&self) -> Option<(&'static [&'static str], &str)> {
		self.predicates.iter().find_map(|predicate| match predicate {
			Predicate::FuzzyMatch { columns, text } => Some((*columns, text.as_str())),
			_ => None,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn owner() -> Uuid {
		Uuid::from_u128(0xA)
	}

	#[test]
	fn owner_scope_and_archived_flag_come_first() {
		let plan = ListPlan::build(Resource::Projects, owner(), &PageRequest::new(0, 10))
			.expect("Failed to build plan.");

		assert_eq!(
			plan.predicates(),
			&[
				Predicate::Equals { column: "owner_id", value: owner() },
				Predicate::SoftDeleted { column: "deleted_at", archived: false },
			]
		);
	}

	#[test]
	fn default_order_ends_with_id_tie_break() {
		let plan = ListPlan::build(Resource::Projects, owner(), &PageRequest::new(0, 10))
			.expect("Failed to build plan.");

		assert_eq!(
			plan.order(),
			&[SortKey::desc("pinned"), SortKey::desc("updated_at"), SortKey::asc("id")]
		);

		let plan = ListPlan::build(Resource::Tags, owner(), &PageRequest::new(0, 10))
			.expect("Failed to build plan.");

		assert_eq!(plan.order(), &[SortKey::asc("name"), SortKey::asc("id")]);
	}

	#[test]
	fn search_text_switches_to_score_order() {
		let req = PageRequest::new(0, 10).with_text("  alpha ");
		let plan =
			ListPlan::build(Resource::Notes, owner(), &req).expect("Failed to build plan.");

		assert_eq!(plan.search_text(), Some("alpha"));
		assert_eq!(
			plan.order(),
			&[SortKey::score(), SortKey::desc("updated_at"), SortKey::asc("id")]
		);
		assert!(matches!(
			plan.predicates().last(),
			Some(&Predicate::FuzzyMatch { columns: &["title", "content"], .. })
		));
	}

	#[test]
	fn nul_in_search_text_is_rejected() {
		let req = PageRequest::new(0, 10).with_text("a\0b");
		let err = ListPlan::build(Resource::Notes, owner(), &req)
			.expect_err("Expected NUL text to be rejected.");

		assert!(matches!(err, Error::InvalidArgument { .. }), "Unexpected error: {err:?}");
	}

	#[test]
	fn blank_text_keeps_default_order() {
		let req = PageRequest::new(0, 10).with_text("   ");
		let plan =
			ListPlan::build(Resource::Notes, owner(), &req).expect("Failed to build plan.");

		assert_eq!(plan.search_text(), None);
		assert_eq!(plan.order(), &[SortKey::desc("updated_at"), SortKey::asc("id")]);
	}

	#[test]
	fn note_filters_map_to_column_and_link() {
		let tag = Uuid::from_u128(1);
		let project = Uuid::from_u128(2);
		let req = PageRequest::new(0, 10)
			.with_filter(RelationField::Tag, [tag])
			.with_filter(RelationField::Project, [project]);
		let plan =
			ListPlan::build(Resource::Notes, owner(), &req).expect("Failed to build plan.");

		assert_eq!(
			&plan.predicates()[2..],
			&[
				Predicate::InSet {
					field: RelationField::Project,
					relation: Relation::Column { column: "project_id" },
					ids: vec![project],
				},
				Predicate::InSet {
					field: RelationField::Tag,
					relation: Relation::Link {
						table: "note_tags",
						record_column: "note_id",
						target_column: "tag_id",
					},
					ids: vec![tag],
				},
			]
		);
	}

	#[test]
	fn empty_filter_sets_are_ignored() {
		let req = PageRequest::new(0, 10).with_filter(RelationField::Tag, []);
		let plan =
			ListPlan::build(Resource::Tags, owner(), &req).expect("Failed to build plan.");

		assert_eq!(plan.predicates().len(), 2);
	}

	#[test]
	fn unsupported_relation_filter_is_rejected() {
		let req = PageRequest::new(0, 10).with_filter(RelationField::Tag, [Uuid::from_u128(1)]);
		let err = ListPlan::build(Resource::Projects, owner(), &req)
			.expect_err("Expected unsupported filter error.");

		assert_eq!(
			err,
			Error::InvalidArgument {
				message: "projects does not support the tagIds filter.".to_string()
			}
		);
	}

	#[test]
	fn users_are_scoped_on_their_own_id() {
		let plan = ListPlan::build(Resource::Users, owner(), &PageRequest::new(0, 10))
			.expect("Failed to build plan.");

		assert_eq!(plan.predicates()[0], Predicate::Equals { column: "id", value: owner() });
	}
}
