//! Postgres execution of list plans.
//!
//! Phase one runs the plan as `SELECT r.id ... ORDER BY ... OFFSET ... LIMIT` plus a `COUNT(*)` over
//! the same predicates. Link filters use `EXISTS`, so each record appears once and no `DISTINCT`
//! is needed. Phase two loads full rows by id, re-applying the owner scope and archived flag.

use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use singular_domain::{
	BoxFuture, Hydrate, ListPlan, ListStore, Predicate, Relation, Resource, SortField, StoreError,
	StoreResult, Window,
};

use crate::{
	Error,
	db::Db,
	error, models,
	models::{NoteRecord, NoteRow, ProjectRow, TagRow, UserRow},
	notes,
};

impl ListStore for Db {
	fn count<'a>(&'a self, plan: &'a ListPlan) -> BoxFuture<'a, StoreResult<u64>> {
		Box::pin(async move {
			let mut builder = QueryBuilder::new("SELECT COUNT(*)");

			push_from_where(&mut builder, plan);

			let total: i64 = builder
				.build_query_scalar()
				.fetch_one(&self.pool)
				.await
				.map_err(error::store_error)?;

			Ok(u64::try_from(total).unwrap_or_default())
		})
	}

	fn select_ids<'a>(
		&'a self,
		plan: &'a ListPlan,
		window: Window,
	) -> BoxFuture<'a, StoreResult<Vec<Uuid>>> {
		Box::pin(async move {
			let mut builder = QueryBuilder::new("SELECT r.");

			builder.push(plan.spec().id_column);
			push_from_where(&mut builder, plan);
			push_order_by(&mut builder, plan);
			builder.push(" OFFSET ");
			builder.push_bind(i64::try_from(window.offset).unwrap_or(i64::MAX));
			builder.push(" LIMIT ");
			builder.push_bind(i64::try_from(window.limit).unwrap_or(i64::MAX));

			builder.build_query_scalar().fetch_all(&self.pool).await.map_err(error::store_error)
		})
	}
}

impl Hydrate<UserRow> for Db {
	fn hydrate<'a>(
		&'a self,
		plan: &'a ListPlan,
		ids: &'a [Uuid],
	) -> BoxFuture<'a, StoreResult<Vec<UserRow>>> {
		Box::pin(async move {
			ensure_resource(plan, Resource::Users)?;

			let sql = hydrate_sql(plan, models::USER_COLUMNS);

			sqlx::query_as::<_, UserRow>(&sql)
				.bind(ids)
				.bind(plan.owner())
				.fetch_all(&self.pool)
				.await
				.map_err(error::store_error)
		})
	}
}

impl Hydrate<ProjectRow> for Db {
	fn hydrate<'a>(
		&'a self,
		plan: &'a ListPlan,
		ids: &'a [Uuid],
	) -> BoxFuture<'a, StoreResult<Vec<ProjectRow>>> {
		Box::pin(async move {
			ensure_resource(plan, Resource::Projects)?;

			let sql = hydrate_sql(plan, models::PROJECT_COLUMNS);

			sqlx::query_as::<_, ProjectRow>(&sql)
				.bind(ids)
				.bind(plan.owner())
				.fetch_all(&self.pool)
				.await
				.map_err(error::store_error)
		})
	}
}

impl Hydrate<TagRow> for Db {
	fn hydrate<'a>(
		&'a self,
		plan: &'a ListPlan,
		ids: &'a [Uuid],
	) -> BoxFuture<'a, StoreResult<Vec<TagRow>>> {
		Box::pin(async move {
			ensure_resource(plan, Resource::Tags)?;

			let sql = hydrate_sql(plan, models::TAG_COLUMNS);

			sqlx::query_as::<_, TagRow>(&sql)
				.bind(ids)
				.bind(plan.owner())
				.fetch_all(&self.pool)
				.await
				.map_err(error::store_error)
		})
	}
}

impl Hydrate<NoteRecord> for Db {
	fn hydrate<'a>(
		&'a self,
		plan: &'a ListPlan,
		ids: &'a [Uuid],
	) -> BoxFuture<'a, StoreResult<Vec<NoteRecord>>> {
		Box::pin(async move {
			ensure_resource(plan, Resource::Notes)?;

			let sql = hydrate_sql(plan, models::NOTE_COLUMNS);
			let rows = sqlx::query_as::<_, NoteRow>(&sql)
				.bind(ids)
				.bind(plan.owner())
				.fetch_all(&self.pool)
				.await
				.map_err(error::store_error)?;

			notes::load_note_records(&self.pool, rows).await.map_err(|err| match err {
				Error::Sqlx(inner) => error::store_error(inner),
				other => StoreError::Backend { message: other.to_string() },
			})
		})
	}
}

/// Escapes `%`, `_` and `\` so the text matches literally inside `ILIKE ... ESCAPE '\'`.
pub fn contains_pattern(text: &str) -> String {
	let mut pattern = String::with_capacity(text.len() + 2);

	pattern.push('%');

	for c in text.chars() {
		if matches!(c, '%' | '_' | '\\') {
			pattern.push('\\');
		}

		pattern.push(c);
	}

	pattern.push('%');

	pattern
}

fn push_from_where(builder: &mut QueryBuilder<'_, Postgres>, plan: &ListPlan) {
	let spec = plan.spec();

	builder.push(" FROM ");
	builder.push(spec.table);
	builder.push(" r WHERE ");

	for (idx, predicate) in plan.predicates().iter().enumerate() {
		if idx > 0 {
			builder.push(" AND ");
		}

		match predicate {
			Predicate::Equals { column, value } => {
				builder.push(format_args!("r.{column} = "));
				builder.push_bind(*value);
			},
			Predicate::SoftDeleted { column, archived } => {
				let test = if *archived { "IS NOT NULL" } else { "IS NULL" };

				builder.push(format_args!("r.{column} {test}"));
			},
			Predicate::InSet { relation: Relation::Column { column }, ids, .. } => {
				builder.push(format_args!("r.{column} = ANY("));
				builder.push_bind(ids.clone());
				builder.push(")");
			},
			Predicate::InSet {
				relation: Relation::Link { table, record_column, target_column },
				ids,
				..
			} => {
				builder.push(format_args!(
					"EXISTS (SELECT 1 FROM {table} l WHERE l.{record_column} = r.{} AND l.{target_column} = ANY(",
					spec.id_column
				));
				builder.push_bind(ids.clone());
				builder.push("))");
			},
			Predicate::FuzzyMatch { columns, text } => {
				let pattern = contains_pattern(text);

				builder.push("(");

				for (col_idx, column) in columns.iter().enumerate() {
					if col_idx > 0 {
						builder.push(" OR ");
					}

					builder.push(format_args!("COALESCE(r.{column}, '') ILIKE "));
					builder.push_bind(pattern.clone());
					builder.push(" ESCAPE '\\'");
				}

				builder.push(")");
			},
		}
	}
}

fn push_order_by(builder: &mut QueryBuilder<'_, Postgres>, plan: &ListPlan) {
	builder.push(" ORDER BY ");

	for (idx, key) in plan.order().iter().enumerate() {
		if idx > 0 {
			builder.push(", ");
		}

		match key.field {
			SortField::Score => match plan.fuzzy() {
				Some((columns, text)) => {
					builder.push("GREATEST(");

					for (col_idx, column) in columns.iter().enumerate() {
						if col_idx > 0 {
							builder.push(", ");
						}

						builder.push(format_args!("similarity(COALESCE(r.{column}, ''), "));
						builder.push_bind(text.to_string());
						builder.push(")");
					}

					builder.push(")");
				},
				None => {
					builder.push("0");
				},
			},
			SortField::Column(column) => {
				builder.push(format_args!("r.{column}"));
			},
		}

		builder.push(" ");
		builder.push(key.direction.as_sql());
	}
}

fn hydrate_sql(plan: &ListPlan, columns: &str) -> String {
	let spec = plan.spec();
	let test = if plan.archived() { "IS NOT NULL" } else { "IS NULL" };

	format!(
		"\
SELECT
\t{columns}
FROM {table}
WHERE {id} = ANY($1)
\tAND {owner} = $2
\tAND {deleted} {test}",
		table = spec.table,
		id = spec.id_column,
		owner = spec.owner_column,
		deleted = spec.deleted_column,
	)
}

fn ensure_resource(plan: &ListPlan, expected: Resource) -> StoreResult<()> {
	if plan.resource() == expected {
		return Ok(());
	}

	Err(StoreError::Backend {
		message: format!(
			"Cannot hydrate {} rows for a {} plan.",
			expected.as_str(),
			plan.resource().as_str()
		),
	})
}

#[cfg(test)]
mod tests {
	use singular_domain::{PageRequest, RelationField};

	use super::*;

	fn owner() -> Uuid {
		Uuid::from_u128(0xA)
	}

	fn id_sql(resource: Resource, req: &PageRequest) -> String {
		let plan = ListPlan::build(resource, owner(), req).expect("Failed to build plan.");
		let mut builder = QueryBuilder::new("SELECT r.id");

		push_from_where(&mut builder, &plan);
		push_order_by(&mut builder, &plan);

		builder.into_sql()
	}

	#[test]
	fn pattern_escapes_like_metacharacters() {
		assert_eq!(contains_pattern("50%_a\\b"), "%50\\%\\_a\\\\b%");
		assert_eq!(contains_pattern("plain"), "%plain%");
	}

	#[test]
	fn default_project_listing_orders_pinned_first() {
		let sql = id_sql(Resource::Projects, &PageRequest::new(0, 10));

		assert_eq!(
			sql,
			"SELECT r.id FROM projects r WHERE r.owner_id = $1 AND r.deleted_at IS NULL \
			 ORDER BY r.pinned DESC, r.updated_at DESC, r.id ASC"
		);
	}

	#[test]
	fn note_filters_and_text_fold_into_one_statement() {
		let req = PageRequest::new(0, 10)
			.with_text("proj")
			.with_filter(RelationField::Tag, [Uuid::from_u128(1)])
			.with_archived(true);
		let sql = id_sql(Resource::Notes, &req);

		assert_eq!(
			sql,
			"SELECT r.id FROM notes r WHERE r.user_id = $1 AND r.deleted_at IS NOT NULL \
			 AND EXISTS (SELECT 1 FROM note_tags l WHERE l.note_id = r.id AND l.tag_id = ANY($2)) \
			 AND (COALESCE(r.title, '') ILIKE $3 ESCAPE '\\' OR COALESCE(r.content, '') ILIKE $4 ESCAPE '\\') \
			 ORDER BY GREATEST(similarity(COALESCE(r.title, ''), $5), similarity(COALESCE(r.content, ''), $6)) DESC, \
			 r.updated_at DESC, r.id ASC"
		);
	}

	#[test]
	fn hydrate_reapplies_scope_and_archived_flag() {
		let plan = ListPlan::build(Resource::Tags, owner(), &PageRequest::new(0, 10).with_archived(true))
			.expect("Failed to build plan.");
		let sql = hydrate_sql(&plan, "id");

		assert!(sql.ends_with("WHERE id = ANY($1)\n\tAND user_id = $2\n\tAND deleted_at IS NOT NULL"));
	}
}
