use sqlx::PgExecutor;
use uuid::Uuid;

use crate::{
	Error, Result,
	models::{TAG_COLUMNS, TagRow},
};

const DUPLICATE_NAME: &str = "Tag name already exists.";

/// Inserts a tag, or returns `None` when the owner already has one with this name.
pub async fn insert_tag<'e, E>(
	executor: E,
	user_id: Uuid,
	id: Uuid,
	name: &str,
	color: Option<&str>,
) -> Result<Option<TagRow>>
where
	E: PgExecutor<'e>,
{
	let sql = format!(
		"\
INSERT INTO tags (id, user_id, name, color)
VALUES ($1,$2,$3,$4)
ON CONFLICT (user_id, name) DO NOTHING
RETURNING
\t{TAG_COLUMNS}"
	);

	sqlx::query_as::<_, TagRow>(&sql)
		.bind(id)
		.bind(user_id)
		.bind(name)
		.bind(color)
		.fetch_optional(executor)
		.await
		.map_err(|err| Error::conflict_on_violation(err, "Tag owner does not exist."))
}

/// Looks a tag up by exact name, archived or not.
pub async fn find_tag_by_name<'e, E>(executor: E, user_id: Uuid, name: &str) -> Result<Option<TagRow>>
where
	E: PgExecutor<'e>,
{
	let sql = format!(
		"\
SELECT
\t{TAG_COLUMNS}
FROM tags
WHERE user_id = $1 AND name = $2"
	);
	let row =
		sqlx::query_as::<_, TagRow>(&sql).bind(user_id).bind(name).fetch_optional(executor).await?;

	Ok(row)
}

/// Counts how many of `ids` are active tags of `user_id`.
pub async fn count_active_tags<'e, E>(executor: E, user_id: Uuid, ids: &[Uuid]) -> Result<i64>
where
	E: PgExecutor<'e>,
{
	let count: i64 = sqlx::query_scalar(
		"\
SELECT COUNT(*)
FROM tags
WHERE user_id = $1 AND id = ANY($2) AND deleted_at IS NULL",
	)
	.bind(user_id)
	.bind(ids)
	.fetch_one(executor)
	.await?;

	Ok(count)
}

pub async fn restore_tag<'e, E>(executor: E, user_id: Uuid, id: Uuid) -> Result<Option<TagRow>>
where
	E: PgExecutor<'e>,
{
	let sql = format!(
		"\
UPDATE tags
SET deleted_at = NULL, updated_at = now()
WHERE id = $1 AND user_id = $2
RETURNING
\t{TAG_COLUMNS}"
	);
	let row =
		sqlx::query_as::<_, TagRow>(&sql).bind(id).bind(user_id).fetch_optional(executor).await?;

	Ok(row)
}

/// Renames or recolors a tag. `color: Some(None)` clears the color.
pub async fn update_tag<'e, E>(
	executor: E,
	user_id: Uuid,
	id: Uuid,
	name: Option<&str>,
	color: Option<Option<&str>>,
) -> Result<Option<TagRow>>
where
	E: PgExecutor<'e>,
{
	let sql = format!(
		"\
UPDATE tags
SET
\tname = COALESCE($3, name),
\tcolor = CASE WHEN $4 THEN $5 ELSE color END,
\tupdated_at = now()
WHERE id = $1 AND user_id = $2
RETURNING
\t{TAG_COLUMNS}"
	);

	sqlx::query_as::<_, TagRow>(&sql)
		.bind(id)
		.bind(user_id)
		.bind(name)
		.bind(color.is_some())
		.bind(color.flatten())
		.fetch_optional(executor)
		.await
		.map_err(|err| Error::conflict_on_violation(err, DUPLICATE_NAME))
}

pub async fn delete_tag<'e, E>(executor: E, user_id: Uuid, id: Uuid) -> Result<bool>
where
	E: PgExecutor<'e>,
{
	let result = sqlx::query("DELETE FROM tags WHERE id = $1 AND user_id = $2")
		.bind(id)
		.bind(user_id)
		.execute(executor)
		.await?;

	Ok(result.rows_affected() > 0)
}
