use sqlx::PgExecutor;
use uuid::Uuid;

use crate::{
	Error, Result,
	models::{NewProject, PROJECT_COLUMNS, ProjectRow},
};

const DUPLICATE_NAME: &str = "Project name already exists.";

/// Partial project update. `Some(None)` clears a nullable column.
#[derive(Debug, Clone, Default)]
pub struct ProjectPatch {
	pub name: Option<String>,
	pub description: Option<Option<String>>,
	pub color: Option<Option<String>>,
	pub pinned: Option<bool>,
}

pub async fn insert_project<'e, E>(executor: E, project: &NewProject) -> Result<ProjectRow>
where
	E: PgExecutor<'e>,
{
	let sql = format!(
		"\
INSERT INTO projects (id, owner_id, name, description, color, pinned)
VALUES ($1,$2,$3,$4,$5,$6)
RETURNING
\t{PROJECT_COLUMNS}"
	);

	sqlx::query_as::<_, ProjectRow>(&sql)
		.bind(project.id)
		.bind(project.owner_id)
		.bind(project.name.as_str())
		.bind(project.description.as_deref())
		.bind(project.color.as_deref())
		.bind(project.pinned)
		.fetch_one(executor)
		.await
		.map_err(|err| Error::conflict_on_violation(err, DUPLICATE_NAME))
}

/// Fetches an owned project in either archived state.
pub async fn get_project<'e, E>(executor: E, owner_id: Uuid, id: Uuid) -> Result<Option<ProjectRow>>
where
	E: PgExecutor<'e>,
{
	let sql = format!(
		"\
SELECT
\t{PROJECT_COLUMNS}
FROM projects
WHERE id = $1 AND owner_id = $2"
	);
	let row = sqlx::query_as::<_, ProjectRow>(&sql)
		.bind(id)
		.bind(owner_id)
		.fetch_optional(executor)
		.await?;

	Ok(row)
}

pub async fn is_active_project<'e, E>(executor: E, owner_id: Uuid, id: Uuid) -> Result<bool>
where
	E: PgExecutor<'e>,
{
	let exists: bool = sqlx::query_scalar(
		"\
SELECT EXISTS (
\tSELECT 1
\tFROM projects
\tWHERE id = $1 AND owner_id = $2 AND deleted_at IS NULL
)",
	)
	.bind(id)
	.bind(owner_id)
	.fetch_one(executor)
	.await?;

	Ok(exists)
}

pub async fn update_project<'e, E>(
	executor: E,
	owner_id: Uuid,
	id: Uuid,
	patch: &ProjectPatch,
) -> Result<Option<ProjectRow>>
where
	E: PgExecutor<'e>,
{
	let sql = format!(
		"\
UPDATE projects
SET
\tname = COALESCE($3, name),
\tdescription = CASE WHEN $4 THEN $5 ELSE description END,
\tcolor = CASE WHEN $6 THEN $7 ELSE color END,
\tpinned = COALESCE($8, pinned),
\tupdated_at = now()
WHERE id = $1 AND owner_id = $2
RETURNING
\t{PROJECT_COLUMNS}"
	);

	sqlx::query_as::<_, ProjectRow>(&sql)
		.bind(id)
		.bind(owner_id)
		.bind(patch.name.as_deref())
		.bind(patch.description.is_some())
		.bind(patch.description.clone().flatten())
		.bind(patch.color.is_some())
		.bind(patch.color.clone().flatten())
		.bind(patch.pinned)
		.fetch_optional(executor)
		.await
		.map_err(|err| Error::conflict_on_violation(err, DUPLICATE_NAME))
}

/// Sets or clears `deleted_at`. Returns `None` when the project is missing or already in that state.
pub async fn set_project_archived<'e, E>(
	executor: E,
	owner_id: Uuid,
	id: Uuid,
	archived: bool,
) -> Result<Option<ProjectRow>>
where
	E: PgExecutor<'e>,
{
	let sql = format!(
		"\
UPDATE projects
SET deleted_at = CASE WHEN $3 THEN now() ELSE NULL END
WHERE id = $1 AND owner_id = $2 AND (deleted_at IS NULL) = $3
RETURNING
\t{PROJECT_COLUMNS}"
	);
	let row = sqlx::query_as::<_, ProjectRow>(&sql)
		.bind(id)
		.bind(owner_id)
		.bind(archived)
		.fetch_optional(executor)
		.await?;

	Ok(row)
}

pub async fn delete_project<'e, E>(executor: E, owner_id: Uuid, id: Uuid) -> Result<bool>
where
	E: PgExecutor<'e>,
{
	let result = sqlx::query("DELETE FROM projects WHERE id = $1 AND owner_id = $2")
		.bind(id)
		.bind(owner_id)
		.execute(executor)
		.await?;

	Ok(result.rows_affected() > 0)
}
