use sqlx::PgExecutor;
use uuid::Uuid;

use crate::{
	Error, Result,
	models::{NewUser, USER_COLUMNS, UserRow},
};

#[derive(Debug, Clone, Default)]
pub struct UserPatch {
	pub display_name: Option<String>,
	pub first_name: Option<String>,
	pub last_name: Option<String>,
	pub headline: Option<String>,
	pub location: Option<String>,
	pub website: Option<String>,
}

/// Inserts a user row. Credentials are owned by the auth layer and left at their default.
pub async fn insert_user<'e, E>(executor: E, user: &NewUser) -> Result<UserRow>
where
	E: PgExecutor<'e>,
{
	let sql = format!(
		"\
INSERT INTO users (id, email, display_name, first_name, last_name)
VALUES ($1,$2,$3,$4,$5)
RETURNING
\t{USER_COLUMNS}"
	);

	sqlx::query_as::<_, UserRow>(&sql)
		.bind(user.id)
		.bind(user.email.as_str())
		.bind(user.display_name.as_str())
		.bind(user.first_name.as_deref())
		.bind(user.last_name.as_deref())
		.fetch_one(executor)
		.await
		.map_err(|err| Error::conflict_on_violation(err, "Email or display name already in use."))
}

pub async fn get_user<'e, E>(executor: E, id: Uuid) -> Result<Option<UserRow>>
where
	E: PgExecutor<'e>,
{
	let sql = format!(
		"\
SELECT
\t{USER_COLUMNS}
FROM users
WHERE id = $1 AND deleted_at IS NULL"
	);
	let row = sqlx::query_as::<_, UserRow>(&sql).bind(id).fetch_optional(executor).await?;

	Ok(row)
}

pub async fn get_user_by_email<'e, E>(executor: E, email: &str) -> Result<Option<UserRow>>
where
	E: PgExecutor<'e>,
{
	let sql = format!(
		"\
SELECT
\t{USER_COLUMNS}
FROM users
WHERE lower(email) = lower($1) AND deleted_at IS NULL
LIMIT 1"
	);
	let row = sqlx::query_as::<_, UserRow>(&sql).bind(email).fetch_optional(executor).await?;

	Ok(row)
}

/// Applies the set fields of `patch`; unset fields keep their stored value.
pub async fn update_user<'e, E>(executor: E, id: Uuid, patch: &UserPatch) -> Result<Option<UserRow>>
where
	E: PgExecutor<'e>,
{
	let sql = format!(
		"\
UPDATE users
SET
\tdisplay_name = COALESCE($2, display_name),
\tfirst_name = COALESCE($3, first_name),
\tlast_name = COALESCE($4, last_name),
\theadline = COALESCE($5, headline),
\tlocation = COALESCE($6, location),
\twebsite = COALESCE($7, website),
\tupdated_at = now()
WHERE id = $1 AND deleted_at IS NULL
RETURNING
\t{USER_COLUMNS}"
	);

	sqlx::query_as::<_, UserRow>(&sql)
		.bind(id)
		.bind(patch.display_name.as_deref())
		.bind(patch.first_name.as_deref())
		.bind(patch.last_name.as_deref())
		.bind(patch.headline.as_deref())
		.bind(patch.location.as_deref())
		.bind(patch.website.as_deref())
		.fetch_optional(executor)
		.await
		.map_err(|err| Error::conflict_on_violation(err, "Display name already in use."))
}

/// Sets or clears `deleted_at`. Returns `None` when the user is not in the opposite state.
pub async fn set_user_archived<'e, E>(
	executor: E,
	id: Uuid,
	archived: bool,
) -> Result<Option<UserRow>>
where
	E: PgExecutor<'e>,
{
	let sql = format!(
		"\
UPDATE users
SET deleted_at = CASE WHEN $2 THEN now() ELSE NULL END
WHERE id = $1 AND (deleted_at IS NULL) = $2
RETURNING
\t{USER_COLUMNS}"
	);
	let row =
		sqlx::query_as::<_, UserRow>(&sql).bind(id).bind(archived).fetch_optional(executor).await?;

	Ok(row)
}

pub async fn delete_user<'e, E>(executor: E, id: Uuid) -> Result<bool>
where
	E: PgExecutor<'e>,
{
	let result = sqlx::query("DELETE FROM users WHERE id = $1").bind(id).execute(executor).await?;

	Ok(result.rows_affected() > 0)
}
