use std::collections::HashMap;

use sqlx::{PgConnection, PgExecutor, PgPool};
use time::Date;
use uuid::Uuid;

use crate::{
	Result,
	models::{NOTE_COLUMNS, NewNote, NoteRecord, NoteRow, ProjectRef, TagRow},
};

/// Partial note update. `project_id: Some(None)` detaches the project.
#[derive(Debug, Clone, Default)]
pub struct NotePatch {
	pub title: Option<String>,
	pub content: Option<String>,
	pub work_date: Option<Date>,
	pub project_id: Option<Option<Uuid>>,
}

#[derive(Debug, sqlx::FromRow)]
struct NoteTagRow {
	note_id: Uuid,
	#[sqlx(flatten)]
	tag: TagRow,
}

pub async fn insert_note<'e, E>(executor: E, note: &NewNote) -> Result<NoteRow>
where
	E: PgExecutor<'e>,
{
	let sql = format!(
		"\
INSERT INTO notes (id, user_id, project_id, title, content, work_date)
VALUES ($1,$2,$3,$4,$5,$6)
RETURNING
\t{NOTE_COLUMNS}"
	);
	let row = sqlx::query_as::<_, NoteRow>(&sql)
		.bind(note.id)
		.bind(note.user_id)
		.bind(note.project_id)
		.bind(note.title.as_str())
		.bind(note.content.as_str())
		.bind(note.work_date)
		.fetch_one(executor)
		.await?;

	Ok(row)
}

/// Fetches an owned note in either archived state.
pub async fn get_note<'e, E>(executor: E, user_id: Uuid, id: Uuid) -> Result<Option<NoteRow>>
where
	E: PgExecutor<'e>,
{
	let sql = format!(
		"\
SELECT
\t{NOTE_COLUMNS}
FROM notes
WHERE id = $1 AND user_id = $2"
	);
	let row =
		sqlx::query_as::<_, NoteRow>(&sql).bind(id).bind(user_id).fetch_optional(executor).await?;

	Ok(row)
}

pub async fn update_note<'e, E>(
	executor: E,
	user_id: Uuid,
	id: Uuid,
	patch: &NotePatch,
) -> Result<Option<NoteRow>>
where
	E: PgExecutor<'e>,
{
	let sql = format!(
		"\
UPDATE notes
SET
\ttitle = COALESCE($3, title),
\tcontent = COALESCE($4, content),
\twork_date = COALESCE($5, work_date),
\tproject_id = CASE WHEN $6 THEN $7 ELSE project_id END,
\tupdated_at = now()
WHERE id = $1 AND user_id = $2
RETURNING
\t{NOTE_COLUMNS}"
	);
	let row = sqlx::query_as::<_, NoteRow>(&sql)
		.bind(id)
		.bind(user_id)
		.bind(patch.title.as_deref())
		.bind(patch.content.as_deref())
		.bind(patch.work_date)
		.bind(patch.project_id.is_some())
		.bind(patch.project_id.flatten())
		.fetch_optional(executor)
		.await?;

	Ok(row)
}

/// Sets or clears `deleted_at`. Returns `None` when the note is missing or already in that state.
pub async fn set_note_archived<'e, E>(
	executor: E,
	user_id: Uuid,
	id: Uuid,
	archived: bool,
) -> Result<Option<NoteRow>>
where
	E: PgExecutor<'e>,
{
	let sql = format!(
		"\
UPDATE notes
SET deleted_at = CASE WHEN $3 THEN now() ELSE NULL END
WHERE id = $1 AND user_id = $2 AND (deleted_at IS NULL) = $3
RETURNING
\t{NOTE_COLUMNS}"
	);
	let row = sqlx::query_as::<_, NoteRow>(&sql)
		.bind(id)
		.bind(user_id)
		.bind(archived)
		.fetch_optional(executor)
		.await?;

	Ok(row)
}

pub async fn delete_note<'e, E>(executor: E, user_id: Uuid, id: Uuid) -> Result<bool>
where
	E: PgExecutor<'e>,
{
	let result = sqlx::query("DELETE FROM notes WHERE id = $1 AND user_id = $2")
		.bind(id)
		.bind(user_id)
		.execute(executor)
		.await?;

	Ok(result.rows_affected() > 0)
}

/// Replaces every tag link of a note.
pub async fn replace_note_tags(conn: &mut PgConnection, note_id: Uuid, tag_ids: &[Uuid]) -> Result<()> {
	sqlx::query("DELETE FROM note_tags WHERE note_id = $1").bind(note_id).execute(&mut *conn).await?;

	if tag_ids.is_empty() {
		return Ok(());
	}

	sqlx::query(
		"\
INSERT INTO note_tags (note_id, tag_id)
SELECT $1, tag_id
FROM UNNEST($2::uuid[]) AS t(tag_id)
ON CONFLICT DO NOTHING",
	)
	.bind(note_id)
	.bind(tag_ids)
	.execute(&mut *conn)
	.await?;

	Ok(())
}

/// Attaches active project summaries and active tags to note rows, keeping the input order.
pub async fn load_note_records(pool: &PgPool, notes: Vec<NoteRow>) -> Result<Vec<NoteRecord>> {
	if notes.is_empty() {
		return Ok(Vec::new());
	}

	let note_ids: Vec<Uuid> = notes.iter().map(|note| note.id).collect();
	let project_ids: Vec<Uuid> = notes.iter().filter_map(|note| note.project_id).collect();
	let projects = if project_ids.is_empty() {
		Vec::new()
	} else {
		sqlx::query_as::<_, ProjectRef>(
			"\
SELECT id, name, color
FROM projects
WHERE id = ANY($1) AND deleted_at IS NULL",
		)
		.bind(&project_ids)
		.fetch_all(pool)
		.await?
	};
	let links = sqlx::query_as::<_, NoteTagRow>(
		"\
SELECT
\tnt.note_id,
\tt.id,
\tt.user_id,
\tt.name,
\tt.color,
\tt.created_at,
\tt.updated_at,
\tt.deleted_at
FROM note_tags nt
JOIN tags t ON t.id = nt.tag_id
WHERE nt.note_id = ANY($1) AND t.deleted_at IS NULL
ORDER BY t.name ASC, t.id ASC",
	)
	.bind(&note_ids)
	.fetch_all(pool)
	.await?;
	let projects: HashMap<Uuid, ProjectRef> =
		projects.into_iter().map(|project| (project.id, project)).collect();
	let mut tags: HashMap<Uuid, Vec<TagRow>> = HashMap::new();

	for link in links {
		tags.entry(link.note_id).or_default().push(link.tag);
	}

	let records = notes
		.into_iter()
		.map(|note| NoteRecord {
			project: note.project_id.and_then(|id| projects.get(&id).cloned()),
			tags: tags.remove(&note.id).unwrap_or_default(),
			note,
		})
		.collect();

	Ok(records)
}
