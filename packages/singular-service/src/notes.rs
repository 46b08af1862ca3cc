use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use sqlx::PgConnection;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use singular_domain::{Page, Resource};
use singular_storage::{
	models::{NewNote, NoteRecord, NoteRow, ProjectRef},
	notes::{self, NotePatch},
	projects, tags as tag_store,
};

use crate::{
	Error, ListQuery, Result, SingularService, TagView, bounded_text, list, reject_nul,
	tags::{self, ensure_tag},
};

const TITLE_MAX: usize = 200;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteCreateRequest {
	pub title: String,
	pub content: Option<String>,
	#[serde(default, with = "crate::time_serde::date::option")]
	pub work_date: Option<Date>,
	pub project_id: Option<Uuid>,
	pub tag_ids: Option<Vec<Uuid>>,
	pub tag_names: Option<Vec<String>>,
}

/// Partial note update. `projectId: null` detaches the project; tags are replaced only when
/// `tagIds` or `tagNames` is present.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteUpdateRequest {
	pub title: Option<String>,
	pub content: Option<String>,
	#[serde(default, with = "crate::time_serde::date::option")]
	pub work_date: Option<Date>,
	#[serde(default, deserialize_with = "crate::double_option")]
	pub project_id: Option<Option<Uuid>>,
	pub tag_ids: Option<Vec<Uuid>>,
	pub tag_names: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteProjectView {
	pub id: Uuid,
	pub name: String,
	pub color: Option<String>,
}
impl From<ProjectRef> for NoteProjectView {
	fn from(project: ProjectRef) -> Self {
		Self { id: project.id, name: project.name, color: project.color }
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteView {
	pub id: Uuid,
	pub user_id: Uuid,
	pub title: String,
	#[serde(with = "crate::time_serde::date")]
	pub work_date: Date,
	pub content: String,
	pub project: Option<NoteProjectView>,
	pub tags: Vec<TagView>,
	#[serde(with = "crate::time_serde")]
	pub created_at: OffsetDateTime,
	#[serde(with = "crate::time_serde")]
	pub updated_at: OffsetDateTime,
	#[serde(with = "crate::time_serde::option")]
	pub deleted_at: Option<OffsetDateTime>,
}
impl From<NoteRecord> for NoteView {
	fn from(record: NoteRecord) -> Self {
		let NoteRecord { note, project, tags } = record;

		Self {
			id: note.id,
			user_id: note.user_id,
			title: note.title,
			work_date: note.work_date,
			content: note.content,
			project: project.map(NoteProjectView::from),
			tags: tags.into_iter().map(TagView::from).collect(),
			created_at: note.created_at,
			updated_at: note.updated_at,
			deleted_at: note.deleted_at,
		}
	}
}

impl SingularService {
	pub async fn create_note(&self, user_id: Uuid, req: NoteCreateRequest) -> Result<NoteView> {
		let title = bounded_text("title", &req.title, 1, TITLE_MAX)?;

		if let Some(content) = &req.content {
			reject_nul("content", content)?;
		}

		let note = NewNote {
			id: Uuid::new_v4(),
			user_id,
			project_id: req.project_id,
			title,
			content: req.content.unwrap_or_default(),
			work_date: req.work_date.unwrap_or_else(|| OffsetDateTime::now_utc().date()),
		};
		let mut tx = self.db.pool.begin().await?;

		if let Some(project_id) = note.project_id {
			ensure_active_project(&mut tx, user_id, project_id).await?;
		}

		let tag_ids =
			resolve_tags(&mut tx, user_id, req.tag_ids.as_deref(), req.tag_names.as_deref()).await?;
		let row = notes::insert_note(&mut *tx, &note).await?;

		if let Some(tag_ids) = tag_ids {
			notes::replace_note_tags(&mut tx, row.id, &tag_ids).await?;
		}

		tx.commit().await?;

		tracing::info!(note_id = %row.id, "Note created.");

		self.note_view(row).await
	}

	pub async fn get_note(&self, user_id: Uuid, id: Uuid) -> Result<NoteView> {
		let row = notes::get_note(&self.db.pool, user_id, id)
			.await?
			.ok_or_else(|| Error::not_found("Note not found."))?;

		self.note_view(row).await
	}

	pub async fn update_note(&self, user_id: Uuid, id: Uuid, req: NoteUpdateRequest) -> Result<NoteView> {
		if let Some(content) = &req.content {
			reject_nul("content", content)?;
		}

		let patch = NotePatch {
			title: req
				.title
				.as_deref()
				.map(|title| bounded_text("title", title, 1, TITLE_MAX))
				.transpose()?,
			content: req.content,
			work_date: req.work_date,
			project_id: req.project_id,
		};
		let mut tx = self.db.pool.begin().await?;

		if let Some(Some(project_id)) = patch.project_id {
			ensure_active_project(&mut tx, user_id, project_id).await?;
		}

		let tag_ids =
			resolve_tags(&mut tx, user_id, req.tag_ids.as_deref(), req.tag_names.as_deref()).await?;
		let row = notes::update_note(&mut *tx, user_id, id, &patch)
			.await?
			.ok_or_else(|| Error::not_found("Note not found."))?;

		if let Some(tag_ids) = tag_ids {
			notes::replace_note_tags(&mut tx, row.id, &tag_ids).await?;
		}

		tx.commit().await?;

		self.note_view(row).await
	}

	pub async fn archive_note(&self, user_id: Uuid, id: Uuid) -> Result<NoteView> {
		self.set_note_archived(user_id, id, true).await
	}

	pub async fn restore_note(&self, user_id: Uuid, id: Uuid) -> Result<NoteView> {
		self.set_note_archived(user_id, id, false).await
	}

	pub async fn delete_note(&self, user_id: Uuid, id: Uuid) -> Result<()> {
		if !notes::delete_note(&self.db.pool, user_id, id).await? {
			return Err(Error::not_found("Note not found."));
		}

		tracing::info!(note_id = %id, "Note deleted.");

		Ok(())
	}

	/// Lists notes with optional `projectIds`/`tagIds` filters and ranked text search.
	pub async fn list_notes(&self, user_id: Uuid, query: &ListQuery) -> Result<Page<NoteView>> {
		let req = query.page_request(self.cfg.listing.default_limit);
		let page = list::list_page::<NoteRecord, _>(&self.db, Resource::Notes, user_id, &req).await?;

		Ok(page.map(NoteView::from))
	}

	async fn set_note_archived(&self, user_id: Uuid, id: Uuid, archived: bool) -> Result<NoteView> {
		match notes::set_note_archived(&self.db.pool, user_id, id, archived).await? {
			Some(row) => self.note_view(row).await,
			None => self.get_note(user_id, id).await,
		}
	}

	async fn note_view(&self, row: NoteRow) -> Result<NoteView> {
		let record = notes::load_note_records(&self.db.pool, vec![row])
			.await?
			.pop()
			.ok_or_else(|| Error::not_found("Note not found."))?;

		Ok(record.into())
	}
}

async fn ensure_active_project(conn: &mut PgConnection, user_id: Uuid, project_id: Uuid) -> Result<()> {
	if projects::is_active_project(&mut *conn, user_id, project_id).await? {
		return Ok(());
	}

	Err(Error::conflict("Project not found or not yours."))
}

/// Resolves the final tag set, or `None` when neither ids nor names were given.
async fn resolve_tags(
	conn: &mut PgConnection,
	user_id: Uuid,
	tag_ids: Option<&[Uuid]>,
	tag_names: Option<&[String]>,
) -> Result<Option<Vec<Uuid>>> {
	if tag_ids.is_none() && tag_names.is_none() {
		return Ok(None);
	}

	let mut resolved: BTreeSet<Uuid> = tag_ids.unwrap_or_default().iter().copied().collect();

	if !resolved.is_empty() {
		let ids: Vec<Uuid> = resolved.iter().copied().collect();
		let owned = tag_store::count_active_tags(&mut *conn, user_id, &ids).await?;

		if usize::try_from(owned).unwrap_or_default() != ids.len() {
			return Err(Error::conflict("Tag not found or not yours."));
		}
	}

	let names: BTreeSet<&str> = tag_names
		.unwrap_or_default()
		.iter()
		.map(|name| name.trim())
		.filter(|name| !name.is_empty())
		.collect();

	for name in names {
		let name = bounded_text("tag name", name, 1, tags::NAME_MAX)?;
		let tag = ensure_tag(&mut *conn, user_id, &name, None).await?;

		resolved.insert(tag.id);
	}

	Ok(Some(resolved.into_iter().collect()))
}
