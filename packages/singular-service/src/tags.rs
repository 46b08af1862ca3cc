use serde::{Deserialize, Serialize};
use sqlx::PgConnection;
use time::OffsetDateTime;
use uuid::Uuid;

use singular_domain::{Page, Resource};
use singular_storage::{models::TagRow, tags};

use crate::{Error, ListQuery, Result, SingularService, bounded_text, list, optional_text};

pub(crate) const NAME_MAX: usize = 80;
const COLOR_MAX: usize = 32;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagCreateRequest {
	pub name: String,
	pub color: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagUpdateRequest {
	pub name: Option<String>,
	#[serde(default, deserialize_with = "crate::double_option")]
	pub color: Option<Option<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TagView {
	pub id: Uuid,
	pub user_id: Uuid,
	pub name: String,
	pub color: Option<String>,
	#[serde(with = "crate::time_serde")]
	pub created_at: OffsetDateTime,
	#[serde(with = "crate::time_serde")]
	pub updated_at: OffsetDateTime,
	#[serde(with = "crate::time_serde::option")]
	pub deleted_at: Option<OffsetDateTime>,
}
impl From<TagRow> for TagView {
	fn from(row: TagRow) -> Self {
		Self {
			id: row.id,
			user_id: row.user_id,
			name: row.name,
			color: row.color,
			created_at: row.created_at,
			updated_at: row.updated_at,
			deleted_at: row.deleted_at,
		}
	}
}

impl SingularService {
	pub async fn list_tags(&self, user_id: Uuid, query: &ListQuery) -> Result<Page<TagView>> {
		let req = query.page_request(self.cfg.listing.tag_default_limit);
		let page = list::list_page::<TagRow, _>(&self.db, Resource::Tags, user_id, &req).await?;

		Ok(page.map(TagView::from))
	}

	pub async fn search_tags(
		&self,
		user_id: Uuid,
		text: &str,
		query: &ListQuery,
	) -> Result<Page<TagView>> {
		let query = ListQuery { text: Some(list::require_text(text)?), ..query.clone() };

		self.list_tags(user_id, &query).await
	}

	/// Returns the caller's tag with this name, creating it or restoring it from the archive.
	pub async fn create_tag(&self, user_id: Uuid, req: TagCreateRequest) -> Result<TagView> {
		let name = bounded_text("name", &req.name, 1, NAME_MAX)?;
		let color = optional_text("color", req.color.as_deref(), COLOR_MAX)?;
		let mut conn = self.db.pool.acquire().await?;
		let row = ensure_tag(&mut conn, user_id, &name, color.as_deref()).await?;

		Ok(row.into())
	}

	pub async fn update_tag(&self, user_id: Uuid, id: Uuid, req: TagUpdateRequest) -> Result<TagView> {
		let name =
			req.name.as_deref().map(|name| bounded_text("name", name, 1, NAME_MAX)).transpose()?;
		let color = req
			.color
			.map(|value| optional_text("color", value.as_deref(), COLOR_MAX))
			.transpose()?;

		tags::update_tag(
			&self.db.pool,
			user_id,
			id,
			name.as_deref(),
			color.as_ref().map(|value| value.as_deref()),
		)
		.await?
		.map(TagView::from)
		.ok_or_else(|| Error::not_found("Tag not found."))
	}

	pub async fn delete_tag(&self, user_id: Uuid, id: Uuid) -> Result<()> {
		if !tags::delete_tag(&self.db.pool, user_id, id).await? {
			return Err(Error::not_found("Tag not found."));
		}

		Ok(())
	}
}

/// Finds a tag by exact name or inserts it. Archived matches are restored.
pub(crate) async fn ensure_tag(
	conn: &mut PgConnection,
	user_id: Uuid,
	name: &str,
	color: Option<&str>,
) -> Result<TagRow> {
	if let Some(existing) = tags::find_tag_by_name(&mut *conn, user_id, name).await? {
		if existing.deleted_at.is_none() {
			return Ok(existing);
		}

		return tags::restore_tag(&mut *conn, user_id, existing.id)
			.await?
			.ok_or_else(|| Error::not_found("Tag not found."));
	}

	if let Some(row) = tags::insert_tag(&mut *conn, user_id, Uuid::new_v4(), name, color).await? {
		tracing::info!(tag_id = %row.id, "Tag created.");

		return Ok(row);
	}

	// A concurrent writer created the same name first.
	tags::find_tag_by_name(&mut *conn, user_id, name)
		.await?
		.ok_or_else(|| Error::conflict("Tag name already exists."))
}
