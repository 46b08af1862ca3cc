use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use singular_domain::{Page, Resource};
use singular_storage::{
	models::{NewProject, ProjectRow},
	projects::{self, ProjectPatch},
};

use crate::{Error, ListQuery, Result, SingularService, bounded_text, list, optional_text};

const NAME_MAX: usize = 120;
const DESCRIPTION_MAX: usize = 2_000;
const COLOR_MAX: usize = 32;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectCreateRequest {
	pub name: String,
	pub description: Option<String>,
	pub color: Option<String>,
	#[serde(default)]
	pub pinned: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectUpdateRequest {
	pub name: Option<String>,
	#[serde(default, deserialize_with = "crate::double_option")]
	pub description: Option<Option<String>>,
	#[serde(default, deserialize_with = "crate::double_option")]
	pub color: Option<Option<String>>,
	pub pinned: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectView {
	pub id: Uuid,
	pub owner_id: Uuid,
	pub name: String,
	pub description: Option<String>,
	pub color: Option<String>,
	pub pinned: bool,
	#[serde(with = "crate::time_serde")]
	pub created_at: OffsetDateTime,
	#[serde(with = "crate::time_serde")]
	pub updated_at: OffsetDateTime,
	#[serde(with = "crate::time_serde::option")]
	pub deleted_at: Option<OffsetDateTime>,
}
impl From<ProjectRow> for ProjectView {
	fn from(row: ProjectRow) -> Self {
		Self {
			id: row.id,
			owner_id: row.owner_id,
			name: row.name,
			description: row.description,
			color: row.color,
			pinned: row.pinned,
			created_at: row.created_at,
			updated_at: row.updated_at,
			deleted_at: row.deleted_at,
		}
	}
}

impl SingularService {
	pub async fn create_project(
		&self,
		owner_id: Uuid,
		req: ProjectCreateRequest,
	) -> Result<ProjectView> {
		let project = NewProject {
			id: Uuid::new_v4(),
			owner_id,
			name: bounded_text("name", &req.name, 1, NAME_MAX)?,
			description: optional_text("description", req.description.as_deref(), DESCRIPTION_MAX)?,
			color: optional_text("color", req.color.as_deref(), COLOR_MAX)?,
			pinned: req.pinned,
		};
		let row = projects::insert_project(&self.db.pool, &project).await?;

		tracing::info!(project_id = %row.id, "Project created.");

		Ok(row.into())
	}

	pub async fn get_project(&self, owner_id: Uuid, id: Uuid) -> Result<ProjectView> {
		projects::get_project(&self.db.pool, owner_id, id)
			.await?
			.map(ProjectView::from)
			.ok_or_else(|| Error::not_found("Project not found."))
	}

	pub async fn update_project(
		&self,
		owner_id: Uuid,
		id: Uuid,
		req: ProjectUpdateRequest,
	) -> Result<ProjectView> {
		let patch = ProjectPatch {
			name: req.name.as_deref().map(|name| bounded_text("name", name, 1, NAME_MAX)).transpose()?,
			description: req
				.description
				.map(|value| optional_text("description", value.as_deref(), DESCRIPTION_MAX))
				.transpose()?,
			color: req
				.color
				.map(|value| optional_text("color", value.as_deref(), COLOR_MAX))
				.transpose()?,
			pinned: req.pinned,
		};

		projects::update_project(&self.db.pool, owner_id, id, &patch)
			.await?
			.map(ProjectView::from)
			.ok_or_else(|| Error::not_found("Project not found."))
	}

	pub async fn set_project_pinned(
		&self,
		owner_id: Uuid,
		id: Uuid,
		pinned: bool,
	) -> Result<ProjectView> {
		self.update_project(owner_id, id, ProjectUpdateRequest {
			pinned: Some(pinned),
			..Default::default()
		})
		.await
	}

	pub async fn archive_project(&self, owner_id: Uuid, id: Uuid) -> Result<ProjectView> {
		self.set_project_archived(owner_id, id, true).await
	}

	pub async fn restore_project(&self, owner_id: Uuid, id: Uuid) -> Result<ProjectView> {
		self.set_project_archived(owner_id, id, false).await
	}

	pub async fn delete_project(&self, owner_id: Uuid, id: Uuid) -> Result<()> {
		if !projects::delete_project(&self.db.pool, owner_id, id).await? {
			return Err(Error::not_found("Project not found."));
		}

		tracing::info!(project_id = %id, "Project deleted.");

		Ok(())
	}

	pub async fn list_projects(&self, owner_id: Uuid, query: &ListQuery) -> Result<Page<ProjectView>> {
		let req = query.page_request(self.cfg.listing.default_limit);
		let page = list::list_page::<ProjectRow, _>(&self.db, Resource::Projects, owner_id, &req).await?;

		Ok(page.map(ProjectView::from))
	}

	/// Ranked search; unlike [`Self::list_projects`] the text is mandatory.
	pub async fn search_projects(
		&self,
		owner_id: Uuid,
		text: &str,
		query: &ListQuery,
	) -> Result<Page<ProjectView>> {
		let query = ListQuery { text: Some(list::require_text(text)?), ..query.clone() };

		self.list_projects(owner_id, &query).await
	}

	/// Archiving or restoring a project already in that state returns it unchanged.
	async fn set_project_archived(
		&self,
		owner_id: Uuid,
		id: Uuid,
		archived: bool,
	) -> Result<ProjectView> {
		match projects::set_project_archived(&self.db.pool, owner_id, id, archived).await? {
			Some(row) => Ok(row.into()),
			None => self.get_project(owner_id, id).await,
		}
	}
}
