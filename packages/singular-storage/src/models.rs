use time::{Date, OffsetDateTime};
use uuid::Uuid;

use singular_domain::Keyed;

/// Public user columns. The password hash is never part of a selection.
pub(crate) const USER_COLUMNS: &str = "\
id,
\temail,
\tdisplay_name,
\tfirst_name,
\tlast_name,
\theadline,
\tlocation,
\twebsite,
\tcreated_at,
\tupdated_at,
\tdeleted_at";
pub(crate) const PROJECT_COLUMNS: &str = "\
id,
\towner_id,
\tname,
\tdescription,
\tcolor,
\tpinned,
\tcreated_at,
\tupdated_at,
\tdeleted_at";
pub(crate) const TAG_COLUMNS: &str = "\
id,
\tuser_id,
\tname,
\tcolor,
\tcreated_at,
\tupdated_at,
\tdeleted_at";
pub(crate) const NOTE_COLUMNS: &str = "\
id,
\tuser_id,
\tproject_id,
\ttitle,
\tcontent,
\twork_date,
\tcreated_at,
\tupdated_at,
\tdeleted_at";

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct UserRow {
	pub id: Uuid,
	pub email: String,
	pub display_name: String,
	pub first_name: Option<String>,
	pub last_name: Option<String>,
	pub headline: Option<String>,
	pub location: Option<String>,
	pub website: Option<String>,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
	pub deleted_at: Option<OffsetDateTime>,
}
impl Keyed for UserRow {
	fn key(&self) -> Uuid {
		self.id
	}
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct ProjectRow {
	pub id: Uuid,
	pub owner_id: Uuid,
	pub name: String,
	pub description: Option<String>,
	pub color: Option<String>,
	pub pinned: bool,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
	pub deleted_at: Option<OffsetDateTime>,
}
impl Keyed for ProjectRow {
	fn key(&self) -> Uuid {
		self.id
	}
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct TagRow {
	pub id: Uuid,
	pub user_id: Uuid,
	pub name: String,
	pub color: Option<String>,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
	pub deleted_at: Option<OffsetDateTime>,
}
impl Keyed for TagRow {
	fn key(&self) -> Uuid {
		self.id
	}
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct NoteRow {
	pub id: Uuid,
	pub user_id: Uuid,
	pub project_id: Option<Uuid>,
	pub title: String,
	pub content: String,
	pub work_date: Date,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
	pub deleted_at: Option<OffsetDateTime>,
}

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct ProjectRef {
	pub id: Uuid,
	pub name: String,
	pub color: Option<String>,
}

/// A note with its project summary and attached tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteRecord {
	pub note: NoteRow,
	pub project: Option<ProjectRef>,
	pub tags: Vec<TagRow>,
}
impl Keyed for NoteRecord {
	fn key(&self) -> Uuid {
		self.note.id
	}
}

#[derive(Debug, Clone)]
pub struct NewUser {
	pub id: Uuid,
	pub email: String,
	pub display_name: String,
	pub first_name: Option<String>,
	pub last_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewProject {
	pub id: Uuid,
	pub owner_id: Uuid,
	pub name: String,
	pub description: Option<String>,
	pub color: Option<String>,
	pub pinned: bool,
}

#[derive(Debug, Clone)]
pub struct NewNote {
	pub id: Uuid,
	pub user_id: Uuid,
	pub project_id: Option<Uuid>,
	pub title: String,
	pub content: String,
	pub work_date: Date,
}
