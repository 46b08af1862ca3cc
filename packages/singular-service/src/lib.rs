pub mod list;
pub mod notes;
pub mod projects;
pub mod tags;
pub mod time_serde;
pub mod users;

mod error;

pub use error::{Error, Result};
pub use list::{ListQuery, list_page};
pub use notes::{NoteCreateRequest, NoteProjectView, NoteUpdateRequest, NoteView};
pub use projects::{ProjectCreateRequest, ProjectUpdateRequest, ProjectView};
pub use tags::{TagCreateRequest, TagUpdateRequest, TagView};
pub use users::{UserCreateRequest, UserUpdateRequest, UserView};

use serde::{Deserialize, Deserializer};

use singular_config::Config;
use singular_storage::db::Db;

pub struct SingularService {
	pub cfg: Config,
	pub db: Db,
}
impl SingularService {
	pub fn new(cfg: Config, db: Db) -> Self {
		Self { cfg, db }
	}
}

/// Distinguishes an absent field from an explicit `null` in patch bodies.
pub(crate) fn double_option<'de, D, T>(
	deserializer: D,
) -> std::result::Result<Option<Option<T>>, D::Error>
where
	D: Deserializer<'de>,
	T: Deserialize<'de>,
{
	Option::<T>::deserialize(deserializer).map(Some)
}

/// Trims `value` and checks its length in characters.
pub(crate) fn bounded_text(field: &str, value: &str, min: usize, max: usize) -> Result<String> {
	reject_nul(field, value)?;

	let trimmed = value.trim();
	let len = trimmed.chars().count();

	if len < min || len > max {
		return Err(Error::invalid(if min == 0 {
			format!("{field} must be at most {max} characters.")
		} else {
			format!("{field} must be between {min} and {max} characters.")
		}));
	}

	Ok(trimmed.to_string())
}

/// Postgres text columns cannot store `\0`.
pub(crate) fn reject_nul(field: &str, value: &str) -> Result<()> {
	if value.contains('\0') {
		return Err(Error::invalid(format!("{field} must not contain NUL characters.")));
	}

	Ok(())
}

/// Like [`bounded_text`], mapping blank input to `None`.
pub(crate) fn optional_text(field: &str, value: Option<&str>, max: usize) -> Result<Option<String>> {
	match value.map(str::trim).filter(|value| !value.is_empty()) {
		Some(value) => bounded_text(field, value, 1, max).map(Some),
		None => Ok(None),
	}
}
