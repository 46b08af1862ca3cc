use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use singular_domain::{Page, Resource};
use singular_storage::{
	models::{NewUser, UserRow},
	users::{self, UserPatch},
};

use crate::{Error, ListQuery, Result, SingularService, bounded_text, list, optional_text};

const DISPLAY_NAME_MIN: usize = 2;
const DISPLAY_NAME_MAX: usize = 50;
const PERSON_NAME_MAX: usize = 50;
const HEADLINE_MAX: usize = 120;
const LOCATION_MAX: usize = 120;
const WEBSITE_MAX: usize = 200;

/// Profile fields for a user whose credentials were provisioned elsewhere.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCreateRequest {
	pub email: String,
	pub display_name: String,
	pub first_name: Option<String>,
	pub last_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdateRequest {
	pub display_name: Option<String>,
	pub first_name: Option<String>,
	pub last_name: Option<String>,
	pub headline: Option<String>,
	pub location: Option<String>,
	pub website: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
	pub id: Uuid,
	pub email: String,
	pub display_name: String,
	pub first_name: Option<String>,
	pub last_name: Option<String>,
	pub headline: Option<String>,
	pub location: Option<String>,
	pub website: Option<String>,
	#[serde(with = "crate::time_serde")]
	pub created_at: OffsetDateTime,
	#[serde(with = "crate::time_serde")]
	pub updated_at: OffsetDateTime,
	#[serde(with = "crate::time_serde::option")]
	pub deleted_at: Option<OffsetDateTime>,
}
impl From<UserRow> for UserView {
	fn from(row: UserRow) -> Self {
		Self {
			id: row.id,
			email: row.email,
			display_name: row.display_name,
			first_name: row.first_name,
			last_name: row.last_name,
			headline: row.headline,
			location: row.location,
			website: row.website,
			created_at: row.created_at,
			updated_at: row.updated_at,
			deleted_at: row.deleted_at,
		}
	}
}

impl SingularService {
	pub async fn create_user(&self, req: UserCreateRequest) -> Result<UserView> {
		let email = req.email.trim().to_ascii_lowercase();

		if !is_plausible_email(&email) {
			return Err(Error::invalid("email must be a valid address."));
		}

		let user = NewUser {
			id: Uuid::new_v4(),
			email,
			display_name: bounded_text(
				"displayName",
				&req.display_name,
				DISPLAY_NAME_MIN,
				DISPLAY_NAME_MAX,
			)?,
			first_name: optional_text("firstName", req.first_name.as_deref(), PERSON_NAME_MAX)?,
			last_name: optional_text("lastName", req.last_name.as_deref(), PERSON_NAME_MAX)?,
		};
		let row = users::insert_user(&self.db.pool, &user).await?;

		tracing::info!(user_id = %row.id, "User created.");

		Ok(row.into())
	}

	pub async fn get_user(&self, id: Uuid) -> Result<UserView> {
		users::get_user(&self.db.pool, id)
			.await?
			.map(UserView::from)
			.ok_or_else(|| Error::not_found("User not found."))
	}

	pub async fn get_user_by_email(&self, email: &str) -> Result<UserView> {
		crate::reject_nul("email", email)?;

		users::get_user_by_email(&self.db.pool, email.trim())
			.await?
			.map(UserView::from)
			.ok_or_else(|| Error::not_found("User not found."))
	}

	pub async fn update_user(
		&self,
		caller: Uuid,
		id: Uuid,
		req: UserUpdateRequest,
	) -> Result<UserView> {
		ensure_self(caller, id)?;

		let patch = UserPatch {
			display_name: req
				.display_name
				.as_deref()
				.map(|name| bounded_text("displayName", name, DISPLAY_NAME_MIN, DISPLAY_NAME_MAX))
				.transpose()?,
			first_name: optional_text("firstName", req.first_name.as_deref(), PERSON_NAME_MAX)?,
			last_name: optional_text("lastName", req.last_name.as_deref(), PERSON_NAME_MAX)?,
			headline: optional_text("headline", req.headline.as_deref(), HEADLINE_MAX)?,
			location: optional_text("location", req.location.as_deref(), LOCATION_MAX)?,
			website: optional_text("website", req.website.as_deref(), WEBSITE_MAX)?,
		};

		users::update_user(&self.db.pool, id, &patch)
			.await?
			.map(UserView::from)
			.ok_or_else(|| Error::not_found("User not found."))
	}

	pub async fn archive_user(&self, caller: Uuid, id: Uuid) -> Result<UserView> {
		ensure_self(caller, id)?;

		users::set_user_archived(&self.db.pool, id, true)
			.await?
			.map(UserView::from)
			.ok_or_else(|| Error::not_found("User not found."))
	}

	pub async fn restore_user(&self, caller: Uuid, id: Uuid) -> Result<UserView> {
		ensure_self(caller, id)?;

		users::set_user_archived(&self.db.pool, id, false)
			.await?
			.map(UserView::from)
			.ok_or_else(|| Error::not_found("User not found."))
	}

	pub async fn delete_user(&self, caller: Uuid, id: Uuid) -> Result<()> {
		ensure_self(caller, id)?;

		if !users::delete_user(&self.db.pool, id).await? {
			return Err(Error::not_found("User not found."));
		}

		tracing::info!(user_id = %id, "User deleted.");

		Ok(())
	}

	/// Users are scoped to their own row, so this yields at most the caller.
	pub async fn list_users(&self, caller: Uuid, query: &ListQuery) -> Result<Page<UserView>> {
		let req = query.page_request(self.cfg.listing.user_default_limit);
		let page = list::list_page::<UserRow, _>(&self.db, Resource::Users, caller, &req).await?;

		Ok(page.map(UserView::from))
	}

	pub async fn search_users(
		&self,
		caller: Uuid,
		text: &str,
		query: &ListQuery,
	) -> Result<Page<UserView>> {
		let query = ListQuery { text: Some(list::require_text(text)?), ..query.clone() };

		self.list_users(caller, &query).await
	}
}

fn ensure_self(caller: Uuid, id: Uuid) -> Result<()> {
	if caller == id {
		return Ok(());
	}

	Err(Error::Forbidden { message: "Users may only change their own account.".to_string() })
}

fn is_plausible_email(email: &str) -> bool {
	if email.contains('\0') {
		return false;
	}

	let Some((local, domain)) = email.split_once('@') else {
		return false;
	};

	!local.is_empty()
		&& domain.contains('.')
		&& !domain.starts_with('.')
		&& !domain.ends_with('.')
		&& !email.chars().any(char::is_whitespace)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn only_the_account_owner_may_change_it() {
		let id = Uuid::from_u128(1);

		assert!(ensure_self(id, id).is_ok());
		assert!(matches!(ensure_self(id, Uuid::from_u128(2)), Err(Error::Forbidden { .. })));
	}

	#[test]
	fn email_shape_is_checked() {
		assert!(is_plausible_email("ada@example.com"));
		assert!(!is_plausible_email("ada@localhost"));
		assert!(!is_plausible_email("@example.com"));
		assert!(!is_plausible_email("ada lovelace@example.com"));
		assert!(!is_plausible_email("ada\0@example.com"));
	}
}
