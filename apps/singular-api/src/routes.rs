use axum::{
	Json, Router,
	extract::{
		FromRequest, FromRequestParts, Path, Query, Request, State,
		rejection::{JsonRejection, QueryRejection},
	},
	http::{StatusCode, request::Parts},
	response::{IntoResponse, Response},
	routing::{get, patch, post},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use singular_domain::Page;
use singular_service::{
	Error as ServiceError, ListQuery, NoteCreateRequest, NoteUpdateRequest, NoteView,
	ProjectCreateRequest, ProjectUpdateRequest, ProjectView, TagCreateRequest, TagUpdateRequest,
	TagView, UserCreateRequest, UserUpdateRequest, UserView,
};

use crate::state::AppState;

const TRUTHY: [&str; 4] = ["true", "1", "yes", "on"];

type ApiResult<T> = Result<T, ApiError>;

pub fn router(state: AppState) -> Router {
	Router::new().route("/health", get(health)).nest("/v1", v1()).with_state(state)
}

fn v1() -> Router<AppState> {
	Router::new()
		.route("/notes", get(list_notes).post(create_note))
		.route("/notes/{id}", get(get_note).patch(update_note).delete(delete_note))
		.route("/notes/{id}/archive", post(archive_note))
		.route("/notes/{id}/restore", post(restore_note))
		.route("/projects", get(list_projects).post(create_project))
		.route("/projects/search", get(search_projects))
		.route("/projects/{id}", get(get_project).patch(update_project).delete(delete_project))
		.route("/projects/{id}/pin", post(pin_project))
		.route("/projects/{id}/archive", post(archive_project))
		.route("/projects/{id}/restore", post(restore_project))
		.route("/tags", get(list_tags).post(create_tag))
		.route("/tags/search", get(search_tags))
		.route("/tags/{id}", patch(update_tag).delete(delete_tag))
		.route("/users", get(list_users).post(create_user))
		.route("/users/search", get(search_users))
		.route("/users/by-email", get(get_user_by_email))
		.route("/users/{id}", get(get_user).patch(update_user).delete(delete_user))
		.route("/users/{id}/archive", post(archive_user))
		.route("/users/{id}/restore", post(restore_user))
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn list_notes(
	State(state): State<AppState>,
	Caller(caller): Caller,
	ListParams(query): ListParams,
) -> ApiResult<Json<Page<NoteView>>> {
	Ok(Json(state.service.list_notes(caller, &query).await?))
}

async fn create_note(
	State(state): State<AppState>,
	Caller(caller): Caller,
	JsonBody(payload): JsonBody<NoteCreateRequest>,
) -> ApiResult<(StatusCode, Json<NoteView>)> {
	let note = state.service.create_note(caller, payload).await?;

	Ok((StatusCode::CREATED, Json(note)))
}

async fn get_note(
	State(state): State<AppState>,
	Caller(caller): Caller,
	RecordId(id): RecordId,
) -> ApiResult<Json<NoteView>> {
	Ok(Json(state.service.get_note(caller, id).await?))
}

async fn update_note(
	State(state): State<AppState>,
	Caller(caller): Caller,
	RecordId(id): RecordId,
	JsonBody(payload): JsonBody<NoteUpdateRequest>,
) -> ApiResult<Json<NoteView>> {
	Ok(Json(state.service.update_note(caller, id, payload).await?))
}

async fn archive_note(
	State(state): State<AppState>,
	Caller(caller): Caller,
	RecordId(id): RecordId,
) -> ApiResult<Json<NoteView>> {
	Ok(Json(state.service.archive_note(caller, id).await?))
}

async fn restore_note(
	State(state): State<AppState>,
	Caller(caller): Caller,
	RecordId(id): RecordId,
) -> ApiResult<Json<NoteView>> {
	Ok(Json(state.service.restore_note(caller, id).await?))
}

async fn delete_note(
	State(state): State<AppState>,
	Caller(caller): Caller,
	RecordId(id): RecordId,
) -> ApiResult<StatusCode> {
	state.service.delete_note(caller, id).await?;

	Ok(StatusCode::NO_CONTENT)
}

async fn list_projects(
	State(state): State<AppState>,
	Caller(caller): Caller,
	ListParams(query): ListParams,
) -> ApiResult<Json<Page<ProjectView>>> {
	Ok(Json(state.service.list_projects(caller, &query).await?))
}

async fn search_projects(
	State(state): State<AppState>,
	Caller(caller): Caller,
	ListParams(query): ListParams,
) -> ApiResult<Json<Page<ProjectView>>> {
	let text = query.text.clone().unwrap_or_default();

	Ok(Json(state.service.search_projects(caller, &text, &query).await?))
}

async fn create_project(
	State(state): State<AppState>,
	Caller(caller): Caller,
	JsonBody(payload): JsonBody<ProjectCreateRequest>,
) -> ApiResult<(StatusCode, Json<ProjectView>)> {
	let project = state.service.create_project(caller, payload).await?;

	Ok((StatusCode::CREATED, Json(project)))
}

async fn get_project(
	State(state): State<AppState>,
	Caller(caller): Caller,
	RecordId(id): RecordId,
) -> ApiResult<Json<ProjectView>> {
	Ok(Json(state.service.get_project(caller, id).await?))
}

async fn update_project(
	State(state): State<AppState>,
	Caller(caller): Caller,
	RecordId(id): RecordId,
	JsonBody(payload): JsonBody<ProjectUpdateRequest>,
) -> ApiResult<Json<ProjectView>> {
	Ok(Json(state.service.update_project(caller, id, payload).await?))
}

#[derive(Debug, Deserialize)]
struct PinRequest {
	pinned: bool,
}

async fn pin_project(
	State(state): State<AppState>,
	Caller(caller): Caller,
	RecordId(id): RecordId,
	JsonBody(payload): JsonBody<PinRequest>,
) -> ApiResult<Json<ProjectView>> {
	Ok(Json(state.service.set_project_pinned(caller, id, payload.pinned).await?))
}

async fn archive_project(
	State(state): State<AppState>,
	Caller(caller): Caller,
	RecordId(id): RecordId,
) -> ApiResult<Json<ProjectView>> {
	Ok(Json(state.service.archive_project(caller, id).await?))
}

async fn restore_project(
	State(state): State<AppState>,
	Caller(caller): Caller,
	RecordId(id): RecordId,
) -> ApiResult<Json<ProjectView>> {
	Ok(Json(state.service.restore_project(caller, id).await?))
}

async fn delete_project(
	State(state): State<AppState>,
	Caller(caller): Caller,
	RecordId(id): RecordId,
) -> ApiResult<StatusCode> {
	state.service.delete_project(caller, id).await?;

	Ok(StatusCode::NO_CONTENT)
}

async fn list_tags(
	State(state): State<AppState>,
	Caller(caller): Caller,
	ListParams(query): ListParams,
) -> ApiResult<Json<Page<TagView>>> {
	Ok(Json(state.service.list_tags(caller, &query).await?))
}

async fn search_tags(
	State(state): State<AppState>,
	Caller(caller): Caller,
	ListParams(query): ListParams,
) -> ApiResult<Json<Page<TagView>>> {
	let text = query.text.clone().unwrap_or_default();

	Ok(Json(state.service.search_tags(caller, &text, &query).await?))
}

async fn create_tag(
	State(state): State<AppState>,
	Caller(caller): Caller,
	JsonBody(payload): JsonBody<TagCreateRequest>,
) -> ApiResult<Json<TagView>> {
	Ok(Json(state.service.create_tag(caller, payload).await?))
}

async fn update_tag(
	State(state): State<AppState>,
	Caller(caller): Caller,
	RecordId(id): RecordId,
	JsonBody(payload): JsonBody<TagUpdateRequest>,
) -> ApiResult<Json<TagView>> {
	Ok(Json(state.service.update_tag(caller, id, payload).await?))
}

async fn delete_tag(
	State(state): State<AppState>,
	Caller(caller): Caller,
	RecordId(id): RecordId,
) -> ApiResult<StatusCode> {
	state.service.delete_tag(caller, id).await?;

	Ok(StatusCode::NO_CONTENT)
}

async fn list_users(
	State(state): State<AppState>,
	Caller(caller): Caller,
	ListParams(query): ListParams,
) -> ApiResult<Json<Page<UserView>>> {
	Ok(Json(state.service.list_users(caller, &query).await?))
}

async fn search_users(
	State(state): State<AppState>,
	Caller(caller): Caller,
	ListParams(query): ListParams,
) -> ApiResult<Json<Page<UserView>>> {
	let text = query.text.clone().unwrap_or_default();

	Ok(Json(state.service.search_users(caller, &text, &query).await?))
}

/// Account provisioning is called by the fronting auth layer, so it carries no caller.
async fn create_user(
	State(state): State<AppState>,
	JsonBody(payload): JsonBody<UserCreateRequest>,
) -> ApiResult<(StatusCode, Json<UserView>)> {
	let user = state.service.create_user(payload).await?;

	Ok((StatusCode::CREATED, Json(user)))
}

#[derive(Debug, Deserialize)]
struct EmailLookup {
	email: String,
}

async fn get_user_by_email(
	State(state): State<AppState>,
	Caller(_): Caller,
	lookup: Result<Query<EmailLookup>, QueryRejection>,
) -> ApiResult<Json<UserView>> {
	let Query(lookup) = lookup?;

	Ok(Json(state.service.get_user_by_email(&lookup.email).await?))
}

async fn get_user(
	State(state): State<AppState>,
	Caller(_): Caller,
	RecordId(id): RecordId,
) -> ApiResult<Json<UserView>> {
	Ok(Json(state.service.get_user(id).await?))
}

async fn update_user(
	State(state): State<AppState>,
	Caller(caller): Caller,
	RecordId(id): RecordId,
	JsonBody(payload): JsonBody<UserUpdateRequest>,
) -> ApiResult<Json<UserView>> {
	Ok(Json(state.service.update_user(caller, id, payload).await?))
}

async fn archive_user(
	State(state): State<AppState>,
	Caller(caller): Caller,
	RecordId(id): RecordId,
) -> ApiResult<Json<UserView>> {
	Ok(Json(state.service.archive_user(caller, id).await?))
}

async fn restore_user(
	State(state): State<AppState>,
	Caller(caller): Caller,
	RecordId(id): RecordId,
) -> ApiResult<Json<UserView>> {
	Ok(Json(state.service.restore_user(caller, id).await?))
}

async fn delete_user(
	State(state): State<AppState>,
	Caller(caller): Caller,
	RecordId(id): RecordId,
) -> ApiResult<StatusCode> {
	state.service.delete_user(caller, id).await?;

	Ok(StatusCode::NO_CONTENT)
}

/// The authenticated user id, read from the configured identity header.
pub struct Caller(pub Uuid);
impl FromRequestParts<AppState> for Caller {
	type Rejection = ApiError;

	async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
		let header = state.identity_header();
		let value = parts
			.headers
			.get(header)
			.and_then(|value| value.to_str().ok())
			.map(str::trim)
			.filter(|value| !value.is_empty())
			.ok_or_else(|| {
				json_error(
					StatusCode::UNAUTHORIZED,
					"UNAUTHENTICATED",
					format!("{header} header is required."),
					None,
				)
			})?;
		let id = Uuid::parse_str(value).map_err(|_| {
			json_error(
				StatusCode::UNAUTHORIZED,
				"UNAUTHENTICATED",
				format!("{header} header must be a UUID."),
				None,
			)
		})?;

		Ok(Self(id))
	}
}

pub struct RecordId(pub Uuid);
impl<S> FromRequestParts<S> for RecordId
where
	S: Send + Sync,
{
	type Rejection = ApiError;

	async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
		let Path(id) = Path::<Uuid>::from_request_parts(parts, state).await.map_err(|_| {
			json_error(
				StatusCode::BAD_REQUEST,
				"INVALID_ARGUMENT",
				"id must be a UUID.",
				Some(vec!["id".to_string()]),
			)
		})?;

		Ok(Self(id))
	}
}

pub struct JsonBody<T>(pub T);
impl<S, T> FromRequest<S> for JsonBody<T>
where
	Json<T>: FromRequest<S, Rejection = JsonRejection>,
	S: Send + Sync,
{
	type Rejection = ApiError;

	async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
		let Json(value) = Json::<T>::from_request(req, state).await?;

		Ok(Self(value))
	}
}

/// List parameters coerced from the query string.
pub struct ListParams(pub ListQuery);
impl<S> FromRequestParts<S> for ListParams
where
	S: Send + Sync,
{
	type Rejection = ApiError;

	async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
		let Query(raw) = Query::<RawListParams>::from_request_parts(parts, state).await?;

		Ok(Self(list_query(raw)?))
	}
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawListParams {
	q: Option<String>,
	text: Option<String>,
	offset: Option<String>,
	limit: Option<String>,
	archived: Option<String>,
	project_ids: Option<String>,
	tag_ids: Option<String>,
}

fn list_query(raw: RawListParams) -> ApiResult<ListQuery> {
	Ok(ListQuery {
		text: raw.q.or(raw.text),
		offset: raw.offset.as_deref().map(|value| parse_int("offset", value)).transpose()?,
		limit: raw.limit.as_deref().map(|value| parse_int("limit", value)).transpose()?,
		archived: raw.archived.as_deref().is_some_and(is_truthy),
		project_ids: parse_ids("projectIds", raw.project_ids.as_deref())?,
		tag_ids: parse_ids("tagIds", raw.tag_ids.as_deref())?,
	})
}

fn is_truthy(value: &str) -> bool {
	let value = value.trim();

	TRUTHY.iter().any(|candidate| value.eq_ignore_ascii_case(candidate))
}

fn parse_int(field: &str, value: &str) -> ApiResult<i64> {
	value.trim().parse().map_err(|_| invalid_field(field, format!("{field} must be an integer.")))
}

fn parse_ids(field: &str, value: Option<&str>) -> ApiResult<Vec<Uuid>> {
	let Some(value) = value else {
		return Ok(Vec::new());
	};

	value
		.split(',')
		.map(str::trim)
		.filter(|item| !item.is_empty())
		.map(|item| {
			Uuid::parse_str(item).map_err(|_| {
				invalid_field(field, format!("{field} must be a comma-separated list of UUIDs."))
			})
		})
		.collect()
}

fn invalid_field(field: &str, message: String) -> ApiError {
	json_error(StatusCode::BAD_REQUEST, "INVALID_ARGUMENT", message, Some(vec![field.to_string()]))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
	fields: Option<Vec<String>>,
}
impl ApiError {
	fn new(
		status: StatusCode,
		error_code: impl Into<String>,
		message: impl Into<String>,
		fields: Option<Vec<String>>,
	) -> Self {
		Self { status, error_code: error_code.into(), message: message.into(), fields }
	}
}
impl From<ServiceError> for ApiError {
	fn from(err: ServiceError) -> Self {
		match err {
			ServiceError::InvalidArgument { message } =>
				json_error(StatusCode::BAD_REQUEST, "INVALID_ARGUMENT", message, None),
			ServiceError::NotFound { message } =>
				json_error(StatusCode::NOT_FOUND, "NOT_FOUND", message, None),
			ServiceError::Conflict { message } =>
				json_error(StatusCode::CONFLICT, "CONFLICT", message, None),
			ServiceError::Forbidden { message } =>
				json_error(StatusCode::FORBIDDEN, "FORBIDDEN", message, None),
			ServiceError::Unavailable { message } => {
				tracing::warn!(error = %message, "Store unavailable.");

				json_error(
					StatusCode::SERVICE_UNAVAILABLE,
					"UNAVAILABLE",
					"Storage is temporarily unavailable.",
					None,
				)
			},
			ServiceError::Storage { message } => {
				tracing::error!(error = %message, "Storage error.");

				json_error(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL", "Internal error.", None)
			},
		}
	}
}
impl From<JsonRejection> for ApiError {
	fn from(err: JsonRejection) -> Self {
		json_error(err.status(), "INVALID_REQUEST", err.body_text(), None)
	}
}
impl From<QueryRejection> for ApiError {
	fn from(err: QueryRejection) -> Self {
		json_error(StatusCode::BAD_REQUEST, "INVALID_ARGUMENT", err.body_text(), None)
	}
}
impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body =
			ErrorBody { error_code: self.error_code, message: self.message, fields: self.fields };

		(self.status, Json(body)).into_response()
	}
}

pub fn json_error(
	status: StatusCode,
	code: &str,
	message: impl Into<String>,
	fields: Option<Vec<String>>,
) -> ApiError {
	ApiError::new(status, code, message, fields)
}
