//! Two-phase list engine shared by every listable resource.

use uuid::Uuid;

use singular_domain::{
	Hydrate, Keyed, ListPlan, ListStore, Page, PageMeta, PageRequest, RelationField, Reordered,
	Resource, restore_order,
};

use crate::Result;

/// Caller-facing list parameters after the transport layer has coerced them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
	pub text: Option<String>,
	pub offset: Option<i64>,
	pub limit: Option<i64>,
	pub archived: bool,
	pub project_ids: Vec<Uuid>,
	pub tag_ids: Vec<Uuid>,
}
impl ListQuery {
	pub fn page_request(&self, default_limit: u32) -> PageRequest {
		let mut req = PageRequest::new(
			self.offset.unwrap_or(0),
			self.limit.unwrap_or_else(|| i64::from(default_limit)),
		)
		.with_archived(self.archived)
		.with_filter(RelationField::Project, self.project_ids.iter().copied())
		.with_filter(RelationField::Tag, self.tag_ids.iter().copied());

		if let Some(text) = &self.text {
			req = req.with_text(text.as_str());
		}

		req
	}
}

/// Runs one list request: validate, plan, count and select ids concurrently, hydrate, reorder.
///
/// Validation failures return before the store is touched. Ids that disappear between the id
/// window and hydration are dropped from `items` while `total` keeps the phase-one count.
pub async fn list_page<R, S>(
	store: &S,
	resource: Resource,
	owner: Uuid,
	req: &PageRequest,
) -> Result<Page<R>>
where
	S: ListStore + Hydrate<R>,
	R: Keyed,
{
	let window = req.window()?;
	let plan = ListPlan::build(resource, owner, req)?;

	tracing::debug!(
		resource = resource.as_str(),
		predicates = plan.predicates().len(),
		ranked = plan.search_text().is_some(),
		offset = window.offset,
		limit = window.limit,
		"Running list plan."
	);

	let (total, ids) = tokio::try_join!(store.count(&plan), store.select_ids(&plan, window))?;
	let rows = if ids.is_empty() { Vec::new() } else { store.hydrate(&plan, &ids).await? };
	let Reordered { items, missing } = restore_order(&ids, rows);

	if !missing.is_empty() {
		tracing::debug!(
			resource = resource.as_str(),
			missing = missing.len(),
			"Omitted records that changed between id selection and hydration."
		);
	}

	Ok(Page { items, meta: PageMeta::new(window, total) })
}

pub(crate) fn require_text(text: &str) -> Result<String> {
	let trimmed = text.trim();

	if trimmed.is_empty() {
		return Err(crate::Error::invalid("text must be non-empty."));
	}

	Ok(trimmed.to_string())
}
