use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};
use singular_config::MAX_PAGE_LIMIT;

/// Relation dimensions a list request can filter on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationField {
	Project,
	Tag,
}
impl RelationField {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Project => "projectIds",
			Self::Tag => "tagIds",
		}
	}
}

/// One list call: optional search text, relation filters, an offset window and the archived flag.
///
/// Filters are OR within a field and AND across fields. An empty id set is ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
	pub text: Option<String>,
	pub filters: BTreeMap<RelationField, BTreeSet<Uuid>>,
	pub offset: i64,
	pub limit: i64,
	pub archived: bool,
}
impl PageRequest {
	pub fn new(offset: i64, limit: i64) -> Self {
		Self { text: None, filters: BTreeMap::new(), offset, limit, archived: false }
	}

	pub fn with_text(mut self, text: impl Into<String>) -> Self {
		self.text = Some(text.into());

		self
	}

	pub fn with_filter(mut self, field: RelationField, ids: impl IntoIterator<Item = Uuid>) -> Self {
		self.filters.entry(field).or_default().extend(ids);

		self
	}

	pub fn with_archived(mut self, archived: bool) -> Self {
		self.archived = archived;

		self
	}

	/// Trimmed search text, or `None` when absent or blank.
	pub fn search_text(&self) -> Option<&str> {
		self.text.as_deref().map(str::trim).filter(|text| !text.is_empty())
	}

	pub fn window(&self) -> Result<Window> {
		if self.offset < 0 {
			return Err(Error::InvalidArgument {
				message: "offset must be zero or greater.".to_string(),
			});
		}
		if !(1..=i64::from(MAX_PAGE_LIMIT)).contains(&self.limit) {
			return Err(Error::InvalidArgument {
				message: format!("limit must be in the range 1-{MAX_PAGE_LIMIT}."),
			});
		}

		Ok(Window { offset: self.offset as u64, limit: self.limit as u64 })
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
	pub offset: u64,
	pub limit: u64,
}
impl Window {
	pub fn end(self) -> u64 {
		self.offset.saturating_add(self.limit)
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
	pub offset: u64,
	pub limit: u64,
	pub total: u64,
	pub has_next: bool,
	pub has_prev: bool,
}
impl PageMeta {
	pub fn new(window: Window, total: u64) -> Self {
		Self {
			offset: window.offset,
			limit: window.limit,
			total,
			has_next: window.end() < total,
			has_prev: window.offset > 0,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
	pub items: Vec<T>,
	pub meta: PageMeta,
}
impl<T> Page<T> {
	pub fn map<U, F>(self, f: F) -> Page<U>
	where
		F: FnMut(T) -> U,
	{
		Page { items: self.items.into_iter().map(f).collect(), meta: self.meta }
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn window_rejects_negative_offset() {
		let err = PageRequest::new(-1, 10).window().expect_err("Expected offset error.");

		assert_eq!(
			err,
			Error::InvalidArgument { message: "offset must be zero or greater.".to_string() }
		);
	}

	#[test]
	fn window_rejects_limit_outside_bounds() {
		assert!(PageRequest::new(0, 0).window().is_err());
		assert!(PageRequest::new(0, 101).window().is_err());
		assert!(PageRequest::new(0, -5).window().is_err());
		assert_eq!(PageRequest::new(0, 1).window(), Ok(Window { offset: 0, limit: 1 }));
		assert_eq!(PageRequest::new(7, 100).window(), Ok(Window { offset: 7, limit: 100 }));
	}

	#[test]
	fn search_text_is_trimmed_and_blank_is_absent() {
		assert_eq!(PageRequest::new(0, 10).with_text("  proj ").search_text(), Some("proj"));
		assert_eq!(PageRequest::new(0, 10).with_text(" \t ").search_text(), None);
		assert_eq!(PageRequest::new(0, 10).search_text(), None);
	}

	#[test]
	fn meta_flags_follow_window_and_total() {
		let meta = PageMeta::new(Window { offset: 2, limit: 2 }, 5);

		assert!(meta.has_next);
		assert!(meta.has_prev);

		let meta = PageMeta::new(Window { offset: 3, limit: 2 }, 5);

		assert!(!meta.has_next);

		let meta = PageMeta::new(Window { offset: 0, limit: 20 }, 0);

		assert!(!meta.has_next);
		assert!(!meta.has_prev);
	}

	#[test]
	fn meta_serializes_in_camel_case() {
		let meta = PageMeta::new(Window { offset: 0, limit: 20 }, 21);
		let json = serde_json::to_value(meta).expect("Failed to serialize meta.");

		assert_eq!(
			json,
			serde_json::json!({
				"offset": 0,
				"limit": 20,
				"total": 21,
				"hasNext": true,
				"hasPrev": false,
			})
		);
	}

	#[test]
	fn filters_accumulate_per_field() {
		let a = Uuid::from_u128(1);
		let b = Uuid::from_u128(2);
		let req = PageRequest::new(0, 10)
			.with_filter(RelationField::Tag, [a])
			.with_filter(RelationField::Tag, [b, a]);

		assert_eq!(req.filters[&RelationField::Tag].len(), 2);
	}
}
