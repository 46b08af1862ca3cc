use singular_domain::StoreError;

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Sqlx(#[from] sqlx::Error),
	#[error("Not found: {0}")]
	NotFound(String),
	#[error("Conflict: {0}")]
	Conflict(String),
}
impl Error {
	/// Maps unique and foreign key violations to [`Error::Conflict`] with `message`.
	pub(crate) fn conflict_on_violation(err: sqlx::Error, message: &str) -> Self {
		let is_violation = err
			.as_database_error()
			.and_then(|db_err| db_err.code())
			.is_some_and(|code| code == UNIQUE_VIOLATION || code == FOREIGN_KEY_VIOLATION);

		if is_violation { Self::Conflict(message.to_string()) } else { Self::Sqlx(err) }
	}

	/// True when the store could not be reached at all.
	pub fn is_unavailable(&self) -> bool {
		matches!(self, Self::Sqlx(err) if is_connectivity(err))
	}
}

pub(crate) fn store_error(err: sqlx::Error) -> StoreError {
	if is_connectivity(&err) {
		StoreError::Unavailable { message: err.to_string() }
	} else {
		StoreError::Backend { message: err.to_string() }
	}
}

fn is_connectivity(err: &sqlx::Error) -> bool {
	matches!(
		err,
		sqlx::Error::PoolTimedOut
			| sqlx::Error::PoolClosed
			| sqlx::Error::Io(_)
			| sqlx::Error::Tls(_)
			| sqlx::Error::Protocol(_)
			| sqlx::Error::WorkerCrashed
	)
}
