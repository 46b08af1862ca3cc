use singular_domain::StoreError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid argument: {message}")]
	InvalidArgument { message: String },
	#[error("Not found: {message}")]
	NotFound { message: String },
	#[error("Conflict: {message}")]
	Conflict { message: String },
	#[error("Forbidden: {message}")]
	Forbidden { message: String },
	#[error("Store unavailable: {message}")]
	Unavailable { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
}
impl Error {
	pub(crate) fn invalid(message: impl Into<String>) -> Self {
		Self::InvalidArgument { message: message.into() }
	}

	pub(crate) fn not_found(message: impl Into<String>) -> Self {
		Self::NotFound { message: message.into() }
	}

	pub(crate) fn conflict(message: impl Into<String>) -> Self {
		Self::Conflict { message: message.into() }
	}
}
impl From<singular_domain::Error> for Error {
	fn from(err: singular_domain::Error) -> Self {
		match err {
			singular_domain::Error::InvalidArgument { message } => Self::InvalidArgument { message },
		}
	}
}
impl From<StoreError> for Error {
	fn from(err: StoreError) -> Self {
		match err {
			StoreError::Unavailable { message } => Self::Unavailable { message },
			StoreError::Backend { message } => Self::Storage { message },
		}
	}
}
impl From<singular_storage::Error> for Error {
	fn from(err: singular_storage::Error) -> Self {
		if err.is_unavailable() {
			return Self::Unavailable { message: err.to_string() };
		}

		match err {
			singular_storage::Error::Sqlx(inner) => Self::Storage { message: inner.to_string() },
			singular_storage::Error::NotFound(message) => Self::NotFound { message },
			singular_storage::Error::Conflict(message) => Self::Conflict { message },
		}
	}
}
impl From<sqlx::Error> for Error {
	fn from(err: sqlx::Error) -> Self {
		singular_storage::Error::from(err).into()
	}
}
