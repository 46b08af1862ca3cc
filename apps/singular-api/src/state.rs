use std::sync::Arc;

use singular_service::SingularService;
use singular_storage::db::Db;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<SingularService>,
}
impl AppState {
	pub async fn new(config: singular_config::Config) -> color_eyre::Result<Self> {
		let db = Db::connect(&config.storage.postgres).await?;

		db.ensure_schema().await?;

		Ok(Self::with_service(SingularService::new(config, db)))
	}

	pub fn with_service(service: SingularService) -> Self {
		Self { service: Arc::new(service) }
	}

	pub(crate) fn identity_header(&self) -> &str {
		&self.service.cfg.security.identity_header
	}
}
