use uuid::Uuid;

use singular_config::{Config, Listing, Postgres, Security, Service, Storage};
use singular_service::{
	Error, ListQuery, NoteCreateRequest, NoteUpdateRequest, ProjectCreateRequest, SingularService,
	TagCreateRequest, UserCreateRequest,
};
use singular_storage::db::Db;
use singular_testkit::TestDatabase;

fn config(dsn: &str) -> Config {
	Config {
		service: Service { http_bind: "127.0.0.1:0".to_string(), log_level: "info".to_string() },
		storage: Storage {
			postgres: Postgres { dsn: dsn.to_string(), pool_max_conns: 2, acquire_timeout_ms: 5_000 },
		},
		listing: Listing::default(),
		security: Security::default(),
	}
}

async fn test_service() -> Option<(TestDatabase, SingularService)> {
	let Some(base_dsn) = singular_testkit::env_dsn() else {
		eprintln!("Skipping service tests; set SINGULAR_PG_DSN to run them.");

		return None;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let cfg = config(test_db.dsn());
	let db = Db::connect(&cfg.storage.postgres).await.expect("Failed to connect to test database.");

	db.ensure_schema().await.expect("Failed to ensure schema.");

	Some((test_db, SingularService::new(cfg, db)))
}

async fn user(service: &SingularService, name: &str) -> Uuid {
	service
		.create_user(UserCreateRequest {
			email: format!("{name}@example.com"),
			display_name: name.to_string(),
			first_name: None,
			last_name: None,
		})
		.await
		.expect("Failed to create user.")
		.id
}

async fn project(service: &SingularService, owner: Uuid, name: &str) -> Uuid {
	service
		.create_project(owner, ProjectCreateRequest {
			name: name.to_string(),
			description: None,
			color: None,
			pinned: false,
		})
		.await
		.expect("Failed to create project.")
		.id
}

async fn note(service: &SingularService, owner: Uuid, title: &str, tag_ids: Vec<Uuid>) -> Uuid {
	service
		.create_note(owner, NoteCreateRequest {
			title: title.to_string(),
			tag_ids: Some(tag_ids),
			..Default::default()
		})
		.await
		.expect("Failed to create note.")
		.id
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set SINGULAR_PG_DSN to run."]
async fn schema_bootstrap_is_idempotent() {
	let Some((test_db, service)) = test_service().await else {
		return;
	};

	service.db.ensure_schema().await.expect("Second schema run must succeed.");

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set SINGULAR_PG_DSN to run."]
async fn tag_filter_and_text_search_against_postgres() {
	let Some((test_db, service)) = test_service().await else {
		return;
	};
	let owner = user(&service, "ada").await;
	let work = service
		.create_tag(owner, TagCreateRequest { name: "work".to_string(), color: None })
		.await
		.expect("Failed to create tag.")
		.id;
	let personal = service
		.create_tag(owner, TagCreateRequest { name: "personal".to_string(), color: None })
		.await
		.expect("Failed to create tag.")
		.id;

	for idx in 0..3 {
		note(&service, owner, &format!("work {idx}"), vec![work]).await;
	}
	for idx in 0..2 {
		note(&service, owner, &format!("home {idx}"), vec![personal]).await;
	}

	let page = service
		.list_notes(owner, &ListQuery { tag_ids: vec![work], limit: Some(10), ..Default::default() })
		.await
		.expect("Failed to list notes.");

	assert_eq!(page.items.len(), 3);
	assert_eq!(page.meta.total, 3);
	assert!(page.items.iter().all(|item| item.tags.iter().any(|tag| tag.id == work)));

	project(&service, owner, "Project Alpha").await;
	project(&service, owner, "Side Thing").await;

	let page = service
		.search_projects(owner, "proj", &ListQuery::default())
		.await
		.expect("Failed to search projects.");
	let names: Vec<&str> = page.items.iter().map(|item| item.name.as_str()).collect();

	assert_eq!(names, vec!["Project Alpha"]);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set SINGULAR_PG_DSN to run."]
async fn pagination_and_archive_round_trip() {
	let Some((test_db, service)) = test_service().await else {
		return;
	};
	let owner = user(&service, "grace").await;
	let mut created = Vec::new();

	for idx in 0..5 {
		created.push(note(&service, owner, &format!("note {idx}"), Vec::new()).await);
	}

	let page = service
		.list_notes(owner, &ListQuery { offset: Some(2), limit: Some(2), ..Default::default() })
		.await
		.expect("Failed to list notes.");
	let ids: Vec<Uuid> = page.items.iter().map(|item| item.id).collect();

	assert_eq!(ids, vec![created[2], created[1]]);
	assert!(page.meta.has_next);
	assert!(page.meta.has_prev);

	let archived_query = ListQuery { archived: true, ..Default::default() };
	let archived = service.list_notes(owner, &archived_query).await.expect("Failed to list.");

	assert_eq!(archived.meta.total, 0);

	service.archive_note(owner, created[0]).await.expect("Failed to archive note.");

	let archived = service.list_notes(owner, &archived_query).await.expect("Failed to list.");

	assert_eq!(archived.items.iter().map(|item| item.id).collect::<Vec<_>>(), vec![created[0]]);

	let restored = service.restore_note(owner, created[0]).await.expect("Failed to restore note.");

	assert!(restored.deleted_at.is_none());

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set SINGULAR_PG_DSN to run."]
async fn ownership_and_uniqueness_conflicts() {
	let Some((test_db, service)) = test_service().await else {
		return;
	};
	let ada = user(&service, "ada").await;
	let bob = user(&service, "bob").await;
	let alpha = project(&service, ada, "Alpha").await;
	let duplicate = service
		.create_project(ada, ProjectCreateRequest {
			name: "Alpha".to_string(),
			description: None,
			color: None,
			pinned: false,
		})
		.await
		.expect_err("Expected duplicate name conflict.");

	assert!(matches!(duplicate, Error::Conflict { .. }), "Unexpected error: {duplicate:?}");

	let foreign = service
		.create_note(bob, NoteCreateRequest {
			title: "sneaky".to_string(),
			project_id: Some(alpha),
			..Default::default()
		})
		.await
		.expect_err("Expected foreign project conflict.");

	assert!(matches!(foreign, Error::Conflict { .. }), "Unexpected error: {foreign:?}");

	let hidden = service.get_project(bob, alpha).await.expect_err("Expected not found.");

	assert!(matches!(hidden, Error::NotFound { .. }), "Unexpected error: {hidden:?}");

	let users = service.list_users(bob, &ListQuery::default()).await.expect("Failed to list users.");

	assert_eq!(users.items.iter().map(|item| item.id).collect::<Vec<_>>(), vec![bob]);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set SINGULAR_PG_DSN to run."]
async fn tag_names_resolve_to_a_single_tag() {
	let Some((test_db, service)) = test_service().await else {
		return;
	};
	let owner = user(&service, "lin").await;
	let first = service
		.create_note(owner, NoteCreateRequest {
			title: "standup".to_string(),
			tag_names: Some(vec!["daily".to_string(), " daily ".to_string()]),
			..Default::default()
		})
		.await
		.expect("Failed to create note.");

	assert_eq!(first.tags.len(), 1);

	let tag_id = first.tags[0].id;

	service.delete_tag(owner, tag_id).await.expect("Failed to delete tag.");

	let again = service
		.create_tag(owner, TagCreateRequest { name: "daily".to_string(), color: None })
		.await
		.expect("Failed to create tag.");
	let same = service
		.create_tag(owner, TagCreateRequest { name: "daily".to_string(), color: None })
		.await
		.expect("Failed to create tag.");

	assert_eq!(again.id, same.id);

	let updated = service
		.update_note(owner, first.id, NoteUpdateRequest {
			tag_ids: Some(vec![again.id]),
			project_id: Some(None),
			..Default::default()
		})
		.await
		.expect("Failed to update note.");

	assert_eq!(updated.tags.iter().map(|tag| tag.id).collect::<Vec<_>>(), vec![again.id]);
	assert!(updated.project.is_none());

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
