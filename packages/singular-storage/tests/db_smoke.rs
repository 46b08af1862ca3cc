use time::macros::date;
use uuid::Uuid;

use singular_config::Postgres;
use singular_domain::{Hydrate, ListPlan, ListStore, PageRequest, RelationField, Resource};
use singular_storage::{
	db::Db,
	models::{NewNote, NewProject, NewUser, NoteRecord, ProjectRow},
	notes, projects, tags, users,
};

fn postgres(dsn: &str) -> Postgres {
	Postgres { dsn: dsn.to_string(), pool_max_conns: 2, acquire_timeout_ms: 5_000 }
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set SINGULAR_PG_DSN to run."]
async fn list_store_runs_plans_against_postgres() {
	let Some(base_dsn) = singular_testkit::env_dsn() else {
		eprintln!("Skipping storage tests; set SINGULAR_PG_DSN to run this test.");

		return;
	};

	singular_testkit::with_test_db(&base_dsn, |test_db| {
		let dsn = test_db.dsn().to_string();

		assert!(test_db.name().starts_with("singular_test_"));

		async move {
			let db = Db::connect(&postgres(&dsn)).await.expect("Failed to connect to test database.");

			db.ensure_schema().await.expect("Failed to ensure schema.");
			db.ensure_schema().await.expect("Second schema run must succeed.");

			let owner = users::insert_user(&db.pool, &NewUser {
				id: Uuid::new_v4(),
				email: "ada@example.com".to_string(),
				display_name: "ada".to_string(),
				first_name: None,
				last_name: None,
			})
			.await
			.expect("Failed to insert user.")
			.id;

			for name in ["Project Alpha", "Side Thing"] {
				projects::insert_project(&db.pool, &NewProject {
					id: Uuid::new_v4(),
					owner_id: owner,
					name: name.to_string(),
					description: None,
					color: None,
					pinned: false,
				})
				.await
				.expect("Failed to insert project.");
			}

			let req = PageRequest::new(0, 10).with_text("proj");
			let plan =
				ListPlan::build(Resource::Projects, owner, &req).expect("Failed to build plan.");
			let window = req.window().expect("Failed to validate window.");
			let total = db.count(&plan).await.expect("Failed to count projects.");
			let ids = db.select_ids(&plan, window).await.expect("Failed to select ids.");
			let rows: Vec<ProjectRow> = db.hydrate(&plan, &ids).await.expect("Failed to hydrate.");

			assert_eq!(total, 1);
			assert_eq!(rows.len(), 1);
			assert_eq!(rows[0].name, "Project Alpha");

			let work = tags::insert_tag(&db.pool, owner, Uuid::new_v4(), "work", None)
				.await
				.expect("Failed to insert tag.")
				.expect("Expected a new tag.");
			let duplicate = tags::insert_tag(&db.pool, owner, Uuid::new_v4(), "work", None)
				.await
				.expect("Failed to insert tag.");

			assert!(duplicate.is_none());

			let mut tagged = Vec::new();

			for title in ["first", "second"] {
				let note = notes::insert_note(&db.pool, &NewNote {
					id: Uuid::new_v4(),
					user_id: owner,
					project_id: None,
					title: title.to_string(),
					content: String::new(),
					work_date: date!(2025 - 01 - 01),
				})
				.await
				.expect("Failed to insert note.");

				tagged.push(note.id);
			}

			let mut conn = db.pool.acquire().await.expect("Failed to acquire connection.");

			notes::replace_note_tags(&mut conn, tagged[0], &[work.id])
				.await
				.expect("Failed to tag note.");

			let req = PageRequest::new(0, 10).with_filter(RelationField::Tag, [work.id]);
			let plan = ListPlan::build(Resource::Notes, owner, &req).expect("Failed to build plan.");
			let window = req.window().expect("Failed to validate window.");
			let total = db.count(&plan).await.expect("Failed to count notes.");
			let ids = db.select_ids(&plan, window).await.expect("Failed to select ids.");
			let records: Vec<NoteRecord> =
				db.hydrate(&plan, &ids).await.expect("Failed to hydrate notes.");

			assert_eq!(total, 1);
			assert_eq!(ids, vec![tagged[0]]);
			assert_eq!(records[0].tags.iter().map(|tag| tag.id).collect::<Vec<_>>(), vec![work.id]);

			Ok(())
		}
	})
	.await
	.expect("Failed to run storage smoke test.");
}
