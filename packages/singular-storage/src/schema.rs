pub fn render_schema() -> String {
	expand_includes(include_str!("../../../sql/init.sql"))
}

fn expand_includes(sql: &str) -> String {
	let mut out = String::new();

	for line in sql.lines() {
		match line.trim().strip_prefix("\\ir ").map(str::trim) {
			Some("00_extensions.sql") => out.push_str(include_str!("../../../sql/00_extensions.sql")),
			Some("tables/001_users.sql") =>
				out.push_str(include_str!("../../../sql/tables/001_users.sql")),
			Some("tables/002_projects.sql") =>
				out.push_str(include_str!("../../../sql/tables/002_projects.sql")),
			Some("tables/003_tags.sql") =>
				out.push_str(include_str!("../../../sql/tables/003_tags.sql")),
			Some("tables/004_notes.sql") =>
				out.push_str(include_str!("../../../sql/tables/004_notes.sql")),
			Some("tables/005_note_tags.sql") =>
				out.push_str(include_str!("../../../sql/tables/005_note_tags.sql")),
			_ => out.push_str(line),
		}

		out.push('\n');
	}

	out
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn includes_are_expanded_in_dependency_order() {
		let sql = render_schema();
		let extension = sql.find("CREATE EXTENSION IF NOT EXISTS pg_trgm").expect("Missing pg_trgm.");
		let users = sql.find("CREATE TABLE IF NOT EXISTS users").expect("Missing users.");
		let links = sql.find("CREATE TABLE IF NOT EXISTS note_tags").expect("Missing note_tags.");

		assert!(!sql.contains("\\ir "));
		assert!(extension < users && users < links);
	}

	#[test]
	fn every_statement_is_idempotent() {
		for statement in render_schema().split(';').map(str::trim).filter(|s| !s.is_empty()) {
			assert!(statement.contains("IF NOT EXISTS"), "Statement is not idempotent: {statement}");
		}
	}
}
