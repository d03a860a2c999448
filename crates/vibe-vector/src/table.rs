//! LanceDB connection and housekeeping helpers.

use arrow_array::RecordBatchIterator;
use lancedb::{connect, Connection};
use std::sync::Arc;

pub async fn open_db(uri: &str) -> lancedb::Result<Connection> {
	connect(uri).execute().await
}

pub async fn table_exists(conn: &Connection, name: &str) -> lancedb::Result<bool> {
	Ok(conn.table_names().execute().await?.iter().any(|n| n == name))
}

/// Create `name` with `schema` and zero rows unless it already exists. Returns true if created.
pub async fn ensure_table(conn: &Connection, name: &str, schema: Arc<arrow_schema::Schema>) -> lancedb::Result<bool> {
	if table_exists(conn, name).await? {
		return Ok(false);
	}
	// create empty table with 0 rows
	let iter = RecordBatchIterator::new(vec![].into_iter(), schema.clone());
	conn.create_table(name, Box::new(iter)).execute().await?;
	Ok(true)
}
