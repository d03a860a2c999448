//! LanceDB-backed vector index.
//!
//! One row per point: `id`, the payload as JSON, and one nullable
//! fixed-size vector column per modality. Searches are cosine, restricted
//! to rows that hold a vector for the requested modality. Payload filters
//! are evaluated on the decoded JSON, so a filtered query scans every
//! candidate row and then truncates to `k`. If the table grows while that
//! scan runs, the scan is repeated against the larger row count.

use arrow_array::cast::AsArray;
use arrow_array::types::Float32Type;
use arrow_array::{Array, ArrayRef, FixedSizeListArray, RecordBatch, RecordBatchIterator, StringArray};
use async_trait::async_trait;
use futures::TryStreamExt;
use lancedb::query::{ExecutableQuery, QueryBase};
use lancedb::{Connection, DistanceType, Table};
use std::sync::Arc;
use uuid::Uuid;

use vibe_core::error::{Error, Result};
use vibe_core::traits::VectorIndex;
use vibe_core::types::{Filter, ModalitySpec, Payload, Point, PointRecord, ScoredPoint};
use vibe_core::vector::check_vector;

use crate::schema::{build_point_schema, quoted, vector_type, DISTANCE_COL, ID_COL, PAYLOAD_COL};
use crate::table::{ensure_table, open_db};

fn unavailable<E: std::fmt::Display>(e: E) -> Error { Error::IndexUnavailable(e.to_string()) }

pub struct LanceIndex {
	conn: Connection,
	table_name: String,
	modalities: Vec<ModalitySpec>,
}

impl LanceIndex {
	/// Connect and create the table if missing. An existing table must carry
	/// a vector column of the right dimension for every modality.
	pub async fn open(uri: &str, table_name: &str, modalities: Vec<ModalitySpec>) -> Result<Self> {
		let conn = open_db(uri).await.map_err(unavailable)?;
		let created = ensure_table(&conn, table_name, build_point_schema(&modalities)).await.map_err(unavailable)?;
		let index = Self { conn, table_name: table_name.to_string(), modalities };
		if created {
			tracing::info!(table = %table_name, uri = %uri, "created point table");
		} else {
			index.check_schema().await?;
		}
		Ok(index)
	}

	async fn table(&self) -> Result<Table> {
		self.conn.open_table(&self.table_name).execute().await.map_err(unavailable)
	}

	async fn check_schema(&self) -> Result<()> {
		let schema = self.table().await?.schema().await.map_err(unavailable)?;
		for m in &self.modalities {
			let field = schema.field_with_name(&m.name).map_err(|_| {
				Error::InvalidConfig(format!("table '{}' has no vector column '{}'", self.table_name, m.name))
			})?;
			if field.data_type() != &vector_type(m.dim) {
				return Err(Error::InvalidConfig(format!(
					"column '{}' is {:?}, expected {}-d float vectors",
					m.name,
					field.data_type(),
					m.dim
				)));
			}
		}
		Ok(())
	}

	fn point_to_batch(&self, point: &Point) -> Result<RecordBatch> {
		let payload = serde_json::to_string(&point.payload).map_err(unavailable)?;
		let mut columns: Vec<ArrayRef> = vec![
			Arc::new(StringArray::from(vec![point.id.to_string()])),
			Arc::new(StringArray::from(vec![payload])),
		];
		for m in &self.modalities {
			let row: Option<Vec<Option<f32>>> = point.vectors.get(&m.name).map(|v| v.iter().copied().map(Some).collect());
			columns.push(Arc::new(FixedSizeListArray::from_iter_primitive::<Float32Type, _, _>(
				vec![row].into_iter(),
				m.dim as i32,
			)));
		}
		RecordBatch::try_new(build_point_schema(&self.modalities), columns).map_err(unavailable)
	}

	/// Nearest `fetch` rows holding `modality`, then the payload filter.
	/// Returns how many rows the search yielded before filtering.
	async fn search_rows(
		&self,
		table: &Table,
		vector: &[f32],
		modality: &str,
		filter: Option<&Filter>,
		fetch: usize,
	) -> Result<(usize, Vec<ScoredPoint>)> {
		let mut stream = table
			.vector_search(vector.to_vec())
			.map_err(unavailable)?
			.column(modality)
			.distance_type(DistanceType::Cosine)
			.only_if(format!("{} IS NOT NULL", quoted(modality)))
			.limit(fetch)
			.execute()
			.await
			.map_err(unavailable)?;

		let mut scanned = 0;
		let mut hits = Vec::new();
		while let Some(batch) = stream.try_next().await.map_err(unavailable)? {
			scanned += batch.num_rows();
			let ids = string_column(&batch, ID_COL)?;
			let payloads = string_column(&batch, PAYLOAD_COL)?;
			let distances = batch
				.column_by_name(DISTANCE_COL)
				.and_then(|c| c.as_any().downcast_ref::<arrow_array::Float32Array>())
				.ok_or_else(|| Error::IndexUnavailable("_distance column missing".into()))?;
			for i in 0..batch.num_rows() {
				let (id, payload) = decode_row(ids, payloads, i)?;
				if filter.is_some_and(|f| !f.matches(&payload)) { continue; }
				hits.push(ScoredPoint { id, score: 1.0 - distances.value(i), payload });
			}
		}
		Ok((scanned, hits))
	}
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
	batch
		.column_by_name(name)
		.and_then(|c| c.as_any().downcast_ref::<StringArray>())
		.ok_or_else(|| Error::IndexUnavailable(format!("{name} column missing")))
}

fn decode_row(ids: &StringArray, payloads: &StringArray, i: usize) -> Result<(Uuid, Payload)> {
	let id = Uuid::parse_str(ids.value(i)).map_err(|e| Error::IndexUnavailable(format!("corrupt point id: {e}")))?;
	let payload = serde_json::from_str(payloads.value(i)).map_err(|e| Error::IndexUnavailable(format!("corrupt payload: {e}")))?;
	Ok((id, payload))
}

#[async_trait]
impl VectorIndex for LanceIndex {
	fn modalities(&self) -> &[ModalitySpec] { &self.modalities }

	async fn query(&self, vector: &[f32], modality: &str, filter: Option<&Filter>, k: usize) -> Result<Vec<ScoredPoint>> {
		check_vector(&self.modalities, modality, vector)?;
		if k == 0 { return Ok(Vec::new()); }
		let table = self.table().await?;
		let Some(filter) = filter else {
			let (_, mut hits) = self.search_rows(&table, vector, modality, None, k).await?;
			hits.sort_by(|a, b| b.score.total_cmp(&a.score));
			hits.truncate(k);
			return Ok(hits);
		};

		// Filtered: scan every row. A scan that comes back full may have been
		// cut short by rows written after the count, so widen and rescan.
		let mut fetch = table.count_rows(None).await.map_err(unavailable)?;
		loop {
			if fetch == 0 { return Ok(Vec::new()); }
			let (scanned, mut hits) = self.search_rows(&table, vector, modality, Some(filter), fetch).await?;
			let now = if scanned < fetch { fetch } else { table.count_rows(None).await.map_err(unavailable)? };
			if now <= fetch {
				hits.sort_by(|a, b| b.score.total_cmp(&a.score));
				hits.truncate(k);
				return Ok(hits);
			}
			tracing::debug!(scanned, rows = now, "table grew during filtered scan, rescanning");
			fetch = now;
		}
	}

	async fn upsert(&self, point: Point) -> Result<()> {
		for (modality, v) in &point.vectors {
			check_vector(&self.modalities, modality, v)?;
		}
		let batch = self.point_to_batch(&point)?;
		let schema = batch.schema();
		let reader = Box::new(RecordBatchIterator::new(vec![Ok(batch)].into_iter(), schema));
		let table = self.table().await?;
		// Upsert behavior via merge_insert: id is unique
		let mut mi = table.merge_insert(&[ID_COL]);
		mi.when_matched_update_all(None).when_not_matched_insert_all();
		mi.execute(reader).await.map_err(unavailable)?;
		Ok(())
	}

	async fn count(&self) -> Result<usize> {
		self.table().await?.count_rows(None).await.map_err(unavailable)
	}

	async fn scroll(&self, limit: usize) -> Result<Vec<PointRecord>> {
		if limit == 0 { return Ok(Vec::new()); }
		let mut stream = self.table().await?.query().limit(limit).execute().await.map_err(unavailable)?;
		let mut out = Vec::new();
		while let Some(batch) = stream.try_next().await.map_err(unavailable)? {
			let ids = string_column(&batch, ID_COL)?;
			let payloads = string_column(&batch, PAYLOAD_COL)?;
			for i in 0..batch.num_rows() {
				let (id, payload) = decode_row(ids, payloads, i)?;
				let modalities = self
					.modalities
					.iter()
					.filter(|m| batch.column_by_name(&m.name).is_some_and(|c| c.as_fixed_size_list().is_valid(i)))
					.map(|m| m.name.clone())
					.collect();
				out.push(PointRecord { id, modalities, payload });
			}
		}
		out.truncate(limit);
		Ok(out)
	}
}
