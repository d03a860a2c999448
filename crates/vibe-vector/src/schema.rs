use arrow_schema::{DataType, Field, Schema};
use std::sync::Arc;

use vibe_core::types::ModalitySpec;

pub const ID_COL: &str = "id";
pub const PAYLOAD_COL: &str = "payload";
pub const DISTANCE_COL: &str = "_distance";

pub fn vector_type(dim: usize) -> DataType {
	DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dim as i32)
}

/// `id`, JSON `payload`, then one nullable vector column per modality.
pub fn build_point_schema(modalities: &[ModalitySpec]) -> Arc<Schema> {
	let mut fields = vec![
		Field::new(ID_COL, DataType::Utf8, false),
		Field::new(PAYLOAD_COL, DataType::Utf8, false),
	];
	fields.extend(modalities.iter().map(|m| Field::new(&m.name, vector_type(m.dim), true)));
	Arc::new(Schema::new(fields))
}

/// Column reference usable inside a Lance SQL predicate.
pub fn quoted(column: &str) -> String { format!("`{}`", column.replace('`', "``")) }
