//! vibe-vector
//!
//! Vector Index implementations: [`InMemoryIndex`] (exact, in-process) and
//! [`LanceIndex`] (persistent LanceDB table with one vector column per modality).

use std::path::Path;
use std::sync::Arc;

use vibe_core::config::{resolve_with_base, IndexBackend, Settings};
use vibe_core::error::Result;
use vibe_core::traits::VectorIndex;

pub mod lance;
pub mod memory;
pub mod schema;
pub mod table;

pub use lance::LanceIndex;
pub use memory::InMemoryIndex;

/// Build the configured index. Relative Lance URIs resolve against `base`.
pub async fn open_index(settings: &Settings, base: &Path) -> Result<Arc<dyn VectorIndex>> {
	let idx = &settings.index;
	match idx.backend {
		IndexBackend::Memory => Ok(Arc::new(InMemoryIndex::new(idx.modalities.clone()))),
		IndexBackend::Lance => {
			let uri = resolve_with_base(base, &idx.uri);
			let index = LanceIndex::open(&uri.to_string_lossy(), &idx.table, idx.modalities.clone()).await?;
			Ok(Arc::new(index))
		}
	}
}
