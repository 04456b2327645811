
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::info;

use crate::Result;
use crate::config::Config;
use crate::embeddings::OllamaClient;
use crate::index::ChunkIndex;

/// Shared read-only handles constructed on first use.
///
/// Safe to share across sessions without locking: nothing mutates these after
/// construction. Teardown is process exit.
pub struct Resources {
    pub embedder: Arc<OllamaClient>,
    pub index: Arc<ChunkIndex>,
}

/// One-time initialization guard for [`Resources`].
///
/// The first `get_or_load` call constructs the embedding client and opens the
/// chunk index; every later call returns the same handle without touching
/// storage. This is memoization keyed by "has initialization run", not a
/// general cache. A failed load is fatal to the request that triggered it.
pub struct ResourceLoader {
    cell: OnceCell<Arc<Resources>>,
}

impl ResourceLoader {
    #[inline]
    pub const fn new() -> Self {
        Self {
            cell: OnceCell::const_new(),
        }
    }

    /// The process-wide loader instance.
    #[inline]
    pub fn global() -> &'static Self {
        static GLOBAL: ResourceLoader = ResourceLoader::new();
        &GLOBAL
    }

    #[inline]
    pub async fn get_or_load(&self, config: &Config) -> Result<Arc<Resources>> {
        let resources = self
            .cell
            .get_or_try_init(|| async {
                info!("Loading embedding client and chunk index");

                let embedder = OllamaClient::new(config)?;
                let index = ChunkIndex::open(config).await?;

                Ok::<_, crate::ExplorerError>(Arc::new(Resources {
                    embedder: Arc::new(embedder),
                    index: Arc::new(index),
                }))
            })
            .await?;

        Ok(Arc::clone(resources))
    }
}

impl Default for ResourceLoader {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}
