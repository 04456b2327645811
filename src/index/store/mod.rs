
use super::ChunkHit;
use crate::{ExplorerError, config::Config};
use arrow::array::{Array, Float32Array, StringArray};
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use futures::TryStreamExt;
use lancedb::{
    Connection,
    query::{ExecutableQuery, QueryBase},
};
use tracing::{debug, info};

/// Read-only handle to the prebuilt chunk index.
///
/// The index is produced offline; this process opens it once, queries it by
/// vector similarity, and never writes to it. A missing or unreadable dataset
/// is fatal at open time with no recovery path.
pub struct ChunkIndex {
    connection: Connection,
    table_name: String,
    vector_dimension: usize,
}

impl ChunkIndex {
    /// Open the chunk index at the location named in the configuration.
    ///
    /// Fails with [`ExplorerError::ResourceLoad`] if the dataset directory or
    /// the chunks table is missing, or the stored schema has no usable vector
    /// column.
    #[inline]
    pub async fn open(config: &Config) -> Result<Self, ExplorerError> {
        let db_path = config.index_path();
        debug!("Opening chunk index at path: {:?}", db_path);

        if !db_path.is_dir() {
            return Err(ExplorerError::ResourceLoad(format!(
                "Chunk index not found at {}. The index is built offline and must exist before starting",
                db_path.display()
            )));
        }

        // The configured path may be relative; the connection URI cannot be.
        let db_path = db_path.canonicalize().map_err(|e| {
            ExplorerError::ResourceLoad(format!("Failed to resolve index path: {}", e))
        })?;

        let uri = format!("file://{}", db_path.display());

        let connection = lancedb::connect(&uri).execute().await.map_err(|e| {
            ExplorerError::ResourceLoad(format!("Failed to open chunk index: {}", e))
        })?;

        let table_name = config.index.table.clone();

        let table_names = connection.table_names().execute().await.map_err(|e| {
            ExplorerError::ResourceLoad(format!("Failed to list index tables: {}", e))
        })?;

        if !table_names.contains(&table_name) {
            return Err(ExplorerError::ResourceLoad(format!(
                "Chunk index at {} has no '{}' table",
                db_path.display(),
                table_name
            )));
        }

        let vector_dimension = Self::detect_vector_dimension(&connection, &table_name).await?;

        info!(
            "Chunk index opened with {} dimension vectors",
            vector_dimension
        );

        Ok(Self {
            connection,
            table_name,
            vector_dimension,
        })
    }

    /// Detect vector dimension from the stored table schema
    async fn detect_vector_dimension(
        connection: &Connection,
        table_name: &str,
    ) -> Result<usize, ExplorerError> {
        let table = connection
            .open_table(table_name)
            .execute()
            .await
            .map_err(|e| {
                ExplorerError::ResourceLoad(format!("Failed to open chunks table: {}", e))
            })?;

        let schema = table.schema().await.map_err(|e| {
            ExplorerError::ResourceLoad(format!("Failed to read index schema: {}", e))
        })?;

        for field in schema.fields() {
            if field.name() == "vector" {
                if let DataType::FixedSizeList(_, size) = field.data_type() {
                    return Ok(*size as usize);
                }
            }
        }

        Err(ExplorerError::ResourceLoad(
            "Could not find vector column or determine dimension".to_string(),
        ))
    }

    /// Dimensionality of the stored embedding vectors.
    ///
    /// Query vectors must match it; they only will if the question was
    /// embedded with the model the index was built with.
    #[inline]
    pub fn vector_dimension(&self) -> usize {
        self.vector_dimension
    }

    /// Retrieve the `limit` chunks nearest to `query_vector`.
    #[inline]
    pub async fn search_similar(
        &self,
        query_vector: &[f32],
        limit: usize,
    ) -> Result<Vec<ChunkHit>, ExplorerError> {
        debug!("Searching for similar chunks with limit: {}", limit);

        let table = self
            .connection
            .open_table(&self.table_name)
            .execute()
            .await
            .map_err(|e| ExplorerError::Index(format!("Failed to open chunks table: {}", e)))?;

        let query = table
            .vector_search(query_vector)
            .map_err(|e| ExplorerError::Index(format!("Failed to create vector search: {}", e)))?
            .column("vector")
            .limit(limit);

        let results = query
            .execute()
            .await
            .map_err(|e| ExplorerError::Index(format!("Failed to execute search: {}", e)))?;

        self.parse_search_results_stream(results).await
    }

    /// Get the total number of chunks stored in the index
    #[inline]
    pub async fn count_chunks(&self) -> Result<u64, ExplorerError> {
        let table = self
            .connection
            .open_table(&self.table_name)
            .execute()
            .await
            .map_err(|e| ExplorerError::Index(format!("Failed to open chunks table: {}", e)))?;

        let count = table
            .count_rows(None)
            .await
            .map_err(|e| ExplorerError::Index(format!("Failed to count rows: {}", e)))?;

        Ok(count as u64)
    }

    /// Parse search results from the LanceDB stream into ChunkHit structs
    async fn parse_search_results_stream(
        &self,
        mut results: lancedb::arrow::SendableRecordBatchStream,
    ) -> Result<Vec<ChunkHit>, ExplorerError> {
        let mut hits = Vec::new();

        while let Some(batch_result) = results
            .try_next()
            .await
            .map_err(|e| ExplorerError::Index(format!("Failed to read result stream: {}", e)))?
        {
            let parsed_batch = Self::parse_search_batch(&batch_result)?;
            hits.extend(parsed_batch);
        }

        debug!("Parsed {} search results from stream", hits.len());
        Ok(hits)
    }

    /// Parse a single record batch from search results
    fn parse_search_batch(batch: &RecordBatch) -> Result<Vec<ChunkHit>, ExplorerError> {
        let mut hits = Vec::new();
        let num_rows = batch.num_rows();

        let contents = batch
            .column_by_name("content")
            .ok_or_else(|| ExplorerError::Index("Missing content column".to_string()))?
            .as_any()
            .downcast_ref::<StringArray>()
            .ok_or_else(|| ExplorerError::Index("Invalid content column type".to_string()))?;

        let sources = batch
            .column_by_name("source")
            .ok_or_else(|| ExplorerError::Index("Missing source column".to_string()))?
            .as_any()
            .downcast_ref::<StringArray>()
            .ok_or_else(|| ExplorerError::Index("Invalid source column type".to_string()))?;

        let distances = batch
            .column_by_name("_distance")
            .map(|col| col.as_any().downcast_ref::<Float32Array>());

        for row in 0..num_rows {
            let distance = distances
                .flatten()
                .map_or(0.0, |d| if d.is_null(row) { 0.0 } else { d.value(row) });

            // Convert distance to similarity score (higher is better)
            let similarity = 1.0 - distance;

            hits.push(ChunkHit {
                content: contents.value(row).to_string(),
                source: if sources.is_null(row) {
                    None
                } else {
                    Some(sources.value(row).to_string())
                },
                distance,
                similarity,
            });
        }

        debug!("Parsed {} search results", hits.len());
        Ok(hits)
    }
}
