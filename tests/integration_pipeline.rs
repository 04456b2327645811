#![expect(
    clippy::tests_outside_test_module,
    reason = "integration tests are only compiled in test mode"
)]

// End-to-end pipeline tests against a fixture chunk index and mocked
// embedding/generation endpoints. No real network access required.

use std::path::Path;
use std::sync::Arc;

use arrow::array::{FixedSizeListArray, Float32Array, RecordBatchIterator, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use cosmic_explorer::ExplorerError;
use cosmic_explorer::config::{ApiKey, Config, IndexConfig};
use cosmic_explorer::embeddings::OllamaClient;
use cosmic_explorer::generation::GeminiClient;
use cosmic_explorer::index::ChunkIndex;
use cosmic_explorer::loader::ResourceLoader;
use cosmic_explorer::pipeline::AnswerPipeline;

const MARS_CHUNK: &str = "Mars is the fourth planet from the Sun";
const VENUS_CHUNK: &str = "Venus is the hottest planet in the solar system";
const NEPTUNE_CHUNK: &str = "Neptune is the most distant planet from the Sun";

fn test_config(index_dir: &Path) -> Config {
    Config {
        index: IndexConfig {
            path: index_dir.to_path_buf(),
            table: "chunks".to_string(),
        },
        ..Config::default()
    }
}

/// Build a small fixture index the way the offline pipeline would.
/// The store under test only ever reads it.
async fn create_fixture_index(index_dir: &Path) {
    let chunks = [
        (MARS_CHUNK, vec![0.0_f32, 1.0, 0.0, 0.0]),
        (VENUS_CHUNK, vec![1.0, 0.0, 0.0, 0.0]),
        (NEPTUNE_CHUNK, vec![0.0, 0.0, 1.0, 0.0]),
    ];
    let dim = chunks[0].1.len();

    let uri = format!("file://{}", index_dir.display());
    let connection = lancedb::connect(&uri)
        .execute()
        .await
        .expect("should connect to fixture index");

    let schema = Arc::new(Schema::new(vec![
        Field::new("id", DataType::Utf8, false),
        Field::new(
            "vector",
            DataType::FixedSizeList(
                Arc::new(Field::new("item", DataType::Float32, false)),
                dim as i32,
            ),
            false,
        ),
        Field::new("content", DataType::Utf8, false),
        Field::new("source", DataType::Utf8, true),
    ]));

    connection
        .create_empty_table("chunks", Arc::clone(&schema))
        .execute()
        .await
        .expect("should create fixture table");

    let ids: Vec<String> = (1..=chunks.len()).map(|i| i.to_string()).collect();
    let contents: Vec<&str> = chunks.iter().map(|(content, _)| *content).collect();
    let sources: Vec<Option<&str>> = chunks.iter().map(|_| Some("nasa")).collect();

    let mut flat_values = Vec::with_capacity(chunks.len() * dim);
    for (_, vector) in &chunks {
        flat_values.extend_from_slice(vector);
    }
    let vector_array = FixedSizeListArray::try_new(
        Arc::new(Field::new("item", DataType::Float32, false)),
        dim as i32,
        Arc::new(Float32Array::from(flat_values)),
        None,
    )
    .expect("should create vector array");

    let batch = RecordBatch::try_new(
        Arc::clone(&schema),
        vec![
            Arc::new(StringArray::from(ids)),
            Arc::new(vector_array),
            Arc::new(StringArray::from(contents)),
            Arc::new(StringArray::from(sources)),
        ],
    )
    .expect("should create record batch");

    let reader = RecordBatchIterator::new(std::iter::once(Ok(batch)), schema);
    let table = connection
        .open_table("chunks")
        .execute()
        .await
        .expect("should open fixture table");
    table
        .add(reader)
        .execute()
        .await
        .expect("should insert fixture chunks");
}

/// Mount an embedding response for requests whose body contains `fragment`.
async fn mock_embedding(server: &MockServer, fragment: &str, vector: &[f32]) {
    Mock::given(method("POST"))
        .and(path("/api/embed"))
        .and(body_string_contains(fragment))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "embedding": vector,
        })))
        .mount(server)
        .await;
}

fn mock_url(server: &MockServer) -> Url {
    Url::parse(&server.uri()).expect("mock server uri should parse")
}

#[tokio::test(flavor = "multi_thread")]
async fn verbatim_question_retrieves_matching_chunk() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    create_fixture_index(temp_dir.path()).await;
    let config = test_config(temp_dir.path());

    let embed_server = MockServer::start().await;
    // The question is the stored chunk text, so it embeds to the same vector
    mock_embedding(&embed_server, MARS_CHUNK, &[0.0, 1.0, 0.0, 0.0]).await;

    let embedder = OllamaClient::new(&config)
        .expect("should create embedding client")
        .with_base_url(mock_url(&embed_server));
    let index = ChunkIndex::open(&config).await.expect("should open index");

    let embedding = embedder
        .generate_embedding(MARS_CHUNK)
        .expect("should embed question");
    let hits = index
        .search_similar(&embedding, 4)
        .await
        .expect("should search");

    assert!(!hits.is_empty());
    assert_eq!(hits[0].content, MARS_CHUNK);
}

#[tokio::test(flavor = "multi_thread")]
async fn end_to_end_answer_contains_mars() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    create_fixture_index(temp_dir.path()).await;
    let config = test_config(temp_dir.path());

    let embed_server = MockServer::start().await;
    mock_embedding(
        &embed_server,
        "Which planet is fourth from the Sun?",
        &[0.05, 0.95, 0.0, 0.05],
    )
    .await;

    let llm_server = MockServer::start().await;
    // Only matches if the composed prompt actually carries the Mars chunk,
    // so a retrieval miss fails the test here
    Mock::given(method("POST"))
        .and(path(format!(
            "/v1beta/models/{}:generateContent",
            config.generation.model
        )))
        .and(body_string_contains(MARS_CHUNK))
        .and(body_string_contains("Which planet is fourth from the Sun?"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "candidates": [
                {
                    "content": {
                        "role": "model",
                        "parts": [{"text": "The fourth planet from the Sun is Mars."}]
                    }
                }
            ]
        })))
        .mount(&llm_server)
        .await;

    let embedder = OllamaClient::new(&config)
        .expect("should create embedding client")
        .with_base_url(mock_url(&embed_server));
    let index = ChunkIndex::open(&config).await.expect("should open index");
    let generator = GeminiClient::new(&config, ApiKey::new("test-key".to_string()))
        .expect("should create generation client")
        .with_base_url(mock_url(&llm_server));

    let pipeline = AnswerPipeline::new(Arc::new(embedder), Arc::new(index), generator);

    let answer = pipeline
        .answer("Which planet is fourth from the Sun?")
        .await
        .expect("pipeline should produce an answer");

    assert!(answer.contains("Mars"));
}

#[tokio::test(flavor = "multi_thread")]
async fn generation_failure_propagates_as_error() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    create_fixture_index(temp_dir.path()).await;
    let config = test_config(temp_dir.path());

    let embed_server = MockServer::start().await;
    mock_embedding(&embed_server, "fourth", &[0.0, 1.0, 0.0, 0.0]).await;

    let llm_server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&llm_server)
        .await;

    let embedder = OllamaClient::new(&config)
        .expect("should create embedding client")
        .with_base_url(mock_url(&embed_server));
    let index = ChunkIndex::open(&config).await.expect("should open index");
    let generator = GeminiClient::new(&config, ApiKey::new("test-key".to_string()))
        .expect("should create generation client")
        .with_base_url(mock_url(&llm_server));

    let pipeline = AnswerPipeline::new(Arc::new(embedder), Arc::new(index), generator);

    let result = pipeline.answer("Which planet is fourth from the Sun?").await;

    // An error, never a silently empty answer
    let error = result.err().expect("pipeline should fail");
    assert!(matches!(error, ExplorerError::Generation(_)));
}

#[tokio::test(flavor = "multi_thread")]
async fn embedding_failure_propagates_as_error() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    create_fixture_index(temp_dir.path()).await;
    let config = test_config(temp_dir.path());

    // No embed mock mounted: the server answers 404 for everything
    let embed_server = MockServer::start().await;
    let llm_server = MockServer::start().await;

    let embedder = OllamaClient::new(&config)
        .expect("should create embedding client")
        .with_base_url(mock_url(&embed_server));
    let index = ChunkIndex::open(&config).await.expect("should open index");
    let generator = GeminiClient::new(&config, ApiKey::new("test-key".to_string()))
        .expect("should create generation client")
        .with_base_url(mock_url(&llm_server));

    let pipeline = AnswerPipeline::new(Arc::new(embedder), Arc::new(index), generator);

    let result = pipeline.answer("Which planet is fourth from the Sun?").await;

    let error = result.err().expect("pipeline should fail");
    assert!(matches!(error, ExplorerError::Embedding(_)));
}

#[tokio::test(flavor = "multi_thread")]
async fn loader_returns_identical_handle() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    create_fixture_index(temp_dir.path()).await;
    let config = test_config(temp_dir.path());

    let loader = ResourceLoader::new();

    let first = loader
        .get_or_load(&config)
        .await
        .expect("first load should succeed");
    let second = loader
        .get_or_load(&config)
        .await
        .expect("second call should succeed");

    // Memoized: the very same handle, not a reload
    assert!(Arc::ptr_eq(&first, &second));
    assert!(Arc::ptr_eq(&first.index, &second.index));
    assert!(Arc::ptr_eq(&first.embedder, &second.embedder));
}
