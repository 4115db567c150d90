//! End-to-end coordinator tests driving the real [`PipelineCoordinator`]
//! against hand-written fakes for every port it depends on.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use astdb_application::{PipelineCoordinator, PipelineDeps, PipelineStage};
use astdb_domain::error::Result;
use astdb_domain::model::{
    Annotation, AnnotationQuality, AstNode, EmbeddingVector, FileState, NodeMetadata, NodeType,
    Position, QueryResult, SignificanceLevel,
};
use astdb_domain::ports::annotation_generator::{AnnotationContext, AnnotationGenerator};
use astdb_domain::ports::embedding_provider::EmbeddingProvider;
use astdb_domain::ports::parser::{ParseOptions, ParseOutcome, ParserOrchestrator};
use astdb_domain::ports::vector_store::{
    BatchInsertOutcome, VectorStore, VectorStoreStats, VectorStoreStatus,
};
use astdb_domain::ports::watch_state::{ChangedPaths, WatchStateManager, WatchStatistics};
use async_trait::async_trait;

struct FakeParser;

#[async_trait]
impl ParserOrchestrator for FakeParser {
    async fn parse_batch(&self, files: &[String], _options: ParseOptions) -> Result<Vec<ParseOutcome>> {
        Ok(files
            .iter()
            .map(|file_path| {
                let node = AstNode {
                    id: format!("{file_path}-node"),
                    node_type: NodeType::Function,
                    name: Some("foo".to_string()),
                    file_path: file_path.clone(),
                    start: Position::new(1, 0, None),
                    end: Position::new(3, 1, None),
                    children: vec![],
                    parent: None,
                    metadata: NodeMetadata::default(),
                    significance: SignificanceLevel::Medium,
                    source_text: None,
                    signature: None,
                    complexity: None,
                };
                ParseOutcome {
                    nodes: vec![node],
                    errors: vec![],
                    language: "rust".to_string(),
                    parse_time_ms: 1,
                }
            })
            .collect())
    }
}

struct FakeAnnotator;

#[async_trait]
impl AnnotationGenerator for FakeAnnotator {
    async fn annotate(&self, node: &AstNode, _context: &AnnotationContext) -> Result<Annotation> {
        Ok(Annotation {
            node_id: node.id.clone(),
            signature: "fn foo()".to_string(),
            summary: "does foo".to_string(),
            quality: AnnotationQuality::compute(0.95, 0.9, true),
            language_specific: Default::default(),
        })
    }
}

struct FakeEmbedder;

#[async_trait]
impl EmbeddingProvider for FakeEmbedder {
    async fn encode(&self, texts: &[String], _max_batch: usize) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|_| vec![0.1, 0.2, 0.3]).collect())
    }

    fn dimension(&self) -> usize {
        3
    }

    fn model_id(&self) -> &str {
        "fake-model"
    }
}

#[derive(Default)]
struct FakeVectorStore {
    inserted: Mutex<Vec<EmbeddingVector>>,
}

#[async_trait]
impl VectorStore for FakeVectorStore {
    async fn insert_vector(
        &self,
        _node_id: &str,
        _vector: Vec<f32>,
        _metadata: astdb_domain::model::VectorMetadata,
    ) -> Result<()> {
        Ok(())
    }

    async fn insert_vectors(&self, batch: Vec<EmbeddingVector>) -> Result<BatchInsertOutcome> {
        let ids = batch.iter().map(|v| v.node_id.clone()).collect();
        self.inserted.lock().unwrap().extend(batch);
        Ok(BatchInsertOutcome {
            inserted_ids: ids,
            errors: vec![],
        })
    }

    async fn search_similar(&self, _query: &[f32], _k: usize, _ef: Option<usize>) -> Result<Vec<QueryResult>> {
        Ok(vec![])
    }

    async fn update_vector(&self, _node_id: &str, _vector: Vec<f32>) -> Result<()> {
        Ok(())
    }

    async fn delete_vector(&self, _node_id: &str) -> Result<()> {
        Ok(())
    }

    async fn rebuild(&self) -> Result<()> {
        Ok(())
    }

    async fn get_stats(&self) -> Result<VectorStoreStats> {
        Ok(VectorStoreStats {
            vector_count: self.inserted.lock().unwrap().len(),
            memory_usage_bytes: 0,
            index_file_size_bytes: 0,
            storage_file_size_bytes: 0,
            last_saved: None,
            build_time_ms: None,
            average_search_time_ms: 0.0,
            status: VectorStoreStatus::Ready,
            error_message: None,
        })
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }
}

#[derive(Default)]
struct FakeWatchState {
    unchanged: Mutex<Vec<String>>,
    successes: Mutex<Vec<String>>,
    errors: Mutex<Vec<String>>,
    saved: AtomicUsize,
}

#[async_trait]
impl WatchStateManager for FakeWatchState {
    async fn has_file_changed(&self, path: &str) -> Result<bool> {
        Ok(!self.unchanged.lock().unwrap().iter().any(|p| p == path))
    }

    async fn get_files_to_process(&self, paths: &[String]) -> Result<ChangedPaths> {
        let unchanged = self.unchanged.lock().unwrap();
        let mut result = ChangedPaths::default();
        for path in paths {
            if unchanged.contains(path) {
                result.unchanged.push(path.clone());
            } else {
                result.changed.push(path.clone());
            }
        }
        Ok(result)
    }

    async fn record_success(
        &self,
        path: &str,
        _stages: astdb_domain::model::StagesCompleted,
        _duration_ms: u64,
    ) -> Result<()> {
        self.successes.lock().unwrap().push(path.to_string());
        Ok(())
    }

    async fn record_error(&self, path: &str, message: &str) -> Result<()> {
        self.errors.lock().unwrap().push(format!("{path}: {message}"));
        Ok(())
    }

    async fn cleanup(&self, _active_paths: &[String]) -> Result<usize> {
        Ok(0)
    }

    async fn get_file_state(&self, _path: &str) -> Result<Option<FileState>> {
        Ok(None)
    }

    async fn statistics(&self) -> Result<WatchStatistics> {
        Ok(WatchStatistics::default())
    }

    async fn save(&self) -> Result<()> {
        self.saved.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn build_coordinator(watch_state: Arc<FakeWatchState>, vector_store: Arc<FakeVectorStore>) -> PipelineCoordinator {
    let dir = tempfile::tempdir().unwrap();
    PipelineCoordinator::new(PipelineDeps {
        parser: Arc::new(FakeParser),
        annotator: Arc::new(FakeAnnotator),
        embedder: Arc::new(FakeEmbedder),
        vector_store,
        watch_state,
        asts_dir: dir.path().join("asts"),
        annots_dir: dir.path().join("annots"),
        embed_max_batch: 16,
    })
}

#[tokio::test]
async fn run_batch_processes_a_changed_file_through_every_stage() {
    let watch_state = Arc::new(FakeWatchState::default());
    let vector_store = Arc::new(FakeVectorStore::default());
    let coordinator = build_coordinator(Arc::clone(&watch_state), Arc::clone(&vector_store));

    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("a.rs");
    tokio::fs::write(&file, "fn foo() {}").await.unwrap();
    let file_path = file.to_string_lossy().into_owned();

    let outcome = coordinator
        .run_batch(std::slice::from_ref(&file_path), false, None, PipelineStage::Embed)
        .await
        .unwrap();

    assert_eq!(outcome.files_processed, 1);
    assert_eq!(outcome.files_skipped, 0);
    assert!(outcome.errors.is_empty());
    assert_eq!(watch_state.successes.lock().unwrap().len(), 1);
    assert_eq!(vector_store.inserted.lock().unwrap().len(), 1);
    assert_eq!(watch_state.saved.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn run_batch_skips_files_watch_state_reports_unchanged() {
    let file_path = "unchanged.rs".to_string();
    let watch_state = Arc::new(FakeWatchState {
        unchanged: Mutex::new(vec![file_path.clone()]),
        ..Default::default()
    });
    let vector_store = Arc::new(FakeVectorStore::default());
    let coordinator = build_coordinator(Arc::clone(&watch_state), Arc::clone(&vector_store));

    let outcome = coordinator
        .run_batch(std::slice::from_ref(&file_path), false, None, PipelineStage::Embed)
        .await
        .unwrap();

    assert_eq!(outcome.files_processed, 0);
    assert_eq!(outcome.files_skipped, 1);
    assert!(vector_store.inserted.lock().unwrap().is_empty());
}

#[tokio::test]
async fn run_batch_with_force_ignores_the_unchanged_marker() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("b.rs");
    tokio::fs::write(&file, "fn bar() {}").await.unwrap();
    let file_path = file.to_string_lossy().into_owned();

    let watch_state = Arc::new(FakeWatchState {
        unchanged: Mutex::new(vec![file_path.clone()]),
        ..Default::default()
    });
    let vector_store = Arc::new(FakeVectorStore::default());
    let coordinator = build_coordinator(Arc::clone(&watch_state), Arc::clone(&vector_store));

    let outcome = coordinator
        .run_batch(std::slice::from_ref(&file_path), true, None, PipelineStage::Embed)
        .await
        .unwrap();

    assert_eq!(outcome.files_processed, 1);
    assert_eq!(outcome.files_skipped, 0);
}

#[tokio::test]
async fn run_batch_reports_progress_for_each_file() {
    let watch_state = Arc::new(FakeWatchState::default());
    let vector_store = Arc::new(FakeVectorStore::default());
    let coordinator = build_coordinator(Arc::clone(&watch_state), Arc::clone(&vector_store));

    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("c.rs");
    tokio::fs::write(&file, "fn baz() {}").await.unwrap();
    let file_path = file.to_string_lossy().into_owned();

    let seen: Arc<Mutex<Vec<usize>>> = Arc::new(Mutex::new(Vec::new()));
    let seen_clone = Arc::clone(&seen);
    let callback: astdb_application::ProgressCallback = Box::new(move |progress| {
        seen_clone.lock().unwrap().push(progress.total);
    });

    coordinator
        .run_batch(std::slice::from_ref(&file_path), false, Some(callback), PipelineStage::Embed)
        .await
        .unwrap();

    assert!(!seen.lock().unwrap().is_empty());
}
