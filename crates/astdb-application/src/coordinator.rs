//! C11 Pipeline Coordinator: select → parse → annotate → embed+index →
//! record, sequenced over a batch of candidate files.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use astdb_domain::error::{Error, Result};
use astdb_domain::model::{Annotation, EmbeddingVector, StagesCompleted, VectorMetadata};
use astdb_domain::ports::annotation_generator::AnnotationContext;
use astdb_domain::ports::parser::{ParseOptions, ParseOutcome};
use astdb_domain::ports::watch_state::ChangedPaths;
use astdb_domain::retry::{default_should_retry, with_retry, RetryConfig};
use sysinfo::System;

use crate::deps::PipelineDeps;
use crate::progress::{BatchOutcome, BatchStatus, PipelinePhase, PipelineProgress};

/// Progress callback, invoked at most once per file.
pub type ProgressCallback = Box<dyn Fn(PipelineProgress) + Send + Sync>;

/// How far into the pipeline a batch run carries each file, letting the
/// CLI's `parse`/`annotate`/`embed` subcommands each exercise only their own
/// stage while `watch` drives the full pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    /// Stop after C4 parsing.
    Parse,
    /// Stop after C5 annotation.
    Annotate,
    /// Run through C6 embedding and C7 indexing.
    Embed,
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

fn resident_memory_mb() -> f64 {
    let mut system = System::new();
    system.refresh_memory();
    system.used_memory() as f64 / (1024.0 * 1024.0)
}

/// Drives C4→C5→C6→C7 over a batch of files selected by C8, reporting
/// progress and persisting per-file outcomes back to C8.
pub struct PipelineCoordinator {
    deps: PipelineDeps,
    retry_config: RetryConfig,
}

impl PipelineCoordinator {
    /// Build a coordinator over the given dependency set, retrying each
    /// file's processing with [`RetryConfig::default`] on transient
    /// failures.
    #[must_use]
    pub fn new(deps: PipelineDeps) -> Self {
        Self {
            deps,
            retry_config: RetryConfig::default(),
        }
    }

    /// Run one batch: select the changed subset of `candidates` (or all of
    /// them, when `force` is set), then parse/annotate/embed/record each
    /// in turn. Retry is per file, never per batch; a single file's
    /// exhausted retries are recorded as that file's error and do not
    /// abort the run.
    pub async fn run_batch(
        &self,
        candidates: &[String],
        force: bool,
        on_progress: Option<ProgressCallback>,
        stop_after: PipelineStage,
    ) -> Result<BatchOutcome> {
        let start = Instant::now();

        let (files_to_process, files_skipped) = if force {
            (candidates.to_vec(), 0)
        } else {
            let ChangedPaths { changed, unchanged } =
                self.deps.watch_state.get_files_to_process(candidates).await?;
            (changed, unchanged.len())
        };

        let total = files_to_process.len();
        let completed = AtomicUsize::new(0);
        let error_count = AtomicUsize::new(0);
        let mut errors = Vec::new();
        let mut files_processed = 0usize;

        for file_path in &files_to_process {
            if let Some(cb) = &on_progress {
                cb(PipelineProgress::estimate(
                    completed.load(Ordering::Relaxed),
                    total,
                    Some(file_path.clone()),
                    start.elapsed().as_secs_f64(),
                    resident_memory_mb(),
                    PipelinePhase::Parse,
                    error_count.load(Ordering::Relaxed),
                ));
            }

            let file_start = Instant::now();
            let outcome = with_retry(&self.retry_config, default_should_retry, || {
                self.process_one_file(file_path, stop_after)
            })
            .await;

            let duration_ms = file_start.elapsed().as_millis() as u64;
            match outcome {
                Ok(stages) => {
                    self.deps
                        .watch_state
                        .record_success(file_path, stages, duration_ms)
                        .await?;
                    files_processed += 1;
                }
                Err(err) => {
                    self.deps.watch_state.record_error(file_path, &err.message).await?;
                    error_count.fetch_add(1, Ordering::Relaxed);
                    errors.push((file_path.clone(), err.message));
                }
            }
            completed.fetch_add(1, Ordering::Relaxed);
        }

        self.deps.watch_state.save().await?;

        Ok(BatchOutcome {
            status: BatchStatus::Completed,
            files_processed,
            files_skipped,
            errors,
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }

    /// Parse, annotate and embed+index a single file, returning which
    /// stages completed. A failure partway still reports the stages that
    /// did complete via the `Err`'s context, but for retry purposes the
    /// whole file is re-attempted from parse.
    async fn process_one_file(&self, file_path: &str, stop_after: PipelineStage) -> Result<StagesCompleted> {
        let outcomes = self
            .deps
            .parser
            .parse_batch(std::slice::from_ref(&file_path.to_string()), ParseOptions {
                batch_size: 1,
                max_concurrency: 1,
                dry_run: false,
            })
            .await?;

        let outcome = outcomes
            .into_iter()
            .next()
            .ok_or_else(|| Error::parser("parser returned no outcome for file").with_context("file", file_path))?;

        if let Some(first_error) = outcome.errors.first() {
            return Err(Error::parser(first_error.message.clone()).with_context("file", file_path));
        }

        self.write_ast_output(file_path, &outcome).await?;

        if stop_after == PipelineStage::Parse {
            return Ok(StagesCompleted {
                parsed: true,
                annotated: false,
                embedded: false,
            });
        }

        if outcome.nodes.is_empty() {
            return Ok(StagesCompleted {
                parsed: true,
                annotated: true,
                embedded: true,
            });
        }

        let source_text = tokio::fs::read_to_string(file_path).await.unwrap_or_default();
        let (imports, exports) = outcome
            .nodes
            .first()
            .map(|n| (n.metadata.imports.clone(), n.metadata.exports.clone()))
            .unwrap_or_default();
        let context = AnnotationContext {
            file_path: file_path.to_string(),
            language: outcome.language.clone(),
            source_text,
            all_nodes: outcome.nodes.clone(),
            imports,
            exports,
        };

        let mut annotations = Vec::with_capacity(outcome.nodes.len());
        for node in &outcome.nodes {
            let annotation = self.deps.annotator.annotate(node, &context).await?;
            self.write_annotation_output(&annotation).await?;
            annotations.push(annotation);
        }

        if stop_after == PipelineStage::Annotate {
            return Ok(StagesCompleted {
                parsed: true,
                annotated: true,
                embedded: false,
            });
        }

        self.embed_and_index(file_path, &outcome, &annotations).await?;

        Ok(StagesCompleted {
            parsed: true,
            annotated: true,
            embedded: true,
        })
    }

    async fn write_ast_output(&self, file_path: &str, outcome: &ParseOutcome) -> Result<()> {
        let basename = Path::new(file_path)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| file_path.to_string());
        let content_hash_prefix: String = outcome
            .nodes
            .first()
            .map(|n| n.id.chars().take(12).collect())
            .unwrap_or_else(|| "000000000000".to_string());

        let payload = serde_json::json!({
            "metadata": { "filePath": file_path, "language": outcome.language },
            "parseResult": { "nodes": outcome.nodes, "errors": outcome.errors.iter().map(|e| &e.message).collect::<Vec<_>>() },
            "statistics": { "nodeCount": outcome.nodes.len(), "parseTimeMs": outcome.parse_time_ms },
        });
        let bytes = serde_json::to_vec_pretty(&payload)?;

        let path = self
            .deps
            .asts_dir
            .join(format!("{basename}_{content_hash_prefix}.json"));
        atomic_write(&path, &bytes).await
    }

    async fn write_annotation_output(&self, annotation: &Annotation) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(annotation)?;
        let path = self.deps.annots_dir.join(format!("{}.json", annotation.node_id));
        atomic_write(&path, &bytes).await
    }

    async fn embed_and_index(
        &self,
        file_path: &str,
        outcome: &ParseOutcome,
        annotations: &[Annotation],
    ) -> Result<()> {
        let texts: Vec<String> = annotations
            .iter()
            .map(|a| format!("{} {}", a.signature, a.summary))
            .collect();
        let vectors = self.deps.embedder.encode(&texts, self.deps.embed_max_batch).await?;

        let now = now_ms();
        let batch: Vec<EmbeddingVector> = annotations
            .iter()
            .zip(outcome.nodes.iter())
            .zip(vectors)
            .map(|((annotation, node), vector)| EmbeddingVector {
                node_id: annotation.node_id.clone(),
                vector,
                metadata: VectorMetadata {
                    signature: annotation.signature.clone(),
                    summary: annotation.summary.clone(),
                    file_id: file_path.to_string(),
                    file_path: file_path.to_string(),
                    line_number: node.start.line,
                    confidence: annotation.quality.signature_confidence,
                    last_updated: now,
                },
            })
            .collect();

        let result = self.deps.vector_store.insert_vectors(batch).await?;
        if let Some((_, first_err)) = result.errors.into_iter().next() {
            return Err(first_err);
        }
        Ok(())
    }
}

async fn atomic_write(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let mut tmp = path.as_os_str().to_os_string();
    tmp.push(".tmp");
    let tmp_path = Path::new(&tmp);

    if let Err(e) = tokio::fs::write(tmp_path, bytes).await {
        let _ = tokio::fs::remove_file(tmp_path).await;
        return Err(e.into());
    }
    if let Err(e) = tokio::fs::rename(tmp_path, path).await {
        let _ = tokio::fs::remove_file(tmp_path).await;
        return Err(e.into());
    }
    Ok(())
}
