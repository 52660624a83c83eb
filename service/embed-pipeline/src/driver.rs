//! C5: the staged pipeline driver. Four stages — read, chunk, embed, sink —
//! each its own thread, connected by bounded `mpsc` channels so a slow sink
//! back-pressures the embedder, which back-pressures the chunker, which
//! back-pressures the reader. Concurrency lives here, not in the individual
//! components: readers, the chunker and the embedder all stay
//! synchronous and are merely run on dedicated threads.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{sync_channel, Receiver, SyncSender};

use embed_model::{EmbedInput, EmbedUnit, ImageInput, RawSegment};
use embedding_provider::Embedder;
use file_chunker::text_segmenter::chunk_text;
use tracing::{error, warn};
use vector_sink::Sink;

use crate::config::PipelineConfig;
use crate::error::PipelineError;

/// Tally of a [`EmbedPipeline::run`] call: how many sources made it through
/// cleanly, and which ones failed (only populated when `continue_on_error`
/// is set; otherwise the first failure aborts the run). `units` is only
/// populated when the run had no sink: each produced `EmbedUnit` is
/// collected into the return value instead of being upserted.
#[derive(Debug, Default)]
pub struct RunReport {
    pub succeeded: usize,
    pub failed: Vec<(PathBuf, String)>,
    pub units: Vec<EmbedUnit>,
}

/// A flag passed into [`EmbedPipeline::run`] so a caller on another thread
/// can request early termination. Checked between items at every stage.
#[derive(Debug, Default, Clone)]
pub struct CancellationToken {
    cancelled: std::sync::Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

pub struct EmbedPipeline<'a, S: Sink> {
    embedder: &'a dyn Embedder,
    sink: Option<&'a S>,
}

impl<'a, S: Sink> EmbedPipeline<'a, S>
where
    S::Document: Send,
{
    pub fn new(embedder: &'a dyn Embedder, sink: &'a S) -> Self {
        Self { embedder, sink: Some(sink) }
    }

    /// Like [`Self::new`], but with no sink at all: every produced
    /// `EmbedUnit` is collected into the returned [`RunReport::units`]
    /// instead of being upserted anywhere.
    pub fn without_sink(embedder: &'a dyn Embedder) -> Self {
        Self { embedder, sink: None }
    }

    /// Runs every path in `sources` through read -> chunk -> embed -> sink,
    /// in order, as a four-stage pipeline. If a sink was given, assumes
    /// `sink.create_index` has already been called by the caller for
    /// `config.index_name`; otherwise every produced unit is returned.
    pub fn run(
        &self,
        sources: &[PathBuf],
        config: &PipelineConfig<'_>,
        cancel: &CancellationToken,
    ) -> Result<RunReport, PipelineError> {
        let mut report = RunReport::default();

        std::thread::scope(|scope| {
            let (tx_segments, rx_segments) = sync_channel::<(PathBuf, RawSegment)>(config.queue_capacity);
            let (tx_inputs, rx_inputs) = sync_channel::<(PathBuf, EmbedInput)>(config.queue_capacity);
            let (tx_units, rx_units) = sync_channel::<(PathBuf, EmbedUnit)>(config.queue_capacity);

            let read_handle = scope.spawn(|| reader_stage(sources, &config.read, cancel, tx_segments));

            let chunk_handle =
                scope.spawn(|| chunker_stage(rx_segments, &config.chunk, cancel, tx_inputs));

            let embed_handle = scope.spawn(|| {
                embedder_stage(self.embedder, rx_inputs, config.batch_size, cancel, tx_units)
            });

            let result = match self.sink {
                Some(sink) => sink_stage(sink, &config.index_name, rx_units, config, cancel)
                    .map(|failed| (failed, Vec::new())),
                None => Ok((Vec::new(), collect_stage(rx_units, cancel))),
            };

            read_handle
                .join()
                .map_err(|_| PipelineError::WorkerPanicked("reader stage".into()))??;
            chunk_handle
                .join()
                .map_err(|_| PipelineError::WorkerPanicked("chunker stage".into()))??;
            embed_handle
                .join()
                .map_err(|_| PipelineError::WorkerPanicked("embedder stage".into()))??;

            let (failures, units) = result?;
            let failed_paths: std::collections::HashSet<&Path> =
                failures.iter().map(|(p, _)| p.as_path()).collect();
            report.succeeded = sources.iter().filter(|p| !failed_paths.contains(p.as_path())).count();
            report.failed = failures;
            report.units = units;

            Ok(())
        })?;

        if cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }

        Ok(report)
    }
}

/// Runs the read/chunk/embed stages only, with no sink at all, and returns
/// every produced unit. Used by operations that never take a sink
/// (`embed_audio_file`, `embed_video_file`, `embed_webpage`).
pub struct CollectingPipeline<'a> {
    embedder: &'a dyn Embedder,
}

impl<'a> CollectingPipeline<'a> {
    pub fn new(embedder: &'a dyn Embedder) -> Self {
        Self { embedder }
    }

    pub fn run(
        &self,
        sources: &[PathBuf],
        config: &PipelineConfig<'_>,
        cancel: &CancellationToken,
    ) -> Result<Vec<EmbedUnit>, PipelineError> {
        let mut units = Vec::new();

        std::thread::scope(|scope| {
            let (tx_segments, rx_segments) = sync_channel::<(PathBuf, RawSegment)>(config.queue_capacity);
            let (tx_inputs, rx_inputs) = sync_channel::<(PathBuf, EmbedInput)>(config.queue_capacity);
            let (tx_units, rx_units) = sync_channel::<(PathBuf, EmbedUnit)>(config.queue_capacity);

            let read_handle = scope.spawn(|| reader_stage(sources, &config.read, cancel, tx_segments));

            let chunk_handle =
                scope.spawn(|| chunker_stage(rx_segments, &config.chunk, cancel, tx_inputs));

            let embed_handle = scope.spawn(|| {
                embedder_stage(self.embedder, rx_inputs, config.batch_size, cancel, tx_units)
            });

            let collected = collect_stage(rx_units, cancel);

            read_handle
                .join()
                .map_err(|_| PipelineError::WorkerPanicked("reader stage".into()))??;
            chunk_handle
                .join()
                .map_err(|_| PipelineError::WorkerPanicked("chunker stage".into()))??;
            embed_handle
                .join()
                .map_err(|_| PipelineError::WorkerPanicked("embedder stage".into()))??;

            units = collected;

            Ok::<(), PipelineError>(())
        })?;

        if cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }

        Ok(units)
    }
}

fn reader_stage(
    sources: &[PathBuf],
    read_config: &file_chunker::ReadConfig<'_>,
    cancel: &CancellationToken,
    tx: SyncSender<(PathBuf, RawSegment)>,
) -> Result<(), PipelineError> {
    for path in sources {
        if cancel.is_cancelled() {
            break;
        }
        match file_chunker::read_source(path, read_config) {
            Ok(segments) => {
                for segment in segments {
                    if tx.send((path.clone(), segment)).is_err() {
                        return Ok(()); // downstream stage exited
                    }
                }
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "reading source failed");
            }
        }
    }
    Ok(())
}

fn chunker_stage(
    rx: Receiver<(PathBuf, RawSegment)>,
    chunk_config: &file_chunker::text_segmenter::ChunkConfig<'_>,
    cancel: &CancellationToken,
    tx: SyncSender<(PathBuf, EmbedInput)>,
) -> Result<(), PipelineError> {
    for (path, segment) in rx {
        if cancel.is_cancelled() {
            break;
        }
        match segment {
            RawSegment::Text { content, source, .. } => {
                for chunk in chunk_text(&content, &source, chunk_config) {
                    if tx.send((path.clone(), EmbedInput::Chunk(chunk))).is_err() {
                        return Ok(());
                    }
                }
            }
            RawSegment::Image { pixels, width, height, source } => {
                let input = EmbedInput::Image(ImageInput { pixels, width, height, source });
                if tx.send((path.clone(), input)).is_err() {
                    return Ok(());
                }
            }
            RawSegment::AudioFrame { .. } => {
                // Raw PCM frames are reserved for a direct audio embedder
                // family; today's audio reader always transcribes to text
                // before this stage sees it.
                warn!(path = %path.display(), "dropping untranscribed audio frame: no direct-audio embedder configured");
            }
        }
    }
    Ok(())
}

fn embedder_stage(
    embedder: &dyn Embedder,
    rx: Receiver<(PathBuf, EmbedInput)>,
    batch_size: usize,
    cancel: &CancellationToken,
    tx: SyncSender<(PathBuf, EmbedUnit)>,
) -> Result<(), PipelineError> {
    let mut batch: Vec<(PathBuf, EmbedInput)> = Vec::with_capacity(batch_size);

    let mut flush = |batch: &mut Vec<(PathBuf, EmbedInput)>| -> Result<bool, PipelineError> {
        if batch.is_empty() {
            return Ok(true);
        }
        let inputs: Vec<EmbedInput> = batch.iter().map(|(_, input)| input.clone()).collect();
        let vectors = embedder.embed_batch(&inputs)?;
        for ((path, input), vector) in batch.drain(..).zip(vectors) {
            let mut metadata = std::collections::BTreeMap::new();
            input.source().seed_metadata(&mut metadata);
            if let EmbedInput::Chunk(chunk) = &input {
                file_chunker::text_segmenter::seed_chunk_metadata(chunk, &mut metadata);
            }
            let text = match &input {
                EmbedInput::Chunk(chunk) => chunk.text.clone(),
                EmbedInput::Image(image) => image.source.file_path.clone(),
            };
            let unit = EmbedUnit { vector, text, metadata };
            if tx.send((path, unit)).is_err() {
                return Ok(false);
            }
        }
        Ok(true)
    };

    for item in rx {
        if cancel.is_cancelled() {
            break;
        }
        batch.push(item);
        if batch.len() >= batch_size && !flush(&mut batch)? {
            return Ok(());
        }
    }
    flush(&mut batch)?;
    Ok(())
}

fn collect_stage(rx: Receiver<(PathBuf, EmbedUnit)>, cancel: &CancellationToken) -> Vec<EmbedUnit> {
    let mut units = Vec::new();
    for (_, unit) in rx {
        if cancel.is_cancelled() {
            break;
        }
        units.push(unit);
    }
    units
}

fn sink_stage<S: Sink>(
    sink: &S,
    index_name: &str,
    rx: Receiver<(PathBuf, EmbedUnit)>,
    config: &PipelineConfig<'_>,
    cancel: &CancellationToken,
) -> Result<Vec<(PathBuf, String)>, PipelineError> {
    let mut failed = Vec::new();

    for (path, unit) in rx {
        if cancel.is_cancelled() {
            break;
        }
        let mut attempt = 0;
        loop {
            let document = sink.convert(&unit);
            match sink.upsert(index_name, vec![document]) {
                Ok(()) => break,
                Err(vector_sink::SinkError::Permanent(message)) => {
                    error!(path = %path.display(), error = %message, "sink rejected upsert permanently");
                    if config.continue_on_error {
                        failed.push((path.clone(), message));
                    } else {
                        return Err(PipelineError::Sink(vector_sink::SinkError::Permanent(message)));
                    }
                    break;
                }
                Err(vector_sink::SinkError::Transient(message)) => {
                    attempt += 1;
                    if attempt >= config.retry.max_attempts {
                        error!(path = %path.display(), error = %message, attempts = attempt, "sink retries exhausted");
                        if config.continue_on_error {
                            failed.push((path.clone(), message));
                            break;
                        }
                        return Err(PipelineError::Sink(vector_sink::SinkError::Transient(message)));
                    }
                    std::thread::sleep(config.retry.delay_for_attempt(attempt));
                    continue;
                }
            }
        }
    }

    Ok(failed)
}
