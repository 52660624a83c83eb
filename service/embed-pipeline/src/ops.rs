//! The public operations a caller invokes: one query, one file, a whole
//! directory (optionally filtered to one media kind), a remote webpage, or
//! a single audio/video file.

use std::path::{Path, PathBuf};

use embed_model::{Chunk, EmbedInput, EmbedUnit, SourceMeta};
use embedding_provider::Embedder;
use file_chunker::{is_audio_path, is_image_path, is_video_path};
use vector_sink::Sink;

use crate::config::PipelineConfig;
use crate::driver::{CancellationToken, CollectingPipeline, EmbedPipeline, RunReport};
use crate::error::PipelineError;

/// Embeds a batch of ad hoc query strings; does not touch any sink. Returns
/// one `EmbedUnit` per input string, in order.
pub fn embed_query(
    embedder: &dyn Embedder,
    texts: &[String],
    _config: Option<&PipelineConfig<'_>>,
) -> Result<Vec<EmbedUnit>, PipelineError> {
    let inputs: Vec<EmbedInput> = texts
        .iter()
        .map(|text| EmbedInput::Chunk(Chunk::new(text.as_str(), SourceMeta::for_path("query"))))
        .collect();
    let vectors = embedder.embed_batch(&inputs)?;
    Ok(inputs
        .into_iter()
        .zip(vectors)
        .map(|(input, vector)| {
            let mut metadata = std::collections::BTreeMap::new();
            input.source().seed_metadata(&mut metadata);
            let text = match &input {
                EmbedInput::Chunk(chunk) => chunk.text.clone(),
                EmbedInput::Image(image) => image.source.file_path.clone(),
            };
            EmbedUnit { vector, text, metadata }
        })
        .collect())
}

/// Reads, chunks and embeds one local file. Upserts into `sink` when given;
/// otherwise every produced unit is returned in `RunReport::units`.
pub fn embed_file<S: Sink>(
    embedder: &dyn Embedder,
    sink: Option<&S>,
    path: &Path,
    config: &PipelineConfig<'_>,
    cancel: &CancellationToken,
) -> Result<RunReport, PipelineError>
where
    S::Document: Send,
{
    run_with_optional_sink(embedder, sink, &[path.to_path_buf()], config, cancel)
}

/// Embeds every file directly under `dir` this crate has a reader for.
/// Non-recursive unless `recursive` is set. When `extensions` is given,
/// only files whose extension (case-insensitive, no leading dot) is in the
/// list are embedded. Upserts into `sink` when given; otherwise every
/// produced unit is returned in `RunReport::units`.
pub fn embed_directory<S: Sink>(
    embedder: &dyn Embedder,
    sink: Option<&S>,
    dir: &Path,
    config: &PipelineConfig<'_>,
    cancel: &CancellationToken,
    recursive: bool,
    extensions: Option<&[&str]>,
) -> Result<RunReport, PipelineError>
where
    S::Document: Send,
{
    let mut sources = file_chunker::enumerate_directory(dir, recursive)?;
    if let Some(extensions) = extensions {
        sources.retain(|p| {
            file_chunker::extension(p).is_some_and(|ext| extensions.contains(&ext.as_str()))
        });
    }
    run_with_optional_sink(embedder, sink, &sources, config, cancel)
}

/// Like [`embed_directory`], but restricted to image files — useful for an
/// image-text or document-page embedder that cannot accept text chunks.
/// Upserts into `sink` when given; otherwise every produced unit is
/// returned in `RunReport::units`.
pub fn embed_image_directory<S: Sink>(
    embedder: &dyn Embedder,
    sink: Option<&S>,
    dir: &Path,
    config: &PipelineConfig<'_>,
    cancel: &CancellationToken,
) -> Result<RunReport, PipelineError>
where
    S::Document: Send,
{
    let sources: Vec<PathBuf> = file_chunker::enumerate_directory(dir, false)?
        .into_iter()
        .filter(|p| is_image_path(p))
        .collect();
    run_with_optional_sink(embedder, sink, &sources, config, cancel)
}

fn run_with_optional_sink<S: Sink>(
    embedder: &dyn Embedder,
    sink: Option<&S>,
    sources: &[PathBuf],
    config: &PipelineConfig<'_>,
    cancel: &CancellationToken,
) -> Result<RunReport, PipelineError>
where
    S::Document: Send,
{
    match sink {
        Some(sink) => EmbedPipeline::new(embedder, sink).run(sources, config, cancel),
        None => EmbedPipeline::<'_, S>::without_sink(embedder).run(sources, config, cancel),
    }
}

/// Transcribes and embeds a single audio file. Never touches a sink.
pub fn embed_audio_file(
    embedder: &dyn Embedder,
    path: &Path,
    config: &PipelineConfig<'_>,
    cancel: &CancellationToken,
) -> Result<Vec<EmbedUnit>, PipelineError> {
    if !is_audio_path(path) {
        return Err(PipelineError::Source(file_chunker::error::SourceError::UnsupportedExtension(
            path.display().to_string(),
        )));
    }
    CollectingPipeline::new(embedder).run(&[path.to_path_buf()], config, cancel)
}

/// Samples frames from a single video file and embeds each one. Never
/// touches a sink.
pub fn embed_video_file(
    embedder: &dyn Embedder,
    path: &Path,
    config: &PipelineConfig<'_>,
    cancel: &CancellationToken,
) -> Result<Vec<EmbedUnit>, PipelineError> {
    if !is_video_path(path) {
        return Err(PipelineError::Source(file_chunker::error::SourceError::UnsupportedExtension(
            path.display().to_string(),
        )));
    }
    CollectingPipeline::new(embedder).run(&[path.to_path_buf()], config, cancel)
}

/// Downloads and embeds a remote webpage. Never touches a sink.
pub fn embed_webpage(
    embedder: &dyn Embedder,
    url: &str,
    config: &PipelineConfig<'_>,
) -> Result<Vec<EmbedUnit>, PipelineError> {
    let segments = file_chunker::read_remote(url, &config.read)?;
    let mut units = Vec::new();
    for segment in segments {
        if let embed_model::RawSegment::Text { content, source, .. } = segment {
            let chunks = file_chunker::text_segmenter::chunk_text(&content, &source, &config.chunk);
            let inputs: Vec<EmbedInput> = chunks.into_iter().map(EmbedInput::Chunk).collect();
            if inputs.is_empty() {
                continue;
            }
            let vectors = embedder.embed_batch(&inputs)?;
            for (input, vector) in inputs.into_iter().zip(vectors) {
                let mut metadata = std::collections::BTreeMap::new();
                input.source().seed_metadata(&mut metadata);
                if let EmbedInput::Chunk(chunk) = &input {
                    file_chunker::text_segmenter::seed_chunk_metadata(chunk, &mut metadata);
                }
                let text = match &input {
                    EmbedInput::Chunk(chunk) => chunk.text.clone(),
                    EmbedInput::Image(image) => image.source.file_path.clone(),
                };
                units.push(EmbedUnit { vector, text, metadata });
            }
        }
    }
    Ok(units)
}
