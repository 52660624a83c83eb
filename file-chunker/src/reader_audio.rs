use std::path::Path;

use embed_model::collaborators::AudioTranscriber;
use embed_model::{RawSegment, SourceMeta};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::error::SourceError;

#[derive(Debug, Clone, Copy)]
pub struct AudioReadConfig {
    pub window_ms: u64,
}

impl Default for AudioReadConfig {
    fn default() -> Self {
        Self { window_ms: 30_000 }
    }
}

/// Decodes an audio file to mono PCM, windows it into `window_ms` chunks,
/// and calls `transcriber` synchronously on each window. Redesign flag
/// this is a blocking call; concurrency across files comes
/// from the driver's staged pipeline, not from async here.
pub fn read(
    path: &Path,
    config: &AudioReadConfig,
    transcriber: &dyn AudioTranscriber,
) -> Result<Vec<RawSegment>, SourceError> {
    let (pcm, sample_rate) = decode_mono(path)?;
    let path_str = path.display().to_string();

    let window_samples = (sample_rate as u64 * config.window_ms / 1000) as usize;
    let mut out = Vec::new();
    let mut offset = 0usize;
    while offset < pcm.len() {
        let end = (offset + window_samples.max(1)).min(pcm.len());
        let window = &pcm[offset..end];
        let text = transcriber
            .transcribe(window, sample_rate)
            .map_err(SourceError::Transcription)?;

        let mut source = SourceMeta::for_path(path_str.clone());
        source.start_ms = Some(offset as u64 * 1000 / sample_rate as u64);
        source.end_ms = Some(end as u64 * 1000 / sample_rate as u64);

        out.push(RawSegment::Text {
            content: text,
            source,
            char_offset: 0,
        });
        offset = end;
    }
    Ok(out)
}

fn decode_mono(path: &Path) -> Result<(Vec<f32>, u32), SourceError> {
    let file = std::fs::File::open(path).map_err(|e| SourceError::io(path.display().to_string(), e))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| SourceError::VideoDecode(format!("probe failed: {e}")))?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != symphonia::core::codecs::CODEC_TYPE_NULL)
        .ok_or_else(|| SourceError::VideoDecode("no audio track".into()))?;
    let track_id = track.id;
    let sample_rate = track.codec_params.sample_rate.unwrap_or(16_000);

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| SourceError::VideoDecode(e.to_string()))?;

    let mut pcm = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(symphonia::core::errors::Error::IoError(_)) => break,
            Err(e) => return Err(SourceError::VideoDecode(e.to_string())),
        };
        if packet.track_id() != track_id {
            continue;
        }
        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                let mut sample_buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
                sample_buf.copy_interleaved_ref(decoded);
                let channels = spec.channels.count().max(1);
                for frame in sample_buf.samples().chunks(channels) {
                    let avg = frame.iter().sum::<f32>() / channels as f32;
                    pcm.push(avg);
                }
            }
            Err(symphonia::core::errors::Error::DecodeError(_)) => continue,
            Err(e) => return Err(SourceError::VideoDecode(e.to_string())),
        }
    }

    Ok((pcm, sample_rate))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoTranscriber;
    impl AudioTranscriber for EchoTranscriber {
        fn transcribe(&self, pcm: &[f32], _sample_rate: u32) -> Result<String, String> {
            Ok(format!("{} samples", pcm.len()))
        }
    }

    #[test]
    fn windows_are_non_overlapping_and_cover_the_signal() {
        let pcm = vec![0.0f32; 48_000 * 5];
        let sample_rate = 48_000u32;
        let window_samples = sample_rate as usize * 2;
        let mut offset = 0usize;
        let mut windows = 0usize;
        while offset < pcm.len() {
            let end = (offset + window_samples).min(pcm.len());
            offset = end;
            windows += 1;
        }
        assert_eq!(windows, 3);
    }
}
