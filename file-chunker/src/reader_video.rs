use std::path::Path;

use embed_model::{RawSegment, SourceMeta};
use ffmpeg_next as ffmpeg;

use crate::error::SourceError;

#[derive(Debug, Clone, Copy)]
pub struct VideoReadConfig {
    /// Decode every `frame_step`th frame.
    pub frame_step: u32,
    /// Stop after this many sampled frames.
    pub max_frames: usize,
}

impl Default for VideoReadConfig {
    fn default() -> Self {
        Self {
            frame_step: 30,
            max_frames: 64,
        }
    }
}

/// Samples frames from a video file at `frame_step` intervals, up to
/// `max_frames`, each becoming its own `RawSegment::Image` tagged with a
/// frame index and timestamp.
pub fn read(path: &Path, config: &VideoReadConfig) -> Result<Vec<RawSegment>, SourceError> {
    ffmpeg::init().map_err(|e| SourceError::VideoDecode(e.to_string()))?;
    let mut input = ffmpeg::format::input(path).map_err(|e| SourceError::VideoDecode(e.to_string()))?;
    let stream = input
        .streams()
        .best(ffmpeg::media::Type::Video)
        .ok_or_else(|| SourceError::VideoDecode("no video stream".into()))?;
    let stream_index = stream.index();
    let time_base = stream.time_base();

    let context = ffmpeg::codec::context::Context::from_parameters(stream.parameters())
        .map_err(|e| SourceError::VideoDecode(e.to_string()))?;
    let mut decoder = context
        .decoder()
        .video()
        .map_err(|e| SourceError::VideoDecode(e.to_string()))?;

    let mut scaler = ffmpeg::software::scaling::context::Context::get(
        decoder.format(),
        decoder.width(),
        decoder.height(),
        ffmpeg::format::Pixel::RGBA,
        decoder.width(),
        decoder.height(),
        ffmpeg::software::scaling::flag::Flags::BILINEAR,
    )
    .map_err(|e| SourceError::VideoDecode(e.to_string()))?;

    let path_str = path.display().to_string();
    let mut out = Vec::new();
    let mut decoded_frame_index: u32 = 0;
    let mut sampled = 0usize;

    for (stream, packet) in input.packets() {
        if sampled >= config.max_frames {
            break;
        }
        if stream.index() != stream_index {
            continue;
        }
        decoder
            .send_packet(&packet)
            .map_err(|e| SourceError::VideoDecode(e.to_string()))?;

        let mut decoded = ffmpeg::util::frame::video::Video::empty();
        while decoder.receive_frame(&mut decoded).is_ok() {
            if decoded_frame_index % config.frame_step.max(1) == 0 {
                let mut rgba = ffmpeg::util::frame::video::Video::empty();
                scaler
                    .run(&decoded, &mut rgba)
                    .map_err(|e| SourceError::VideoDecode(e.to_string()))?;

                let width = rgba.width();
                let height = rgba.height();
                let stride = rgba.stride(0);
                let mut pixels = Vec::with_capacity((width * height * 4) as usize);
                for row in 0..height as usize {
                    let row_start = row * stride;
                    pixels.extend_from_slice(&rgba.data(0)[row_start..row_start + width as usize * 4]);
                }

                let pts = decoded.pts().unwrap_or(0);
                let start_ms = (pts as f64 * f64::from(time_base.numerator())
                    / f64::from(time_base.denominator())
                    * 1000.0) as u64;

                let mut source = SourceMeta::for_path(path_str.clone());
                source.frame_index = Some(decoded_frame_index);
                source.start_ms = Some(start_ms);

                out.push(RawSegment::Image {
                    pixels,
                    width,
                    height,
                    source,
                });
                sampled += 1;
                if sampled >= config.max_frames {
                    break;
                }
            }
            decoded_frame_index += 1;
        }
    }

    Ok(out)
}
