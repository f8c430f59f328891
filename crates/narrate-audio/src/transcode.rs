//! Decode, append and re-encode.
//!
//! Every segment is decoded to mono PCM, a fixed gap of silence is appended
//! after it, and the whole buffer is written once as 16-bit WAV. The output
//! sample rate is taken from the first segment that decodes; segments at a
//! different rate are resampled to it.

use crate::error::AudioError;
use crate::resample::resample_mono;
use crate::segment::AudioSegment;
use crate::AssemblyReport;
use std::borrow::Cow;
use std::io::Cursor;
use std::path::Path;
use std::time::Duration;
use symphonia::core::audio::{AudioBuffer, AudioBufferRef, Signal};
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::conv::FromSample;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::sample::Sample;
use tracing::{debug, warn};

/// Silence appended after every segment.
pub const SEGMENT_GAP: Duration = Duration::from_millis(300);

/// Mono samples in `[-1.0, 1.0]` plus their rate.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

fn push_first_channel<T>(samples: &mut Vec<f32>, data: Cow<AudioBuffer<T>>)
where
    T: Sample,
    f32: FromSample<T>,
{
    samples.extend(data.chan(0).iter().map(|v| f32::from_sample(*v)));
}

/// Decodes one encoded segment. Only the first channel is kept.
pub fn decode_segment(segment: &AudioSegment) -> Result<DecodedAudio, AudioError> {
    let decode_error = |reason: String| AudioError::Decode {
        task_id: segment.task_id.clone(),
        reason,
    };

    let bytes = segment.load()?;
    let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes)), Default::default());

    let mut hint = Hint::new();
    if !segment.format.is_empty() {
        hint.with_extension(&segment.format);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| decode_error(e.to_string()))?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| decode_error("no decodable audio track".to_string()))?;
    let track_id = track.id;
    let mut sample_rate = track.codec_params.sample_rate;
    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| decode_error(format!("unsupported codec: {}", e)))?;

    let mut samples = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break
            }
            Err(e) => return Err(decode_error(e.to_string())),
        };
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(reason)) => {
                debug!(task_id = %segment.task_id, reason, "skipping corrupt packet");
                continue;
            }
            Err(e) => return Err(decode_error(e.to_string())),
        };
        if sample_rate.is_none() {
            sample_rate = Some(decoded.spec().rate);
        }

        match decoded {
            AudioBufferRef::F32(buf) => samples.extend(buf.chan(0)),
            AudioBufferRef::U8(data) => push_first_channel(&mut samples, data),
            AudioBufferRef::U16(data) => push_first_channel(&mut samples, data),
            AudioBufferRef::U24(data) => push_first_channel(&mut samples, data),
            AudioBufferRef::U32(data) => push_first_channel(&mut samples, data),
            AudioBufferRef::S8(data) => push_first_channel(&mut samples, data),
            AudioBufferRef::S16(data) => push_first_channel(&mut samples, data),
            AudioBufferRef::S24(data) => push_first_channel(&mut samples, data),
            AudioBufferRef::S32(data) => push_first_channel(&mut samples, data),
            AudioBufferRef::F64(data) => push_first_channel(&mut samples, data),
        }
    }

    let sample_rate = sample_rate.ok_or_else(|| decode_error("unknown sample rate".to_string()))?;
    Ok(DecodedAudio {
        samples,
        sample_rate,
    })
}

fn gap_samples(sample_rate: u32, gap: Duration) -> usize {
    (u128::from(sample_rate) * gap.as_millis() / 1000) as usize
}

fn to_pcm16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16
}

/// Decodes `segments` in order, inserts `gap` of silence after each, and
/// writes one mono 16-bit WAV file to `destination`.
pub fn transcode(
    segments: &[AudioSegment],
    destination: &Path,
    gap: Duration,
) -> Result<AssemblyReport, AudioError> {
    let mut sample_rate: Option<u32> = None;
    let mut pcm: Vec<f32> = Vec::new();
    let mut used = 0;
    let mut skipped = 0;

    for segment in segments {
        let decoded = match decode_segment(segment) {
            Ok(decoded) => decoded,
            Err(e) => {
                warn!(task_id = %segment.task_id, error = %e, "skipping undecodable segment");
                skipped += 1;
                continue;
            }
        };

        let rate = *sample_rate.get_or_insert(decoded.sample_rate);
        let samples = if decoded.sample_rate == rate {
            decoded.samples
        } else {
            debug!(
                task_id = %segment.task_id,
                from = decoded.sample_rate,
                to = rate,
                "resampling segment"
            );
            match resample_mono(&decoded.samples, decoded.sample_rate, rate) {
                Ok(samples) => samples,
                Err(reason) => {
                    let e = AudioError::Resample {
                        task_id: segment.task_id.clone(),
                        reason,
                    };
                    warn!(task_id = %segment.task_id, error = %e, "skipping segment");
                    skipped += 1;
                    continue;
                }
            }
        };
        if samples.is_empty() {
            warn!(task_id = %segment.task_id, "skipping silent segment");
            skipped += 1;
            continue;
        }

        pcm.extend(samples);
        pcm.resize(pcm.len() + gap_samples(rate, gap), 0.0);
        used += 1;
    }

    let rate = match sample_rate {
        Some(rate) if used > 0 => rate,
        _ => return Err(AudioError::NoSegments),
    };

    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(destination, spec)?;
    for sample in &pcm {
        writer.write_sample(to_pcm16(*sample))?;
    }
    writer.finalize()?;

    let bytes_written = std::fs::metadata(destination)
        .map_err(|e| AudioError::io(destination, e))?
        .len();
    let duration = Duration::from_nanos(pcm.len() as u64 * 1_000_000_000 / u64::from(rate));

    Ok(AssemblyReport {
        segments_used: used,
        segments_skipped: skipped,
        bytes_written,
        duration: Some(duration),
    })
}
