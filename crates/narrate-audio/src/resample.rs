//! Sample-rate conversion for mono PCM.

use rubato::{FftFixedIn, Resampler};

const CHUNK: usize = 1024;
const SUB_CHUNKS: usize = 2;

/// Number of samples `len` input samples become at the new rate.
pub fn resampled_len(len: usize, from: u32, to: u32) -> usize {
    (len as u64 * u64::from(to) / u64::from(from)) as usize
}

/// Converts mono samples from `from` Hz to `to` Hz.
///
/// The output has exactly [`resampled_len`] samples: the resampler delay is
/// removed from the front and the zero padding of the last chunk is cut.
pub fn resample_mono(input: &[f32], from: u32, to: u32) -> Result<Vec<f32>, String> {
    if from == to {
        return Ok(input.to_vec());
    }

    let mut resampler = FftFixedIn::<f32>::new(from as usize, to as usize, CHUNK, SUB_CHUNKS, 1)
        .map_err(|e| format!("cannot resample {} Hz to {} Hz: {}", from, to, e))?;

    let expected = resampled_len(input.len(), from, to);
    let delay = resampler.output_delay();
    let mut out = Vec::with_capacity(expected + delay + CHUNK);

    let mut pos = 0;
    while out.len() < expected + delay {
        let frames_needed = resampler.input_frames_next();
        let mut block = vec![0.0f32; frames_needed];
        if pos < input.len() {
            let end = (pos + frames_needed).min(input.len());
            block[..end - pos].copy_from_slice(&input[pos..end]);
        }
        pos += frames_needed;

        let frames = resampler
            .process(&[block], None)
            .map_err(|e| format!("resampling failed: {}", e))?;
        out.extend_from_slice(&frames[0]);
    }

    out.drain(..delay);
    out.truncate(expected);
    Ok(out)
}
