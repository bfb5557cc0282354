//! Leading/trailing silence removal
//!
//! The envelope is the rectified pre-emphasized signal, taken as the maximum
//! across channels per frame. Everything before the first and after the last
//! frame above the threshold is dropped.

use tracing::debug;

use crate::engine::AudioBuffer;
use crate::error::{Result, SonicPrepError};

/// Pre-emphasis coefficient
pub const PRE_EMPHASIS: f32 = 0.97;

/// Pre-emphasize one channel: `y[n] = x[n] - 0.97·x[n-1]`
///
/// The sample before the start is extrapolated linearly as `2·x[0] - x[1]`,
/// or taken as zero for a single-sample channel.
pub fn pre_emphasis(channel: &[f32]) -> Vec<f32> {
    let Some(&first) = channel.first() else {
        return Vec::new();
    };
    let before = match channel.get(1) {
        Some(&second) => 2.0 * first - second,
        None => 0.0,
    };

    let mut prev = before;
    channel
        .iter()
        .map(|&x| {
            let y = x - PRE_EMPHASIS * prev;
            prev = x;
            y
        })
        .collect()
}

/// Per-frame envelope: max over channels of `|pre_emphasis(x)|`
pub fn envelope(buffer: &AudioBuffer) -> Vec<f32> {
    let mut env = vec![0.0_f32; buffer.len()];
    for channel in &buffer.samples {
        for (e, y) in env.iter_mut().zip(pre_emphasis(channel)) {
            *e = e.max(y.abs());
        }
    }
    env
}

/// Trim leading and trailing frames whose envelope is at or below `threshold`
///
/// The kept range is closed: both the first and the last frame above the
/// threshold survive. A buffer with no frame above the threshold is returned
/// unchanged.
///
/// # Errors
/// * `InvalidSignal` - If the buffer is empty
pub fn trim(buffer: &AudioBuffer, threshold: f32) -> Result<AudioBuffer> {
    if buffer.is_empty() {
        return Err(SonicPrepError::invalid_signal("cannot trim an empty buffer"));
    }

    let env = envelope(buffer);
    let first = env.iter().position(|&e| e > threshold);
    let last = env.iter().rposition(|&e| e > threshold);

    match (first, last) {
        (Some(first), Some(last)) => {
            debug!(
                first,
                last,
                removed = buffer.len() - (last - first + 1),
                "trimmed silence"
            );
            Ok(buffer.slice_frames(first, last + 1))
        }
        _ => {
            debug!(threshold, "nothing above threshold, keeping buffer");
            Ok(buffer.clone())
        }
    }
}
