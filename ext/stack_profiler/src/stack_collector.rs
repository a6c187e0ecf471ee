use crate::bounder::{self, MaxFrames};
use crate::error::Error;
use crate::frame_source::SampleTarget;
use crate::recorder::{Capture, StackRecorder};

/// Capture the call stack of `target` and record it into `recorder` as one
/// sample carrying `metric_values` and `labels`.
///
/// Fails with `Error::InvalidTarget` when `target` cannot be introspected,
/// with `Error::InvalidConfiguration` when `max_frames` is outside
/// `5..=10_000`, and with `Error::UnknownMetric` for metrics the recorder does
/// not know about. The recorder is left untouched on every error.
///
/// A thread which has already terminated is not an error: nothing is
/// recorded and `Capture::Terminated` is returned.
pub fn sample(
    target: &dyn SampleTarget,
    recorder: &StackRecorder,
    metric_values: &[(&str, i64)],
    labels: &[(&str, &str)],
    max_frames: usize,
) -> Result<Capture, Error> {
    let introspection = target.introspection().ok_or(Error::InvalidTarget)?;
    let max_frames = MaxFrames::new(max_frames)?;
    let values = recorder.values_for(metric_values)?;

    // Read at most max_frames; the walk reports the real depth for the omitted count
    let raw_stack = introspection.walk(max_frames.get());
    let frames = bounder::bound(raw_stack, max_frames);
    if frames.is_empty() {
        log::trace!("Thread terminated before its stack could be sampled");
        return Ok(Capture::Terminated);
    }

    recorder.record(&frames, values, labels);
    Ok(Capture::Recorded {
        frames: frames.len(),
    })
}
