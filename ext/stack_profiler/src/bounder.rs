use crate::error::Error;
use crate::frame::FrameDescriptor;
use crate::frame_source::RawStack;

pub const MIN_FRAMES_LIMIT: usize = 5;
pub const MAX_FRAMES_LIMIT: usize = 10_000;
pub const DEFAULT_MAX_FRAMES: usize = 400;

/// Frame budget of a single sample, validated to lie within
/// `MIN_FRAMES_LIMIT..=MAX_FRAMES_LIMIT`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MaxFrames(usize);

impl MaxFrames {
    pub fn new(max_frames: usize) -> Result<Self, Error> {
        if (MIN_FRAMES_LIMIT..=MAX_FRAMES_LIMIT).contains(&max_frames) {
            Ok(Self(max_frames))
        } else {
            Err(Error::InvalidConfiguration(format!(
                "max_frames must be between {} and {}, got {}",
                MIN_FRAMES_LIMIT, MAX_FRAMES_LIMIT, max_frames
            )))
        }
    }

    pub fn get(self) -> usize {
        self.0
    }
}

impl Default for MaxFrames {
    fn default() -> Self {
        Self(DEFAULT_MAX_FRAMES)
    }
}

impl TryFrom<usize> for MaxFrames {
    type Error = Error;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Apply the frame budget to a walked stack.
///
/// - A terminated thread yields no frames at all.
/// - A live thread without introspectable frames yields a single
///   "In native code" placeholder.
/// - A stack deeper than `max_frames` keeps its `max_frames - 1` innermost
///   frames followed by one "N frames omitted" placeholder, where N counts
///   every real frame not kept.
pub fn bound(raw_stack: RawStack, max_frames: MaxFrames) -> Vec<FrameDescriptor> {
    let (mut frames, depth) = match raw_stack {
        RawStack::Terminated => return vec![],
        RawStack::Live { frames, depth } => (frames, depth),
    };

    if frames.is_empty() {
        if depth > 0 {
            log::trace!(
                "Frame source reported depth {} but no frames; treating as native code",
                depth
            );
        }
        return vec![FrameDescriptor::native_code_placeholder()];
    }

    // A source may under-report its depth if the stack grew during the walk
    let depth = depth.max(frames.len());
    let max_frames = max_frames.get();

    if depth <= max_frames {
        return frames;
    }

    frames.truncate(max_frames - 1);
    let omitted_count = depth - frames.len();
    frames.push(FrameDescriptor::omitted_frames_placeholder(omitted_count));
    frames
}
