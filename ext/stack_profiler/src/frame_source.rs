use crate::frame::FrameDescriptor;

/// Anything which may be handed to the stack collector.
///
/// Only execution units (threads, fibers, interpreter contexts, ...) expose
/// [`StackIntrospection`]; everything else keeps the default and is rejected
/// with `Error::InvalidTarget`.
pub trait SampleTarget {
    fn introspection(&self) -> Option<&dyn StackIntrospection> {
        None
    }
}

/// Capability to read the call stack of a (possibly running) thread.
///
/// Implementations return a best-effort snapshot and must never block the
/// target thread for longer than the read itself.
pub trait StackIntrospection: Send + Sync {
    /// Walk at most `limit` frames, innermost first.
    fn walk(&self, limit: usize) -> RawStack;
}

#[derive(Clone, Debug, PartialEq)]
pub enum RawStack {
    /// The thread has finished running.
    Terminated,
    /// Frames read from a live thread. `frames` holds at most the requested
    /// number of frames; `depth` is the real depth of the stack at the time
    /// of the walk and is never smaller than `frames.len()`.
    Live {
        frames: Vec<FrameDescriptor>,
        depth: usize,
    },
}

impl RawStack {
    /// A complete walk where every frame was read.
    pub fn complete(frames: Vec<FrameDescriptor>) -> Self {
        let depth = frames.len();
        RawStack::Live { frames, depth }
    }
}
