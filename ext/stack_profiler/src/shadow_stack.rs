//! An in-process frame source.
//!
//! Code that wants to be profiled records its own call stack: entering a
//! function pushes a frame onto the current thread's shadow stack and the
//! returned guard pops it again. A [`ShadowThread`] handle can be sent to the
//! sampling thread and read from there while the owner keeps running.
//!
//! The shadow stack of a thread lives in a thread-local, so once the owning
//! thread exits every handle to it reports the thread as terminated.

use std::cell::RefCell;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use crate::frame::FrameDescriptor;
use crate::frame_source::{RawStack, SampleTarget, StackIntrospection};

/// Frames of one thread, outermost first.
type Frames = Mutex<Vec<FrameDescriptor>>;

struct ShadowStack {
    frames: Arc<Frames>,
    native_thread_id: i64,
}

impl ShadowStack {
    fn new() -> Self {
        Self {
            frames: Arc::new(Mutex::new(vec![])),
            native_thread_id: native_thread_id(),
        }
    }
}

thread_local! {
    static CURRENT: RefCell<Option<ShadowStack>> = const { RefCell::new(None) };
}

fn with_current<R>(f: impl FnOnce(&ShadowStack) -> R) -> R {
    CURRENT.with(|current| {
        let mut current = current.borrow_mut();
        f(current.get_or_insert_with(ShadowStack::new))
    })
}

fn lock(frames: &Frames) -> MutexGuard<'_, Vec<FrameDescriptor>> {
    frames.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Push `frame` onto the current thread's shadow stack.
/// Dropping the returned guard removes the frame along with every frame
/// entered after it.
#[must_use = "the frame is popped as soon as the guard is dropped"]
pub fn enter(frame: FrameDescriptor) -> FrameGuard {
    let depth = with_current(|stack| {
        let mut frames = lock(&stack.frames);
        frames.push(frame);
        frames.len() - 1
    });
    FrameGuard {
        depth,
        _not_send: PhantomData,
    }
}

/// A handle to the current thread's shadow stack.
pub fn current() -> ShadowThread {
    with_current(|stack| ShadowThread {
        frames: Arc::downgrade(&stack.frames),
        native_thread_id: stack.native_thread_id,
    })
}

pub struct FrameGuard {
    // Stack length before the frame was pushed
    depth: usize,
    // Must be dropped on the thread which pushed the frame
    _not_send: PhantomData<*const ()>,
}

impl Drop for FrameGuard {
    fn drop(&mut self) {
        // The thread-local may already be gone during thread teardown
        let _ = CURRENT.try_with(|current| {
            if let Some(stack) = current.borrow().as_ref() {
                lock(&stack.frames).truncate(self.depth);
            }
        });
    }
}

/// A thread whose stack is recorded with [`enter`].
#[derive(Clone, Debug)]
pub struct ShadowThread {
    frames: Weak<Frames>,
    native_thread_id: i64,
}

impl ShadowThread {
    /// OS-level id of the owning thread.
    pub fn native_thread_id(&self) -> i64 {
        self.native_thread_id
    }

    pub fn is_alive(&self) -> bool {
        self.frames.strong_count() > 0
    }
}

impl SampleTarget for ShadowThread {
    fn introspection(&self) -> Option<&dyn StackIntrospection> {
        Some(self)
    }
}

impl StackIntrospection for ShadowThread {
    fn walk(&self, limit: usize) -> RawStack {
        let Some(frames) = self.frames.upgrade() else {
            return RawStack::Terminated;
        };
        let frames = lock(&frames);
        RawStack::Live {
            frames: frames.iter().rev().take(limit).cloned().collect(),
            depth: frames.len(),
        }
    }
}

#[cfg(target_os = "linux")]
fn native_thread_id() -> i64 {
    unsafe { libc::syscall(libc::SYS_gettid) as i64 }
}

#[cfg(not(target_os = "linux"))]
fn native_thread_id() -> i64 {
    unsafe { libc::pthread_self() as usize as i64 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::thread;

    fn frame(name: &str, line: i64) -> FrameDescriptor {
        FrameDescriptor::new(name, "shadow_stack_test.rs", line)
    }

    #[test]
    fn test_walk_is_innermost_first() {
        let outer = enter(frame("outer", 1));
        let inner = enter(frame("inner", 2));
        let thread = current();

        assert_eq!(
            thread.walk(10),
            RawStack::Live {
                frames: vec![frame("inner", 2), frame("outer", 1)],
                depth: 2,
            }
        );
        assert_eq!(
            thread.walk(1),
            RawStack::Live {
                frames: vec![frame("inner", 2)],
                depth: 2,
            }
        );

        drop(inner);
        assert_eq!(thread.walk(10), RawStack::complete(vec![frame("outer", 1)]));
        drop(outer);
        assert_eq!(thread.walk(10), RawStack::complete(vec![]));
    }

    #[test]
    fn test_dropping_an_outer_guard_unwinds_inner_frames() {
        let outer = enter(frame("outer", 1));
        let middle = enter(frame("middle", 2));
        let inner = enter(frame("inner", 3));
        let thread = current();

        drop(middle);
        assert_eq!(thread.walk(10), RawStack::complete(vec![frame("outer", 1)]));

        // Already unwound by the middle guard
        drop(inner);
        assert_eq!(thread.walk(10), RawStack::complete(vec![frame("outer", 1)]));

        let again = enter(frame("again", 4));
        assert_eq!(
            thread.walk(10),
            RawStack::complete(vec![frame("again", 4), frame("outer", 1)])
        );
        drop(again);
        drop(outer);
        assert_eq!(thread.walk(10), RawStack::complete(vec![]));
    }

    #[test]
    fn test_exited_thread_is_terminated() {
        let handle = thread::spawn(|| {
            let _guard = enter(frame("short_lived", 1));
            current()
        })
        .join()
        .unwrap();

        assert!(!handle.is_alive());
        assert_eq!(handle.walk(10), RawStack::Terminated);
    }

    #[test]
    fn test_read_from_another_thread() {
        let (handle_tx, handle_rx) = mpsc::channel();
        let (done_tx, done_rx) = mpsc::channel::<()>();
        let worker = thread::spawn(move || {
            let _guard = enter(frame("blocked", 7));
            handle_tx.send(current()).unwrap();
            done_rx.recv().unwrap();
        });

        let handle = handle_rx.recv().unwrap();
        assert!(handle.is_alive());
        assert_eq!(handle.walk(10), RawStack::complete(vec![frame("blocked", 7)]));

        done_tx.send(()).unwrap();
        worker.join().unwrap();
        assert_eq!(handle.walk(10), RawStack::Terminated);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_native_thread_id() {
        let (id, handle) = thread::spawn(|| (unsafe { libc::syscall(libc::SYS_gettid) } as i64, current()))
            .join()
            .unwrap();
        assert_eq!(handle.native_thread_id(), id);
        assert_ne!(current().native_thread_id(), id);
    }
}
