use std::mem;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::SystemTime;

use crate::bounder::MaxFrames;
use crate::configuration::{Configuration, SampleType};
use crate::error::Error;
use crate::frame::FrameDescriptor;
use crate::frame_source::SampleTarget;
use crate::intern::InternTables;
use crate::serialization::profile::{Label, Profile, Sample};
use crate::serialization::serializer::ProfileSerializer;
use crate::stack_collector;

/// Outcome of a successful `sample()` call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Capture {
    /// One sample with this many frames (placeholders included) was recorded.
    Recorded { frames: usize },
    /// The thread had terminated; nothing was recorded.
    Terminated,
}

/// A serialized window, as handed to the upload transport.
#[derive(Clone, Debug)]
pub struct SerializedProfile {
    pub start: SystemTime,
    pub finish: SystemTime,
    pub pprof: Vec<u8>,
}

/// Samples and intern tables accumulated since the last serialize.
#[derive(Debug)]
struct Window {
    start: SystemTime,
    tables: InternTables,
    samples: Vec<Sample>,
}

impl Window {
    fn new(sample_types: &[SampleType], start: SystemTime) -> Self {
        let mut tables = InternTables::new();
        for sample_type in sample_types {
            tables.intern_string(&sample_type.name);
            tables.intern_string(&sample_type.unit);
        }
        Self {
            start,
            tables,
            samples: vec![],
        }
    }

    fn into_profile(self, sample_types: Vec<SampleType>, finish: SystemTime) -> Profile {
        let (string_table, locations, functions) = self.tables.into_parts();
        Profile {
            sample_types,
            samples: self.samples,
            locations,
            functions,
            string_table,
            start: self.start,
            finish,
        }
    }
}

/// Accumulates stack samples into interned tables.
///
/// `sample()` and `serialize()` may be called concurrently from different
/// threads. `serialize()` swaps the active window for an empty one and
/// encodes the old one without holding the lock.
#[derive(Debug)]
pub struct StackRecorder {
    sample_types: Vec<SampleType>,
    max_frames: MaxFrames,
    window: Mutex<Window>,
}

impl StackRecorder {
    pub fn new(sample_types: Vec<SampleType>) -> Result<Self, Error> {
        Self::from_configuration(&Configuration {
            sample_types,
            ..Default::default()
        })
    }

    pub fn from_configuration(configuration: &Configuration) -> Result<Self, Error> {
        configuration.validate()?;
        let max_frames = configuration.max_frames()?;
        let sample_types = configuration.sample_types.clone();
        let window = Window::new(&sample_types, SystemTime::now());
        Ok(Self {
            sample_types,
            max_frames,
            window: Mutex::new(window),
        })
    }

    pub fn sample_types(&self) -> &[SampleType] {
        &self.sample_types
    }

    /// Frame budget used when `sample()` is not given one.
    pub fn max_frames(&self) -> MaxFrames {
        self.max_frames
    }

    /// Capture the stack of `target` and record it as one sample.
    /// `None` falls back to the configured `max_frames`.
    ///
    /// See [`stack_collector::sample`].
    pub fn sample(
        &self,
        target: &dyn SampleTarget,
        metric_values: &[(&str, i64)],
        labels: &[(&str, &str)],
        max_frames: Option<usize>,
    ) -> Result<Capture, Error> {
        let max_frames = max_frames.unwrap_or(self.max_frames.get());
        stack_collector::sample(target, self, metric_values, labels, max_frames)
    }

    /// Align `metric_values` to the configured sample types.
    /// Metrics which were not passed are recorded as 0.
    pub(crate) fn values_for(&self, metric_values: &[(&str, i64)]) -> Result<Vec<i64>, Error> {
        let mut values = vec![0; self.sample_types.len()];
        for (name, value) in metric_values {
            let index = self
                .sample_types
                .iter()
                .position(|sample_type| sample_type.name == *name)
                .ok_or_else(|| Error::UnknownMetric(name.to_string()))?;
            values[index] = *value;
        }
        Ok(values)
    }

    /// Intern `frames` and append them as one sample.
    /// `frames` must not be empty and `values` must be aligned with `sample_types`.
    pub(crate) fn record(
        &self,
        frames: &[FrameDescriptor],
        values: Vec<i64>,
        labels: &[(&str, &str)],
    ) {
        debug_assert!(!frames.is_empty());
        debug_assert_eq!(values.len(), self.sample_types.len());

        let mut window = self.lock_window();
        let tables = &mut window.tables;
        let location_ids = frames
            .iter()
            .map(|frame| tables.intern_frame(frame))
            .collect();
        let labels = labels
            .iter()
            .map(|(key, value)| Label {
                key: tables.intern_string(key),
                value: tables.intern_string(value),
            })
            .collect();
        window.samples.push(Sample {
            location_ids,
            values,
            labels,
        });
    }

    /// Number of samples in the current window.
    pub fn sample_count(&self) -> usize {
        self.lock_window().samples.len()
    }

    /// Take a snapshot of the current window and start a new one.
    pub fn take_profile(&self) -> Profile {
        let finish = SystemTime::now();
        let fresh = Window::new(&self.sample_types, finish);
        let window = mem::replace(&mut *self.lock_window(), fresh);
        log::debug!("Number of samples: {}", window.samples.len());
        window.into_profile(self.sample_types.clone(), finish)
    }

    /// Encode the current window as pprof and start a new one.
    pub fn serialize(&self) -> SerializedProfile {
        let profile = self.take_profile();
        SerializedProfile {
            start: profile.start,
            finish: profile.finish,
            pprof: ProfileSerializer::encode(&profile),
        }
    }

    fn lock_window(&self) -> MutexGuard<'_, Window> {
        // Samples are pushed in a single step, so a window is consistent even
        // if a holder of the lock panicked
        self.window.lock().unwrap_or_else(|poisoned: PoisonError<_>| {
            log::debug!("Recovering recorder state from a poisoned lock");
            poisoned.into_inner()
        })
    }
}
