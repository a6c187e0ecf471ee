extern crate serde;
#[macro_use]
extern crate serde_derive;

pub mod bounder;
pub mod configuration;
pub mod error;
pub mod frame;
pub mod frame_source;
pub mod intern;
pub mod recorder;
pub mod serialization;
pub mod shadow_stack;
pub mod stack_collector;

pub use configuration::{Configuration, SampleType};
pub use error::Error;
pub use frame::FrameDescriptor;
pub use frame_source::{RawStack, SampleTarget, StackIntrospection};
pub use recorder::{Capture, SerializedProfile, StackRecorder};
pub use serialization::profile::Profile;
pub use serialization::serializer::ProfileSerializer;
pub use stack_collector::sample;

/// Route `log` output to stderr. Only available with the `debug` feature.
#[cfg(feature = "debug")]
pub fn init_debug_logging() {
    let _ = env_logger::builder()
        .format_timestamp(None)
        .format_module_path(false)
        .try_init();
}
