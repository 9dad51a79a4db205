//! Core data types for channels, samples, and emitted events

mod channel;
mod event;
mod matrix;

pub use channel::{ChannelMask, SensorChannel, SensorHandle};
pub use event::{RawSample, SampleStatus, SensorEvent};
pub use matrix::MountingMatrix;
