//! Device stream wire format and frame reassembly

mod byte_queue;
mod decoder;
mod frames;

pub use byte_queue::ByteQueue;
pub use decoder::{DECODE_BUFFER_SIZE, FrameDecoder};
pub use frames::{
    ACCEL_HEADER, EMPTY_MARKER_HEADER, Frame, GYRO_HEADER, MARKER_FRAME_SIZE, MARKER_HEADER,
    SAMPLE_FRAME_SIZE,
};

#[cfg(test)]
pub(crate) use frames::{encode_marker, encode_sample};
