//! # SpandaIO
//!
//! Driver front-end for a motion sensor unit that streams multiplexed
//! fixed-size frames over a character device. The crate decodes the byte
//! stream incrementally, rotates raw samples into the body frame, scales
//! them to physical units, and coordinates enable, rate, batching, and
//! flush requests against the device's control interface.
//!
//! ## Architecture
//!
//! - [`protocol`]: wire format, ring-buffer reassembly, frame decoder
//! - [`transport`]: byte stream abstraction ([`transport::DeviceStream`])
//! - [`control`]: control-plane abstraction ([`control::DeviceControl`],
//!   [`control::CompassSensor`])
//! - [`driver`]: the [`SpandaIO`] coordinator tying it all together
//!
//! Platform integrations supply the two trait implementations; the crate
//! ships [`transport::MockStream`] and [`control::MockControl`] for tests.
//!
//! ## Example
//!
//! ```
//! use spanda_io::{Config, SensorChannel, SpandaIO};
//! use spanda_io::control::MockControl;
//! use spanda_io::transport::MockStream;
//!
//! # fn main() -> spanda_io::Result<()> {
//! let stream = MockStream::new();
//! let control = MockControl::new();
//! let mut driver = SpandaIO::new(stream, control, None, Config::default());
//!
//! driver.set_rate(SensorChannel::Gyroscope.handle(), 10_000_000)?;
//! driver.set_enabled(SensorChannel::Gyroscope.handle(), true)?;
//!
//! let mut events = Vec::new();
//! driver.poll_events(&mut events, 64)?;
//! # Ok(())
//! # }
//! ```

pub mod clock;
pub mod config;
pub mod control;
pub mod driver;
pub mod error;
pub mod protocol;
pub mod transport;
pub mod types;

pub use config::Config;
pub use driver::SpandaIO;
pub use error::{Error, Result};
pub use types::{ChannelMask, SensorChannel, SensorEvent, SensorHandle};
