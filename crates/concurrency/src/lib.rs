//! Version arbitration for Syncstore
//!
//! Provides the timestamp authority that stamps every mutation:
//! - `TimestampAuthority`: wall-clock versions with a logical fallback
//! - `Clock`: injectable time source (`SystemClock`, `ManualClock`)
//!
//! Per collection, versions are unique and strictly increasing in the order
//! writes complete, provided each bump happens inside the backend's atomic
//! write for that collection.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod clock;
pub mod timestamp;

pub use clock::{Clock, ManualClock, SystemClock};
pub use timestamp::TimestampAuthority;
