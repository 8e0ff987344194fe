//! Expanded-key files for the `saes` tool.
//!
//! A [`ScheduleFile`] stores an AES or SM4 round-key schedule together with
//! the parameters needed to check it on load, serialized with `bincode`.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod file;

pub use file::{CipherId, Direction, KeyedSchedule, ScheduleFile, ScheduleParams, FORMAT_VERSION};
