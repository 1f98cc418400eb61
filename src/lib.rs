//! Resolves firmware variables to their bytes within an ELF32 file and reads and
//! writes them across any number of calibration images.
pub mod calib;
pub mod cli;
pub mod commands;
pub mod debug;
pub mod elf;
pub mod error;

pub use error::{CalibError, Result};
