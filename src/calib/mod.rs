//! Reading and writing calibration values. The ELF file and symbol tree say where each
//! value lives and what type it is; memory images hold the values themselves.
pub mod codec;
pub mod ihex;
pub mod image;
pub mod set;

pub use codec::*;
pub use image::*;
pub use set::*;
