//! Turns the code and data sections of a RISC-V executable into imem/dmem
//! stim files for the RTL simulator.
//!
//! Each configured section is dumped 16 bytes at a time, its byte stream is
//! swapped into little-endian 32-bit words, and the words are written one per
//! line. Sections the image lacks are stood in for by a single `00000000`.

pub mod app;
pub mod config;
pub mod error;
pub mod hexdump;
pub mod hexprinter;
pub mod packer;
pub mod section;
pub mod stim;
pub mod toolchain;

pub use app::{run, run_with, Outputs};
pub use config::{Config, Xlen};
pub use error::{Error, Result, Stage};
