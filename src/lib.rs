//! ZEN_80 library.
//!
//! Provides the ZEN_80 lane machine: memory banks, instruction table, decoder,
//! dispatcher and cooperative lane scheduler.

pub mod utils;
pub mod virtual_machine;
