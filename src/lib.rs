//! Decomposes natural-language coding requests into ordered, risk-assessed
//! execution plans. The `qd` binary is a thin shell over this library.

pub mod cli;
pub mod config;
pub mod llm;
pub mod logging;
pub mod planning;
