//! Shared setup for the EntiKV benchmarks.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod utils;
