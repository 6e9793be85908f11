//! Limit scanner: directory walker, byte-limit checks, violation stream.

pub mod audit;
pub mod limits;
pub mod walker;
