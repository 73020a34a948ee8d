//! Byte allocations backing ndhook views and staging buffers, with built-in
//! support for proper alignment.

pub mod align;
pub mod aligned;

pub use aligned::AlignedBytes;
