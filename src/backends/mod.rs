//! Store backings. Only the in-memory arena ships today.

pub mod memory;

pub use memory::MemoryFileSystem;
