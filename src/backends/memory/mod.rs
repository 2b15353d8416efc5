mod fs;
mod index;

pub use fs::MemoryFileSystem;
