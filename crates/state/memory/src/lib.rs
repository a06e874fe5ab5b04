mod backend;

pub use backend::MemorySnapshotBackend;
