mod backend;

pub use backend::FileSnapshotBackend;
