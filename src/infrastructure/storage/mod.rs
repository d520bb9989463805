pub mod fs_store;
pub mod memory;

pub use fs_store::FsArtifactStore;
pub use memory::InMemoryArtifactStore;
