pub mod memory_store;

pub use memory_store::MemoryStore;
