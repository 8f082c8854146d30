pub mod kv_store;
pub mod saved_test_repository;

pub use kv_store::{InMemoryStore, JsonFileStore, KeyValueStore};
pub use saved_test_repository::{KvSavedTestRepository, SavedTestRepository};
