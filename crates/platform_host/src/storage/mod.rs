//! Key/value storage-area contracts and lightweight test adapters.

mod area;

pub use area::{
    load_entry_with, save_entry_with, MemoryStorageArea, NoopStorageArea, StorageArea,
    StorageFuture, UnavailableStorageArea,
};
