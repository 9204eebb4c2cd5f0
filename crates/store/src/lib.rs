pub mod conformance;
mod error;
mod file;
mod memory;
mod traits;

pub use error::StoreError;
pub use file::JsonFileStore;
pub use memory::MemoryStore;
pub use traits::RecordStore;
