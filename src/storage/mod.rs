pub mod allocator;
pub mod backing;
pub mod codec;
pub mod store;

pub use allocator::{IdAllocator, RandomIds, SEQUENTIAL_BASE_OFFSET, SequentialIds};
pub use backing::BackingFile;
pub use store::PlayerStore;
