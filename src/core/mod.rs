pub mod error;
pub mod player;

pub use error::{Result, StoreError};
pub use player::PlayerRecord;
