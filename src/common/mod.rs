pub mod collections;
pub mod errors;
pub mod traits;
pub mod types;
