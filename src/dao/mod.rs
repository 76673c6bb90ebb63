/// Round persistence operations behind the `RoundStore` trait.
pub mod round_store;
/// Database model definitions shared across storage backends.
pub mod models;
/// Storage abstraction error layer.
pub mod storage;
