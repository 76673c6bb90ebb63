//! Pure scoring core: handicap allocation, format strategies, and live-score
//! derivation. Nothing in here touches shared state or performs I/O.

pub mod format;
pub mod handicap;
pub mod live;
