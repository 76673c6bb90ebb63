#[cfg(feature = "mongo-store")]
pub mod mongodb;

use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dao::models::{RoundEntity, RoundListItemEntity};
use crate::dao::storage::StorageResult;

/// Abstraction over the persistence layer for round documents.
///
/// The in-memory round registry stays authoritative while a round is live;
/// the store receives full-document snapshots so a reconnecting backend can
/// always be brought up to date by the latest write.
pub trait RoundStore: Send + Sync {
    /// Upsert the full round document.
    fn save_round(&self, round: RoundEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Fetch a round document by id.
    fn find_round(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<RoundEntity>>>;
    /// List stored rounds, newest first.
    fn list_rounds(&self) -> BoxFuture<'static, StorageResult<Vec<RoundListItemEntity>>>;
    /// Cheap connectivity probe used by the storage supervisor.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Re-establish the underlying connection after a failed health check.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
