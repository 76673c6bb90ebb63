use std::sync::Arc;

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{Client, Collection, Database, bson::doc, options::IndexOptions};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult},
    models::{MongoRoundDocument, doc_id},
};
use crate::dao::{
    models::{RoundEntity, RoundListItemEntity},
    round_store::RoundStore,
    storage::StorageResult,
};

const ROUND_COLLECTION_NAME: &str = "rounds";

/// MongoDB-backed implementation of [`RoundStore`].
#[derive(Clone)]
pub struct MongoRoundStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    client: Client,
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) =
            establish_connection(&self.config.options, &self.config.database_name).await?;
        let mut guard = self.state.write().await;
        guard.client = client;
        guard.database = database;
        Ok(())
    }
}

impl MongoRoundStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) =
            establish_connection(&config.options, &config.database_name).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { client, database }),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        let database = self.database().await;
        let collection = database.collection::<mongodb::bson::Document>(ROUND_COLLECTION_NAME);
        let index = mongodb::IndexModel::builder()
            .keys(doc! {"status": 1, "started_at": -1})
            .options(
                IndexOptions::builder()
                    .name(Some("round_status_started_idx".to_owned()))
                    .build(),
            )
            .build();

        collection
            .create_index(index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: ROUND_COLLECTION_NAME,
                index: "status,started_at",
                source,
            })?;

        Ok(())
    }

    async fn database(&self) -> Database {
        let guard = self.inner.state.read().await;
        guard.database.clone()
    }

    async fn collection(&self) -> Collection<MongoRoundDocument> {
        let guard = self.inner.state.read().await;
        guard
            .database
            .collection::<MongoRoundDocument>(ROUND_COLLECTION_NAME)
    }

    async fn save_round(&self, round: RoundEntity) -> MongoResult<()> {
        let id = round.id;
        let document: MongoRoundDocument = round.into();
        let collection = self.collection().await;
        collection
            .replace_one(doc_id(id), &document)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::SaveRound { id, source })?;

        Ok(())
    }

    async fn find_round(&self, id: Uuid) -> MongoResult<Option<RoundEntity>> {
        let collection = self.collection().await;

        let document = collection
            .find_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::LoadRound { id, source })?;

        Ok(document.map(Into::into))
    }

    async fn list_rounds(&self) -> MongoResult<Vec<RoundListItemEntity>> {
        let collection = self.collection().await;

        let documents: Vec<MongoRoundDocument> = collection
            .find(doc! {})
            .sort(doc! {"started_at": -1})
            .await
            .map_err(|source| MongoDaoError::ListRounds { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ListRounds { source })?;

        Ok(documents
            .into_iter()
            .map(|document| {
                let entity: RoundEntity = document.into();
                entity.into()
            })
            .collect())
    }
}

impl RoundStore for MongoRoundStore {
    fn save_round(&self, round: RoundEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.save_round(round).await.map_err(Into::into) })
    }

    fn find_round(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<RoundEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_round(id).await.map_err(Into::into) })
    }

    fn list_rounds(&self) -> BoxFuture<'static, StorageResult<Vec<RoundListItemEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_rounds().await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}
