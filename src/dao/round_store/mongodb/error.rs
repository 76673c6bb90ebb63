use thiserror::Error;
use uuid::Uuid;

/// Result alias for MongoDB-backed storage operations.
pub type MongoResult<T> = Result<T, MongoDaoError>;

/// Errors surfaced by the MongoDB round store.
#[derive(Debug, Error)]
pub enum MongoDaoError {
    /// The connection string could not be parsed.
    #[error("invalid MongoDB URI `{uri}`")]
    InvalidUri {
        /// URI that failed to parse.
        uri: String,
        /// Driver-level cause.
        #[source]
        source: mongodb::error::Error,
    },
    /// A required environment variable is absent.
    #[error("missing environment variable `{var}`")]
    MissingEnvVar {
        /// Name of the missing variable.
        var: &'static str,
    },
    /// The client could not be constructed from parsed options.
    #[error("failed to construct MongoDB client")]
    ClientConstruction {
        /// Driver-level cause.
        #[source]
        source: mongodb::error::Error,
    },
    /// The initial ping never succeeded within the retry budget.
    #[error("MongoDB unreachable after {attempts} ping attempts")]
    InitialPing {
        /// Number of attempts made.
        attempts: u32,
        /// Driver-level cause.
        #[source]
        source: mongodb::error::Error,
    },
    /// A health-check ping failed.
    #[error("MongoDB health ping failed")]
    HealthPing {
        /// Driver-level cause.
        #[source]
        source: mongodb::error::Error,
    },
    /// Index creation failed during bootstrap.
    #[error("failed to ensure index `{index}` on `{collection}`")]
    EnsureIndex {
        /// Collection the index belongs to.
        collection: &'static str,
        /// Index keys description.
        index: &'static str,
        /// Driver-level cause.
        #[source]
        source: mongodb::error::Error,
    },
    /// Upserting a round document failed.
    #[error("failed to save round `{id}`")]
    SaveRound {
        /// Round id.
        id: Uuid,
        /// Driver-level cause.
        #[source]
        source: mongodb::error::Error,
    },
    /// Loading a round document failed.
    #[error("failed to load round `{id}`")]
    LoadRound {
        /// Round id.
        id: Uuid,
        /// Driver-level cause.
        #[source]
        source: mongodb::error::Error,
    },
    /// Listing rounds failed.
    #[error("failed to list rounds")]
    ListRounds {
        /// Driver-level cause.
        #[source]
        source: mongodb::error::Error,
    },
}
