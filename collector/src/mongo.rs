//! MongoDB-backed stats source.

use std::time::Duration;

use async_trait::async_trait;
use mongodb::bson::{doc, Document};
use mongodb::error::{Error as MongoError, ErrorKind};
use mongodb::options::{
    ClientOptions, Credential, ReadPreference, SelectionCriteria, ServerAddress,
};
use mongodb::Client;

use common::config::ConnectionSettings;
use common::errors::{AppError, AppResult};

use crate::source::StatsSource;

const APP_NAME: &str = "mongodu";
const SERVER_SELECTION_TIMEOUT: Duration = Duration::from_secs(10);

/// Server error code for a failed authentication handshake.
const AUTHENTICATION_FAILED: i32 = 18;

/// Stats source talking to a MongoDB deployment.
pub struct MongoStatsSource {
    client: Client,
    auth_database: String,
}

impl MongoStatsSource {
    /// Builds a client for the given settings.
    ///
    /// No network traffic happens here; the first command opens the
    /// connection and performs the handshake.
    pub fn connect(settings: &ConnectionSettings) -> AppResult<Self> {
        let mut options = ClientOptions::builder()
            .hosts(vec![ServerAddress::Tcp {
                host: settings.host.clone(),
                port: Some(settings.port),
            }])
            .build();
        options.app_name = Some(APP_NAME.to_string());
        options.server_selection_timeout = Some(SERVER_SELECTION_TIMEOUT);

        if let Some(creds) = &settings.credentials {
            let mut credential = Credential::default();
            credential.username = Some(creds.username.clone());
            credential.password = Some(creds.password.clone());
            credential.source = Some(settings.auth_database.clone());
            options.credential = Some(credential);
        }

        let client = Client::with_options(options)
            .map_err(|e| AppError::Connectivity(e.to_string()))?;

        tracing::debug!(host = %settings.host, port = settings.port, "MongoDB client created");

        Ok(Self {
            client,
            auth_database: settings.auth_database.clone(),
        })
    }

    /// Collection stats are read from a secondary when one is available.
    fn secondary_preferred() -> SelectionCriteria {
        SelectionCriteria::ReadPreference(ReadPreference::SecondaryPreferred {
            options: Default::default(),
        })
    }
}

/// Maps a driver error onto the shared error taxonomy.
fn classify(err: MongoError, target: &str) -> AppError {
    match err.kind.as_ref() {
        ErrorKind::Authentication { .. } => AppError::Authentication(err.to_string()),
        ErrorKind::Command(cmd) if cmd.code == AUTHENTICATION_FAILED => {
            AppError::Authentication(err.to_string())
        }
        ErrorKind::ServerSelection { .. }
        | ErrorKind::Io(_)
        | ErrorKind::DnsResolve { .. }
        | ErrorKind::ConnectionPoolCleared { .. } => AppError::Connectivity(err.to_string()),
        _ => AppError::stats_unavailable(target, err),
    }
}

#[async_trait]
impl StatsSource for MongoStatsSource {
    async fn authenticate(&self) -> AppResult<()> {
        self.client
            .database(&self.auth_database)
            .run_command(doc! { "ping": 1 })
            .await
            .map(|_| ())
            .map_err(|e| match classify(e, &self.auth_database) {
                AppError::StatsUnavailable { reason, .. } => AppError::Connectivity(reason),
                other => other,
            })
    }

    async fn database_names(&self) -> AppResult<Vec<String>> {
        self.client
            .list_database_names()
            .await
            .map_err(|e| classify(e, "listDatabases"))
    }

    async fn database_stats(&self, database: &str) -> AppResult<Document> {
        self.client
            .database(database)
            .run_command(doc! { "dbStats": 1 })
            .await
            .map_err(|e| classify(e, database))
    }

    async fn collection_names(&self, database: &str) -> AppResult<Vec<String>> {
        // Views have no storage of their own and reject collStats.
        self.client
            .database(database)
            .list_collection_names()
            .filter(doc! { "type": "collection" })
            .await
            .map_err(|e| classify(e, database))
    }

    async fn collection_stats(&self, database: &str, collection: &str) -> AppResult<Document> {
        self.client
            .database(database)
            .run_command(doc! { "collStats": collection })
            .selection_criteria(Self::secondary_preferred())
            .await
            .map_err(|e| classify(e, &format!("{}.{}", database, collection)))
    }

    async fn close(&self) {
        self.client.clone().shutdown().await;
        tracing::debug!("MongoDB client shut down");
    }
}
