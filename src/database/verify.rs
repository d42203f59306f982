use tracing::{debug, warn};

use super::driver::Connector;
use super::DatabaseError;

/// Check that `name` is among the databases visible at `uri`.
///
/// Uses its own short-lived connection, closed whether or not listing succeeds.
pub async fn database_exists(connector: &dyn Connector, uri: &str, name: &str) -> Result<bool, DatabaseError> {
    let driver = connector
        .connect(uri)
        .await
        .map_err(|e| DatabaseError::Connection(format!("Database verification error. {}", e)))?;

    let listed = driver.list_databases().await;
    if let Err(e) = driver.close().await {
        warn!("Failed to close verification connection to {}: {}", uri, e);
    }

    let databases = listed.map_err(|e| DatabaseError::Connection(format!("Database verification error. {}", e)))?;
    let exists = databases.iter().any(|db| db == name);
    debug!("Verified database {} on {}: exists={}", name, uri, exists);
    Ok(exists)
}
