use business::domain::settings::DatabaseSettings;
use persistence::db::{Database, DatabaseConfig, DatabaseError, create_mysql_pool};

/// Initialize the MySQL connection pool from the `db` settings section.
///
/// # Errors
/// Returns error if the database name is empty or the server cannot be reached
pub async fn init_database(settings: &DatabaseSettings) -> Result<Database, DatabaseError> {
    let config = DatabaseConfig::from_settings(settings)?;
    create_mysql_pool(&config).await
}
