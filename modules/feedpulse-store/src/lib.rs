pub mod error;
mod store;

pub use error::{Result, StoreError};
pub use store::PgStore;

use sqlx::postgres::PgPoolOptions;

/// Connect to Postgres with the pool settings the workers use.
pub async fn connect(database_url: &str) -> Result<PgStore> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;
    Ok(PgStore::new(pool))
}
