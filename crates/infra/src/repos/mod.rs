mod access_grant;
mod delivery_ledger;
mod session;
mod shared;

pub use access_grant::IAccessGrantRepo;
use access_grant::{InMemoryAccessGrantRepo, PostgresAccessGrantRepo};
pub use delivery_ledger::IDeliveryLedgerRepo;
use delivery_ledger::{InMemoryDeliveryLedgerRepo, PostgresDeliveryLedgerRepo};
pub use session::ISessionRepo;
use session::{InMemorySessionRepo, PostgresSessionRepo};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct Repos {
    pub sessions: Arc<dyn ISessionRepo>,
    pub access_grants: Arc<dyn IAccessGrantRepo>,
    pub delivery_ledger: Arc<dyn IDeliveryLedgerRepo>,
}

impl Repos {
    pub async fn create_postgres(connection_string: &str) -> anyhow::Result<Self> {
        info!("DB CHECKING CONNECTION ...");
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(connection_string)
            .await?;
        info!("DB CHECKING CONNECTION ... [done]");
        Ok(Self {
            sessions: Arc::new(PostgresSessionRepo::new(pool.clone())),
            access_grants: Arc::new(PostgresAccessGrantRepo::new(pool.clone())),
            delivery_ledger: Arc::new(PostgresDeliveryLedgerRepo::new(pool)),
        })
    }

    pub fn create_inmemory() -> Self {
        Self {
            sessions: Arc::new(InMemorySessionRepo::new()),
            access_grants: Arc::new(InMemoryAccessGrantRepo::new()),
            delivery_ledger: Arc::new(InMemoryDeliveryLedgerRepo::new()),
        }
    }
}
