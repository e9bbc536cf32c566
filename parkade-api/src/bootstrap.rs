use std::sync::Arc;
use anyhow::Context;
use parkade_allocation::AllocationEngine;
use parkade_core::{AdminRepository, FeePolicy, SlotRepository, TicketRepository};
use parkade_store::app_config::{Config, StorageBackend};
use parkade_store::{
    DbClient, InMemoryAdminRepository, InMemorySlotRepository, InMemoryTicketRepository,
    PgAdminRepository, PgSlotRepository, PgTicketRepository,
};

pub type Repositories = (Arc<dyn SlotRepository>, Arc<dyn TicketRepository>, Arc<dyn AdminRepository>);

/// Opens the stores selected by `storage.backend`, running migrations for Postgres.
pub async fn repositories(config: &Config) -> anyhow::Result<Repositories> {
    match config.storage.backend {
        StorageBackend::Postgres => {
            let db = DbClient::new(&config.database.url, config.database.max_connections)
                .await
                .context("Failed to connect to Postgres")?;
            db.migrate().await.context("Failed to run migrations")?;

            let slots: Arc<dyn SlotRepository> = Arc::new(PgSlotRepository::new(db.pool.clone()));
            let tickets: Arc<dyn TicketRepository> = Arc::new(PgTicketRepository::new(db.pool.clone()));
            let admins: Arc<dyn AdminRepository> = Arc::new(PgAdminRepository::new(db.pool));
            Ok((slots, tickets, admins))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; all state is lost on restart");
            let slots: Arc<dyn SlotRepository> = Arc::new(InMemorySlotRepository::new());
            let tickets: Arc<dyn TicketRepository> = Arc::new(InMemoryTicketRepository::new());
            let admins: Arc<dyn AdminRepository> = Arc::new(InMemoryAdminRepository::new());
            Ok((slots, tickets, admins))
        }
    }
}

pub fn engine(
    config: &Config,
    slots: Arc<dyn SlotRepository>,
    tickets: Arc<dyn TicketRepository>,
) -> AllocationEngine {
    AllocationEngine::new(
        slots,
        tickets,
        FeePolicy::new(config.fees.clone()),
        config.engine.clone(),
    )
}
