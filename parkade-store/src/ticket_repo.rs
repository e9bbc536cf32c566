use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use parkade_core::{SlotId, StoreError, StoreResult, Ticket, TicketId, TicketRepository};
use crate::database::map_sqlx_error;

pub struct PgTicketRepository {
    pool: PgPool,
}

impl PgTicketRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct TicketRow {
    id: i64,
    vehicle_id: String,
    slot_id: i64,
    entry_time: DateTime<Utc>,
}

impl From<TicketRow> for Ticket {
    fn from(row: TicketRow) -> Self {
        Ticket {
            id: row.id,
            vehicle_id: row.vehicle_id,
            slot_id: row.slot_id,
            entry_time: row.entry_time,
        }
    }
}

#[async_trait]
impl TicketRepository for PgTicketRepository {
    async fn save_ticket(&self, ticket: &Ticket) -> StoreResult<()> {
        sqlx::query("INSERT INTO tickets (id, vehicle_id, slot_id, entry_time) VALUES ($1, $2, $3, $4)")
            .bind(ticket.id)
            .bind(&ticket.vehicle_id)
            .bind(ticket.slot_id)
            .bind(ticket.entry_time)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, format!("ticket for vehicle {}", ticket.vehicle_id)))?;

        Ok(())
    }

    async fn find_open_by_vehicle(&self, vehicle_id: &str) -> StoreResult<Option<Ticket>> {
        let row = sqlx::query_as::<_, TicketRow>(
            "SELECT id, vehicle_id, slot_id, entry_time FROM tickets WHERE vehicle_id = $1",
        )
        .bind(vehicle_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::backend)?;

        Ok(row.map(Ticket::from))
    }

    async fn find_open_by_slot(&self, slot_id: SlotId) -> StoreResult<Option<Ticket>> {
        let row = sqlx::query_as::<_, TicketRow>(
            "SELECT id, vehicle_id, slot_id, entry_time FROM tickets WHERE slot_id = $1",
        )
        .bind(slot_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::backend)?;

        Ok(row.map(Ticket::from))
    }

    async fn delete_ticket(&self, ticket_id: TicketId) -> StoreResult<()> {
        sqlx::query("DELETE FROM tickets WHERE id = $1")
            .bind(ticket_id)
            .execute(&self.pool)
            .await
            .map_err(StoreError::backend)?;

        Ok(())
    }
}
