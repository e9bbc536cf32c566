use async_trait::async_trait;
use sqlx::PgPool;
use parkade_core::{ResourceType, Slot, SlotId, SlotRepository, StoreError, StoreResult};
use crate::database::map_sqlx_error;

pub struct PgSlotRepository {
    pool: PgPool,
}

impl PgSlotRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct SlotRow {
    id: i64,
    resource_type: String,
    occupied: bool,
}

impl TryFrom<SlotRow> for Slot {
    type Error = StoreError;

    fn try_from(row: SlotRow) -> Result<Self, Self::Error> {
        Ok(Slot {
            id: row.id,
            resource_type: row.resource_type.parse().map_err(StoreError::backend)?,
            occupied: row.occupied,
        })
    }
}

fn into_slots(rows: Vec<SlotRow>) -> StoreResult<Vec<Slot>> {
    rows.into_iter().map(Slot::try_from).collect()
}

#[async_trait]
impl SlotRepository for PgSlotRepository {
    async fn save_slot(&self, slot: &Slot) -> StoreResult<()> {
        sqlx::query("INSERT INTO slots (id, resource_type, occupied) VALUES ($1, $2, $3)")
            .bind(slot.id)
            .bind(slot.resource_type.as_str())
            .bind(slot.occupied)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, format!("slot {}", slot.id)))?;

        Ok(())
    }

    async fn try_claim(&self, slot_id: SlotId) -> StoreResult<bool> {
        // The WHERE clause is the compare half of the compare-and-set; the row lock
        // taken by UPDATE serialises it against concurrent claims and releases.
        let result = sqlx::query("UPDATE slots SET occupied = TRUE WHERE id = $1 AND occupied = FALSE")
            .bind(slot_id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, format!("slot {}", slot_id)))?;

        Ok(result.rows_affected() == 1)
    }

    async fn release(&self, slot_id: SlotId) -> StoreResult<()> {
        let result = sqlx::query("UPDATE slots SET occupied = FALSE WHERE id = $1")
            .bind(slot_id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(e, format!("slot {}", slot_id)))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("slot {}", slot_id)));
        }
        Ok(())
    }

    async fn find_free_by_type(&self, resource_type: ResourceType) -> StoreResult<Vec<Slot>> {
        let rows = sqlx::query_as::<_, SlotRow>(
            "SELECT id, resource_type, occupied FROM slots WHERE resource_type = $1 AND occupied = FALSE ORDER BY id",
        )
        .bind(resource_type.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::backend)?;

        into_slots(rows)
    }

    async fn find_by_id(&self, slot_id: SlotId) -> StoreResult<Option<Slot>> {
        let row = sqlx::query_as::<_, SlotRow>("SELECT id, resource_type, occupied FROM slots WHERE id = $1")
            .bind(slot_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(StoreError::backend)?;

        row.map(Slot::try_from).transpose()
    }

    async fn list_free(&self) -> StoreResult<Vec<Slot>> {
        let rows = sqlx::query_as::<_, SlotRow>(
            "SELECT id, resource_type, occupied FROM slots WHERE occupied = FALSE ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::backend)?;

        into_slots(rows)
    }
}
