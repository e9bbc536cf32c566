use async_trait::async_trait;
use crate::models::{Admin, ResourceType, Slot, SlotId, Ticket, TicketId};

pub type BackendError = Box<dyn std::error::Error + Send + Sync>;

/// Failure reported by a store implementation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Record already exists: {0}")]
    Duplicate(String),
    #[error("Record not found: {0}")]
    NotFound(String),
    #[error("Storage backend error: {0}")]
    Backend(#[source] BackendError),
}

impl StoreError {
    pub fn backend<E>(err: E) -> Self
    where
        E: Into<BackendError>,
    {
        StoreError::Backend(err.into())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Repository trait for slot occupancy
#[async_trait]
pub trait SlotRepository: Send + Sync {
    /// Insert a new slot. An existing id yields `StoreError::Duplicate` and is left untouched.
    async fn save_slot(&self, slot: &Slot) -> StoreResult<()>;

    /// Compare-and-set free → occupied. `Ok(false)` means the slot was not free
    /// (or does not exist) at the moment of the update.
    async fn try_claim(&self, slot_id: SlotId) -> StoreResult<bool>;

    /// Unconditionally mark the slot free.
    async fn release(&self, slot_id: SlotId) -> StoreResult<()>;

    /// Free slots of the given type, ascending by id.
    async fn find_free_by_type(&self, resource_type: ResourceType) -> StoreResult<Vec<Slot>>;

    async fn find_by_id(&self, slot_id: SlotId) -> StoreResult<Option<Slot>>;

    /// All free slots, ascending by id.
    async fn list_free(&self) -> StoreResult<Vec<Slot>>;
}

/// Repository trait for open tickets
#[async_trait]
pub trait TicketRepository: Send + Sync {
    /// Persist a ticket. A second open ticket for the same vehicle (or the same slot)
    /// yields `StoreError::Duplicate`.
    async fn save_ticket(&self, ticket: &Ticket) -> StoreResult<()>;

    async fn find_open_by_vehicle(&self, vehicle_id: &str) -> StoreResult<Option<Ticket>>;

    /// The open ticket currently referencing `slot_id`, if any.
    async fn find_open_by_slot(&self, slot_id: SlotId) -> StoreResult<Option<Ticket>>;

    /// Deleting an id that does not exist is not an error.
    async fn delete_ticket(&self, ticket_id: TicketId) -> StoreResult<()>;
}

/// Repository trait for administrator credentials
#[async_trait]
pub trait AdminRepository: Send + Sync {
    async fn find_by_username(&self, username: &str) -> StoreResult<Option<Admin>>;

    /// Insert an admin; an existing username yields `StoreError::Duplicate`.
    async fn save_admin(&self, admin: &Admin) -> StoreResult<()>;
}
