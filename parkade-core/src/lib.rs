pub mod models;
pub mod repository;
pub mod identity;
pub mod clock;
pub mod pricing;
pub mod settings;

pub use models::{Admin, ResourceType, Slot, SlotId, Ticket, TicketId, Vehicle};
pub use repository::{AdminRepository, SlotRepository, StoreError, StoreResult, TicketRepository};
pub use pricing::{FeeError, FeePolicy, FeeSchedule};
pub use settings::EngineSettings;

#[derive(Debug, thiserror::Error)]
pub enum ParkingError {
    #[error("Invalid vehicle: {0}")]
    InvalidVehicle(String),

    #[error("Vehicle {vehicle_id} has already been parked")]
    AlreadyAllocated { vehicle_id: String },

    #[error("Failed to look up ticket for vehicle {vehicle_id}")]
    LookupFailed {
        vehicle_id: String,
        #[source]
        source: StoreError,
    },

    #[error("No free {0} slot available")]
    NoCapacity(ResourceType),

    /// `slot_id` is `None` when the candidate lookup itself failed.
    #[error("Failed to claim a {resource_type} slot")]
    ClaimFailed {
        resource_type: ResourceType,
        slot_id: Option<SlotId>,
        #[source]
        source: StoreError,
    },

    #[error("Failed to save ticket for vehicle {vehicle_id}")]
    TicketPersistFailed {
        vehicle_id: String,
        #[source]
        source: StoreError,
    },

    #[error("No ticket found for vehicle {0}")]
    TicketNotFound(String),

    #[error("Slot {slot_id} referenced by ticket {ticket_id} not found")]
    SlotNotFound { slot_id: SlotId, ticket_id: TicketId },

    #[error("Invalid resource type: {0}")]
    InvalidResourceType(#[from] FeeError),

    #[error("Failed to release slot {slot_id}")]
    SlotReleaseFailed {
        slot_id: SlotId,
        #[source]
        source: StoreError,
    },

    #[error("Failed to delete ticket {ticket_id}")]
    TicketDeleteFailed {
        ticket_id: TicketId,
        #[source]
        source: StoreError,
    },

    #[error("Slot {0} already exists")]
    SlotAlreadyExists(SlotId),

    #[error("Failed to save slot {slot_id}")]
    SlotSaveFailed {
        slot_id: SlotId,
        #[source]
        source: StoreError,
    },

    #[error("Failed to list available slots")]
    SlotListFailed(#[source] StoreError),

    #[error("Operation interrupted: {0}")]
    Interrupted(String),
}

impl ParkingError {
    /// The stores disagree with each other: a ticket points at a slot that is gone.
    pub fn is_integrity_fault(&self) -> bool {
        matches!(self, ParkingError::SlotNotFound { .. })
    }
}

pub type ParkingResult<T> = Result<T, ParkingError>;
