use std::sync::Arc;
use parkade_core::clock::{Clock, SystemClock};
use parkade_core::identity::TicketIdGenerator;
use parkade_core::{
    EngineSettings, FeePolicy, ParkingError, ParkingResult, ResourceType, Slot, SlotId,
    SlotRepository, StoreError, Ticket, TicketRepository, Vehicle,
};
use tracing::{debug, error, info, instrument, warn};

/// Slot allocation and release engine.
///
/// Owns the occupancy transitions of slots and the existence of tickets; durable
/// state lives behind the two repositories. Cloning is cheap and every clone drives
/// the same stores.
#[derive(Clone)]
pub struct AllocationEngine {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    slots: Arc<dyn SlotRepository>,
    tickets: Arc<dyn TicketRepository>,
    fees: FeePolicy,
    clock: Arc<dyn Clock>,
    ids: TicketIdGenerator,
    settings: EngineSettings,
}

impl AllocationEngine {
    pub fn new(
        slots: Arc<dyn SlotRepository>,
        tickets: Arc<dyn TicketRepository>,
        fees: FeePolicy,
        settings: EngineSettings,
    ) -> Self {
        Self::with_clock(slots, tickets, fees, settings, Arc::new(SystemClock))
    }

    pub fn with_clock(
        slots: Arc<dyn SlotRepository>,
        tickets: Arc<dyn TicketRepository>,
        fees: FeePolicy,
        settings: EngineSettings,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                slots,
                tickets,
                fees,
                clock,
                ids: TicketIdGenerator::new(settings.node_id),
                settings,
            }),
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.inner.settings
    }

    /// Allocate the lowest-numbered free slot of the vehicle's type and open a ticket.
    ///
    /// The transition runs on its own task: dropping the returned future does not
    /// abort a claim half-way, it only discards the result.
    pub async fn park_vehicle(&self, vehicle: Vehicle) -> ParkingResult<Ticket> {
        let vehicle_id = normalize_vehicle_id(&vehicle.vehicle_id)?;
        let engine = self.clone();
        let resource_type = vehicle.resource_type;

        match tokio::spawn(async move { engine.claim(vehicle_id, resource_type).await }).await {
            Ok(result) => result,
            Err(e) => Err(ParkingError::Interrupted(e.to_string())),
        }
    }

    /// Close the vehicle's ticket, free its slot and return the fee owed.
    pub async fn unpark_vehicle(&self, vehicle_id: &str) -> ParkingResult<f64> {
        let vehicle_id = normalize_vehicle_id(vehicle_id)?;
        let engine = self.clone();

        match tokio::spawn(async move { engine.release(vehicle_id).await }).await {
            Ok(result) => result,
            Err(e) => Err(ParkingError::Interrupted(e.to_string())),
        }
    }

    /// Register a new slot. It always starts free, whatever `occupied` says.
    pub async fn add_slot(&self, slot: Slot) -> ParkingResult<Slot> {
        let slot = Slot::new(slot.id, slot.resource_type);

        match self.inner.slots.save_slot(&slot).await {
            Ok(()) => {
                info!("Slot {} ({}) added", slot.id, slot.resource_type);
                Ok(slot)
            }
            Err(StoreError::Duplicate(_)) => {
                warn!("Rejected duplicate slot {}", slot.id);
                Err(ParkingError::SlotAlreadyExists(slot.id))
            }
            Err(source) => {
                error!("Failed to save slot {}: {}", slot.id, source);
                Err(ParkingError::SlotSaveFailed { slot_id: slot.id, source })
            }
        }
    }

    pub async fn list_available_slots(&self) -> ParkingResult<Vec<Slot>> {
        self.inner.slots.list_free().await.map_err(|source| {
            error!("Failed to list free slots: {}", source);
            ParkingError::SlotListFailed(source)
        })
    }

    #[instrument(skip(self))]
    async fn claim(&self, vehicle_id: String, resource_type: ResourceType) -> ParkingResult<Ticket> {
        // 1. One open ticket per vehicle
        match self.inner.tickets.find_open_by_vehicle(&vehicle_id).await {
            Ok(Some(existing)) => {
                warn!("Vehicle {} already holds ticket {} on slot {}", vehicle_id, existing.id, existing.slot_id);
                return Err(ParkingError::AlreadyAllocated { vehicle_id });
            }
            Ok(None) | Err(StoreError::NotFound(_)) => {}
            Err(source) => {
                error!("Ticket lookup for {} failed: {}", vehicle_id, source);
                return Err(ParkingError::LookupFailed { vehicle_id, source });
            }
        }

        // 2. Compare-and-set on the first free candidate, then record the ticket
        let candidates = self
            .inner
            .slots
            .find_free_by_type(resource_type)
            .await
            .map_err(|source| ParkingError::ClaimFailed { resource_type, slot_id: None, source })?;

        self.claim_first_free(vehicle_id, resource_type, candidates).await
    }

    async fn claim_first_free(
        &self,
        vehicle_id: String,
        resource_type: ResourceType,
        mut candidates: Vec<Slot>,
    ) -> ParkingResult<Ticket> {
        candidates.retain(|slot| !slot.occupied && slot.resource_type == resource_type);
        candidates.sort_by_key(|slot| slot.id);

        let max_attempts = self.inner.settings.max_claim_attempts.max(1);
        let mut attempts = 0;

        for slot in candidates {
            if attempts == max_attempts {
                warn!("Giving up after {} contended claim attempts", attempts);
                break;
            }
            attempts += 1;

            match self.inner.slots.try_claim(slot.id).await {
                Ok(true) => {}
                Ok(false) => {
                    debug!("Slot {} was taken concurrently, trying next candidate", slot.id);
                    continue;
                }
                Err(source) => {
                    error!("Claim of slot {} failed: {}", slot.id, source);
                    return Err(ParkingError::ClaimFailed { resource_type, slot_id: Some(slot.id), source });
                }
            }

            // 3. Ticket, compensating the claim if it cannot be written
            let ticket = Ticket {
                id: self.inner.ids.next_id(),
                vehicle_id: vehicle_id.clone(),
                slot_id: slot.id,
                entry_time: self.inner.clock.now(),
            };

            let source = match self.inner.tickets.save_ticket(&ticket).await {
                Ok(()) => {
                    info!("Vehicle {} parked in slot {} with ticket {}", ticket.vehicle_id, slot.id, ticket.id);
                    return Ok(ticket);
                }
                Err(source) => source,
            };

            if matches!(source, StoreError::Duplicate(_)) {
                match self.duplicate_cause(&vehicle_id, slot.id).await {
                    DuplicateCause::Vehicle => {
                        self.compensate_claim(slot.id).await;
                        warn!("Concurrent park of {} detected, claim rolled back", vehicle_id);
                        return Err(ParkingError::AlreadyAllocated { vehicle_id });
                    }
                    DuplicateCause::Slot(holder) => {
                        // The slot stays occupied: it belongs to the holder until that ticket is closed.
                        warn!(
                            slot_id = slot.id,
                            ticket_id = holder.id,
                            "Slot {} was free but is still held by {}'s ticket, trying next candidate",
                            slot.id,
                            holder.vehicle_id
                        );
                        continue;
                    }
                    DuplicateCause::Unknown => {}
                }
            }

            self.compensate_claim(slot.id).await;
            error!("Failed to save ticket for {}: {}", vehicle_id, source);
            return Err(ParkingError::TicketPersistFailed { vehicle_id, source });
        }

        Err(ParkingError::NoCapacity(resource_type))
    }

    async fn compensate_claim(&self, slot_id: SlotId) {
        if let Err(e) = self.inner.slots.release(slot_id).await {
            error!(slot_id, "Slot left occupied without a ticket, compensation failed: {}", e);
        }
    }

    /// A duplicate on save means the vehicle already holds a ticket (a concurrent
    /// park), or the claimed slot is still referenced by a ticket whose close was
    /// interrupted after the slot was freed.
    async fn duplicate_cause(&self, vehicle_id: &str, slot_id: SlotId) -> DuplicateCause {
        if let Ok(Some(_)) = self.inner.tickets.find_open_by_vehicle(vehicle_id).await {
            return DuplicateCause::Vehicle;
        }
        match self.inner.tickets.find_open_by_slot(slot_id).await {
            Ok(Some(holder)) if holder.vehicle_id != vehicle_id => DuplicateCause::Slot(holder),
            _ => DuplicateCause::Unknown,
        }
    }

    #[instrument(skip(self))]
    async fn release(&self, vehicle_id: String) -> ParkingResult<f64> {
        let exit_time = self.inner.clock.now();

        let ticket = match self.inner.tickets.find_open_by_vehicle(&vehicle_id).await {
            Ok(Some(ticket)) => ticket,
            Ok(None) | Err(StoreError::NotFound(_)) => return Err(ParkingError::TicketNotFound(vehicle_id)),
            Err(source) => {
                error!("Ticket lookup for {} failed: {}", vehicle_id, source);
                return Err(ParkingError::LookupFailed { vehicle_id, source });
            }
        };

        let slot = match self.inner.slots.find_by_id(ticket.slot_id).await {
            Ok(Some(slot)) => slot,
            Ok(None) | Err(StoreError::NotFound(_)) => {
                error!(
                    integrity = true,
                    ticket_id = ticket.id,
                    slot_id = ticket.slot_id,
                    "Ticket references a slot that does not exist"
                );
                return Err(ParkingError::SlotNotFound { slot_id: ticket.slot_id, ticket_id: ticket.id });
            }
            Err(source) => {
                error!("Slot lookup for {} failed: {}", ticket.slot_id, source);
                return Err(ParkingError::LookupFailed { vehicle_id, source });
            }
        };

        // Priced before any write: an unpriceable release keeps its ticket.
        let fee = self
            .inner
            .fees
            .fee(slot.resource_type, exit_time - ticket.entry_time)
            .map_err(|e| {
                warn!("Cannot price ticket {}: {}", ticket.id, e);
                ParkingError::from(e)
            })?;

        if let Err(source) = self.inner.slots.release(slot.id).await {
            error!("Failed to release slot {}: {}", slot.id, source);
            return Err(ParkingError::SlotReleaseFailed { slot_id: slot.id, source });
        }

        if let Err(source) = self.inner.tickets.delete_ticket(ticket.id).await {
            error!("Slot {} freed but ticket {} could not be deleted: {}", slot.id, ticket.id, source);
            return Err(ParkingError::TicketDeleteFailed { ticket_id: ticket.id, source });
        }

        info!("Vehicle {} left slot {}, fee {:.2}", vehicle_id, slot.id, fee);
        Ok(fee)
    }
}

enum DuplicateCause {
    Vehicle,
    Slot(Ticket),
    Unknown,
}

fn normalize_vehicle_id(raw: &str) -> ParkingResult<String> {
    let vehicle_id = raw.trim();
    if vehicle_id.is_empty() {
        return Err(ParkingError::InvalidVehicle("vehicle id must not be empty".to_string()));
    }
    Ok(vehicle_id.to_string())
}
