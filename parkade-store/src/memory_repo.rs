use std::collections::{BTreeMap, HashMap};
use async_trait::async_trait;
use parkade_core::{
    Admin, AdminRepository, ResourceType, Slot, SlotId, SlotRepository, StoreError, StoreResult,
    Ticket, TicketId, TicketRepository,
};
use tokio::sync::Mutex;

/// In-process slot store. One lock guards the whole map, so every
/// read-modify-write of an `occupied` flag is serialised.
#[derive(Default)]
pub struct InMemorySlotRepository {
    slots: Mutex<BTreeMap<SlotId, Slot>>,
}

impl InMemorySlotRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SlotRepository for InMemorySlotRepository {
    async fn save_slot(&self, slot: &Slot) -> StoreResult<()> {
        let mut slots = self.slots.lock().await;
        if slots.contains_key(&slot.id) {
            return Err(StoreError::Duplicate(format!("slot {}", slot.id)));
        }
        slots.insert(slot.id, slot.clone());
        Ok(())
    }

    async fn try_claim(&self, slot_id: SlotId) -> StoreResult<bool> {
        let mut slots = self.slots.lock().await;
        match slots.get_mut(&slot_id) {
            Some(slot) if !slot.occupied => {
                slot.occupied = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn release(&self, slot_id: SlotId) -> StoreResult<()> {
        let mut slots = self.slots.lock().await;
        let slot = slots
            .get_mut(&slot_id)
            .ok_or_else(|| StoreError::NotFound(format!("slot {}", slot_id)))?;
        slot.occupied = false;
        Ok(())
    }

    async fn find_free_by_type(&self, resource_type: ResourceType) -> StoreResult<Vec<Slot>> {
        let slots = self.slots.lock().await;
        Ok(slots
            .values()
            .filter(|slot| slot.resource_type == resource_type && !slot.occupied)
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, slot_id: SlotId) -> StoreResult<Option<Slot>> {
        Ok(self.slots.lock().await.get(&slot_id).cloned())
    }

    async fn list_free(&self) -> StoreResult<Vec<Slot>> {
        let slots = self.slots.lock().await;
        Ok(slots.values().filter(|slot| !slot.occupied).cloned().collect())
    }
}

#[derive(Default)]
struct TicketTable {
    by_id: HashMap<TicketId, Ticket>,
    by_vehicle: HashMap<String, TicketId>,
    by_slot: HashMap<SlotId, TicketId>,
}

/// In-process ticket store with the same uniqueness rules as the `tickets` table:
/// one ticket per id, per vehicle and per slot.
#[derive(Default)]
pub struct InMemoryTicketRepository {
    table: Mutex<TicketTable>,
}

impl InMemoryTicketRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every open ticket, ordered by id.
    pub async fn open_tickets(&self) -> Vec<Ticket> {
        let table = self.table.lock().await;
        let mut tickets: Vec<Ticket> = table.by_id.values().cloned().collect();
        tickets.sort_by_key(|t| t.id);
        tickets
    }
}

#[async_trait]
impl TicketRepository for InMemoryTicketRepository {
    async fn save_ticket(&self, ticket: &Ticket) -> StoreResult<()> {
        let mut table = self.table.lock().await;
        if table.by_id.contains_key(&ticket.id) {
            return Err(StoreError::Duplicate(format!("ticket {}", ticket.id)));
        }
        if table.by_vehicle.contains_key(&ticket.vehicle_id) {
            return Err(StoreError::Duplicate(format!("open ticket for vehicle {}", ticket.vehicle_id)));
        }
        if table.by_slot.contains_key(&ticket.slot_id) {
            return Err(StoreError::Duplicate(format!("open ticket for slot {}", ticket.slot_id)));
        }

        table.by_vehicle.insert(ticket.vehicle_id.clone(), ticket.id);
        table.by_slot.insert(ticket.slot_id, ticket.id);
        table.by_id.insert(ticket.id, ticket.clone());
        Ok(())
    }

    async fn find_open_by_vehicle(&self, vehicle_id: &str) -> StoreResult<Option<Ticket>> {
        let table = self.table.lock().await;
        Ok(table
            .by_vehicle
            .get(vehicle_id)
            .and_then(|id| table.by_id.get(id))
            .cloned())
    }

    async fn find_open_by_slot(&self, slot_id: SlotId) -> StoreResult<Option<Ticket>> {
        let table = self.table.lock().await;
        Ok(table
            .by_slot
            .get(&slot_id)
            .and_then(|id| table.by_id.get(id))
            .cloned())
    }

    async fn delete_ticket(&self, ticket_id: TicketId) -> StoreResult<()> {
        let mut table = self.table.lock().await;
        if let Some(ticket) = table.by_id.remove(&ticket_id) {
            table.by_vehicle.remove(&ticket.vehicle_id);
            table.by_slot.remove(&ticket.slot_id);
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryAdminRepository {
    admins: Mutex<HashMap<String, Admin>>,
}

impl InMemoryAdminRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AdminRepository for InMemoryAdminRepository {
    async fn find_by_username(&self, username: &str) -> StoreResult<Option<Admin>> {
        Ok(self.admins.lock().await.get(username).cloned())
    }

    async fn save_admin(&self, admin: &Admin) -> StoreResult<()> {
        let mut admins = self.admins.lock().await;
        if admins.contains_key(&admin.username) {
            return Err(StoreError::Duplicate(format!("admin {}", admin.username)));
        }
        admins.insert(admin.username.clone(), admin.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::Arc;

    fn ticket(id: TicketId, vehicle_id: &str, slot_id: SlotId) -> Ticket {
        Ticket {
            id,
            vehicle_id: vehicle_id.to_string(),
            slot_id,
            entry_time: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_duplicate_slot_does_not_overwrite() {
        let repo = InMemorySlotRepository::new();
        repo.save_slot(&Slot::new(1, ResourceType::Car)).await.unwrap();
        assert!(repo.try_claim(1).await.unwrap());

        let result = repo.save_slot(&Slot::new(1, ResourceType::Bike)).await;

        assert!(matches!(result, Err(StoreError::Duplicate(_))));
        let slot = repo.find_by_id(1).await.unwrap().unwrap();
        assert_eq!(slot.resource_type, ResourceType::Car);
        assert!(slot.occupied);
    }

    #[tokio::test]
    async fn test_claim_is_compare_and_set() {
        let repo = InMemorySlotRepository::new();
        repo.save_slot(&Slot::new(1, ResourceType::Car)).await.unwrap();

        assert!(repo.try_claim(1).await.unwrap());
        assert!(!repo.try_claim(1).await.unwrap());
        assert!(!repo.try_claim(99).await.unwrap());

        repo.release(1).await.unwrap();
        assert!(repo.try_claim(1).await.unwrap());
        assert!(matches!(repo.release(99).await, Err(StoreError::NotFound(_))));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_claims_single_winner() {
        let repo = Arc::new(InMemorySlotRepository::new());
        repo.save_slot(&Slot::new(1, ResourceType::Car)).await.unwrap();

        let handles: Vec<_> = (0..32)
            .map(|_| {
                let repo = repo.clone();
                tokio::spawn(async move { repo.try_claim(1).await.unwrap() })
            })
            .collect();

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }

    #[tokio::test]
    async fn test_free_listings_are_ordered() {
        let repo = InMemorySlotRepository::new();
        for (id, kind) in [(5, ResourceType::Car), (2, ResourceType::Bike), (3, ResourceType::Car), (1, ResourceType::Car)] {
            repo.save_slot(&Slot::new(id, kind)).await.unwrap();
        }
        repo.try_claim(1).await.unwrap();

        let cars: Vec<SlotId> = repo.find_free_by_type(ResourceType::Car).await.unwrap().iter().map(|s| s.id).collect();
        assert_eq!(cars, vec![3, 5]);

        let free: Vec<SlotId> = repo.list_free().await.unwrap().iter().map(|s| s.id).collect();
        assert_eq!(free, vec![2, 3, 5]);
    }

    #[tokio::test]
    async fn test_ticket_uniqueness_rules() {
        let repo = InMemoryTicketRepository::new();
        repo.save_ticket(&ticket(1, "KA01AB1234", 1)).await.unwrap();

        assert!(matches!(repo.save_ticket(&ticket(2, "KA01AB1234", 2)).await, Err(StoreError::Duplicate(_))));
        assert!(matches!(repo.save_ticket(&ticket(3, "MH12XY0001", 1)).await, Err(StoreError::Duplicate(_))));
        assert!(matches!(repo.save_ticket(&ticket(1, "MH12XY0001", 2)).await, Err(StoreError::Duplicate(_))));

        assert_eq!(repo.find_open_by_vehicle("KA01AB1234").await.unwrap().unwrap().slot_id, 1);
        assert!(repo.find_open_by_vehicle("MH12XY0001").await.unwrap().is_none());
        assert_eq!(repo.find_open_by_slot(1).await.unwrap().unwrap().vehicle_id, "KA01AB1234");
        assert!(repo.find_open_by_slot(2).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_ticket_delete_is_idempotent() {
        let repo = InMemoryTicketRepository::new();
        repo.save_ticket(&ticket(1, "KA01AB1234", 1)).await.unwrap();

        repo.delete_ticket(1).await.unwrap();
        repo.delete_ticket(1).await.unwrap();

        assert!(repo.open_tickets().await.is_empty());
        assert!(repo.find_open_by_slot(1).await.unwrap().is_none());
        repo.save_ticket(&ticket(2, "KA01AB1234", 1)).await.unwrap();
    }

    #[tokio::test]
    async fn test_admin_usernames_unique() {
        let repo = InMemoryAdminRepository::new();
        let admin = Admin {
            id: "admin-1".to_string(),
            username: "admin".to_string(),
            password_hash: "hash".to_string(),
        };
        repo.save_admin(&admin).await.unwrap();

        assert!(matches!(repo.save_admin(&admin).await, Err(StoreError::Duplicate(_))));
        assert_eq!(repo.find_by_username("admin").await.unwrap(), Some(admin));
        assert!(repo.find_by_username("root").await.unwrap().is_none());
    }
}
