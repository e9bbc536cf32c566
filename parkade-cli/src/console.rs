use parkade_allocation::AllocationEngine;
use parkade_api::auth::verify_credentials;
use parkade_core::{AdminRepository, ResourceType, Slot, SlotId, Vehicle};
use tokio::io::{self, AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{info, warn};

const MENU: &str = "\n--- Menu ---
1. Park vehicle
2. Unpark vehicle
3. View available slots
4. Add slot
5. Exit";

/// Line-oriented admin session over any async reader and writer.
pub struct Console<R, W> {
    input: R,
    output: W,
    engine: AllocationEngine,
}

impl<R, W> Console<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(input: R, output: W, engine: AllocationEngine) -> Self {
        Self { input, output, engine }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    pub async fn say(&mut self, text: impl AsRef<str>) -> io::Result<()> {
        self.output.write_all(text.as_ref().as_bytes()).await?;
        self.output.write_all(b"\n").await?;
        self.output.flush().await
    }

    /// Prints `label` and reads one trimmed line. `None` once input is exhausted.
    async fn prompt(&mut self, label: &str) -> io::Result<Option<String>> {
        self.output.write_all(label.as_bytes()).await?;
        self.output.flush().await?;

        let mut line = String::new();
        if self.input.read_line(&mut line).await? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    /// Asks for credentials until they match a stored admin. Returns `false`
    /// if input ends first.
    pub async fn login(&mut self, admins: &dyn AdminRepository) -> anyhow::Result<bool> {
        loop {
            let Some(username) = self.prompt("Enter username: ").await? else {
                return Ok(false);
            };
            let Some(password) = self.prompt("Enter password: ").await? else {
                return Ok(false);
            };

            if verify_credentials(admins, &username, password).await?.is_some() {
                info!(username = %username, "Console login");
                self.say("Login successful!").await?;
                return Ok(true);
            }

            warn!(username = %username, "Rejected console login");
            self.say("Invalid credentials. Please try again.").await?;
        }
    }

    /// Runs the menu until the user exits or input ends.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        loop {
            self.say(MENU).await?;
            let Some(choice) = self.prompt("Enter your choice: ").await? else {
                return Ok(());
            };

            let keep_going = match choice.as_str() {
                "1" => self.park().await?,
                "2" => self.unpark().await?,
                "3" => {
                    self.show_available().await?;
                    true
                }
                "4" => self.add_slot().await?,
                "5" => {
                    self.say("Goodbye.").await?;
                    false
                }
                _ => {
                    self.say("Invalid choice. Please enter a number from 1 to 5.").await?;
                    true
                }
            };

            if !keep_going {
                return Ok(());
            }
        }
    }

    async fn read_resource_type(&mut self, label: &str) -> io::Result<Option<Option<ResourceType>>> {
        let Some(raw) = self.prompt(label).await? else {
            return Ok(None);
        };
        match raw.parse::<ResourceType>() {
            Ok(resource_type) => Ok(Some(Some(resource_type))),
            Err(_) => {
                self.say("Invalid type. Please enter 'car' or 'bike'.").await?;
                Ok(Some(None))
            }
        }
    }

    async fn park(&mut self) -> io::Result<bool> {
        let Some(vehicle_id) = self.prompt("Enter vehicle number: ").await? else {
            return Ok(false);
        };
        let resource_type = match self.read_resource_type("Enter vehicle type (car/bike): ").await? {
            None => return Ok(false),
            Some(None) => return Ok(true),
            Some(Some(resource_type)) => resource_type,
        };

        match self.engine.park_vehicle(Vehicle::new(vehicle_id, resource_type)).await {
            Ok(ticket) => {
                self.say("Vehicle parked successfully. Ticket details:").await?;
                self.say(format!("Ticket ID: {}", ticket.id)).await?;
                self.say(format!("Vehicle Number: {}", ticket.vehicle_id)).await?;
                self.say(format!("Entry Time: {}", ticket.entry_time.format("%Y-%m-%d %H:%M:%S"))).await?;
                self.say(format!("Slot ID: {}", ticket.slot_id)).await?;
            }
            Err(e) => self.say(format!("Error: {}", e)).await?,
        }
        Ok(true)
    }

    async fn unpark(&mut self) -> io::Result<bool> {
        let Some(vehicle_id) = self.prompt("Enter vehicle number: ").await? else {
            return Ok(false);
        };

        match self.engine.unpark_vehicle(&vehicle_id).await {
            Ok(fee) => self.say(format!("Vehicle unparked. Fee: {:.2}", fee)).await?,
            Err(e) => self.say(format!("Error: {}", e)).await?,
        }
        Ok(true)
    }

    async fn show_available(&mut self) -> io::Result<()> {
        match self.engine.list_available_slots().await {
            Ok(slots) if slots.is_empty() => self.say("No free slots.").await,
            Ok(slots) => {
                self.say("Available slots:").await?;
                for Slot { id, resource_type, .. } in slots {
                    self.say(format!("Slot ID: {} | Type: {}", id, resource_type)).await?;
                }
                Ok(())
            }
            Err(e) => self.say(format!("Error fetching slots: {}", e)).await,
        }
    }

    async fn add_slot(&mut self) -> io::Result<bool> {
        let Some(raw_id) = self.prompt("Enter new slot ID (number): ").await? else {
            return Ok(false);
        };
        let Ok(slot_id) = raw_id.parse::<SlotId>() else {
            self.say("Invalid slot ID. Please enter a number.").await?;
            return Ok(true);
        };
        let resource_type = match self.read_resource_type("Enter slot type (car/bike): ").await? {
            None => return Ok(false),
            Some(None) => return Ok(true),
            Some(Some(resource_type)) => resource_type,
        };

        match self.engine.add_slot(Slot::new(slot_id, resource_type)).await {
            Ok(slot) => self.say(format!("Slot {} ({}) added.", slot.id, slot.resource_type)).await?,
            Err(e) => self.say(format!("Error: {}", e)).await?,
        }
        Ok(true)
    }
}
