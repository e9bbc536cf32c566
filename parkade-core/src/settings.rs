use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Upper bound on compare-and-set attempts per park call
    #[serde(default = "default_max_claim_attempts")]
    pub max_claim_attempts: u32,

    /// Discriminator mixed into ticket ids, unique per running instance
    #[serde(default)]
    pub node_id: u8,
}

fn default_max_claim_attempts() -> u32 { 8 }

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            max_claim_attempts: default_max_claim_attempts(),
            node_id: 0,
        }
    }
}
