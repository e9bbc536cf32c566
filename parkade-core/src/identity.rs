use std::sync::atomic::{AtomicI64, Ordering};
use chrono::Utc;
use crate::models::TicketId;

const NODE_BITS: u32 = 8;
const NODE_MASK: i64 = (1 << NODE_BITS) - 1;

/// Time-derived ticket ids: `(micros << 8) | node_id`.
///
/// The microsecond part is bumped past the previously issued value whenever the clock
/// has not advanced, so two calls on one generator never return the same id even when
/// they land in the same microsecond. `node_id` keeps ids apart across processes that
/// share a ticket table.
#[derive(Debug)]
pub struct TicketIdGenerator {
    node_id: u8,
    last_micros: AtomicI64,
}

impl TicketIdGenerator {
    pub fn new(node_id: u8) -> Self {
        Self {
            node_id,
            last_micros: AtomicI64::new(0),
        }
    }

    pub fn next_id(&self) -> TicketId {
        let now = Utc::now().timestamp_micros();
        let previous = match self.last_micros.fetch_update(Ordering::AcqRel, Ordering::Acquire, |last| {
            Some(now.max(last + 1))
        }) {
            Ok(prev) | Err(prev) => prev,
        };
        let micros = now.max(previous + 1);

        (micros << NODE_BITS) | i64::from(self.node_id)
    }

    pub fn node_of(id: TicketId) -> u8 {
        (id & NODE_MASK) as u8
    }
}

impl Default for TicketIdGenerator {
    fn default() -> Self {
        Self::new(0)
    }
}
