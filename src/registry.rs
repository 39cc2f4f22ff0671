use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

/// In-memory occupancy counter per meeting, used for capacity admission.
///
/// Counts live WebSocket peers only; not persisted, reset on restart.
/// Admission is a single check-and-increment under the map's shard lock, so
/// two racing entries cannot both claim the last slot.
pub struct RoomRegistry {
    capacity: usize,
    occupancy: DashMap<String, usize>,
}

impl RoomRegistry {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            occupancy: DashMap::new(),
        }
    }

    /// Claim a slot in the meeting. Returns false when the meeting is full.
    pub fn try_enter(&self, meeting_id: &str) -> bool {
        let mut count = self.occupancy.entry(meeting_id.to_string()).or_insert(0);
        if *count >= self.capacity {
            return false;
        }
        *count += 1;
        true
    }

    /// Release a slot. Clamped at zero; the entry is dropped when the last
    /// peer leaves so the map does not accumulate dead meetings.
    pub fn leave(&self, meeting_id: &str) {
        if let Entry::Occupied(mut entry) = self.occupancy.entry(meeting_id.to_string()) {
            let next = entry.get().saturating_sub(1);
            if next == 0 {
                entry.remove();
            } else {
                *entry.get_mut() = next;
            }
        }
    }

    /// Current occupancy for a meeting. Unknown meetings count as empty.
    pub fn count(&self, meeting_id: &str) -> usize {
        self.occupancy.get(meeting_id).map(|c| *c).unwrap_or(0)
    }

    pub fn is_full(&self, meeting_id: &str) -> bool {
        self.count(meeting_id) >= self.capacity
    }
}
