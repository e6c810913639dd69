use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What kind of ledger mutation happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Inserted,
    Updated,
    Swept,
}

/// A ledger change notification. Delivery is at-least-once and unordered
/// across cycles; subscribers must treat any event as "re-fetch the
/// authoritative list", never as the new truth itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoldChange {
    pub kind: ChangeKind,
    /// Absent for sweep events, which touch a batch of rows.
    pub hold_id: Option<Uuid>,
}

impl HoldChange {
    pub fn inserted(hold_id: Uuid) -> Self {
        Self { kind: ChangeKind::Inserted, hold_id: Some(hold_id) }
    }

    pub fn updated(hold_id: Uuid) -> Self {
        Self { kind: ChangeKind::Updated, hold_id: Some(hold_id) }
    }

    pub fn swept() -> Self {
        Self { kind: ChangeKind::Swept, hold_id: None }
    }
}
