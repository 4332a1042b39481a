//! Purchase lifecycle model
//!
//! A purchase (one customer intake bill) is either `open` or `done`. At most
//! one purchase may be open system-wide; the database enforces this with a
//! partial unique index, and the only transition into `done` is payment.

use serde::{Deserialize, Serialize};

/// Purchase lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PurchaseStatus {
    Open,
    Done,
}

impl PurchaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PurchaseStatus::Open => "open",
            PurchaseStatus::Done => "done",
        }
    }

    pub fn parse(s: &str) -> Result<Self, &'static str> {
        match s {
            "open" => Ok(PurchaseStatus::Open),
            "done" => Ok(PurchaseStatus::Done),
            _ => Err("Unknown purchase status"),
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, PurchaseStatus::Open)
    }

    /// `done` is terminal: no reopen path exists.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PurchaseStatus::Done)
    }

    /// Line items may only be added, repriced or removed while open.
    pub fn allows_item_mutation(&self) -> bool {
        self.is_open()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_str() {
        for status in [PurchaseStatus::Open, PurchaseStatus::Done] {
            assert_eq!(PurchaseStatus::parse(status.as_str()), Ok(status));
        }
        assert!(PurchaseStatus::parse("paid").is_err());
    }

    #[test]
    fn done_is_terminal_and_frozen() {
        assert!(PurchaseStatus::Open.allows_item_mutation());
        assert!(!PurchaseStatus::Done.allows_item_mutation());
        assert!(PurchaseStatus::Done.is_terminal());
        assert!(!PurchaseStatus::Open.is_terminal());
    }
}
