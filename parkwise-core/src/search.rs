use serde::{Deserialize, Serialize};

use crate::model::ParkingLot;

/// Free-text lot search, matched against name, address and pin code.
#[derive(Debug, Default, Deserialize)]
pub struct LotSearch {
    pub q: Option<String>,
}

impl LotSearch {
    /// Trimmed search term, `None` when the search should return every lot.
    pub fn term(&self) -> Option<&str> {
        self.q.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }

    /// Case-insensitive substring match on name, address or pin code.
    /// Both sides are folded with Unicode lowercasing.
    pub fn matches(&self, lot: &ParkingLot) -> bool {
        let Some(term) = self.term() else {
            return true;
        };
        let needle = term.to_lowercase();
        [&lot.name, &lot.address, &lot.pin_code]
            .into_iter()
            .any(|field| field.to_lowercase().contains(&needle))
    }
}

/// A lot together with how many of its spots are free right now.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LotAvailability {
    #[serde(flatten)]
    pub lot: ParkingLot,
    pub available: i64,
}
