//! Inventory ledger models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::types::DateRange;

/// Kind of stock movement recorded in the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(
    feature = "sqlx",
    derive(sqlx::Type),
    sqlx(type_name = "inventory_action", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum InventoryAction {
    /// Restock or opening stock
    Added,
    /// Manual removal or correction
    Removed,
    Sold,
    /// Quantity overwritten through a general variant edit
    Updated,
}

impl InventoryAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            InventoryAction::Added => "added",
            InventoryAction::Removed => "removed",
            InventoryAction::Sold => "sold",
            InventoryAction::Updated => "updated",
        }
    }

    /// Action recorded for a manual stock adjustment of the given sign
    pub fn for_adjustment(quantity_change: i32) -> Self {
        if quantity_change > 0 {
            InventoryAction::Added
        } else {
            InventoryAction::Removed
        }
    }
}

impl std::fmt::Display for InventoryAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for InventoryAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "added" => Ok(InventoryAction::Added),
            "removed" => Ok(InventoryAction::Removed),
            "sold" => Ok(InventoryAction::Sold),
            "updated" => Ok(InventoryAction::Updated),
            other => Err(format!("unknown inventory action: {}", other)),
        }
    }
}

/// One immutable row of the inventory ledger.
///
/// `new_quantity == previous_quantity + quantity_change` always holds and
/// `quantity_change` is never zero. `variant_id` becomes `None` once the
/// variant is deleted; the row itself is kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct InventoryLogEntry {
    pub id: Uuid,
    /// Monotonic position in the ledger, assigned at insert time
    #[cfg_attr(feature = "sqlx", sqlx(rename = "seq"))]
    pub sequence: i64,
    pub variant_id: Option<Uuid>,
    pub action: InventoryAction,
    pub quantity_change: i32,
    pub previous_quantity: i32,
    pub new_quantity: i32,
    pub performed_by: Option<Uuid>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Ledger entry joined with display names for audit screens
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct InventoryLogView {
    #[serde(flatten)]
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub entry: InventoryLogEntry,
    pub variant_name: Option<String>,
    pub variant_sku: Option<String>,
    pub product_name: Option<String>,
    pub performed_by_name: Option<String>,
}

/// A ledger row about to be appended
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLogEntry {
    pub variant_id: Uuid,
    pub action: InventoryAction,
    pub quantity_change: i32,
    pub previous_quantity: i32,
    pub new_quantity: i32,
    pub performed_by: Option<Uuid>,
    pub notes: String,
}

impl NewLogEntry {
    /// Builds the entry for a move from `previous` to `new`.
    /// Returns `None` when the quantity does not change.
    pub fn movement(
        variant_id: Uuid,
        action: InventoryAction,
        previous: i32,
        new: i32,
        performed_by: Option<Uuid>,
        notes: impl Into<String>,
    ) -> Option<Self> {
        let quantity_change = new.checked_sub(previous)?;
        if quantity_change == 0 {
            return None;
        }
        Some(Self {
            variant_id,
            action,
            quantity_change,
            previous_quantity: previous,
            new_quantity: new,
            performed_by,
            notes: notes.into(),
        })
    }
}

/// Filters accepted by the ledger query
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogFilter {
    pub variant_id: Option<Uuid>,
    pub action: Option<InventoryAction>,
    pub period: DateRange,
    pub limit: u32,
}

impl LogFilter {
    pub fn matches(&self, entry: &InventoryLogEntry) -> bool {
        self.variant_id.map_or(true, |id| entry.variant_id == Some(id))
            && self.action.map_or(true, |a| entry.action == a)
            && self.period.contains(entry.created_at)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReplayError {
    #[error("entry {entry_id} starts at {recorded}, expected {expected}")]
    Discontinuity {
        entry_id: Uuid,
        expected: i32,
        recorded: i32,
    },
    #[error("entry {entry_id} does not add up: {previous} + {change} != {new}")]
    Arithmetic {
        entry_id: Uuid,
        previous: i32,
        change: i32,
        new: i32,
    },
    #[error("entry {entry_id} drives stock negative")]
    Negative { entry_id: Uuid },
}

/// Replays ledger entries for one variant, in creation order, from zero.
///
/// The result must equal the variant's current quantity.
pub fn replay_quantity<'a, I>(entries: I) -> Result<i32, ReplayError>
where
    I: IntoIterator<Item = &'a InventoryLogEntry>,
{
    let mut running: i32 = 0;
    for entry in entries {
        if entry.previous_quantity != running {
            return Err(ReplayError::Discontinuity {
                entry_id: entry.id,
                expected: running,
                recorded: entry.previous_quantity,
            });
        }
        match entry.previous_quantity.checked_add(entry.quantity_change) {
            Some(next) if next == entry.new_quantity => running = next,
            _ => {
                return Err(ReplayError::Arithmetic {
                    entry_id: entry.id,
                    previous: entry.previous_quantity,
                    change: entry.quantity_change,
                    new: entry.new_quantity,
                })
            }
        }
        if running < 0 {
            return Err(ReplayError::Negative { entry_id: entry.id });
        }
    }
    Ok(running)
}
