//! Price book: element type -> unit price lookup plus the global budget
//! code length setting.
//!
//! On the wire the table is a flat list of items. Every item is a
//! `{ "Type", "Price", "Unit" }` entry except one sentinel
//! `{ "budgetCodeLength": n }` carrying the setting.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::CoreError;

/// Longest budget code the generator can produce (fits in a `u64`).
pub const MAX_BUDGET_CODE_LENGTH: u32 = 18;

/// Seed rows written by a reset: `(type, unit price, unit)`.
pub const SEED_ENTRIES: [(&str, f64, &str); 4] = [
    ("Concrete", 146.0, "m3"),
    ("Window", 1224.0, "nr"),
    ("Door", 1836.0, "nr"),
    ("Floor", 80.0, "m2"),
];

/// Reject lengths the code generator could not honour. Zero is accepted
/// here and reported when a budget is computed.
pub fn validate_budget_code_length(length: u32) -> Result<(), CoreError> {
    if length > MAX_BUDGET_CODE_LENGTH {
        return Err(CoreError::Validation(format!(
            "Budget code length must be at most {MAX_BUDGET_CODE_LENGTH}, got {length}"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Wire items
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBookEntry {
    #[serde(rename = "Type")]
    pub element_type: String,
    #[serde(rename = "Price")]
    pub unit_price: f64,
    #[serde(rename = "Unit", default)]
    pub unit: String,
}

impl PriceBookEntry {
    pub fn new(element_type: impl Into<String>, unit_price: f64, unit: impl Into<String>) -> Self {
        Self {
            element_type: element_type.into(),
            unit_price,
            unit: unit.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBookSettings {
    #[serde(rename = "budgetCodeLength")]
    pub budget_code_length: u32,
}

/// One element of the flat wire list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PriceBookItem {
    Entry(PriceBookEntry),
    Settings(PriceBookSettings),
}

/// Body of a price update: `{ "type": "...", "unitPrice": n }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceUpdate {
    #[serde(rename = "type")]
    pub element_type: String,
    pub unit_price: f64,
    /// Only used when the type is not yet in the book.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

// ---------------------------------------------------------------------------
// PriceBook
// ---------------------------------------------------------------------------

/// The whole table, held in memory.
///
/// Element types are unique and there is at most one settings sentinel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceBook {
    entries: Vec<PriceBookEntry>,
    budget_code_length: Option<u32>,
}

impl PriceBook {
    /// The table a reset produces: seed entries plus one sentinel.
    pub fn seeded(budget_code_length: u32) -> Self {
        Self {
            entries: SEED_ENTRIES
                .iter()
                .map(|(ty, price, unit)| PriceBookEntry::new(*ty, *price, *unit))
                .collect(),
            budget_code_length: Some(budget_code_length),
        }
    }

    /// Build from the wire list, enforcing the table invariants.
    pub fn from_items(items: Vec<PriceBookItem>) -> Result<Self, CoreError> {
        let mut book = Self::default();
        for item in items {
            match item {
                PriceBookItem::Entry(entry) => {
                    if book.find(&entry.element_type).is_some() {
                        return Err(CoreError::Conflict(format!(
                            "Duplicate price book type '{}'",
                            entry.element_type
                        )));
                    }
                    book.entries.push(entry);
                }
                PriceBookItem::Settings(settings) => {
                    if book.budget_code_length.is_some() {
                        return Err(CoreError::Conflict(
                            "Price book holds more than one settings entry".into(),
                        ));
                    }
                    book.budget_code_length = Some(settings.budget_code_length);
                }
            }
        }
        Ok(book)
    }

    pub fn from_parts(entries: Vec<PriceBookEntry>, budget_code_length: Option<u32>) -> Self {
        let mut book = Self {
            entries: Vec::with_capacity(entries.len()),
            budget_code_length,
        };
        for entry in entries {
            book.insert_or_replace(entry);
        }
        book
    }

    /// Flatten to the wire list; the sentinel goes last.
    pub fn to_items(&self) -> Vec<PriceBookItem> {
        let mut items: Vec<PriceBookItem> = self
            .entries
            .iter()
            .cloned()
            .map(PriceBookItem::Entry)
            .collect();
        if let Some(budget_code_length) = self.budget_code_length {
            items.push(PriceBookItem::Settings(PriceBookSettings { budget_code_length }));
        }
        items
    }

    pub fn entries(&self) -> &[PriceBookEntry] {
        &self.entries
    }

    pub fn budget_code_length(&self) -> Option<u32> {
        self.budget_code_length
    }

    /// Exact, case-sensitive lookup by element type.
    pub fn find(&self, element_type: &str) -> Option<&PriceBookEntry> {
        self.entries.iter().find(|e| e.element_type == element_type)
    }

    /// Set the unit price of `element_type`, inserting it if absent.
    pub fn upsert_price(&mut self, update: &PriceUpdate) {
        match self
            .entries
            .iter_mut()
            .find(|e| e.element_type == update.element_type)
        {
            Some(entry) => entry.unit_price = update.unit_price,
            None => self.entries.push(PriceBookEntry::new(
                update.element_type.clone(),
                update.unit_price,
                update.unit.clone().unwrap_or_default(),
            )),
        }
    }

    fn insert_or_replace(&mut self, entry: PriceBookEntry) {
        match self
            .entries
            .iter_mut()
            .find(|e| e.element_type == entry.element_type)
        {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }
}

// ---------------------------------------------------------------------------
// Store seam
// ---------------------------------------------------------------------------

/// Persistent home of the price book.
#[async_trait]
pub trait PriceBookStore: Send + Sync {
    async fn load(&self) -> Result<PriceBook, CoreError>;

    async fn upsert_price(&self, update: &PriceUpdate) -> Result<(), CoreError>;

    /// Drop the whole table and recreate it from the seed entries.
    async fn reset(&self, budget_code_length: u32) -> Result<PriceBook, CoreError>;
}

/// Process-local store, used when no database is configured.
#[derive(Default)]
pub struct InMemoryPriceBookStore {
    book: RwLock<PriceBook>,
}

impl InMemoryPriceBookStore {
    pub fn new(book: PriceBook) -> Self {
        Self {
            book: RwLock::new(book),
        }
    }
}

#[async_trait]
impl PriceBookStore for InMemoryPriceBookStore {
    async fn load(&self) -> Result<PriceBook, CoreError> {
        Ok(self.book.read().await.clone())
    }

    async fn upsert_price(&self, update: &PriceUpdate) -> Result<(), CoreError> {
        self.book.write().await.upsert_price(update);
        Ok(())
    }

    async fn reset(&self, budget_code_length: u32) -> Result<PriceBook, CoreError> {
        validate_budget_code_length(budget_code_length)?;
        let seeded = PriceBook::seeded(budget_code_length);
        *self.book.write().await = seeded.clone();
        Ok(seeded)
    }
}
