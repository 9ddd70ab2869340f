//! # Record Store
//!
//! The in-memory state of the pipeline:
//! - Five insertion-ordered collections keyed by `RecordId`
//! - The acting role
//! - A single ID sequence shared by every collection
//!
//! `CrmState` is what storage backends load and save as a whole.

use crate::primitives::{DIRECTORY_DOMAIN, SEQUENCE_FLOOR};
use crate::records::{ActionItem, Employee, Lead, Opportunity, Record, Sale};
use crate::types::{EmployeeStatus, RecordId, Region, Role, Section};
use serde::{Deserialize, Serialize};

// =============================================================================
// COLLECTION
// =============================================================================

/// Insertion-ordered mapping `RecordId -> T`.
///
/// Replacing a record keeps its original position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Collection<T> {
    records: Vec<T>,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
        }
    }
}

impl<T: Record> Collection<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_records(records: Vec<T>) -> Self {
        let mut collection = Self::new();
        for record in records {
            collection.upsert(record);
        }
        collection
    }

    /// Replace the record with the same ID, or append it.
    ///
    /// Returns `true` when an existing record was replaced.
    pub fn upsert(&mut self, record: T) -> bool {
        match self.records.iter().position(|r| r.id() == record.id()) {
            Some(idx) => {
                self.records[idx] = record;
                true
            }
            None => {
                self.records.push(record);
                false
            }
        }
    }

    /// Append every record of a batch, replacing any ID collisions.
    pub fn extend(&mut self, batch: impl IntoIterator<Item = T>) {
        for record in batch {
            self.upsert(record);
        }
    }

    #[must_use]
    pub fn get(&self, id: &RecordId) -> Option<&T> {
        self.records.iter().find(|r| r.id() == id)
    }

    #[must_use]
    pub fn contains(&self, id: &RecordId) -> bool {
        self.get(id).is_some()
    }

    /// Remove and return the record with `id`.
    pub fn remove(&mut self, id: &RecordId) -> Option<T> {
        let idx = self.records.iter().position(|r| r.id() == id)?;
        Some(self.records.remove(idx))
    }

    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.records.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Largest numeric ID suffix in the collection.
    fn max_suffix(&self) -> Option<u64> {
        self.records
            .iter()
            .filter_map(|r| r.id().numeric_suffix())
            .max()
    }
}

impl<'a, T> IntoIterator for &'a Collection<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

// =============================================================================
// ID SEQUENCE
// =============================================================================

/// Monotonic counter behind every minted ID.
///
/// Serialized as the next value to hand out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sequence {
    next: u64,
}

impl Default for Sequence {
    fn default() -> Self {
        Self {
            next: SEQUENCE_FLOOR,
        }
    }
}

impl Sequence {
    /// A sequence whose next value is `next`, never below the floor.
    #[must_use]
    pub fn starting_at(next: u64) -> Self {
        Self {
            next: next.max(SEQUENCE_FLOOR),
        }
    }

    /// The value the next mint will use.
    #[must_use]
    pub fn peek(&self) -> u64 {
        self.next
    }

    /// Mint a fresh `<PREFIX>-<n>` ID for `section`.
    pub fn mint(&mut self, section: Section) -> RecordId {
        let id = RecordId::minted(section.id_prefix(), self.next);
        self.next = self.next.saturating_add(1);
        id
    }

    /// Move past `used` if it would otherwise be minted again.
    pub fn observe(&mut self, used: u64) {
        if used >= self.next {
            self.next = used.saturating_add(1);
        }
    }
}

// =============================================================================
// STATE
// =============================================================================

/// Everything that is persisted between runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrmState {
    pub sales: Collection<Sale>,
    pub leads: Collection<Lead>,
    pub opportunities: Collection<Opportunity>,
    pub actions: Collection<ActionItem>,
    pub employees: Collection<Employee>,
    pub role: Role,
    pub sequence: Sequence,
}

impl CrmState {
    /// Empty collections with the seeded directory.
    #[must_use]
    pub fn with_default_directory() -> Self {
        Self {
            employees: Collection::from_records(default_directory()),
            ..Self::default()
        }
    }

    /// Raise the sequence past every numeric ID suffix present.
    pub fn resume_sequence(&mut self) {
        let highest = [
            self.sales.max_suffix(),
            self.leads.max_suffix(),
            self.opportunities.max_suffix(),
            self.actions.max_suffix(),
            self.employees.max_suffix(),
        ]
        .into_iter()
        .flatten()
        .max();
        if let Some(used) = highest {
            self.sequence.observe(used);
        }
    }

    /// Record count of one section.
    #[must_use]
    pub fn count(&self, section: Section) -> usize {
        match section {
            Section::Sales => self.sales.len(),
            Section::Leads => self.leads.len(),
            Section::Opportunities => self.opportunities.len(),
            Section::Actions => self.actions.len(),
            Section::Employees => self.employees.len(),
        }
    }

    /// Whether `section` holds a record with `id`.
    #[must_use]
    pub fn contains(&self, section: Section, id: &RecordId) -> bool {
        match section {
            Section::Sales => self.sales.contains(id),
            Section::Leads => self.leads.contains(id),
            Section::Opportunities => self.opportunities.contains(id),
            Section::Actions => self.actions.contains(id),
            Section::Employees => self.employees.contains(id),
        }
    }
}

/// The four employees seeded into an empty directory.
#[must_use]
pub fn default_directory() -> Vec<Employee> {
    let seed = [
        (
            "EMP-1",
            "Thilakraj",
            Role::SuperAdmin,
            vec![Region::NorthAmerica, Region::Europe],
        ),
        ("EMP-2", "Seranjivi", Role::SalesHead, vec![Region::AsiaPacific]),
        (
            "EMP-3",
            "Yashwanth",
            Role::PresalesConsultant,
            vec![Region::Europe, Region::MiddleEast],
        ),
        (
            "EMP-4",
            "Prem",
            Role::DeliveryManager,
            vec![Region::AsiaPacific, Region::Oceania],
        ),
    ];
    seed.into_iter()
        .map(|(id, name, role, regions)| Employee {
            id: RecordId::new(id),
            name: name.to_string(),
            email: format!("{}@{}", name.to_lowercase(), DIRECTORY_DOMAIN),
            role,
            status: EmployeeStatus::Active,
            regions,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn employee(id: &str, name: &str) -> Employee {
        Employee {
            id: RecordId::new(id),
            name: name.to_string(),
            email: String::new(),
            role: Role::SalesHead,
            status: EmployeeStatus::Active,
            regions: vec![Region::Africa],
        }
    }

    #[test]
    fn upsert_replaces_in_place() {
        let mut c = Collection::new();
        assert!(!c.upsert(employee("EMP-1", "a")));
        assert!(!c.upsert(employee("EMP-2", "b")));
        assert!(c.upsert(employee("EMP-1", "c")));

        let names: Vec<&str> = c.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["c", "b"]);
    }

    #[test]
    fn remove_returns_record() {
        let mut c = Collection::from_records(vec![employee("EMP-1", "a")]);
        assert_eq!(c.remove(&RecordId::new("EMP-1")).map(|e| e.name), Some("a".to_string()));
        assert!(c.remove(&RecordId::new("EMP-1")).is_none());
        assert!(c.is_empty());
    }

    #[test]
    fn sequence_mints_prefixed_ids() {
        let mut seq = Sequence::default();
        assert_eq!(seq.mint(Section::Sales).as_str(), "SALE-1000");
        assert_eq!(seq.mint(Section::Leads).as_str(), "LD-1001");
        assert_eq!(seq.mint(Section::Actions).as_str(), "ACT-1002");
        assert_eq!(seq.peek(), 1003);
    }

    #[test]
    fn sequence_never_below_floor() {
        assert_eq!(Sequence::starting_at(3).peek(), SEQUENCE_FLOOR);
    }

    #[test]
    fn resume_skips_existing_suffixes() {
        let mut state = CrmState::with_default_directory();
        state
            .employees
            .upsert(employee("EMP-2041", "imported"));
        state.resume_sequence();
        assert_eq!(state.sequence.peek(), 2042);
    }

    #[test]
    fn default_directory_has_four_active_employees() {
        let directory = default_directory();
        assert_eq!(directory.len(), 4);
        assert_eq!(directory[0].email, "thilakraj@sightspectrum.com");
        assert_eq!(directory[3].role, Role::DeliveryManager);
        assert!(directory.iter().all(|e| e.status == EmployeeStatus::Active));
        assert!(directory.iter().all(|e| !e.regions.is_empty()));
    }
}
