//! # Visibility Filter
//!
//! Narrows a collection to the records an actor may act on.
//!
//! Two filters compose:
//! - **Region scope**: skipped for unrestricted roles, otherwise a record is
//!   kept only when its region is one of the actor's regions.
//! - **Query**: a non-empty query keeps records where any of the
//!   collection's search fields contains it, ignoring case.
//!
//! Input order is preserved.

use crate::records::{ActionItem, Employee, Lead, Opportunity, Sale};
use crate::types::{Region, Role};

/// A record with a single owning region.
pub trait Regional {
    fn region(&self) -> Region;
}

/// A record with a fixed list of free-text search fields.
pub trait Searchable {
    /// Search fields, in order.
    fn search_fields(&self) -> Vec<&str>;

    /// Case-insensitive substring match of any search field.
    ///
    /// `needle` must already be lowercased.
    fn matches(&self, needle: &str) -> bool {
        self.search_fields()
            .into_iter()
            .any(|field| field.to_lowercase().contains(needle))
    }
}

/// Region-scoped and query-narrowed view of `records`.
pub fn filter<'a, T>(records: &'a [T], role: Role, regions: &[Region], query: &str) -> Vec<&'a T>
where
    T: Regional + Searchable,
{
    let needle = query.trim().to_lowercase();
    records
        .iter()
        .filter(|r| role.is_unrestricted() || regions.contains(&r.region()))
        .filter(|r| needle.is_empty() || r.matches(&needle))
        .collect()
}

/// Query-narrowed view of the directory. Employees have no region scope.
pub fn filter_employees<'a>(employees: &'a [Employee], query: &str) -> Vec<&'a Employee> {
    let needle = query.trim().to_lowercase();
    employees
        .iter()
        .filter(|e| needle.is_empty() || e.matches(&needle))
        .collect()
}

// =============================================================================
// PER-COLLECTION FIELDS
// =============================================================================

macro_rules! impl_regional {
    ($($ty:ty),+) => {
        $(
            impl Regional for $ty {
                fn region(&self) -> Region {
                    self.region
                }
            }
        )+
    };
}

impl_regional!(Sale, Lead, Opportunity, ActionItem);

impl Searchable for Sale {
    fn search_fields(&self) -> Vec<&str> {
        vec![self.client_name.as_str(), self.contact_name.as_str(), self.id.as_str()]
    }
}

impl Searchable for Lead {
    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.name.as_str(),
            self.company_name.as_str(),
            self.contact_name.as_str(),
            self.id.as_str(),
        ]
    }
}

impl Searchable for Opportunity {
    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.name.as_str(),
            self.account_name.as_str(),
            self.contact_name.as_str(),
            self.id.as_str(),
        ]
    }
}

impl Searchable for ActionItem {
    fn search_fields(&self) -> Vec<&str> {
        vec![
            self.subject.as_str(),
            self.description.as_str(),
            self.assignee.as_str(),
            self.id.as_str(),
        ]
    }
}

impl Searchable for Employee {
    fn search_fields(&self) -> Vec<&str> {
        vec![self.name.as_str(), self.email.as_str(), self.role.as_str()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ActionStatus, ActionType, EmployeeStatus, Priority, RecordId};
    use chrono::NaiveDate;

    fn action(id: &str, subject: &str, region: Region) -> ActionItem {
        ActionItem {
            id: RecordId::new(id),
            owner: "Prem".to_string(),
            assignee: "Delivery Managers".to_string(),
            subject: subject.to_string(),
            due_date: NaiveDate::from_ymd_opt(2026, 5, 1).expect("valid date"),
            action_type: ActionType::Opportunity,
            linked_record_id: RecordId::new("LD-1001"),
            region,
            priority: Priority::High,
            status: ActionStatus::NotStarted,
            remarks: String::new(),
            description: "Kickoff planning".to_string(),
        }
    }

    #[test]
    fn restricted_role_sees_own_regions_only() {
        let items = vec![
            action("ACT-1", "Alpha", Region::Europe),
            action("ACT-2", "Beta", Region::AsiaPacific),
            action("ACT-3", "Gamma", Region::Oceania),
        ];
        let seen = filter(
            &items,
            Role::DeliveryManager,
            &[Region::AsiaPacific, Region::Oceania],
            "",
        );
        let ids: Vec<&str> = seen.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["ACT-2", "ACT-3"]);
    }

    #[test]
    fn unrestricted_role_ignores_regions() {
        let items = vec![
            action("ACT-1", "Alpha", Region::Europe),
            action("ACT-2", "Beta", Region::Africa),
        ];
        assert_eq!(filter(&items, Role::AdminFounder, &[], "").len(), 2);
    }

    #[test]
    fn query_is_case_insensitive_and_composes() {
        let items = vec![
            action("ACT-1", "Kickoff Alpha", Region::Europe),
            action("ACT-2", "kickoff beta", Region::Africa),
            action("ACT-3", "Review", Region::Europe),
        ];
        let seen = filter(&items, Role::SalesHead, &[Region::Europe], "KICKOFF");
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].id.as_str(), "ACT-1");

        let by_id = filter(&items, Role::SuperAdmin, &[], "act-3");
        assert_eq!(by_id.len(), 1);
    }

    #[test]
    fn employees_filter_by_role_label() {
        let directory = vec![Employee {
            id: RecordId::new("EMP-3"),
            name: "Yashwanth".to_string(),
            email: "yashwanth@sightspectrum.com".to_string(),
            role: Role::PresalesConsultant,
            status: EmployeeStatus::Active,
            regions: vec![Region::Europe],
        }];
        assert_eq!(filter_employees(&directory, "presales").len(), 1);
        assert!(filter_employees(&directory, "delivery").is_empty());
    }
}
