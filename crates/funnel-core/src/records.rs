//! # Pipeline Records
//!
//! The five record kinds tracked by Funnel, plus the remark trail.
//!
//! Records are plain data. They are produced by drafts, by the promotion
//! engine or by bulk import, and are never validated again once built.
//! Field names serialize in camelCase.

use crate::types::{
    ActionStatus, ActionType, Currency, EmployeeStatus, Feasibility, LeadType, Priority,
    Recommendation, RecordId, Region, Role, Section, Source, Stage, Status,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// RECORD TRAIT
// =============================================================================

/// Common surface of every stored record.
pub trait Record: Clone {
    /// The collection this record kind lives in.
    const SECTION: Section;

    /// The record's immutable identifier.
    fn id(&self) -> &RecordId;
}

// =============================================================================
// REMARK HISTORY
// =============================================================================

/// One dated note in a record's remark trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemarkEntry {
    pub text: String,
    pub timestamp: DateTime<Utc>,
    pub author: String,
}

/// Append-only remark trail.
///
/// Entries are stored in insertion order and displayed newest-first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RemarkHistory(Vec<RemarkEntry>);

impl RemarkHistory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A history holding a single entry.
    #[must_use]
    pub fn with_entry(entry: RemarkEntry) -> Self {
        Self(vec![entry])
    }

    /// Append an entry. Existing entries are never touched.
    pub fn push(&mut self, entry: RemarkEntry) {
        self.0.push(entry);
    }

    /// Entries in display order, newest first.
    pub fn newest_first(&self) -> impl Iterator<Item = &RemarkEntry> {
        self.0.iter().rev()
    }

    /// The most recent entry.
    #[must_use]
    pub fn latest(&self) -> Option<&RemarkEntry> {
        self.0.last()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// =============================================================================
// ENTITIES
// =============================================================================

/// A person in the directory.
///
/// The regions scope what the employee may act on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: RecordId,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub status: EmployeeStatus,
    pub regions: Vec<Region>,
}

/// A first-contact sales activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: RecordId,
    pub owner: String,
    pub assignee: String,
    pub date: NaiveDate,
    pub client_name: String,
    pub contact_name: String,
    pub contact_number: String,
    pub region: Region,
    pub country: String,
    pub priority: Priority,
    pub next_step: String,
    pub source: Source,
    pub status: Status,
    pub remarks: String,
}

/// A prospect under feasibility study.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: RecordId,
    pub owner: String,
    pub assignee: String,
    pub name: String,
    pub notes: String,
    pub company_name: String,
    pub contact_name: String,
    pub contact_number: String,
    pub region: Region,
    pub country: String,
    pub lead_type: LeadType,
    pub priority: Priority,
    pub next_step: String,
    pub source: Source,
    pub status: Status,
    pub remarks_history: RemarkHistory,
    pub start_date: Option<NaiveDate>,
    pub closing_date: Option<NaiveDate>,
    pub currency: Currency,
    pub value: i64,
    pub expected_revenue: i64,
    pub tech_feasibility: Feasibility,
    pub implementation_feasibility: Feasibility,
    pub sales_feasibility: Feasibility,
    /// The sale this lead was promoted from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_sale: Option<RecordId>,
}

/// Partner organisation attached to an opportunity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Partner {
    pub org_name: String,
    pub contact_name: String,
    pub contact_number: String,
}

/// A qualified deal moving through the stage pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Opportunity {
    pub id: RecordId,
    pub owner: String,
    pub name: String,
    pub account_name: String,
    pub contact_name: String,
    pub contact_number: String,
    pub region: Region,
    pub country: String,
    pub lead_type: LeadType,
    pub source: Source,
    pub next_step: String,
    pub currency: Currency,
    pub value: i64,
    pub expected_closing_date: NaiveDate,
    pub stage: Stage,
    pub remarks_history: RemarkHistory,
    /// Percentage derived from `stage`.
    pub probability: i64,
    pub feasibility_status: Feasibility,
    pub presales_recommendation: Recommendation,
    pub risks: String,
    pub expected_revenue: i64,
    pub campaign_source: String,
    pub sales_owner: String,
    pub technical_poc: String,
    pub presales_poc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partner: Option<Partner>,
    pub description: String,
}

/// A task linked to a lead or an opportunity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionItem {
    pub id: RecordId,
    pub owner: String,
    pub assignee: String,
    pub subject: String,
    pub due_date: NaiveDate,
    pub action_type: ActionType,
    pub linked_record_id: RecordId,
    pub region: Region,
    pub priority: Priority,
    pub status: ActionStatus,
    pub remarks: String,
    pub description: String,
}

macro_rules! impl_record {
    ($($ty:ty => $section:expr),+ $(,)?) => {
        $(
            impl Record for $ty {
                const SECTION: Section = $section;

                fn id(&self) -> &RecordId {
                    &self.id
                }
            }
        )+
    };
}

impl_record! {
    Sale => Section::Sales,
    Lead => Section::Leads,
    Opportunity => Section::Opportunities,
    ActionItem => Section::Actions,
    Employee => Section::Employees,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn entry(text: &str, minute: u32) -> RemarkEntry {
        RemarkEntry {
            text: text.to_string(),
            timestamp: Utc
                .with_ymd_and_hms(2026, 3, 1, 9, minute, 0)
                .single()
                .expect("valid timestamp"),
            author: "Thilakraj".to_string(),
        }
    }

    #[test]
    fn remark_history_is_newest_first() {
        let mut history = RemarkHistory::with_entry(entry("first", 0));
        history.push(entry("second", 1));
        history.push(entry("third", 2));

        let texts: Vec<&str> = history.newest_first().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, vec!["third", "second", "first"]);
        assert_eq!(history.latest().map(|e| e.text.as_str()), Some("third"));
        assert_eq!(history.len(), 3);
    }

    #[test]
    fn remark_history_serializes_as_array() {
        let history = RemarkHistory::with_entry(entry("note", 5));
        let json = serde_json::to_value(&history).expect("serialize");
        assert!(json.is_array());
        assert_eq!(json[0]["author"], "Thilakraj");
    }

    #[test]
    fn employee_uses_camel_case_and_labels() {
        let employee = Employee {
            id: RecordId::new("EMP-9"),
            name: "Asha".to_string(),
            email: "asha@sightspectrum.com".to_string(),
            role: Role::PresalesLead,
            status: EmployeeStatus::Active,
            regions: vec![Region::MiddleEast],
        };
        let json = serde_json::to_value(&employee).expect("serialize");
        assert_eq!(json["role"], "Presales Lead");
        assert_eq!(json["regions"][0], "Middle East");
        assert_eq!(employee.id().as_str(), "EMP-9");
        assert_eq!(<Employee as Record>::SECTION, Section::Employees);
    }
}
