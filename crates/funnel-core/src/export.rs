//! # CSV Export Module
//!
//! Serializes selected records to fully quoted comma-separated text that the
//! ingestor reads back.
//!
//! - Header: `ID` followed by the import columns of the record kind
//! - One row per record, in the order given
//! - File name: `<kind>_export_<YYYYMMDD-HHMMSS>.csv`

use crate::formats::csv::write_row;
use crate::ingestor::{REGION_SEPARATOR, columns};
use crate::records::{ActionItem, Employee, Lead, Opportunity, Record, Sale};
use crate::types::Section;
use chrono::{DateTime, NaiveDate, Utc};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// A record that can be written as one export row.
pub trait Exportable: Record {
    /// Cells in import column order, without the ID.
    fn cells(&self) -> Vec<String>;
}

fn date(d: NaiveDate) -> String {
    d.format(DATE_FORMAT).to_string()
}

impl Exportable for Sale {
    fn cells(&self) -> Vec<String> {
        vec![
            date(self.date),
            self.client_name.clone(),
            self.contact_name.clone(),
            self.contact_number.clone(),
            self.region.to_string(),
            self.country.clone(),
            self.priority.to_string(),
            self.source.to_string(),
            self.status.to_string(),
            self.assignee.clone(),
            self.remarks.clone(),
        ]
    }
}

impl Exportable for Lead {
    fn cells(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.company_name.clone(),
            self.contact_name.clone(),
            self.contact_number.clone(),
            self.region.to_string(),
            self.country.clone(),
            self.lead_type.to_string(),
            self.priority.to_string(),
            self.source.to_string(),
            self.status.to_string(),
            self.assignee.clone(),
            self.start_date.map(date).unwrap_or_default(),
            self.value.to_string(),
        ]
    }
}

impl Exportable for Opportunity {
    fn cells(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.account_name.clone(),
            self.sales_owner.clone(),
            self.region.to_string(),
            self.country.clone(),
            self.stage.to_string(),
            self.value.to_string(),
            date(self.expected_closing_date),
            self.lead_type.to_string(),
            self.source.to_string(),
        ]
    }
}

impl Exportable for ActionItem {
    fn cells(&self) -> Vec<String> {
        vec![
            self.subject.clone(),
            self.assignee.clone(),
            date(self.due_date),
            self.action_type.to_string(),
            self.linked_record_id.to_string(),
            self.region.to_string(),
            self.priority.to_string(),
            self.status.to_string(),
            self.description.clone(),
        ]
    }
}

impl Exportable for Employee {
    fn cells(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.email.clone(),
            self.role.to_string(),
            self.status.to_string(),
            self.regions
                .iter()
                .map(|r| r.as_str())
                .collect::<Vec<_>>()
                .join(&REGION_SEPARATOR.to_string()),
        ]
    }
}

/// CSV text for `records`, header first.
pub fn export_csv<'a, T, I>(records: I) -> String
where
    T: Exportable + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let mut header = vec!["ID"];
    header.extend_from_slice(columns(T::SECTION));
    let mut out = write_row(&header);
    for record in records {
        let mut cells = vec![record.id().to_string()];
        cells.extend(record.cells());
        out.push_str(&write_row(&cells));
    }
    out
}

/// Short kind name used in export file names.
#[must_use]
pub const fn file_kind(section: Section) -> &'static str {
    match section {
        Section::Sales => "sales",
        Section::Leads => "leads",
        Section::Opportunities => "opps",
        Section::Actions => "actions",
        Section::Employees => "employees",
    }
}

/// `<kind>_export_<YYYYMMDD-HHMMSS>.csv`
#[must_use]
pub fn export_file_name(section: Section, at: DateTime<Utc>) -> String {
    format!(
        "{}_export_{}.csv",
        file_kind(section),
        at.format("%Y%m%d-%H%M%S")
    )
}
