//! # Ingestor Module
//!
//! Bulk import of comma-separated rows into typed records.
//!
//! - The first row is a header and is discarded
//! - A header starting with `ID` marks an export file; that column is skipped
//! - Columns are positional, per record kind
//! - Every row gets a freshly minted ID from the shared sequence
//!
//! Empty cells take per-kind defaults in both modes. An unreadable cell
//! rejects the whole batch in `Strict` mode and is defaulted in `Lenient`
//! mode. The sequence only advances when the whole batch is accepted.

use crate::clock::days_after;
use crate::formats::csv::{self, CsvRow};
use crate::forecast;
use crate::primitives::{DEFAULT_COUNTRY, MAX_IMPORT_ROWS, OPPORTUNITY_CLOSE_DAYS};
use crate::records::{ActionItem, Employee, Lead, Opportunity, RemarkHistory, Sale};
use crate::store::Sequence;
use crate::types::{
    ActionStatus, ActionType, Currency, EmployeeStatus, Feasibility, FunnelError, LeadType,
    Priority, Recommendation, RecordId, Region, Role, Section, Source, Stage, Status,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

// =============================================================================
// COLUMN LAYOUTS
// =============================================================================

pub const SALE_COLUMNS: [&str; 11] = [
    "SaleDate",
    "ClientName",
    "ContactName",
    "ContactNumber",
    "Region",
    "Country",
    "Priority",
    "Source",
    "Status",
    "Assignee",
    "Remarks",
];

pub const LEAD_COLUMNS: [&str; 13] = [
    "LeadName",
    "CompanyName",
    "ContactName",
    "ContactNumber",
    "Region",
    "Country",
    "Type",
    "Priority",
    "Source",
    "Status",
    "Assignee",
    "StartDate",
    "Value",
];

pub const OPPORTUNITY_COLUMNS: [&str; 10] = [
    "Name",
    "AccountName",
    "SalesOwner",
    "Region",
    "Country",
    "Stage",
    "Value",
    "ExpClosingDate",
    "Type",
    "Source",
];

pub const ACTION_COLUMNS: [&str; 9] = [
    "Subject",
    "Assignee",
    "DueDate",
    "ActionType",
    "LinkedRecordId",
    "Region",
    "Priority",
    "Status",
    "Description",
];

pub const EMPLOYEE_COLUMNS: [&str; 5] = ["Name", "Email", "Role", "Status", "Regions"];

/// Import header of `section`.
#[must_use]
pub fn columns(section: Section) -> &'static [&'static str] {
    match section {
        Section::Sales => &SALE_COLUMNS,
        Section::Leads => &LEAD_COLUMNS,
        Section::Opportunities => &OPPORTUNITY_COLUMNS,
        Section::Actions => &ACTION_COLUMNS,
        Section::Employees => &EMPLOYEE_COLUMNS,
    }
}

/// Separator between regions inside the `Regions` cell.
pub const REGION_SEPARATOR: char = ';';

const DATE_FORMAT: &str = "%Y-%m-%d";

/// How unreadable cells are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportMode {
    /// Reject the batch on the first unreadable cell.
    #[default]
    Strict,
    /// Replace unreadable cells with defaults.
    Lenient,
}

// =============================================================================
// ROW READER
// =============================================================================

/// Positional access to one data row.
struct RowReader<'r> {
    row: &'r CsvRow,
    offset: usize,
    mode: ImportMode,
}

impl RowReader<'_> {
    fn text(&self, idx: usize) -> String {
        self.row.cell(idx + self.offset).to_string()
    }

    fn text_or(&self, idx: usize, default: &str) -> String {
        let cell = self.row.cell(idx + self.offset);
        if cell.is_empty() {
            default.to_string()
        } else {
            cell.to_string()
        }
    }

    fn reject(&self, column: &'static str, value: &str) -> FunnelError {
        FunnelError::MalformedRow {
            line: self.row.line,
            column,
            value: value.to_string(),
        }
    }

    /// Read a cell with `read`, defaulting empty and (leniently) bad cells.
    fn read<T>(
        &self,
        idx: usize,
        column: &'static str,
        default: T,
        read: impl FnOnce(&str) -> Option<T>,
    ) -> Result<T, FunnelError> {
        let cell = self.row.cell(idx + self.offset);
        if cell.is_empty() {
            return Ok(default);
        }
        match read(cell) {
            Some(v) => Ok(v),
            None if self.mode == ImportMode::Lenient => Ok(default),
            None => Err(self.reject(column, cell)),
        }
    }

    fn parse<T: FromStr>(&self, idx: usize, column: &'static str, default: T) -> Result<T, FunnelError> {
        self.read(idx, column, default, |c| c.parse().ok())
    }

    fn date(&self, idx: usize, column: &'static str, default: NaiveDate) -> Result<NaiveDate, FunnelError> {
        self.read(idx, column, default, |c| {
            NaiveDate::parse_from_str(c, DATE_FORMAT).ok()
        })
    }

    fn number(&self, idx: usize, column: &'static str) -> Result<i64, FunnelError> {
        self.read(idx, column, 0, |c| c.replace(',', "").parse().ok())
    }

    fn regions(&self, idx: usize, column: &'static str) -> Result<Vec<Region>, FunnelError> {
        let cell = self.row.cell(idx + self.offset);
        let mut regions = Vec::new();
        for part in cell.split(REGION_SEPARATOR).map(str::trim).filter(|p| !p.is_empty()) {
            match part.parse::<Region>() {
                Ok(region) => regions.push(region),
                Err(_) if self.mode == ImportMode::Lenient => {}
                Err(_) => return Err(self.reject(column, part)),
            }
        }
        if regions.is_empty() && self.mode == ImportMode::Strict {
            return Err(self.reject(column, cell));
        }
        regions.sort();
        regions.dedup();
        Ok(regions)
    }
}

// =============================================================================
// INGESTOR
// =============================================================================

/// Turns CSV text into records for one actor on one day.
#[derive(Debug, Clone, Copy)]
pub struct Ingestor<'a> {
    actor: &'a str,
    today: NaiveDate,
    mode: ImportMode,
}

impl<'a> Ingestor<'a> {
    #[must_use]
    pub fn new(actor: &'a str, today: NaiveDate, mode: ImportMode) -> Self {
        Self { actor, today, mode }
    }

    #[must_use]
    pub fn mode(&self) -> ImportMode {
        self.mode
    }

    /// Parse every data row with `build`, minting IDs from a working copy
    /// of `sequence` that is committed only on success.
    fn run<T>(
        &self,
        text: &str,
        sequence: &mut Sequence,
        section: Section,
        mut build: impl FnMut(&RowReader<'_>, RecordId) -> Result<T, FunnelError>,
    ) -> Result<Vec<T>, FunnelError> {
        let mut rows = csv::parse(text).into_iter();
        let offset = match rows.next() {
            Some(header) if header.cell(0).eq_ignore_ascii_case("ID") => 1,
            Some(_) => 0,
            None => return Ok(Vec::new()),
        };
        let rows: Vec<CsvRow> = rows.collect();
        if rows.len() > MAX_IMPORT_ROWS {
            return Err(FunnelError::SerializationError(format!(
                "Import has {} rows (max {})",
                rows.len(),
                MAX_IMPORT_ROWS
            )));
        }

        let mut working = *sequence;
        let mut records = Vec::with_capacity(rows.len());
        for row in &rows {
            let reader = RowReader {
                row,
                offset,
                mode: self.mode,
            };
            let id = working.mint(section);
            records.push(build(&reader, id)?);
        }
        *sequence = working;

        tracing::debug!(section = %section, rows = records.len(), mode = ?self.mode, "parsed import");
        Ok(records)
    }

    pub fn sales(&self, text: &str, sequence: &mut Sequence) -> Result<Vec<Sale>, FunnelError> {
        self.run(text, sequence, Section::Sales, |r, id| {
            Ok(Sale {
                id,
                owner: self.actor.to_string(),
                date: r.date(0, "SaleDate", self.today)?,
                client_name: r.text(1),
                contact_name: r.text(2),
                contact_number: r.text(3),
                region: r.parse(4, "Region", Region::NorthAmerica)?,
                country: r.text_or(5, DEFAULT_COUNTRY),
                priority: r.parse(6, "Priority", Priority::Medium)?,
                source: r.parse(7, "Source", Source::ColdCall)?,
                status: r.parse(8, "Status", Status::NotContacted)?,
                assignee: r.text_or(9, self.actor),
                remarks: r.text(10),
                next_step: String::new(),
            })
        })
    }

    pub fn leads(&self, text: &str, sequence: &mut Sequence) -> Result<Vec<Lead>, FunnelError> {
        self.run(text, sequence, Section::Leads, |r, id| {
            Ok(Lead {
                id,
                owner: self.actor.to_string(),
                name: r.text(0),
                company_name: r.text(1),
                contact_name: r.text(2),
                contact_number: r.text(3),
                region: r.parse(4, "Region", Region::NorthAmerica)?,
                country: r.text_or(5, DEFAULT_COUNTRY),
                lead_type: r.parse(6, "Type", LeadType::Rfp)?,
                priority: r.parse(7, "Priority", Priority::Medium)?,
                source: r.parse(8, "Source", Source::WebResearch)?,
                status: r.parse(9, "Status", Status::NotContacted)?,
                assignee: r.text_or(10, self.actor),
                start_date: Some(r.date(11, "StartDate", self.today)?),
                value: r.number(12, "Value")?,
                notes: String::new(),
                next_step: String::new(),
                remarks_history: RemarkHistory::new(),
                closing_date: None,
                currency: Currency::Usd,
                expected_revenue: 0,
                tech_feasibility: Feasibility::Pending,
                implementation_feasibility: Feasibility::Pending,
                sales_feasibility: Feasibility::Pending,
                origin_sale: None,
            })
        })
    }

    pub fn opportunities(
        &self,
        text: &str,
        sequence: &mut Sequence,
    ) -> Result<Vec<Opportunity>, FunnelError> {
        let close = days_after(self.today, OPPORTUNITY_CLOSE_DAYS);
        self.run(text, sequence, Section::Opportunities, |r, id| {
            let stage = r.parse(5, "Stage", Stage::Qualification)?;
            let value = r.number(6, "Value")?;
            let (probability, expected_revenue) = forecast::forecast(stage, value);
            Ok(Opportunity {
                id,
                owner: self.actor.to_string(),
                name: r.text(0),
                account_name: r.text(1),
                sales_owner: r.text_or(2, self.actor),
                region: r.parse(3, "Region", Region::NorthAmerica)?,
                country: r.text_or(4, DEFAULT_COUNTRY),
                stage,
                value,
                expected_closing_date: r.date(7, "ExpClosingDate", close)?,
                lead_type: r.parse(8, "Type", LeadType::Rfp)?,
                source: r.parse(9, "Source", Source::WebResearch)?,
                probability,
                expected_revenue,
                contact_name: String::new(),
                contact_number: String::new(),
                next_step: String::new(),
                currency: Currency::Usd,
                remarks_history: RemarkHistory::new(),
                feasibility_status: Feasibility::Pending,
                presales_recommendation: Recommendation::Proceed,
                risks: String::new(),
                campaign_source: String::new(),
                technical_poc: String::new(),
                presales_poc: String::new(),
                partner: None,
                description: String::new(),
            })
        })
    }

    pub fn actions(&self, text: &str, sequence: &mut Sequence) -> Result<Vec<ActionItem>, FunnelError> {
        self.run(text, sequence, Section::Actions, |r, id| {
            Ok(ActionItem {
                id,
                owner: self.actor.to_string(),
                subject: r.text(0),
                assignee: r.text_or(1, self.actor),
                due_date: r.date(2, "DueDate", self.today)?,
                action_type: r.parse(3, "ActionType", ActionType::Lead)?,
                linked_record_id: RecordId::new(r.text(4)),
                region: r.parse(5, "Region", Region::NorthAmerica)?,
                priority: r.parse(6, "Priority", Priority::Medium)?,
                status: r.parse(7, "Status", ActionStatus::NotStarted)?,
                description: r.text(8),
                remarks: String::new(),
            })
        })
    }

    pub fn employees(&self, text: &str, sequence: &mut Sequence) -> Result<Vec<Employee>, FunnelError> {
        self.run(text, sequence, Section::Employees, |r, id| {
            Ok(Employee {
                id,
                name: r.text(0),
                email: r.text(1),
                role: r.parse(2, "Role", Role::PresalesConsultant)?,
                status: r.parse(3, "Status", EmployeeStatus::Active)?,
                regions: r.regions(4, "Regions")?,
            })
        })
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 14).expect("valid date")
    }

    fn strict() -> Ingestor<'static> {
        Ingestor::new("Thilakraj", today(), ImportMode::Strict)
    }

    fn lenient() -> Ingestor<'static> {
        Ingestor::new("Thilakraj", today(), ImportMode::Lenient)
    }

    #[test]
    fn sales_rows_map_positionally() {
        let text = "SaleDate,ClientName,ContactName,ContactNumber,Region,Country,Priority,Source,Status,Assignee,Remarks\n\
                    2026-09-30,Acme,Ravi,555-0101,Asia Pacific,India,High,Trade Show,Qualified,Seranjivi,\"Hot, very hot\"\n";
        let mut seq = Sequence::default();
        let sales = strict().sales(text, &mut seq).expect("import");
        assert_eq!(sales.len(), 1);
        let sale = &sales[0];
        assert_eq!(sale.id.as_str(), "SALE-1000");
        assert_eq!(sale.client_name, "Acme");
        assert_eq!(sale.region, Region::AsiaPacific);
        assert_eq!(sale.status, Status::Qualified);
        assert_eq!(sale.remarks, "Hot, very hot");
        assert_eq!(seq.peek(), 1001);
    }

    #[test]
    fn empty_cells_take_defaults_in_strict_mode() {
        let text = "header\n,Acme,,,,,,,,,\n";
        let mut seq = Sequence::default();
        let sales = strict().sales(text, &mut seq).expect("import");
        let sale = &sales[0];
        assert_eq!(sale.date, today());
        assert_eq!(sale.region, Region::NorthAmerica);
        assert_eq!(sale.country, DEFAULT_COUNTRY);
        assert_eq!(sale.source, Source::ColdCall);
        assert_eq!(sale.assignee, "Thilakraj");
    }

    #[test]
    fn strict_rejects_batch_and_keeps_sequence() {
        let text = "header\nok,Acme\n2026-01-01,Beta,,,Mars\n";
        let mut seq = Sequence::default();
        let err = strict().sales(text, &mut seq).expect_err("must fail");
        assert!(matches!(err, FunnelError::MalformedRow { line: 2, .. }));

        let text = "header\n2026-01-01,Beta,,,Mars\n";
        let err = strict().sales(text, &mut seq).expect_err("must fail");
        match err {
            FunnelError::MalformedRow { line, column, value } => {
                assert_eq!(line, 2);
                assert_eq!(column, "Region");
                assert_eq!(value, "Mars");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(seq.peek(), 1000);
    }

    #[test]
    fn lenient_defaults_bad_cells() {
        let text = "header\nyesterday,Beta,,,Mars,,Urgent,Billboard,Maybe\n";
        let mut seq = Sequence::default();
        let sales = lenient().sales(text, &mut seq).expect("import");
        let sale = &sales[0];
        assert_eq!(sale.date, today());
        assert_eq!(sale.region, Region::NorthAmerica);
        assert_eq!(sale.priority, Priority::Medium);
        assert_eq!(sale.status, Status::NotContacted);
    }

    #[test]
    fn export_header_skips_id_column() {
        let text = "\"ID\",\"Name\",\"Email\",\"Role\",\"Status\",\"Regions\"\n\
                    \"EMP-3\",\"Yashwanth\",\"y@sightspectrum.com\",\"Presales Consultant\",\"Active\",\"Europe;Middle East\"\n";
        let mut seq = Sequence::default();
        let employees = strict().employees(text, &mut seq).expect("import");
        assert_eq!(employees[0].id.as_str(), "EMP-1000");
        assert_eq!(employees[0].name, "Yashwanth");
        assert_eq!(employees[0].regions, vec![Region::Europe, Region::MiddleEast]);
    }

    #[test]
    fn employees_without_regions() {
        let text = "Name,Email,Role,Status,Regions\nAsha,a@x.com,Sales Head,Active,\n";
        let mut seq = Sequence::default();
        assert!(strict().employees(text, &mut seq).is_err());
        let kept = lenient().employees(text, &mut seq).expect("import");
        assert!(kept[0].regions.is_empty());
    }

    #[test]
    fn opportunities_get_forecast() {
        let text = "h\nPlatform,Acme,,Europe,Germany,Negotiation/Review,100000,2026-12-01,RFQ,Partner\n\
                    h2,Beta,,Europe,,Sideways,10,,,\n";
        let mut seq = Sequence::default();
        let opps = lenient().opportunities(text, &mut seq).expect("import");
        assert_eq!(opps[0].probability, 90);
        assert_eq!(opps[0].expected_revenue, 90_000);
        assert_eq!(opps[0].sales_owner, "Thilakraj");
        assert_eq!(opps[1].stage, Stage::Qualification);
        assert_eq!(opps[1].probability, 10);
        assert_eq!(opps[1].expected_closing_date, days_after(today(), 30));
    }

    #[test]
    fn header_only_imports_nothing() {
        let mut seq = Sequence::default();
        assert!(strict().leads("LeadName,CompanyName\n\n", &mut seq).expect("import").is_empty());
        assert!(strict().actions("", &mut seq).expect("import").is_empty());
    }
}
