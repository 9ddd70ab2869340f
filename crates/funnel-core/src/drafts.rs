//! # Drafts
//!
//! Partially filled records awaiting validation, one builder per kind.
//!
//! A draft accumulates optional fields (from a form, a JSON body or an
//! existing record) and turns into a typed record with `build`:
//!
//! - Mandatory fields are checked first. A blank string counts as missing.
//! - A `ValidationError` lists every missing field, in form order.
//! - A new ID is minted only after validation succeeds.
//! - A pending remark is appended to the remark history; existing entries
//!   are never rewritten.
//!
//! Drafts deserialize from camelCase JSON with every field optional.

use crate::clock::days_after;
use crate::forecast;
use crate::primitives::{DEFAULT_COUNTRY, OPPORTUNITY_CLOSE_DAYS};
use crate::records::{
    ActionItem, Employee, Lead, Opportunity, Partner, RemarkEntry, RemarkHistory, Sale,
};
use crate::types::{
    ActionStatus, ActionType, Currency, EmployeeStatus, Feasibility, LeadType, Priority,
    FunnelError, Recommendation, RecordId, Region, Role, Section, Source, Stage, Status,
    ValidationError,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Who is building, and when.
#[derive(Debug, Clone, Copy)]
pub struct DraftContext<'a> {
    pub actor: &'a str,
    pub now: DateTime<Utc>,
}

impl<'a> DraftContext<'a> {
    #[must_use]
    pub fn new(actor: &'a str, now: DateTime<Utc>) -> Self {
        Self { actor, now }
    }

    #[must_use]
    pub fn today(&self) -> NaiveDate {
        self.now.date_naive()
    }

    fn remark(&self, text: String) -> RemarkEntry {
        RemarkEntry {
            text,
            timestamp: self.now,
            author: self.actor.to_string(),
        }
    }
}

// =============================================================================
// MANDATORY FIELD CHECKS
// =============================================================================

/// Collects missing field names while taking values out of a draft.
struct Required {
    section: Section,
    missing: Vec<&'static str>,
}

impl Required {
    fn new(section: Section) -> Self {
        Self {
            section,
            missing: Vec::new(),
        }
    }

    fn text(&mut self, name: &'static str, value: Option<String>) -> Option<String> {
        match value {
            Some(v) if !v.trim().is_empty() => Some(v),
            _ => {
                self.missing.push(name);
                None
            }
        }
    }

    fn value<T>(&mut self, name: &'static str, value: Option<T>) -> Option<T> {
        if value.is_none() {
            self.missing.push(name);
        }
        value
    }

    fn error(self) -> ValidationError {
        ValidationError {
            section: self.section,
            missing: self.missing,
        }
    }
}

fn append_pending(history: &mut RemarkHistory, pending: Option<String>, ctx: &DraftContext<'_>) {
    if let Some(text) = pending.filter(|t| !t.trim().is_empty()) {
        history.push(ctx.remark(text));
    }
}

/// Draft keys a patch may not set. History grows only through
/// `pendingRemark`; the origin sale is fixed when the lead is promoted.
const PROTECTED_FIELDS: [&str; 2] = ["remarksHistory", "originSale"];

/// Apply the fields present in a JSON object over `base`.
///
/// Keys absent from `patch` keep the base value; an explicit `null` clears it.
/// Protected keys in `patch` are ignored.
pub fn overlay<D>(base: D, patch: serde_json::Value) -> Result<D, FunnelError>
where
    D: Serialize + DeserializeOwned,
{
    let serde_json::Value::Object(mut fields) = patch else {
        return Err(FunnelError::SerializationError(
            "Draft must be a JSON object".to_string(),
        ));
    };
    let mut merged =
        serde_json::to_value(base).map_err(|e| FunnelError::SerializationError(e.to_string()))?;
    for key in PROTECTED_FIELDS {
        if fields.remove(key).is_some() {
            tracing::debug!(field = key, "ignoring protected draft field");
        }
    }
    if let serde_json::Value::Object(target) = &mut merged {
        target.extend(fields);
    }
    serde_json::from_value(merged).map_err(|e| FunnelError::SerializationError(e.to_string()))
}

// =============================================================================
// SALE
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SaleDraft {
    pub id: Option<RecordId>,
    pub owner: Option<String>,
    pub assignee: Option<String>,
    pub date: Option<NaiveDate>,
    pub client_name: Option<String>,
    pub contact_name: Option<String>,
    pub contact_number: Option<String>,
    pub region: Option<Region>,
    pub country: Option<String>,
    pub priority: Option<Priority>,
    pub next_step: Option<String>,
    pub source: Option<Source>,
    pub status: Option<Status>,
    pub remarks: Option<String>,
}

impl SaleDraft {
    /// A blank form with the new-record defaults.
    #[must_use]
    pub fn for_new(ctx: &DraftContext<'_>) -> Self {
        Self {
            owner: Some(ctx.actor.to_string()),
            assignee: Some(ctx.actor.to_string()),
            date: Some(ctx.today()),
            priority: Some(Priority::Medium),
            source: Some(Source::ColdCall),
            status: Some(Status::NotContacted),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn from_record(sale: &Sale) -> Self {
        let sale = sale.clone();
        Self {
            id: Some(sale.id),
            owner: Some(sale.owner),
            assignee: Some(sale.assignee),
            date: Some(sale.date),
            client_name: Some(sale.client_name),
            contact_name: Some(sale.contact_name),
            contact_number: Some(sale.contact_number),
            region: Some(sale.region),
            country: Some(sale.country),
            priority: Some(sale.priority),
            next_step: Some(sale.next_step),
            source: Some(sale.source),
            status: Some(sale.status),
            remarks: Some(sale.remarks),
        }
    }

    pub fn build(
        self,
        ctx: &DraftContext<'_>,
        mint: impl FnOnce() -> RecordId,
    ) -> Result<Sale, ValidationError> {
        let mut req = Required::new(Section::Sales);
        let assignee = req.text("assignee", self.assignee);
        let client_name = req.text("client_name", self.client_name);
        let date = req.value("date", self.date);
        let contact_name = req.text("contact_name", self.contact_name);
        let contact_number = req.text("contact_number", self.contact_number);
        let region = req.value("region", self.region);
        let status = req.value("status", self.status);

        let (
            Some(assignee),
            Some(client_name),
            Some(date),
            Some(contact_name),
            Some(contact_number),
            Some(region),
            Some(status),
        ) = (
            assignee,
            client_name,
            date,
            contact_name,
            contact_number,
            region,
            status,
        )
        else {
            return Err(req.error());
        };

        Ok(Sale {
            id: self.id.unwrap_or_else(mint),
            owner: self.owner.unwrap_or_else(|| ctx.actor.to_string()),
            assignee,
            date,
            client_name,
            contact_name,
            contact_number,
            region,
            country: self.country.unwrap_or_default(),
            priority: self.priority.unwrap_or(Priority::Medium),
            next_step: self.next_step.unwrap_or_default(),
            source: self.source.unwrap_or(Source::ColdCall),
            status,
            remarks: self.remarks.unwrap_or_default(),
        })
    }
}

// =============================================================================
// LEAD
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LeadDraft {
    pub id: Option<RecordId>,
    pub owner: Option<String>,
    pub assignee: Option<String>,
    pub name: Option<String>,
    pub notes: Option<String>,
    pub company_name: Option<String>,
    pub contact_name: Option<String>,
    pub contact_number: Option<String>,
    pub region: Option<Region>,
    pub country: Option<String>,
    pub lead_type: Option<LeadType>,
    pub priority: Option<Priority>,
    pub next_step: Option<String>,
    pub source: Option<Source>,
    pub status: Option<Status>,
    pub remarks_history: Option<RemarkHistory>,
    /// Appended to the history on build.
    pub pending_remark: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub closing_date: Option<NaiveDate>,
    pub currency: Option<Currency>,
    pub value: Option<i64>,
    pub expected_revenue: Option<i64>,
    pub tech_feasibility: Option<Feasibility>,
    pub implementation_feasibility: Option<Feasibility>,
    pub sales_feasibility: Option<Feasibility>,
    pub origin_sale: Option<RecordId>,
}

impl LeadDraft {
    #[must_use]
    pub fn for_new(ctx: &DraftContext<'_>) -> Self {
        Self {
            owner: Some(ctx.actor.to_string()),
            status: Some(Status::NotContacted),
            lead_type: Some(LeadType::Rfp),
            source: Some(Source::Advertisement),
            priority: Some(Priority::Medium),
            country: Some(DEFAULT_COUNTRY.to_string()),
            currency: Some(Currency::Usd),
            start_date: Some(ctx.today()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn from_record(lead: &Lead) -> Self {
        let lead = lead.clone();
        Self {
            id: Some(lead.id),
            owner: Some(lead.owner),
            assignee: Some(lead.assignee),
            name: Some(lead.name),
            notes: Some(lead.notes),
            company_name: Some(lead.company_name),
            contact_name: Some(lead.contact_name),
            contact_number: Some(lead.contact_number),
            region: Some(lead.region),
            country: Some(lead.country),
            lead_type: Some(lead.lead_type),
            priority: Some(lead.priority),
            next_step: Some(lead.next_step),
            source: Some(lead.source),
            status: Some(lead.status),
            remarks_history: Some(lead.remarks_history),
            pending_remark: None,
            start_date: lead.start_date,
            closing_date: lead.closing_date,
            currency: Some(lead.currency),
            value: Some(lead.value),
            expected_revenue: Some(lead.expected_revenue),
            tech_feasibility: Some(lead.tech_feasibility),
            implementation_feasibility: Some(lead.implementation_feasibility),
            sales_feasibility: Some(lead.sales_feasibility),
            origin_sale: lead.origin_sale,
        }
    }

    pub fn build(
        self,
        ctx: &DraftContext<'_>,
        mint: impl FnOnce() -> RecordId,
    ) -> Result<Lead, ValidationError> {
        let mut req = Required::new(Section::Leads);
        let assignee = req.text("assignee", self.assignee);
        let name = req.text("name", self.name);
        let company_name = req.text("company_name", self.company_name);
        let contact_name = req.text("contact_name", self.contact_name);
        let contact_number = req.text("contact_number", self.contact_number);
        let region = req.value("region", self.region);
        let country = req.text("country", self.country);
        let lead_type = req.value("lead_type", self.lead_type);
        let priority = req.value("priority", self.priority);
        let source = req.value("source", self.source);
        let status = req.value("status", self.status);

        let (
            Some(assignee),
            Some(name),
            Some(company_name),
            Some(contact_name),
            Some(contact_number),
            Some(region),
            Some(country),
            Some(lead_type),
            Some(priority),
            Some(source),
            Some(status),
        ) = (
            assignee,
            name,
            company_name,
            contact_name,
            contact_number,
            region,
            country,
            lead_type,
            priority,
            source,
            status,
        )
        else {
            return Err(req.error());
        };

        let mut remarks_history = self.remarks_history.unwrap_or_default();
        append_pending(&mut remarks_history, self.pending_remark, ctx);

        Ok(Lead {
            id: self.id.unwrap_or_else(mint),
            owner: self.owner.unwrap_or_else(|| ctx.actor.to_string()),
            assignee,
            name,
            notes: self.notes.unwrap_or_default(),
            company_name,
            contact_name,
            contact_number,
            region,
            country,
            lead_type,
            priority,
            next_step: self.next_step.unwrap_or_default(),
            source,
            status,
            remarks_history,
            start_date: self.start_date,
            closing_date: self.closing_date,
            currency: self.currency.unwrap_or_default(),
            value: self.value.unwrap_or(0),
            expected_revenue: self.expected_revenue.unwrap_or(0),
            tech_feasibility: self.tech_feasibility.unwrap_or_default(),
            implementation_feasibility: self.implementation_feasibility.unwrap_or_default(),
            sales_feasibility: self.sales_feasibility.unwrap_or_default(),
            origin_sale: self.origin_sale,
        })
    }
}

// =============================================================================
// OPPORTUNITY
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OpportunityDraft {
    pub id: Option<RecordId>,
    pub owner: Option<String>,
    pub name: Option<String>,
    pub account_name: Option<String>,
    pub contact_name: Option<String>,
    pub contact_number: Option<String>,
    pub region: Option<Region>,
    pub country: Option<String>,
    pub lead_type: Option<LeadType>,
    pub source: Option<Source>,
    pub next_step: Option<String>,
    pub currency: Option<Currency>,
    pub value: Option<i64>,
    pub expected_closing_date: Option<NaiveDate>,
    pub stage: Option<Stage>,
    pub remarks_history: Option<RemarkHistory>,
    pub pending_remark: Option<String>,
    /// Derived from `stage`; overwritten on build.
    pub probability: Option<i64>,
    pub feasibility_status: Option<Feasibility>,
    pub presales_recommendation: Option<Recommendation>,
    pub risks: Option<String>,
    /// Derived from `stage` and `value`; overwritten on build.
    pub expected_revenue: Option<i64>,
    pub campaign_source: Option<String>,
    pub sales_owner: Option<String>,
    pub technical_poc: Option<String>,
    pub presales_poc: Option<String>,
    pub partner: Option<Partner>,
    pub description: Option<String>,
}

impl OpportunityDraft {
    #[must_use]
    pub fn for_new(ctx: &DraftContext<'_>) -> Self {
        let mut draft = Self {
            owner: Some(ctx.actor.to_string()),
            sales_owner: Some(ctx.actor.to_string()),
            lead_type: Some(LeadType::Rfp),
            source: Some(Source::WebResearch),
            currency: Some(Currency::Usd),
            feasibility_status: Some(Feasibility::Pending),
            presales_recommendation: Some(Recommendation::Proceed),
            expected_closing_date: Some(days_after(ctx.today(), OPPORTUNITY_CLOSE_DAYS)),
            ..Self::default()
        };
        draft.set_stage(Stage::Qualification);
        draft
    }

    #[must_use]
    pub fn from_record(opp: &Opportunity) -> Self {
        let opp = opp.clone();
        Self {
            id: Some(opp.id),
            owner: Some(opp.owner),
            name: Some(opp.name),
            account_name: Some(opp.account_name),
            contact_name: Some(opp.contact_name),
            contact_number: Some(opp.contact_number),
            region: Some(opp.region),
            country: Some(opp.country),
            lead_type: Some(opp.lead_type),
            source: Some(opp.source),
            next_step: Some(opp.next_step),
            currency: Some(opp.currency),
            value: Some(opp.value),
            expected_closing_date: Some(opp.expected_closing_date),
            stage: Some(opp.stage),
            remarks_history: Some(opp.remarks_history),
            pending_remark: None,
            probability: Some(opp.probability),
            feasibility_status: Some(opp.feasibility_status),
            presales_recommendation: Some(opp.presales_recommendation),
            risks: Some(opp.risks),
            expected_revenue: Some(opp.expected_revenue),
            campaign_source: Some(opp.campaign_source),
            sales_owner: Some(opp.sales_owner),
            technical_poc: Some(opp.technical_poc),
            presales_poc: Some(opp.presales_poc),
            partner: opp.partner,
            description: Some(opp.description),
        }
    }

    /// Set the stage and refresh the forecast.
    pub fn set_stage(&mut self, stage: Stage) {
        self.stage = Some(stage);
        self.recompute();
    }

    /// Set the value and refresh the forecast.
    pub fn set_value(&mut self, value: i64) {
        self.value = Some(value);
        self.recompute();
    }

    fn recompute(&mut self) {
        if let Some(stage) = self.stage {
            let (probability, expected) = forecast::forecast(stage, self.value.unwrap_or(0));
            self.probability = Some(probability);
            self.expected_revenue = Some(expected);
        }
    }

    pub fn build(
        mut self,
        ctx: &DraftContext<'_>,
        mint: impl FnOnce() -> RecordId,
    ) -> Result<Opportunity, ValidationError> {
        self.recompute();

        let mut req = Required::new(Section::Opportunities);
        let name = req.text("name", self.name);
        let account_name = req.text("account_name", self.account_name);
        let region = req.value("region", self.region);
        let country = req.text("country", self.country);
        let lead_type = req.value("lead_type", self.lead_type);
        let source = req.value("source", self.source);
        let expected_closing_date = req.value("expected_closing_date", self.expected_closing_date);
        let stage = req.value("stage", self.stage);
        let sales_owner = req.text("sales_owner", self.sales_owner);

        let (
            Some(name),
            Some(account_name),
            Some(region),
            Some(country),
            Some(lead_type),
            Some(source),
            Some(expected_closing_date),
            Some(stage),
            Some(sales_owner),
        ) = (
            name,
            account_name,
            region,
            country,
            lead_type,
            source,
            expected_closing_date,
            stage,
            sales_owner,
        )
        else {
            return Err(req.error());
        };

        let mut remarks_history = self.remarks_history.unwrap_or_default();
        append_pending(&mut remarks_history, self.pending_remark, ctx);

        Ok(Opportunity {
            id: self.id.unwrap_or_else(mint),
            owner: self.owner.unwrap_or_else(|| ctx.actor.to_string()),
            name,
            account_name,
            contact_name: self.contact_name.unwrap_or_default(),
            contact_number: self.contact_number.unwrap_or_default(),
            region,
            country,
            lead_type,
            source,
            next_step: self.next_step.unwrap_or_default(),
            currency: self.currency.unwrap_or_default(),
            value: self.value.unwrap_or(0),
            expected_closing_date,
            stage,
            remarks_history,
            probability: forecast::probability(stage),
            feasibility_status: self.feasibility_status.unwrap_or_default(),
            presales_recommendation: self.presales_recommendation.unwrap_or_default(),
            risks: self.risks.unwrap_or_default(),
            expected_revenue: self.expected_revenue.unwrap_or(0),
            campaign_source: self.campaign_source.unwrap_or_default(),
            sales_owner,
            technical_poc: self.technical_poc.unwrap_or_default(),
            presales_poc: self.presales_poc.unwrap_or_default(),
            partner: self.partner,
            description: self.description.unwrap_or_default(),
        })
    }
}

// =============================================================================
// ACTION ITEM
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ActionItemDraft {
    pub id: Option<RecordId>,
    pub owner: Option<String>,
    pub assignee: Option<String>,
    pub subject: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub action_type: Option<ActionType>,
    pub linked_record_id: Option<RecordId>,
    pub region: Option<Region>,
    pub priority: Option<Priority>,
    pub status: Option<ActionStatus>,
    pub remarks: Option<String>,
    pub description: Option<String>,
}

impl ActionItemDraft {
    #[must_use]
    pub fn for_new(ctx: &DraftContext<'_>) -> Self {
        Self {
            owner: Some(ctx.actor.to_string()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn from_record(item: &ActionItem) -> Self {
        let item = item.clone();
        Self {
            id: Some(item.id),
            owner: Some(item.owner),
            assignee: Some(item.assignee),
            subject: Some(item.subject),
            due_date: Some(item.due_date),
            action_type: Some(item.action_type),
            linked_record_id: Some(item.linked_record_id),
            region: Some(item.region),
            priority: Some(item.priority),
            status: Some(item.status),
            remarks: Some(item.remarks),
            description: Some(item.description),
        }
    }

    pub fn build(
        self,
        ctx: &DraftContext<'_>,
        mint: impl FnOnce() -> RecordId,
    ) -> Result<ActionItem, ValidationError> {
        let mut req = Required::new(Section::Actions);
        let assignee = req.text("assignee", self.assignee);
        let subject = req.text("subject", self.subject);
        let due_date = req.value("due_date", self.due_date);
        let action_type = req.value("action_type", self.action_type);
        let linked_record_id = req
            .text("linked_record_id", self.linked_record_id.map(|id| id.0))
            .map(RecordId);
        let region = req.value("region", self.region);
        let priority = req.value("priority", self.priority);
        let status = req.value("status", self.status);

        let (
            Some(assignee),
            Some(subject),
            Some(due_date),
            Some(action_type),
            Some(linked_record_id),
            Some(region),
            Some(priority),
            Some(status),
        ) = (
            assignee,
            subject,
            due_date,
            action_type,
            linked_record_id,
            region,
            priority,
            status,
        )
        else {
            return Err(req.error());
        };

        Ok(ActionItem {
            id: self.id.unwrap_or_else(mint),
            owner: self.owner.unwrap_or_else(|| ctx.actor.to_string()),
            assignee,
            subject,
            due_date,
            action_type,
            linked_record_id,
            region,
            priority,
            status,
            remarks: self.remarks.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
        })
    }
}

// =============================================================================
// EMPLOYEE
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EmployeeDraft {
    pub id: Option<RecordId>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub status: Option<EmployeeStatus>,
    pub regions: Option<Vec<Region>>,
}

impl EmployeeDraft {
    #[must_use]
    pub fn from_record(employee: &Employee) -> Self {
        let employee = employee.clone();
        Self {
            id: Some(employee.id),
            name: Some(employee.name),
            email: Some(employee.email),
            role: Some(employee.role),
            status: Some(employee.status),
            regions: Some(employee.regions),
        }
    }

    pub fn build(self, mint: impl FnOnce() -> RecordId) -> Result<Employee, ValidationError> {
        let mut req = Required::new(Section::Employees);
        let name = req.text("name", self.name);
        let email = req.text("email", self.email);
        let role = req.value("role", self.role);
        let status = req.value("status", self.status);
        let regions = req.value("regions", self.regions.filter(|r| !r.is_empty()));

        let (Some(name), Some(email), Some(role), Some(status), Some(mut regions)) =
            (name, email, role, status, regions)
        else {
            return Err(req.error());
        };
        regions.sort();
        regions.dedup();

        Ok(Employee {
            id: self.id.unwrap_or_else(mint),
            name,
            email,
            role,
            status,
            regions,
        })
    }
}
