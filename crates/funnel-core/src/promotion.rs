//! # Promotion Engine
//!
//! Synthesises the next-stage record when a submission qualifies:
//!
//! ```text
//! Sale (Qualified) -> Lead (In Feasibility Study)
//! Lead (Qualified) -> Opportunity (Qualification, same ID)
//! Opportunity (Closed Won) -> ActionItem (kickoff, High priority)
//! ```
//!
//! Promotion only ever adds downstream records; it never deletes or
//! reverts. Under `PromotionPolicy::Guarded` a source that already has a
//! downstream record is skipped. `Repeat` mints a new lead or kickoff on
//! every qualifying submission but keeps an existing opportunity as is.

use crate::clock::days_after;
use crate::primitives::{
    ACTION_DUE_DAYS, DELIVERY_GROUP, FEASIBILITY_NEXT_STEP, INITIAL_PROBABILITY, KICKOFF_REMARKS,
    PRESALES_GROUP, SOW_NEXT_STEP,
};
use crate::records::{ActionItem, Lead, Opportunity, RemarkEntry, RemarkHistory, Sale};
use crate::store::CrmState;
use crate::types::{
    ActionStatus, ActionType, Currency, Feasibility, LeadType, Priority, Recommendation, RecordId,
    Section, Stage, Status,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How a qualifying resubmission is treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromotionPolicy {
    /// Skip when a downstream record already references the source.
    #[default]
    Guarded,
    /// Promote on every qualifying submission.
    Repeat,
}

/// Actor, time and policy for one promotion check.
#[derive(Debug, Clone, Copy)]
pub struct PromotionContext<'a> {
    pub actor: &'a str,
    pub now: DateTime<Utc>,
    pub policy: PromotionPolicy,
}

/// A downstream record that was created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromotionOutcome {
    pub section: Section,
    pub id: RecordId,
    /// Notification text for the sink.
    pub message: String,
}

/// Stateless promotion rules.
pub struct PromotionEngine;

impl PromotionEngine {
    // ===== SYNTHESIS =====

    /// The lead created for a qualified sale.
    #[must_use]
    pub fn lead_from_sale(sale: &Sale, id: RecordId, ctx: &PromotionContext<'_>) -> Lead {
        Lead {
            id,
            owner: ctx.actor.to_string(),
            assignee: PRESALES_GROUP.to_string(),
            name: format!("Lead for {}", sale.client_name),
            notes: sale.remarks.clone(),
            company_name: sale.client_name.clone(),
            contact_name: sale.contact_name.clone(),
            contact_number: sale.contact_number.clone(),
            region: sale.region,
            country: sale.country.clone(),
            lead_type: LeadType::Rfp,
            priority: sale.priority,
            next_step: FEASIBILITY_NEXT_STEP.to_string(),
            source: sale.source,
            status: Status::InFeasibilityStudy,
            remarks_history: RemarkHistory::with_entry(RemarkEntry {
                text: sale.remarks.clone(),
                timestamp: ctx.now,
                author: ctx.actor.to_string(),
            }),
            start_date: Some(ctx.now.date_naive()),
            closing_date: None,
            currency: Currency::Usd,
            value: 0,
            expected_revenue: 0,
            tech_feasibility: Feasibility::Pending,
            implementation_feasibility: Feasibility::Pending,
            sales_feasibility: Feasibility::Pending,
            origin_sale: Some(sale.id.clone()),
        }
    }

    /// The opportunity created for a qualified lead. It keeps the lead's ID.
    #[must_use]
    pub fn opportunity_from_lead(lead: &Lead, ctx: &PromotionContext<'_>) -> Opportunity {
        let next_step = if lead.next_step.trim().is_empty() {
            SOW_NEXT_STEP.to_string()
        } else {
            lead.next_step.clone()
        };
        Opportunity {
            id: lead.id.clone(),
            owner: ctx.actor.to_string(),
            name: lead.name.clone(),
            account_name: lead.company_name.clone(),
            contact_name: lead.contact_name.clone(),
            contact_number: lead.contact_number.clone(),
            region: lead.region,
            country: lead.country.clone(),
            lead_type: lead.lead_type,
            source: lead.source,
            next_step,
            currency: lead.currency,
            value: lead.value,
            expected_closing_date: lead.closing_date.unwrap_or_else(|| ctx.now.date_naive()),
            stage: Stage::Qualification,
            remarks_history: lead.remarks_history.clone(),
            probability: INITIAL_PROBABILITY,
            feasibility_status: lead.tech_feasibility,
            presales_recommendation: Recommendation::Proceed,
            risks: String::new(),
            expected_revenue: lead.expected_revenue,
            campaign_source: String::new(),
            sales_owner: ctx.actor.to_string(),
            technical_poc: String::new(),
            presales_poc: String::new(),
            partner: None,
            description: lead.notes.clone(),
        }
    }

    /// The delivery kickoff task for a won opportunity.
    #[must_use]
    pub fn action_from_opportunity(
        opp: &Opportunity,
        id: RecordId,
        ctx: &PromotionContext<'_>,
    ) -> ActionItem {
        ActionItem {
            id,
            owner: ctx.actor.to_string(),
            assignee: DELIVERY_GROUP.to_string(),
            subject: format!("Implementation Kickoff for {}", opp.account_name),
            due_date: days_after(ctx.now.date_naive(), ACTION_DUE_DAYS),
            action_type: ActionType::Opportunity,
            linked_record_id: opp.id.clone(),
            region: opp.region,
            priority: Priority::High,
            status: ActionStatus::NotStarted,
            remarks: KICKOFF_REMARKS.to_string(),
            description: format!("Kickoff implementation and resource planning for {}", opp.name),
        }
    }

    // ===== STATE TRANSITIONS =====

    /// Promote a submitted sale if it is qualified.
    pub fn promote_sale(
        state: &mut CrmState,
        sale: &Sale,
        ctx: &PromotionContext<'_>,
    ) -> Option<PromotionOutcome> {
        if sale.status != Status::Qualified {
            return None;
        }
        let promoted = state
            .leads
            .iter()
            .any(|l| l.origin_sale.as_ref() == Some(&sale.id));
        if promoted && ctx.policy == PromotionPolicy::Guarded {
            tracing::debug!(sale = %sale.id, "sale already promoted, skipping");
            return None;
        }

        let id = state.sequence.mint(Section::Leads);
        let lead = Self::lead_from_sale(sale, id.clone(), ctx);
        state.leads.upsert(lead);
        tracing::info!(sale = %sale.id, lead = %id, "promoted sale to lead");

        Some(PromotionOutcome {
            section: Section::Leads,
            id,
            message: "Sale qualified. Shared with Presales Team for Feasibility Study.".to_string(),
        })
    }

    /// Promote a submitted lead if it is qualified.
    ///
    /// The opportunity shares the lead's ID, so an existing one is never
    /// overwritten, whatever the policy.
    pub fn promote_lead(
        state: &mut CrmState,
        lead: &Lead,
        ctx: &PromotionContext<'_>,
    ) -> Option<PromotionOutcome> {
        if lead.status != Status::Qualified {
            return None;
        }
        if state.opportunities.contains(&lead.id) {
            tracing::debug!(lead = %lead.id, policy = ?ctx.policy, "lead already promoted, skipping");
            return None;
        }

        let opp = Self::opportunity_from_lead(lead, ctx);
        state.opportunities.upsert(opp);
        tracing::info!(lead = %lead.id, "promoted lead to opportunity");

        Some(PromotionOutcome {
            section: Section::Opportunities,
            id: lead.id.clone(),
            message: format!(
                "Lead Qualified for Opportunity. Lead ID {} promoted.",
                lead.id
            ),
        })
    }

    /// Create the kickoff task for a submitted opportunity if it is won.
    pub fn promote_opportunity(
        state: &mut CrmState,
        opp: &Opportunity,
        ctx: &PromotionContext<'_>,
    ) -> Option<PromotionOutcome> {
        if opp.stage != Stage::ClosedWon {
            return None;
        }
        let kicked_off = state.actions.iter().any(|a| {
            a.action_type == ActionType::Opportunity && a.linked_record_id == opp.id
        });
        if kicked_off && ctx.policy == PromotionPolicy::Guarded {
            tracing::debug!(opportunity = %opp.id, "kickoff already exists, skipping");
            return None;
        }

        let id = state.sequence.mint(Section::Actions);
        let action = Self::action_from_opportunity(opp, id.clone(), ctx);
        state.actions.upsert(action);
        tracing::info!(opportunity = %opp.id, action = %id, "created kickoff action");

        Some(PromotionOutcome {
            section: Section::Actions,
            id,
            message: "Opportunity Closed Won. Project kickoff task assigned to Delivery Managers."
                .to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forecast;
    use crate::types::{Region, Source};
    use chrono::{NaiveDate, TimeZone};

    fn ctx(policy: PromotionPolicy) -> PromotionContext<'static> {
        PromotionContext {
            actor: "Seranjivi",
            now: Utc
                .with_ymd_and_hms(2026, 10, 14, 12, 0, 0)
                .single()
                .expect("valid timestamp"),
            policy,
        }
    }

    fn sale(status: Status) -> Sale {
        Sale {
            id: RecordId::new("SALE-1000"),
            owner: "Seranjivi".to_string(),
            assignee: "Seranjivi".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 10, 1).expect("valid date"),
            client_name: "Acme".to_string(),
            contact_name: "Ravi".to_string(),
            contact_number: "555-0101".to_string(),
            region: Region::AsiaPacific,
            country: "India".to_string(),
            priority: Priority::High,
            next_step: String::new(),
            source: Source::TradeShow,
            status,
            remarks: "Met at expo".to_string(),
        }
    }

    #[test]
    fn unqualified_sale_is_not_promoted() {
        let mut state = CrmState::default();
        let outcome = PromotionEngine::promote_sale(
            &mut state,
            &sale(Status::Contacted),
            &ctx(PromotionPolicy::Guarded),
        );
        assert!(outcome.is_none());
        assert!(state.leads.is_empty());
    }

    #[test]
    fn qualified_sale_becomes_lead() {
        let mut state = CrmState::default();
        let c = ctx(PromotionPolicy::Guarded);
        let outcome =
            PromotionEngine::promote_sale(&mut state, &sale(Status::Qualified), &c).expect("promoted");
        assert_eq!(outcome.section, Section::Leads);

        let lead = state.leads.get(&outcome.id).expect("lead exists");
        assert_eq!(lead.id.as_str(), "LD-1000");
        assert_eq!(lead.name, "Lead for Acme");
        assert_eq!(lead.company_name, "Acme");
        assert_eq!(lead.assignee, PRESALES_GROUP);
        assert_eq!(lead.status, Status::InFeasibilityStudy);
        assert_eq!(lead.remarks_history.len(), 1);
        assert_eq!(
            lead.remarks_history.latest().map(|e| e.text.as_str()),
            Some("Met at expo")
        );
        assert_eq!(lead.start_date, Some(c.now.date_naive()));
        assert_eq!(lead.origin_sale.as_ref().map(RecordId::as_str), Some("SALE-1000"));
    }

    #[test]
    fn guarded_sale_promotes_once_repeat_twice() {
        let qualified = sale(Status::Qualified);

        let mut guarded = CrmState::default();
        let c = ctx(PromotionPolicy::Guarded);
        assert!(PromotionEngine::promote_sale(&mut guarded, &qualified, &c).is_some());
        assert!(PromotionEngine::promote_sale(&mut guarded, &qualified, &c).is_none());
        assert_eq!(guarded.leads.len(), 1);

        let mut repeat = CrmState::default();
        let c = ctx(PromotionPolicy::Repeat);
        assert!(PromotionEngine::promote_sale(&mut repeat, &qualified, &c).is_some());
        assert!(PromotionEngine::promote_sale(&mut repeat, &qualified, &c).is_some());
        assert_eq!(repeat.leads.len(), 2);
    }

    #[test]
    fn lead_promotion_reuses_id_and_history() {
        let mut state = CrmState::default();
        let c = ctx(PromotionPolicy::Guarded);
        let mut lead = PromotionEngine::lead_from_sale(&sale(Status::Qualified), RecordId::new("LD-7"), &c);
        lead.status = Status::Qualified;
        lead.next_step = String::new();

        let outcome = PromotionEngine::promote_lead(&mut state, &lead, &c).expect("promoted");
        assert_eq!(outcome.message, "Lead Qualified for Opportunity. Lead ID LD-7 promoted.");

        let opp = state.opportunities.get(&lead.id).expect("opportunity exists");
        assert_eq!(opp.remarks_history, lead.remarks_history);
        assert_eq!(opp.next_step, SOW_NEXT_STEP);
        assert_eq!(opp.expected_closing_date, c.now.date_naive());
        assert_eq!(opp.probability, forecast::probability(Stage::Qualification));
        assert_eq!(opp.sales_owner, "Seranjivi");
    }

    #[test]
    fn repeat_lead_promotion_keeps_existing_opportunity() {
        let mut state = CrmState::default();
        let c = ctx(PromotionPolicy::Repeat);
        let mut lead = PromotionEngine::lead_from_sale(&sale(Status::Qualified), RecordId::new("LD-7"), &c);
        lead.status = Status::Qualified;
        assert!(PromotionEngine::promote_lead(&mut state, &lead, &c).is_some());

        let mut advanced = state.opportunities.get(&lead.id).expect("opportunity").clone();
        advanced.stage = Stage::NegotiationReview;
        advanced.value = 100_000;
        advanced.probability = forecast::probability(Stage::NegotiationReview);
        advanced.expected_revenue = forecast::expected_revenue(100_000, advanced.probability);
        state.opportunities.upsert(advanced.clone());

        assert!(PromotionEngine::promote_lead(&mut state, &lead, &c).is_none());
        assert_eq!(state.opportunities.len(), 1);
        assert_eq!(state.opportunities.get(&lead.id), Some(&advanced));
    }

    #[test]
    fn won_opportunity_gets_kickoff() {
        let mut state = CrmState::default();
        let c = ctx(PromotionPolicy::Guarded);
        let lead = PromotionEngine::lead_from_sale(&sale(Status::Qualified), RecordId::new("LD-7"), &c);
        let mut opp = PromotionEngine::opportunity_from_lead(&lead, &c);
        opp.stage = Stage::ClosedWon;

        let outcome = PromotionEngine::promote_opportunity(&mut state, &opp, &c).expect("promoted");
        let action = state.actions.get(&outcome.id).expect("action exists");
        assert_eq!(action.priority, Priority::High);
        assert_eq!(action.linked_record_id, opp.id);
        assert_eq!(action.subject, "Implementation Kickoff for Acme");
        assert_eq!(action.due_date, days_after(c.now.date_naive(), 5));
        assert_eq!(action.assignee, DELIVERY_GROUP);

        assert!(PromotionEngine::promote_opportunity(&mut state, &opp, &c).is_none());
        assert_eq!(state.actions.len(), 1);
    }
}
