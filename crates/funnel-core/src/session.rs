//! # Session Module
//!
//! The application-state context every operation goes through.
//!
//! A `Session` owns:
//! - The loaded `CrmState` and the store it is saved to
//! - The actor identity (a reference to a directory employee)
//! - The current section
//! - The notification sink (volatile, never saved)
//! - The injected clock
//!
//! Every mutation is applied in memory, then the whole state is saved.
//! A failed save is returned to the caller; the in-memory change is kept.
//!
//! ## Storage Backends
//!
//! Session works with any `StateStore`. `StorageBackend` picks one at run
//! time:
//! - `InMemory`: `MemoryStore` (volatile)
//! - `Persistent`: `RedbStore` (disk-backed, ACID)

use crate::access::{can_access, fallback_section};
use crate::clock::Clock;
use crate::drafts::{
    ActionItemDraft, DraftContext, EmployeeDraft, LeadDraft, OpportunityDraft, SaleDraft, overlay,
};
use crate::export::{Exportable, export_csv, export_file_name};
use crate::ingestor::{ImportMode, Ingestor};
use crate::notify::NotificationSink;
use crate::primitives::FALLBACK_ACTOR_NAME;
use crate::promotion::{PromotionContext, PromotionEngine, PromotionOutcome, PromotionPolicy};
use crate::records::{ActionItem, Employee, Lead, Opportunity, Record, Sale};
use crate::storage::{MemoryStore, RedbStore, StateStore};
use crate::store::{Collection, CrmState};
use crate::types::{ActionType, FunnelError, RecordId, Region, Role, Section};
use crate::visibility::{Regional, Searchable, filter, filter_employees};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

// =============================================================================
// STORAGE BACKEND
// =============================================================================

/// Storage backend for a Session.
#[derive(Debug)]
pub enum StorageBackend {
    /// In-memory documents (fast, volatile).
    InMemory(MemoryStore),
    /// Disk-backed documents using redb (ACID, persistent).
    Persistent(RedbStore),
}

impl Default for StorageBackend {
    fn default() -> Self {
        Self::InMemory(MemoryStore::new())
    }
}

impl StorageBackend {
    /// Open or create a redb database at `path`.
    pub fn redb(path: impl AsRef<Path>) -> Result<Self, FunnelError> {
        Ok(Self::Persistent(RedbStore::open(path)?))
    }

    #[must_use]
    pub fn is_persistent(&self) -> bool {
        matches!(self, Self::Persistent(_))
    }
}

impl StateStore for StorageBackend {
    fn load(&self) -> Result<CrmState, FunnelError> {
        match self {
            Self::InMemory(store) => store.load(),
            Self::Persistent(store) => store.load(),
        }
    }

    fn save(&mut self, state: &CrmState) -> Result<(), FunnelError> {
        match self {
            Self::InMemory(store) => store.save(state),
            Self::Persistent(store) => store.save(state),
        }
    }
}

// =============================================================================
// SETTINGS AND RESULTS
// =============================================================================

/// Behaviour switches fixed for the lifetime of a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSettings {
    pub import_mode: ImportMode,
    pub promotion: PromotionPolicy,
}

/// Result of one accepted submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub id: RecordId,
    /// An existing record with the same ID was replaced.
    pub replaced: bool,
    /// The downstream record created, if the submission qualified.
    pub promotion: Option<PromotionOutcome>,
}

/// CSV text ready to be written to disk or downloaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportFile {
    pub file_name: String,
    pub content: String,
    pub count: usize,
}

/// Snapshot of the session for status displays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub role: Role,
    pub actor: String,
    pub regions: Vec<Region>,
    pub section: Section,
    pub counts: Vec<(Section, usize)>,
}

// =============================================================================
// SESSION
// =============================================================================

/// A single-actor CRM session over a `StateStore`.
#[derive(Debug)]
pub struct Session<S: StateStore = StorageBackend> {
    state: CrmState,
    store: S,
    identity: Option<RecordId>,
    section: Section,
    notifications: NotificationSink,
    clock: Arc<dyn Clock>,
    settings: SessionSettings,
}

impl<S: StateStore> Session<S> {
    /// Load the state from `store` and resolve the actor.
    pub fn open(store: S, clock: Arc<dyn Clock>, settings: SessionSettings) -> Result<Self, FunnelError> {
        let state = store.load()?;
        tracing::debug!(
            sales = state.sales.len(),
            leads = state.leads.len(),
            opportunities = state.opportunities.len(),
            actions = state.actions.len(),
            employees = state.employees.len(),
            "loaded state"
        );
        let section = fallback_section(Section::Sales, state.role);
        let mut session = Self {
            state,
            store,
            identity: None,
            section,
            notifications: NotificationSink::new(),
            clock,
            settings,
        };
        session.resolve_identity();
        Ok(session)
    }

    // ===== ACCESSORS =====

    #[must_use]
    pub fn state(&self) -> &CrmState {
        &self.state
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    #[must_use]
    pub fn settings(&self) -> SessionSettings {
        self.settings
    }

    #[must_use]
    pub fn role(&self) -> Role {
        self.state.role
    }

    #[must_use]
    pub fn section(&self) -> Section {
        self.section
    }

    #[must_use]
    pub fn notifications(&self) -> &NotificationSink {
        &self.notifications
    }

    /// The employee acting in this session, if the directory has one.
    #[must_use]
    pub fn identity(&self) -> Option<&Employee> {
        self.identity
            .as_ref()
            .and_then(|id| self.state.employees.get(id))
    }

    #[must_use]
    pub fn actor_name(&self) -> &str {
        self.identity()
            .map(|e| e.name.as_str())
            .unwrap_or(FALLBACK_ACTOR_NAME)
    }

    #[must_use]
    pub fn actor_regions(&self) -> &[Region] {
        self.identity().map(|e| e.regions.as_slice()).unwrap_or(&[])
    }

    #[must_use]
    pub fn summary(&self) -> Summary {
        Summary {
            role: self.role(),
            actor: self.actor_name().to_string(),
            regions: self.actor_regions().to_vec(),
            section: self.section,
            counts: Section::ALL
                .into_iter()
                .map(|s| (s, self.state.count(s)))
                .collect(),
        }
    }

    // ===== IDENTITY AND NAVIGATION =====

    /// First employee holding the role, else the first employee.
    fn resolve_identity(&mut self) {
        let role = self.state.role;
        self.identity = self
            .state
            .employees
            .iter()
            .find(|e| e.role == role)
            .or_else(|| self.state.employees.iter().next())
            .map(|e| e.id.clone());
    }

    /// Switch the acting role. Returns the section shown afterwards.
    pub fn switch_role(&mut self, role: Role) -> Result<Section, FunnelError> {
        self.state.role = role;
        self.resolve_identity();
        self.section = fallback_section(self.section, role);
        tracing::info!(role = %role, actor = self.actor_name(), section = %self.section, "switched role");
        self.save()?;
        Ok(self.section)
    }

    /// Move to `section` if the role may use it.
    pub fn navigate(&mut self, section: Section) -> Result<(), FunnelError> {
        self.ensure_access(section)?;
        self.section = section;
        Ok(())
    }

    /// Fail with `AccessDenied` unless the role may use `section`.
    pub fn ensure_access(&self, section: Section) -> Result<(), FunnelError> {
        let role = self.state.role;
        if can_access(role, section) {
            Ok(())
        } else {
            tracing::warn!(role = %role, section = %section, "access denied");
            Err(FunnelError::AccessDenied { role, section })
        }
    }

    // ===== DRAFTS =====

    fn draft_context(&self) -> (String, chrono::DateTime<chrono::Utc>) {
        (self.actor_name().to_string(), self.clock.now())
    }

    fn existing<'a, T: Record>(collection: &'a Collection<T>, id: &RecordId) -> Result<&'a T, FunnelError> {
        collection.get(id).ok_or_else(|| FunnelError::NotFound {
            section: T::SECTION,
            id: id.clone(),
        })
    }

    /// A new-record draft, or an edit draft seeded from record `id`.
    pub fn sale_draft(&self, id: Option<&RecordId>) -> Result<SaleDraft, FunnelError> {
        let (actor, now) = self.draft_context();
        match id {
            Some(id) => Ok(SaleDraft::from_record(Self::existing(&self.state.sales, id)?)),
            None => Ok(SaleDraft::for_new(&DraftContext::new(&actor, now))),
        }
    }

    pub fn lead_draft(&self, id: Option<&RecordId>) -> Result<LeadDraft, FunnelError> {
        let (actor, now) = self.draft_context();
        match id {
            Some(id) => Ok(LeadDraft::from_record(Self::existing(&self.state.leads, id)?)),
            None => Ok(LeadDraft::for_new(&DraftContext::new(&actor, now))),
        }
    }

    pub fn opportunity_draft(&self, id: Option<&RecordId>) -> Result<OpportunityDraft, FunnelError> {
        let (actor, now) = self.draft_context();
        match id {
            Some(id) => Ok(OpportunityDraft::from_record(Self::existing(
                &self.state.opportunities,
                id,
            )?)),
            None => Ok(OpportunityDraft::for_new(&DraftContext::new(&actor, now))),
        }
    }

    pub fn action_draft(&self, id: Option<&RecordId>) -> Result<ActionItemDraft, FunnelError> {
        let (actor, now) = self.draft_context();
        match id {
            Some(id) => Ok(ActionItemDraft::from_record(Self::existing(&self.state.actions, id)?)),
            None => Ok(ActionItemDraft::for_new(&DraftContext::new(&actor, now))),
        }
    }

    pub fn employee_draft(&self, id: Option<&RecordId>) -> Result<EmployeeDraft, FunnelError> {
        match id {
            Some(id) => Ok(EmployeeDraft::from_record(Self::existing(&self.state.employees, id)?)),
            None => Ok(EmployeeDraft::default()),
        }
    }

    // ===== SUBMISSIONS =====

    fn reject_invalid(section: Section, err: crate::types::ValidationError) -> FunnelError {
        tracing::warn!(section = %section, missing = ?err.missing, "submission rejected");
        FunnelError::Validation(err)
    }

    fn announce(&mut self, promotion: &Option<PromotionOutcome>) {
        if let Some(outcome) = promotion {
            self.notifications.notify(outcome.message.clone());
        }
    }

    /// Validate, store and promote a sale.
    pub fn submit_sale(&mut self, draft: SaleDraft) -> Result<Submission, FunnelError> {
        self.ensure_access(Section::Sales)?;
        let (actor, now) = self.draft_context();
        let sequence = &mut self.state.sequence;
        let sale = draft
            .build(&DraftContext::new(&actor, now), || sequence.mint(Section::Sales))
            .map_err(|e| Self::reject_invalid(Section::Sales, e))?;

        let replaced = self.state.sales.upsert(sale.clone());
        let ctx = PromotionContext {
            actor: &actor,
            now,
            policy: self.settings.promotion,
        };
        let promotion = PromotionEngine::promote_sale(&mut self.state, &sale, &ctx);
        self.announce(&promotion);
        self.save()?;
        Ok(Submission {
            id: sale.id,
            replaced,
            promotion,
        })
    }

    /// Validate, store and promote a lead.
    pub fn submit_lead(&mut self, draft: LeadDraft) -> Result<Submission, FunnelError> {
        self.ensure_access(Section::Leads)?;
        let (actor, now) = self.draft_context();
        let sequence = &mut self.state.sequence;
        let lead = draft
            .build(&DraftContext::new(&actor, now), || sequence.mint(Section::Leads))
            .map_err(|e| Self::reject_invalid(Section::Leads, e))?;

        let replaced = self.state.leads.upsert(lead.clone());
        let ctx = PromotionContext {
            actor: &actor,
            now,
            policy: self.settings.promotion,
        };
        let promotion = PromotionEngine::promote_lead(&mut self.state, &lead, &ctx);
        self.announce(&promotion);
        self.save()?;
        Ok(Submission {
            id: lead.id,
            replaced,
            promotion,
        })
    }

    /// Validate, store and promote an opportunity.
    pub fn submit_opportunity(&mut self, draft: OpportunityDraft) -> Result<Submission, FunnelError> {
        self.ensure_access(Section::Opportunities)?;
        let (actor, now) = self.draft_context();
        let sequence = &mut self.state.sequence;
        let opp = draft
            .build(&DraftContext::new(&actor, now), || {
                sequence.mint(Section::Opportunities)
            })
            .map_err(|e| Self::reject_invalid(Section::Opportunities, e))?;

        let replaced = self.state.opportunities.upsert(opp.clone());
        let ctx = PromotionContext {
            actor: &actor,
            now,
            policy: self.settings.promotion,
        };
        let promotion = PromotionEngine::promote_opportunity(&mut self.state, &opp, &ctx);
        self.announce(&promotion);
        self.save()?;
        Ok(Submission {
            id: opp.id,
            replaced,
            promotion,
        })
    }

    /// Validate and store an action item.
    ///
    /// A new item must link to an existing lead or opportunity of its
    /// action type in the same region. Edits are not re-checked.
    pub fn submit_action(&mut self, draft: ActionItemDraft) -> Result<Submission, FunnelError> {
        self.ensure_access(Section::Actions)?;
        let is_new = draft
            .id
            .as_ref()
            .is_none_or(|id| !self.state.actions.contains(id));
        let (actor, now) = self.draft_context();
        let mut working = self.state.sequence;
        let item = draft
            .build(&DraftContext::new(&actor, now), || working.mint(Section::Actions))
            .map_err(|e| Self::reject_invalid(Section::Actions, e))?;

        if is_new && !self.link_exists(item.action_type, &item.linked_record_id, item.region) {
            tracing::warn!(action = %item.id, link = %item.linked_record_id, "invalid action link");
            return Err(FunnelError::InvalidLink {
                action_type: item.action_type,
                id: item.linked_record_id,
                region: item.region,
            });
        }
        self.state.sequence = working;

        let replaced = self.state.actions.upsert(item.clone());
        self.notifications
            .notify(format!("Task update sent to {}", item.assignee));
        self.save()?;
        Ok(Submission {
            id: item.id,
            replaced,
            promotion: None,
        })
    }

    /// Submit a JSON object of draft fields to `section`.
    ///
    /// When the object's `id` names an existing record, the fields are
    /// layered over that record; otherwise over a new-record draft.
    pub fn submit_json(&mut self, section: Section, patch: serde_json::Value) -> Result<Submission, FunnelError> {
        self.ensure_access(section)?;
        let existing = patch
            .get("id")
            .and_then(serde_json::Value::as_str)
            .map(RecordId::new)
            .filter(|id| self.state.contains(section, id));
        let existing = existing.as_ref();

        match section {
            Section::Sales => {
                let draft = overlay(self.sale_draft(existing)?, patch)?;
                self.submit_sale(draft)
            }
            Section::Leads => {
                let draft = overlay(self.lead_draft(existing)?, patch)?;
                self.submit_lead(draft)
            }
            Section::Opportunities => {
                let draft = overlay(self.opportunity_draft(existing)?, patch)?;
                self.submit_opportunity(draft)
            }
            Section::Actions => {
                let draft = overlay(self.action_draft(existing)?, patch)?;
                self.submit_action(draft)
            }
            Section::Employees => {
                let draft = overlay(self.employee_draft(existing)?, patch)?;
                self.submit_employee(draft)
            }
        }
    }

    /// IDs an action item of `action_type` in `region` may link to.
    #[must_use]
    pub fn link_options(&self, action_type: ActionType, region: Region) -> Vec<RecordId> {
        match action_type {
            ActionType::Lead => self
                .state
                .leads
                .iter()
                .filter(|l| l.region == region)
                .map(|l| l.id.clone())
                .collect(),
            ActionType::Opportunity => self
                .state
                .opportunities
                .iter()
                .filter(|o| o.region == region)
                .map(|o| o.id.clone())
                .collect(),
        }
    }

    fn link_exists(&self, action_type: ActionType, id: &RecordId, region: Region) -> bool {
        match action_type {
            ActionType::Lead => self.state.leads.get(id).is_some_and(|l| l.region == region),
            ActionType::Opportunity => self
                .state
                .opportunities
                .get(id)
                .is_some_and(|o| o.region == region),
        }
    }

    /// Validate and store a directory entry.
    pub fn submit_employee(&mut self, draft: EmployeeDraft) -> Result<Submission, FunnelError> {
        self.ensure_access(Section::Employees)?;
        let sequence = &mut self.state.sequence;
        let employee = draft
            .build(|| sequence.mint(Section::Employees))
            .map_err(|e| Self::reject_invalid(Section::Employees, e))?;

        let replaced = self.state.employees.upsert(employee.clone());
        self.resolve_identity();
        self.notifications.notify(format!(
            "System access granted/updated for {}",
            employee.name
        ));
        self.save()?;
        Ok(Submission {
            id: employee.id,
            replaced,
            promotion: None,
        })
    }

    /// Remove a directory entry.
    pub fn delete_employee(&mut self, id: &RecordId) -> Result<Employee, FunnelError> {
        self.ensure_access(Section::Employees)?;
        let removed = self
            .state
            .employees
            .remove(id)
            .ok_or_else(|| FunnelError::NotFound {
                section: Section::Employees,
                id: id.clone(),
            })?;
        self.resolve_identity();
        self.notifications.notify("Employee access revoked");
        tracing::info!(employee = %id, "deleted employee");
        self.save()?;
        Ok(removed)
    }

    // ===== BULK IMPORT / EXPORT =====

    /// Append the rows of `text` to `section`. Returns the number imported.
    pub fn import(&mut self, section: Section, text: &str) -> Result<usize, FunnelError> {
        self.ensure_access(section)?;
        let actor = self.actor_name().to_string();
        let ingestor = Ingestor::new(&actor, self.clock.today(), self.settings.import_mode);
        let sequence = &mut self.state.sequence;

        let (count, noun) = match section {
            Section::Sales => {
                let batch = ingestor.sales(text, sequence)?;
                let n = batch.len();
                self.state.sales.extend(batch);
                (n, "sales activities")
            }
            Section::Leads => {
                let batch = ingestor.leads(text, sequence)?;
                let n = batch.len();
                self.state.leads.extend(batch);
                (n, "leads")
            }
            Section::Opportunities => {
                let batch = ingestor.opportunities(text, sequence)?;
                let n = batch.len();
                self.state.opportunities.extend(batch);
                (n, "opportunities")
            }
            Section::Actions => {
                let batch = ingestor.actions(text, sequence)?;
                let n = batch.len();
                self.state.actions.extend(batch);
                (n, "action items")
            }
            Section::Employees => {
                let batch = ingestor.employees(text, sequence)?;
                let n = batch.len();
                self.state.employees.extend(batch);
                self.resolve_identity();
                (n, "employee records")
            }
        };

        self.notifications.notify(format!("Imported {count} {noun}."));
        tracing::info!(section = %section, count, "imported records");
        self.save()?;
        Ok(count)
    }

    /// CSV for the records of `section` with the given IDs.
    ///
    /// Only records visible to the actor are exported, in collection order.
    /// Unknown IDs are skipped.
    pub fn export(&self, section: Section, ids: &[RecordId]) -> Result<ExportFile, FunnelError> {
        self.ensure_access(section)?;
        fn pick<'a, T: Exportable>(visible: Vec<&'a T>, ids: &[RecordId]) -> (String, usize) {
            let selected: Vec<&T> = visible.into_iter().filter(|r| ids.contains(r.id())).collect();
            (export_csv(selected.iter().copied()), selected.len())
        }

        let (content, count) = match section {
            Section::Sales => pick(self.visible_sales(""), ids),
            Section::Leads => pick(self.visible_leads(""), ids),
            Section::Opportunities => pick(self.visible_opportunities(""), ids),
            Section::Actions => pick(self.visible_actions(""), ids),
            Section::Employees => pick(self.visible_employees(""), ids),
        };
        Ok(ExportFile {
            file_name: export_file_name(section, self.clock.now()),
            content,
            count,
        })
    }

    // ===== VISIBILITY =====

    fn scoped<'a, T: Regional + Searchable>(&self, records: &'a [T], query: &str) -> Vec<&'a T> {
        filter(records, self.state.role, self.actor_regions(), query)
    }

    #[must_use]
    pub fn visible_sales(&self, query: &str) -> Vec<&Sale> {
        self.scoped(self.state.sales.as_slice(), query)
    }

    #[must_use]
    pub fn visible_leads(&self, query: &str) -> Vec<&Lead> {
        self.scoped(self.state.leads.as_slice(), query)
    }

    #[must_use]
    pub fn visible_opportunities(&self, query: &str) -> Vec<&Opportunity> {
        self.scoped(self.state.opportunities.as_slice(), query)
    }

    #[must_use]
    pub fn visible_actions(&self, query: &str) -> Vec<&ActionItem> {
        self.scoped(self.state.actions.as_slice(), query)
    }

    #[must_use]
    pub fn visible_employees(&self, query: &str) -> Vec<&Employee> {
        filter_employees(self.state.employees.as_slice(), query)
    }

    /// IDs of the records of `section` the actor sees for `query`.
    #[must_use]
    pub fn visible_ids(&self, section: Section, query: &str) -> Vec<RecordId> {
        fn ids<T: Record>(records: Vec<&T>) -> Vec<RecordId> {
            records.into_iter().map(|r| r.id().clone()).collect()
        }
        match section {
            Section::Sales => ids(self.visible_sales(query)),
            Section::Leads => ids(self.visible_leads(query)),
            Section::Opportunities => ids(self.visible_opportunities(query)),
            Section::Actions => ids(self.visible_actions(query)),
            Section::Employees => ids(self.visible_employees(query)),
        }
    }

    /// Visible records of `section` as JSON values.
    pub fn visible_json(&self, section: Section, query: &str) -> Result<Vec<serde_json::Value>, FunnelError> {
        fn values<T: Serialize>(records: Vec<&T>) -> Result<Vec<serde_json::Value>, FunnelError> {
            records
                .into_iter()
                .map(|r| {
                    serde_json::to_value(r).map_err(|e| FunnelError::SerializationError(e.to_string()))
                })
                .collect()
        }
        match section {
            Section::Sales => values(self.visible_sales(query)),
            Section::Leads => values(self.visible_leads(query)),
            Section::Opportunities => values(self.visible_opportunities(query)),
            Section::Actions => values(self.visible_actions(query)),
            Section::Employees => values(self.visible_employees(query)),
        }
    }

    // ===== PERSISTENCE =====

    fn save(&mut self) -> Result<(), FunnelError> {
        self.store.save(&self.state).inspect_err(|e| {
            tracing::error!(error = %e, "failed to save state");
        })
    }
}
