//! # Core Type Definitions
//!
//! This module contains the vocabulary of the Funnel pipeline:
//! - Record identifiers (`RecordId`)
//! - Closed value sets (`Region`, `Role`, `Stage`, ...)
//! - Navigation sections (`Section`)
//! - Error types (`FunnelError`, `ValidationError`)
//!
//! ## Wire Values
//!
//! Every enumeration serializes as its display label ("Asia Pacific",
//! "Closed Won", ...). The same label is accepted by `FromStr`, so persisted
//! documents, CSV cells and JSON request bodies all share one spelling.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// =============================================================================
// LABELLED ENUMERATIONS
// =============================================================================

/// Declares a closed value set whose variants serialize as display labels.
///
/// Generates `ALL`, `as_str()`, `Display` and `FromStr` (exact label match,
/// surrounding whitespace ignored).
macro_rules! labelled_enum {
    (
        $(#[$meta:meta])*
        $name:ident => $kind:literal {
            $( $(#[$vmeta:meta])* $variant:ident = $label:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub enum $name {
            $( $(#[$vmeta])* #[serde(rename = $label)] $variant, )+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// The display label, which is also the wire value.
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = FunnelError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let trimmed = s.trim();
                $name::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str() == trimmed)
                    .ok_or_else(|| FunnelError::UnknownValue {
                        kind: $kind,
                        value: s.to_string(),
                    })
            }
        }
    };
}

labelled_enum! {
    /// Geographic partition used for display and for visibility scoping.
    Region => "region" {
        Atlantic = "Atlantic",
        AsiaPacific = "Asia Pacific",
        Europe = "Europe",
        NorthAmerica = "North America",
        SouthAmerica = "South America",
        MiddleEast = "Middle East",
        Africa = "Africa",
        Oceania = "Oceania",
    }
}

labelled_enum! {
    /// The self-selected acting role.
    Role => "role" {
        SuperAdmin = "Super Admin",
        AdminFounder = "Admin/Founder",
        PresalesConsultant = "Presales Consultant",
        PresalesLead = "Presales Lead",
        PresalesManager = "Presales Manager",
        SalesHead = "Sales Head",
        DeliveryManager = "Delivery Manager",
    }
}

impl Role {
    /// Unrestricted roles see every region.
    #[must_use]
    pub const fn is_unrestricted(&self) -> bool {
        matches!(self, Role::SuperAdmin | Role::AdminFounder)
    }

    /// Any of the three presales roles.
    #[must_use]
    pub const fn is_presales(&self) -> bool {
        matches!(
            self,
            Role::PresalesConsultant | Role::PresalesLead | Role::PresalesManager
        )
    }
}

impl Default for Role {
    fn default() -> Self {
        Self::SuperAdmin
    }
}

labelled_enum! {
    Priority => "priority" {
        Low = "Low",
        Medium = "Medium",
        High = "High",
    }
}

labelled_enum! {
    Currency => "currency" {
        Usd = "USD",
        Inr = "INR",
        Aed = "AED",
        Cad = "CAD",
    }
}

impl Default for Currency {
    fn default() -> Self {
        Self::Usd
    }
}

labelled_enum! {
    /// Engagement type of a lead or opportunity.
    LeadType => "type" {
        Rfp = "RFP",
        Rfi = "RFI",
        Rfq = "RFQ",
        PoC = "PoC",
        Demo = "Demo",
    }
}

labelled_enum! {
    /// Where a sales activity originated.
    Source => "source" {
        Advertisement = "Advertisement",
        ColdCall = "Cold Call",
        EmployeeReferral = "Employee Referral",
        ExternalReferral = "External Referral",
        OnlineStore = "Online Store",
        Partner = "Partner",
        PublicRelations = "Public Relations",
        SalesEmailAlias = "Sales Email Alias",
        SeminarPartner = "Seminar Partner",
        InternalSeminar = "Internal Seminar",
        TradeShow = "Trade Show",
        WebDownload = "Web Download",
        WebResearch = "Web Research",
        Chat = "Chat",
    }
}

labelled_enum! {
    /// Contact status shared by sales activities and leads.
    Status => "status" {
        AttemptedToContact = "Attempted to Contact",
        ContactInFuture = "Contact in Future",
        Contacted = "Contacted",
        JunkLead = "Junk Lead",
        LostLead = "Lost Lead",
        NotContacted = "Not Contacted",
        PreQualified = "Pre Qualified",
        NotQualified = "Not Qualified",
        /// Triggers promotion to the next stage.
        Qualified = "Qualified",
        /// Initial status of a lead created by promotion.
        InFeasibilityStudy = "In Feasibility Study",
    }
}

labelled_enum! {
    /// Opportunity pipeline stage, in pipeline order.
    Stage => "stage" {
        Qualification = "Qualification",
        NeedsAnalysis = "Needs Analysis",
        ValueProposition = "Value Proposition",
        IdentifyDecisionMakers = "Identify Decision Makers",
        ProposalPriceQuote = "Proposal/Price Quote",
        NegotiationReview = "Negotiation/Review",
        /// Terminal win: triggers the delivery kickoff action item.
        ClosedWon = "Closed Won",
        ClosedLost = "Closed Lost",
        SowCreation = "SOW Creation",
        SowAccepted = "SOW Accepted",
        ProjectKickoff = "Project Kickoff",
    }
}

labelled_enum! {
    ActionStatus => "action status" {
        NotStarted = "Not Started",
        Deferred = "Deferred",
        InProgress = "In Progress",
        Completed = "Completed",
        WaitingForInput = "Waiting for input",
    }
}

labelled_enum! {
    Feasibility => "feasibility" {
        Pending = "Pending",
        Feasible = "Feasible",
        NotFeasible = "Not Feasible",
    }
}

impl Default for Feasibility {
    fn default() -> Self {
        Self::Pending
    }
}

labelled_enum! {
    /// Presales recommendation on an opportunity.
    Recommendation => "recommendation" {
        Proceed = "Proceed",
        Hold = "Hold",
        Drop = "Drop",
    }
}

impl Default for Recommendation {
    fn default() -> Self {
        Self::Proceed
    }
}

labelled_enum! {
    EmployeeStatus => "employee status" {
        Active = "Active",
        Inactive = "Inactive",
    }
}

labelled_enum! {
    /// The kind of record an action item is linked to.
    ActionType => "action type" {
        Lead = "Lead",
        Opportunity = "Opportunity",
    }
}

// =============================================================================
// SECTIONS
// =============================================================================

/// One of the five navigable collections.
///
/// The declaration order is the navigation priority used by the access
/// fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    Sales,
    Leads,
    Opportunities,
    Actions,
    Employees,
}

impl Section {
    /// All sections in navigation priority order.
    pub const ALL: [Section; 5] = [
        Section::Sales,
        Section::Leads,
        Section::Opportunities,
        Section::Actions,
        Section::Employees,
    ];

    /// Route/CLI slug.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Section::Sales => "sales",
            Section::Leads => "leads",
            Section::Opportunities => "opportunities",
            Section::Actions => "actions",
            Section::Employees => "employees",
        }
    }

    /// Human-readable heading.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Section::Sales => "Sales Activity",
            Section::Leads => "Leads",
            Section::Opportunities => "Opportunities",
            Section::Actions => "Action Items",
            Section::Employees => "User Management",
        }
    }

    /// Name of a single record in this section.
    #[must_use]
    pub const fn record_name(&self) -> &'static str {
        match self {
            Section::Sales => "Sale",
            Section::Leads => "Lead",
            Section::Opportunities => "Opportunity",
            Section::Actions => "Action item",
            Section::Employees => "Employee",
        }
    }

    /// Prefix of IDs minted for this section.
    #[must_use]
    pub const fn id_prefix(&self) -> &'static str {
        match self {
            Section::Sales => "SALE",
            Section::Leads => "LD",
            Section::Opportunities => "OPP",
            Section::Actions => "ACT",
            Section::Employees => "EMP",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Section {
    type Err = FunnelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        match lowered.as_str() {
            "sales" | "sale" => Ok(Section::Sales),
            "leads" | "lead" => Ok(Section::Leads),
            "opportunities" | "opportunity" | "opps" => Ok(Section::Opportunities),
            "actions" | "action" | "action-items" => Ok(Section::Actions),
            "employees" | "employee" => Ok(Section::Employees),
            _ => Err(FunnelError::UnknownValue {
                kind: "section",
                value: s.to_string(),
            }),
        }
    }
}

// =============================================================================
// RECORD IDENTIFIERS
// =============================================================================

/// Unique identifier of a record within its collection.
///
/// IDs are immutable once assigned. An opportunity promoted from a lead
/// carries the lead's ID.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub String);

impl RecordId {
    /// Create an ID from any string.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Build a minted ID of the form `<PREFIX>-<n>`.
    #[must_use]
    pub fn minted(prefix: &str, n: u64) -> Self {
        Self(format!("{}-{}", prefix, n))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The trailing numeric segment, if the ID ends in `-<digits>`.
    #[must_use]
    pub fn numeric_suffix(&self) -> Option<u64> {
        self.0.rsplit('-').next().and_then(|tail| tail.parse().ok())
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Mandatory fields were left blank on a draft.
///
/// Submission is blocked until every listed field is filled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    /// The section of the rejected draft.
    pub section: Section,
    /// Field names, in form order.
    pub missing: Vec<&'static str>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Please fill in all mandatory fields for {}: {}",
            self.section.record_name(),
            self.missing.join(", ")
        )
    }
}

impl std::error::Error for ValidationError {}

/// Errors that can occur in the Funnel system.
///
/// - No silent failures
/// - Use `Result<T, FunnelError>` for fallible operations
/// - The core never panics
#[derive(Debug, Error)]
pub enum FunnelError {
    /// A draft is missing mandatory fields.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A bulk import row could not be read (strict import mode).
    #[error("Malformed row at line {line}: column {column} has unreadable value {value:?}")]
    MalformedRow {
        line: usize,
        column: &'static str,
        value: String,
    },

    /// An action item points at no existing record of the right type and region.
    #[error("Invalid link: no {action_type} {id} in region {region}")]
    InvalidLink {
        action_type: ActionType,
        id: RecordId,
        region: Region,
    },

    /// The acting role may not use a section.
    #[error("Access denied: {role} cannot use {section}")]
    AccessDenied { role: Role, section: Section },

    /// The requested record does not exist.
    #[error("{} not found: {id}", section.record_name())]
    NotFound { section: Section, id: RecordId },

    /// A label did not match any value of a closed set.
    #[error("Unknown {kind}: {value:?}")]
    UnknownValue { kind: &'static str, value: String },

    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// A persisted document could not be encoded or failed its checks on read.
    #[error("Storage error: {0}")]
    StorageError(String),

    /// A storage I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),
}

// =============================================================================
// TESTS
// =============================================================================
