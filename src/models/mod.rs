// src/models/mod.rs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

fn full_share() -> Decimal {
    Decimal::ONE
}

fn is_full_share(share: &Decimal) -> bool {
    *share == Decimal::ONE
}

// ─── Commission Structures ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum CalcType {
    #[serde(rename = "Tiered GP")]
    TieredGp,
    #[serde(rename = "Percent of GP")]
    PercentOfGp,
    #[serde(rename = "Flat")]
    Flat,
    #[serde(rename = "Percent of Revenue")]
    PercentOfRevenue,
}

impl CalcType {
    /// True when the formula needs the job's gross profit, not just its revenue.
    pub fn uses_gross_profit(self) -> bool {
        matches!(self, CalcType::TieredGp | CalcType::PercentOfGp)
    }
}

/// A contiguous GP% range mapped to a rate. `to = None` means "and above".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Tier {
    pub from: Decimal,
    pub to: Option<Decimal>,
    /// Percentage, e.g. 15 means 15%
    pub rate: Decimal,
}

impl Tier {
    pub fn contains(&self, value: Decimal) -> bool {
        self.from <= value && self.to.is_none_or(|to| value <= to)
    }
}

/// Formula parameters. Exactly one shape is populated and it must agree with the
/// structure's `calcType`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum FormulaDetails {
    Tiered { tiers: Vec<Tier> },
    Percent { rate: Decimal },
    Flat { amount: Decimal },
}

/// When the value a structure is computed against becomes known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BasisKind {
    /// Only known once every cost is posted against the job.
    #[default]
    Final,
    /// Known when the sale is booked.
    Booked,
}

impl From<String> for BasisKind {
    fn from(value: String) -> Self {
        if value.trim().to_ascii_lowercase().starts_with("final") {
            BasisKind::Final
        } else {
            BasisKind::Booked
        }
    }
}

impl From<BasisKind> for String {
    fn from(value: BasisKind) -> Self {
        match value {
            BasisKind::Final => "final".to_string(),
            BasisKind::Booked => "booked".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Eligibility {
    /// Applies to every job the employee is credited on.
    Always,
    /// Only when the lead was self-generated by this employee.
    SelfGeneratedLead,
    /// Only for upsold items; shared between co-claimants on the same job.
    Upsell,
}

impl Eligibility {
    /// Classify an untagged structure from its descriptive text. The name is checked
    /// before the eligible-jobs description; structures mentioning neither self-generated
    /// leads nor upsells apply to every job.
    pub fn infer(name: &str, eligible_jobs: &str) -> Self {
        [name, eligible_jobs]
            .iter()
            .map(|text| text.to_lowercase().replace(['-', '_'], " "))
            .find_map(|text| {
                if text.contains("self gen") {
                    Some(Eligibility::SelfGeneratedLead)
                } else if text.contains("upsell") || text.contains("upsold") {
                    Some(Eligibility::Upsell)
                } else {
                    None
                }
            })
            .unwrap_or(Eligibility::Always)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommissionStructure {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub trigger: String,
    #[serde(default)]
    #[schema(value_type = String, example = "final")]
    pub basis: BasisKind,
    pub calc_type: CalcType,
    pub formula_details: FormulaDetails,
    /// Inferred from `name` and `eligibleJobs` when absent.
    pub eligibility: Eligibility,
    #[serde(default)]
    pub eligible_jobs: String,
    #[serde(default)]
    pub split: String,
    #[serde(default)]
    pub payout_timing: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Eligible structures sharing a group are mutually exclusive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclusive_group: Option<String>,
}

/// Stored shape of a structure. Rosters saved before eligibility was tagged carry only
/// the free-text description, so the tag is optional here.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredStructure {
    id: String,
    name: String,
    #[serde(default)]
    trigger: String,
    #[serde(default)]
    basis: BasisKind,
    calc_type: CalcType,
    formula_details: FormulaDetails,
    #[serde(default)]
    eligibility: Option<Eligibility>,
    #[serde(default)]
    eligible_jobs: String,
    #[serde(default)]
    split: String,
    #[serde(default)]
    payout_timing: String,
    #[serde(default)]
    notes: Option<String>,
    #[serde(default)]
    exclusive_group: Option<String>,
}

impl From<StoredStructure> for CommissionStructure {
    fn from(stored: StoredStructure) -> Self {
        let eligibility = stored
            .eligibility
            .unwrap_or_else(|| Eligibility::infer(&stored.name, &stored.eligible_jobs));
        Self {
            id: stored.id,
            name: stored.name,
            trigger: stored.trigger,
            basis: stored.basis,
            calc_type: stored.calc_type,
            formula_details: stored.formula_details,
            eligibility,
            eligible_jobs: stored.eligible_jobs,
            split: stored.split,
            payout_timing: stored.payout_timing,
            notes: stored.notes,
            exclusive_group: stored.exclusive_group,
        }
    }
}

impl<'de> Deserialize<'de> for CommissionStructure {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        StoredStructure::deserialize(deserializer).map(Self::from)
    }
}

impl CommissionStructure {
    /// Structures whose value is only known after GP is posted go through the
    /// pending-GP flow instead of being computed at sale time.
    pub fn is_deferred(&self) -> bool {
        self.basis == BasisKind::Final && self.calc_type.uses_gross_profit()
    }
}

// ─── Employee ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClawbackPolicy {
    pub allow_negative_deltas: bool,
    pub max_age_days: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub roles: String,
    pub employee_id: String,
    #[serde(default)]
    pub commission_structures: Vec<CommissionStructure>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clawback: Option<ClawbackPolicy>,
}

impl Employee {
    pub fn structure(&self, structure_id: &str) -> Option<&CommissionStructure> {
        self.commission_structures
            .iter()
            .find(|s| s.id == structure_id)
    }
}

// ─── Pending GP ───────────────────────────────────────────────────────────────

/// A sale logged before its final gross profit is known.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PendingGpRecord {
    pub id: String,
    pub employee_id: String,
    pub employee_name: String,
    pub structure_id: String,
    pub structure_name: String,
    pub job_identifier: String,
    /// Date sold
    pub date: NaiveDate,
    pub total_revenue: Decimal,
    #[serde(default = "full_share", skip_serializing_if = "is_full_share")]
    pub split_share: Decimal,
}

// ─── Commission Records ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum CommissionStatus {
    Pending,
    Paid,
    Cancelled,
}

impl CommissionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, CommissionStatus::Paid | CommissionStatus::Cancelled)
    }
}

/// Conditions the engine reports alongside a computed amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "kind")]
pub enum EngineCondition {
    /// The GP value fell outside every tier, so the amount was set to zero.
    NoMatchingTier { value: Decimal },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommissionRecord {
    pub id: String,
    pub employee_id: String,
    pub employee_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structure_id: Option<String>,
    pub structure_name: String,
    pub job_identifier: String,
    pub date: NaiveDate,
    /// Final GP % for tiered structures, GP dollars for percent-of-GP, revenue otherwise.
    pub input_value: Decimal,
    pub calculated_amount: Decimal,
    pub status: CommissionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commission_rate: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_revenue: Option<Decimal>,
    #[serde(default = "full_share", skip_serializing_if = "is_full_share")]
    pub split_share: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub corrects_record_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<EngineCondition>,
}

// ─── Sale Logging ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaleParticipant {
    pub employee_id: String,
    #[serde(default)]
    pub self_generated_lead: bool,
    #[serde(default)]
    pub upsell: bool,
    /// Restrict the sale to these structures; all eligible structures when absent.
    #[serde(default)]
    pub structure_ids: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LogSaleRequest {
    pub job_identifier: String,
    pub date_sold: NaiveDate,
    pub total_revenue: Decimal,
    /// Revenue of the upsold items, when it differs from the job total.
    #[serde(default)]
    pub upsell_revenue: Option<Decimal>,
    /// GP % known at booking time, used by GP structures on a booked basis.
    #[serde(default)]
    pub estimated_gp_percent: Option<Decimal>,
    pub participants: Vec<SaleParticipant>,
}

#[derive(Debug, Clone, Default, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaleLogged {
    pub pending: Vec<PendingGpRecord>,
    pub records: Vec<CommissionRecord>,
}

// ─── Finalize / Correct ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FinalizeGpRequest {
    pub final_gp_percent: Decimal,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FinalizeItem {
    pub pending_id: String,
    pub final_gp_percent: Decimal,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct FinalizeBatchRequest {
    pub items: Vec<FinalizeItem>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FinalizeItemResult {
    pub pending_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<CommissionRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CorrectionRequest {
    pub final_gp_percent: Decimal,
    /// Revised revenue; the recorded revenue is reused when absent.
    #[serde(default)]
    pub total_revenue: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CorrectionOutcome {
    /// Recomputation produced the same amount.
    Unchanged { record: CommissionRecord },
    /// The still-pending record was adjusted in place.
    Adjusted {
        record: CommissionRecord,
        delta: Decimal,
    },
    /// The original was already paid; a correcting record carries the delta.
    Corrected {
        original: CommissionRecord,
        correction: CommissionRecord,
        delta: Decimal,
    },
}

// ─── Reporting ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    #[default]
    Date,
    EmployeeName,
    StructureName,
    JobIdentifier,
    InputValue,
    CalculatedAmount,
    Status,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct RecordQuery {
    pub employee_id: Option<String>,
    /// Inclusive lower bound on the record date
    pub from: Option<NaiveDate>,
    /// Inclusive upper bound on the record date
    pub to: Option<NaiveDate>,
    pub status: Option<CommissionStatus>,
    pub sort_by: Option<SortKey>,
    pub direction: Option<SortDirection>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeTotals {
    pub employee_id: String,
    pub employee_name: String,
    pub pending: Decimal,
    pub paid: Decimal,
    pub cancelled: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LedgerSummary {
    pub record_count: usize,
    pub pending_total: Decimal,
    pub paid_total: Decimal,
    pub cancelled_total: Decimal,
    pub employees: Vec<EmployeeTotals>,
}
