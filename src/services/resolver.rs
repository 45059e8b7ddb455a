// src/services/resolver.rs

use std::collections::BTreeSet;

use rust_decimal::Decimal;

use crate::models::{CommissionStructure, Eligibility, Employee};

pub struct RuleResolver;

/// Everything the resolver needs to know about one employee's part in a sale. Co-claimants
/// are supplied by the caller; the resolver never scans the roster on its own.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaleContext {
    pub job_identifier: String,
    pub self_generated_lead: bool,
    pub upsell: bool,
    /// Other employees holding a matching upsell structure on the same job.
    pub co_claimants: BTreeSet<String>,
    /// Restricts candidates to these structure ids when present.
    pub structure_ids: Option<BTreeSet<String>>,
}

/// A structure that applies to the sale, with the fraction of it this employee earns.
#[derive(Debug, Clone, PartialEq)]
pub struct Applicable {
    pub structure: CommissionStructure,
    pub share: Decimal,
}

#[derive(Debug, Clone)]
pub struct JobParticipant<'a> {
    pub employee: &'a Employee,
    pub self_generated_lead: bool,
    pub upsell: bool,
    pub structure_ids: Option<BTreeSet<String>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParticipantShares {
    pub employee_id: String,
    pub applicable: Vec<Applicable>,
}

impl RuleResolver {
    /// Structures of `employee` that apply to the sale, ordered by structure id.
    pub fn resolve_applicable(employee: &Employee, ctx: &SaleContext) -> Vec<Applicable> {
        let others = ctx
            .co_claimants
            .iter()
            .filter(|id| **id != employee.id)
            .count();
        let upsell_share = Decimal::ONE / Decimal::from(others + 1);

        eligible_structures(
            employee,
            ctx.self_generated_lead,
            ctx.upsell,
            ctx.structure_ids.as_ref(),
        )
        .into_iter()
        .map(|structure| Applicable {
            share: if structure.eligibility == Eligibility::Upsell {
                upsell_share
            } else {
                Decimal::ONE
            },
            structure: structure.clone(),
        })
        .collect()
    }

    /// Resolve a whole job once. Upsell claimants are the participants whose eligible set,
    /// after structure selection and exclusive groups, still holds an upsell structure;
    /// each of them gets an equal share, so the split is symmetric no matter whose
    /// perspective it is computed from.
    pub fn resolve_job(
        job_identifier: &str,
        participants: &[JobParticipant<'_>],
    ) -> Vec<ParticipantShares> {
        let claimants: BTreeSet<String> = participants
            .iter()
            .filter(|p| claims_upsell(p))
            .map(|p| p.employee.id.clone())
            .collect();

        let mut seen = BTreeSet::new();
        participants
            .iter()
            .filter(|p| seen.insert(p.employee.id.clone()))
            .map(|p| {
                let ctx = SaleContext {
                    job_identifier: job_identifier.to_string(),
                    self_generated_lead: p.self_generated_lead,
                    upsell: p.upsell,
                    co_claimants: claimants
                        .iter()
                        .filter(|id| **id != p.employee.id)
                        .cloned()
                        .collect(),
                    structure_ids: p.structure_ids.clone(),
                };
                ParticipantShares {
                    employee_id: p.employee.id.clone(),
                    applicable: Self::resolve_applicable(p.employee, &ctx),
                }
            })
            .collect()
    }
}

/// Selected, eligible structures ordered by id, with exclusive groups applied.
fn eligible_structures<'a>(
    employee: &'a Employee,
    self_generated_lead: bool,
    upsell: bool,
    structure_ids: Option<&BTreeSet<String>>,
) -> Vec<&'a CommissionStructure> {
    let mut eligible: Vec<&CommissionStructure> = employee
        .commission_structures
        .iter()
        .filter(|s| structure_ids.is_none_or(|selected| selected.contains(&s.id)))
        .filter(|s| match s.eligibility {
            Eligibility::Always => true,
            Eligibility::SelfGeneratedLead => self_generated_lead,
            Eligibility::Upsell => upsell,
        })
        .collect();
    eligible.sort_by(|a, b| a.id.cmp(&b.id));

    // first structure (by id) wins inside an exclusive group
    let mut claimed_groups = BTreeSet::new();
    eligible.retain(|s| match &s.exclusive_group {
        Some(group) => claimed_groups.insert(group.clone()),
        None => true,
    });
    eligible
}

fn claims_upsell(participant: &JobParticipant<'_>) -> bool {
    participant.upsell
        && eligible_structures(
            participant.employee,
            participant.self_generated_lead,
            participant.upsell,
            participant.structure_ids.as_ref(),
        )
        .iter()
        .any(|s| s.eligibility == Eligibility::Upsell)
}
