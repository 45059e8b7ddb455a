// src/initial.rs

//! Demo roster loaded when `SEED_DEMO_DATA` is enabled.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::models::{
    BasisKind, CalcType, ClawbackPolicy, CommissionStructure, Eligibility, Employee,
    FormulaDetails, Tier,
};

fn tier(from: Decimal, to: Option<Decimal>, rate: Decimal) -> Tier {
    Tier { from, to, rate }
}

fn upsell_structure(id: &str, partner: &str) -> CommissionStructure {
    CommissionStructure {
        id: id.to_string(),
        name: "Upsell Commission".to_string(),
        trigger: "on_close of upsold item".to_string(),
        basis: BasisKind::Final,
        calc_type: CalcType::PercentOfRevenue,
        formula_details: FormulaDetails::Percent { rate: dec!(7) },
        eligibility: Eligibility::Upsell,
        eligible_jobs: "Any upsold items. Rate is split if another employee is involved."
            .to_string(),
        split: "7% Solo / 3.5% Split".to_string(),
        payout_timing: "Paid with the job's commission cycle".to_string(),
        notes: Some(format!(
            "Splits to 3.5% when {} has an upsell on the same Job ID.",
            partner
        )),
        exclusive_group: None,
    }
}

pub fn demo_employees() -> Vec<Employee> {
    let standard_clawback = Some(ClawbackPolicy {
        allow_negative_deltas: true,
        max_age_days: 90,
    });

    vec![
        Employee {
            id: "emp-1".to_string(),
            name: "Mason Lenz".to_string(),
            roles: "Sales Manager".to_string(),
            employee_id: "0123".to_string(),
            clawback: standard_clawback,
            commission_structures: vec![
                CommissionStructure {
                    id: "cs-1-1".to_string(),
                    name: "Sales GP Tier".to_string(),
                    trigger: "on_close (project completed by the crew)".to_string(),
                    basis: BasisKind::Final,
                    calc_type: CalcType::TieredGp,
                    formula_details: FormulaDetails::Tiered {
                        tiers: vec![
                            tier(dec!(40), Some(dec!(49.99)), dec!(10)),
                            tier(dec!(50), Some(dec!(54.99)), dec!(15)),
                            tier(dec!(55), Some(dec!(59.99)), dec!(20)),
                            tier(dec!(60), None, dec!(20)),
                        ],
                    },
                    eligibility: Eligibility::Always,
                    eligible_jobs: "All projects Mason sells/oversees".to_string(),
                    split: "100% to Mason".to_string(),
                    payout_timing: "Every 2 weeks on payroll cycle".to_string(),
                    notes: Some("Uses gross profit after all actual costs are posted.".to_string()),
                    exclusive_group: None,
                },
                CommissionStructure {
                    id: "cs-1-2".to_string(),
                    name: "Self-Generated Lead Bonus".to_string(),
                    trigger: "on_close".to_string(),
                    basis: BasisKind::Final,
                    calc_type: CalcType::PercentOfRevenue,
                    formula_details: FormulaDetails::Percent { rate: dec!(2.5) },
                    eligibility: Eligibility::SelfGeneratedLead,
                    eligible_jobs: "Jobs where the closed lead source is flagged as self-gen"
                        .to_string(),
                    split: "100% to Mason".to_string(),
                    payout_timing: "Same 2-week payroll cycle".to_string(),
                    notes: Some("Requires lead source = self-generated in project data.".to_string()),
                    exclusive_group: None,
                },
                upsell_structure("cs-1-3", "Malakai"),
            ],
        },
        Employee {
            id: "emp-2".to_string(),
            name: "Malakai".to_string(),
            roles: "Project Manager".to_string(),
            employee_id: "1432".to_string(),
            clawback: standard_clawback,
            commission_structures: vec![
                CommissionStructure {
                    id: "cs-2-1".to_string(),
                    name: "Base GP Tier".to_string(),
                    trigger: "on_close (project completed)".to_string(),
                    basis: BasisKind::Final,
                    calc_type: CalcType::TieredGp,
                    formula_details: FormulaDetails::Tiered {
                        tiers: vec![
                            tier(dec!(0), Some(dec!(49.99)), dec!(0)),
                            tier(dec!(50), Some(dec!(54.99)), dec!(3)),
                            tier(dec!(55), None, dec!(5)),
                        ],
                    },
                    eligibility: Eligibility::Always,
                    eligible_jobs: "All projects Malakai manages".to_string(),
                    split: "100% to Malakai (except where upsell rules apply)".to_string(),
                    payout_timing: "Every 2 weeks on payroll cycle".to_string(),
                    notes: Some("Works alongside monthly salary.".to_string()),
                    exclusive_group: None,
                },
                upsell_structure("cs-2-3", "Mason"),
                CommissionStructure {
                    id: "cs-2-4".to_string(),
                    name: "Self-Generated Lead Bonus".to_string(),
                    trigger: "on_close".to_string(),
                    basis: BasisKind::Final,
                    calc_type: CalcType::PercentOfRevenue,
                    formula_details: FormulaDetails::Percent { rate: dec!(5) },
                    eligibility: Eligibility::SelfGeneratedLead,
                    eligible_jobs: "Projects where the lead source is flagged self-gen for Malakai"
                        .to_string(),
                    split: "100% to Malakai".to_string(),
                    payout_timing: "Every 2 weeks on payroll cycle".to_string(),
                    notes: Some("Must be confirmed as PM-sourced lead.".to_string()),
                    exclusive_group: None,
                },
            ],
        },
    ]
}
