// src/services/formula.rs

use crate::{
    errors::{EngineError, EngineResult},
    models::{CalcType, CommissionStructure, EngineCondition, FormulaDetails, Tier},
};
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

pub struct FormulaEvaluator;

/// The two numbers a formula can be evaluated against. Tier lookup uses `lookup` (a GP %),
/// every rate is applied to `amount` (a monetary value).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BasisValue {
    pub lookup: Decimal,
    pub amount: Decimal,
}

impl BasisValue {
    pub fn amount(amount: Decimal) -> Self {
        Self {
            lookup: amount,
            amount,
        }
    }

    pub fn tiered(lookup_percent: Decimal, amount: Decimal) -> Self {
        Self {
            lookup: lookup_percent,
            amount,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub amount: Decimal,
    /// Effective rate applied; `None` for flat amounts.
    pub rate: Option<Decimal>,
}

/// Result of applying the no-match policy on top of [`FormulaEvaluator::evaluate`].
#[derive(Debug, Clone, PartialEq)]
pub struct Assessment {
    pub evaluation: Evaluation,
    pub condition: Option<EngineCondition>,
}

pub fn round_amount(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// `amount × rate / 100`, rounded to cents. Values too large for `Decimal` are an error.
pub fn percent_of(amount: Decimal, rate: Decimal) -> EngineResult<Decimal> {
    amount
        .checked_mul(rate)
        .and_then(|product| product.checked_div(dec!(100)))
        .map(round_amount)
        .ok_or_else(|| {
            EngineError::Validation(format!("{}% of {} is out of range", rate, amount))
        })
}

fn invalid(reason: impl Into<String>) -> EngineError {
    EngineError::InvalidFormula {
        structure: String::new(),
        reason: reason.into(),
    }
}

impl FormulaEvaluator {
    /// Evaluate a formula against a basis. Pure: the same inputs always give the same result,
    /// which is what recomputation during clawback relies on.
    pub fn evaluate(
        calc_type: CalcType,
        details: &FormulaDetails,
        basis: BasisValue,
    ) -> EngineResult<Evaluation> {
        match (calc_type, details) {
            (CalcType::Flat, FormulaDetails::Flat { amount }) => {
                if *amount < Decimal::ZERO {
                    return Err(invalid("flat amount cannot be negative"));
                }
                Ok(Evaluation {
                    amount: round_amount(*amount),
                    rate: None,
                })
            }
            (CalcType::PercentOfGp | CalcType::PercentOfRevenue, FormulaDetails::Percent { rate }) => {
                if *rate < Decimal::ZERO {
                    return Err(invalid("rate cannot be negative"));
                }
                Ok(Evaluation {
                    amount: percent_of(basis.amount, *rate)?,
                    rate: Some(*rate),
                })
            }
            (CalcType::TieredGp, FormulaDetails::Tiered { tiers }) => {
                check_tiers(tiers)?;
                let tier = find_tier(tiers, basis.lookup).ok_or(EngineError::NoMatchingTier {
                    value: basis.lookup,
                })?;
                Ok(Evaluation {
                    amount: percent_of(basis.amount, tier.rate)?,
                    rate: Some(tier.rate),
                })
            }
            (calc_type, details) => Err(invalid(format!(
                "{:?} cannot be computed from {}",
                calc_type,
                shape_name(details)
            ))),
        }
    }

    /// Evaluate with the no-match policy applied: a basis outside every tier yields zero and
    /// a reported condition instead of an error. Malformed formulas still fail.
    pub fn assess(
        calc_type: CalcType,
        details: &FormulaDetails,
        basis: BasisValue,
    ) -> EngineResult<Assessment> {
        match Self::evaluate(calc_type, details, basis) {
            Ok(evaluation) => Ok(Assessment {
                evaluation,
                condition: None,
            }),
            Err(EngineError::NoMatchingTier { value }) => {
                tracing::warn!("No tier matches GP value {}, commission set to zero", value);
                Ok(Assessment {
                    evaluation: Evaluation {
                        amount: Decimal::ZERO,
                        rate: None,
                    },
                    condition: Some(EngineCondition::NoMatchingTier { value }),
                })
            }
            Err(other) => Err(other),
        }
    }

    /// Assess a structure's formula scaled by a split share, naming the structure in any
    /// configuration error.
    pub fn assess_structure(
        structure: &CommissionStructure,
        share: Decimal,
        basis: BasisValue,
    ) -> EngineResult<Assessment> {
        let details = scale(&structure.formula_details, share)?;
        Self::assess(structure.calc_type, &details, basis)
            .map_err(|err| name_structure(err, structure))
    }

    /// Configuration check used when structures are saved: shape agrees with the calc type,
    /// tiers are ordered by `from` and do not overlap, nothing is negative.
    pub fn validate(structure: &CommissionStructure) -> EngineResult<()> {
        let result = match (structure.calc_type, &structure.formula_details) {
            (CalcType::TieredGp, FormulaDetails::Tiered { tiers }) => {
                check_tiers(tiers).and_then(|_| check_tier_order(tiers))
            }
            (CalcType::PercentOfGp | CalcType::PercentOfRevenue, FormulaDetails::Percent { rate })
                if *rate < Decimal::ZERO =>
            {
                Err(invalid("rate cannot be negative"))
            }
            (CalcType::Flat, FormulaDetails::Flat { amount }) if *amount < Decimal::ZERO => {
                Err(invalid("flat amount cannot be negative"))
            }
            (CalcType::PercentOfGp | CalcType::PercentOfRevenue, FormulaDetails::Percent { .. })
            | (CalcType::Flat, FormulaDetails::Flat { .. }) => Ok(()),
            (calc_type, details) => Err(invalid(format!(
                "{:?} cannot be computed from {}",
                calc_type,
                shape_name(details)
            ))),
        };
        result.map_err(|err| name_structure(err, structure))
    }
}

/// Multiply every rate (or the flat amount) by a split share.
pub fn scale(details: &FormulaDetails, share: Decimal) -> EngineResult<FormulaDetails> {
    if share == Decimal::ONE {
        return Ok(details.clone());
    }
    let times_share = |value: Decimal| {
        value.checked_mul(share).ok_or_else(|| {
            EngineError::Validation(format!("{} scaled by {} is out of range", value, share))
        })
    };

    Ok(match details {
        FormulaDetails::Tiered { tiers } => FormulaDetails::Tiered {
            tiers: tiers
                .iter()
                .map(|t| {
                    Ok(Tier {
                        rate: times_share(t.rate)?.normalize(),
                        ..t.clone()
                    })
                })
                .collect::<EngineResult<Vec<_>>>()?,
        },
        FormulaDetails::Percent { rate } => FormulaDetails::Percent {
            rate: times_share(*rate)?.normalize(),
        },
        FormulaDetails::Flat { amount } => FormulaDetails::Flat {
            amount: round_amount(times_share(*amount)?),
        },
    })
}

/// First tier by ascending `from` whose range holds the value.
fn find_tier(tiers: &[Tier], value: Decimal) -> Option<&Tier> {
    let mut ordered: Vec<&Tier> = tiers.iter().collect();
    ordered.sort_by(|a, b| a.from.cmp(&b.from));
    ordered.into_iter().find(|t| t.contains(value))
}

fn check_tiers(tiers: &[Tier]) -> EngineResult<()> {
    if tiers.is_empty() {
        return Err(invalid("tiered formula has no tiers"));
    }
    for t in tiers {
        if t.rate < Decimal::ZERO {
            return Err(invalid(format!("tier from {} has a negative rate", t.from)));
        }
        if let Some(to) = t.to {
            if to < t.from {
                return Err(invalid(format!("tier from {} ends before it starts", t.from)));
            }
        }
    }
    Ok(())
}

fn check_tier_order(tiers: &[Tier]) -> EngineResult<()> {
    for pair in tiers.windows(2) {
        let (prev, next) = (&pair[0], &pair[1]);
        match prev.to {
            None => {
                return Err(invalid(format!(
                    "open-ended tier from {} must be the last tier",
                    prev.from
                )));
            }
            Some(to) if next.from <= to => {
                return Err(invalid(format!(
                    "tier from {} overlaps or precedes the tier ending at {}",
                    next.from, to
                )));
            }
            Some(_) => {}
        }
    }
    Ok(())
}

fn shape_name(details: &FormulaDetails) -> &'static str {
    match details {
        FormulaDetails::Tiered { .. } => "tiers",
        FormulaDetails::Percent { .. } => "a rate",
        FormulaDetails::Flat { .. } => "a flat amount",
    }
}

fn name_structure(err: EngineError, structure: &CommissionStructure) -> EngineError {
    match err {
        EngineError::InvalidFormula { reason, .. } => EngineError::InvalidFormula {
            structure: structure.name.clone(),
            reason,
        },
        other => other,
    }
}
