use std::collections::HashMap;

use credit_decision_database::DecisionWithDemographics;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct GroupRate {
    pub approved: u32,
    pub total: u32,
    pub rate: f64,
}

/// Best-effort bias check over a recent decision sample. Grounded on the
/// disparate-impact ("80% rule") calculation from the original fairness
/// monitor: mirrors its gender/region breakdown but only the
/// `disparate_impact`/`bias_detected` pair is wired into the audited
/// payload, since the orchestrator only ever surfaces those two fields.
#[derive(Debug, Clone, Serialize)]
pub struct FairnessResult {
    pub approval_rates_by_gender: HashMap<String, GroupRate>,
    pub approval_rates_by_region: HashMap<String, GroupRate>,
    pub disparate_impact: Option<f64>,
    pub bias_detected: bool,
}

pub fn evaluate_fairness(decisions: &[DecisionWithDemographics]) -> FairnessResult {
    let mut by_gender: HashMap<String, (u32, u32)> = HashMap::new();
    let mut by_region: HashMap<String, (u32, u32)> = HashMap::new();

    for d in decisions {
        let approved = d.decision.decision.eq_ignore_ascii_case("approved");
        let gender_entry = by_gender.entry(d.gender.clone()).or_insert((0, 0));
        gender_entry.0 += 1;
        if approved {
            gender_entry.1 += 1;
        }

        let region_entry = by_region.entry(d.region.clone()).or_insert((0, 0));
        region_entry.0 += 1;
        if approved {
            region_entry.1 += 1;
        }
    }

    let rates_of = |counts: &HashMap<String, (u32, u32)>| -> HashMap<String, GroupRate> {
        counts
            .iter()
            .map(|(k, (total, approved))| {
                let rate = if *total > 0 {
                    *approved as f64 / *total as f64
                } else {
                    0.0
                };
                (
                    k.clone(),
                    GroupRate {
                        approved: *approved,
                        total: *total,
                        rate,
                    },
                )
            })
            .collect()
    };

    let approval_rates_by_gender = rates_of(&by_gender);
    let approval_rates_by_region = rates_of(&by_region);

    let male_rate = approval_rates_by_gender.get("male").map(|g| g.rate).unwrap_or(0.0);
    let female_rate = approval_rates_by_gender.get("female").map(|g| g.rate).unwrap_or(0.0);

    let (disparate_impact, bias_detected) = if male_rate > 0.0 {
        let ratio = female_rate / male_rate;
        (Some(ratio), ratio < 0.80)
    } else {
        (None, false)
    };

    FairnessResult {
        approval_rates_by_gender,
        approval_rates_by_region,
        disparate_impact,
        bias_detected,
    }
}
