use super::policy::CreditPolicy;

/// Everything a rule needs to decide whether it fires. Built once per
/// `DecisionEngine::make_decision` call and passed by reference to every
/// rule in every registry.
pub struct RuleContext<'a> {
    pub credit_score: f64,
    pub fraud_score: f64,
    pub fraud_flags: &'a [String],
    pub fairness_flags: &'a [String],
    pub loan_amount: f64,
    pub policy: &'a CreditPolicy,
}

/// A pure function: no side effects, same context always yields the same
/// verdict. `Some(reason)` means triggered.
pub type Rule = fn(&RuleContext) -> Option<String>;

fn rule_critical_fraud_rejection(ctx: &RuleContext) -> Option<String> {
    if ctx.fraud_score >= ctx.policy.critical_fraud_threshold {
        Some(format!("Critical fraud risk detected (score: {:.2})", ctx.fraud_score))
    } else {
        None
    }
}

fn rule_fraud_ring_detection(ctx: &RuleContext) -> Option<String> {
    if ctx.fraud_flags.iter().any(|f| f.to_lowercase().contains("fraud_ring")) {
        Some("Fraud ring pattern detected".to_string())
    } else {
        None
    }
}

fn rule_low_credit_score_rejection(ctx: &RuleContext) -> Option<String> {
    if ctx.credit_score < ctx.policy.min_credit_score {
        Some(format!(
            "Credit score ({:.1}) below minimum threshold ({})",
            ctx.credit_score, ctx.policy.min_credit_score
        ))
    } else {
        None
    }
}

fn rule_excessive_loan_amount_rejection(ctx: &RuleContext) -> Option<String> {
    if ctx.loan_amount > ctx.policy.max_loan_amount {
        Some("Requested amount exceeds maximum".to_string())
    } else {
        None
    }
}

fn rule_high_fraud_review(ctx: &RuleContext) -> Option<String> {
    if ctx.fraud_score >= ctx.policy.elevated_fraud_threshold
        && ctx.fraud_score < ctx.policy.critical_fraud_threshold
    {
        Some(format!("Elevated fraud risk requires review (score: {:.2})", ctx.fraud_score))
    } else {
        None
    }
}

fn rule_fairness_bias_review(ctx: &RuleContext) -> Option<String> {
    if ctx.fairness_flags.is_empty() {
        None
    } else {
        Some(format!("Fairness bias detected: {}", ctx.fairness_flags.join(", ")))
    }
}

fn rule_borderline_credit_review(ctx: &RuleContext) -> Option<String> {
    if ctx.credit_score >= ctx.policy.min_review_score && ctx.credit_score < ctx.policy.min_approval_score {
        Some("Borderline credit score".to_string())
    } else {
        None
    }
}

fn rule_high_value_loan_review(ctx: &RuleContext) -> Option<String> {
    if ctx.loan_amount >= ctx.policy.require_manual_review_above {
        Some("High-value loan requires review".to_string())
    } else {
        None
    }
}

fn rule_credit_score_approval(ctx: &RuleContext) -> Option<String> {
    if ctx.credit_score >= ctx.policy.min_approval_score && ctx.fraud_score < ctx.policy.critical_fraud_threshold {
        Some("Credit score meets threshold with acceptable fraud risk".to_string())
    } else {
        None
    }
}

/// Highest priority: any firing rejects, reasons accumulate.
pub const REJECTION_RULES: &[Rule] = &[
    rule_critical_fraud_rejection,
    rule_fraud_ring_detection,
    rule_low_credit_score_rejection,
    rule_excessive_loan_amount_rejection,
];

/// Evaluated only once no rejection rule fired.
pub const REVIEW_RULES: &[Rule] = &[
    rule_high_fraud_review,
    rule_fairness_bias_review,
    rule_borderline_credit_review,
    rule_high_value_loan_review,
];

/// Evaluated only once no rejection or review rule fired.
pub const APPROVAL_RULES: &[Rule] = &[rule_credit_score_approval];
