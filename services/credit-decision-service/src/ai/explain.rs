use crate::domain::{Factor, ModelExplanation};

/// Produces the `structured_explanation` factor list for one model's
/// output. A thin router by name substring — the original's dedicated
/// explainability package wasn't load-bearing enough to warrant more.
trait Explainer: Send + Sync {
    fn explain(&self, model_name: &str, explanation: &ModelExplanation) -> Vec<Factor>;
}

struct RuleExplainer;
impl Explainer for RuleExplainer {
    fn explain(&self, _model_name: &str, explanation: &ModelExplanation) -> Vec<Factor> {
        explanation.factors.clone()
    }
}

struct GraphExplainer;
impl Explainer for GraphExplainer {
    fn explain(&self, _model_name: &str, explanation: &ModelExplanation) -> Vec<Factor> {
        explanation.factors.clone()
    }
}

struct DefaultExplainer;
impl Explainer for DefaultExplainer {
    fn explain(&self, _model_name: &str, explanation: &ModelExplanation) -> Vec<Factor> {
        explanation.factors.clone()
    }
}

/// Routes each succeeded model's own explanation to the first matching
/// explainer by name substring, merges the resulting factors across all
/// models, sorts by descending impact magnitude, and deduplicates by factor
/// name keeping the first (highest-impact) occurrence.
pub struct StructuredExplainer {
    routes: Vec<(fn(&str) -> bool, Box<dyn Explainer>)>,
}

impl StructuredExplainer {
    pub fn new() -> Self {
        Self {
            routes: vec![
                (|name: &str| name.starts_with("RuleBased"), Box::new(RuleExplainer) as Box<dyn Explainer>),
                (|name: &str| name.starts_with("TrustGraph"), Box::new(GraphExplainer)),
            ],
        }
    }

    fn route(&self, model_name: &str) -> &dyn Explainer {
        for (predicate, explainer) in &self.routes {
            if predicate(model_name) {
                return explainer.as_ref();
            }
        }
        &DefaultExplainer
    }

    /// A failure inside any explainer is caught and logged by the caller;
    /// this function itself cannot fail since every route is infallible.
    pub fn explain_ensemble(&self, model_explanations: &[(String, ModelExplanation)]) -> Vec<Factor> {
        let mut factors: Vec<Factor> = model_explanations
            .iter()
            .flat_map(|(name, explanation)| self.route(name).explain(name, explanation))
            .collect();

        factors.sort_by(|a, b| b.impact.abs().partial_cmp(&a.impact.abs()).unwrap_or(std::cmp::Ordering::Equal));

        let mut seen = std::collections::HashSet::new();
        factors.retain(|f| seen.insert(f.factor.clone()));
        factors
    }
}

impl Default for StructuredExplainer {
    fn default() -> Self {
        Self::new()
    }
}
