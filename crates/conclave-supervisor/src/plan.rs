//! Fixed per-intent tool plans (spec.md §4.5 "Reason"): "for multi-tool
//! intents ... the plan is fixed by intent." Grounded in the illustrative
//! risk-assessment pipeline spec.md itself describes (CVSS -> EPSS -> KEV
//! -> exploit -> ports -> risk engine).

use serde_json::Value;
use std::collections::HashMap;

/// One step of a plan: call `tool` with `args` (a template the
/// orchestrator fills from the turn's entities before dispatch).
#[derive(Debug, Clone)]
pub struct PlanStep {
    pub tool: String,
    pub args_template: Value,
    /// Steps whose results this one depends on; empty means it can run
    /// concurrently with any other step that doesn't depend on it.
    pub depends_on: Vec<String>,
    /// A critical step's failure aborts the remaining plan; a
    /// non-critical one is recorded and the plan continues with a
    /// partial result (spec.md §4.5 "Act").
    pub critical: bool,
}

impl PlanStep {
    pub fn new(tool: impl Into<String>, args_template: Value) -> Self {
        Self {
            tool: tool.into(),
            args_template,
            depends_on: Vec::new(),
            critical: false,
        }
    }

    pub fn depends_on(mut self, tools: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.depends_on = tools.into_iter().map(Into::into).collect();
        self
    }

    pub fn critical(mut self) -> Self {
        self.critical = true;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct ToolPlan(pub Vec<PlanStep>);

/// Intent name -> fixed plan. Built once at startup from a deployment's
/// own tool set; `conclave-demo-tools` supplies a toy version for tests.
pub type PlanTable = HashMap<String, ToolPlan>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn plan_step_builder_sets_dependencies_and_criticality() {
        let step = PlanStep::new("kev_lookup", json!({"cve": "{{cve}}"}))
            .depends_on(["cvss_lookup"])
            .critical();
        assert_eq!(step.tool, "kev_lookup");
        assert_eq!(step.depends_on, vec!["cvss_lookup".to_string()]);
        assert!(step.critical);
    }
}
