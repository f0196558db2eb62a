//! A toy `PlanTable` matching `conclave-demo-tools`' tool names — the
//! illustrative CVSS -> EPSS -> KEV -> exploit -> ports -> risk-engine
//! pipeline spec.md §4.5 describes as its worked example. Real
//! deployments build their own table from their own specialist's tools;
//! this one exists so the fleet launched by `conclave` has something to
//! route to out of the box.

use crate::plan::{PlanStep, PlanTable, ToolPlan};
use serde_json::json;

pub fn default_plan_table() -> PlanTable {
    let mut table = PlanTable::new();

    table.insert(
        "risk_assessment".to_string(),
        ToolPlan(vec![
            PlanStep::new("cvss_lookup", json!({"cve": "{{cve}}"})).critical(),
            PlanStep::new("epss_lookup", json!({"cve": "{{cve}}"})),
            PlanStep::new("kev_lookup", json!({"cve": "{{cve}}"})),
            PlanStep::new("exploit_lookup", json!({"cve": "{{cve}}"})),
            PlanStep::new(
                "risk_engine",
                json!({"cve": "{{cve}}", "domain": "{{domain}}"}),
            )
            .depends_on(["cvss_lookup", "epss_lookup", "kev_lookup", "exploit_lookup"]),
        ]),
    );

    table.insert(
        "threat_only".to_string(),
        ToolPlan(vec![
            PlanStep::new("kev_lookup", json!({"cve": "{{cve}}"})),
            PlanStep::new("exploit_lookup", json!({"cve": "{{cve}}"})),
        ]),
    );

    table.insert(
        "recon_only".to_string(),
        ToolPlan(vec![PlanStep::new("ports_scan", json!({"domain": "{{domain}}"})).critical()]),
    );

    // No tool calls of its own: "which should we fix first" is answered
    // from artifacts earlier `risk_assessment` turns already recorded
    // (see `render::render_deterministic`'s `session_analysis` branch),
    // not by re-running `risk_engine` against the current turn's
    // (usually absent) `cve`/`domain` entities.
    table.insert("session_analysis".to_string(), ToolPlan::default());

    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn risk_assessment_plan_has_a_dependent_final_step() {
        let table = default_plan_table();
        let plan = table.get("risk_assessment").unwrap();
        let risk_engine = plan.0.iter().find(|s| s.tool == "risk_engine").unwrap();
        assert_eq!(risk_engine.depends_on.len(), 4);
    }

    #[test]
    fn direct_answer_has_no_plan() {
        let table = default_plan_table();
        assert!(table.get("direct_answer").is_none());
    }
}
