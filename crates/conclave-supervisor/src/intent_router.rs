//! Deterministic intent classification (spec.md §4.4), ported from
//! `original_source/Cybersecurity-Agent/shared/supervisor_intents.py::detect_intent`.
//! The keyword table is data (`Vec<IntentRule>`), not a cascade of `if`s
//! tied to one domain — a deployment with a different vocabulary swaps
//! in its own table and gets the same ordered-rule, first-match-wins
//! semantics.

use conclave_core::intent::{extract_cve, extract_domain, Intent, IntentMatch};

/// One entry in the keyword table: if any of `keywords` appears in the
/// lowercased message, `intent` is returned immediately.
#[derive(Debug, Clone)]
pub struct IntentRule {
    pub intent: &'static str,
    pub keywords: &'static [&'static str],
}

/// The illustrative default table, matching the original's five
/// named intents plus the `direct_answer` fallback.
pub const DEFAULT_RULES: &[IntentRule] = &[
    IntentRule { intent: "report_generation", keywords: &["generate report"] },
    IntentRule {
        intent: "session_analysis",
        keywords: &["which vulnerability", "most critical", "highest risk", "fix first", "what should we fix first"],
    },
    IntentRule {
        intent: "threat_only",
        keywords: &["actively exploited", "exploit available", "is this exploited"],
    },
    IntentRule {
        intent: "risk_assessment",
        keywords: &["analyze risk", "risk for cve", "affected by"],
    },
    IntentRule {
        intent: "recon_only",
        keywords: &["scan ports", "port scan", "dns", "whois", "recon"],
    },
];

pub struct IntentRouter {
    rules: Vec<IntentRule>,
}

impl Default for IntentRouter {
    fn default() -> Self {
        Self::new(DEFAULT_RULES.to_vec())
    }
}

impl IntentRouter {
    pub fn new(rules: Vec<IntentRule>) -> Self {
        Self { rules }
    }

    /// Pure: same input, same output, no I/O, no LLM calls.
    pub fn detect_intent(&self, message: &str) -> IntentMatch {
        let lower = message.to_lowercase();
        let cve = extract_cve(message);
        let domain = extract_domain(message);

        for rule in &self.rules {
            if rule.keywords.iter().any(|k| lower.contains(k)) {
                return build_match(rule.intent, &cve, &domain);
            }
        }

        // Entity-combination rule: a CVE plus a domain implies risk
        // assessment even without an explicit keyword match.
        if cve.is_some() && domain.is_some() {
            return build_match("risk_assessment", &cve, &domain);
        }

        build_match("direct_answer", &cve, &domain)
    }
}

fn build_match(intent: &str, cve: &Option<String>, domain: &Option<String>) -> IntentMatch {
    let mut m = IntentMatch::new(Intent::new(intent));
    if let Some(cve) = cve {
        m = m.with_entity("cve", cve.clone());
    }
    if let Some(domain) = domain {
        m = m.with_entity("domain", domain.clone());
    }
    m
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_explicit_keyword_first() {
        let router = IntentRouter::default();
        let m = router.detect_intent("please generate report for this session");
        assert_eq!(m.intent.as_str(), "report_generation");
    }

    #[test]
    fn threat_only_does_not_require_a_domain() {
        let router = IntentRouter::default();
        let m = router.detect_intent("is CVE-2021-44228 actively exploited?");
        assert_eq!(m.intent.as_str(), "threat_only");
        assert_eq!(m.entity("cve"), Some("CVE-2021-44228"));
        assert_eq!(m.entity("domain"), None);
    }

    #[test]
    fn cve_and_domain_together_implies_risk_assessment() {
        let router = IntentRouter::default();
        let m = router.detect_intent("is example.com affected by CVE-2021-44228");
        assert_eq!(m.intent.as_str(), "risk_assessment");
    }

    #[test]
    fn falls_back_to_direct_answer() {
        let router = IntentRouter::default();
        let m = router.detect_intent("what's the weather like");
        assert_eq!(m.intent.as_str(), "direct_answer");
    }

    #[test]
    fn recon_keywords_map_to_recon_only() {
        let router = IntentRouter::default();
        let m = router.detect_intent("can you run a port scan on 10.0.0.1");
        assert_eq!(m.intent.as_str(), "recon_only");
    }

    #[test]
    fn rule_order_determines_first_match() {
        // Contains both a report_generation and a recon keyword; the
        // earlier rule in DEFAULT_RULES wins.
        let router = IntentRouter::default();
        let m = router.detect_intent("please generate report after the port scan");
        assert_eq!(m.intent.as_str(), "report_generation");
    }
}
