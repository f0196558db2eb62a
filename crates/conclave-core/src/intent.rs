//! Shared intent-routing vocabulary (spec.md §4.4).
//!
//! The classifier itself (the ordered keyword table) is deployment data
//! that lives in `conclave_supervisor::intent_router` — this module only
//! owns the result shape and the bounded-regex entity extractors, which
//! are generic enough to belong at the core layer. Entity patterns are
//! generalized from
//! `original_source/Cybersecurity-Agent/shared/supervisor_intents.py`
//! (CVE, hostname/URL) plus GHSA, GitHub `owner/repo`, and IPv4, which the
//! distillation's other specialist corpora reference but that file didn't
//! need.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A classified intent. Deployments name their own intents; the router
/// treats this as an opaque, interned string rather than a closed enum so
/// one binary can serve more than one keyword table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Intent(pub String);

impl Intent {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Entities pulled out of the user's message alongside the classified
/// intent, keyed by a stable name (`"cve"`, `"domain"`, `"repo"`, ...) so
/// plan steps can reference them without a fixed schema per deployment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentMatch {
    pub intent: Intent,
    pub entities: HashMap<String, String>,
}

impl IntentMatch {
    pub fn new(intent: Intent) -> Self {
        Self {
            intent,
            entities: HashMap::new(),
        }
    }

    pub fn with_entity(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entities.insert(key.into(), value.into());
        self
    }

    pub fn entity(&self, key: &str) -> Option<&str> {
        self.entities.get(key).map(String::as_str)
    }
}

impl Default for Intent {
    fn default() -> Self {
        Intent("direct_answer".to_string())
    }
}

static CVE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bCVE-\d{4}-\d{4,7}\b").unwrap());
static GHSA_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bGHSA-[a-z0-9]{4}-[a-z0-9]{4}-[a-z0-9]{4}\b").unwrap());
static URL_HOST_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)https?://([^/\s]+)").unwrap());
static DOMAIN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(?:[a-zA-Z0-9-]+\.)+[a-zA-Z]{2,}\b").unwrap());
static REPO_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b([A-Za-z0-9_.-]+/[A-Za-z0-9_.-]+)\b").unwrap());
static IPV4_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:(?:25[0-5]|2[0-4]\d|1?\d?\d)\.){3}(?:25[0-5]|2[0-4]\d|1?\d?\d)\b").unwrap());

pub fn extract_cve(text: &str) -> Option<String> {
    CVE_RE.find(text).map(|m| m.as_str().to_uppercase())
}

pub fn extract_ghsa(text: &str) -> Option<String> {
    GHSA_RE.find(text).map(|m| m.as_str().to_lowercase())
}

/// Prefers a URL hostname over a bare domain-looking token, matching
/// `supervisor_intents.py::extract_domain`.
pub fn extract_domain(text: &str) -> Option<String> {
    if let Some(caps) = URL_HOST_RE.captures(text) {
        return Some(trim_punctuation(&caps[1]));
    }
    DOMAIN_RE.find(text).map(|m| trim_punctuation(m.as_str()))
}

pub fn extract_repo(text: &str) -> Option<String> {
    REPO_RE.find(text).map(|m| m.as_str().to_string())
}

pub fn extract_ipv4(text: &str) -> Option<String> {
    IPV4_RE.find(text).map(|m| m.as_str().to_string())
}

fn trim_punctuation(s: &str) -> String {
    s.trim_matches(|c: char| ".,;:()[]{}<>\"'".contains(c)).to_string()
}
