//! Startup-time discovery of which tools live behind which endpoint
//! (spec.md §4.6): loaded best-effort, never fatal when an endpoint is
//! unreachable.

use conclave_core::tool::ToolDescriptor;
use dashmap::DashMap;

/// `name -> endpoint` for every tool across every reachable server, plus
/// the reverse `endpoint -> descriptors` needed for `tools/list` fan-out.
#[derive(Default)]
pub struct DescriptorCache {
    endpoint_by_tool: DashMap<String, String>,
    descriptors_by_endpoint: DashMap<String, Vec<ToolDescriptor>>,
}

impl DescriptorCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn install(&self, endpoint: &str, descriptors: Vec<ToolDescriptor>) {
        for descriptor in &descriptors {
            self.endpoint_by_tool.insert(descriptor.name.clone(), endpoint.to_string());
        }
        self.descriptors_by_endpoint.insert(endpoint.to_string(), descriptors);
    }

    pub fn endpoint_for(&self, tool_name: &str) -> Option<String> {
        self.endpoint_by_tool.get(tool_name).map(|e| e.value().clone())
    }

    pub fn all_descriptors(&self) -> Vec<ToolDescriptor> {
        self.descriptors_by_endpoint
            .iter()
            .flat_map(|entry| entry.value().clone())
            .collect()
    }

    pub fn endpoint_count(&self) -> usize {
        self.descriptors_by_endpoint.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn installing_two_endpoints_merges_their_tools() {
        let cache = DescriptorCache::new();
        cache.install("http://a", vec![ToolDescriptor::new("tool_a", "a")]);
        cache.install("http://b", vec![ToolDescriptor::new("tool_b", "b")]);

        assert_eq!(cache.endpoint_for("tool_a"), Some("http://a".to_string()));
        assert_eq!(cache.endpoint_for("tool_b"), Some("http://b".to_string()));
        assert_eq!(cache.endpoint_for("missing"), None);
        assert_eq!(cache.endpoint_count(), 2);
        assert_eq!(cache.all_descriptors().len(), 2);
    }

    #[test]
    fn a_missing_endpoint_never_panics_lookups() {
        let cache = DescriptorCache::new();
        assert_eq!(cache.endpoint_for("anything"), None);
        assert!(cache.all_descriptors().is_empty());
    }
}
