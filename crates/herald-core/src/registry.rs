use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use crate::error::{HeraldError, Result};
use crate::types::Endpoint;

/// Ordered, non-empty, immutable list of delivery targets for one campaign
/// family (broadcast or lead generation).
///
/// Cloning is a reference-count bump; the endpoint list itself can never be
/// mutated after construction.
#[derive(Debug, Clone)]
pub struct EndpointRegistry {
    family: String,
    endpoints: Arc<[Endpoint]>,
}

impl EndpointRegistry {
    /// Validate and freeze an endpoint list.
    ///
    /// Fails with [`HeraldError::Config`] when the list is empty and with
    /// [`HeraldError::InvalidEndpoint`] for blank names/URLs or duplicate names.
    pub fn new(family: impl Into<String>, endpoints: Vec<Endpoint>) -> Result<Self> {
        let family = family.into();
        if endpoints.is_empty() {
            return Err(HeraldError::Config(format!(
                "endpoint registry '{family}' is empty"
            )));
        }

        let mut seen = HashSet::new();
        for endpoint in &endpoints {
            if endpoint.name.trim().is_empty() {
                return Err(HeraldError::InvalidEndpoint {
                    name: endpoint.url.clone(),
                    reason: "name must not be blank".into(),
                });
            }
            if endpoint.url.trim().is_empty() {
                return Err(HeraldError::InvalidEndpoint {
                    name: endpoint.name.clone(),
                    reason: "url must not be blank".into(),
                });
            }
            if !seen.insert(endpoint.name.as_str()) {
                return Err(HeraldError::InvalidEndpoint {
                    name: endpoint.name.clone(),
                    reason: format!("duplicate name in registry '{family}'"),
                });
            }
        }

        debug!(family = %family, endpoints = endpoints.len(), "endpoint registry built");
        Ok(Self {
            family,
            endpoints: endpoints.into(),
        })
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    pub fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Endpoint> {
        self.endpoints.iter()
    }

    /// Always at least 1.
    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn get(&self, name: &str) -> Option<&Endpoint> {
        self.endpoints.iter().find(|e| e.name == name)
    }
}

impl<'a> IntoIterator for &'a EndpointRegistry {
    type Item = &'a Endpoint;
    type IntoIter = std::slice::Iter<'a, Endpoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EndpointKind;

    fn ep(name: &str) -> Endpoint {
        Endpoint::new(name, format!("https://{name}.test/api"), EndpointKind::Main, true)
    }

    #[test]
    fn empty_registry_is_a_config_error() {
        let err = EndpointRegistry::new("broadcast", vec![]).unwrap_err();
        assert_eq!(err.code(), "CONFIG_ERROR");
        assert!(err.to_string().contains("broadcast"));
    }

    #[test]
    fn preserves_declaration_order() {
        let registry = EndpointRegistry::new("broadcast", vec![ep("b"), ep("a"), ep("c")]).unwrap();
        let names: Vec<&str> = registry.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["b", "a", "c"]);
        assert_eq!(registry.len(), 3);
        assert!(!registry.is_empty());
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let err = EndpointRegistry::new("leads", vec![ep("a"), ep("a")]).unwrap_err();
        assert!(matches!(err, HeraldError::InvalidEndpoint { ref name, .. } if name == "a"));
    }

    #[test]
    fn blank_url_is_rejected() {
        let mut bad = ep("a");
        bad.url = "  ".into();
        let err = EndpointRegistry::new("leads", vec![bad]).unwrap_err();
        assert_eq!(err.code(), "INVALID_ENDPOINT");
    }

    #[test]
    fn lookup_by_name() {
        let registry = EndpointRegistry::new("broadcast", vec![ep("a"), ep("b")]).unwrap();
        assert_eq!(registry.get("b").map(|e| e.url.as_str()), Some("https://b.test/api"));
        assert!(registry.get("zzz").is_none());
    }
}
