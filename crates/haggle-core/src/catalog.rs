//! Resource catalog
//!
//! The catalog is built once at process start and never mutated. Every
//! entry's pricing invariant (`floor <= list`) is checked at construction.

use haggle_types::{HaggleError, Price, Resource, ResourceId, Result};
use std::collections::HashMap;

/// Immutable catalog of sellable resources
#[derive(Debug, Clone)]
pub struct Catalog {
    entries: HashMap<ResourceId, Resource>,
}

impl Catalog {
    /// Build a catalog, validating every entry
    pub fn new(resources: Vec<Resource>) -> Result<Self> {
        let mut entries = HashMap::with_capacity(resources.len());
        for resource in resources {
            resource.validate()?;
            entries.insert(resource.id.clone(), resource);
        }
        Ok(Self { entries })
    }

    /// Look up a resource, failing with `ResourceNotFound` for unknown ids
    pub fn get(&self, id: &ResourceId) -> Result<&Resource> {
        self.entries
            .get(id)
            .ok_or_else(|| HaggleError::resource_not_found(id.as_str()))
    }

    /// All resources, sorted by id for stable listings
    pub fn list(&self) -> Vec<&Resource> {
        let mut resources: Vec<_> = self.entries.values().collect();
        resources.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));
        resources
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Demo catalog used by the server and CLI scenario
    pub fn demo() -> Self {
        let resources = vec![
            Resource {
                id: ResourceId::new("housing"),
                name: "Housing Market Dataset".to_string(),
                description: "Monthly median home prices for 400 metro areas".to_string(),
                format: "csv".to_string(),
                size: "2.4 MB".to_string(),
                list_price: Price::new(10),
                floor_price: Price::new(8),
                category: "datasets".to_string(),
            },
            Resource {
                id: ResourceId::new("llm_paper"),
                name: "Survey of LLM Inference Optimization".to_string(),
                description: "80-page survey of serving-time optimization techniques".to_string(),
                format: "pdf".to_string(),
                size: "6.1 MB".to_string(),
                list_price: Price::new(13),
                floor_price: Price::new(12),
                category: "papers".to_string(),
            },
            Resource {
                id: ResourceId::new("market_report"),
                name: "Q2 Agent Commerce Report".to_string(),
                description: "Quarterly analysis of agent-to-agent transaction volume".to_string(),
                format: "pdf".to_string(),
                size: "3.8 MB".to_string(),
                list_price: Price::new(25),
                floor_price: Price::new(18),
                category: "reports".to_string(),
            },
        ];

        Self::new(resources).expect("demo catalog entries are valid")
    }
}
