use opentelemetry::KeyValue;
use opentelemetry_sdk::Resource;
use opentelemetry_semantic_conventions::resource::{HOST_NAME, SERVICE_NAME, SERVICE_VERSION};

use crate::generator::config::GeneratorConfig;

/// Resource key for the deployment environment, kept short for downstream filters
pub const ENVIRONMENT: &str = "environment";

/// Identity attributes shared by every record of one session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDescriptor {
    service_name: String,
    service_version: String,
    environment: String,
    host_name: String,
}

impl ResourceDescriptor {
    pub fn from_config(config: &GeneratorConfig) -> Self {
        Self {
            service_name: config.service_name.clone(),
            service_version: config.service_version.clone(),
            environment: config.environment.clone(),
            host_name: config.host_name.clone(),
        }
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Attribute pairs in a fixed order
    pub fn entries(&self) -> [(&'static str, &str); 4] {
        [
            (SERVICE_NAME, &self.service_name),
            (SERVICE_VERSION, &self.service_version),
            (ENVIRONMENT, &self.environment),
            (HOST_NAME, &self.host_name),
        ]
    }

    pub fn attributes(&self) -> Vec<KeyValue> {
        self.entries()
            .into_iter()
            .map(|(key, value)| KeyValue::new(key, value.to_string()))
            .collect()
    }

    pub fn to_resource(&self) -> Resource {
        Resource::builder()
            .with_attributes(self.attributes())
            .build()
    }
}
