//! Federation component configuration.
//!
//! A storage provider is configured from a [`ComponentModel`]: an id, a
//! display name and a flat string-keyed configuration map saved by the
//! admin console. Providers describe the keys they understand with
//! [`ConfigProperty`] descriptors.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A configured instance of a storage provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentModel {
    /// Unique identifier of this component. Becomes the provider part of
    /// every storage id the provider hands out.
    pub id: String,

    /// Provider type (the factory id, e.g. "jdbc-user-storage").
    pub provider_type: String,

    /// Display name.
    pub name: String,

    /// Provider-specific configuration.
    #[serde(default)]
    pub config: HashMap<String, String>,
}

impl ComponentModel {
    /// Creates a new component builder.
    #[must_use]
    pub fn builder() -> ComponentModelBuilder {
        ComponentModelBuilder::default()
    }

    /// Gets a config value by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.config.get(key).map(String::as_str)
    }

    /// Gets a config value, treating blank values as absent.
    #[must_use]
    pub fn get_non_empty(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|v| !v.trim().is_empty())
    }

    /// Gets a config value as u64.
    #[must_use]
    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.get(key).and_then(|v| v.trim().parse().ok())
    }
}

/// Builder for [`ComponentModel`].
#[derive(Debug, Default)]
pub struct ComponentModelBuilder {
    id: Option<String>,
    provider_type: Option<String>,
    name: Option<String>,
    config: HashMap<String, String>,
}

impl ComponentModelBuilder {
    /// Sets the component id. A fresh UUID is used when unset.
    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Sets the provider type.
    #[must_use]
    pub fn provider_type(mut self, provider_type: impl Into<String>) -> Self {
        self.provider_type = Some(provider_type.into());
        self
    }

    /// Sets the display name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Adds a config value.
    #[must_use]
    pub fn config(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.insert(key.into(), value.into());
        self
    }

    /// Adds every entry of a config map.
    #[must_use]
    pub fn configs<K, V>(mut self, entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.config
            .extend(entries.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Builds the component.
    #[must_use]
    pub fn build(self) -> ComponentModel {
        let provider_type = self.provider_type.unwrap_or_default();
        ComponentModel {
            id: self.id.unwrap_or_else(|| Uuid::now_v7().to_string()),
            name: self.name.unwrap_or_else(|| provider_type.clone()),
            provider_type,
            config: self.config,
        }
    }
}

/// Kind of input the admin console renders for a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfigPropertyType {
    /// Free text.
    String,
    /// Secret text, masked in the console and never echoed back.
    Password,
    /// Selection from a fixed list of options.
    List,
}

/// Describes one configuration key a provider understands.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigProperty {
    /// Configuration key.
    pub name: &'static str,
    /// Label shown in the admin console.
    pub label: &'static str,
    /// Help text.
    pub help_text: &'static str,
    /// Input type.
    pub property_type: ConfigPropertyType,
    /// Default value, if any.
    pub default_value: Option<&'static str>,
    /// Allowed values for [`ConfigPropertyType::List`].
    pub options: Vec<&'static str>,
    /// Whether the value is a secret.
    pub secret: bool,
}

impl ConfigProperty {
    /// A plain string property.
    #[must_use]
    pub const fn string(name: &'static str, label: &'static str, help_text: &'static str) -> Self {
        Self {
            name,
            label,
            help_text,
            property_type: ConfigPropertyType::String,
            default_value: None,
            options: Vec::new(),
            secret: false,
        }
    }

    /// A secret property.
    #[must_use]
    pub const fn password(
        name: &'static str,
        label: &'static str,
        help_text: &'static str,
    ) -> Self {
        Self {
            name,
            label,
            help_text,
            property_type: ConfigPropertyType::Password,
            default_value: None,
            options: Vec::new(),
            secret: true,
        }
    }

    /// Sets the default value.
    #[must_use]
    pub fn with_default(mut self, value: &'static str) -> Self {
        self.default_value = Some(value);
        self
    }

    /// A list property with a default.
    #[must_use]
    pub fn list(
        name: &'static str,
        label: &'static str,
        help_text: &'static str,
        default_value: &'static str,
        options: Vec<&'static str>,
    ) -> Self {
        Self {
            name,
            label,
            help_text,
            property_type: ConfigPropertyType::List,
            default_value: Some(default_value),
            options,
            secret: false,
        }
    }
}
