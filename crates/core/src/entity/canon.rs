//! Canonical entity names.

use std::fmt;

/// The canonical name of an entity kind: an optional zone, an optional
/// base (namespace), and the kind name itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Canon {
    zone: Option<String>,
    base: Option<String>,
    name: String,
}

impl Canon {
    /// Creates a canon with just a kind name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            zone: None,
            base: None,
            name: name.into(),
        }
    }

    /// Sets the base (namespace) component.
    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        self.base = Some(base.into());
        self
    }

    /// Sets the zone component.
    pub fn with_zone(mut self, zone: impl Into<String>) -> Self {
        self.zone = Some(zone.into());
        self
    }

    /// Parses a `zone/base/name` string; missing leading components may be
    /// omitted (`base/name` or `name`).
    pub fn parse(key: &str) -> Self {
        let parts: Vec<&str> = key.split('/').collect();
        match parts.as_slice() {
            [zone, base, name] => Canon {
                zone: Some(zone.to_string()),
                base: Some(base.to_string()),
                name: name.to_string(),
            },
            [base, name] => Canon {
                zone: None,
                base: Some(base.to_string()),
                name: name.to_string(),
            },
            _ => Canon::new(key),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base(&self) -> Option<&str> {
        self.base.as_deref()
    }

    pub fn zone(&self) -> Option<&str> {
        self.zone.as_deref()
    }

    /// The fully qualified key: present components joined by `/`.
    pub fn key(&self) -> String {
        let mut parts = Vec::with_capacity(3);
        if let Some(zone) = &self.zone {
            parts.push(zone.as_str());
        }
        if let Some(base) = &self.base {
            parts.push(base.as_str());
        }
        parts.push(self.name.as_str());
        parts.join("/")
    }

    /// Configuration lookup candidates, most qualified first: the full
    /// key, then with the zone stripped, then the bare kind name. Lookup
    /// degrades gracefully to the least qualified form.
    pub fn candidates(&self) -> Vec<String> {
        let mut out = Vec::with_capacity(3);
        out.push(self.key());
        if self.zone.is_some() {
            if let Some(base) = &self.base {
                out.push(format!("{}/{}", base, self.name));
            }
        }
        if self.zone.is_some() || self.base.is_some() {
            out.push(self.name.clone());
        }
        out
    }

    /// The default physical table name when no explicit configuration
    /// exists: `{base}_{name}`, or just `{name}` without a base.
    pub fn default_table_name(&self) -> String {
        match &self.base {
            Some(base) => format!("{}_{}", base, self.name),
            None => self.name.clone(),
        }
    }
}

impl fmt::Display for Canon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}
