use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The business on whose behalf documents are processed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantIdentity {
    pub tenant_id: Uuid,
    pub legal_name: String,
    pub display_name: Option<String>,
    pub vat_number: Option<String>,
    /// Other names that count as "self" (trading names, signatories).
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl TenantIdentity {
    pub fn new(legal_name: &str) -> Self {
        Self {
            tenant_id: Uuid::new_v4(),
            legal_name: legal_name.to_string(),
            display_name: None,
            vat_number: None,
            aliases: Vec::new(),
        }
    }

    pub fn with_vat_number(mut self, vat: &str) -> Self {
        self.vat_number = Some(vat.to_string());
        self
    }

    pub fn with_display_name(mut self, name: &str) -> Self {
        self.display_name = Some(name.to_string());
        self
    }

    pub fn with_alias(mut self, alias: &str) -> Self {
        self.aliases.push(alias.to_string());
        self
    }

    /// True if `vat` is this tenant's tax identifier (formatting ignored).
    pub fn owns_vat(&self, vat: Option<&str>) -> bool {
        match (self.vat_number.as_deref().and_then(normalize_vat), vat.and_then(normalize_vat)) {
            (Some(own), Some(other)) => own == other,
            _ => false,
        }
    }

    /// True if `name` equals the legal name, display name or any alias.
    pub fn owns_name(&self, name: Option<&str>) -> bool {
        let Some(candidate) = name.and_then(normalize_name) else {
            return false;
        };
        std::iter::once(self.legal_name.as_str())
            .chain(self.display_name.as_deref())
            .chain(self.aliases.iter().map(String::as_str))
            .filter_map(normalize_name)
            .any(|own| own == candidate)
    }
}

/// Uppercase alphanumerics only: "be 0123.456.789" → "BE0123456789".
pub fn normalize_vat(vat: &str) -> Option<String> {
    let normalized: String = vat
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_uppercase())
        .collect();
    (!normalized.is_empty()).then_some(normalized)
}

/// Lowercase with whitespace runs collapsed to a single space.
pub fn normalize_name(name: &str) -> Option<String> {
    let normalized = name
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    (!normalized.is_empty()).then_some(normalized)
}
