use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderType {
    Physician,
    Hospital,
    Imaging,
    Pt,
    Er,
    Pcp,
    Specialist,
    Unknown,
}

impl ProviderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderType::Physician => "physician",
            ProviderType::Hospital => "hospital",
            ProviderType::Imaging => "imaging",
            ProviderType::Pt => "pt",
            ProviderType::Er => "er",
            ProviderType::Pcp => "pcp",
            ProviderType::Specialist => "specialist",
            ProviderType::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderEvidence {
    pub page: u32,
    pub snippet: String,
    pub bbox: super::page::Layout,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Provider {
    pub provider_id: String,
    pub detected_name_raw: String,
    pub normalized_name: String,
    pub provider_type: ProviderType,
    pub confidence: i32,
    pub evidence: Vec<ProviderEvidence>,
}

impl Provider {
    pub fn unknown(provider_id: impl Into<String>) -> Self {
        Self {
            provider_id: provider_id.into(),
            detected_name_raw: "Unknown Provider".to_string(),
            normalized_name: "unknown provider".to_string(),
            provider_type: ProviderType::Unknown,
            confidence: 0,
            evidence: Vec::new(),
        }
    }

    pub fn is_known(&self) -> bool {
        self.provider_id != "unknown"
    }
}
