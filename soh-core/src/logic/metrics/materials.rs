//! Recyclable material content by chemistry
//!
//! Lookup table, not a model. Values are BatPaC-style estimates for a
//! 60 kWh pack. A profile matches when the chemistry string contains any of
//! its markers; anything unmatched uses the fallback row.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Element name → grams
pub type MaterialComposition = BTreeMap<String, u32>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialProfile {
    pub name: String,
    #[serde(default)]
    pub markers: Vec<String>,
    pub composition: MaterialComposition,
}

impl MaterialProfile {
    pub fn matches(&self, chemistry: &str) -> bool {
        self.markers.iter().any(|m| chemistry.contains(m.as_str()))
    }
}

fn composition(entries: &[(&str, u32)]) -> MaterialComposition {
    entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialTable {
    /// Checked in order, first match wins
    pub profiles: Vec<MaterialProfile>,
    pub fallback: MaterialProfile,
}

impl Default for MaterialTable {
    fn default() -> Self {
        Self {
            profiles: vec![MaterialProfile {
                name: "LFP".to_string(),
                markers: vec!["LFP".to_string(), "LiFePO4".to_string()],
                composition: composition(&[
                    ("lithium_g", 3600), // ~60g/kWh
                    ("nickel_g", 0),
                    ("cobalt_g", 0),
                    ("iron_g", 48000),
                ]),
            }],
            fallback: MaterialProfile {
                name: "NMC".to_string(),
                markers: Vec::new(),
                composition: composition(&[
                    ("lithium_g", 5400),  // ~90g/kWh
                    ("nickel_g", 28000),  // ~470g/kWh
                    ("cobalt_g", 8000),   // ~130g/kWh
                ]),
            },
        }
    }
}

impl MaterialTable {
    pub fn profile_for(&self, chemistry: &str) -> &MaterialProfile {
        self.profiles
            .iter()
            .find(|p| p.matches(chemistry))
            .unwrap_or(&self.fallback)
    }

    pub fn composition_for(&self, chemistry: &str) -> MaterialComposition {
        self.profile_for(chemistry).composition.clone()
    }
}
