//! Structured result of an animal image analysis.
//!
//! Every field is required: a reply missing any of them does not
//! deserialize, so a partially filled profile can never be produced.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimalProfile {
    pub image: ImageRef,
    pub analysis: AnimalAnalysis,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRef {
    pub filename: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimalAnalysis {
    pub common_name: String,
    pub scientific_name: String,
    pub taxonomy: Taxonomy,
    pub habitat: Habitat,
    pub diet: Diet,
    pub physical_traits: PhysicalTraits,
    pub conservation_status: ConservationStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Taxonomy {
    pub class: String,
    pub order: String,
    pub family: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Habitat {
    pub types: Vec<String>,
    pub geographic_regions: Vec<String>,
    pub climate: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diet {
    pub kind: String,
    pub main_foods: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysicalTraits {
    pub size: Size,
    pub dominant_colors: Vec<String>,
    pub distinctive_features: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub avg_height_cm: Measure,
    pub avg_weight_kg: Measure,
}

/// Models answer sizes either as numbers or as ranges like "90-120".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Measure {
    Number(f64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConservationStatus {
    pub iucn_category: String,
    pub main_threats: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn lion() -> serde_json::Value {
        json!({
            "image": {"filename": "lion.jpg"},
            "analysis": {
                "common_name": "Lion",
                "scientific_name": "Panthera leo",
                "taxonomy": {"class": "Mammalia", "order": "Carnivora", "family": "Felidae"},
                "habitat": {
                    "types": ["savanna"],
                    "geographic_regions": ["Sub-Saharan Africa"],
                    "climate": ["tropical"]
                },
                "diet": {"kind": "carnivore", "main_foods": ["zebra", "wildebeest"]},
                "physical_traits": {
                    "size": {"avg_height_cm": 120, "avg_weight_kg": "150-250"},
                    "dominant_colors": ["tawny"],
                    "distinctive_features": ["mane"]
                },
                "conservation_status": {"iucn_category": "VU", "main_threats": ["habitat loss"]}
            }
        })
    }

    #[test]
    fn test_complete_profile_parses() {
        let profile: AnimalProfile = serde_json::from_value(lion()).unwrap();
        assert_eq!(profile.analysis.scientific_name, "Panthera leo");
        assert_eq!(profile.analysis.physical_traits.size.avg_height_cm, Measure::Number(120.0));
        assert_eq!(
            profile.analysis.physical_traits.size.avg_weight_kg,
            Measure::Text("150-250".to_string())
        );
    }

    #[test]
    fn test_missing_nested_field_rejected() {
        let mut value = lion();
        value["analysis"]["taxonomy"]
            .as_object_mut()
            .unwrap()
            .remove("family");
        assert!(serde_json::from_value::<AnimalProfile>(value).is_err());
    }

    #[test]
    fn test_null_field_rejected() {
        let mut value = lion();
        value["analysis"]["common_name"] = serde_json::Value::Null;
        assert!(serde_json::from_value::<AnimalProfile>(value).is_err());
    }
}
