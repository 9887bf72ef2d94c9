//! Prompt templates sent to the inference endpoint.

/// Single-text analysis asking for `{"sentiment", "confidence"}`.
pub fn sentiment_json(text: &str) -> String {
    format!(
        r#"Analyze the sentiment of the following text and answer ONLY with a valid JSON object with exactly this structure:
{{
    "sentiment": "positive" or "negative" or "neutral",
    "confidence": a number between 0.0 and 1.0
}}

Text to analyze: "{}"

Remember: answer ONLY with the JSON object, without any additional text."#,
        text.trim()
    )
}

/// Batch review prompt asking for a single word.
pub fn review_sentiment(text: &str) -> String {
    format!(
        r#"Sentiment (one word: positive, negative, neutral) of: "{}""#,
        text
    )
}

/// Shape the model is asked to fill in for an animal image.
pub const ANIMAL_PROFILE_TEMPLATE: &str = r#"{
  "image": { "filename": "file_name.jpg" },
  "analysis": {
    "common_name": "...",
    "scientific_name": "...",
    "taxonomy": {
      "class": "...",
      "order": "...",
      "family": "..."
    },
    "habitat": {
      "types": ["..."],
      "geographic_regions": ["..."],
      "climate": ["..."]
    },
    "diet": {
      "kind": "...",
      "main_foods": ["..."]
    },
    "physical_traits": {
      "size": {
        "avg_height_cm": "...",
        "avg_weight_kg": "..."
      },
      "dominant_colors": ["..."],
      "distinctive_features": ["..."]
    },
    "conservation_status": {
      "iucn_category": "...",
      "main_threats": ["..."]
    }
  }
}"#;

/// Image analysis prompt for the attached image.
pub fn animal_profile(filename: &str) -> String {
    format!(
        "Analyze this image and return a JSON object with this structure:\n\n{}\n\nFile name: {}\n",
        ANIMAL_PROFILE_TEMPLATE, filename
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AnimalProfile;

    #[test]
    fn test_template_matches_profile_schema() {
        let parsed: Result<AnimalProfile, _> = serde_json::from_str(ANIMAL_PROFILE_TEMPLATE);
        assert!(parsed.is_ok(), "template drifted from schema: {:?}", parsed.err());
    }

    #[test]
    fn test_sentiment_prompt_trims_text() {
        let prompt = sentiment_json("  great game \n");
        assert!(prompt.contains(r#"Text to analyze: "great game""#));
    }

    #[test]
    fn test_animal_prompt_names_file() {
        assert!(animal_profile("owl.png").contains("File name: owl.png"));
    }
}
