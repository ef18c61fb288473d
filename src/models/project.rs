use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProjectStatus {
    InProgress,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationKind {
    Text,
    Image,
}

/// Style knobs shared by text and image generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleParameters {
    pub style: String,
    pub creativity: f64,
    pub temperature: f64,
    pub strength: f64,
    /// Target length in characters for text output
    pub length: usize,
}

impl Default for StyleParameters {
    fn default() -> Self {
        Self {
            style: "default".to_string(),
            creativity: 0.5,
            temperature: 0.7,
            strength: 0.8,
            length: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub id: Uuid,
    pub prompt: String,
    pub kind: GenerationKind,
    #[serde(default)]
    pub texts: Vec<String>,
    /// Raw image bytes, base64 in JSON
    #[serde(default, with = "base64_images")]
    pub images: Vec<Vec<u8>>,
    #[serde(default)]
    pub style: StyleParameters,
    pub created_at: DateTime<Utc>,
}

impl GenerationResult {
    pub fn new(prompt: String, kind: GenerationKind, style: StyleParameters) -> Self {
        Self {
            id: Uuid::new_v4(),
            prompt,
            kind,
            texts: Vec::new(),
            images: Vec::new(),
            style,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub status: ProjectStatus,
    #[serde(default)]
    pub results: Vec<GenerationResult>,
}

impl Project {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            created_at: Utc::now(),
            status: ProjectStatus::InProgress,
            results: Vec::new(),
        }
    }
}

mod base64_images {
    use base64::{engine::general_purpose, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(images: &[Vec<u8>], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(images.iter().map(|bytes| general_purpose::STANDARD.encode(bytes)))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<Vec<u8>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let encoded = Vec::<String>::deserialize(deserializer)?;
        encoded
            .iter()
            .map(|s| general_purpose::STANDARD.decode(s))
            .collect::<Result<_, _>>()
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_images_stored_as_base64() {
        let mut result = GenerationResult::new(
            "Image Upload".to_string(),
            GenerationKind::Image,
            StyleParameters::default(),
        );
        result.images.push(vec![0xFF, 0xD8, 0xFF]);

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["images"][0], "/9j/");
        assert_eq!(value["kind"], "image");

        let back: GenerationResult = serde_json::from_value(value).unwrap();
        assert_eq!(back.images, vec![vec![0xFF, 0xD8, 0xFF]]);
    }
}
