use async_trait::async_trait;
use std::time::Duration;

use super::validation::ImageFile;
use crate::error::GenerationError;
use crate::models::{GenerationKind, StyleParameters};

#[derive(Debug, Clone)]
pub enum GenerationRequest {
    Text {
        prompt: String,
        params: StyleParameters,
    },
    Image {
        files: Vec<ImageFile>,
        params: StyleParameters,
    },
}

impl GenerationRequest {
    pub fn kind(&self) -> GenerationKind {
        match self {
            GenerationRequest::Text { .. } => GenerationKind::Text,
            GenerationRequest::Image { .. } => GenerationKind::Image,
        }
    }

    pub fn params(&self) -> &StyleParameters {
        match self {
            GenerationRequest::Text { params, .. } | GenerationRequest::Image { params, .. } => {
                params
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationOutput {
    pub texts: Vec<String>,
    pub images: Vec<Vec<u8>>,
}

/// Text/image generation backend
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationOutput, GenerationError>;
}

/// Canned generator: templated text variants, images passed through unchanged
#[derive(Debug, Clone, Default)]
pub struct MockGenerator {
    simulate_latency: bool,
}

impl MockGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep like a real backend would; lower creativity takes longer
    pub fn with_latency() -> Self {
        Self {
            simulate_latency: true,
        }
    }

    fn latency(params: &StyleParameters) -> Duration {
        // clamp() passes NaN through and Duration::from_secs_f64 panics on it
        let creativity = if params.creativity.is_finite() {
            params.creativity.clamp(0.0, 1.0)
        } else {
            0.5
        };
        Duration::from_millis(800) + Duration::from_secs_f64((1.0 - creativity) * 0.3)
    }

    fn generate_texts(prompt: &str, params: &StyleParameters) -> Vec<String> {
        let body = topic_copy(prompt);
        let mut texts = vec![styled(body, &params.style)];

        if params.creativity > 0.4 {
            texts.push(format!(
                "Variation (creativity {}/10):\n\nA fresh take on the brief that keeps the core message but tries a different angle.",
                (params.creativity * 10.0) as i32
            ));
        }
        if params.temperature > 0.6 {
            texts.push(format!(
                "Tone shift ({}/10):\n\nThe same message rebuilt from a different emotional angle for another audience.",
                (params.temperature * 10.0) as i32
            ));
        }
        texts.push(format!(
            "Formal version:\n\n{}\n\nWritten in a formal register for business use.",
            body
        ));
        if params.length < 200 {
            texts.push(
                "Summary:\n\n1. Know the audience\n2. Lead with the core value\n3. Make it memorable\n4. End with a call to action"
                    .to_string(),
            );
        }
        texts
    }
}

#[async_trait]
impl Generator for MockGenerator {
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationOutput, GenerationError> {
        if self.simulate_latency {
            tokio::time::sleep(Self::latency(request.params())).await;
        }
        match request {
            GenerationRequest::Text { prompt, params } => {
                tracing::debug!("Mock text generation for {} char prompt", prompt.chars().count());
                Ok(GenerationOutput {
                    texts: Self::generate_texts(&prompt, &params),
                    images: Vec::new(),
                })
            }
            GenerationRequest::Image { files, .. } => Ok(GenerationOutput {
                texts: Vec::new(),
                images: files.into_iter().map(|f| f.bytes).collect(),
            }),
        }
    }
}

fn topic_copy(prompt: &str) -> &'static str {
    let lower = prompt.to_lowercase();
    let has_word = |words: &[&str]| {
        lower
            .split(|c: char| !c.is_alphanumeric())
            .any(|token| words.contains(&token))
    };

    if lower.contains("brand") || lower.contains("品牌") {
        "Brand positioning: a clear position that states your core value and resonates with the people you want to reach."
    } else if lower.contains("marketing") || lower.contains("营销") || lower.contains("推广") {
        "Marketing strategy: pair creative work with data so targeting and content lift both reach and conversion."
    } else if has_word(&["ad", "ads", "advert", "advertisement"]) || lower.contains("广告") {
        "Ad copy: catch attention in seconds by combining an emotional hook with a concrete benefit."
    } else {
        "Creative copy: tailored to your brief, with the audience and current trends in mind."
    }
}

fn styled(body: &str, style: &str) -> String {
    match style {
        "formal" => format!(
            "[Formal]\n\nDear client,\n\nBased on your requirements we prepared the following:\n\n{}",
            body
        ),
        "creative" => format!(
            "[Creative]\n\n{}\n\nThis version leans on imagination and unexpected angles.",
            body
        ),
        "humorous" => format!("[Playful]\n\n{}\n\n(A little humour makes it stick.)", body),
        _ => format!("[Standard]\n\n{}", body),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(style: &str, creativity: f64, temperature: f64, length: usize) -> StyleParameters {
        StyleParameters {
            style: style.to_string(),
            creativity,
            temperature,
            length,
            ..StyleParameters::default()
        }
    }

    #[tokio::test]
    async fn test_text_variants_follow_thresholds() {
        let generator = MockGenerator::new();

        let all = generator
            .generate(GenerationRequest::Text {
                prompt: "Launch copy for our brand".to_string(),
                params: params("formal", 0.9, 0.9, 100),
            })
            .await
            .unwrap();
        assert_eq!(all.texts.len(), 5);
        assert!(all.texts[0].starts_with("[Formal]"));
        assert!(all.texts[0].contains("Brand positioning"));

        let minimal = generator
            .generate(GenerationRequest::Text {
                prompt: "Something made by hand".to_string(),
                params: params("default", 0.2, 0.3, 400),
            })
            .await
            .unwrap();
        assert_eq!(minimal.texts.len(), 2);
        // "made" must not be read as "ad"
        assert!(minimal.texts[0].contains("Creative copy"));
    }

    #[tokio::test]
    async fn test_images_pass_through() {
        let files = vec![
            ImageFile::new("a.jpg", vec![1, 2, 3]),
            ImageFile::new("b.png", vec![4, 5]),
        ];
        let output = MockGenerator::new()
            .generate(GenerationRequest::Image {
                files,
                params: StyleParameters::default(),
            })
            .await
            .unwrap();
        assert_eq!(output.images, vec![vec![1, 2, 3], vec![4, 5]]);
        assert!(output.texts.is_empty());
    }

    #[test]
    fn test_latency_scales_with_creativity() {
        let slow = MockGenerator::latency(&params("default", 0.0, 0.5, 100));
        let fast = MockGenerator::latency(&params("default", 1.0, 0.5, 100));
        assert_eq!(fast, Duration::from_millis(800));
        assert!(slow > fast);
    }

    #[test]
    fn test_latency_with_non_finite_creativity() {
        let midpoint = MockGenerator::latency(&params("default", 0.5, 0.5, 100));
        for creativity in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert_eq!(
                MockGenerator::latency(&params("default", creativity, 0.5, 100)),
                midpoint
            );
        }
    }
}
