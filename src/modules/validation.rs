use image::ImageFormat;
use std::fs;
use std::path::Path;

use crate::error::{AppResult, GenerationError};
use crate::models::AppConfig;

/// An uploaded image, kept as raw bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl ImageFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    pub fn from_path(path: &Path) -> AppResult<Self> {
        let bytes = fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self { name, bytes })
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Format sniffed from the file signature
    pub fn format(&self) -> Option<ImageFormat> {
        image::guess_format(&self.bytes).ok()
    }
}

pub fn validate_prompt(prompt: &str, config: &AppConfig) -> Result<(), GenerationError> {
    if prompt.trim().is_empty() {
        return Err(GenerationError::EmptyPrompt);
    }
    let length = prompt.chars().count();
    if length > config.max_prompt_length {
        return Err(GenerationError::PromptTooLong {
            length,
            limit: config.max_prompt_length,
        });
    }
    Ok(())
}

/// Optional upload caption; empty is allowed
pub fn validate_description(description: &str, config: &AppConfig) -> Result<(), GenerationError> {
    let length = description.chars().count();
    if length > config.max_description_length {
        return Err(GenerationError::DescriptionTooLong {
            length,
            limit: config.max_description_length,
        });
    }
    Ok(())
}

/// Uploads must be JPEG or PNG, within the per-file size and file count limits
pub fn validate_images(files: &[ImageFile], config: &AppConfig) -> Result<(), GenerationError> {
    if files.is_empty() {
        return Err(GenerationError::NoFiles);
    }
    if files.len() > config.max_file_count {
        return Err(GenerationError::TooManyFiles {
            count: files.len(),
            limit: config.max_file_count,
        });
    }
    for file in files {
        if file.size() > config.max_image_size {
            return Err(GenerationError::FileTooLarge {
                name: file.name.clone(),
                size: file.size(),
                limit: config.max_image_size,
            });
        }
        match file.format() {
            Some(ImageFormat::Jpeg) | Some(ImageFormat::Png) => {}
            _ => return Err(GenerationError::InvalidFormat(file.name.clone())),
        }
    }
    Ok(())
}
