//! Static content: messages, system prompts, images and personas
//!
//! Defaults are compiled into the binary. When an override directory is
//! configured, files found there take precedence over the embedded copies.

use rust_embed::Embed;
use serde::Deserialize;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Embed)]
#[folder = "resources/"]
struct Resources;

/// Errors loading static content
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("content not found: {0}")]
    NotFound(String),
    #[error("content is not valid UTF-8: {0}")]
    InvalidUtf8(String),
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid persona registry: {0}")]
    Personas(#[from] serde_json::Error),
}

/// Loads content by key from the override directory or the embedded defaults
#[derive(Debug, Clone, Default)]
pub struct ContentStore {
    override_dir: Option<PathBuf>,
}

impl ContentStore {
    /// Embedded content only
    pub fn embedded() -> Self {
        Self { override_dir: None }
    }

    /// Files in `dir` shadow the embedded defaults
    pub fn with_override_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            override_dir: Some(dir.into()),
        }
    }

    pub fn load_message(&self, key: &str) -> Result<String, ContentError> {
        self.load_text(&format!("messages/{key}.txt"))
    }

    pub fn load_prompt(&self, key: &str) -> Result<String, ContentError> {
        self.load_text(&format!("prompts/{key}.txt"))
    }

    /// Image bytes with their file name, or `None` if no image exists for `key`
    pub fn load_image(&self, key: &str) -> Result<Option<(String, Vec<u8>)>, ContentError> {
        let name = format!("{key}.jpg");
        let path = format!("images/{name}");
        match self.load_bytes(&path) {
            Ok(bytes) => Ok(Some((name, bytes.into_owned()))),
            Err(ContentError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn load_personas(&self) -> Result<PersonaRegistry, ContentError> {
        let raw = self.load_text("personas.json")?;
        let personas: Vec<Persona> = serde_json::from_str(&raw)?;
        Ok(PersonaRegistry::new(personas))
    }

    fn load_text(&self, relative: &str) -> Result<String, ContentError> {
        let bytes = self.load_bytes(relative)?;
        String::from_utf8(bytes.into_owned())
            .map(|s| s.trim_end().to_string())
            .map_err(|_| ContentError::InvalidUtf8(relative.to_string()))
    }

    fn load_bytes(&self, relative: &str) -> Result<Cow<'static, [u8]>, ContentError> {
        if let Some(dir) = &self.override_dir {
            if let Some(bytes) = read_override(dir, relative)? {
                tracing::debug!(path = %relative, "Loaded content from override directory");
                return Ok(Cow::Owned(bytes));
            }
        }

        Resources::get(relative)
            .map(|file| file.data)
            .ok_or_else(|| ContentError::NotFound(relative.to_string()))
    }
}

fn read_override(dir: &Path, relative: &str) -> Result<Option<Vec<u8>>, ContentError> {
    let path = dir.join(relative);
    match std::fs::read(&path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(ContentError::Io { path, source }),
    }
}

// ============================================================================
// Personas
// ============================================================================

/// A famous person the user can talk to
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Persona {
    /// Button id, `talk_` prefixed; also the image key
    pub key: String,
    /// Display name, `"<short name> - <description>"`
    pub name: String,
    /// Prompt key of the persona's system prompt
    pub prompt_file: String,
}

impl Persona {
    #[cfg(test)]
    pub fn new(
        key: impl Into<String>,
        name: impl Into<String>,
        prompt_file: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            prompt_file: prompt_file.into(),
        }
    }

    /// Name shown in the "thinking" placeholder
    pub fn short_name(&self) -> &str {
        self.name
            .split_once(" - ")
            .map_or(self.name.as_str(), |(short, _)| short)
    }
}

/// Ordered, read-only persona list
#[derive(Debug, Clone, Default)]
pub struct PersonaRegistry {
    personas: Vec<Persona>,
}

impl PersonaRegistry {
    pub fn new(personas: Vec<Persona>) -> Self {
        Self { personas }
    }

    pub fn get(&self, key: &str) -> Option<&Persona> {
        self.personas.iter().find(|p| p.key == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Persona> {
        self.personas.iter()
    }

    pub fn len(&self) -> usize {
        self.personas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.personas.is_empty()
    }
}
