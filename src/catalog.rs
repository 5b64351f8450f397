use crate::error::ConfigError;
use crate::sampler::ImageSource;

/// Ordered image sources with a round-robin cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageCatalog {
    sources: Vec<ImageSource>,
    cursor: usize,
}

impl ImageCatalog {
    pub fn new(sources: Vec<ImageSource>) -> Result<Self, ConfigError> {
        if sources.is_empty() {
            return Err(ConfigError::EmptyCatalog);
        }
        Ok(Self { sources, cursor: 0 })
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn sources(&self) -> &[ImageSource] {
        &self.sources
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn current(&self) -> &ImageSource {
        &self.sources[self.cursor]
    }

    /// Moves to `(cursor + 1) mod len` and returns the new entry.
    pub fn advance(&mut self) -> &ImageSource {
        self.cursor = (self.cursor + 1) % self.sources.len();
        &self.sources[self.cursor]
    }
}

/// Human-readable listing in rotation order, current entry marked.
pub fn render_catalog(catalog: &ImageCatalog) -> String {
    let mut output = String::new();
    output.push_str("GLYPHDRIFT IMAGE CATALOG\n");
    output.push_str(&format!(
        "{} source(s), rotation starts at #{}\n",
        catalog.len(),
        catalog.cursor()
    ));

    output.push('\n');
    for (index, source) in catalog.sources().iter().enumerate() {
        let marker = if index == catalog.cursor() { '*' } else { ' ' };
        let kind = source.kind().label();
        output.push_str(&format!("{marker} #{index:<3} {kind:<6} {source}\n"));
    }

    output
}
