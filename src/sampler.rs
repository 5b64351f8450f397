//! Image → glyph grid sampling.
//!
//! A source is fetched as raw bytes, decoded with the `image` crate, resized
//! (no letterboxing) to exactly `cols × rows` pixels and quantized one glyph
//! per pixel.

use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use image::imageops::{self, FilterType};
use image::DynamicImage;
use reqwest::Client;
use url::Url;

use crate::error::{ConfigError, LoadError};
use crate::glyph_grid::GlyphGrid;
use crate::palette::PaletteMapping;

/// One loadable image reference from the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    Remote(Url),
    Local(PathBuf),
}

impl ImageSource {
    /// Parses `http(s)://` and `file://` URLs, or a filesystem path.
    /// Relative paths are joined onto `base_dir` when one is given.
    pub fn parse(raw: &str, base_dir: Option<&Path>) -> Result<Self, ConfigError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ConfigError::InvalidSource {
                raw: raw.to_owned(),
                reason: "empty source".to_owned(),
            });
        }

        if trimmed.contains("://") {
            let url = Url::parse(trimmed).map_err(|error| ConfigError::InvalidSource {
                raw: raw.to_owned(),
                reason: error.to_string(),
            })?;
            return match url.scheme() {
                "http" | "https" => Ok(Self::Remote(url)),
                "file" => url
                    .to_file_path()
                    .map(Self::Local)
                    .map_err(|()| ConfigError::InvalidSource {
                        raw: raw.to_owned(),
                        reason: "file URL does not name a local path".to_owned(),
                    }),
                other => Err(ConfigError::InvalidSource {
                    raw: raw.to_owned(),
                    reason: format!("unsupported scheme '{other}'"),
                }),
            };
        }

        let path = PathBuf::from(trimmed);
        let resolved = match base_dir {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path,
        };
        Ok(Self::Local(resolved))
    }

    pub fn id(&self) -> String {
        self.to_string()
    }

    pub fn kind(&self) -> SourceKind {
        match self {
            Self::Remote(_) => SourceKind::Remote,
            Self::Local(_) => SourceKind::Local,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Remote,
    Local,
}

impl SourceKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Remote => "remote",
            Self::Local => "local",
        }
    }
}

impl fmt::Display for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remote(url) => f.write_str(url.as_str()),
            Self::Local(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Fetches the encoded bytes behind an [`ImageSource`].
pub trait ImageFetcher {
    fn fetch(
        &self,
        source: &ImageSource,
    ) -> impl Future<Output = Result<Vec<u8>, LoadError>> + Send;
}

/// Fetcher for real sources: HTTP(S) via `reqwest`, local files via `tokio::fs`.
#[derive(Debug, Clone, Default)]
pub struct SourceFetcher {
    http: Client,
}

impl SourceFetcher {
    pub fn new(http: Client) -> Self {
        Self { http }
    }
}

impl ImageFetcher for SourceFetcher {
    fn fetch(
        &self,
        source: &ImageSource,
    ) -> impl Future<Output = Result<Vec<u8>, LoadError>> + Send {
        let http = self.http.clone();
        let source = source.clone();
        async move {
            match source {
                ImageSource::Remote(url) => download(&http, url).await,
                ImageSource::Local(path) => tokio::fs::read(&path)
                    .await
                    .map_err(|error| LoadError::Io { path, error }),
            }
        }
    }
}

async fn download(http: &Client, url: Url) -> Result<Vec<u8>, LoadError> {
    let source_id = url.to_string();
    let response = http
        .get(url)
        .send()
        .await
        .map_err(|error| LoadError::Fetch {
            source_id: source_id.clone(),
            reason: error.to_string(),
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(LoadError::Status {
            source_id,
            status: status.as_u16(),
        });
    }

    let bytes = response.bytes().await.map_err(|error| LoadError::Fetch {
        source_id: source_id.clone(),
        reason: error.to_string(),
    })?;
    Ok(bytes.to_vec())
}

/// Grid shape, mapping and fetch deadline used for every sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sampler {
    rows: usize,
    cols: usize,
    mapping: PaletteMapping,
    timeout: Option<Duration>,
}

impl Sampler {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            mapping: PaletteMapping::default(),
            timeout: None,
        }
    }

    pub fn with_mapping(mut self, mapping: PaletteMapping) -> Self {
        self.mapping = mapping;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Fetches, decodes and quantizes `source`.
    pub async fn sample<F: ImageFetcher>(
        &self,
        fetcher: &F,
        source: &ImageSource,
    ) -> Result<GlyphGrid, LoadError> {
        let bytes = match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, fetcher.fetch(source))
                .await
                .map_err(|_| LoadError::Timeout {
                    source_id: source.id(),
                    timeout,
                })??,
            None => fetcher.fetch(source).await?,
        };
        self.sample_bytes(source, &bytes)
    }

    pub fn sample_bytes(&self, source: &ImageSource, bytes: &[u8]) -> Result<GlyphGrid, LoadError> {
        let image = image::load_from_memory(bytes).map_err(|error| LoadError::Decode {
            source_id: source.id(),
            error,
        })?;
        if image.width() == 0 || image.height() == 0 {
            return Err(LoadError::EmptyImage {
                source_id: source.id(),
            });
        }
        Ok(self.sample_image(&image))
    }

    /// Stretches `image` to the grid shape and quantizes it.
    pub fn sample_image(&self, image: &DynamicImage) -> GlyphGrid {
        let rgba = image.to_rgba8();
        let resized = imageops::resize(
            &rgba,
            self.cols as u32,
            self.rows as u32,
            FilterType::CatmullRom,
        );
        grid_from_rgba(resized.as_raw(), self.rows, self.cols, self.mapping)
    }
}

/// Quantizes a flat RGBA buffer of `cols × rows` pixels.
///
/// A short buffer leaves the missing cells blank so the result always has the
/// requested shape.
pub fn grid_from_rgba(pixels: &[u8], rows: usize, cols: usize, mapping: PaletteMapping) -> GlyphGrid {
    let mut grid = (0..rows)
        .map(|_| Vec::with_capacity(cols))
        .collect::<Vec<Vec<char>>>();

    for (index, pixel) in pixels.chunks_exact(4).take(rows * cols).enumerate() {
        grid[index / cols].push(mapping.glyph_for_pixel(pixel[0], pixel[1], pixel[2]));
    }
    for row in &mut grid {
        row.resize(cols, ' ');
    }

    GlyphGrid::from_rows(grid, cols)
}
