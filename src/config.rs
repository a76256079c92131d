//! Configuration types for markdown-to-document conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. Style presets that end up inside the
//! [`crate::model::DocumentModel`] live in [`StyleConfig`], a plain
//! serialisable struct nested in the main config.

use crate::error::Md2DocError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Width given to every embedded image, in pixels.
pub const DEFAULT_IMAGE_WIDTH: u32 = 400;
/// Height given to every embedded image, in pixels.
pub const DEFAULT_IMAGE_HEIGHT: u32 = 300;

/// Configuration for a markdown-to-document conversion.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use md2doc::ConversionConfig;
///
/// let config = ConversionConfig::builder()
///     .image_size(640, 480)
///     .concurrency(8)
///     .build()
///     .unwrap();
/// assert_eq!(config.image_width, 640);
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Width assigned to embedded images. Default: 400.
    ///
    /// Images are never decoded, so this is not the real size of the
    /// picture; it is the box the encoder draws it into.
    pub image_width: u32,

    /// Height assigned to embedded images. Default: 300.
    pub image_height: u32,

    /// Spacing hint after each paragraph, in twentieths of a point. Default: 200.
    pub paragraph_spacing_after: u32,

    /// Deepest list nesting level kept as-is. Default: 8.
    ///
    /// Deeper lists are still emitted, clamped to this level.
    pub max_list_depth: u8,

    /// Documents converted at once by the batch APIs. Default: 4.
    pub concurrency: usize,

    /// `User-Agent` sent with image fetches.
    pub user_agent: String,

    /// Fonts, sizes and indents bundled into the document model.
    pub style: StyleConfig,

    /// Optional per-document progress callback (batch APIs only).
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            image_width: DEFAULT_IMAGE_WIDTH,
            image_height: DEFAULT_IMAGE_HEIGHT,
            paragraph_spacing_after: 200,
            max_list_depth: 8,
            concurrency: 4,
            user_agent: concat!("md2doc/", env!("CARGO_PKG_VERSION")).to_string(),
            style: StyleConfig::default(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("image_width", &self.image_width)
            .field("image_height", &self.image_height)
            .field("paragraph_spacing_after", &self.paragraph_spacing_after)
            .field("max_list_depth", &self.max_list_depth)
            .field("concurrency", &self.concurrency)
            .field("user_agent", &self.user_agent)
            .field("style", &self.style)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn image_size(mut self, width: u32, height: u32) -> Self {
        self.config.image_width = width;
        self.config.image_height = height;
        self
    }

    pub fn paragraph_spacing_after(mut self, twips: u32) -> Self {
        self.config.paragraph_spacing_after = twips;
        self
    }

    pub fn max_list_depth(mut self, depth: u8) -> Self {
        self.config.max_list_depth = depth;
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.config.user_agent = ua.into();
        self
    }

    pub fn style(mut self, style: StyleConfig) -> Self {
        self.config.style = style;
        self
    }

    pub fn body_font(mut self, font: impl Into<String>, size_pt: u32) -> Self {
        self.config.style.body_font = font.into();
        self.config.style.body_size_pt = size_pt;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Md2DocError> {
        let c = &self.config;
        if c.image_width == 0 || c.image_height == 0 {
            return Err(Md2DocError::InvalidConfig(format!(
                "Image size must be non-zero, got {}x{}",
                c.image_width, c.image_height
            )));
        }
        if c.max_list_depth == 0 {
            return Err(Md2DocError::InvalidConfig(
                "List depth must be ≥ 1".into(),
            ));
        }
        if c.concurrency == 0 {
            return Err(Md2DocError::InvalidConfig(
                "Concurrency must be ≥ 1".into(),
            ));
        }
        c.style.validate()?;
        Ok(self.config)
    }
}

// ── Styles ───────────────────────────────────────────────────────────────

/// Style presets bundled into every document model.
///
/// Font sizes are whole points; the assembler converts them to the
/// half-point units word-processor formats use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleConfig {
    pub body_font: String,
    pub body_size_pt: u32,
    pub code_font: String,
    /// Heading sizes for levels 1 through 6, largest first.
    pub heading_sizes_pt: [u32; 6],
    /// Hex fill colour for table header cells.
    pub header_shading: String,
    /// Indent per list level, twips.
    pub list_indent: u32,
    /// Hanging indent for numbered items, twips.
    pub list_hanging: u32,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            body_font: "Calibri".to_string(),
            body_size_pt: 11,
            code_font: "Consolas".to_string(),
            heading_sizes_pt: [24, 20, 16, 14, 12, 11],
            header_shading: "D9D9D9".to_string(),
            list_indent: 360,
            list_hanging: 260,
        }
    }
}

impl StyleConfig {
    fn validate(&self) -> Result<(), Md2DocError> {
        if self.body_font.trim().is_empty() {
            return Err(Md2DocError::InvalidConfig("Body font must not be empty".into()));
        }
        if self.body_size_pt == 0 {
            return Err(Md2DocError::InvalidConfig("Body size must be ≥ 1pt".into()));
        }
        if self.heading_sizes_pt.windows(2).any(|w| w[0] < w[1]) {
            return Err(Md2DocError::InvalidConfig(format!(
                "Heading sizes must not grow with level, got {:?}",
                self.heading_sizes_pt
            )));
        }
        let hex = self.header_shading.trim_start_matches('#');
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(Md2DocError::InvalidConfig(format!(
                "Header shading must be a 6-digit hex colour, got '{}'",
                self.header_shading
            )));
        }
        Ok(())
    }
}
