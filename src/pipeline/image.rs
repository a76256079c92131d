//! Image resolution: URL → embeddable bytes, or a reason it is not embeddable.
//!
//! ## Policy
//!
//! Checked in this order; the first hit decides:
//!
//! 1. URL path ends in `.svg` → not embeddable, no request is made
//! 2. Fetch; non-2xx status → not embeddable
//! 3. `Content-Type` mentions `svg` → not embeddable
//! 4. Format from the URL suffix (png, jpg/jpeg, gif, bmp), then from the
//!    content type, else PNG
//! 5. Keep the whole body with the configured default size (400×300)
//!
//! A single attempt is made: no timeout, no retry. Every failure comes back
//! as a [`NotEmbeddable`] value; nothing here panics or propagates.
//!
//! The network sits behind [`ImageFetcher`] so the policy can be exercised
//! without a server. [`HttpImageFetcher`] is the reqwest-backed version.

use crate::error::{Md2DocError, NotEmbeddable};
use crate::model::{EmbeddedImage, ImageFormat};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

/// What a fetch returned. `body` is only read for successful responses.
#[derive(Debug, Clone, Default)]
pub struct FetchedImage {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl FetchedImage {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Performs the single network request behind an image reference.
pub trait ImageFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<FetchedImage, NotEmbeddable>> + Send;
}

impl<F: ImageFetcher> ImageFetcher for Arc<F> {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<FetchedImage, NotEmbeddable>> + Send {
        (**self).fetch(url)
    }
}

/// [`ImageFetcher`] over a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct HttpImageFetcher {
    client: reqwest::Client,
}

impl HttpImageFetcher {
    pub fn new(user_agent: &str) -> Result<Self, Md2DocError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| Md2DocError::Internal(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedImage, NotEmbeddable> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| NotEmbeddable::Transport {
                detail: e.to_string(),
            })?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        if !response.status().is_success() {
            return Ok(FetchedImage {
                status,
                content_type,
                body: Vec::new(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| NotEmbeddable::Transport {
                detail: e.to_string(),
            })?;

        Ok(FetchedImage {
            status,
            content_type,
            body: body.to_vec(),
        })
    }
}

/// Applies the embedding policy on top of an [`ImageFetcher`].
#[derive(Debug, Clone)]
pub struct ImageResolver<F> {
    fetcher: F,
    width: u32,
    height: u32,
}

impl<F: ImageFetcher> ImageResolver<F> {
    pub fn new(fetcher: F, width: u32, height: u32) -> Self {
        Self {
            fetcher,
            width,
            height,
        }
    }

    /// Resolve `url` into an embedded image carrying `alt_text`.
    pub async fn resolve(&self, url: &str, alt_text: &str) -> Result<EmbeddedImage, NotEmbeddable> {
        if is_svg_url(url) {
            debug!("Skipping SVG image {}", url);
            return Err(NotEmbeddable::SvgUrl);
        }

        let fetched = self.fetcher.fetch(url).await.inspect_err(|e| {
            warn!("Image fetch failed for {}: {}", url, e);
        })?;

        if !fetched.is_success() {
            warn!("Image fetch for {} returned HTTP {}", url, fetched.status);
            return Err(NotEmbeddable::HttpStatus {
                status: fetched.status,
            });
        }

        if let Some(ct) = fetched.content_type.as_deref() {
            if ct.to_ascii_lowercase().contains("svg") {
                debug!("Skipping SVG content type {} for {}", ct, url);
                return Err(NotEmbeddable::SvgContentType {
                    content_type: ct.to_string(),
                });
            }
        }

        let format = classify(url, fetched.content_type.as_deref());
        debug!(
            "Embedding {} ({:?}, {} bytes)",
            url,
            format,
            fetched.body.len()
        );

        Ok(EmbeddedImage {
            bytes: fetched.body,
            width: self.width,
            height: self.height,
            format,
            alt_text: alt_text.to_string(),
        })
    }
}

/// URL path without query string or fragment.
fn url_path(url: &str) -> &str {
    url.split(['?', '#']).next().unwrap_or(url)
}

fn url_extension(url: &str) -> Option<&str> {
    let path = url_path(url);
    let last_segment = path.rsplit('/').next().unwrap_or(path);
    last_segment.rsplit_once('.').map(|(_, ext)| ext)
}

/// `true` when the URL path ends in `.svg` (any case).
pub fn is_svg_url(url: &str) -> bool {
    url_extension(url).is_some_and(|ext| ext.eq_ignore_ascii_case("svg"))
}

/// Pick the image format: URL suffix, then content type, then PNG.
pub fn classify(url: &str, content_type: Option<&str>) -> ImageFormat {
    url_extension(url)
        .and_then(ImageFormat::from_extension)
        .or_else(|| content_type.and_then(ImageFormat::from_content_type))
        .unwrap_or_default()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// In-memory fetcher: canned responses by URL, counts every call.
    #[derive(Default)]
    pub(crate) struct StubFetcher {
        responses: HashMap<String, Result<FetchedImage, NotEmbeddable>>,
        pub(crate) calls: AtomicUsize,
    }

    impl StubFetcher {
        pub(crate) fn with(mut self, url: &str, status: u16, ct: Option<&str>, body: &[u8]) -> Self {
            self.responses.insert(
                url.to_string(),
                Ok(FetchedImage {
                    status,
                    content_type: ct.map(str::to_string),
                    body: body.to_vec(),
                }),
            );
            self
        }

        pub(crate) fn failing(mut self, url: &str, detail: &str) -> Self {
            self.responses.insert(
                url.to_string(),
                Err(NotEmbeddable::Transport {
                    detail: detail.to_string(),
                }),
            );
            self
        }
    }

    impl ImageFetcher for StubFetcher {
        async fn fetch(&self, url: &str) -> Result<FetchedImage, NotEmbeddable> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.responses
                .get(url)
                .cloned()
                .unwrap_or(Err(NotEmbeddable::Transport {
                    detail: "connection refused".into(),
                }))
        }
    }

    fn resolver(fetcher: StubFetcher) -> ImageResolver<StubFetcher> {
        ImageResolver::new(fetcher, 400, 300)
    }

    #[test]
    fn svg_suffix_skips_fetch() {
        let r = resolver(StubFetcher::default());
        for url in [
            "https://x.test/logo.svg",
            "https://x.test/LOGO.SVG",
            "https://x.test/logo.svg?v=3",
            "https://x.test/logo.svg#frag",
        ] {
            let res = tokio_test::block_on(r.resolve(url, "logo"));
            assert_eq!(res, Err(NotEmbeddable::SvgUrl), "url: {url}");
        }
        assert_eq!(r.fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn non_success_status_is_not_embeddable() {
        let r = resolver(StubFetcher::default().with("https://x.test/a.png", 404, None, b""));
        assert_eq!(
            r.resolve("https://x.test/a.png", "a").await,
            Err(NotEmbeddable::HttpStatus { status: 404 })
        );
    }

    #[tokio::test]
    async fn svg_content_type_is_not_embeddable() {
        let r = resolver(StubFetcher::default().with(
            "https://x.test/render",
            200,
            Some("image/svg+xml"),
            b"<svg/>",
        ));
        assert!(matches!(
            r.resolve("https://x.test/render", "").await,
            Err(NotEmbeddable::SvgContentType { .. })
        ));
    }

    #[tokio::test]
    async fn transport_error_is_not_embeddable() {
        let r = resolver(StubFetcher::default().failing("https://x.test/a.gif", "dns error"));
        assert_eq!(
            r.resolve("https://x.test/a.gif", "").await,
            Err(NotEmbeddable::Transport {
                detail: "dns error".into()
            })
        );
    }

    #[tokio::test]
    async fn embeds_body_with_default_size() {
        let r = resolver(StubFetcher::default().with(
            "https://x.test/photo.JPEG",
            200,
            Some("image/png"),
            &[1, 2, 3],
        ));
        let img = r.resolve("https://x.test/photo.JPEG", "photo").await.unwrap();
        // URL suffix outranks the content type.
        assert_eq!(img.format, ImageFormat::Jpg);
        assert_eq!(img.bytes, vec![1, 2, 3]);
        assert_eq!((img.width, img.height), (400, 300));
        assert_eq!(img.alt_text, "photo");
    }

    #[test]
    fn classify_falls_back_to_content_type_then_png() {
        assert_eq!(classify("https://x.test/img?id=1", Some("image/bmp")), ImageFormat::Bmp);
        assert_eq!(classify("https://x.test/img", Some("text/plain")), ImageFormat::Png);
        assert_eq!(classify("https://x.test/img", None), ImageFormat::Png);
        assert_eq!(classify("https://x.test/a.gif?x=y.png", None), ImageFormat::Gif);
    }

    #[test]
    fn dots_in_host_are_not_extensions() {
        assert!(!is_svg_url("https://cdn.svg/image"));
        assert_eq!(classify("https://images.png.example/raw", None), ImageFormat::Png);
    }
}
