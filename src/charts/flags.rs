//! Flag image sources for the raster output.

use image::DynamicImage;
use std::io::{self, Read};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum FlagError {
    #[error("Request for {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: Box<ureq::Error>,
    },
    #[error("Failed to read response body: {0}")]
    Io(#[from] io::Error),
    #[error("Failed to decode flag image: {0}")]
    Decode(#[from] image::ImageError),
}

/// Resolves a layout image URL to pixels.
pub trait FlagSource {
    fn fetch(&mut self, url: &str) -> Result<DynamicImage, FlagError>;
}

/// Downloads every flag over HTTP. No caching, no retries.
pub struct HttpFlagSource {
    agent: ureq::Agent,
}

impl Default for HttpFlagSource {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpFlagSource {
    pub fn new() -> Self {
        Self {
            agent: ureq::AgentBuilder::new().build(),
        }
    }
}

impl FlagSource for HttpFlagSource {
    fn fetch(&mut self, url: &str) -> Result<DynamicImage, FlagError> {
        let mut buf = vec![];
        self.agent
            .get(url)
            .set("Accept", "image/png")
            .call()
            .map_err(|e| FlagError::Http {
                url: url.to_string(),
                source: Box::new(e),
            })?
            .into_reader()
            .read_to_end(&mut buf)?;

        debug!(url, bytes = buf.len(), "fetched flag");
        Ok(image::load_from_memory(&buf)?)
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use image::{Rgb, RgbImage};

    /// Returns a 3:2 flag of one color for every URL and records what was asked.
    pub struct SolidFlags {
        pub color: [u8; 3],
        pub requested: Vec<String>,
    }

    impl SolidFlags {
        pub fn new(color: [u8; 3]) -> Self {
            Self {
                color,
                requested: Vec::new(),
            }
        }
    }

    impl FlagSource for SolidFlags {
        fn fetch(&mut self, url: &str) -> Result<DynamicImage, FlagError> {
            self.requested.push(url.to_string());
            Ok(DynamicImage::ImageRgb8(RgbImage::from_pixel(
                30,
                20,
                Rgb(self.color),
            )))
        }
    }

    /// Fails every request, as if the CDN were unreachable.
    pub struct OfflineFlags;

    impl FlagSource for OfflineFlags {
        fn fetch(&mut self, _url: &str) -> Result<DynamicImage, FlagError> {
            Err(FlagError::Io(io::Error::new(
                io::ErrorKind::NotConnected,
                "offline",
            )))
        }
    }
}
