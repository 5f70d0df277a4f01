use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

mod generators;
pub(crate) mod loader;

pub use loader::{
    EnvironmentLoader, EnvironmentRequest, HttpImageFetcher, ImageFetcher, LoadOutcome,
};

pub const NOMINAL_WIDTH: u32 = 1600;
pub const NOMINAL_HEIGHT: u32 = 900;
pub const CUSTOM_ENVIRONMENT_NAME: &str = "custom";

#[derive(Debug, Error)]
pub enum EnvironmentError {
    #[error("unknown environment '{name}'")]
    UnknownName { name: String },
    #[error("environment image has zero width or height")]
    Empty,
    #[error("environment pixel buffer holds {actual} bytes, expected {expected}")]
    SizeMismatch { expected: usize, actual: usize },
    #[error("failed to read environment file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to decode environment image: {0}")]
    Decode(#[source] image::ImageError),
    #[error("failed to fetch environment image from {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvironmentSource {
    BuiltIn(String),
    Upload(PathBuf),
    Remote(String),
}

#[derive(Clone, PartialEq, Eq)]
pub struct EnvironmentBitmap {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

impl fmt::Debug for EnvironmentBitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvironmentBitmap")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

impl EnvironmentBitmap {
    pub fn from_rgba(width: u32, height: u32, rgba: Vec<u8>) -> Result<Self, EnvironmentError> {
        if width == 0 || height == 0 {
            return Err(EnvironmentError::Empty);
        }
        let expected = width as usize * height as usize * 4;
        if rgba.len() != expected {
            return Err(EnvironmentError::SizeMismatch {
                expected,
                actual: rgba.len(),
            });
        }
        Ok(Self {
            width,
            height,
            rgba,
        })
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, EnvironmentError> {
        let decoded = image::load_from_memory(bytes).map_err(EnvironmentError::Decode)?;
        let image = decoded.to_rgba8();
        let (width, height) = image.dimensions();
        Self::from_rgba(width, height, image.into_raw())
    }

    pub(crate) fn filled(width: u32, height: u32, color: [u8; 4]) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let rgba = color.repeat(width as usize * height as usize);
        Self {
            width,
            height,
            rgba,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn rgba(&self) -> &[u8] {
        &self.rgba
    }

    pub(crate) fn rgba_mut(&mut self) -> &mut [u8] {
        &mut self.rgba
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        let mut color = [0u8; 4];
        color.copy_from_slice(&self.rgba[offset..offset + 4]);
        Some(color)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltInEnvironment {
    DemoGrid,
    Warehouse,
}

impl BuiltInEnvironment {
    pub const ALL: [BuiltInEnvironment; 2] =
        [BuiltInEnvironment::DemoGrid, BuiltInEnvironment::Warehouse];

    pub fn name(self) -> &'static str {
        match self {
            BuiltInEnvironment::DemoGrid => "demo-grid",
            BuiltInEnvironment::Warehouse => "warehouse",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|candidate| candidate.name() == name)
    }

    pub fn next(self) -> Self {
        let index = Self::ALL
            .iter()
            .position(|candidate| *candidate == self)
            .unwrap_or(0);
        Self::ALL[(index + 1) % Self::ALL.len()]
    }

    pub fn render(self) -> EnvironmentBitmap {
        match self {
            BuiltInEnvironment::DemoGrid => generators::demo_grid(NOMINAL_WIDTH, NOMINAL_HEIGHT),
            BuiltInEnvironment::Warehouse => {
                generators::warehouse(NOMINAL_WIDTH, NOMINAL_HEIGHT)
            }
        }
    }
}

pub fn load_built_in(name: &str) -> Result<EnvironmentBitmap, EnvironmentError> {
    BuiltInEnvironment::from_name(name)
        .map(BuiltInEnvironment::render)
        .ok_or_else(|| EnvironmentError::UnknownName {
            name: name.to_string(),
        })
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::io::Cursor;

    pub(crate) fn png_bytes(width: u32, height: u32, color: [u8; 4]) -> Vec<u8> {
        let image = image::RgbaImage::from_pixel(width, height, image::Rgba(color));
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .expect("encode png");
        bytes
    }
}
