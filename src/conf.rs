//! Defines configuration as read from the environment.

use serde::Deserialize;

/// Default `target_width` value.
fn default_target_width() -> u32 {
    800
}

/// Default `target_height` value.
fn default_target_height() -> u32 {
    600
}

/// Default `jpeg_quality` value. Matches the usual JPEG encoder
/// default.
fn default_jpeg_quality() -> u8 {
    75
}

/// The resizer is configured to fetch an image from S3, fit it into a
/// bounding box, and write it back as JPEG under the same key. The
/// configuration may be given as environment variables; every field
/// has a default.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// The width given to landscape images. Portrait and square
    /// images get their width scaled proportionally.
    #[serde(default = "default_target_width")]
    pub target_width: u32,

    /// The height given to portrait and square images. Landscape
    /// images get their height scaled proportionally.
    #[serde(default = "default_target_height")]
    pub target_height: u32,

    /// Quality of the JPEG output, between 1 and 100.
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,

    /// Defines a filter to select only matching keys. The star (*)
    /// can be used as a wildcard matching any number of non-slash
    /// characters. E.g. to match any file in a folder, use
    /// `"folder/*"`. Omitting this will make it match any file.
    #[serde(default)]
    pub match_key: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            target_width: default_target_width(),
            target_height: default_target_height(),
            jpeg_quality: default_jpeg_quality(),
            match_key: None,
        }
    }
}
