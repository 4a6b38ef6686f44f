//! Seams to the adaptive streaming runtime.
//!
//! The player logic drives an HLS engine, a media element and the platform
//! fullscreen API only through these traits.

use super::level::QualityLevel;

pub const HLS_MIME_TYPE: &str = "application/vnd.apple.mpegurl";

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub enable_worker: bool,
    pub low_latency_mode: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            enable_worker: true,
            low_latency_mode: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    Media,
    Other,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    ManifestParsed {
        levels: Vec<QualityLevel>,
    },
    /// `level` is -1 for automatic selection
    LevelSwitched {
        level: i32,
    },
    Error {
        kind: ErrorKind,
        fatal: bool,
        details: String,
    },
}

pub trait MediaElement: Send {
    fn can_play_type(&self, mime_type: &str) -> bool;

    fn set_src(&mut self, url: &str);

    fn clear_src(&mut self);
}

pub trait PlaybackEngine: Send {
    fn load_source(&mut self, url: &str);

    fn attach_media(&mut self, media: &mut dyn MediaElement);

    /// Restart fragment loading after a network failure
    fn start_load(&mut self);

    fn recover_media_error(&mut self);

    /// -1 hands control back to the engine's ABR logic
    fn set_current_level(&mut self, level: i32);

    /// Release listeners, workers and pending requests
    fn destroy(&mut self);
}

pub trait EngineFactory: Send + Sync {
    /// Whether the runtime can host the engine at all
    fn is_supported(&self) -> bool;

    fn create(&self, config: &EngineConfig) -> Box<dyn PlaybackEngine>;
}

pub trait Fullscreen {
    fn is_fullscreen(&self) -> bool;

    fn request_fullscreen(&mut self) -> Result<(), String>;

    fn exit_fullscreen(&mut self) -> Result<(), String>;
}
