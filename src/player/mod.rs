pub mod engine;
mod level;
mod player;

pub use engine::{EngineConfig, EngineEvent, EngineFactory, ErrorKind, Fullscreen, MediaElement, PlaybackEngine};
pub use level::{format_bitrate, LevelSelection, QualityLevel, AUTO_LEVEL};
pub use player::{PlaybackIssue, VideoPlayer};
