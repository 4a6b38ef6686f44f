use std::sync::Arc;
use tokio::sync::mpsc;
use crate::errors::{Result, StudioError};
use crate::notify::Notification;
use super::engine::{
    EngineConfig, EngineEvent, EngineFactory, ErrorKind, Fullscreen, MediaElement, PlaybackEngine, HLS_MIME_TYPE,
};
use super::level::{LevelSelection, QualityLevel};

pub const NETWORK_RECOVERING: &str = "Network error - trying to recover...";
pub const MEDIA_RECOVERING: &str = "Media error - trying to recover...";
pub const FATAL_ERROR: &str = "Fatal error occurred";
pub const HLS_UNSUPPORTED: &str = "HLS is not supported on this platform";

/// Message shown over the video
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackIssue {
    /// Recovery in progress, cleared once playback moves on
    Recovering(String),
    Fatal(String),
}

impl PlaybackIssue {
    pub fn message(&self) -> &str {
        match self {
            PlaybackIssue::Recovering(msg) | PlaybackIssue::Fatal(msg) => msg,
        }
    }
}

/// Adaptive stream player state.
///
/// Owns the engine for the current source. Loading a new source or dropping
/// the player destroys the previous engine.
pub struct VideoPlayer<M: MediaElement> {
    factory: Arc<dyn EngineFactory>,
    engine_config: EngineConfig,
    media: M,
    engine: Option<Box<dyn PlaybackEngine>>,
    source: Option<String>,
    poster: Option<String>,
    levels: Vec<QualityLevel>,
    current_level: LevelSelection,
    is_playing: bool,
    is_loading: bool,
    is_fullscreen: bool,
    issue: Option<PlaybackIssue>,
    notifier: Option<mpsc::UnboundedSender<Notification>>,
}

impl<M: MediaElement> VideoPlayer<M> {
    pub fn new(factory: Arc<dyn EngineFactory>, media: M) -> Self {
        Self {
            factory,
            engine_config: EngineConfig::default(),
            media,
            engine: None,
            source: None,
            poster: None,
            levels: Vec::new(),
            current_level: LevelSelection::Auto,
            is_playing: false,
            is_loading: false,
            is_fullscreen: false,
            issue: None,
            notifier: None,
        }
    }

    pub fn with_engine_config(mut self, config: EngineConfig) -> Self {
        self.engine_config = config;
        self
    }

    /// Unrecoverable errors are also sent here
    pub fn with_notifier(mut self, notifier: mpsc::UnboundedSender<Notification>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn set_poster(&mut self, poster: Option<String>) {
        self.poster = poster;
    }

    /// Start playing a master playlist, replacing any current source
    pub fn load(&mut self, master_url: &str) {
        self.unload();

        self.source = Some(master_url.to_string());
        self.is_loading = true;

        if self.factory.is_supported() {
            let mut engine = self.factory.create(&self.engine_config);
            engine.load_source(master_url);
            engine.attach_media(&mut self.media);
            self.engine = Some(engine);
        } else if self.media.can_play_type(HLS_MIME_TYPE) {
            // 原生 HLS 支持
            self.media.set_src(master_url);
            self.is_loading = false;
        } else {
            self.is_loading = false;
            self.fail(HLS_UNSUPPORTED);
        }
    }

    /// Release the engine and clear the media element
    pub fn unload(&mut self) {
        if let Some(mut engine) = self.engine.take() {
            engine.destroy();
        }
        if self.source.take().is_some() {
            self.media.clear_src();
        }

        self.levels.clear();
        self.current_level = LevelSelection::Auto;
        self.is_playing = false;
        self.is_loading = false;
        self.issue = None;
    }

    pub fn handle_event(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::ManifestParsed { levels } => {
                tracing::debug!(levels = levels.len(), "manifest parsed");
                self.levels = levels;
                self.current_level = LevelSelection::Auto;
                self.is_loading = false;
                self.clear_recovering();
            }
            EngineEvent::LevelSwitched { level } => {
                match LevelSelection::from_index(level) {
                    Some(selection) if selection.is_valid_for(&self.levels) => {
                        self.current_level = selection;
                        self.clear_recovering();
                    }
                    _ => {
                        tracing::warn!(level, available = self.levels.len(), "ignoring switch to unknown level");
                    }
                }
            }
            EngineEvent::Error { kind, fatal, details } => {
                if !fatal {
                    tracing::debug!(?kind, %details, "non-fatal playback error");
                    return;
                }
                self.handle_fatal(kind, &details);
            }
        }
    }

    fn handle_fatal(&mut self, kind: ErrorKind, details: &str) {
        let Some(engine) = self.engine.as_mut() else {
            return;
        };

        match kind {
            ErrorKind::Network => {
                tracing::warn!(%details, "fatal network error, reloading source");
                self.issue = Some(PlaybackIssue::Recovering(NETWORK_RECOVERING.to_string()));
                engine.start_load();
            }
            ErrorKind::Media => {
                tracing::warn!(%details, "fatal media error, recovering");
                self.issue = Some(PlaybackIssue::Recovering(MEDIA_RECOVERING.to_string()));
                engine.recover_media_error();
            }
            ErrorKind::Other => {
                tracing::error!(%details, "fatal playback error");
                engine.destroy();
                self.engine = None;
                self.fail(FATAL_ERROR);
            }
        }
    }

    fn fail(&mut self, message: &str) {
        self.issue = Some(PlaybackIssue::Fatal(message.to_string()));

        if let Some(notifier) = &self.notifier {
            let mut notification = Notification::error(message);
            if let Some(source) = &self.source {
                notification = notification.with_description(source.clone());
            }
            let _ = notifier.send(notification);
        }
    }

    fn clear_recovering(&mut self) {
        if matches!(self.issue, Some(PlaybackIssue::Recovering(_))) {
            self.issue = None;
        }
    }

    /// Ask the engine for a quality level.
    ///
    /// Returns `Ok(false)` without changing anything when no engine is
    /// running, e.g. under native playback.
    pub fn select_level(&mut self, selection: LevelSelection) -> Result<bool> {
        if !selection.is_valid_for(&self.levels) {
            let requested = selection.as_index() as usize;
            return Err(StudioError::InvalidLevel {
                requested,
                available: self.levels.len(),
            });
        }

        let Some(engine) = self.engine.as_mut() else {
            return Ok(false);
        };

        engine.set_current_level(selection.as_index());
        self.current_level = selection;
        Ok(true)
    }

    pub fn quality_label(&self) -> String {
        match self.current_level {
            LevelSelection::Auto => "Auto".to_string(),
            LevelSelection::Index(i) => self.levels
                .get(i)
                .map(QualityLevel::label)
                .unwrap_or_else(|| "Unknown".to_string()),
        }
    }

    pub fn toggle_fullscreen(&mut self, target: &mut dyn Fullscreen) {
        let result = if target.is_fullscreen() {
            target.exit_fullscreen()
        } else {
            target.request_fullscreen()
        };

        if let Err(err) = result {
            tracing::error!(error = %err, "fullscreen error");
        }
        self.is_fullscreen = target.is_fullscreen();
    }

    /// Fullscreen left or entered outside of the player
    pub fn fullscreen_changed(&mut self, is_fullscreen: bool) {
        self.is_fullscreen = is_fullscreen;
    }

    pub fn set_playing(&mut self, is_playing: bool) {
        self.is_playing = is_playing;
    }

    pub fn levels(&self) -> &[QualityLevel] {
        &self.levels
    }

    pub fn current_level(&self) -> LevelSelection {
        self.current_level
    }

    pub fn issue(&self) -> Option<&PlaybackIssue> {
        self.issue.as_ref()
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn poster(&self) -> Option<&str> {
        self.poster.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn is_fullscreen(&self) -> bool {
        self.is_fullscreen
    }

    pub fn has_engine(&self) -> bool {
        self.engine.is_some()
    }

    pub fn media(&self) -> &M {
        &self.media
    }
}

impl<M: MediaElement> Drop for VideoPlayer<M> {
    fn drop(&mut self) {
        self.unload();
    }
}
