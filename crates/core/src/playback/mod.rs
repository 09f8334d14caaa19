use std::sync::Arc;

use crate::{
    compile::ColorMap,
    sinks::{AnimationSink, AudioSink, EditorSink, PlaybackEvent, SessionId},
    Result,
};

/// Lifecycle of the single playback session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Stopped,
    /// Start was requested; waiting for the sink to report a timestamp.
    Starting,
    Playing,
}

/// The active session. Holds the color map captured when play was
/// requested so a later edit cannot change what the animation starts with.
#[derive(Debug, Clone)]
pub struct PlaybackSession {
    pub id: SessionId,
    pub color_map: Arc<ColorMap>,
    pub started_at: Option<f64>,
}

/// Single-writer gate on playback start and stop.
#[derive(Debug, Default)]
pub struct PlaybackSessionController {
    state: PlaybackState,
    session: Option<PlaybackSession>,
    sessions_started: u64,
}

impl PlaybackSessionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// True while Starting or Playing.
    pub fn is_active(&self) -> bool {
        self.state != PlaybackState::Stopped
    }

    pub fn session(&self) -> Option<&PlaybackSession> {
        self.session.as_ref()
    }

    pub fn sessions_started(&self) -> u64 {
        self.sessions_started
    }

    /// Requests playback. Returns `Ok(None)` without side effects when the
    /// artifact is not ready or a session already exists; otherwise the id
    /// the sink will tag its notifications with.
    pub fn play(
        &mut self,
        ready: bool,
        color_map: Option<&Arc<ColorMap>>,
        audio: &mut dyn AudioSink,
        editor: &mut dyn EditorSink,
    ) -> Result<Option<SessionId>> {
        if !ready || self.is_active() || audio.is_playing() {
            tracing::debug!(ready, state = ?self.state, "play request refused");
            return Ok(None);
        }
        let Some(color_map) = color_map else {
            tracing::debug!("play request refused: no compiled color map");
            return Ok(None);
        };

        self.sessions_started += 1;
        let id = SessionId(self.sessions_started);
        self.state = PlaybackState::Starting;
        self.session = Some(PlaybackSession {
            id,
            color_map: color_map.clone(),
            started_at: None,
        });
        editor.set_read_only(true);

        if let Err(err) = audio.start_playback(id) {
            tracing::warn!(error = %err, "audio sink failed to start playback");
            self.state = PlaybackState::Stopped;
            self.session = None;
            editor.set_read_only(false);
            return Err(err);
        }

        tracing::info!(session = id.sequence(), "playback starting");
        Ok(Some(id))
    }

    /// Applies a notification from the audio sink. Notifications for any
    /// session other than the current one are dropped.
    pub fn handle_event(
        &mut self,
        event: PlaybackEvent,
        animation: &mut dyn AnimationSink,
        editor: &mut dyn EditorSink,
    ) -> PlaybackState {
        let current = self.session.as_ref().map(|session| session.id);
        if current != Some(event.session()) {
            tracing::debug!(
                event_session = event.session().sequence(),
                current = ?current.map(SessionId::sequence),
                "ignoring playback event for another session"
            );
            return self.state;
        }

        match event {
            PlaybackEvent::Started { timestamp, .. } => match self.session.as_mut() {
                Some(session) if self.state == PlaybackState::Starting => {
                    session.started_at = Some(timestamp);
                    self.state = PlaybackState::Playing;
                    tracing::info!(session = session.id.sequence(), timestamp, "playback started");
                    animation.initiate(session.color_map.clone(), timestamp);
                }
                _ => {
                    tracing::debug!(state = ?self.state, "ignoring repeated playback start");
                }
            },
            PlaybackEvent::Stopped { session } => {
                tracing::info!(session = session.sequence(), "playback stopped");
                self.session = None;
                self.state = PlaybackState::Stopped;
                editor.set_read_only(false);
            }
        }
        self.state
    }
}
