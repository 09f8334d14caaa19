//! Headless collaborators: log what an editor would display and record the
//! audio that would be played.

use std::{cell::RefCell, collections::VecDeque, rc::Rc, sync::Arc, time::Instant};

use playlink_core::{
    AnimationInfoProvider, AnimationSink, AudioClip, AudioSink, ColorMap, Diagnostic, EditorSink,
    MarkerSeverity, PlaybackEvent, SessionId,
};

/// Shared state between the headless audio sink and the host loop.
#[derive(Debug, Default)]
pub struct AudioState {
    pub published: Option<AudioClip>,
    pub events: VecDeque<PlaybackEvent>,
}

/// Audio sink without a device. Starting "plays" the whole clip at once: it
/// queues a start notification followed by a stop.
pub struct HeadlessAudio {
    state: Rc<RefCell<AudioState>>,
    clock: Instant,
}

impl HeadlessAudio {
    pub fn new() -> (Self, Rc<RefCell<AudioState>>) {
        let state = Rc::new(RefCell::new(AudioState::default()));
        (
            Self {
                state: state.clone(),
                clock: Instant::now(),
            },
            state,
        )
    }
}

impl AudioSink for HeadlessAudio {
    fn set_audio(&mut self, audio: AudioClip) {
        tracing::debug!(frames = audio.len(), "audio published");
        self.state.borrow_mut().published = Some(audio);
    }

    fn start_playback(&mut self, session: SessionId) -> playlink_core::Result<()> {
        let timestamp = self.clock.elapsed().as_secs_f64();
        let mut state = self.state.borrow_mut();
        state
            .events
            .push_back(PlaybackEvent::Started { session, timestamp });
        state.events.push_back(PlaybackEvent::Stopped { session });
        Ok(())
    }

    fn is_playing(&self) -> bool {
        false
    }
}

#[derive(Debug, Default)]
pub struct ConsoleEditor;

impl EditorSink for ConsoleEditor {
    fn set_markers(&mut self, owner: &str, severity: MarkerSeverity, diagnostics: &[Diagnostic]) {
        for diag in diagnostics {
            tracing::warn!(
                owner,
                ?severity,
                line = diag.start_line,
                col = diag.start_col,
                "{}",
                diag.message
            );
        }
    }

    fn paint_colors(&mut self, color_map: &ColorMap) {
        tracing::debug!(spans = color_map.spans.len(), "colors painted");
    }

    fn set_read_only(&mut self, read_only: bool) {
        tracing::debug!(read_only, "editor input");
    }
}

#[derive(Debug, Default)]
pub struct ConsoleAnimation {
    provider: Option<AnimationInfoProvider>,
}

impl AnimationSink for ConsoleAnimation {
    fn set_animation_provider(&mut self, provider: AnimationInfoProvider) {
        self.provider = Some(provider);
    }

    fn initiate(&mut self, color_map: Arc<ColorMap>, start_timestamp: f64) {
        let first = self
            .provider
            .as_ref()
            .map(|provider| provider.frame_at(0.0).active_spans)
            .unwrap_or_default();
        tracing::info!(
            start_timestamp,
            spans = color_map.spans.len(),
            ?first,
            "animation initiated"
        );
    }
}
