//! Recording collaborators for unit tests.

use std::{cell::RefCell, rc::Rc, sync::Arc};

use crate::{
    audio::{AudioClip, Frame},
    compile::{
        AnimationFrame, AnimationInfoProvider, ColorMap, ColorSpan, CompileOutcome, Compiler,
        Diagnostic,
    },
    sinks::{AnimationSink, AudioSink, EditorSink, MarkerSeverity, SessionId},
    PlayLinkError, Result,
};

pub(crate) use crate::decode::wav_bytes;

pub(crate) type Shared<T> = Rc<RefCell<T>>;

pub(crate) fn clip(frames: usize) -> AudioClip {
    vec![Frame::silent(); frames].into()
}

#[derive(Debug, Default)]
pub(crate) struct AudioLog {
    pub published: Vec<AudioClip>,
    pub started_sessions: Vec<SessionId>,
    pub playing: bool,
    pub fail_start: bool,
}

impl AudioLog {
    pub fn published_lengths(&self) -> Vec<usize> {
        self.published.iter().map(|clip| clip.len()).collect()
    }

    pub fn start_requests(&self) -> usize {
        self.started_sessions.len()
    }
}

pub(crate) struct RecordingAudio {
    log: Shared<AudioLog>,
}

impl RecordingAudio {
    pub fn new() -> (Self, Shared<AudioLog>) {
        let log = Shared::default();
        (Self { log: log.clone() }, log)
    }
}

impl AudioSink for RecordingAudio {
    fn set_audio(&mut self, audio: AudioClip) {
        self.log.borrow_mut().published.push(audio);
    }

    fn start_playback(&mut self, session: SessionId) -> Result<()> {
        let mut log = self.log.borrow_mut();
        if log.fail_start {
            return Err(PlayLinkError::msg("audio sink failed to start"));
        }
        log.started_sessions.push(session);
        Ok(())
    }

    fn is_playing(&self) -> bool {
        self.log.borrow().playing
    }
}

#[derive(Debug, Default)]
pub(crate) struct EditorLog {
    pub markers: Vec<Diagnostic>,
    pub marker_owner: Option<String>,
    pub marker_severity: Option<MarkerSeverity>,
    pub marker_updates: usize,
    pub painted: Vec<ColorMap>,
    pub read_only: bool,
}

pub(crate) struct RecordingEditor {
    log: Shared<EditorLog>,
}

impl RecordingEditor {
    pub fn new() -> (Self, Shared<EditorLog>) {
        let log = Shared::default();
        (Self { log: log.clone() }, log)
    }
}

impl EditorSink for RecordingEditor {
    fn set_markers(&mut self, owner: &str, severity: MarkerSeverity, diagnostics: &[Diagnostic]) {
        let mut log = self.log.borrow_mut();
        log.markers = diagnostics.to_vec();
        log.marker_owner = Some(owner.to_string());
        log.marker_severity = Some(severity);
        log.marker_updates += 1;
    }

    fn paint_colors(&mut self, color_map: &ColorMap) {
        self.log.borrow_mut().painted.push(color_map.clone());
    }

    fn set_read_only(&mut self, read_only: bool) {
        self.log.borrow_mut().read_only = read_only;
    }
}

#[derive(Debug, Default)]
pub(crate) struct AnimationLog {
    pub providers: Vec<AnimationInfoProvider>,
    pub initiated: Vec<(Arc<ColorMap>, f64)>,
}

pub(crate) struct RecordingAnimation {
    log: Shared<AnimationLog>,
}

impl RecordingAnimation {
    pub fn new() -> (Self, Shared<AnimationLog>) {
        let log = Shared::default();
        (Self { log: log.clone() }, log)
    }
}

impl AnimationSink for RecordingAnimation {
    fn set_animation_provider(&mut self, provider: AnimationInfoProvider) {
        self.log.borrow_mut().providers.push(provider);
    }

    fn initiate(&mut self, color_map: Arc<ColorMap>, start_timestamp: f64) {
        self.log
            .borrow_mut()
            .initiated
            .push((color_map, start_timestamp));
    }
}

/// Compiler driven by the source text itself: `frames:N` compiles to `N`
/// frames of natural audio colored after the text, anything else fails
/// with one diagnostic.
#[derive(Debug, Default)]
pub(crate) struct ScriptedCompiler {
    pub calls: Shared<Vec<(String, f64)>>,
}

impl ScriptedCompiler {
    pub fn new() -> (Self, Shared<Vec<(String, f64)>>) {
        let calls = Shared::default();
        (
            Self {
                calls: calls.clone(),
            },
            calls,
        )
    }
}

impl Compiler for ScriptedCompiler {
    fn compile(&mut self, source: &str, syllable_time_ms: f64) -> CompileOutcome {
        self.calls
            .borrow_mut()
            .push((source.to_string(), syllable_time_ms));

        match source
            .strip_prefix("frames:")
            .and_then(|n| n.trim().parse::<usize>().ok())
        {
            Some(frames) => CompileOutcome::success(
                ColorMap::new(vec![ColorSpan {
                    line: 1,
                    start_col: 1,
                    end_col: source.len() as u32 + 1,
                    color: source.to_string(),
                }]),
                AnimationInfoProvider::new(|_| AnimationFrame {
                    active_spans: vec![0],
                }),
                clip(frames),
            ),
            None => CompileOutcome::failure(vec![Diagnostic::new(
                "unmatched parenthesis",
                (1, 3),
                (1, 4),
            )]),
        }
    }
}
