//! Minimal notation compiler used to drive the controller from the command
//! line. Words are syllables, parentheses nest phrases, and each syllable
//! becomes one decaying tone of `syllable_time_ms` length.

use std::f32::consts::TAU;

use playlink_core::{
    audio::frames_from_interleaved, AnimationFrame, AnimationInfoProvider, ColorMap, ColorSpan,
    CompileOutcome, Compiler, Diagnostic,
};

const PALETTE: [&str; 3] = ["#2bb673", "#4f7cff", "#d63cff"];
const BASE_FREQUENCY: f32 = 330.0;
const AMPLITUDE: f32 = 0.3;

#[derive(Debug, Clone, Copy)]
struct Syllable {
    line: u32,
    start_col: u32,
    end_col: u32,
    depth: usize,
}

#[derive(Debug)]
pub struct PulseCompiler {
    sample_rate: u32,
}

impl PulseCompiler {
    pub fn new(sample_rate: u32) -> Self {
        Self { sample_rate }
    }

    fn synthesize(&self, syllables: &[Syllable], syllable_time_ms: f64) -> Vec<f32> {
        let per_syllable = (syllable_time_ms * self.sample_rate as f64 / 1000.0).round() as usize;
        let mut samples = Vec::with_capacity(syllables.len() * per_syllable * 2);
        for syllable in syllables {
            let freq = BASE_FREQUENCY * (1.0 + syllable.depth as f32 * 0.25);
            for n in 0..per_syllable {
                let t = n as f32 / self.sample_rate as f32;
                let decay = (-5.0 * n as f32 / per_syllable.max(1) as f32).exp();
                let value = AMPLITUDE * decay * (TAU * freq * t).sin();
                samples.push(value);
                samples.push(value);
            }
        }
        samples
    }
}

impl Compiler for PulseCompiler {
    fn compile(&mut self, source: &str, syllable_time_ms: f64) -> CompileOutcome {
        let scan = scan(source);
        if !scan.diagnostics.is_empty() {
            return CompileOutcome::failure(scan.diagnostics);
        }

        let spans = scan
            .syllables
            .iter()
            .map(|s| ColorSpan {
                line: s.line,
                start_col: s.start_col,
                end_col: s.end_col,
                color: PALETTE[s.depth % PALETTE.len()].to_string(),
            })
            .collect();

        let count = scan.syllables.len();
        let animation = AnimationInfoProvider::new(move |elapsed_ms| {
            let index = (elapsed_ms / syllable_time_ms).floor();
            if index >= 0.0 && (index as usize) < count {
                AnimationFrame {
                    active_spans: vec![index as usize],
                }
            } else {
                AnimationFrame::default()
            }
        });

        let audio = frames_from_interleaved(&self.synthesize(&scan.syllables, syllable_time_ms));
        CompileOutcome::success(ColorMap::new(spans), animation, audio.into())
    }
}

#[derive(Debug, Default)]
struct Scan {
    syllables: Vec<Syllable>,
    diagnostics: Vec<Diagnostic>,
    open: Vec<(u32, u32)>,
    word_start: Option<u32>,
}

impl Scan {
    fn flush(&mut self, line: u32, end_col: u32) {
        if let Some(start_col) = self.word_start.take() {
            self.syllables.push(Syllable {
                line,
                start_col,
                end_col,
                depth: self.open.len(),
            });
        }
    }
}

fn scan(source: &str) -> Scan {
    let mut scan = Scan::default();
    for (line_idx, text) in source.lines().enumerate() {
        let line = line_idx as u32 + 1;
        let mut col = 1;
        for ch in text.chars() {
            match ch {
                '(' => {
                    scan.flush(line, col);
                    scan.open.push((line, col));
                }
                ')' => {
                    scan.flush(line, col);
                    if scan.open.pop().is_none() {
                        scan.diagnostics.push(Diagnostic::new(
                            "unmatched `)`",
                            (line, col),
                            (line, col + 1),
                        ));
                    }
                }
                c if c.is_whitespace() => scan.flush(line, col),
                _ => {
                    if scan.word_start.is_none() {
                        scan.word_start = Some(col);
                    }
                }
            }
            col += 1;
        }
        scan.flush(line, col);
    }

    let unclosed = std::mem::take(&mut scan.open);
    for (line, col) in unclosed {
        scan.diagnostics
            .push(Diagnostic::new("unclosed `(`", (line, col), (line, col + 1)));
    }
    scan
}
