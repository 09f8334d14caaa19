//! Keeps a user-uploaded clip aligned with the length of the compiled audio.

use crate::{
    audio::{frames_from_interleaved, AudioClip, Frame},
    config::{AudioConfig, ShortOverridePolicy},
    decode::DecodedAudio,
    sinks::AudioSink,
    PlayLinkError, Result,
};

/// Identifies one decode request. Only the newest ticket may publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DecodeTicket(u64);

impl DecodeTicket {
    pub fn sequence(self) -> u64 {
        self.0
    }
}

/// Summary of an applied upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestReport {
    /// Frame count of the full decoded clip.
    pub frames: usize,
    pub sample_rate: u32,
    /// The clip's rate differs from the assumed compile rate; playback will
    /// drift against the animation.
    pub rate_mismatch: bool,
    /// Frame count published to the sink, if a realign ran.
    pub published: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    Applied(IngestReport),
    /// A newer request was issued (or the override was cleared) while this
    /// one was decoding; the result was dropped.
    Superseded,
}

#[derive(Debug)]
pub struct AudioOverrideProcessor {
    assumed_sample_rate: u32,
    short_policy: ShortOverridePolicy,
    full: Option<AudioClip>,
    cropped: Option<AudioClip>,
    /// Frame count of the natural audio from the latest successful
    /// compilation. `None` until one has happened; realigning is refused
    /// until then.
    natural_frames: Option<usize>,
    latest_ticket: u64,
    /// The latest ticket has been issued but not completed.
    decode_in_flight: bool,
}

impl AudioOverrideProcessor {
    pub fn new(config: &AudioConfig) -> Self {
        Self {
            assumed_sample_rate: config.sample_rate,
            short_policy: config.short_override,
            full: None,
            cropped: None,
            natural_frames: None,
            latest_ticket: 0,
            decode_in_flight: false,
        }
    }

    /// True once a decoded upload is held.
    pub fn is_active(&self) -> bool {
        self.full.is_some()
    }

    pub fn full_samples(&self) -> Option<&AudioClip> {
        self.full.as_ref()
    }

    pub fn cropped_samples(&self) -> Option<&AudioClip> {
        self.cropped.as_ref()
    }

    pub fn natural_frames(&self) -> Option<usize> {
        self.natural_frames
    }

    /// Issues a ticket for a new decode, superseding every earlier one.
    pub fn begin_ingest(&mut self) -> DecodeTicket {
        self.latest_ticket += 1;
        self.decode_in_flight = true;
        DecodeTicket(self.latest_ticket)
    }

    /// True while the newest decode request has not completed.
    pub fn is_decoding(&self) -> bool {
        self.decode_in_flight
    }

    pub fn is_current(&self, ticket: DecodeTicket) -> bool {
        ticket.0 == self.latest_ticket
    }

    /// Applies a finished decode. Out-of-order completions are discarded;
    /// a failed decode leaves the previous override (or natural audio)
    /// authoritative.
    pub fn complete_ingest(
        &mut self,
        ticket: DecodeTicket,
        decoded: Result<DecodedAudio>,
        sink: &mut dyn AudioSink,
    ) -> Result<IngestOutcome> {
        if !self.is_current(ticket) {
            tracing::debug!(
                ticket = ticket.0,
                latest = self.latest_ticket,
                "dropping superseded decode result"
            );
            return Ok(IngestOutcome::Superseded);
        }
        self.decode_in_flight = false;

        let decoded = decoded.map_err(|err| {
            tracing::warn!(error = %err, "audio override decode failed");
            err
        })?;
        if decoded.samples.is_empty() {
            tracing::warn!("audio override decoded to zero samples");
            return Err(PlayLinkError::InvalidInput(
                "decoded audio contains no samples",
            ));
        }

        let rate_mismatch = decoded.sample_rate != self.assumed_sample_rate;
        if rate_mismatch {
            tracing::warn!(
                sample_rate = decoded.sample_rate,
                expected = self.assumed_sample_rate,
                "uploaded audio sample rate differs; playback timing will drift"
            );
        }

        let frames: AudioClip = frames_from_interleaved(&decoded.samples).into();
        tracing::info!(frames = frames.len(), "audio override ingested");
        self.full = Some(frames.clone());
        self.cropped = None;
        let published = self.realign(sink);

        Ok(IngestOutcome::Applied(IngestReport {
            frames: frames.len(),
            sample_rate: decoded.sample_rate,
            rate_mismatch,
            published,
        }))
    }

    /// Convenience for hosts that decode inline.
    pub fn ingest(
        &mut self,
        decoded: Result<DecodedAudio>,
        sink: &mut dyn AudioSink,
    ) -> Result<IngestOutcome> {
        let ticket = self.begin_ingest();
        self.complete_ingest(ticket, decoded, sink)
    }

    /// Records the natural audio length of a successful compilation.
    pub fn update_target(&mut self, natural_frames: usize) {
        if self.natural_frames.is_none() {
            tracing::debug!(natural_frames, "natural audio reference captured");
        }
        self.natural_frames = Some(natural_frames);
    }

    /// Crops the held upload to the current natural length and publishes
    /// it. Returns the published frame count, or `None` when nothing ran.
    pub fn realign(&mut self, sink: &mut dyn AudioSink) -> Option<usize> {
        let Some(target) = self.natural_frames else {
            tracing::debug!("realign requested before any successful compilation; ignoring");
            return None;
        };
        let full = self.full.as_ref()?;

        let cropped: AudioClip = if full.len() >= target {
            full[..target].into()
        } else {
            match self.short_policy {
                ShortOverridePolicy::Keep => {
                    tracing::warn!(
                        override_frames = full.len(),
                        target,
                        "audio override is shorter than the compiled audio"
                    );
                    full.clone()
                }
                ShortOverridePolicy::PadWithSilence => {
                    let mut padded = full.to_vec();
                    padded.resize(target, Frame::silent());
                    padded.into()
                }
            }
        };

        let len = cropped.len();
        self.cropped = Some(cropped.clone());
        sink.set_audio(cropped);
        Some(len)
    }

    /// Drops the override and republishes the natural audio, if any exists.
    /// Any decode still in flight is superseded. With neither an override
    /// nor a pending decode this is a no-op and the sink is not touched.
    pub fn clear(&mut self, natural: Option<&AudioClip>, sink: &mut dyn AudioSink) -> bool {
        if self.full.is_none() && !self.decode_in_flight {
            tracing::debug!("no audio override to clear");
            return false;
        }

        self.latest_ticket += 1;
        self.decode_in_flight = false;
        let was_active = self.full.take().is_some();
        self.cropped = None;

        if was_active {
            match natural {
                Some(audio) => sink.set_audio(audio.clone()),
                None => tracing::debug!("no natural audio to restore after clearing override"),
            }
        }
        was_active
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{audio::FRAME_SIZE, testing::RecordingAudio};

    fn decoded(frames: usize, sample_rate: u32) -> DecodedAudio {
        let samples = (0..frames * FRAME_SIZE * 2)
            .map(|i| (i % 97) as f32 / 97.0)
            .collect();
        DecodedAudio {
            sample_rate,
            channels: 2,
            samples,
        }
    }

    fn processor() -> AudioOverrideProcessor {
        AudioOverrideProcessor::new(&AudioConfig::default())
    }

    #[test]
    fn crops_to_natural_length() {
        let (mut sink, log) = RecordingAudio::new();
        let mut overrides = processor();
        overrides.update_target(10);

        let outcome = overrides.ingest(Ok(decoded(15, 48_000)), &mut sink).unwrap();

        let IngestOutcome::Applied(report) = outcome else {
            panic!("expected upload to apply");
        };
        assert_eq!(report.frames, 15);
        assert_eq!(report.published, Some(10));
        assert!(!report.rate_mismatch);
        assert_eq!(overrides.cropped_samples().unwrap().len(), 10);
        assert_eq!(log.borrow().published_lengths(), vec![10]);
    }

    #[test]
    fn cropped_length_is_min_of_full_and_target() {
        let (mut sink, _log) = RecordingAudio::new();
        let mut overrides = processor();
        overrides.update_target(1);
        overrides.ingest(Ok(decoded(7, 48_000)), &mut sink).unwrap();

        for target in [0, 3, 7, 12] {
            overrides.update_target(target);
            overrides.realign(&mut sink);
            assert_eq!(
                overrides.cropped_samples().unwrap().len(),
                target.min(7),
                "target {target}"
            );
        }
    }

    #[test]
    fn short_upload_can_be_padded() {
        let (mut sink, _log) = RecordingAudio::new();
        let mut overrides = AudioOverrideProcessor::new(&AudioConfig {
            short_override: ShortOverridePolicy::PadWithSilence,
            ..AudioConfig::default()
        });
        overrides.update_target(9);
        overrides.ingest(Ok(decoded(4, 48_000)), &mut sink).unwrap();

        let cropped = overrides.cropped_samples().unwrap();
        assert_eq!(cropped.len(), 9);
        assert_eq!(cropped[8], Frame::silent());
        assert_eq!(cropped[0], overrides.full_samples().unwrap()[0]);
    }

    #[test]
    fn realign_before_compilation_is_a_no_op() {
        let (mut sink, log) = RecordingAudio::new();
        let mut overrides = processor();

        let outcome = overrides.ingest(Ok(decoded(15, 48_000)), &mut sink).unwrap();
        assert!(matches!(
            outcome,
            IngestOutcome::Applied(IngestReport {
                published: None,
                ..
            })
        ));
        assert_eq!(overrides.realign(&mut sink), None);
        assert!(overrides.cropped_samples().is_none());
        assert!(log.borrow().published.is_empty());
    }

    #[test]
    fn warns_but_proceeds_on_rate_mismatch() {
        let (mut sink, _log) = RecordingAudio::new();
        let mut overrides = processor();
        overrides.update_target(2);

        let outcome = overrides.ingest(Ok(decoded(3, 44_100)), &mut sink).unwrap();
        let IngestOutcome::Applied(report) = outcome else {
            panic!("expected upload to apply");
        };
        assert!(report.rate_mismatch);
        assert_eq!(report.published, Some(2));
    }

    #[test]
    fn superseded_decodes_are_dropped() {
        let (mut sink, log) = RecordingAudio::new();
        let mut overrides = processor();
        overrides.update_target(4);

        let first = overrides.begin_ingest();
        let second = overrides.begin_ingest();

        let applied = overrides
            .complete_ingest(second, Ok(decoded(6, 48_000)), &mut sink)
            .unwrap();
        assert!(matches!(applied, IngestOutcome::Applied(_)));

        let late = overrides
            .complete_ingest(first, Ok(decoded(20, 48_000)), &mut sink)
            .unwrap();
        assert_eq!(late, IngestOutcome::Superseded);
        assert_eq!(overrides.full_samples().unwrap().len(), 6);
        assert_eq!(log.borrow().published_lengths(), vec![4]);
    }

    #[test]
    fn failed_decode_keeps_previous_override() {
        let (mut sink, _log) = RecordingAudio::new();
        let mut overrides = processor();
        overrides.update_target(3);
        overrides.ingest(Ok(decoded(5, 48_000)), &mut sink).unwrap();

        let err = overrides
            .ingest(Err(PlayLinkError::msg("corrupt upload")), &mut sink)
            .unwrap_err();
        assert!(format!("{err}").contains("corrupt"));
        assert_eq!(overrides.full_samples().unwrap().len(), 5);
        assert_eq!(overrides.cropped_samples().unwrap().len(), 3);
    }

    #[test]
    fn clear_restores_natural_audio_and_supersedes_in_flight_decodes() {
        let (mut sink, log) = RecordingAudio::new();
        let mut overrides = processor();
        overrides.update_target(3);
        overrides.ingest(Ok(decoded(5, 48_000)), &mut sink).unwrap();

        let in_flight = overrides.begin_ingest();
        let natural: AudioClip = vec![Frame::silent(); 3].into();
        assert!(overrides.clear(Some(&natural), &mut sink));

        assert!(!overrides.is_active());
        assert!(overrides.cropped_samples().is_none());
        assert_eq!(log.borrow().published_lengths(), vec![3, 3]);

        let late = overrides
            .complete_ingest(in_flight, Ok(decoded(5, 48_000)), &mut sink)
            .unwrap();
        assert_eq!(late, IngestOutcome::Superseded);
        assert!(!overrides.is_active());
    }

    #[test]
    fn clear_without_override_does_not_touch_sink() {
        let (mut sink, log) = RecordingAudio::new();
        let mut overrides = processor();
        overrides.update_target(3);
        let natural: AudioClip = vec![Frame::silent(); 3].into();

        assert!(!overrides.clear(Some(&natural), &mut sink));
        assert!(log.borrow().published.is_empty());

        let ticket = overrides.begin_ingest();
        assert!(overrides.is_current(ticket));
    }

    #[test]
    fn clear_during_decode_supersedes_it_without_republishing() {
        let (mut sink, log) = RecordingAudio::new();
        let mut overrides = processor();
        overrides.update_target(3);
        let natural: AudioClip = vec![Frame::silent(); 3].into();

        let ticket = overrides.begin_ingest();
        assert!(overrides.is_decoding());
        assert!(!overrides.clear(Some(&natural), &mut sink));
        assert!(!overrides.is_decoding());

        let late = overrides
            .complete_ingest(ticket, Ok(decoded(5, 48_000)), &mut sink)
            .unwrap();
        assert_eq!(late, IngestOutcome::Superseded);
        assert!(log.borrow().published.is_empty());
    }

    #[test]
    fn reingesting_identical_payload_is_deterministic() {
        let (mut sink, _log) = RecordingAudio::new();
        let mut overrides = processor();
        overrides.update_target(8);

        overrides.ingest(Ok(decoded(12, 48_000)), &mut sink).unwrap();
        let first = overrides.cropped_samples().unwrap().clone();

        overrides.clear(None, &mut sink);
        overrides.ingest(Ok(decoded(12, 48_000)), &mut sink).unwrap();

        assert_eq!(overrides.cropped_samples().unwrap()[..], first[..]);
    }
}
