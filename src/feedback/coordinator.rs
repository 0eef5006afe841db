//! Haptic, voice and ring feedback.
//!
//! Feedback channels are rate-sensitive: haptics fire only on accepted
//! captures and explicit toggles, and a voice prompt is queued only when
//! its key differs from the last one spoken.

use super::VoicePromptKey;
use crate::session::CaptureEvent;
use std::sync::{Arc, Mutex};

/// Discrete haptic patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HapticEvent {
    /// Accepted capture.
    Success,
    /// Light tick for manual toggles.
    Impact,
}

/// Platform output for feedback.
pub trait FeedbackSink: Send {
    fn haptic(&mut self, event: HapticEvent);

    /// Queues an utterance.
    fn speak(&mut self, key: VoicePromptKey);
}

/// Ring tint. Binary on purpose: no gradient between states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RingTint {
    /// Gate open.
    Affirmative,
    /// Something needs fixing.
    Attention,
}

/// Hold-progress ring appearance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RingStyle {
    /// Fill fraction in `[0, 1]`.
    pub fill: f64,
    /// Ring colour.
    pub tint: RingTint,
}

impl RingStyle {
    /// Builds the ring for the given hold progress and gate state.
    pub fn new(hold_progress: f64, can_capture: bool) -> Self {
        Self {
            fill: hold_progress.clamp(0.0, 1.0),
            tint: if can_capture {
                RingTint::Affirmative
            } else {
                RingTint::Attention
            },
        }
    }
}

/// Turns gate state and capture events into user feedback.
pub struct FeedbackCoordinator {
    sink: Box<dyn FeedbackSink>,
    voice_enabled: bool,
    last_spoken: Option<VoicePromptKey>,
}

impl FeedbackCoordinator {
    /// Creates a coordinator that reports through `sink`.
    pub fn new(sink: Box<dyn FeedbackSink>, voice_enabled: bool) -> Self {
        Self {
            sink,
            voice_enabled,
            last_spoken: None,
        }
    }

    /// Speaks `key` if voice is on and it differs from the last prompt.
    ///
    /// Returns true if an utterance was queued.
    pub fn on_tick(&mut self, key: VoicePromptKey) -> bool {
        if !self.voice_enabled || self.last_spoken == Some(key) {
            return false;
        }
        self.last_spoken = Some(key);
        self.sink.speak(key);
        true
    }

    /// Success haptic for an accepted capture, manual or automatic.
    pub fn on_capture(&mut self, _event: &CaptureEvent) {
        self.sink.haptic(HapticEvent::Success);
    }

    /// Toggles voice prompts with an impact haptic.
    ///
    /// Turning voice back on re-announces the current prompt on the next tick.
    pub fn set_voice_enabled(&mut self, enabled: bool) {
        self.sink.haptic(HapticEvent::Impact);
        self.voice_enabled = enabled;
        if !enabled {
            self.last_spoken = None;
        }
        tracing::info!(enabled, "Voice prompts toggled");
    }

    /// Whether voice prompts are on.
    pub fn voice_enabled(&self) -> bool {
        self.voice_enabled
    }

    /// Last prompt spoken, if any.
    pub fn last_spoken(&self) -> Option<VoicePromptKey> {
        self.last_spoken
    }
}

/// Sink that logs feedback through `tracing`.
#[derive(Debug, Default)]
pub struct TracingFeedback;

impl FeedbackSink for TracingFeedback {
    fn haptic(&mut self, event: HapticEvent) {
        tracing::debug!(?event, "Haptic");
    }

    fn speak(&mut self, key: VoicePromptKey) {
        tracing::info!(prompt = key.as_str(), "Voice: {}", key.phrase());
    }
}

/// Feedback emitted to a [`RecordingSink`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackEvent {
    /// A haptic event.
    Haptic(HapticEvent),
    /// A spoken prompt.
    Speech(VoicePromptKey),
}

/// Sink that records everything, for tests and replay.
///
/// Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<FeedbackEvent>>>,
}

impl RecordingSink {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of recorded events.
    pub fn events(&self) -> Vec<FeedbackEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Recorded utterances only.
    pub fn utterances(&self) -> Vec<VoicePromptKey> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                FeedbackEvent::Speech(key) => Some(key),
                FeedbackEvent::Haptic(_) => None,
            })
            .collect()
    }

    fn push(&self, event: FeedbackEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

impl FeedbackSink for RecordingSink {
    fn haptic(&mut self, event: HapticEvent) {
        self.push(FeedbackEvent::Haptic(event));
    }

    fn speak(&mut self, key: VoicePromptKey) {
        self.push(FeedbackEvent::Speech(key));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::TargetPose;
    use crate::session::CaptureTrigger;

    fn coordinator(voice: bool) -> (FeedbackCoordinator, RecordingSink) {
        let sink = RecordingSink::new();
        (FeedbackCoordinator::new(Box::new(sink.clone()), voice), sink)
    }

    #[test]
    fn test_unchanged_key_spoken_once() {
        let (mut feedback, sink) = coordinator(true);
        for _ in 0..25 {
            feedback.on_tick(VoicePromptKey::TooDark);
        }
        assert_eq!(sink.utterances(), vec![VoicePromptKey::TooDark]);

        feedback.on_tick(VoicePromptKey::Hold);
        feedback.on_tick(VoicePromptKey::Hold);
        assert_eq!(
            sink.utterances(),
            vec![VoicePromptKey::TooDark, VoicePromptKey::Hold]
        );
    }

    #[test]
    fn test_silent_when_disabled() {
        let (mut feedback, sink) = coordinator(false);
        assert!(!feedback.on_tick(VoicePromptKey::NoFace));
        assert!(sink.utterances().is_empty());
    }

    #[test]
    fn test_toggle_fires_impact_and_reannounces() {
        let (mut feedback, sink) = coordinator(true);
        feedback.on_tick(VoicePromptKey::Center);
        feedback.set_voice_enabled(false);
        feedback.set_voice_enabled(true);
        feedback.on_tick(VoicePromptKey::Center);

        assert_eq!(
            sink.events(),
            vec![
                FeedbackEvent::Speech(VoicePromptKey::Center),
                FeedbackEvent::Haptic(HapticEvent::Impact),
                FeedbackEvent::Haptic(HapticEvent::Impact),
                FeedbackEvent::Speech(VoicePromptKey::Center),
            ]
        );
    }

    #[test]
    fn test_capture_fires_success() {
        let (mut feedback, sink) = coordinator(true);
        feedback.on_capture(&CaptureEvent {
            trigger: CaptureTrigger::Automatic,
            pose: TargetPose::Front,
            count: 1,
            sequence: 3,
        });
        assert_eq!(sink.events(), vec![FeedbackEvent::Haptic(HapticEvent::Success)]);
    }

    #[test]
    fn test_ring_style() {
        assert_eq!(RingStyle::new(0.4, true).tint, RingTint::Affirmative);
        assert_eq!(RingStyle::new(0.4, false).tint, RingTint::Attention);
        assert_eq!(RingStyle::new(1.3, true).fill, 1.0);
    }
}
