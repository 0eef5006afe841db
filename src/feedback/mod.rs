//! User feedback: voice prompts, haptics and the hold ring.

mod coordinator;
mod prompt;

pub use coordinator::{
    FeedbackCoordinator, FeedbackEvent, FeedbackSink, HapticEvent, RecordingSink, RingStyle,
    RingTint, TracingFeedback,
};
pub use prompt::VoicePromptKey;
