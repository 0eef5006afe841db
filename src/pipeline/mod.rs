//! Threading and hand-off between the camera and the render thread.
//!
//! ```text
//! producer thread:  frame → scene metrics ──────────────┐
//!                         └→ throttle → detector worker ─┤ UpdateMailbox
//! render thread:    tick → take → PipelineState → gate/sequencer → feedback
//! ```
//!
//! Producer-side results travel as [`PipelineUpdate`] values through an
//! [`UpdateMailbox`] that keeps only the newest unread one of each kind. The
//! render thread is the only reader of the resulting [`PipelineState`] and
//! the only driver of the session and feedback.

mod controller;
mod mailbox;
mod processor;
pub(crate) mod state;
mod ticker;

pub use controller::{LiveCaptureController, LiveView, PipelineError, Remediation};
pub use mailbox::UpdateMailbox;
pub use processor::{CounterSnapshot, FrameProcessor, PipelineCounters};
pub use state::{PipelineState, PipelineUpdate};
pub use ticker::Ticker;
