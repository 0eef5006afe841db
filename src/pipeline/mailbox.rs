//! Latest-value hand-off from the producer side to the render thread.

use super::PipelineUpdate;
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct Pending {
    scene: Option<PipelineUpdate>,
    face: Option<PipelineUpdate>,
}

/// Holds at most one unread update of each kind.
///
/// A newer update replaces an unread older one of the same kind, so a
/// stalled render thread never lets results pile up. Clones share the slots.
#[derive(Debug, Clone, Default)]
pub struct UpdateMailbox {
    pending: Arc<Mutex<Pending>>,
}

impl UpdateMailbox {
    /// Creates an empty mailbox.
    pub fn new() -> Self {
        Self::default()
    }

    /// Posts an update. Returns true if it replaced one that was never read.
    pub fn post(&self, update: PipelineUpdate) -> bool {
        let Ok(mut pending) = self.pending.lock() else {
            return false;
        };
        let slot = match update {
            PipelineUpdate::Scene { .. } => &mut pending.scene,
            PipelineUpdate::Face { .. } => &mut pending.face,
        };
        slot.replace(update).is_some()
    }

    /// Takes every unread update, leaving the mailbox empty.
    pub fn take(&self) -> Vec<PipelineUpdate> {
        let Ok(mut pending) = self.pending.lock() else {
            return Vec::new();
        };
        pending.scene.take().into_iter().chain(pending.face.take()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{FaceGeometry, SceneMetrics};

    fn scene(sequence: u64) -> PipelineUpdate {
        PipelineUpdate::Scene {
            generation: 1,
            sequence,
            metrics: SceneMetrics::from_stats(0.6, 0.0, Vec::new(), 10),
        }
    }

    #[test]
    fn test_newer_update_replaces_unread() {
        let mailbox = UpdateMailbox::new();
        assert!(!mailbox.post(scene(1)));
        for seq in 2..=500 {
            assert!(mailbox.post(scene(seq)));
        }

        let updates = mailbox.take();
        assert_eq!(updates.len(), 1);
        assert!(matches!(updates[0], PipelineUpdate::Scene { sequence: 500, .. }));
        assert!(mailbox.take().is_empty());
    }

    #[test]
    fn test_kinds_do_not_replace_each_other() {
        let mailbox = UpdateMailbox::new();
        mailbox.post(scene(3));
        let replaced = mailbox.post(PipelineUpdate::Face {
            generation: 1,
            geometry: FaceGeometry::default(),
        });
        assert!(!replaced);

        let clone = mailbox.clone();
        assert_eq!(clone.take().len(), 2);
        assert!(mailbox.take().is_empty());
    }
}
