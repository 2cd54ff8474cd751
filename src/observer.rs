use crate::dom::NodeId;
use crate::viewport::Viewport;

/// A one-shot viewport-intersection watch over a fixed set of targets.
///
/// The watched/unwatched transition lives inside the watcher itself:
/// `take_intersecting` removes a target the moment it crosses the
/// threshold, so a target can fire at most once no matter how often
/// deliveries run afterwards.
#[derive(Debug, Clone)]
pub(crate) struct RevealWatcher {
    root_margin: i64,
    threshold: f64,
    targets: Vec<NodeId>,
}

impl RevealWatcher {
    pub(crate) fn new(root_margin: i64, threshold: f64, targets: Vec<NodeId>) -> Self {
        Self {
            root_margin,
            threshold,
            targets,
        }
    }

    /// Targets whose visible ratio has reached the threshold, removed
    /// from the watch as they are returned.
    pub(crate) fn take_intersecting(&mut self, viewport: &Viewport) -> Vec<NodeId> {
        let mut fired = Vec::new();
        let root_margin = self.root_margin;
        let threshold = self.threshold;
        self.targets.retain(|target| {
            if viewport.visible_ratio(*target, root_margin) >= threshold {
                fired.push(*target);
                false
            } else {
                true
            }
        });
        fired
    }

    pub(crate) fn is_done(&self) -> bool {
        self.targets.is_empty()
    }
}
