use std::collections::HashMap;

use crate::dom::NodeId;
use crate::{Error, Result};

/// Viewport height a fresh page starts with, in the same abstract units as
/// scroll offsets and element rects.
pub const DEFAULT_VIEWPORT_HEIGHT: i64 = 720;

/// How a programmatic scroll was requested. `Smooth` is the platform's
/// animated easing; the runtime applies both instantly but records the
/// requested behavior so tests can tell them apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollBehavior {
    Auto,
    Smooth,
}

/// Vertical extent of an element in document coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub top: i64,
    pub height: i64,
}

#[derive(Debug, Clone)]
pub(crate) struct Viewport {
    pub(crate) scroll_y: i64,
    pub(crate) height: i64,
    rects: HashMap<NodeId, Rect>,
}

impl Viewport {
    pub(crate) fn new() -> Self {
        Self {
            scroll_y: 0,
            height: DEFAULT_VIEWPORT_HEIGHT,
            rects: HashMap::new(),
        }
    }

    pub(crate) fn set_rect(&mut self, node_id: NodeId, rect: Rect) -> Result<()> {
        if rect.height < 0 {
            return Err(Error::DomRuntime("rect height must be non-negative".into()));
        }
        self.rects.insert(node_id, rect);
        Ok(())
    }

    /// Fraction of the element currently inside the viewport band,
    /// expanded by `root_margin` on both edges. Elements with no assigned
    /// rect sit at the document top with zero height; a zero-height
    /// element counts as fully visible while its top edge is in the band.
    pub(crate) fn visible_ratio(&self, node_id: NodeId, root_margin: i64) -> f64 {
        let rect = self
            .rects
            .get(&node_id)
            .copied()
            .unwrap_or(Rect { top: 0, height: 0 });

        let band_top = -root_margin;
        let band_bottom = self.height + root_margin;
        let top = rect.top - self.scroll_y;

        if rect.height == 0 {
            return if top >= band_top && top <= band_bottom {
                1.0
            } else {
                0.0
            };
        }

        let visible_top = top.max(band_top);
        let visible_bottom = (top + rect.height).min(band_bottom);
        let overlap = (visible_bottom - visible_top).max(0);
        overlap as f64 / rect.height as f64
    }
}
