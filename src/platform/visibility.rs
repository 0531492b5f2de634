/// One-shot in-view trigger for scroll-revealed content
///
/// The trigger latches the first time an element's visible share of the
/// (margin-adjusted) viewport reaches the threshold and then stops
/// observing, so content animates in once and never re-triggers.

use crate::rendering::layout::Rect;

/// Offsets applied to the viewport edges; negative values shrink it.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RootMargin {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InViewOptions {
    /// Fraction of the element that must be visible, in `0.0..=1.0`
    pub threshold: f32,
    pub root_margin: RootMargin,
}

impl Default for InViewOptions {
    fn default() -> Self {
        Self {
            threshold: 0.1,
            root_margin: RootMargin {
                bottom: -50.0,
                ..Default::default()
            },
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct InViewTrigger {
    options: InViewOptions,
    in_view: bool,
}

impl InViewTrigger {
    pub fn new(options: InViewOptions) -> Self {
        Self {
            options,
            in_view: false,
        }
    }

    pub fn is_in_view(&self) -> bool {
        self.in_view
    }

    /// Still watching the element
    pub fn is_observing(&self) -> bool {
        !self.in_view
    }

    /// Feed the element and viewport geometry after a scroll or resize.
    /// Returns whether the element has been revealed.
    pub fn observe(&mut self, element: Rect, viewport: Rect) -> bool {
        if self.in_view {
            return true;
        }
        let ratio = intersection_ratio(element, self.root(viewport));
        if let Some(ratio) = ratio {
            if ratio >= self.options.threshold {
                self.in_view = true;
            }
        }
        self.in_view
    }

    fn root(&self, viewport: Rect) -> Rect {
        let m = self.options.root_margin;
        Rect {
            x: viewport.x - m.left,
            y: viewport.y - m.top,
            width: (viewport.width + m.left + m.right).max(0.0),
            height: (viewport.height + m.top + m.bottom).max(0.0),
        }
    }
}

/// Visible fraction of `element` inside `root`; `None` when they do not touch.
pub fn intersection_ratio(element: Rect, root: Rect) -> Option<f32> {
    let left = element.x.max(root.x);
    let top = element.y.max(root.y);
    let right = (element.x + element.width).min(root.x + root.width);
    let bottom = (element.y + element.height).min(root.y + root.height);
    if right < left || bottom < top {
        return None;
    }
    let area = element.width * element.height;
    if area <= 0.0 {
        // A zero-area element inside the root counts as fully visible.
        return Some(1.0);
    }
    Some((right - left) * (bottom - top) / area)
}
