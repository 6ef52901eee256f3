use super::surface::ScrollMetrics;

/// Decides whether appended messages pull the list down to the newest row.
///
/// Geometry is sampled before the rows are appended, so the decision reflects where the
/// reader was, not how tall the new rows are.
#[derive(Debug, Clone)]
pub struct ScrollPolicy {
    near_bottom_threshold: f64,
    pending_scroll_to_bottom: bool,
}

impl ScrollPolicy {
    /// The first batch always lands at the bottom.
    pub fn new(near_bottom_threshold: f64) -> Self {
        Self {
            near_bottom_threshold,
            pending_scroll_to_bottom: true,
        }
    }

    pub fn is_near_bottom(&self, metrics: ScrollMetrics) -> bool {
        metrics.distance_from_bottom() < self.near_bottom_threshold
    }

    /// Reports whether to scroll after appending; the first call always does.
    pub fn should_follow(&mut self, before_append: ScrollMetrics) -> bool {
        let follow = self.pending_scroll_to_bottom || self.is_near_bottom(before_append);
        self.pending_scroll_to_bottom = false;
        follow
    }
}
