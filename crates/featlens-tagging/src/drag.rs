#![forbid(unsafe_code)]

//! Pointer drag controllers: threshold handles, rubber-band selection, and
//! popover repositioning.
//!
//! Each controller follows the same press -> move -> release sequence. A
//! press only arms the gesture; movement starts it once the pointer has
//! travelled `drag_threshold` pixels (manhattan distance).
//!
//! # Invariants
//!
//! 1. No state survives a gesture: release and cancel both disarm.
//! 2. A threshold handle never passes its neighbours, so the threshold list
//!    stays strictly increasing.
//! 3. A dragged popover stays inside the viewport minus its margin.
//!
//! # Failure Modes
//!
//! - A release without a started drag is a click: controllers return `None`
//!   and change nothing.
//! - Cancelling a threshold drag restores the values from before the press.

use featlens_core::{Point, Rect, Size};
use featlens_layout::{
    HistogramChart, LinearScale, PopoverConfig, calculate_optimal_popover_position,
};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DragConfig {
    /// Minimum manhattan distance (px) before a drag starts (default: 3).
    pub drag_threshold: f64,
    /// Pixel radius around a threshold handle that grabs it (default: 8).
    pub handle_hit_radius: f64,
    /// Smallest gap between neighbouring thresholds, as a fraction of the
    /// scale domain (default: 0.005).
    pub min_handle_gap: f64,
}

impl Default for DragConfig {
    fn default() -> Self {
        Self {
            drag_threshold: 3.0,
            handle_hit_radius: 8.0,
            min_handle_gap: 0.005,
        }
    }
}

impl DragConfig {
    #[must_use]
    pub fn drag_threshold(mut self, px: f64) -> Self {
        self.drag_threshold = px;
        self
    }

    #[must_use]
    pub fn handle_hit_radius(mut self, px: f64) -> Self {
        self.handle_hit_radius = px;
        self
    }

    #[must_use]
    pub fn min_handle_gap(mut self, fraction: f64) -> Self {
        self.min_handle_gap = fraction;
        self
    }
}

// ---------------------------------------------------------------------------
// Internal state
// ---------------------------------------------------------------------------

/// Tracks an ongoing or potential drag.
#[derive(Debug, Clone, Copy)]
struct DragTracker {
    start_pos: Point,
    last_pos: Point,
    started: bool,
}

impl DragTracker {
    fn new(pos: Point) -> Self {
        Self {
            start_pos: pos,
            last_pos: pos,
            started: false,
        }
    }

    /// Record a move. Returns true once the drag has started.
    fn motion(&mut self, pos: Point, threshold: f64) -> bool {
        if !self.started && self.start_pos.manhattan_distance(pos) >= threshold {
            self.started = true;
        }
        self.last_pos = pos;
        self.started
    }
}

// ---------------------------------------------------------------------------
// Threshold handles
// ---------------------------------------------------------------------------

/// Drags one handle of a multi-threshold slider along a scale.
#[derive(Debug, Clone)]
pub struct ThresholdDrag {
    scale: LinearScale,
    thresholds: Vec<f64>,
    before: Vec<f64>,
    handle: Option<usize>,
    tracker: Option<DragTracker>,
    config: DragConfig,
}

impl ThresholdDrag {
    #[must_use]
    pub fn new(scale: LinearScale, thresholds: Vec<f64>, config: DragConfig) -> Self {
        Self {
            scale,
            before: thresholds.clone(),
            thresholds,
            handle: None,
            tracker: None,
            config,
        }
    }

    #[must_use]
    pub fn thresholds(&self) -> &[f64] {
        &self.thresholds
    }

    #[must_use]
    pub fn active_handle(&self) -> Option<usize> {
        self.handle
    }

    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.tracker.is_some_and(|t| t.started)
    }

    /// Handle closest to pixel `x` within the hit radius.
    #[must_use]
    pub fn hit_test(&self, x: f64) -> Option<usize> {
        self.thresholds
            .iter()
            .enumerate()
            .map(|(i, &t)| (i, (self.scale.scale(t) - x).abs()))
            .filter(|&(_, d)| d <= self.config.handle_hit_radius)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i)
    }

    /// Arm a drag if `pos` grabs a handle. Returns the grabbed handle.
    pub fn press(&mut self, pos: Point) -> Option<usize> {
        let handle = self.hit_test(pos.x)?;
        self.handle = Some(handle);
        self.tracker = Some(DragTracker::new(pos));
        self.before = self.thresholds.clone();
        Some(handle)
    }

    /// Follow the pointer. Returns the updated thresholds while dragging.
    pub fn motion(&mut self, pos: Point) -> Option<&[f64]> {
        let handle = self.handle?;
        let tracker = self.tracker.as_mut()?;
        if !tracker.motion(pos, self.config.drag_threshold) {
            return None;
        }
        let value = self.clamp_handle(handle, self.scale.invert(pos.x));
        self.thresholds[handle] = value;
        Some(&self.thresholds)
    }

    /// Finish the gesture. Returns the final thresholds if a drag happened.
    pub fn release(&mut self, pos: Point) -> Option<Vec<f64>> {
        let dragged = self.motion(pos).is_some();
        let handle = self.handle.take();
        self.tracker = None;
        if dragged {
            tracing::debug!(?handle, thresholds = ?self.thresholds, "drag.threshold.end");
            Some(self.thresholds.clone())
        } else {
            None
        }
    }

    /// Abort the gesture and restore the thresholds from before the press.
    pub fn cancel(&mut self) -> &[f64] {
        if self.tracker.take().is_some() {
            self.thresholds = self.before.clone();
        }
        self.handle = None;
        &self.thresholds
    }

    fn clamp_handle(&self, handle: usize, value: f64) -> f64 {
        let (d0, d1) = self.scale.domain();
        let (lo_domain, hi_domain) = (d0.min(d1), d0.max(d1));
        let gap = (hi_domain - lo_domain) * self.config.min_handle_gap;
        let lo = handle
            .checked_sub(1)
            .and_then(|i| self.thresholds.get(i))
            .map_or(lo_domain, |&prev| prev + gap);
        let hi = self
            .thresholds
            .get(handle + 1)
            .map_or(hi_domain, |&next| next - gap);
        if lo > hi {
            return self.thresholds[handle];
        }
        value.min(hi).max(lo)
    }
}

// ---------------------------------------------------------------------------
// Rubber-band selection
// ---------------------------------------------------------------------------

/// Rectangular selection over chart bars.
#[derive(Debug, Clone, Default)]
pub struct RectSelection {
    tracker: Option<DragTracker>,
    config: DragConfig,
}

impl RectSelection {
    #[must_use]
    pub fn new(config: DragConfig) -> Self {
        Self {
            tracker: None,
            config,
        }
    }

    pub fn press(&mut self, pos: Point) {
        self.tracker = Some(DragTracker::new(pos));
    }

    /// Current band once the drag has started.
    pub fn motion(&mut self, pos: Point) -> Option<Rect> {
        let tracker = self.tracker.as_mut()?;
        tracker
            .motion(pos, self.config.drag_threshold)
            .then(|| Rect::from_corners(tracker.start_pos, tracker.last_pos))
    }

    /// Finish the gesture and return the final band.
    pub fn release(&mut self, pos: Point) -> Option<Rect> {
        let band = self.motion(pos);
        self.tracker = None;
        band
    }

    pub fn cancel(&mut self) {
        self.tracker = None;
    }

    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.tracker.is_some_and(|t| t.started)
    }

    /// Indices of `targets` that the band touches.
    #[must_use]
    pub fn hits(band: Rect, targets: &[Rect]) -> Vec<usize> {
        targets
            .iter()
            .enumerate()
            .filter(|(_, r)| band.intersects(r))
            .map(|(i, _)| i)
            .collect()
    }

    /// Bin indices of `chart` whose bars the band touches.
    #[must_use]
    pub fn hit_bars(band: Rect, chart: &HistogramChart) -> Vec<usize> {
        chart
            .bars
            .iter()
            .filter(|b| band.intersects(&b.rect))
            .map(|b| b.index)
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Popover repositioning
// ---------------------------------------------------------------------------

/// Moves a popover with the pointer, clamped into the viewport.
#[derive(Debug, Clone)]
pub struct PopoverDrag {
    tracker: Option<DragTracker>,
    origin: Point,
    size: Size,
    viewport: Size,
    popover: PopoverConfig,
    config: DragConfig,
}

impl PopoverDrag {
    #[must_use]
    pub fn new(viewport: Size, popover: PopoverConfig, config: DragConfig) -> Self {
        Self {
            tracker: None,
            origin: Point::default(),
            size: Size::default(),
            viewport,
            popover,
            config,
        }
    }

    pub fn set_viewport(&mut self, viewport: Size) {
        self.viewport = viewport;
    }

    /// Grab the popover currently drawn at `rect`.
    pub fn press(&mut self, pos: Point, rect: Rect) {
        self.tracker = Some(DragTracker::new(pos));
        self.origin = Point::new(rect.x, rect.y);
        self.size = Size::new(rect.width, rect.height);
    }

    /// New popover rectangle once the drag has started.
    pub fn motion(&mut self, pos: Point) -> Option<Rect> {
        let tracker = self.tracker.as_mut()?;
        if !tracker.motion(pos, self.config.drag_threshold) {
            return None;
        }
        let candidate = Point::new(
            self.origin.x + pos.x - tracker.start_pos.x,
            self.origin.y + pos.y - tracker.start_pos.y,
        );
        Some(calculate_optimal_popover_position(
            candidate,
            self.size,
            self.viewport,
            &self.popover,
        ))
    }

    pub fn release(&mut self, pos: Point) -> Option<Rect> {
        let rect = self.motion(pos);
        self.tracker = None;
        rect
    }

    pub fn cancel(&mut self) {
        self.tracker = None;
    }

    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.tracker.is_some_and(|t| t.started)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slider() -> ThresholdDrag {
        let scale = LinearScale::new((0.0, 1.0), (0.0, 100.0));
        ThresholdDrag::new(scale, vec![0.3, 0.7], DragConfig::default())
    }

    #[test]
    fn small_moves_do_not_start_a_drag() {
        let mut d = slider();
        assert_eq!(d.press(Point::new(31.0, 5.0)), Some(0));
        assert!(d.motion(Point::new(32.0, 5.0)).is_none());
        assert!(!d.is_dragging());
        assert!(d.release(Point::new(32.0, 6.0)).is_none());
        assert_eq!(d.thresholds(), &[0.3, 0.7]);
        assert_eq!(d.active_handle(), None);
    }

    #[test]
    fn handle_follows_pointer() {
        let mut d = slider();
        d.press(Point::new(30.0, 5.0));
        let t = d.motion(Point::new(50.0, 5.0)).unwrap();
        assert!((t[0] - 0.5).abs() < 1e-12);
        let done = d.release(Point::new(40.0, 5.0)).unwrap();
        assert!((done[0] - 0.4).abs() < 1e-12);
        assert!(!d.is_dragging());
    }

    #[test]
    fn handles_cannot_cross() {
        let mut d = slider();
        d.press(Point::new(30.0, 0.0));
        let t = d.motion(Point::new(95.0, 0.0)).unwrap().to_vec();
        assert!(t[0] < t[1]);
        assert!((t[0] - 0.695).abs() < 1e-9);

        let mut d = slider();
        d.press(Point::new(70.0, 0.0));
        let t = d.motion(Point::new(-40.0, 0.0)).unwrap().to_vec();
        assert!((t[1] - 0.305).abs() < 1e-9);
    }

    #[test]
    fn cancel_restores_previous_values() {
        let mut d = slider();
        d.press(Point::new(70.0, 0.0));
        d.motion(Point::new(90.0, 0.0));
        assert_eq!(d.cancel(), &[0.3, 0.7]);
    }

    #[test]
    fn press_outside_handles_is_ignored() {
        let mut d = slider();
        assert_eq!(d.press(Point::new(50.0, 0.0)), None);
        assert!(d.motion(Point::new(90.0, 0.0)).is_none());
    }

    #[test]
    fn rubber_band_hits_targets() {
        let mut sel = RectSelection::default();
        sel.press(Point::new(10.0, 10.0));
        assert!(sel.motion(Point::new(11.0, 11.0)).is_none());
        let band = sel.release(Point::new(35.0, 40.0)).unwrap();
        assert_eq!(band, Rect::new(10.0, 10.0, 25.0, 30.0));
        let targets = [
            Rect::new(0.0, 0.0, 5.0, 5.0),
            Rect::new(20.0, 20.0, 5.0, 5.0),
            Rect::new(30.0, 0.0, 10.0, 100.0),
        ];
        assert_eq!(RectSelection::hits(band, &targets), vec![1, 2]);
        assert!(!sel.is_dragging());
    }

    #[test]
    fn popover_stays_in_viewport() {
        let mut drag = PopoverDrag::new(
            Size::new(400.0, 300.0),
            PopoverConfig::default(),
            DragConfig::default(),
        );
        drag.press(Point::new(110.0, 110.0), Rect::new(100.0, 100.0, 120.0, 80.0));
        let moved = drag.motion(Point::new(130.0, 120.0)).unwrap();
        assert_eq!((moved.x, moved.y), (120.0, 110.0));
        let clamped = drag.release(Point::new(900.0, -500.0)).unwrap();
        assert_eq!((clamped.x, clamped.y), (400.0 - 16.0 - 120.0, 16.0));
        assert!(drag.motion(Point::new(0.0, 0.0)).is_none());
    }
}
