#![forbid(unsafe_code)]

//! Popover placement inside the browser viewport.
//!
//! [`calculate_optimal_popover_position`] clamps a candidate top-left corner
//! so the popover stays inside the viewport shrunk by a fixed margin.
//! [`place_popover`] derives the candidate from an anchor rectangle and a
//! preferred [`Placement`], flipping to the opposite side when the preferred
//! side is too small.
//!
//! # Invariants
//!
//! 1. A popover no larger than the safe area lies entirely inside it.
//! 2. A larger popover is pinned to the safe area's top-left corner and
//!    shrunk to fit.

use featlens_core::{Point, Rect, Size};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopoverConfig {
    /// Distance kept from every viewport edge.
    pub margin: f64,
    /// Distance between anchor and popover.
    pub gap: f64,
    /// Flip to the opposite side when the preferred side is too small.
    pub auto_flip: bool,
}

impl Default for PopoverConfig {
    fn default() -> Self {
        Self {
            margin: 16.0,
            gap: 8.0,
            auto_flip: true,
        }
    }
}

impl PopoverConfig {
    #[must_use]
    pub fn margin(mut self, margin: f64) -> Self {
        self.margin = margin;
        self
    }

    #[must_use]
    pub fn gap(mut self, gap: f64) -> Self {
        self.gap = gap;
        self
    }

    #[must_use]
    pub fn auto_flip(mut self, flip: bool) -> Self {
        self.auto_flip = flip;
        self
    }
}

/// Side of the anchor the popover opens on. The popover is centred on the
/// anchor along the other axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    Above,
    #[default]
    Below,
    Left,
    Right,
}

impl Placement {
    #[must_use]
    pub const fn flip(self) -> Self {
        match self {
            Self::Above => Self::Below,
            Self::Below => Self::Above,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    #[must_use]
    pub const fn is_vertical(self) -> bool {
        matches!(self, Self::Above | Self::Below)
    }
}

/// Final popover rectangle and the side it ended up on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PopoverPosition {
    pub rect: Rect,
    pub placement: Placement,
}

/// Viewport minus `margin` on every side.
#[must_use]
pub fn safe_area(viewport: Size, margin: f64) -> Rect {
    Rect::new(
        margin,
        margin,
        (viewport.width - 2.0 * margin).max(0.0),
        (viewport.height - 2.0 * margin).max(0.0),
    )
}

/// Move (and if needed shrink) `rect` into `area`.
#[must_use]
pub fn clamp_to_viewport(rect: Rect, area: Rect) -> Rect {
    let width = rect.width.min(area.width);
    let height = rect.height.min(area.height);
    let x = rect.x.min(area.right() - width).max(area.left());
    let y = rect.y.min(area.bottom() - height).max(area.top());
    Rect::new(x, y, width, height)
}

/// Clamp a candidate top-left corner so a `popover`-sized box stays inside
/// the viewport minus `config.margin`.
#[must_use]
pub fn calculate_optimal_popover_position(
    candidate: Point,
    popover: Size,
    viewport: Size,
    config: &PopoverConfig,
) -> Rect {
    let area = safe_area(viewport, config.margin);
    clamp_to_viewport(
        Rect::new(candidate.x, candidate.y, popover.width, popover.height),
        area,
    )
}

/// Place a popover next to `anchor`.
#[must_use]
pub fn place_popover(
    anchor: Rect,
    popover: Size,
    viewport: Size,
    preferred: Placement,
    config: &PopoverConfig,
) -> PopoverPosition {
    let area = safe_area(viewport, config.margin);
    let placement = if config.auto_flip {
        resolve_placement(anchor, popover, area, preferred, config.gap)
    } else {
        preferred
    };
    let candidate = candidate_rect(anchor, popover, placement, config.gap);
    PopoverPosition {
        rect: clamp_to_viewport(candidate, area),
        placement,
    }
}

fn resolve_placement(
    anchor: Rect,
    popover: Size,
    area: Rect,
    primary: Placement,
    gap: f64,
) -> Placement {
    let needed = |p: Placement| {
        if p.is_vertical() {
            popover.height + gap
        } else {
            popover.width + gap
        }
    };
    let available = available_space(anchor, area, primary);
    if available >= needed(primary) {
        return primary;
    }
    let flipped = primary.flip();
    let flipped_available = available_space(anchor, area, flipped);
    if flipped_available >= needed(flipped) || flipped_available > available {
        flipped
    } else {
        primary
    }
}

fn available_space(anchor: Rect, area: Rect, placement: Placement) -> f64 {
    let space = match placement {
        Placement::Above => anchor.top() - area.top(),
        Placement::Below => area.bottom() - anchor.bottom(),
        Placement::Left => anchor.left() - area.left(),
        Placement::Right => area.right() - anchor.right(),
    };
    space.max(0.0)
}

fn candidate_rect(anchor: Rect, popover: Size, placement: Placement, gap: f64) -> Rect {
    let centre_x = anchor.x + anchor.width / 2.0 - popover.width / 2.0;
    let centre_y = anchor.y + anchor.height / 2.0 - popover.height / 2.0;
    let (x, y) = match placement {
        Placement::Above => (centre_x, anchor.top() - gap - popover.height),
        Placement::Below => (centre_x, anchor.bottom() + gap),
        Placement::Left => (anchor.left() - gap - popover.width, centre_y),
        Placement::Right => (anchor.right() + gap, centre_y),
    };
    Rect::new(x, y, popover.width, popover.height)
}
