/*! Geometry types for viewport coordinates. */

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Element bounds in viewport coordinates (the shape of a bounding client rect).
///
/// `x`/`y` is the top-left corner relative to the viewport origin, so elements
/// scrolled above or left of the viewport have negative coordinates.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, TS)]
#[ts(export)]
pub struct Bounds {
  pub x: f64,
  pub y: f64,
  pub w: f64,
  pub h: f64,
}

impl Bounds {
  pub const fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
    Self { x, y, w, h }
  }

  /// Build bounds from the four edges of a client rect.
  pub fn from_edges(top: f64, left: f64, bottom: f64, right: f64) -> Self {
    Self {
      x: left,
      y: top,
      w: right - left,
      h: bottom - top,
    }
  }

  pub const fn top(&self) -> f64 {
    self.y
  }

  pub const fn left(&self) -> f64 {
    self.x
  }

  pub fn bottom(&self) -> f64 {
    self.y + self.h
  }

  pub fn right(&self) -> f64 {
    self.x + self.w
  }

  /// Check whether these bounds count as "in viewport" under `visibility`.
  ///
  /// `AnyPart` uses strict comparisons on every edge: an element whose edge
  /// exactly touches the viewport edge is outside.
  pub fn is_in_viewport(&self, viewport: Size, visibility: Visibility) -> bool {
    match visibility {
      Visibility::Complete => {
        self.top() >= 0.0
          && self.left() >= 0.0
          && self.bottom() <= viewport.h
          && self.right() <= viewport.w
      }
      // Keep the `far - (near_edge - extent)` form; it is not always
      // bit-identical to `top < height` in floating point.
      Visibility::AnyPart => {
        viewport.h - (self.bottom() - self.h) > 0.0
          && self.bottom() > 0.0
          && viewport.w - (self.right() - self.w) > 0.0
          && self.right() > 0.0
      }
    }
  }
}

/// Viewport dimensions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, TS)]
#[ts(export)]
pub struct Size {
  pub w: f64,
  pub h: f64,
}

impl Size {
  pub const fn new(w: f64, h: f64) -> Self {
    Self { w, h }
  }
}

/// How much of an element must be inside the viewport to count as visible.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum Visibility {
  /// Any part of the element overlaps the viewport.
  #[default]
  AnyPart,
  /// All four edges lie within the viewport.
  Complete,
}

impl Visibility {
  pub const fn from_completely_visible(completely_visible: bool) -> Self {
    if completely_visible {
      Self::Complete
    } else {
      Self::AnyPart
    }
  }
}
