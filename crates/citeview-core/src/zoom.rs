//! Zoom/scale state for one viewer

use crate::config::ViewerConfig;

/// A scale transition that actually happened
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleChange {
    pub from: f64,
    pub to: f64,
}

#[derive(Debug, Clone)]
pub struct ZoomController {
    scale: f64,
    min_scale: f64,
    max_scale: f64,
    step: f64,
}

impl ZoomController {
    pub fn new(config: &ViewerConfig) -> Self {
        Self {
            scale: config
                .initial_scale
                .clamp(config.min_scale, config.max_scale),
            min_scale: config.min_scale,
            max_scale: config.max_scale,
            step: config.scale_step,
        }
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Zoom label value, e.g. `125` for a scale of 1.25
    pub fn percent(&self) -> u32 {
        (self.scale * 100.0).round() as u32
    }

    pub fn can_zoom_in(&self) -> bool {
        self.scale < self.max_scale
    }

    pub fn can_zoom_out(&self) -> bool {
        self.scale > self.min_scale
    }

    pub fn zoom_in(&mut self) -> Option<ScaleChange> {
        self.set_scale(self.scale + self.step)
    }

    pub fn zoom_out(&mut self) -> Option<ScaleChange> {
        self.set_scale(self.scale - self.step)
    }

    /// Set the scale, clamped to the configured range.
    ///
    /// Returns `None` when the clamped scale equals the current one.
    pub fn set_scale(&mut self, scale: f64) -> Option<ScaleChange> {
        if !scale.is_finite() {
            return None;
        }

        let next = scale.clamp(self.min_scale, self.max_scale);
        if (next - self.scale).abs() < f64::EPSILON {
            return None;
        }

        let change = ScaleChange {
            from: self.scale,
            to: next,
        };
        self.scale = next;
        Some(change)
    }
}
