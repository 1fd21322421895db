//! Trigger offset parsing and normalization
//!
//! A trigger offset positions the horizontal line at which a step counts as
//! active: either a fraction of the viewport height or an absolute pixel
//! distance from the viewport top. Parsing is pure and total - malformed
//! input degrades to a documented fallback with a logged warning, it never
//! panics.

use tracing::warn;

/// How a trigger offset value is interpreted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OffsetFormat {
    /// Absolute distance from the viewport top, in pixels.
    Pixels,
    /// Fraction of the viewport height, `0.0..=1.0`.
    Percent,
}

/// A normalized trigger offset.
///
/// Immutable once produced; one optional per-step override plus one global
/// default exist per session.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TriggerOffset {
    pub format: OffsetFormat,
    pub value: f64,
}

impl TriggerOffset {
    /// Viewport-fraction offset, clamped to `0.0..=1.0`.
    pub fn percent(value: f64) -> Self {
        Self {
            format: OffsetFormat::Percent,
            value: value.clamp(0.0, 1.0),
        }
    }

    /// Absolute pixel offset.
    pub fn pixels(value: f64) -> Self {
        Self {
            format: OffsetFormat::Pixels,
            value,
        }
    }

    /// Resolve to pixels against the current viewport height.
    pub fn to_pixels(&self, viewport_height: f64) -> f64 {
        match self.format {
            OffsetFormat::Pixels => self.value,
            OffsetFormat::Percent => self.value * viewport_height,
        }
    }
}

/// Raw offset input as supplied by the caller or a per-step attribute.
#[derive(Clone, Debug, PartialEq)]
pub enum OffsetInput {
    Number(f64),
    Text(String),
}

impl From<f64> for OffsetInput {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for OffsetInput {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for OffsetInput {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Parse a raw offset into its normalized form.
///
/// A string with a `px` suffix past its first character parses its numeric
/// prefix as an absolute pixel offset; an unparsable prefix falls back to
/// `0.5` of the viewport with a warning. Bare numbers and numeric strings
/// are viewport fractions, clamped to `0.0..=1.0` with a warning when out of
/// range. Anything else returns `None` and the caller substitutes its
/// documented default.
pub fn parse_offset(input: &OffsetInput) -> Option<TriggerOffset> {
    match input {
        OffsetInput::Text(text) if text.find("px").map_or(false, |at| at > 0) => {
            match text.replacen("px", "", 1).trim().parse::<f64>() {
                Ok(value) => Some(TriggerOffset::pixels(value)),
                Err(_) => {
                    warn!(raw = %text, "offset value must be in 'px' format, falling back to 0.5");
                    Some(TriggerOffset::percent(0.5))
                }
            }
        }
        OffsetInput::Number(value) => fraction(*value),
        OffsetInput::Text(text) => text.trim().parse::<f64>().ok().and_then(fraction),
    }
}

fn fraction(value: f64) -> Option<TriggerOffset> {
    if value.is_nan() {
        return None;
    }
    if value > 1.0 {
        warn!(value, "offset value is greater than 1, clamping to 1");
    }
    if value < 0.0 {
        warn!(value, "offset value is lower than 0, clamping to 0");
    }
    Some(TriggerOffset::percent(value))
}
