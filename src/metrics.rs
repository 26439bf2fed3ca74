//! Vertical metrics normalization.
//!
//! Fonts carry three overlapping sets of vertical metrics: the typographic
//! values in `OS/2` (used by Adobe-style layout and by browsers when
//! `USE_TYPO_METRICS` is set), the `hhea` values (used by macOS) and the
//! `usWin*` values in `OS/2` (used by Windows GDI for line height and
//! clipping). Given a line-spacing factor, [`VerticalMetricsInput::normalize`]
//! produces a set of values which renders the same line height everywhere.
//!
//! Which fields are adjusted depends on the convention the font was built
//! with; see [`LineSpacingPolicy`].

use crate::error::{Result, VMetricsError};
use log::debug;
use serde::Serialize;
use std::convert::TryFrom;
use std::fmt;
use std::str::FromStr;

/// The line-spacing factor used when none is given: 10% of the em.
pub const DEFAULT_LINE_SPACING_FACTOR: u32 = 10;

/// Extra line spacing, as a percentage of the em, added to the em box to
/// make up the full line height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct LineSpacingFactor(u32);

impl LineSpacingFactor {
    /// A factor of `percent` percent. Fails unless `percent >= 1`.
    pub fn new(percent: i64) -> Result<Self> {
        if percent < 1 {
            return Err(VMetricsError::InvalidArgument {
                reason: format!(
                    "line spacing factor must be an integer greater or equal 1, not {}",
                    percent
                ),
            });
        }
        u32::try_from(percent)
            .map(LineSpacingFactor)
            .map_err(|_| VMetricsError::InvalidArgument {
                reason: format!("line spacing factor {} is too large", percent),
            })
    }

    pub fn percent(&self) -> u32 {
        self.0
    }
}

impl Default for LineSpacingFactor {
    fn default() -> Self {
        LineSpacingFactor(DEFAULT_LINE_SPACING_FACTOR)
    }
}

impl FromStr for LineSpacingFactor {
    type Err = VMetricsError;

    fn from_str(s: &str) -> Result<Self> {
        let percent: i64 = s
            .trim()
            .parse()
            .map_err(|_| VMetricsError::InvalidArgument {
                reason: format!("line spacing factor must be an integer, not {:?}", s),
            })?;
        LineSpacingFactor::new(percent)
    }
}

impl fmt::Display for LineSpacingFactor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// Round `numerator / denominator` to the nearest integer, with halves
/// going towards positive infinity (0.5 → 1, -0.5 → 0, -1.5 → -1).
///
/// `denominator` must be positive.
pub fn round_half_up(numerator: i64, denominator: i64) -> i64 {
    debug_assert!(denominator > 0);
    (2 * numerator + denominator).div_euclid(2 * denominator)
}

/// The raw values a normalization starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerticalMetricsInput {
    pub typo_ascender: i32,
    pub typo_descender: i32,
    pub typo_line_gap: i32,
    pub hhea_ascender: i32,
    pub hhea_descender: i32,
    pub units_per_em: u32,
    pub line_spacing_factor: LineSpacingFactor,
}

/// The normalized values, ready to be written back to `OS/2` and `hhea`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerticalMetricsOutput {
    pub typo_ascender: i32,
    pub typo_descender: i32,
    pub typo_line_gap: i32,
    pub win_ascent: u32,
    pub win_descent: u32,
    pub hhea_ascender: i32,
    pub hhea_descender: i32,
    pub hhea_line_gap: i32,
}

/// The three conventions fonts are found in, and the correction each gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LineSpacingPolicy {
    /// No typo line gap, and typo ascender + |descender| already spans more
    /// than the em (the Google Fonts convention). The spacing budget is
    /// split symmetrically into both the typo and hhea ascender/descender.
    WideTypo,
    /// No typo line gap, and typo ascender + |descender| is exactly the em
    /// (the Adobe convention). Only hhea is rebalanced; the typo values are
    /// the author's and stay as they are.
    ExactFit,
    /// Anything else. The typo line gap carries the whole spacing budget
    /// and hhea is recomputed around it.
    Fallback,
}

impl fmt::Display for LineSpacingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            LineSpacingPolicy::WideTypo => "wide-typo",
            LineSpacingPolicy::ExactFit => "exact-fit",
            LineSpacingPolicy::Fallback => "fallback",
        })
    }
}

impl LineSpacingPolicy {
    /// Pick the policy for a set of raw values.
    pub fn select(input: &VerticalMetricsInput) -> Self {
        let typo_span = input.typo_span();
        let upm = i64::from(input.units_per_em);
        if input.typo_line_gap != 0 {
            LineSpacingPolicy::Fallback
        } else if typo_span > upm {
            LineSpacingPolicy::WideTypo
        } else if typo_span == upm {
            LineSpacingPolicy::ExactFit
        } else {
            LineSpacingPolicy::Fallback
        }
    }
}

/// Quantities derived from the input which every policy draws on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Budget {
    line_spacing_units: i64,
    total_height: i64,
    upper_lower_add_units: i64,
}

impl VerticalMetricsInput {
    /// `typoAscender + |typoDescender|`
    fn typo_span(&self) -> i64 {
        i64::from(self.typo_ascender) + i64::from(self.typo_descender).abs()
    }

    /// `hheaAscender + |hheaDescender|`
    fn hhea_span(&self) -> i64 {
        i64::from(self.hhea_ascender) + i64::from(self.hhea_descender).abs()
    }

    fn budget(&self) -> Budget {
        let upm = i64::from(self.units_per_em);
        let line_spacing_units =
            round_half_up(i64::from(self.line_spacing_factor.percent()) * upm, 100);
        let total_height = line_spacing_units + upm;
        let delta_height = total_height - self.hhea_span();
        Budget {
            line_spacing_units,
            total_height,
            upper_lower_add_units: round_half_up(delta_height, 2),
        }
    }

    /// The policy [`normalize`](Self::normalize) will apply.
    pub fn policy(&self) -> LineSpacingPolicy {
        LineSpacingPolicy::select(self)
    }

    /// Compute normalized metrics. Pure and deterministic.
    pub fn normalize(&self) -> VerticalMetricsOutput {
        let budget = self.budget();
        let policy = self.policy();
        debug!(
            "line spacing {} units, total height {}, {} units per side, policy {}",
            budget.line_spacing_units, budget.total_height, budget.upper_lower_add_units, policy
        );

        let mut typo_ascender = i64::from(self.typo_ascender);
        let mut typo_descender = i64::from(self.typo_descender);
        let mut typo_line_gap = i64::from(self.typo_line_gap);
        let mut hhea_ascender = i64::from(self.hhea_ascender);
        let mut hhea_descender = i64::from(self.hhea_descender);
        let add = budget.upper_lower_add_units;

        match policy {
            LineSpacingPolicy::WideTypo => {
                typo_ascender += add;
                typo_descender -= add;
                hhea_ascender += add;
                hhea_descender -= add;
            }
            LineSpacingPolicy::ExactFit => {
                hhea_ascender += add;
                hhea_descender -= add;
            }
            LineSpacingPolicy::Fallback => {
                typo_line_gap = budget.line_spacing_units;
                hhea_ascender = round_half_up(2 * typo_ascender + typo_line_gap, 2);
                hhea_descender = -(budget.total_height - hhea_ascender);
            }
        }

        VerticalMetricsOutput {
            typo_ascender: clamp_i32(typo_ascender),
            typo_descender: clamp_i32(typo_descender),
            typo_line_gap: clamp_i32(typo_line_gap),
            win_ascent: clamp_u32(hhea_ascender),
            win_descent: clamp_u32(-hhea_descender),
            hhea_ascender: clamp_i32(hhea_ascender),
            hhea_descender: clamp_i32(hhea_descender),
            hhea_line_gap: 0,
        }
    }
}

// Inputs are i32 and the budget is at most a few times the em, so these
// only bite on nonsensical fonts.
fn clamp_i32(v: i64) -> i32 {
    v.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

fn clamp_u32(v: i64) -> u32 {
    v.clamp(0, i64::from(u32::MAX)) as u32
}

/// What a normalization did, for logging and reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Report {
    pub policy: LineSpacingPolicy,
    pub before: VerticalMetricsInput,
    pub after: VerticalMetricsOutput,
}

impl Report {
    pub fn new(input: VerticalMetricsInput) -> Self {
        Report {
            policy: input.policy(),
            before: input,
            after: input.normalize(),
        }
    }
}
