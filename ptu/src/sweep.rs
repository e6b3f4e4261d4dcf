use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
    ProtocolError,
    command::{encode_absolute, encode_pan, encode_tilt},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Corner {
    /// Visiting order of a full rotation. Downstream motion depends on it.
    pub const ORDER: [Corner; 4] = [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomLeft,
        Corner::BottomRight,
    ];

    /// `(tilt, pan)` of this corner for the given bound.
    pub fn position(&self, abs_max: i32) -> (i32, i32) {
        match self {
            Corner::TopLeft => (abs_max, abs_max),
            Corner::TopRight => (abs_max, -abs_max),
            Corner::BottomLeft => (-abs_max, abs_max),
            Corner::BottomRight => (-abs_max, -abs_max),
        }
    }

    pub fn command(&self, abs_max: i32) -> String {
        let (tilt, pan) = self.position(abs_max);
        encode_absolute(tilt, pan)
    }
}

/// Single-axis extremes, moved one axis at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Top,
    Bottom,
    Left,
    Right,
}

impl Edge {
    pub const ORDER: [Edge; 4] = [Edge::Top, Edge::Bottom, Edge::Left, Edge::Right];

    pub fn command(&self, abs_max: i32) -> String {
        match self {
            Edge::Top => encode_tilt(abs_max),
            Edge::Bottom => encode_tilt(-abs_max),
            Edge::Left => encode_pan(-abs_max),
            Edge::Right => encode_pan(abs_max),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SweepPattern {
    #[default]
    Corners,
    Edges,
}

impl SweepPattern {
    /// Ordered commands making up one sweep.
    pub fn commands(&self, abs_max: i32) -> Vec<String> {
        match self {
            SweepPattern::Corners => Corner::ORDER
                .iter()
                .map(|corner| corner.command(abs_max))
                .collect(),
            SweepPattern::Edges => Edge::ORDER
                .iter()
                .map(|edge| edge.command(abs_max))
                .collect(),
        }
    }
}

impl fmt::Display for SweepPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SweepPattern::Corners => f.write_str("corners"),
            SweepPattern::Edges => f.write_str("edges"),
        }
    }
}

impl FromStr for SweepPattern {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "corners" => Ok(SweepPattern::Corners),
            "edges" => Ok(SweepPattern::Edges),
            _ => Err(ProtocolError::UnknownPattern(s.to_string())),
        }
    }
}
