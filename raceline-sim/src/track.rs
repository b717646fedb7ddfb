//! Track layout: boundary vertex cycles plus the shared start pose.
use serde::{Deserialize, Serialize};

use crate::error::TrackError;
use crate::geometry::{Point, WallStore};

const DEFAULT_CIRCUIT_DATA: &str = include_str!("../assets/circuit.json");

/// Pose every vehicle of a generation starts from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StartPose {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub heading: f64,
}

impl StartPose {
    #[must_use]
    pub const fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Raw, unvalidated track description as supplied at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackLayout {
    pub inner: Vec<[f64; 2]>,
    pub outer: Vec<[f64; 2]>,
    pub start: StartPose,
}

impl TrackLayout {
    /// Parse a layout document held in memory.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into a layout.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// The circuit compiled into the crate.
    ///
    /// # Errors
    ///
    /// Returns an error if the embedded asset is malformed.
    pub fn load_from_static() -> Result<Self, serde_json::Error> {
        Self::from_json(DEFAULT_CIRCUIT_DATA)
    }

    /// Validate the layout and freeze it into walls and a start pose.
    ///
    /// # Errors
    ///
    /// Returns an error if a boundary cannot form a closed cycle or the start
    /// pose is not finite.
    pub fn build(&self) -> Result<Track, TrackError> {
        let StartPose { x, y, heading } = self.start;
        if !(x.is_finite() && y.is_finite() && heading.is_finite()) {
            return Err(TrackError::NonFiniteStart { x, y, heading });
        }
        let inner: Vec<Point> = self.inner.iter().copied().map(Point::from).collect();
        let outer: Vec<Point> = self.outer.iter().copied().map(Point::from).collect();
        let walls = WallStore::from_cycles(&inner, &outer)?;
        Ok(Track::new(walls, self.start))
    }
}

/// Immutable track shared read-only by every vehicle for the process lifetime.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    walls: WallStore,
    start: StartPose,
}

impl Track {
    #[must_use]
    pub const fn new(walls: WallStore, start: StartPose) -> Self {
        Self { walls, start }
    }

    #[must_use]
    pub const fn walls(&self) -> &WallStore {
        &self.walls
    }

    #[must_use]
    pub const fn start(&self) -> StartPose {
        self.start
    }
}
