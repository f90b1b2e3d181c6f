//! Near-Earth objects and their close approaches.
//!
//! Both records are built straight from the data files and know nothing
//! about each other until [`NeoDatabase`](crate::database::NeoDatabase)
//! links them. Links are stored as indices into the database's own
//! collections.

use chrono::NaiveDateTime;
use std::fmt;

use crate::time::datetime_to_str;

/// A near-Earth object (NEO).
#[derive(Debug, Clone, PartialEq)]
pub struct NearEarthObject {
    /// Primary designation, unique across the data set.
    pub designation: String,
    /// IAU name, if the object has one.
    pub name: Option<String>,
    /// Diameter in kilometers. `NaN` when unknown.
    pub diameter: f64,
    /// Whether the object is flagged as potentially hazardous.
    pub hazardous: bool,
    pub(crate) approaches: Vec<usize>,
}

impl NearEarthObject {
    /// Builds an unlinked NEO. A blank or whitespace-only name becomes `None`.
    pub fn new(
        designation: impl Into<String>,
        name: Option<String>,
        diameter: f64,
        hazardous: bool,
    ) -> Self {
        let name = name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());

        NearEarthObject {
            designation: designation.into(),
            name,
            diameter,
            hazardous,
            approaches: Vec::new(),
        }
    }

    /// `"433 (Eros)"` for named objects, the bare designation otherwise.
    pub fn fullname(&self) -> String {
        match &self.name {
            Some(name) => format!("{} ({})", self.designation, name),
            None => self.designation.clone(),
        }
    }

    /// The diameter, or `None` when it is unknown.
    pub fn known_diameter(&self) -> Option<f64> {
        if self.diameter.is_nan() {
            None
        } else {
            Some(self.diameter)
        }
    }
}

impl fmt::Display for NearEarthObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NEO {} has ", self.fullname())?;
        match self.known_diameter() {
            Some(d) => write!(f, "a diameter of {:.3} km", d)?,
            None => write!(f, "an unknown diameter")?,
        }
        let hazard = if self.hazardous { "is" } else { "is not" };
        write!(f, " and {} potentially hazardous.", hazard)
    }
}

/// A single close approach to Earth by an NEO.
#[derive(Debug, Clone, PartialEq)]
pub struct CloseApproach {
    /// Designation of the approaching NEO. Used to link the two records.
    pub designation: String,
    /// Time of closest approach, UTC, minute resolution.
    pub time: NaiveDateTime,
    /// Nominal approach distance in astronomical units.
    pub distance: f64,
    /// Velocity relative to Earth in km/s.
    pub velocity: f64,
    pub(crate) neo: Option<usize>,
}

impl CloseApproach {
    pub fn new(
        designation: impl Into<String>,
        time: NaiveDateTime,
        distance: f64,
        velocity: f64,
    ) -> Self {
        CloseApproach {
            designation: designation.into(),
            time,
            distance,
            velocity,
            neo: None,
        }
    }

    /// Approach time formatted as `YYYY-MM-DD HH:MM`.
    pub fn time_str(&self) -> String {
        datetime_to_str(&self.time)
    }

    pub fn is_linked(&self) -> bool {
        self.neo.is_some()
    }
}
