//! Attribute filters over close approaches, and result limiting.
//!
//! [`create_filters`] turns a [`FilterOptions`] into a list of
//! [`AttributeFilter`]s; [`NeoDatabase::query`](crate::database::NeoDatabase::query)
//! keeps only the approaches that match all of them.

use chrono::NaiveDate;
use std::fmt;

use crate::database::Approach;

/// Binary comparison applied as `attribute OP value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Le,
    Ge,
}

impl Comparison {
    pub fn apply<T: PartialOrd>(self, lhs: &T, rhs: &T) -> bool {
        match self {
            Comparison::Eq => lhs == rhs,
            Comparison::Le => lhs <= rhs,
            Comparison::Ge => lhs >= rhs,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Comparison::Eq => "eq",
            Comparison::Le => "le",
            Comparison::Ge => "ge",
        }
    }
}

/// A single criterion on a close approach or its NEO.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeFilter {
    /// Calendar date of the approach (time of day ignored).
    Date(Comparison, NaiveDate),
    /// Approach distance in au.
    Distance(Comparison, f64),
    /// Relative velocity in km/s.
    Velocity(Comparison, f64),
    /// Diameter of the linked NEO in km. Unknown diameters never match.
    Diameter(Comparison, f64),
    /// Hazard flag of the linked NEO.
    Hazardous(bool),
}

impl AttributeFilter {
    pub fn matches(&self, approach: &Approach<'_>) -> bool {
        match self {
            AttributeFilter::Date(op, value) => op.apply(&approach.time.date(), value),
            AttributeFilter::Distance(op, value) => op.apply(&approach.distance, value),
            AttributeFilter::Velocity(op, value) => op.apply(&approach.velocity, value),
            AttributeFilter::Diameter(op, value) => op.apply(&approach.neo().diameter, value),
            AttributeFilter::Hazardous(value) => approach.neo().hazardous == *value,
        }
    }
}

impl fmt::Display for AttributeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeFilter::Date(op, v) => write!(f, "DateFilter(op={}, value={})", op.name(), v),
            AttributeFilter::Distance(op, v) => {
                write!(f, "DistanceFilter(op={}, value={})", op.name(), v)
            }
            AttributeFilter::Velocity(op, v) => {
                write!(f, "VelocityFilter(op={}, value={})", op.name(), v)
            }
            AttributeFilter::Diameter(op, v) => {
                write!(f, "DiameterFilter(op={}, value={})", op.name(), v)
            }
            AttributeFilter::Hazardous(v) => write!(f, "HazardousFilter(op=eq, value={})", v),
        }
    }
}

/// User-selected query criteria. Every `None` is ignored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterOptions {
    pub date: Option<NaiveDate>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub distance_min: Option<f64>,
    pub distance_max: Option<f64>,
    pub velocity_min: Option<f64>,
    pub velocity_max: Option<f64>,
    pub diameter_min: Option<f64>,
    pub diameter_max: Option<f64>,
    pub hazardous: Option<bool>,
}

/// Builds one filter per criterion present in `options`.
///
/// Minimums and start dates are inclusive lower bounds, maximums and end
/// dates inclusive upper bounds.
pub fn create_filters(options: &FilterOptions) -> Vec<AttributeFilter> {
    use AttributeFilter::*;
    use Comparison::*;

    let candidates = [
        options.date.map(|d| Date(Eq, d)),
        options.start_date.map(|d| Date(Ge, d)),
        options.end_date.map(|d| Date(Le, d)),
        options.distance_min.map(|v| Distance(Ge, v)),
        options.distance_max.map(|v| Distance(Le, v)),
        options.velocity_min.map(|v| Velocity(Ge, v)),
        options.velocity_max.map(|v| Velocity(Le, v)),
        options.diameter_min.map(|v| Diameter(Ge, v)),
        options.diameter_max.map(|v| Diameter(Le, v)),
        options.hazardous.map(Hazardous),
    ];

    candidates.into_iter().flatten().collect()
}

/// Caps an iterator at `n` items. `None` and `Some(0)` mean no limit.
pub fn limit<I: Iterator>(iter: I, n: Option<usize>) -> std::iter::Take<I> {
    let n = match n {
        None | Some(0) => usize::MAX,
        Some(n) => n,
    };
    iter.take(n)
}
