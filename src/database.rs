//! In-memory database of NEOs and their close approaches.
//!
//! [`NeoDatabase`] owns both collections, indexes NEOs by designation and by
//! name, and links every close approach to its NEO exactly once, when it is
//! built. After that nothing is added or removed.
//!
//! Callers never hold the records directly. Lookups and queries hand out
//! [`Neo`] and [`Approach`] views that borrow the database, dereference to
//! the underlying record, and can walk across the link in either direction.

use std::collections::HashMap;
use std::fmt;
use std::ops::Deref;
use std::str::FromStr;

use tracing::{debug, info, warn};

use crate::errors::LinkError;
use crate::filters::AttributeFilter;
use crate::models::{CloseApproach, NearEarthObject};

/// What to do with a close approach whose designation matches no NEO.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OrphanPolicy {
    /// Log the approach and leave it out of the linked set.
    #[default]
    Skip,
    /// Refuse to build the database.
    Error,
}

impl FromStr for OrphanPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "skip" => Ok(OrphanPolicy::Skip),
            "error" => Ok(OrphanPolicy::Error),
            other => Err(format!("unknown orphan policy '{other}', expected 'skip' or 'error'")),
        }
    }
}

pub struct NeoDatabase {
    neos: Vec<NearEarthObject>,
    approaches: Vec<CloseApproach>,
    by_designation: HashMap<String, usize>,
    by_name: HashMap<String, usize>,
}

impl NeoDatabase {
    /// Builds and links the database, dropping orphaned approaches.
    pub fn new(neos: Vec<NearEarthObject>, approaches: Vec<CloseApproach>) -> Self {
        let mut db = Self::index(neos);
        db.link(approaches, OrphanPolicy::Skip);
        db
    }

    /// Builds and links the database, handling orphans according to `policy`.
    ///
    /// # Errors
    ///
    /// Returns [`LinkError::Orphan`] for the first unmatched approach when
    /// `policy` is [`OrphanPolicy::Error`].
    pub fn with_policy(
        neos: Vec<NearEarthObject>,
        approaches: Vec<CloseApproach>,
        policy: OrphanPolicy,
    ) -> Result<Self, LinkError> {
        let mut db = Self::index(neos);
        match db.link(approaches, policy) {
            Some(designation) if policy == OrphanPolicy::Error => {
                Err(LinkError::Orphan { designation })
            }
            _ => Ok(db),
        }
    }

    fn index(neos: Vec<NearEarthObject>) -> Self {
        let mut kept = Vec::with_capacity(neos.len());
        let mut by_designation = HashMap::with_capacity(neos.len());
        let mut by_name = HashMap::new();

        for mut neo in neos {
            if by_designation.contains_key(&neo.designation) {
                warn!(designation = %neo.designation, "Duplicate designation, keeping first");
                continue;
            }

            let index = kept.len();
            by_designation.insert(neo.designation.clone(), index);
            if let Some(name) = &neo.name {
                by_name.entry(name.clone()).or_insert(index);
            }

            neo.approaches.clear();
            kept.push(neo);
        }

        debug!(
            neos = kept.len(),
            named = by_name.len(),
            "Indexed near-Earth objects"
        );

        NeoDatabase {
            neos: kept,
            approaches: Vec::new(),
            by_designation,
            by_name,
        }
    }

    /// Links every approach to its NEO. Returns the designation of the first
    /// orphan seen, if any.
    fn link(&mut self, approaches: Vec<CloseApproach>, policy: OrphanPolicy) -> Option<String> {
        let mut linked = Vec::with_capacity(approaches.len());
        let mut first_orphan = None;
        let mut orphans = 0usize;

        for mut approach in approaches {
            let Some(&neo_index) = self.by_designation.get(&approach.designation) else {
                orphans += 1;
                if policy == OrphanPolicy::Skip {
                    warn!(
                        designation = %approach.designation,
                        time = %approach.time_str(),
                        "Close approach has no matching NEO, skipping"
                    );
                }
                if first_orphan.is_none() {
                    first_orphan = Some(approach.designation);
                }
                continue;
            };

            approach.neo = Some(neo_index);
            self.neos[neo_index].approaches.push(linked.len());
            linked.push(approach);
        }

        self.approaches = linked;

        info!(
            neos = self.neos.len(),
            approaches = self.approaches.len(),
            orphans,
            "Linked close approaches"
        );

        first_orphan
    }

    /// Looks up an NEO by its exact primary designation.
    pub fn get_neo_by_designation(&self, designation: &str) -> Option<Neo<'_>> {
        if designation.is_empty() {
            return None;
        }
        self.by_designation
            .get(designation)
            .map(|&index| Neo { db: self, index })
    }

    /// Looks up an NEO by its exact name. No NEO is named `""`.
    pub fn get_neo_by_name(&self, name: &str) -> Option<Neo<'_>> {
        if name.is_empty() {
            return None;
        }
        self.by_name.get(name).map(|&index| Neo { db: self, index })
    }

    /// Lazily yields the approaches matching every filter, in storage order.
    ///
    /// An empty filter slice yields every linked approach.
    pub fn query<'a>(
        &'a self,
        filters: &'a [AttributeFilter],
    ) -> impl Iterator<Item = Approach<'a>> + 'a {
        self.approaches()
            .filter(move |approach| filters.iter().all(|f| f.matches(approach)))
    }

    /// Every linked approach, in storage order.
    pub fn approaches(&self) -> impl Iterator<Item = Approach<'_>> {
        self.approaches
            .iter()
            .enumerate()
            .filter_map(move |(index, ca)| ca.neo.map(|neo| Approach { db: self, index, neo }))
    }

    pub fn neos(&self) -> impl Iterator<Item = Neo<'_>> {
        (0..self.neos.len()).map(move |index| Neo { db: self, index })
    }

    pub fn neo_count(&self) -> usize {
        self.neos.len()
    }

    pub fn approach_count(&self) -> usize {
        self.approaches.len()
    }
}

/// A borrowed view of a linked [`NearEarthObject`].
#[derive(Clone, Copy)]
pub struct Neo<'a> {
    db: &'a NeoDatabase,
    index: usize,
}

impl<'a> Neo<'a> {
    pub fn record(self) -> &'a NearEarthObject {
        &self.db.neos[self.index]
    }

    /// This NEO's close approaches, in the order they were loaded.
    pub fn approaches(self) -> impl Iterator<Item = Approach<'a>> {
        let db = self.db;
        let neo = self.index;
        self.record()
            .approaches
            .iter()
            .map(move |&index| Approach { db, index, neo })
    }
}

impl Deref for Neo<'_> {
    type Target = NearEarthObject;

    fn deref(&self) -> &NearEarthObject {
        &self.db.neos[self.index]
    }
}

impl PartialEq for Neo<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.db, other.db) && self.index == other.index
    }
}

impl fmt::Debug for Neo<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.record(), f)
    }
}

impl fmt::Display for Neo<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.record(), f)
    }
}

/// A borrowed view of a linked [`CloseApproach`].
#[derive(Clone, Copy)]
pub struct Approach<'a> {
    db: &'a NeoDatabase,
    index: usize,
    neo: usize,
}

impl<'a> Approach<'a> {
    pub fn record(self) -> &'a CloseApproach {
        &self.db.approaches[self.index]
    }

    /// The NEO making this approach.
    pub fn neo(self) -> Neo<'a> {
        Neo {
            db: self.db,
            index: self.neo,
        }
    }
}

impl Deref for Approach<'_> {
    type Target = CloseApproach;

    fn deref(&self) -> &CloseApproach {
        &self.db.approaches[self.index]
    }
}

impl PartialEq for Approach<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.db, other.db) && self.index == other.index
    }
}

impl fmt::Debug for Approach<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Approach")
            .field("time", &self.time_str())
            .field("distance", &self.distance)
            .field("velocity", &self.velocity)
            .field("neo", &self.neo().designation)
            .finish()
    }
}

impl fmt::Display for Approach<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "At {}, '{}' approaches Earth at a distance of {:.2} au and a velocity of {:.2} km/s.",
            self.time_str(),
            self.neo().fullname(),
            self.distance,
            self.velocity
        )
    }
}
