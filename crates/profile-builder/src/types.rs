use featseq_types::OrientedEntity;
use serde::{Deserialize, Serialize};

use crate::winding;

/// One closed loop of profile entities in traversal order.
///
/// The end of each entity coincides (within tolerance) with the start of
/// the next, and the last entity ends where the first one starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileLoop {
    pub entities: Vec<OrientedEntity>,
}

impl ProfileLoop {
    pub fn new(entities: Vec<OrientedEntity>) -> Self {
        Self { entities }
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Declaration indices of the entities, in traversal order.
    pub fn indices(&self) -> Vec<usize> {
        self.entities.iter().map(|e| e.index).collect()
    }

    /// Lowest declaration index in the loop. Loops are ordered by this.
    pub fn lowest_index(&self) -> usize {
        self.entities.iter().map(|e| e.index).min().unwrap_or(usize::MAX)
    }

    /// Signed area enclosed by the loop. Positive means counter-clockwise.
    pub fn signed_area(&self) -> f64 {
        let points: Vec<_> = self
            .entities
            .iter()
            .flat_map(|e| winding::sample_points(&e.oriented()))
            .collect();
        winding::signed_area(&points)
    }

    pub fn is_counter_clockwise(&self) -> bool {
        self.signed_area() > 0.0
    }

    /// Make the loop counter-clockwise. A clockwise loop is traversed the
    /// other way round with its first entity kept first.
    pub fn normalize_winding(&mut self) {
        if self.signed_area() >= 0.0 {
            return;
        }
        if let Some((first, rest)) = self.entities.split_first_mut() {
            first.reversed = !first.reversed;
            rest.reverse();
            for e in rest {
                e.reversed = !e.reversed;
            }
        }
    }
}

/// Why a list of profile entities could not be turned into closed loops.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProfileError {
    #[error("profile is open: no entity continues entity {entity} at ({x}, {y})")]
    OpenProfile { entity: usize, x: f64, y: f64 },

    #[error("profile entity {entity} is degenerate: {reason}")]
    DegenerateEntity { entity: usize, reason: String },

    #[error("profile entity {entity} has a curve type that cannot be rebuilt")]
    UnsupportedEntity { entity: usize },
}
