use std::collections::HashMap;

use featseq_types::{OrientedEntity, Point2, ProfileEntity};
use tracing::{debug, instrument};

use crate::types::{ProfileError, ProfileLoop};

/// Endpoint matching tolerance in model units.
pub const DEFAULT_TOLERANCE: f64 = 1e-6;

/// Which end of an entity an index entry refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum End {
    Start,
    End,
}

/// Entity endpoints bucketed on a grid of cell size `tolerance`.
struct EndpointIndex {
    tolerance: f64,
    cells: HashMap<(i64, i64), Vec<(usize, End, Point2)>>,
}

impl EndpointIndex {
    fn new(tolerance: f64) -> Self {
        Self {
            tolerance,
            cells: HashMap::new(),
        }
    }

    fn cell(&self, p: Point2) -> (i64, i64) {
        (
            (p.x / self.tolerance).floor() as i64,
            (p.y / self.tolerance).floor() as i64,
        )
    }

    fn insert(&mut self, entity: usize, end: End, p: Point2) {
        let key = self.cell(p);
        self.cells.entry(key).or_default().push((entity, end, p));
    }

    /// All entity ends within `tolerance` of `p`. Points within tolerance are
    /// at most one cell apart, so the 3x3 neighbourhood is enough.
    fn near(&self, p: Point2) -> Vec<(usize, End)> {
        let (cx, cy) = self.cell(p);
        let mut out = Vec::new();
        for dx in -1..=1 {
            for dy in -1..=1 {
                if let Some(bucket) = self.cells.get(&(cx + dx, cy + dy)) {
                    out.extend(
                        bucket
                            .iter()
                            .filter(|(_, _, q)| q.distance_to(&p) <= self.tolerance)
                            .map(|(i, end, _)| (*i, *end)),
                    );
                }
            }
        }
        out
    }
}

/// Build closed loops with the default tolerance.
pub fn build_profile(entities: &[ProfileEntity]) -> Result<Vec<ProfileLoop>, ProfileError> {
    build_loops(entities, DEFAULT_TOLERANCE)
}

/// Turn an unordered list of profile entities into closed, counter-clockwise
/// loops.
///
/// Circles, full arcs and closed splines are loops on their own. Everything
/// else is chained end-to-end starting from the lowest unvisited index. When
/// several unvisited entities touch the current end point, an entity of the
/// same kind as the one just traversed wins, then the lowest declaration
/// index. A chain that cannot be continued is an `OpenProfile` error and an
/// entity of a curve type the model does not know is `UnsupportedEntity`.
///
/// Loops come back sorted by their lowest entity index. A non-positive
/// `tolerance` falls back to [`DEFAULT_TOLERANCE`].
#[instrument(level = "debug", skip(entities), fields(count = entities.len()))]
pub fn build_loops(
    entities: &[ProfileEntity],
    tolerance: f64,
) -> Result<Vec<ProfileLoop>, ProfileError> {
    let tolerance = if tolerance.is_finite() && tolerance > 0.0 {
        tolerance
    } else {
        DEFAULT_TOLERANCE
    };

    let mut loops = Vec::new();
    let mut open = Vec::new();
    let mut index = EndpointIndex::new(tolerance);

    for (i, entity) in entities.iter().enumerate() {
        check_entity(i, entity, tolerance)?;
        if entity.is_closed(tolerance) {
            loops.push(ProfileLoop::new(vec![OrientedEntity::new(
                i,
                entity.clone(),
                false,
            )]));
            continue;
        }
        let (a, b) = endpoints_of(i, entity)?;
        index.insert(i, End::Start, a);
        index.insert(i, End::End, b);
        open.push(i);
    }

    let mut visited = vec![false; entities.len()];
    for start in open {
        if !visited[start] {
            loops.push(walk(entities, &index, &mut visited, start, tolerance)?);
        }
    }

    for l in &mut loops {
        l.normalize_winding();
        debug!(indices = ?l.indices(), "closed profile loop");
    }
    loops.sort_by_key(|l| l.lowest_index());
    Ok(loops)
}

/// Follow connected entities from `start` until the walk returns to the
/// start point of `start`.
fn walk(
    entities: &[ProfileEntity],
    index: &EndpointIndex,
    visited: &mut [bool],
    start: usize,
    tolerance: f64,
) -> Result<ProfileLoop, ProfileError> {
    let (origin, mut tip) = endpoints_of(start, &entities[start])?;
    visited[start] = true;
    let mut current = start;
    let mut chain = vec![OrientedEntity::new(start, entities[start].clone(), false)];

    while tip.distance_to(&origin) > tolerance {
        let kind = entities[current].kind();
        let next = index
            .near(tip)
            .into_iter()
            .filter(|(i, _)| !visited[*i])
            .min_by_key(|(i, end)| (entities[*i].kind() != kind, *i, *end));

        let (i, end) = next.ok_or(ProfileError::OpenProfile {
            entity: current,
            x: tip.x,
            y: tip.y,
        })?;

        let oriented = OrientedEntity::new(i, entities[i].clone(), end == End::End);
        let (_, far) = oriented.endpoints().ok_or(ProfileError::DegenerateEntity {
            entity: i,
            reason: "entity has no end points".to_string(),
        })?;
        visited[i] = true;
        current = i;
        tip = far;
        chain.push(oriented);
    }

    Ok(ProfileLoop::new(chain))
}

fn endpoints_of(i: usize, entity: &ProfileEntity) -> Result<(Point2, Point2), ProfileError> {
    entity.endpoints().ok_or(ProfileError::DegenerateEntity {
        entity: i,
        reason: "entity has no end points".to_string(),
    })
}

fn check_entity(i: usize, entity: &ProfileEntity, tolerance: f64) -> Result<(), ProfileError> {
    if let ProfileEntity::Unsupported = entity {
        return Err(ProfileError::UnsupportedEntity { entity: i });
    }
    entity
        .check()
        .map_err(|reason| ProfileError::DegenerateEntity { entity: i, reason })?;
    if let ProfileEntity::Line { start, end } = entity {
        if start.distance_to(end) <= tolerance {
            return Err(ProfileError::DegenerateEntity {
                entity: i,
                reason: "line has zero length".to_string(),
            });
        }
    }
    Ok(())
}
