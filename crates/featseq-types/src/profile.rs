use std::f64::consts::{FRAC_PI_2, TAU};

use serde::{Deserialize, Serialize};

use crate::geometry::{Bounds, Point2};
use crate::vector::PROFILE_SLOTS;

/// One curve of a 2D profile.
///
/// Angles are radians. A negative `sweep_angle` runs clockwise. Curve types
/// this model does not know (ellipses, offset curves, ...) parse as
/// `Unsupported` so the rest of the file still loads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ProfileEntity {
    Line {
        start: Point2,
        end: Point2,
    },
    Circle {
        center: Point2,
        radius: f64,
    },
    #[serde(rename_all = "camelCase")]
    Arc {
        center: Point2,
        radius: f64,
        start_angle: f64,
        sweep_angle: f64,
    },
    #[serde(rename_all = "camelCase")]
    Spline {
        control_points: Vec<Point2>,
        degree: usize,
    },
    #[serde(other)]
    Unsupported,
}

/// Geometric kind of a profile entity, without its data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Line,
    Circle,
    Arc,
    Spline,
    Unsupported,
}

impl ProfileEntity {
    pub fn kind(&self) -> EntityKind {
        match self {
            ProfileEntity::Line { .. } => EntityKind::Line,
            ProfileEntity::Circle { .. } => EntityKind::Circle,
            ProfileEntity::Arc { .. } => EntityKind::Arc,
            ProfileEntity::Spline { .. } => EntityKind::Spline,
            ProfileEntity::Unsupported => EntityKind::Unsupported,
        }
    }

    /// Start and end point in declaration direction. `None` for circles
    /// and unsupported curves.
    pub fn endpoints(&self) -> Option<(Point2, Point2)> {
        match self {
            ProfileEntity::Line { start, end } => Some((*start, *end)),
            ProfileEntity::Circle { .. } | ProfileEntity::Unsupported => None,
            ProfileEntity::Arc {
                center,
                radius,
                start_angle,
                sweep_angle,
            } => Some((
                Point2::polar(*center, *radius, *start_angle),
                Point2::polar(*center, *radius, start_angle + sweep_angle),
            )),
            ProfileEntity::Spline { control_points, .. } => {
                let first = control_points.first()?;
                let last = control_points.last()?;
                Some((*first, *last))
            }
        }
    }

    /// Whether the entity is a loop on its own.
    pub fn is_closed(&self, tolerance: f64) -> bool {
        match self {
            ProfileEntity::Circle { .. } => true,
            ProfileEntity::Arc { sweep_angle, .. } if sweep_angle.abs() >= TAU => true,
            _ => match self.endpoints() {
                Some((a, b)) => a.distance_to(&b) <= tolerance,
                None => false,
            },
        }
    }

    /// Check the entity's own invariants (positive radius, non-zero sweep, ...).
    pub fn check(&self) -> Result<(), String> {
        match self {
            ProfileEntity::Line { start, end } => {
                if !start.is_finite() || !end.is_finite() {
                    return Err("line has non-finite coordinates".to_string());
                }
            }
            ProfileEntity::Circle { center, radius } => {
                if !center.is_finite() {
                    return Err("circle centre is not finite".to_string());
                }
                if !(radius.is_finite() && *radius > 0.0) {
                    return Err(format!("circle radius must be > 0, got {}", radius));
                }
            }
            ProfileEntity::Arc {
                center,
                radius,
                start_angle,
                sweep_angle,
            } => {
                if !center.is_finite() || !start_angle.is_finite() {
                    return Err("arc has non-finite geometry".to_string());
                }
                if !(radius.is_finite() && *radius > 0.0) {
                    return Err(format!("arc radius must be > 0, got {}", radius));
                }
                if !sweep_angle.is_finite() || *sweep_angle == 0.0 {
                    return Err("arc sweep angle must be non-zero".to_string());
                }
            }
            ProfileEntity::Spline {
                control_points,
                degree,
            } => {
                if *degree < 1 {
                    return Err("spline degree must be >= 1".to_string());
                }
                if control_points.len() < degree + 1 {
                    return Err(format!(
                        "spline of degree {} needs at least {} control points, got {}",
                        degree,
                        degree + 1,
                        control_points.len()
                    ));
                }
                if control_points.iter().any(|p| !p.is_finite()) {
                    return Err("spline has non-finite control points".to_string());
                }
            }
            ProfileEntity::Unsupported => {}
        }
        Ok(())
    }

    /// Axis-aligned bounds. Splines use the hull of their control points.
    /// `None` for unsupported curves and splines without control points.
    pub fn bounds(&self) -> Option<Bounds> {
        match self {
            ProfileEntity::Line { start, end } => {
                let mut b = Bounds::of_point(*start);
                b.include(*end);
                Some(b)
            }
            ProfileEntity::Circle { center, radius } => Some(Bounds {
                min: Point2::new(center.x - radius, center.y - radius),
                max: Point2::new(center.x + radius, center.y + radius),
            }),
            ProfileEntity::Arc {
                center,
                radius,
                start_angle,
                sweep_angle,
            } => {
                let mut b = Bounds::of_point(Point2::polar(*center, *radius, *start_angle));
                b.include(Point2::polar(*center, *radius, start_angle + sweep_angle));
                // Axis extremes the arc passes through.
                for quadrant in 0..4 {
                    let theta = quadrant as f64 * FRAC_PI_2;
                    if angle_within(theta, *start_angle, *sweep_angle) {
                        b.include(Point2::polar(*center, *radius, theta));
                    }
                }
                Some(b)
            }
            ProfileEntity::Spline { control_points, .. } => {
                let (first, rest) = control_points.split_first()?;
                let mut b = Bounds::of_point(*first);
                for p in rest {
                    b.include(*p);
                }
                Some(b)
            }
            ProfileEntity::Unsupported => None,
        }
    }
}

/// Whether `theta` lies on the arc that starts at `start` and sweeps `sweep`.
pub fn angle_within(theta: f64, start: f64, sweep: f64) -> bool {
    if sweep.abs() >= TAU {
        return true;
    }
    if sweep > 0.0 {
        (theta - start).rem_euclid(TAU) <= sweep
    } else {
        (start - theta).rem_euclid(TAU) <= -sweep
    }
}

/// Fixed-size numeric summary of a profile, as stored in the profile slots
/// of an instruction vector.
///
/// Counts are kept as `f64` so a summary read back from a vector re-encodes
/// to the same numbers.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSummary {
    pub lines: f64,
    pub arcs: f64,
    pub circles: f64,
    pub splines: f64,
    pub center_x: f64,
    pub center_y: f64,
    pub width: f64,
    pub height: f64,
}

impl ProfileSummary {
    /// Summarize a list of entities. An empty list gives the zero summary.
    /// Unsupported curves are neither counted nor measured.
    pub fn of(entities: &[ProfileEntity]) -> Self {
        let mut summary = ProfileSummary::default();
        let mut bounds: Option<Bounds> = None;
        for entity in entities {
            match entity.kind() {
                EntityKind::Line => summary.lines += 1.0,
                EntityKind::Arc => summary.arcs += 1.0,
                EntityKind::Circle => summary.circles += 1.0,
                EntityKind::Spline => summary.splines += 1.0,
                EntityKind::Unsupported => continue,
            }
            let Some(b) = entity.bounds() else { continue };
            match bounds.as_mut() {
                Some(acc) => acc.merge(&b),
                None => bounds = Some(b),
            }
        }
        if let Some(b) = bounds {
            let c = b.center();
            summary.center_x = c.x;
            summary.center_y = c.y;
            summary.width = b.width();
            summary.height = b.height();
        }
        summary
    }

    pub fn to_slots(&self) -> [f64; PROFILE_SLOTS] {
        [
            self.lines,
            self.arcs,
            self.circles,
            self.splines,
            self.center_x,
            self.center_y,
            self.width,
            self.height,
        ]
    }

    pub fn from_slots(slots: &[f64; PROFILE_SLOTS]) -> Self {
        Self {
            lines: slots[0],
            arcs: slots[1],
            circles: slots[2],
            splines: slots[3],
            center_x: slots[4],
            center_y: slots[5],
            width: slots[6],
            height: slots[7],
        }
    }

    pub fn entity_count(&self) -> f64 {
        self.lines + self.arcs + self.circles + self.splines
    }
}

/// A profile entity as placed in a loop: its declaration index and whether
/// the loop traverses it against its declared direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrientedEntity {
    pub index: usize,
    pub entity: ProfileEntity,
    pub reversed: bool,
}

impl OrientedEntity {
    pub fn new(index: usize, entity: ProfileEntity, reversed: bool) -> Self {
        Self {
            index,
            entity,
            reversed,
        }
    }

    /// Start and end point in traversal direction.
    pub fn endpoints(&self) -> Option<(Point2, Point2)> {
        let (a, b) = self.entity.endpoints()?;
        Some(if self.reversed { (b, a) } else { (a, b) })
    }

    /// The entity rewritten so that its declared direction is the traversal
    /// direction. A reversed arc starts at its old end and sweeps the other way.
    pub fn oriented(&self) -> ProfileEntity {
        if !self.reversed {
            return self.entity.clone();
        }
        match &self.entity {
            ProfileEntity::Line { start, end } => ProfileEntity::Line {
                start: *end,
                end: *start,
            },
            ProfileEntity::Circle { .. } | ProfileEntity::Unsupported => self.entity.clone(),
            ProfileEntity::Arc {
                center,
                radius,
                start_angle,
                sweep_angle,
            } => ProfileEntity::Arc {
                center: *center,
                radius: *radius,
                start_angle: start_angle + sweep_angle,
                sweep_angle: -sweep_angle,
            },
            ProfileEntity::Spline {
                control_points,
                degree,
            } => ProfileEntity::Spline {
                control_points: control_points.iter().rev().copied().collect(),
                degree: *degree,
            },
        }
    }
}
