//! MockHost: deterministic in-process implementation of `CadHost`.
//!
//! Tracks just enough document state to reject what a real host would
//! reject (no body to cut, unknown handles, empty sketches) and records every
//! call in a journal. Used by tests and by the CLI's dry-run replay.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};

use featseq_types::{
    ChamferKind, Direction, Extent, OrientedEntity, Operation, ParamEnum, PatternLayout, Point2,
    ProfileEntity, ShellDirection, SketchPlane,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::traits::CadHost;
use crate::types::*;

/// One host call as seen by the mock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Zero-based position of the call in this session.
    pub call: usize,
    pub operation: String,
    /// Handle returned by the call, if any.
    pub handle: Option<u64>,
    pub ok: bool,
}

#[derive(Debug, Clone, Serialize)]
struct MockFeature {
    id: u64,
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    profile: Option<u64>,
    refs: Vec<u64>,
    values: BTreeMap<&'static str, f64>,
}

#[derive(Debug, Clone)]
struct MockSketch {
    plane: SketchPlane,
    entities: Vec<ProfileEntity>,
    closed: bool,
}

#[derive(Debug, Clone, Copy)]
struct MockProfile {
    sketch: u64,
    entities: usize,
}

#[derive(Serialize)]
struct SketchSnapshot {
    id: u64,
    plane: SketchPlane,
    entities: usize,
    closed: bool,
}

/// Document state written by `save_as` when snapshots are enabled.
#[derive(Serialize)]
struct DocumentSnapshot<'a> {
    call: usize,
    has_body: bool,
    sketches: Vec<SketchSnapshot>,
    features: &'a [MockFeature],
}

/// Handles that can be written to the journal.
trait Journaled {
    fn journal_id(&self) -> Option<u64>;
}

impl Journaled for () {
    fn journal_id(&self) -> Option<u64> {
        None
    }
}

impl Journaled for SketchHandle {
    fn journal_id(&self) -> Option<u64> {
        Some(self.0)
    }
}

impl Journaled for ProfileHandle {
    fn journal_id(&self) -> Option<u64> {
        Some(self.0)
    }
}

impl Journaled for FeatureHandle {
    fn journal_id(&self) -> Option<u64> {
        Some(self.0)
    }
}

/// Deterministic test double for the CAD host session.
pub struct MockHost {
    next_handle: u64,
    calls: usize,
    part_open: bool,
    has_body: bool,
    sketches: HashMap<u64, MockSketch>,
    profiles: HashMap<u64, MockProfile>,
    features: Vec<MockFeature>,
    journal: Vec<JournalEntry>,
    saved: Vec<PathBuf>,
    write_snapshots: bool,
    fail_at_call: Option<usize>,
    fail_features: HashSet<String>,
}

impl MockHost {
    pub fn new() -> Self {
        Self {
            next_handle: 1,
            calls: 0,
            part_open: false,
            has_body: false,
            sketches: HashMap::new(),
            profiles: HashMap::new(),
            features: Vec::new(),
            journal: Vec::new(),
            saved: Vec::new(),
            write_snapshots: false,
            fail_at_call: None,
            fail_features: HashSet::new(),
        }
    }

    /// Write a JSON document snapshot to disk on every `save_as`.
    /// By default saves are only recorded.
    pub fn with_snapshots(mut self) -> Self {
        self.write_snapshots = true;
        self
    }

    /// Make the call at zero-based position `call` fail.
    pub fn fail_at_call(mut self, call: usize) -> Self {
        self.fail_at_call = Some(call);
        self
    }

    /// Make every `create_<kind>` call fail, e.g. `fail_feature("fillet")`.
    pub fn fail_feature(mut self, kind: &str) -> Self {
        self.fail_features.insert(kind.to_string());
        self
    }

    pub fn journal(&self) -> &[JournalEntry] {
        &self.journal
    }

    /// Operations of all successful calls, in order.
    pub fn successful_operations(&self) -> Vec<&str> {
        self.journal
            .iter()
            .filter(|e| e.ok)
            .map(|e| e.operation.as_str())
            .collect()
    }

    pub fn saved_paths(&self) -> &[PathBuf] {
        &self.saved
    }

    /// Kinds of the features created so far, in creation order.
    pub fn feature_kinds(&self) -> Vec<&'static str> {
        self.features.iter().map(|f| f.kind).collect()
    }

    pub fn feature_count(&self) -> usize {
        self.features.len()
    }

    pub fn has_body(&self) -> bool {
        self.has_body
    }

    pub fn is_open(&self) -> bool {
        self.part_open
    }

    /// Number of entities in the sketch behind a closed profile.
    pub fn profile_entity_count(&self, profile: ProfileHandle) -> Option<usize> {
        self.profiles.get(&profile.0).map(|p| p.entities)
    }

    fn alloc(&mut self) -> u64 {
        let id = self.next_handle;
        self.next_handle += 1;
        id
    }

    /// Run one host call: apply scripted failures, then `body`, then journal it.
    fn run<T: Journaled>(
        &mut self,
        operation: &'static str,
        body: impl FnOnce(&mut Self) -> Result<T, HostError>,
    ) -> Result<T, HostError> {
        let call = self.calls;
        self.calls += 1;

        let scripted = self.fail_at_call == Some(call)
            || operation
                .strip_prefix("create_")
                .is_some_and(|kind| self.fail_features.contains(kind));

        let result = if scripted {
            Err(HostError::Rejected {
                operation: operation.to_string(),
                reason: format!("scripted failure at call {}", call),
            })
        } else {
            body(self)
        };

        debug!(call, operation, ok = result.is_ok(), "mock host call");
        self.journal.push(JournalEntry {
            call,
            operation: operation.to_string(),
            handle: result.as_ref().ok().and_then(|h| h.journal_id()),
            ok: result.is_ok(),
        });
        result
    }

    fn require_part(&self) -> Result<(), HostError> {
        if self.part_open {
            Ok(())
        } else {
            Err(HostError::NoActivePart)
        }
    }

    fn require_body(&self, operation: &str) -> Result<(), HostError> {
        if self.has_body {
            Ok(())
        } else {
            Err(HostError::NoBody {
                operation: operation.to_string(),
            })
        }
    }

    fn require_profile(&self, profile: ProfileHandle) -> Result<(), HostError> {
        if self.profiles.contains_key(&profile.0) {
            Ok(())
        } else {
            Err(HostError::UnknownHandle {
                kind: "profile",
                id: profile.0,
            })
        }
    }

    fn require_feature(&self, feature: FeatureHandle) -> Result<(), HostError> {
        if self.features.iter().any(|f| f.id == feature.0) {
            Ok(())
        } else {
            Err(HostError::UnknownHandle {
                kind: "feature",
                id: feature.0,
            })
        }
    }

    fn require_positive(operation: &str, name: &str, value: f64) -> Result<(), HostError> {
        if value.is_finite() && value > 0.0 {
            Ok(())
        } else {
            Err(HostError::Rejected {
                operation: operation.to_string(),
                reason: format!("{} must be > 0, got {}", name, value),
            })
        }
    }

    /// Validate an extent and turn it into journal values.
    fn extent_values(
        &self,
        operation: &str,
        distance_name: &'static str,
        extent: Extent,
    ) -> Result<Vec<(&'static str, f64)>, HostError> {
        let mut values = vec![("extent", extent.extent_type().code())];
        match extent {
            Extent::Distance(d) => {
                Self::require_positive(operation, distance_name, d)?;
                values.push((distance_name, d));
            }
            Extent::TwoSides {
                distance,
                distance_two,
            } => {
                Self::require_positive(operation, distance_name, distance)?;
                Self::require_positive(operation, "distanceTwo", distance_two)?;
                values.push((distance_name, distance));
                values.push(("distanceTwo", distance_two));
            }
            Extent::ThroughAll => self.require_body(&format!("{} (through all)", operation))?,
            Extent::ToFace => {
                return Err(HostError::Rejected {
                    operation: operation.to_string(),
                    reason: "to-face extent needs a face selection".to_string(),
                })
            }
        }
        Ok(values)
    }

    /// Body check for features that grow or cut material from a profile.
    fn check_solid_operation(&self, kind: &str, operation: Operation) -> Result<(), HostError> {
        if operation.needs_body() {
            self.require_body(&format!("{} ({})", kind, operation.as_str()))?;
        }
        Ok(())
    }

    fn add_feature(
        &mut self,
        kind: &'static str,
        profile: Option<ProfileHandle>,
        refs: &[FeatureHandle],
        values: &[(&'static str, f64)],
    ) -> FeatureHandle {
        let id = self.alloc();
        self.features.push(MockFeature {
            id,
            kind,
            profile: profile.map(|p| p.0),
            refs: refs.iter().map(|r| r.0).collect(),
            values: values.iter().copied().collect(),
        });
        FeatureHandle(id)
    }
}

impl Default for MockHost {
    fn default() -> Self {
        Self::new()
    }
}

impl CadHost for MockHost {
    fn open_part(&mut self) -> Result<(), HostError> {
        self.run("open_part", |h| {
            if h.part_open {
                return Err(HostError::PartAlreadyOpen);
            }
            h.part_open = true;
            h.has_body = false;
            h.sketches.clear();
            h.profiles.clear();
            h.features.clear();
            Ok(())
        })
    }

    fn new_sketch_on_plane(&mut self, plane: &SketchPlane) -> Result<SketchHandle, HostError> {
        self.run("new_sketch_on_plane", |h| {
            h.require_part()?;
            if plane.normal.iter().all(|c| *c == 0.0) {
                return Err(HostError::Rejected {
                    operation: "new_sketch_on_plane".to_string(),
                    reason: "plane normal is zero".to_string(),
                });
            }
            let id = h.alloc();
            h.sketches.insert(
                id,
                MockSketch {
                    plane: *plane,
                    entities: Vec::new(),
                    closed: false,
                },
            );
            Ok(SketchHandle(id))
        })
    }

    fn add_profile_entity(
        &mut self,
        sketch: SketchHandle,
        entity: &OrientedEntity,
    ) -> Result<(), HostError> {
        self.run("add_profile_entity", |h| {
            h.require_part()?;
            let s = h
                .sketches
                .get_mut(&sketch.0)
                .ok_or(HostError::UnknownHandle {
                    kind: "sketch",
                    id: sketch.0,
                })?;
            if s.closed {
                return Err(HostError::Rejected {
                    operation: "add_profile_entity".to_string(),
                    reason: format!("{} is already closed", sketch),
                });
            }
            s.entities.push(entity.oriented());
            Ok(())
        })
    }

    fn close_profile(&mut self, sketch: SketchHandle) -> Result<ProfileHandle, HostError> {
        self.run("close_profile", |h| {
            h.require_part()?;
            let s = h
                .sketches
                .get_mut(&sketch.0)
                .ok_or(HostError::UnknownHandle {
                    kind: "sketch",
                    id: sketch.0,
                })?;
            if s.entities.is_empty() {
                return Err(HostError::EmptyProfile { sketch });
            }
            s.closed = true;
            let entities = s.entities.len();
            let id = h.alloc();
            h.profiles.insert(
                id,
                MockProfile {
                    sketch: sketch.0,
                    entities,
                },
            );
            Ok(ProfileHandle(id))
        })
    }

    fn create_extrude(
        &mut self,
        profile: ProfileHandle,
        extent: Extent,
        direction: Direction,
        operation: Operation,
    ) -> Result<FeatureHandle, HostError> {
        self.run("create_extrude", |h| {
            h.require_part()?;
            h.require_profile(profile)?;
            let mut values = h.extent_values("create_extrude", "distance", extent)?;
            h.check_solid_operation("extrude", operation)?;
            h.has_body = true;
            values.push(("direction", direction.code()));
            values.push(("operation", operation.code()));
            Ok(h.add_feature("extrude", Some(profile), &[], &values))
        })
    }

    fn create_revolve(
        &mut self,
        profile: ProfileHandle,
        axis: Option<FeatureHandle>,
        angle: f64,
        direction: Direction,
        operation: Operation,
    ) -> Result<FeatureHandle, HostError> {
        self.run("create_revolve", |h| {
            h.require_part()?;
            h.require_profile(profile)?;
            if let Some(a) = axis {
                h.require_feature(a)?;
            }
            if angle == 0.0 || !angle.is_finite() {
                return Err(HostError::Rejected {
                    operation: "create_revolve".to_string(),
                    reason: "angle must be non-zero".to_string(),
                });
            }
            h.check_solid_operation("revolve", operation)?;
            h.has_body = true;
            let refs: Vec<FeatureHandle> = axis.into_iter().collect();
            Ok(h.add_feature(
                "revolve",
                Some(profile),
                &refs,
                &[
                    ("angle", angle),
                    ("direction", direction.code()),
                    ("operation", operation.code()),
                ],
            ))
        })
    }

    fn create_sweep(
        &mut self,
        profile: ProfileHandle,
        path: FeatureHandle,
        operation: Operation,
    ) -> Result<FeatureHandle, HostError> {
        self.run("create_sweep", |h| {
            h.require_part()?;
            h.require_profile(profile)?;
            h.require_feature(path)?;
            h.check_solid_operation("sweep", operation)?;
            h.has_body = true;
            Ok(h.add_feature(
                "sweep",
                Some(profile),
                &[path],
                &[("operation", operation.code())],
            ))
        })
    }

    fn create_fillet(
        &mut self,
        target: FeatureHandle,
        radius: f64,
    ) -> Result<FeatureHandle, HostError> {
        self.run("create_fillet", |h| {
            h.require_part()?;
            h.require_feature(target)?;
            h.require_body("fillet")?;
            Self::require_positive("create_fillet", "radius", radius)?;
            Ok(h.add_feature("fillet", None, &[target], &[("radius", radius)]))
        })
    }

    fn create_chamfer(
        &mut self,
        target: FeatureHandle,
        kind: ChamferKind,
    ) -> Result<FeatureHandle, HostError> {
        self.run("create_chamfer", |h| {
            h.require_part()?;
            h.require_feature(target)?;
            h.require_body("chamfer")?;
            let values = match kind {
                ChamferKind::EqualDistance(distance) => {
                    Self::require_positive("create_chamfer", "distance", distance)?;
                    vec![("distance", distance)]
                }
                ChamferKind::TwoDistances {
                    distance,
                    distance_two,
                } => {
                    Self::require_positive("create_chamfer", "distance", distance)?;
                    Self::require_positive("create_chamfer", "distanceTwo", distance_two)?;
                    vec![("distance", distance), ("distanceTwo", distance_two)]
                }
                ChamferKind::DistanceAngle { distance, angle } => {
                    Self::require_positive("create_chamfer", "distance", distance)?;
                    Self::require_positive("create_chamfer", "angle", angle)?;
                    vec![("distance", distance), ("angle", angle)]
                }
            };
            Ok(h.add_feature("chamfer", None, &[target], &values))
        })
    }

    fn create_shell(
        &mut self,
        target: FeatureHandle,
        thickness: f64,
        direction: ShellDirection,
    ) -> Result<FeatureHandle, HostError> {
        self.run("create_shell", |h| {
            h.require_part()?;
            h.require_feature(target)?;
            h.require_body("shell")?;
            Self::require_positive("create_shell", "thickness", thickness)?;
            Ok(h.add_feature(
                "shell",
                None,
                &[target],
                &[("thickness", thickness), ("direction", direction.code())],
            ))
        })
    }

    fn create_hole(
        &mut self,
        _plane: &SketchPlane,
        centers: &[Point2],
        diameter: f64,
        extent: Extent,
    ) -> Result<FeatureHandle, HostError> {
        self.run("create_hole", |h| {
            h.require_part()?;
            h.require_body("hole")?;
            if centers.is_empty() {
                return Err(HostError::Rejected {
                    operation: "create_hole".to_string(),
                    reason: "no hole centres".to_string(),
                });
            }
            Self::require_positive("create_hole", "diameter", diameter)?;
            let mut values = h.extent_values("create_hole", "depth", extent)?;
            values.push(("diameter", diameter));
            values.push(("holes", centers.len() as f64));
            Ok(h.add_feature("hole", None, &[], &values))
        })
    }

    fn create_mirror(
        &mut self,
        feature: FeatureHandle,
        plane: FeatureHandle,
        operation: Operation,
    ) -> Result<FeatureHandle, HostError> {
        self.run("create_mirror", |h| {
            h.require_part()?;
            h.require_feature(feature)?;
            h.require_feature(plane)?;
            h.require_body("mirror")?;
            Ok(h.add_feature(
                "mirror",
                None,
                &[feature, plane],
                &[("operation", operation.code())],
            ))
        })
    }

    fn create_pattern(
        &mut self,
        feature: FeatureHandle,
        axis: FeatureHandle,
        count: usize,
        layout: PatternLayout,
    ) -> Result<FeatureHandle, HostError> {
        self.run("create_pattern", |h| {
            h.require_part()?;
            h.require_feature(feature)?;
            h.require_feature(axis)?;
            h.require_body("pattern")?;
            if count < 1 {
                return Err(HostError::Rejected {
                    operation: "create_pattern".to_string(),
                    reason: "count must be >= 1".to_string(),
                });
            }
            let (kind, value) = match layout {
                PatternLayout::Rectangular { spacing } => ("rectangular_pattern", ("spacing", spacing)),
                PatternLayout::Circular { angle } => ("circular_pattern", ("angle", angle)),
            };
            Ok(h.add_feature(
                kind,
                None,
                &[feature, axis],
                &[("count", count as f64), value],
            ))
        })
    }

    fn save_as(&mut self, path: &Path) -> Result<(), HostError> {
        self.run("save_as", |h| {
            h.require_part()?;
            if h.write_snapshots {
                let mut sketches: Vec<SketchSnapshot> = h
                    .sketches
                    .iter()
                    .map(|(id, s)| SketchSnapshot {
                        id: *id,
                        plane: s.plane,
                        entities: s.entities.len(),
                        closed: s.closed,
                    })
                    .collect();
                sketches.sort_by_key(|s| s.id);
                let snapshot = DocumentSnapshot {
                    call: h.calls - 1,
                    has_body: h.has_body,
                    sketches,
                    features: &h.features,
                };
                let io_err = |reason: String| HostError::Io {
                    path: path.display().to_string(),
                    reason,
                };
                let json = serde_json::to_string_pretty(&snapshot)
                    .map_err(|e| io_err(e.to_string()))?;
                std::fs::write(path, json).map_err(|e| io_err(e.to_string()))?;
            }
            h.saved.push(path.to_path_buf());
            Ok(())
        })
    }

    fn close(&mut self) -> Result<(), HostError> {
        self.run("close", |h| {
            h.require_part()?;
            h.part_open = false;
            h.sketches.retain(|_, s| s.closed);
            let live: HashSet<u64> = h.sketches.keys().copied().collect();
            h.profiles.retain(|_, p| live.contains(&p.sketch));
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Vec<OrientedEntity> {
        let pts = [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)];
        (0..4)
            .map(|i| {
                let (x0, y0) = pts[i];
                let (x1, y1) = pts[(i + 1) % 4];
                OrientedEntity::new(
                    i,
                    ProfileEntity::Line {
                        start: Point2::new(x0, y0),
                        end: Point2::new(x1, y1),
                    },
                    false,
                )
            })
            .collect()
    }

    fn profile(host: &mut MockHost) -> ProfileHandle {
        let sketch = host.new_sketch_on_plane(&SketchPlane::XY).unwrap();
        for e in square() {
            host.add_profile_entity(sketch, &e).unwrap();
        }
        host.close_profile(sketch).unwrap()
    }

    #[test]
    fn test_handles_are_deterministic() {
        let run = || {
            let mut host = MockHost::new();
            host.open_part().unwrap();
            let p = profile(&mut host);
            let f = host
                .create_extrude(p, Extent::Distance(5.0), Direction::Positive, Operation::Join)
                .unwrap();
            (p, f)
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_sketch_plane_kept_per_sketch() {
        let mut host = MockHost::new();
        host.open_part().unwrap();
        let s = host.new_sketch_on_plane(&SketchPlane::XY).unwrap();
        assert_eq!(host.sketches[&s.0].plane, SketchPlane::XY);
    }
}
