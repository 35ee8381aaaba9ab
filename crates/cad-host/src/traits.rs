use std::path::Path;

use featseq_types::{
    ChamferKind, Direction, Extent, OrientedEntity, PatternLayout, Operation, Point2,
    ShellDirection, SketchPlane,
};

use crate::types::*;

/// Automation interface of the CAD host session that features are rebuilt in.
///
/// The reconstruction engine only ever talks to the host through this trait.
/// One value is one session with at most one open part. Calls are synchronous
/// and are never retried by callers.
pub trait CadHost {
    /// Open a fresh, empty part document.
    fn open_part(&mut self) -> Result<(), HostError>;

    /// Start a sketch on the given plane.
    fn new_sketch_on_plane(&mut self, plane: &SketchPlane) -> Result<SketchHandle, HostError>;

    /// Add one entity to an open sketch, in traversal direction.
    fn add_profile_entity(
        &mut self,
        sketch: SketchHandle,
        entity: &OrientedEntity,
    ) -> Result<(), HostError>;

    /// Finish a sketch and turn its entities into a feature profile.
    fn close_profile(&mut self, sketch: SketchHandle) -> Result<ProfileHandle, HostError>;

    /// Extrude a profile along the sketch normal as far as `extent` reaches.
    fn create_extrude(
        &mut self,
        profile: ProfileHandle,
        extent: Extent,
        direction: Direction,
        operation: Operation,
    ) -> Result<FeatureHandle, HostError>;

    /// Revolve a profile about an axis. `None` means the sketch X axis.
    fn create_revolve(
        &mut self,
        profile: ProfileHandle,
        axis: Option<FeatureHandle>,
        angle: f64,
        direction: Direction,
        operation: Operation,
    ) -> Result<FeatureHandle, HostError>;

    /// Sweep a profile along the path of an earlier feature.
    fn create_sweep(
        &mut self,
        profile: ProfileHandle,
        path: FeatureHandle,
        operation: Operation,
    ) -> Result<FeatureHandle, HostError>;

    /// Round the edges created by `target`.
    fn create_fillet(
        &mut self,
        target: FeatureHandle,
        radius: f64,
    ) -> Result<FeatureHandle, HostError>;

    /// Bevel the edges created by `target`.
    fn create_chamfer(
        &mut self,
        target: FeatureHandle,
        kind: ChamferKind,
    ) -> Result<FeatureHandle, HostError>;

    /// Hollow out the body grown by `target`.
    fn create_shell(
        &mut self,
        target: FeatureHandle,
        thickness: f64,
        direction: ShellDirection,
    ) -> Result<FeatureHandle, HostError>;

    /// Drill simple holes at `centers` on `plane`.
    fn create_hole(
        &mut self,
        plane: &SketchPlane,
        centers: &[Point2],
        diameter: f64,
        extent: Extent,
    ) -> Result<FeatureHandle, HostError>;

    /// Mirror a feature about the plane defined by another feature.
    fn create_mirror(
        &mut self,
        feature: FeatureHandle,
        plane: FeatureHandle,
        operation: Operation,
    ) -> Result<FeatureHandle, HostError>;

    /// Repeat a feature `count` times along or around `axis`.
    fn create_pattern(
        &mut self,
        feature: FeatureHandle,
        axis: FeatureHandle,
        count: usize,
        layout: PatternLayout,
    ) -> Result<FeatureHandle, HostError>;

    /// Save the current document state to `path`.
    fn save_as(&mut self, path: &Path) -> Result<(), HostError>;

    /// Close the open part.
    fn close(&mut self) -> Result<(), HostError>;
}
