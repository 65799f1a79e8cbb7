use getset::CopyGetters;
use snafu::prelude::*;

use crate::domain::math::algebra::{Product, UnitVector, Vector};
use crate::domain::math::geometry::Point;
use crate::domain::math::numeric::Val;

/// Pinhole camera with an optional thin-lens mode for depth of field.
///
/// The orientation basis is derived from the position and the view
/// reference point, starting from world up; the half-FOV tangent is
/// derived once and shared by pixel directions, the view-plane distance
/// and the frustum planes.
#[derive(Debug, Clone, PartialEq, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct Camera {
    position: Point,
    vrp: Point,
    #[getset(skip)]
    xdir: UnitVector,
    #[getset(skip)]
    ydir: UnitVector,
    #[getset(skip)]
    zdir: UnitVector,
    width: usize,
    height: usize,
    #[getset(skip)]
    h_aspect: Val,
    #[getset(skip)]
    half_fov_tan: Val,
    /// World-space distance from the camera to the view plane.
    view_plane_distance: Val,
    render_dof: bool,
    /// Absolute distance to the focal plane; must lie beyond the view
    /// plane.
    fplane_distance: Val,
    lens_aperture: i64,
    #[getset(skip)]
    frustum: [UnitVector; 4],
}

impl Camera {
    pub fn new(
        position: Point,
        vrp: Point,
        vfov: Val,
        vplane_height: Val,
        width: usize,
        height: usize,
    ) -> Result<Self, TryNewCameraError> {
        ensure!(width > 0 && height > 0, InvalidResolutionSnafu);
        ensure!(vfov > Val(0.0) && vfov < Val(180.0), InvalidFovSnafu);

        let world_up = UnitVector::y_direction();
        let zdir = (vrp - position)
            .normalize()
            .ok()
            .context(DegenerateOrientationSnafu)?;
        let xdir = zdir
            .cross(world_up)
            .normalize()
            .ok()
            .context(DegenerateOrientationSnafu)?;
        let ydir = xdir
            .cross(zdir)
            .normalize()
            .expect("orthogonal unit vectors have a unit cross product");

        let h_aspect = Val::from(width) / Val::from(height);
        let half_fov_tan = (vfov.to_radians() * Val(0.5)).tan();
        let view_plane_distance = (vplane_height * Val(0.5)) / half_fov_tan;

        let frustum = Self::derive_frustum(xdir, ydir, zdir, half_fov_tan, h_aspect);

        Ok(Self {
            position,
            vrp,
            xdir,
            ydir,
            zdir,
            width,
            height,
            h_aspect,
            half_fov_tan,
            view_plane_distance,
            render_dof: false,
            fplane_distance: view_plane_distance * Val(2.0),
            lens_aperture: 0,
            frustum,
        })
    }

    pub fn with_depth_of_field(
        mut self,
        fplane_distance: Val,
        lens_aperture: i64,
    ) -> Result<Self, TryNewCameraError> {
        ensure!(
            fplane_distance > self.view_plane_distance,
            InvalidFocalPlaneDistanceSnafu,
        );
        self.render_dof = true;
        self.fplane_distance = fplane_distance;
        self.lens_aperture = lens_aperture;
        Ok(self)
    }

    fn derive_frustum(
        xdir: UnitVector,
        ydir: UnitVector,
        zdir: UnitVector,
        half_fov_tan: Val,
        h_aspect: Val,
    ) -> [UnitVector; 4] {
        let zdir_y = -zdir * half_fov_tan;
        let zdir_x = -zdir * (half_fov_tan.atan() * h_aspect).tan();
        let normalize = |v: Vector| {
            v.normalize()
                .expect("frustum plane normals are never zero for a valid FOV")
        };
        [
            normalize(zdir_y + ydir.to_vector()), // top
            normalize(zdir_y - ydir.to_vector()), // bottom
            normalize(zdir_x + xdir.to_vector()), // right
            normalize(zdir_x - xdir.to_vector()), // left
        ]
    }

    #[inline]
    pub fn zdir(&self) -> UnitVector {
        self.zdir
    }

    /// World-space direction of the ray through pixel `(x, y)`; the
    /// vertical axis flips because image rows grow downward.
    pub fn pixel_direction(&self, x: i64, y: i64) -> UnitVector {
        let xr = Val((x - (self.width as i64 / 2)) as f64) / Val::from(self.width);
        let yr = -Val((y - (self.height as i64 / 2)) as f64) / Val::from(self.height);

        let dir = self.zdir * self.half_fov_tan.recip()
            + self.xdir * (self.h_aspect * xr)
            + self.ydir * yr;
        dir.normalize()
            .expect("pixel directions always have a forward component")
    }

    /// World-space position of pixel `(x, y)` on the view plane.
    pub fn pixel_position(&self, x: i64, y: i64) -> Point {
        let dir = self.pixel_direction(x, y);
        let t = self.view_plane_distance / dir.dot(self.zdir);
        self.position + dir * t
    }

    /// True when the sphere at `center` pokes into the view frustum.
    pub fn in_view_sphere(&self, center: Point, radius: Val) -> bool {
        let t = center - self.position;
        self.frustum.iter().all(|plane| t.dot(*plane) < radius)
    }

    /// True when the box `[mins, maxs]` lies on the inner side of every
    /// frustum half-space (negative-vertex test).
    pub fn in_view_aabb(&self, mins: Point, maxs: Point) -> bool {
        self.frustum.iter().all(|plane| {
            let negative_vertex = Point::new(
                if plane.x() > Val(0.0) { mins.x() } else { maxs.x() },
                if plane.y() > Val(0.0) { mins.y() } else { maxs.y() },
                if plane.z() > Val(0.0) { mins.z() } else { maxs.z() },
            );
            plane.dot(negative_vertex - self.position) < Val(0.0)
        })
    }
}

#[derive(Debug, Snafu, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TryNewCameraError {
    #[snafu(display("image resolution must be positive in both dimensions"))]
    InvalidResolution,
    #[snafu(display("vertical FOV must lie strictly between 0 and 180 degrees"))]
    InvalidFov,
    #[snafu(display("camera orientation is degenerate (view direction parallel to world up)"))]
    DegenerateOrientation,
    #[snafu(display("focal plane must lie beyond the view plane"))]
    InvalidFocalPlaneDistance,
}
