//! Walkable paths, sampled to keep procedural placement off them.
//!
//! Control points are joined by a Catmull-Rom spline that passes through
//! every one of them. The curve is flattened into a `VertexPath`, a dense
//! polyline parameterized by normalized arc length: `t = 0.0` is the first
//! point, `t = 1.0` the last, and values outside [0, 1] stop at the ends.

use bevy::math::cubic_splines::{CubicCardinalSpline, CubicGenerator};
use bevy::prelude::*;

/// Vertices generated per spline segment when flattening a path.
pub const VERTICES_PER_SEGMENT: usize = 16;

/// Source of sampled points along one or more paths.
pub trait PathSampler {
    /// Number of paths available.
    fn path_count(&self) -> usize;

    /// Point at normalized time `t` along path `path`.
    fn sample_point(&self, path: usize, t: f32) -> Vec3;
}

/// Flattened path with cumulative segment lengths.
#[derive(Clone, Debug)]
pub struct VertexPath {
    points: Vec<Vec3>,
    /// Arc length from the first point to each point.
    cumulative: Vec<f32>,
}

impl VertexPath {
    pub fn new(points: Vec<Vec3>) -> Self {
        let mut cumulative = Vec::with_capacity(points.len());
        let mut total = 0.0;
        for (i, point) in points.iter().enumerate() {
            if i > 0 {
                total += point.distance(points[i - 1]);
            }
            cumulative.push(total);
        }
        Self { points, cumulative }
    }

    /// Flatten the Catmull-Rom spline through `control`.
    ///
    /// Fewer than three control points leave nothing to curve, so they are
    /// used as they are.
    pub fn from_control_points(control: Vec<Vec3>) -> Self {
        if control.len() < 3 {
            return Self::new(control);
        }
        let subdivisions = (control.len() - 1) * VERTICES_PER_SEGMENT;
        match CubicCardinalSpline::new_catmull_rom(control.clone()).to_curve() {
            Ok(curve) => Self::new(curve.iter_positions(subdivisions).collect()),
            Err(_) => Self::new(control),
        }
    }

    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    /// Total arc length.
    pub fn length(&self) -> f32 {
        self.cumulative.last().copied().unwrap_or(0.0)
    }

    /// Point at normalized arc length `t`, clamped to the ends.
    pub fn point_at_time(&self, t: f32) -> Vec3 {
        match self.points.len() {
            0 => return Vec3::ZERO,
            1 => return self.points[0],
            _ => {}
        }

        let length = self.length();
        if length <= 0.0 {
            return self.points[0];
        }

        let target = t.clamp(0.0, 1.0) * length;
        // First point whose cumulative length reaches the target
        let end = self
            .cumulative
            .iter()
            .position(|&d| d >= target)
            .unwrap_or(self.points.len() - 1)
            .max(1);
        let start = end - 1;

        let segment = self.cumulative[end] - self.cumulative[start];
        if segment <= 0.0 {
            return self.points[end];
        }
        let local = (target - self.cumulative[start]) / segment;
        self.points[start].lerp(self.points[end], local)
    }
}

/// All configured paths.
#[derive(Clone, Debug, Default)]
pub struct PathSet {
    paths: Vec<VertexPath>,
}

impl PathSet {
    pub fn new(paths: Vec<VertexPath>) -> Self {
        Self { paths }
    }

    /// Build from control-point lists, one list per path.
    pub fn from_points(paths: &[Vec<[f32; 3]>]) -> Self {
        Self::new(
            paths
                .iter()
                .map(|points| {
                    VertexPath::from_control_points(
                        points.iter().copied().map(Vec3::from).collect(),
                    )
                })
                .collect(),
        )
    }
}

impl PathSampler for PathSet {
    fn path_count(&self) -> usize {
        self.paths.len()
    }

    fn sample_point(&self, path: usize, t: f32) -> Vec3 {
        self.paths[path].point_at_time(t)
    }
}
