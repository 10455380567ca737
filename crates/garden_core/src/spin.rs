//! Constant rotation for particle systems and other decorative objects.

use bevy::prelude::*;

/// Rotates the entity by `rate` degrees per second around its local axes.
#[derive(Component, Clone, Copy, Debug, Default)]
pub struct Spin {
    pub rate: Vec3,
}

impl Spin {
    pub fn new(rate: Vec3) -> Self {
        Self { rate }
    }

    /// Local rotation applied over `dt` seconds.
    pub fn step(&self, dt: f32) -> Quat {
        let step = self.rate * dt;
        Quat::from_euler(
            EulerRot::YXZ,
            step.y.to_radians(),
            step.x.to_radians(),
            step.z.to_radians(),
        )
    }
}

pub fn spin_system(time: Res<Time>, mut query: Query<(&Spin, &mut Transform)>) {
    let dt = time.delta_secs();
    for (spin, mut transform) in query.iter_mut() {
        transform.rotate_local(spin.step(dt));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quarter_turn_per_second() {
        let spin = Spin::new(Vec3::new(0.0, 90.0, 0.0));
        let turned = spin.step(1.0) * Vec3::NEG_Z;
        assert!((turned - Vec3::NEG_X).length() < 1e-5);
    }

    #[test]
    fn test_zero_rate_is_identity() {
        assert!(Spin::default().step(0.5).abs_diff_eq(Quat::IDENTITY, 1e-6));
    }
}
