//! Procedural forest placement.
//!
//! The placer scans a regular lattice centered on the origin. For each cell
//! it walks the element categories in priority order; the first category
//! whose density gate passes while the cell is clear of every path sample
//! plants one prop, and the remaining categories are skipped.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::ForestConfig;
use crate::path::PathSampler;
use crate::rng::GardenRng;
use crate::world::{ForestProp, GardenWorld};

/// Visibility-distance class of a prop.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CullingTier {
    /// Small props, culled close to the player
    Near,
    /// Large props, culled further out
    Far,
}

/// A placeable prop category.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ElementCategory {
    pub name: String,
    /// Prefab asset paths; one is chosen at random per placement
    pub prefabs: Vec<String>,
    /// Placement weight in [1, 10]; the gate passes with probability density/10
    pub density: u8,
    /// Explicit culling tier; derived from the name when absent
    #[serde(default)]
    pub tier: Option<CullingTier>,
}

impl ElementCategory {
    pub fn new(name: &str, prefabs: &[&str], density: u8) -> Self {
        Self {
            name: name.to_string(),
            prefabs: prefabs.iter().map(|p| p.to_string()).collect(),
            density,
            tier: None,
        }
    }

    /// Roll the density gate.
    pub fn can_place(&self, rng: &mut dyn GardenRng) -> bool {
        rng.next_int_range(0, 10) < self.density as i32
    }

    /// Pick one prefab at random.
    ///
    /// Panics if the category has no prefabs.
    pub fn pick_prefab(&self, rng: &mut dyn GardenRng) -> &str {
        assert!(
            !self.prefabs.is_empty(),
            "category '{}' has no prefabs",
            self.name
        );
        &self.prefabs[rng.next_index(self.prefabs.len())]
    }

    /// "Bushes" are small and culled near; everything else is culled far.
    pub fn culling_tier(&self) -> CullingTier {
        self.tier.unwrap_or(if self.name == "Bushes" {
            CullingTier::Near
        } else {
            CullingTier::Far
        })
    }
}

/// One-shot forest generator.
pub struct ForestPlacer {
    config: ForestConfig,
    corridor: Vec<Vec3>,
}

impl ForestPlacer {
    /// Sample `samples_per_path` evenly spaced points along every path into one corridor.
    pub fn new(config: ForestConfig, paths: &dyn PathSampler) -> Self {
        let samples = config.samples_per_path;
        let mut corridor = Vec::with_capacity(paths.path_count() * samples);
        for path in 0..paths.path_count() {
            for i in 0..samples {
                corridor.push(paths.sample_point(path, i as f32 / samples as f32));
            }
        }
        Self { config, corridor }
    }

    pub fn config(&self) -> &ForestConfig {
        &self.config
    }

    /// Sampled path points placement keeps clear of.
    pub fn corridor(&self) -> &[Vec3] {
        &self.corridor
    }

    /// True if the cell center is at least `path_margin` from every corridor point.
    pub fn is_clear_of_paths(&self, x: i32, z: i32) -> bool {
        let center = Vec3::new(x as f32, 0.0, z as f32);
        self.corridor
            .iter()
            .all(|p| center.distance(*p) >= self.config.path_margin)
    }

    /// Lattice cells in scan order: x outer, z inner.
    pub fn cells(&self) -> impl Iterator<Item = IVec2> + '_ {
        let step = self.config.elem_spacing.max(1) as usize;
        let half_x = self.config.forest_x / 2;
        let half_z = self.config.forest_z / 2;
        (-half_x..half_x)
            .step_by(step)
            .flat_map(move |x| (-half_z..half_z).step_by(step).map(move |z| IVec2::new(x, z)))
    }

    /// Populate `world` with props, returning how many were placed.
    ///
    /// Intended to run once per world; calling it again adds a second layer.
    pub fn generate(&self, world: &mut GardenWorld, rng: &mut dyn GardenRng) -> usize {
        let jitter = self.config.elem_spacing as f32 / 4.0;
        let mut placed = 0;

        for cell in self.cells() {
            for category in &self.config.categories {
                // Gate is rolled first; the corridor test only runs when it passes
                if !(category.can_place(rng) && self.is_clear_of_paths(cell.x, cell.y)) {
                    continue;
                }

                let offset = Vec3::new(
                    rng.next_float_range(-jitter, jitter),
                    0.0,
                    rng.next_float_range(-jitter, jitter),
                );
                let tilt_x = rng.next_float_range(0.0, 5.0);
                let yaw = rng.next_float_range(0.0, 360.0);
                let tilt_z = rng.next_float_range(0.0, 5.0);
                let scale = rng.next_float_range(0.75, 2.0);
                let prefab = category.pick_prefab(rng).to_string();

                world.instantiate_prop(ForestProp {
                    category: category.name.clone(),
                    prefab,
                    cell,
                    position: Vec3::new(cell.x as f32, 0.0, cell.y as f32) + offset,
                    rotation: Quat::from_euler(
                        EulerRot::YXZ,
                        yaw.to_radians(),
                        tilt_x.to_radians(),
                        tilt_z.to_radians(),
                    ),
                    scale,
                    tier: category.culling_tier(),
                    active: true,
                });
                placed += 1;
                break;
            }
        }

        info!(
            "Placed {} forest props ({} corridor samples)",
            placed,
            self.corridor.len()
        );
        placed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::PathSet;
    use crate::rng::StdRandom;

    /// Returns the same integer and float forever.
    struct FixedRng {
        int: i32,
        float: f32,
    }

    impl GardenRng for FixedRng {
        fn next_int_range(&mut self, min: i32, max: i32) -> i32 {
            self.int.clamp(min, max - 1)
        }

        fn next_float(&mut self) -> f32 {
            self.float
        }
    }

    fn small_config(categories: Vec<ElementCategory>) -> ForestConfig {
        ForestConfig {
            forest_x: 48,
            forest_z: 48,
            elem_spacing: 12,
            categories,
            ..ForestConfig::default()
        }
    }

    fn empty_world() -> GardenWorld {
        GardenWorld::new(Vec::new(), Vec::new(), 50.0)
    }

    #[test]
    fn test_corridor_samples_per_path() {
        let paths = PathSet::from_points(&[
            vec![[0.0, 0.0, 0.0], [10.0, 0.0, 0.0]],
            vec![[0.0, 0.0, 0.0], [0.0, 0.0, 10.0]],
        ]);
        let placer = ForestPlacer::new(ForestConfig::default(), &paths);
        assert_eq!(placer.corridor().len(), 200);
        // t = 0.99 is the last sample, short of the path end
        assert!(placer.corridor()[99].distance(Vec3::new(9.9, 0.0, 0.0)) < 1e-3);
    }

    #[test]
    fn test_lattice_scan_order_and_extent() {
        let placer = ForestPlacer::new(small_config(Vec::new()), &PathSet::default());
        let cells: Vec<IVec2> = placer.cells().collect();
        assert_eq!(cells.len(), 16);
        assert_eq!(cells[0], IVec2::new(-24, -24));
        assert_eq!(cells[1], IVec2::new(-24, -12));
        assert_eq!(cells[15], IVec2::new(12, 12));
    }

    #[test]
    fn test_no_categories_places_nothing() {
        let placer = ForestPlacer::new(small_config(Vec::new()), &PathSet::default());
        let mut world = empty_world();
        assert_eq!(placer.generate(&mut world, &mut StdRandom::from_seed(1)), 0);
        assert!(world.props().is_empty());
    }

    #[test]
    fn test_full_density_fills_every_cell_with_first_category() {
        let placer = ForestPlacer::new(
            small_config(vec![
                ElementCategory::new("Trees", &["tree.glb"], 10),
                ElementCategory::new("Bushes", &["bush.glb"], 10),
            ]),
            &PathSet::default(),
        );
        let mut world = empty_world();
        let placed = placer.generate(&mut world, &mut StdRandom::from_seed(3));

        assert_eq!(placed, 16);
        assert!(world.props().iter().all(|p| p.category == "Trees"));
        assert!(world.props().iter().all(|p| p.tier == CullingTier::Far));
    }

    #[test]
    fn test_failed_gate_falls_through_to_next_category() {
        // Gate roll of 5: density 3 fails, density 6 passes
        let placer = ForestPlacer::new(
            small_config(vec![
                ElementCategory::new("Trees", &["tree.glb"], 3),
                ElementCategory::new("Bushes", &["bush.glb"], 6),
            ]),
            &PathSet::default(),
        );
        let mut world = empty_world();
        let mut rng = FixedRng { int: 5, float: 0.5 };
        placer.generate(&mut world, &mut rng);

        assert_eq!(world.props().len(), 16);
        let prop = &world.props()[0];
        assert_eq!(prop.category, "Bushes");
        assert_eq!(prop.tier, CullingTier::Near);
        // float 0.5 lands every range on its midpoint
        assert!((prop.scale - 1.375).abs() < 1e-5);
        assert!(prop.position.distance(Vec3::new(-24.0, 0.0, -24.0)) < 1e-5);
    }

    #[test]
    fn test_one_prop_per_cell() {
        let placer = ForestPlacer::new(
            small_config(vec![
                ElementCategory::new("Trees", &["tree.glb"], 5),
                ElementCategory::new("SilentSculptures", &["arch.glb"], 5),
                ElementCategory::new("Bushes", &["bush.glb"], 5),
            ]),
            &PathSet::default(),
        );
        let mut world = empty_world();
        placer.generate(&mut world, &mut StdRandom::from_seed(11));

        let mut cells: Vec<IVec2> = world.props().iter().map(|p| p.cell).collect();
        let total = cells.len();
        cells.sort_by_key(|c| (c.x, c.y));
        cells.dedup();
        assert_eq!(cells.len(), total);
    }

    #[test]
    fn test_placement_respects_path_margin() {
        let config = ForestConfig {
            categories: vec![ElementCategory::new("Trees", &["tree.glb"], 10)],
            ..ForestConfig::default()
        };
        let paths = PathSet::from_points(&[vec![[0.0, 0.0, -275.0], [0.0, 0.0, 275.0]]]);
        let placer = ForestPlacer::new(config, &paths);
        let mut world = empty_world();
        placer.generate(&mut world, &mut StdRandom::from_seed(9));

        assert!(!world.props().is_empty());
        for prop in world.props() {
            let center = Vec3::new(prop.cell.x as f32, 0.0, prop.cell.y as f32);
            for point in placer.corridor() {
                assert!(center.distance(*point) >= 20.0);
            }
        }
        // Every cell clear of the path got a tree at density 10
        let clear = placer
            .cells()
            .filter(|c| placer.is_clear_of_paths(c.x, c.y))
            .count();
        assert_eq!(world.props().len(), clear);
    }

    #[test]
    fn test_props_stay_within_jitter_and_scale_ranges() {
        let placer = ForestPlacer::new(
            small_config(vec![ElementCategory::new("Trees", &["a.glb", "b.glb"], 10)]),
            &PathSet::default(),
        );
        let mut world = empty_world();
        placer.generate(&mut world, &mut StdRandom::from_seed(21));

        for prop in world.props() {
            let center = Vec3::new(prop.cell.x as f32, 0.0, prop.cell.y as f32);
            let offset = prop.position - center;
            assert!(offset.x.abs() <= 3.0 && offset.z.abs() <= 3.0);
            assert_eq!(offset.y, 0.0);
            assert!(prop.scale >= 0.75 && prop.scale < 2.0);
            assert!(prop.prefab == "a.glb" || prop.prefab == "b.glb");
        }
    }

    #[test]
    fn test_same_seed_same_forest() {
        let config = small_config(vec![
            ElementCategory::new("Trees", &["a.glb", "b.glb"], 4),
            ElementCategory::new("Bushes", &["c.glb"], 6),
        ]);
        let placer = ForestPlacer::new(config, &PathSet::default());

        let mut first = empty_world();
        let mut second = empty_world();
        placer.generate(&mut first, &mut StdRandom::from_seed(77));
        placer.generate(&mut second, &mut StdRandom::from_seed(77));
        assert_eq!(first.props(), second.props());
    }

    #[test]
    fn test_cull_distance_depends_on_tier() {
        let config = ForestConfig::default();
        assert_eq!(config.cull_distance(CullingTier::Near), 200.0);
        assert_eq!(config.cull_distance(CullingTier::Far), 350.0);

        let bushes = ElementCategory::new("Bushes", &["bush.glb"], 6);
        let trees = ElementCategory::new("Trees", &["tree.glb"], 5);
        assert_eq!(config.cull_distance(bushes.culling_tier()), 200.0);
        assert_eq!(config.cull_distance(trees.culling_tier()), 350.0);
    }

    #[test]
    fn test_explicit_tier_overrides_name() {
        let mut category = ElementCategory::new("Bushes", &["bush.glb"], 5);
        assert_eq!(category.culling_tier(), CullingTier::Near);
        category.tier = Some(CullingTier::Far);
        assert_eq!(category.culling_tier(), CullingTier::Far);
    }

    #[test]
    #[should_panic(expected = "has no prefabs")]
    fn test_empty_prefab_list_panics_when_chosen() {
        let category = ElementCategory::new("Trees", &[], 10);
        category.pick_prefab(&mut StdRandom::from_seed(1));
    }
}
