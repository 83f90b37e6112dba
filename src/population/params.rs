//! Per-category population parameters.

use glam::IVec2;

use crate::terrain::material::SurfaceMaterial;

/// Content category, in fixed placement order.
///
/// The three categories generate as independent parallel jobs, but their
/// placement passes always run in this order so cross-category cell
/// suppression is reproducible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Trees,
    Pickups,
    Deposits,
}

impl Category {
    /// All categories, in placement order.
    pub const ALL: [Category; 3] = [Category::Trees, Category::Pickups, Category::Deposits];

    /// Index into placement-ordered arrays.
    pub fn index(self) -> usize {
        match self {
            Category::Trees => 0,
            Category::Pickups => 1,
            Category::Deposits => 2,
        }
    }

    /// Category-specific salt mixed into the cell hash.
    ///
    /// Large primes, as used by integer-hash noise implementations, so the
    /// three categories draw independent cell sets from the same seed.
    pub fn salt(self) -> u64 {
        match self {
            Category::Trees => 198_491_317,
            Category::Pickups => 6_542_989,
            Category::Deposits => 357_239,
        }
    }

    /// Upper bound on the density parameter, bounding worst-case object
    /// counts per chunk.
    pub fn max_density(self) -> f32 {
        match self {
            Category::Trees => 0.5,
            Category::Pickups => 0.5,
            Category::Deposits => 0.001,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Category::Trees => "trees",
            Category::Pickups => "pickups",
            Category::Deposits => "deposits",
        }
    }
}

/// Density and placement parameters for one content category.
#[derive(Clone, Debug)]
pub struct CategoryParams {
    /// Whether this category generates at all.
    pub enabled: bool,
    /// Probability that a cell is active, in [0, 1]. Clamped to the
    /// category maximum before use.
    pub density: f32,
    /// 2D offset added to the world cell coordinate before hashing.
    pub offset: IVec2,
    /// Object id handed to the placement collaborator for accepted cells.
    pub object_id: String,
    /// Materials this category may be placed on.
    pub allowed: Vec<SurfaceMaterial>,
}

impl CategoryParams {
    /// Density after clamping to the category maximum and [0, 1].
    pub fn clamped_density(&self, category: Category) -> f32 {
        self.density.clamp(0.0, category.max_density())
    }
}

/// The full per-chunk population parameter set.
#[derive(Clone, Debug)]
pub struct PopulationParams {
    pub trees: CategoryParams,
    pub pickups: CategoryParams,
    pub deposits: CategoryParams,
}

impl Default for PopulationParams {
    fn default() -> Self {
        Self {
            trees: CategoryParams {
                enabled: true,
                density: 0.02,
                offset: IVec2::ZERO,
                object_id: "oak_tree".to_string(),
                allowed: vec![SurfaceMaterial::Grass],
            },
            pickups: CategoryParams {
                enabled: true,
                density: 0.008,
                offset: IVec2::ZERO,
                object_id: "flint_pickup".to_string(),
                allowed: vec![
                    SurfaceMaterial::Grass,
                    SurfaceMaterial::Dirt,
                    SurfaceMaterial::Sand,
                ],
            },
            deposits: CategoryParams {
                enabled: true,
                density: 0.0005,
                offset: IVec2::ZERO,
                object_id: "iron_deposit".to_string(),
                allowed: vec![SurfaceMaterial::Rock, SurfaceMaterial::Dirt],
            },
        }
    }
}

impl PopulationParams {
    pub fn get(&self, category: Category) -> &CategoryParams {
        match category {
            Category::Trees => &self.trees,
            Category::Pickups => &self.pickups,
            Category::Deposits => &self.deposits,
        }
    }

    pub fn get_mut(&mut self, category: Category) -> &mut CategoryParams {
        match category {
            Category::Trees => &mut self.trees,
            Category::Pickups => &mut self.pickups,
            Category::Deposits => &mut self.deposits,
        }
    }
}
