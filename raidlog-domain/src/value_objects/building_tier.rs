// Building tier value object

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildingTier {
    Twigs,
    Wood,
    Stone,
    Metal,
    TopTier,
}

impl BuildingTier {
    /// Suffix appended to a structure short name ("wall.stone").
    pub fn suffix(&self) -> &'static str {
        match self {
            BuildingTier::Twigs => "twigs",
            BuildingTier::Wood => "wood",
            BuildingTier::Stone => "stone",
            BuildingTier::Metal => "metal",
            BuildingTier::TopTier => "toptier",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            BuildingTier::Twigs => "Twig",
            BuildingTier::Wood => "Wood",
            BuildingTier::Stone => "Stone",
            BuildingTier::Metal => "Metal",
            BuildingTier::TopTier => "HQM",
        }
    }

    pub fn all() -> [BuildingTier; 5] {
        [
            BuildingTier::Twigs,
            BuildingTier::Wood,
            BuildingTier::Stone,
            BuildingTier::Metal,
            BuildingTier::TopTier,
        ]
    }

    pub fn from_suffix(value: &str) -> Option<Self> {
        let lower = value.trim().to_lowercase();
        BuildingTier::all()
            .into_iter()
            .find(|tier| tier.suffix() == lower)
    }
}
