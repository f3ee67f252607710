//! Immutable balance catalog: unit, terrain, and building stat tables.
//!
//! Loaded once into the binary as `'static` data and treated as read-only
//! configuration, never as part of the mutable battle state.

use crate::{BuildingKind, MoveClass, UnitKind};

/// Attack and defence gained per level.
pub const PER_LEVEL_BONUS: i32 = 2;
/// Flat attack and defence penalty while a unit is poisoned.
pub const POISON_COMBAT_PENALTY: i32 = 10;
/// Movement points lost while a unit is poisoned.
pub const POISON_MOVE_PENALTY: i32 = 1;
/// Attack bonus for flow attackers against defenders standing on water.
pub const WATER_ATTACK_BONUS: i32 = 10;
/// Defence bonus for flow defenders standing on water.
pub const WATER_DEFENCE_BONUS: i32 = 15;
/// Defence bonus granted by standing on any building.
pub const BUILDING_DEFENCE_BONUS: i32 = 15;
/// Attack bonus radiated by a wisp aura. Reserved; never applied yet.
pub const WISP_AURA_BONUS: i32 = 10;
/// Experience thresholds; the index of the highest entry crossed, minus one,
/// is the unit's level.
pub const LEVEL_THRESHOLDS: [u32; 10] = [0, 84, 172, 265, 362, 464, 571, 684, 802, 926];
/// Surcharge added to a commander's price per prior death.
pub const COMMANDER_SURCHARGE: u32 = 200;
/// Health every unit starts and respawns with.
pub const DEFAULT_HEALTH: u32 = 100;
/// Turns a grave stays on the board before crumbling.
pub const GRAVE_TTL: u32 = 2;

/// The four playable commander characters.
pub const COMMANDER_CHARACTERS: [UnitKind; 4] = [
    UnitKind::Galamar,
    UnitKind::Valadorn,
    UnitKind::DemonLord,
    UnitKind::Saeth,
];

/// Every unit prototype, in catalog order.
pub const ALL_UNIT_KINDS: [UnitKind; 16] = [
    UnitKind::Galamar,
    UnitKind::Valadorn,
    UnitKind::DemonLord,
    UnitKind::Saeth,
    UnitKind::SaethHeavensFury,
    UnitKind::Soldier,
    UnitKind::Archer,
    UnitKind::Elemental,
    UnitKind::Sorceress,
    UnitKind::Wisp,
    UnitKind::DireWolf,
    UnitKind::Golem,
    UnitKind::Catapult,
    UnitKind::Dragon,
    UnitKind::Skeleton,
    UnitKind::Crystal,
];

/// Inclusive attack range of a unit, either a plain radius or a band whose
/// lower bound keeps ranged-only units from striking adjacent cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AttackRange {
    /// Minimum axis offset a target must clear.
    pub min: u32,
    /// Maximum reachable distance.
    pub max: u32,
}

impl AttackRange {
    /// Plain radius with no minimum.
    #[must_use]
    pub const fn radius(max: u32) -> Self {
        Self { min: 0, max }
    }

    /// Banded range excluding close cells.
    #[must_use]
    pub const fn band(min: u32, max: u32) -> Self {
        Self { min, max }
    }
}

/// Fixed-shape stat record backing one unit prototype.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UnitStats {
    /// Display name.
    pub name: &'static str,
    /// Flavour line shown in the store.
    pub description: &'static str,
    /// Lower bound of the attack roll.
    pub atk_min: u32,
    /// Upper bound of the attack roll.
    pub atk_max: u32,
    /// Attack range.
    pub range: AttackRange,
    /// Base defence.
    pub def: i32,
    /// Movement points per turn.
    pub mov: u32,
    /// Movement class.
    pub move_class: MoveClass,
    /// Whether the unit can repair destroyed buildings.
    pub can_fix: bool,
    /// Building kinds the unit can occupy.
    pub occupies: &'static [BuildingKind],
    /// Extra attack against flying defenders.
    pub bonus_vs_fly: i32,
    /// Extra attack against skeletons.
    pub bonus_vs_skeleton: i32,
    /// Radius of the raise-skeleton action; zero disables it.
    pub raise_range: u32,
    /// Radius of the attack aura; zero disables it. Reserved.
    pub aura_range: u32,
    /// Turns a surviving defender stays poisoned; zero disables it.
    pub poison_period: u32,
    /// Whether moving forbids any further action this turn.
    pub cannot_act_after_move: bool,
    /// Whether the unit can demolish buildings.
    pub can_destroy_building: bool,
    /// Declared in the source material but never consulted at death time.
    pub without_grave: bool,
    /// Whether the store may ever offer the unit.
    pub purchasable: bool,
    /// Price in gold; zero means the unit is never sold.
    pub cost: u32,
}

const BASELINE: UnitStats = UnitStats {
    name: "",
    description: "",
    atk_min: 0,
    atk_max: 0,
    range: AttackRange::radius(0),
    def: 0,
    mov: 0,
    move_class: MoveClass::Ground,
    can_fix: false,
    occupies: &[],
    bonus_vs_fly: 0,
    bonus_vs_skeleton: 0,
    raise_range: 0,
    aura_range: 0,
    poison_period: 0,
    cannot_act_after_move: false,
    can_destroy_building: false,
    without_grave: false,
    purchasable: true,
    cost: 0,
};

const COMMANDER_BASELINE: UnitStats = UnitStats {
    atk_min: 55,
    atk_max: 65,
    range: AttackRange::radius(1),
    def: 20,
    mov: 4,
    can_fix: true,
    occupies: &[BuildingKind::Farm, BuildingKind::Castle],
    without_grave: true,
    cost: 200,
    ..BASELINE
};

const GALAMAR: UnitStats = UnitStats {
    name: "Galamar",
    description: "Young protector of the northern alliance.",
    ..COMMANDER_BASELINE
};

const VALADORN: UnitStats = UnitStats {
    name: "Valadorn",
    description: "Stern warden of the southern marches.",
    ..COMMANDER_BASELINE
};

const DEMON_LORD: UnitStats = UnitStats {
    name: "Demon Lord",
    description: "Commands the horde from the front line.",
    ..COMMANDER_BASELINE
};

const SAETH: UnitStats = UnitStats {
    name: "Saeth",
    description: "Fallen champion of a broken empire.",
    ..COMMANDER_BASELINE
};

const SAETH_HEAVENS_FURY: UnitStats = UnitStats {
    name: "Heaven's Fury",
    description: "Saeth's wrath made manifest.",
    atk_min: 55,
    atk_max: 65,
    range: AttackRange::radius(15),
    def: 45,
    mov: 0,
    purchasable: false,
    ..BASELINE
};

const SOLDIER: UnitStats = UnitStats {
    name: "Soldier",
    description: "Levied infantry; repairs and works farms.",
    atk_min: 50,
    atk_max: 55,
    range: AttackRange::radius(1),
    def: 5,
    mov: 4,
    can_fix: true,
    occupies: &[BuildingKind::Farm],
    cost: 150,
    ..BASELINE
};

const ARCHER: UnitStats = UnitStats {
    name: "Archer",
    description: "Shoots two cells far; deadly against wings.",
    atk_min: 50,
    atk_max: 55,
    range: AttackRange::radius(2),
    def: 5,
    mov: 4,
    bonus_vs_fly: 30,
    cost: 250,
    ..BASELINE
};

const ELEMENTAL: UnitStats = UnitStats {
    name: "Elemental",
    description: "Glides over water faster than any boat.",
    atk_min: 50,
    atk_max: 55,
    range: AttackRange::radius(1),
    def: 10,
    mov: 4,
    move_class: MoveClass::Flow,
    cost: 300,
    ..BASELINE
};

const SORCERESS: UnitStats = UnitStats {
    name: "Sorceress",
    description: "Raises the fallen back into service.",
    atk_min: 40,
    atk_max: 45,
    range: AttackRange::radius(1),
    def: 5,
    mov: 4,
    raise_range: 2,
    cost: 400,
    ..BASELINE
};

const WISP: UnitStats = UnitStats {
    name: "Wisp",
    description: "Its light scatters the walking dead.",
    atk_min: 35,
    atk_max: 40,
    range: AttackRange::radius(1),
    def: 10,
    mov: 4,
    bonus_vs_skeleton: 30,
    aura_range: 3,
    cost: 500,
    ..BASELINE
};

const DIRE_WOLF: UnitStats = UnitStats {
    name: "Dire Wolf",
    description: "Poisons whatever survives its bite.",
    atk_min: 60,
    atk_max: 65,
    range: AttackRange::radius(1),
    def: 15,
    mov: 5,
    poison_period: 2,
    cost: 600,
    ..BASELINE
};

const GOLEM: UnitStats = UnitStats {
    name: "Golem",
    description: "Walking rampart, slow and implacable.",
    atk_min: 60,
    atk_max: 70,
    range: AttackRange::radius(1),
    def: 30,
    mov: 4,
    cost: 600,
    ..BASELINE
};

const CATAPULT: UnitStats = UnitStats {
    name: "Catapult",
    description: "Levels buildings from a safe distance.",
    atk_min: 50,
    atk_max: 70,
    range: AttackRange::band(2, 4),
    def: 10,
    mov: 3,
    cannot_act_after_move: true,
    can_destroy_building: true,
    cost: 700,
    ..BASELINE
};

const DRAGON: UnitStats = UnitStats {
    name: "Dragon",
    description: "Ignores the ground it soars above.",
    atk_min: 70,
    atk_max: 80,
    range: AttackRange::radius(1),
    def: 25,
    mov: 6,
    move_class: MoveClass::Fly,
    cost: 1000,
    ..BASELINE
};

const SKELETON: UnitStats = UnitStats {
    name: "Skeleton",
    description: "Bone and spite, freshly raised.",
    atk_min: 40,
    atk_max: 50,
    range: AttackRange::radius(1),
    def: 2,
    mov: 4,
    without_grave: true,
    cost: 0,
    ..BASELINE
};

const CRYSTAL: UnitStats = UnitStats {
    name: "Crystal",
    description: "A prize that must be carried, not fought.",
    atk_min: 0,
    atk_max: 0,
    range: AttackRange::radius(0),
    def: 15,
    mov: 3,
    cost: 0,
    ..BASELINE
};

impl UnitKind {
    /// Stat record backing the prototype.
    #[must_use]
    pub const fn stats(self) -> &'static UnitStats {
        match self {
            Self::Galamar => &GALAMAR,
            Self::Valadorn => &VALADORN,
            Self::DemonLord => &DEMON_LORD,
            Self::Saeth => &SAETH,
            Self::SaethHeavensFury => &SAETH_HEAVENS_FURY,
            Self::Soldier => &SOLDIER,
            Self::Archer => &ARCHER,
            Self::Elemental => &ELEMENTAL,
            Self::Sorceress => &SORCERESS,
            Self::Wisp => &WISP,
            Self::DireWolf => &DIRE_WOLF,
            Self::Golem => &GOLEM,
            Self::Catapult => &CATAPULT,
            Self::Dragon => &DRAGON,
            Self::Skeleton => &SKELETON,
            Self::Crystal => &CRYSTAL,
        }
    }

    /// Whether the prototype is one of the four commander characters.
    #[must_use]
    pub fn is_commander_character(self) -> bool {
        COMMANDER_CHARACTERS.contains(&self)
    }
}

/// Base terrain kinds; visual `-N` variants share the base stats.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum TerrainKind {
    /// Open plains.
    Terra,
    /// Paved road.
    Road,
    /// Bridge over water.
    Bridge,
    /// Rolling hills.
    Hill,
    /// Dense woods.
    Forest,
    /// Bare rock.
    Stone,
    /// Open water.
    Water,
}

/// Fixed-shape stat record backing one terrain kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TerrainStats {
    /// Movement-point cost to enter the cell on foot.
    pub path_resistance: i32,
    /// Cheaper cost paid by flow movers; `None` where flow gains nothing.
    pub flow_path_resistance: Option<i32>,
    /// Defence bonus granted to a defender standing here.
    pub defence: i32,
}

impl TerrainKind {
    /// Parses a raw map tile name, stripping any `-N` visual variant suffix.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        let base = match name.rsplit_once('-') {
            Some((head, tail)) if !tail.is_empty() && tail.bytes().all(|b| b.is_ascii_digit()) => {
                head
            }
            _ => name,
        };
        match base {
            "terra" => Some(Self::Terra),
            "road" => Some(Self::Road),
            "bridge" => Some(Self::Bridge),
            "hill" => Some(Self::Hill),
            "forest" => Some(Self::Forest),
            "stone" => Some(Self::Stone),
            "water" => Some(Self::Water),
            _ => None,
        }
    }

    /// Stat record backing the terrain kind.
    #[must_use]
    pub const fn stats(self) -> TerrainStats {
        match self {
            Self::Terra => TerrainStats {
                path_resistance: 1,
                flow_path_resistance: None,
                defence: 5,
            },
            Self::Road | Self::Bridge => TerrainStats {
                path_resistance: 1,
                flow_path_resistance: None,
                defence: 0,
            },
            Self::Hill | Self::Forest => TerrainStats {
                path_resistance: 2,
                flow_path_resistance: None,
                defence: 10,
            },
            Self::Stone => TerrainStats {
                path_resistance: 3,
                flow_path_resistance: None,
                defence: 15,
            },
            Self::Water => TerrainStats {
                path_resistance: 3,
                flow_path_resistance: Some(1),
                defence: 0,
            },
        }
    }
}

/// Fixed-shape stat record backing one building kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BuildingStats {
    /// Income earned per turn while owned.
    pub earn: u32,
    /// Health restored per turn to a garrisoned unit.
    pub heal: u32,
    /// Whether the building heals even while unowned.
    pub heals_neutral: bool,
    /// Whether the building sells units when clicked.
    pub sells_units: bool,
    /// Whether a siege unit can knock the building into the destroyed state.
    pub destroyable: bool,
}

impl BuildingKind {
    /// Stat record backing the building kind.
    #[must_use]
    pub const fn stats(self) -> BuildingStats {
        match self {
            Self::Castle => BuildingStats {
                earn: 200,
                heal: 20,
                heals_neutral: false,
                sells_units: true,
                destroyable: true,
            },
            Self::Farm => BuildingStats {
                earn: 100,
                heal: 15,
                heals_neutral: true,
                sells_units: false,
                destroyable: true,
            },
        }
    }
}

/// Level derived from an experience total.
#[must_use]
pub fn level_for_xp(xp: u32) -> u32 {
    let crossed = LEVEL_THRESHOLDS.partition_point(|threshold| *threshold < xp);
    crossed.saturating_sub(1) as u32
}
