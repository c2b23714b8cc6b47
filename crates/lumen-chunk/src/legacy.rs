//! Pre-palette block IDs and their modern block states.
//!
//! Old sub chunk versions store an 8-bit block ID plus a 4-bit data value per
//! voxel, and early palettes store `{name, val}` pairs. Both are resolved
//! through a static table covering the common terrain blocks; anything else
//! decodes as air.

use rustc_hash::FxHashMap;

use crate::registry::{BlockRegistry, BlockState, PropertyValue};

/// How a legacy data value maps onto block state properties.
#[derive(Clone, Copy, Debug)]
enum MetaRule {
    /// Data value is ignored.
    Plain,
    /// Data value selects a string variant; unknown values use the first.
    Variant(&'static str, &'static [&'static str]),
    /// Data value, masked, is an integer property.
    Int(&'static str, u8),
    /// Lowest bit is a boolean property.
    Bit(&'static str),
    /// Low two bits select a wood type, the next two the pillar axis.
    Log(&'static str),
    /// Low two bits select a wood type, then persistent and update bits.
    Leaves(&'static str),
}

const WOOD: &[&str] = &["oak", "spruce", "birch", "jungle", "acacia", "dark_oak"];

#[rustfmt::skip]
const LEGACY_BLOCKS: &[(u8, &str, MetaRule)] = &[
    (0, "air", MetaRule::Plain),
    (1, "stone", MetaRule::Variant("stone_type", &[
        "stone", "granite", "granite_smooth", "diorite", "diorite_smooth", "andesite",
        "andesite_smooth",
    ])),
    (2, "grass", MetaRule::Plain),
    (3, "dirt", MetaRule::Variant("dirt_type", &["normal", "coarse"])),
    (4, "cobblestone", MetaRule::Plain),
    (5, "planks", MetaRule::Variant("wood_type", WOOD)),
    (7, "bedrock", MetaRule::Bit("infiniburn_bit")),
    (8, "flowing_water", MetaRule::Int("liquid_depth", 15)),
    (9, "water", MetaRule::Int("liquid_depth", 15)),
    (10, "flowing_lava", MetaRule::Int("liquid_depth", 15)),
    (11, "lava", MetaRule::Int("liquid_depth", 15)),
    (12, "sand", MetaRule::Variant("sand_type", &["normal", "red"])),
    (13, "gravel", MetaRule::Plain),
    (14, "gold_ore", MetaRule::Plain),
    (15, "iron_ore", MetaRule::Plain),
    (16, "coal_ore", MetaRule::Plain),
    (17, "log", MetaRule::Log("old_log_type")),
    (18, "leaves", MetaRule::Leaves("old_leaf_type")),
    (20, "glass", MetaRule::Plain),
    (24, "sandstone", MetaRule::Variant("sand_stone_type", &[
        "default", "heiroglyphs", "cut", "smooth",
    ])),
    (31, "tallgrass", MetaRule::Variant("tall_grass_type", &["default", "tall", "fern", "snow"])),
    (50, "torch", MetaRule::Variant("torch_facing_direction", &[
        "unknown", "west", "east", "north", "south", "top",
    ])),
    (78, "snow_layer", MetaRule::Int("height", 7)),
    (79, "ice", MetaRule::Plain),
    (80, "snow", MetaRule::Plain),
    (89, "glowstone", MetaRule::Plain),
];

fn state_for(name: &str, rule: MetaRule, meta: u8) -> BlockState {
    let state = BlockState::new(format!("minecraft:{name}"));
    let string = |s: &str| PropertyValue::String(s.to_string());
    match rule {
        MetaRule::Plain => state,
        MetaRule::Variant(key, values) => {
            let value = values.get(usize::from(meta)).unwrap_or(&values[0]);
            state.with(key, string(value))
        }
        MetaRule::Int(key, mask) => state.with(key, PropertyValue::Int(i32::from(meta & mask))),
        MetaRule::Bit(key) => state.with(key, PropertyValue::Byte(meta & 1)),
        MetaRule::Log(key) => {
            let axis = ["y", "x", "z", "y"][usize::from((meta >> 2) & 3)];
            state
                .with(key, string(WOOD[usize::from(meta & 3)]))
                .with("pillar_axis", string(axis))
        }
        MetaRule::Leaves(key) => state
            .with(key, string(WOOD[usize::from(meta & 3)]))
            .with("persistent_bit", PropertyValue::Byte((meta >> 2) & 1))
            .with("update_bit", PropertyValue::Byte((meta >> 3) & 1)),
    }
}

/// The modern state for a legacy block ID and data value.
pub fn legacy_state(id: u8, meta: u8) -> Option<BlockState> {
    LEGACY_BLOCKS
        .iter()
        .find(|(legacy_id, _, _)| *legacy_id == id)
        .map(|&(_, name, rule)| state_for(name, rule, meta & 15))
}

/// The modern state for a `{name, val}` palette entry.
///
/// `name` may carry the `minecraft:` namespace.
pub fn legacy_state_by_name(name: &str, val: i16) -> Option<BlockState> {
    let short = name.strip_prefix("minecraft:").unwrap_or(name);
    let meta = u8::try_from(val).unwrap_or(0);
    LEGACY_BLOCKS
        .iter()
        .find(|(_, legacy_name, _)| *legacy_name == short)
        .map(|&(_, name, rule)| state_for(name, rule, meta & 15))
}

/// Resolves legacy `(id, meta)` pairs to runtime IDs, caching each pair.
pub struct LegacyResolver {
    cache: FxHashMap<(u8, u8), u32>,
}

impl LegacyResolver {
    pub fn new() -> Self {
        Self {
            cache: FxHashMap::default(),
        }
    }

    /// Runtime ID for a legacy voxel. Unknown blocks resolve to air with a
    /// warning, logged once per pair.
    pub fn resolve(&mut self, id: u8, meta: u8, registry: &(impl BlockRegistry + ?Sized)) -> u32 {
        let meta = meta & 15;
        if let Some(&rid) = self.cache.get(&(id, meta)) {
            return rid;
        }
        let rid = match legacy_state(id, meta).and_then(|state| registry.runtime_id(&state)) {
            Some(rid) => rid,
            None => {
                tracing::warn!(id, meta, "unknown legacy block, using air");
                registry.air()
            }
        };
        self.cache.insert((id, meta), rid);
        rid
    }
}

impl Default for LegacyResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{BlockDef, BlockTable};

    #[test]
    fn test_stone_variants() {
        let granite = legacy_state(1, 1).unwrap();
        assert_eq!(granite.name, "minecraft:stone");
        assert_eq!(
            granite.properties.get("stone_type"),
            Some(&PropertyValue::String("granite".into()))
        );
        // Out-of-table data values fall back to the first variant.
        let fallback = legacy_state(1, 12).unwrap();
        assert_eq!(
            fallback.properties.get("stone_type"),
            Some(&PropertyValue::String("stone".into()))
        );
    }

    #[test]
    fn test_log_axis_and_type() {
        let log = legacy_state(17, 0b0110).unwrap();
        assert_eq!(
            log.properties.get("old_log_type"),
            Some(&PropertyValue::String("birch".into()))
        );
        assert_eq!(
            log.properties.get("pillar_axis"),
            Some(&PropertyValue::String("x".into()))
        );
    }

    #[test]
    fn test_by_name_matches_by_id() {
        assert_eq!(legacy_state_by_name("minecraft:water", 3), legacy_state(9, 3));
        assert_eq!(legacy_state_by_name("dirt", 1), legacy_state(3, 1));
        assert!(legacy_state_by_name("minecraft:not_a_block", 0).is_none());
    }

    #[test]
    fn test_unknown_id() {
        assert!(legacy_state(250, 0).is_none());
    }

    #[test]
    fn test_resolver_maps_unknown_to_air_and_caches() {
        let mut table = BlockTable::new();
        let grass = table
            .register(BlockDef::opaque(BlockState::new("minecraft:grass")))
            .unwrap();
        let mut resolver = LegacyResolver::new();
        assert_eq!(resolver.resolve(2, 0, &table), grass);
        assert_eq!(resolver.resolve(2, 0, &table), grass);
        assert_eq!(resolver.resolve(250, 3, &table), table.air());
        assert_eq!(resolver.cache.len(), 2);
    }
}
