//! Static block/item registry data.
//!
//! A code-generation pipeline normally builds these lookup tables at build
//! time from external PrismarineJS-style JSON dumps (`build.rs` reading
//! `data/minecraft/{blocks,items}`). Those source files aren't part of this
//! workspace, so the tables are hand-written here instead, covering only the
//! blocks/items this server's scenarios actually exercise. Function
//! signatures match the generated originals so call sites are unaffected.

/// Map block name to its default block state ID.
pub fn block_name_to_default_state(name: &str) -> Option<i32> {
    match name {
        "air" => Some(0),
        "stone" => Some(1),
        "grass_block" => Some(9),
        "dirt" => Some(10),
        "cobblestone" => Some(14),
        "gravel" => Some(118),
        "gold_ore" => Some(123),
        "iron_ore" => Some(125),
        "coal_ore" => Some(127),
        "lapis_ore" => Some(520),
        "diamond_ore" => Some(4274),
        "redstone_ore" => Some(5735),
        "emerald_ore" => Some(7511),
        "bedrock" => Some(79),
        "copper_ore" => Some(22942),
        _ => None,
    }
}

/// Map block state ID back to its registry name.
pub fn block_state_to_name(state_id: i32) -> Option<&'static str> {
    match state_id {
        0 => Some("air"),
        1 => Some("stone"),
        9 => Some("grass_block"),
        10 => Some("dirt"),
        14 => Some("cobblestone"),
        118 => Some("gravel"),
        123 => Some("gold_ore"),
        125 => Some("iron_ore"),
        127 => Some("coal_ore"),
        520 => Some("lapis_ore"),
        4274 => Some("diamond_ore"),
        5735 => Some("redstone_ore"),
        7511 => Some("emerald_ore"),
        79 => Some("bedrock"),
        22942 => Some("copper_ore"),
        _ => None,
    }
}

/// Map block state ID to (hardness, diggable). Hardness < 0 means
/// unbreakable; hardness == 0 means instant-break.
pub fn block_state_to_hardness(state_id: i32) -> Option<(f64, bool)> {
    match state_id {
        0 => Some((0.0, false)),     // air
        1 => Some((1.5, true)),      // stone
        9 => Some((0.6, true)),      // grass_block
        10 => Some((0.5, true)),     // dirt
        14 => Some((2.0, true)),     // cobblestone
        118 => Some((0.6, true)),    // gravel
        123 => Some((3.0, true)),    // gold_ore
        125 => Some((3.0, true)),    // iron_ore
        127 => Some((3.0, true)),    // coal_ore
        520 => Some((3.0, true)),    // lapis_ore
        4274 => Some((3.0, true)),   // diamond_ore
        5735 => Some((3.0, true)),   // redstone_ore
        7511 => Some((3.0, true)),   // emerald_ore
        79 => Some((-1.0, false)),   // bedrock
        22942 => Some((3.0, true)),  // copper_ore
        _ => None,
    }
}

/// Map block state ID to dropped item IDs.
pub fn block_state_to_drops(state_id: i32) -> &'static [i32] {
    match state_id {
        1 => &[35],     // stone -> cobblestone
        9 => &[28],     // grass_block -> dirt
        10 => &[28],    // dirt -> dirt
        14 => &[35],    // cobblestone -> cobblestone
        118 => &[38],   // gravel -> gravel
        123 => &[41],   // gold_ore -> raw_gold
        125 => &[42],   // iron_ore -> raw_iron
        127 => &[40],   // coal_ore -> coal
        520 => &[43],   // lapis_ore -> lapis_lazuli
        4274 => &[44],  // diamond_ore -> diamond
        5735 => &[45],  // redstone_ore -> redstone
        7511 => &[46],  // emerald_ore -> emerald
        22942 => &[47], // copper_ore -> raw_copper
        _ => &[],
    }
}

/// Map block state ID to required harvest tool item IDs (None = any tool, including bare hands, works).
pub fn block_state_to_harvest_tools(state_id: i32) -> Option<&'static [i32]> {
    match state_id {
        1 => Some(&PICKAXES),    // stone
        14 => Some(&PICKAXES),   // cobblestone
        123 => Some(&PICKAXES),  // gold_ore
        125 => Some(&PICKAXES),  // iron_ore
        127 => Some(&PICKAXES),  // coal_ore
        520 => Some(&PICKAXES),  // lapis_ore
        4274 => Some(&PICKAXES), // diamond_ore
        5735 => Some(&PICKAXES), // redstone_ore
        7511 => Some(&PICKAXES), // emerald_ore
        22942 => Some(&PICKAXES),// copper_ore
        _ => None,
    }
}

const PICKAXES: [i32; 6] = [820, 821, 822, 823, 824, 845];

/// Map item name to item registry ID.
pub fn item_name_to_id(name: &str) -> Option<i32> {
    match name {
        "air" => Some(0),
        "stone" => Some(1),
        "dirt" => Some(28),
        "cobblestone" => Some(35),
        "gravel" => Some(38),
        "coal" => Some(40),
        "gold_ore" => Some(41),
        "iron_ore" => Some(42),
        "lapis_lazuli" => Some(43),
        "diamond" => Some(44),
        "redstone" => Some(45),
        "emerald" => Some(46),
        "copper_ore" => Some(47),
        "wooden_pickaxe" => Some(820),
        "stone_pickaxe" => Some(821),
        "iron_pickaxe" => Some(822),
        "golden_pickaxe" => Some(823),
        "diamond_pickaxe" => Some(824),
        "netherite_pickaxe" => Some(845),
        _ => None,
    }
}

/// Map item ID to item name.
pub fn item_id_to_name(id: i32) -> Option<&'static str> {
    match id {
        0 => Some("air"),
        1 => Some("stone"),
        28 => Some("dirt"),
        35 => Some("cobblestone"),
        38 => Some("gravel"),
        40 => Some("coal"),
        41 => Some("gold_ore"),
        42 => Some("iron_ore"),
        43 => Some("lapis_lazuli"),
        44 => Some("diamond"),
        45 => Some("redstone"),
        46 => Some("emerald"),
        47 => Some("copper_ore"),
        820 => Some("wooden_pickaxe"),
        821 => Some("stone_pickaxe"),
        822 => Some("iron_pickaxe"),
        823 => Some("golden_pickaxe"),
        824 => Some("diamond_pickaxe"),
        845 => Some("netherite_pickaxe"),
        _ => None,
    }
}

/// Map item ID to max stack size.
pub fn item_id_to_stack_size(id: i32) -> Option<i32> {
    match id {
        0 => Some(0),
        820..=824 | 845 => Some(1),
        _ => Some(64),
    }
}

/// Map item ID to the default block state it places (if it's a block item).
pub fn item_id_to_block_state(item_id: i32) -> Option<i32> {
    match item_id {
        1 => Some(1),    // stone
        28 => Some(10),  // dirt
        35 => Some(14),  // cobblestone
        38 => Some(118), // gravel
        _ => None,
    }
}

/// Map a block state ID to the item ID representing it in an inventory (if any).
pub fn block_state_to_item_id(state_id: i32) -> Option<i32> {
    match state_id {
        1 => Some(1),
        10 => Some(28),
        14 => Some(35),
        118 => Some(38),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_lookups() {
        assert_eq!(block_name_to_default_state("air"), Some(0));
        assert_eq!(block_name_to_default_state("stone"), Some(1));
        assert_eq!(block_name_to_default_state("grass_block"), Some(9));
        assert_eq!(block_name_to_default_state("bedrock"), Some(79));
        assert_eq!(block_name_to_default_state("nonexistent"), None);
    }

    #[test]
    fn test_item_lookups() {
        assert_eq!(item_name_to_id("stone"), Some(1));
        assert_eq!(item_name_to_id("air"), Some(0));
        assert!(item_name_to_id("nonexistent").is_none());
    }

    #[test]
    fn test_item_to_block() {
        let stone_item = item_name_to_id("stone").unwrap();
        assert_eq!(item_id_to_block_state(stone_item), Some(1));
        let dirt_item = item_name_to_id("dirt").unwrap();
        assert_eq!(item_id_to_block_state(dirt_item), Some(10));
    }

    #[test]
    fn test_block_state_to_item() {
        let stone_item = block_state_to_item_id(1);
        assert!(stone_item.is_some());
    }

    #[test]
    fn test_item_id_to_name() {
        assert_eq!(item_id_to_name(1), Some("stone"));
        assert_eq!(item_id_to_name(0), Some("air"));
    }

    #[test]
    fn test_stack_size() {
        assert_eq!(item_id_to_stack_size(1), Some(64));
    }

    #[test]
    fn test_block_hardness() {
        assert_eq!(block_state_to_hardness(1), Some((1.5, true))); // stone
        assert_eq!(block_state_to_hardness(79), Some((-1.0, false))); // bedrock
        assert_eq!(block_state_to_hardness(0), Some((0.0, false))); // air
        assert_eq!(block_state_to_hardness(10), Some((0.5, true))); // dirt
    }

    #[test]
    fn test_block_drops() {
        assert_eq!(block_state_to_drops(1), &[35]); // stone -> cobblestone
        assert_eq!(block_state_to_drops(10), &[28]); // dirt -> dirt
        assert!(block_state_to_drops(0).is_empty()); // air -> nothing
    }

    #[test]
    fn test_harvest_tools() {
        let tools = block_state_to_harvest_tools(1).unwrap(); // stone requires pickaxes
        assert!(tools.contains(&820)); // wooden_pickaxe
        assert!(tools.contains(&845)); // netherite_pickaxe
        assert_eq!(block_state_to_harvest_tools(10), None); // dirt needs no tool
    }

    #[test]
    fn test_block_state_to_name() {
        assert_eq!(block_state_to_name(1), Some("stone"));
        assert_eq!(block_state_to_name(79), Some("bedrock"));
        assert_eq!(block_state_to_name(0), Some("air"));
    }
}
