//! Server-authoritative resolution of `ContainerClick` against a 46-slot
//! inventory: the client proposes a click, the server decides the result and
//! echoes it back. Mirrors the teacher's container-slot bookkeeping in
//! `tick.rs` but replaces the old trust-the-client `changed_slots` application
//! with real mode semantics.

use blockwright_types::ItemStack;

pub const CRAFT_RESULT: usize = 0;
pub const CRAFT_GRID_START: usize = 1;
pub const CRAFT_GRID_END: usize = 4;
pub const ARMOR_START: usize = 5;
pub const ARMOR_END: usize = 8;
pub const MAIN_START: usize = 9;
pub const MAIN_END: usize = 35;
pub const HOTBAR_START: usize = 36;
pub const HOTBAR_END: usize = 44;
pub const OFFHAND: usize = 45;

fn max_stack(item_id: i32) -> i32 {
    blockwright_data::item_id_to_stack_size(item_id).unwrap_or(64)
}

/// First slot in `range` already holding a compatible, non-full stack of
/// `item_id`; falls back to the first empty slot in `range`.
fn find_target_slot(
    slots: &[Option<ItemStack>],
    item_id: i32,
    range: std::ops::RangeInclusive<usize>,
) -> Option<usize> {
    let cap = max_stack(item_id);
    for i in range.clone() {
        if let Some(existing) = &slots[i] {
            if existing.item_id == item_id && (existing.count as i32) < cap {
                return Some(i);
            }
        }
    }
    for i in range {
        if slots[i].is_none() {
            return Some(i);
        }
    }
    None
}

/// Merge `item` into slot `target`, returning the leftover that didn't fit.
fn merge_into(slots: &mut [Option<ItemStack>], target: usize, item: ItemStack) -> Option<ItemStack> {
    let cap = max_stack(item.item_id);
    match &mut slots[target] {
        Some(existing) if existing.item_id == item.item_id => {
            let room = cap - existing.count as i32;
            let moved = room.min(item.count as i32);
            existing.count += moved as i8;
            let remainder = item.count as i32 - moved;
            if remainder > 0 {
                Some(ItemStack::new(item.item_id, remainder as i8))
            } else {
                None
            }
        }
        None => {
            slots[target] = Some(item);
            None
        }
        _ => Some(item), // incompatible; caller should not have picked this target
    }
}

/// Outcome of a resolved click: which slot indices changed (-1 means the cursor).
pub struct ClickResult {
    pub changed: Vec<i16>,
}

impl ClickResult {
    fn just(indices: &[i16]) -> Self {
        Self { changed: indices.to_vec() }
    }
}

/// Apply one `ContainerClick` to `slots`/`cursor` per the click-mode table.
/// `slot == -1` means the click landed outside the window (used by drag/drop
/// of the cursor item itself); `button` carries the left/right/hotbar-index
/// disambiguator per mode.
pub fn apply_click(
    slots: &mut [Option<ItemStack>],
    cursor: &mut Option<ItemStack>,
    slot: i16,
    button: i8,
    mode: i32,
) -> ClickResult {
    match mode {
        0 => apply_click_mode(slots, cursor, slot, button),
        1 => apply_shift_click(slots, slot),
        2 => apply_number_key(slots, slot, button),
        4 => apply_drop(slots, slot, button),
        6 => apply_double_click(slots, cursor, slot),
        // Middle-click (creative pick-block) and drag are deferred: accept the
        // click but make no change, caller resyncs the full container.
        _ => ClickResult::just(&[]),
    }
}

fn apply_click_mode(
    slots: &mut [Option<ItemStack>],
    cursor: &mut Option<ItemStack>,
    slot: i16,
    button: i8,
) -> ClickResult {
    if slot < 0 {
        return ClickResult::just(&[]);
    }
    let idx = slot as usize;
    if idx >= slots.len() {
        return ClickResult::just(&[]);
    }

    if button == 0 {
        // Left click: swap cursor and slot outright.
        std::mem::swap(cursor, &mut slots[idx]);
        return ClickResult::just(&[-1, slot]);
    }

    // Right click.
    match (cursor.clone(), slots[idx].clone()) {
        (Some(held), Some(mut existing)) if held.item_id == existing.item_id => {
            let cap = max_stack(existing.item_id);
            if (existing.count as i32) < cap {
                existing.count += 1;
                slots[idx] = Some(existing);
                let mut remaining = held;
                remaining.count -= 1;
                *cursor = if remaining.count > 0 { Some(remaining) } else { None };
                ClickResult::just(&[-1, slot])
            } else {
                ClickResult::just(&[])
            }
        }
        (Some(held), None) => {
            slots[idx] = Some(ItemStack::new(held.item_id, 1));
            let mut remaining = held;
            remaining.count -= 1;
            *cursor = if remaining.count > 0 { Some(remaining) } else { None };
            ClickResult::just(&[-1, slot])
        }
        (None, Some(existing)) => {
            let half = (existing.count as i32 + 1) / 2;
            let remainder = existing.count as i32 - half;
            *cursor = Some(ItemStack::new(existing.item_id, half as i8));
            slots[idx] = if remainder > 0 {
                Some(ItemStack::new(existing.item_id, remainder as i8))
            } else {
                None
            };
            ClickResult::just(&[-1, slot])
        }
        _ => ClickResult::just(&[]),
    }
}

fn apply_shift_click(slots: &mut [Option<ItemStack>], slot: i16) -> ClickResult {
    if slot < 0 {
        return ClickResult::just(&[]);
    }
    let idx = slot as usize;
    if idx >= slots.len() {
        return ClickResult::just(&[]);
    }
    let Some(item) = slots[idx].clone() else {
        return ClickResult::just(&[]);
    };

    let target_range = if (HOTBAR_START..=HOTBAR_END).contains(&idx) {
        MAIN_START..=MAIN_END
    } else {
        HOTBAR_START..=HOTBAR_END
    };

    let mut remaining = item;
    let mut changed = vec![slot];
    loop {
        let Some(target) = find_target_slot(slots, remaining.item_id, target_range.clone()) else {
            break;
        };
        let leftover = merge_into(slots, target, remaining.clone());
        changed.push(target as i16);
        match leftover {
            Some(rest) => remaining = rest,
            None => {
                remaining.count = 0;
                break;
            }
        }
    }

    slots[idx] = if remaining.count > 0 { Some(remaining) } else { None };
    ClickResult::just(&changed)
}

fn apply_number_key(slots: &mut [Option<ItemStack>], slot: i16, button: i8) -> ClickResult {
    if slot < 0 || !(0..=8).contains(&button) {
        return ClickResult::just(&[]);
    }
    let idx = slot as usize;
    let hotbar_idx = HOTBAR_START + button as usize;
    if idx >= slots.len() || hotbar_idx >= slots.len() {
        return ClickResult::just(&[]);
    }
    slots.swap(idx, hotbar_idx);
    ClickResult::just(&[slot, hotbar_idx as i16])
}

fn apply_drop(slots: &mut [Option<ItemStack>], slot: i16, button: i8) -> ClickResult {
    if slot < 0 {
        return ClickResult::just(&[]);
    }
    let idx = slot as usize;
    if idx >= slots.len() {
        return ClickResult::just(&[]);
    }
    let Some(mut item) = slots[idx].clone() else {
        return ClickResult::just(&[]);
    };
    if button == 1 {
        slots[idx] = None;
    } else {
        item.count -= 1;
        slots[idx] = if item.count > 0 { Some(item) } else { None };
    }
    ClickResult::just(&[slot])
}

fn apply_double_click(
    slots: &mut [Option<ItemStack>],
    cursor: &mut Option<ItemStack>,
    slot: i16,
) -> ClickResult {
    if cursor.is_none() {
        if slot < 0 {
            return ClickResult::just(&[]);
        }
        let idx = slot as usize;
        if idx >= slots.len() {
            return ClickResult::just(&[]);
        }
        *cursor = slots[idx].take();
    }
    let Some(held) = cursor.clone() else {
        return ClickResult::just(&[]);
    };
    let cap = max_stack(held.item_id);
    let mut total = held.count as i32;
    let mut changed = vec![-1i16];
    if slot >= 0 {
        changed.push(slot);
    }
    for (i, s) in slots.iter_mut().enumerate() {
        if total >= cap {
            break;
        }
        if let Some(existing) = s {
            if existing.item_id == held.item_id {
                let take = (cap - total).min(existing.count as i32);
                if take > 0 {
                    total += take;
                    existing.count -= take as i8;
                    if existing.count <= 0 {
                        *s = None;
                    }
                    changed.push(i as i16);
                }
            }
        }
    }
    *cursor = Some(ItemStack::new(held.item_id, total as i8));
    ClickResult::just(&changed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_slots() -> Vec<Option<ItemStack>> {
        vec![None; 46]
    }

    #[test]
    fn shift_click_stacks_into_empty_hotbar() {
        let mut slots = empty_slots();
        slots[9] = Some(ItemStack::new(1, 64));
        let mut cursor = None;
        let result = apply_click(&mut slots, &mut cursor, 9, 0, 1);
        assert_eq!(slots[9], None);
        assert_eq!(slots[36], Some(ItemStack::new(1, 64)));
        assert!(result.changed.contains(&9));
        assert!(result.changed.contains(&36));
    }

    #[test]
    fn left_click_swaps_cursor_and_slot() {
        let mut slots = empty_slots();
        slots[20] = Some(ItemStack::new(5, 3));
        let mut cursor = None;
        apply_click(&mut slots, &mut cursor, 20, 0, 0);
        assert_eq!(slots[20], None);
        assert_eq!(cursor, Some(ItemStack::new(5, 3)));
    }

    #[test]
    fn right_click_on_empty_slot_takes_half() {
        let mut slots = empty_slots();
        slots[20] = Some(ItemStack::new(5, 5));
        let mut cursor = None;
        apply_click(&mut slots, &mut cursor, 20, 1, 0);
        assert_eq!(cursor, Some(ItemStack::new(5, 3)));
        assert_eq!(slots[20], Some(ItemStack::new(5, 2)));
    }

    #[test]
    fn number_key_swaps_target_with_hotbar_slot() {
        let mut slots = empty_slots();
        slots[12] = Some(ItemStack::new(2, 1));
        slots[36] = Some(ItemStack::new(3, 1));
        apply_click(&mut slots, &mut None, 12, 0, 2);
        assert_eq!(slots[12], Some(ItemStack::new(3, 1)));
        assert_eq!(slots[36], Some(ItemStack::new(2, 1)));
    }

    #[test]
    fn drop_single_decrements_count() {
        let mut slots = empty_slots();
        slots[36] = Some(ItemStack::new(1, 5));
        apply_click(&mut slots, &mut None, 36, 0, 4);
        assert_eq!(slots[36], Some(ItemStack::new(1, 4)));
    }

    #[test]
    fn drop_stack_clears_slot() {
        let mut slots = empty_slots();
        slots[36] = Some(ItemStack::new(1, 5));
        apply_click(&mut slots, &mut None, 36, 1, 4);
        assert_eq!(slots[36], None);
    }

    #[test]
    fn double_click_absorbs_matching_stacks() {
        let mut slots = empty_slots();
        slots[9] = Some(ItemStack::new(1, 20));
        slots[10] = Some(ItemStack::new(1, 20));
        let mut cursor = Some(ItemStack::new(1, 30));
        apply_click(&mut slots, &mut cursor, -1, 0, 6);
        assert_eq!(cursor, Some(ItemStack::new(1, 64)));
    }

    #[test]
    fn middle_click_and_drag_are_no_ops() {
        let mut slots = empty_slots();
        slots[9] = Some(ItemStack::new(1, 10));
        let before = slots.clone();
        apply_click(&mut slots, &mut None, 9, 0, 3);
        assert_eq!(slots, before);
        apply_click(&mut slots, &mut None, 9, 0, 5);
        assert_eq!(slots, before);
    }
}
