//! Central authority tick loop: owns the ECS `World` and all game state.
//! Connections never touch world state directly — they hand off a `NewPlayer`
//! over a channel and from then on communicate via `InboundPacket`/`InternalPacket`
//! channels, staying entirely out of the lock.

use crate::config::ServerConfig;
use crate::ecs::*;
use crate::inventory;
use blockwright_protocol_core::{player_info_actions, EntityMetadataEntry, InternalPacket, PlayerInfoEntry};
use blockwright_types::{BlockPos, ChunkPos, GameMode, GameProfile, ItemStack, TextComponent, Vec3d};
use blockwright_world::{generate_flat_chunk_at, Chunk};
use hecs::{Entity, World};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, oneshot, watch};
use tracing::info;

const TICK_MS: u64 = 50; // 20 TPS
const KEEP_ALIVE_INTERVAL_SECS: u64 = 15;
const KEEP_ALIVE_TIMEOUT_SECS: u64 = 30;

/// A packet received from a player's connection, tagged with their entity ID.
pub struct InboundPacket {
    pub entity_id: i32,
    pub packet: InternalPacket,
}

/// A connection handing off to the tick loop after finishing the login/configuration
/// handshake. The tick loop allocates the entity ID (it owns the counter) and reports
/// it back so the reader task can tag inbound packets correctly.
pub struct NewPlayer {
    pub profile: GameProfile,
    pub packet_tx: mpsc::UnboundedSender<InternalPacket>,
    pub packet_rx: mpsc::UnboundedReceiver<InboundPacket>,
    pub assigned_entity_id: oneshot::Sender<i32>,
}

/// A block-entity-backed container. Only chests exist; no persistence.
#[derive(Debug, Clone)]
pub enum BlockEntity {
    Chest { inventory: [Option<ItemStack>; 27] },
}

/// All world/game state the tick loop owns outright.
pub struct WorldState {
    chunks: HashMap<ChunkPos, Chunk>,
    pub world_age: i64,
    pub time_of_day: i64,
    pub tick_count: u64,
    pub block_entities: HashMap<BlockPos, BlockEntity>,
}

impl WorldState {
    pub fn new() -> Self {
        Self {
            chunks: HashMap::new(),
            world_age: 0,
            time_of_day: 0,
            tick_count: 0,
            block_entities: HashMap::new(),
        }
    }

    fn ensure_chunk(&mut self, chunk_x: i32, chunk_z: i32) -> &Chunk {
        self.chunks
            .entry(ChunkPos::new(chunk_x, chunk_z))
            .or_insert_with(|| generate_flat_chunk_at(chunk_x, chunk_z))
    }

    pub fn get_chunk_packet(&mut self, chunk_x: i32, chunk_z: i32) -> InternalPacket {
        self.ensure_chunk(chunk_x, chunk_z).to_packet(chunk_x, chunk_z)
    }

    pub fn get_block(&mut self, pos: &BlockPos) -> i32 {
        let chunk_pos = pos.chunk_pos();
        self.ensure_chunk(chunk_pos.x, chunk_pos.z);
        let chunk = self.chunks.get(&chunk_pos).expect("just ensured");
        let local_x = pos.x.rem_euclid(16);
        let local_z = pos.z.rem_euclid(16);
        chunk.get_block(local_x, pos.y, local_z)
    }

    /// Set a block and return the previous state ID.
    pub fn set_block(&mut self, pos: &BlockPos, state_id: i32) -> i32 {
        let chunk_pos = pos.chunk_pos();
        self.ensure_chunk(chunk_pos.x, chunk_pos.z);
        let chunk = self.chunks.get_mut(&chunk_pos).expect("just ensured");
        let local_x = pos.x.rem_euclid(16);
        let local_z = pos.z.rem_euclid(16);
        let old = chunk.get_block(local_x, pos.y, local_z);
        chunk.set_block(local_x, pos.y, local_z, state_id);
        old
    }

    pub fn get_block_entity(&self, pos: &BlockPos) -> Option<&BlockEntity> {
        self.block_entities.get(pos)
    }

    pub fn get_block_entity_mut(&mut self, pos: &BlockPos) -> Option<&mut BlockEntity> {
        self.block_entities.get_mut(pos)
    }

    pub fn set_block_entity(&mut self, pos: BlockPos, entity: BlockEntity) {
        self.block_entities.insert(pos, entity);
    }

    pub fn remove_block_entity(&mut self, pos: &BlockPos) {
        self.block_entities.remove(pos);
    }
}

/// Drive the server: accept new players, run the 20 TPS system loop, process
/// inbound packets as they arrive.
pub async fn run_tick_loop(
    config: Arc<ServerConfig>,
    mut new_player_rx: mpsc::UnboundedReceiver<NewPlayer>,
    player_count: Arc<AtomicUsize>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut world = World::new();
    let mut world_state = WorldState::new();
    let mut next_entity_id: i32 = 1;
    let mut inbound_rxs: Vec<(Entity, mpsc::UnboundedReceiver<InboundPacket>)> = Vec::new();

    let mut interval = tokio::time::interval(Duration::from_millis(TICK_MS));

    loop {
        tokio::select! {
            _ = interval.tick() => {
                world_state.tick_count += 1;

                tick_keep_alive(&mut world);
                tick_entity_tracking(&mut world, &config);
                tick_entity_movement_broadcast(&mut world);
                tick_world_time(&mut world_state, &world);
                tick_block_breaking(&mut world, &mut world_state, world_state.tick_count);

                // Drain any packets that arrived since the last tick.
                let mut i = 0;
                while i < inbound_rxs.len() {
                    let mut disconnected = false;
                    loop {
                        match inbound_rxs[i].1.try_recv() {
                            Ok(inbound) => {
                                process_packet(&mut world, &mut world_state, inbound.entity_id, inbound.packet);
                            }
                            Err(mpsc::error::TryRecvError::Empty) => break,
                            Err(mpsc::error::TryRecvError::Disconnected) => {
                                disconnected = true;
                                break;
                            }
                        }
                    }
                    if disconnected {
                        let (entity, _) = inbound_rxs.remove(i);
                        handle_disconnect(&mut world, entity, &player_count);
                    } else {
                        i += 1;
                    }
                }
            }
            Some(new_player) = new_player_rx.recv() => {
                let entity_id = next_entity_id;
                next_entity_id += 1;
                let _ = new_player.assigned_entity_id.send(entity_id);
                let entity = handle_new_player(&mut world, &mut world_state, &config, entity_id, new_player.profile, new_player.packet_tx);
                inbound_rxs.push((entity, new_player.packet_rx));
                player_count.fetch_add(1, Ordering::Relaxed);
            }
            _ = shutdown_rx.changed() => {
                if *shutdown_rx.borrow() {
                    info!("Tick loop shutting down");
                    return;
                }
            }
        }
    }
}

fn spawn_player_entity(
    world: &mut World,
    entity_id: i32,
    profile: GameProfile,
    packet_tx: mpsc::UnboundedSender<InternalPacket>,
    spawn_pos: Vec3d,
    center_cx: i32,
    center_cz: i32,
    view_distance: i32,
) -> Entity {
    world.spawn((
        EntityId(entity_id),
        Profile(profile),
        Position(spawn_pos),
        PreviousPosition(spawn_pos),
        Rotation { yaw: 0.0, pitch: 0.0 },
        PreviousRotation { yaw: 0.0, pitch: 0.0 },
        OnGround(true),
        PlayerGameMode(GameMode::Survival),
        ConnectionSender(packet_tx),
        ChunkPosition { chunk_x: center_cx, chunk_z: center_cz },
        ViewDistance(view_distance),
        ChunkStreamer::new(),
        KeepAlive::new(),
        TrackedEntities::new(),
        Inventory::new(),
        HeldSlot(0),
        Health::default(),
        FoodData::default(),
        ExperienceData::default(),
        Sneaking(false),
    ))
}

fn handle_new_player(
    world: &mut World,
    world_state: &mut WorldState,
    config: &ServerConfig,
    entity_id: i32,
    profile: GameProfile,
    packet_tx: mpsc::UnboundedSender<InternalPacket>,
) -> Entity {
    let player_name = profile.name.clone();
    info!("{} entering Play state (entity {})", player_name, entity_id);

    let view_distance = config.view_distance as i32;
    let spawn_y = blockwright_world::generator::SURFACE_Y as f64 + 1.0;
    let spawn_pos = Vec3d::new(0.5, spawn_y, 0.5);
    let center_cx = (spawn_pos.x.floor() as i32) >> 4;
    let center_cz = (spawn_pos.z.floor() as i32) >> 4;

    let send = |packet: InternalPacket| {
        let _ = packet_tx.send(packet);
    };

    send(InternalPacket::JoinGame {
        entity_id,
        is_hardcore: false,
        dimension_names: vec!["minecraft:overworld".into()],
        max_players: config.max_players as i32,
        view_distance,
        simulation_distance: view_distance,
        reduced_debug_info: false,
        enable_respawn_screen: true,
        do_limited_crafting: false,
        dimension_type: 0,
        dimension_name: "minecraft:overworld".into(),
        hashed_seed: 0,
        game_mode: GameMode::Survival,
        previous_game_mode: -1,
        is_debug: false,
        is_flat: true,
        portal_cooldown: 0,
        enforces_secure_chat: false,
    });

    send(InternalPacket::SetCenterChunk { chunk_x: center_cx, chunk_z: center_cz });
    let mut loaded_chunks = send_spawn_chunks(world_state, &packet_tx, center_cx, center_cz);

    send(InternalPacket::SynchronizePlayerPosition {
        position: spawn_pos,
        yaw: 0.0,
        pitch: 0.0,
        flags: 0,
        teleport_id: 1,
    });
    send(InternalPacket::GameEvent { event: 13, value: 0.0 });
    send(InternalPacket::SetDefaultSpawnPosition {
        position: BlockPos::new(0, blockwright_world::generator::SURFACE_Y, 0),
        angle: 0.0,
    });
    send(InternalPacket::UpdateTime { world_age: world_state.world_age, time_of_day: world_state.time_of_day });

    // Tab list: the new player, plus everyone already online.
    let mut entries = vec![PlayerInfoEntry {
        uuid: profile.uuid,
        name: Some(profile.name.clone()),
        properties: Vec::new(),
        game_mode: Some(GameMode::Survival.id() as i32),
        listed: Some(true),
        ping: Some(0),
        display_name: None,
    }];
    for (_, profile_c) in world.query::<&Profile>().iter() {
        entries.push(PlayerInfoEntry {
            uuid: profile_c.0.uuid,
            name: Some(profile_c.0.name.clone()),
            properties: Vec::new(),
            game_mode: Some(GameMode::Survival.id() as i32),
            listed: Some(true),
            ping: Some(0),
            display_name: None,
        });
    }
    let actions = player_info_actions::ADD_PLAYER
        | player_info_actions::UPDATE_GAME_MODE
        | player_info_actions::UPDATE_LISTED
        | player_info_actions::UPDATE_LATENCY;
    broadcast_to_all(world, InternalPacket::PlayerInfoUpdate { actions, players: entries });
    send(InternalPacket::PlayerInfoUpdate {
        actions,
        players: vec![PlayerInfoEntry {
            uuid: profile.uuid,
            name: Some(profile.name.clone()),
            properties: Vec::new(),
            game_mode: Some(GameMode::Survival.id() as i32),
            listed: Some(true),
            ping: Some(0),
            display_name: None,
        }],
    });

    let inventory = Inventory::new();
    send(InternalPacket::SetContainerContent {
        window_id: 0,
        state_id: inventory.state_id,
        slots: inventory.to_slot_vec(),
        carried_item: None,
    });
    let health = Health::default();
    let food = FoodData::default();
    send(InternalPacket::SetHealth { health: health.current, food: food.food_level, saturation: food.saturation });
    let xp = ExperienceData::default();
    send(InternalPacket::SetExperience { experience_bar: xp.progress, level: xp.level, total_experience: xp.total_xp });

    let entity = spawn_player_entity(world, entity_id, profile, packet_tx.clone(), spawn_pos, center_cx, center_cz, view_distance);

    expand_to_view_distance(world_state, &packet_tx, center_cx, center_cz, view_distance, &mut loaded_chunks);
    if let Ok(streamer) = world.query_one_mut::<&mut ChunkStreamer>(entity) {
        streamer.loaded = loaded_chunks;
    }

    broadcast_except(
        world,
        entity,
        InternalPacket::SystemChatMessage {
            content: TextComponent {
                color: Some("yellow".into()),
                ..TextComponent::plain(format!("{} joined the game", player_name))
            },
            overlay: false,
        },
    );

    entity
}

fn handle_disconnect(world: &mut World, entity: Entity, player_count: &Arc<AtomicUsize>) {
    let found = world.query_one_mut::<(&EntityId, &Profile)>(entity).map(|(id, profile)| (id.0, profile.0.clone()));
    let Ok((entity_id, profile)) = found else {
        let _ = world.despawn(entity);
        return;
    };
    info!("{} disconnected", profile.name);

    let _ = world.despawn(entity);
    player_count.fetch_sub(1, Ordering::Relaxed);

    broadcast_to_all(world, InternalPacket::PlayerInfoRemove { uuids: vec![profile.uuid] });
    broadcast_to_all(world, InternalPacket::RemoveEntities { entity_ids: vec![entity_id] });
    broadcast_to_all(
        world,
        InternalPacket::SystemChatMessage {
            content: TextComponent {
                color: Some("yellow".into()),
                ..TextComponent::plain(format!("{} left the game", profile.name))
            },
            overlay: false,
        },
    );

    for (_, tracked) in world.query::<&mut TrackedEntities>().iter() {
        tracked.visible.remove(&entity_id);
    }
}

fn find_player_entity(world: &World, entity_id: i32) -> Option<Entity> {
    world
        .query::<&EntityId>()
        .iter()
        .find(|(_, id)| id.0 == entity_id)
        .map(|(e, _)| e)
}

fn process_packet(world: &mut World, world_state: &mut WorldState, entity_id: i32, packet: InternalPacket) {
    let Some(entity) = find_player_entity(world, entity_id) else { return };

    match packet {
        InternalPacket::ConfirmTeleportation { .. } => {}
        InternalPacket::PlayerPosition { x, y, z, on_ground } => {
            handle_player_movement(world, world_state, entity, x, y, z, None, None, on_ground);
        }
        InternalPacket::PlayerPositionAndRotation { x, y, z, yaw, pitch, on_ground } => {
            handle_player_movement(world, world_state, entity, x, y, z, Some(yaw), Some(pitch), on_ground);
        }
        InternalPacket::PlayerRotation { yaw, pitch, on_ground } => {
            if let Ok((rotation, on_ground_c)) = world.query_one_mut::<(&mut Rotation, &mut OnGround)>(entity) {
                rotation.yaw = yaw;
                rotation.pitch = pitch;
                on_ground_c.0 = on_ground;
            }
        }
        InternalPacket::PlayerOnGround { on_ground } => {
            if let Ok(on_ground_c) = world.query_one_mut::<&mut OnGround>(entity) {
                on_ground_c.0 = on_ground;
            }
        }
        InternalPacket::KeepAliveServerbound { id } => {
            if let Ok(keep_alive) = world.query_one_mut::<&mut KeepAlive>(entity) {
                if keep_alive.pending == Some(id) {
                    keep_alive.pending = None;
                    keep_alive.last_response = Instant::now();
                }
            }
        }
        InternalPacket::BlockDig { status, position, face: _, sequence } => {
            handle_block_dig(world, world_state, entity, status, position, sequence);
        }
        InternalPacket::BlockPlace { position, face, sequence, .. } => {
            handle_block_place(world, world_state, entity, position, face, sequence);
        }
        InternalPacket::HeldItemChange { slot } => {
            if (0..=8).contains(&slot) {
                if let Ok(held) = world.query_one_mut::<&mut HeldSlot>(entity) {
                    held.0 = slot as u8;
                }
            }
        }
        InternalPacket::CreativeInventoryAction { slot, item } => {
            if let Ok((mode, inventory)) = world.query_one_mut::<(&PlayerGameMode, &mut Inventory)>(entity) {
                if mode.0 == GameMode::Creative {
                    if slot == -1 {
                        inventory.cursor_item = item;
                    } else if slot >= 0 && (slot as usize) < inventory.slots.len() {
                        inventory.set_slot(slot as usize, item);
                    }
                }
            }
        }
        InternalPacket::ContainerClick { window_id, state_id, slot, button, mode, .. } => {
            handle_container_click(world, world_state, entity, window_id, state_id, slot, button, mode);
        }
        InternalPacket::ClientCloseContainer { .. } => {
            world.remove_one::<OpenContainer>(entity).ok();
        }
        InternalPacket::ChatCommand { .. } => {
            // Command parsing beyond chat broadcast is out of scope; ignored.
        }
        InternalPacket::ChatMessage { message, .. } => {
            if let Ok(profile) = world.query_one_mut::<&Profile>(entity) {
                let text = format!("<{}> {}", profile.0.name, message);
                broadcast_to_all(world, InternalPacket::SystemChatMessage { content: TextComponent::plain(text), overlay: false });
            }
        }
        InternalPacket::Swing { .. } => {
            if let Ok(id) = world.query_one_mut::<&EntityId>(entity) {
                let id = id.0;
                broadcast_except(world, entity, InternalPacket::EntityAnimation { entity_id: id, animation: 0 });
            }
        }
        InternalPacket::PlayerCommand { action, .. } => {
            handle_player_command(world, entity, action);
        }
        _ => {}
    }
}

fn handle_player_movement(
    world: &mut World,
    world_state: &mut WorldState,
    entity: Entity,
    x: f64,
    y: f64,
    z: f64,
    yaw: Option<f32>,
    pitch: Option<f32>,
    on_ground: bool,
) {
    if let Ok((position, rotation, on_ground_c)) = world.query_one_mut::<(&mut Position, &mut Rotation, &mut OnGround)>(entity) {
        position.0 = Vec3d::new(x, y, z);
        if let Some(yaw) = yaw {
            rotation.yaw = yaw;
        }
        if let Some(pitch) = pitch {
            rotation.pitch = pitch;
        }
        on_ground_c.0 = on_ground;
    }
    handle_chunk_updates(world, world_state, entity);
}

/// action 0 = start sneaking, 1 = stop sneaking; other actions (sprint, bed,
/// etc.) aren't modeled and are ignored.
fn handle_player_command(world: &mut World, entity: Entity, action: i32) {
    let sneaking = match action {
        0 => true,
        1 => false,
        _ => return,
    };

    let entity_id = {
        let Ok((id, current)) = world.query_one_mut::<(&EntityId, &mut Sneaking)>(entity) else { return };
        if current.0 == sneaking {
            return;
        }
        current.0 = sneaking;
        id.0
    };

    let flags = if sneaking { 0x02u8 } else { 0u8 };
    let pose = if sneaking { 5u8 } else { 0u8 }; // Pose enum: 5 = SNEAKING, 0 = STANDING
    let metadata = vec![
        EntityMetadataEntry { index: 0, type_id: 0, data: vec![flags] },
        EntityMetadataEntry { index: 6, type_id: 21, data: vec![pose] },
    ];
    broadcast_to_trackers(world, entity_id, InternalPacket::SetEntityMetadata { entity_id, metadata });
}

/// Sends a packet only to players whose `TrackedEntities.visible` set
/// currently contains `tracked_id`, mirroring the visibility filter used for
/// movement/rotation broadcasts.
fn broadcast_to_trackers(world: &World, tracked_id: i32, packet: InternalPacket) {
    for (_, (tracked, sender)) in world.query::<(&TrackedEntities, &ConnectionSender)>().iter() {
        if tracked.visible.contains(&tracked_id) {
            let _ = sender.0.send(packet.clone());
        }
    }
}

// === Container handling ===

fn handle_container_click(
    world: &mut World,
    world_state: &mut WorldState,
    entity: Entity,
    window_id: u8,
    state_id: i32,
    slot: i16,
    button: i8,
    mode: i32,
) {
    if window_id == 0 {
        handle_own_inventory_click(world, entity, state_id, slot, button, mode);
    } else {
        handle_open_container_click(world, world_state, entity, window_id, state_id, slot, button, mode);
    }
}

/// Window 0 is the player's own 46-slot inventory; no `OpenContainer` is open.
fn handle_own_inventory_click(world: &mut World, entity: Entity, state_id: i32, slot: i16, button: i8, mode: i32) {
    let Ok((inventory, sender)) = world.query_one_mut::<(&mut Inventory, &ConnectionSender)>(entity) else { return };

    if state_id != inventory.state_id {
        resync_own_inventory(inventory, sender);
        return;
    }

    let result = inventory::apply_click(&mut inventory.slots, &mut inventory.cursor_item, slot, button, mode);
    inventory.state_id = inventory.state_id.wrapping_add(1);
    let new_state_id = inventory.state_id;

    for idx in &result.changed {
        let item = if *idx < 0 { inventory.cursor_item.clone() } else { inventory.slots[*idx as usize].clone() };
        let _ = sender.0.send(InternalPacket::SetContainerSlot {
            window_id: 0,
            state_id: new_state_id,
            slot: *idx,
            item,
        });
    }

    let hotbar_changed = result.changed.iter().any(|&idx| idx >= inventory::HOTBAR_START as i16 && idx <= inventory::HOTBAR_END as i16);
    if hotbar_changed {
        let held_item = world
            .query_one_mut::<(&HeldSlot, &Inventory)>(entity)
            .ok()
            .and_then(|(held, inv)| inv.held_item(held.0).clone());
        if let Ok(id) = world.query_one_mut::<&EntityId>(entity) {
            let entity_id = id.0;
            broadcast_except(world, entity, InternalPacket::SetEquipment { entity_id, equipment: vec![(0, held_item)] });
        }
    }
}

fn resync_own_inventory(inventory: &Inventory, sender: &ConnectionSender) {
    let _ = sender.0.send(InternalPacket::SetContainerContent {
        window_id: 0,
        state_id: inventory.state_id,
        slots: inventory.to_slot_vec(),
        carried_item: inventory.cursor_item.clone(),
    });
}

/// Any other window is a chest: a simpler trust-based pass-through that still
/// reuses the mode-0/shift-click resolution against the chest's 27-slot array.
fn handle_open_container_click(
    world: &mut World,
    world_state: &mut WorldState,
    entity: Entity,
    window_id: u8,
    state_id: i32,
    slot: i16,
    button: i8,
    mode: i32,
) {
    let pos = {
        let Ok(open) = world.query_one_mut::<&OpenContainer>(entity) else { return };
        if open.container_id != window_id || state_id != open.state_id {
            return;
        }
        let Menu::Chest { pos } = open.menu;
        pos
    };

    let Some(BlockEntity::Chest { inventory }) = world_state.get_block_entity_mut(&pos) else { return };
    let mut cursor = None;
    let result = inventory::apply_click(inventory, &mut cursor, slot, button, mode);

    if let Ok((open, sender)) = world.query_one_mut::<(&mut OpenContainer, &ConnectionSender)>(entity) {
        open.state_id += 1;
        for idx in &result.changed {
            if *idx < 0 {
                continue;
            }
            let item = inventory.get(*idx as usize).cloned().flatten();
            let _ = sender.0.send(InternalPacket::SetContainerSlot {
                window_id: window_id as i8,
                state_id: open.state_id,
                slot: *idx,
                item,
            });
        }
    }
}

fn open_container(world: &mut World, entity: Entity, world_state: &mut WorldState, pos: BlockPos) {
    if world_state.get_block_entity(&pos).is_none() {
        world_state.set_block_entity(pos, BlockEntity::Chest { inventory: std::array::from_fn(|_| None) });
    }
    let container_id: u8 = 1;
    let Some(BlockEntity::Chest { inventory }) = world_state.get_block_entity(&pos) else { return };
    let slots: Vec<Option<ItemStack>> = inventory.to_vec();

    if let Ok(sender) = world.query_one_mut::<&ConnectionSender>(entity) {
        let _ = sender.0.send(InternalPacket::OpenScreen {
            container_id: container_id as i32,
            menu_type: 2, // generic_9x3
            title: TextComponent::plain("Chest"),
        });
        let _ = sender.0.send(InternalPacket::SetContainerContent {
            window_id: container_id,
            state_id: 1,
            slots,
            carried_item: None,
        });
    }
    world.insert_one(entity, OpenContainer { container_id, menu: Menu::Chest { pos }, state_id: 1 }).ok();
}

// === Block interaction ===

fn handle_block_dig(world: &mut World, world_state: &mut WorldState, entity: Entity, status: i32, position: BlockPos, sequence: i32) {
    let Ok(mode) = world.query_one_mut::<&PlayerGameMode>(entity).map(|m| m.0) else { return };

    if mode == GameMode::Creative {
        if status == 0 {
            world_state.set_block(&position, 0);
            if let Ok(sender) = world.query_one_mut::<&ConnectionSender>(entity) {
                let _ = sender.0.send(InternalPacket::AcknowledgeBlockChange { sequence });
            }
            broadcast_to_all(world, InternalPacket::BlockUpdate { position, block_id: 0 });
        }
        return;
    }

    match status {
        0 => {
            let block_state = world_state.get_block(&position);
            let tool_item = world
                .query_one_mut::<(&HeldSlot, &Inventory)>(entity)
                .ok()
                .and_then(|(held, inv)| inv.held_item(held.0).clone())
                .map(|stack| stack.item_id);

            if let Some(total_ticks) = calculate_break_ticks(block_state, tool_item) {
                let started_tick = world_state.tick_count;
                world.insert_one(entity, BreakingBlock { position, block_state, started_tick, total_ticks, last_stage: -1 }).ok();
                if total_ticks == 0 {
                    complete_block_break(world, world_state, entity, position, block_state, sequence);
                }
            } else if let Ok(sender) = world.query_one_mut::<&ConnectionSender>(entity) {
                let _ = sender.0.send(InternalPacket::AcknowledgeBlockChange { sequence });
            }
        }
        1 => {
            world.remove_one::<BreakingBlock>(entity).ok();
            if let Ok(id) = world.query_one_mut::<&EntityId>(entity) {
                let id = id.0;
                broadcast_to_all(world, InternalPacket::SetBlockDestroyStage { entity_id: id, position, destroy_stage: -1 });
            }
        }
        2 => {
            let block_state = world_state.get_block(&position);
            complete_block_break(world, world_state, entity, position, block_state, sequence);
        }
        _ => {}
    }
}

fn handle_block_place(world: &mut World, world_state: &mut WorldState, entity: Entity, position: BlockPos, face: u8, sequence: i32) {
    let target = offset_by_face(&position, face);

    // Right-clicking an existing chest opens it instead of placing.
    if let Some(BlockEntity::Chest { .. }) = world_state.get_block_entity(&position) {
        open_container(world, entity, world_state, position);
        if let Ok(sender) = world.query_one_mut::<&ConnectionSender>(entity) {
            let _ = sender.0.send(InternalPacket::AcknowledgeBlockChange { sequence });
        }
        return;
    }

    let block_state = {
        let Ok((mode, held, inventory)) = world.query_one_mut::<(&PlayerGameMode, &HeldSlot, &mut Inventory)>(entity) else { return };
        let item_id = match inventory.held_item(held.0) {
            Some(stack) => stack.item_id,
            None => return,
        };
        let Some(block_state) = blockwright_data::item_id_to_block_state(item_id) else { return };

        if mode.0 != GameMode::Creative {
            let hotbar_idx = 36 + held.0 as usize;
            if let Some(stack) = &mut inventory.slots[hotbar_idx] {
                stack.count -= 1;
                if stack.count <= 0 {
                    inventory.slots[hotbar_idx] = None;
                }
            }
        }
        block_state
    };

    world_state.set_block(&target, block_state);
    broadcast_to_all(world, InternalPacket::BlockUpdate { position: target, block_id: block_state });
    if let Ok(sender) = world.query_one_mut::<&ConnectionSender>(entity) {
        let _ = sender.0.send(InternalPacket::AcknowledgeBlockChange { sequence });
    }
}

/// `total_ticks = ceil(hardness * 50.0 / tool_speed)`. `tool_speed` is 1.0 when
/// the held tool can harvest the block (or no tool is required), else the
/// effective hardness is multiplied by 5 before the same ceil-ratio shape.
/// Negative hardness is unbreakable; zero hardness breaks instantly.
fn calculate_break_ticks(block_state: i32, tool_item: Option<i32>) -> Option<u64> {
    let (hardness, diggable) = blockwright_data::block_state_to_hardness(block_state)?;
    if !diggable || hardness < 0.0 {
        return None;
    }
    if hardness == 0.0 {
        return Some(0);
    }

    let correct_tool = match blockwright_data::block_state_to_harvest_tools(block_state) {
        None => true,
        Some(tools) => tool_item.map(|id| tools.contains(&id)).unwrap_or(false),
    };

    let effective_hardness = if correct_tool { hardness } else { hardness * 5.0 };
    let tool_speed = 1.0;
    Some((effective_hardness * 50.0 / tool_speed).ceil() as u64)
}

fn complete_block_break(world: &mut World, world_state: &mut WorldState, entity: Entity, position: BlockPos, old_block: i32, sequence: i32) {
    world.remove_one::<BreakingBlock>(entity).ok();

    world_state.set_block(&position, 0);
    world_state.remove_block_entity(&position);

    if let Ok(sender) = world.query_one_mut::<&ConnectionSender>(entity) {
        let _ = sender.0.send(InternalPacket::BlockUpdate { position, block_id: 0 });
        let _ = sender.0.send(InternalPacket::AcknowledgeBlockChange { sequence });
    }
    broadcast_except(world, entity, InternalPacket::BlockUpdate { position, block_id: 0 });

    if let Ok(id) = world.query_one_mut::<&EntityId>(entity) {
        let id = id.0;
        broadcast_to_all(world, InternalPacket::SetBlockDestroyStage { entity_id: id, position, destroy_stage: -1 });
    }
    broadcast_to_all(world, InternalPacket::WorldEvent { event: 2001, position, data: old_block, disable_relative_volume: false });
}

fn tick_block_breaking(world: &mut World, world_state: &mut WorldState, current_tick: u64) {
    let mut completed: Vec<(Entity, BlockPos, i32)> = Vec::new();
    let mut stage_changes: Vec<(Entity, i32, BlockPos, i8)> = Vec::new();

    for (entity, (breaking, id)) in world.query::<(&mut BreakingBlock, &EntityId)>().iter() {
        let elapsed = current_tick.saturating_sub(breaking.started_tick);
        if elapsed >= breaking.total_ticks {
            completed.push((entity, breaking.position, breaking.block_state));
            continue;
        }
        let progress = elapsed as f64 / breaking.total_ticks as f64;
        let stage = (progress * 10.0).floor().min(9.0) as i8;
        if stage != breaking.last_stage {
            breaking.last_stage = stage;
            stage_changes.push((entity, id.0, breaking.position, stage));
        }
    }

    for (digger, entity_id, position, stage) in stage_changes {
        broadcast_except(world, digger, InternalPacket::SetBlockDestroyStage { entity_id, position, destroy_stage: stage });
    }
    for (entity, position, block_state) in completed {
        complete_block_break(world, world_state, entity, position, block_state, 0);
    }
}

// === Chunk streaming ===

/// Force-loads the 3x3 grid centered on the spawn chunk. Sent before
/// `SynchronizePlayerPosition` so the client always has solid ground under
/// the teleport target.
fn send_spawn_chunks(
    world_state: &mut WorldState,
    packet_tx: &mpsc::UnboundedSender<InternalPacket>,
    center_cx: i32,
    center_cz: i32,
) -> std::collections::HashSet<ChunkPos> {
    let _ = packet_tx.send(InternalPacket::ChunkBatchStart);
    let mut loaded = std::collections::HashSet::new();
    let mut batch_size = 0i32;
    for cx in (center_cx - 1)..=(center_cx + 1) {
        for cz in (center_cz - 1)..=(center_cz + 1) {
            let packet = world_state.get_chunk_packet(cx, cz);
            let _ = packet_tx.send(packet);
            loaded.insert(ChunkPos::new(cx, cz));
            batch_size += 1;
        }
    }
    let _ = packet_tx.send(InternalPacket::ChunkBatchFinished { batch_size });
    loaded
}

/// Sends the remainder of the full view-distance square, skipping chunks
/// already in `loaded` (the spawn grid), and extends `loaded` in place.
fn expand_to_view_distance(
    world_state: &mut WorldState,
    packet_tx: &mpsc::UnboundedSender<InternalPacket>,
    center_cx: i32,
    center_cz: i32,
    view_distance: i32,
    loaded: &mut std::collections::HashSet<ChunkPos>,
) {
    let _ = packet_tx.send(InternalPacket::ChunkBatchStart);
    let mut batch_size = 0i32;
    for cx in (center_cx - view_distance)..=(center_cx + view_distance) {
        for cz in (center_cz - view_distance)..=(center_cz + view_distance) {
            let pos = ChunkPos::new(cx, cz);
            if loaded.insert(pos) {
                let packet = world_state.get_chunk_packet(cx, cz);
                let _ = packet_tx.send(packet);
                batch_size += 1;
            }
        }
    }
    let _ = packet_tx.send(InternalPacket::ChunkBatchFinished { batch_size });
}

fn handle_chunk_updates(world: &mut World, world_state: &mut WorldState, entity: Entity) {
    let Ok((position, chunk_pos, view_distance, streamer, sender)) =
        world.query_one_mut::<(&Position, &mut ChunkPosition, &ViewDistance, &mut ChunkStreamer, &ConnectionSender)>(entity)
    else {
        return;
    };

    let new_cx = (position.0.x.floor() as i32) >> 4;
    let new_cz = (position.0.z.floor() as i32) >> 4;
    if new_cx == chunk_pos.chunk_x && new_cz == chunk_pos.chunk_z {
        return;
    }
    chunk_pos.chunk_x = new_cx;
    chunk_pos.chunk_z = new_cz;

    let _ = sender.0.send(InternalPacket::SetCenterChunk { chunk_x: new_cx, chunk_z: new_cz });

    let vd = view_distance.0;
    let mut desired = std::collections::HashSet::new();
    for cx in (new_cx - vd)..=(new_cx + vd) {
        for cz in (new_cz - vd)..=(new_cz + vd) {
            desired.insert(ChunkPos::new(cx, cz));
        }
    }

    let to_unload: Vec<ChunkPos> = streamer.loaded.difference(&desired).copied().collect();
    for pos in &to_unload {
        let _ = sender.0.send(InternalPacket::UnloadChunk { chunk_x: pos.x, chunk_z: pos.z });
        streamer.loaded.remove(pos);
    }

    let mut to_load: Vec<ChunkPos> = desired.difference(&streamer.loaded).copied().collect();
    to_load.sort_by_key(|pos| (pos.x - new_cx).abs() + (pos.z - new_cz).abs());
    let _ = sender.0.send(InternalPacket::ChunkBatchStart);
    let mut batch_size = 0i32;
    for pos in &to_load {
        let packet = world_state.get_chunk_packet(pos.x, pos.z);
        let _ = sender.0.send(packet);
        streamer.loaded.insert(*pos);
        batch_size += 1;
    }
    let _ = sender.0.send(InternalPacket::ChunkBatchFinished { batch_size });
}

// === Visibility ===

/// Spawns/despawns/moves entities for each player based on actual block
/// distance (`config.view_distance_blocks`), independent of chunk view distance.
fn tick_entity_tracking(world: &mut World, config: &ServerConfig) {
    let radius = config.view_distance_blocks;

    let snapshot: Vec<(Entity, i32, Vec3d, f32, f32)> = world
        .query::<(&EntityId, &Position, &Rotation)>()
        .iter()
        .map(|(e, (id, pos, rot))| (e, id.0, pos.0, rot.yaw, rot.pitch))
        .collect();

    for &(viewer_entity, viewer_id, viewer_pos, _, _) in &snapshot {
        let should_see: std::collections::HashSet<i32> = snapshot
            .iter()
            .filter(|&&(_, other_id, other_pos, _, _)| other_id != viewer_id && distance(&viewer_pos, &other_pos) <= radius)
            .map(|&(_, id, _, _, _)| id)
            .collect();

        let (newly_visible, newly_hidden) = {
            let Ok(tracked) = world.query_one_mut::<&mut TrackedEntities>(viewer_entity) else { continue };
            let newly_visible: Vec<i32> = should_see.difference(&tracked.visible).copied().collect();
            let newly_hidden: Vec<i32> = tracked.visible.difference(&should_see).copied().collect();
            tracked.visible = should_see;
            (newly_visible, newly_hidden)
        };

        let Ok(sender) = world.query_one_mut::<&ConnectionSender>(viewer_entity) else { continue };
        for &other_id in &newly_visible {
            if let Some(&(other_entity, _, other_pos, yaw, pitch)) = snapshot.iter().find(|&&(_, id, _, _, _)| id == other_id) {
                let Ok(other_profile) = world.query_one_mut::<&Profile>(other_entity) else { continue };
                let uuid = other_profile.0.uuid;
                let Ok(sender) = world.query_one_mut::<&ConnectionSender>(viewer_entity) else { continue };
                let _ = sender.0.send(InternalPacket::SpawnEntity {
                    entity_id: other_id,
                    entity_uuid: uuid,
                    entity_type: 128, // player
                    x: other_pos.x,
                    y: other_pos.y,
                    z: other_pos.z,
                    pitch: degrees_to_angle(pitch),
                    yaw: degrees_to_angle(yaw),
                    head_yaw: degrees_to_angle(yaw),
                    data: 0,
                    velocity_x: 0,
                    velocity_y: 0,
                    velocity_z: 0,
                });
                let _ = sender.0.send(InternalPacket::SetHeadRotation { entity_id: other_id, head_yaw: degrees_to_angle(yaw) });
            }
        }
        if !newly_hidden.is_empty() {
            let Ok(sender) = world.query_one_mut::<&ConnectionSender>(viewer_entity) else { continue };
            let _ = sender.0.send(InternalPacket::RemoveEntities { entity_ids: newly_hidden });
        }
    }
}

fn distance(a: &Vec3d, b: &Vec3d) -> f64 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    let dz = a.z - b.z;
    (dx * dx + dy * dy + dz * dz).sqrt()
}

/// Broadcasts relative-move / rotation packets for players whose position or
/// rotation changed this tick, to everyone currently tracking them.
fn tick_entity_movement_broadcast(world: &mut World) {
    let mut updates: Vec<(i32, Vec3d, Vec3d, f32, f32, f32, f32, bool)> = Vec::new();
    for (_, (id, pos, prev_pos, rot, prev_rot, on_ground)) in
        world.query::<(&EntityId, &Position, &mut PreviousPosition, &Rotation, &mut PreviousRotation, &OnGround)>().iter()
    {
        if pos.0 != prev_pos.0 || rot.yaw != prev_rot.yaw || rot.pitch != prev_rot.pitch {
            updates.push((id.0, pos.0, prev_pos.0, rot.yaw, rot.pitch, prev_rot.yaw, prev_rot.pitch, on_ground.0));
            prev_pos.0 = pos.0;
            prev_rot.yaw = rot.yaw;
            prev_rot.pitch = rot.pitch;
        }
    }
    if updates.is_empty() {
        return;
    }

    let viewers: Vec<(Entity, std::collections::HashSet<i32>)> =
        world.query::<&TrackedEntities>().iter().map(|(e, t)| (e, t.visible.clone())).collect();

    for (moved_id, pos, prev_pos, yaw, pitch, prev_yaw, prev_pitch, on_ground) in updates {
        let dx = pos.x - prev_pos.x;
        let dy = pos.y - prev_pos.y;
        let dz = pos.z - prev_pos.z;
        let moved_far = dx.abs() > 8.0 || dy.abs() > 8.0 || dz.abs() > 8.0;
        let rotated = yaw != prev_yaw || pitch != prev_pitch;

        let packet = if moved_far {
            InternalPacket::TeleportEntity {
                entity_id: moved_id,
                x: pos.x,
                y: pos.y,
                z: pos.z,
                yaw: degrees_to_angle(yaw),
                pitch: degrees_to_angle(pitch),
                on_ground,
            }
        } else if dx != 0.0 || dy != 0.0 || dz != 0.0 {
            let delta_x = (dx * 4096.0) as i16;
            let delta_y = (dy * 4096.0) as i16;
            let delta_z = (dz * 4096.0) as i16;
            if rotated {
                InternalPacket::UpdateEntityPositionAndRotation {
                    entity_id: moved_id,
                    delta_x,
                    delta_y,
                    delta_z,
                    yaw: degrees_to_angle(yaw),
                    pitch: degrees_to_angle(pitch),
                    on_ground,
                }
            } else {
                InternalPacket::UpdateEntityPosition { entity_id: moved_id, delta_x, delta_y, delta_z, on_ground }
            }
        } else {
            InternalPacket::UpdateEntityRotation { entity_id: moved_id, yaw: degrees_to_angle(yaw), pitch: degrees_to_angle(pitch), on_ground }
        };

        for &(viewer_entity, ref visible) in &viewers {
            if !visible.contains(&moved_id) {
                continue;
            }
            if let Ok(sender) = world.query_one_mut::<&ConnectionSender>(viewer_entity) {
                let _ = sender.0.send(packet.clone());
                if rotated {
                    let _ = sender.0.send(InternalPacket::SetHeadRotation { entity_id: moved_id, head_yaw: degrees_to_angle(yaw) });
                }
            }
        }
    }
}

// === Misc ambient systems ===

fn tick_keep_alive(world: &mut World) {
    let now = Instant::now();
    let mut to_disconnect = Vec::new();
    for (entity, (keep_alive, sender)) in world.query::<(&mut KeepAlive, &ConnectionSender)>().iter() {
        if keep_alive.pending.is_none() && now.duration_since(keep_alive.last_sent).as_secs() >= KEEP_ALIVE_INTERVAL_SECS {
            let id = keep_alive.next_id;
            keep_alive.next_id += 1;
            let _ = sender.0.send(InternalPacket::KeepAliveClientbound { id });
            keep_alive.pending = Some(id);
            keep_alive.last_sent = now;
        }
        if keep_alive.pending.is_some() && now.duration_since(keep_alive.last_response).as_secs() >= KEEP_ALIVE_TIMEOUT_SECS {
            let _ = sender.0.send(InternalPacket::Disconnect { reason: TextComponent::plain("Timed out") });
            to_disconnect.push(entity);
        }
    }
    for entity in to_disconnect {
        world.despawn(entity).ok();
    }
}

fn tick_world_time(world_state: &mut WorldState, world: &World) {
    world_state.world_age += 1;
    world_state.time_of_day += 1;
    if world_state.world_age % 20 == 0 {
        let packet = InternalPacket::UpdateTime { world_age: world_state.world_age, time_of_day: world_state.time_of_day };
        for (_, sender) in world.query::<&ConnectionSender>().iter() {
            let _ = sender.0.send(packet.clone());
        }
    }
}

pub fn broadcast_to_all(world: &World, packet: InternalPacket) {
    for (_, sender) in world.query::<&ConnectionSender>().iter() {
        let _ = sender.0.send(packet.clone());
    }
}

pub fn broadcast_except(world: &World, except: Entity, packet: InternalPacket) {
    for (entity, sender) in world.query::<&ConnectionSender>().iter() {
        if entity != except {
            let _ = sender.0.send(packet.clone());
        }
    }
}

fn offset_by_face(pos: &BlockPos, face: u8) -> BlockPos {
    match face {
        0 => BlockPos::new(pos.x, pos.y - 1, pos.z),
        1 => BlockPos::new(pos.x, pos.y + 1, pos.z),
        2 => BlockPos::new(pos.x, pos.y, pos.z - 1),
        3 => BlockPos::new(pos.x, pos.y, pos.z + 1),
        4 => BlockPos::new(pos.x - 1, pos.y, pos.z),
        5 => BlockPos::new(pos.x + 1, pos.y, pos.z),
        _ => *pos,
    }
}

#[allow(dead_code)]
pub fn player_count(world: &World) -> usize {
    world.query::<&EntityId>().iter().count()
}

fn degrees_to_angle(deg: f32) -> u8 {
    ((deg / 360.0) * 256.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn break_ticks_matches_literal_scenario() {
        // hardness 1.5 (stone), tool_speed 1.0, correct tool -> 75 ticks.
        let ticks = calculate_break_ticks(1, Some(821)).unwrap();
        assert_eq!(ticks, 75);
    }

    #[test]
    fn wrong_tool_penalizes_hardness_by_five() {
        // hardness 1.5 with no pickaxe held -> 1.5*5 = 7.5 -> ceil(375) = 375 ticks.
        let ticks = calculate_break_ticks(1, None).unwrap();
        assert_eq!(ticks, 375);
    }

    #[test]
    fn unbreakable_block_returns_none() {
        assert_eq!(calculate_break_ticks(79, Some(821)), None); // bedrock
    }

    #[test]
    fn dirt_break_ticks_need_no_tool() {
        let ticks = calculate_break_ticks(10, None).unwrap();
        assert_eq!(ticks, 25); // ceil(0.5*50/1.0), no harvest tool required
    }

    #[test]
    fn distance_check_matches_euclidean() {
        let a = Vec3d::new(0.0, 0.0, 0.0);
        let b = Vec3d::new(3.0, 0.0, 4.0);
        assert_eq!(distance(&a, &b), 5.0);
    }
}
