use crate::config::ServerConfig;
use crate::tick;
use anyhow::Result;
use blockwright_protocol_core::{Connection, ConnectionState, InternalPacket, KnownPack, ProtocolAdapter};
use blockwright_protocol_v1_21::V1_21Adapter;
use blockwright_types::GameProfile;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Handle a single client connection through the entire protocol lifecycle.
pub async fn handle_connection(
    stream: TcpStream,
    config: Arc<ServerConfig>,
    new_player_tx: mpsc::UnboundedSender<tick::NewPlayer>,
    player_count: impl Fn() -> usize,
) {
    let peer = stream.peer_addr().unwrap_or_else(|_| "unknown".parse().unwrap());
    let mut conn = Connection::new(stream);
    let adapter = V1_21Adapter::new();

    if let Err(e) = handle_connection_inner(&mut conn, &adapter, &config, &new_player_tx, peer, &player_count).await {
        debug!("Connection {} ended: {}", peer, e);
    }
}

async fn handle_connection_inner(
    conn: &mut Connection,
    adapter: &V1_21Adapter,
    config: &ServerConfig,
    new_player_tx: &mpsc::UnboundedSender<tick::NewPlayer>,
    peer: std::net::SocketAddr,
    player_count: &impl Fn() -> usize,
) -> Result<()> {
    // === Handshake ===
    let (id, mut data) = conn.read_packet().await?;
    let packet = adapter.decode_packet(ConnectionState::Handshaking, id, &mut data)?;

    let next_state = match packet {
        InternalPacket::Handshake {
            protocol_version,
            next_state,
            ..
        } => {
            debug!("Handshake from {}: protocol={}, next_state={}", peer, protocol_version, next_state);
            if protocol_version != adapter.protocol_version() {
                warn!(
                    "Client {} has protocol version {}, expected {}",
                    peer,
                    protocol_version,
                    adapter.protocol_version()
                );
            }
            next_state
        }
        _ => return Err(anyhow::anyhow!("Expected handshake packet")),
    };

    match ConnectionState::from_handshake_next(next_state) {
        Some(ConnectionState::Status) => handle_status(conn, adapter, config, player_count).await,
        Some(ConnectionState::Login) => {
            let profile = handle_login(conn, adapter, config).await?;
            handle_configuration(conn, adapter).await?;
            handle_play(conn, new_player_tx, profile).await
        }
        _ => Err(anyhow::anyhow!("Invalid next state: {}", next_state)),
    }
}

async fn handle_status(
    conn: &mut Connection,
    adapter: &V1_21Adapter,
    config: &ServerConfig,
    player_count: &impl Fn() -> usize,
) -> Result<()> {
    loop {
        let (id, mut data) = conn.read_packet().await?;
        let packet = adapter.decode_packet(ConnectionState::Status, id, &mut data)?;

        match packet {
            InternalPacket::StatusRequest => {
                let online = player_count();
                let response_json = format!(
                    r#"{{"version":{{"name":"1.21.1","protocol":767}},"players":{{"max":{},"online":{}}},"description":{{"text":"{}"}}}}"#,
                    config.max_players, online, config.motd
                );
                send_packet(conn, adapter, ConnectionState::Status, &InternalPacket::StatusResponse { json: response_json }).await?;
            }
            InternalPacket::PingRequest { payload } => {
                send_packet(conn, adapter, ConnectionState::Status, &InternalPacket::PongResponse { payload }).await?;
                return Ok(());
            }
            _ => {}
        }
    }
}

async fn handle_login(conn: &mut Connection, adapter: &V1_21Adapter, config: &ServerConfig) -> Result<GameProfile> {
    // Wait for Login Start
    let (id, mut data) = conn.read_packet().await?;
    let packet = adapter.decode_packet(ConnectionState::Login, id, &mut data)?;

    let (name, client_uuid) = match packet {
        InternalPacket::LoginStart { name, uuid } => {
            info!("Login Start from: {} ({})", name, uuid);
            (name, uuid)
        }
        _ => return Err(anyhow::anyhow!("Expected Login Start")),
    };

    // Offline mode only — online-mode session verification is not implemented.

    // Enable compression
    let compression_threshold = 256;
    send_packet(conn, adapter, ConnectionState::Login, &InternalPacket::SetCompression { threshold: compression_threshold }).await?;
    conn.enable_compression(compression_threshold);

    // Build profile (offline mode: generate UUID from name)
    let uuid = if config.online_mode { client_uuid } else { offline_uuid(&name) };

    let profile = GameProfile {
        uuid,
        name: name.clone(),
        properties: Vec::new(),
    };

    // Send Login Success
    send_packet(conn, adapter, ConnectionState::Login, &InternalPacket::LoginSuccess { profile: profile.clone() }).await?;

    // Wait for Login Acknowledged
    let (id, mut data) = conn.read_packet().await?;
    let ack = adapter.decode_packet(ConnectionState::Login, id, &mut data)?;
    match ack {
        InternalPacket::LoginAcknowledged => {
            debug!("Login acknowledged by {}", name);
        }
        _ => return Err(anyhow::anyhow!("Expected Login Acknowledged")),
    }

    Ok(profile)
}

async fn handle_configuration(conn: &mut Connection, adapter: &V1_21Adapter) -> Result<()> {
    // Send Known Packs request (empty — we don't have any)
    send_packet(
        conn,
        adapter,
        ConnectionState::Configuration,
        &InternalPacket::KnownPacksRequest {
            packs: vec![KnownPack {
                namespace: "minecraft".into(),
                id: "core".into(),
                version: "1.21".into(),
            }],
        },
    )
    .await?;

    // Wait for Known Packs response
    let (id, mut data) = conn.read_packet().await?;
    let packet = adapter.decode_packet(ConnectionState::Configuration, id, &mut data)?;
    match packet {
        InternalPacket::KnownPacksResponse { packs } => {
            debug!("Client knows {} packs", packs.len());
        }
        _ => {
            debug!("Expected Known Packs response, got something else (id=0x{:02X}), continuing", id);
        }
    }

    // Send all registry data
    let registries = adapter.registry_data();
    for registry_packet in &registries {
        send_packet(conn, adapter, ConnectionState::Configuration, registry_packet).await?;
    }

    // Send Finish Configuration
    send_packet(conn, adapter, ConnectionState::Configuration, &InternalPacket::FinishConfiguration).await?;

    // Read until we get Finish Configuration Ack (client may send Client Information, Plugin Messages first)
    loop {
        let (id, mut data) = conn.read_packet().await?;
        let packet = adapter.decode_packet(ConnectionState::Configuration, id, &mut data)?;
        match packet {
            InternalPacket::FinishConfigurationAck => {
                debug!("Configuration finished");
                return Ok(());
            }
            InternalPacket::ClientInformation { locale, view_distance, .. } => {
                debug!("Client info: locale={}, view_distance={}", locale, view_distance);
            }
            InternalPacket::PluginMessage { channel, .. } => {
                debug!("Plugin message: {}", channel);
            }
            _ => {
                debug!("Ignoring config packet id=0x{:02X}", id);
            }
        }
    }
}

/// Hand off to the tick loop and pump packets in both directions until the
/// connection closes. From here on this task never touches game state
/// directly — it only shuttles bytes to/from the two channels the tick loop
/// gave it.
async fn handle_play(
    conn: &mut Connection,
    new_player_tx: &mpsc::UnboundedSender<tick::NewPlayer>,
    profile: GameProfile,
) -> Result<()> {
    let player_name = profile.name.clone();

    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<InternalPacket>();
    let (inbound_tx, inbound_rx) = mpsc::unbounded_channel::<tick::InboundPacket>();
    let (eid_tx, eid_rx) = oneshot::channel::<i32>();

    new_player_tx
        .send(tick::NewPlayer {
            profile,
            packet_tx: outbound_tx,
            packet_rx: inbound_rx,
            assigned_entity_id: eid_tx,
        })
        .map_err(|_| anyhow::anyhow!("tick loop gone"))?;

    let entity_id = eid_rx.await.map_err(|_| anyhow::anyhow!("tick loop dropped entity id handoff"))?;

    // `into_split` requires an owned `Connection`; swap in a dummy so the
    // caller's `&mut Connection` stays valid (it's dropped right after this
    // function returns anyway).
    let owned = std::mem::replace(conn, Connection::new_dummy());
    let (mut reader, mut writer) = owned.into_split();
    let write_adapter = V1_21Adapter::new();

    let writer_task = tokio::spawn(async move {
        while let Some(packet) = outbound_rx.recv().await {
            let encoded = match write_adapter.encode_packet(ConnectionState::Play, &packet) {
                Ok(encoded) => encoded,
                Err(e) => {
                    warn!("Failed to encode outbound packet: {}", e);
                    continue;
                }
            };
            let mut data = encoded;
            let packet_id = match blockwright_protocol_core::read_varint(&mut data) {
                Ok(id) => id,
                Err(_) => continue,
            };
            if writer.write_packet(packet_id, &data).await.is_err() {
                break;
            }
        }
    });

    let read_adapter = V1_21Adapter::new();
    let result: Result<()> = loop {
        match reader.read_packet().await {
            Ok((id, mut data)) => match read_adapter.decode_packet(ConnectionState::Play, id, &mut data) {
                Ok(packet) => {
                    if inbound_tx.send(tick::InboundPacket { entity_id, packet }).is_err() {
                        break Ok(());
                    }
                }
                Err(e) => {
                    debug!("Failed to decode Play packet id=0x{:02X}: {}", id, e);
                }
            },
            Err(e) => break Err(e),
        }
    };

    writer_task.abort();
    info!("{} left the connection loop", player_name);
    result
}

/// Send an InternalPacket using the adapter's encode.
async fn send_packet(conn: &mut Connection, adapter: &V1_21Adapter, state: ConnectionState, packet: &InternalPacket) -> Result<()> {
    let encoded = adapter.encode_packet(state, packet)?;
    // The encoded data includes the packet ID as a varint prefix, then payload.
    // Connection::write_packet expects (packet_id, payload) separately.
    // So we need to split them.
    let mut data = encoded;
    let packet_id = blockwright_protocol_core::read_varint(&mut data)?;
    conn.write_packet(packet_id, &data).await
}

/// Generate an offline-mode UUID from a player name (MD5 hash, version 3 style).
fn offline_uuid(name: &str) -> Uuid {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};
    let input = format!("OfflinePlayer:{}", name);
    let mut hasher = DefaultHasher::new();
    input.hash(&mut hasher);
    let h1 = hasher.finish();
    input.len().hash(&mut hasher);
    let h2 = hasher.finish();
    let mut bytes = [0u8; 16];
    bytes[..8].copy_from_slice(&h1.to_be_bytes());
    bytes[8..].copy_from_slice(&h2.to_be_bytes());
    // Set version 3 and variant bits
    bytes[6] = (bytes[6] & 0x0f) | 0x30;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;
    Uuid::from_bytes(bytes)
}
