//! WebSocket connection handling
//!
//! Each connection runs a read loop plus two helper tasks: a writer draining
//! the outbound queue into the socket, and (after a join) a forwarder that
//! filters room broadcasts against the connection's player identity. The
//! gateway's idempotency guarantees make duplicate connections per player
//! safe; nothing here deduplicates at the transport layer.

use std::sync::Arc;

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use banpick_core::{Audience, BanpickError, DraftError, Faction, SessionStore, normalize_code};
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::gateway;
use crate::state::AppState;
use crate::ws::protocol::{ClientMessage, LobbySnapshot, PrivateDraft, ServerMessage};
use crate::ws::rooms::RoomEnvelope;

/// Identity a connection assumes after a successful join or reconnect
#[derive(Debug, Clone)]
struct ConnIdentity {
    code: String,
    player_id: String,
}

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle a WebSocket connection
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (sender, mut receiver) = socket.split();
    let (out_tx, out_rx) = mpsc::unbounded_channel::<Message>();
    let writer = tokio::spawn(write_outbound(sender, out_rx));

    let mut identity: Option<ConnIdentity> = None;
    let mut forwarder: Option<JoinHandle<()>> = None;

    info!("websocket client connected");

    while let Some(inbound) = receiver.next().await {
        match inbound {
            Ok(Message::Text(text)) => {
                handle_text_message(&text, &state, &mut identity, &mut forwarder, &out_tx).await;
            }
            Ok(Message::Close(_)) => {
                debug!("websocket client sent close frame");
                break;
            }
            Ok(Message::Ping(data)) => {
                let _ = out_tx.send(Message::Pong(data));
            }
            Ok(_) => {
                // Ignore binary and pong frames
            }
            Err(e) => {
                warn!(error = %e, "websocket error");
                break;
            }
        }
    }

    // Stop forwarding room events before announcing the disconnect, so this
    // connection's receiver no longer counts as a room member
    if let Some(handle) = forwarder.take() {
        handle.abort();
        let _ = handle.await;
    }
    drop(out_tx);
    let _ = writer.await;

    match identity {
        Some(identity) => {
            state
                .rooms
                .publish(
                    &identity.code,
                    Audience::Exclude(identity.player_id.clone()),
                    ServerMessage::PlayerDisconnected {
                        player_id: identity.player_id.clone(),
                    },
                )
                .await;
            state.rooms.prune(&identity.code).await;
            info!(
                code = %identity.code,
                player_id = %identity.player_id,
                "websocket client disconnected"
            );
        }
        None => info!("websocket client disconnected"),
    }
}

/// Drain the outbound queue into the socket
async fn write_outbound(
    mut sender: SplitSink<WebSocket, Message>,
    mut out_rx: mpsc::UnboundedReceiver<Message>,
) {
    while let Some(message) = out_rx.recv().await {
        if sender.send(message).await.is_err() {
            break;
        }
    }
}

/// Forward room envelopes addressed to this player into the outbound queue
fn spawn_forwarder(
    mut rx: broadcast::Receiver<RoomEnvelope>,
    player_id: String,
    out_tx: mpsc::UnboundedSender<Message>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(envelope) => {
                    if !envelope.is_for(&player_id) {
                        continue;
                    }
                    match serde_json::to_string(&envelope.message) {
                        Ok(json) => {
                            if out_tx.send(Message::Text(json.into())).is_err() {
                                break;
                            }
                        }
                        Err(e) => error!(error = %e, "failed to serialize room event"),
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "connection lagged behind room broadcasts");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

fn send_to_socket(out_tx: &mpsc::UnboundedSender<Message>, message: &ServerMessage) {
    match serde_json::to_string(message) {
        Ok(json) => {
            let _ = out_tx.send(Message::Text(json.into()));
        }
        Err(e) => error!(error = %e, "failed to serialize server message"),
    }
}

fn send_error(out_tx: &mpsc::UnboundedSender<Message>, error: &BanpickError) {
    send_to_socket(
        out_tx,
        &ServerMessage::Error {
            message: error.to_string(),
            code: gateway::error_code(error).to_string(),
        },
    );
}

fn parse_factions(ids: &[String]) -> Result<Vec<Faction>, DraftError> {
    ids.iter()
        .map(|id| {
            Faction::parse(id)
                .ok_or_else(|| DraftError::InvalidSelection(format!("unknown faction: {id}")))
        })
        .collect()
}

/// Handle one inbound action; every failure is surfaced to this connection
/// only, as an `error` event
async fn handle_text_message(
    text: &str,
    state: &Arc<AppState>,
    identity: &mut Option<ConnIdentity>,
    forwarder: &mut Option<JoinHandle<()>>,
    out_tx: &mpsc::UnboundedSender<Message>,
) {
    let msg: ClientMessage = match serde_json::from_str(text) {
        Ok(msg) => msg,
        Err(e) => {
            debug!(error = %e, "unparseable client message");
            send_to_socket(
                out_tx,
                &ServerMessage::Error {
                    message: format!("invalid message: {e}"),
                    code: "invalid-message".to_string(),
                },
            );
            return;
        }
    };

    match msg {
        ClientMessage::Join {
            code,
            player_id,
            player_name,
        } => {
            let code = normalize_code(&code);
            // Subscribe before dispatching so this connection sees its own
            // join announced
            let rx = state.rooms.join(&code).await;
            let new_forwarder = spawn_forwarder(rx, player_id.clone(), out_tx.clone());

            let result = gateway::apply(state, &code, true, |lobby| {
                lobby.join_guest(&player_id, &player_name)
            })
            .await;

            match result {
                Ok(()) => {
                    if let Some(old) = forwarder.replace(new_forwarder) {
                        old.abort();
                    }
                    *identity = Some(ConnIdentity { code, player_id });
                }
                Err(e) => {
                    new_forwarder.abort();
                    let _ = new_forwarder.await;
                    state.rooms.prune(&code).await;
                    send_error(out_tx, &e);
                }
            }
        }

        ClientMessage::Reconnect { code, player_id } => {
            let code = normalize_code(&code);
            let lobby = match state.store.get(&code).await {
                Ok(lobby) => lobby,
                Err(e) => {
                    send_error(out_tx, &e.into());
                    return;
                }
            };
            let Some(role) = lobby.role_of(&player_id) else {
                send_error(
                    out_tx,
                    &DraftError::UnknownPlayer(player_id.clone()).into(),
                );
                return;
            };

            let rx = state.rooms.join(&code).await;
            if let Some(old) = forwarder.replace(spawn_forwarder(rx, player_id.clone(), out_tx.clone())) {
                old.abort();
            }
            *identity = Some(ConnIdentity {
                code: code.clone(),
                player_id: player_id.clone(),
            });

            state
                .rooms
                .publish(
                    &code,
                    Audience::Exclude(player_id.clone()),
                    ServerMessage::PlayerReconnected {
                        player_id: player_id.clone(),
                    },
                )
                .await;

            // Only the reconnecting connection gets the snapshot plus its
            // own private draft; the opponent's unconfirmed picks stay
            // hidden either way
            send_to_socket(
                out_tx,
                &ServerMessage::ReconnectSuccess {
                    lobby: LobbySnapshot::sanitized(&lobby),
                    private_draft: PrivateDraft::for_role(&lobby, role),
                },
            );
        }

        action => {
            let Some(identity) = identity.as_ref() else {
                send_error(
                    out_tx,
                    &DraftError::Unauthorized("join a lobby first".to_string()).into(),
                );
                return;
            };
            let player_id = identity.player_id.clone();

            let result = match action {
                ClientMessage::StartSelection { code } => {
                    gateway::apply(state, &code, true, |lobby| {
                        lobby.start_selection(&player_id)
                    })
                    .await
                }
                ClientMessage::SaveProgress { code, factions } => {
                    match parse_factions(&factions) {
                        Ok(factions) => {
                            gateway::apply(state, &code, false, |lobby| {
                                lobby.record_progress(&player_id, factions)
                            })
                            .await
                        }
                        Err(e) => Err(e.into()),
                    }
                }
                ClientMessage::ConfirmSelection { code, factions } => {
                    match parse_factions(&factions) {
                        Ok(factions) => {
                            gateway::apply(state, &code, true, |lobby| {
                                lobby.confirm_selection(&player_id, factions)
                            })
                            .await
                        }
                        Err(e) => Err(e.into()),
                    }
                }
                ClientMessage::ConfirmBan { code, faction } => {
                    match Faction::parse(&faction) {
                        Some(faction) => {
                            gateway::apply(state, &code, true, |lobby| {
                                lobby.confirm_ban(&player_id, faction)
                            })
                            .await
                        }
                        None => Err(DraftError::InvalidBan(format!(
                            "unknown faction: {faction}"
                        ))
                        .into()),
                    }
                }
                ClientMessage::Reset { code } => {
                    gateway::apply(state, &code, true, |lobby| lobby.reset(&player_id)).await
                }
                // Join and Reconnect are handled above
                ClientMessage::Join { .. } | ClientMessage::Reconnect { .. } => Ok(()),
            };

            if let Err(e) = result {
                send_error(out_tx, &e);
            }
        }
    }
}
