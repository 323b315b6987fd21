//! Per-connection session: handshake, then opcode dispatch
//!
//! One task per connection. The main loop selects between the inbound
//! socket (under the idle deadline) and the session's outbound queue;
//! frames queued by peers are only transmitted here, never interpreted.
//! Every terminal condition funnels into the registry's idempotent
//! disconnect.

use std::sync::Arc;
use std::time::Duration;

use pewter_core::{is_lobby, validate, ClientId, ServerConfig, LOBBY, MAX_CLIENTS};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, RwLock};
use tokio::time::{timeout, timeout_at, Instant};
use tracing::debug;

use crate::error::{Error, Result};
use crate::frame::{write_frame, FrameReader};
use crate::protocol::{self, op, HANDSHAKE_OK};
use crate::registry::Registry;

pub(crate) type SharedRegistry = Arc<RwLock<Registry>>;

/// Entry point for one accepted connection. Owns the socket until the
/// session dies, then runs teardown.
pub(crate) async fn handle_connection(
    stream: TcpStream,
    registry: SharedRegistry,
    config: Arc<ServerConfig>,
) {
    let peer = stream.peer_addr().ok();
    let (read_half, write_half) = stream.into_split();
    let reader = FrameReader::new(read_half);
    let mut writer = write_half;

    let (tx, rx) = mpsc::unbounded_channel();

    let id = {
        let mut reg = registry.write().await;
        match reg.admit(tx) {
            Some(id) => id,
            None => {
                let count = reg.client_count();
                drop(reg);
                let frame =
                    protocol::error_frame(&format!("Server is full ({count}/{MAX_CLIENTS})"));
                let _ = write_frame(&mut writer, &frame).await;
                debug!(?peer, "connection rejected, server full");
                return;
            }
        }
    };
    debug!(?peer, id, "connection admitted");

    let mut session = Session {
        id,
        reader,
        writer,
        rx,
        registry: registry.clone(),
        config,
    };

    let reason = match session.run().await {
        Ok(()) => "Disconnected".to_string(),
        Err(Error::Rejected(reason)) => reason,
        Err(e) => e.to_string(),
    };

    registry.write().await.disconnect(id, &reason);
}

/// What one turn of the main loop produced.
enum Turn {
    /// A frame queued by a peer (or the registry), ready to transmit.
    Outbound(Option<Vec<u8>>),
    /// An opcode byte from the client, or a read failure / idle expiry.
    Inbound(Result<u8>),
}

struct Session {
    id: ClientId,
    reader: FrameReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    rx: mpsc::UnboundedReceiver<Vec<u8>>,
    registry: SharedRegistry,
    config: Arc<ServerConfig>,
}

impl Session {
    async fn run(&mut self) -> Result<()> {
        self.handshake().await?;

        let idle = Duration::from_secs(self.config.idle_timeout_secs);
        let mut read_deadline = Instant::now() + idle;

        loop {
            // Both branch futures touch disjoint fields, so the handler
            // below is free to borrow the whole session again.
            let turn = tokio::select! {
                queued = self.rx.recv() => Turn::Outbound(queued),
                opcode = timeout_at(read_deadline, self.reader.read_u8()) => {
                    Turn::Inbound(opcode.unwrap_or(Err(Error::PingTimeout)))
                }
            };

            match turn {
                Turn::Outbound(Some(frame)) => {
                    write_frame(&mut self.writer, &frame).await?;
                }
                // The registry dropped our sender: kicked or server
                // shutdown. Teardown already ran; just close the socket.
                Turn::Outbound(None) => return Ok(()),
                Turn::Inbound(opcode) => {
                    self.dispatch(opcode?).await?;
                    read_deadline = Instant::now() + idle;
                }
            }
        }
    }

    // --- handshake ------------------------------------------------------

    /// Version window, script match, and nickname checks, in order.
    /// Failures answer with an error frame before rejecting; the
    /// connect-hook veto rejects silently.
    async fn handshake(&mut self) -> Result<()> {
        let idle = Duration::from_secs(self.config.idle_timeout_secs);
        let version = timeout(idle, self.reader.read_n(3))
            .await
            .map_err(|_| Error::PingTimeout)??;
        let nick_bytes = timeout(idle, self.reader.read_until_nul())
            .await
            .map_err(|_| Error::PingTimeout)??;

        if let Err(e) = self
            .config
            .version
            .check(version[0], version[1], version[2])
        {
            return self.reject(e.to_string()).await;
        }
        if !validate::valid_name_charset(&nick_bytes) {
            return self.reject("Bad nickname".to_string()).await;
        }
        if nick_bytes.len() > validate::MAX_NAME_LEN {
            return self.reject("Nick too long".to_string()).await;
        }
        // Charset already restricts to ASCII.
        let nick = String::from_utf8_lossy(&nick_bytes).into_owned();

        if !self.registry.write().await.claim_nick(self.id, &nick) {
            return self
                .reject("This nick is already on the server".to_string())
                .await;
        }

        write_frame(&mut self.writer, &[HANDSHAKE_OK]).await?;

        {
            let mut reg = self.registry.write().await;
            reg.identified(self.id);
            let Some(info) = reg.info(self.id) else {
                return Err(Error::Rejected("Connection refused".to_string()));
            };
            if !reg.hooks().allow_connect(&info) {
                return Err(Error::Rejected("Connection refused".to_string()));
            }
            reg.join_room(self.id, LOBBY);
        }
        debug!(id = self.id, nick = %nick, "handshake complete");
        Ok(())
    }

    /// Send a handshake error frame, then fail with the same text.
    async fn reject(&mut self, reason: String) -> Result<()> {
        let frame = protocol::error_frame(&reason);
        let _ = write_frame(&mut self.writer, &frame).await;
        Err(Error::Rejected(reason))
    }

    // --- dispatch -------------------------------------------------------

    async fn dispatch(&mut self, opcode: u8) -> Result<()> {
        match opcode {
            op::PING => Ok(()),
            op::JOIN => self.on_join().await,
            op::CHAT => self.on_chat(op::CHAT).await,
            op::EMOTE => self.on_chat(op::EMOTE).await,
            op::KICK => self.on_kick().await,
            op::BRUSH_SIZE => self.on_brush_size().await,
            op::BRUSH_SHAPE => self.on_brush_shape().await,
            op::SELECT_ELEMENT => self.on_select_element().await,
            op::REPLACE_MODE => self.on_replace_mode().await,
            op::DECO_COLOR => self.on_deco_color().await,
            op::STAMP => self.on_stamp().await,
            op::SYNC_REQUEST => self.on_sync_reply().await,
            op::SYNC_PROPS => self.on_sync_props().await,
            other => match protocol::relay_payload_len(other) {
                Some(len) => self.relay_fixed(other, len).await,
                None => Err(Error::Desync(format!("Unknown opcode {other}"))),
            },
        }
    }

    /// Plain relay: read the fixed payload and fan it out unchanged.
    async fn relay_fixed(&mut self, opcode: u8, len: usize) -> Result<()> {
        let payload = self.reader.read_n(len).await?;
        let frame = protocol::relay(opcode, self.id, &payload);
        self.registry.read().await.broadcast_from(self.id, &frame);
        Ok(())
    }

    /// Queue a colored notice for this session through its own outbound
    /// queue, preserving the single-writer discipline.
    async fn notice(&self, text: &str) {
        let frame = protocol::server_message(text, protocol::NOTICE_RGB);
        self.registry.read().await.send_to(self.id, frame);
    }

    async fn on_join(&mut self) -> Result<()> {
        let name_bytes = self.reader.read_until_nul().await?;
        if !validate::valid_name(&name_bytes) {
            self.notice("Invalid room name").await;
            return Ok(());
        }
        let name = String::from_utf8_lossy(&name_bytes).into_owned();

        let mut reg = self.registry.write().await;
        let Some(info) = reg.info(self.id) else {
            return Ok(());
        };
        if !reg.hooks().allow_join(&info, &name) {
            return Ok(());
        }
        reg.join_room(self.id, &name);
        Ok(())
    }

    async fn on_chat(&mut self, opcode: u8) -> Result<()> {
        let msg = self.reader.read_until_nul().await?;
        if !validate::printable(&msg) {
            self.notice("Message contains unprintable characters").await;
            return Ok(());
        }
        if msg.len() > validate::MAX_MESSAGE_LEN {
            self.notice("Message too long").await;
            return Ok(());
        }
        let text = String::from_utf8_lossy(&msg).into_owned();

        let reg = self.registry.read().await;
        let Some(info) = reg.info(self.id) else {
            return Ok(());
        };
        if !reg.hooks().allow_message(&info, &text) {
            return Ok(());
        }
        reg.hooks().on_chat(&info, &text);
        reg.broadcast_from(self.id, &protocol::relay_text(opcode, self.id, &msg));
        Ok(())
    }

    async fn on_kick(&mut self) -> Result<()> {
        let nick_bytes = self.reader.read_until_nul().await?;
        let reason_bytes = self.reader.read_until_nul().await?;
        if !validate::valid_message(&reason_bytes) {
            self.notice("Bad kick reason").await;
            return Ok(());
        }
        let nick = String::from_utf8_lossy(&nick_bytes).into_owned();
        let reason = String::from_utf8_lossy(&reason_bytes).into_owned();

        let mut reg = self.registry.write().await;
        let authorized = match reg.room_of(self.id) {
            Some(room) if !is_lobby(room) => reg.is_operator(self.id),
            _ => false,
        };
        if !authorized {
            reg.send_to(
                self.id,
                protocol::server_message(
                    "You can't kick people from here",
                    protocol::NOTICE_RGB,
                ),
            );
            return Ok(());
        }
        // First nickname match in join order; at most one kick per
        // request.
        if let Some(target) = reg.kick_target(self.id, &nick) {
            reg.kick(target, self.id, &reason);
        }
        Ok(())
    }

    async fn on_brush_size(&mut self) -> Result<()> {
        let payload = self.reader.read_n(2).await?;
        let mut reg = self.registry.write().await;
        if let Some(mirror) = reg.mirror_mut(self.id) {
            mirror.brush_size = [payload[0], payload[1]];
        }
        reg.broadcast_from(self.id, &protocol::relay(op::BRUSH_SIZE, self.id, &payload));
        Ok(())
    }

    async fn on_brush_shape(&mut self) -> Result<()> {
        let mut reg = self.registry.write().await;
        if let Some(mirror) = reg.mirror_mut(self.id) {
            mirror.cycle_brush_shape();
        }
        reg.broadcast_from(self.id, &[op::BRUSH_SHAPE, self.id]);
        Ok(())
    }

    async fn on_select_element(&mut self) -> Result<()> {
        let payload = self.reader.read_n(2).await?;
        let (a, b) = (payload[0], payload[1]);
        let mut reg = self.registry.write().await;
        if [a, b] == protocol::CHAT_SENTINEL {
            // Chat-window focus: remember it, relay nothing.
            if let Some(mirror) = reg.mirror_mut(self.id) {
                mirror.chat_focused = true;
            }
            return Ok(());
        }
        if let Some(mirror) = reg.mirror_mut(self.id) {
            mirror.set_selection(a, b);
        }
        reg.broadcast_from(
            self.id,
            &protocol::relay(op::SELECT_ELEMENT, self.id, &payload),
        );
        Ok(())
    }

    async fn on_replace_mode(&mut self) -> Result<()> {
        let payload = self.reader.read_n(1).await?;
        let mut reg = self.registry.write().await;
        if let Some(mirror) = reg.mirror_mut(self.id) {
            mirror.replace_mode = payload[0];
        }
        reg.broadcast_from(
            self.id,
            &protocol::relay(op::REPLACE_MODE, self.id, &payload),
        );
        Ok(())
    }

    async fn on_deco_color(&mut self) -> Result<()> {
        let payload = self.reader.read_n(4).await?;
        let mut reg = self.registry.write().await;
        if let Some(mirror) = reg.mirror_mut(self.id) {
            mirror.deco_color = [payload[0], payload[1], payload[2], payload[3]];
        }
        reg.broadcast_from(self.id, &protocol::relay(op::DECO_COLOR, self.id, &payload));
        Ok(())
    }

    /// Stamp: 3-byte location, 3-byte big-endian length, payload.
    /// Relayed as `[66, origin, location, length, payload]`.
    async fn on_stamp(&mut self) -> Result<()> {
        let header = self.reader.read_n(6).await?;
        let len = protocol::len_be3(&header[3..6]);
        if len > self.config.max_stamp_bytes {
            return Err(Error::Desync(format!("Stamp length {len} over cap")));
        }
        let payload = self.reader.read_n(len).await?;

        let mut frame = protocol::relay(op::STAMP, self.id, &header);
        frame.extend_from_slice(&payload);
        self.registry.read().await.broadcast_from(self.id, &frame);
        Ok(())
    }

    /// Sync-stamp reply: the first header byte addresses the joiner, the
    /// remaining three carry the payload length. Forwarded as
    /// `[129, length, payload]`; dropped if the joiner is gone.
    async fn on_sync_reply(&mut self) -> Result<()> {
        let header = self.reader.read_n(4).await?;
        let target = header[0];
        let len = protocol::len_be3(&header[1..4]);
        if len > self.config.max_stamp_bytes {
            return Err(Error::Desync(format!("Sync stamp length {len} over cap")));
        }
        let payload = self.reader.read_n(len).await?;

        let mut frame = Vec::with_capacity(4 + payload.len());
        frame.push(op::SYNC_STAMP);
        frame.extend_from_slice(&header[1..4]);
        frame.extend_from_slice(&payload);
        self.registry.read().await.send_to(target, frame);
        Ok(())
    }

    /// Sync-properties reply: `[target, command, value]`. Only
    /// whitelisted state opcodes pass; anything else is dropped.
    async fn on_sync_props(&mut self) -> Result<()> {
        let data = self.reader.read_n(3).await?;
        let (target, command, value) = (data[0], data[1], data[2]);
        if !protocol::sync_prop_allowed(command) {
            return Ok(());
        }
        self.registry
            .read()
            .await
            .send_to(target, vec![command, self.id, value]);
        Ok(())
    }
}
