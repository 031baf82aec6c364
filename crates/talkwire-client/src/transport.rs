//! WebSocket transport for the channel client.
//!
//! Provides [`open`] which spawns a task that owns the WebSocket I/O and the
//! clock. This is a thin layer that executes [`ClientAction`]s and feeds
//! transport outcomes back as [`ClientEvent`]s - protocol logic remains in
//! the Sans-IO [`ChannelClient`].

use std::{
    collections::VecDeque,
    time::{Duration, Instant},
};

use futures_util::{SinkExt, StreamExt};
use talkwire_proto::{ChannelScope, InquiryId, MessageId};
use thiserror::Error;
use tokio::{net::TcpStream, sync::mpsc, task::AbortHandle};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async,
    tungstenite::{
        Message,
        protocol::{CloseFrame, frame::coding::CloseCode},
    },
};

use crate::{
    ChannelClient, ChannelUpdate, ClientAction, ClientError, ClientEvent, ClientOptions,
};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// How often the task ticks the state machine (retry timers, heartbeats,
/// typing expiry). Must be well under the smallest configured interval.
const TICK_PERIOD: Duration = Duration::from_millis(250);

/// Close code reported when the connection dies without a close frame.
const ABNORMAL_CLOSURE: u16 = 1006;

/// Upper bound on one dial attempt. A stalled dial must not block command
/// and tick processing for longer than this.
const DIAL_TIMEOUT: Duration = Duration::from_secs(10);

const CHANNEL_CAPACITY: usize = 64;

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The channel task has shut down; commands can no longer be delivered.
    #[error("channel task has shut down")]
    TaskGone,
}

/// Connection parameters for one channel.
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// Server base URL, e.g. `wss://talkwire.example.com`.
    pub base_url: String,
    /// Bearer token passed as the `token` query parameter.
    pub token: String,
    /// Which channel to join.
    pub scope: ChannelScope,
    /// Timing configuration for the state machine.
    pub options: ClientOptions,
}

/// User intents accepted by the channel task.
#[derive(Debug, Clone)]
pub enum ChannelCommand {
    /// Post a new message.
    SendMessage {
        /// Message text.
        content: String,
        /// Message being replied to, if any.
        reply_to: Option<MessageId>,
        /// Inquiry scope, required on inbox channels.
        inquiry_id: Option<InquiryId>,
    },
    /// Edit an existing message.
    EditMessage {
        /// Message to edit.
        message_id: MessageId,
        /// Replacement text.
        content: String,
    },
    /// Soft-delete an existing message.
    DeleteMessage {
        /// Message to delete.
        message_id: MessageId,
    },
    /// Mark messages read within an inquiry.
    MarkRead {
        /// Inquiry the receipt applies to.
        inquiry_id: InquiryId,
        /// Ids covered by the receipt.
        message_ids: Vec<MessageId>,
    },
    /// Announce typing started.
    StartTyping {
        /// Inquiry scope, present on inbox channels only.
        inquiry_id: Option<InquiryId>,
    },
    /// Announce typing stopped.
    StopTyping {
        /// Inquiry scope, present on inbox channels only.
        inquiry_id: Option<InquiryId>,
    },
    /// Terminal teardown: close with code 1000 and stop the task.
    Disconnect,
}

/// Handle to a running channel task.
///
/// Commands go in, updates come out; dropping the handle (or calling
/// [`ChannelHandle::stop`]) tears the task down.
pub struct ChannelHandle {
    commands: mpsc::Sender<ChannelCommand>,
    updates: mpsc::Receiver<ChannelUpdate>,
    abort_handle: AbortHandle,
}

impl ChannelHandle {
    /// Deliver a command to the channel task.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::TaskGone`] if the task has stopped.
    pub async fn send(&self, command: ChannelCommand) -> Result<(), TransportError> {
        self.commands.send(command).await.map_err(|_| TransportError::TaskGone)
    }

    /// Receive the next notification, or `None` once the task has stopped.
    pub async fn next_update(&mut self) -> Option<ChannelUpdate> {
        self.updates.recv().await
    }

    /// Abort the task immediately, without a close handshake.
    pub fn stop(&self) {
        self.abort_handle.abort();
    }
}

/// Spawn a channel task and connect it to the configured endpoint.
///
/// The task connects immediately and keeps reconnecting per the lifecycle
/// rules until told to disconnect.
pub fn open(config: ChannelConfig) -> ChannelHandle {
    let (command_tx, command_rx) = mpsc::channel(CHANNEL_CAPACITY);
    let (update_tx, update_rx) = mpsc::channel(CHANNEL_CAPACITY);

    let handle = tokio::spawn(run(config, command_rx, update_tx));

    ChannelHandle {
        commands: command_tx,
        updates: update_rx,
        abort_handle: handle.abort_handle(),
    }
}

/// Run the channel task, bridging the state machine to the WebSocket.
async fn run(
    config: ChannelConfig,
    mut commands: mpsc::Receiver<ChannelCommand>,
    updates: mpsc::Sender<ChannelUpdate>,
) {
    let url = config.scope.endpoint_url(&config.base_url, &config.token);
    let mut client: ChannelClient = ChannelClient::new(config.scope, config.options);
    let mut socket: Option<WsStream> = None;

    let mut tick = tokio::time::interval(TICK_PERIOD);
    tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let mut queue: VecDeque<ClientEvent> = VecDeque::from([ClientEvent::Connect]);
    let mut shutting_down = false;

    loop {
        // Drain queued events before selecting on new input, so each action's
        // follow-up events (e.g. a failed dial) are processed in order.
        while let Some(event) = queue.pop_front() {
            match client.handle(event) {
                Ok(actions) => {
                    for action in actions {
                        if !execute(action, &url, &mut socket, &mut queue, &updates).await {
                            return;
                        }
                    }
                },
                Err(error) => {
                    let update = match error {
                        ClientError::NotConnected { operation, .. } => {
                            ChannelUpdate::ActionFailed { operation, reason: error.to_string() }
                        },
                        ref other => ChannelUpdate::ActionFailed {
                            operation: "command",
                            reason: other.to_string(),
                        },
                    };
                    if updates.send(update).await.is_err() {
                        return;
                    }
                },
            }
        }

        if shutting_down {
            return;
        }

        let readable = socket.is_some();
        tokio::select! {
            command = commands.recv() => match command {
                Some(ChannelCommand::Disconnect) | None => {
                    shutting_down = true;
                    queue.push_back(ClientEvent::Disconnect);
                },
                Some(command) => queue.push_back(command_event(command)),
            },

            _ = tick.tick() => queue.push_back(ClientEvent::Tick { now: Instant::now() }),

            inbound = next_inbound(socket.as_mut()), if readable => {
                let now = Instant::now();
                match inbound {
                    Some(Ok(Message::Text(text))) => {
                        queue.push_back(ClientEvent::FrameReceived { text: text.to_string(), now });
                    },
                    Some(Ok(Message::Close(frame))) => {
                        socket = None;
                        let (code, reason) = frame.map_or_else(
                            || (ABNORMAL_CLOSURE, String::new()),
                            |f| (u16::from(f.code), f.reason.to_string()),
                        );
                        queue.push_back(ClientEvent::TransportClosed { code, reason, now });
                    },
                    // Pings and pongs are answered by the protocol layer.
                    Some(Ok(_)) => {},
                    Some(Err(error)) => {
                        socket = None;
                        queue.push_back(ClientEvent::TransportClosed {
                            code: ABNORMAL_CLOSURE,
                            reason: error.to_string(),
                            now,
                        });
                    },
                    None => {
                        socket = None;
                        queue.push_back(ClientEvent::TransportClosed {
                            code: ABNORMAL_CLOSURE,
                            reason: "connection reset".to_string(),
                            now,
                        });
                    },
                }
            },
        }
    }
}

/// Execute one action. Returns false once the update receiver is gone.
async fn execute(
    action: ClientAction,
    url: &str,
    socket: &mut Option<WsStream>,
    queue: &mut VecDeque<ClientEvent>,
    updates: &mpsc::Sender<ChannelUpdate>,
) -> bool {
    match action {
        ClientAction::OpenConnection => {
            match dial(url, DIAL_TIMEOUT).await {
                Ok(stream) => {
                    *socket = Some(stream);
                    queue.push_back(ClientEvent::TransportOpened { now: Instant::now() });
                },
                Err(reason) => {
                    queue.push_back(ClientEvent::TransportFailed {
                        reason,
                        now: Instant::now(),
                    });
                },
            }
            true
        },

        ClientAction::CloseConnection { code, reason } => {
            if let Some(mut stream) = socket.take() {
                let frame = CloseFrame { code: CloseCode::from(code), reason: reason.into() };
                if let Err(error) = stream.close(Some(frame)).await {
                    tracing::debug!(error = %error, "close handshake failed");
                }
            }
            true
        },

        ClientAction::SendFrame(command) => {
            let text = match command.encode() {
                Ok(text) => text,
                Err(error) => {
                    tracing::warn!(error = %error, "dropping unencodable outbound frame");
                    return true;
                },
            };
            if let Some(stream) = socket.as_mut() {
                if let Err(error) = stream.send(Message::Text(text.into())).await {
                    // A failed write means the connection is gone; report it
                    // as an abnormal closure so the supervisor retries.
                    *socket = None;
                    queue.push_back(ClientEvent::TransportClosed {
                        code: ABNORMAL_CLOSURE,
                        reason: error.to_string(),
                        now: Instant::now(),
                    });
                }
            }
            true
        },

        ClientAction::Notify(update) => updates.send(update).await.is_ok(),
    }
}

/// Dial the endpoint, bounding the attempt so the event loop stays live.
async fn dial(url: &str, limit: Duration) -> Result<WsStream, String> {
    match tokio::time::timeout(limit, connect_async(url)).await {
        Ok(Ok((stream, _response))) => Ok(stream),
        Ok(Err(error)) => Err(error.to_string()),
        Err(_) => Err(format!("connect timed out after {limit:?}")),
    }
}

/// Read the next inbound message; pends forever while no socket exists.
async fn next_inbound(
    socket: Option<&mut WsStream>,
) -> Option<Result<Message, tokio_tungstenite::tungstenite::Error>> {
    match socket {
        Some(stream) => stream.next().await,
        None => std::future::pending().await,
    }
}

fn command_event(command: ChannelCommand) -> ClientEvent {
    match command {
        ChannelCommand::SendMessage { content, reply_to, inquiry_id } => {
            ClientEvent::SendMessage { content, reply_to, inquiry_id }
        },
        ChannelCommand::EditMessage { message_id, content } => {
            ClientEvent::EditMessage { message_id, content }
        },
        ChannelCommand::DeleteMessage { message_id } => {
            ClientEvent::DeleteMessage { message_id }
        },
        ChannelCommand::MarkRead { inquiry_id, message_ids } => {
            ClientEvent::MarkRead { inquiry_id, message_ids }
        },
        ChannelCommand::StartTyping { inquiry_id } => ClientEvent::StartTyping { inquiry_id },
        ChannelCommand::StopTyping { inquiry_id } => ClientEvent::StopTyping { inquiry_id },
        // Translated before reaching here; kept total for completeness.
        ChannelCommand::Disconnect => ClientEvent::Disconnect,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn dial_gives_up_within_the_bound() {
        // Blackhole address: either unroutable (times out) or rejected fast;
        // both must surface as a failed dial well inside the bound.
        let started = Instant::now();
        let result =
            dial("ws://10.255.255.1:81/ws/inbox/?token=t", Duration::from_millis(500)).await;

        assert!(result.is_err());
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
