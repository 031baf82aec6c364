//! Channel client state machine.
//!
//! The `ChannelClient` is the top-level state machine composing the
//! reconnection supervisor, heartbeat monitor, frame router, and channel
//! state. It receives events ([`ClientEvent`]), processes them through pure
//! state machine logic, and returns actions ([`ClientAction`]) for the
//! caller to execute. No I/O and no timers live here; time arrives as a
//! parameter on the events that need it.

use std::{collections::HashMap, ops::Sub, time::Duration};

use talkwire_proto::{ChannelScope, ClientCommand, NORMAL_CLOSURE, ServerEvent, UserId};

use crate::{
    error::ClientError,
    event::{ChannelUpdate, ClientAction, ClientEvent},
    heartbeat::Heartbeat,
    router,
    state::ChannelState,
    supervisor::{CloseOutcome, ConnectionStatus, Supervisor},
};

/// Interval between presence heartbeats while the connection is open.
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// Fixed delay before a reconnection attempt after an abnormal closure.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(3);

/// Default expiry for typing entries whose stop event never arrives.
pub const DEFAULT_TYPING_TTL: Duration = Duration::from_secs(30);

/// Client timing configuration. Immutable for the client's lifetime.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Heartbeat interval (server-side presence expiry must exceed this).
    pub heartbeat_interval: Duration,

    /// Fixed reconnection delay. Retries repeat indefinitely at this
    /// interval; there is no cap or backoff growth.
    pub retry_delay: Duration,

    /// Local expiry for typing entries with a lost stop event.
    /// `None` disables expiry (typing entries then clear only on an
    /// explicit stop or on the user leaving).
    pub typing_ttl: Option<Duration>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            retry_delay: DEFAULT_RETRY_DELAY,
            typing_ttl: Some(DEFAULT_TYPING_TTL),
        }
    }
}

/// Client for one real-time channel.
///
/// Generic over `Instant` to support both real time and virtual time for
/// deterministic testing.
#[derive(Debug, Clone)]
pub struct ChannelClient<I = std::time::Instant>
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
{
    scope: ChannelScope,
    options: ClientOptions,
    supervisor: Supervisor<I>,
    heartbeat: Heartbeat<I>,
    state: ChannelState,
    /// When each typing entry was last refreshed, for TTL expiry.
    typing_since: HashMap<UserId, I>,
}

impl<I> ChannelClient<I>
where
    I: Copy + Ord + Send + Sync + Sub<Output = Duration>,
{
    /// Create a disconnected client bound to one channel scope.
    pub fn new(scope: ChannelScope, options: ClientOptions) -> Self {
        let supervisor = Supervisor::new(options.retry_delay);
        let heartbeat = Heartbeat::new(options.heartbeat_interval);
        Self {
            scope,
            options,
            supervisor,
            heartbeat,
            state: ChannelState::new(),
            typing_since: HashMap::new(),
        }
    }

    /// The channel scope this client is bound to.
    pub fn scope(&self) -> ChannelScope {
        self.scope
    }

    /// Read-only view of the reconciled channel state.
    pub fn state(&self) -> &ChannelState {
        &self.state
    }

    /// Current connection status.
    pub fn status(&self) -> ConnectionStatus {
        self.supervisor.status()
    }

    /// Process an event and return resulting actions.
    ///
    /// # Errors
    ///
    /// - `ClientError::NotConnected` when an outbound action is attempted
    ///   while the connection is not open. No frame is produced; the caller
    ///   re-issues after reconnection.
    pub fn handle(&mut self, event: ClientEvent<I>) -> Result<Vec<ClientAction>, ClientError> {
        match event {
            ClientEvent::Connect => Ok(self.handle_connect()),
            ClientEvent::Disconnect => Ok(self.handle_disconnect()),
            ClientEvent::TransportOpened { now } => Ok(self.handle_opened(now)),
            ClientEvent::TransportFailed { reason, now } => Ok(self.handle_failed(&reason, now)),
            ClientEvent::TransportClosed { code, reason, now } => {
                Ok(self.handle_closed(code, &reason, now))
            },
            ClientEvent::FrameReceived { text, now } => Ok(self.handle_frame(&text, now)),
            ClientEvent::Tick { now } => Ok(self.handle_tick(now)),

            ClientEvent::SendMessage { content, reply_to, inquiry_id } => self
                .outbound("send message", ClientCommand::MessageSend {
                    content,
                    reply_to,
                    inquiry_id,
                }),
            ClientEvent::EditMessage { message_id, content } => {
                self.outbound("edit message", ClientCommand::MessageEdit { message_id, content })
            },
            ClientEvent::DeleteMessage { message_id } => {
                self.outbound("delete message", ClientCommand::MessageDelete { message_id })
            },
            ClientEvent::MarkRead { inquiry_id, message_ids } => {
                self.outbound("mark read", ClientCommand::MessagesRead { inquiry_id, message_ids })
            },
            ClientEvent::StartTyping { inquiry_id } => {
                self.outbound("start typing", ClientCommand::TypingStart { inquiry_id })
            },
            ClientEvent::StopTyping { inquiry_id } => {
                self.outbound("stop typing", ClientCommand::TypingStop { inquiry_id })
            },
        }
    }

    /// Precondition-checked outbound action.
    ///
    /// No optimistic echo: the server is the sole source of message
    /// identity, so the local log changes only when the echo arrives as a
    /// `message.new` event.
    fn outbound(
        &self,
        operation: &'static str,
        command: ClientCommand,
    ) -> Result<Vec<ClientAction>, ClientError> {
        if self.supervisor.is_open() {
            Ok(vec![ClientAction::SendFrame(command)])
        } else {
            Err(ClientError::NotConnected { operation, status: self.status() })
        }
    }

    fn handle_connect(&mut self) -> Vec<ClientAction> {
        if self.supervisor.start() {
            tracing::debug!(scope = %self.scope, "opening channel connection");
            vec![
                ClientAction::Notify(ChannelUpdate::StatusChanged(ConnectionStatus::Connecting)),
                ClientAction::OpenConnection,
            ]
        } else {
            // Already connecting or open.
            vec![]
        }
    }

    /// Terminal teardown. Cancellation order matters: pending retry first,
    /// then heartbeat, then the live connection — so no timer fires after
    /// teardown and no spurious reconnect gets scheduled.
    fn handle_disconnect(&mut self) -> Vec<ClientAction> {
        let prior = self.status();
        let had_connection = self.supervisor.shutdown();
        self.heartbeat.stop();
        self.typing_since.clear();

        let mut actions = Vec::new();
        if had_connection {
            actions.push(ClientAction::Notify(ChannelUpdate::StatusChanged(
                ConnectionStatus::Closing,
            )));
            actions.push(ClientAction::CloseConnection {
                code: NORMAL_CLOSURE,
                reason: "client disconnect".to_string(),
            });
        }
        if prior != ConnectionStatus::Disconnected {
            actions.push(ClientAction::Notify(ChannelUpdate::StatusChanged(
                ConnectionStatus::Disconnected,
            )));
        }
        actions
    }

    fn handle_opened(&mut self, now: I) -> Vec<ClientAction> {
        if self.supervisor.opened() {
            self.heartbeat.start(now);
            vec![ClientAction::Notify(ChannelUpdate::StatusChanged(ConnectionStatus::Open))]
        } else {
            // Dial completed after teardown; exactly one connection may
            // live, so this one is closed immediately.
            tracing::warn!("dropping connection opened after teardown");
            vec![ClientAction::CloseConnection {
                code: NORMAL_CLOSURE,
                reason: "stale connection".to_string(),
            }]
        }
    }

    fn handle_failed(&mut self, reason: &str, now: I) -> Vec<ClientAction> {
        match self.supervisor.open_failed(now) {
            CloseOutcome::RetryScheduled => {
                tracing::warn!(reason, "connect failed; retry scheduled");
                vec![ClientAction::Notify(ChannelUpdate::StatusChanged(
                    ConnectionStatus::WaitingToRetry,
                ))]
            },
            _ => {
                tracing::debug!(reason, "ignoring stale connect failure");
                vec![]
            },
        }
    }

    fn handle_closed(&mut self, code: u16, reason: &str, now: I) -> Vec<ClientAction> {
        // No heartbeat may be sent on a non-open connection. Typing entries
        // and their TTL bookkeeping survive the outage: expiry keeps running
        // on ticks, and a reconnect re-baselines via the snapshot anyway.
        self.heartbeat.stop();

        match self.supervisor.closed(code, now) {
            CloseOutcome::Terminal => {
                tracing::debug!(code, reason, "connection closed normally");
                vec![ClientAction::Notify(ChannelUpdate::StatusChanged(
                    ConnectionStatus::Disconnected,
                ))]
            },
            CloseOutcome::RetryScheduled => {
                tracing::warn!(code, reason, "connection lost; retry scheduled");
                vec![ClientAction::Notify(ChannelUpdate::StatusChanged(
                    ConnectionStatus::WaitingToRetry,
                ))]
            },
            CloseOutcome::Ignored => vec![],
        }
    }

    /// Decode and route one inbound frame.
    ///
    /// Malformed frames and unknown kinds are dropped with a diagnostic;
    /// they never close the connection or fail the client.
    fn handle_frame(&mut self, text: &str, now: I) -> Vec<ClientAction> {
        let event = match ServerEvent::decode(text) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(error = %e, "dropping malformed frame");
                return vec![];
            },
        };

        let updates = router::route(event, &mut self.state);
        self.track_typing(&updates, now);
        updates.into_iter().map(ClientAction::Notify).collect()
    }

    fn handle_tick(&mut self, now: I) -> Vec<ClientAction> {
        let mut actions = Vec::new();

        if self.supervisor.poll_retry(now) {
            tracing::debug!(scope = %self.scope, "retrying channel connection");
            actions.push(ClientAction::Notify(ChannelUpdate::StatusChanged(
                ConnectionStatus::Connecting,
            )));
            actions.push(ClientAction::OpenConnection);
        }

        // Armed only while Open, so this cannot fire on a closed connection.
        if self.heartbeat.poll(now) {
            actions.push(ClientAction::SendFrame(ClientCommand::PresenceUpdate));
        }

        if let Some(ttl) = self.options.typing_ttl {
            actions.extend(self.expire_typing(ttl, now));
        }

        actions
    }

    /// Clear typing entries whose stop event was lost.
    fn expire_typing(&mut self, ttl: Duration, now: I) -> Vec<ClientAction> {
        let expired: Vec<UserId> = self
            .typing_since
            .iter()
            .filter(|(_, since)| now - **since >= ttl)
            .map(|(id, _)| *id)
            .collect();

        let mut actions = Vec::new();
        for user_id in expired {
            self.typing_since.remove(&user_id);
            if self.state.clear_typing(user_id) {
                tracing::debug!(user_id, "typing entry expired without stop event");
                actions.push(ClientAction::Notify(ChannelUpdate::TypingChanged {
                    user_id,
                    is_typing: false,
                    inquiry_id: None,
                }));
            }
        }
        actions
    }

    /// Keep the TTL bookkeeping in step with routed typing changes.
    fn track_typing(&mut self, updates: &[ChannelUpdate], now: I) {
        for update in updates {
            match update {
                ChannelUpdate::TypingChanged { user_id, is_typing: true, .. } => {
                    self.typing_since.insert(*user_id, now);
                },
                ChannelUpdate::TypingChanged { user_id, is_typing: false, .. } => {
                    self.typing_since.remove(user_id);
                },
                ChannelUpdate::UserLeft(user_id) => {
                    self.typing_since.remove(user_id);
                },
                ChannelUpdate::Resynced => self.typing_since.clear(),
                _ => {},
            }
        }
    }
}
