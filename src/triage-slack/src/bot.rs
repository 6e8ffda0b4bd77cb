//! Socket Mode bot.
//!
//! The `TriageSlackBot`:
//! - Verifies the bot token with `auth.test`
//! - Connects to Slack via Socket Mode (WebSocket)
//! - Acknowledges every envelope and dispatches it to a [`SlackEventHandler`]
//! - Reconnects when the connection drops or Slack asks it to
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use triage_slack::{BotOptions, SlackConfig, SlackWebClient, TriageSlackBot};
//!
//! let client = Arc::new(SlackWebClient::new(SlackConfig::from_env()?, options.api_timeout)?);
//! let bot = TriageSlackBot::new(client, handler, BotOptions::default());
//! bot.start().await?;
//! ```

use std::sync::Arc;
use std::time::Duration;

use futures::stream::SplitStream;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{RwLock, mpsc, watch};
use tokio::time::interval;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, error, info, warn};

use crate::client::SlackWebClient;
use crate::commands::SlashCommandPayload;
use crate::error::{SlackError, SlackResult};
use crate::events::{
    EventPayload, MessageEvent, SlackEvent, SocketModeAck, SocketModeEnvelope, parse_event,
};
use crate::handler::SlackEventHandler;
use crate::interactions::BlockActionsPayload;

/// Type alias for the WebSocket connection.
type WsConnection = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Configuration for bot behavior.
#[derive(Debug, Clone)]
pub struct BotOptions {
    /// Timeout for API requests.
    pub api_timeout: Duration,
    /// Delay between reconnection attempts.
    pub reconnect_delay: Duration,
    /// Ping interval for WebSocket keep-alive.
    pub ping_interval: Duration,
}

impl Default for BotOptions {
    fn default() -> Self {
        Self {
            api_timeout: Duration::from_secs(30),
            reconnect_delay: Duration::from_secs(5),
            ping_interval: Duration::from_secs(30),
        }
    }
}

/// How a single Socket Mode connection ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConnectionEnd {
    /// Shutdown was requested.
    Shutdown,
    /// Slack closed the connection or asked us to reconnect.
    Reconnect,
}

/// The triage Slack bot.
pub struct TriageSlackBot {
    /// Web API client.
    client: Arc<SlackWebClient>,
    /// Bot options.
    options: BotOptions,
    /// Bot's own user ID (set after authentication).
    bot_user_id: RwLock<Option<String>>,
    /// Set to `true` once shutdown is requested.
    shutdown_tx: watch::Sender<bool>,
    /// Event handler.
    handler: Arc<dyn SlackEventHandler>,
}

impl TriageSlackBot {
    /// Create a new bot.
    pub fn new(
        client: Arc<SlackWebClient>,
        handler: Arc<dyn SlackEventHandler>,
        options: BotOptions,
    ) -> Self {
        let (shutdown_tx, _) = watch::channel(false);

        Self {
            client,
            options,
            bot_user_id: RwLock::new(None),
            shutdown_tx,
            handler,
        }
    }

    /// Start the bot and run until shutdown.
    ///
    /// A shutdown requested at any point, including before this is called,
    /// makes it return `Ok(())`.
    pub async fn start(&self) -> SlackResult<()> {
        info!("Starting triage Slack bot...");

        let mut shutdown_rx = self.shutdown_tx.subscribe();

        let user_id = tokio::select! {
            _ = shutdown_requested(&mut shutdown_rx) => {
                info!("Shutdown requested before authentication completed");
                return Ok(());
            }
            result = self.client.auth_test() => result?,
        };
        info!("Authenticated as bot user: {}", user_id);
        *self.bot_user_id.write().await = Some(user_id);

        self.run_socket_mode(&mut shutdown_rx).await
    }

    /// Shutdown the bot gracefully.
    pub fn shutdown(&self) {
        info!("Shutting down Slack bot...");
        self.shutdown_tx.send_replace(true);
    }

    /// Run the Socket Mode connection loop.
    async fn run_socket_mode(&self, shutdown_rx: &mut watch::Receiver<bool>) -> SlackResult<()> {
        loop {
            let opened = tokio::select! {
                _ = shutdown_requested(shutdown_rx) => return Ok(()),
                result = self.client.open_socket_url() => result,
            };

            let result = match opened {
                Ok(ws_url) => {
                    info!("Connecting to Socket Mode...");
                    self.connect_and_run(&ws_url, shutdown_rx).await
                }
                Err(e @ SlackError::Auth(_)) => return Err(e),
                Err(e) => Err(e),
            };

            match result {
                Ok(ConnectionEnd::Shutdown) => {
                    info!("Socket Mode connection closed gracefully");
                    return Ok(());
                }
                Ok(ConnectionEnd::Reconnect) => {
                    info!("Socket Mode connection ended, reconnecting");
                }
                Err(e) => {
                    error!("Socket Mode connection error: {}", e);
                    let delay = self.retry_delay(&e);
                    info!("Reconnecting in {:?}...", delay);

                    tokio::select! {
                        _ = shutdown_requested(shutdown_rx) => return Ok(()),
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }
    }

    /// How long to wait before reconnecting after `err`.
    fn retry_delay(&self, err: &SlackError) -> Duration {
        match err {
            SlackError::RateLimited { retry_after_secs } => self
                .options
                .reconnect_delay
                .max(Duration::from_secs(*retry_after_secs)),
            _ => self.options.reconnect_delay,
        }
    }

    /// Connect to WebSocket and run event loop.
    async fn connect_and_run(
        &self,
        ws_url: &str,
        shutdown_rx: &mut watch::Receiver<bool>,
    ) -> SlackResult<ConnectionEnd> {
        let (ws_stream, _) = connect_async(ws_url).await?;
        let (mut write, read) = ws_stream.split();

        // Channel for outgoing messages
        let (msg_tx, mut msg_rx) = mpsc::channel::<WsMessage>(100);

        let write_task = tokio::spawn(async move {
            while let Some(msg) = msg_rx.recv().await {
                let closing = matches!(msg, WsMessage::Close(_));
                if let Err(e) = write.send(msg).await {
                    error!("Failed to send WebSocket message: {}", e);
                    break;
                }
                if closing {
                    break;
                }
            }
        });

        let ping_tx = msg_tx.clone();
        let ping_interval = self.options.ping_interval;
        let ping_task = tokio::spawn(async move {
            let mut interval = interval(ping_interval);
            loop {
                interval.tick().await;
                if ping_tx.send(WsMessage::Ping(vec![])).await.is_err() {
                    break;
                }
            }
        });

        let result = self.process_messages(read, &msg_tx, shutdown_rx).await;

        ping_task.abort();
        if matches!(result, Ok(ConnectionEnd::Shutdown)) {
            let _ = msg_tx.send(WsMessage::Close(None)).await;
        }
        drop(msg_tx);

        let abort = write_task.abort_handle();
        if tokio::time::timeout(Duration::from_secs(2), write_task)
            .await
            .is_err()
        {
            abort.abort();
        }

        result
    }

    /// Process incoming WebSocket messages.
    async fn process_messages(
        &self,
        mut read: SplitStream<WsConnection>,
        msg_tx: &mpsc::Sender<WsMessage>,
        shutdown_rx: &mut watch::Receiver<bool>,
    ) -> SlackResult<ConnectionEnd> {
        loop {
            tokio::select! {
                _ = shutdown_requested(shutdown_rx) => {
                    info!("Received shutdown signal");
                    return Ok(ConnectionEnd::Shutdown);
                }
                msg = read.next() => {
                    match msg {
                        Some(Ok(WsMessage::Text(text))) => {
                            if let Some(end) = self.handle_socket_message(&text, msg_tx).await {
                                return Ok(end);
                            }
                        }
                        Some(Ok(WsMessage::Ping(data))) => {
                            let _ = msg_tx.send(WsMessage::Pong(data)).await;
                        }
                        Some(Ok(WsMessage::Pong(_))) => {}
                        Some(Ok(WsMessage::Close(_))) => {
                            info!("WebSocket closed by server");
                            return Ok(ConnectionEnd::Reconnect);
                        }
                        Some(Err(e)) => {
                            return Err(SlackError::WebSocket(e.to_string()));
                        }
                        None => {
                            return Ok(ConnectionEnd::Reconnect);
                        }
                        _ => {}
                    }
                }
            }
        }
    }

    /// Handle a Socket Mode message. Returns `Some` when the connection
    /// should end.
    async fn handle_socket_message(
        &self,
        text: &str,
        msg_tx: &mpsc::Sender<WsMessage>,
    ) -> Option<ConnectionEnd> {
        debug!("Received Socket Mode message: {}", text);

        let envelope: SocketModeEnvelope = match serde_json::from_str(text) {
            Ok(env) => env,
            Err(e) => {
                warn!("Failed to parse Socket Mode envelope: {}", e);
                return None;
            }
        };

        // Slash command responses ride on the acknowledgment
        if envelope.envelope_type == "slash_commands" {
            let response = self.slash_command_response(envelope.payload.as_ref()).await;
            if let Some(envelope_id) = &envelope.envelope_id {
                let ack = match response {
                    Some(payload) => SocketModeAck::with_payload(envelope_id, payload),
                    None => SocketModeAck::new(envelope_id),
                };
                send_ack(msg_tx, &ack).await;
            }
            return None;
        }

        if let Some(envelope_id) = &envelope.envelope_id {
            send_ack(msg_tx, &SocketModeAck::new(envelope_id)).await;
        }

        match envelope.envelope_type.as_str() {
            "events_api" => {
                if let Some(payload) = envelope.payload {
                    self.dispatch_event(payload).await;
                }
            }
            "interactive" => {
                if let Some(payload) = envelope.payload {
                    self.dispatch_interaction(payload);
                }
            }
            "hello" => {
                info!("Socket Mode connection established");
            }
            "disconnect" => {
                info!(
                    "Received disconnect request from Slack: {}",
                    envelope.reason.as_deref().unwrap_or("unspecified")
                );
                return Some(ConnectionEnd::Reconnect);
            }
            other => {
                debug!("Unknown envelope type: {}", other);
            }
        }

        None
    }

    async fn slash_command_response(
        &self,
        payload: Option<&serde_json::Value>,
    ) -> Option<serde_json::Value> {
        let payload: SlashCommandPayload = match payload.cloned().map(serde_json::from_value) {
            Some(Ok(p)) => p,
            Some(Err(e)) => {
                warn!("Failed to parse slash command payload: {}", e);
                return None;
            }
            None => {
                warn!("Slash command envelope without payload");
                return None;
            }
        };

        let response = self.handler.on_slash_command(&payload).await;
        match serde_json::to_value(response) {
            Ok(value) => Some(value),
            Err(e) => {
                error!("Failed to serialize slash command response: {}", e);
                None
            }
        }
    }

    /// Whether `event` was posted by this bot.
    async fn is_own_message(&self, event: &MessageEvent) -> bool {
        let bot_user_id = self.bot_user_id.read().await;
        matches!(
            (bot_user_id.as_deref(), event.user.as_deref()),
            (Some(bot), Some(user)) if bot == user
        )
    }

    /// Handle an events API payload off the read loop.
    async fn dispatch_event(&self, payload: serde_json::Value) {
        let payload: EventPayload = match serde_json::from_value(payload) {
            Ok(p) => p,
            Err(e) => {
                warn!("Failed to parse event payload: {}", e);
                return;
            }
        };

        let event = match parse_event(&payload) {
            Ok(event) => event,
            Err(e) => {
                warn!("Failed to parse event: {}", e);
                return;
            }
        };

        if let SlackEvent::Message(message) = &event {
            if self.is_own_message(message).await {
                debug!("Ignoring own message {}", message.ts);
                return;
            }
        }

        let handler = Arc::clone(&self.handler);
        tokio::spawn(async move {
            let result = match event {
                SlackEvent::Message(event) => handler.on_message(event).await,
                SlackEvent::AppHomeOpened(event) => handler.on_app_home_opened(event).await,
                SlackEvent::Unknown(kind) => {
                    debug!("Ignoring event type: {}", kind);
                    Ok(())
                }
            };
            if let Err(e) = result {
                error!("Event handler error: {}", e);
            }
        });
    }

    /// Handle an interactive payload off the read loop.
    fn dispatch_interaction(&self, payload: serde_json::Value) {
        let actions = match BlockActionsPayload::from_value(payload) {
            Ok(Some(actions)) => actions,
            Ok(None) => {
                debug!("Ignoring non block_actions interaction");
                return;
            }
            Err(e) => {
                warn!("Failed to parse interaction: {}", e);
                return;
            }
        };

        let handler = Arc::clone(&self.handler);
        tokio::spawn(async move {
            if let Err(e) = handler.on_block_actions(actions).await {
                error!("Interaction handler error: {}", e);
            }
        });
    }
}

/// Resolves once shutdown has been requested.
async fn shutdown_requested(rx: &mut watch::Receiver<bool>) {
    if rx.wait_for(|stop| *stop).await.is_err() {
        // Sender dropped, so shutdown can no longer be requested
        std::future::pending::<()>().await;
    }
}

async fn send_ack(msg_tx: &mpsc::Sender<WsMessage>, ack: &SocketModeAck) {
    match serde_json::to_string(ack) {
        Ok(json) => {
            if msg_tx.send(WsMessage::Text(json)).await.is_err() {
                warn!("Failed to queue acknowledgment for {}", ack.envelope_id);
            }
        }
        Err(e) => error!("Failed to serialize acknowledgment: {}", e),
    }
}
