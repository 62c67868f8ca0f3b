//! Interactive session handler
//!
//! Bridges one connection to the room. A session:
//! 1. Waits for the client to request an interactive shell, acknowledging
//!    terminal-capability requests along the way.
//! 2. Registers with the room and starts a relay task that renders every
//!    message delivered to its outbound queue.
//! 3. Reads keystrokes, edits the line buffer and re-renders the prompt,
//!    broadcasting each completed line.
//! 4. Cleans up exactly once: leaves the room, waits for the relay to drain,
//!    and closes the connection.

use std::sync::Arc;

use futures_util::stream::{Stream, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite, WriteHalf};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::client::Client;
use crate::error::SessionError;
use crate::input::{Key, KeyReader};
use crate::line_buffer::LineBuffer;
use crate::room::Room;
use crate::terminal::TerminalUi;
use crate::transport::{ChannelRequest, RequestKind};
use crate::types::ClientId;

/// Run one chat session over an accepted connection
///
/// `username` is the display name claimed by the transport (may be empty).
/// Returns once cleanup has finished. A request stream that ends before a
/// shell is requested yields [`SessionError::ShellNotRequested`] without the
/// participant ever joining the room.
pub async fn handle_session<S, Q>(
    room: Arc<Room>,
    username: String,
    stream: S,
    requests: Q,
) -> Result<(), SessionError>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
    Q: Stream<Item = ChannelRequest> + Send + Unpin + 'static,
{
    let (reader, writer) = tokio::io::split(stream);

    let (shell_ready, requests_task) = spawn_request_handler(requests);
    if shell_ready.await.is_err() {
        debug!("Request stream for '{}' ended before a shell was requested", username);
        let _ = requests_task.await;
        return Err(SessionError::ShellNotRequested);
    }

    let client = room.add_client(&username);
    let mut session = Session::new(room, client.id, client.username.clone(), writer);
    session.requests = Some(requests_task);

    let result = session.run(client, reader).await;

    if let Err(SessionError::Read(e)) = &result {
        warn!("Read error for {}: {}", session.client_id, e);
        // Best effort: the connection may already be unusable
        let _ = session
            .view
            .print_message(&format!("[system] read error: {}", e))
            .await;
    }

    session.cleanup().await;
    info!("Session for {} ended", session.client_id);
    result
}

/// Drain the out-of-band request stream for the life of the connection
///
/// The returned receiver resolves on the first `shell` request, or errors if
/// the stream ends before one arrives.
fn spawn_request_handler<Q>(mut requests: Q) -> (oneshot::Receiver<()>, JoinHandle<()>)
where
    Q: Stream<Item = ChannelRequest> + Send + Unpin + 'static,
{
    let (ready_tx, ready_rx) = oneshot::channel();

    let handle = tokio::spawn(async move {
        let mut ready_tx = Some(ready_tx);

        while let Some(request) = requests.next().await {
            let kind = request.kind.clone();
            match kind {
                RequestKind::Shell => {
                    request.accept();
                    if let Some(tx) = ready_tx.take() {
                        let _ = tx.send(());
                    }
                }
                kind if kind.is_terminal_capability() => {
                    debug!("Acknowledging {} request", kind);
                    request.accept();
                }
                kind => {
                    debug!("Rejecting unsupported {} request", kind);
                    request.reject();
                }
            }
        }
        debug!("Request stream ended");
    });

    (ready_rx, handle)
}

/// Rendering surface shared by the input loop and the outbound relay
struct View<W> {
    room: Arc<Room>,
    buffer: Arc<LineBuffer>,
    ui: Arc<TerminalUi<W>>,
}

impl<W> Clone for View<W> {
    fn clone(&self) -> Self {
        Self {
            room: Arc::clone(&self.room),
            buffer: Arc::clone(&self.buffer),
            ui: Arc::clone(&self.ui),
        }
    }
}

impl<W: AsyncWrite + Unpin> View<W> {
    async fn render_prompt(&self) -> Result<(), SessionError> {
        let header = format!("Users online: {}", self.room.client_count());
        self.ui
            .update_prompt(&header, &self.buffer.snapshot())
            .await?;
        Ok(())
    }

    async fn print_message(&self, msg: &str) -> Result<(), SessionError> {
        self.ui.display_message(msg).await?;
        self.render_prompt().await
    }
}

struct Session<S> {
    client_id: ClientId,
    username: String,
    view: View<WriteHalf<S>>,
    relay: Option<JoinHandle<()>>,
    requests: Option<JoinHandle<()>>,
    cleaned_up: bool,
}

impl<S> Session<S>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    fn new(room: Arc<Room>, client_id: ClientId, username: String, writer: WriteHalf<S>) -> Self {
        Self {
            client_id,
            username,
            view: View {
                room,
                buffer: Arc::new(LineBuffer::new()),
                ui: Arc::new(TerminalUi::new(writer)),
            },
            relay: None,
            requests: None,
            cleaned_up: false,
        }
    }

    async fn run<R>(&mut self, client: Client, reader: R) -> Result<(), SessionError>
    where
        R: AsyncRead + Unpin,
    {
        self.view.ui.clear_screen().await?;
        self.start_relay(client.outbound);
        self.send_greeting().await?;
        self.read_loop(reader).await
    }

    /// Render every delivered message until the room closes the queue
    fn start_relay(&mut self, mut outbound: mpsc::Receiver<String>) {
        let view = self.view.clone();
        let client_id = self.client_id;

        self.relay = Some(tokio::spawn(async move {
            while let Some(msg) = outbound.recv().await {
                if let Err(e) = view.print_message(&msg).await {
                    debug!("Relay for {} stopped: {}", client_id, e);
                    break;
                }
            }
            debug!("Relay for {} finished", client_id);
        }));
    }

    async fn send_greeting(&self) -> Result<(), SessionError> {
        self.view
            .print_message(&format!("Welcome to term_chat, {}!", self.username))
            .await?;
        self.view
            .print_message("Type messages and press enter to chat. Ctrl+D to exit.")
            .await
    }

    async fn read_loop<R>(&self, reader: R) -> Result<(), SessionError>
    where
        R: AsyncRead + Unpin,
    {
        let mut keys = KeyReader::new(reader);

        loop {
            let key = match keys.next_key().await {
                Ok(Some(key)) => key,
                Ok(None) => {
                    debug!("Connection for {} closed", self.client_id);
                    return self.submit_final_line().await;
                }
                Err(e) => return Err(SessionError::Read(e)),
            };

            match key {
                Key::Enter => self.submit_line().await?,
                Key::Interrupt => return self.handle_control("^C").await,
                Key::EndOfInput => return self.handle_control("^D").await,
                Key::Backspace => {
                    self.view.buffer.trim_last();
                    self.view.render_prompt().await?;
                }
                Key::Char(c) => {
                    self.view.buffer.append(c);
                    self.view.render_prompt().await?;
                }
                Key::Ignored => {}
            }
        }
    }

    async fn submit_line(&self) -> Result<(), SessionError> {
        let text = self.view.buffer.drain();
        if text.trim().is_empty() {
            return self.view.render_prompt().await;
        }
        self.broadcast_line(&text).await
    }

    /// Whatever was typed before the stream closed counts as a final line
    async fn submit_final_line(&self) -> Result<(), SessionError> {
        let text = self.view.buffer.drain();
        self.broadcast_line(&text).await
    }

    async fn broadcast_line(&self, text: &str) -> Result<(), SessionError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(());
        }
        let msg = self
            .view
            .room
            .broadcast(self.client_id, &self.username, trimmed);
        self.view.print_message(&msg).await
    }

    async fn handle_control(&self, label: &str) -> Result<(), SessionError> {
        self.view.buffer.reset();
        self.view.ui.display_control_ack(label).await?;
        self.view.render_prompt().await
    }

    /// Leave the room, drain the relay and close the connection
    ///
    /// Runs at most once; later calls return immediately.
    async fn cleanup(&mut self) {
        if std::mem::replace(&mut self.cleaned_up, true) {
            return;
        }

        // Closes the outbound queue, which ends the relay
        self.view.room.remove_client(self.client_id);
        if let Some(relay) = self.relay.take() {
            let _ = relay.await;
        }

        if let Err(e) = self.view.ui.shutdown().await {
            debug!("Closing connection for {} failed: {}", self.client_id, e);
        }

        // The transport ends the request stream with the connection; stop
        // waiting on it for transports that keep it open longer
        if let Some(requests) = self.requests.take() {
            requests.abort();
            let _ = requests.await;
        }
    }
}
