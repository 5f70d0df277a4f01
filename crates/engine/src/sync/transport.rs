use std::io;
use std::net::TcpStream;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};
use tungstenite::stream::MaybeTlsStream;
use tungstenite::{Error as WsError, Message, WebSocket};

use crate::app::{EventSender, SessionEvent};

const WS_THREAD_NAME: &str = "agentview-ws";
const WS_IDLE_SLEEP: Duration = Duration::from_millis(4);
const MAX_READS_PER_PASS: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(pub u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Opened,
    Text(String),
    Closed,
    Failed(String),
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("websocket connect to {url} failed: {source}")]
    Connect {
        url: String,
        #[source]
        source: Box<WsError>,
    },
    #[error("websocket stream for {url} is not a plain TCP stream")]
    UnsupportedStream { url: String },
    #[error("failed to configure websocket socket: {0}")]
    Configure(#[source] io::Error),
}

pub trait Transport {
    fn send_text(&mut self, text: String);
    fn close(&mut self);
}

pub trait Connector {
    fn open(&mut self, url: &str, connection: ConnectionId, events: EventSender)
        -> Box<dyn Transport>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WsConnector;

impl Connector for WsConnector {
    fn open(
        &mut self,
        url: &str,
        connection: ConnectionId,
        events: EventSender,
    ) -> Box<dyn Transport> {
        Box::new(WsTransport::spawn(url.to_string(), connection, events))
    }
}

#[derive(Debug)]
enum WsCommand {
    Send(String),
    Close,
}

#[derive(Debug)]
pub struct WsTransport {
    commands: Option<Sender<WsCommand>>,
}

impl WsTransport {
    fn spawn(url: String, connection: ConnectionId, events: EventSender) -> Self {
        let (tx, rx) = mpsc::channel();
        let worker_events = events.clone();
        let spawned = thread::Builder::new()
            .name(WS_THREAD_NAME.to_string())
            .spawn(move || run_connection(&url, connection, &rx, &worker_events));
        if let Err(error) = spawned {
            warn!(error = %error, "sync_worker_spawn_failed");
            events.send(SessionEvent::Transport {
                connection,
                event: TransportEvent::Failed(error.to_string()),
            });
        }
        Self { commands: Some(tx) }
    }
}

impl Transport for WsTransport {
    fn send_text(&mut self, text: String) {
        let Some(commands) = self.commands.as_ref() else {
            return;
        };
        if commands.send(WsCommand::Send(text)).is_err() {
            debug!("sync_send_after_worker_exit");
        }
    }

    fn close(&mut self) {
        if let Some(commands) = self.commands.take() {
            let _ = commands.send(WsCommand::Close);
        }
    }
}

impl Drop for WsTransport {
    fn drop(&mut self) {
        self.close();
    }
}

#[derive(Debug)]
enum PumpExit {
    LocalClose,
    RemoteClose,
    SessionGone,
    Failed(String),
}

fn run_connection(
    url: &str,
    connection: ConnectionId,
    commands: &Receiver<WsCommand>,
    events: &EventSender,
) {
    let emit = |event: TransportEvent| events.send(SessionEvent::Transport { connection, event });

    let mut socket = match open_socket(url) {
        Ok(socket) => socket,
        Err(error) => {
            warn!(url, connection = connection.0, error = %error, "sync_connect_failed");
            emit(TransportEvent::Failed(error.to_string()));
            return;
        }
    };
    info!(url, connection = connection.0, "sync_socket_open");
    if !emit(TransportEvent::Opened) {
        let _ = socket.close(None);
        return;
    }

    match pump_socket(&mut socket, commands, &emit) {
        PumpExit::LocalClose => {
            debug!(connection = connection.0, "sync_socket_closed_locally");
            emit(TransportEvent::Closed);
        }
        PumpExit::RemoteClose => {
            info!(connection = connection.0, "sync_socket_closed_by_peer");
            emit(TransportEvent::Closed);
        }
        PumpExit::SessionGone => {
            let _ = socket.close(None);
            let _ = socket.flush();
        }
        PumpExit::Failed(reason) => {
            warn!(connection = connection.0, reason = reason.as_str(), "sync_socket_failed");
            emit(TransportEvent::Failed(reason));
        }
    }
}

fn open_socket(url: &str) -> Result<WebSocket<MaybeTlsStream<TcpStream>>, TransportError> {
    let (mut socket, _response) =
        tungstenite::connect(url).map_err(|source| TransportError::Connect {
            url: url.to_string(),
            source: Box::new(source),
        })?;
    match socket.get_mut() {
        MaybeTlsStream::Plain(stream) => {
            stream
                .set_nonblocking(true)
                .map_err(TransportError::Configure)?;
            if let Err(error) = stream.set_nodelay(true) {
                debug!(error = %error, "sync_nodelay_failed");
            }
        }
        _ => {
            return Err(TransportError::UnsupportedStream {
                url: url.to_string(),
            })
        }
    }
    Ok(socket)
}

fn pump_socket(
    socket: &mut WebSocket<MaybeTlsStream<TcpStream>>,
    commands: &Receiver<WsCommand>,
    emit: &dyn Fn(TransportEvent) -> bool,
) -> PumpExit {
    loop {
        let mut idle = true;

        loop {
            match commands.try_recv() {
                Ok(WsCommand::Send(text)) => {
                    idle = false;
                    if let Err(error) = socket.write(Message::text(text)) {
                        if !is_would_block(&error) {
                            return PumpExit::Failed(error.to_string());
                        }
                    }
                }
                Ok(WsCommand::Close) | Err(TryRecvError::Disconnected) => {
                    let _ = socket.close(None);
                    let _ = socket.flush();
                    return PumpExit::LocalClose;
                }
                Err(TryRecvError::Empty) => break,
            }
        }

        match socket.flush() {
            Ok(()) => {}
            Err(error) if is_would_block(&error) => {}
            Err(WsError::ConnectionClosed) | Err(WsError::AlreadyClosed) => {
                return PumpExit::RemoteClose
            }
            Err(error) => return PumpExit::Failed(error.to_string()),
        }

        match read_burst(socket, emit) {
            Ok(0) => {}
            Ok(_) => idle = false,
            Err(exit) => return exit,
        }

        if idle {
            thread::sleep(WS_IDLE_SLEEP);
        }
    }
}

fn read_burst(
    socket: &mut WebSocket<MaybeTlsStream<TcpStream>>,
    emit: &dyn Fn(TransportEvent) -> bool,
) -> Result<usize, PumpExit> {
    let mut frames = 0;
    while frames < MAX_READS_PER_PASS {
        match socket.read() {
            Ok(Message::Text(text)) => {
                frames += 1;
                if !emit(TransportEvent::Text(text.as_str().to_owned())) {
                    return Err(PumpExit::SessionGone);
                }
            }
            Ok(Message::Close(_)) => {
                // tungstenite queues the close reply; push it out before leaving.
                let _ = socket.flush();
                return Err(PumpExit::RemoteClose);
            }
            Ok(_) => frames += 1,
            Err(error) if is_would_block(&error) => break,
            Err(WsError::ConnectionClosed) | Err(WsError::AlreadyClosed) => {
                return Err(PumpExit::RemoteClose)
            }
            Err(error) => return Err(PumpExit::Failed(error.to_string())),
        }
    }
    Ok(frames)
}

fn is_would_block(error: &WsError) -> bool {
    matches!(error, WsError::Io(io_error) if io_error.kind() == io::ErrorKind::WouldBlock)
}
