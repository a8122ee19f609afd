//! OCPP 2.0.1 WebSocket central system
//!
//! Accepts station connections at `ws://<host>:<port>/ocpp/{station_id}`.
//! Each connection gets one send task draining the session's writer queue and
//! one read loop that feeds frames to a [`CentralHandler`], so all writes to
//! a socket are serialized through the queue.

use std::net::SocketAddr;
use std::sync::Arc;

use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::{header, HeaderValue, StatusCode};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

use crate::commands::CommandError;
use crate::config::AppConfig;
use crate::handlers::CentralHandler;
use crate::session::{SessionRegistry, SharedSessionRegistry};
use crate::shared::shutdown::ShutdownSignal;
use crate::storage::{StationStore, TelemetryStore};

/// OCPP 2.0.1 WebSocket subprotocol
pub const OCPP_SUBPROTOCOL: &str = "ocpp2.0.1";

/// OCPP WebSocket server.
pub struct OcppServer {
    config: AppConfig,
    registry: SharedSessionRegistry,
    stations: Arc<StationStore>,
    telemetry: Arc<TelemetryStore>,
    shutdown: ShutdownSignal,
}

impl OcppServer {
    pub fn new(config: AppConfig, shutdown: ShutdownSignal) -> Self {
        Self {
            config,
            registry: SessionRegistry::shared(),
            stations: Arc::new(StationStore::new()),
            telemetry: Arc::new(TelemetryStore::new()),
            shutdown,
        }
    }

    pub fn registry(&self) -> SharedSessionRegistry {
        self.registry.clone()
    }

    pub fn stations(&self) -> Arc<StationStore> {
        self.stations.clone()
    }

    pub fn telemetry(&self) -> Arc<TelemetryStore> {
        self.telemetry.clone()
    }

    /// Bind the configured address and serve until shutdown.
    pub async fn run(&self) -> std::io::Result<()> {
        let addr = self.config.address();
        let listener = TcpListener::bind(&addr).await?;
        info!(
            "OCPP 2.0.1 central system listening on ws://{}/ocpp/{{station_id}}",
            addr
        );
        self.serve(listener).await;
        Ok(())
    }

    /// Serve connections from an already-bound listener. Split from
    /// [`run`](Self::run) so tests can bind an ephemeral port.
    pub async fn serve(&self, listener: TcpListener) {
        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, addr)) => self.spawn_connection(stream, addr),
                        Err(e) => error!("Failed to accept connection: {}", e),
                    }
                }
                _ = self.shutdown.wait() => {
                    info!("Server received shutdown signal");
                    self.registry.close_all();
                    return;
                }
            }
        }
    }

    fn spawn_connection(&self, stream: TcpStream, addr: SocketAddr) {
        let registry = self.registry.clone();
        let stations = self.stations.clone();
        let telemetry = self.telemetry.clone();
        let shutdown = self.shutdown.clone();
        let heartbeat_interval = self.config.protocol.heartbeat_interval;

        tokio::spawn(async move {
            if let Err(e) = handle_connection(
                stream,
                addr,
                registry,
                stations,
                telemetry,
                shutdown,
                heartbeat_interval,
            )
            .await
            {
                warn!("Connection from {} ended with error: {}", addr, e);
            }
        });
    }
}

/// Extract the station id from the request path.
/// Accepted formats: `/ocpp/{station_id}` or `/{station_id}`.
fn extract_station_id(path: &str) -> Option<String> {
    let path = path.trim_start_matches('/');

    if let Some(id) = path.strip_prefix("ocpp/") {
        let id = id.trim_start_matches('/');
        if !id.is_empty() && !id.contains('/') {
            return Some(id.to_string());
        }
        return None;
    }

    if !path.is_empty() && !path.contains('/') {
        return Some(path.to_string());
    }

    None
}

fn reject_handshake(reason: &str) -> ErrorResponse {
    let mut response = ErrorResponse::new(Some(reason.to_string()));
    *response.status_mut() = StatusCode::BAD_REQUEST;
    response
}

async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    registry: SharedSessionRegistry,
    stations: Arc<StationStore>,
    telemetry: Arc<TelemetryStore>,
    shutdown: ShutdownSignal,
    heartbeat_interval: u32,
) -> Result<(), tokio_tungstenite::tungstenite::Error> {
    let mut station_id: Option<String> = None;

    let ws_stream = tokio_tungstenite::accept_hdr_async(
        stream,
        |req: &Request, mut response: Response| {
            let path = req.uri().path();
            debug!("WebSocket handshake from {}, path: {}", addr, path);

            let requested_protocols = req
                .headers()
                .get(header::SEC_WEBSOCKET_PROTOCOL)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("");

            let supports_ocpp201 = requested_protocols
                .split(',')
                .map(|s| s.trim())
                .any(|p| p == OCPP_SUBPROTOCOL);

            if supports_ocpp201 {
                response.headers_mut().insert(
                    header::SEC_WEBSOCKET_PROTOCOL,
                    HeaderValue::from_static(OCPP_SUBPROTOCOL),
                );
            } else if !requested_protocols.is_empty() {
                warn!(
                    "Client from {} does not offer {}, requested: {}",
                    addr, OCPP_SUBPROTOCOL, requested_protocols
                );
            }

            match extract_station_id(path) {
                Some(id) => {
                    station_id = Some(id);
                    Ok(response)
                }
                None => {
                    warn!("Rejecting connection from {}: no station id in path", addr);
                    Err(reject_handshake("station id missing in request path"))
                }
            }
        },
    )
    .await?;

    // The callback only accepts the handshake after setting the id.
    let Some(station_id) = station_id else {
        return Ok(());
    };

    info!(
        station_id = station_id.as_str(),
        peer = %addr,
        "Station connected"
    );

    let (mut ws_sender, mut ws_receiver) = ws_stream.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let connection = registry.register(&station_id, tx);

    let handler = CentralHandler::new(
        station_id.clone(),
        stations.clone(),
        telemetry,
        connection.pending.clone(),
        heartbeat_interval,
    );

    // Single writer per socket.
    let send_station_id = station_id.clone();
    let send_task = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            debug!(station_id = send_station_id.as_str(), frame = frame.as_str(), "->");
            if let Err(e) = ws_sender.send(Message::Text(frame)).await {
                warn!(
                    station_id = send_station_id.as_str(),
                    "Send error, closing writer: {}", e
                );
                break;
            }
        }
        let _ = ws_sender.close().await;
    });

    // Read loop. Frames are handled in arrival order so replies never
    // overtake each other.
    loop {
        tokio::select! {
            msg = ws_receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        debug!(station_id = station_id.as_str(), frame = text.as_str(), "<-");
                        if let Some(reply) = handler.handle(&text).await {
                            if connection.send(reply).is_err() {
                                break;
                            }
                        }
                    }
                    Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => {}
                    Some(Ok(Message::Close(frame))) => {
                        debug!(
                            station_id = station_id.as_str(),
                            "Close frame received: {:?}", frame
                        );
                        break;
                    }
                    Some(Ok(Message::Binary(data))) => {
                        warn!(
                            station_id = station_id.as_str(),
                            "Ignoring binary message ({} bytes)",
                            data.len()
                        );
                    }
                    Some(Ok(Message::Frame(_))) => {}
                    Some(Err(e)) => {
                        warn!(station_id = station_id.as_str(), "WebSocket error: {}", e);
                        break;
                    }
                    None => break,
                }
            }
            _ = connection.closed() => {
                info!(
                    station_id = station_id.as_str(),
                    "Session closed by supervisor"
                );
                break;
            }
            _ = shutdown.wait() => {
                info!(
                    station_id = station_id.as_str(),
                    "Connection closing due to server shutdown"
                );
                break;
            }
        }
    }

    // Only the session that still owns the registry entry marks the station
    // offline; a superseded session must not clobber its successor's state.
    if registry.unregister(&station_id, connection.connection_id) {
        stations.mark_disconnected(&station_id);
    }
    connection.pending.fail_all(CommandError::ConnectionLost);
    connection.close();
    send_task.abort();

    let session_secs = (Utc::now() - connection.connected_at).num_seconds();
    info!(
        station_id = station_id.as_str(),
        session_secs, "Station disconnected"
    );
    Ok(())
}
