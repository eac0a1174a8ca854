use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use padrelay_frame::FrameConfig;
use padrelay_layout::ByteLayout;
use padrelay_transport::{RelayStream, TcpTransport};
use tracing::{info, warn};

use crate::decoder::{JsonRecordDecoder, RecordDecoder};
use crate::error::Result;
use crate::session::Session;
use crate::sink::{SerialSinkFactory, SinkFactory};

/// How long the accept loop sleeps when no connection is pending.
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Accepts producer connections and runs one [`Session`] per connection.
///
/// All sessions share the same immutable layout, decoder and sink factory.
pub struct RelayServer {
    transport: TcpTransport,
    layout: Arc<ByteLayout>,
    sinks: Arc<dyn SinkFactory>,
    decoder: Arc<dyn RecordDecoder>,
    frame_config: FrameConfig,
    next_session_id: AtomicU64,
}

impl RelayServer {
    /// Bind a TCP listener. Uses the legacy layout and the default serial
    /// device until overridden.
    pub fn bind(addr: impl ToSocketAddrs + std::fmt::Display) -> Result<Self> {
        let transport = TcpTransport::bind(addr)?;
        Ok(Self {
            transport,
            layout: Arc::new(ByteLayout::default()),
            sinks: Arc::new(SerialSinkFactory::default()),
            decoder: Arc::new(JsonRecordDecoder),
            frame_config: FrameConfig::default(),
            next_session_id: AtomicU64::new(1),
        })
    }

    pub fn with_layout(mut self, layout: Arc<ByteLayout>) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_sink_factory(mut self, sinks: Arc<dyn SinkFactory>) -> Self {
        self.sinks = sinks;
        self
    }

    pub fn with_decoder(mut self, decoder: Arc<dyn RecordDecoder>) -> Self {
        self.decoder = decoder;
        self
    }

    pub fn with_frame_config(mut self, config: FrameConfig) -> Self {
        self.frame_config = config;
        self
    }

    /// Bound local address (useful after binding port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.transport.local_addr()
    }

    /// Layout shared by every session.
    pub fn layout(&self) -> &Arc<ByteLayout> {
        &self.layout
    }

    /// Accept connections until `running` is cleared.
    ///
    /// Sessions already running are left to finish on their own.
    pub fn serve(&self, running: &AtomicBool) -> Result<()> {
        self.transport.set_nonblocking(true)?;
        info!(
            local = %self.local_addr(),
            output_size = self.layout.output_size(),
            device = %self.sinks.describe(),
            max_payload = self.frame_config.max_payload_size,
            "relay serving"
        );

        while running.load(Ordering::SeqCst) {
            match self.transport.try_accept() {
                Ok(Some(stream)) => self.spawn_session(stream),
                Ok(None) => thread::sleep(ACCEPT_POLL_INTERVAL),
                Err(err) => {
                    warn!(error = %err, "accept failed");
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
            }
        }

        info!(local = %self.local_addr(), "relay stopped accepting");
        Ok(())
    }

    fn spawn_session(&self, stream: RelayStream) {
        let id = self.next_session_id.fetch_add(1, Ordering::Relaxed);
        let peer = stream.peer_addr();

        let session = match Session::tcp(
            stream,
            self.frame_config.clone(),
            Arc::clone(&self.layout),
            Arc::clone(&self.sinks),
        ) {
            Ok(session) => session.with_decoder(Arc::clone(&self.decoder)),
            Err(err) => {
                warn!(%peer, error = %err, "could not start session");
                return;
            }
        };

        info!(%peer, session = id, "producer connected");
        let spawned = thread::Builder::new()
            .name(format!("padrelay-session-{id}"))
            .spawn(move || {
                session.run();
            });
        if let Err(err) = spawned {
            warn!(%peer, error = %err, "could not spawn session thread");
        }
    }
}
