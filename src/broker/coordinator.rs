use futures::StreamExt;
use futures::channel::mpsc::{unbounded, UnboundedReceiver, UnboundedSender};
use log::{debug, info, warn};
use tokio::sync::watch;
use tokio::time::{timeout, Duration};

use crate::broker::transport::Transport;
use crate::broker::types::{ConnectOptions, ConnectionStatus, Endpoint, TransportEvent};
use crate::error::DispatchError;
use crate::notice::Notifier;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    // no session was opened yet
    Idle,
    Open,
    // torn down, a new session is never opened
    Closed,
}

/// Owns the single broker session of the process and tracks its status.
///
/// Transport events are queued on an internal channel and applied one at a time, either by
/// the panel loop (`next_event` + `handle_event`) or by `connect` while it waits.
pub struct Coordinator<T: Transport> {
    transport: T,
    endpoint: Endpoint,
    options: ConnectOptions,
    connect_timeout: Duration,
    notifier: Notifier,

    session: SessionState,
    status: watch::Sender<ConnectionStatus>,
    // the success notice is shown once per session
    announced: bool,

    events_tx: UnboundedSender<TransportEvent>,
    events_rx: UnboundedReceiver<TransportEvent>,
}

impl<T: Transport> Coordinator<T> {
    pub fn new(
        transport: T,
        endpoint: Endpoint,
        options: ConnectOptions,
        connect_timeout: Duration,
        notifier: Notifier,
    ) -> Self {
        let (events_tx, events_rx) = unbounded::<TransportEvent>();
        let (status, _) = watch::channel(ConnectionStatus::Disconnected);

        Coordinator {
            transport,
            endpoint,
            options,
            connect_timeout,
            notifier,
            session: SessionState::Idle,
            status,
            announced: false,
            events_tx,
            events_rx,
        }
    }

    pub fn status(&self) -> ConnectionStatus {
        *self.status.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<ConnectionStatus> {
        self.status.subscribe()
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    fn set_status(&mut self, status: ConnectionStatus) {
        let previous = self.status.send_replace(status);
        if previous != status {
            debug!("Connection status {} -> {}", previous, status);
        }
    }

    /// Opens the session unless one exists. Never opens a second session.
    pub fn ensure_connected(&mut self) -> Result<(), DispatchError> {
        match self.session {
            SessionState::Open => Ok(()),
            SessionState::Closed => Err(DispatchError::SessionClosed),
            SessionState::Idle => {
                self.set_status(ConnectionStatus::Connecting);

                if let Err(err) = self.transport.open(&self.endpoint, &self.options, self.events_tx.clone()) {
                    self.set_status(ConnectionStatus::Disconnected);
                    return Err(err.into());
                }

                self.session = SessionState::Open;
                Ok(())
            },
        }
    }

    /// Resolves once the session is connected.
    ///
    /// Fails when the transport reports an error while waiting or when the connect timeout
    /// elapses. Offline notices keep the wait going since the transport retries by itself.
    pub async fn connect(&mut self) -> Result<(), DispatchError> {
        self.ensure_connected()?;

        if self.status() == ConnectionStatus::Connected {
            return Ok(());
        }

        let connect_timeout = self.connect_timeout;
        let wait = async {
            loop {
                let event = match self.events_rx.next().await {
                    Some(event) => event,
                    None => return Err(DispatchError::SessionClosed),
                };

                let error = match &event {
                    TransportEvent::Error(message) => Some(message.clone()),
                    _ => None,
                };

                self.handle_event(event);

                if let Some(message) = error {
                    return Err(DispatchError::Connection { message });
                }

                if self.status() == ConnectionStatus::Connected {
                    return Ok(());
                }
            }
        };

        match timeout(connect_timeout, wait).await {
            Ok(result) => result,
            Err(_) => {
                warn!("No connection after {:?}", connect_timeout);
                Err(DispatchError::ConnectTimeout)
            },
        }
    }

    /// The next queued transport event. Pending forever if there is none.
    pub async fn next_event(&mut self) -> Option<TransportEvent> {
        self.events_rx.next().await
    }

    pub fn handle_event(&mut self, event: TransportEvent) {
        if self.session == SessionState::Closed {
            debug!("Ignoring {:?} after teardown", event);
            return;
        }

        let previous = self.status();

        match event {
            TransportEvent::Connect => {
                self.set_status(ConnectionStatus::Connected);

                if !self.announced {
                    self.announced = true;
                    self.notifier.success("Connected");
                }
                else if previous != ConnectionStatus::Connected {
                    info!("Reconnected to {}", self.endpoint.url());
                }
            },
            TransportEvent::Offline => {
                self.set_status(ConnectionStatus::Disconnected);

                // warn on the transition only, repeated offline notices stay quiet
                if previous != ConnectionStatus::Disconnected {
                    self.notifier.warning("MQTT Connection Offline");
                }
            },
            TransportEvent::Error(message) => {
                self.set_status(ConnectionStatus::Disconnected);
                self.notifier.error(message);
            },
        }
    }

    pub fn publish(&mut self, topic: &str, payload: Vec<u8>) -> Result<(), DispatchError> {
        if self.session == SessionState::Closed {
            return Err(DispatchError::SessionClosed);
        }
        if self.status() != ConnectionStatus::Connected {
            return Err(DispatchError::NotConnected);
        }

        debug!("Publishing {} bytes to {}", payload.len(), topic);
        self.transport.publish(topic, payload)?;
        Ok(())
    }

    /// Closes the session if there is one. Safe to call more than once.
    pub fn teardown(&mut self) {
        if self.session == SessionState::Open {
            self.transport.close();
        }
        self.session = SessionState::Closed;
        self.set_status(ConnectionStatus::Disconnected);
    }
}
