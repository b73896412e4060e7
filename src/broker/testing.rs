use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use futures::channel::mpsc::{UnboundedReceiver, UnboundedSender};

use crate::broker::coordinator::Coordinator;
use crate::broker::transport::Transport;
use crate::broker::types::{ConnectOptions, ConnectionStatus, Endpoint, Scheme, TransportEvent};
use crate::error::TransportError;
use crate::notice::{Notice, Notifier};

#[derive(Default)]
pub struct TransportLog {
    pub opened: usize,
    pub closed: usize,
    pub published: Vec<(String, Vec<u8>)>,
    pub events: Option<UnboundedSender<TransportEvent>>,
}

/// In-memory transport that records what the coordinator does with it.
#[derive(Clone, Default)]
pub struct FakeTransport {
    log: Arc<Mutex<TransportLog>>,
    auto_connect: bool,
    fail_open: bool,
}

impl FakeTransport {
    pub fn new() -> Self {
        FakeTransport::default()
    }

    /// Emits a connect event as soon as the session is opened.
    pub fn auto_connecting() -> Self {
        FakeTransport { auto_connect: true, ..FakeTransport::default() }
    }

    pub fn failing() -> Self {
        FakeTransport { fail_open: true, ..FakeTransport::default() }
    }

    fn log(&self) -> MutexGuard<'_, TransportLog> {
        self.log.lock().expect("Failed to lock transport log")
    }

    pub fn opened(&self) -> usize {
        self.log().opened
    }

    pub fn closed(&self) -> usize {
        self.log().closed
    }

    pub fn published(&self) -> Vec<(String, String)> {
        self.log().published.iter()
            .map(|(topic, payload)| (topic.clone(), String::from_utf8_lossy(payload).to_string()))
            .collect()
    }

    pub fn emit(&self, event: TransportEvent) {
        let log = self.log();
        let events = log.events.as_ref().expect("Session was never opened");
        events.unbounded_send(event).expect("Failed to emit transport event");
    }
}

impl Transport for FakeTransport {
    fn open(
        &mut self,
        _endpoint: &Endpoint,
        _options: &ConnectOptions,
        events: UnboundedSender<TransportEvent>,
    ) -> Result<(), TransportError> {
        if self.fail_open {
            return Err(TransportError::Closed);
        }

        let mut log = self.log();
        log.opened += 1;
        if self.auto_connect {
            events.unbounded_send(TransportEvent::Connect).expect("Failed to emit transport event");
        }
        log.events = Some(events);
        Ok(())
    }

    fn publish(&mut self, topic: &str, payload: Vec<u8>) -> Result<(), TransportError> {
        let mut log = self.log();
        if log.closed > 0 {
            return Err(TransportError::Closed);
        }
        log.published.push((topic.to_string(), payload));
        Ok(())
    }

    fn close(&mut self) {
        self.log().closed += 1;
    }
}

pub fn test_endpoint() -> Endpoint {
    Endpoint { scheme: Scheme::Ws, host: "localhost".to_string(), port: 8083 }
}

pub fn make_coordinator_with(transport: FakeTransport, notifier: Notifier) -> Coordinator<FakeTransport> {
    Coordinator::new(
        transport,
        test_endpoint(),
        ConnectOptions::new("test_", Duration::from_secs(60), None),
        Duration::from_secs(5),
        notifier,
    )
}

pub fn make_coordinator(transport: FakeTransport) -> (Coordinator<FakeTransport>, UnboundedReceiver<Notice>) {
    let (notifier, notices) = Notifier::channel();
    (make_coordinator_with(transport, notifier), notices)
}

/// Applies queued transport events until the coordinator reports `Connected`.
pub async fn settle<T: Transport>(coordinator: &mut Coordinator<T>) {
    while coordinator.status() != ConnectionStatus::Connected {
        let event = coordinator.next_event().await.expect("Transport event channel closed");
        coordinator.handle_event(event);
    }
}
