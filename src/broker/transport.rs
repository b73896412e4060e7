use futures::channel::mpsc::UnboundedSender;
use log::{debug, info, warn};
use rumqttc::Transport as TransportKind;
use rumqttc::v5::{AsyncClient, ConnectionError, Event, EventLoop, MqttOptions, StateError};
use rumqttc::v5::mqttbytes::QoS;
use rumqttc::v5::mqttbytes::v5::Packet;
use tokio::spawn;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};
use tokio_util::sync::CancellationToken;

use crate::broker::constants::{RECONNECT_DELAY, REQUEST_CAPACITY};
use crate::broker::types::{ConnectOptions, Endpoint, Scheme, TransportEvent};
use crate::error::TransportError;

/// The client side of a broker session.
///
/// `open` starts the session in the background and reports its progress on `events`.
/// Implementations keep retrying a failed connection on their own.
pub trait Transport {
    fn open(
        &mut self,
        endpoint: &Endpoint,
        options: &ConnectOptions,
        events: UnboundedSender<TransportEvent>,
    ) -> Result<(), TransportError>;

    fn publish(&mut self, topic: &str, payload: Vec<u8>) -> Result<(), TransportError>;

    fn close(&mut self);
}

/// MQTT 5 transport backed by rumqttc.
pub struct MqttTransport {
    cancel: CancellationToken,
    client: Option<AsyncClient>,
}

impl MqttTransport {
    pub fn new(cancel: CancellationToken) -> Self {
        MqttTransport { cancel, client: None }
    }
}

fn make_mqtt_options(endpoint: &Endpoint, options: &ConnectOptions) -> MqttOptions {
    let mut mqtt_options = match endpoint.scheme {
        // websocket transports take the whole url as the broker address
        Scheme::Ws | Scheme::Wss => MqttOptions::new(options.client_id.clone(), endpoint.url(), endpoint.port),
        Scheme::Mqtt | Scheme::Mqtts => MqttOptions::new(options.client_id.clone(), endpoint.host.clone(), endpoint.port),
    };

    mqtt_options.set_keep_alive(options.keep_alive);
    mqtt_options.set_clean_start(true);

    if let Some(credentials) = &options.credentials {
        mqtt_options.set_credentials(credentials.username.clone(), credentials.password.clone());
    }

    match endpoint.scheme {
        Scheme::Mqtt => {},
        Scheme::Mqtts => { mqtt_options.set_transport(TransportKind::tls_with_default_config()); },
        Scheme::Ws => { mqtt_options.set_transport(TransportKind::Ws); },
        Scheme::Wss => { mqtt_options.set_transport(TransportKind::wss_with_default_config()); },
    }

    mqtt_options
}

fn map_poll_result(result: Result<Event, ConnectionError>) -> Option<TransportEvent> {
    match result {
        Ok(Event::Incoming(Packet::ConnAck(_))) => Some(TransportEvent::Connect),
        Ok(Event::Incoming(Packet::Disconnect(_))) => {
            warn!("Broker closed the session");
            Some(TransportEvent::Offline)
        },
        Ok(_) => None,
        Err(ConnectionError::Io(err)) => {
            warn!("Broker connection lost: {}", err);
            Some(TransportEvent::Offline)
        },
        Err(ConnectionError::Timeout(_)) => {
            warn!("Broker connection timed out");
            Some(TransportEvent::Offline)
        },
        Err(ConnectionError::MqttState(StateError::AwaitPingResp)) => {
            warn!("Broker stopped answering pings");
            Some(TransportEvent::Offline)
        },
        Err(err) => Some(TransportEvent::Error(err.to_string())),
    }
}

fn event_pump_task(
    cancel: CancellationToken,
    mut eventloop: EventLoop,
    events: UnboundedSender<TransportEvent>,
) -> JoinHandle<()> {
    return spawn(async move {
        'mainloop: loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    break 'mainloop;
                },
                result = eventloop.poll() => {
                    if let Err(ConnectionError::RequestsDone) = result {
                        debug!("Client handle dropped, stopping event pump");
                        break 'mainloop;
                    }

                    let Some(event) = map_poll_result(result) else {
                        continue;
                    };

                    let failed = event != TransportEvent::Connect;
                    if events.unbounded_send(event).is_err() {
                        debug!("Nobody listens for transport events anymore");
                        break 'mainloop;
                    }

                    if failed {
                        // the next poll reconnects
                        sleep(Duration::from_millis(RECONNECT_DELAY)).await;
                    }
                }
            }
        }

        info!("Event pump stopped");
    });
}

impl Transport for MqttTransport {
    fn open(
        &mut self,
        endpoint: &Endpoint,
        options: &ConnectOptions,
        events: UnboundedSender<TransportEvent>,
    ) -> Result<(), TransportError> {
        info!(
            "Connecting to {} as {} ({} v{})",
            endpoint.url(),
            options.client_id,
            options.protocol_id,
            options.protocol_version,
        );

        let (client, eventloop) = AsyncClient::new(make_mqtt_options(endpoint, options), REQUEST_CAPACITY);
        // the pump ends on its own once cancelled or once the client is gone
        let _ = event_pump_task(self.cancel.child_token(), eventloop, events);
        self.client = Some(client);
        Ok(())
    }

    fn publish(&mut self, topic: &str, payload: Vec<u8>) -> Result<(), TransportError> {
        let client = self.client.as_ref().ok_or(TransportError::Closed)?;
        client.try_publish(topic, QoS::AtMostOnce, false, payload)?;
        Ok(())
    }

    fn close(&mut self) {
        if let Some(client) = self.client.take() {
            info!("Disconnecting from broker");
            if let Err(err) = client.try_disconnect() {
                warn!("Failed to send disconnect: {}", err);
            }
            // dropping the client ends the pump with RequestsDone once the disconnect is out
            return;
        }
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use rumqttc::v5::mqttbytes::v5::{ConnAck, ConnectReturnCode, PingResp};
    use super::*;

    #[test]
    fn test_connack_maps_to_connect() {
        let connack = ConnAck { session_present: false, code: ConnectReturnCode::Success, properties: None };
        assert_eq!(map_poll_result(Ok(Event::Incoming(Packet::ConnAck(connack)))), Some(TransportEvent::Connect));
        assert_eq!(map_poll_result(Ok(Event::Incoming(Packet::PingResp(PingResp)))), None);
    }

    #[tokio::test]
    async fn test_lost_connection_maps_to_offline() {
        let io_error = ConnectionError::Io(io::Error::new(io::ErrorKind::ConnectionReset, "reset"));
        assert_eq!(map_poll_result(Err(io_error)), Some(TransportEvent::Offline));

        let elapsed = tokio::time::timeout(Duration::ZERO, std::future::pending::<()>()).await.unwrap_err();
        assert_eq!(map_poll_result(Err(ConnectionError::Timeout(elapsed))), Some(TransportEvent::Offline));

        let ping = ConnectionError::MqttState(StateError::AwaitPingResp);
        assert_eq!(map_poll_result(Err(ping)), Some(TransportEvent::Offline));
    }

    #[test]
    fn test_other_poll_errors_map_to_error() {
        match map_poll_result(Err(ConnectionError::RequestsDone)) {
            Some(TransportEvent::Error(message)) => assert!(!message.is_empty()),
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_publish_after_close_is_rejected() {
        let mut transport = MqttTransport::new(CancellationToken::new());
        assert!(matches!(transport.publish("lampu", b"[]".to_vec()), Err(TransportError::Closed)));

        transport.close();
        assert!(matches!(transport.publish("lampu", b"[]".to_vec()), Err(TransportError::Closed)));
    }
}
