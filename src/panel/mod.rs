use futures::StreamExt;
use futures::channel::mpsc::Receiver;
use log::info;
use tokio_util::sync::CancellationToken;

use crate::broker::transport::Transport;
use crate::panel::dispatcher::Dispatcher;
use crate::panel::types::Intent;

pub mod busy;
pub mod dispatcher;
pub mod shell;
pub mod types;

/// Drives the panel until the intent stream ends, `quit` is received or `cancel` fires.
/// The broker session is torn down on the way out.
pub async fn run_panel<T: Transport>(
    mut dispatcher: Dispatcher<T>,
    mut intents: Receiver<Intent>,
    cancel: CancellationToken,
) {
    dispatcher.start();

    'mainloop: loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("Panel cancelled");
                break 'mainloop;
            },
            intent = intents.next() => {
                match intent {
                    None | Some(Intent::Quit) => {
                        info!("Leaving panel");
                        break 'mainloop;
                    },
                    Some(intent) => dispatcher.dispatch(intent).await,
                }
            },
            Some(event) = dispatcher.next_transport_event() => {
                dispatcher.handle_transport_event(event);
            },
        }
    }

    dispatcher.teardown();
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::channel::mpsc::channel;
    use crate::broker::testing::{make_coordinator_with, FakeTransport};
    use crate::config::types::{DispatchPolicy, TopicConfig};
    use crate::fixture::store::FixtureStore;
    use crate::notice::Notifier;
    use crate::scene::catalog::SceneCatalog;

    fn make_dispatcher(transport: FakeTransport) -> Dispatcher<FakeTransport> {
        let (notifier, _notices) = Notifier::channel();
        Dispatcher::new(
            make_coordinator_with(transport, notifier.clone()),
            FixtureStore::default(),
            SceneCatalog::builtin().unwrap(),
            TopicConfig::default(),
            DispatchPolicy::AwaitConnection,
            notifier,
        )
    }

    #[tokio::test]
    async fn test_runs_until_quit() {
        let transport = FakeTransport::auto_connecting();
        let (mut tx, rx) = channel(8);
        tx.try_send(Intent::SelectScene("Red".to_string())).unwrap();
        tx.try_send(Intent::Quit).unwrap();
        tx.try_send(Intent::SaveFixtures).unwrap();

        run_panel(make_dispatcher(transport.clone()), rx, CancellationToken::new()).await;

        assert_eq!(transport.published(), vec![("vl/dmx/wawasan/rx".to_string(), "Red".to_string())]);
        assert_eq!(transport.opened(), 1);
        assert_eq!(transport.closed(), 1);
    }

    #[tokio::test]
    async fn test_end_of_input_tears_down() {
        let transport = FakeTransport::auto_connecting();
        let (tx, rx) = channel::<Intent>(8);
        drop(tx);

        run_panel(make_dispatcher(transport.clone()), rx, CancellationToken::new()).await;

        assert!(transport.published().is_empty());
        assert_eq!(transport.opened(), 1);
        assert_eq!(transport.closed(), 1);
    }

    #[tokio::test]
    async fn test_cancel_tears_down() {
        let transport = FakeTransport::new();
        let (_tx, rx) = channel::<Intent>(8);
        let cancel = CancellationToken::new();
        cancel.cancel();

        run_panel(make_dispatcher(transport.clone()), rx, cancel).await;

        assert_eq!(transport.closed(), 1);
    }
}
