use log::{debug, info};
use tokio::sync::watch;
use tokio::time::Duration;

use crate::broker::constants::BUSY_WINDOW;
use crate::broker::coordinator::Coordinator;
use crate::broker::transport::Transport;
use crate::broker::types::{ConnectionStatus, TransportEvent};
use crate::config::types::{DispatchPolicy, TopicConfig};
use crate::error::DispatchError;
use crate::fixture::store::FixtureStore;
use crate::fixture::types::ColorChannel;
use crate::notice::Notifier;
use crate::panel::busy::BusyWindow;
use crate::panel::types::{Delivery, Intent};
use crate::scene::catalog::{SceneCatalog, SceneKind};

pub const HELP: &str = "Commands: scene <name>, save, power <id>, switch <id>, \
color <id> <red|green|blue|white> [value], preset <id> <name>, status, fixtures, scenes, help, quit";

/// Turns intents into broker messages.
///
/// Local fixture state changes as soon as the intent is handled, whether or not the
/// message that goes with it is delivered. A failed publish is reported but the local
/// state is not rolled back.
pub struct Dispatcher<T: Transport> {
    coordinator: Coordinator<T>,
    store: FixtureStore,
    catalog: SceneCatalog,
    topics: TopicConfig,
    policy: DispatchPolicy,
    notifier: Notifier,

    selected_scene: Option<String>,
    busy: BusyWindow,
}

impl<T: Transport> Dispatcher<T> {
    pub fn new(
        coordinator: Coordinator<T>,
        store: FixtureStore,
        catalog: SceneCatalog,
        topics: TopicConfig,
        policy: DispatchPolicy,
        notifier: Notifier,
    ) -> Self {
        Dispatcher {
            coordinator,
            store,
            catalog,
            topics,
            policy,
            notifier,
            selected_scene: None,
            busy: BusyWindow::new(Duration::from_secs(BUSY_WINDOW)),
        }
    }

    pub fn store(&self) -> &FixtureStore {
        &self.store
    }

    pub fn status(&self) -> ConnectionStatus {
        self.coordinator.status()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.coordinator.subscribe()
    }

    pub fn selected_scene(&self) -> Option<&str> {
        self.selected_scene.as_deref()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.is_busy()
    }

    /// Starts connecting without waiting for the result.
    pub fn start(&mut self) {
        if let Err(err) = self.coordinator.ensure_connected() {
            self.notifier.error(err.to_string());
        }
    }

    pub async fn next_transport_event(&mut self) -> Option<TransportEvent> {
        self.coordinator.next_event().await
    }

    pub fn handle_transport_event(&mut self, event: TransportEvent) {
        self.coordinator.handle_event(event);
    }

    pub fn teardown(&mut self) {
        self.coordinator.teardown();
    }

    /// Whether a publish may go out now.
    async fn ready(&mut self) -> Result<bool, DispatchError> {
        match self.policy {
            DispatchPolicy::AwaitConnection => {
                self.coordinator.connect().await?;
                Ok(true)
            },
            DispatchPolicy::DropUntilConnected => {
                // the status is read before connecting: a connect started here does not
                // help this command
                let connected = self.coordinator.status() == ConnectionStatus::Connected;
                self.coordinator.ensure_connected()?;
                Ok(connected)
            },
        }
    }

    async fn publish(&mut self, topic: String, payload: Vec<u8>) -> Result<Delivery, DispatchError> {
        if !self.ready().await? {
            debug!("Not connected yet, dropping message for {}", topic);
            return Ok(Delivery::Dropped);
        }

        self.coordinator.publish(&topic, payload)?;
        Ok(Delivery::Published)
    }

    pub async fn select_scene(&mut self, name: &str) -> Result<Delivery, DispatchError> {
        let kind = self.catalog.scene(name)
            .map(|scene| scene.kind)
            .ok_or_else(|| DispatchError::UnknownScene { name: name.to_string() })?;

        match kind {
            SceneKind::Solid => self.select_solid_scene(name).await,
            SceneKind::Dim => self.select_dim_scene(name).await,
        }
    }

    pub async fn select_solid_scene(&mut self, name: &str) -> Result<Delivery, DispatchError> {
        let delivery = self.publish(self.topics.scene.clone(), name.as_bytes().to_vec()).await?;

        if delivery == Delivery::Published {
            self.notifier.info(format!("{} selected...", name));
            self.selected_scene = Some(name.to_string());
        }
        Ok(delivery)
    }

    /// The hardware runs a dimming program after this, the panel stays busy meanwhile.
    pub async fn select_dim_scene(&mut self, name: &str) -> Result<Delivery, DispatchError> {
        self.selected_scene = Some(name.to_string());

        let result = self.publish(self.topics.scene.clone(), name.as_bytes().to_vec()).await;
        if let Ok(Delivery::Published) = result {
            self.notifier.info(format!("{} selected...", name));
        }

        if self.busy.start() {
            info!("Busy for {} seconds", BUSY_WINDOW);
        }
        result
    }

    pub async fn save_fixtures(&mut self) -> Result<Delivery, DispatchError> {
        let pending = self.store.pending_save()?;
        let payload = serde_json::to_vec(&pending)?;

        let delivery = self.publish(self.topics.save.clone(), payload).await?;
        if delivery == Delivery::Published {
            self.notifier.info("Sending...");
        }
        Ok(delivery)
    }

    /// Local only, `power` decides which fixtures a save includes.
    pub fn toggle_fixture_power(&mut self, id: u32) -> Result<bool, DispatchError> {
        self.store.toggle_fixture_power(id).ok_or(DispatchError::UnknownFixture { id })
    }

    pub async fn toggle_fixture_enabled(&mut self, id: u32) -> Result<Delivery, DispatchError> {
        let was_enabled = self.store.toggle_fixture_enabled(id)
            .ok_or(DispatchError::UnknownFixture { id })?;

        let topic = if was_enabled { self.topics.off.clone() } else { self.topics.on.clone() };
        let payload = serde_json::to_vec(&id)?;

        let delivery = self.publish(topic, payload).await?;
        if delivery == Delivery::Published {
            self.notifier.info(if was_enabled { "Switching light off..." } else { "Switching light on..." });
        }
        Ok(delivery)
    }

    pub fn set_channel(&mut self, id: u32, channel: ColorChannel, value: &str) -> Result<(), DispatchError> {
        if !self.store.set_channel(id, channel, value) {
            return Err(DispatchError::UnknownFixture { id });
        }
        Ok(())
    }

    pub fn preview_color(&mut self, id: u32, preset: &str) -> Result<(), DispatchError> {
        let color = self.catalog.preset(preset)
            .map(|preset| preset.color())
            .ok_or_else(|| DispatchError::UnknownScene { name: preset.to_string() })?;

        if !self.store.preview_color(id, color) {
            return Err(DispatchError::UnknownFixture { id });
        }
        Ok(())
    }

    fn show_status(&self) {
        let busy = match self.busy.remaining() {
            Some(remaining) => format!("busy for {}s", remaining.as_secs()),
            None => "idle".to_string(),
        };

        self.notifier.info(format!(
            "{} ({}), scene: {}, {}",
            self.coordinator.status(),
            self.coordinator.endpoint().url(),
            self.selected_scene.as_deref().unwrap_or("none"),
            busy,
        ));
    }

    fn list_fixtures(&self) {
        for fixture in self.store.fixtures() {
            self.notifier.info(fixture.to_string());
        }
    }

    fn list_scenes(&self) {
        for scene in self.catalog.scenes() {
            let kind = match scene.kind {
                SceneKind::Solid => "solid",
                SceneKind::Dim => "dim",
            };
            self.notifier.info(format!("{} ({})", scene.name, kind));
        }

        let presets: Vec<&str> = self.catalog.presets().map(|preset| preset.name.as_str()).collect();
        self.notifier.info(format!("presets: {}", presets.join(", ")));
    }

    /// Handles one intent to completion. Failures end up as notices.
    pub async fn dispatch(&mut self, intent: Intent) {
        let result = match intent {
            Intent::SelectScene(name) => self.select_scene(&name).await.map(|_| ()),
            Intent::SaveFixtures => self.save_fixtures().await.map(|_| ()),
            Intent::ToggleFixturePower(id) => self.toggle_fixture_power(id).map(|_| ()),
            Intent::ToggleFixtureEnabled(id) => self.toggle_fixture_enabled(id).await.map(|_| ()),
            Intent::SetChannel { id, channel, value } => self.set_channel(id, channel, &value),
            Intent::PreviewColor { id, preset } => self.preview_color(id, &preset),
            Intent::ShowStatus => {
                self.show_status();
                Ok(())
            },
            Intent::ListFixtures => {
                self.list_fixtures();
                Ok(())
            },
            Intent::ListScenes => {
                self.list_scenes();
                Ok(())
            },
            Intent::Help => {
                self.notifier.info(HELP);
                Ok(())
            },
            Intent::Quit => Ok(()),
        };

        if let Err(err) = result {
            if err.is_surfaced() {
                debug!("Command failed: {}", err);
            }
            else {
                self.notifier.error(err.to_string());
            }
        }
    }
}
