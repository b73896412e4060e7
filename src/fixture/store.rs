use crate::error::ValidationError;
use crate::fixture::types::{Color, ColorChannel, Fixture, PendingSave};

pub const DEFAULT_FIXTURE_COUNT: u32 = 4;

/// Last known local state of every fixture.
///
/// All updates are synchronous and leave fixtures with a different id untouched.
/// Operations on an unknown id change nothing and report so through their return value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureStore {
    fixtures: Vec<Fixture>,
}

impl FixtureStore {
    pub fn new(fixtures: Vec<Fixture>) -> Self {
        FixtureStore { fixtures }
    }

    pub fn fixtures(&self) -> &[Fixture] {
        &self.fixtures
    }

    pub fn get(&self, id: u32) -> Option<&Fixture> {
        self.fixtures.iter().find(|fixture| fixture.id == id)
    }

    fn get_mut(&mut self, id: u32) -> Option<&mut Fixture> {
        self.fixtures.iter_mut().find(|fixture| fixture.id == id)
    }

    /// Flips `power`, returns the new value.
    pub fn toggle_fixture_power(&mut self, id: u32) -> Option<bool> {
        let fixture = self.get_mut(id)?;
        fixture.power = !fixture.power;
        Some(fixture.power)
    }

    /// Flips `enabled`, returns the value from *before* the toggle. The caller picks the
    /// outbound on/off topic from it.
    pub fn toggle_fixture_enabled(&mut self, id: u32) -> Option<bool> {
        let fixture = self.get_mut(id)?;
        let previous = fixture.enabled;
        fixture.enabled = !previous;
        Some(previous)
    }

    pub fn set_color(&mut self, id: u32, color: Color) -> bool {
        match self.get_mut(id) {
            Some(fixture) => {
                fixture.color = color;
                true
            },
            None => false,
        }
    }

    /// Same effect as `set_color`, used for swatch selections.
    pub fn preview_color(&mut self, id: u32, color: Color) -> bool {
        self.set_color(id, color)
    }

    /// Manual edit of a single channel, see `Color::with_channel`.
    pub fn set_channel(&mut self, id: u32, channel: ColorChannel, input: &str) -> bool {
        match self.get_mut(id) {
            Some(fixture) => {
                fixture.color = fixture.color.with_channel(channel, input);
                true
            },
            None => false,
        }
    }

    /// Builds the save payload from all powered fixtures.
    pub fn pending_save(&self) -> Result<Vec<PendingSave>, ValidationError> {
        self.fixtures.iter()
            .filter(|fixture| fixture.power)
            .map(|fixture| {
                let color = fixture.color.resolve().map_err(|channel| ValidationError {
                    fixture_id: fixture.id,
                    label: fixture.label.clone(),
                    channel,
                })?;
                Ok(PendingSave { id: fixture.id, color })
            })
            .collect()
    }
}

impl Default for FixtureStore {
    fn default() -> Self {
        FixtureStore::new(
            (1..=DEFAULT_FIXTURE_COUNT)
                .map(|id| Fixture::new(id, format!("Light {}", id)))
                .collect()
        )
    }
}
