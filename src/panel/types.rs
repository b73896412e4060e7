use crate::fixture::types::ColorChannel;

/// Something the user asked the panel to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    SelectScene(String),
    SaveFixtures,
    ToggleFixturePower(u32),
    ToggleFixtureEnabled(u32),
    SetChannel {
        id: u32,
        channel: ColorChannel,
        // raw input, may be empty while editing
        value: String,
    },
    PreviewColor {
        id: u32,
        preset: String,
    },
    ShowStatus,
    ListFixtures,
    ListScenes,
    Help,
    Quit,
}

/// What happened to the outbound message of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Published,
    // the connection was not ready, see `DispatchPolicy::DropUntilConnected`
    Dropped,
}
