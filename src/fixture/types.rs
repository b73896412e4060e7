use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorChannel {
    Red,
    Green,
    Blue,
    White,
}

pub const COLOR_CHANNELS: [ColorChannel; 4] = [
    ColorChannel::Red,
    ColorChannel::Green,
    ColorChannel::Blue,
    ColorChannel::White,
];

impl fmt::Display for ColorChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let result = match self {
            ColorChannel::Red => "red",
            ColorChannel::Green => "green",
            ColorChannel::Blue => "blue",
            ColorChannel::White => "white",
        };

        write!(f, "{}", result)
    }
}

impl FromStr for ColorChannel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "red" | "r" => Ok(ColorChannel::Red),
            "green" | "g" => Ok(ColorChannel::Green),
            "blue" | "b" => Ok(ColorChannel::Blue),
            "white" | "w" => Ok(ColorChannel::White),
            _ => Err(()),
        }
    }
}

/// Color of a fixture while it is being edited.
/// A channel is `None` while its input field is empty or not a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub red: Option<u8>,
    pub green: Option<u8>,
    pub blue: Option<u8>,
    pub white: Option<u8>,
}

/// A fully specified color, as sent to the hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgbw {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    pub white: u8,
}

impl Color {
    pub const fn rgbw(red: u8, green: u8, blue: u8, white: u8) -> Self {
        Color { red: Some(red), green: Some(green), blue: Some(blue), white: Some(white) }
    }

    pub fn channel(&self, channel: ColorChannel) -> Option<u8> {
        match channel {
            ColorChannel::Red => self.red,
            ColorChannel::Green => self.green,
            ColorChannel::Blue => self.blue,
            ColorChannel::White => self.white,
        }
    }

    /// Applies raw user input to one channel: integers are clamped to [0, 255],
    /// anything else leaves the channel unset.
    pub fn with_channel(mut self, channel: ColorChannel, input: &str) -> Self {
        let value = input.trim()
            .parse::<i64>()
            .ok()
            .map(|parsed| parsed.clamp(0, 255) as u8);

        match channel {
            ColorChannel::Red => self.red = value,
            ColorChannel::Green => self.green = value,
            ColorChannel::Blue => self.blue = value,
            ColorChannel::White => self.white = value,
        }
        self
    }

    /// Returns the first unset channel if the color is incomplete.
    pub fn resolve(&self) -> Result<Rgbw, ColorChannel> {
        Ok(Rgbw {
            red: self.red.ok_or(ColorChannel::Red)?,
            green: self.green.ok_or(ColorChannel::Green)?,
            blue: self.blue.ok_or(ColorChannel::Blue)?,
            white: self.white.ok_or(ColorChannel::White)?,
        })
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::rgbw(0, 0, 0, 255)
    }
}

impl From<Rgbw> for Color {
    fn from(value: Rgbw) -> Self {
        Color::rgbw(value.red, value.green, value.blue, value.white)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let values: Vec<String> = COLOR_CHANNELS.iter()
            .map(|channel| match self.channel(*channel) {
                Some(value) => value.to_string(),
                None => "_".to_string(),
            })
            .collect();

        write!(f, "rgbw({})", values.join(", "))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fixture {
    pub id: u32,
    pub label: String,
    // included in saves ("value" checkbox)
    pub power: bool,
    // physically switched on ("switch" checkbox)
    pub enabled: bool,
    pub color: Color,
}

impl Fixture {
    pub fn new(id: u32, label: impl Into<String>) -> Self {
        Fixture {
            id,
            label: label.into(),
            power: true,
            enabled: true,
            color: Color::default(),
        }
    }
}

impl fmt::Display for Fixture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} [{}] {} {}",
            self.id,
            self.label,
            if self.power { "x" } else { " " },
            if self.enabled { "on " } else { "off" },
            self.color,
        )
    }
}

/// Entry of the save payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingSave {
    pub id: u32,
    pub color: Rgbw,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_input_is_clamped() {
        let color = Color::default()
            .with_channel(ColorChannel::Red, "300")
            .with_channel(ColorChannel::Green, "-4")
            .with_channel(ColorChannel::Blue, " 17 ");

        assert_eq!(color, Color::rgbw(255, 0, 17, 255));
    }

    #[test]
    fn test_invalid_input_unsets_channel() {
        let color = Color::default().with_channel(ColorChannel::White, "");
        assert_eq!(color.white, None);
        assert_eq!(color.resolve(), Err(ColorChannel::White));

        let color = Color::default().with_channel(ColorChannel::Blue, "abc");
        assert_eq!(color.resolve(), Err(ColorChannel::Blue));
    }

    #[test]
    fn test_save_payload_shape() {
        let entry = PendingSave { id: 3, color: Color::default().resolve().unwrap() };
        let json = serde_json::to_string(&vec![entry]).unwrap();

        assert_eq!(json, r#"[{"id":3,"color":{"red":0,"green":0,"blue":0,"white":255}}]"#);
    }

    #[test]
    fn test_channel_names() {
        assert_eq!("W".parse::<ColorChannel>(), Ok(ColorChannel::White));
        assert_eq!("green".parse::<ColorChannel>(), Ok(ColorChannel::Green));
        assert!("purple".parse::<ColorChannel>().is_err());
        assert_eq!(Color::default().with_channel(ColorChannel::Red, "").to_string(), "rgbw(_, 0, 0, 255)");
    }
}
