use futures::{SinkExt, StreamExt};
use futures::channel::mpsc::{channel, Receiver, UnboundedReceiver};
use log::{debug, info};
use tokio::io::{stdin, stdout, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::spawn;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::broker::types::ConnectionStatus;
use crate::error::ShellError;
use crate::fixture::types::ColorChannel;
use crate::notice::Notice;
use crate::panel::types::Intent;

fn parse_id(value: Option<&str>) -> Result<u32, ShellError> {
    let value = value.ok_or(ShellError::MissingArgument { name: "light id" })?;
    Ok(value.parse::<u32>()?)
}

// joins the remaining words, scene names contain spaces
fn rest(words: &[&str], name: &'static str) -> Result<String, ShellError> {
    if words.is_empty() {
        return Err(ShellError::MissingArgument { name });
    }
    Ok(words.join(" "))
}

/// Parses one line of shell input. Empty lines yield `None`.
pub fn parse_command(line: &str) -> Result<Option<Intent>, ShellError> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let Some((command, args)) = words.split_first() else {
        return Ok(None);
    };

    let intent = match command.to_ascii_lowercase().as_str() {
        "scene" => Intent::SelectScene(rest(args, "scene name")?),
        "save" => Intent::SaveFixtures,
        "power" => Intent::ToggleFixturePower(parse_id(args.first().copied())?),
        "switch" => Intent::ToggleFixtureEnabled(parse_id(args.first().copied())?),
        "color" => {
            let id = parse_id(args.first().copied())?;
            let channel_name = args.get(1).ok_or(ShellError::MissingArgument { name: "color channel" })?;
            let channel = channel_name.parse::<ColorChannel>()
                .map_err(|_| ShellError::InvalidChannel { channel: channel_name.to_string() })?;
            // a missing value clears the channel, like emptying the input field
            let value = args.get(2).copied().unwrap_or("").to_string();
            Intent::SetChannel { id, channel, value }
        },
        "preset" => {
            let id = parse_id(args.first().copied())?;
            let preset = rest(args.get(1..).unwrap_or(&[]), "preset name")?;
            Intent::PreviewColor { id, preset }
        },
        "status" => Intent::ShowStatus,
        "fixtures" | "lights" => Intent::ListFixtures,
        "scenes" => Intent::ListScenes,
        "help" | "?" => Intent::Help,
        "quit" | "exit" => Intent::Quit,
        _ => return Err(ShellError::UnknownCommand { command: command.to_string() }),
    };

    Ok(Some(intent))
}

/// Reads commands from stdin until end of input or `quit`.
pub fn shell_task(cancel: CancellationToken, status: watch::Receiver<ConnectionStatus>) -> (Receiver<Intent>, JoinHandle<()>) {
    let (mut tx, rx) = channel::<Intent>(8);

    let handle = spawn(async move {
        let mut lines = BufReader::new(stdin()).lines();
        let mut out = stdout();

        'mainloop: loop {
            let prompt = format!("lightpanel ({})> ", *status.borrow());
            if out.write_all(prompt.as_bytes()).await.is_err() || out.flush().await.is_err() {
                debug!("stdout is gone");
            }

            let line = tokio::select! {
                _ = cancel.cancelled() => {
                    break 'mainloop;
                },
                line = lines.next_line() => line,
            };

            let line = match line {
                Ok(Some(line)) => line,
                Ok(None) => {
                    info!("End of input");
                    break 'mainloop;
                },
                Err(err) => {
                    info!("Failed to read input: {}", err);
                    break 'mainloop;
                },
            };

            match parse_command(&line) {
                Ok(None) => {},
                Ok(Some(intent)) => {
                    let quit = intent == Intent::Quit;
                    if tx.send(intent).await.is_err() || quit {
                        break 'mainloop;
                    }
                },
                Err(err) => println!("{}", err),
            }
        }
    });

    (rx, handle)
}

/// Prints notices as they arrive.
pub fn notice_printer_task(mut notices: UnboundedReceiver<Notice>) -> JoinHandle<()> {
    spawn(async move {
        while let Some(notice) = notices.next().await {
            println!("{}", notice);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse_command("scene Warm White"), Ok(Some(Intent::SelectScene("Warm White".to_string()))));
        assert_eq!(parse_command("  save "), Ok(Some(Intent::SaveFixtures)));
        assert_eq!(parse_command("power 3"), Ok(Some(Intent::ToggleFixturePower(3))));
        assert_eq!(parse_command("SWITCH 2"), Ok(Some(Intent::ToggleFixtureEnabled(2))));
        assert_eq!(parse_command("preset 1 Warm"), Ok(Some(Intent::PreviewColor { id: 1, preset: "Warm".to_string() })));
        assert_eq!(parse_command("quit"), Ok(Some(Intent::Quit)));
        assert_eq!(parse_command(""), Ok(None));
    }

    #[test]
    fn test_parse_color() {
        assert_eq!(
            parse_command("color 4 w 200"),
            Ok(Some(Intent::SetChannel { id: 4, channel: ColorChannel::White, value: "200".to_string() })),
        );
        assert_eq!(
            parse_command("color 4 red"),
            Ok(Some(Intent::SetChannel { id: 4, channel: ColorChannel::Red, value: String::new() })),
        );
        assert_eq!(
            parse_command("color 4 pink 1"),
            Err(ShellError::InvalidChannel { channel: "pink".to_string() }),
        );
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(parse_command("scene"), Err(ShellError::MissingArgument { name: "scene name" }));
        assert_eq!(parse_command("switch"), Err(ShellError::MissingArgument { name: "light id" }));
        assert!(matches!(parse_command("power one"), Err(ShellError::InvalidFixtureId { .. })));
        assert_eq!(parse_command("dance"), Err(ShellError::UnknownCommand { command: "dance".to_string() }));
    }
}
