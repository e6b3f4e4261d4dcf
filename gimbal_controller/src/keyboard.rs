use std::{
    io::{self, IsTerminal},
    time::Duration,
};

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode},
};
use ptu::Movement;
use tokio::{sync::mpsc, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Move(Movement),
    Quit,
}

pub fn key_action(key: &KeyEvent) -> Option<KeyAction> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => Some(KeyAction::Quit),
            _ => None,
        };
    }

    match key.code {
        KeyCode::Char('w') | KeyCode::Up => Some(KeyAction::Move(Movement::Up)),
        KeyCode::Char('a') | KeyCode::Left => Some(KeyAction::Move(Movement::Left)),
        KeyCode::Char('s') | KeyCode::Down => Some(KeyAction::Move(Movement::Down)),
        KeyCode::Char('d') | KeyCode::Right => Some(KeyAction::Move(Movement::Right)),
        KeyCode::Char('q') | KeyCode::Esc => Some(KeyAction::Quit),
        _ => None,
    }
}

/// Fails unless `input` is a terminal that raw-mode key reading can use.
pub fn ensure_interactive<T: IsTerminal>(input: &T) -> io::Result<()> {
    if input.is_terminal() {
        Ok(())
    } else {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "manual mode needs an interactive terminal on stdin",
        ))
    }
}

/// Reads keys on a blocking thread and pushes movements into `movements`.
/// Quit keys cancel `shutdown`, since raw mode swallows the usual SIGINT.
pub fn spawn(
    movements: mpsc::Sender<Movement>,
    shutdown: CancellationToken,
) -> JoinHandle<io::Result<()>> {
    tokio::task::spawn_blocking(move || {
        enable_raw_mode()?;
        let result = pump(&movements, &shutdown);
        disable_raw_mode()?;
        result
    })
}

fn pump(movements: &mpsc::Sender<Movement>, shutdown: &CancellationToken) -> io::Result<()> {
    while !shutdown.is_cancelled() {
        if !event::poll(POLL_INTERVAL)? {
            continue;
        }

        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        match key_action(&key) {
            Some(KeyAction::Move(movement)) => {
                debug!(%movement, "key pressed");
                if movements.blocking_send(movement).is_err() {
                    break;
                }
            }
            Some(KeyAction::Quit) => {
                info!("quit requested from keyboard");
                shutdown.cancel();
                break;
            }
            None => {}
        }
    }

    Ok(())
}
