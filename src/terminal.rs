//! Terminal rendering
//!
//! Translates logical UI events into ANSI escape sequences on the session's
//! connection. Layout is two regions: a status line pinned to the top of the
//! screen and a live `> ` input line at the cursor.
//!
//! Every write goes through one async mutex, so the outbound relay and the
//! input loop can render concurrently without interleaving sequences.

use std::io;

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

const SAVE_CURSOR: &str = "\x1b7\x1b[s";
const RESTORE_CURSOR: &str = "\x1b[u\x1b8";
const CURSOR_HOME: &str = "\x1b[H";
const CLEAR_LINE: &str = "\x1b[2K";
const CLEAR_TO_EOL: &str = "\x1b[K";
const INSERT_LINE: &str = "\x1b[1L";
const CLEAR_SCREEN: &str = "\x1b[2J";

/// Prompt shown in front of the input line
pub const PROMPT: &str = "> ";

struct Screen<W> {
    writer: W,
    /// Whether the top line has been reserved for the status header
    status_reserved: bool,
}

impl<W: AsyncWrite + Unpin> Screen<W> {
    async fn write(&mut self, s: &str) -> io::Result<()> {
        self.writer.write_all(s.as_bytes()).await?;
        self.writer.flush().await
    }
}

/// Escape-sequence renderer over a serialized writer
pub struct TerminalUi<W> {
    screen: Mutex<Screen<W>>,
}

impl<W: AsyncWrite + Unpin> TerminalUi<W> {
    pub fn new(writer: W) -> Self {
        Self {
            screen: Mutex::new(Screen {
                writer,
                status_reserved: false,
            }),
        }
    }

    /// Clear the screen and home the cursor
    pub async fn clear_screen(&self) -> io::Result<()> {
        let mut screen = self.screen.lock().await;
        screen.write(&format!("{}{}", CLEAR_SCREEN, CURSOR_HOME)).await
    }

    /// Print a full line above the prompt
    pub async fn display_message(&self, msg: &str) -> io::Result<()> {
        self.write_line(msg).await
    }

    /// Acknowledge a control key such as `^C`
    pub async fn display_control_ack(&self, label: &str) -> io::Result<()> {
        self.write_line(label).await
    }

    /// Rewrite the status header and the input line
    ///
    /// The first call reserves the top line of the scroll region for the
    /// header; later calls only rewrite it.
    pub async fn update_prompt(&self, header: &str, line: &str) -> io::Result<()> {
        let mut screen = self.screen.lock().await;

        if !screen.status_reserved {
            screen
                .write(&format!(
                    "{}{}{}{}",
                    SAVE_CURSOR, CURSOR_HOME, INSERT_LINE, RESTORE_CURSOR
                ))
                .await?;
            screen.status_reserved = true;
        }

        screen
            .write(&format!(
                "{}{}{}{}{}",
                SAVE_CURSOR, CURSOR_HOME, CLEAR_LINE, header, RESTORE_CURSOR
            ))
            .await?;
        screen
            .write(&format!("\r{}{}{}", PROMPT, line, CLEAR_TO_EOL))
            .await
    }

    /// Shut down the underlying writer
    pub async fn shutdown(&self) -> io::Result<()> {
        self.screen.lock().await.writer.shutdown().await
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.screen.into_inner().writer
    }

    async fn write_line(&self, text: &str) -> io::Result<()> {
        let mut screen = self.screen.lock().await;
        screen
            .write(&format!("\r{}{}\r\n", CLEAR_TO_EOL, text))
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn output(ui: TerminalUi<Vec<u8>>) -> String {
        String::from_utf8(ui.into_inner()).unwrap()
    }

    #[tokio::test]
    async fn test_clear_screen() {
        let ui = TerminalUi::new(Vec::new());
        ui.clear_screen().await.unwrap();
        assert_eq!(output(ui), "\x1b[2J\x1b[H");
    }

    #[tokio::test]
    async fn test_display_message_writes_full_line() {
        let ui = TerminalUi::new(Vec::new());
        ui.display_message("hello").await.unwrap();
        ui.display_control_ack("^C").await.unwrap();
        assert_eq!(output(ui), "\r\x1b[Khello\r\n\r\x1b[K^C\r\n");
    }

    #[tokio::test]
    async fn test_update_prompt_reserves_status_line_once() {
        let ui = TerminalUi::new(Vec::new());
        ui.update_prompt("Users online: 1", "").await.unwrap();
        ui.update_prompt("Users online: 2", "hi").await.unwrap();

        let out = output(ui);
        assert_eq!(out.matches(INSERT_LINE).count(), 1);
        assert!(out.contains("\x1b[2KUsers online: 1"));
        assert!(out.contains("\x1b[2KUsers online: 2"));
        assert!(out.ends_with("\r> hi\x1b[K"));
    }

    #[tokio::test]
    async fn test_concurrent_prompts_reserve_once() {
        let ui = Arc::new(TerminalUi::new(Vec::new()));
        let tasks: Vec<_> = (0..8)
            .map(|i| {
                let ui = Arc::clone(&ui);
                tokio::spawn(async move { ui.update_prompt("status", &i.to_string()).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let ui = Arc::try_unwrap(ui).ok().unwrap();
        assert_eq!(output(ui).matches(INSERT_LINE).count(), 1);
    }
}
