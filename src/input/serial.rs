use std::{
    io::{self, Read},
    time::Duration,
};

use serialport::SerialPort;
use tracing::{info, warn};

use crate::{
    config::SerialConfig,
    input::{InputSource, SourceKind},
    state::board::PlayerId,
};

/// Buzzer box attached over a serial line, sending one ASCII digit per press.
///
/// The device may come and go; [`InputSource::keep_alive`] reopens it when needed.
pub struct SerialSource {
    path: String,
    baud: u32,
    port: Option<Box<dyn SerialPort>>,
    open_failure_logged: bool,
}

impl SerialSource {
    /// Source for the configured device. Opening is attempted right away but a missing
    /// device is not an error.
    pub fn new(config: &SerialConfig) -> Self {
        let mut source = Self {
            path: config.port.clone(),
            baud: config.baud,
            port: None,
            open_failure_logged: false,
        };
        source.reconnect();
        source
    }

    /// Whether the device is currently open.
    pub fn is_connected(&self) -> bool {
        self.port.is_some()
    }

    fn reconnect(&mut self) {
        match serialport::new(&self.path, self.baud)
            .timeout(Duration::ZERO)
            .open()
        {
            Ok(port) => {
                info!(path = %self.path, baud = self.baud, "buzzer device connected");
                self.port = Some(port);
                self.open_failure_logged = false;
            }
            Err(err) => {
                if !self.open_failure_logged {
                    warn!(path = %self.path, error = %err, "buzzer device unavailable");
                    self.open_failure_logged = true;
                }
            }
        }
    }

    fn disconnect(&mut self, err: io::Error) {
        warn!(path = %self.path, error = %err, "buzzer device lost");
        self.port = None;
    }
}

impl InputSource for SerialSource {
    fn read(&mut self) -> Option<PlayerId> {
        let port = self.port.as_mut()?;
        let mut byte = [0u8; 1];
        match port.read(&mut byte) {
            Ok(1) => parse_button(byte[0]),
            Ok(_) => None,
            Err(err) if is_idle(&err) => None,
            Err(err) => {
                self.disconnect(err);
                None
            }
        }
    }

    fn keep_alive(&mut self) {
        if self.port.is_none() {
            self.reconnect();
        }
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Device
    }
}

fn is_idle(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
    )
}

/// Player for a byte received from the device; anything but `'1'..='4'` is noise.
pub fn parse_button(byte: u8) -> Option<PlayerId> {
    PlayerId::from_button(byte)
}
