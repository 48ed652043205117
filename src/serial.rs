// ABOUTME: Serial channel profile and opener for the modem line, built on tokio-serial
// ABOUTME: Fixes the line settings (460800 baud, odd parity, one stop bit) and leaves only the port configurable

use crate::client::traits::ChannelOpener;
use std::io;
use std::time::Duration;
use tokio_serial::{DataBits, FlowControl, Parity, SerialPortBuilderExt, SerialStream, StopBits};
use tracing::info;

/// Serial line settings for the modem.
///
/// Everything except `port_name` is fixed by [`SerialProfile::new`]; the
/// fields stay public for inspection and logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialProfile {
    pub port_name: String,
    pub baud_rate: u32,
    pub data_bits: DataBits,
    pub parity: Parity,
    pub stop_bits: StopBits,
    pub flow_control: FlowControl,
    /// Bound on a single read while polling for a response
    pub read_timeout: Duration,
}

impl SerialProfile {
    pub const BAUD_RATE: u32 = 460_800;
    pub const READ_TIMEOUT: Duration = Duration::from_millis(500);

    /// Profile for `port_name` with the fixed modem line settings
    pub fn new(port_name: impl Into<String>) -> Self {
        Self {
            port_name: port_name.into(),
            baud_rate: Self::BAUD_RATE,
            data_bits: DataBits::Eight,
            parity: Parity::Odd,
            stop_bits: StopBits::One,
            flow_control: FlowControl::None,
            read_timeout: Self::READ_TIMEOUT,
        }
    }

    /// Conventional first serial port name on this platform
    pub fn default_port() -> &'static str {
        if cfg!(windows) { "COM1" } else { "/dev/ttyUSB0" }
    }
}

impl Default for SerialProfile {
    fn default() -> Self {
        Self::new(Self::default_port())
    }
}

impl ChannelOpener for SerialProfile {
    type Channel = SerialStream;

    async fn open(&self) -> io::Result<SerialStream> {
        let stream = tokio_serial::new(&self.port_name, self.baud_rate)
            .data_bits(self.data_bits)
            .parity(self.parity)
            .stop_bits(self.stop_bits)
            .flow_control(self.flow_control)
            .timeout(self.read_timeout)
            .open_native_async()
            .map_err(|e| {
                let kind = match e.kind {
                    tokio_serial::ErrorKind::Io(kind) => kind,
                    tokio_serial::ErrorKind::NoDevice => io::ErrorKind::NotFound,
                    _ => io::ErrorKind::Other,
                };
                io::Error::new(kind, format!("{}: {e}", self.port_name))
            })?;

        info!(port = %self.port_name, baud = self.baud_rate, "Serial port opened");
        Ok(stream)
    }

    fn read_timeout(&self) -> Duration {
        self.read_timeout
    }
}
