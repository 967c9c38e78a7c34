//! # Serial Communication Module
//!
//! Handles serial communication with the EnOcean USB transceiver.
//!
//! This module handles:
//! - Opening the serial port at 57,600 baud (ESP3 standard)
//! - Async chunked reads of the raw byte stream
//!
//! Reconnection policy lives with the caller: when a read fails the main
//! loop drops the handle, waits the configured interval and reopens.

use crate::error::{BridgeError, Result};
use tokio::io::AsyncReadExt;
use tokio_serial::SerialPortBuilderExt;
use tracing::{debug, info};

/// ESP3 serial baud rate
pub const ESP3_BAUD_RATE: u32 = 57_600;

/// Read buffer size; serial chunks are small and arbitrarily split
const READ_BUFFER_SIZE: usize = 256;

/// EnOcean transceiver serial port handle
pub struct Esp3Serial {
    /// Serial port handle
    port: tokio_serial::SerialStream,
    /// Device path (e.g., /dev/ttyUSB0)
    device_path: String,
    /// Reusable read buffer
    read_buffer: [u8; READ_BUFFER_SIZE],
}

impl std::fmt::Debug for Esp3Serial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Esp3Serial")
            .field("device_path", &self.device_path)
            .finish_non_exhaustive()
    }
}

impl Esp3Serial {
    /// Open the transceiver port with ESP3 settings (8N1, no flow control)
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Serial`] when the port cannot be opened.
    pub fn open(path: &str, baud_rate: u32) -> Result<Self> {
        debug!("opening serial port {path} at {baud_rate} baud");

        let port = tokio_serial::new(path, baud_rate)
            .data_bits(tokio_serial::DataBits::Eight)
            .parity(tokio_serial::Parity::None)
            .stop_bits(tokio_serial::StopBits::One)
            .flow_control(tokio_serial::FlowControl::None)
            .open_native_async()
            .map_err(|e| BridgeError::Serial(format!("failed to open {path}: {e}")))?;

        info!("opened EnOcean transceiver at {path}");
        Ok(Self {
            port,
            device_path: path.to_string(),
            read_buffer: [0; READ_BUFFER_SIZE],
        })
    }

    /// Read the next chunk of raw stream bytes
    ///
    /// Returns however many bytes the port delivered; there is no
    /// alignment between chunks and ESP3 packets. A zero-length read
    /// means the device went away.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Serial`] on a read failure or when the
    /// port reports end of stream.
    pub async fn read_chunk(&mut self) -> Result<&[u8]> {
        let n = self
            .port
            .read(&mut self.read_buffer)
            .await
            .map_err(|e| BridgeError::Serial(format!("read failed: {e}")))?;

        if n == 0 {
            return Err(BridgeError::Serial(format!(
                "{} closed (end of stream)",
                self.device_path
            )));
        }

        debug!(bytes = n, "serial chunk received");
        Ok(&self.read_buffer[..n])
    }

    /// Device path of the opened port
    pub fn device_path(&self) -> &str {
        &self.device_path
    }
}
