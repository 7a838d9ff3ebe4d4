//! Serial console transport (tokio-serial)

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt, ReadHalf, WriteHalf};
use tokio_serial::{SerialPortBuilderExt, SerialStream};
use tracing::info;

use super::traits::{ByteSource, LineWriter};

/// Open the console port and split it into source and writer halves
pub fn open(path: &str, baud: u32) -> Result<(SerialByteSource, SerialLineWriter)> {
    let stream = tokio_serial::new(path, baud)
        .open_native_async()
        .with_context(|| format!("failed to open serial port {path}"))?;
    info!(path, baud, "serial console open");

    let (reader, writer) = tokio::io::split(stream);
    Ok((SerialByteSource { reader }, SerialLineWriter { writer }))
}

/// RX half of the console port
pub struct SerialByteSource {
    reader: ReadHalf<SerialStream>,
}

#[async_trait]
impl ByteSource for SerialByteSource {
    async fn read_byte(&mut self, timeout: Duration) -> Result<Option<u8>> {
        match tokio::time::timeout(timeout, self.reader.read_u8()).await {
            Ok(Ok(byte)) => Ok(Some(byte)),
            Ok(Err(e)) => Err(e.into()),
            Err(_) => Ok(None),
        }
    }
}

/// TX half of the console port
pub struct SerialLineWriter {
    writer: WriteHalf<SerialStream>,
}

#[async_trait]
impl LineWriter for SerialLineWriter {
    async fn write_line(&mut self, line: &str) -> Result<()> {
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.write_all(b"\r\n").await?;
        self.writer.flush().await?;
        Ok(())
    }
}
