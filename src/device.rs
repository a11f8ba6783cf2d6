//! Barcode scanner device source
//!
//! Scanners in keyboard-wedge or serial mode present as a character device
//! that emits one line per scan. This module reads that stream; `-` reads
//! from stdin so the tool can be driven by a pipe.

use crate::error::DeviceError;
use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

/// Scanner device node used when no override is configured
pub const DEFAULT_DEVICE: &str = "/dev/ttyACM0";

/// A source of scanned barcodes.
///
/// `Ok(Some(code))` is one scan, `Ok(None)` means the source is exhausted
/// and the session ends cleanly. Any `Err` is fatal for the session.
#[async_trait]
pub trait BarcodeSource {
    async fn next_scan(&mut self) -> Result<Option<String>, DeviceError>;
}

/// Line-oriented scanner device.
pub struct LineDevice {
    reader: BufReader<Box<dyn AsyncRead + Send + Unpin>>,
}

impl LineDevice {
    /// Open the scanner device at `path`. `-` opens stdin instead.
    pub async fn open(path: &str) -> Result<Self, DeviceError> {
        let reader: Box<dyn AsyncRead + Send + Unpin> = if path == "-" {
            Box::new(tokio::io::stdin())
        } else {
            let file = tokio::fs::File::open(path)
                .await
                .map_err(|source| DeviceError::Open {
                    path: path.to_string(),
                    source,
                })?;
            Box::new(file)
        };

        log::info!("Reading scans from {}", path);
        Ok(Self {
            reader: BufReader::new(reader),
        })
    }
}

#[async_trait]
impl BarcodeSource for LineDevice {
    async fn next_scan(&mut self) -> Result<Option<String>, DeviceError> {
        loop {
            let mut line = String::new();
            let bytes = self.reader.read_line(&mut line).await?;
            if bytes == 0 {
                return Ok(None);
            }

            // Strip only the line terminator; the scanned payload itself
            // is passed through untouched
            let code = line.trim_end_matches(['\r', '\n']);
            if code.is_empty() {
                continue;
            }

            return Ok(Some(code.to_string()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    async fn device_over(content: &[u8]) -> (NamedTempFile, LineDevice) {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content).unwrap();
        let device = LineDevice::open(file.path().to_str().unwrap())
            .await
            .unwrap();
        (file, device)
    }

    #[tokio::test]
    async fn reads_one_scan_per_line() {
        let (_file, mut device) = device_over(b"012345678905\n4006381333931\n").await;

        assert_eq!(
            device.next_scan().await.unwrap().as_deref(),
            Some("012345678905")
        );
        assert_eq!(
            device.next_scan().await.unwrap().as_deref(),
            Some("4006381333931")
        );
        assert_eq!(device.next_scan().await.unwrap(), None);
    }

    #[tokio::test]
    async fn strips_crlf_terminators() {
        let (_file, mut device) = device_over(b"012345678905\r\n").await;

        assert_eq!(
            device.next_scan().await.unwrap().as_deref(),
            Some("012345678905")
        );
    }

    #[tokio::test]
    async fn skips_blank_lines() {
        let (_file, mut device) = device_over(b"\n\r\n012345678905\n\n").await;

        assert_eq!(
            device.next_scan().await.unwrap().as_deref(),
            Some("012345678905")
        );
        assert_eq!(device.next_scan().await.unwrap(), None);
    }

    #[tokio::test]
    async fn keeps_payload_bytes_untouched() {
        // No trimming or canonicalization beyond the terminator
        let (_file, mut device) = device_over(b"  ABC-001 x  \n").await;

        assert_eq!(
            device.next_scan().await.unwrap().as_deref(),
            Some("  ABC-001 x  ")
        );
    }

    #[tokio::test]
    async fn reads_final_line_without_terminator() {
        let (_file, mut device) = device_over(b"012345678905").await;

        assert_eq!(
            device.next_scan().await.unwrap().as_deref(),
            Some("012345678905")
        );
        assert_eq!(device.next_scan().await.unwrap(), None);
    }

    #[tokio::test]
    async fn open_missing_device_fails() {
        let result = LineDevice::open("/nonexistent/scanner0").await;
        assert!(matches!(result, Err(DeviceError::Open { .. })));
    }
}
