//! The scan loop
//!
//! Reads scans from a device source one at a time and runs each through
//! the resolver before reading the next. Results go to caller-supplied
//! handlers; the loop itself never prints.
//!
//! A resolution failure is reported and the loop keeps going. Only a
//! device failure ends the session early, surfaced through the return
//! value rather than the error handler.

use crate::device::BarcodeSource;
use crate::error::{DeviceError, ResolveError};
use crate::resolver::{Resolution, Resolver};
use crate::store::ProductStore;
use tokio::sync::watch;

/// Counters for one scanning session.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoopStats {
    pub resolved: usize,
    pub failed: usize,
}

/// Drive the scan loop until the source is exhausted, the device fails,
/// or shutdown is signalled.
///
/// Scans are handled strictly in order: one resolution finishes (and its
/// handler returns) before the next scan is read. Shutdown is checked
/// between scans, never mid-resolution, so a stop request leaves no
/// half-persisted mapping behind.
pub async fn run<D, S, FR, FE>(
    device: &mut D,
    resolver: &Resolver<S>,
    mut on_resolved: FR,
    mut on_error: FE,
    mut shutdown: watch::Receiver<bool>,
) -> Result<LoopStats, DeviceError>
where
    D: BarcodeSource,
    S: ProductStore,
    FR: FnMut(&str, &Resolution),
    FE: FnMut(&str, &ResolveError),
{
    let mut stats = LoopStats::default();

    loop {
        tokio::select! {
            // Check for a pending stop request before reading another scan
            biased;

            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    log::info!("Shutdown requested, stopping scan loop");
                    break;
                }
            }

            scan = device.next_scan() => {
                let Some(barcode) = scan? else {
                    log::info!("Scan source exhausted");
                    break;
                };

                match resolver.resolve(&barcode).await {
                    Ok(resolution) => {
                        stats.resolved += 1;
                        on_resolved(&barcode, &resolution);
                    }
                    Err(err) => {
                        stats.failed += 1;
                        on_error(&barcode, &err);
                    }
                }
            }
        }
    }

    Ok(stats)
}

/// Set the shutdown flag once `signal` completes.
///
/// If the signal source fails to register, the sender is parked instead of
/// dropped; the loop would read a closed channel as a stop request, and a
/// failed Ctrl-C hook must not end the session.
pub async fn shutdown_on_signal<F>(signal: F, shutdown: watch::Sender<bool>)
where
    F: std::future::Future<Output = std::io::Result<()>>,
{
    match signal.await {
        Ok(()) => {
            log::info!("Stop signal received, shutting down");
            let _ = shutdown.send(true);
        }
        Err(err) => {
            log::warn!(
                "Stop signal unavailable, session runs until the device is exhausted: {}",
                err
            );
            std::future::pending::<()>().await;
        }
    }
}
