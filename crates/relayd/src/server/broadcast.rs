//! Broadcast fan-out.
//!
//! Relays one chunk to every registered connection except its origin.
//! Delivery is best effort: a failed send is logged and reported back, and
//! the event loop releases that receiver. The remaining receivers still get
//! the chunk. Shutdown interrupts a fan-out in progress.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::registry::{ConnectionRegistry, SlotId};
use crate::server::connection::{Peer, SendError};

/// Outcome of one fan-out.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Receivers the chunk was fully delivered to.
    pub delivered: usize,

    /// Receivers whose send failed. Their streams may hold a partial chunk.
    pub failed: Vec<SlotId>,
}

/// Sends `chunk` to every active slot except `except`.
///
/// Each send is bounded by `write_timeout`. Stops early, without marking
/// anyone failed, once `cancel_token` fires.
pub async fn broadcast(
    registry: &mut ConnectionRegistry<Peer>,
    chunk: &[u8],
    except: SlotId,
    write_timeout: Duration,
    cancel_token: &CancellationToken,
) -> BroadcastReport {
    let mut report = BroadcastReport::default();

    for (slot, peer) in registry.iter_mut() {
        if slot == except {
            continue;
        }

        match peer.send(chunk, write_timeout, cancel_token).await {
            Ok(()) => report.delivered = report.delivered.saturating_add(1),
            Err(SendError::Cancelled) => {
                debug!(slot = %slot, "Broadcast interrupted by shutdown");
                break;
            }
            Err(e) => {
                debug!(
                    slot = %slot,
                    peer = %peer.addr(),
                    error = %e,
                    "Broadcast send failed, dropping receiver"
                );
                report.failed.push(slot);
            }
        }
    }

    report
}
