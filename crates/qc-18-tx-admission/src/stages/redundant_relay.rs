//! Stage 15: short-circuit relays of packets that were already processed.

use super::{Admission, Flow, Stage};
use crate::domain::context::Context;
use crate::domain::errors::AdmissionError;
use crate::domain::ordering::StageId;
use crate::ports::outbound::RelayRegistry;
use shared_types::Transaction;
use std::sync::Arc;
use tracing::info;

/// Halts with [`Admission::RedundantRelay`] when every packet message in the
/// transaction was already processed.
///
/// Only runs in check and re-check outside simulation. A transaction carrying
/// any message that is neither a packet nor a client update always passes,
/// so bundled work is never dropped.
pub struct RedundantRelayStage {
    registry: Option<Arc<dyn RelayRegistry>>,
}

impl RedundantRelayStage {
    pub fn new(registry: Option<Arc<dyn RelayRegistry>>) -> Self {
        Self { registry }
    }
}

impl Stage for RedundantRelayStage {
    fn id(&self) -> StageId {
        StageId::RedundantRelay
    }

    fn run(
        &self,
        ctx: &mut Context,
        tx: &Transaction,
        simulate: bool,
    ) -> Result<Flow, AdmissionError> {
        if simulate || !ctx.is_check_tx() {
            return Ok(Flow::Continue);
        }
        let Some(registry) = &self.registry else {
            return Ok(Flow::Continue);
        };

        let mut packet_msgs = 0usize;
        let mut redundant = Vec::new();
        for msg in tx.messages() {
            match msg.relay_packet() {
                Some((action, packet)) => {
                    packet_msgs += 1;
                    if registry.is_processed(action, &packet)? {
                        redundant.push(packet);
                    }
                }
                None if msg.is_relay() => {}
                None => return Ok(Flow::Continue),
            }
        }

        if packet_msgs == 0 || redundant.len() != packet_msgs {
            return Ok(Flow::Continue);
        }

        info!(
            packets = redundant.len(),
            "[qc-18] All packet messages are redundant"
        );
        ctx.redundant_relay = Some(redundant.clone());
        Ok(Flow::Halt(Admission::RedundantRelay { packets: redundant }))
    }
}
