//! Stage 3: per-block transaction counting.

use super::{Flow, Stage};
use crate::domain::context::Context;
use crate::domain::errors::AdmissionError;
use crate::domain::ordering::StageId;
use crate::ports::outbound::TxCountStore;
use shared_types::{Msg, Transaction};
use std::sync::Arc;

/// Counts the transaction in its block and records its index in the context.
///
/// Skipped in simulation.
pub struct CountTxStage {
    store: Arc<dyn TxCountStore>,
}

impl CountTxStage {
    pub fn new(store: Arc<dyn TxCountStore>) -> Self {
        Self { store }
    }
}

impl Stage for CountTxStage {
    fn id(&self) -> StageId {
        StageId::CountTx
    }

    fn run(
        &self,
        ctx: &mut Context,
        tx: &Transaction,
        simulate: bool,
    ) -> Result<Flow, AdmissionError> {
        if simulate {
            return Ok(Flow::Continue);
        }
        let type_urls: Vec<&'static str> = tx.messages().iter().map(Msg::type_url).collect();
        let index = self.store.increment(ctx.block_height, &type_urls)?;
        ctx.tx_counter = Some(index);
        Ok(Flow::Continue)
    }
}
