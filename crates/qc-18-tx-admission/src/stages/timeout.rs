//! Stage 6: timeout height.

use super::{Flow, Stage};
use crate::domain::context::Context;
use crate::domain::errors::AdmissionError;
use crate::domain::ordering::StageId;
use shared_types::Transaction;

/// Rejects a transaction whose non-zero timeout height has passed.
#[derive(Debug, Default)]
pub struct TxTimeoutHeightStage;

impl Stage for TxTimeoutHeightStage {
    fn id(&self) -> StageId {
        StageId::TxTimeoutHeight
    }

    fn run(
        &self,
        ctx: &mut Context,
        tx: &Transaction,
        _simulate: bool,
    ) -> Result<Flow, AdmissionError> {
        let timeout = tx.timeout_height();
        if timeout > 0 && ctx.block_height > timeout {
            return Err(AdmissionError::TimeoutExpired {
                timeout,
                height: ctx.block_height,
            });
        }
        Ok(Flow::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::test_helpers::deliver_ctx;

    fn tx_with_timeout(timeout_height: u64) -> Transaction {
        let mut tx = Transaction::default();
        tx.body.timeout_height = timeout_height;
        tx
    }

    #[test]
    fn test_timeout_boundaries() {
        let stage = TxTimeoutHeightStage;
        assert!(stage.run(&mut deliver_ctx(100), &tx_with_timeout(0), false).is_ok());
        assert!(stage.run(&mut deliver_ctx(100), &tx_with_timeout(100), false).is_ok());
        assert_eq!(
            stage.run(&mut deliver_ctx(101), &tx_with_timeout(100), false),
            Err(AdmissionError::TimeoutExpired {
                timeout: 100,
                height: 101
            })
        );
    }
}
