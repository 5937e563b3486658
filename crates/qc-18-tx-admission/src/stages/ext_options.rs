//! Stage 4: extension options must be understood by the node.

use super::{Flow, Stage};
use crate::domain::context::Context;
use crate::domain::errors::AdmissionError;
use crate::domain::ordering::StageId;
use shared_types::{Any, Transaction};
use std::sync::Arc;

/// Predicate deciding whether an extension option is accepted.
pub type ExtensionOptionChecker = Arc<dyn Fn(&Any) -> bool + Send + Sync>;

/// The default predicate: no extension option is accepted.
pub fn reject_all_extension_options() -> ExtensionOptionChecker {
    Arc::new(|_| false)
}

/// Accept exactly the listed type URLs.
pub fn accept_type_urls(type_urls: Vec<String>) -> ExtensionOptionChecker {
    Arc::new(move |option: &Any| type_urls.iter().any(|url| *url == option.type_url))
}

/// Rejects transactions carrying extension options the checker refuses.
///
/// Non-critical extension options are never checked.
pub struct ExtensionOptionsStage {
    checker: ExtensionOptionChecker,
}

impl ExtensionOptionsStage {
    pub fn new(checker: ExtensionOptionChecker) -> Self {
        Self { checker }
    }
}

impl Stage for ExtensionOptionsStage {
    fn id(&self) -> StageId {
        StageId::ExtensionOptions
    }

    fn run(
        &self,
        _ctx: &mut Context,
        tx: &Transaction,
        _simulate: bool,
    ) -> Result<Flow, AdmissionError> {
        if let Some(rejected) = tx.body.extension_options.iter().find(|o| !(self.checker)(*o)) {
            return Err(AdmissionError::StructuralInvalid(format!(
                "unknown extension option {}",
                rejected.type_url
            )));
        }
        Ok(Flow::Continue)
    }
}
