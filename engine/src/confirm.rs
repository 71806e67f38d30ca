use anyhow::Result;

/// Source of yes/no answers for operations that change CDF state.
pub trait ConfirmationSource {
    fn confirm(&mut self, prompt: &str) -> Result<bool>;
}

/// Batch mode: every operation is approved without asking.
#[derive(Debug, Default, Clone, Copy)]
pub struct AutoApprove;

impl ConfirmationSource for AutoApprove {
    fn confirm(&mut self, _prompt: &str) -> Result<bool> {
        Ok(true)
    }
}
