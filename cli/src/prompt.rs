use anyhow::Result;
use engine::ConfirmationSource;
use inquire::{Confirm, InquireError};

/// Asks the operator on the terminal. Anything but an explicit yes declines.
pub struct ConsoleConfirm;

impl ConfirmationSource for ConsoleConfirm {
    fn confirm(&mut self, prompt: &str) -> Result<bool> {
        let answer = Confirm::new(prompt)
            .with_default(false)
            .with_help_message("y/n, Esc declines")
            .prompt();
        interpret(answer)
    }
}

/// Esc declines; Ctrl-C and terminal failures abort the run.
fn interpret(answer: Result<bool, InquireError>) -> Result<bool> {
    match answer {
        Ok(yes) => Ok(yes),
        Err(InquireError::OperationCanceled) => Ok(false),
        Err(e) => Err(e.into()),
    }
}
