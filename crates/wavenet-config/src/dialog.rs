/// How a modal dialog was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogOutcome {
    Accepted,
    Cancelled,
}

/// Runs a dialog modally: shows it, lets the user edit it, and reports how it
/// was closed. The dialog is passed mutably so the host can drive it.
pub trait ModalHost<D> {
    fn exec(&mut self, dialog: &mut D) -> DialogOutcome;
}

impl<D, F> ModalHost<D> for F
where
    F: FnMut(&mut D) -> DialogOutcome,
{
    fn exec(&mut self, dialog: &mut D) -> DialogOutcome {
        self(dialog)
    }
}
