/// Register.
pub mod register;

/// Network Action.
#[must_use = "actions do nothing unless you `execute` them"]
pub trait NetworkAction {
    /// The type of the execution report of the action.
    type Report;

    /// Execute.
    fn execute(self) -> crate::Result<Self::Report>;
}
