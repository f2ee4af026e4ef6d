use async_trait::async_trait;

pub const DELETE_PROMPT: &str = "Are you sure you want to delete this record?";

/// Asks the user to approve a destructive action.
#[async_trait]
pub trait Confirm: Send + Sync {
    async fn confirm(&self, prompt: &str) -> bool;
}

/// Answers every prompt the same way, for scripted sessions and tests.
pub struct AutoConfirm(pub bool);

#[async_trait]
impl Confirm for AutoConfirm {
    async fn confirm(&self, _prompt: &str) -> bool {
        self.0
    }
}
