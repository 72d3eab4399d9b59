//! Device-credential prompt seam.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::UnlockPolicy;

/// Asks the user to prove presence with the credential a policy requires.
///
/// - `Ok(())`: the user authenticated
/// - `UserCanceledInteraction`: the prompt was dismissed
/// - `AuthFailed`: the credential was rejected
/// - `InvalidatedCredential`: enrollment changed since the key was created
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, policy: &UnlockPolicy) -> Result<()>;
}

/// Approves every prompt. For platforms without a credential to check.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoApprove;

#[async_trait]
impl Authenticator for AutoApprove {
    async fn authenticate(&self, _policy: &UnlockPolicy) -> Result<()> {
        Ok(())
    }
}
