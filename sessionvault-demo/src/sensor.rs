//! Simulated biometric sensor.
//!
//! Each prompt consumes the armed outcome and the sensor falls back to a
//! matching fingerprint afterwards.

use std::str::FromStr;

use async_trait::async_trait;
use sessionvault_platform::{Authenticator, UnlockPolicy, VaultError, VaultErrorCode};
use tokio::sync::Mutex;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SensorOutcome {
    #[default]
    Match,
    Mismatch,
    Cancel,
    /// Enrollment changed since the vault key was created.
    Altered,
}

impl FromStr for SensorOutcome {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ok" => Ok(Self::Match),
            "fail" => Ok(Self::Mismatch),
            "cancel" => Ok(Self::Cancel),
            "alter" => Ok(Self::Altered),
            other => anyhow::bail!("unknown sensor outcome '{}' (ok|fail|cancel|alter)", other),
        }
    }
}

#[derive(Default)]
pub struct SimulatedSensor {
    next: Mutex<SensorOutcome>,
}

impl SimulatedSensor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Outcome of the next prompt.
    pub async fn arm(&self, outcome: SensorOutcome) {
        *self.next.lock().await = outcome;
    }
}

#[async_trait]
impl Authenticator for SimulatedSensor {
    async fn authenticate(&self, policy: &UnlockPolicy) -> Result<(), VaultError> {
        let outcome = std::mem::take(&mut *self.next.lock().await);
        info!("Prompting for {} ({:?})", policy.security_kind(), outcome);

        match outcome {
            SensorOutcome::Match => Ok(()),
            SensorOutcome::Mismatch => Err(VaultError::new(
                VaultErrorCode::AuthFailed,
                "Fingerprint not recognized",
            )),
            SensorOutcome::Cancel => Err(VaultError::cancelled()),
            SensorOutcome::Altered => Err(VaultError::invalidated()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_outcomes() {
        assert_eq!("ok".parse::<SensorOutcome>().unwrap(), SensorOutcome::Match);
        assert_eq!("alter".parse::<SensorOutcome>().unwrap(), SensorOutcome::Altered);
        assert!("maybe".parse::<SensorOutcome>().is_err());
    }

    #[tokio::test]
    async fn test_armed_outcome_is_used_once() {
        let sensor = SimulatedSensor::new();
        sensor.arm(SensorOutcome::Cancel).await;

        let err = sensor
            .authenticate(&UnlockPolicy::BIOMETRIC)
            .await
            .unwrap_err();
        assert_eq!(err.code, VaultErrorCode::UserCanceledInteraction);
        assert!(sensor.authenticate(&UnlockPolicy::BIOMETRIC).await.is_ok());
    }
}
