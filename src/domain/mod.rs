//! Placeholder domain logic.
//!
//! Simulates a pipeline of unreliable async calls so the scaffold has
//! something end-to-end to exercise: request → domain → response mapping →
//! log sink. Replace with real business logic.

use std::time::Duration;
use tokio::time::sleep;

use crate::helpers::maybe;

/// Errors the demo pipeline can produce.
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("A bit of entropy kicked in.")]
    Entropy,
    #[error("Something terrible has occured.")]
    Terrible,
}

/// Always resolves, after a short simulated round trip.
pub async fn fetch_something() -> String {
    sleep(Duration::from_millis(100)).await;
    "Something.".to_string()
}

/// Resolves 80% of the time, after a longer simulated round trip.
pub async fn fetch_something_unreliably() -> Result<String, DomainError> {
    sleep(Duration::from_millis(200)).await;
    if maybe(80) {
        Ok("Something else.".to_string())
    } else {
        Err(DomainError::Entropy)
    }
}

/// The demo pipeline: two awaited fetches plus a final coin flip.
pub async fn run_pipeline() -> Result<String, DomainError> {
    let something = fetch_something().await;
    let something_else = fetch_something_unreliably().await?;

    if maybe(33) {
        return Err(DomainError::Terrible);
    }

    Ok(something + &something_else)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn fetch_something_resolves() {
        assert_eq!(fetch_something().await, "Something.");
    }

    #[tokio::test(start_paused = true)]
    async fn unreliable_fetch_fails_with_the_entropy_error() {
        // probabilistic by design; accept either outcome but pin the error
        match fetch_something_unreliably().await {
            Ok(value) => assert_eq!(value, "Something else."),
            Err(e) => assert!(matches!(e, DomainError::Entropy)),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn pipeline_concatenates_on_success() {
        // retry until the coin flips land on success
        for _ in 0..200 {
            if let Ok(value) = run_pipeline().await {
                assert_eq!(value, "Something.Something else.");
                return;
            }
        }
        panic!("pipeline never succeeded in 200 attempts");
    }
}
