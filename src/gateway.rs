//! Uniform, typed access to generative providers.
//!
//! [`complete`] sends one request through an [`AiProvider`], bounded by a
//! timeout, and parses the reply into the caller's [`StructuredResponse`]
//! type. Each request moves from [`RequestState::Pending`] to exactly one
//! terminal state, which is logged. Failures are never retried here.

use std::time::{Duration, Instant};

use blog_augment_core::error::{GenerationError, RequestState};
use blog_augment_core::provider::{AiProvider, CompletionRequest};
use blog_augment_core::structured::{parse_structured, StructuredResponse};

/// Build a request whose response contract is `T`'s shape.
pub fn request_for<T: StructuredResponse>(system: &str, prompt: &str) -> CompletionRequest {
    CompletionRequest {
        system: system.to_string(),
        prompt: prompt.to_string(),
        response_shape: T::shape(),
    }
}

/// Run one structured completion.
///
/// Exceeding `timeout` drops the in-flight call and yields
/// [`GenerationError::Timeout`].
pub async fn complete<T: StructuredResponse>(
    provider: &dyn AiProvider,
    system: &str,
    prompt: &str,
    timeout: Duration,
) -> Result<T, GenerationError> {
    let request = request_for::<T>(system, prompt);
    let started = Instant::now();

    tracing::debug!(
        provider = provider.name(),
        model = provider.model(),
        state = ?RequestState::Pending,
        prompt_chars = request.prompt.chars().count(),
        "generation request"
    );

    let outcome = match tokio::time::timeout(timeout, provider.complete_raw(&request)).await {
        Ok(Ok(raw)) => parse_structured::<T>(provider.name(), &raw),
        Ok(Err(e)) => Err(e),
        Err(_) => Err(GenerationError::Timeout {
            provider: provider.name().to_string(),
            after: timeout,
        }),
    };

    let elapsed_ms = started.elapsed().as_millis() as u64;
    match &outcome {
        Ok(_) => tracing::info!(
            provider = provider.name(),
            state = ?RequestState::Completed,
            elapsed_ms,
            "generation completed"
        ),
        Err(e) => tracing::warn!(
            provider = provider.name(),
            state = ?e.state(),
            elapsed_ms,
            error = %e,
            "generation failed"
        ),
    }

    outcome
}
