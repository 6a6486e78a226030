mod signature;
mod trigger;

pub use trigger::{
    AnyOfAuthenticator, AuthDecision, SchedulerHeaderAuthenticator, SharedSecretAuthenticator,
    SignedWebhookAuthenticator, TriggerAuthenticator, TriggerRequest,
};

use crate::error::ApiError;

/// Aborts the request unless the trigger is accepted by `authenticator`
pub fn protect_trigger_route(
    authenticator: &dyn TriggerAuthenticator,
    req: &TriggerRequest,
) -> Result<&'static str, ApiError> {
    match authenticator.authenticate(req) {
        AuthDecision::Accepted(strategy) => Ok(strategy),
        AuthDecision::Rejected(reason) => Err(ApiError::Unauthorized(reason)),
        AuthDecision::NotApplicable => Err(ApiError::Unauthorized("Missing credentials".into())),
    }
}
