use super::signature::{verify_signature, SIGNATURE_HEADER};
use actix_web::http::header::{HeaderMap, AUTHORIZATION};
use class_reminders_infra::{TriggerAuthConfig, TriggerAuthStrategy};
use tracing::warn;

/// The parts of an inbound dispatch request that authenticators look at
pub struct TriggerRequest<'a> {
    pub headers: &'a HeaderMap,
    pub body: &'a [u8],
}

impl<'a> TriggerRequest<'a> {
    fn header(&self, name: &str) -> Option<&'a str> {
        self.headers.get(name).and_then(|val| val.to_str().ok())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AuthDecision {
    /// Accepted, with the name of the strategy that accepted it
    Accepted(&'static str),
    Rejected(String),
    /// The request carries no credentials this authenticator understands
    NotApplicable,
}

/// Decides whether a dispatch request comes from the scheduler
pub trait TriggerAuthenticator: Send + Sync {
    fn authenticate(&self, req: &TriggerRequest) -> AuthDecision;
}

/// `Authorization: Bearer <secret>`
pub struct SharedSecretAuthenticator {
    secret: String,
}

impl SharedSecretAuthenticator {
    pub fn new(secret: String) -> Self {
        Self { secret }
    }
}

impl TriggerAuthenticator for SharedSecretAuthenticator {
    fn authenticate(&self, req: &TriggerRequest) -> AuthDecision {
        let header = match req.header(AUTHORIZATION.as_str()) {
            Some(h) => h,
            None => return AuthDecision::NotApplicable,
        };
        match header.strip_prefix("Bearer ") {
            Some(token) if constant_time_eq(token.trim().as_bytes(), self.secret.as_bytes()) => {
                AuthDecision::Accepted("shared_secret")
            }
            _ => AuthDecision::Rejected("Invalid bearer secret".into()),
        }
    }
}

/// A header that the scheduler sets to a known sentinel value
pub struct SchedulerHeaderAuthenticator {
    name: String,
    value: String,
}

impl SchedulerHeaderAuthenticator {
    pub fn new(name: String, value: String) -> Self {
        Self { name, value }
    }
}

impl TriggerAuthenticator for SchedulerHeaderAuthenticator {
    fn authenticate(&self, req: &TriggerRequest) -> AuthDecision {
        match req.header(&self.name) {
            Some(val) if val == self.value => AuthDecision::Accepted("scheduler_header"),
            Some(_) => AuthDecision::Rejected(format!("Unexpected value for {}", self.name)),
            None => AuthDecision::NotApplicable,
        }
    }
}

/// Signed webhook token. An invalid signature is only logged unless
/// `enforce` is set.
pub struct SignedWebhookAuthenticator {
    signing_keys: Vec<String>,
    enforce: bool,
}

impl SignedWebhookAuthenticator {
    pub fn new(signing_keys: Vec<String>, enforce: bool) -> Self {
        Self {
            signing_keys,
            enforce,
        }
    }
}

impl TriggerAuthenticator for SignedWebhookAuthenticator {
    fn authenticate(&self, req: &TriggerRequest) -> AuthDecision {
        let token = match req.header(SIGNATURE_HEADER) {
            Some(token) => token,
            None => return AuthDecision::NotApplicable,
        };
        match verify_signature(token, req.body, &self.signing_keys) {
            Ok(()) => AuthDecision::Accepted("signed_webhook"),
            Err(e) if self.enforce => AuthDecision::Rejected(e.to_string()),
            Err(e) => {
                warn!(
                    "Webhook signature verification failed, accepting the request anyway: {}",
                    e
                );
                AuthDecision::Accepted("signed_webhook_unverified")
            }
        }
    }
}

/// Accepts the request when any inner authenticator accepts it. Without a
/// configured shared secret every request is accepted.
pub struct AnyOfAuthenticator {
    authenticators: Vec<Box<dyn TriggerAuthenticator>>,
    secret_configured: bool,
}

impl AnyOfAuthenticator {
    pub fn from_config(config: &TriggerAuthConfig) -> Self {
        let mut authenticators: Vec<Box<dyn TriggerAuthenticator>> = Vec::new();
        if let Some(secret) = &config.shared_secret {
            authenticators.push(Box::new(SharedSecretAuthenticator::new(secret.clone())));
        }
        if matches!(
            config.strategy,
            TriggerAuthStrategy::Cron | TriggerAuthStrategy::Any
        ) {
            authenticators.push(Box::new(SchedulerHeaderAuthenticator::new(
                config.scheduler_header_name.clone(),
                config.scheduler_header_value.clone(),
            )));
        }
        if matches!(
            config.strategy,
            TriggerAuthStrategy::Webhook | TriggerAuthStrategy::Any
        ) {
            authenticators.push(Box::new(SignedWebhookAuthenticator::new(
                config.webhook_signing_keys.clone(),
                config.enforce_webhook_signature,
            )));
        }

        Self {
            authenticators,
            secret_configured: config.shared_secret.is_some(),
        }
    }
}

impl TriggerAuthenticator for AnyOfAuthenticator {
    fn authenticate(&self, req: &TriggerRequest) -> AuthDecision {
        let mut rejections = Vec::new();
        for authenticator in &self.authenticators {
            match authenticator.authenticate(req) {
                AuthDecision::Accepted(strategy) => return AuthDecision::Accepted(strategy),
                AuthDecision::Rejected(reason) => rejections.push(reason),
                AuthDecision::NotApplicable => {}
            }
        }

        if !self.secret_configured {
            warn!("Accepting reminder trigger without authentication because CRON_SECRET is not configured");
            return AuthDecision::Accepted("insecure_default");
        }

        if rejections.is_empty() {
            AuthDecision::Rejected("Missing credentials".into())
        } else {
            AuthDecision::Rejected(rejections.join(", "))
        }
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::super::signature::tests::sign;
    use super::*;
    use actix_web::http::header::{HeaderName, HeaderValue};

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for (name, value) in pairs {
            headers.insert(
                HeaderName::from_static(*name),
                HeaderValue::from_str(value).unwrap(),
            );
        }
        headers
    }

    fn config(secret: Option<&str>, strategy: TriggerAuthStrategy) -> TriggerAuthConfig {
        TriggerAuthConfig {
            strategy,
            shared_secret: secret.map(String::from),
            webhook_signing_keys: vec!["signing-key".into()],
            ..Default::default()
        }
    }

    fn authenticate(config: &TriggerAuthConfig, headers: &HeaderMap, body: &[u8]) -> AuthDecision {
        AnyOfAuthenticator::from_config(config).authenticate(&TriggerRequest { headers, body })
    }

    #[test]
    fn accepts_matching_bearer_secret() {
        let config = config(Some("s3cret"), TriggerAuthStrategy::Any);
        let h = headers(&[("authorization", "Bearer s3cret")]);
        assert_eq!(
            authenticate(&config, &h, b""),
            AuthDecision::Accepted("shared_secret")
        );
    }

    #[test]
    fn rejects_wrong_or_missing_bearer_secret() {
        let config = config(Some("s3cret"), TriggerAuthStrategy::Any);
        let h = headers(&[("authorization", "Bearer nope")]);
        assert!(matches!(
            authenticate(&config, &h, b""),
            AuthDecision::Rejected(_)
        ));
        assert_eq!(
            authenticate(&config, &HeaderMap::new(), b""),
            AuthDecision::Rejected("Missing credentials".into())
        );
    }

    #[test]
    fn accepts_scheduler_sentinel_header() {
        let config = config(Some("s3cret"), TriggerAuthStrategy::Cron);
        let h = headers(&[("x-scheduler-trigger", "cron")]);
        assert_eq!(
            authenticate(&config, &h, b""),
            AuthDecision::Accepted("scheduler_header")
        );
        let h = headers(&[("x-scheduler-trigger", "manual")]);
        assert!(matches!(
            authenticate(&config, &h, b""),
            AuthDecision::Rejected(_)
        ));
    }

    #[test]
    fn webhook_strategy_ignores_scheduler_header() {
        let config = config(Some("s3cret"), TriggerAuthStrategy::Webhook);
        let h = headers(&[("x-scheduler-trigger", "cron")]);
        assert!(matches!(
            authenticate(&config, &h, b""),
            AuthDecision::Rejected(_)
        ));
    }

    #[test]
    fn accepts_valid_webhook_signature() {
        let config = config(Some("s3cret"), TriggerAuthStrategy::Webhook);
        let body = b"{}";
        let token = sign(body, "signing-key");
        let h = headers(&[("upstash-signature", &token)]);
        assert_eq!(
            authenticate(&config, &h, body),
            AuthDecision::Accepted("signed_webhook")
        );
    }

    #[test]
    fn invalid_signature_is_only_logged_by_default() {
        let config = config(Some("s3cret"), TriggerAuthStrategy::Webhook);
        let h = headers(&[("upstash-signature", "not-a-token")]);
        assert_eq!(
            authenticate(&config, &h, b"{}"),
            AuthDecision::Accepted("signed_webhook_unverified")
        );
    }

    #[test]
    fn invalid_signature_is_rejected_when_enforced() {
        let mut config = config(Some("s3cret"), TriggerAuthStrategy::Webhook);
        config.enforce_webhook_signature = true;
        let h = headers(&[("upstash-signature", "not-a-token")]);
        assert!(matches!(
            authenticate(&config, &h, b"{}"),
            AuthDecision::Rejected(_)
        ));
    }

    #[test]
    fn accepts_everything_without_configured_secret() {
        let config = config(None, TriggerAuthStrategy::Any);
        assert_eq!(
            authenticate(&config, &HeaderMap::new(), b""),
            AuthDecision::Accepted("insecure_default")
        );
        let h = headers(&[("authorization", "Bearer whatever")]);
        assert_eq!(
            authenticate(&config, &h, b""),
            AuthDecision::Accepted("insecure_default")
        );
    }
}
