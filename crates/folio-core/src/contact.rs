// crates/folio-core/src/contact.rs
// Contact form submission: validate, POST JSON with a timeout, map failures

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::ContactConfig;
use crate::error::{ContactError, FetchError};
use crate::host::{Timer, with_timeout};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactMessage {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

impl ContactMessage {
    /// Required fields are name, email and message. Subject may be empty.
    pub fn validate(&self) -> Result<(), ContactError> {
        if self.name.trim().is_empty() {
            return Err(ContactError::Invalid("name"));
        }
        if !looks_like_email(self.email.trim()) {
            return Err(ContactError::Invalid("email"));
        }
        if self.message.trim().is_empty() {
            return Err(ContactError::Invalid("message"));
        }
        Ok(())
    }
}

fn looks_like_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !email.contains(char::is_whitespace)
        && domain
            .split_once('.')
            .is_some_and(|(head, tail)| {
                !head.is_empty() && !tail.is_empty() && !tail.ends_with('.')
            })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactReply {
    pub status: u16,
    pub body: String,
}

/// POSTs a JSON body. Dropping the returned future must abort the request.
#[async_trait(?Send)]
pub trait ContactTransport {
    async fn post_json(&self, path: &str, body: String) -> Result<ContactReply, FetchError>;
}

pub async fn submit_contact<T, C>(
    transport: &T,
    timer: &C,
    config: &ContactConfig,
    message: &ContactMessage,
) -> Result<(), ContactError>
where
    T: ContactTransport + ?Sized,
    C: Timer,
{
    message.validate()?;
    let body = serde_json::to_string(message).map_err(|e| ContactError::Network(e.to_string()))?;

    let reply = with_timeout(timer, config.timeout(), transport.post_json(&config.endpoint, body))
        .await
        .map_err(|_| ContactError::Timeout)?
        .map_err(|e| match e {
            FetchError::Network(reason) => ContactError::Network(reason),
            FetchError::Status(status) => ContactError::Rejected {
                status,
                code: None,
                detail: None,
            },
        })?;

    if (200..300).contains(&reply.status) {
        log::info!("Contact message accepted ({})", reply.status);
        Ok(())
    } else {
        Err(rejection(reply))
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(alias = "error")]
    code: Option<String>,
    message: Option<String>,
}

const MAX_DETAIL_LEN: usize = 200;

/// Server errors may be JSON, plain text, or empty
fn rejection(reply: ContactReply) -> ContactError {
    let status = reply.status;
    if let Ok(body) = serde_json::from_str::<ErrorBody>(&reply.body) {
        return ContactError::Rejected {
            status,
            code: body.code,
            detail: body.message,
        };
    }

    let text = reply.body.trim();
    let detail = (!text.is_empty()).then(|| text.chars().take(MAX_DETAIL_LEN).collect());
    ContactError::Rejected {
        status,
        code: None,
        detail,
    }
}

impl ContactError {
    /// Short status line shown next to the form
    pub fn user_message(&self) -> String {
        match self {
            ContactError::Invalid("name") => "Please enter your name.".into(),
            ContactError::Invalid("email") => "Please enter a valid email address.".into(),
            ContactError::Invalid("message") => "Please write a message.".into(),
            ContactError::Invalid(_) => "Please fill in all required fields.".into(),
            ContactError::Timeout => "The request timed out. Please try again.".into(),
            ContactError::Network(_) => {
                "Could not reach the server. Check your connection and try again.".into()
            }
            ContactError::Rejected {
                status,
                code,
                detail,
            } => match code.as_deref().and_then(known_code_message) {
                Some(message) => message.into(),
                None if *status == 429 => known_code_message("rate_limited")
                    .unwrap_or_default()
                    .into(),
                None => match detail {
                    Some(detail) if !detail.trim().is_empty() => detail.clone(),
                    _ => format!(
                        "Something went wrong (status {}). Please try again later.",
                        status
                    ),
                },
            },
        }
    }
}

fn known_code_message(code: &str) -> Option<&'static str> {
    match code {
        "invalid_email" => Some("Please enter a valid email address."),
        "missing_fields" => Some("Please fill in all required fields."),
        "rate_limited" => Some("Too many messages. Please wait a moment and try again."),
        "message_too_long" => Some("Your message is too long. Please shorten it."),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::future::{self, LocalBoxFuture};
    use std::cell::RefCell;
    use std::time::Duration;

    struct Canned {
        reply: Result<ContactReply, FetchError>,
        sent: RefCell<Vec<(String, String)>>,
    }

    impl Canned {
        fn new(reply: Result<ContactReply, FetchError>) -> Self {
            Self {
                reply,
                sent: RefCell::new(Vec::new()),
            }
        }
    }

    #[async_trait(?Send)]
    impl ContactTransport for Canned {
        async fn post_json(&self, path: &str, body: String) -> Result<ContactReply, FetchError> {
            self.sent.borrow_mut().push((path.to_string(), body));
            self.reply.clone()
        }
    }

    struct Hung;

    #[async_trait(?Send)]
    impl ContactTransport for Hung {
        async fn post_json(&self, _path: &str, _body: String) -> Result<ContactReply, FetchError> {
            future::pending().await
        }
    }

    struct NeverFires;

    impl Timer for NeverFires {
        fn sleep(&self, _duration: Duration) -> LocalBoxFuture<'static, ()> {
            Box::pin(future::pending())
        }
    }

    struct FiresNow;

    impl Timer for FiresNow {
        fn sleep(&self, _duration: Duration) -> LocalBoxFuture<'static, ()> {
            Box::pin(future::ready(()))
        }
    }

    fn message() -> ContactMessage {
        ContactMessage {
            name: "Ada".into(),
            email: "ada@example.com".into(),
            subject: "Hello".into(),
            message: "Let's work together.".into(),
        }
    }

    fn reply(status: u16, body: &str) -> Result<ContactReply, FetchError> {
        Ok(ContactReply {
            status,
            body: body.into(),
        })
    }

    fn submit(transport: &impl ContactTransport, msg: &ContactMessage) -> Result<(), ContactError> {
        futures::executor::block_on(submit_contact(
            transport,
            &NeverFires,
            &ContactConfig::default(),
            msg,
        ))
    }

    #[test]
    fn posts_json_body_to_endpoint() {
        let transport = Canned::new(reply(204, ""));
        submit(&transport, &message()).unwrap();

        let sent = transport.sent.borrow();
        assert_eq!(sent[0].0, "/api/contact");
        let body: serde_json::Value = serde_json::from_str(&sent[0].1).unwrap();
        assert_eq!(body["name"], "Ada");
        assert_eq!(body["email"], "ada@example.com");
        assert_eq!(body["subject"], "Hello");
        assert_eq!(body["message"], "Let's work together.");
    }

    #[test]
    fn invalid_input_never_hits_network() {
        let transport = Canned::new(reply(200, ""));
        let msg = ContactMessage {
            email: "not-an-email".into(),
            ..message()
        };
        assert_eq!(submit(&transport, &msg), Err(ContactError::Invalid("email")));
        assert!(transport.sent.borrow().is_empty());
    }

    #[test]
    fn email_shapes() {
        assert!(looks_like_email("a@b.co"));
        assert!(!looks_like_email("a@b"));
        assert!(!looks_like_email("@b.co"));
        assert!(!looks_like_email("a@@b.co"));
        assert!(!looks_like_email("a b@c.io"));
        assert!(!looks_like_email("a@b."));
    }

    #[test]
    fn timeout_is_distinct() {
        let result = futures::executor::block_on(submit_contact(
            &Hung,
            &FiresNow,
            &ContactConfig::default(),
            &message(),
        ));
        assert_eq!(result, Err(ContactError::Timeout));
        assert_eq!(
            ContactError::Timeout.user_message(),
            "The request timed out. Please try again."
        );
    }

    #[test]
    fn json_error_code_maps_to_message() {
        let transport = Canned::new(reply(400, r#"{"error":"invalid_email","message":"bad"}"#));
        let err = submit(&transport, &message()).unwrap_err();
        assert_eq!(
            err,
            ContactError::Rejected {
                status: 400,
                code: Some("invalid_email".into()),
                detail: Some("bad".into()),
            }
        );
        assert_eq!(err.user_message(), "Please enter a valid email address.");
    }

    #[test]
    fn plain_text_error_is_shown() {
        let transport = Canned::new(reply(500, "  Mailer offline  "));
        let err = submit(&transport, &message()).unwrap_err();
        assert_eq!(err.user_message(), "Mailer offline");
    }

    #[test]
    fn empty_error_body_uses_status() {
        let transport = Canned::new(reply(502, ""));
        let err = submit(&transport, &message()).unwrap_err();
        assert_eq!(
            err.user_message(),
            "Something went wrong (status 502). Please try again later."
        );
    }

    #[test]
    fn too_many_requests_without_code() {
        let transport = Canned::new(reply(429, ""));
        let err = submit(&transport, &message()).unwrap_err();
        assert_eq!(
            err.user_message(),
            "Too many messages. Please wait a moment and try again."
        );
    }

    #[test]
    fn network_failure_message() {
        let transport = Canned::new(Err(FetchError::Network("offline".into())));
        let err = submit(&transport, &message()).unwrap_err();
        assert_eq!(err, ContactError::Network("offline".into()));
        assert!(err.user_message().starts_with("Could not reach the server"));
    }
}
