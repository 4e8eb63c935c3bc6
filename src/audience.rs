use serde::{Deserialize, Serialize};

use crate::Result;

/// Receives audience segments returned by the collection service.
///
/// This is typically an engagement-logging facility that records named events. Closures of the
/// form `Fn(&str, f64)` implement this trait.
pub trait AudienceLogger {
    /// Record a named event with a numeric value.
    fn log_named_event(&self, name: &str, value: f64);
}

pub(crate) struct NoopAudienceLogger;
impl AudienceLogger for NoopAudienceLogger {
    fn log_named_event(&self, _name: &str, _value: f64) {}
}

impl<T: Fn(&str, f64)> AudienceLogger for T {
    fn log_named_event(&self, name: &str, value: f64) {
        self(name, value);
    }
}

/// Value passed to the logger with every forwarded audience.
pub const AUDIENCE_EVENT_VALUE: f64 = 0.0;

/// Audiences the visitor currently qualifies for, as returned by a score update.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct AudienceDecision {
    /// Audiences in the order the service returned them.
    pub audiences: Vec<Audience>,
}

/// A named audience segment.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct Audience {
    /// Segment name, forwarded verbatim to the [`AudienceLogger`].
    pub name: String,
}

/// Parse a score-update response and log every returned audience, in order.
///
/// The whole response is parsed before the logger is called, so a malformed response never
/// produces partial output. An empty `response` is a parse error; callers that want to skip
/// forwarding after a failed request must check for it themselves.
pub fn forward_audiences(response: &str, logger: &(impl AudienceLogger + ?Sized)) -> Result<()> {
    let decision: AudienceDecision = serde_json::from_str(response)?;

    for audience in &decision.audiences {
        log::trace!(target: "enhencer", audience = audience.name.as_str(); "forwarding audience");
        logger.log_named_event(&audience.name, AUDIENCE_EVENT_VALUE);
    }

    Ok(())
}
