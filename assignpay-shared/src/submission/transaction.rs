/// Locally generated payment references
///
/// Format: `{CC|PP|BT}-{millis}-{n}` where `millis` is the Unix time in
/// milliseconds and `n` is a random number in `0..=999`. The millisecond part
/// is kept strictly increasing within the process, so two references
/// generated here never collide even when issued in the same millisecond.

use chrono::Utc;
use rand::Rng;
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};

use crate::models::payment::PaymentMethod;

static LAST_MILLIS: AtomicI64 = AtomicI64::new(0);

/// Returns `now`, or one past the last value handed out if that is later
fn next_millis(now: i64) -> i64 {
    let previous = LAST_MILLIS
        .fetch_update(Ordering::AcqRel, Ordering::Acquire, |last| {
            Some(now.max(last + 1))
        })
        .unwrap_or(now);
    now.max(previous + 1)
}

/// A payment reference such as `CC-1717243200000-42`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TransactionId(String);

impl TransactionId {
    /// Generates a fresh reference for `method`
    pub fn generate(method: PaymentMethod) -> Self {
        let millis = next_millis(Utc::now().timestamp_millis());
        let suffix: u16 = rand::thread_rng().gen_range(0..=999);
        Self(format!("{}-{}-{}", method.transaction_prefix(), millis, suffix))
    }

    /// Accepts only strings in the generated format
    pub fn parse(value: &str) -> Option<Self> {
        let mut parts = value.split('-');
        let (prefix, millis, suffix) = (parts.next()?, parts.next()?, parts.next()?);
        if parts.next().is_some() {
            return None;
        }

        let known_prefix = PaymentMethod::ALL
            .iter()
            .any(|m| m.transaction_prefix() == prefix);
        let digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
        let canonical = !(suffix.len() > 1 && suffix.starts_with('0'));
        let in_range = suffix.len() <= 3 && digits(suffix) && canonical;

        (known_prefix && digits(millis) && in_range).then(|| Self(value.to_string()))
    }

    /// Method encoded in the prefix
    pub fn method(&self) -> Option<PaymentMethod> {
        let prefix = self.0.split('-').next()?;
        PaymentMethod::ALL
            .into_iter()
            .find(|m| m.transaction_prefix() == prefix)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
