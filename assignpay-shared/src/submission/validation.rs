/// Submit-time validation of a draft
///
/// Presence checks, plus a range check on the fee. A value counts as filled
/// when it is not the empty string; there are no format, Luhn or expiry-date
/// checks.

use serde::Serialize;

use super::draft::{PaymentDetails, SubmissionDraft};
use crate::models::payment::is_storable_amount;

/// Which rule a draft broke
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationRule {
    RequiredFields,

    /// Fee not positive, finer than a cent, or too large to store
    Amount,

    CreditCardDetails,
    PaypalEmail,
    BankTransferDetails,
}

impl ValidationRule {
    pub fn message(&self) -> &'static str {
        match self {
            ValidationRule::RequiredFields => "Please fill in all required fields",
            ValidationRule::Amount => "Please enter a valid payment amount",
            ValidationRule::CreditCardDetails => "Please fill in all credit card details",
            ValidationRule::PaypalEmail => "Please enter your PayPal email",
            ValidationRule::BankTransferDetails => "Please fill in all bank transfer details",
        }
    }
}

/// A rejected draft and the fields that were missing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{}", .rule.message())]
pub struct ValidationFailure {
    pub rule: ValidationRule,
    pub missing: Vec<&'static str>,
}

impl ValidationFailure {
    pub fn message(&self) -> &'static str {
        self.rule.message()
    }
}

fn missing<'a>(fields: &[(&'static str, &'a str)]) -> Vec<&'static str> {
    fields
        .iter()
        .filter(|(_, value)| value.is_empty())
        .map(|(field, _)| *field)
        .collect()
}

fn check(rule: ValidationRule, fields: Vec<&'static str>) -> Result<(), ValidationFailure> {
    if fields.is_empty() {
        Ok(())
    } else {
        Err(ValidationFailure {
            rule,
            missing: fields,
        })
    }
}

/// Validates a draft, reporting the first rule it breaks
///
/// The always-required fields are checked first, then the amount, then the
/// selected method's credentials. The payment method itself is always present: the draft
/// cannot be built without one.
pub fn validate(draft: &SubmissionDraft) -> Result<(), ValidationFailure> {
    let mut required = missing(&[("name", draft.name.as_str()), ("title", draft.title.as_str())]);
    if draft.file.is_none() {
        required.push("file");
    }
    check(ValidationRule::RequiredFields, required)?;

    if !is_storable_amount(draft.amount) {
        check(ValidationRule::Amount, vec!["amount"])?;
    }

    match &draft.payment {
        PaymentDetails::CreditCard {
            card_number,
            expiry,
            cvc,
        } => check(
            ValidationRule::CreditCardDetails,
            missing(&[
                ("card_number", card_number.as_str()),
                ("expiry", expiry.as_str()),
                ("cvc", cvc.as_str()),
            ]),
        ),
        PaymentDetails::Paypal { email } => {
            check(ValidationRule::PaypalEmail, missing(&[("email", email.as_str())]))
        }
        PaymentDetails::BankTransfer {
            bank_name,
            account_number,
            routing_number,
        } => check(
            ValidationRule::BankTransferDetails,
            missing(&[
                ("bank_name", bank_name.as_str()),
                ("account_number", account_number.as_str()),
                ("routing_number", routing_number.as_str()),
            ]),
        ),
    }
}
