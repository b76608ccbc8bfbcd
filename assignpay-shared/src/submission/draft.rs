/// The submission draft and its update path
///
/// A [`SubmissionDraft`] holds everything the submission form collects. It is
/// changed only through [`SubmissionDraft::apply`], which consumes the old
/// value and returns the replacement. Payment credentials are a tagged union
/// keyed by method, so only the selected method's fields exist at any time;
/// switching method starts from an empty credential set.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::models::payment::PaymentMethod;

/// File types offered by the submission form's file picker
pub const ACCEPTED_EXTENSIONS: [&str; 4] = ["pdf", "doc", "docx", "txt"];

/// Fee charged when the caller does not supply one
pub fn default_amount() -> Decimal {
    Decimal::new(20, 0)
}

/// Metadata of the file chosen for upload
///
/// Only the metadata is kept; the contents are never read or stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedFile {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

impl SelectedFile {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size: None,
            content_type: None,
        }
    }

    /// Lowercased extension without the dot
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
    }

    /// Whether the file picker would have offered this file
    ///
    /// Informational only; submission does not check it.
    pub fn has_accepted_extension(&self) -> bool {
        self.extension()
            .map(|ext| ACCEPTED_EXTENSIONS.contains(&ext.as_str()))
            .unwrap_or(false)
    }
}

/// Credentials for the selected payment method
///
/// Never persisted. `Debug` masks the secret parts.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum PaymentDetails {
    CreditCard {
        #[serde(default)]
        card_number: String,
        #[serde(default)]
        expiry: String,
        #[serde(default)]
        cvc: String,
    },
    Paypal {
        #[serde(default)]
        email: String,
    },
    BankTransfer {
        #[serde(default)]
        bank_name: String,
        #[serde(default)]
        account_number: String,
        #[serde(default)]
        routing_number: String,
    },
}

impl PaymentDetails {
    /// Empty credential set for a method
    pub fn empty(method: PaymentMethod) -> Self {
        match method {
            PaymentMethod::CreditCard => PaymentDetails::CreditCard {
                card_number: String::new(),
                expiry: String::new(),
                cvc: String::new(),
            },
            PaymentMethod::Paypal => PaymentDetails::Paypal {
                email: String::new(),
            },
            PaymentMethod::BankTransfer => PaymentDetails::BankTransfer {
                bank_name: String::new(),
                account_number: String::new(),
                routing_number: String::new(),
            },
        }
    }

    pub fn method(&self) -> PaymentMethod {
        match self {
            PaymentDetails::CreditCard { .. } => PaymentMethod::CreditCard,
            PaymentDetails::Paypal { .. } => PaymentMethod::Paypal,
            PaymentDetails::BankTransfer { .. } => PaymentMethod::BankTransfer,
        }
    }
}

impl Default for PaymentDetails {
    fn default() -> Self {
        Self::empty(PaymentMethod::default())
    }
}

/// Keeps the last four characters, masks the rest
fn mask_tail(value: &str) -> String {
    let len = value.chars().count();
    if len <= 4 {
        return "*".repeat(len);
    }
    let tail: String = value.chars().skip(len - 4).collect();
    format!("{}{}", "*".repeat(len - 4), tail)
}

impl fmt::Debug for PaymentDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentDetails::CreditCard {
                card_number,
                expiry,
                cvc,
            } => f
                .debug_struct("CreditCard")
                .field("card_number", &mask_tail(card_number))
                .field("expiry", expiry)
                .field("cvc", &"*".repeat(cvc.chars().count()))
                .finish(),
            PaymentDetails::Paypal { email } => {
                f.debug_struct("Paypal").field("email", email).finish()
            }
            PaymentDetails::BankTransfer {
                bank_name,
                account_number,
                routing_number,
            } => f
                .debug_struct("BankTransfer")
                .field("bank_name", bank_name)
                .field("account_number", &mask_tail(account_number))
                .field("routing_number", &mask_tail(routing_number))
                .finish(),
        }
    }
}

/// Everything the submission form collects
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionDraft {
    /// Submitter name, seeded from the session profile
    pub name: String,

    /// Assignment title
    pub title: String,

    pub file: Option<SelectedFile>,

    pub payment: PaymentDetails,

    pub amount: Decimal,
}

impl Default for SubmissionDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            title: String::new(),
            file: None,
            payment: PaymentDetails::default(),
            amount: default_amount(),
        }
    }
}

/// One change to a draft
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftUpdate {
    Name(String),
    Title(String),
    File(Option<SelectedFile>),
    Amount(Decimal),

    /// Selects a method; credentials reset unless it is already selected
    Method(PaymentMethod),

    /// Replaces method and credentials together
    Payment(PaymentDetails),

    CardNumber(String),
    CardExpiry(String),
    CardCvc(String),
    PaypalEmail(String),
    BankName(String),
    AccountNumber(String),
    RoutingNumber(String),
}

impl SubmissionDraft {
    /// Draft with the submitter name pre-filled
    pub fn for_submitter(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn method(&self) -> PaymentMethod {
        self.payment.method()
    }

    /// Returns the draft with `update` applied
    ///
    /// A credential update for a method other than the selected one leaves
    /// the draft unchanged.
    pub fn apply(self, update: DraftUpdate) -> Self {
        let mut next = self;
        match update {
            DraftUpdate::Name(name) => next.name = name,
            DraftUpdate::Title(title) => next.title = title,
            DraftUpdate::File(file) => next.file = file,
            DraftUpdate::Amount(amount) => next.amount = amount,
            DraftUpdate::Method(method) => {
                if next.payment.method() != method {
                    next.payment = PaymentDetails::empty(method);
                }
            }
            DraftUpdate::Payment(details) => next.payment = details,
            credential => apply_credential(&mut next.payment, credential),
        }
        next
    }
}

fn apply_credential(payment: &mut PaymentDetails, update: DraftUpdate) {
    match (payment, update) {
        (PaymentDetails::CreditCard { card_number, .. }, DraftUpdate::CardNumber(v)) => {
            *card_number = v
        }
        (PaymentDetails::CreditCard { expiry, .. }, DraftUpdate::CardExpiry(v)) => *expiry = v,
        (PaymentDetails::CreditCard { cvc, .. }, DraftUpdate::CardCvc(v)) => *cvc = v,
        (PaymentDetails::Paypal { email }, DraftUpdate::PaypalEmail(v)) => *email = v,
        (PaymentDetails::BankTransfer { bank_name, .. }, DraftUpdate::BankName(v)) => {
            *bank_name = v
        }
        (PaymentDetails::BankTransfer { account_number, .. }, DraftUpdate::AccountNumber(v)) => {
            *account_number = v
        }
        (PaymentDetails::BankTransfer { routing_number, .. }, DraftUpdate::RoutingNumber(v)) => {
            *routing_number = v
        }
        (current, _) => {
            tracing::debug!(
                method = %current.method(),
                "Ignoring credential update for unselected payment method"
            );
        }
    }
}
