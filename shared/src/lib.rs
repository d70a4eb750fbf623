//! Wire representations exchanged with API clients.
//!
//! Every type here mirrors the JSON body of a request or response. Identifiers
//! are always carried in their external string form.
//!
//! Attribute types are lenient when deserialized: a field that is missing or
//! holds a value of the wrong shape falls back to its zero value instead of
//! rejecting the whole body. Only a body that is not a JSON object at all is
//! treated as malformed.

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DefaultOnError};

/// Resource kind tag carried in the `type` field of a payment resource.
pub const PAYMENT_RESOURCE_TYPE: &str = "Payment";

/// Links attached to a single resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelfLinks {
    #[serde(rename = "self")]
    pub self_link: String,
}

/// Navigation links for a page of payments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageLinks {
    #[serde(rename = "self")]
    pub self_link: String,
    /// `None` serializes as `null` when there is no further page.
    pub next: Option<String>,
}

/// Entry of a payment listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentSummaryResource {
    pub id: String,
    pub links: SelfLinks,
}

/// Body of `GET /v1/payments/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentsPage {
    pub data: Vec<PaymentSummaryResource>,
    pub links: PageLinks,
}

/// Body of `GET /v1/payments/{id}/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentResource {
    pub id: String,
    pub organisation_id: String,
    pub version: u64,
    #[serde(rename = "type")]
    pub resource_type: String,
    pub attributes: PaymentAttributesResource,
    pub links: SelfLinks,
}

/// Body of `POST /v1/payments/` and `PUT /v1/payments/{id}/`.
///
/// Carries no `version` field: the version is owned by storage.
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaymentRequest {
    #[serde_as(as = "DefaultOnError")]
    pub organisation_id: String,
    #[serde_as(as = "DefaultOnError")]
    pub attributes: PaymentAttributesResource,
}

#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaymentPartyResource {
    #[serde_as(as = "DefaultOnError")]
    pub account_name: String,
    #[serde_as(as = "DefaultOnError")]
    pub account_number: String,
    #[serde_as(as = "DefaultOnError")]
    pub account_number_code: String,
    #[serde_as(as = "DefaultOnError")]
    pub account_type: i64,
    #[serde_as(as = "DefaultOnError")]
    pub address: String,
    #[serde_as(as = "DefaultOnError")]
    pub bank_id: String,
    #[serde_as(as = "DefaultOnError")]
    pub bank_id_code: String,
    #[serde_as(as = "DefaultOnError")]
    pub name: String,
}

#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SenderChargeResource {
    #[serde_as(as = "DefaultOnError")]
    pub amount: String,
    #[serde_as(as = "DefaultOnError")]
    pub currency: String,
}

#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChargesInformationResource {
    #[serde_as(as = "DefaultOnError")]
    pub bearer_code: String,
    #[serde_as(as = "DefaultOnError")]
    pub receiver_charges_amount: String,
    #[serde_as(as = "DefaultOnError")]
    pub receiver_charges_currency: String,
    #[serde_as(as = "DefaultOnError")]
    pub sender_charges: Vec<SenderChargeResource>,
}

#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FxResource {
    #[serde_as(as = "DefaultOnError")]
    pub contract_reference: String,
    #[serde_as(as = "DefaultOnError")]
    pub exchange_rate: String,
    #[serde_as(as = "DefaultOnError")]
    pub original_amount: String,
    #[serde_as(as = "DefaultOnError")]
    pub original_currency: String,
}

#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SponsorPartyResource {
    #[serde_as(as = "DefaultOnError")]
    pub account_number: String,
    #[serde_as(as = "DefaultOnError")]
    pub bank_id: String,
    #[serde_as(as = "DefaultOnError")]
    pub bank_id_code: String,
}

/// Opaque payment attributes. Nothing here is validated.
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaymentAttributesResource {
    #[serde_as(as = "DefaultOnError")]
    pub amount: String,
    #[serde_as(as = "DefaultOnError")]
    pub beneficiary_party: PaymentPartyResource,
    #[serde_as(as = "DefaultOnError")]
    pub charges_information: ChargesInformationResource,
    #[serde_as(as = "DefaultOnError")]
    pub currency: String,
    #[serde_as(as = "DefaultOnError")]
    pub debtor_party: PaymentPartyResource,
    #[serde_as(as = "DefaultOnError")]
    pub end_to_end_reference: String,
    #[serde_as(as = "DefaultOnError")]
    pub fx: FxResource,
    #[serde_as(as = "DefaultOnError")]
    pub numeric_reference: String,
    #[serde_as(as = "DefaultOnError")]
    pub payment_id: String,
    #[serde_as(as = "DefaultOnError")]
    pub payment_purpose: String,
    #[serde_as(as = "DefaultOnError")]
    pub payment_scheme: String,
    #[serde_as(as = "DefaultOnError")]
    pub payment_type: String,
    #[serde_as(as = "DefaultOnError")]
    pub processing_date: String,
    #[serde_as(as = "DefaultOnError")]
    pub reference: String,
    #[serde_as(as = "DefaultOnError")]
    pub scheme_payment_sub_type: String,
    #[serde_as(as = "DefaultOnError")]
    pub scheme_payment_type: String,
    #[serde_as(as = "DefaultOnError")]
    pub sponsor_party: SponsorPartyResource,
}
