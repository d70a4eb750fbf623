//! # Payment records
//!
//! The persisted shape of a payment. These types never leave the process
//! directly; `mappers` translates them to and from the wire types in `shared`.
//!
//! `PaymentAttributes` is stored as a single JSON document, so its serde field
//! names are the storage field names.

use serde::{Deserialize, Serialize};

use crate::id::PaymentId;

/// A stored payment.
#[derive(Debug, Clone, PartialEq)]
pub struct Payment {
    pub id: PaymentId,
    pub organisation_id: String,
    /// Starts at 0 and is bumped by exactly 1 on every update.
    pub version: u64,
    pub attributes: PaymentAttributes,
}

/// Listing projection of a payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentSummary {
    pub id: PaymentId,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaymentParty {
    pub account_name: String,
    pub account_number: String,
    pub account_number_code: String,
    pub account_type: i64,
    pub address: String,
    pub bank_id: String,
    pub bank_id_code: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SenderCharge {
    pub amount: String,
    pub currency: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChargesInformation {
    pub bearer_code: String,
    pub receiver_charges_amount: String,
    pub receiver_charges_currency: String,
    pub sender_charges: Vec<SenderCharge>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fx {
    pub contract_reference: String,
    pub exchange_rate: String,
    pub original_amount: String,
    pub original_currency: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SponsorParty {
    pub account_number: String,
    pub bank_id: String,
    pub bank_id_code: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaymentAttributes {
    pub amount: String,
    pub beneficiary_party: PaymentParty,
    pub charges_information: ChargesInformation,
    pub currency: String,
    pub debtor_party: PaymentParty,
    pub end_to_end_reference: String,
    pub fx: Fx,
    pub numeric_reference: String,
    pub payment_id: String,
    pub payment_purpose: String,
    pub payment_scheme: String,
    pub payment_type: String,
    pub processing_date: String,
    pub reference: String,
    pub scheme_payment_sub_type: String,
    pub scheme_payment_type: String,
    pub sponsor_party: SponsorParty,
}
