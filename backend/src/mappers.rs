use serde_json::Value;
use shared::{
    ChargesInformationResource, FxResource, PaymentAttributesResource, PaymentPartyResource,
    PaymentRequest, PaymentResource, PaymentSummaryResource, SelfLinks, SenderChargeResource,
    SponsorPartyResource, PAYMENT_RESOURCE_TYPE,
};

use crate::config::Config;
use crate::domain::{
    ChargesInformation, Fx, Payment, PaymentAttributes, PaymentParty, PaymentSummary, SenderCharge,
    SponsorParty,
};
use crate::id::PaymentId;

/// Error returned when a create/update body is not a JSON object.
#[derive(Debug, thiserror::Error)]
pub enum RequestBodyError {
    #[error("request body is not valid JSON: {0}")]
    Syntax(#[from] serde_json::Error),
    #[error("request body must be a JSON object")]
    NotAnObject,
}

pub struct PaymentMapper;

impl PaymentMapper {
    /// `{host}/v1/payments/{id}/`
    pub fn self_link(config: &Config, id: PaymentId) -> String {
        format!("{}/v1/payments/{}/", config.host, id)
    }

    pub fn to_summary_resource(config: &Config, summary: PaymentSummary) -> PaymentSummaryResource {
        PaymentSummaryResource {
            id: summary.id.to_hex(),
            links: SelfLinks {
                self_link: Self::self_link(config, summary.id),
            },
        }
    }

    pub fn to_resource(config: &Config, payment: Payment) -> PaymentResource {
        PaymentResource {
            id: payment.id.to_hex(),
            organisation_id: payment.organisation_id,
            version: payment.version,
            resource_type: PAYMENT_RESOURCE_TYPE.to_string(),
            attributes: Self::attributes_to_dto(payment.attributes),
            links: SelfLinks {
                self_link: Self::self_link(config, payment.id),
            },
        }
    }

    /// Extract `(organisation_id, attributes)` from a create/update body.
    ///
    /// Missing or wrongly typed fields become zero values; only a body that is
    /// not a JSON object is rejected.
    pub fn from_request(body: &[u8]) -> Result<(String, PaymentAttributes), RequestBodyError> {
        let value: Value = serde_json::from_slice(body)?;
        if !value.is_object() {
            return Err(RequestBodyError::NotAnObject);
        }
        let request: PaymentRequest = serde_json::from_value(value)?;
        Ok((
            request.organisation_id,
            Self::attributes_to_domain(request.attributes),
        ))
    }

    pub fn attributes_to_dto(attributes: PaymentAttributes) -> PaymentAttributesResource {
        PaymentAttributesResource {
            amount: attributes.amount,
            beneficiary_party: Self::party_to_dto(attributes.beneficiary_party),
            charges_information: Self::charges_to_dto(attributes.charges_information),
            currency: attributes.currency,
            debtor_party: Self::party_to_dto(attributes.debtor_party),
            end_to_end_reference: attributes.end_to_end_reference,
            fx: FxResource {
                contract_reference: attributes.fx.contract_reference,
                exchange_rate: attributes.fx.exchange_rate,
                original_amount: attributes.fx.original_amount,
                original_currency: attributes.fx.original_currency,
            },
            numeric_reference: attributes.numeric_reference,
            payment_id: attributes.payment_id,
            payment_purpose: attributes.payment_purpose,
            payment_scheme: attributes.payment_scheme,
            payment_type: attributes.payment_type,
            processing_date: attributes.processing_date,
            reference: attributes.reference,
            scheme_payment_sub_type: attributes.scheme_payment_sub_type,
            scheme_payment_type: attributes.scheme_payment_type,
            sponsor_party: SponsorPartyResource {
                account_number: attributes.sponsor_party.account_number,
                bank_id: attributes.sponsor_party.bank_id,
                bank_id_code: attributes.sponsor_party.bank_id_code,
            },
        }
    }

    pub fn attributes_to_domain(dto: PaymentAttributesResource) -> PaymentAttributes {
        PaymentAttributes {
            amount: dto.amount,
            beneficiary_party: Self::party_to_domain(dto.beneficiary_party),
            charges_information: Self::charges_to_domain(dto.charges_information),
            currency: dto.currency,
            debtor_party: Self::party_to_domain(dto.debtor_party),
            end_to_end_reference: dto.end_to_end_reference,
            fx: Fx {
                contract_reference: dto.fx.contract_reference,
                exchange_rate: dto.fx.exchange_rate,
                original_amount: dto.fx.original_amount,
                original_currency: dto.fx.original_currency,
            },
            numeric_reference: dto.numeric_reference,
            payment_id: dto.payment_id,
            payment_purpose: dto.payment_purpose,
            payment_scheme: dto.payment_scheme,
            payment_type: dto.payment_type,
            processing_date: dto.processing_date,
            reference: dto.reference,
            scheme_payment_sub_type: dto.scheme_payment_sub_type,
            scheme_payment_type: dto.scheme_payment_type,
            sponsor_party: SponsorParty {
                account_number: dto.sponsor_party.account_number,
                bank_id: dto.sponsor_party.bank_id,
                bank_id_code: dto.sponsor_party.bank_id_code,
            },
        }
    }

    fn party_to_dto(party: PaymentParty) -> PaymentPartyResource {
        PaymentPartyResource {
            account_name: party.account_name,
            account_number: party.account_number,
            account_number_code: party.account_number_code,
            account_type: party.account_type,
            address: party.address,
            bank_id: party.bank_id,
            bank_id_code: party.bank_id_code,
            name: party.name,
        }
    }

    fn party_to_domain(dto: PaymentPartyResource) -> PaymentParty {
        PaymentParty {
            account_name: dto.account_name,
            account_number: dto.account_number,
            account_number_code: dto.account_number_code,
            account_type: dto.account_type,
            address: dto.address,
            bank_id: dto.bank_id,
            bank_id_code: dto.bank_id_code,
            name: dto.name,
        }
    }

    fn charges_to_dto(info: ChargesInformation) -> ChargesInformationResource {
        ChargesInformationResource {
            bearer_code: info.bearer_code,
            receiver_charges_amount: info.receiver_charges_amount,
            receiver_charges_currency: info.receiver_charges_currency,
            sender_charges: info
                .sender_charges
                .into_iter()
                .map(|charge| SenderChargeResource {
                    amount: charge.amount,
                    currency: charge.currency,
                })
                .collect(),
        }
    }

    fn charges_to_domain(dto: ChargesInformationResource) -> ChargesInformation {
        ChargesInformation {
            bearer_code: dto.bearer_code,
            receiver_charges_amount: dto.receiver_charges_amount,
            receiver_charges_currency: dto.receiver_charges_currency,
            sender_charges: dto
                .sender_charges
                .into_iter()
                .map(|charge| SenderCharge {
                    amount: charge.amount,
                    currency: charge.currency,
                })
                .collect(),
        }
    }
}
