// Hosted payment page: the browser posts a signed form to the provider,
// which later calls back `/payments/notify`

use std::collections::BTreeMap;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::{configuration::PaymentSettings, models::Order};

pub const SIGNATURE_FIELD: &str = "signature";

#[derive(Clone)]
pub struct PaymentGateway {
    pub gateway_url: String,
    merchant_id: String,
    secret: SecretString,
    currency: String,
    return_url: String,
    notify_url: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PaymentForm {
    pub action_url: String,
    pub fields: BTreeMap<String, String>,
}

impl PaymentGateway {
    pub fn new(settings: &PaymentSettings, base_url: &str) -> Self {
        Self {
            gateway_url: settings.gateway_url.clone(),
            merchant_id: settings.merchant_id.clone(),
            secret: settings.secret.clone(),
            currency: settings.currency.clone(),
            return_url: settings.return_url.clone(),
            notify_url: format!("{}/payments/notify", base_url.trim_end_matches('/')),
        }
    }

    // Values joined by `+` in field-name order, then `+secret`, SHA-256.
    // The signature field itself is left out.
    fn digest(&self, fields: &BTreeMap<String, String>) -> Vec<u8> {
        let mut hasher = Sha256::new();

        for (name, value) in fields {
            if name == SIGNATURE_FIELD {
                continue;
            }
            hasher.update(value.as_bytes());
            hasher.update(b"+");
        }
        hasher.update(self.secret.expose_secret().as_bytes());

        hasher.finalize().to_vec()
    }

    pub fn sign(&self, fields: &BTreeMap<String, String>) -> String {
        hex::encode(self.digest(fields))
    }

    pub fn verify(&self, fields: &BTreeMap<String, String>) -> bool {
        let Some(signature) = fields.get(SIGNATURE_FIELD) else {
            return false;
        };
        let Ok(given) = hex::decode(signature) else {
            return false;
        };
        self.digest(fields).as_slice().ct_eq(&given).into()
    }

    #[tracing::instrument("Building hosted payment form", skip_all, fields(reference = %order.reference))]
    pub fn payment_form(&self, order: &Order) -> PaymentForm {
        let mut fields = BTreeMap::new();
        fields.insert("merchant_id".to_string(), self.merchant_id.clone());
        fields.insert("order_ref".to_string(), order.reference.clone());
        fields.insert("amount".to_string(), order.total_cents.to_string());
        fields.insert("currency".to_string(), self.currency.clone());
        fields.insert("customer_email".to_string(), order.customer_email.clone());
        fields.insert("customer_first_name".to_string(), order.customer_first_name.clone());
        fields.insert("customer_last_name".to_string(), order.customer_last_name.clone());
        fields.insert("return_url".to_string(), self.return_url.clone());
        fields.insert("notify_url".to_string(), self.notify_url.clone());

        let signature = self.sign(&fields);
        fields.insert(SIGNATURE_FIELD.to_string(), signature);

        PaymentForm {
            action_url: self.gateway_url.clone(),
            fields,
        }
    }
}
