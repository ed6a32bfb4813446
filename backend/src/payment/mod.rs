//! Payment collaborator: checkout preferences and payment lookups.

mod mercadopago;

pub use mercadopago::MercadoPagoGateway;

use futures_util::future::BoxFuture;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("payment provider is not configured")]
    NotConfigured,

    #[error("payment provider request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("payment provider answered {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("unexpected payment provider response: {0}")]
    InvalidResponse(String),
}

/// What the provider reports about one payment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentInfo {
    pub id: String,
    pub status: String,
    /// The document id the checkout was created for.
    pub external_reference: Option<String>,
}

impl PaymentInfo {
    pub fn is_approved(&self) -> bool {
        self.status == "approved"
    }
}

/// One-item checkout for a document.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutRequest {
    pub document_id: String,
    pub title: String,
    /// Unit price in reais.
    pub unit_price: f64,
}

pub trait PaymentGateway: Send + Sync {
    fn fetch_payment<'a>(&'a self, payment_id: &'a str)
        -> BoxFuture<'a, Result<PaymentInfo, PaymentError>>;

    /// Creates a checkout and returns the URL the buyer is redirected to.
    fn create_checkout<'a>(
        &'a self,
        request: &'a CheckoutRequest,
    ) -> BoxFuture<'a, Result<String, PaymentError>>;
}
