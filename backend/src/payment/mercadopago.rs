use crate::payment::{CheckoutRequest, PaymentError, PaymentGateway, PaymentInfo};
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::{json, Value};

const API_BASE: &str = "https://api.mercadopago.com";

/// Mercado Pago REST client (Checkout Pro preferences and payment lookups).
pub struct MercadoPagoGateway {
    access_token: Option<String>,
    public_url: String,
    api_base: String,
    client: reqwest::Client,
}

impl MercadoPagoGateway {
    pub fn new(access_token: Option<String>, public_url: impl Into<String>) -> Self {
        MercadoPagoGateway {
            access_token,
            public_url: public_url.into().trim_end_matches('/').to_string(),
            api_base: API_BASE.to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn headers(&self) -> Result<HeaderMap, PaymentError> {
        let token = self
            .access_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or(PaymentError::NotConfigured)?;
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| PaymentError::NotConfigured)?,
        );
        Ok(headers)
    }

    async fn send_json(&self, request: reqwest::RequestBuilder) -> Result<Value, PaymentError> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PaymentError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json::<Value>().await?)
    }

    async fn fetch(&self, payment_id: &str) -> Result<PaymentInfo, PaymentError> {
        let url = format!("{}/v1/payments/{}", self.api_base, payment_id);
        debug!("Fetching payment {}", payment_id);
        let body = self
            .send_json(self.client.get(url).headers(self.headers()?))
            .await?;
        parse_payment(&body)
    }

    async fn checkout(&self, request: &CheckoutRequest) -> Result<String, PaymentError> {
        let url = format!("{}/checkout/preferences", self.api_base);
        let body = preference_body(request, &self.public_url);
        let created = self
            .send_json(self.client.post(url).headers(self.headers()?).json(&body))
            .await?;
        created
            .get("init_point")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| PaymentError::InvalidResponse("preference has no init_point".into()))
    }
}

impl PaymentGateway for MercadoPagoGateway {
    fn fetch_payment<'a>(
        &'a self,
        payment_id: &'a str,
    ) -> BoxFuture<'a, Result<PaymentInfo, PaymentError>> {
        self.fetch(payment_id).boxed()
    }

    fn create_checkout<'a>(
        &'a self,
        request: &'a CheckoutRequest,
    ) -> BoxFuture<'a, Result<String, PaymentError>> {
        self.checkout(request).boxed()
    }
}

/// Preference payload: one BRL item, the document id as external reference,
/// and back URLs into the download/preview pages.
pub(crate) fn preference_body(request: &CheckoutRequest, public_url: &str) -> Value {
    let id = &request.document_id;
    json!({
        "items": [{
            "id": id,
            "title": request.title,
            "quantity": 1,
            "unit_price": request.unit_price,
            "currency_id": "BRL",
        }],
        "back_urls": {
            "success": format!("{}/download/{}?status=success", public_url, id),
            "failure": format!("{}/preview/{}?status=failure", public_url, id),
            "pending": format!("{}/preview/{}?status=pending", public_url, id),
        },
        "auto_return": "approved",
        "external_reference": id,
    })
}

/// Payment ids arrive as JSON numbers; references as strings.
fn parse_payment(body: &Value) -> Result<PaymentInfo, PaymentError> {
    let id = match body.get("id") {
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) => s.clone(),
        _ => return Err(PaymentError::InvalidResponse("payment has no id".into())),
    };
    let status = body
        .get("status")
        .and_then(Value::as_str)
        .ok_or_else(|| PaymentError::InvalidResponse("payment has no status".into()))?
        .to_string();
    let external_reference = body
        .get("external_reference")
        .and_then(Value::as_str)
        .filter(|r| !r.is_empty())
        .map(str::to_string);
    Ok(PaymentInfo {
        id,
        status,
        external_reference,
    })
}
