use std::time::Duration;

use chrono::Utc;
use plotmap_shared::error::ApiError;
use plotmap_shared::geojson::ValidationOptions;
use plotmap_shared::loader::{resolve_plot_response, Environment, PlotLoad};
use plotmap_shared::models::{OrderData, PlotOrder};
use plotmap_shared::retry::RetryPolicy;
use serde::de::DeserializeOwned;

use crate::config::AppConfig;

pub fn plots_url(base: &str) -> String {
    format!("{}/api/plots", base)
}

pub fn order_url(base: &str, plot_id: &str) -> String {
    format!("{}/api/plots/{}/order", base, plot_id)
}

fn sleep(d: Duration) -> gloo_timers::future::TimeoutFuture {
    gloo_timers::future::sleep(d)
}

/// Map a transport failure to the error taxonomy. Anything that is not a
/// decode problem means no usable response arrived.
fn transport_error(e: reqwest::Error) -> ApiError {
    if e.is_decode() {
        ApiError::Malformed(e.to_string())
    } else {
        ApiError::Network(e.to_string())
    }
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|e| ApiError::Malformed(e.to_string()))
}

/// HTTP access to the plot registry with the configured timeout and retry
/// policy applied to every call.
#[derive(Debug, Clone)]
pub struct RegistryClient {
    base: String,
    retry: RetryPolicy,
    http: reqwest::Client,
}

impl RegistryClient {
    pub fn new(config: &AppConfig) -> Self {
        RegistryClient {
            base: config.api_base.clone(),
            retry: config.retry,
            http: reqwest::Client::new(),
        }
    }

    /// Body of a successful response, or the server's error message.
    async fn read(resp: reqwest::Response) -> Result<String, ApiError> {
        let status = resp.status();
        let body = resp.text().await.map_err(transport_error)?;
        if status.is_success() {
            Ok(body)
        } else {
            Err(ApiError::from_status(status.as_u16(), &body))
        }
    }

    async fn get_text(&self, url: &str) -> Result<String, ApiError> {
        let resp = self.http.get(url).send().await.map_err(transport_error)?;
        Self::read(resp).await
    }

    /// Fetch and validate every plot. Falls back to the sample plots when the
    /// registry is unreachable outside production.
    pub async fn get_all_plots(
        &self,
        env: Environment,
        opts: &ValidationOptions,
    ) -> Result<PlotLoad, ApiError> {
        let url = plots_url(&self.base);
        tracing::debug!(%url, "fetching plots");
        let fetched = self.retry.execute(|| self.get_text(&url), sleep).await;
        let load = resolve_plot_response(fetched, env, opts, Utc::now())?;
        if load.rejected > 0 {
            tracing::warn!(rejected = load.rejected, "some plot features were dropped");
        }
        Ok(load)
    }

    pub async fn create_order(&self, plot_id: &str, order: &OrderData) -> Result<PlotOrder, ApiError> {
        let url = order_url(&self.base, plot_id);
        let body = self
            .retry
            .execute(
                || {
                    let request = self.http.post(&url).json(order);
                    async move {
                        let resp = request.send().await.map_err(transport_error)?;
                        Self::read(resp).await
                    }
                },
                sleep,
            )
            .await?;
        decode(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plotmap_shared::models::{IntendedUse, OrderStatus};

    #[test]
    fn test_urls() {
        let base = "http://localhost:8000";
        assert_eq!(plots_url(base), "http://localhost:8000/api/plots");
        assert_eq!(order_url(base, "1"), "http://localhost:8000/api/plots/1/order");
    }

    #[test]
    fn test_order_payload_serializes() {
        let order = OrderData {
            customer_name: "Amina Juma".to_string(),
            customer_phone: "+255712345678".to_string(),
            customer_email: None,
            customer_id_number: "19900101-12345".to_string(),
            intended_use: IntendedUse::Residential,
            notes: Some("Near the road".to_string()),
        };
        let json = serde_json::to_value(&order).unwrap();
        assert_eq!(json["customer_phone"], "+255712345678");
        assert_eq!(json["intended_use"], "residential");
        assert_eq!(json["notes"], "Near the road");
        assert!(json.get("customer_email").is_none());
    }

    #[test]
    fn test_created_order_decodes() {
        let body = r#"{
            "id": "5b7c7f0e-2f38-4f2b-9a57-0c7c3c1d1a11",
            "plot_id": "1",
            "plot_code": "MBY-001",
            "customer_name": "Amina Juma",
            "customer_phone": "+255712345678",
            "customer_email": null,
            "customer_id_number": "19900101-12345",
            "intended_use": "commercial",
            "notes": null,
            "status": "pending",
            "admin_notes": null,
            "created_at": "2024-05-01T09:30:00Z",
            "updated_at": "2024-05-01T09:30:00Z"
        }"#;
        let order: PlotOrder = decode(body).unwrap();
        assert_eq!(order.plot_id, "1");
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.intended_use, IntendedUse::Commercial);
    }

    #[test]
    fn test_unexpected_body_is_malformed() {
        let err = decode::<PlotOrder>("<html></html>").unwrap_err();
        assert!(matches!(err, ApiError::Malformed(_)));
    }
}
