use std::{sync::Arc, time::Duration};

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client,
    Method,
};
use serde::de::DeserializeOwned;

use crate::{
    config::PortOneConfig,
    data_objects::{PortOneErrorBody, PortOnePayment},
    PortOneApiError,
};

#[derive(Clone)]
pub struct PortOneApi {
    config: PortOneConfig,
    client: Arc<Client>,
}

impl PortOneApi {
    pub fn new(config: PortOneConfig) -> Result<Self, PortOneApiError> {
        let mut headers = HeaderMap::with_capacity(2);
        let mut auth = HeaderValue::from_str(&format!("PortOne {}", config.api_secret.reveal()))
            .map_err(|e| PortOneApiError::Initialization(e.to_string()))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| PortOneApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub fn config(&self) -> &PortOneConfig {
        &self.config
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.api_url)
    }

    /// Sends a body-less REST request to PortOne and deserializes the response.
    ///
    /// The request is abandoned once `timeout` elapses, in which case [`PortOneApiError::Timeout`] is returned.
    pub async fn rest_query<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        params: &[(&str, &str)],
        timeout: Duration,
    ) -> Result<T, PortOneApiError> {
        let url = self.url(path);
        trace!("💳️ Sending REST query: {method} {url}");
        let mut req = self.client.request(method, url).timeout(timeout);
        if !params.is_empty() {
            req = req.query(params);
        }
        let response = req.send().await.map_err(|e| {
            if e.is_timeout() {
                PortOneApiError::Timeout(timeout.as_millis())
            } else {
                PortOneApiError::RestRequestError(e.to_string())
            }
        })?;
        let status = response.status();
        if status.is_success() {
            trace!("💳️ REST query successful. {status}");
            response.json::<T>().await.map_err(|e| {
                if e.is_timeout() {
                    PortOneApiError::Timeout(timeout.as_millis())
                } else {
                    PortOneApiError::JsonError(e.to_string())
                }
            })
        } else {
            let status = status.as_u16();
            let text = response.text().await.map_err(|e| PortOneApiError::RestResponseError(e.to_string()))?;
            let message = match serde_json::from_str::<PortOneErrorBody>(&text) {
                Ok(body) => format!("{}: {}", body.error_type, body.message.unwrap_or_default()),
                Err(_) => text,
            };
            Err(PortOneApiError::QueryError { status, message })
        }
    }

    /// Fetches the authoritative payment record for `payment_id` from PortOne.
    pub async fn get_payment(&self, payment_id: &str, timeout: Duration) -> Result<PortOnePayment, PortOneApiError> {
        let path = format!("/payments/{}", urlencoding::encode(payment_id));
        debug!("💳️ Fetching payment {payment_id} from PortOne");
        let params: Vec<(&str, &str)> = if self.config.store_id.is_empty() {
            vec![]
        } else {
            vec![("storeId", self.config.store_id.as_str())]
        };
        let payment = self.rest_query::<PortOnePayment>(Method::GET, &path, &params, timeout).await?;
        info!("💳️ Fetched payment {payment_id}. PortOne status: {}", payment.status());
        Ok(payment)
    }
}
