//! Integration launchers
//!
//! Builds the payload describing which secrets an external integration should
//! return and where it may call back, encodes it into a deep link, opens the
//! link in the default browser, and waits on the callback server.

use crate::callback::{receive_callback, IntegrationCallback};
use crate::kit::KitConfig;
use anyhow::{Context, Result};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// A secret the integration should obtain and return
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvRequest {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl EnvRequest {
    pub fn secret(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: "secret".to_string(),
        }
    }
}

/// A value we already hold that the integration should install as-is
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvReady {
    pub name: String,
    pub value: String,
}

/// Payload carried to the integration page through the deep link
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationPayload {
    pub env: Vec<EnvRequest>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub env_ready: Option<Vec<EnvReady>>,

    pub callback_urls: Vec<String>,
}

/// Serialize and base64url-encode a payload for the `data` query parameter
pub fn encode_payload(payload: &IntegrationPayload) -> Result<String> {
    let json = serde_json::to_string(payload).context("Failed to serialize integration payload")?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

/// Compose the deployment platform deep link
pub fn deploy_link(base: &str, encoded_data: &str, project_name: &str) -> Result<Url> {
    let mut url = Url::parse(base).with_context(|| format!("Invalid deploy URL: {}", base))?;
    url.query_pairs_mut()
        .append_pair("data", encoded_data)
        .append_pair("name", project_name);
    Ok(url)
}

/// Compose the general secret-import deep link
pub fn import_link(base: &str, encoded_data: &str) -> Result<Url> {
    let mut url =
        Url::parse(base).with_context(|| format!("Invalid secret import URL: {}", base))?;
    url.query_pairs_mut().append_pair("data", encoded_data);
    Ok(url)
}

/// Run the deployment platform flow.
///
/// Requests the kit's secret key, ships the generated session secret along so
/// the platform can configure it, and may receive back a descriptor of a
/// newly created private repository.
pub async fn deploy_integration<C: KitConfig>(
    config: &C,
    project_name: &str,
    session_secret: &str,
    wait: Option<Duration>,
) -> Result<IntegrationCallback> {
    let base = config.deploy_base_url();
    let secret_key = config.secret_env_key();
    let session_key = config.session_secret_key();
    let session_secret = session_secret.to_string();
    let project_name = project_name.to_string();

    let callback = receive_callback(
        move |origin| async move {
            let payload = IntegrationPayload {
                env: vec![EnvRequest::secret(secret_key)],
                env_ready: Some(vec![EnvReady {
                    name: session_key.to_string(),
                    value: session_secret,
                }]),
                callback_urls: vec![origin],
            };
            let url = deploy_link(base, &encode_payload(&payload)?, &project_name)?;
            open::that(url.as_str()).context("Failed to open the browser")?;
            Ok(())
        },
        wait,
    )
    .await?;

    Ok(callback)
}

/// Run the general secret-import flow: the integration page returns the kit's
/// secret key through the callback.
pub async fn secret_import_integration<C: KitConfig>(
    config: &C,
    wait: Option<Duration>,
) -> Result<IntegrationCallback> {
    let base = config.secret_import_base_url();
    let secret_key = config.secret_env_key();

    let callback = receive_callback(
        move |origin| async move {
            let payload = IntegrationPayload {
                env: vec![EnvRequest::secret(secret_key)],
                env_ready: None,
                callback_urls: vec![origin],
            };
            let url = import_link(base, &encode_payload(&payload)?)?;
            open::that(url.as_str()).context("Failed to open the browser")?;
            Ok(())
        },
        wait,
    )
    .await?;

    Ok(callback)
}
