use reqwest::Client;
use serde::Deserialize;

pub const DEFAULT_IP_LOOKUP_URL: &str = "https://api.ipify.org?format=json";
pub const FALLBACK_IP: &str = "127.0.0.1";

#[derive(Debug, Deserialize)]
struct IpResponse {
    ip: String,
}

/// 查詢一次對外 IP，只用於顯示；不重試
pub async fn lookup_public_ip(client: &Client, url: &str) -> Option<String> {
    let response = match client.get(url).send().await {
        Ok(response) => response,
        Err(e) => {
            tracing::debug!("IP lookup failed: {}", e);
            return None;
        }
    };

    if !response.status().is_success() {
        tracing::debug!("IP lookup returned status {}", response.status());
        return None;
    }

    match response.json::<IpResponse>().await {
        Ok(body) if !body.ip.trim().is_empty() => Some(body.ip),
        Ok(_) => None,
        Err(e) => {
            tracing::debug!("IP lookup response not understood: {}", e);
            None
        }
    }
}

pub fn ip_or_fallback(ip: Option<String>) -> String {
    ip.unwrap_or_else(|| FALLBACK_IP.to_string())
}
