//! HTTP client for the external RBAC service
//!
//! Lookups are blocking I/O from the caller's point of view and bounded by
//! the configured timeout. A timeout or transport failure must surface as a
//! distinct service-unavailable error; it is never downgraded to an empty or
//! unfiltered result.

use crate::config::RbacConfig;
use crate::error::{ApprovalError, Result};
use async_trait::async_trait;
use reqwest::Client;

use super::types::{Access, AccessPage};

/// Access lookups against the RBAC service
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RbacClient: Send + Sync {
    /// Fetch all ACL entries granted to a principal for this application
    async fn get_principal_access(&self, username: &str) -> Result<Vec<Access>>;
}

/// reqwest-backed RBAC client
#[derive(Clone)]
pub struct HttpRbacClient {
    config: RbacConfig,
    http_client: Client,
}

impl HttpRbacClient {
    const PAGE_LIMIT: u64 = 100;

    pub fn new(config: RbacConfig) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ApprovalError::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    async fn fetch_page(&self, username: &str, offset: u64) -> Result<AccessPage> {
        let url = format!("{}/access/", self.config.url);
        let limit = Self::PAGE_LIMIT.to_string();
        let offset = offset.to_string();

        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("application", self.config.app_name.as_str()),
                ("username", username),
                ("limit", limit.as_str()),
                ("offset", offset.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ApprovalError::TimedOut(format!("RBAC access lookup for {}", username))
                } else {
                    ApprovalError::Network(format!("RBAC access lookup failed: {}", e))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ApprovalError::Rbac(format!(
                "access lookup returned {}: {}",
                status, body
            )));
        }

        response
            .json::<AccessPage>()
            .await
            .map_err(|e| ApprovalError::Rbac(format!("malformed access response: {}", e)))
    }
}

#[async_trait]
impl RbacClient for HttpRbacClient {
    async fn get_principal_access(&self, username: &str) -> Result<Vec<Access>> {
        let mut acls = Vec::new();
        let mut offset = 0;

        loop {
            let page = self.fetch_page(username, offset).await?;
            let has_more = page.has_more();
            acls.extend(page.data);
            if !has_more {
                break;
            }
            offset += Self::PAGE_LIMIT;
        }

        tracing::debug!(username, count = acls.len(), "fetched principal access");
        Ok(acls)
    }
}
