//! Periodic refresh of the WeChat platform access token.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{error, info};

use crate::domain::AccessTokenCell;
use crate::domain::ports::{WeChatApi, WeChatApiError};

/// Fetches a fresh credential and publishes it into an [`AccessTokenCell`].
#[derive(Clone)]
pub struct TokenRefresher {
    wechat: Arc<dyn WeChatApi>,
    cell: AccessTokenCell,
}

impl TokenRefresher {
    pub fn new(wechat: Arc<dyn WeChatApi>, cell: AccessTokenCell) -> Self {
        Self { wechat, cell }
    }

    /// Run one refresh cycle. On failure the previously published token
    /// stays in place.
    pub async fn refresh(&self) -> Result<(), WeChatApiError> {
        let token = self.wechat.fetch_access_token().await?;
        info!(expires_at = ?token.expires_at(), "platform access token refreshed");
        self.cell.publish(token);
        Ok(())
    }

    /// Refresh now and then every `period` until the task is aborted.
    ///
    /// Failures are logged and the loop carries on with the next tick.
    pub fn spawn(self, period: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if let Err(err) = self.refresh().await {
                    error!(error = %err, "platform access token refresh failed");
                }
            }
        })
    }
}
