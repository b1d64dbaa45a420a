//! Shared services handed to every handler

use std::sync::Arc;

use tracing::error;

use crate::gateway::MessagingGateway;
use crate::localization::t_lang;
use crate::photo_store::PhotoStore;
use crate::repository::Repository;

/// Handler dependencies, built once in `main`
pub struct AppContext {
    pub repo: Arc<dyn Repository>,
    pub gateway: Arc<dyn MessagingGateway>,
    pub photos: PhotoStore,
    pub developer_contact: String,
}

impl AppContext {
    pub fn new(
        repo: Arc<dyn Repository>,
        gateway: Arc<dyn MessagingGateway>,
        photos: PhotoStore,
        developer_contact: impl Into<String>,
    ) -> Self {
        Self {
            repo,
            gateway,
            photos,
            developer_contact: developer_contact.into(),
        }
    }

    /// Tell the user something went wrong; the error itself was logged by the caller
    pub async fn report_failure(&self, chat_id: i64, language_code: Option<&str>) {
        if let Err(e) = self
            .gateway
            .send_text(chat_id, &t_lang("error-generic", language_code), None)
            .await
        {
            error!(chat_id, error = %e, "Failed to deliver error notice");
        }
    }
}
