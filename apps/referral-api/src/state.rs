//! Application state for the referral API

use std::path::Path;
use std::sync::Arc;

use referral_core::{AgencyProfile, CcuDirectory, CCU_LOOKUP_FILE};
use referral_mail::{DeliveryService, MailTransport, ResendTransport};
use referral_pdf::TemplateStore;
use tracing::info;

use crate::config::Config;
use crate::lead::LeadForwarder;

/// Read-only after startup
pub struct AppState {
    pub templates: TemplateStore,
    pub ccu: CcuDirectory,
    pub delivery: DeliveryService,
    pub leads: LeadForwarder,
    pub profile: AgencyProfile,
}

impl AppState {
    /// Production state: Resend transport, templates and lookup under `assets_dir`
    pub fn new(config: &Config, assets_dir: &Path) -> Self {
        let transport = ResendTransport::new(config.resend.clone());
        if !transport.is_configured() {
            tracing::warn!("RESEND_API_KEY not set; referral emails will fail");
        }
        Self::with_transport(config, assets_dir, Arc::new(transport))
    }

    pub fn with_transport(config: &Config, assets_dir: &Path, transport: Arc<dyn MailTransport>) -> Self {
        let templates = TemplateStore::with_default_dirs(assets_dir);

        let mut lookup_candidates = Vec::new();
        if let Some(path) = &config.ccu_lookup_path {
            lookup_candidates.push(path.clone());
        }
        lookup_candidates.extend(templates.dirs().iter().map(|dir| dir.join(CCU_LOOKUP_FILE)));
        let ccu = CcuDirectory::load(&lookup_candidates);

        info!(
            zips = ccu.len(),
            recipients = config.recipients.len(),
            assets = %assets_dir.display(),
            "Initialized referral state"
        );

        Self {
            templates,
            ccu,
            delivery: DeliveryService::new(transport, config.recipients.clone(), config.email_from.clone())
                .with_retry_delay(config.retry_delay),
            leads: LeadForwarder::new(config.lead_webhook_url.clone()),
            profile: config.profile.clone(),
        }
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}
