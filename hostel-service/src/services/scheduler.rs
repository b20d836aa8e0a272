use crate::models::{current_period, HostelFilter};
use crate::services::{BillingService, HostelStore};
use service_core::error::AppError;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Periodically runs the invoice generator for the current month across all
/// active hostels. Hostels already billed for the month are left alone.
pub struct InvoiceScheduler {
    store: Arc<dyn HostelStore>,
    billing: BillingService,
    interval: Duration,
    shutdown_token: CancellationToken,
}

impl InvoiceScheduler {
    pub fn new(store: Arc<dyn HostelStore>, billing: BillingService) -> Self {
        let interval = Duration::from_secs(billing.config().schedule_interval_secs.max(1));
        Self {
            store,
            billing,
            interval,
            shutdown_token: CancellationToken::new(),
        }
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    pub fn start(self) {
        if !self.billing.config().auto_generate {
            tracing::info!("Invoice scheduler disabled by configuration");
            return;
        }

        tracing::info!(
            interval_secs = self.interval.as_secs(),
            "Starting invoice scheduler"
        );

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            loop {
                tokio::select! {
                    _ = self.shutdown_token.cancelled() => {
                        tracing::info!("Invoice scheduler shutting down");
                        break;
                    }
                    _ = ticker.tick() => {
                        if let Err(e) = self.run_once().await {
                            tracing::error!("Scheduled invoice generation failed: {}", e);
                        }
                    }
                }
            }
        });
    }

    async fn run_once(&self) -> Result<(), AppError> {
        let (month, year) = current_period();
        let filter = HostelFilter {
            active_only: true,
            ..Default::default()
        };
        let hostels = self.store.list_hostels(&filter).await?;

        match self.billing.generate_for_hostels(&hostels, month, year).await {
            Ok(summary) => {
                tracing::info!(
                    month,
                    year,
                    created = summary.total_created,
                    already_generated = summary.already_generated.len(),
                    failed = summary.failed.len(),
                    "Scheduled invoice generation finished"
                );
                Ok(())
            }
            Err(AppError::Conflict(_)) => {
                tracing::debug!(month, year, "All hostels already billed");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}
