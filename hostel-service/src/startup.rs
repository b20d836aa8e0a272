use crate::config::{HostelConfig, StoreBackend};
use crate::handlers::{
    self, complaints, hostels, managers, payments, reports, rewards, rooms, students,
};
use crate::services::{BillingService, HostelStore, InvoiceScheduler, MemoryStore, MongoStore};
use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};
use secrecy::ExposeSecret;
use service_core::error::AppError;
use service_core::middleware::{make_request_span, metrics_middleware, request_id_middleware};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub config: HostelConfig,
    pub store: Arc<dyn HostelStore>,
    pub billing: BillingService,
}

pub fn build_router(state: AppState) -> Router {
    let hostel_routes = Router::new()
        .route(
            "/hostels",
            get(hostels::list_hostels).post(hostels::create_hostel),
        )
        .route(
            "/hostels/:hostel_id",
            get(hostels::get_hostel)
                .patch(hostels::update_hostel)
                .delete(hostels::deactivate_hostel),
        )
        .route(
            "/hostels/:hostel_id/rooms",
            get(rooms::list_rooms).post(rooms::create_room),
        )
        .route(
            "/hostels/:hostel_id/rooms/:room_id",
            get(rooms::get_room)
                .patch(rooms::update_room)
                .delete(rooms::delete_room),
        )
        .route(
            "/hostels/:hostel_id/students",
            get(students::list_students).post(students::create_student),
        )
        .route(
            "/hostels/:hostel_id/students/:student_id",
            get(students::get_student).patch(students::update_student),
        )
        .route(
            "/hostels/:hostel_id/students/:student_id/assign-room",
            post(students::assign_room),
        )
        .route(
            "/hostels/:hostel_id/students/:student_id/leave",
            post(students::leave_hostel),
        )
        .route(
            "/hostels/:hostel_id/managers",
            get(managers::list_managers).post(managers::create_manager),
        )
        .route(
            "/hostels/:hostel_id/managers/:user_id",
            axum::routing::delete(managers::deactivate_manager),
        )
        .route(
            "/hostels/:hostel_id/payments",
            get(payments::list_payments).post(payments::create_payment),
        )
        .route(
            "/hostels/:hostel_id/payments/generate",
            post(payments::generate_for_hostel),
        )
        .route(
            "/hostels/:hostel_id/payments/:payment_id",
            get(payments::get_payment),
        )
        .route(
            "/hostels/:hostel_id/payments/:payment_id/proof",
            post(payments::submit_proof),
        )
        .route(
            "/hostels/:hostel_id/payments/:payment_id/verify",
            post(payments::verify_payment),
        )
        .route(
            "/hostels/:hostel_id/payments/:payment_id/reject",
            post(payments::reject_payment),
        )
        .route(
            "/hostels/:hostel_id/payments/:payment_id/refund",
            post(payments::refund_payment),
        )
        .route(
            "/hostels/:hostel_id/complaints",
            get(complaints::list_complaints).post(complaints::create_complaint),
        )
        .route(
            "/hostels/:hostel_id/complaints/:complaint_id",
            patch(complaints::update_complaint),
        )
        .route(
            "/hostels/:hostel_id/rewards",
            get(rewards::list_rewards).post(rewards::create_reward),
        )
        .route(
            "/hostels/:hostel_id/reports/summary",
            get(reports::hostel_report),
        )
        .route("/payments/generate", post(payments::generate_all))
        .route("/admin/billing/overview", get(reports::admin_overview));

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics_handler))
        .nest("/api/v1", hostel_routes)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}

pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
    state: AppState,
    scheduler_token: CancellationToken,
}

impl Application {
    pub async fn build(config: HostelConfig) -> Result<Self, AppError> {
        let store: Arc<dyn HostelStore> = match config.store {
            StoreBackend::Mongo => {
                let db = MongoStore::connect(
                    config.mongodb.uri.expose_secret(),
                    &config.mongodb.database,
                )
                .await?;
                db.initialize_indexes().await.map_err(|e| {
                    tracing::error!("Failed to initialize database indexes: {}", e);
                    e
                })?;
                Arc::new(db)
            }
            StoreBackend::Memory => {
                tracing::warn!("Using in-memory store; data is lost on restart");
                Arc::new(MemoryStore::new())
            }
        };

        let billing = BillingService::new(store.clone(), config.billing.clone());

        let scheduler = InvoiceScheduler::new(store.clone(), billing.clone());
        let scheduler_token = scheduler.shutdown_token();
        scheduler.start();

        let state = AppState {
            config: config.clone(),
            store,
            billing,
        };
        let router = build_router(state.clone());

        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Listening on {}", port);

        Ok(Self {
            port,
            listener,
            router,
            state,
            scheduler_token,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn store(&self) -> Arc<dyn HostelStore> {
        self.state.store.clone()
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.run_with_shutdown(shutdown_signal()).await
    }

    pub async fn run_with_shutdown<F>(self, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let token = self.scheduler_token;
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(async move {
                shutdown.await;
                token.cancel();
            })
            .await
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
