use axum::{
    middleware,
    routing::{any, get, post, put},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::{
    metrics_handler, metrics_middleware, optional_user_auth, rate_limit_middleware,
    require_active, require_admin, require_staff, require_user_auth, trace_id, RateLimiterState,
};
use crate::routes::{
    appointments, core_returns, estimates, functions, health, inventory, invoices, me, part_sales,
    profiles, route_access, security_alerts, session, vehicles, work_orders,
};
use crate::services::{AuthAdminClient, AuthAdminError, EmailService, ProfileRoles, RoleDirectory};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub rate_limiter: Option<Arc<RateLimiterState>>,
    pub email: EmailService,
    pub auth_admin: AuthAdminClient,
    pub roles: Arc<dyn RoleDirectory>,
}

impl AppState {
    pub fn new(config: Config, pool: PgPool) -> Result<Self, AuthAdminError> {
        let auth_admin = AuthAdminClient::new(&config.backend)?;
        let email = EmailService::new(config.email.clone());
        // Disabled when rate_limit_per_minute is 0
        let rate_limiter = RateLimiterState::new(config.security.rate_limit_per_minute).map(Arc::new);

        Ok(Self {
            roles: Arc::new(ProfileRoles::new(pool.clone())),
            pool,
            config: Arc::new(config),
            rate_limiter,
            email,
            auth_admin,
        })
    }

    /// Replaces where stored roles are read from.
    pub fn with_role_directory(mut self, roles: Arc<dyn RoleDirectory>) -> Self {
        self.roles = roles;
        self
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        // Development: any origin
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

pub fn build_router(state: AppState) -> Router {
    let config = state.config.clone();

    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler))
        .route("/api/v1/route-access", get(route_access::route_access));

    // Any signed-in account, inactive ones included
    let session_routes = Router::new()
        .route("/api/v1/session", get(session::get_session))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_user_auth));

    // Active accounts of any role. Handlers scope rows to the owner for
    // customers and check staff-only operations themselves.
    let active_routes = Router::new()
        .route("/api/v1/me", get(me::get_me).patch(me::update_me))
        .route("/api/v1/me/vehicles", get(me::my_vehicles))
        .route("/api/v1/me/appointments", get(me::my_appointments))
        .route("/api/v1/me/invoices", get(me::my_invoices))
        .route("/api/v1/me/estimates", get(me::my_estimates))
        .route(
            "/api/v1/vehicles",
            get(vehicles::list_vehicles).post(vehicles::create_vehicle),
        )
        .route("/api/v1/vehicles/search", get(vehicles::search_vehicles))
        .route(
            "/api/v1/vehicles/:id",
            get(vehicles::get_vehicle)
                .patch(vehicles::update_vehicle)
                .delete(vehicles::delete_vehicle),
        )
        .route(
            "/api/v1/work-orders",
            get(work_orders::list_work_orders).post(work_orders::create_work_order),
        )
        .route(
            "/api/v1/work-orders/:id",
            get(work_orders::get_work_order).patch(work_orders::update_work_order),
        )
        .route(
            "/api/v1/work-orders/:id/status",
            post(work_orders::update_work_order_status),
        )
        .route(
            "/api/v1/estimates",
            get(estimates::list_estimates).post(estimates::create_estimate),
        )
        .route(
            "/api/v1/estimates/:id",
            get(estimates::get_estimate).patch(estimates::update_estimate),
        )
        .route("/api/v1/estimates/:id/send", post(estimates::send_estimate))
        .route("/api/v1/estimates/:id/approve", post(estimates::approve_estimate))
        .route("/api/v1/estimates/:id/decline", post(estimates::decline_estimate))
        .route("/api/v1/invoices", get(invoices::list_invoices))
        .route("/api/v1/invoices/:id", get(invoices::get_invoice))
        .route(
            "/api/v1/invoices/from-estimate/:estimate_id",
            post(invoices::create_from_estimate),
        )
        .route("/api/v1/invoices/:id/payments", post(invoices::record_payment))
        .route("/api/v1/invoices/:id/void", post(invoices::void_invoice))
        .route(
            "/api/v1/appointments",
            get(appointments::list_appointments).post(appointments::create_appointment),
        )
        .route(
            "/api/v1/appointments/availability",
            get(appointments::availability),
        )
        .route(
            "/api/v1/appointments/:id/status",
            post(appointments::update_appointment_status),
        )
        .route_layer(middleware::from_fn(require_active))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_user_auth));

    // Shop-floor routes for admin and staff
    let staff_routes = Router::new()
        .route(
            "/api/v1/inventory",
            get(inventory::list_inventory).post(inventory::create_item),
        )
        .route("/api/v1/inventory/low-stock", get(inventory::low_stock))
        .route("/api/v1/inventory/search", get(inventory::search_inventory))
        .route(
            "/api/v1/inventory/:id",
            get(inventory::get_item)
                .patch(inventory::update_item)
                .delete(inventory::delete_item),
        )
        .route("/api/v1/inventory/:id/adjust", post(inventory::adjust_stock))
        .route("/api/v1/part-sales", post(part_sales::create_part_sale))
        .route("/api/v1/part-sales/:id", get(part_sales::get_part_sale))
        .route("/api/v1/core-refunds/quote", post(core_returns::quote_refund))
        .route(
            "/api/v1/core-returns",
            get(core_returns::list_core_returns).post(core_returns::create_core_return),
        )
        .route_layer(middleware::from_fn(require_staff))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_user_auth));

    let admin_routes = Router::new()
        .route("/api/v1/admin/profiles", get(profiles::list_profiles))
        .route("/api/v1/admin/profiles/search", get(profiles::search_profiles))
        .route(
            "/api/v1/admin/profiles/:id/toggle-active",
            post(profiles::toggle_active),
        )
        .route("/api/v1/admin/profiles/:id/role", put(profiles::set_role))
        .route(
            "/api/v1/admin/security-alerts",
            get(security_alerts::list_alerts),
        )
        .route(
            "/api/v1/admin/security-alerts/:id/resolve",
            post(security_alerts::resolve_alert),
        )
        .route("/api/v1/admin/impersonation", post(session::start_impersonation))
        .route("/api/v1/admin/test-mode", post(session::start_test_mode))
        .route_layer(middleware::from_fn(require_admin))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_user_auth));

    let api = Router::new()
        .merge(public_routes)
        .merge(session_routes)
        .merge(active_routes)
        .merge(staff_routes)
        .merge(admin_routes)
        .layer(cors_layer(&config.security.cors_origins));

    // Functions answer their own preflights with fixed CORS headers, so they
    // sit outside the configured CORS layer. Auth failures are reported by
    // the handler in the function error envelope.
    let function_routes = Router::new()
        .route("/functions/v1/:name", any(functions::invoke_function))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .route_layer(middleware::from_fn_with_state(state.clone(), optional_user_auth))
        .layer(middleware::from_fn(functions::function_cors));

    Router::new()
        .merge(api)
        .merge(function_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .with_state(state)
}
