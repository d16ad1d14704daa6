use super::state::AppState;
use super::{admin, public};
use crate::cv::{Education, Experience, Project, SkillCategory};
use axum::Router;
use axum::http::{HeaderValue, Method, header};
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::warn;

fn cors_layer(origin: Option<&str>) -> CorsLayer {
    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::OPTIONS,
    ];
    match origin.map(HeaderValue::from_str) {
        Some(Ok(origin)) => CorsLayer::new()
            .allow_origin(origin)
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_methods(methods),
        Some(Err(err)) => {
            warn!(error = %err, "ignoring invalid CORS origin, allowing any");
            CorsLayer::new()
                .allow_origin(Any)
                .allow_headers(Any)
                .allow_methods(methods)
        }
        None => CorsLayer::new()
            .allow_origin(Any)
            .allow_headers(Any)
            .allow_methods(methods),
    }
}

fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(admin::login))
        .route("/logout", post(admin::logout))
        .route("/dashboard", get(admin::dashboard))
        .route("/profile", get(admin::get_profile).put(admin::put_profile))
        .route("/theme", get(admin::get_theme).put(admin::put_theme))
        .route("/themes", get(admin::list_themes))
        .route("/contacts", get(admin::contacts))
        .route("/uploads", post(admin::upload))
        .nest("/experiences", admin::collection_routes::<Experience>())
        .nest("/education", admin::collection_routes::<Education>())
        .nest("/skills", admin::collection_routes::<SkillCategory>())
        .nest("/projects", admin::collection_routes::<Project>())
}

pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(state.cors_origin.as_deref());
    let uploads_dir = state.uploads_dir.clone();

    let mut router = Router::new()
        .route("/health", get(public::health))
        .route("/api/cv", get(public::get_cv))
        .route("/api/cv/:lang", get(public::get_cv_lang))
        .route("/api/theme", get(public::get_theme))
        .route("/theme.css", get(public::theme_css))
        .route("/cv/:lang/print", get(public::print_cv))
        .route("/api/stats/view", post(public::record_view))
        .route("/api/contact", post(public::submit_contact))
        .nest("/api/admin", admin_routes());

    if let Some(dir) = uploads_dir {
        router = router.nest_service("/uploads", ServeDir::new(dir));
    }

    router
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
