// app.rs - router assembly
//
// Route groups are built per module and merged. Layer order, outermost first:
// panic catcher → trace → CORS → body limit → generic rate limit (/api only)
// → require_auth → require_module / require_master.

use std::any::Any;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, Any as AnyOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

use crate::config::SecurityConfig;
use crate::error::ApiError;
use crate::handlers;
use crate::middleware::{rate_limit_generic, rate_limit_strict, require_auth, require_master, require_module};
use crate::models::admin::ModuleName;
use crate::state::AppState;

pub fn app(state: AppState) -> Router {
    let api = Router::new()
        .merge(public_routes(&state))
        .merge(protected_routes(&state))
        .layer(middleware::from_fn_with_state(state.clone(), rate_limit_generic));

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .merge(api)
        .fallback(handlers::not_found)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(state.config.server.max_request_size_bytes))
        .layer(cors_layer(&state.config.security))
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(handle_panic))
        .with_state(state)
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT]);

    if security.cors_origins.iter().any(|o| o == "*") {
        return base.allow_origin(AnyOrigin);
    }
    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    base.allow_origin(AllowOrigin::list(origins))
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let details = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    tracing::error!(panic = %details, "Handler panicked");
    ApiError::internal_server_error("Internal server error").into_response()
}

/// Login and public-site routes; submissions use the strict tier
fn public_routes(state: &AppState) -> Router<AppState> {
    use axum::routing::post;
    use handlers::public;

    let submissions = Router::new()
        .route("/api/auth/login", post(public::auth_login))
        .route("/api/public/contact", post(public::site_contact))
        .route("/api/public/adhesion", post(public::site_adhesion))
        .route("/api/public/formations/:id/inscriptions", post(public::site_formation_inscription))
        .route("/api/public/webinaires/:id/inscriptions", post(public::site_webinaire_inscription))
        .route("/api/public/projets/:id/inscriptions", post(public::site_projet_inscription))
        .route("/api/public/offres/:id/candidatures", post(public::site_candidature))
        .route_layer(middleware::from_fn_with_state(state.clone(), rate_limit_strict));

    Router::new().route("/api/public/bureau", get(public::site_bureau)).merge(submissions)
}

fn protected_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/api/auth/me", get(handlers::protected::auth::me))
        .merge(master_routes())
        .merge(gated(state, ModuleName::Adhesion, adhesion_routes()))
        .merge(gated(state, ModuleName::Formation, formation_routes()))
        .merge(gated(state, ModuleName::Webinaire, webinaire_routes()))
        .merge(gated(state, ModuleName::Tresorerie, tresorerie_routes()))
        .merge(gated(state, ModuleName::Secretariat, secretariat_routes()))
        .merge(gated(state, ModuleName::Mentorat, mentorat_routes()))
        .merge(gated(state, ModuleName::Recrutement, recrutement_routes()))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
}

fn gated(state: &AppState, module: ModuleName, routes: Router<AppState>) -> Router<AppState> {
    routes.route_layer(middleware::from_fn_with_state((state.clone(), module), require_module))
}

fn master_routes() -> Router<AppState> {
    use axum::routing::{post, put};
    use handlers::protected::{admins, audit};

    Router::new()
        .route("/api/admins", get(admins::list).post(admins::post))
        .route("/api/admins/:id", get(admins::get).put(admins::put).delete(admins::delete))
        .route("/api/admins/:id/suspend", post(admins::suspend))
        .route("/api/admins/:id/reactivate", post(admins::reactivate))
        .route("/api/admins/:id/modules", put(admins::put_modules))
        .route("/api/audit", get(audit::list))
        .route_layer(middleware::from_fn(require_master))
}

fn adhesion_routes() -> Router<AppState> {
    use axum::routing::post;
    use handlers::protected::adhesion as h;

    Router::new()
        .route("/api/adhesion/membres", get(h::membre_list))
        .route("/api/adhesion/membres/carte", get(h::membre_carte))
        .route("/api/adhesion/membres/:id", get(h::membre_get).put(h::membre_put).delete(h::membre_delete))
        .route("/api/adhesion/membres/:id/approve", post(h::membre_approve))
        .route("/api/adhesion/membres/:id/reject", post(h::membre_reject))
        .route("/api/adhesion/stats", get(h::stats))
        .route("/api/adhesion/bureau", get(h::bureau_list).post(h::bureau_post))
        .route("/api/adhesion/bureau/:id", get(h::bureau_get).put(h::bureau_put).delete(h::bureau_delete))
}

fn formation_routes() -> Router<AppState> {
    use axum::routing::{delete, post, put};
    use handlers::protected::formation as h;

    Router::new()
        .route("/api/formation/formations", get(h::list).post(h::post))
        .route("/api/formation/formations/:id", get(h::get).put(h::put).delete(h::delete))
        .route("/api/formation/formations/:id/sessions", get(h::session_list).post(h::session_post))
        .route("/api/formation/formations/:id/sessions/:session_id", put(h::session_put).delete(h::session_delete))
        .route("/api/formation/formations/:id/inscriptions", post(h::inscription_post))
        .route("/api/formation/inscriptions", get(h::inscription_list))
        .route("/api/formation/inscriptions/:id", delete(h::inscription_delete))
        .route("/api/formation/inscriptions/:id/statut", put(h::inscription_statut))
        .route("/api/formation/stats", get(h::stats))
}

fn webinaire_routes() -> Router<AppState> {
    use axum::routing::{delete, put};
    use handlers::protected::webinaire as h;

    Router::new()
        .route("/api/webinaire/webinaires", get(h::list).post(h::post))
        .route("/api/webinaire/webinaires/:id", get(h::get).put(h::put).delete(h::delete))
        .route("/api/webinaire/webinaires/:id/stats", get(h::webinaire_stats))
        .route("/api/webinaire/webinaires/:id/inscriptions", get(h::inscription_list).post(h::inscription_post))
        .route("/api/webinaire/webinaires/:id/inscriptions/:inscription_id", delete(h::inscription_delete))
        .route("/api/webinaire/webinaires/:id/inscriptions/:inscription_id/statut", put(h::inscription_statut))
        .route("/api/webinaire/webinaires/:id/inscriptions/:inscription_id/presence", put(h::inscription_presence))
        .route("/api/webinaire/webinaires/:id/presentateurs", get(h::presentateur_list).post(h::presentateur_post))
        .route(
            "/api/webinaire/webinaires/:id/presentateurs/:presentateur_id",
            put(h::presentateur_put).delete(h::presentateur_delete),
        )
        .route("/api/webinaire/stats", get(h::stats))
}

fn tresorerie_routes() -> Router<AppState> {
    use axum::routing::post;
    use handlers::protected::tresorerie as h;

    Router::new()
        .route("/api/tresorerie/cotisations", get(h::cotisation_list).post(h::cotisation_post))
        .route("/api/tresorerie/cotisations/:id", get(h::cotisation_get).delete(h::cotisation_delete))
        .route("/api/tresorerie/cotisations/:id/validate", post(h::cotisation_validate))
        .route("/api/tresorerie/cotisations/:id/cancel", post(h::cotisation_cancel))
        .route("/api/tresorerie/cotisations/:id/reset", post(h::cotisation_reset))
        .route("/api/tresorerie/paiements", get(h::paiement_list).post(h::paiement_post))
        .route("/api/tresorerie/paiements/:id", get(h::paiement_get).delete(h::paiement_delete))
        .route("/api/tresorerie/paiements/:id/validate", post(h::paiement_validate))
        .route("/api/tresorerie/paiements/:id/reject", post(h::paiement_reject))
        .route("/api/tresorerie/paiements/:id/cancel", post(h::paiement_cancel))
        .route("/api/tresorerie/depenses", get(h::depense_list).post(h::depense_post))
        .route("/api/tresorerie/depenses/:id", get(h::depense_get).delete(h::depense_delete))
        .route("/api/tresorerie/depenses/:id/validate", post(h::depense_validate))
        .route("/api/tresorerie/depenses/:id/reject", post(h::depense_reject))
        .route("/api/tresorerie/depenses/:id/cancel", post(h::depense_cancel))
        .route("/api/tresorerie/cartes", get(h::carte_list).post(h::carte_post))
        .route("/api/tresorerie/cartes/:id/cancel", post(h::carte_cancel))
        .route("/api/tresorerie/historique", get(h::historique))
        .route("/api/tresorerie/bilan", get(h::bilan))
}

fn secretariat_routes() -> Router<AppState> {
    use axum::routing::{delete, put};
    use handlers::protected::secretariat as h;

    Router::new()
        .route("/api/secretariat/reunions", get(h::reunion_list).post(h::reunion_post))
        .route(
            "/api/secretariat/reunions/:id",
            get(h::reunion_get).put(h::reunion_put).delete(h::reunion_delete),
        )
        .route("/api/secretariat/reunions/:id/pdf", get(h::reunion_pdf))
        .route(
            "/api/secretariat/reunions/:id/participants",
            get(h::participant_list).post(h::participant_post),
        )
        .route("/api/secretariat/reunions/:id/participants/:participant_id", delete(h::participant_delete))
        .route(
            "/api/secretariat/reunions/:id/participants/:participant_id/invitation",
            put(h::participant_invitation),
        )
        .route(
            "/api/secretariat/reunions/:id/participants/:participant_id/presence",
            put(h::participant_presence),
        )
        .route("/api/secretariat/reunions/:id/compte-rendu", get(h::compte_rendu_get).put(h::compte_rendu_put))
        .route("/api/secretariat/reunions/:id/documents", get(h::document_list).post(h::document_post))
        .route("/api/secretariat/reunions/:id/documents/:document_id", delete(h::document_delete))
        .route("/api/secretariat/actions", get(h::action_list).post(h::action_post))
        .route(
            "/api/secretariat/actions/:id",
            get(h::action_get).put(h::action_put).delete(h::action_delete),
        )
        .route("/api/secretariat/actions/:id/statut", put(h::action_statut))
        .route("/api/secretariat/groupes", get(h::groupe_list).post(h::groupe_post))
        .route(
            "/api/secretariat/groupes/:id",
            get(h::groupe_get).put(h::groupe_put).delete(h::groupe_delete),
        )
        .route(
            "/api/secretariat/groupes/:id/membres",
            get(h::groupe_membre_list).post(h::groupe_membre_post),
        )
        .route("/api/secretariat/groupes/:id/membres/:membre_id", delete(h::groupe_membre_delete))
        .route("/api/secretariat/projets", get(h::projet_list).post(h::projet_post))
        .route("/api/secretariat/projets/:id", get(h::projet_get).put(h::projet_put))
        .route("/api/secretariat/projets/:id/inscriptions", get(h::projet_inscription_list))
        .route("/api/secretariat/rapports", get(h::rapport_list).post(h::rapport_post))
        .route("/api/secretariat/rapports/:id", get(h::rapport_get))
        .route("/api/secretariat/rapports/:id/pdf", get(h::rapport_pdf))
        .route("/api/secretariat/stats", get(h::stats))
}

fn mentorat_routes() -> Router<AppState> {
    use axum::routing::put;
    use handlers::protected::mentorat as h;

    Router::new()
        .route("/api/mentorat/mentors", get(h::mentor_list).post(h::mentor_post))
        .route("/api/mentorat/mentors/:id", get(h::mentor_get).put(h::mentor_put).delete(h::mentor_delete))
        .route("/api/mentorat/mentores", get(h::mentore_list).post(h::mentore_post))
        .route("/api/mentorat/mentores/:id", get(h::mentore_get).put(h::mentore_put).delete(h::mentore_delete))
        .route("/api/mentorat/binomes", get(h::binome_list).post(h::binome_post))
        .route("/api/mentorat/binomes/:id", get(h::binome_get).delete(h::binome_delete))
        .route("/api/mentorat/binomes/:id/statut", put(h::binome_statut))
        .route("/api/mentorat/stats", get(h::stats))
}

fn recrutement_routes() -> Router<AppState> {
    use axum::routing::{post, put};
    use handlers::protected::recrutement as h;

    Router::new()
        .route("/api/recrutement/offres", get(h::offre_list).post(h::offre_post))
        .route("/api/recrutement/offres/:id", get(h::offre_get).put(h::offre_put).delete(h::offre_delete))
        .route("/api/recrutement/offres/:id/candidatures", post(h::candidature_post))
        .route("/api/recrutement/candidatures", get(h::candidature_list))
        .route("/api/recrutement/candidatures/:id", get(h::candidature_get).delete(h::candidature_delete))
        .route("/api/recrutement/candidatures/:id/statut", put(h::candidature_statut))
        .route("/api/recrutement/stats", get(h::stats))
}
