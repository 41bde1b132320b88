use crate::{
    api::{compensation, membership},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::web;

// Helper to build a per-scope limiter
fn build_limiter(requests_per_min: u32) -> Option<Governor<PeerIpKeyExtractor, NoOpMiddleware>> {
    let per_ms = if requests_per_min == 0 {
        1
    } else {
        (60_000 / requests_per_min as u64).max(1)
    };
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min.max(1))
        .key_extractor(PeerIpKeyExtractor)
        .finish()?;
    Some(Governor::new(&cfg))
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config) {
    let scope = web::scope(&config.api_prefix)
        .service(
            web::scope("/compensation")
                // /compensation
                .service(
                    web::resource("").route(web::post().to(compensation::create_compensation)),
                )
                // /compensation/preview
                .service(
                    web::resource("/preview")
                        .route(web::post().to(compensation::preview_compensation)),
                )
                // /compensation/orphaned-payments (before /{id})
                .service(
                    web::resource("/orphaned-payments")
                        .route(web::get().to(compensation::orphaned_payments)),
                )
                // /compensation/{id}
                .service(
                    web::resource("/{id}")
                        .route(web::get().to(compensation::get_compensation))
                        .route(web::put().to(compensation::update_compensation))
                        .route(web::delete().to(compensation::delete_compensation)),
                ),
        )
        // /employee/{id}/condominiums, /provider/{id}/condominiums
        .service(
            web::resource("/{owner}/{id}/condominiums")
                .route(web::get().to(membership::list_condominiums))
                .route(web::put().to(membership::reconcile_condominiums)),
        );

    match build_limiter(config.rate_per_min) {
        Some(limiter) => cfg.service(scope.wrap(limiter)),
        None => {
            tracing::warn!(rate = config.rate_per_min, "Rate limiter disabled: invalid quota");
            cfg.service(scope)
        }
    };
}
