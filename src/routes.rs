use crate::{
    api::{attendance, leave_request},
    auth::middleware::auth_middleware,
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};

// Helper to build per-scope limiter
fn build_limiter(requests_per_min: u32) -> Option<Governor<PeerIpKeyExtractor, NoOpMiddleware>> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = (60_000 / requests_per_min as u64).max(1);
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()?;
    Some(Governor::new(&cfg))
}

/// Attendance and leave resources, relative to the API prefix.
pub fn api_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/leave")
            // /leave
            .service(
                web::resource("")
                    .route(web::get().to(leave_request::leave_list))
                    .route(web::post().to(leave_request::create_leave)),
            )
            // /leave/{id}
            .service(
                web::resource("/{id}")
                    .route(web::get().to(leave_request::get_leave))
                    .route(web::put().to(leave_request::update_leave))
                    .route(web::delete().to(leave_request::delete_leave)),
            )
            // /leave/{id}/approve
            .service(
                web::resource("/{id}/approve").route(web::put().to(leave_request::approve_leave)),
            )
            // /leave/{id}/reject
            .service(
                web::resource("/{id}/reject").route(web::put().to(leave_request::reject_leave)),
            ),
    )
    .service(
        web::scope("/attendance")
            .service(web::resource("/check-in").route(web::post().to(attendance::check_in)))
            .service(web::resource("/check-out").route(web::post().to(attendance::check_out)))
            .service(web::resource("/absence").route(web::post().to(attendance::mark_absence)))
            .service(web::resource("/today").route(web::get().to(attendance::today))),
    );
}

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    let scope = web::scope(&config.api_prefix)
        .wrap(from_fn(auth_middleware)) // authentication
        .configure(api_routes);

    // Protected routes
    match build_limiter(config.rate_protected_per_min) {
        Some(limiter) => {
            cfg.service(scope.wrap(limiter)); // rate limiting
        }
        None => {
            tracing::warn!("Invalid rate limit configuration, serving without a limiter");
            cfg.service(scope);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limiter_accepts_zero_and_large_rates() {
        assert!(build_limiter(0).is_some());
        assert!(build_limiter(1000).is_some());
        assert!(build_limiter(120_000).is_some());
    }
}
