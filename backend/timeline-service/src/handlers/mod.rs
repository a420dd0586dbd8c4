//! HTTP request handlers.

use actix_web::web;

pub mod posts;
pub mod users;

pub use posts::{create_post, delete_post, get_feed, like_post, retweet_post, update_post};
pub use users::{follow_user, get_user};

/// Register the service's API routes. Shared between `main` and the
/// integration tests so both exercise the same routing table.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/ws", web::get().to(crate::ws::session::push_channel))
        .service(
            web::scope("/api/v1")
                .service(
                    web::scope("/posts")
                        .service(
                            web::resource("")
                                .route(web::get().to(get_feed))
                                .route(web::post().to(create_post)),
                        )
                        .route("/{post_id}/like", web::post().to(like_post))
                        .route("/{post_id}/retweet", web::post().to(retweet_post))
                        .service(
                            web::resource("/{post_id}")
                                .route(web::put().to(update_post))
                                .route(web::delete().to(delete_post)),
                        ),
                )
                .service(
                    web::scope("/users")
                        .route("/{user_id}/follow", web::post().to(follow_user))
                        .route("/{user_id}", web::get().to(get_user)),
                ),
        );
}
