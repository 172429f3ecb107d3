use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;

use crate::core::shared::state::AppState;

use super::auth_routes;
use super::clients;
use super::users;

pub fn configure() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/login", post(auth_routes::login))
        .route("/auth/me", get(auth_routes::me))
        .route("/auth/profile", put(auth_routes::update_profile))
        .route("/users", get(users::list_users).post(users::create_user))
        .route(
            "/users/{user_id}",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route(
            "/clients",
            get(clients::list_clients).post(clients::create_client),
        )
}
