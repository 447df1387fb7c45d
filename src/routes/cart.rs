use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::cart::{CartDto, CartList, CartProductRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    routes::params::Pagination,
    services::cart_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_carts).post(create_cart))
        .route("/{id}/add_product", post(add_product))
        .route("/{id}/remove_product", post(remove_product))
}

#[utoipa::path(
    get,
    path = "/api/cart",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20")
    ),
    responses(
        (status = 200, description = "List carts for current user", body = ApiResponse<CartList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn list_carts(
    State(state): State<AppState>,
    user: AuthUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<CartList>>> {
    let resp = cart_service::list_carts(&state, &user, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/cart",
    responses(
        (status = 201, description = "Create a cart owned by the caller", body = ApiResponse<CartDto>)
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn create_cart(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<CartDto>>> {
    let resp = cart_service::create_cart(&state, &user).await?;
    Ok(Json(resp))
}

// The path id is kept for wire compatibility; both actions always target the
// caller's canonical cart.

#[utoipa::path(
    post,
    path = "/api/cart/{id}/add_product",
    params(
        ("id" = Uuid, Path, description = "Cart ID (informational)")
    ),
    request_body = CartProductRequest,
    responses(
        (status = 200, description = "Add one unit of a product to the cart", body = ApiResponse<CartDto>),
        (status = 404, description = "Product not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn add_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(_id): Path<Uuid>,
    Json(payload): Json<CartProductRequest>,
) -> AppResult<Json<ApiResponse<CartDto>>> {
    let resp = cart_service::add_product(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/cart/{id}/remove_product",
    params(
        ("id" = Uuid, Path, description = "Cart ID (informational)")
    ),
    request_body = CartProductRequest,
    responses(
        (status = 200, description = "Remove a product from the cart; a no-op if absent", body = ApiResponse<CartDto>),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn remove_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(_id): Path<Uuid>,
    Json(payload): Json<CartProductRequest>,
) -> AppResult<Json<ApiResponse<CartDto>>> {
    let resp = cart_service::remove_product(&state, &user, payload).await?;
    Ok(Json(resp))
}
