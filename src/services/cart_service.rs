use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    dto::cart::{CartDto, CartLineDto, CartList, CartProductRequest},
    entity::{
        cart_items::{
            ActiveModel as CartItemActive, Column as CartItemCol, Entity as CartItems,
        },
        carts::{self, ActiveModel as CartActive, Column as CartCol, Entity as Carts},
        products::Entity as Products,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    services::product_service::product_from_entity,
    state::AppState,
};

/// Pick the user's canonical cart. The schema tolerates duplicate carts per
/// user, so lookups must never be ambiguous: the most recently created cart
/// wins, with the id as a deterministic tie-break.
pub(crate) async fn resolve_cart<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
) -> AppResult<Option<carts::Model>> {
    let cart = Carts::find()
        .filter(CartCol::UserId.eq(user_id))
        .order_by_desc(CartCol::CreatedAt)
        .order_by_desc(CartCol::Id)
        .one(conn)
        .await?;
    Ok(cart)
}

pub async fn list_carts(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<CartList>> {
    let (page, limit, offset) = pagination.normalize();

    let finder = Carts::find()
        .filter(CartCol::UserId.eq(user.user_id))
        .order_by_desc(CartCol::CreatedAt)
        .order_by_desc(CartCol::Id);
    let total = finder.clone().count(&state.orm).await? as i64;

    let carts = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;

    let mut items = Vec::with_capacity(carts.len());
    for cart in &carts {
        items.push(cart_to_dto(&state.orm, cart).await?);
    }

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("OK", CartList { items }, Some(meta)))
}

pub async fn create_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<CartDto>> {
    let cart = new_cart(&state.orm, user.user_id).await?;
    let dto = cart_to_dto(&state.orm, &cart).await?;
    Ok(ApiResponse::success("Cart created", dto, Some(Meta::empty())))
}

/// Put one unit of a product into the user's cart. Find-or-create on both
/// levels: the cart itself, then the (cart, product) line. Re-adding a
/// product bumps the quantity of its existing line instead of creating a
/// duplicate row.
pub async fn add_product(
    state: &AppState,
    user: &AuthUser,
    payload: CartProductRequest,
) -> AppResult<ApiResponse<CartDto>> {
    let txn = state.orm.begin().await?;

    if Products::find_by_id(payload.product_id)
        .one(&txn)
        .await?
        .is_none()
    {
        return Err(AppError::NotFound);
    }

    let cart = match resolve_cart(&txn, user.user_id).await? {
        Some(cart) => cart,
        None => new_cart(&txn, user.user_id).await?,
    };

    let existing = CartItems::find()
        .filter(CartItemCol::CartId.eq(cart.id))
        .filter(CartItemCol::ProductId.eq(payload.product_id))
        .one(&txn)
        .await?;

    match existing {
        Some(line) => {
            let quantity = line.quantity + 1;
            let mut active: CartItemActive = line.into();
            active.quantity = Set(quantity);
            active.update(&txn).await?;
        }
        None => {
            CartItemActive {
                id: Set(Uuid::new_v4()),
                user_id: Set(Some(user.user_id)),
                cart_id: Set(Some(cart.id)),
                product_id: Set(payload.product_id),
                quantity: Set(1),
                created_at: Set(Utc::now().into()),
            }
            .insert(&txn)
            .await?;
        }
    }

    let dto = cart_to_dto(&txn, &cart).await?;
    txn.commit().await?;

    Ok(ApiResponse::success("OK", dto, None))
}

/// Drop a product from the user's cart. A user with no cart gets the empty
/// representation back, and removing a product that was never added is a
/// no-op; neither case is an error.
pub async fn remove_product(
    state: &AppState,
    user: &AuthUser,
    payload: CartProductRequest,
) -> AppResult<ApiResponse<CartDto>> {
    let txn = state.orm.begin().await?;

    let cart = match resolve_cart(&txn, user.user_id).await? {
        Some(cart) => cart,
        None => {
            return Ok(ApiResponse::success(
                "OK",
                CartDto::empty(user.user_id),
                None,
            ));
        }
    };

    CartItems::delete_many()
        .filter(CartItemCol::CartId.eq(cart.id))
        .filter(CartItemCol::ProductId.eq(payload.product_id))
        .exec(&txn)
        .await?;

    let dto = cart_to_dto(&txn, &cart).await?;
    txn.commit().await?;

    Ok(ApiResponse::success("OK", dto, None))
}

async fn new_cart<C: ConnectionTrait>(conn: &C, user_id: Uuid) -> AppResult<carts::Model> {
    let cart = CartActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(Some(user_id)),
        count: Set(1),
        created_at: Set(Utc::now().into()),
    }
    .insert(conn)
    .await?;
    Ok(cart)
}

/// Build the wire representation. The `products` id list is derived from the
/// line items; it is never stored or written to independently.
pub(crate) async fn cart_to_dto<C: ConnectionTrait>(
    conn: &C,
    cart: &carts::Model,
) -> AppResult<CartDto> {
    let lines = CartItems::find()
        .filter(CartItemCol::CartId.eq(cart.id))
        .order_by_asc(CartItemCol::CreatedAt)
        .order_by_asc(CartItemCol::Id)
        .find_also_related(Products)
        .all(conn)
        .await?;

    let mut products = Vec::with_capacity(lines.len());
    let mut items = Vec::with_capacity(lines.len());
    for (line, product) in lines {
        let product = product.ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!(
                "cart line {} references a missing product",
                line.id
            ))
        })?;
        products.push(product.id);
        items.push(CartLineDto {
            product: product_from_entity(product),
            quantity: line.quantity,
        });
    }

    Ok(CartDto {
        id: Some(cart.id),
        user: cart.user_id,
        products,
        count: cart.count,
        items,
    })
}
