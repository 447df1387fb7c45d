use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    dto::orders::{CheckoutRequest, OrderDto, OrderLineDto, OrderList},
    entity::{
        cart_items::{Column as CartItemCol, Entity as CartItems},
        order_items::{
            ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems,
        },
        orders::{self, ActiveModel as OrderActive, Column as OrderCol, Entity as Orders},
        products::Entity as Products,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    services::{cart_service, product_service::product_from_entity},
    state::AppState,
};

/// Convert the user's cart into an order. The whole operation is one
/// transaction: either the order, its items, the cart clearing, and the
/// total all land, or none of them do.
pub async fn checkout(
    state: &AppState,
    user: &AuthUser,
    payload: CheckoutRequest,
) -> AppResult<ApiResponse<OrderDto>> {
    let txn = state.orm.begin().await?;

    // Resolve the cart before writing the order row, so a user without a
    // cart never leaves an orphan order behind.
    let cart = cart_service::resolve_cart(&txn, user.user_id)
        .await?
        .ok_or(AppError::NotFound)?;

    let lines = CartItems::find()
        .filter(CartItemCol::CartId.eq(cart.id))
        .order_by_asc(CartItemCol::CreatedAt)
        .order_by_asc(CartItemCol::Id)
        .find_also_related(Products)
        .all(&txn)
        .await?;

    if lines.is_empty() {
        return Err(AppError::BadRequest("Cart is empty".into()));
    }

    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(Some(user.user_id)),
        total_price: Set(Decimal::ZERO),
        phone_number: Set(payload.phone_number),
        delivery_address: Set(payload.delivery_address),
        created_at: Set(Utc::now().into()),
    }
    .insert(&txn)
    .await?;

    let mut total_price = Decimal::ZERO;
    let mut items = Vec::with_capacity(lines.len());
    for (line, product) in &lines {
        let product = product.as_ref().ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!(
                "cart line {} references a missing product",
                line.id
            ))
        })?;

        // The snapshot: unit price as of this instant, times the quantity.
        // The stored value never changes again, whatever happens to the
        // product's price afterwards.
        let price = product.price * Decimal::from(line.quantity);
        total_price += price;

        OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(product.id),
            quantity: Set(line.quantity),
            price: Set(price),
            created_at: Set(Utc::now().into()),
        }
        .insert(&txn)
        .await?;

        items.push(OrderLineDto {
            product: product_from_entity(product.clone()),
            quantity: line.quantity,
            price,
        });
    }

    // Drain exactly the lines that were read and priced, by id. A line added
    // by a racing add_product after the read stays in the cart for the next
    // checkout instead of being dropped uncharged. If a racing checkout
    // consumed these lines first, the delete comes up short and this
    // transaction must not charge for items it did not consume.
    let line_ids: Vec<Uuid> = lines.iter().map(|(line, _)| line.id).collect();
    let deleted = CartItems::delete_many()
        .filter(CartItemCol::Id.is_in(line_ids))
        .exec(&txn)
        .await?;
    if (deleted.rows_affected as usize) < lines.len() {
        return Err(AppError::BadRequest("Cart is empty".into()));
    }

    let mut active: OrderActive = order.into();
    active.total_price = Set(total_price);
    let order = active.update(&txn).await?;

    txn.commit().await?;

    tracing::info!(order_id = %order.id, total = %order.total_price, "checkout completed");

    let dto = OrderDto {
        id: order.id,
        user: order.user_id,
        items,
        total_price: order.total_price,
        phone_number: order.phone_number,
        delivery_address: order.delivery_address,
    };
    Ok(ApiResponse::success("Order created", dto, Some(Meta::empty())))
}

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = pagination.normalize();

    let finder = Orders::find()
        .filter(OrderCol::UserId.eq(user.user_id))
        .order_by_desc(OrderCol::CreatedAt);
    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;

    let mut items = Vec::with_capacity(orders.len());
    for order in orders {
        items.push(order_to_dto(&state.orm, order).await?);
    }

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Ok", OrderList { items }, Some(meta)))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderDto>> {
    let order = Orders::find_by_id(id)
        .filter(OrderCol::UserId.eq(user.user_id))
        .one(&state.orm)
        .await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    let dto = order_to_dto(&state.orm, order).await?;
    Ok(ApiResponse::success("OK", dto, Some(Meta::empty())))
}

async fn order_to_dto<C: ConnectionTrait>(
    conn: &C,
    order: orders::Model,
) -> AppResult<OrderDto> {
    let lines = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .order_by_asc(OrderItemCol::CreatedAt)
        .order_by_asc(OrderItemCol::Id)
        .find_also_related(Products)
        .all(conn)
        .await?;

    let mut items = Vec::with_capacity(lines.len());
    for (line, product) in lines {
        let product = product.ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!(
                "order item {} references a missing product",
                line.id
            ))
        })?;
        items.push(OrderLineDto {
            product: product_from_entity(product),
            quantity: line.quantity,
            // The frozen value from the order item, not a recomputation.
            price: line.price,
        });
    }

    Ok(OrderDto {
        id: order.id,
        user: order.user_id,
        items,
        total_price: order.total_price,
        phone_number: order.phone_number,
        delivery_address: order.delivery_address,
    })
}
