use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, EntityTrait, PaginatorTrait, Set};
use uuid::Uuid;

use shop_api::{
    db::{create_orm_conn, setup_schema},
    dto::{cart::CartProductRequest, orders::CheckoutRequest},
    entity::{CartItems, OrderItems, Orders, products, users},
    error::AppError,
    middleware::auth::AuthUser,
    services::{cart_service, order_service},
    state::AppState,
};

// The full storefront scenario: two of product A at 10.00, one of product B
// at 5.00, checked out with delivery details.
#[tokio::test]
async fn checkout_freezes_prices_and_drains_the_cart() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let user = create_user(&state, "user@example.com").await?;
    let a = create_product(&state, "Product A", Decimal::new(1000, 2)).await?;
    let b = create_product(&state, "Product B", Decimal::new(500, 2)).await?;

    add(&state, &user, a.id).await?;
    add(&state, &user, a.id).await?;
    add(&state, &user, b.id).await?;

    let order = order_service::checkout(
        &state,
        &user,
        CheckoutRequest {
            phone_number: "555-1234".into(),
            delivery_address: "1 Main St".into(),
        },
    )
    .await?
    .data
    .unwrap();

    assert_eq!(order.items.len(), 2);
    let line_a = order
        .items
        .iter()
        .find(|line| line.product.id == a.id)
        .expect("line for product A");
    assert_eq!(line_a.quantity, 2);
    assert_eq!(line_a.price, Decimal::new(2000, 2));
    let line_b = order
        .items
        .iter()
        .find(|line| line.product.id == b.id)
        .expect("line for product B");
    assert_eq!(line_b.quantity, 1);
    assert_eq!(line_b.price, Decimal::new(500, 2));
    assert_eq!(order.total_price, Decimal::new(2500, 2));
    assert_eq!(order.phone_number, "555-1234");
    assert_eq!(order.delivery_address, "1 Main St");

    // The consumed lines are gone; the cart row itself may remain.
    let remaining = CartItems::find().count(&state.orm).await?;
    assert_eq!(remaining, 0);

    Ok(())
}

#[tokio::test]
async fn order_total_equals_exact_sum_of_item_prices() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let user = create_user(&state, "user@example.com").await?;
    let a = create_product(&state, "Product A", Decimal::new(1999, 2)).await?;
    let b = create_product(&state, "Product B", Decimal::new(1, 2)).await?;

    for _ in 0..3 {
        add(&state, &user, a.id).await?;
    }
    for _ in 0..7 {
        add(&state, &user, b.id).await?;
    }

    let order = checkout(&state, &user).await?;

    let sum: Decimal = order.items.iter().map(|item| item.price).sum();
    assert_eq!(order.total_price, sum);
    // 3 * 19.99 + 7 * 0.01 = 60.04
    assert_eq!(order.total_price, Decimal::new(6004, 2));

    Ok(())
}

#[tokio::test]
async fn frozen_price_survives_later_price_change() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let user = create_user(&state, "user@example.com").await?;
    let product = create_product(&state, "Product A", Decimal::new(1000, 2)).await?;

    add(&state, &user, product.id).await?;
    add(&state, &user, product.id).await?;
    let order = checkout(&state, &user).await?;
    assert_eq!(order.items[0].price, Decimal::new(2000, 2));

    // Reprice the product after the fact.
    let mut active: products::ActiveModel = products::Entity::find_by_id(product.id)
        .one(&state.orm)
        .await?
        .unwrap()
        .into();
    active.price = Set(Decimal::new(9999, 2));
    active.update(&state.orm).await?;

    let reread = order_service::get_order(&state, &user, order.id)
        .await?
        .data
        .unwrap();
    assert_eq!(reread.items[0].price, Decimal::new(2000, 2));
    assert_eq!(reread.total_price, Decimal::new(2000, 2));
    // The product detail shows the live price; the line stays frozen.
    assert_eq!(reread.items[0].product.price, Decimal::new(9999, 2));

    Ok(())
}

#[tokio::test]
async fn checkout_without_cart_is_not_found_and_leaves_no_order() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let user = create_user(&state, "user@example.com").await?;

    let err = order_service::checkout(
        &state,
        &user,
        CheckoutRequest {
            phone_number: "555-1234".into(),
            delivery_address: "1 Main St".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    let orders = Orders::find().count(&state.orm).await?;
    assert_eq!(orders, 0, "a failed checkout must not persist an orphan order");

    Ok(())
}

#[tokio::test]
async fn checkout_with_empty_cart_is_rejected() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let user = create_user(&state, "user@example.com").await?;
    cart_service::create_cart(&state, &user).await?;

    let err = order_service::checkout(
        &state,
        &user,
        CheckoutRequest {
            phone_number: "555-1234".into(),
            delivery_address: "1 Main St".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let orders = Orders::find().count(&state.orm).await?;
    assert_eq!(orders, 0);

    Ok(())
}

#[tokio::test]
async fn second_checkout_cannot_double_charge() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let user = create_user(&state, "user@example.com").await?;
    let product = create_product(&state, "Product A", Decimal::new(1000, 2)).await?;

    add(&state, &user, product.id).await?;
    let first = checkout(&state, &user).await?;
    assert_eq!(first.items.len(), 1);

    let err = order_service::checkout(
        &state,
        &user,
        CheckoutRequest {
            phone_number: "555-1234".into(),
            delivery_address: "1 Main St".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let orders = Orders::find().count(&state.orm).await?;
    assert_eq!(orders, 1, "the same cart contents must only be charged once");

    Ok(())
}

// Lines that land in the cart after an order was priced belong to the next
// checkout; draining must never sweep up more than it charged for.
#[tokio::test]
async fn checkout_consumes_only_the_lines_it_charged() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let user = create_user(&state, "user@example.com").await?;
    let a = create_product(&state, "Product A", Decimal::new(1000, 2)).await?;
    let b = create_product(&state, "Product B", Decimal::new(500, 2)).await?;

    add(&state, &user, a.id).await?;
    let first = checkout(&state, &user).await?;
    assert_eq!(first.items.len(), 1);
    assert_eq!(first.items[0].product.id, a.id);

    // A fresh line lands in the same cart after the first checkout.
    add(&state, &user, b.id).await?;
    let remaining = CartItems::find().count(&state.orm).await?;
    assert_eq!(remaining, 1, "the uncharged line must survive the drain");

    let second = checkout(&state, &user).await?;
    assert_eq!(second.items.len(), 1);
    assert_eq!(second.items[0].product.id, b.id);
    assert_eq!(second.total_price, Decimal::new(500, 2));

    let orders = Orders::find().count(&state.orm).await?;
    assert_eq!(orders, 2);
    let order_lines = OrderItems::find().count(&state.orm).await?;
    assert_eq!(order_lines, 2);

    Ok(())
}

#[tokio::test]
async fn orders_are_scoped_to_their_owner() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let alice = create_user(&state, "alice@example.com").await?;
    let bob = create_user(&state, "bob@example.com").await?;
    let product = create_product(&state, "Product A", Decimal::new(1000, 2)).await?;

    add(&state, &alice, product.id).await?;
    let order = checkout(&state, &alice).await?;

    let err = order_service::get_order(&state, &bob, order.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    let mine = order_service::list_orders(
        &state,
        &alice,
        shop_api::routes::params::Pagination {
            page: None,
            per_page: None,
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(mine.items.len(), 1);
    assert_eq!(mine.items[0].id, order.id);

    Ok(())
}

async fn setup_state() -> anyhow::Result<AppState> {
    let orm = create_orm_conn("sqlite::memory:").await?;
    setup_schema(&orm).await?;
    Ok(AppState {
        orm,
        jwt_secret: "test-secret".into(),
    })
}

async fn create_user(state: &AppState, email: &str) -> anyhow::Result<AuthUser> {
    let user = users::ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(email.to_string()),
        password_hash: Set("dummy".into()),
        role: Set("user".into()),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;

    Ok(AuthUser {
        user_id: user.id,
        role: "user".into(),
    })
}

async fn create_product(
    state: &AppState,
    name: &str,
    price: Decimal,
) -> anyhow::Result<products::Model> {
    let product = products::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        image: Set(None),
        description: Set("A product for testing".into()),
        price: Set(price),
        category_id: Set(None),
        created_at: Set(Utc::now().into()),
    }
    .insert(&state.orm)
    .await?;
    Ok(product)
}

async fn add(state: &AppState, user: &AuthUser, product_id: Uuid) -> anyhow::Result<()> {
    cart_service::add_product(state, user, CartProductRequest { product_id }).await?;
    Ok(())
}

async fn checkout(
    state: &AppState,
    user: &AuthUser,
) -> anyhow::Result<shop_api::dto::orders::OrderDto> {
    let resp = order_service::checkout(
        state,
        user,
        CheckoutRequest {
            phone_number: "555-1234".into(),
            delivery_address: "1 Main St".into(),
        },
    )
    .await?;
    Ok(resp.data.unwrap())
}
