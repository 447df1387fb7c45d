use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, EntityTrait, PaginatorTrait, Set};
use uuid::Uuid;

use shop_api::{
    db::{create_orm_conn, setup_schema},
    dto::cart::CartProductRequest,
    entity::{CartItems, products, users},
    error::AppError,
    middleware::auth::AuthUser,
    routes::params::Pagination,
    services::cart_service,
    state::AppState,
};

#[tokio::test]
async fn add_product_accumulates_quantity_on_one_line() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let user = create_user(&state, "user@example.com").await?;
    let product = create_product(&state, "Sourdough Loaf", Decimal::new(650, 2)).await?;

    for _ in 0..3 {
        cart_service::add_product(
            &state,
            &user,
            CartProductRequest {
                product_id: product.id,
            },
        )
        .await?;
    }

    let cart = cart_service::add_product(
        &state,
        &user,
        CartProductRequest {
            product_id: product.id,
        },
    )
    .await?
    .data
    .unwrap();

    assert_eq!(cart.items.len(), 1, "duplicate adds must not add lines");
    assert_eq!(cart.items[0].quantity, 4);
    assert_eq!(cart.products, vec![product.id]);

    // One row in the store, not four.
    let rows = CartItems::find().count(&state.orm).await?;
    assert_eq!(rows, 1);

    Ok(())
}

#[tokio::test]
async fn add_product_with_unknown_product_is_not_found() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let user = create_user(&state, "user@example.com").await?;

    let err = cart_service::add_product(
        &state,
        &user,
        CartProductRequest {
            product_id: Uuid::new_v4(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    Ok(())
}

#[tokio::test]
async fn remove_product_without_cart_returns_empty_cart() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let user = create_user(&state, "user@example.com").await?;

    let cart = cart_service::remove_product(
        &state,
        &user,
        CartProductRequest {
            product_id: Uuid::new_v4(),
        },
    )
    .await?
    .data
    .unwrap();

    assert!(cart.id.is_none());
    assert!(cart.items.is_empty());
    assert!(cart.products.is_empty());
    assert_eq!(cart.count, 0);

    Ok(())
}

#[tokio::test]
async fn remove_product_is_idempotent() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let user = create_user(&state, "user@example.com").await?;
    let bread = create_product(&state, "Rye Bagel", Decimal::new(240, 2)).await?;
    let bun = create_product(&state, "Cinnamon Bun", Decimal::new(395, 2)).await?;

    cart_service::add_product(
        &state,
        &user,
        CartProductRequest {
            product_id: bread.id,
        },
    )
    .await?;

    // Removing something never added leaves the cart as it was.
    let cart = cart_service::remove_product(
        &state,
        &user,
        CartProductRequest { product_id: bun.id },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(cart.products, vec![bread.id]);

    let cart = cart_service::remove_product(
        &state,
        &user,
        CartProductRequest {
            product_id: bread.id,
        },
    )
    .await?
    .data
    .unwrap();
    assert!(cart.items.is_empty());

    // And again, for good measure.
    let cart = cart_service::remove_product(
        &state,
        &user,
        CartProductRequest {
            product_id: bread.id,
        },
    )
    .await?
    .data
    .unwrap();
    assert!(cart.items.is_empty());

    Ok(())
}

#[tokio::test]
async fn duplicate_carts_resolve_to_one_canonical_cart() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let user = create_user(&state, "user@example.com").await?;
    let product = create_product(&state, "Sourdough Loaf", Decimal::new(650, 2)).await?;

    cart_service::create_cart(&state, &user).await?;
    cart_service::create_cart(&state, &user).await?;

    let first = cart_service::add_product(
        &state,
        &user,
        CartProductRequest {
            product_id: product.id,
        },
    )
    .await?
    .data
    .unwrap();
    let second = cart_service::add_product(
        &state,
        &user,
        CartProductRequest {
            product_id: product.id,
        },
    )
    .await?
    .data
    .unwrap();

    // Both calls must land in the same cart: still one line, quantity 2.
    assert_eq!(first.id, second.id);
    assert_eq!(second.items.len(), 1);
    assert_eq!(second.items[0].quantity, 2);

    let rows = CartItems::find().count(&state.orm).await?;
    assert_eq!(rows, 1);

    Ok(())
}

#[tokio::test]
async fn cart_listing_is_scoped_to_the_caller() -> anyhow::Result<()> {
    let state = setup_state().await?;
    let alice = create_user(&state, "alice@example.com").await?;
    let bob = create_user(&state, "bob@example.com").await?;
    let product = create_product(&state, "Sourdough Loaf", Decimal::new(650, 2)).await?;

    cart_service::add_product(
        &state,
        &alice,
        CartProductRequest {
            product_id: product.id,
        },
    )
    .await?;

    let bobs = cart_service::list_carts(
        &state,
        &bob,
        Pagination {
            page: None,
            per_page: None,
        },
    )
    .await?
    .data
    .unwrap();
    assert!(bobs.items.is_empty());

    let alices = cart_service::list_carts(
        &state,
        &alice,
        Pagination {
            page: None,
            per_page: None,
        },
    )
    .await?
    .data
    .unwrap();
    assert_eq!(alices.items.len(), 1);

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
