use argon2::{
    Argon2, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use shop_api::{
    config::AppConfig,
    db::{create_orm_conn, setup_schema},
    entity::{
        categories::{self, Entity as Categories},
        products::{self, Entity as Products},
        users::{self, Entity as Users},
    },
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let orm = create_orm_conn(&config.database_url).await?;
    setup_schema(&orm).await?;

    let admin_id = ensure_user(&orm, "admin@example.com", "admin123", "admin").await?;
    let user_id = ensure_user(&orm, "user@example.com", "user123", "user").await?;
    seed_catalog(&orm).await?;

    println!("Seed completed. Admin ID: {admin_id}, User ID: {user_id}");
    Ok(())
}

async fn ensure_user(
    orm: &DatabaseConnection,
    email: &str,
    password: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    if let Some(existing) = Users::find()
        .filter(users::Column::Email.eq(email))
        .one(orm)
        .await?
    {
        println!("User {email} already present (role={})", existing.role);
        return Ok(existing.id);
    }

    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();

    let user = users::ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(email.to_string()),
        password_hash: Set(password_hash),
        role: Set(role.to_string()),
        created_at: Set(Utc::now().into()),
    }
    .insert(orm)
    .await?;

    println!("Ensured user {email} (role={role})");
    Ok(user.id)
}

async fn seed_catalog(orm: &DatabaseConnection) -> anyhow::Result<()> {
    let category_id = match Categories::find()
        .filter(categories::Column::Name.eq("Bakery"))
        .one(orm)
        .await?
    {
        Some(category) => category.id,
        None => {
            categories::ActiveModel {
                id: Set(Uuid::new_v4()),
                name: Set("Bakery".to_string()),
                created_at: Set(Utc::now().into()),
            }
            .insert(orm)
            .await?
            .id
        }
    };

    let items = [
        ("Sourdough Loaf", "Slow-fermented wheat loaf", Decimal::new(650, 2)),
        ("Rye Bagel", "Dense rye bagel, sesame crust", Decimal::new(240, 2)),
        ("Cinnamon Bun", "Sticky bun with cinnamon swirl", Decimal::new(395, 2)),
    ];

    for (name, description, price) in items {
        let exists = Products::find()
            .filter(products::Column::Name.eq(name))
            .one(orm)
            .await?
            .is_some();
        if exists {
            continue;
        }
        products::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            image: Set(None),
            description: Set(description.to_string()),
            price: Set(price),
            category_id: Set(Some(category_id)),
            created_at: Set(Utc::now().into()),
        }
        .insert(orm)
        .await?;
    }

    println!("Seeded catalog");
    Ok(())
}
