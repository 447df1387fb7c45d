use anyhow::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};

use crate::entity::{CartItems, Carts, Categories, OrderItems, Orders, Products, Users};

pub type OrmConn = DatabaseConnection;

/// Create a SeaORM connection.
pub async fn create_orm_conn(database_url: &str) -> Result<DatabaseConnection> {
    let conn = Database::connect(database_url).await?;
    Ok(conn)
}

/// Create all tables from the entity definitions. Idempotent, so it can run
/// on every startup and against throwaway test databases.
pub async fn setup_schema(conn: &DatabaseConnection) -> Result<()> {
    let backend = conn.get_database_backend();
    let schema = Schema::new(backend);

    // Referenced tables first; categories/products before the carts and
    // orders that point at them.
    let mut statements = [
        schema.create_table_from_entity(Users),
        schema.create_table_from_entity(Categories),
        schema.create_table_from_entity(Products),
        schema.create_table_from_entity(Carts),
        schema.create_table_from_entity(CartItems),
        schema.create_table_from_entity(Orders),
        schema.create_table_from_entity(OrderItems),
    ];

    for statement in &mut statements {
        conn.execute(backend.build(statement.if_not_exists())).await?;
    }

    Ok(())
}
