use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::dto::products::ProductDto;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CartProductRequest {
    pub product_id: Uuid,
}

/// Wire representation of a cart. `products` is a derived view (the distinct
/// product ids of the line items); `items` carries the authoritative
/// per-product quantities.
#[derive(Debug, Serialize, ToSchema)]
pub struct CartDto {
    pub id: Option<Uuid>,
    pub user: Option<Uuid>,
    pub products: Vec<Uuid>,
    pub count: i32,
    pub items: Vec<CartLineDto>,
}

impl CartDto {
    /// What a user with no cart sees: nothing, but not an error.
    pub fn empty(user_id: Uuid) -> Self {
        Self {
            id: None,
            user: Some(user_id),
            products: Vec::new(),
            count: 0,
            items: Vec::new(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartLineDto {
    pub product: ProductDto,
    pub quantity: i32,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct CartList {
    #[schema(value_type = Vec<CartDto>)]
    pub items: Vec<CartDto>,
}
