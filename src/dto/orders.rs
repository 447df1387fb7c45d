use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::dto::products::ProductDto;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckoutRequest {
    pub phone_number: String,
    pub delivery_address: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderDto {
    pub id: Uuid,
    pub user: Option<Uuid>,
    pub items: Vec<OrderLineDto>,
    pub total_price: Decimal,
    pub phone_number: String,
    pub delivery_address: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderLineDto {
    pub product: ProductDto,
    pub quantity: i32,
    pub price: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct OrderList {
    #[schema(value_type = Vec<OrderDto>)]
    pub items: Vec<OrderDto>,
}
