use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{LoginRequest, LoginResponse, RegisterRequest, UserDto},
        cart::{CartDto, CartLineDto, CartList, CartProductRequest},
        categories::{CategoryDto, CategoryList, CreateCategoryRequest, UpdateCategoryRequest},
        orders::{CheckoutRequest, OrderDto, OrderLineDto, OrderList},
        products::{CreateProductRequest, ProductDto, ProductList, UpdateProductRequest},
    },
    response::{ApiResponse, Meta},
    routes::{auth, cart, categories, health, orders, params, products},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::login,
        auth::register,
        categories::list_categories,
        categories::get_category,
        categories::create_category,
        categories::update_category,
        categories::delete_category,
        products::list_products,
        products::get_product,
        products::create_product,
        products::update_product,
        products::delete_product,
        cart::list_carts,
        cart::create_cart,
        cart::add_product,
        cart::remove_product,
        orders::list_orders,
        orders::checkout,
        orders::get_order
    ),
    components(
        schemas(
            UserDto,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            CategoryDto,
            CategoryList,
            CreateCategoryRequest,
            UpdateCategoryRequest,
            ProductDto,
            ProductList,
            CreateProductRequest,
            UpdateProductRequest,
            CartDto,
            CartLineDto,
            CartList,
            CartProductRequest,
            OrderDto,
            OrderLineDto,
            OrderList,
            CheckoutRequest,
            params::Pagination,
            Meta,
            ApiResponse<ProductDto>,
            ApiResponse<ProductList>,
            ApiResponse<CategoryList>,
            ApiResponse<CartDto>,
            ApiResponse<CartList>,
            ApiResponse<OrderDto>,
            ApiResponse<OrderList>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Categories", description = "Category endpoints"),
        (name = "Products", description = "Product endpoints"),
        (name = "Cart", description = "Cart endpoints"),
        (name = "Orders", description = "Order endpoints"),
        (name = "Auth", description = "Authentication endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
