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
        cart::{AddToCartRequest, CartLineDto, CartSummary, CartView, UpdateCartRequest},
        checkout::CheckoutRequest,
        orders::{OrderList, OrderWithItems},
        products::{
            BulkStatusRequest, BulkStatusResult, CreateProductRequest, ProductList, ProductStats,
            UpdateProductRequest,
        },
        session::SessionContext,
        wishlist::{WishlistChange, WishlistView},
    },
    models::{Order, OrderItem, Product, ProductStatus, WishlistEntry},
    response::{ApiResponse, Meta},
    routes::{
        admin, cart, checkout, health, orders, params, products as product_routes, session,
        wishlist,
    },
    session::{FlashLevel, FlashMessage},
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
        product_routes::list_products,
        product_routes::get_product,
        cart::view_cart,
        cart::add_to_cart,
        cart::update_cart,
        cart::remove_from_cart,
        cart::clear_cart,
        checkout::checkout,
        orders::list_orders,
        orders::get_order,
        wishlist::list_wishlist,
        wishlist::add_to_wishlist,
        wishlist::remove_from_wishlist,
        session::session_context,
        admin::list_products,
        admin::create_product,
        admin::update_product,
        admin::delete_product,
        admin::bulk_status,
        admin::product_stats
    ),
    components(
        schemas(
            Product,
            ProductStatus,
            Order,
            OrderItem,
            WishlistEntry,
            AddToCartRequest,
            UpdateCartRequest,
            CartLineDto,
            CartSummary,
            CartView,
            CheckoutRequest,
            OrderList,
            OrderWithItems,
            CreateProductRequest,
            UpdateProductRequest,
            BulkStatusRequest,
            BulkStatusResult,
            ProductStats,
            ProductList,
            SessionContext,
            FlashLevel,
            FlashMessage,
            WishlistChange,
            WishlistView,
            params::Pagination,
            params::ProductQuery,
            params::AdminProductQuery,
            params::ProductSortBy,
            params::SortOrder,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<CartView>,
            ApiResponse<CartSummary>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>,
            ApiResponse<WishlistChange>,
            ApiResponse<WishlistView>,
            ApiResponse<SessionContext>,
            ApiResponse<ProductStats>,
            ApiResponse<BulkStatusResult>
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Products", description = "Storefront catalog"),
        (name = "Cart", description = "Session cart"),
        (name = "Checkout", description = "Order placement"),
        (name = "Orders", description = "Order history and confirmation"),
        (name = "Wishlist", description = "Saved products for signed-in shoppers"),
        (name = "Session", description = "Page chrome: badges and flash messages"),
        (name = "Admin", description = "Staff product console"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_storefront_route_is_documented() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/cart/add/{product_id}",
            "/api/checkout",
            "/api/wishlist/add/{product_id}",
            "/api/admin/products/stats",
            "/api/session",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
