//! Storefront page paths that browser clients are redirected to.

use uuid::Uuid;

pub const HOME: &str = "/";
pub const CART: &str = "/cart/";
pub const CHECKOUT: &str = "/checkout/";
pub const WISHLIST: &str = "/wishlist/";
pub const LOGIN: &str = "/login/";

pub fn product_detail(id: Uuid) -> String {
    format!("/product/{id}/")
}

pub fn order_confirmation(id: Uuid) -> String {
    format!("/order/{id}/")
}

pub fn login_with_next(next: &str) -> String {
    format!("{LOGIN}?next={next}")
}
