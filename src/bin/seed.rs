use chrono::Duration;
use minishop_api::{
    config::AppConfig,
    db::{create_pool, orm_from_pool, run_migrations},
    entity::products::{ActiveModel as ProductActive, Column, Entity as Products, ProductStatus},
    middleware::auth::issue_token,
};
use rust_decimal::Decimal;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    run_migrations(&pool).await?;
    let orm = orm_from_pool(&pool);

    seed_products(&orm).await?;

    // Development identities; in production tokens come from the identity provider.
    let staff_token = issue_token(
        &config.jwt_secret,
        Uuid::new_v4(),
        "staff@example.com",
        "staff",
        Duration::days(7),
    )?;
    let shopper_token = issue_token(
        &config.jwt_secret,
        Uuid::new_v4(),
        "shopper@example.com",
        "user",
        Duration::days(7),
    )?;

    println!("Seed completed.");
    println!("Staff token:   {staff_token}");
    println!("Shopper token: {shopper_token}");
    Ok(())
}

async fn seed_products(orm: &DatabaseConnection) -> anyhow::Result<()> {
    let products = vec![
        ("Axum Hoodie", "Warm hoodie for Rustaceans", 5500, 50, ProductStatus::Active),
        ("Ferris Mug", "Coffee tastes better with Ferris", 1200, 100, ProductStatus::Active),
        ("Rust Sticker Pack", "Decorate your laptop", 500, 8, ProductStatus::Active),
        ("E-book: Async Rust", "Learn async Rust patterns", 2500, 0, ProductStatus::Active),
        ("Crab Plushie", "Retired from the catalog", 1999, 12, ProductStatus::Inactive),
    ];

    let mut created = 0;
    for (name, description, cents, stock, status) in products {
        let exists = Products::find()
            .filter(Column::Name.eq(name))
            .one(orm)
            .await?
            .is_some();
        if exists {
            continue;
        }

        ProductActive {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            description: Set(description.to_string()),
            price: Set(Decimal::new(cents, 2)),
            stock: Set(stock),
            status: Set(status),
            image: Set(None),
            image_url: Set(String::new()),
            created_at: NotSet,
        }
        .insert(orm)
        .await?;
        created += 1;
    }

    println!("Seeded {created} products");
    Ok(())
}
