use async_trait::async_trait;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "order_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub unit_price: Decimal,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub subtotal: Decimal,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::orders::Entity",
        from = "Column::OrderId",
        to = "super::orders::Column::Id",
        on_delete = "Cascade"
    )]
    Orders,
    #[sea_orm(
        belongs_to = "super::products::Entity",
        from = "Column::ProductId",
        to = "super::products::Column::Id",
        on_delete = "Restrict"
    )]
    Products,
}

impl Related<super::orders::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Orders.def()
    }
}

impl Related<super::products::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Products.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C: ConnectionTrait>(self, _db: &C, _insert: bool) -> Result<Self, DbErr> {
        self.with_subtotal()
    }
}

impl ActiveModel {
    /// `subtotal` is always `quantity * unit_price`.
    pub fn with_subtotal(self) -> Result<Self, DbErr> {
        let mut active_model = self;
        let quantity = present(&active_model.quantity);
        let unit_price = present(&active_model.unit_price);
        if let (Some(quantity), Some(unit_price)) = (quantity, unit_price) {
            if quantity < 1 {
                return Err(DbErr::Custom("order item quantity must be at least 1".into()));
            }
            active_model.subtotal = Set(line_subtotal(quantity, unit_price));
        }
        Ok(active_model)
    }
}

fn present<V: Copy + Into<Value>>(value: &ActiveValue<V>) -> Option<V> {
    match value {
        ActiveValue::Set(v) | ActiveValue::Unchanged(v) => Some(*v),
        ActiveValue::NotSet => None,
    }
}

pub fn line_subtotal(quantity: i32, unit_price: Decimal) -> Decimal {
    unit_price * Decimal::from(quantity)
}

#[cfg(test)]
mod tests {
    use sea_orm::ActiveValue::NotSet;

    use super::*;

    fn item(quantity: i32, cents: i64) -> ActiveModel {
        ActiveModel {
            id: Set(Uuid::new_v4()),
            order_id: Set(Uuid::new_v4()),
            product_id: Set(Uuid::new_v4()),
            quantity: Set(quantity),
            unit_price: Set(Decimal::new(cents, 2)),
            subtotal: NotSet,
        }
    }

    #[test]
    fn subtotal_is_recomputed_before_save() {
        let saved = item(3, 1250).with_subtotal().unwrap();
        assert_eq!(saved.subtotal.unwrap(), Decimal::new(3750, 2));
    }

    #[test]
    fn zero_quantity_is_rejected() {
        assert!(item(0, 1250).with_subtotal().is_err());
    }

    #[test]
    fn partial_updates_keep_the_stored_subtotal() {
        let mut partial = item(2, 500);
        partial.quantity = NotSet;
        assert!(matches!(partial.with_subtotal().unwrap().subtotal, NotSet));
    }
}
