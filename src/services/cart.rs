//! Session scoped cart persistence.
//!
//! Every operation is filtered by the caller's session id, so one session can
//! neither see nor mutate another session's rows. Item level misses in
//! `set_quantity` and `remove_item` are silent no-ops.

use chrono::Utc;
use sea_orm::{
    prelude::DateTimeUtc,
    sea_query::{Expr, OnConflict},
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, FromQueryResult, JoinType, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait, Set,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::entities::{cart_item, cart_item::Entity as CartItemEntity, product};
use crate::services::StoreError;

/// Upper bound for a single line's quantity.
pub const MAX_QUANTITY: i32 = 10_000;

#[derive(Debug, FromQueryResult)]
struct CartLineRow {
    id: i32,
    session_id: String,
    product_id: i32,
    quantity: i32,
    name: String,
    price: f64,
    image_url: Option<String>,
    stock_quantity: i32,
    created_at: DateTimeUtc,
    updated_at: DateTimeUtc,
}

/// A cart row joined with the live product data it points at.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub id: i32,
    pub session_id: String,
    pub product_id: i32,
    pub quantity: i32,
    pub name: String,
    pub price: f64,
    pub image_url: Option<String>,
    pub stock_quantity: i32,
    pub total_price: f64,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl From<CartLineRow> for CartLine {
    fn from(row: CartLineRow) -> CartLine {
        CartLine {
            id: row.id,
            session_id: row.session_id,
            product_id: row.product_id,
            quantity: row.quantity,
            name: row.name,
            total_price: row.quantity as f64 * row.price,
            price: row.price,
            image_url: row.image_url,
            stock_quantity: row.stock_quantity,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Derived view of a session's cart. `count` is the number of lines, not units.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    pub items: Vec<CartLine>,
    pub total: f64,
    pub count: usize,
}

impl Cart {
    pub fn from_lines(items: Vec<CartLine>) -> Cart {
        let total: f64 = items.iter().map(|item| item.total_price).sum();
        let count = items.len();
        Cart { items, total, count }
    }

    /// Sum of quantities across all lines.
    pub fn units(&self) -> i64 {
        self.items.iter().map(|item| item.quantity as i64).sum()
    }
}

/// Adds `quantity` units of a product, merging into the session's existing
/// line for that product when there is one.
pub async fn add_item(
    db: &DatabaseConnection,
    session_id: &str,
    product_id: i32,
    quantity: i32,
) -> Result<(), StoreError> {
    if quantity < 1 {
        return Err(StoreError::Validation(
            "Quantity should be greater than 0".to_owned(),
        ));
    }
    if quantity > MAX_QUANTITY {
        return Err(too_many());
    }

    if product::Entity::find_by_id(product_id).one(db).await?.is_none() {
        return Err(StoreError::NotFound(format!(
            "No product with {} id was found",
            product_id
        )));
    }

    let now = Utc::now();
    let new_line = cart_item::ActiveModel {
        session_id: Set(session_id.to_owned()),
        product_id: Set(product_id),
        quantity: Set(quantity),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    //one upsert statement, so concurrent adds for the same line accumulate.
    //the WHERE guard leaves the row untouched when the sum would pass the cap
    let inserted = CartItemEntity::insert(new_line)
        .on_conflict(
            OnConflict::columns([cart_item::Column::SessionId, cart_item::Column::ProductId])
                .value(
                    cart_item::Column::Quantity,
                    Expr::col(cart_item::Column::Quantity).add(quantity),
                )
                .value(cart_item::Column::UpdatedAt, now)
                .action_and_where(
                    Expr::col((CartItemEntity, cart_item::Column::Quantity))
                        .lte(MAX_QUANTITY - quantity),
                )
                .to_owned(),
        )
        .exec_without_returning(db)
        .await;

    match inserted {
        Ok(0) | Err(DbErr::RecordNotInserted) => return Err(too_many()),
        Ok(_) => {}
        Err(err) => return Err(err.into()),
    }

    debug!(session_id, product_id, quantity, "Added to cart");
    Ok(())
}

/// Replaces a line's quantity; 0 deletes the line.
pub async fn set_quantity(
    db: &DatabaseConnection,
    session_id: &str,
    item_id: i32,
    quantity: i32,
) -> Result<(), StoreError> {
    if quantity < 0 {
        return Err(StoreError::Validation(
            "Quantity should not be negative".to_owned(),
        ));
    }
    if quantity > MAX_QUANTITY {
        return Err(too_many());
    }
    if quantity == 0 {
        return remove_item(db, session_id, item_id).await;
    }

    let result = CartItemEntity::update_many()
        .col_expr(cart_item::Column::Quantity, Expr::value(quantity))
        .col_expr(cart_item::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(cart_item::Column::Id.eq(item_id))
        .filter(cart_item::Column::SessionId.eq(session_id))
        .exec(db)
        .await?;

    debug!(session_id, item_id, quantity, rows = result.rows_affected, "Updated cart line");
    Ok(())
}

pub async fn remove_item(
    db: &DatabaseConnection,
    session_id: &str,
    item_id: i32,
) -> Result<(), StoreError> {
    let result = CartItemEntity::delete_many()
        .filter(cart_item::Column::Id.eq(item_id))
        .filter(cart_item::Column::SessionId.eq(session_id))
        .exec(db)
        .await?;

    debug!(session_id, item_id, rows = result.rows_affected, "Removed cart line");
    Ok(())
}

fn too_many() -> StoreError {
    StoreError::Validation(format!("Quantity should not exceed {}", MAX_QUANTITY))
}

/// Most recently added line first.
pub async fn list(db: &DatabaseConnection, session_id: &str) -> Result<Cart, StoreError> {
    let lines = CartItemEntity::find()
        .filter(cart_item::Column::SessionId.eq(session_id))
        .join(JoinType::InnerJoin, cart_item::Relation::Product.def())
        .column_as(product::Column::Name, "name")
        .column_as(product::Column::Price, "price")
        .column_as(product::Column::ImageUrl, "image_url")
        .column_as(product::Column::StockQuantity, "stock_quantity")
        .order_by_desc(cart_item::Column::CreatedAt)
        .order_by_desc(cart_item::Column::Id)
        .into_model::<CartLineRow>()
        .all(db)
        .await?;

    Ok(Cart::from_lines(lines.into_iter().map(CartLine::from).collect()))
}
