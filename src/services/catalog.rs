use sea_orm::{
    prelude::DateTimeUtc,
    sea_query::{CaseStatement, Expr, LikeExpr, SimpleExpr},
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, FromQueryResult, JoinType, Order,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait, Select,
};
use serde::{Deserialize, Serialize};

use crate::entities::{category, product, product_image};
use crate::services::StoreError;

pub const LATEST_LIMIT: u64 = 8;
pub const RECOMMENDATION_LIMIT: u64 = 8;

/// Product with its category name joined in.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, FromQueryResult)]
pub struct ProductRow {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub image_url: Option<String>,
    pub category_id: Option<i32>,
    pub category_name: Option<String>,
    pub scale: Option<String>,
    pub material: Option<String>,
    pub manufacturer: Option<String>,
    pub stock_quantity: i32,
    pub is_in_stock: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: ProductRow,
    pub images: Vec<product_image::Model>,
}

/// Catalog filters; every present filter must match. Blank values count as absent.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductFilter {
    /// Category slug.
    pub category: Option<String>,
    pub search: Option<String>,
    pub material: Option<String>,
    pub scale: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Facets {
    pub materials: Vec<String>,
    pub scales: Vec<String>,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// `%search%` with LIKE wildcards in `search` escaped by `\`.
fn substring_pattern(search: &str) -> String {
    let mut pattern = String::with_capacity(search.len() + 2);
    pattern.push('%');
    for c in search.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn with_category_name() -> Select<product::Entity> {
    product::Entity::find()
        .join(JoinType::LeftJoin, product::Relation::Category.def())
        .column_as(category::Column::Name, "category_name")
}

pub async fn list_categories(db: &DatabaseConnection) -> Result<Vec<category::Model>, StoreError> {
    Ok(category::Entity::find()
        .order_by_asc(category::Column::Name)
        .all(db)
        .await?)
}

/// In-stock products matching `filter`, newest first.
pub async fn list_products(
    db: &DatabaseConnection,
    filter: &ProductFilter,
) -> Result<Vec<ProductRow>, StoreError> {
    let mut condition = Condition::all().add(product::Column::IsInStock.eq(true));

    //Filter zone
    if let Some(slug) = present(&filter.category) {
        condition = condition.add(category::Column::Slug.eq(slug));
    }
    if let Some(search) = present(&filter.search) {
        //LIKE is case-insensitive for ASCII in SQLite
        let pattern = substring_pattern(search);
        let like = || LikeExpr::new(pattern.clone()).escape('\\');
        condition = condition.add(
            Condition::any()
                .add(product::Column::Name.like(like()))
                .add(product::Column::Description.like(like())),
        );
    }
    if let Some(material) = present(&filter.material) {
        condition = condition.add(product::Column::Material.eq(material));
    }
    if let Some(scale) = present(&filter.scale) {
        condition = condition.add(product::Column::Scale.eq(scale));
    }

    Ok(with_category_name()
        .filter(condition)
        .order_by_desc(product::Column::CreatedAt)
        .order_by_desc(product::Column::Id)
        .into_model::<ProductRow>()
        .all(db)
        .await?)
}

pub async fn latest_products(db: &DatabaseConnection) -> Result<Vec<ProductRow>, StoreError> {
    Ok(with_category_name()
        .filter(product::Column::IsInStock.eq(true))
        .order_by_desc(product::Column::CreatedAt)
        .order_by_desc(product::Column::Id)
        .limit(LATEST_LIMIT)
        .into_model::<ProductRow>()
        .all(db)
        .await?)
}

/// Any product, in stock or not, with its images in display order.
pub async fn product_detail(db: &DatabaseConnection, id: i32) -> Result<ProductDetail, StoreError> {
    let product = with_category_name()
        .filter(product::Column::Id.eq(id))
        .into_model::<ProductRow>()
        .one(db)
        .await?
        .ok_or_else(|| StoreError::NotFound("Product not found".to_owned()))?;

    let images = product_image::Entity::find()
        .filter(product_image::Column::ProductId.eq(id))
        .order_by_asc(product_image::Column::DisplayOrder)
        .order_by_asc(product_image::Column::Id)
        .all(db)
        .await?;

    Ok(ProductDetail { product, images })
}

/// Up to eight other in-stock products sharing the category, scale or
/// material of `id`. Category matches rank first, then scale, then material;
/// order inside a bucket is random per call. Unknown ids yield an empty list.
pub async fn recommendations(
    db: &DatabaseConnection,
    id: i32,
) -> Result<Vec<ProductRow>, StoreError> {
    let Some(target) = product::Entity::find_by_id(id).one(db).await? else {
        return Ok(Vec::new());
    };

    //absent attributes never match anything, so they get no bucket
    let mut criteria: Vec<(SimpleExpr, i32)> = Vec::new();
    if let Some(category_id) = target.category_id {
        criteria.push((product::Column::CategoryId.eq(category_id), 1));
    }
    if let Some(scale) = target.scale {
        criteria.push((product::Column::Scale.eq(scale), 2));
    }
    if let Some(material) = target.material {
        criteria.push((product::Column::Material.eq(material), 3));
    }

    let mut criteria = criteria.into_iter();
    let Some((first, first_bucket)) = criteria.next() else {
        return Ok(Vec::new());
    };

    let mut similar = Condition::any().add(first.clone());
    let mut rank: CaseStatement = Expr::case(first, first_bucket);
    for (criterion, bucket) in criteria {
        similar = similar.add(criterion.clone());
        rank = rank.case(criterion, bucket);
    }
    //unreachable given `similar`, kept so every row gets a rank
    let rank: SimpleExpr = rank.finally(4).into();

    Ok(with_category_name()
        .filter(product::Column::Id.ne(id))
        .filter(product::Column::IsInStock.eq(true))
        .filter(similar)
        .order_by(rank, Order::Asc)
        .order_by(Expr::cust("RANDOM()"), Order::Asc)
        .limit(RECOMMENDATION_LIMIT)
        .into_model::<ProductRow>()
        .all(db)
        .await?)
}

/// Distinct materials and scales offered by in-stock products.
pub async fn facets(db: &DatabaseConnection) -> Result<Facets, StoreError> {
    let materials = product::Entity::find()
        .select_only()
        .column(product::Column::Material)
        .distinct()
        .filter(product::Column::IsInStock.eq(true))
        .filter(product::Column::Material.is_not_null())
        .order_by_asc(product::Column::Material)
        .into_tuple::<String>()
        .all(db)
        .await?;

    let scales = product::Entity::find()
        .select_only()
        .column(product::Column::Scale)
        .distinct()
        .filter(product::Column::IsInStock.eq(true))
        .filter(product::Column::Scale.is_not_null())
        .order_by_asc(product::Column::Scale)
        .into_tuple::<String>()
        .all(db)
        .await?;

    Ok(Facets { materials, scales })
}
