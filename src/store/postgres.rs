//! Postgres-backed record store.

use sqlx::query_as;

use crate::context::RequestContext;
use crate::models::IceCream;
use crate::store::db::Db;
use crate::store::{IceCreamStore, StoreError, TxWork};

pub struct PostgresIceCreamStore {
    db: Db,
}

impl PostgresIceCreamStore {
    pub fn new(db: Db) -> Self {
        PostgresIceCreamStore { db }
    }
}

const SELECT_COLUMNS: &str = r#"
    SELECT name,
    image_open,
    image_closed,
    story,
    description,
    sourcing_values,
    ingredients,
    allergy_info,
    dietary_certification,
    product_id
    FROM ice_cream
"#;

#[async_trait::async_trait]
impl IceCreamStore for PostgresIceCreamStore {
    async fn create(&self, ctx: &RequestContext, ice_cream: IceCream) -> Result<(), StoreError> {
        let query = sqlx::query(
            r#"
            INSERT INTO ice_cream (name,
            image_open,
            image_closed,
            story,
            description,
            sourcing_values,
            ingredients,
            allergy_info,
            dietary_certification,
            product_id)
            VALUES($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(&ice_cream.name)
        .bind(&ice_cream.image_open)
        .bind(&ice_cream.image_closed)
        .bind(&ice_cream.story)
        .bind(&ice_cream.description)
        .bind(&ice_cream.sourcing_values)
        .bind(&ice_cream.ingredients)
        .bind(&ice_cream.allergy_info)
        .bind(&ice_cream.dietary_certification)
        .bind(&ice_cream.product_id);

        self.db.execute(ctx, query).await?;
        Ok(())
    }

    async fn get(&self, ctx: &RequestContext, name: &str) -> Result<Option<IceCream>, StoreError> {
        let sql = format!("{} WHERE name = $1", SELECT_COLUMNS);
        let query = query_as::<_, IceCream>(&sql).bind(name);
        self.db.fetch_optional(ctx, query).await
    }

    async fn get_all(&self, ctx: &RequestContext) -> Result<Vec<IceCream>, StoreError> {
        let sql = format!("{} ORDER BY name", SELECT_COLUMNS);
        let query = query_as::<_, IceCream>(&sql);
        self.db.fetch_all(ctx, query).await
    }

    async fn update(&self, ctx: &RequestContext, ice_cream: IceCream) -> Result<(), StoreError> {
        let query = sqlx::query(
            r#"
            UPDATE ice_cream
            SET
            image_open = COALESCE(NULLIF($2,''), image_open),
            image_closed = COALESCE(NULLIF($3, ''), image_closed),
            story = COALESCE(NULLIF($4,''), story),
            description = COALESCE(NULLIF($5,''), description),
            sourcing_values = COALESCE($6, sourcing_values),
            ingredients = COALESCE($7, ingredients),
            allergy_info = COALESCE(NULLIF($8,''), allergy_info),
            dietary_certification = COALESCE(NULLIF($9,''), dietary_certification),
            product_id = COALESCE(NULLIF($10,''), product_id)
            WHERE name = $1
            "#,
        )
        .bind(&ice_cream.name)
        .bind(&ice_cream.image_open)
        .bind(&ice_cream.image_closed)
        .bind(&ice_cream.story)
        .bind(&ice_cream.description)
        .bind(&ice_cream.sourcing_values)
        .bind(&ice_cream.ingredients)
        .bind(&ice_cream.allergy_info)
        .bind(&ice_cream.dietary_certification)
        .bind(&ice_cream.product_id);

        self.db.execute(ctx, query).await?;
        Ok(())
    }

    async fn delete(&self, ctx: &RequestContext, name: &str) -> Result<(), StoreError> {
        let query = sqlx::query("DELETE FROM ice_cream WHERE name = $1").bind(name);
        self.db.execute(ctx, query).await?;
        Ok(())
    }

    async fn with_transaction(&self, ctx: &RequestContext, work: TxWork) -> Result<(), StoreError> {
        self.db.with_transaction(ctx, work).await
    }
}
