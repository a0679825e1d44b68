//! Orders Repository

use jiff::Timestamp;
use jiff_sqlx::Timestamp as SqlxTimestamp;
use rustc_hash::FxHashMap;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query_as, query_scalar};
use uuid::Uuid;

use crate::{
    database::{encode_amount, encode_quantity, try_get_amount, try_get_quantity},
    domain::{
        orders::{
            data::{NewLineItem, NewOrder},
            records::{LineItemRecord, LineItemUuid, OrderRecord, OrderStatus, OrderUuid, UserUuid},
        },
        products::records::ProductUuid,
    },
};

const CREATE_ORDER_SQL: &str = include_str!("sql/create_order.sql");
const CREATE_LINE_ITEM_SQL: &str = include_str!("sql/create_line_item.sql");
const GET_ORDER_SQL: &str = include_str!("sql/get_order.sql");
const LOCK_ORDER_SQL: &str = include_str!("sql/lock_order.sql");
const ORDER_EXISTS_SQL: &str = include_str!("sql/order_exists.sql");
const LIST_ORDERS_BY_USER_SQL: &str = include_str!("sql/list_orders_by_user.sql");
const LIST_LINE_ITEMS_SQL: &str = include_str!("sql/list_line_items.sql");
const UPDATE_STATUS_SQL: &str = include_str!("sql/update_status.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgOrdersRepository;

impl PgOrdersRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    /// Insert the order row. Line items are inserted separately.
    pub(crate) async fn create_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: &NewOrder,
        total: u64,
    ) -> Result<OrderRecord, sqlx::Error> {
        query_as::<Postgres, OrderRecord>(CREATE_ORDER_SQL)
            .bind(order.uuid.into_uuid())
            .bind(order.user_uuid.into_uuid())
            .bind(SqlxTimestamp::from(order.ordered_at))
            .bind(order.status.as_str())
            .bind(encode_amount(total, "total")?)
            .bind(order.shipped_at.map(SqlxTimestamp::from))
            .bind(order.delivered_at.map(SqlxTimestamp::from))
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn create_line_item(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        position: u32,
        item: &NewLineItem,
    ) -> Result<LineItemRecord, sqlx::Error> {
        query_as::<Postgres, LineItemRecord>(CREATE_LINE_ITEM_SQL)
            .bind(item.uuid.into_uuid())
            .bind(order.into_uuid())
            .bind(encode_quantity(position, "position")?)
            .bind(item.product_uuid.map(ProductUuid::into_uuid))
            .bind(item.product_name.as_str())
            .bind(encode_quantity(item.quantity, "quantity")?)
            .bind(encode_amount(item.price, "price")?)
            .fetch_one(&mut **tx)
            .await
    }

    /// Fetch an order with its line items.
    pub(crate) async fn get_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
    ) -> Result<OrderRecord, sqlx::Error> {
        let order = query_as::<Postgres, OrderRecord>(GET_ORDER_SQL)
            .bind(order.into_uuid())
            .fetch_one(&mut **tx)
            .await?;

        self.with_items(tx, order).await
    }

    pub(crate) async fn order_exists(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
    ) -> Result<bool, sqlx::Error> {
        query_scalar(ORDER_EXISTS_SQL)
            .bind(order.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    /// Fetch an order with its line items, holding the order row lock until the
    /// transaction ends.
    pub(crate) async fn lock_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
    ) -> Result<OrderRecord, sqlx::Error> {
        let order = query_as::<Postgres, OrderRecord>(LOCK_ORDER_SQL)
            .bind(order.into_uuid())
            .fetch_one(&mut **tx)
            .await?;

        self.with_items(tx, order).await
    }

    pub(crate) async fn list_orders_by_user(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user: UserUuid,
    ) -> Result<Vec<OrderRecord>, sqlx::Error> {
        let mut orders = query_as::<Postgres, OrderRecord>(LIST_ORDERS_BY_USER_SQL)
            .bind(user.into_uuid())
            .fetch_all(&mut **tx)
            .await?;

        let order_uuids: Vec<Uuid> = orders.iter().map(|order| order.uuid.into_uuid()).collect();

        let mut items_by_order: FxHashMap<OrderUuid, Vec<LineItemRecord>> = FxHashMap::default();

        for item in self.list_line_items(tx, &order_uuids).await? {
            items_by_order.entry(item.order_uuid).or_default().push(item);
        }

        for order in &mut orders {
            order.items = items_by_order.remove(&order.uuid).unwrap_or_default();
        }

        Ok(orders)
    }

    /// Set the order status, stamping fulfilment timestamps when given.
    pub(crate) async fn update_status(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        status: OrderStatus,
        shipped_at: Option<Timestamp>,
        delivered_at: Option<Timestamp>,
    ) -> Result<OrderRecord, sqlx::Error> {
        let updated = query_as::<Postgres, OrderRecord>(UPDATE_STATUS_SQL)
            .bind(order.into_uuid())
            .bind(status.as_str())
            .bind(shipped_at.map(SqlxTimestamp::from))
            .bind(delivered_at.map(SqlxTimestamp::from))
            .fetch_one(&mut **tx)
            .await?;

        self.with_items(tx, updated).await
    }

    async fn list_line_items(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        orders: &[Uuid],
    ) -> Result<Vec<LineItemRecord>, sqlx::Error> {
        query_as::<Postgres, LineItemRecord>(LIST_LINE_ITEMS_SQL)
            .bind(orders)
            .fetch_all(&mut **tx)
            .await
    }

    async fn with_items(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        mut order: OrderRecord,
    ) -> Result<OrderRecord, sqlx::Error> {
        order.items = self
            .list_line_items(tx, &[order.uuid.into_uuid()])
            .await?;

        Ok(order)
    }
}

impl<'r> FromRow<'r, PgRow> for OrderRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let status: String = row.try_get("status")?;

        let status = status
            .parse::<OrderStatus>()
            .map_err(|e| sqlx::Error::ColumnDecode {
                index: "status".to_string(),
                source: Box::new(e),
            })?;

        Ok(Self {
            uuid: OrderUuid::from_uuid(row.try_get("uuid")?),
            user_uuid: UserUuid::from_uuid(row.try_get("user_uuid")?),
            ordered_at: row.try_get::<SqlxTimestamp, _>("ordered_at")?.to_jiff(),
            status,
            total: try_get_amount(row, "total")?,
            shipped_at: row
                .try_get::<Option<SqlxTimestamp>, _>("shipped_at")?
                .map(SqlxTimestamp::to_jiff),
            delivered_at: row
                .try_get::<Option<SqlxTimestamp>, _>("delivered_at")?
                .map(SqlxTimestamp::to_jiff),
            items: Vec::new(),
        })
    }
}

impl<'r> FromRow<'r, PgRow> for LineItemRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: LineItemUuid::from_uuid(row.try_get("uuid")?),
            order_uuid: OrderUuid::from_uuid(row.try_get("order_uuid")?),
            position: try_get_quantity(row, "position")?,
            product_uuid: row
                .try_get::<Option<Uuid>, _>("product_uuid")?
                .map(ProductUuid::from_uuid),
            product_name: row.try_get("product_name")?,
            quantity: try_get_quantity(row, "quantity")?,
            price: try_get_amount(row, "price")?,
            returned_quantity: try_get_quantity(row, "returned_quantity")?,
        })
    }
}
