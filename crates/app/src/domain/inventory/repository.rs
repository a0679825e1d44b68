//! Inventory Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query_as, query_scalar};
use uuid::Uuid;

use crate::{
    database::{try_get_amount, try_get_count},
    domain::{
        inventory::{
            data::NewInventoryUnit,
            records::{InventorySummary, InventoryUnitRecord, InventoryUnitUuid, UnitStatus},
        },
        products::records::{ProductUuid, SizeClass},
    },
};

const LOCK_PRODUCT_SQL: &str = include_str!("sql/lock_product.sql");
const SELECT_IN_STOCK_UNITS_SQL: &str = include_str!("sql/select_in_stock_units.sql");
const SELECT_RESERVED_UNITS_SQL: &str = include_str!("sql/select_reserved_units.sql");
const RESERVE_UNITS_SQL: &str = include_str!("sql/reserve_units.sql");
const RELEASE_UNITS_SQL: &str = include_str!("sql/release_units.sql");
const COUNT_AVAILABLE_UNITS_SQL: &str = include_str!("sql/count_available_units.sql");
const CREATE_UNITS_SQL: &str = include_str!("sql/create_units.sql");
const LIST_UNITS_SQL: &str = include_str!("sql/list_units.sql");
const INVENTORY_SUMMARY_SQL: &str = include_str!("sql/inventory_summary.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgInventoryRepository;

impl PgInventoryRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    /// Take the per-product lock that serialises reservations and releases.
    ///
    /// Returns `false` when the product does not exist.
    pub(crate) async fn lock_product(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: ProductUuid,
    ) -> Result<bool, sqlx::Error> {
        let locked: Option<Uuid> = query_scalar(LOCK_PRODUCT_SQL)
            .bind(product.into_uuid())
            .fetch_optional(&mut **tx)
            .await?;

        Ok(locked.is_some())
    }

    pub(crate) async fn select_in_stock_units(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: ProductUuid,
        limit: u32,
    ) -> Result<Vec<Uuid>, sqlx::Error> {
        query_scalar(SELECT_IN_STOCK_UNITS_SQL)
            .bind(product.into_uuid())
            .bind(i64::from(limit))
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn select_reserved_units(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: ProductUuid,
        limit: u32,
    ) -> Result<Vec<Uuid>, sqlx::Error> {
        query_scalar(SELECT_RESERVED_UNITS_SQL)
            .bind(product.into_uuid())
            .bind(i64::from(limit))
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn reserve_units(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        units: &[Uuid],
    ) -> Result<Vec<InventoryUnitRecord>, sqlx::Error> {
        let mut reserved = query_as::<Postgres, InventoryUnitRecord>(RESERVE_UNITS_SQL)
            .bind(units)
            .fetch_all(&mut **tx)
            .await?;

        reserved.sort_by_key(|unit| unit.sequence);

        Ok(reserved)
    }

    pub(crate) async fn release_units(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        units: &[Uuid],
    ) -> Result<Vec<InventoryUnitRecord>, sqlx::Error> {
        let mut released = query_as::<Postgres, InventoryUnitRecord>(RELEASE_UNITS_SQL)
            .bind(units)
            .fetch_all(&mut **tx)
            .await?;

        released.sort_by_key(|unit| unit.sequence);

        Ok(released)
    }

    pub(crate) async fn count_available_units(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: ProductUuid,
    ) -> Result<u64, sqlx::Error> {
        let available: i64 = query_scalar(COUNT_AVAILABLE_UNITS_SQL)
            .bind(product.into_uuid())
            .fetch_one(&mut **tx)
            .await?;

        u64::try_from(available).map_err(|e| sqlx::Error::ColumnDecode {
            index: "available".to_string(),
            source: Box::new(e),
        })
    }

    pub(crate) async fn create_units(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: ProductUuid,
        units: Vec<NewInventoryUnit>,
    ) -> Result<Vec<InventoryUnitRecord>, sqlx::Error> {
        let (uuids, serials): (Vec<Uuid>, Vec<String>) = units
            .into_iter()
            .map(|unit| (unit.uuid.into_uuid(), unit.serial_number))
            .unzip();

        let mut created = query_as::<Postgres, InventoryUnitRecord>(CREATE_UNITS_SQL)
            .bind(product.into_uuid())
            .bind(uuids)
            .bind(serials)
            .fetch_all(&mut **tx)
            .await?;

        created.sort_by_key(|unit| unit.sequence);

        Ok(created)
    }

    pub(crate) async fn list_units(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: ProductUuid,
    ) -> Result<Vec<InventoryUnitRecord>, sqlx::Error> {
        query_as::<Postgres, InventoryUnitRecord>(LIST_UNITS_SQL)
            .bind(product.into_uuid())
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn inventory_summary(
        &self,
        tx: &mut Transaction<'_, Postgres>,
    ) -> Result<Vec<InventorySummary>, sqlx::Error> {
        query_as::<Postgres, InventorySummary>(INVENTORY_SUMMARY_SQL)
            .fetch_all(&mut **tx)
            .await
    }
}

impl<'r> FromRow<'r, PgRow> for InventoryUnitRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let status: String = row.try_get("status")?;

        let status = status
            .parse::<UnitStatus>()
            .map_err(|e| sqlx::Error::ColumnDecode {
                index: "status".to_string(),
                source: Box::new(e),
            })?;

        Ok(Self {
            uuid: InventoryUnitUuid::from_uuid(row.try_get("uuid")?),
            sequence: try_get_count(row, "sequence")?,
            product_uuid: ProductUuid::from_uuid(row.try_get("product_uuid")?),
            serial_number: row.try_get("serial_number")?,
            status,
            has_return_history: row.try_get("has_return_history")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            last_status_change: row
                .try_get::<Option<SqlxTimestamp>, _>("last_status_change")?
                .map(SqlxTimestamp::to_jiff),
        })
    }
}

impl<'r> FromRow<'r, PgRow> for InventorySummary {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let size_class: String = row.try_get("size_class")?;

        let size_class = size_class
            .parse::<SizeClass>()
            .map_err(|e| sqlx::Error::ColumnDecode {
                index: "size_class".to_string(),
                source: Box::new(e),
            })?;

        Ok(Self {
            product_uuid: ProductUuid::from_uuid(row.try_get("product_uuid")?),
            item_number: row.try_get("item_number")?,
            name: row.try_get("name")?,
            price: try_get_amount(row, "price")?,
            weight: row.try_get("weight")?,
            size_class,
            total: try_get_count(row, "total")?,
            available: try_get_count(row, "available")?,
            reserved: try_get_count(row, "reserved")?,
            returned_items: try_get_count(row, "returned_items")?,
        })
    }
}
