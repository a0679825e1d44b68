//! Returns Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query_as, query_scalar};

use crate::{
    database::{encode_amount, encode_quantity, try_get_amount, try_get_quantity},
    domain::{
        orders::records::{LineItemUuid, OrderUuid},
        returns::{
            records::{ReturnRecord, ReturnRecordUuid},
            validation::PlannedReturn,
        },
    },
};

const CREATE_RETURN_RECORD_SQL: &str = include_str!("sql/create_return_record.sql");
const INCREMENT_RETURNED_QUANTITY_SQL: &str = include_str!("sql/increment_returned_quantity.sql");
const LIST_RETURNS_FOR_ORDER_SQL: &str = include_str!("sql/list_returns_for_order.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgReturnsRepository;

impl PgReturnsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn create_return_record(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        entry: &PlannedReturn,
    ) -> Result<ReturnRecord, sqlx::Error> {
        query_as::<Postgres, ReturnRecord>(CREATE_RETURN_RECORD_SQL)
            .bind(ReturnRecordUuid::new().into_uuid())
            .bind(entry.line_item.into_uuid())
            .bind(encode_quantity(entry.quantity, "quantity")?)
            .bind(entry.reason.as_str())
            .bind(encode_amount(entry.refund_amount, "refund_amount")?)
            .fetch_one(&mut **tx)
            .await
    }

    /// Add `quantity` to the line's returned quantity.
    ///
    /// Returns the new returned quantity, or `None` when the increment would exceed the
    /// purchased quantity and nothing was written.
    pub(crate) async fn increment_returned_quantity(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        line_item: LineItemUuid,
        quantity: u32,
    ) -> Result<Option<u32>, sqlx::Error> {
        let returned: Option<i32> = query_scalar(INCREMENT_RETURNED_QUANTITY_SQL)
            .bind(line_item.into_uuid())
            .bind(encode_quantity(quantity, "quantity")?)
            .fetch_optional(&mut **tx)
            .await?;

        returned
            .map(|returned| {
                u32::try_from(returned).map_err(|e| sqlx::Error::ColumnDecode {
                    index: "returned_quantity".to_string(),
                    source: Box::new(e),
                })
            })
            .transpose()
    }

    pub(crate) async fn list_returns_for_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
    ) -> Result<Vec<ReturnRecord>, sqlx::Error> {
        query_as::<Postgres, ReturnRecord>(LIST_RETURNS_FOR_ORDER_SQL)
            .bind(order.into_uuid())
            .fetch_all(&mut **tx)
            .await
    }
}

impl<'r> FromRow<'r, PgRow> for ReturnRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: ReturnRecordUuid::from_uuid(row.try_get("uuid")?),
            line_item_uuid: LineItemUuid::from_uuid(row.try_get("line_item_uuid")?),
            quantity: try_get_quantity(row, "quantity")?,
            reason: row.try_get("reason")?,
            refund_amount: try_get_amount(row, "refund_amount")?,
            returned_at: row.try_get::<SqlxTimestamp, _>("returned_at")?.to_jiff(),
        })
    }
}
