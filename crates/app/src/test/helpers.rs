//! Test Helpers

use jiff::{Timestamp, ToSpan};
use rust_decimal::Decimal;

use crate::{
    domain::{
        inventory::{
            InventoryService,
            data::{NewInventoryUnit, serial_number},
            records::InventoryUnitUuid,
        },
        orders::{
            OrdersService,
            data::{NewLineItem, NewOrder},
            records::{LineItemUuid, OrderRecord, OrderStatus, UserUuid},
        },
        products::{
            ProductsService,
            data::NewProduct,
            records::{ProductRecord, ProductUuid, SizeClass},
        },
    },
    test::TestContext,
};

type HelperResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

pub(crate) async fn create_product(
    ctx: &TestContext,
    item_number: &str,
    price: u64,
) -> HelperResult<ProductRecord> {
    let product = ctx
        .products
        .create_product(NewProduct {
            uuid: ProductUuid::new(),
            item_number: item_number.to_string(),
            name: format!("Product {item_number}"),
            price,
            weight: Decimal::new(150, 2),
            size_class: SizeClass::Small,
        })
        .await?;

    Ok(product)
}

/// Create a product with `units` in-stock units numbered from 1.
pub(crate) async fn stock_product(
    ctx: &TestContext,
    item_number: &str,
    price: u64,
    units: u32,
) -> HelperResult<ProductRecord> {
    let product = create_product(ctx, item_number, price).await?;

    let units = (1..=units)
        .map(|sequence| NewInventoryUnit {
            uuid: InventoryUnitUuid::new(),
            serial_number: serial_number(item_number, sequence),
        })
        .collect();

    ctx.inventory.add_units(product.uuid, units).await?;

    Ok(product)
}

pub(crate) fn line_for(product: &ProductRecord, quantity: u32) -> NewLineItem {
    NewLineItem {
        uuid: LineItemUuid::new(),
        product_uuid: Some(product.uuid),
        product_name: product.name.clone(),
        quantity,
        price: product.price,
    }
}

/// A line with no catalog product behind it.
pub(crate) fn legacy_line(quantity: u32, price: u64) -> NewLineItem {
    NewLineItem {
        uuid: LineItemUuid::new(),
        product_uuid: None,
        product_name: "Discontinued Cable".to_string(),
        quantity,
        price,
    }
}

/// Place an order that is already delivered, reserving its units on the way.
pub(crate) async fn delivered_order(
    ctx: &TestContext,
    items: Vec<NewLineItem>,
) -> HelperResult<OrderRecord> {
    let ordered_at = Timestamp::now().checked_sub(240.hours())?;

    let mut order = NewOrder::processing(UserUuid::new(), items);

    order.ordered_at = ordered_at;
    order.status = OrderStatus::Delivered;
    order.shipped_at = Some(ordered_at.checked_add(24.hours())?);
    order.delivered_at = Some(ordered_at.checked_add(120.hours())?);

    Ok(ctx.orders.create_order(order).await?)
}
