//! Seed plan generation.
//!
//! The plan is a pure function of its config and reference time: the same seed always
//! yields the same products, units, customers, and orders, identifiers included.

use jiff::{Timestamp, ToSpan};
use rand::{Rng, SeedableRng, rngs::StdRng};
use rustc_hash::FxHashMap;

use crate::{
    domain::{
        inventory::data::{NewInventoryUnit, serial_number},
        orders::{
            data::{NewLineItem, NewOrder},
            records::{OrderStatus, OrderUuid, UserUuid},
        },
        products::{data::NewProduct, records::ProductUuid},
        provisioning::{
            catalog::{CATALOG, ORDERABLE_PRODUCTS},
            errors::ProvisionError,
        },
    },
    uuids::TypedUuid,
};

const DEFAULT_SEED: u64 = 42;
const DEFAULT_UNITS_PER_PRODUCT: u32 = 100;

/// Order history per demo customer: days before `now` and status.
const FIRST_CUSTOMER_ORDERS: [(i64, OrderStatus); 10] = [
    (55, OrderStatus::Delivered),
    (48, OrderStatus::Delivered),
    (41, OrderStatus::Returned),
    (35, OrderStatus::Delivered),
    (28, OrderStatus::Delivered),
    (21, OrderStatus::Delivered),
    (14, OrderStatus::Delivered),
    (10, OrderStatus::Delivered),
    (6, OrderStatus::Shipped),
    (2, OrderStatus::Processing),
];

const SECOND_CUSTOMER_ORDERS: [(i64, OrderStatus); 10] = [
    (52, OrderStatus::Delivered),
    (45, OrderStatus::Delivered),
    (38, OrderStatus::Delivered),
    (32, OrderStatus::Delivered),
    (25, OrderStatus::Delivered),
    (19, OrderStatus::Delivered),
    (13, OrderStatus::Delivered),
    (11, OrderStatus::Delivered),
    (5, OrderStatus::Shipped),
    (1, OrderStatus::Processing),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProvisionConfig {
    pub seed: u64,
    pub units_per_product: u32,
    /// How many catalog entries to create, from the start of the catalog.
    pub products: usize,
}

impl Default for ProvisionConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            units_per_product: DEFAULT_UNITS_PER_PRODUCT,
            products: CATALOG.len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeedProduct {
    pub product: NewProduct,
    pub units: Vec<NewInventoryUnit>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedCustomer {
    pub uuid: UserUuid,
    pub name: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeedPlan {
    pub products: Vec<SeedProduct>,
    pub customers: Vec<SeedCustomer>,
    pub orders: Vec<NewOrder>,
}

fn seeded_uuid<T>(rng: &mut StdRng) -> TypedUuid<T> {
    TypedUuid::from_random_bytes(rng.r#gen())
}

impl SeedPlan {
    /// Build the plan for `config`, dating orders relative to `now`.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionError::InvalidConfig`] when the config asks for no products or
    /// more than the catalog holds, or when the seeded open orders need more units of a
    /// product than `units_per_product` provides. Returns [`ProvisionError::Timestamp`] if a
    /// seeded date falls outside the supported range.
    pub fn generate(config: ProvisionConfig, now: Timestamp) -> Result<Self, ProvisionError> {
        if config.products == 0 || config.products > CATALOG.len() {
            return Err(ProvisionError::InvalidConfig(format!(
                "products must be between 1 and {}",
                CATALOG.len()
            )));
        }

        let mut rng = StdRng::seed_from_u64(config.seed);

        let products: Vec<SeedProduct> = CATALOG
            .iter()
            .take(config.products)
            .map(|entry| SeedProduct {
                product: NewProduct {
                    uuid: seeded_uuid(&mut rng),
                    item_number: entry.item_number.to_string(),
                    name: entry.name.to_string(),
                    price: entry.price,
                    weight: entry.weight(),
                    size_class: entry.size_class,
                },
                units: (1..=config.units_per_product)
                    .map(|sequence| NewInventoryUnit {
                        uuid: seeded_uuid(&mut rng),
                        serial_number: serial_number(entry.item_number, sequence),
                    })
                    .collect(),
            })
            .collect();

        let customers = vec![
            SeedCustomer {
                uuid: seeded_uuid(&mut rng),
                name: "Mateo Gomez",
            },
            SeedCustomer {
                uuid: seeded_uuid(&mut rng),
                name: "Megan Bowen",
            },
        ];

        let orderable: Vec<&NewProduct> = products
            .iter()
            .take(ORDERABLE_PRODUCTS)
            .map(|seed| &seed.product)
            .collect();

        let histories = customers
            .iter()
            .zip([FIRST_CUSTOMER_ORDERS, SECOND_CUSTOMER_ORDERS]);

        let mut orders = Vec::new();

        for (customer, history) in histories {
            for (days_ago, status) in history {
                orders.push(seed_order(
                    &mut rng,
                    &orderable,
                    customer.uuid,
                    now.checked_sub((days_ago * 24).hours())?,
                    status,
                )?);
            }
        }

        let plan = Self {
            products,
            customers,
            orders,
        };

        plan.check_stock_covers_orders()?;

        Ok(plan)
    }

    /// Units each product must have for every allocating order to reserve its lines.
    #[must_use]
    pub fn allocation_demand(&self) -> FxHashMap<ProductUuid, u64> {
        let mut demand: FxHashMap<ProductUuid, u64> = FxHashMap::default();

        for order in self.orders.iter().filter(|order| order.status.allocates_inventory()) {
            for item in &order.items {
                if let Some(product) = item.product_uuid {
                    *demand.entry(product).or_default() += u64::from(item.quantity);
                }
            }
        }

        demand
    }

    // Seeded orders are placed after the catalog is committed; a shortfall there would
    // leave a catalog without orders that the populated-catalog guard never revisits.
    fn check_stock_covers_orders(&self) -> Result<(), ProvisionError> {
        let demand = self.allocation_demand();

        for seed in &self.products {
            let needed = demand.get(&seed.product.uuid).copied().unwrap_or_default();
            let stocked = u64::try_from(seed.units.len()).unwrap_or(u64::MAX);

            if needed > stocked {
                return Err(ProvisionError::InvalidConfig(format!(
                    "units_per_product {stocked} is too low: seeded orders need {needed} units of {}",
                    seed.product.item_number
                )));
            }
        }

        Ok(())
    }

    /// Units across all products.
    #[must_use]
    pub fn unit_count(&self) -> usize {
        self.products.iter().map(|seed| seed.units.len()).sum()
    }
}

fn seed_order(
    rng: &mut StdRng,
    orderable: &[&NewProduct],
    user_uuid: UserUuid,
    ordered_at: Timestamp,
    status: OrderStatus,
) -> Result<NewOrder, ProvisionError> {
    let uuid: OrderUuid = seeded_uuid(rng);
    let line_count = rng.gen_range(1..=3);
    let mut items = Vec::with_capacity(line_count);

    for _ in 0..line_count {
        let Some(product) = orderable.get(rng.gen_range(0..orderable.len())) else {
            continue;
        };

        items.push(NewLineItem {
            uuid: seeded_uuid(rng),
            product_uuid: Some(product.uuid),
            product_name: product.name.clone(),
            quantity: rng.gen_range(1..=3),
            price: product.price,
        });
    }

    let shipped_at = if matches!(
        status,
        OrderStatus::Shipped | OrderStatus::Delivered | OrderStatus::Returned
    ) {
        Some(ordered_at.checked_add((rng.gen_range(1..=2_i64) * 24).hours())?)
    } else {
        None
    };

    let delivered_at = if matches!(status, OrderStatus::Delivered | OrderStatus::Returned) {
        Some(ordered_at.checked_add((rng.gen_range(5..=9_i64) * 24).hours())?)
    } else {
        None
    };

    Ok(NewOrder {
        uuid,
        user_uuid,
        ordered_at,
        status,
        shipped_at,
        delivered_at,
        items,
    })
}
