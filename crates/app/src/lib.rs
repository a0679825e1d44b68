//! Order fulfilment and returns ledger: serialised inventory, orders, and refunds backed by
//! `PostgreSQL`.

pub mod config;
pub mod context;
pub mod database;
pub mod domain;
pub mod notifications;
pub mod observability;
pub mod retry;
pub mod uuids;

#[cfg(test)]
mod test;
