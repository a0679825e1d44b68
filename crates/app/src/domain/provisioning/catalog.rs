//! Demonstration catalog.

use rust_decimal::Decimal;

use crate::domain::products::records::SizeClass;

/// One catalog line: item number, name, price in cents, weight in hundredths, size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogEntry {
    pub item_number: &'static str,
    pub name: &'static str,
    pub price: u64,
    weight_hundredths: i64,
    pub size_class: SizeClass,
}

impl CatalogEntry {
    const fn new(
        item_number: &'static str,
        name: &'static str,
        price: u64,
        weight_hundredths: i64,
        size_class: SizeClass,
    ) -> Self {
        Self {
            item_number,
            name,
            price,
            weight_hundredths,
            size_class,
        }
    }

    #[must_use]
    pub fn weight(&self) -> Decimal {
        Decimal::new(self.weight_hundredths, 2)
    }
}

/// Seeded orders only draw from this many leading catalog entries.
pub const ORDERABLE_PRODUCTS: usize = 15;

pub const CATALOG: [CatalogEntry; 25] = [
    CatalogEntry::new("ITM-001", "Wireless Mouse", 2799, 25, SizeClass::Small),
    CatalogEntry::new("ITM-002", "Keyboard", 5299, 150, SizeClass::Medium),
    CatalogEntry::new("ITM-003", "Monitor", 21599, 1250, SizeClass::Large),
    CatalogEntry::new("ITM-004", "HDMI Cable", 1499, 30, SizeClass::Small),
    CatalogEntry::new("ITM-005", "USB Cable", 999, 20, SizeClass::Small),
    CatalogEntry::new("ITM-006", "Webcam", 7799, 80, SizeClass::Small),
    CatalogEntry::new("ITM-007", "USB Hub", 2999, 40, SizeClass::Small),
    CatalogEntry::new("ITM-008", "Headphones", 5499, 60, SizeClass::Medium),
    CatalogEntry::new("ITM-009", "Mouse Pad", 1299, 30, SizeClass::Small),
    CatalogEntry::new("ITM-010", "Laptop Stand", 3499, 200, SizeClass::Medium),
    CatalogEntry::new("ITM-011", "External SSD", 9999, 50, SizeClass::Small),
    CatalogEntry::new("ITM-012", "Phone Charger", 2199, 30, SizeClass::Small),
    CatalogEntry::new("ITM-013", "Desk Lamp", 4299, 180, SizeClass::Medium),
    CatalogEntry::new("ITM-014", "Cable Organizer", 1499, 20, SizeClass::Small),
    CatalogEntry::new("ITM-015", "Laptop Bag", 5499, 120, SizeClass::Medium),
    CatalogEntry::new("ITM-016", "Wireless Keyboard", 6499, 130, SizeClass::Medium),
    CatalogEntry::new("ITM-017", "Gaming Mouse", 4999, 30, SizeClass::Small),
    CatalogEntry::new("ITM-018", "USB Microphone", 8999, 150, SizeClass::Medium),
    CatalogEntry::new("ITM-019", "Monitor Arm", 12999, 500, SizeClass::Large),
    CatalogEntry::new("ITM-020", "Ethernet Cable", 1299, 40, SizeClass::Small),
    CatalogEntry::new("ITM-021", "Laptop Cooling Pad", 3499, 100, SizeClass::Medium),
    CatalogEntry::new("ITM-022", "Wireless Charger", 2999, 50, SizeClass::Small),
    CatalogEntry::new("ITM-023", "Bluetooth Speaker", 4499, 80, SizeClass::Small),
    CatalogEntry::new("ITM-024", "Drawing Tablet", 7999, 120, SizeClass::Medium),
    CatalogEntry::new("ITM-025", "Document Scanner", 14999, 350, SizeClass::Medium),
];
