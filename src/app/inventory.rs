use crate::domain::model::{InventoryItem, ItemStatus};
use crate::utils::error::Result;

pub const ALL_CATEGORIES: &str = "All";

/// 庫存清單（靜態資料或 CSV）
#[derive(Debug, Clone, Default)]
pub struct InventoryCatalog {
    items: Vec<InventoryItem>,
}

impl InventoryCatalog {
    pub fn new(items: Vec<InventoryItem>) -> Self {
        Self { items }
    }

    /// The ten items the inventory screen ships with.
    pub fn fixtures() -> Self {
        let rows = [
            (1, "Dell OptiPlex 7090", "DELL-7090-001", "Computer", "Comp Lab 1", 30, ItemStatus::Good),
            (2, "Epson EB-X51 Projector", "EPS-X51-012", "Projector", "AV Room A", 2, ItemStatus::Good),
            (3, "HP LaserJet Pro M404n", "HP-M404-003", "Printer", "Admin Office", 3, ItemStatus::Maintenance),
            (4, "Cisco Catalyst 2960", "CISCO-2960-005", "Network", "Server Room", 4, ItemStatus::Good),
            (5, "Samsung 55\" Display", "SAM-55D-008", "Display", "Conference Hall A", 2, ItemStatus::Good),
            (6, "Logitech C920 Webcam", "LOG-C920-015", "Peripheral", "IT Storage", 15, ItemStatus::Good),
            (7, "APC Smart-UPS 1500VA", "APC-1500-021", "Power", "Server Room", 6, ItemStatus::Good),
            (8, "Whiteboard 4x6ft", "WB-46-030", "Furniture", "Storage A", 12, ItemStatus::Good),
            (9, "Polycom Conference Phone", "POLY-CF-018", "Communication", "Conference Hall B", 3, ItemStatus::Repair),
            (10, "Standing Lectern", "LEC-STD-025", "Furniture", "Auditorium", 2, ItemStatus::Good),
        ];

        let items = rows
            .into_iter()
            .map(
                |(id, name, serial_number, category, location, quantity, status)| InventoryItem {
                    id,
                    name: name.to_string(),
                    serial_number: serial_number.to_string(),
                    category: category.to_string(),
                    location: location.to_string(),
                    quantity,
                    status,
                },
            )
            .collect();

        Self { items }
    }

    /// Reads `id,name,serial_number,category,location,quantity,status` rows.
    pub fn from_csv(data: &[u8]) -> Result<Self> {
        let mut reader = csv::Reader::from_reader(data);
        let mut items = Vec::new();
        for row in reader.deserialize() {
            let item: InventoryItem = row?;
            items.push(item);
        }
        tracing::debug!("Loaded {} inventory items from CSV", items.len());
        Ok(Self { items })
    }

    pub fn items(&self) -> &[InventoryItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// "All" followed by each category in first-seen order.
    pub fn categories(&self) -> Vec<String> {
        let mut categories = vec![ALL_CATEGORIES.to_string()];
        for item in &self.items {
            if !categories.contains(&item.category) {
                categories.push(item.category.clone());
            }
        }
        categories
    }

    /// Name or serial contains `query` (case-insensitive), and the category is
    /// "All" or an exact match.
    pub fn filter(&self, query: &str, category: &str) -> Vec<&InventoryItem> {
        let query = query.to_lowercase();
        self.items
            .iter()
            .filter(|item| {
                let matches_search = item.name.to_lowercase().contains(&query)
                    || item.serial_number.to_lowercase().contains(&query);
                let matches_category = category == ALL_CATEGORIES || item.category == category;
                matches_search && matches_category
            })
            .collect()
    }

    pub fn find_by_serial(&self, serial: &str) -> Option<&InventoryItem> {
        self.items
            .iter()
            .find(|item| item.serial_number.eq_ignore_ascii_case(serial))
    }
}
