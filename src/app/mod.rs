// App layer: the inventory screen hosting the scan dialog.

pub mod engine;
pub mod inventory;
pub mod scan_terminal;
