pub mod attribute; // Column schema
pub mod data_loader; // Dataset + loader trait
pub mod csv_data_loader; // CSV implementation of the loader
pub mod partition; // Seeded train/test and k-fold splits

pub use attribute::{Attribute, AttributeKind};
pub use csv_data_loader::CsvDataLoader;
pub use data_loader::{DataLoader, Dataset, Observation};
pub use partition::{Fold, Partition};
