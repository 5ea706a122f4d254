pub mod csv_loader;

pub use csv_loader::{load_targets_from_path, parse_targets};
