// Export and import of wallet data (CSV per collection, JSON snapshots).

pub mod export;
pub mod import;

pub use export::*;
pub use import::*;
