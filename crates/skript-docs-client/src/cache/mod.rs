pub mod catalog;

pub use catalog::TimedCatalog;
