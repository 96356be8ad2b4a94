pub mod category;
pub mod commune_map;
pub mod drought_record;
pub mod error;
pub mod fetcher;
pub mod historical;
pub mod persistence;
