pub mod nse;
pub mod prod_db;
