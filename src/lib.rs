pub mod config;
pub mod dates;
pub mod editor;
pub mod export;
pub mod handle;
pub mod logging;
pub mod markup;
pub mod model;
pub mod query;
pub mod store;
pub mod styled;
