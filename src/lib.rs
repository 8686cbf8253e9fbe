// Library for tests to access modules

pub mod config;
pub mod models;
pub mod rollup;
pub mod rollup_worker;
pub mod routes;
pub mod store;
