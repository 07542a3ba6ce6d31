#[macro_use]
extern crate lazy_static;

use sqlx::SqlitePool;
use tera::Tera;

pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod routes;
pub mod session;
pub mod structs;
pub mod validation;

#[derive(Debug, Clone)]
pub struct AppState {
    pub db_pool: SqlitePool,
}

lazy_static! {
    pub static ref TEMPLATES: Tera = {
        let mut tera = match Tera::new("templates/**/*") {
            Ok(t) => t,
            Err(e) => {
                log::error!("Parsing error(s): {}", e);
                ::std::process::exit(1);
            }
        };
        tera.autoescape_on(vec![".html"]);
        tera
    };
}
