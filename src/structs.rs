use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Row of the `user` table. `user_id` is `None` until the first insert
/// assigns the generated identifier.
#[derive(Deserialize, Serialize, Debug, Clone, FromRow)]
pub struct User {
    pub user_id: Option<i64>,
    #[sqlx(rename = "user_login")]
    pub login: String,
    #[sqlx(rename = "user_mail")]
    pub email: String,
    #[sqlx(rename = "user_password")]
    pub password_hash: String,
    #[sqlx(rename = "user_date_new")]
    pub date_new: Option<NaiveDateTime>,
    #[sqlx(rename = "user_date_login")]
    pub date_login: Option<NaiveDateTime>,
}

impl User {
    pub fn new(login: &str, email: &str, password_hash: String) -> Self {
        User {
            user_id: None,
            login: login.to_owned(),
            email: email.to_owned(),
            password_hash,
            date_new: None,
            date_login: None,
        }
    }
}

/// Row of the `produit` table. `time_s_in` is filled by the table default
/// on insert and is never written by the application.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, FromRow)]
pub struct Produit {
    pub id_p: Option<i64>,
    pub type_p: String,
    pub designation_p: String,
    pub prix_ht: f64,
    pub date_in: Option<NaiveDate>,
    #[sqlx(rename = "timeS_in")]
    pub time_s_in: Option<String>,
    pub stock_p: i64,
}

impl Produit {
    pub fn new(
        type_p: &str,
        designation_p: &str,
        prix_ht: f64,
        date_in: NaiveDate,
        stock_p: i64,
    ) -> Self {
        Produit {
            id_p: None,
            type_p: type_p.to_owned(),
            designation_p: designation_p.to_owned(),
            prix_ht,
            date_in: Some(date_in),
            time_s_in: None,
            stock_p,
        }
    }
}
