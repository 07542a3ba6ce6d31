use chrono::Utc;
use sqlx::SqlitePool;

use crate::structs::{Produit, User};

/// True when the error is the backing store rejecting a duplicate key, so a
/// registration race can be reported as "already in use" rather than as a
/// generic failure.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            matches!(db_err.kind(), sqlx::error::ErrorKind::UniqueViolation)
        }
        _ => false,
    }
}

// --- user ---------------------------------------------------------------

pub async fn find_user_by_id(pool: &SqlitePool, id: i64) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM user WHERE user_id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn find_user_by_login(
    pool: &SqlitePool,
    login: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM user WHERE user_login = ?")
        .bind(login)
        .fetch_optional(pool)
        .await
}

pub async fn find_user_by_email(
    pool: &SqlitePool,
    email: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM user WHERE user_mail = ?")
        .bind(email)
        .fetch_optional(pool)
        .await
}

pub async fn find_user_by_login_or_email(
    pool: &SqlitePool,
    login: &str,
    email: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM user WHERE user_login = ? OR user_mail = ?")
        .bind(login)
        .bind(email)
        .fetch_optional(pool)
        .await
}

pub async fn find_all_users(pool: &SqlitePool) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM user")
        .fetch_all(pool)
        .await
}

/// Insert when `user_id` is absent, update otherwise. On insert the
/// generated identifier is written back onto the record.
pub async fn save_user(pool: &SqlitePool, user: &mut User) -> Result<(), sqlx::Error> {
    match user.user_id {
        None => {
            let id: i64 = sqlx::query_scalar(
                "INSERT INTO user (user_login, user_password, user_mail) \
                 VALUES (?, ?, ?) RETURNING user_id",
            )
            .bind(&user.login)
            .bind(&user.password_hash)
            .bind(&user.email)
            .fetch_one(pool)
            .await?;
            user.user_id = Some(id);
        }
        Some(id) => {
            sqlx::query("UPDATE user SET user_login = ?, user_password = ?, user_mail = ? WHERE user_id = ?")
                .bind(&user.login)
                .bind(&user.password_hash)
                .bind(&user.email)
                .bind(id)
                .execute(pool)
                .await?;
        }
    }
    Ok(())
}

pub async fn update_last_login(pool: &SqlitePool, user_id: i64) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE user SET user_date_login = ? WHERE user_id = ?")
        .bind(Utc::now().naive_utc())
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Repository-level only: no HTTP route deletes users.
pub async fn delete_user_by_id(pool: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM user WHERE user_id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

// --- produit ------------------------------------------------------------

pub async fn find_produit_by_id(
    pool: &SqlitePool,
    id: i64,
) -> Result<Option<Produit>, sqlx::Error> {
    sqlx::query_as::<_, Produit>("SELECT * FROM produit WHERE id_p = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn find_all_produits(pool: &SqlitePool) -> Result<Vec<Produit>, sqlx::Error> {
    sqlx::query_as::<_, Produit>("SELECT * FROM produit")
        .fetch_all(pool)
        .await
}

pub async fn find_produits_by_type(
    pool: &SqlitePool,
    type_p: &str,
) -> Result<Vec<Produit>, sqlx::Error> {
    sqlx::query_as::<_, Produit>("SELECT * FROM produit WHERE type_p = ?")
        .bind(type_p)
        .fetch_all(pool)
        .await
}

/// Insert when `id_p` is absent, update otherwise. `timeS_in` is left to the
/// table default and never written here.
pub async fn save_produit(pool: &SqlitePool, produit: &mut Produit) -> Result<(), sqlx::Error> {
    match produit.id_p {
        None => {
            let id: i64 = sqlx::query_scalar(
                "INSERT INTO produit (type_p, designation_p, prix_ht, date_in, stock_p) \
                 VALUES (?, ?, ?, ?, ?) RETURNING id_p",
            )
            .bind(&produit.type_p)
            .bind(&produit.designation_p)
            .bind(produit.prix_ht)
            .bind(produit.date_in)
            .bind(produit.stock_p)
            .fetch_one(pool)
            .await?;
            produit.id_p = Some(id);
        }
        Some(id) => {
            sqlx::query(
                "UPDATE produit SET type_p = ?, designation_p = ?, prix_ht = ?, date_in = ?, \
                 stock_p = ? WHERE id_p = ?",
            )
            .bind(&produit.type_p)
            .bind(&produit.designation_p)
            .bind(produit.prix_ht)
            .bind(produit.date_in)
            .bind(produit.stock_p)
            .bind(id)
            .execute(pool)
            .await?;
        }
    }
    Ok(())
}

/// True iff a row was actually removed.
pub async fn delete_produit_by_id(pool: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM produit WHERE id_p = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::migrate!().run(&pool).await.unwrap();
        pool
    }

    fn sample_produit() -> Produit {
        Produit::new(
            "Électronique",
            "Smartphone",
            299.99,
            NaiveDate::from_ymd_opt(2025, 10, 2).unwrap(),
            50,
        )
    }

    #[tokio::test]
    async fn produit_save_assigns_id_and_roundtrips() {
        let pool = test_pool().await;

        let mut produit = sample_produit();
        assert!(produit.id_p.is_none());
        save_produit(&pool, &mut produit).await.unwrap();
        let id = produit.id_p.expect("insert must assign an id");

        let found = find_produit_by_id(&pool, id).await.unwrap().unwrap();
        assert_eq!(found.type_p, produit.type_p);
        assert_eq!(found.designation_p, produit.designation_p);
        assert_eq!(found.prix_ht, produit.prix_ht);
        assert_eq!(found.date_in, produit.date_in);
        assert_eq!(found.stock_p, produit.stock_p);
        // Filled by the table default on insert.
        assert!(found.time_s_in.is_some());
    }

    #[tokio::test]
    async fn produit_update_holds_id_constant() {
        let pool = test_pool().await;

        let mut produit = sample_produit();
        save_produit(&pool, &mut produit).await.unwrap();
        let id = produit.id_p.unwrap();

        produit.designation_p = "Tablette".to_owned();
        produit.stock_p = 12;
        save_produit(&pool, &mut produit).await.unwrap();
        assert_eq!(produit.id_p, Some(id));

        let found = find_produit_by_id(&pool, id).await.unwrap().unwrap();
        assert_eq!(found.designation_p, "Tablette");
        assert_eq!(found.stock_p, 12);
    }

    #[tokio::test]
    async fn produit_delete_then_absent() {
        let pool = test_pool().await;

        let mut produit = sample_produit();
        save_produit(&pool, &mut produit).await.unwrap();
        let id = produit.id_p.unwrap();

        assert!(delete_produit_by_id(&pool, id).await.unwrap());
        assert!(find_produit_by_id(&pool, id).await.unwrap().is_none());
        // Second delete removes nothing.
        assert!(!delete_produit_by_id(&pool, id).await.unwrap());
    }

    #[tokio::test]
    async fn produit_find_by_type_filters() {
        let pool = test_pool().await;

        let mut a = sample_produit();
        save_produit(&pool, &mut a).await.unwrap();
        let mut b = sample_produit();
        b.type_p = "Mobilier".to_owned();
        save_produit(&pool, &mut b).await.unwrap();

        let all = find_all_produits(&pool).await.unwrap();
        assert_eq!(all.len(), 2);

        let filtered = find_produits_by_type(&pool, "Mobilier").await.unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id_p, b.id_p);
    }

    #[tokio::test]
    async fn user_save_lookup_and_last_login() {
        let pool = test_pool().await;

        let mut user = User::new("jean", "jean@example.fr", "hash".to_owned());
        save_user(&pool, &mut user).await.unwrap();
        let id = user.user_id.expect("insert must assign an id");

        let by_login = find_user_by_login(&pool, "jean").await.unwrap().unwrap();
        assert_eq!(by_login.user_id, Some(id));
        // Creation timestamp comes from the table default.
        assert!(by_login.date_new.is_some());
        assert!(by_login.date_login.is_none());

        let by_email = find_user_by_email(&pool, "jean@example.fr")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_email.user_id, Some(id));

        // Matches on either column.
        assert!(find_user_by_login_or_email(&pool, "jean", "autre@example.fr")
            .await
            .unwrap()
            .is_some());
        assert!(find_user_by_login_or_email(&pool, "autre", "jean@example.fr")
            .await
            .unwrap()
            .is_some());
        assert!(find_user_by_login_or_email(&pool, "autre", "autre@example.fr")
            .await
            .unwrap()
            .is_none());

        update_last_login(&pool, id).await.unwrap();
        let after = find_user_by_id(&pool, id).await.unwrap().unwrap();
        assert!(after.date_login.is_some());
    }

    #[tokio::test]
    async fn user_duplicate_login_is_a_unique_violation() {
        let pool = test_pool().await;

        let mut first = User::new("jean", "jean@example.fr", "hash".to_owned());
        save_user(&pool, &mut first).await.unwrap();

        let mut dup = User::new("jean", "autre@example.fr", "hash".to_owned());
        let err = save_user(&pool, &mut dup).await.unwrap_err();
        assert!(is_unique_violation(&err));
        // The failed insert must not have assigned an id.
        assert!(dup.user_id.is_none());

        assert_eq!(find_all_users(&pool).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn user_delete_by_id() {
        let pool = test_pool().await;

        let mut user = User::new("jean", "jean@example.fr", "hash".to_owned());
        save_user(&pool, &mut user).await.unwrap();
        let id = user.user_id.unwrap();

        assert!(delete_user_by_id(&pool, id).await.unwrap());
        assert!(find_user_by_id(&pool, id).await.unwrap().is_none());
    }
}
