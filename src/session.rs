use actix_session::Session;
use serde::{Deserialize, Serialize};
use tera::escape_html;

use crate::errors::AppError;
use crate::structs::User;

const USER_KEY: &str = "user";
const FLASH_KEY: &str = "flash_messages";

/// Public identity of the logged-in user, as stored in the signed cookie.
/// `login` and `email` are HTML-escaped at write time.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct SessionUser {
    pub id: i64,
    pub login: String,
    pub email: String,
}

/// One-shot notification, consumed by the next page that reads the list.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct FlashMessage {
    pub text: String,
    pub category: String,
}

pub fn create_user_session(session: &Session, user: &User) -> Result<(), AppError> {
    let snapshot = SessionUser {
        id: user.user_id.unwrap_or_default(),
        login: escape_html(&user.login),
        email: escape_html(&user.email),
    };
    session.insert(USER_KEY, snapshot)?;
    Ok(())
}

/// `None` means "not authenticated". An unreadable cookie value is logged
/// and treated the same way.
pub fn current_user(session: &Session) -> Option<SessionUser> {
    match session.get::<SessionUser>(USER_KEY) {
        Ok(user) => user,
        Err(e) => {
            log::warn!("Unreadable user entry in session: {}", e);
            None
        }
    }
}

pub fn is_authenticated(session: &Session) -> bool {
    current_user(session).is_some()
}

pub fn clear_session(session: &Session) {
    session.purge();
}

pub fn add_flash(session: &Session, text: &str, category: &str) -> Result<(), AppError> {
    let mut pending = peek_flash(session);
    pending.push(FlashMessage {
        text: escape_html(text),
        category: category.to_owned(),
    });
    session.insert(FLASH_KEY, pending)?;
    Ok(())
}

/// Returns the pending messages and empties the store (read-once).
pub fn take_flash(session: &Session) -> Vec<FlashMessage> {
    let pending = peek_flash(session);
    let _ = session.remove(FLASH_KEY);
    pending
}

fn peek_flash(session: &Session) -> Vec<FlashMessage> {
    match session.get::<Vec<FlashMessage>>(FLASH_KEY) {
        Ok(pending) => pending.unwrap_or_default(),
        Err(e) => {
            log::warn!("Unreadable flash entry in session: {}", e);
            Vec::new()
        }
    }
}
