use chrono::NaiveDate;
use regex::Regex;

use crate::config::{
    PASSWORD_MAX_LENGTH, PASSWORD_MIN_LENGTH, USERNAME_MAX_LENGTH, USERNAME_MIN_LENGTH,
};

lazy_static! {
    static ref EMAIL_RE: Regex =
        Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").unwrap();
    static ref USERNAME_RE: Regex = Regex::new(r"^[A-Za-z0-9_-]+$").unwrap();
}

pub fn validate_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// One message at most: the first failing rule wins for this field.
pub fn validate_username(username: &str) -> Vec<String> {
    let trimmed = username.trim();
    let mut errors = Vec::new();

    if trimmed.is_empty() {
        errors.push("Le nom d'utilisateur est requis".to_owned());
    } else if trimmed.chars().count() < USERNAME_MIN_LENGTH {
        errors.push(format!(
            "Le nom d'utilisateur doit faire au moins {} caractères",
            USERNAME_MIN_LENGTH
        ));
    } else if trimmed.chars().count() > USERNAME_MAX_LENGTH {
        errors.push("Le nom d'utilisateur ne peut pas dépasser 50 caractères".to_owned());
    } else if !USERNAME_RE.is_match(trimmed) {
        errors.push(
            "Le nom d'utilisateur ne peut contenir que des lettres, chiffres, tirets et underscores"
                .to_owned(),
        );
    }

    errors
}

pub fn validate_password(password: &str) -> Vec<String> {
    let mut errors = Vec::new();

    if password.is_empty() {
        errors.push("Le mot de passe est requis".to_owned());
    } else if password.chars().count() < PASSWORD_MIN_LENGTH {
        errors.push(format!(
            "Le mot de passe doit faire au moins {} caractères",
            PASSWORD_MIN_LENGTH
        ));
    } else if password.chars().count() > PASSWORD_MAX_LENGTH {
        errors.push("Le mot de passe ne peut pas dépasser 200 caractères".to_owned());
    }

    errors
}

/// Username rules, then email, then password, in that order. All fields are
/// checked even when an earlier one fails.
pub fn validate_registration_data(username: &str, email: &str, password: &str) -> Vec<String> {
    let mut errors = validate_username(username);

    let trimmed_email = email.trim();
    if trimmed_email.is_empty() {
        errors.push("L'adresse email est requise".to_owned());
    } else if !validate_email(trimmed_email) {
        errors.push("Le format de l'adresse email est invalide".to_owned());
    }

    errors.extend(validate_password(password));
    errors
}

pub fn validate_login_data(login: &str, password: &str) -> Vec<String> {
    let mut errors = Vec::new();

    if login.trim().is_empty() {
        errors.push("Le login est requis".to_owned());
    }
    if password.is_empty() {
        errors.push("Le mot de passe est requis".to_owned());
    }

    errors
}

/// Accepts `DD/MM/YYYY` (legacy form input) or `YYYY-MM-DD` (HTML date
/// input). Returns `None` on anything else so the handler can tell the user
/// instead of silently substituting a date.
pub fn parse_date_input(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.contains('/') {
        NaiveDate::parse_from_str(raw, "%d/%m/%Y").ok()
    } else {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
    }
}
