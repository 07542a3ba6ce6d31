use actix_files::NamedFile;
use actix_session::Session;
use actix_web::{
    get, http::header, post, route,
    web::{self, Data},
    HttpResponse, Responder,
};
use serde::Deserialize;
use tera::Context;

use crate::session::SessionUser;
use crate::structs::{Produit, User};
use crate::{auth, db, errors::AppError, session, validation, AppState, TEMPLATES};

/// Registers every handler. `/produits/add` must come before
/// `/produits/{id}` so the literal segment wins.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(favicon_handler)
        .service(index_handler)
        .service(login_form_handler)
        .service(login_handler)
        .service(logout_handler)
        .service(register_form_handler)
        .service(register_handler)
        .service(list_produits_handler)
        .service(add_produit_form_handler)
        .service(add_produit_handler)
        .service(edit_produit_form_handler)
        .service(edit_produit_handler)
        .service(delete_produit_handler)
        .service(view_produit_handler);
}

fn render(template: &str, context: &Context) -> Result<HttpResponse, AppError> {
    let rendered = TEMPLATES.render(template, context)?;
    Ok(HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(rendered))
}

fn see_other(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .append_header((header::LOCATION, location.to_owned()))
        .finish()
}

// --- main ---------------------------------------------------------------

#[get("/")]
pub async fn index_handler(session: Session) -> Result<HttpResponse, AppError> {
    let mut context = Context::new();
    context.insert("user", &session::current_user(&session));
    context.insert("version", env!("CARGO_PKG_VERSION"));
    render("index.html", &context)
}

/// favicon handler
#[get("/favicon")]
pub async fn favicon_handler() -> Result<impl Responder, AppError> {
    Ok(NamedFile::open("static/favicon.ico")?)
}

// --- auth ---------------------------------------------------------------

#[derive(Deserialize)]
pub struct LoginForm {
    login: String,
    password: String,
}

#[derive(Deserialize)]
pub struct RegisterForm {
    login: String,
    email: String,
    password: String,
}

fn render_login_error(error: &str) -> Result<HttpResponse, AppError> {
    let mut context = Context::new();
    context.insert("error", error);
    render("auth/login.html", &context)
}

fn render_register_error(error: &str) -> Result<HttpResponse, AppError> {
    let mut context = Context::new();
    context.insert("error", error);
    render("auth/register.html", &context)
}

#[get("/login")]
pub async fn login_form_handler(session: Session) -> Result<HttpResponse, AppError> {
    if session::is_authenticated(&session) {
        return Ok(see_other("/"));
    }
    render("auth/login.html", &Context::new())
}

#[post("/login")]
pub async fn login_handler(
    web::Form(form): web::Form<LoginForm>,
    state: Data<AppState>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    let errors = validation::validate_login_data(&form.login, &form.password);
    if let Some(first) = errors.first() {
        return render_login_error(first);
    }

    let user = match db::find_user_by_login(&state.db_pool, form.login.trim()).await {
        Ok(user) => user,
        Err(e) => {
            log::error!("User lookup failed during login: {}", e);
            return render_login_error("Erreur de connexion");
        }
    };

    match user {
        Some(user) if auth::verify_password(&form.password, &user.password_hash) => {
            if let Some(id) = user.user_id {
                if let Err(e) = db::update_last_login(&state.db_pool, id).await {
                    log::error!("Failed to record last login for user {}: {}", id, e);
                }
            }
            session::create_user_session(&session, &user)?;
            Ok(see_other("/"))
        }
        // Unknown login and wrong password are indistinguishable on purpose.
        _ => render_login_error("Login ou mot de passe incorrect"),
    }
}

#[get("/logout")]
pub async fn logout_handler(session: Session) -> HttpResponse {
    session::clear_session(&session);
    see_other("/")
}

#[get("/register")]
pub async fn register_form_handler(session: Session) -> Result<HttpResponse, AppError> {
    if session::is_authenticated(&session) {
        return Ok(see_other("/"));
    }
    render("auth/register.html", &Context::new())
}

#[post("/register")]
pub async fn register_handler(
    web::Form(form): web::Form<RegisterForm>,
    state: Data<AppState>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    let errors = validation::validate_registration_data(&form.login, &form.email, &form.password);
    if let Some(first) = errors.first() {
        return render_register_error(first);
    }

    let login = form.login.trim();
    let email = form.email.trim();

    // Advisory check; the UNIQUE constraints on the table close the race.
    match db::find_user_by_login_or_email(&state.db_pool, login, email).await {
        Ok(Some(_)) => {
            return render_register_error("Ce login ou cette adresse email est déjà utilisé(e)")
        }
        Ok(None) => {}
        Err(e) => {
            log::error!("Uniqueness check failed during registration: {}", e);
            return render_register_error("Erreur lors de la création du compte");
        }
    }

    let password_hash = match auth::hash_password(&form.password) {
        Ok(hash) => hash,
        Err(e) => {
            log::error!("Password hashing failed during registration: {}", e);
            return render_register_error("Erreur lors de la création du compte");
        }
    };

    let mut new_user = User::new(login, email, password_hash);
    match db::save_user(&state.db_pool, &mut new_user).await {
        Ok(()) => {
            session::create_user_session(&session, &new_user)?;
            Ok(see_other("/"))
        }
        Err(e) if db::is_unique_violation(&e) => {
            // Lost a registration race: same answer as the advisory check.
            render_register_error("Ce login ou cette adresse email est déjà utilisé(e)")
        }
        Err(e) => {
            log::error!("Failed to save new user: {}", e);
            render_register_error("Erreur lors de la création du compte")
        }
    }
}

// --- produits -----------------------------------------------------------

#[derive(Deserialize)]
pub struct ProduitForm {
    type_p: String,
    designation_p: String,
    prix_ht: f64,
    date_in: String,
    stock_p: i64,
}

fn render_add_error(user: &SessionUser, error: &str) -> Result<HttpResponse, AppError> {
    let mut context = Context::new();
    context.insert("user", user);
    context.insert("error", error);
    context.insert("today", &chrono::Local::now().date_naive());
    render("produit/produit_add.html", &context)
}

fn render_edit_error(
    user: &SessionUser,
    produit: &Produit,
    error: &str,
) -> Result<HttpResponse, AppError> {
    let mut context = Context::new();
    context.insert("user", user);
    context.insert("produit", produit);
    context.insert("error", error);
    render("produit/produit_edit.html", &context)
}

#[get("/produits")]
pub async fn list_produits_handler(
    state: Data<AppState>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    let mut context = Context::new();
    let produits = match db::find_all_produits(&state.db_pool).await {
        Ok(produits) => produits,
        Err(e) => {
            log::error!("Failed to list products: {}", e);
            context.insert("error", "Erreur lors du chargement des produits");
            Vec::new()
        }
    };
    context.insert("produits", &produits);
    context.insert("user", &session::current_user(&session));
    context.insert("flash_messages", &session::take_flash(&session));
    render("produit/produits.html", &context)
}

#[get("/produits/add")]
pub async fn add_produit_form_handler(session: Session) -> Result<HttpResponse, AppError> {
    let Some(user) = session::current_user(&session) else {
        return Ok(see_other("/login"));
    };
    let mut context = Context::new();
    context.insert("user", &user);
    context.insert("today", &chrono::Local::now().date_naive());
    render("produit/produit_add.html", &context)
}

#[post("/produits/add")]
pub async fn add_produit_handler(
    web::Form(form): web::Form<ProduitForm>,
    state: Data<AppState>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    let Some(user) = session::current_user(&session) else {
        return Ok(see_other("/login"));
    };

    let Some(date_in) = validation::parse_date_input(&form.date_in) else {
        return render_add_error(&user, "La date d'entrée en stock est invalide");
    };

    let mut produit = Produit::new(
        &form.type_p,
        &form.designation_p,
        form.prix_ht,
        date_in,
        form.stock_p,
    );

    match db::save_produit(&state.db_pool, &mut produit).await {
        Ok(()) => {
            session::add_flash(
                &session,
                &format!(
                    "Le produit '{}' a été ajouté avec succès !",
                    form.designation_p
                ),
                "success",
            )?;
            Ok(see_other("/produits"))
        }
        Err(e) => {
            log::error!("Failed to save new product: {}", e);
            render_add_error(&user, "Erreur lors de l'ajout du produit. Veuillez réessayer.")
        }
    }
}

#[get("/produits/{id}")]
pub async fn view_produit_handler(
    path: web::Path<i64>,
    state: Data<AppState>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let user = session::current_user(&session);
    let flash_messages = session::take_flash(&session);

    match db::find_produit_by_id(&state.db_pool, id).await {
        Ok(Some(produit)) => {
            let mut context = Context::new();
            context.insert("produit", &produit);
            context.insert("user", &user);
            context.insert("flash_messages", &flash_messages);
            render("produit/produit_view.html", &context)
        }
        Ok(None) => {
            session::add_flash(&session, "Le produit demandé n'existe pas.", "error")?;
            Ok(see_other("/produits"))
        }
        Err(e) => {
            log::error!("Failed to load product {}: {}", id, e);
            session::add_flash(&session, "Erreur lors du chargement du produit.", "error")?;
            Ok(see_other("/produits"))
        }
    }
}

#[get("/produits/{id}/edit")]
pub async fn edit_produit_form_handler(
    path: web::Path<i64>,
    state: Data<AppState>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    let Some(user) = session::current_user(&session) else {
        return Ok(see_other("/login"));
    };
    let id = path.into_inner();

    match db::find_produit_by_id(&state.db_pool, id).await {
        Ok(Some(produit)) => {
            let mut context = Context::new();
            context.insert("produit", &produit);
            context.insert("user", &user);
            render("produit/produit_edit.html", &context)
        }
        Ok(None) => {
            session::add_flash(&session, "Le produit à éditer n'existe pas.", "error")?;
            Ok(see_other("/produits"))
        }
        Err(e) => {
            log::error!("Failed to load product {} for edit: {}", id, e);
            session::add_flash(&session, "Erreur lors du chargement du produit.", "error")?;
            Ok(see_other("/produits"))
        }
    }
}

#[post("/produits/{id}/edit")]
pub async fn edit_produit_handler(
    path: web::Path<i64>,
    web::Form(form): web::Form<ProduitForm>,
    state: Data<AppState>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    let Some(user) = session::current_user(&session) else {
        return Ok(see_other("/login"));
    };
    let id = path.into_inner();

    let mut produit = match db::find_produit_by_id(&state.db_pool, id).await {
        Ok(Some(produit)) => produit,
        Ok(None) => {
            session::add_flash(&session, "Le produit à modifier n'existe pas.", "error")?;
            return Ok(see_other("/produits"));
        }
        Err(e) => {
            log::error!("Failed to load product {} for edit: {}", id, e);
            session::add_flash(&session, "Erreur lors du chargement du produit.", "error")?;
            return Ok(see_other("/produits"));
        }
    };

    let Some(date_in) = validation::parse_date_input(&form.date_in) else {
        return render_edit_error(&user, &produit, "La date d'entrée en stock est invalide");
    };

    produit.type_p = form.type_p;
    produit.designation_p = form.designation_p;
    produit.prix_ht = form.prix_ht;
    produit.date_in = Some(date_in);
    produit.stock_p = form.stock_p;

    match db::save_produit(&state.db_pool, &mut produit).await {
        Ok(()) => {
            session::add_flash(
                &session,
                &format!(
                    "Le produit '{}' a été modifié avec succès !",
                    produit.designation_p
                ),
                "success",
            )?;
            Ok(see_other(&format!("/produits/{}", id)))
        }
        Err(e) => {
            log::error!("Failed to update product {}: {}", id, e);
            render_edit_error(
                &user,
                &produit,
                "Erreur lors de la modification du produit. Veuillez réessayer.",
            )
        }
    }
}

/// Both methods accepted: the listing links it as a plain anchor, the detail
/// page submits a form.
#[route("/produits/{id}/delete", method = "GET", method = "POST")]
pub async fn delete_produit_handler(
    path: web::Path<i64>,
    state: Data<AppState>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    if !session::is_authenticated(&session) {
        return Ok(see_other("/login"));
    }
    let id = path.into_inner();

    // Fetch first so the flash message can name the product.
    let produit = match db::find_produit_by_id(&state.db_pool, id).await {
        Ok(Some(produit)) => produit,
        Ok(None) => {
            session::add_flash(&session, "Le produit à supprimer n'existe pas.", "error")?;
            return Ok(see_other("/produits"));
        }
        Err(e) => {
            log::error!("Failed to load product {} for deletion: {}", id, e);
            session::add_flash(&session, "Erreur lors de la suppression du produit.", "error")?;
            return Ok(see_other("/produits"));
        }
    };

    match db::delete_produit_by_id(&state.db_pool, id).await {
        Ok(true) => {
            session::add_flash(
                &session,
                &format!(
                    "Le produit '{}' a été supprimé avec succès !",
                    produit.designation_p
                ),
                "success",
            )?;
        }
        Ok(false) => {
            session::add_flash(&session, "Erreur lors de la suppression du produit.", "error")?;
        }
        Err(e) => {
            log::error!("Failed to delete product {}: {}", id, e);
            session::add_flash(&session, "Erreur lors de la suppression du produit.", "error")?;
        }
    }

    Ok(see_other("/produits"))
}
