use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use actix_web::web::Data;
use actix_web::{Error, HttpResponse};
use paperclip::actix::{api_v2_operation, web};

use crate::api::{AuthResponse, LoginRequest, RegisterRequest, UserId};
use crate::books_repository::BookRepository;
use crate::genres_repository::GenresRepository;
use crate::handlers::{canonical_genre, ApiError};
use crate::passwords::{hash_password, verify_password};
use crate::seed::{starter_books, SeedOptions};
use crate::users_repository::{normalize_email, NewUser, UsersRepository, UsersRepositoryError};

const INVALID_CREDENTIALS: &str = "Credenciais inválidas";
const INTERNAL_ERROR: &str = "Erro interno do servidor";

/// `local@domain.tld` without whitespace and with a single `@`
fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    domain
        .char_indices()
        .any(|(index, c)| c == '.' && index > 0 && index + 1 < domain.len())
}

fn now_unix_seconds() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs() as i64)
        .unwrap_or_default()
}

async fn fill_starter_shelf(
    books_repository: &dyn BookRepository,
    genres_repository: &dyn GenresRepository,
    user_id: UserId,
) -> Result<(), ApiError> {
    for mut details in starter_books() {
        details.genre = canonical_genre(genres_repository, details.genre).await?;
        books_repository
            .add_book(user_id, details)
            .await
            .map_err(|err| ApiError::internal("Erro ao adicionar os livros iniciais.", err))?;
    }
    tracing::info!("Starter books added for user {}", user_id);
    Ok(())
}

#[api_v2_operation]
pub async fn register(
    users_repository: Data<Arc<dyn UsersRepository>>,
    books_repository: Data<Arc<dyn BookRepository>>,
    genres_repository: Data<Arc<dyn GenresRepository>>,
    seed_options: Data<SeedOptions>,
    request: web::Json<RegisterRequest>,
) -> Result<HttpResponse, Error> {
    let RegisterRequest {
        name,
        email,
        password,
    } = request.into_inner();
    let name = name.trim().to_string();
    let email = normalize_email(&email);

    if name.is_empty() || email.is_empty() || password.is_empty() {
        return Err(
            ApiError::BadRequest("Nome, email e senha são obrigatórios".to_string()).into(),
        );
    }
    if !is_valid_email(&email) {
        return Err(ApiError::BadRequest("Email inválido".to_string()).into());
    }

    let password_hash = actix_web::web::block(move || hash_password(&password))
        .await
        .map_err(|err| ApiError::internal(INTERNAL_ERROR, err))?
        .map_err(|err| ApiError::internal(INTERNAL_ERROR, err))?;

    let user_id = match users_repository
        .add_user(NewUser {
            name,
            email,
            password_hash,
            created_at: now_unix_seconds(),
        })
        .await
    {
        Ok(user_id) => user_id,
        Err(UsersRepositoryError::EmailTaken(_)) => {
            return Err(ApiError::Conflict("Usuário já existe com este email".to_string()).into())
        }
        Err(err) => return Err(ApiError::internal(INTERNAL_ERROR, err).into()),
    };

    // the account stays registered even when its starter shelf cannot be filled
    if seed_options.starter_books {
        if let Err(err) = fill_starter_shelf(
            books_repository.get_ref().as_ref(),
            genres_repository.get_ref().as_ref(),
            user_id,
        )
        .await
        {
            tracing::error!("Starter shelf of user {} is incomplete: {}", user_id, err);
        }
    }

    let user = users_repository
        .get_user(user_id)
        .await
        .map_err(|err| ApiError::internal(INTERNAL_ERROR, err))?;
    tracing::info!("Registered user {}", user_id);

    Ok(HttpResponse::Ok().json(AuthResponse {
        message: "Usuário criado com sucesso".to_string(),
        user: user.public(),
    }))
}

#[api_v2_operation]
pub async fn login(
    users_repository: Data<Arc<dyn UsersRepository>>,
    request: web::Json<LoginRequest>,
) -> Result<HttpResponse, Error> {
    let LoginRequest { email, password } = request.into_inner();
    let email = normalize_email(&email);
    if email.is_empty() || password.is_empty() {
        return Err(ApiError::BadRequest("Email e senha são obrigatórios".to_string()).into());
    }

    let user = users_repository
        .find_user_by_email(&email)
        .await
        .map_err(|err| ApiError::internal(INTERNAL_ERROR, err))?
        .ok_or_else(|| ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;

    let password_hash = user.password_hash.clone();
    let password_matches =
        actix_web::web::block(move || verify_password(&password, &password_hash))
            .await
            .map_err(|err| ApiError::internal(INTERNAL_ERROR, err))?
            .map_err(|err| ApiError::internal(INTERNAL_ERROR, err))?;
    if !password_matches {
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()).into());
    }

    Ok(HttpResponse::Ok().json(AuthResponse {
        message: "Login realizado com sucesso".to_string(),
        user: user.public(),
    }))
}

#[cfg(test)]
mod auth_tests {
    use super::is_valid_email;

    #[test]
    fn email_shape_is_checked() {
        assert!(is_valid_email("joao@exemplo.com"));
        assert!(is_valid_email("a@b.c"));
        assert!(!is_valid_email("joao.exemplo.com"));
        assert!(!is_valid_email("joao@exemplo"));
        assert!(!is_valid_email("joao@.com"));
        assert!(!is_valid_email("joao@exemplo."));
        assert!(!is_valid_email("jo ao@exemplo.com"));
        assert!(!is_valid_email("joao@@exemplo.com"));
        assert!(!is_valid_email("@exemplo.com"));
    }
}
