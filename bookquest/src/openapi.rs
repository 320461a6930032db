//! OpenAPI documentation for the `/api` surface.
//!
//! The document is served as JSON at `/api/openapi.json` and rendered with Scalar at `/api/docs`.
//! Protected operations reference the `BearerAuth` scheme registered by [`SecurityAddon`].

use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};

use crate::api::{handlers, models};

/// Registers the access-token bearer scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.security_schemes.insert(
                "BearerAuth".to_string(),
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some(
                            "Access token from `POST /auth/login` or `POST /token/refresh`:\n\n\
                            ```\nAuthorization: Bearer ACCESS_TOKEN\n```\n\n\
                            Access tokens expire after 30 minutes by default.",
                        ))
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "BookQuest API",
        description = "Books, chapters, quizzes and reading progress behind JWT authentication."
    ),
    servers(
        (url = "/api", description = "BookQuest API")
    ),
    modifiers(&SecurityAddon),
    paths(
        handlers::status::hello,
        handlers::auth::login,
        handlers::auth::refresh,
        handlers::users::register,
        handlers::users::get_me,
        handlers::users::list_users,
        handlers::users::get_user,
        handlers::users::update_user,
        handlers::users::delete_user,
        handlers::books::list_books,
        handlers::books::get_book,
        handlers::books::create_book,
        handlers::books::update_book,
        handlers::books::delete_book,
        handlers::chapters::create_chapter,
        handlers::chapters::list_chapters,
        handlers::chapters::get_chapter,
        handlers::chapters::update_chapter,
        handlers::chapters::delete_chapter,
        handlers::quizzes::create_quiz,
        handlers::quizzes::get_chapter_quiz,
        handlers::quizzes::get_quiz,
        handlers::quizzes::delete_quiz,
        handlers::quizzes::submit_quiz,
        handlers::progress::get_progress,
        handlers::progress::put_progress,
    ),
    components(schemas(
        models::status::StatusResponse,
        models::status::HelloResponse,
        models::auth::LoginRequest,
        models::auth::LoginResponse,
        models::auth::RefreshRequest,
        models::auth::RefreshResponse,
        models::users::Role,
        models::users::UserRegister,
        models::users::UserUpdate,
        models::users::UserDelete,
        models::users::UserResponse,
        models::users::PublicUser,
        models::users::RegisteredUser,
        models::users::RegisterResponse,
        models::books::BookCreate,
        models::books::BookUpdate,
        models::books::BookResponse,
        models::chapters::ChapterCreate,
        models::chapters::ChapterUpdate,
        models::chapters::ChapterResponse,
        models::quizzes::QuestionCreate,
        models::quizzes::QuizCreate,
        models::quizzes::QuestionResponse,
        models::quizzes::QuizResponse,
        models::quizzes::AnswerSubmission,
        models::quizzes::QuizSubmission,
        models::quizzes::QuestionResult,
        models::quizzes::QuizResult,
        models::progress::ProgressUpdate,
        models::progress::ProgressResponse,
    )),
    tags(
        (name = "status", description = "Service status"),
        (name = "authentication", description = "Login and token refresh"),
        (name = "users", description = "Registration and user management"),
        (name = "books", description = "Book catalogue"),
        (name = "chapters", description = "Chapters of a book"),
        (name = "quizzes", description = "Chapter quizzes and grading"),
        (name = "progress", description = "Per-user reading progress"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_protected_path_uses_bearer_auth() {
        let doc = ApiDoc::openapi();
        let json = serde_json::to_value(&doc).unwrap();

        let login = &json["paths"]["/auth/login"]["post"];
        assert!(login["security"].is_null(), "login must be public");

        let delete_book = &json["paths"]["/book/{id}"]["delete"];
        assert_eq!(delete_book["security"][0]["BearerAuth"], serde_json::json!([]));

        let scheme = &json["components"]["securitySchemes"]["BearerAuth"];
        assert_eq!(scheme["scheme"], "bearer");
        assert_eq!(scheme["bearerFormat"], "JWT");
    }
}
