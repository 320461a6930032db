//! Process-local storage backend.
//!
//! [`MemoryStore`] keeps every table in a single map set behind a tokio mutex. It enforces the
//! same unique constraints, foreign keys and cascades as the SQL schema in `migrations/`, and
//! reports violations with the same constraint names, so handlers behave identically against
//! either backend. Nothing survives a restart.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;

use crate::{
    db::{
        Store,
        errors::{DbError, Result},
        handlers::repository::{
            BookRepository, ChapterRepository, ProgressRepository, QuizRepository, Repository, UserRepository,
        },
        models::{
            books::{BookCreateDBRequest, BookDBResponse, BookFilter, BookUpdateDBRequest},
            chapters::{ChapterCreateDBRequest, ChapterDBResponse, ChapterUpdateDBRequest},
            progress::{ProgressDBResponse, ProgressUpsertDBRequest},
            quizzes::{QuestionDBResponse, QuizCreateDBRequest, QuizDBResponse},
            users::{UserCreateDBRequest, UserDBResponse, UserFilter, UserUpdateDBRequest},
        },
    },
    types::{BookId, ChapterId, QuizId, UserId},
};

#[derive(Default)]
struct Tables {
    last_id: i64,
    users: BTreeMap<UserId, UserDBResponse>,
    books: BTreeMap<BookId, BookDBResponse>,
    chapters: BTreeMap<ChapterId, ChapterDBResponse>,
    quizzes: BTreeMap<QuizId, QuizDBResponse>,
    progress: BTreeMap<(UserId, ChapterId), ProgressDBResponse>,
}

impl Tables {
    /// Ids are drawn from one sequence; uniqueness per table is all callers rely on.
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn delete_chapter_cascade(&mut self, chapter_id: ChapterId) {
        self.quizzes.retain(|_, quiz| quiz.chapter_id != chapter_id);
        self.progress.retain(|_, entry| entry.chapter_id != chapter_id);
    }
}

fn page<T: Clone>(rows: impl Iterator<Item = T>, skip: i64, limit: i64) -> Vec<T> {
    rows.skip(skip.max(0) as usize).take(limit.max(0) as usize).collect()
}

fn foreign_key(table: &str, constraint: &str) -> DbError {
    DbError::ForeignKeyViolation {
        constraint: Some(constraint.to_string()),
        table: Some(table.to_string()),
        message: format!("insert or update on table \"{table}\" violates foreign key constraint \"{constraint}\""),
    }
}

fn check(table: &str, constraint: &str) -> DbError {
    DbError::CheckViolation {
        constraint: Some(constraint.to_string()),
        table: Some(table.to_string()),
        message: format!("new row for relation \"{table}\" violates check constraint \"{constraint}\""),
    }
}

type Shared = Arc<Mutex<Tables>>;

pub struct MemoryUsers {
    tables: Shared,
}

pub struct MemoryBooks {
    tables: Shared,
}

pub struct MemoryChapters {
    tables: Shared,
}

pub struct MemoryQuizzes {
    tables: Shared,
}

pub struct MemoryProgress {
    tables: Shared,
}

/// All repositories over one shared set of tables.
pub struct MemoryStore {
    users: MemoryUsers,
    books: MemoryBooks,
    chapters: MemoryChapters,
    quizzes: MemoryQuizzes,
    progress: MemoryProgress,
}

impl MemoryStore {
    pub fn new() -> Self {
        let tables: Shared = Arc::new(Mutex::new(Tables::default()));
        Self {
            users: MemoryUsers { tables: tables.clone() },
            books: MemoryBooks { tables: tables.clone() },
            chapters: MemoryChapters { tables: tables.clone() },
            quizzes: MemoryQuizzes { tables: tables.clone() },
            progress: MemoryProgress { tables },
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Store for MemoryStore {
    fn users(&self) -> &dyn UserRepository {
        &self.users
    }

    fn books(&self) -> &dyn BookRepository {
        &self.books
    }

    fn chapters(&self) -> &dyn ChapterRepository {
        &self.chapters
    }

    fn quizzes(&self) -> &dyn QuizRepository {
        &self.quizzes
    }

    fn progress(&self) -> &dyn ProgressRepository {
        &self.progress
    }
}

#[async_trait::async_trait]
impl Repository for MemoryUsers {
    type CreateRequest = UserCreateDBRequest;
    type UpdateRequest = UserUpdateDBRequest;
    type Response = UserDBResponse;
    type Id = UserId;
    type Filter = UserFilter;

    async fn create(&self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let mut tables = self.tables.lock().await;

        if request.password_hash.is_empty() {
            return Err(check("users", "users_password_hash_not_empty"));
        }
        if tables.users.values().any(|u| u.username == request.username) {
            return Err(DbError::unique("users", "users_username_key"));
        }
        if tables.users.values().any(|u| u.email == request.email) {
            return Err(DbError::unique("users", "users_email_key"));
        }

        let now = Utc::now();
        let user = UserDBResponse {
            id: tables.next_id(),
            username: request.username.clone(),
            email: request.email.clone(),
            password_hash: request.password_hash.clone(),
            names: request.names.clone(),
            role: request.role,
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_by_id(&self, id: Self::Id) -> Result<Option<Self::Response>> {
        Ok(self.tables.lock().await.users.get(&id).cloned())
    }

    async fn list(&self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let tables = self.tables.lock().await;
        Ok(page(tables.users.values().cloned(), filter.skip, filter.limit))
    }

    async fn delete(&self, id: Self::Id) -> Result<bool> {
        let mut tables = self.tables.lock().await;
        let removed = tables.users.remove(&id).is_some();
        if removed {
            tables.progress.retain(|(user_id, _), _| *user_id != id);
        }
        Ok(removed)
    }

    async fn update(&self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let mut tables = self.tables.lock().await;
        let user = tables.users.get_mut(&id).ok_or(DbError::NotFound)?;

        if let Some(names) = &request.names {
            user.names = Some(names.clone());
        }
        if let Some(role) = request.role {
            user.role = role;
        }
        if let Some(password_hash) = &request.password_hash {
            user.password_hash = password_hash.clone();
        }
        user.updated_at = Utc::now();

        Ok(user.clone())
    }
}

#[async_trait::async_trait]
impl UserRepository for MemoryUsers {
    async fn get_user_by_email(&self, email: &str) -> Result<Option<UserDBResponse>> {
        let tables = self.tables.lock().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<UserDBResponse>> {
        let tables = self.tables.lock().await;
        Ok(tables.users.values().find(|u| u.username == username).cloned())
    }

    async fn count(&self) -> Result<i64> {
        Ok(self.tables.lock().await.users.len() as i64)
    }
}

#[async_trait::async_trait]
impl Repository for MemoryBooks {
    type CreateRequest = BookCreateDBRequest;
    type UpdateRequest = BookUpdateDBRequest;
    type Response = BookDBResponse;
    type Id = BookId;
    type Filter = BookFilter;

    async fn create(&self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let mut tables = self.tables.lock().await;

        if tables
            .books
            .values()
            .any(|b| b.title == request.title && b.author == request.author)
        {
            return Err(DbError::unique("books", "books_title_author_key"));
        }

        let now = Utc::now();
        let book = BookDBResponse {
            id: tables.next_id(),
            title: request.title.clone(),
            author: request.author.clone(),
            description: request.description.clone(),
            published_on: request.published_on,
            created_at: now,
            updated_at: now,
        };
        tables.books.insert(book.id, book.clone());
        Ok(book)
    }

    async fn get_by_id(&self, id: Self::Id) -> Result<Option<Self::Response>> {
        Ok(self.tables.lock().await.books.get(&id).cloned())
    }

    async fn list(&self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let tables = self.tables.lock().await;
        Ok(page(tables.books.values().cloned(), filter.skip, filter.limit))
    }

    async fn delete(&self, id: Self::Id) -> Result<bool> {
        let mut tables = self.tables.lock().await;
        if tables.books.remove(&id).is_none() {
            return Ok(false);
        }

        tables.chapters.retain(|_, chapter| chapter.book_id != id);
        tables.quizzes.retain(|_, quiz| quiz.book_id != id);
        tables.progress.retain(|_, entry| entry.book_id != id);
        Ok(true)
    }

    async fn update(&self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let mut tables = self.tables.lock().await;
        let current = tables.books.get(&id).ok_or(DbError::NotFound)?;

        let title = request.title.clone().unwrap_or_else(|| current.title.clone());
        let author = request.author.clone().unwrap_or_else(|| current.author.clone());
        if tables
            .books
            .values()
            .any(|b| b.id != id && b.title == title && b.author == author)
        {
            return Err(DbError::unique("books", "books_title_author_key"));
        }

        let book = tables.books.get_mut(&id).ok_or(DbError::NotFound)?;
        book.title = title;
        book.author = author;
        if let Some(description) = &request.description {
            book.description = Some(description.clone());
        }
        if let Some(published_on) = request.published_on {
            book.published_on = Some(published_on);
        }
        book.updated_at = Utc::now();

        Ok(book.clone())
    }
}

#[async_trait::async_trait]
impl BookRepository for MemoryBooks {
    async fn count(&self) -> Result<i64> {
        Ok(self.tables.lock().await.books.len() as i64)
    }
}

#[async_trait::async_trait]
impl Repository for MemoryChapters {
    type CreateRequest = ChapterCreateDBRequest;
    type UpdateRequest = ChapterUpdateDBRequest;
    type Response = ChapterDBResponse;
    type Id = ChapterId;
    type Filter = BookId;

    async fn create(&self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let mut tables = self.tables.lock().await;

        if !tables.books.contains_key(&request.book_id) {
            return Err(foreign_key("chapters", "chapters_book_id_fkey"));
        }

        let now = Utc::now();
        let chapter = ChapterDBResponse {
            id: tables.next_id(),
            book_id: request.book_id,
            title: request.title.clone(),
            content: request.content.clone(),
            created_at: now,
            updated_at: now,
        };
        tables.chapters.insert(chapter.id, chapter.clone());
        Ok(chapter)
    }

    async fn get_by_id(&self, id: Self::Id) -> Result<Option<Self::Response>> {
        Ok(self.tables.lock().await.chapters.get(&id).cloned())
    }

    async fn list(&self, book_id: &Self::Filter) -> Result<Vec<Self::Response>> {
        let tables = self.tables.lock().await;
        let mut chapters: Vec<_> = tables
            .chapters
            .values()
            .filter(|c| c.book_id == *book_id)
            .cloned()
            .collect();
        chapters.sort_by_key(|c| (c.created_at, c.id));
        Ok(chapters)
    }

    async fn delete(&self, id: Self::Id) -> Result<bool> {
        let mut tables = self.tables.lock().await;
        if tables.chapters.remove(&id).is_none() {
            return Ok(false);
        }

        tables.delete_chapter_cascade(id);
        Ok(true)
    }

    async fn update(&self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let mut tables = self.tables.lock().await;
        let chapter = tables.chapters.get_mut(&id).ok_or(DbError::NotFound)?;

        if let Some(title) = &request.title {
            chapter.title = title.clone();
        }
        if let Some(content) = &request.content {
            chapter.content = content.clone();
        }
        chapter.updated_at = Utc::now();

        Ok(chapter.clone())
    }
}

#[async_trait::async_trait]
impl QuizRepository for MemoryQuizzes {
    async fn create(&self, request: &QuizCreateDBRequest) -> Result<QuizDBResponse> {
        let mut tables = self.tables.lock().await;

        if !tables.books.contains_key(&request.book_id) {
            return Err(foreign_key("quizzes", "quizzes_book_id_fkey"));
        }
        if !tables.chapters.contains_key(&request.chapter_id) {
            return Err(foreign_key("quizzes", "quizzes_chapter_id_fkey"));
        }
        if tables.quizzes.values().any(|q| q.chapter_id == request.chapter_id) {
            return Err(DbError::unique("quizzes", "quizzes_chapter_id_key"));
        }

        let quiz_id = tables.next_id();
        let mut questions = Vec::with_capacity(request.questions.len());
        for (index, question) in request.questions.iter().enumerate() {
            questions.push(QuestionDBResponse {
                id: tables.next_id(),
                quiz_id,
                position: index as i32 + 1,
                text: question.text.clone(),
                answer: question.answer.clone(),
            });
        }

        let quiz = QuizDBResponse {
            id: quiz_id,
            book_id: request.book_id,
            chapter_id: request.chapter_id,
            title: request.title.clone(),
            questions,
            created_at: Utc::now(),
        };
        tables.quizzes.insert(quiz.id, quiz.clone());
        Ok(quiz)
    }

    async fn get_by_id(&self, id: QuizId) -> Result<Option<QuizDBResponse>> {
        Ok(self.tables.lock().await.quizzes.get(&id).cloned())
    }

    async fn get_by_chapter(&self, chapter_id: ChapterId) -> Result<Option<QuizDBResponse>> {
        let tables = self.tables.lock().await;
        Ok(tables.quizzes.values().find(|q| q.chapter_id == chapter_id).cloned())
    }

    async fn delete(&self, id: QuizId) -> Result<bool> {
        Ok(self.tables.lock().await.quizzes.remove(&id).is_some())
    }
}

#[async_trait::async_trait]
impl ProgressRepository for MemoryProgress {
    async fn upsert(&self, request: &ProgressUpsertDBRequest) -> Result<ProgressDBResponse> {
        let mut tables = self.tables.lock().await;

        if !tables.users.contains_key(&request.user_id) {
            return Err(foreign_key("user_progress", "user_progress_user_id_fkey"));
        }
        if !tables.books.contains_key(&request.book_id) {
            return Err(foreign_key("user_progress", "user_progress_book_id_fkey"));
        }
        if !tables.chapters.contains_key(&request.chapter_id) {
            return Err(foreign_key("user_progress", "user_progress_chapter_id_fkey"));
        }

        let entry = tables
            .progress
            .entry((request.user_id, request.chapter_id))
            .or_insert_with(|| ProgressDBResponse {
                user_id: request.user_id,
                book_id: request.book_id,
                chapter_id: request.chapter_id,
                completed: request.completed,
                updated_at: Utc::now(),
            });
        entry.completed = request.completed;
        entry.updated_at = Utc::now();

        Ok(entry.clone())
    }

    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<ProgressDBResponse>> {
        let tables = self.tables.lock().await;
        let mut entries: Vec<_> = tables
            .progress
            .values()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect();
        entries.sort_by_key(|p| (p.book_id, p.chapter_id));
        Ok(entries)
    }
}
