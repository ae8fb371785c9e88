use anyhow::{Context, Result};
use rusqlite::types::Value;
use rusqlite::OptionalExtension;
use uuid::Uuid;

use quill_types::{Book, BookOrdering};

use crate::db::DbPool;

/// Declared filter fields for book listings
#[derive(Debug, Default)]
pub struct BookFilter {
    pub title: Option<String>,
    pub publication_year: Option<i32>,
    pub author_id: Option<Uuid>,
    /// Substring search over book title and author name
    pub search: Option<String>,
    pub ordering: BookOrdering,
}

pub struct BookRepository {
    pool: DbPool,
}

impl BookRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn create(&self, book: &Book) -> Result<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO books (id, title, author_id, publication_year) VALUES (?, ?, ?, ?)",
            (
                book.id.to_string(),
                &book.title,
                book.author_id.to_string(),
                book.publication_year,
            ),
        )
        .context("Failed to create book")?;
        Ok(())
    }

    pub fn get_by_id(&self, book_id: &Uuid) -> Result<Option<Book>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT b.id, b.title, b.author_id, a.name, b.publication_year
             FROM books b
             JOIN authors a ON b.author_id = a.id
             WHERE b.id = ?",
        )?;

        let book = stmt
            .query_row([book_id.to_string()], Self::row_to_book)
            .optional()?;

        Ok(book)
    }

    /// List books with equality filters, substring search, and ordering
    pub fn list(&self, filter: &BookFilter) -> Result<Vec<Book>> {
        let conn = self.pool.get()?;

        let mut clauses: Vec<&str> = Vec::new();
        let mut params_vec: Vec<Value> = Vec::new();

        if let Some(title) = &filter.title {
            clauses.push("b.title = ?");
            params_vec.push(title.clone().into());
        }
        if let Some(year) = filter.publication_year {
            clauses.push("b.publication_year = ?");
            params_vec.push(i64::from(year).into());
        }
        if let Some(author_id) = &filter.author_id {
            clauses.push("b.author_id = ?");
            params_vec.push(author_id.to_string().into());
        }
        if let Some(search) = &filter.search {
            clauses.push("(b.title LIKE '%' || ? || '%' OR a.name LIKE '%' || ? || '%')");
            params_vec.push(search.clone().into());
            params_vec.push(search.clone().into());
        }

        let where_clause = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        };

        let order_clause = match filter.ordering {
            BookOrdering::Title => "ORDER BY b.title ASC",
            BookOrdering::TitleDesc => "ORDER BY b.title DESC",
            BookOrdering::PublicationYear => "ORDER BY b.publication_year ASC, b.title ASC",
            BookOrdering::PublicationYearDesc => "ORDER BY b.publication_year DESC, b.title ASC",
        };

        let query = format!(
            "SELECT b.id, b.title, b.author_id, a.name, b.publication_year
             FROM books b
             JOIN authors a ON b.author_id = a.id
             {} {}",
            where_clause, order_clause
        );

        let mut stmt = conn.prepare(&query)?;
        let books = stmt
            .query_map(rusqlite::params_from_iter(params_vec), Self::row_to_book)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(books)
    }

    /// Books belonging to one author, ordered by title
    pub fn get_by_author(&self, author_id: &Uuid) -> Result<Vec<Book>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT b.id, b.title, b.author_id, a.name, b.publication_year
             FROM books b
             JOIN authors a ON b.author_id = a.id
             WHERE b.author_id = ?
             ORDER BY b.title",
        )?;

        let books = stmt
            .query_map([author_id.to_string()], Self::row_to_book)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(books)
    }

    pub fn update(&self, book: &Book) -> Result<usize> {
        let conn = self.pool.get()?;
        let rows = conn
            .execute(
                "UPDATE books SET title = ?, author_id = ?, publication_year = ? WHERE id = ?",
                (
                    &book.title,
                    book.author_id.to_string(),
                    book.publication_year,
                    book.id.to_string(),
                ),
            )
            .context("Failed to update book")?;
        Ok(rows)
    }

    pub fn delete(&self, book_id: &Uuid) -> Result<usize> {
        let conn = self.pool.get()?;
        let rows = conn
            .execute("DELETE FROM books WHERE id = ?", [book_id.to_string()])
            .context("Failed to delete book")?;
        Ok(rows)
    }

    fn row_to_book(row: &rusqlite::Row<'_>) -> rusqlite::Result<Book> {
        Ok(Book {
            id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap(),
            title: row.get(1)?,
            author_id: Uuid::parse_str(&row.get::<_, String>(2)?).unwrap(),
            author_name: row.get(3)?,
            publication_year: row.get(4)?,
        })
    }
}
