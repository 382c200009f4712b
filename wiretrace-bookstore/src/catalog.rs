//! The read-only book catalog.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One catalog entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    /// Title, also the catalog key
    pub name: String,
    /// Author
    pub author: String,
    /// Price in the smallest currency unit
    pub price: i32,
}

impl Book {
    fn new(name: &str, author: &str, price: i32) -> Self {
        Book {
            name: name.to_owned(),
            author: author.to_owned(),
            price,
        }
    }
}

/// Books keyed by title.
///
/// A catalog is built once and only read afterwards; share it between
/// handlers behind an `Arc`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Catalog {
    books: BTreeMap<String, Book>,
}

impl Default for Catalog {
    /// The five titles the BookStore service ships with.
    fn default() -> Self {
        Catalog::from_books([
            Book::new("Great Gatsby", "Scott Fitzgerald", 300),
            Book::new("To Kill MockingBird", "Harper Lee", 400),
            Book::new("Passage to India", "E.M.Forster", 500),
            Book::new("The Side of Paradise", "Scott Fitzgerald", 600),
            Book::new("Go Set a Watchman", "Harper Lee", 700),
        ])
    }
}

impl Catalog {
    /// Builds a catalog; a later book with the same title replaces an
    /// earlier one.
    pub fn from_books(books: impl IntoIterator<Item = Book>) -> Self {
        Catalog {
            books: books
                .into_iter()
                .map(|book| (book.name.clone(), book))
                .collect(),
        }
    }

    /// The first book, in title order, whose title starts with `query` once
    /// surrounding whitespace is trimmed from it.
    ///
    /// ```
    /// use wiretrace_bookstore::Catalog;
    ///
    /// let catalog = Catalog::default();
    /// assert_eq!(catalog.first(" Great ").unwrap().author, "Scott Fitzgerald");
    /// assert!(catalog.first("Zzz").is_none());
    /// ```
    pub fn first(&self, query: &str) -> Option<&Book> {
        let query = query.trim();
        self.books
            .values()
            .find(|book| book.name.starts_with(query))
    }

    /// Number of books.
    pub fn len(&self) -> usize {
        self.books.len()
    }

    /// True when the catalog holds no books.
    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }
}
