//! In-memory book catalog
//!
//! Built once at startup and shared read-only behind an `Arc`. Two layouts
//! are supported: an ordered sequence (duplicates allowed) and a mapping keyed
//! by ISBN (unique keys).

use crate::{Book, Error, Result};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::str::FromStr;

/// Storage layout of a catalog
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CatalogLayout {
    /// Ordered list, listed in definition order
    Sequence,
    /// Map keyed by ISBN, listed by ascending ISBN
    #[default]
    Keyed,
}

impl CatalogLayout {
    pub fn as_str(&self) -> &'static str {
        match self {
            CatalogLayout::Sequence => "sequence",
            CatalogLayout::Keyed => "keyed",
        }
    }
}

impl FromStr for CatalogLayout {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "sequence" => Ok(CatalogLayout::Sequence),
            "keyed" => Ok(CatalogLayout::Keyed),
            other => Err(Error::config(
                "catalog_layout",
                format!("unknown layout '{other}', expected 'sequence' or 'keyed'"),
            )),
        }
    }
}

impl std::fmt::Display for CatalogLayout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
enum Storage {
    Sequence(Vec<Book>),
    Keyed(BTreeMap<String, Book>),
}

/// Read-only collection of books
#[derive(Debug, Clone)]
pub struct Catalog {
    storage: Storage,
}

impl Catalog {
    /// Sequence catalog in the given order
    pub fn sequence(books: impl IntoIterator<Item = Book>) -> Self {
        Self {
            storage: Storage::Sequence(books.into_iter().collect()),
        }
    }

    /// Catalog keyed by ISBN; a repeated ISBN is rejected
    pub fn keyed(books: impl IntoIterator<Item = Book>) -> Result<Self> {
        let mut map = BTreeMap::new();
        for book in books {
            match map.entry(book.isbn.clone()) {
                Entry::Occupied(entry) => return Err(Error::DuplicateIsbn(entry.key().clone())),
                Entry::Vacant(entry) => {
                    entry.insert(book);
                }
            }
        }
        Ok(Self {
            storage: Storage::Keyed(map),
        })
    }

    /// Catalog with the given layout holding `books`
    pub fn with_layout(layout: CatalogLayout, books: impl IntoIterator<Item = Book>) -> Result<Self> {
        match layout {
            CatalogLayout::Sequence => Ok(Self::sequence(books)),
            CatalogLayout::Keyed => Self::keyed(books),
        }
    }

    /// The fixture catalog in the given layout
    pub fn fixtures(layout: CatalogLayout) -> Result<Self> {
        Self::with_layout(layout, fixture_books())
    }

    pub fn layout(&self) -> CatalogLayout {
        match self.storage {
            Storage::Sequence(_) => CatalogLayout::Sequence,
            Storage::Keyed(_) => CatalogLayout::Keyed,
        }
    }

    pub fn len(&self) -> usize {
        match &self.storage {
            Storage::Sequence(books) => books.len(),
            Storage::Keyed(books) => books.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of every book
    ///
    /// Sequence catalogs keep definition order; keyed catalogs are listed by
    /// ascending ISBN.
    pub fn all_books(&self) -> Vec<Book> {
        match &self.storage {
            Storage::Sequence(books) => books.clone(),
            Storage::Keyed(books) => books.values().cloned().collect(),
        }
    }
}

/// Books every catalog starts with
pub fn fixture_books() -> Vec<Book> {
    vec![
        Book::new("The Hitchhiker's Guide to the Galaxy", "Douglas Adams", "0345391802"),
        Book::new("Cloud Native Go", "M.-Leander Reimer", "0000000000"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_sequence_fixtures_keep_definition_order() {
        let catalog = Catalog::fixtures(CatalogLayout::Sequence).unwrap();
        assert_eq!(catalog.layout(), CatalogLayout::Sequence);
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.all_books(), fixture_books());
    }

    #[test]
    fn test_keyed_fixtures_sorted_by_isbn() {
        let catalog = Catalog::fixtures(CatalogLayout::Keyed).unwrap();
        let books = catalog.all_books();

        assert_eq!(books.len(), 2);
        assert_eq!(books[0].isbn, "0000000000");
        assert_eq!(books[0].title, "Cloud Native Go");
        assert_eq!(books[0].author, "M.-Leander Reimer");
        assert_eq!(books[1].isbn, "0345391802");
        assert_eq!(books[1].title, "The Hitchhiker's Guide to the Galaxy");
        assert_eq!(books[1].author, "Douglas Adams");
    }

    #[test]
    fn test_sequence_allows_duplicates() {
        let book = Book::new("Cloud Native Go", "M.-Leander Reimer", "0000000000");
        let catalog = Catalog::sequence([book.clone(), book.clone()]);
        assert_eq!(catalog.all_books(), vec![book.clone(), book]);
    }

    #[test]
    fn test_keyed_rejects_duplicate_isbn() {
        let err = Catalog::keyed([
            Book::new("First", "A", "0000000000"),
            Book::new("Second", "B", "0000000000"),
        ])
        .unwrap_err();

        assert!(matches!(err, Error::DuplicateIsbn(ref isbn) if isbn == "0000000000"));
    }

    #[test]
    fn test_snapshot_is_independent() {
        let catalog = Catalog::fixtures(CatalogLayout::Keyed).unwrap();
        let mut snapshot = catalog.all_books();
        snapshot.clear();

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.all_books().len(), 2);
    }

    #[test]
    fn test_empty_catalog() {
        let catalog = Catalog::sequence(Vec::new());
        assert!(catalog.is_empty());
        assert!(catalog.all_books().is_empty());
    }

    #[test]
    fn test_layout_parse() {
        assert_eq!("sequence".parse::<CatalogLayout>().unwrap(), CatalogLayout::Sequence);
        assert_eq!(" Keyed ".parse::<CatalogLayout>().unwrap(), CatalogLayout::Keyed);
        assert!("map".parse::<CatalogLayout>().is_err());
        assert!("list".parse::<CatalogLayout>().is_err());
        assert_eq!(CatalogLayout::default().to_string(), "keyed");
    }
}
