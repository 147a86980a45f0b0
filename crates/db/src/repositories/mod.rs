mod price_book_repo;

pub use price_book_repo::PriceBookRepo;
