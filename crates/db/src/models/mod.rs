pub mod price_book;
