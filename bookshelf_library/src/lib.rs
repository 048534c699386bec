pub mod api;
pub mod dashboard;
pub mod library_view;
pub mod reading_status;

#[cfg(any(feature = "client", test))]
pub mod client;

#[cfg(any(feature = "server", test))]
pub mod app_config;
#[cfg(any(feature = "server", test))]
pub mod books_repository;
#[cfg(any(feature = "server", test))]
pub mod brazilian_catalog;
#[cfg(any(feature = "server", test))]
pub mod catalog_search;
#[cfg(any(feature = "server", test))]
pub mod cover_lookup;
#[cfg(any(feature = "server", test))]
pub mod genres_repository;
#[cfg(any(feature = "server", test))]
mod handlers;
#[cfg(any(feature = "server", test))]
pub mod passwords;
#[cfg(any(feature = "server", test))]
pub mod postgres;
#[cfg(any(feature = "server", test))]
pub mod seed;
#[cfg(any(feature = "server", test))]
pub mod settings;
#[cfg(any(feature = "server", test))]
pub mod users_repository;
