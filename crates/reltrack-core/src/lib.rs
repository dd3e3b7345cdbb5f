// Core tracker logic - models, state, and the backend seam
pub mod backend;
pub mod config;
pub mod controller;
pub mod date;
pub mod error;
pub mod models;
pub mod notifications;

pub use backend::{FetchPolicy, GraphQlBackend, TrackerBackend};
pub use config::Config;
pub use controller::{Controller, Effect, Message, TrackerState};
pub use date::format_release_date;
pub use error::{Error, ErrorKind};
pub use models::{Release, Repository, RepositoryDetails};
pub use notifications::{Notice, NoticeLevel, ToastQueue};

/// Result type alias because typing Result<T, Error> everywhere is tedious
pub type Result<T> = std::result::Result<T, Error>;
