// OSIntranet - Core Library
// Address book, bookkeeping, calendar and food waste households.
// Exposes all modules for use in the CLI, the API server and tests.

pub mod error;
pub mod validation;
pub mod foodwaste;       // Households, members, storages, food groups
pub mod finansstyring;   // Regnskaber, konti, budgetkonti, bogføring
pub mod adressekartotek; // Persons and companies
pub mod kalender;        // Users and appointments
pub mod builder;         // Flat views → object graphs
pub mod repository;      // SQLite persistence + audit events
pub mod service;         // Query and command handlers
pub mod import;          // CSV import of posting lines
pub mod config;
pub mod logging;

// Re-export commonly used types
pub use error::{FaultKind, IntranetError, IntranetResult};
pub use validation::{DomainObjectValidations, Range};
pub use foodwaste::{
    DataProvider, FoodGroup, FoodGroupCollection, FoodItem, ForeignKey, Household,
    HouseholdMember, Membership, Payment, Storage, StorageType, Translatable, Translation,
    TranslationInfo,
};
pub use finansstyring::{
    Bogforingsadvarsel, Bogforingslinje, Bogforingsresultat, Budgetkonto, Konto, Money,
    Postering, Regnskab,
};
pub use adressekartotek::{Adresse, Adressekartotek, Firma, Person, Telefonlisteelement};
pub use kalender::{Aftale, Bruger, Kalender};
pub use builder::DomainObjectBuilder;
pub use repository::{
    AdresseRepository, AuditRepository, Event, FinansstyringRepository, FoodWasteRepository,
    KalenderRepository, SqliteRepository,
};
pub use service::{
    AdresseService, CommandHandler, FinansstyringService, FoodWasteService, KalenderService,
    QueryHandler,
};
pub use import::{import_posteringer, load_csv, read_posteringer, ImportReport};
pub use config::Config;
pub use logging::LogFormat;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
