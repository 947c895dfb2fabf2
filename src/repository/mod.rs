// Repositories - the storage seam
//
// Services only talk to these traits. SqliteRepository is the one
// implementation; tests run it against an in-memory database.

pub mod sqlite;

pub use sqlite::{get_events_for_entity, insert_event, setup_database, SqliteRepository};

use crate::adressekartotek::{Adresse, Adressegruppe, Adressekartotek, Betalingsbetingelse};
use crate::builder::RegnskabView;
use crate::error::IntranetResult;
use crate::finansstyring::{Bogforingslinje, Regnskab};
use crate::foodwaste::{DataProvider, FoodGroupCollection, FoodItem, Household, HouseholdMember, StorageType};
use crate::kalender::Kalender;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Audit trail entry, one per executed command
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Event {
    pub event_id: String,
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    pub entity_type: String,
    pub entity_id: String,
    pub data: serde_json::Value,
    pub actor: String,
}

impl Event {
    pub fn new(
        event_type: &str,
        entity_type: &str,
        entity_id: impl ToString,
        data: serde_json::Value,
        actor: &str,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event_type: event_type.to_string(),
            entity_type: entity_type.to_string(),
            entity_id: entity_id.to_string(),
            data,
            actor: actor.to_string(),
        }
    }
}

pub trait AuditRepository {
    fn record_event(&self, event: &Event) -> IntranetResult<()>;
    fn events_for(&self, entity_type: &str, entity_id: &str) -> IntranetResult<Vec<Event>>;
}

pub trait FinansstyringRepository {
    fn regnskaber(&self) -> IntranetResult<Vec<RegnskabView>>;

    /// Loads the whole regnskab; NotFound if the number is unknown
    fn regnskab(&self, nummer: i32) -> IntranetResult<Regnskab>;

    /// Writes the regnskab, its groups and accounts. Existing posting lines
    /// are left alone; new ones are appended.
    fn save_regnskab(&self, regnskab: &Regnskab) -> IntranetResult<()>;

    /// Appends one line. Returns false when the idempotency hash is known.
    fn insert_bogforingslinje(
        &self,
        regnskab: i32,
        linje: &Bogforingslinje,
        idempotency_hash: Option<&str>,
    ) -> IntranetResult<bool>;

    fn has_idempotency_hash(&self, idempotency_hash: &str) -> IntranetResult<bool>;

    /// Appends imported lines and the import event in one transaction.
    /// Lines whose hash is already stored are skipped; `event` gets the
    /// number written. Any failure leaves nothing behind.
    fn import_bogforingslinjer<F>(
        &self,
        regnskab: i32,
        linjer: &[(Bogforingslinje, String)],
        event: F,
    ) -> IntranetResult<usize>
    where
        F: FnOnce(usize) -> IntranetResult<Event>;
}

pub trait AdresseRepository {
    fn adressekartotek(&self) -> IntranetResult<Adressekartotek>;
    fn save_adressegruppe(&self, gruppe: &Adressegruppe) -> IntranetResult<()>;
    fn save_betalingsbetingelse(&self, betingelse: &Betalingsbetingelse) -> IntranetResult<()>;
    fn save_adresse(&self, adresse: &Adresse) -> IntranetResult<()>;
}

pub trait FoodWasteRepository {
    fn household_member(&self, identifier: Uuid) -> IntranetResult<HouseholdMember>;
    fn household_member_by_mail(&self, mail_address: &str) -> IntranetResult<Option<HouseholdMember>>;
    fn save_household_member(&self, member: &HouseholdMember) -> IntranetResult<()>;

    fn household(&self, identifier: Uuid) -> IntranetResult<Household>;
    fn households(&self) -> IntranetResult<Vec<Household>>;
    fn save_household(&self, household: &Household) -> IntranetResult<()>;

    fn data_providers(&self) -> IntranetResult<Vec<DataProvider>>;
    fn save_data_provider(&self, data_provider: &DataProvider) -> IntranetResult<()>;

    fn storage_type(&self, identifier: Uuid) -> IntranetResult<StorageType>;
    fn save_storage_type(&self, storage_type: &StorageType) -> IntranetResult<()>;

    fn food_groups(&self) -> IntranetResult<FoodGroupCollection>;
    fn save_food_groups(&self, food_groups: &FoodGroupCollection) -> IntranetResult<()>;

    fn food_items(&self) -> IntranetResult<Vec<FoodItem>>;
    fn save_food_item(&self, food_item: &FoodItem) -> IntranetResult<()>;
}

pub trait KalenderRepository {
    /// The calendar of one system; empty if nothing is stored yet
    fn kalender(&self, system: i32) -> IntranetResult<Kalender>;
    fn save_kalender(&self, system: i32, kalender: &Kalender) -> IntranetResult<()>;
}
