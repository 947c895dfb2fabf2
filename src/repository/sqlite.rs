use super::{
    AdresseRepository, AuditRepository, Event, FinansstyringRepository, FoodWasteRepository,
    KalenderRepository,
};
use crate::adressekartotek::{Adresse, Adressegruppe, Adressekartotek, Betalingsbetingelse};
use crate::builder::{
    AdresseInfoView, AdressegruppeView, BetalingsbetingelseView, BogforingslinjeView,
    BudgetkontoView, BudgetkontogruppeView, DomainObjectBuilder, FirmaView, KontoView,
    KontogruppeView, PersonView, RegnskabView,
};
use crate::error::{IntranetError, IntranetResult};
use crate::finansstyring::{
    Bogforingslinje, Budgetoplysninger, KontogruppeType, Kreditoplysninger, Money, Regnskab,
};
use crate::foodwaste::{DataProvider, FoodGroup, FoodGroupCollection, FoodItem, Household, HouseholdMember, StorageType};
use crate::kalender::Kalender;
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};
use uuid::Uuid;

const DATO_FORMAT: &str = "%Y-%m-%d";

const HOUSEHOLD_MEMBER: &str = "household_member";
const HOUSEHOLD: &str = "household";
const DATA_PROVIDER: &str = "data_provider";
const STORAGE_TYPE: &str = "storage_type";
const FOOD_GROUP: &str = "food_group";
const FOOD_ITEM: &str = "food_item";
const KALENDER: &str = "kalender";

// ============================================================================
// SCHEMA
// ============================================================================

pub fn setup_database(conn: &Connection) -> IntranetResult<()> {
    // WAL for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    // ==========================================================================
    // Finansstyring
    // ==========================================================================
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS regnskaber (
            nummer INTEGER PRIMARY KEY,
            navn TEXT NOT NULL,
            brevhoved INTEGER
        );
        CREATE TABLE IF NOT EXISTS kontogrupper (
            nummer INTEGER PRIMARY KEY,
            navn TEXT NOT NULL,
            kontogruppe_type TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS budgetkontogrupper (
            nummer INTEGER PRIMARY KEY,
            navn TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS konti (
            regnskab INTEGER NOT NULL,
            kontonummer TEXT NOT NULL,
            kontonavn TEXT NOT NULL,
            beskrivelse TEXT,
            note TEXT,
            kontogruppe INTEGER NOT NULL,
            PRIMARY KEY (regnskab, kontonummer)
        );
        CREATE TABLE IF NOT EXISTS kreditoplysninger (
            regnskab INTEGER NOT NULL,
            kontonummer TEXT NOT NULL,
            aar INTEGER NOT NULL,
            maaned INTEGER NOT NULL,
            kredit INTEGER NOT NULL,
            PRIMARY KEY (regnskab, kontonummer, aar, maaned)
        );
        CREATE TABLE IF NOT EXISTS budgetkonti (
            regnskab INTEGER NOT NULL,
            kontonummer TEXT NOT NULL,
            kontonavn TEXT NOT NULL,
            beskrivelse TEXT,
            note TEXT,
            budgetkontogruppe INTEGER NOT NULL,
            PRIMARY KEY (regnskab, kontonummer)
        );
        CREATE TABLE IF NOT EXISTS budgetoplysninger (
            regnskab INTEGER NOT NULL,
            kontonummer TEXT NOT NULL,
            aar INTEGER NOT NULL,
            maaned INTEGER NOT NULL,
            indtaegter INTEGER NOT NULL,
            udgifter INTEGER NOT NULL,
            PRIMARY KEY (regnskab, kontonummer, aar, maaned)
        );
        CREATE TABLE IF NOT EXISTS bogforingslinjer (
            regnskab INTEGER NOT NULL,
            lobenummer INTEGER NOT NULL,
            dato TEXT NOT NULL,
            bilag TEXT,
            kontonummer TEXT NOT NULL,
            tekst TEXT NOT NULL,
            budgetkontonummer TEXT,
            debit INTEGER NOT NULL,
            kredit INTEGER NOT NULL,
            adressenummer INTEGER,
            idempotency_hash TEXT UNIQUE,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            PRIMARY KEY (regnskab, lobenummer)
        );",
    )?;

    // ==========================================================================
    // Adressekartotek
    // ==========================================================================
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS adressegrupper (
            nummer INTEGER PRIMARY KEY,
            navn TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS betalingsbetingelser (
            nummer INTEGER PRIMARY KEY,
            navn TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS adresser (
            nummer INTEGER PRIMARY KEY,
            type TEXT NOT NULL,
            navn TEXT NOT NULL,
            adresse1 TEXT,
            adresse2 TEXT,
            postnr_by TEXT,
            adressegruppe INTEGER NOT NULL,
            bekendtskab TEXT,
            mailadresse TEXT,
            webadresse TEXT,
            betalingsbetingelse INTEGER,
            udlaansfrist INTEGER,
            filofax_adresselabel INTEGER NOT NULL DEFAULT 0,
            telefon TEXT,
            mobil TEXT,
            fodselsdato TEXT,
            telefon1 TEXT,
            telefon2 TEXT,
            telefax TEXT,
            firma INTEGER
        );",
    )?;

    // ==========================================================================
    // Documents (food waste and calendar aggregates as JSON)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS documents (
            kind TEXT NOT NULL,
            id TEXT NOT NULL,
            data TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            PRIMARY KEY (kind, id)
        )",
        [],
    )?;

    // ==========================================================================
    // Events Table (audit trail)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS events (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            event_id TEXT UNIQUE NOT NULL,
            timestamp TEXT NOT NULL,
            event_type TEXT NOT NULL,
            entity_type TEXT NOT NULL,
            entity_id TEXT NOT NULL,
            data TEXT NOT NULL,
            actor TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    // ==========================================================================
    // Indexes
    // ==========================================================================
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_linjer_dato ON bogforingslinjer(regnskab, dato)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_events_entity ON events(entity_type, entity_id)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_events_timestamp ON events(timestamp)",
        [],
    )?;

    Ok(())
}

// ============================================================================
// EVENTS
// ============================================================================

pub fn insert_event(conn: &Connection, event: &Event) -> IntranetResult<()> {
    let data_json = serde_json::to_string(&event.data)?;

    conn.execute(
        "INSERT INTO events (
            event_id, timestamp, event_type, entity_type, entity_id, data, actor
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            event.event_id,
            event.timestamp.to_rfc3339(),
            event.event_type,
            event.entity_type,
            event.entity_id,
            data_json,
            event.actor,
        ],
    )?;

    Ok(())
}

/// Events for one entity, newest first
pub fn get_events_for_entity(
    conn: &Connection,
    entity_type: &str,
    entity_id: &str,
) -> IntranetResult<Vec<Event>> {
    let mut stmt = conn.prepare(
        "SELECT event_id, timestamp, event_type, entity_type, entity_id, data, actor
         FROM events
         WHERE entity_type = ?1 AND entity_id = ?2
         ORDER BY timestamp DESC, id DESC",
    )?;

    let events = stmt
        .query_map(params![entity_type, entity_id], |row| {
            let timestamp_str: String = row.get(1)?;
            let data_json: String = row.get(5)?;

            Ok(Event {
                event_id: row.get(0)?,
                timestamp: DateTime::parse_from_rfc3339(&timestamp_str)
                    .map_err(|e| conversion_error(1, e))?
                    .with_timezone(&Utc),
                event_type: row.get(2)?,
                entity_type: row.get(3)?,
                entity_id: row.get(4)?,
                data: serde_json::from_str(&data_json).map_err(|e| conversion_error(5, e))?,
                actor: row.get(6)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(events)
}

// ============================================================================
// ROW HELPERS
// ============================================================================

fn conversion_error<E>(idx: usize, error: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(error))
}

fn money_column(row: &Row, idx: usize) -> rusqlite::Result<Money> {
    Ok(Money::from_minor(row.get(idx)?))
}

fn dato_column(row: &Row, idx: usize) -> rusqlite::Result<NaiveDate> {
    let text: String = row.get(idx)?;
    NaiveDate::parse_from_str(&text, DATO_FORMAT).map_err(|e| conversion_error(idx, e))
}

fn optional_dato_column(row: &Row, idx: usize) -> rusqlite::Result<Option<NaiveDate>> {
    let text: Option<String> = row.get(idx)?;
    text.map(|t| NaiveDate::parse_from_str(&t, DATO_FORMAT).map_err(|e| conversion_error(idx, e)))
        .transpose()
}

// ============================================================================
// SQLITE REPOSITORY
// ============================================================================

pub struct SqliteRepository {
    conn: Connection,
}

impl SqliteRepository {
    /// Opens (or creates) the database file and sets up the schema
    pub fn open(path: &Path) -> IntranetResult<Self> {
        let conn = Connection::open(path)?;
        setup_database(&conn)?;
        info!(path = %path.display(), "database opened");
        Ok(SqliteRepository { conn })
    }

    pub fn open_in_memory() -> IntranetResult<Self> {
        let conn = Connection::open_in_memory()?;
        setup_database(&conn)?;
        Ok(SqliteRepository { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    // ========================================================================
    // DOCUMENT STORE
    // ========================================================================

    fn put_document<T: Serialize>(&self, kind: &str, id: &str, value: &T) -> IntranetResult<()> {
        let data = serde_json::to_string(value)?;
        self.conn.execute(
            "INSERT INTO documents (kind, id, data, updated_at) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(kind, id) DO UPDATE SET data = excluded.data, updated_at = excluded.updated_at",
            params![kind, id, data, Utc::now().to_rfc3339()],
        )?;
        debug!(kind, id, "document stored");
        Ok(())
    }

    fn get_document<T: DeserializeOwned>(&self, kind: &str, id: &str) -> IntranetResult<Option<T>> {
        let data: Option<String> = self
            .conn
            .query_row(
                "SELECT data FROM documents WHERE kind = ?1 AND id = ?2",
                params![kind, id],
                |row| row.get(0),
            )
            .optional()?;

        match data {
            Some(data) => Ok(Some(serde_json::from_str(&data)?)),
            None => Ok(None),
        }
    }

    fn all_documents<T: DeserializeOwned>(&self, kind: &str) -> IntranetResult<Vec<T>> {
        let mut stmt = self
            .conn
            .prepare("SELECT data FROM documents WHERE kind = ?1 ORDER BY rowid")?;
        let rows = stmt
            .query_map(params![kind], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        rows.iter()
            .map(|data| serde_json::from_str(data).map_err(IntranetError::from))
            .collect()
    }

    // ========================================================================
    // FINANSSTYRING ROWS
    // ========================================================================

    fn kontogruppe_views(&self) -> IntranetResult<Vec<KontogruppeView>> {
        let mut stmt = self
            .conn
            .prepare("SELECT nummer, navn, kontogruppe_type FROM kontogrupper ORDER BY nummer")?;
        let grupper = stmt
            .query_map([], |row| {
                let kontogruppe_type: String = row.get(2)?;
                Ok(KontogruppeView {
                    nummer: row.get(0)?,
                    navn: row.get(1)?,
                    kontogruppe_type: KontogruppeType::parse(&kontogruppe_type)
                        .map_err(|e| conversion_error(2, e))?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(grupper)
    }

    fn budgetkontogruppe_views(&self) -> IntranetResult<Vec<BudgetkontogruppeView>> {
        let mut stmt = self
            .conn
            .prepare("SELECT nummer, navn FROM budgetkontogrupper ORDER BY nummer")?;
        let grupper = stmt
            .query_map([], |row| {
                Ok(BudgetkontogruppeView {
                    nummer: row.get(0)?,
                    navn: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(grupper)
    }

    fn konto_views(&self, regnskab: i32) -> IntranetResult<Vec<KontoView>> {
        let mut stmt = self.conn.prepare(
            "SELECT kontonummer, aar, maaned, kredit FROM kreditoplysninger
             WHERE regnskab = ?1 ORDER BY aar, maaned",
        )?;
        let mut kredit: HashMap<String, Vec<Kreditoplysninger>> = HashMap::new();
        let rows = stmt
            .query_map(params![regnskab], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    Kreditoplysninger {
                        aar: row.get(1)?,
                        maaned: row.get(2)?,
                        kredit: money_column(row, 3)?,
                    },
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        for (kontonummer, oplysninger) in rows {
            kredit.entry(kontonummer).or_default().push(oplysninger);
        }

        let mut stmt = self.conn.prepare(
            "SELECT kontonummer, kontonavn, beskrivelse, note, kontogruppe FROM konti
             WHERE regnskab = ?1 ORDER BY kontonummer",
        )?;
        let konti = stmt
            .query_map(params![regnskab], |row| {
                let kontonummer: String = row.get(0)?;
                Ok(KontoView {
                    regnskab,
                    kreditoplysninger: kredit.get(&kontonummer).cloned().unwrap_or_default(),
                    kontonummer,
                    kontonavn: row.get(1)?,
                    beskrivelse: row.get(2)?,
                    note: row.get(3)?,
                    kontogruppe: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(konti)
    }

    fn budgetkonto_views(&self, regnskab: i32) -> IntranetResult<Vec<BudgetkontoView>> {
        let mut stmt = self.conn.prepare(
            "SELECT kontonummer, aar, maaned, indtaegter, udgifter FROM budgetoplysninger
             WHERE regnskab = ?1 ORDER BY aar, maaned",
        )?;
        let mut budget: HashMap<String, Vec<Budgetoplysninger>> = HashMap::new();
        let rows = stmt
            .query_map(params![regnskab], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    Budgetoplysninger {
                        aar: row.get(1)?,
                        maaned: row.get(2)?,
                        indtaegter: money_column(row, 3)?,
                        udgifter: money_column(row, 4)?,
                    },
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        for (kontonummer, oplysninger) in rows {
            budget.entry(kontonummer).or_default().push(oplysninger);
        }

        let mut stmt = self.conn.prepare(
            "SELECT kontonummer, kontonavn, beskrivelse, note, budgetkontogruppe FROM budgetkonti
             WHERE regnskab = ?1 ORDER BY kontonummer",
        )?;
        let budgetkonti = stmt
            .query_map(params![regnskab], |row| {
                let kontonummer: String = row.get(0)?;
                Ok(BudgetkontoView {
                    regnskab,
                    budgetoplysninger: budget.get(&kontonummer).cloned().unwrap_or_default(),
                    kontonummer,
                    kontonavn: row.get(1)?,
                    beskrivelse: row.get(2)?,
                    note: row.get(3)?,
                    budgetkontogruppe: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(budgetkonti)
    }

    fn linje_views(&self, regnskab: i32) -> IntranetResult<Vec<BogforingslinjeView>> {
        let mut stmt = self.conn.prepare(
            "SELECT lobenummer, dato, bilag, kontonummer, tekst, budgetkontonummer,
                    debit, kredit, adressenummer
             FROM bogforingslinjer
             WHERE regnskab = ?1
             ORDER BY lobenummer",
        )?;
        let linjer = stmt
            .query_map(params![regnskab], |row| {
                Ok(BogforingslinjeView {
                    regnskab,
                    lobenummer: row.get(0)?,
                    dato: dato_column(row, 1)?,
                    bilag: row.get(2)?,
                    kontonummer: row.get(3)?,
                    tekst: row.get(4)?,
                    budgetkontonummer: row.get(5)?,
                    debit: money_column(row, 6)?,
                    kredit: money_column(row, 7)?,
                    adressenummer: row.get(8)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(linjer)
    }

    fn insert_linje(
        conn: &Connection,
        regnskab: i32,
        linje: &Bogforingslinje,
        idempotency_hash: Option<&str>,
    ) -> rusqlite::Result<usize> {
        conn.execute(
            "INSERT OR IGNORE INTO bogforingslinjer (
                regnskab, lobenummer, dato, bilag, kontonummer, tekst, budgetkontonummer,
                debit, kredit, adressenummer, idempotency_hash
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                regnskab,
                linje.lobenummer(),
                linje.dato().format(DATO_FORMAT).to_string(),
                linje.bilag(),
                linje.kontonummer(),
                linje.tekst(),
                linje.budgetkontonummer(),
                linje.debit().minor(),
                linje.kredit().minor(),
                linje.adressenummer(),
                idempotency_hash,
            ],
        )
    }

    // ========================================================================
    // ADDRESS ROWS
    // ========================================================================

    fn adresse_rows(&self) -> IntranetResult<(Vec<FirmaView>, Vec<PersonView>)> {
        let mut stmt = self.conn.prepare(
            "SELECT nummer, type, navn, adresse1, adresse2, postnr_by, adressegruppe,
                    bekendtskab, mailadresse, webadresse, betalingsbetingelse, udlaansfrist,
                    filofax_adresselabel, telefon, mobil, fodselsdato, telefon1, telefon2,
                    telefax, firma
             FROM adresser
             ORDER BY nummer",
        )?;

        let rows = stmt
            .query_map([], |row| {
                let info = AdresseInfoView {
                    nummer: row.get(0)?,
                    navn: row.get(2)?,
                    adresse1: row.get(3)?,
                    adresse2: row.get(4)?,
                    postnr_by: row.get(5)?,
                    adressegruppe: row.get(6)?,
                    bekendtskab: row.get(7)?,
                    mailadresse: row.get(8)?,
                    webadresse: row.get(9)?,
                    betalingsbetingelse: row.get(10)?,
                    udlaansfrist: row.get(11)?,
                    filofax_adresselabel: row.get(12)?,
                };
                let adresse_type: String = row.get(1)?;
                if adresse_type == "Firma" {
                    Ok((
                        Some(FirmaView {
                            info,
                            telefon1: row.get(16)?,
                            telefon2: row.get(17)?,
                            telefax: row.get(18)?,
                            personer: Vec::new(),
                        }),
                        None,
                    ))
                } else {
                    Ok((
                        None,
                        Some(PersonView {
                            info,
                            telefon: row.get(13)?,
                            mobil: row.get(14)?,
                            fodselsdato: optional_dato_column(row, 15)?,
                            firma: row.get(19)?,
                        }),
                    ))
                }
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut firmaer = Vec::new();
        let mut personer = Vec::new();
        for (firma, person) in rows {
            firmaer.extend(firma);
            personer.extend(person);
        }
        Ok((firmaer, personer))
    }
}

impl AuditRepository for SqliteRepository {
    fn record_event(&self, event: &Event) -> IntranetResult<()> {
        insert_event(&self.conn, event)
    }

    fn events_for(&self, entity_type: &str, entity_id: &str) -> IntranetResult<Vec<Event>> {
        get_events_for_entity(&self.conn, entity_type, entity_id)
    }
}

impl FinansstyringRepository for SqliteRepository {
    fn regnskaber(&self) -> IntranetResult<Vec<RegnskabView>> {
        let mut stmt = self
            .conn
            .prepare("SELECT nummer, navn, brevhoved FROM regnskaber ORDER BY nummer")?;
        let regnskaber = stmt
            .query_map([], |row| {
                Ok(RegnskabView {
                    nummer: row.get(0)?,
                    navn: row.get(1)?,
                    brevhoved: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(regnskaber)
    }

    fn regnskab(&self, nummer: i32) -> IntranetResult<Regnskab> {
        let view = self
            .conn
            .query_row(
                "SELECT nummer, navn, brevhoved FROM regnskaber WHERE nummer = ?1",
                params![nummer],
                |row| {
                    Ok(RegnskabView {
                        nummer: row.get(0)?,
                        navn: row.get(1)?,
                        brevhoved: row.get(2)?,
                    })
                },
            )
            .optional()?
            .ok_or_else(|| IntranetError::not_found("Regnskab", nummer))?;

        let kartotek = self.adressekartotek()?;
        let builder = DomainObjectBuilder::new()
            .with_adresse_callback(move |adressenummer| kartotek.get(adressenummer).cloned());

        let regnskab = builder.build_regnskab(
            &view,
            &self.kontogruppe_views()?,
            &self.budgetkontogruppe_views()?,
            &self.konto_views(nummer)?,
            &self.budgetkonto_views(nummer)?,
            &self.linje_views(nummer)?,
        )?;
        debug!(regnskab = nummer, linjer = regnskab.linjer().len(), "regnskab loaded");
        Ok(regnskab)
    }

    fn save_regnskab(&self, regnskab: &Regnskab) -> IntranetResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        let nummer = regnskab.nummer;

        tx.execute(
            "INSERT OR REPLACE INTO regnskaber (nummer, navn, brevhoved) VALUES (?1, ?2, ?3)",
            params![nummer, regnskab.navn(), regnskab.brevhoved],
        )?;

        for gruppe in regnskab.kontogrupper() {
            tx.execute(
                "INSERT OR REPLACE INTO kontogrupper (nummer, navn, kontogruppe_type) VALUES (?1, ?2, ?3)",
                params![gruppe.nummer, gruppe.navn(), gruppe.kontogruppe_type.as_str()],
            )?;
        }
        for gruppe in regnskab.budgetkontogrupper() {
            tx.execute(
                "INSERT OR REPLACE INTO budgetkontogrupper (nummer, navn) VALUES (?1, ?2)",
                params![gruppe.nummer, gruppe.navn()],
            )?;
        }

        tx.execute("DELETE FROM konti WHERE regnskab = ?1", params![nummer])?;
        tx.execute("DELETE FROM kreditoplysninger WHERE regnskab = ?1", params![nummer])?;
        for konto in regnskab.konti() {
            tx.execute(
                "INSERT INTO konti (regnskab, kontonummer, kontonavn, beskrivelse, note, kontogruppe)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    nummer,
                    konto.kontonummer(),
                    konto.kontonavn(),
                    konto.beskrivelse(),
                    konto.note(),
                    konto.kontogruppe,
                ],
            )?;
            for oplysninger in konto.kreditoplysninger() {
                tx.execute(
                    "INSERT INTO kreditoplysninger (regnskab, kontonummer, aar, maaned, kredit)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![
                        nummer,
                        konto.kontonummer(),
                        oplysninger.aar,
                        oplysninger.maaned,
                        oplysninger.kredit.minor(),
                    ],
                )?;
            }
        }

        tx.execute("DELETE FROM budgetkonti WHERE regnskab = ?1", params![nummer])?;
        tx.execute("DELETE FROM budgetoplysninger WHERE regnskab = ?1", params![nummer])?;
        for budgetkonto in regnskab.budgetkonti() {
            tx.execute(
                "INSERT INTO budgetkonti (regnskab, kontonummer, kontonavn, beskrivelse, note, budgetkontogruppe)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    nummer,
                    budgetkonto.kontonummer(),
                    budgetkonto.kontonavn(),
                    budgetkonto.beskrivelse(),
                    budgetkonto.note(),
                    budgetkonto.budgetkontogruppe,
                ],
            )?;
            for oplysninger in budgetkonto.budgetoplysninger() {
                tx.execute(
                    "INSERT INTO budgetoplysninger (regnskab, kontonummer, aar, maaned, indtaegter, udgifter)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    params![
                        nummer,
                        budgetkonto.kontonummer(),
                        oplysninger.aar,
                        oplysninger.maaned,
                        oplysninger.indtaegter.minor(),
                        oplysninger.udgifter.minor(),
                    ],
                )?;
            }
        }

        for linje in regnskab.linjer() {
            Self::insert_linje(&tx, nummer, linje, None)?;
        }

        tx.commit()?;
        debug!(regnskab = nummer, "regnskab saved");
        Ok(())
    }

    fn insert_bogforingslinje(
        &self,
        regnskab: i32,
        linje: &Bogforingslinje,
        idempotency_hash: Option<&str>,
    ) -> IntranetResult<bool> {
        if let Some(hash) = idempotency_hash {
            if self.has_idempotency_hash(hash)? {
                return Ok(false);
            }
        }
        let inserted = Self::insert_linje(&self.conn, regnskab, linje, idempotency_hash)?;
        if inserted == 0 {
            return Err(IntranetError::business(format!(
                "bogføringslinje {} already exists in regnskab {}",
                linje.lobenummer(),
                regnskab
            )));
        }
        Ok(true)
    }

    fn has_idempotency_hash(&self, idempotency_hash: &str) -> IntranetResult<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM bogforingslinjer WHERE idempotency_hash = ?1",
            params![idempotency_hash],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn import_bogforingslinjer<F>(
        &self,
        regnskab: i32,
        linjer: &[(Bogforingslinje, String)],
        event: F,
    ) -> IntranetResult<usize>
    where
        F: FnOnce(usize) -> IntranetResult<Event>,
    {
        // Rolled back on drop unless committed
        let tx = self.conn.unchecked_transaction()?;

        let mut inserted = 0;
        for (linje, hash) in linjer {
            if self.has_idempotency_hash(hash)? {
                continue;
            }
            if Self::insert_linje(&tx, regnskab, linje, Some(hash))? == 0 {
                return Err(IntranetError::business(format!(
                    "bogføringslinje {} already exists in regnskab {}",
                    linje.lobenummer(),
                    regnskab
                )));
            }
            inserted += 1;
        }
        insert_event(&tx, &event(inserted)?)?;

        tx.commit()?;
        debug!(regnskab, inserted, "imported lines committed");
        Ok(inserted)
    }
}

impl AdresseRepository for SqliteRepository {
    fn adressekartotek(&self) -> IntranetResult<Adressekartotek> {
        let mut stmt = self
            .conn
            .prepare("SELECT nummer, navn FROM adressegrupper ORDER BY nummer")?;
        let grupper = stmt
            .query_map([], |row| {
                Ok(AdressegruppeView {
                    nummer: row.get(0)?,
                    navn: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut stmt = self
            .conn
            .prepare("SELECT nummer, navn FROM betalingsbetingelser ORDER BY nummer")?;
        let betingelser = stmt
            .query_map([], |row| {
                Ok(BetalingsbetingelseView {
                    nummer: row.get(0)?,
                    navn: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let (firmaer, personer) = self.adresse_rows()?;
        DomainObjectBuilder::new().build_adressekartotek(&grupper, &betingelser, &firmaer, &personer)
    }

    fn save_adressegruppe(&self, gruppe: &Adressegruppe) -> IntranetResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO adressegrupper (nummer, navn) VALUES (?1, ?2)",
            params![gruppe.nummer, gruppe.navn()],
        )?;
        Ok(())
    }

    fn save_betalingsbetingelse(&self, betingelse: &Betalingsbetingelse) -> IntranetResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO betalingsbetingelser (nummer, navn) VALUES (?1, ?2)",
            params![betingelse.nummer, betingelse.navn()],
        )?;
        Ok(())
    }

    fn save_adresse(&self, adresse: &Adresse) -> IntranetResult<()> {
        let info = adresse.info();
        let (adresse_type, telefon, mobil, fodselsdato, firma) = match adresse {
            Adresse::Person(person) => (
                "Person",
                person.telefon(),
                person.mobil(),
                person.fodselsdato.map(|d| d.format(DATO_FORMAT).to_string()),
                person.firma(),
            ),
            Adresse::Firma(_) => ("Firma", None, None, None, None),
        };
        let (telefon1, telefon2, telefax) = match adresse {
            Adresse::Firma(firma) => (firma.telefon1(), firma.telefon2(), firma.telefax()),
            Adresse::Person(_) => (None, None, None),
        };

        self.conn.execute(
            "INSERT OR REPLACE INTO adresser (
                nummer, type, navn, adresse1, adresse2, postnr_by, adressegruppe,
                bekendtskab, mailadresse, webadresse, betalingsbetingelse, udlaansfrist,
                filofax_adresselabel, telefon, mobil, fodselsdato, telefon1, telefon2,
                telefax, firma
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20)",
            params![
                info.nummer,
                adresse_type,
                info.navn(),
                info.adresse1(),
                info.adresse2(),
                info.postnr_by(),
                info.adressegruppe,
                info.bekendtskab(),
                info.mailadresse(),
                info.webadresse(),
                info.betalingsbetingelse,
                info.udlaansfrist(),
                info.filofax_adresselabel,
                telefon,
                mobil,
                fodselsdato,
                telefon1,
                telefon2,
                telefax,
                firma,
            ],
        )?;
        Ok(())
    }
}

impl FoodWasteRepository for SqliteRepository {
    fn household_member(&self, identifier: Uuid) -> IntranetResult<HouseholdMember> {
        self.get_document(HOUSEHOLD_MEMBER, &identifier.to_string())?
            .ok_or_else(|| IntranetError::not_found("HouseholdMember", identifier))
    }

    fn household_member_by_mail(&self, mail_address: &str) -> IntranetResult<Option<HouseholdMember>> {
        let mail_address = mail_address.trim().to_lowercase();
        Ok(self
            .all_documents::<HouseholdMember>(HOUSEHOLD_MEMBER)?
            .into_iter()
            .find(|m| m.mail_address() == mail_address))
    }

    fn save_household_member(&self, member: &HouseholdMember) -> IntranetResult<()> {
        self.put_document(HOUSEHOLD_MEMBER, &member.identifier.to_string(), member)
    }

    fn household(&self, identifier: Uuid) -> IntranetResult<Household> {
        self.get_document(HOUSEHOLD, &identifier.to_string())?
            .ok_or_else(|| IntranetError::not_found("Household", identifier))
    }

    fn households(&self) -> IntranetResult<Vec<Household>> {
        self.all_documents(HOUSEHOLD)
    }

    fn save_household(&self, household: &Household) -> IntranetResult<()> {
        self.put_document(HOUSEHOLD, &household.identifier.to_string(), household)
    }

    fn data_providers(&self) -> IntranetResult<Vec<DataProvider>> {
        self.all_documents(DATA_PROVIDER)
    }

    fn save_data_provider(&self, data_provider: &DataProvider) -> IntranetResult<()> {
        self.put_document(DATA_PROVIDER, &data_provider.identifier.to_string(), data_provider)
    }

    fn storage_type(&self, identifier: Uuid) -> IntranetResult<StorageType> {
        self.get_document(STORAGE_TYPE, &identifier.to_string())?
            .ok_or_else(|| IntranetError::not_found("StorageType", identifier))
    }

    fn save_storage_type(&self, storage_type: &StorageType) -> IntranetResult<()> {
        self.put_document(STORAGE_TYPE, &storage_type.identifier.to_string(), storage_type)
    }

    fn food_groups(&self) -> IntranetResult<FoodGroupCollection> {
        FoodGroupCollection::from_groups(self.all_documents::<FoodGroup>(FOOD_GROUP)?)
    }

    fn save_food_groups(&self, food_groups: &FoodGroupCollection) -> IntranetResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM documents WHERE kind = ?1", params![FOOD_GROUP])?;
        let now = Utc::now().to_rfc3339();
        for group in food_groups.all() {
            tx.execute(
                "INSERT INTO documents (kind, id, data, updated_at) VALUES (?1, ?2, ?3, ?4)",
                params![
                    FOOD_GROUP,
                    group.identifier.to_string(),
                    serde_json::to_string(group)?,
                    now
                ],
            )?;
        }
        tx.commit()?;
        debug!(count = food_groups.len(), "food groups saved");
        Ok(())
    }

    fn food_items(&self) -> IntranetResult<Vec<FoodItem>> {
        self.all_documents(FOOD_ITEM)
    }

    fn save_food_item(&self, food_item: &FoodItem) -> IntranetResult<()> {
        self.put_document(FOOD_ITEM, &food_item.identifier.to_string(), food_item)
    }
}

impl KalenderRepository for SqliteRepository {
    fn kalender(&self, system: i32) -> IntranetResult<Kalender> {
        Ok(self
            .get_document(KALENDER, &system.to_string())?
            .unwrap_or_default())
    }

    fn save_kalender(&self, system: i32, kalender: &Kalender) -> IntranetResult<()> {
        self.put_document(KALENDER, &system.to_string(), kalender)
    }
}
