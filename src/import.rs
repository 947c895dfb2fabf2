// 📥 Posting import - CSV files of posting lines into a regnskab
//
// Every line gets a SHA-256 idempotency hash. A line whose hash is already
// stored, or which repeats an earlier line of the same file, is skipped and
// counted. All lines are posted in memory before anything is written, so a
// bad line leaves the regnskab untouched.

use crate::error::{IntranetError, IntranetResult};
use crate::finansstyring::{Bogforingslinje, Money, Postering};
use crate::repository::{AdresseRepository, AuditRepository, Event, FinansstyringRepository};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

const IMPORT_ACTOR: &str = "csv_importer";
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%d-%m-%Y", "%d.%m.%Y"];

// ============================================================================
// CSV RECORDS
// ============================================================================

/// One row as it appears in the file:
/// `dato,bilag,kontonummer,tekst,budgetkontonummer,debit,kredit,adressenummer`
#[derive(Debug, Clone, Deserialize)]
struct PosteringRecord {
    dato: String,
    bilag: Option<String>,
    kontonummer: String,
    tekst: String,
    budgetkontonummer: Option<String>,
    debit: Option<String>,
    kredit: Option<String>,
    adressenummer: Option<i32>,
}

#[derive(Debug, Clone)]
pub struct ImportLine {
    pub line_number: usize,
    pub postering: Postering,
}

fn parse_dato(value: &str) -> IntranetResult<NaiveDate> {
    let value = value.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
        .ok_or_else(|| IntranetError::illegal("dato", format!("{} is not a date", value)))
}

fn parse_amount(value: Option<&str>) -> IntranetResult<Money> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(value) => Money::parse(value),
        None => Ok(Money::ZERO),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

impl PosteringRecord {
    fn into_postering(self) -> IntranetResult<Postering> {
        Ok(Postering {
            dato: parse_dato(&self.dato)?,
            bilag: non_blank(self.bilag),
            kontonummer: self.kontonummer.trim().to_string(),
            tekst: self.tekst.trim().to_string(),
            budgetkontonummer: non_blank(self.budgetkontonummer),
            debit: parse_amount(self.debit.as_deref())?,
            kredit: parse_amount(self.kredit.as_deref())?,
            adressenummer: self.adressenummer,
        })
    }
}

/// Reads posting lines from CSV with a header row
pub fn read_posteringer<R: Read>(reader: R) -> IntranetResult<Vec<ImportLine>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let mut lines = Vec::new();
    for (index, result) in rdr.deserialize::<PosteringRecord>().enumerate() {
        // 1-indexed plus the header row
        let line_number = index + 2;
        let record = result.map_err(|e| {
            IntranetError::illegal("csv", format!("line {}: {}", line_number, e))
        })?;
        let postering = record.into_postering().map_err(|e| {
            warn!(line_number, error = %e, "posting line rejected");
            e
        })?;
        lines.push(ImportLine { line_number, postering });
    }
    Ok(lines)
}

pub fn load_csv(csv_path: &Path) -> IntranetResult<Vec<ImportLine>> {
    let file = std::fs::File::open(csv_path).map_err(|e| {
        IntranetError::System(format!("failed to open {}: {}", csv_path.display(), e))
    })?;
    read_posteringer(file)
}

// ============================================================================
// IDEMPOTENCY
// ============================================================================

/// Hash over everything that makes a posting line unique in a regnskab.
/// Fields are normalized the way the stored line is, so account numbers
/// match regardless of case and surrounding blanks.
pub fn compute_idempotency_hash(regnskab: i32, postering: &Postering) -> String {
    let kontonummer = |value: &str| value.trim().to_uppercase();

    let mut hasher = Sha256::new();
    hasher.update(format!(
        "{}|{}|{}|{}|{}|{}|{}|{}",
        regnskab,
        postering.dato.format("%Y-%m-%d"),
        kontonummer(&postering.kontonummer),
        postering.tekst.trim(),
        postering.budgetkontonummer.as_deref().map(kontonummer).unwrap_or_default(),
        postering.debit.minor(),
        postering.kredit.minor(),
        postering.bilag.as_deref().map(str::trim).unwrap_or(""),
    ));
    format!("{:x}", hasher.finalize())
}

// ============================================================================
// IMPORT
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportReport {
    pub regnskab: i32,
    pub source: String,
    pub lines_read: usize,
    pub inserted: usize,
    pub duplicates: usize,
    pub advarsler: usize,
}

/// Posts the lines into the regnskab and stores the new ones
pub fn import_posteringer<R>(
    repository: &R,
    regnskab_nummer: i32,
    source: &str,
    lines: Vec<ImportLine>,
) -> IntranetResult<ImportReport>
where
    R: FinansstyringRepository + AdresseRepository + AuditRepository,
{
    let mut regnskab = repository.regnskab(regnskab_nummer)?;
    let kartotek = repository.adressekartotek()?;

    let mut report = ImportReport {
        regnskab: regnskab_nummer,
        source: source.to_string(),
        lines_read: lines.len(),
        ..Default::default()
    };

    let mut seen = HashSet::new();
    let mut pending: Vec<(Bogforingslinje, String)> = Vec::new();

    for line in lines {
        let hash = compute_idempotency_hash(regnskab_nummer, &line.postering);
        if !seen.insert(hash.clone()) || repository.has_idempotency_hash(&hash)? {
            debug!(line_number = line.line_number, "duplicate posting line skipped");
            report.duplicates += 1;
            continue;
        }

        if let Some(adressenummer) = line.postering.adressenummer {
            if kartotek.get(adressenummer).is_none() {
                warn!(line_number = line.line_number, adressenummer, "unknown address");
                return Err(IntranetError::not_found("Adresse", adressenummer));
            }
        }

        let resultat = regnskab.bogfor(line.postering).map_err(|e| {
            warn!(line_number = line.line_number, error = %e, "posting line rejected");
            e
        })?;
        report.advarsler += resultat.advarsler.len();
        pending.push((resultat.linje, hash));
    }

    let inserted = repository.import_bogforingslinjer(regnskab_nummer, &pending, |inserted| {
        let final_report = ImportReport {
            inserted,
            duplicates: report.duplicates + pending.len() - inserted,
            ..report.clone()
        };
        Ok(Event::new(
            "posteringer_importeret",
            "regnskab",
            regnskab_nummer,
            serde_json::to_value(&final_report)?,
            IMPORT_ACTOR,
        ))
    })?;
    report.duplicates += pending.len() - inserted;
    report.inserted = inserted;

    info!(
        regnskab = regnskab_nummer,
        source,
        inserted = report.inserted,
        duplicates = report.duplicates,
        "posting lines imported"
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{BudgetkontoView, KontoView, KontogruppeView, RegnskabView};
    use crate::finansstyring::KontogruppeType;
    use crate::service::finansstyring::KontoplanImport;
    use crate::service::{CommandHandler, FinansstyringService};
    use crate::repository::SqliteRepository;

    const CSV: &str = "\
dato,bilag,kontonummer,tekst,budgetkontonummer,debit,kredit,adressenummer
2024-03-01,1,DANKORT,Løn,,\"25.000,00\",,
01-03-2024,2,DANKORT,Husleje,,,\"7.500,00\",
2024-03-05,, DANKORT ,Netto,,,\"312,50\",
";

    fn repository() -> SqliteRepository {
        let repo = SqliteRepository::open_in_memory().unwrap();
        FinansstyringService::new(&repo)
            .execute(KontoplanImport {
                regnskab: RegnskabView { nummer: 1, navn: "Privat".to_string(), brevhoved: None },
                kontogrupper: vec![KontogruppeView {
                    nummer: 1,
                    navn: "Bank".to_string(),
                    kontogruppe_type: KontogruppeType::Aktiver,
                }],
                budgetkontogrupper: Vec::new(),
                konti: vec![KontoView {
                    regnskab: 1,
                    kontonummer: "DANKORT".to_string(),
                    kontonavn: "Dankort".to_string(),
                    beskrivelse: None,
                    note: None,
                    kontogruppe: 1,
                    kreditoplysninger: Vec::new(),
                }],
                budgetkonti: Vec::<BudgetkontoView>::new(),
            })
            .unwrap();
        repo
    }

    #[test]
    fn test_read_posteringer() {
        let lines = read_posteringer(CSV.as_bytes()).unwrap();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].line_number, 2);
        assert_eq!(lines[0].postering.debit, Money::from_major(25_000));
        assert_eq!(lines[1].postering.dato, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(lines[2].postering.kontonummer, "DANKORT");
        assert_eq!(lines[2].postering.bilag, None);
        assert_eq!(lines[2].postering.kredit, Money::from_minor(31_250));
    }

    #[test]
    fn test_read_rejects_bad_date() {
        let csv = "dato,bilag,kontonummer,tekst,budgetkontonummer,debit,kredit,adressenummer\n\
                   31/02/2024,,DANKORT,Fejl,,1,,\n";
        assert!(matches!(
            read_posteringer(csv.as_bytes()),
            Err(IntranetError::IllegalValue { field: "dato", .. })
        ));
    }

    #[test]
    fn test_idempotency_hash_is_stable() {
        let lines = read_posteringer(CSV.as_bytes()).unwrap();
        let hash1 = compute_idempotency_hash(1, &lines[0].postering);
        let hash2 = compute_idempotency_hash(1, &lines[0].postering);
        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
        assert_ne!(hash1, compute_idempotency_hash(2, &lines[0].postering));
    }

    #[test]
    fn test_import_twice() {
        let repo = repository();

        let first = import_posteringer(&repo, 1, "marts.csv", read_posteringer(CSV.as_bytes()).unwrap()).unwrap();
        assert_eq!(first.inserted, 3);
        assert_eq!(first.duplicates, 0);

        let second = import_posteringer(&repo, 1, "marts.csv", read_posteringer(CSV.as_bytes()).unwrap()).unwrap();
        assert_eq!(second.inserted, 0);
        assert_eq!(second.duplicates, 3);

        let regnskab = repo.regnskab(1).unwrap();
        assert_eq!(regnskab.linjer().len(), 3);
        assert_eq!(
            regnskab.saldo("DANKORT", NaiveDate::from_ymd_opt(2024, 3, 31).unwrap()).unwrap(),
            Money::from_minor(1_718_750)
        );
    }

    #[test]
    fn test_duplicate_within_file() {
        let repo = repository();
        let mut lines = read_posteringer(CSV.as_bytes()).unwrap();
        lines.push(lines[0].clone());

        let report = import_posteringer(&repo, 1, "dobbelt.csv", lines).unwrap();
        assert_eq!(report.lines_read, 4);
        assert_eq!(report.inserted, 3);
        assert_eq!(report.duplicates, 1);
    }

    #[test]
    fn test_import_ignores_kontonummer_case() {
        let repo = repository();
        let header = "dato,bilag,kontonummer,tekst,budgetkontonummer,debit,kredit,adressenummer\n";
        let upper = format!("{}2024-03-01,1,DANKORT,Løn,,100,,\n", header);
        let lower = format!("{}2024-03-01, 1 ,dankort , Løn,,100,,\n", header);

        let first = import_posteringer(&repo, 1, "upper.csv", read_posteringer(upper.as_bytes()).unwrap()).unwrap();
        assert_eq!(first.inserted, 1);

        let second = import_posteringer(&repo, 1, "lower.csv", read_posteringer(lower.as_bytes()).unwrap()).unwrap();
        assert_eq!(second.inserted, 0);
        assert_eq!(second.duplicates, 1);
        assert_eq!(repo.regnskab(1).unwrap().linjer().len(), 1);
    }

    #[test]
    fn test_import_records_one_event() {
        let repo = repository();
        import_posteringer(&repo, 1, "marts.csv", read_posteringer(CSV.as_bytes()).unwrap()).unwrap();

        let events: Vec<_> = repo
            .events_for("regnskab", "1")
            .unwrap()
            .into_iter()
            .filter(|e| e.event_type == "posteringer_importeret")
            .collect();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data["inserted"], 3);
        assert_eq!(events[0].actor, IMPORT_ACTOR);
    }

    #[test]
    fn test_read_rejects_malformed_amount() {
        let csv = "dato,bilag,kontonummer,tekst,budgetkontonummer,debit,kredit,adressenummer\n\
                   2024-03-01,,DANKORT,Fejl,,1.5.3,,\n";
        assert!(matches!(
            read_posteringer(csv.as_bytes()),
            Err(IntranetError::IllegalValue { field: "amount", .. })
        ));
    }

    #[test]
    fn test_bad_line_writes_nothing() {
        let repo = repository();
        let csv = format!("{}2024-03-06,,UKENDT,Fejl,,1,,\n", CSV);
        let lines = read_posteringer(csv.as_bytes()).unwrap();

        assert!(import_posteringer(&repo, 1, "fejl.csv", lines).is_err());
        assert!(repo.regnskab(1).unwrap().linjer().is_empty());
    }
}
