// Calendar queries and commands

use super::{CommandHandler, QueryHandler, SERVICE_ACTOR};
use crate::error::{IntranetError, IntranetResult};
use crate::kalender::{Aftale, Bruger};
use crate::repository::{AuditRepository, Event, KalenderRepository};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AftalerGet {
    pub system: i32,
    pub bruger: i32,
    pub fra: NaiveDateTime,
    pub til: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrugerOpret {
    pub system: i32,
    pub id: i32,
    pub initialer: String,
    pub navn: String,
    pub user_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AftaleOpret {
    pub system: i32,
    pub fra: NaiveDateTime,
    pub til: NaiveDateTime,
    pub emne: String,
    pub notat: Option<String>,
    #[serde(default)]
    pub offentlig: bool,
    #[serde(default)]
    pub privat: bool,
    #[serde(default)]
    pub alarm: bool,
    pub deltagere: Vec<i32>,
}

/// Signs a user up for an existing appointment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AftaleTilmeld {
    pub system: i32,
    pub aftale: i32,
    pub bruger: i32,
}

pub struct KalenderService<'a, R> {
    repository: &'a R,
}

impl<'a, R> KalenderService<'a, R>
where
    R: KalenderRepository + AuditRepository,
{
    pub fn new(repository: &'a R) -> Self {
        KalenderService { repository }
    }
}

impl<R> QueryHandler<AftalerGet> for KalenderService<'_, R>
where
    R: KalenderRepository + AuditRepository,
{
    type Output = Vec<Aftale>;

    fn query(&self, query: AftalerGet) -> IntranetResult<Self::Output> {
        let kalender = self.repository.kalender(query.system)?;
        Ok(kalender
            .aftaler_for(query.bruger, query.fra, query.til)?
            .into_iter()
            .cloned()
            .collect())
    }
}

impl<R> CommandHandler<BrugerOpret> for KalenderService<'_, R>
where
    R: KalenderRepository + AuditRepository,
{
    type Output = Bruger;

    fn execute(&self, command: BrugerOpret) -> IntranetResult<Self::Output> {
        let bruger = Bruger::new(
            command.id,
            command.system,
            &command.initialer,
            &command.navn,
            &command.user_name,
        )?;
        let mut kalender = self.repository.kalender(command.system)?;
        kalender.add_bruger(bruger.clone())?;

        self.repository.save_kalender(command.system, &kalender)?;
        self.repository.record_event(&Event::new(
            "bruger_oprettet",
            "bruger",
            bruger.id,
            serde_json::json!({ "system": command.system, "user_name": bruger.user_name() }),
            SERVICE_ACTOR,
        ))?;
        Ok(bruger)
    }
}

impl<R> CommandHandler<AftaleOpret> for KalenderService<'_, R>
where
    R: KalenderRepository + AuditRepository,
{
    type Output = Aftale;

    fn execute(&self, command: AftaleOpret) -> IntranetResult<Self::Output> {
        let mut kalender = self.repository.kalender(command.system)?;
        let id = kalender.next_aftale_id();

        let mut aftale = Aftale::new(id, command.system, command.fra, command.til, &command.emne)?;
        aftale.set_notat(command.notat.as_deref());
        aftale.offentlig = command.offentlig;
        aftale.privat = command.privat;
        aftale.alarm = command.alarm;
        kalender.add_aftale(aftale, &command.deltagere)?;

        self.repository.save_kalender(command.system, &kalender)?;
        self.repository.record_event(&Event::new(
            "aftale_oprettet",
            "aftale",
            id,
            serde_json::json!({
                "system": command.system,
                "fra": command.fra,
                "til": command.til,
                "deltagere": command.deltagere,
            }),
            SERVICE_ACTOR,
        ))?;
        info!(system = command.system, aftale = id, "aftale oprettet");

        kalender
            .aftale(id)
            .cloned()
            .ok_or_else(|| IntranetError::not_found("Aftale", id))
    }
}

impl<R> CommandHandler<AftaleTilmeld> for KalenderService<'_, R>
where
    R: KalenderRepository + AuditRepository,
{
    type Output = ();

    fn execute(&self, command: AftaleTilmeld) -> IntranetResult<Self::Output> {
        let mut kalender = self.repository.kalender(command.system)?;
        kalender.tilmeld(command.aftale, command.bruger)?;

        self.repository.save_kalender(command.system, &kalender)?;
        self.repository.record_event(&Event::new(
            "deltager_tilmeldt",
            "aftale",
            command.aftale,
            serde_json::json!({ "system": command.system, "bruger": command.bruger }),
            SERVICE_ACTOR,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::SqliteRepository;
    use chrono::NaiveDate;

    fn tid(dag: u32, time: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, dag)
            .unwrap()
            .and_hms_opt(time, 0, 0)
            .unwrap()
    }

    fn opret_bruger(service: &KalenderService<'_, SqliteRepository>, id: i32, user_name: &str) {
        service
            .execute(BrugerOpret {
                system: 1,
                id,
                initialer: user_name.to_uppercase(),
                navn: user_name.to_string(),
                user_name: user_name.to_string(),
            })
            .unwrap();
    }

    fn aftale(fra: NaiveDateTime, til: NaiveDateTime, emne: &str, deltagere: Vec<i32>) -> AftaleOpret {
        AftaleOpret {
            system: 1,
            fra,
            til,
            emne: emne.to_string(),
            notat: None,
            offentlig: false,
            privat: false,
            alarm: false,
            deltagere,
        }
    }

    #[test]
    fn test_aftaler_for_bruger() {
        let repo = SqliteRepository::open_in_memory().unwrap();
        let service = KalenderService::new(&repo);
        opret_bruger(&service, 1, "ole");
        opret_bruger(&service, 2, "bente");

        let first = service
            .execute(aftale(tid(2, 10), tid(2, 11), "Møde", vec![1, 2]))
            .unwrap();
        let second = service
            .execute(aftale(tid(1, 9), tid(1, 10), "Tandlæge", vec![1]))
            .unwrap();
        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);

        let ole = service
            .query(AftalerGet { system: 1, bruger: 1, fra: tid(1, 0), til: tid(3, 0) })
            .unwrap();
        let emner: Vec<&str> = ole.iter().map(|a| a.emne()).collect();
        assert_eq!(emner, vec!["Tandlæge", "Møde"]);

        let bente = service
            .query(AftalerGet { system: 1, bruger: 2, fra: tid(1, 0), til: tid(3, 0) })
            .unwrap();
        assert_eq!(bente.len(), 1);

        // other systems keep their own calendar
        assert!(service
            .query(AftalerGet { system: 2, bruger: 1, fra: tid(1, 0), til: tid(3, 0) })
            .is_err());
    }

    #[test]
    fn test_aftale_opret_validates() {
        let repo = SqliteRepository::open_in_memory().unwrap();
        let service = KalenderService::new(&repo);
        opret_bruger(&service, 1, "ole");

        assert!(matches!(
            service.execute(aftale(tid(2, 11), tid(2, 10), "Baglæns", vec![1])),
            Err(IntranetError::IllegalValue { .. })
        ));
        assert!(matches!(
            service.execute(aftale(tid(2, 10), tid(2, 11), "Ukendt", vec![9])),
            Err(IntranetError::NotFound { .. })
        ));
        assert!(repo.kalender(1).unwrap().aftaler().is_empty());
    }

    #[test]
    fn test_tilmeld() {
        let repo = SqliteRepository::open_in_memory().unwrap();
        let service = KalenderService::new(&repo);
        opret_bruger(&service, 1, "ole");
        opret_bruger(&service, 2, "bente");
        let oprettet = service
            .execute(aftale(tid(2, 10), tid(2, 11), "Møde", vec![1]))
            .unwrap();

        service
            .execute(AftaleTilmeld { system: 1, aftale: oprettet.id, bruger: 2 })
            .unwrap();
        assert!(service
            .execute(AftaleTilmeld { system: 1, aftale: oprettet.id, bruger: 2 })
            .is_err());
        assert!(repo.kalender(1).unwrap().aftale(oprettet.id).unwrap().har_deltager(2));
        assert_eq!(repo.events_for("aftale", &oprettet.id.to_string()).unwrap().len(), 2);
    }
}
