// Address book queries and commands

use super::{CommandHandler, QueryHandler, SERVICE_ACTOR};
use crate::adressekartotek::{Adresse, Adressegruppe, Betalingsbetingelse, Telefonlisteelement};
use crate::builder::{DomainObjectBuilder, FirmaView, PersonView};
use crate::error::{IntranetError, IntranetResult};
use crate::repository::{AdresseRepository, AuditRepository, Event};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdresselisteGet;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TelefonlisteGet;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdressegruppeOpret {
    pub nummer: i32,
    pub navn: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BetalingsbetingelseOpret {
    pub nummer: i32,
    pub navn: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AdresseOpret {
    Person(PersonView),
    Firma(FirmaView),
}

pub struct AdresseService<'a, R> {
    repository: &'a R,
}

impl<'a, R> AdresseService<'a, R>
where
    R: AdresseRepository + AuditRepository,
{
    pub fn new(repository: &'a R) -> Self {
        AdresseService { repository }
    }

    fn record(&self, event_type: &str, entity_type: &str, nummer: i32, navn: &str) -> IntranetResult<()> {
        self.repository.record_event(&Event::new(
            event_type,
            entity_type,
            nummer,
            serde_json::json!({ "navn": navn }),
            SERVICE_ACTOR,
        ))
    }
}

impl<R> QueryHandler<AdresselisteGet> for AdresseService<'_, R>
where
    R: AdresseRepository + AuditRepository,
{
    type Output = Vec<Adresse>;

    fn query(&self, _query: AdresselisteGet) -> IntranetResult<Self::Output> {
        let kartotek = self.repository.adressekartotek()?;
        Ok(kartotek.adresseliste().into_iter().cloned().collect())
    }
}

impl<R> QueryHandler<TelefonlisteGet> for AdresseService<'_, R>
where
    R: AdresseRepository + AuditRepository,
{
    type Output = Vec<Telefonlisteelement>;

    fn query(&self, _query: TelefonlisteGet) -> IntranetResult<Self::Output> {
        Ok(self.repository.adressekartotek()?.telefonliste())
    }
}

impl<R> CommandHandler<AdressegruppeOpret> for AdresseService<'_, R>
where
    R: AdresseRepository + AuditRepository,
{
    type Output = Adressegruppe;

    fn execute(&self, command: AdressegruppeOpret) -> IntranetResult<Self::Output> {
        let gruppe = Adressegruppe::new(command.nummer, &command.navn)?;
        let mut kartotek = self.repository.adressekartotek()?;
        kartotek.add_adressegruppe(gruppe.clone())?;

        self.repository.save_adressegruppe(&gruppe)?;
        self.record("adressegruppe_oprettet", "adressegruppe", gruppe.nummer, gruppe.navn())?;
        Ok(gruppe)
    }
}

impl<R> CommandHandler<BetalingsbetingelseOpret> for AdresseService<'_, R>
where
    R: AdresseRepository + AuditRepository,
{
    type Output = Betalingsbetingelse;

    fn execute(&self, command: BetalingsbetingelseOpret) -> IntranetResult<Self::Output> {
        let betingelse = Betalingsbetingelse::new(command.nummer, &command.navn)?;
        let mut kartotek = self.repository.adressekartotek()?;
        kartotek.add_betalingsbetingelse(betingelse.clone())?;

        self.repository.save_betalingsbetingelse(&betingelse)?;
        self.record(
            "betalingsbetingelse_oprettet",
            "betalingsbetingelse",
            betingelse.nummer,
            betingelse.navn(),
        )?;
        Ok(betingelse)
    }
}

impl<R> CommandHandler<AdresseOpret> for AdresseService<'_, R>
where
    R: AdresseRepository + AuditRepository,
{
    type Output = Adresse;

    fn execute(&self, command: AdresseOpret) -> IntranetResult<Self::Output> {
        let builder = DomainObjectBuilder::new();
        let mut kartotek = self.repository.adressekartotek()?;

        let nummer = match &command {
            AdresseOpret::Person(view) => {
                kartotek.add(Adresse::Person(builder.build_person(view)?))?;
                if let Some(firma) = view.firma {
                    kartotek.tilknyt_person(view.info.nummer, firma)?;
                }
                view.info.nummer
            }
            AdresseOpret::Firma(view) => {
                kartotek.add(Adresse::Firma(builder.build_firma(view)?))?;
                view.info.nummer
            }
        };

        let adresse = kartotek
            .get(nummer)
            .cloned()
            .ok_or_else(|| IntranetError::not_found("Adresse", nummer))?;
        self.repository.save_adresse(&adresse)?;
        self.record("adresse_oprettet", "adresse", nummer, adresse.navn())?;
        info!(nummer, navn = adresse.navn(), "adresse oprettet");
        Ok(adresse)
    }
}
