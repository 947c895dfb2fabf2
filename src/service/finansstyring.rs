// Finansstyring queries and commands

use super::{CommandHandler, QueryHandler, SERVICE_ACTOR};
use crate::adressekartotek::Adressekartotek;
use crate::builder::{
    BogforingslinjeView, BudgetkontoView, BudgetkontogruppeView, DomainObjectBuilder, KontoView,
    KontogruppeView, RegnskabView,
};
use crate::error::{IntranetError, IntranetResult};
use crate::finansstyring::{
    Adressekontostatus, Bogforingsresultat, Budgetkontostatus, Kontostatus, Money, Postering,
};
use crate::repository::{AdresseRepository, AuditRepository, Event, FinansstyringRepository};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

// ============================================================================
// QUERIES
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegnskabslisteGet;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KontoplanGet {
    pub regnskab: i32,
    pub dato: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetkontoplanGet {
    pub regnskab: i32,
    pub dato: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BogforingslinjerGet {
    pub regnskab: i32,
    pub dato: NaiveDate,
    pub antal: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebitorlisteGet {
    pub regnskab: i32,
    pub dato: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KreditorlisteGet {
    pub regnskab: i32,
    pub dato: NaiveDate,
}

/// An address balance with the name from the address book
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Adressekonto {
    pub nummer: i32,
    pub navn: String,
    pub telefon: Option<String>,
    pub saldo: Money,
}

// ============================================================================
// COMMANDS
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BogforingslinjeOpret {
    pub regnskab: i32,
    #[serde(flatten)]
    pub postering: Postering,
}

/// Creates or replaces the chart of accounts of a regnskab. Existing posting
/// lines are kept and must still fit the new accounts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KontoplanImport {
    pub regnskab: RegnskabView,
    pub kontogrupper: Vec<KontogruppeView>,
    pub budgetkontogrupper: Vec<BudgetkontogruppeView>,
    pub konti: Vec<KontoView>,
    pub budgetkonti: Vec<BudgetkontoView>,
}

pub struct FinansstyringService<'a, R> {
    repository: &'a R,
}

impl<'a, R> FinansstyringService<'a, R>
where
    R: FinansstyringRepository + AdresseRepository + AuditRepository,
{
    pub fn new(repository: &'a R) -> Self {
        FinansstyringService { repository }
    }

    fn adressekonti(&self, status: Vec<Adressekontostatus>) -> IntranetResult<Vec<Adressekonto>> {
        let kartotek: Adressekartotek = self.repository.adressekartotek()?;
        status
            .into_iter()
            .map(|s| {
                let adresse = kartotek
                    .get(s.adressenummer)
                    .ok_or_else(|| IntranetError::not_found("Adresse", s.adressenummer))?;
                Ok(Adressekonto {
                    nummer: s.adressenummer,
                    navn: adresse.navn().to_string(),
                    telefon: adresse.telefon().map(str::to_string),
                    saldo: s.saldo,
                })
            })
            .collect()
    }
}

impl<R> QueryHandler<RegnskabslisteGet> for FinansstyringService<'_, R>
where
    R: FinansstyringRepository + AdresseRepository + AuditRepository,
{
    type Output = Vec<RegnskabView>;

    fn query(&self, _query: RegnskabslisteGet) -> IntranetResult<Self::Output> {
        self.repository.regnskaber()
    }
}

impl<R> QueryHandler<KontoplanGet> for FinansstyringService<'_, R>
where
    R: FinansstyringRepository + AdresseRepository + AuditRepository,
{
    type Output = Vec<Kontostatus>;

    fn query(&self, query: KontoplanGet) -> IntranetResult<Self::Output> {
        self.repository.regnskab(query.regnskab)?.kontoplan(query.dato)
    }
}

impl<R> QueryHandler<BudgetkontoplanGet> for FinansstyringService<'_, R>
where
    R: FinansstyringRepository + AdresseRepository + AuditRepository,
{
    type Output = Vec<Budgetkontostatus>;

    fn query(&self, query: BudgetkontoplanGet) -> IntranetResult<Self::Output> {
        self.repository
            .regnskab(query.regnskab)?
            .budgetkontoplan(query.dato)
    }
}

impl<R> QueryHandler<BogforingslinjerGet> for FinansstyringService<'_, R>
where
    R: FinansstyringRepository + AdresseRepository + AuditRepository,
{
    type Output = Vec<BogforingslinjeView>;

    fn query(&self, query: BogforingslinjerGet) -> IntranetResult<Self::Output> {
        let regnskab = self.repository.regnskab(query.regnskab)?;
        Ok(regnskab
            .bogforingslinjer(query.dato, query.antal)
            .into_iter()
            .map(|linje| BogforingslinjeView::from((&regnskab, linje)))
            .collect())
    }
}

impl<R> QueryHandler<DebitorlisteGet> for FinansstyringService<'_, R>
where
    R: FinansstyringRepository + AdresseRepository + AuditRepository,
{
    type Output = Vec<Adressekonto>;

    fn query(&self, query: DebitorlisteGet) -> IntranetResult<Self::Output> {
        let regnskab = self.repository.regnskab(query.regnskab)?;
        self.adressekonti(regnskab.debitorer(query.dato))
    }
}

impl<R> QueryHandler<KreditorlisteGet> for FinansstyringService<'_, R>
where
    R: FinansstyringRepository + AdresseRepository + AuditRepository,
{
    type Output = Vec<Adressekonto>;

    fn query(&self, query: KreditorlisteGet) -> IntranetResult<Self::Output> {
        let regnskab = self.repository.regnskab(query.regnskab)?;
        self.adressekonti(regnskab.kreditorer(query.dato))
    }
}

impl<R> CommandHandler<BogforingslinjeOpret> for FinansstyringService<'_, R>
where
    R: FinansstyringRepository + AdresseRepository + AuditRepository,
{
    type Output = Bogforingsresultat;

    fn execute(&self, command: BogforingslinjeOpret) -> IntranetResult<Self::Output> {
        if let Some(adressenummer) = command.postering.adressenummer {
            if self.repository.adressekartotek()?.get(adressenummer).is_none() {
                return Err(IntranetError::not_found("Adresse", adressenummer));
            }
        }

        let mut regnskab = self.repository.regnskab(command.regnskab)?;
        let resultat = regnskab.bogfor(command.postering)?;
        self.repository
            .insert_bogforingslinje(command.regnskab, &resultat.linje, None)?;

        let linje = &resultat.linje;
        self.repository.record_event(&Event::new(
            "bogforingslinje_oprettet",
            "regnskab",
            command.regnskab,
            serde_json::json!({
                "lobenummer": linje.lobenummer(),
                "kontonummer": linje.kontonummer(),
                "debit": linje.debit(),
                "kredit": linje.kredit(),
                "advarsler": resultat.advarsler,
            }),
            SERVICE_ACTOR,
        ))?;

        info!(
            regnskab = command.regnskab,
            lobenummer = linje.lobenummer(),
            "bogføringslinje oprettet"
        );
        for advarsel in &resultat.advarsler {
            warn!(regnskab = command.regnskab, ?advarsel, "bogføringsadvarsel");
        }

        Ok(resultat)
    }
}

impl<R> CommandHandler<KontoplanImport> for FinansstyringService<'_, R>
where
    R: FinansstyringRepository + AdresseRepository + AuditRepository,
{
    type Output = RegnskabView;

    fn execute(&self, command: KontoplanImport) -> IntranetResult<Self::Output> {
        let nummer = command.regnskab.nummer;
        let linjer: Vec<BogforingslinjeView> = match self.repository.regnskab(nummer) {
            Ok(existing) => existing
                .linjer()
                .iter()
                .map(|linje| BogforingslinjeView::from((&existing, linje)))
                .collect(),
            Err(IntranetError::NotFound { entity: "Regnskab", .. }) => Vec::new(),
            Err(e) => return Err(e),
        };

        let regnskab = DomainObjectBuilder::new().build_regnskab(
            &command.regnskab,
            &command.kontogrupper,
            &command.budgetkontogrupper,
            &command.konti,
            &command.budgetkonti,
            &linjer,
        )?;
        self.repository.save_regnskab(&regnskab)?;

        self.repository.record_event(&Event::new(
            "kontoplan_importeret",
            "regnskab",
            nummer,
            serde_json::json!({
                "konti": regnskab.konti().len(),
                "budgetkonti": regnskab.budgetkonti().len(),
            }),
            SERVICE_ACTOR,
        ))?;
        info!(regnskab = nummer, konti = regnskab.konti().len(), "kontoplan importeret");

        Ok(RegnskabView::from(&regnskab))
    }
}
