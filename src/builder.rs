// ============================================================================
// DOMAIN OBJECT BUILDER
// ============================================================================
//
// Flat view records are what storage and the HTTP façade exchange. The
// builder stitches them into aggregates and the From impls flatten the
// aggregates back into views.

use crate::adressekartotek::{
    Adresse, AdresseInfo, Adressegruppe, Adressekartotek, Betalingsbetingelse, Firma, Person,
};
use crate::error::{IntranetError, IntranetResult};
use crate::finansstyring::{
    Bogforingslinje, Budgetkonto, Budgetkontogruppe, Budgetoplysninger, Konto, Kontogruppe,
    KontogruppeType, Kreditoplysninger, Money, Postering, Regnskab,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

// ============================================================================
// VIEWS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegnskabView {
    pub nummer: i32,
    pub navn: String,
    pub brevhoved: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KontogruppeView {
    pub nummer: i32,
    pub navn: String,
    pub kontogruppe_type: KontogruppeType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetkontogruppeView {
    pub nummer: i32,
    pub navn: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KontoView {
    pub regnskab: i32,
    pub kontonummer: String,
    pub kontonavn: String,
    pub beskrivelse: Option<String>,
    pub note: Option<String>,
    pub kontogruppe: i32,
    #[serde(default)]
    pub kreditoplysninger: Vec<Kreditoplysninger>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetkontoView {
    pub regnskab: i32,
    pub kontonummer: String,
    pub kontonavn: String,
    pub beskrivelse: Option<String>,
    pub note: Option<String>,
    pub budgetkontogruppe: i32,
    #[serde(default)]
    pub budgetoplysninger: Vec<Budgetoplysninger>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BogforingslinjeView {
    pub regnskab: i32,
    pub lobenummer: i32,
    pub dato: NaiveDate,
    pub bilag: Option<String>,
    pub kontonummer: String,
    pub tekst: String,
    pub budgetkontonummer: Option<String>,
    pub debit: Money,
    pub kredit: Money,
    pub adressenummer: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdressegruppeView {
    pub nummer: i32,
    pub navn: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BetalingsbetingelseView {
    pub nummer: i32,
    pub navn: String,
}

/// Address fields shared by persons and companies
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdresseInfoView {
    pub nummer: i32,
    pub navn: String,
    pub adresse1: Option<String>,
    pub adresse2: Option<String>,
    pub postnr_by: Option<String>,
    pub adressegruppe: i32,
    pub bekendtskab: Option<String>,
    pub mailadresse: Option<String>,
    pub webadresse: Option<String>,
    pub betalingsbetingelse: Option<i32>,
    pub udlaansfrist: Option<i32>,
    #[serde(default)]
    pub filofax_adresselabel: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonView {
    #[serde(flatten)]
    pub info: AdresseInfoView,
    pub telefon: Option<String>,
    pub mobil: Option<String>,
    pub fodselsdato: Option<NaiveDate>,
    pub firma: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FirmaView {
    #[serde(flatten)]
    pub info: AdresseInfoView,
    pub telefon1: Option<String>,
    pub telefon2: Option<String>,
    pub telefax: Option<String>,
    #[serde(default)]
    pub personer: Vec<i32>,
}

// ============================================================================
// BUILDER
// ============================================================================

pub type AdresseCallback = Box<dyn Fn(i32) -> Option<Adresse> + Send + Sync>;

#[derive(Default)]
pub struct DomainObjectBuilder {
    adresse_callback: Option<AdresseCallback>,
}

impl DomainObjectBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves addresses referenced by posting lines. Without a callback
    /// address references are taken as they are.
    pub fn with_adresse_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(i32) -> Option<Adresse> + Send + Sync + 'static,
    {
        self.adresse_callback = Some(Box::new(callback));
        self
    }

    pub fn resolve_adresse(&self, nummer: i32) -> IntranetResult<Option<Adresse>> {
        match &self.adresse_callback {
            None => Ok(None),
            Some(callback) => callback(nummer)
                .map(Some)
                .ok_or_else(|| IntranetError::not_found("Adresse", nummer)),
        }
    }

    pub fn build_regnskab(
        &self,
        view: &RegnskabView,
        kontogrupper: &[KontogruppeView],
        budgetkontogrupper: &[BudgetkontogruppeView],
        konti: &[KontoView],
        budgetkonti: &[BudgetkontoView],
        linjer: &[BogforingslinjeView],
    ) -> IntranetResult<Regnskab> {
        let mut regnskab = Regnskab::new(view.nummer, &view.navn)?;
        regnskab.brevhoved = view.brevhoved;

        for gruppe in kontogrupper {
            regnskab.add_kontogruppe(Kontogruppe::new(
                gruppe.nummer,
                &gruppe.navn,
                gruppe.kontogruppe_type,
            )?)?;
        }
        for gruppe in budgetkontogrupper {
            regnskab.add_budgetkontogruppe(Budgetkontogruppe::new(gruppe.nummer, &gruppe.navn)?)?;
        }

        for konto_view in konti.iter().filter(|k| k.regnskab == view.nummer) {
            let mut konto = Konto::new(
                &konto_view.kontonummer,
                &konto_view.kontonavn,
                konto_view.kontogruppe,
            )?;
            konto.set_beskrivelse(konto_view.beskrivelse.as_deref());
            konto.set_note(konto_view.note.as_deref());
            for oplysninger in &konto_view.kreditoplysninger {
                konto.set_kreditoplysninger(Kreditoplysninger::new(
                    oplysninger.aar,
                    oplysninger.maaned,
                    oplysninger.kredit,
                )?);
            }
            regnskab.add_konto(konto)?;
        }

        for konto_view in budgetkonti.iter().filter(|k| k.regnskab == view.nummer) {
            let mut budgetkonto = Budgetkonto::new(
                &konto_view.kontonummer,
                &konto_view.kontonavn,
                konto_view.budgetkontogruppe,
            )?;
            budgetkonto.set_beskrivelse(konto_view.beskrivelse.as_deref());
            budgetkonto.set_note(konto_view.note.as_deref());
            for oplysninger in &konto_view.budgetoplysninger {
                budgetkonto.set_budgetoplysninger(Budgetoplysninger::new(
                    oplysninger.aar,
                    oplysninger.maaned,
                    oplysninger.indtaegter,
                    oplysninger.udgifter,
                )?);
            }
            regnskab.add_budgetkonto(budgetkonto)?;
        }

        let mut kendte_adresser: HashSet<i32> = HashSet::new();
        for linje_view in linjer.iter().filter(|l| l.regnskab == view.nummer) {
            if let Some(adressenummer) = linje_view.adressenummer {
                if !kendte_adresser.contains(&adressenummer) {
                    self.resolve_adresse(adressenummer)?;
                    kendte_adresser.insert(adressenummer);
                }
            }
            let linje = Bogforingslinje::new(
                linje_view.lobenummer,
                Postering {
                    dato: linje_view.dato,
                    bilag: linje_view.bilag.clone(),
                    kontonummer: linje_view.kontonummer.clone(),
                    tekst: linje_view.tekst.clone(),
                    budgetkontonummer: linje_view.budgetkontonummer.clone(),
                    debit: linje_view.debit,
                    kredit: linje_view.kredit,
                    adressenummer: linje_view.adressenummer,
                },
            )?;
            regnskab.add_linje(linje)?;
        }

        Ok(regnskab)
    }

    pub fn build_adressekartotek(
        &self,
        grupper: &[AdressegruppeView],
        betingelser: &[BetalingsbetingelseView],
        firmaer: &[FirmaView],
        personer: &[PersonView],
    ) -> IntranetResult<Adressekartotek> {
        let mut kartotek = Adressekartotek::new();
        for gruppe in grupper {
            kartotek.add_adressegruppe(Adressegruppe::new(gruppe.nummer, &gruppe.navn)?)?;
        }
        for betingelse in betingelser {
            kartotek.add_betalingsbetingelse(Betalingsbetingelse::new(
                betingelse.nummer,
                &betingelse.navn,
            )?)?;
        }

        for view in firmaer {
            kartotek.add(Adresse::Firma(self.build_firma(view)?))?;
        }

        for view in personer {
            kartotek.add(Adresse::Person(self.build_person(view)?))?;
            if let Some(firma) = view.firma {
                kartotek.tilknyt_person(view.info.nummer, firma)?;
            }
        }

        Ok(kartotek)
    }

    /// The person alone; the company link is made by the kartotek
    pub fn build_person(&self, view: &PersonView) -> IntranetResult<Person> {
        let mut person = Person::new(view.info.nummer, &view.info.navn, view.info.adressegruppe)?;
        fill_info(&mut person.info, &view.info)?;
        person.set_telefon(view.telefon.as_deref(), view.mobil.as_deref());
        person.fodselsdato = view.fodselsdato;
        Ok(person)
    }

    pub fn build_firma(&self, view: &FirmaView) -> IntranetResult<Firma> {
        let mut firma = Firma::new(view.info.nummer, &view.info.navn, view.info.adressegruppe)?;
        fill_info(&mut firma.info, &view.info)?;
        firma.set_telefon(
            view.telefon1.as_deref(),
            view.telefon2.as_deref(),
            view.telefax.as_deref(),
        );
        Ok(firma)
    }
}

fn fill_info(info: &mut AdresseInfo, view: &AdresseInfoView) -> IntranetResult<()> {
    info.set_adresse(
        view.adresse1.as_deref(),
        view.adresse2.as_deref(),
        view.postnr_by.as_deref(),
    );
    info.set_bekendtskab(view.bekendtskab.as_deref());
    info.set_mailadresse(view.mailadresse.as_deref())?;
    info.set_webadresse(view.webadresse.as_deref());
    info.set_udlaansfrist(view.udlaansfrist)?;
    info.betalingsbetingelse = view.betalingsbetingelse;
    info.filofax_adresselabel = view.filofax_adresselabel;
    Ok(())
}

// ============================================================================
// REVERSE MAPPING
// ============================================================================

impl From<&Regnskab> for RegnskabView {
    fn from(regnskab: &Regnskab) -> Self {
        RegnskabView {
            nummer: regnskab.nummer,
            navn: regnskab.navn().to_string(),
            brevhoved: regnskab.brevhoved,
        }
    }
}

impl From<&Kontogruppe> for KontogruppeView {
    fn from(gruppe: &Kontogruppe) -> Self {
        KontogruppeView {
            nummer: gruppe.nummer,
            navn: gruppe.navn().to_string(),
            kontogruppe_type: gruppe.kontogruppe_type,
        }
    }
}

impl From<&Budgetkontogruppe> for BudgetkontogruppeView {
    fn from(gruppe: &Budgetkontogruppe) -> Self {
        BudgetkontogruppeView {
            nummer: gruppe.nummer,
            navn: gruppe.navn().to_string(),
        }
    }
}

impl From<(&Regnskab, &Konto)> for KontoView {
    fn from((regnskab, konto): (&Regnskab, &Konto)) -> Self {
        KontoView {
            regnskab: regnskab.nummer,
            kontonummer: konto.kontonummer().to_string(),
            kontonavn: konto.kontonavn().to_string(),
            beskrivelse: konto.beskrivelse().map(str::to_string),
            note: konto.note().map(str::to_string),
            kontogruppe: konto.kontogruppe,
            kreditoplysninger: konto.kreditoplysninger().to_vec(),
        }
    }
}

impl From<(&Regnskab, &Budgetkonto)> for BudgetkontoView {
    fn from((regnskab, konto): (&Regnskab, &Budgetkonto)) -> Self {
        BudgetkontoView {
            regnskab: regnskab.nummer,
            kontonummer: konto.kontonummer().to_string(),
            kontonavn: konto.kontonavn().to_string(),
            beskrivelse: konto.beskrivelse().map(str::to_string),
            note: konto.note().map(str::to_string),
            budgetkontogruppe: konto.budgetkontogruppe,
            budgetoplysninger: konto.budgetoplysninger().to_vec(),
        }
    }
}

impl From<(&Regnskab, &Bogforingslinje)> for BogforingslinjeView {
    fn from((regnskab, linje): (&Regnskab, &Bogforingslinje)) -> Self {
        BogforingslinjeView {
            regnskab: regnskab.nummer,
            lobenummer: linje.lobenummer(),
            dato: linje.dato(),
            bilag: linje.bilag().map(str::to_string),
            kontonummer: linje.kontonummer().to_string(),
            tekst: linje.tekst().to_string(),
            budgetkontonummer: linje.budgetkontonummer().map(str::to_string),
            debit: linje.debit(),
            kredit: linje.kredit(),
            adressenummer: linje.adressenummer(),
        }
    }
}

impl From<&Adressegruppe> for AdressegruppeView {
    fn from(gruppe: &Adressegruppe) -> Self {
        AdressegruppeView {
            nummer: gruppe.nummer,
            navn: gruppe.navn().to_string(),
        }
    }
}

impl From<&Betalingsbetingelse> for BetalingsbetingelseView {
    fn from(betingelse: &Betalingsbetingelse) -> Self {
        BetalingsbetingelseView {
            nummer: betingelse.nummer,
            navn: betingelse.navn().to_string(),
        }
    }
}

impl From<&AdresseInfo> for AdresseInfoView {
    fn from(info: &AdresseInfo) -> Self {
        AdresseInfoView {
            nummer: info.nummer,
            navn: info.navn().to_string(),
            adresse1: info.adresse1().map(str::to_string),
            adresse2: info.adresse2().map(str::to_string),
            postnr_by: info.postnr_by().map(str::to_string),
            adressegruppe: info.adressegruppe,
            bekendtskab: info.bekendtskab().map(str::to_string),
            mailadresse: info.mailadresse().map(str::to_string),
            webadresse: info.webadresse().map(str::to_string),
            betalingsbetingelse: info.betalingsbetingelse,
            udlaansfrist: info.udlaansfrist(),
            filofax_adresselabel: info.filofax_adresselabel,
        }
    }
}

impl From<&Person> for PersonView {
    fn from(person: &Person) -> Self {
        PersonView {
            info: AdresseInfoView::from(&person.info),
            telefon: person.telefon().map(str::to_string),
            mobil: person.mobil().map(str::to_string),
            fodselsdato: person.fodselsdato,
            firma: person.firma(),
        }
    }
}

impl From<&Firma> for FirmaView {
    fn from(firma: &Firma) -> Self {
        FirmaView {
            info: AdresseInfoView::from(&firma.info),
            telefon1: firma.telefon1().map(str::to_string),
            telefon2: firma.telefon2().map(str::to_string),
            telefax: firma.telefax().map(str::to_string),
            personer: firma.personer().to_vec(),
        }
    }
}
