// Adressekartotek - the address book
//
// Owns address groups, payment terms and addresses. Persons reference their
// company by number and companies list their persons by number; tilknyt_person
// and fjern_person_fra_firma are the only places either side changes.

pub mod adresse;

pub use adresse::{Adresse, AdresseInfo, Adressegruppe, Betalingsbetingelse, Firma, Person};

use crate::error::{IntranetError, IntranetResult};
use serde::{Deserialize, Serialize};

/// One line of the phone list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Telefonlisteelement {
    pub nummer: i32,
    pub navn: String,
    pub telefon: String,
    pub mobil: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Adressekartotek {
    adressegrupper: Vec<Adressegruppe>,
    betalingsbetingelser: Vec<Betalingsbetingelse>,
    adresser: Vec<Adresse>,
}

impl Adressekartotek {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // GROUPS AND TERMS
    // ========================================================================

    pub fn add_adressegruppe(&mut self, gruppe: Adressegruppe) -> IntranetResult<()> {
        if self.adressegruppe(gruppe.nummer).is_some() {
            return Err(IntranetError::business(format!(
                "adressegruppe {} already exists",
                gruppe.nummer
            )));
        }
        self.adressegrupper.push(gruppe);
        Ok(())
    }

    pub fn adressegruppe(&self, nummer: i32) -> Option<&Adressegruppe> {
        self.adressegrupper.iter().find(|g| g.nummer == nummer)
    }

    pub fn adressegrupper(&self) -> &[Adressegruppe] {
        &self.adressegrupper
    }

    pub fn add_betalingsbetingelse(&mut self, betingelse: Betalingsbetingelse) -> IntranetResult<()> {
        if self.betalingsbetingelse(betingelse.nummer).is_some() {
            return Err(IntranetError::business(format!(
                "betalingsbetingelse {} already exists",
                betingelse.nummer
            )));
        }
        self.betalingsbetingelser.push(betingelse);
        Ok(())
    }

    pub fn betalingsbetingelse(&self, nummer: i32) -> Option<&Betalingsbetingelse> {
        self.betalingsbetingelser.iter().find(|b| b.nummer == nummer)
    }

    pub fn betalingsbetingelser(&self) -> &[Betalingsbetingelse] {
        &self.betalingsbetingelser
    }

    // ========================================================================
    // ADDRESSES
    // ========================================================================

    /// Adds an address. A person carrying a company number is linked to
    /// that company, which must already be in the kartotek.
    pub fn add(&mut self, adresse: Adresse) -> IntranetResult<()> {
        let nummer = adresse.nummer();
        if self.get(nummer).is_some() {
            return Err(IntranetError::business(format!("adresse {} already exists", nummer)));
        }

        let info = adresse.info();
        if self.adressegruppe(info.adressegruppe).is_none() {
            return Err(IntranetError::not_found("Adressegruppe", info.adressegruppe));
        }
        if let Some(betingelse) = info.betalingsbetingelse {
            if self.betalingsbetingelse(betingelse).is_none() {
                return Err(IntranetError::not_found("Betalingsbetingelse", betingelse));
            }
        }

        let firma = match &adresse {
            Adresse::Person(person) => person.firma,
            Adresse::Firma(_) => None,
        };
        if let Some(firma) = firma {
            self.require_firma(firma)?;
        }

        let adresse = match adresse {
            Adresse::Person(mut person) => {
                person.firma = None;
                Adresse::Person(person)
            }
            Adresse::Firma(mut firma) => {
                // persons attach themselves through tilknyt_person
                firma.personer.clear();
                Adresse::Firma(firma)
            }
        };
        self.adresser.push(adresse);

        if let Some(firma) = firma {
            self.tilknyt_person(nummer, firma)?;
        }
        Ok(())
    }

    pub fn get(&self, nummer: i32) -> Option<&Adresse> {
        self.adresser.iter().find(|a| a.nummer() == nummer)
    }

    pub fn get_mut(&mut self, nummer: i32) -> Option<&mut Adresse> {
        self.adresser.iter_mut().find(|a| a.nummer() == nummer)
    }

    pub fn adresser(&self) -> &[Adresse] {
        &self.adresser
    }

    pub fn len(&self) -> usize {
        self.adresser.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adresser.is_empty()
    }

    /// Case-insensitive substring match on the name, sorted by name
    pub fn find_by_name(&self, navn: &str) -> Vec<&Adresse> {
        let needle = navn.trim().to_lowercase();
        let mut result: Vec<&Adresse> = self
            .adresser
            .iter()
            .filter(|a| a.navn().to_lowercase().contains(&needle))
            .collect();
        result.sort_by_key(|a| a.navn().to_lowercase());
        result
    }

    pub fn person(&self, nummer: i32) -> Option<&Person> {
        self.get(nummer).and_then(Adresse::as_person)
    }

    pub fn firma(&self, nummer: i32) -> Option<&Firma> {
        self.get(nummer).and_then(Adresse::as_firma)
    }

    fn require_firma(&self, nummer: i32) -> IntranetResult<&Firma> {
        self.firma(nummer)
            .ok_or_else(|| IntranetError::not_found("Firma", nummer))
    }

    fn person_mut(&mut self, nummer: i32) -> IntranetResult<&mut Person> {
        match self.get_mut(nummer) {
            Some(Adresse::Person(person)) => Ok(person),
            _ => Err(IntranetError::not_found("Person", nummer)),
        }
    }

    fn firma_mut(&mut self, nummer: i32) -> IntranetResult<&mut Firma> {
        match self.get_mut(nummer) {
            Some(Adresse::Firma(firma)) => Ok(firma),
            _ => Err(IntranetError::not_found("Firma", nummer)),
        }
    }

    // ========================================================================
    // PERSON <-> FIRMA
    // ========================================================================

    /// Links a person to a company, moving them from any previous company
    pub fn tilknyt_person(&mut self, person: i32, firma: i32) -> IntranetResult<()> {
        self.require_firma(firma)?;
        let tidligere = self.person_mut(person)?.firma;
        if tidligere == Some(firma) {
            return Ok(());
        }
        if tidligere.is_some() {
            self.fjern_person_fra_firma(person)?;
        }

        self.person_mut(person)?.firma = Some(firma);
        let firma = self.firma_mut(firma)?;
        if !firma.personer.contains(&person) {
            firma.personer.push(person);
        }
        Ok(())
    }

    pub fn fjern_person_fra_firma(&mut self, person: i32) -> IntranetResult<()> {
        let firma = match self.person_mut(person)?.firma.take() {
            Some(firma) => firma,
            None => return Ok(()),
        };
        if let Ok(firma) = self.firma_mut(firma) {
            firma.personer.retain(|p| *p != person);
        }
        Ok(())
    }

    pub fn personer_for_firma(&self, firma: i32) -> IntranetResult<Vec<&Person>> {
        let firma = self.require_firma(firma)?;
        Ok(firma
            .personer()
            .iter()
            .filter_map(|nummer| self.person(*nummer))
            .collect())
    }

    // ========================================================================
    // LISTS
    // ========================================================================

    /// All addresses sorted by name, then number
    pub fn adresseliste(&self) -> Vec<&Adresse> {
        let mut liste: Vec<&Adresse> = self.adresser.iter().collect();
        liste.sort_by(|a, b| {
            a.navn()
                .to_lowercase()
                .cmp(&b.navn().to_lowercase())
                .then(a.nummer().cmp(&b.nummer()))
        });
        liste
    }

    /// Addresses with at least one phone number, sorted by name
    pub fn telefonliste(&self) -> Vec<Telefonlisteelement> {
        self.adresseliste()
            .into_iter()
            .filter_map(|adresse| {
                let telefon = adresse.telefon()?;
                let mobil = match adresse {
                    Adresse::Person(person) => person
                        .mobil()
                        .filter(|mobil| *mobil != telefon)
                        .map(str::to_string),
                    Adresse::Firma(firma) => firma
                        .telefon2()
                        .filter(|telefon2| *telefon2 != telefon)
                        .map(str::to_string),
                };
                Some(Telefonlisteelement {
                    nummer: adresse.nummer(),
                    navn: adresse.navn().to_string(),
                    telefon: telefon.to_string(),
                    mobil,
                })
            })
            .collect()
    }
}
