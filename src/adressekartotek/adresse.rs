// 📇 Addresses - persons and companies
//
// Persons and companies share the address part. A person may work for one
// company; the company keeps the list of its persons. The kartotek keeps the
// two sides in step.

use crate::error::{IntranetError, IntranetResult};
use crate::validation::{optional_text, require_range, require_text, DomainObjectValidations};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Adressegruppe {
    pub nummer: i32,
    navn: String,
}

impl Adressegruppe {
    pub fn new(nummer: i32, navn: &str) -> IntranetResult<Self> {
        Ok(Adressegruppe {
            nummer: require_range("nummer", nummer, 1, i32::MAX)?,
            navn: require_text("navn", navn)?,
        })
    }

    pub fn navn(&self) -> &str {
        &self.navn
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Betalingsbetingelse {
    pub nummer: i32,
    navn: String,
}

impl Betalingsbetingelse {
    pub fn new(nummer: i32, navn: &str) -> IntranetResult<Self> {
        Ok(Betalingsbetingelse {
            nummer: require_range("nummer", nummer, 1, i32::MAX)?,
            navn: require_text("navn", navn)?,
        })
    }

    pub fn navn(&self) -> &str {
        &self.navn
    }
}

// ============================================================================
// SHARED ADDRESS PART
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdresseInfo {
    pub nummer: i32,
    navn: String,
    adresse1: Option<String>,
    adresse2: Option<String>,
    postnr_by: Option<String>,
    pub adressegruppe: i32,
    bekendtskab: Option<String>,
    mailadresse: Option<String>,
    webadresse: Option<String>,
    pub betalingsbetingelse: Option<i32>,
    udlaansfrist: Option<i32>,
    pub filofax_adresselabel: bool,
}

impl AdresseInfo {
    pub fn new(nummer: i32, navn: &str, adressegruppe: i32) -> IntranetResult<Self> {
        Ok(AdresseInfo {
            nummer: require_range("nummer", nummer, 1, i32::MAX)?,
            navn: require_text("navn", navn)?,
            adresse1: None,
            adresse2: None,
            postnr_by: None,
            adressegruppe,
            bekendtskab: None,
            mailadresse: None,
            webadresse: None,
            betalingsbetingelse: None,
            udlaansfrist: None,
            filofax_adresselabel: false,
        })
    }

    pub fn navn(&self) -> &str {
        &self.navn
    }

    pub fn set_navn(&mut self, navn: &str) -> IntranetResult<()> {
        self.navn = require_text("navn", navn)?;
        Ok(())
    }

    pub fn adresse1(&self) -> Option<&str> {
        self.adresse1.as_deref()
    }

    pub fn adresse2(&self) -> Option<&str> {
        self.adresse2.as_deref()
    }

    pub fn postnr_by(&self) -> Option<&str> {
        self.postnr_by.as_deref()
    }

    pub fn set_adresse(&mut self, adresse1: Option<&str>, adresse2: Option<&str>, postnr_by: Option<&str>) {
        self.adresse1 = optional_text(adresse1);
        self.adresse2 = optional_text(adresse2);
        self.postnr_by = optional_text(postnr_by);
    }

    pub fn bekendtskab(&self) -> Option<&str> {
        self.bekendtskab.as_deref()
    }

    pub fn set_bekendtskab(&mut self, bekendtskab: Option<&str>) {
        self.bekendtskab = optional_text(bekendtskab);
    }

    pub fn mailadresse(&self) -> Option<&str> {
        self.mailadresse.as_deref()
    }

    pub fn set_mailadresse(&mut self, mailadresse: Option<&str>) -> IntranetResult<()> {
        let mailadresse = optional_text(mailadresse);
        if let Some(mail) = mailadresse.as_deref() {
            if !DomainObjectValidations::create().is_mail_address(mail) {
                return Err(IntranetError::illegal(
                    "mailadresse",
                    format!("{} is not a mail address", mail),
                ));
            }
        }
        self.mailadresse = mailadresse;
        Ok(())
    }

    pub fn webadresse(&self) -> Option<&str> {
        self.webadresse.as_deref()
    }

    pub fn set_webadresse(&mut self, webadresse: Option<&str>) {
        self.webadresse = optional_text(webadresse);
    }

    /// Loan period in days
    pub fn udlaansfrist(&self) -> Option<i32> {
        self.udlaansfrist
    }

    pub fn set_udlaansfrist(&mut self, dage: Option<i32>) -> IntranetResult<()> {
        if let Some(dage) = dage {
            require_range("udlaansfrist", dage, 0, i32::MAX)?;
        }
        self.udlaansfrist = dage;
        Ok(())
    }
}

// ============================================================================
// PERSON / FIRMA
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub info: AdresseInfo,
    telefon: Option<String>,
    mobil: Option<String>,
    pub fodselsdato: Option<NaiveDate>,
    pub(super) firma: Option<i32>,
}

impl Person {
    pub fn new(nummer: i32, navn: &str, adressegruppe: i32) -> IntranetResult<Self> {
        Ok(Person {
            info: AdresseInfo::new(nummer, navn, adressegruppe)?,
            telefon: None,
            mobil: None,
            fodselsdato: None,
            firma: None,
        })
    }

    pub fn telefon(&self) -> Option<&str> {
        self.telefon.as_deref()
    }

    pub fn mobil(&self) -> Option<&str> {
        self.mobil.as_deref()
    }

    pub fn set_telefon(&mut self, telefon: Option<&str>, mobil: Option<&str>) {
        self.telefon = optional_text(telefon);
        self.mobil = optional_text(mobil);
    }

    pub fn firma(&self) -> Option<i32> {
        self.firma
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Firma {
    pub info: AdresseInfo,
    telefon1: Option<String>,
    telefon2: Option<String>,
    telefax: Option<String>,
    pub(super) personer: Vec<i32>,
}

impl Firma {
    pub fn new(nummer: i32, navn: &str, adressegruppe: i32) -> IntranetResult<Self> {
        Ok(Firma {
            info: AdresseInfo::new(nummer, navn, adressegruppe)?,
            telefon1: None,
            telefon2: None,
            telefax: None,
            personer: Vec::new(),
        })
    }

    pub fn telefon1(&self) -> Option<&str> {
        self.telefon1.as_deref()
    }

    pub fn telefon2(&self) -> Option<&str> {
        self.telefon2.as_deref()
    }

    pub fn telefax(&self) -> Option<&str> {
        self.telefax.as_deref()
    }

    pub fn set_telefon(&mut self, telefon1: Option<&str>, telefon2: Option<&str>, telefax: Option<&str>) {
        self.telefon1 = optional_text(telefon1);
        self.telefon2 = optional_text(telefon2);
        self.telefax = optional_text(telefax);
    }

    pub fn personer(&self) -> &[i32] {
        &self.personer
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Adresse {
    Person(Person),
    Firma(Firma),
}

impl Adresse {
    pub fn info(&self) -> &AdresseInfo {
        match self {
            Adresse::Person(person) => &person.info,
            Adresse::Firma(firma) => &firma.info,
        }
    }

    pub fn info_mut(&mut self) -> &mut AdresseInfo {
        match self {
            Adresse::Person(person) => &mut person.info,
            Adresse::Firma(firma) => &mut firma.info,
        }
    }

    pub fn nummer(&self) -> i32 {
        self.info().nummer
    }

    pub fn navn(&self) -> &str {
        self.info().navn()
    }

    /// First phone number on record
    pub fn telefon(&self) -> Option<&str> {
        match self {
            Adresse::Person(person) => person.telefon().or(person.mobil()),
            Adresse::Firma(firma) => firma.telefon1().or(firma.telefon2()),
        }
    }

    pub fn as_person(&self) -> Option<&Person> {
        match self {
            Adresse::Person(person) => Some(person),
            Adresse::Firma(_) => None,
        }
    }

    pub fn as_firma(&self) -> Option<&Firma> {
        match self {
            Adresse::Firma(firma) => Some(firma),
            Adresse::Person(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adresse_info_validation() {
        assert!(AdresseInfo::new(0, "Ole", 1).is_err());
        assert!(AdresseInfo::new(1, " ", 1).is_err());

        let mut info = AdresseInfo::new(1, "Ole Sørensen", 1).unwrap();
        info.set_adresse(Some("Eggertsvej 10"), Some(" "), Some("5700 Svendborg"));
        assert_eq!(info.adresse1(), Some("Eggertsvej 10"));
        assert_eq!(info.adresse2(), None);

        assert!(info.set_udlaansfrist(Some(-1)).is_err());
        info.set_udlaansfrist(Some(14)).unwrap();
        assert_eq!(info.udlaansfrist(), Some(14));
    }

    #[test]
    fn test_mailadresse_validated() {
        let mut info = AdresseInfo::new(1, "Ole", 1).unwrap();
        info.set_mailadresse(Some("ole@example.dk")).unwrap();
        assert_eq!(info.mailadresse(), Some("ole@example.dk"));

        assert!(info.set_mailadresse(Some("ole")).is_err());
        assert_eq!(info.mailadresse(), Some("ole@example.dk"));

        info.set_mailadresse(None).unwrap();
        assert_eq!(info.mailadresse(), None);
    }

    #[test]
    fn test_primary_phone() {
        let mut person = Person::new(1, "Ole", 1).unwrap();
        person.set_telefon(None, Some("20 30 40 50"));
        assert_eq!(Adresse::Person(person).telefon(), Some("20 30 40 50"));

        let mut firma = Firma::new(2, "OSDevGrp", 1).unwrap();
        firma.set_telefon(Some("62 21 49 60"), None, Some("62 21 49 61"));
        let firma = Adresse::Firma(firma);
        assert_eq!(firma.telefon(), Some("62 21 49 60"));
        assert!(firma.as_person().is_none());
        assert_eq!(firma.as_firma().unwrap().telefax(), Some("62 21 49 61"));
    }
}
