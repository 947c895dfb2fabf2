// Bogføringslinjer (posting lines) and the warnings a posting can raise

use super::konto::normalize_kontonummer;
use super::money::Money;
use crate::error::{IntranetError, IntranetResult};
use crate::validation::{optional_text, require_text};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Input for a new posting, before it has a løbenummer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Postering {
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
pub struct Bogforingslinje {
    lobenummer: i32,
    dato: NaiveDate,
    bilag: Option<String>,
    kontonummer: String,
    tekst: String,
    budgetkontonummer: Option<String>,
    debit: Money,
    kredit: Money,
    adressenummer: Option<i32>,
}

impl Bogforingslinje {
    pub fn new(lobenummer: i32, postering: Postering) -> IntranetResult<Self> {
        if lobenummer <= 0 {
            return Err(IntranetError::illegal(
                "lobenummer",
                format!("{} is not positive", lobenummer),
            ));
        }
        if postering.debit.is_negative() {
            return Err(IntranetError::illegal("debit", "must not be negative"));
        }
        if postering.kredit.is_negative() {
            return Err(IntranetError::illegal("kredit", "must not be negative"));
        }
        if postering.debit.is_zero() && postering.kredit.is_zero() {
            return Err(IntranetError::business("a posting needs a debit or a kredit amount"));
        }

        let budgetkontonummer = match optional_text(postering.budgetkontonummer.as_deref()) {
            Some(nummer) => Some(normalize_kontonummer(&nummer)?),
            None => None,
        };

        Ok(Bogforingslinje {
            lobenummer,
            dato: postering.dato,
            bilag: optional_text(postering.bilag.as_deref()),
            kontonummer: normalize_kontonummer(&postering.kontonummer)?,
            tekst: require_text("tekst", &postering.tekst)?,
            budgetkontonummer,
            debit: postering.debit,
            kredit: postering.kredit,
            adressenummer: postering.adressenummer,
        })
    }

    pub fn lobenummer(&self) -> i32 {
        self.lobenummer
    }

    pub fn dato(&self) -> NaiveDate {
        self.dato
    }

    pub fn bilag(&self) -> Option<&str> {
        self.bilag.as_deref()
    }

    pub fn kontonummer(&self) -> &str {
        &self.kontonummer
    }

    pub fn tekst(&self) -> &str {
        &self.tekst
    }

    pub fn budgetkontonummer(&self) -> Option<&str> {
        self.budgetkontonummer.as_deref()
    }

    pub fn debit(&self) -> Money {
        self.debit
    }

    pub fn kredit(&self) -> Money {
        self.kredit
    }

    pub fn adressenummer(&self) -> Option<i32> {
        self.adressenummer
    }

    /// Signed movement: debit minus kredit
    pub fn bevaegelse(&self) -> Money {
        self.debit - self.kredit
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Bogforingsadvarsel {
    /// An asset account went below its available credit
    KontoOvertrukket { kontonummer: String, disponibel: Money },
    /// An expense budget was exceeded in the posting month
    BudgetOverskredet { budgetkontonummer: String, disponibel: Money },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bogforingsresultat {
    pub linje: Bogforingslinje,
    pub advarsler: Vec<Bogforingsadvarsel>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn postering(kontonummer: &str, debit: i64, kredit: i64) -> Postering {
        Postering {
            dato: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
            bilag: None,
            kontonummer: kontonummer.to_string(),
            tekst: "Netto".to_string(),
            budgetkontonummer: None,
            debit: Money::from_major(debit),
            kredit: Money::from_major(kredit),
            adressenummer: None,
        }
    }

    #[test]
    fn test_linje_creation() {
        let mut p = postering(" dankort", 0, 250);
        p.budgetkontonummer = Some(" 8990 ".to_string());
        p.bilag = Some("  ".to_string());

        let linje = Bogforingslinje::new(1, p).unwrap();
        assert_eq!(linje.kontonummer(), "DANKORT");
        assert_eq!(linje.budgetkontonummer(), Some("8990"));
        assert_eq!(linje.bilag(), None);
        assert_eq!(linje.bevaegelse(), Money::from_major(-250));
    }

    #[test]
    fn test_linje_validation() {
        assert!(Bogforingslinje::new(0, postering("DANKORT", 10, 0)).is_err());
        assert!(matches!(
            Bogforingslinje::new(1, postering("DANKORT", 0, 0)),
            Err(IntranetError::Business(_))
        ));
        assert!(Bogforingslinje::new(1, postering("DANKORT", -5, 0)).is_err());
        assert!(Bogforingslinje::new(1, postering("", 5, 0)).is_err());

        let mut p = postering("DANKORT", 5, 0);
        p.tekst = " ".to_string();
        assert!(matches!(Bogforingslinje::new(1, p), Err(IntranetError::ArgumentNull("tekst"))));
    }
}
