// 📒 Regnskab - the account book aggregate
//
// A regnskab owns its groups, accounts, budget accounts and every posting
// line. Lines refer to accounts by kontonummer; balances are computed from
// the lines on demand, never stored.

use super::bogforing::{Bogforingsadvarsel, Bogforingslinje, Bogforingsresultat, Postering};
use super::konto::{Budgetkonto, Budgetkontogruppe, Konto, Kontogruppe, KontogruppeType};
use super::money::Money;
use crate::error::{IntranetError, IntranetResult};
use crate::validation::{require_range, require_text};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Status of one konto at a date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Kontostatus {
    pub kontonummer: String,
    pub kontonavn: String,
    pub kontogruppe: i32,
    pub saldo: Money,
    pub kredit: Money,
    pub disponibel: Money,
}

/// Status of one budgetkonto for the month of a date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Budgetkontostatus {
    pub kontonummer: String,
    pub kontonavn: String,
    pub budgetkontogruppe: i32,
    pub budget: Money,
    pub bogfort: Money,
    pub disponibel: Money,
}

/// Balance of one address across the regnskab
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Adressekontostatus {
    pub adressenummer: i32,
    pub saldo: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Regnskab {
    pub nummer: i32,
    navn: String,
    pub brevhoved: Option<i32>,
    kontogrupper: Vec<Kontogruppe>,
    budgetkontogrupper: Vec<Budgetkontogruppe>,
    konti: Vec<Konto>,
    budgetkonti: Vec<Budgetkonto>,
    linjer: Vec<Bogforingslinje>,
}

impl Regnskab {
    pub fn new(nummer: i32, navn: &str) -> IntranetResult<Self> {
        Ok(Regnskab {
            nummer: require_range("nummer", nummer, 1, i32::MAX)?,
            navn: require_text("navn", navn)?,
            brevhoved: None,
            kontogrupper: Vec::new(),
            budgetkontogrupper: Vec::new(),
            konti: Vec::new(),
            budgetkonti: Vec::new(),
            linjer: Vec::new(),
        })
    }

    pub fn navn(&self) -> &str {
        &self.navn
    }

    pub fn set_navn(&mut self, navn: &str) -> IntranetResult<()> {
        self.navn = require_text("navn", navn)?;
        Ok(())
    }

    // ========================================================================
    // STRUCTURE
    // ========================================================================

    pub fn kontogrupper(&self) -> &[Kontogruppe] {
        &self.kontogrupper
    }

    pub fn budgetkontogrupper(&self) -> &[Budgetkontogruppe] {
        &self.budgetkontogrupper
    }

    pub fn konti(&self) -> &[Konto] {
        &self.konti
    }

    pub fn budgetkonti(&self) -> &[Budgetkonto] {
        &self.budgetkonti
    }

    pub fn add_kontogruppe(&mut self, gruppe: Kontogruppe) -> IntranetResult<()> {
        if self.kontogruppe(gruppe.nummer).is_some() {
            return Err(IntranetError::business(format!(
                "kontogruppe {} already exists",
                gruppe.nummer
            )));
        }
        self.kontogrupper.push(gruppe);
        Ok(())
    }

    pub fn add_budgetkontogruppe(&mut self, gruppe: Budgetkontogruppe) -> IntranetResult<()> {
        if self.budgetkontogrupper.iter().any(|g| g.nummer == gruppe.nummer) {
            return Err(IntranetError::business(format!(
                "budgetkontogruppe {} already exists",
                gruppe.nummer
            )));
        }
        self.budgetkontogrupper.push(gruppe);
        Ok(())
    }

    pub fn kontogruppe(&self, nummer: i32) -> Option<&Kontogruppe> {
        self.kontogrupper.iter().find(|g| g.nummer == nummer)
    }

    pub fn add_konto(&mut self, konto: Konto) -> IntranetResult<()> {
        if self.kontogruppe(konto.kontogruppe).is_none() {
            return Err(IntranetError::not_found("Kontogruppe", konto.kontogruppe));
        }
        if self.konto(konto.kontonummer()).is_some() {
            return Err(IntranetError::business(format!(
                "konto {} already exists in regnskab {}",
                konto.kontonummer(),
                self.nummer
            )));
        }
        self.konti.push(konto);
        Ok(())
    }

    pub fn add_budgetkonto(&mut self, budgetkonto: Budgetkonto) -> IntranetResult<()> {
        if !self
            .budgetkontogrupper
            .iter()
            .any(|g| g.nummer == budgetkonto.budgetkontogruppe)
        {
            return Err(IntranetError::not_found(
                "Budgetkontogruppe",
                budgetkonto.budgetkontogruppe,
            ));
        }
        if self.budgetkonto(budgetkonto.kontonummer()).is_some() {
            return Err(IntranetError::business(format!(
                "budgetkonto {} already exists in regnskab {}",
                budgetkonto.kontonummer(),
                self.nummer
            )));
        }
        self.budgetkonti.push(budgetkonto);
        Ok(())
    }

    pub fn konto(&self, kontonummer: &str) -> Option<&Konto> {
        self.konti
            .iter()
            .find(|k| k.kontonummer().eq_ignore_ascii_case(kontonummer.trim()))
    }

    pub fn konto_mut(&mut self, kontonummer: &str) -> Option<&mut Konto> {
        self.konti
            .iter_mut()
            .find(|k| k.kontonummer().eq_ignore_ascii_case(kontonummer.trim()))
    }

    pub fn budgetkonto(&self, kontonummer: &str) -> Option<&Budgetkonto> {
        self.budgetkonti
            .iter()
            .find(|k| k.kontonummer().eq_ignore_ascii_case(kontonummer.trim()))
    }

    pub fn budgetkonto_mut(&mut self, kontonummer: &str) -> Option<&mut Budgetkonto> {
        self.budgetkonti
            .iter_mut()
            .find(|k| k.kontonummer().eq_ignore_ascii_case(kontonummer.trim()))
    }

    fn require_konto(&self, kontonummer: &str) -> IntranetResult<&Konto> {
        self.konto(kontonummer)
            .ok_or_else(|| IntranetError::not_found("Konto", kontonummer))
    }

    fn require_budgetkonto(&self, kontonummer: &str) -> IntranetResult<&Budgetkonto> {
        self.budgetkonto(kontonummer)
            .ok_or_else(|| IntranetError::not_found("Budgetkonto", kontonummer))
    }

    // ========================================================================
    // POSTING LINES
    // ========================================================================

    /// Adds an existing line, as loaded from storage
    pub fn add_linje(&mut self, linje: Bogforingslinje) -> IntranetResult<()> {
        self.require_konto(linje.kontonummer())?;
        if let Some(budgetkontonummer) = linje.budgetkontonummer() {
            self.require_budgetkonto(budgetkontonummer)?;
        }
        if self.linjer.iter().any(|l| l.lobenummer() == linje.lobenummer()) {
            return Err(IntranetError::business(format!(
                "bogføringslinje {} already exists in regnskab {}",
                linje.lobenummer(),
                self.nummer
            )));
        }
        self.linjer.push(linje);
        Ok(())
    }

    pub fn linjer(&self) -> &[Bogforingslinje] {
        &self.linjer
    }

    pub fn next_lobenummer(&self) -> i32 {
        self.linjer.iter().map(|l| l.lobenummer()).max().unwrap_or(0) + 1
    }

    /// Newest lines up to and including `dato`
    pub fn bogforingslinjer(&self, dato: NaiveDate, antal: usize) -> Vec<&Bogforingslinje> {
        let mut linjer: Vec<&Bogforingslinje> =
            self.linjer.iter().filter(|l| l.dato() <= dato).collect();
        linjer.sort_by(|a, b| {
            b.dato()
                .cmp(&a.dato())
                .then(b.lobenummer().cmp(&a.lobenummer()))
        });
        linjer.truncate(antal);
        linjer
    }

    /// Books a posting and reports warnings about overdrawn accounts and budgets
    pub fn bogfor(&mut self, postering: Postering) -> IntranetResult<Bogforingsresultat> {
        let linje = Bogforingslinje::new(self.next_lobenummer(), postering)?;
        self.add_linje(linje.clone())?;

        let dato = linje.dato();
        let mut advarsler = Vec::new();

        let konto = self.require_konto(linje.kontonummer())?;
        let aktiv = self
            .kontogruppe(konto.kontogruppe)
            .map(|g| g.kontogruppe_type == KontogruppeType::Aktiver)
            .unwrap_or(false);
        if aktiv {
            let disponibel = self.disponibel(linje.kontonummer(), dato)?;
            if disponibel.is_negative() {
                advarsler.push(Bogforingsadvarsel::KontoOvertrukket {
                    kontonummer: linje.kontonummer().to_string(),
                    disponibel,
                });
            }
        }

        if let Some(budgetkontonummer) = linje.budgetkontonummer() {
            let budget = self
                .require_budgetkonto(budgetkontonummer)?
                .budget(dato.year(), dato.month());
            let disponibel = self.budget_disponibel(budgetkontonummer, dato.year(), dato.month())?;
            if budget.is_negative() && disponibel.is_negative() {
                advarsler.push(Bogforingsadvarsel::BudgetOverskredet {
                    budgetkontonummer: budgetkontonummer.to_string(),
                    disponibel,
                });
            }
        }

        Ok(Bogforingsresultat { linje, advarsler })
    }

    // ========================================================================
    // BALANCES
    // ========================================================================

    /// Sum of debit minus kredit for lines dated up to `dato`
    pub fn saldo(&self, kontonummer: &str, dato: NaiveDate) -> IntranetResult<Money> {
        let konto = self.require_konto(kontonummer)?;
        Ok(self
            .linjer
            .iter()
            .filter(|l| l.kontonummer() == konto.kontonummer() && l.dato() <= dato)
            .map(Bogforingslinje::bevaegelse)
            .sum())
    }

    /// Credit line of the month plus saldo
    pub fn disponibel(&self, kontonummer: &str, dato: NaiveDate) -> IntranetResult<Money> {
        let konto = self.require_konto(kontonummer)?;
        Ok(konto.kredit(dato.year(), dato.month()) + self.saldo(kontonummer, dato)?)
    }

    /// Posted amount on a budgetkonto within one month
    pub fn bogfort(&self, budgetkontonummer: &str, aar: i32, maaned: u32) -> IntranetResult<Money> {
        let budgetkonto = self.require_budgetkonto(budgetkontonummer)?;
        Ok(self
            .linjer
            .iter()
            .filter(|l| {
                l.budgetkontonummer() == Some(budgetkonto.kontonummer())
                    && l.dato().year() == aar
                    && l.dato().month() == maaned
            })
            .map(Bogforingslinje::bevaegelse)
            .sum())
    }

    /// Posted minus budget; negative once an expense budget is exceeded
    pub fn budget_disponibel(&self, budgetkontonummer: &str, aar: i32, maaned: u32) -> IntranetResult<Money> {
        let budget = self.require_budgetkonto(budgetkontonummer)?.budget(aar, maaned);
        Ok(self.bogfort(budgetkontonummer, aar, maaned)? - budget)
    }

    pub fn kontoplan(&self, dato: NaiveDate) -> IntranetResult<Vec<Kontostatus>> {
        let mut konti: Vec<&Konto> = self.konti.iter().collect();
        konti.sort_by(|a, b| {
            a.kontogruppe
                .cmp(&b.kontogruppe)
                .then(a.kontonummer().cmp(b.kontonummer()))
        });

        konti
            .into_iter()
            .map(|konto| -> IntranetResult<Kontostatus> {
                let saldo = self.saldo(konto.kontonummer(), dato)?;
                let kredit = konto.kredit(dato.year(), dato.month());
                Ok(Kontostatus {
                    kontonummer: konto.kontonummer().to_string(),
                    kontonavn: konto.kontonavn().to_string(),
                    kontogruppe: konto.kontogruppe,
                    saldo,
                    kredit,
                    disponibel: kredit + saldo,
                })
            })
            .collect()
    }

    pub fn budgetkontoplan(&self, dato: NaiveDate) -> IntranetResult<Vec<Budgetkontostatus>> {
        let (aar, maaned) = (dato.year(), dato.month());
        let mut budgetkonti: Vec<&Budgetkonto> = self.budgetkonti.iter().collect();
        budgetkonti.sort_by(|a, b| {
            a.budgetkontogruppe
                .cmp(&b.budgetkontogruppe)
                .then(a.kontonummer().cmp(b.kontonummer()))
        });

        budgetkonti
            .into_iter()
            .map(|konto| -> IntranetResult<Budgetkontostatus> {
                let budget = konto.budget(aar, maaned);
                let bogfort = self.bogfort(konto.kontonummer(), aar, maaned)?;
                Ok(Budgetkontostatus {
                    kontonummer: konto.kontonummer().to_string(),
                    kontonavn: konto.kontonavn().to_string(),
                    budgetkontogruppe: konto.budgetkontogruppe,
                    budget,
                    bogfort,
                    disponibel: bogfort - budget,
                })
            })
            .collect()
    }

    // ========================================================================
    // ADDRESS ACCOUNTS
    // ========================================================================

    pub fn adressekonto_saldo(&self, adressenummer: i32, dato: NaiveDate) -> Money {
        self.linjer
            .iter()
            .filter(|l| l.adressenummer() == Some(adressenummer) && l.dato() <= dato)
            .map(Bogforingslinje::bevaegelse)
            .sum()
    }

    /// Every address with postings, ordered by number
    pub fn adressekonti(&self, dato: NaiveDate) -> Vec<Adressekontostatus> {
        let mut numre: Vec<i32> = self
            .linjer
            .iter()
            .filter(|l| l.dato() <= dato)
            .filter_map(Bogforingslinje::adressenummer)
            .collect();
        numre.sort_unstable();
        numre.dedup();

        numre
            .into_iter()
            .map(|adressenummer| Adressekontostatus {
                adressenummer,
                saldo: self.adressekonto_saldo(adressenummer, dato),
            })
            .collect()
    }

    /// Addresses that owe money
    pub fn debitorer(&self, dato: NaiveDate) -> Vec<Adressekontostatus> {
        self.adressekonti(dato)
            .into_iter()
            .filter(|a| a.saldo.is_positive())
            .collect()
    }

    /// Addresses that are owed money
    pub fn kreditorer(&self, dato: NaiveDate) -> Vec<Adressekontostatus> {
        self.adressekonti(dato)
            .into_iter()
            .filter(|a| a.saldo.is_negative())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finansstyring::{Budgetoplysninger, Kreditoplysninger};

    fn dato(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    fn postering(kontonummer: &str, budgetkonto: Option<&str>, debit: i64, kredit: i64, day: NaiveDate) -> Postering {
        Postering {
            dato: day,
            bilag: None,
            kontonummer: kontonummer.to_string(),
            tekst: "Postering".to_string(),
            budgetkontonummer: budgetkonto.map(str::to_string),
            debit: Money::from_major(debit),
            kredit: Money::from_major(kredit),
            adressenummer: None,
        }
    }

    /// Regnskab 1 with DANKORT (aktiver, 5000 credit in March), LAAN (passiver)
    /// and budget accounts 1000 (salary, +20000) and 8990 (food, -3000)
    fn regnskab() -> Regnskab {
        let mut r = Regnskab::new(1, "Ole Sørensen").unwrap();
        r.add_kontogruppe(Kontogruppe::new(1, "Bankkonti", KontogruppeType::Aktiver).unwrap())
            .unwrap();
        r.add_kontogruppe(Kontogruppe::new(2, "Lån", KontogruppeType::Passiver).unwrap())
            .unwrap();
        r.add_budgetkontogruppe(Budgetkontogruppe::new(1, "Indtægter").unwrap())
            .unwrap();
        r.add_budgetkontogruppe(Budgetkontogruppe::new(2, "Husholdning").unwrap())
            .unwrap();

        let mut dankort = Konto::new("DANKORT", "Dankort", 1).unwrap();
        dankort.set_kreditoplysninger(Kreditoplysninger::new(2024, 3, Money::from_major(5000)).unwrap());
        r.add_konto(dankort).unwrap();
        r.add_konto(Konto::new("LAAN", "Billån", 2).unwrap()).unwrap();

        let mut loen = Budgetkonto::new("1000", "Løn", 1).unwrap();
        loen.set_budgetoplysninger(
            Budgetoplysninger::new(2024, 3, Money::from_major(20000), Money::ZERO).unwrap(),
        );
        r.add_budgetkonto(loen).unwrap();

        let mut mad = Budgetkonto::new("8990", "Mad", 2).unwrap();
        mad.set_budgetoplysninger(
            Budgetoplysninger::new(2024, 3, Money::ZERO, Money::from_major(3000)).unwrap(),
        );
        r.add_budgetkonto(mad).unwrap();
        r
    }

    #[test]
    fn test_regnskab_validation() {
        assert!(Regnskab::new(0, "X").is_err());
        assert!(Regnskab::new(1, " ").is_err());
    }

    #[test]
    fn test_structure_rules() {
        let mut r = regnskab();
        assert!(matches!(
            r.add_konto(Konto::new("dankort", "Igen", 1).unwrap()),
            Err(IntranetError::Business(_))
        ));
        assert!(matches!(
            r.add_konto(Konto::new("VISA", "Visa", 9).unwrap()),
            Err(IntranetError::NotFound { .. })
        ));
        assert!(r.add_budgetkonto(Budgetkonto::new("9000", "X", 9).unwrap()).is_err());
        assert!(r.konto("dankort").is_some());
    }

    #[test]
    fn test_bogfor_assigns_lobenummer() {
        let mut r = regnskab();
        let first = r.bogfor(postering("DANKORT", None, 1000, 0, dato(3, 1))).unwrap();
        let second = r.bogfor(postering("DANKORT", None, 0, 100, dato(3, 2))).unwrap();
        assert_eq!(first.linje.lobenummer(), 1);
        assert_eq!(second.linje.lobenummer(), 2);
        assert!(second.advarsler.is_empty());
    }

    #[test]
    fn test_bogfor_unknown_accounts() {
        let mut r = regnskab();
        assert!(matches!(
            r.bogfor(postering("VISA", None, 10, 0, dato(3, 1))),
            Err(IntranetError::NotFound { entity: "Konto", .. })
        ));
        assert!(matches!(
            r.bogfor(postering("DANKORT", Some("7777"), 10, 0, dato(3, 1))),
            Err(IntranetError::NotFound { entity: "Budgetkonto", .. })
        ));
        assert!(r.linjer().is_empty());
    }

    #[test]
    fn test_saldo_and_disponibel() {
        let mut r = regnskab();
        r.bogfor(postering("DANKORT", Some("1000"), 20000, 0, dato(3, 1))).unwrap();
        r.bogfor(postering("DANKORT", Some("8990"), 0, 750, dato(3, 10))).unwrap();
        r.bogfor(postering("DANKORT", Some("8990"), 0, 250, dato(3, 20))).unwrap();

        assert_eq!(r.saldo("DANKORT", dato(3, 15)).unwrap(), Money::from_major(19250));
        assert_eq!(r.saldo("DANKORT", dato(3, 31)).unwrap(), Money::from_major(19000));
        assert_eq!(r.disponibel("DANKORT", dato(3, 31)).unwrap(), Money::from_major(24000));
        assert_eq!(r.saldo("DANKORT", dato(2, 28)).unwrap(), Money::ZERO);
    }

    #[test]
    fn test_budget_figures() {
        let mut r = regnskab();
        r.bogfor(postering("DANKORT", Some("8990"), 0, 1000, dato(3, 10))).unwrap();
        r.bogfor(postering("DANKORT", Some("8990"), 0, 500, dato(4, 1))).unwrap();

        assert_eq!(r.bogfort("8990", 2024, 3).unwrap(), Money::from_major(-1000));
        assert_eq!(r.budget_disponibel("8990", 2024, 3).unwrap(), Money::from_major(2000));

        let plan = r.budgetkontoplan(dato(3, 31)).unwrap();
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].kontonummer, "1000");
        assert_eq!(plan[1].budget, Money::from_major(-3000));
        assert_eq!(plan[1].bogfort, Money::from_major(-1000));
    }

    #[test]
    fn test_overdraft_warning_only_for_assets() {
        let mut r = regnskab();
        let result = r.bogfor(postering("DANKORT", None, 0, 6000, dato(3, 5))).unwrap();
        assert_eq!(
            result.advarsler,
            vec![Bogforingsadvarsel::KontoOvertrukket {
                kontonummer: "DANKORT".to_string(),
                disponibel: Money::from_major(-1000),
            }]
        );

        let result = r.bogfor(postering("LAAN", None, 0, 100000, dato(3, 5))).unwrap();
        assert!(result.advarsler.is_empty());
    }

    #[test]
    fn test_budget_exceeded_warning() {
        let mut r = regnskab();
        r.bogfor(postering("DANKORT", Some("1000"), 20000, 0, dato(3, 1))).unwrap();
        let ok = r.bogfor(postering("DANKORT", Some("8990"), 0, 2500, dato(3, 2))).unwrap();
        assert!(ok.advarsler.is_empty());

        let over = r.bogfor(postering("DANKORT", Some("8990"), 0, 600, dato(3, 3))).unwrap();
        assert_eq!(
            over.advarsler,
            vec![Bogforingsadvarsel::BudgetOverskredet {
                budgetkontonummer: "8990".to_string(),
                disponibel: Money::from_major(-100),
            }]
        );
    }

    #[test]
    fn test_kontoplan_ordered_by_group() {
        let mut r = regnskab();
        r.bogfor(postering("LAAN", None, 0, 50000, dato(3, 1))).unwrap();
        let plan = r.kontoplan(dato(3, 31)).unwrap();
        assert_eq!(plan[0].kontonummer, "DANKORT");
        assert_eq!(plan[0].disponibel, Money::from_major(5000));
        assert_eq!(plan[1].saldo, Money::from_major(-50000));
    }

    #[test]
    fn test_latest_lines() {
        let mut r = regnskab();
        r.bogfor(postering("DANKORT", None, 10, 0, dato(3, 5))).unwrap();
        r.bogfor(postering("DANKORT", None, 20, 0, dato(3, 1))).unwrap();
        r.bogfor(postering("DANKORT", None, 30, 0, dato(3, 5))).unwrap();
        r.bogfor(postering("DANKORT", None, 40, 0, dato(3, 9))).unwrap();

        let linjer = r.bogforingslinjer(dato(3, 6), 2);
        let numre: Vec<i32> = linjer.iter().map(|l| l.lobenummer()).collect();
        assert_eq!(numre, vec![3, 1]);
    }

    #[test]
    fn test_debitorer_and_kreditorer() {
        let mut r = regnskab();
        let mut p = postering("DANKORT", None, 0, 400, dato(3, 1));
        p.adressenummer = Some(7);
        r.bogfor(p).unwrap();
        let mut p = postering("DANKORT", None, 900, 0, dato(3, 2));
        p.adressenummer = Some(3);
        r.bogfor(p).unwrap();

        assert_eq!(r.adressekonto_saldo(7, dato(3, 31)), Money::from_major(-400));
        assert_eq!(r.adressekonti(dato(3, 31)).len(), 2);
        assert_eq!(r.debitorer(dato(3, 31))[0].adressenummer, 3);
        assert_eq!(r.kreditorer(dato(3, 31))[0].adressenummer, 7);
        assert!(r.debitorer(dato(2, 1)).is_empty());
    }
}
