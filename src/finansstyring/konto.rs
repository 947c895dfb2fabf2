// 💳 Konti og budgetkonti
//
// A konto is a balance account (bank, credit card, loan) with a credit line
// per month. A budgetkonto is an income or expense line with a budget per
// month. Both are identified by their kontonummer within one regnskab.

use super::money::Money;
use crate::error::{IntranetError, IntranetResult};
use crate::validation::{optional_text, require_range, require_text};
use serde::{Deserialize, Serialize};

pub(crate) fn normalize_kontonummer(kontonummer: &str) -> IntranetResult<String> {
    Ok(require_text("kontonummer", kontonummer)?.to_uppercase())
}

fn require_not_negative(field: &'static str, amount: Money) -> IntranetResult<Money> {
    if amount.is_negative() {
        return Err(IntranetError::illegal(field, format!("{} is negative", amount)));
    }
    Ok(amount)
}

// ============================================================================
// GROUPS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KontogruppeType {
    /// Assets: overdrawing raises a warning
    Aktiver,
    /// Liabilities
    Passiver,
}

impl KontogruppeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            KontogruppeType::Aktiver => "Aktiver",
            KontogruppeType::Passiver => "Passiver",
        }
    }

    pub fn parse(value: &str) -> IntranetResult<Self> {
        match value.trim().to_lowercase().as_str() {
            "aktiver" | "1" => Ok(KontogruppeType::Aktiver),
            "passiver" | "2" => Ok(KontogruppeType::Passiver),
            other => Err(IntranetError::illegal("kontogruppe_type", other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Kontogruppe {
    pub nummer: i32,
    navn: String,
    pub kontogruppe_type: KontogruppeType,
}

impl Kontogruppe {
    pub fn new(nummer: i32, navn: &str, kontogruppe_type: KontogruppeType) -> IntranetResult<Self> {
        Ok(Kontogruppe {
            nummer: require_range("nummer", nummer, 1, i32::MAX)?,
            navn: require_text("navn", navn)?,
            kontogruppe_type,
        })
    }

    pub fn navn(&self) -> &str {
        &self.navn
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Budgetkontogruppe {
    pub nummer: i32,
    navn: String,
}

impl Budgetkontogruppe {
    pub fn new(nummer: i32, navn: &str) -> IntranetResult<Self> {
        Ok(Budgetkontogruppe {
            nummer: require_range("nummer", nummer, 1, i32::MAX)?,
            navn: require_text("navn", navn)?,
        })
    }

    pub fn navn(&self) -> &str {
        &self.navn
    }
}

// ============================================================================
// MONTHLY FIGURES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Kreditoplysninger {
    pub aar: i32,
    pub maaned: u32,
    pub kredit: Money,
}

impl Kreditoplysninger {
    pub fn new(aar: i32, maaned: u32, kredit: Money) -> IntranetResult<Self> {
        require_range("maaned", maaned as i32, 1, 12)?;
        Ok(Kreditoplysninger {
            aar,
            maaned,
            kredit: require_not_negative("kredit", kredit)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Budgetoplysninger {
    pub aar: i32,
    pub maaned: u32,
    pub indtaegter: Money,
    pub udgifter: Money,
}

impl Budgetoplysninger {
    pub fn new(aar: i32, maaned: u32, indtaegter: Money, udgifter: Money) -> IntranetResult<Self> {
        require_range("maaned", maaned as i32, 1, 12)?;
        Ok(Budgetoplysninger {
            aar,
            maaned,
            indtaegter: require_not_negative("indtaegter", indtaegter)?,
            udgifter: require_not_negative("udgifter", udgifter)?,
        })
    }

    /// Net budget, negative for an expense budget
    pub fn budget(&self) -> Money {
        self.indtaegter - self.udgifter
    }
}

// ============================================================================
// KONTO
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Konto {
    kontonummer: String,
    kontonavn: String,
    beskrivelse: Option<String>,
    note: Option<String>,
    pub kontogruppe: i32,
    kreditoplysninger: Vec<Kreditoplysninger>,
}

impl Konto {
    pub fn new(kontonummer: &str, kontonavn: &str, kontogruppe: i32) -> IntranetResult<Self> {
        Ok(Konto {
            kontonummer: normalize_kontonummer(kontonummer)?,
            kontonavn: require_text("kontonavn", kontonavn)?,
            beskrivelse: None,
            note: None,
            kontogruppe,
            kreditoplysninger: Vec::new(),
        })
    }

    pub fn kontonummer(&self) -> &str {
        &self.kontonummer
    }

    pub fn kontonavn(&self) -> &str {
        &self.kontonavn
    }

    pub fn set_kontonavn(&mut self, kontonavn: &str) -> IntranetResult<()> {
        self.kontonavn = require_text("kontonavn", kontonavn)?;
        Ok(())
    }

    pub fn beskrivelse(&self) -> Option<&str> {
        self.beskrivelse.as_deref()
    }

    pub fn set_beskrivelse(&mut self, beskrivelse: Option<&str>) {
        self.beskrivelse = optional_text(beskrivelse);
    }

    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }

    pub fn set_note(&mut self, note: Option<&str>) {
        self.note = optional_text(note);
    }

    pub fn kreditoplysninger(&self) -> &[Kreditoplysninger] {
        &self.kreditoplysninger
    }

    /// Replaces the figures for the same month
    pub fn set_kreditoplysninger(&mut self, oplysninger: Kreditoplysninger) {
        self.kreditoplysninger
            .retain(|k| !(k.aar == oplysninger.aar && k.maaned == oplysninger.maaned));
        self.kreditoplysninger.push(oplysninger);
    }

    pub fn kredit(&self, aar: i32, maaned: u32) -> Money {
        self.kreditoplysninger
            .iter()
            .find(|k| k.aar == aar && k.maaned == maaned)
            .map(|k| k.kredit)
            .unwrap_or(Money::ZERO)
    }
}

// ============================================================================
// BUDGETKONTO
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Budgetkonto {
    kontonummer: String,
    kontonavn: String,
    beskrivelse: Option<String>,
    note: Option<String>,
    pub budgetkontogruppe: i32,
    budgetoplysninger: Vec<Budgetoplysninger>,
}

impl Budgetkonto {
    pub fn new(kontonummer: &str, kontonavn: &str, budgetkontogruppe: i32) -> IntranetResult<Self> {
        Ok(Budgetkonto {
            kontonummer: normalize_kontonummer(kontonummer)?,
            kontonavn: require_text("kontonavn", kontonavn)?,
            beskrivelse: None,
            note: None,
            budgetkontogruppe,
            budgetoplysninger: Vec::new(),
        })
    }

    pub fn kontonummer(&self) -> &str {
        &self.kontonummer
    }

    pub fn kontonavn(&self) -> &str {
        &self.kontonavn
    }

    pub fn beskrivelse(&self) -> Option<&str> {
        self.beskrivelse.as_deref()
    }

    pub fn set_beskrivelse(&mut self, beskrivelse: Option<&str>) {
        self.beskrivelse = optional_text(beskrivelse);
    }

    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }

    pub fn set_note(&mut self, note: Option<&str>) {
        self.note = optional_text(note);
    }

    pub fn budgetoplysninger(&self) -> &[Budgetoplysninger] {
        &self.budgetoplysninger
    }

    pub fn set_budgetoplysninger(&mut self, oplysninger: Budgetoplysninger) {
        self.budgetoplysninger
            .retain(|b| !(b.aar == oplysninger.aar && b.maaned == oplysninger.maaned));
        self.budgetoplysninger.push(oplysninger);
    }

    pub fn budget(&self, aar: i32, maaned: u32) -> Money {
        self.budgetoplysninger
            .iter()
            .find(|b| b.aar == aar && b.maaned == maaned)
            .map(|b| b.budget())
            .unwrap_or(Money::ZERO)
    }
}
