// 📅 Kalender - users and appointments
//
// Appointments list their participants by user id. A user only sees the
// appointments they take part in.

use crate::error::{IntranetError, IntranetResult};
use crate::validation::{optional_text, require_range, require_text};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bruger {
    pub id: i32,
    pub system: i32,
    initialer: String,
    navn: String,
    user_name: String,
}

impl Bruger {
    pub fn new(id: i32, system: i32, initialer: &str, navn: &str, user_name: &str) -> IntranetResult<Self> {
        Ok(Bruger {
            id: require_range("id", id, 1, i32::MAX)?,
            system,
            initialer: require_text("initialer", initialer)?,
            navn: require_text("navn", navn)?,
            user_name: require_text("user_name", user_name)?.to_lowercase(),
        })
    }

    pub fn initialer(&self) -> &str {
        &self.initialer
    }

    pub fn navn(&self) -> &str {
        &self.navn
    }

    pub fn user_name(&self) -> &str {
        &self.user_name
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aftale {
    pub id: i32,
    pub system: i32,
    fra: NaiveDateTime,
    til: NaiveDateTime,
    emne: String,
    notat: Option<String>,
    pub offentlig: bool,
    pub privat: bool,
    pub alarm: bool,
    pub udfoert: bool,
    deltagere: Vec<i32>,
}

impl Aftale {
    pub fn new(id: i32, system: i32, fra: NaiveDateTime, til: NaiveDateTime, emne: &str) -> IntranetResult<Self> {
        let mut aftale = Aftale {
            id: require_range("id", id, 1, i32::MAX)?,
            system,
            fra,
            til,
            emne: require_text("emne", emne)?,
            notat: None,
            offentlig: false,
            privat: false,
            alarm: false,
            udfoert: false,
            deltagere: Vec::new(),
        };
        aftale.set_tidsrum(fra, til)?;
        Ok(aftale)
    }

    pub fn fra(&self) -> NaiveDateTime {
        self.fra
    }

    pub fn til(&self) -> NaiveDateTime {
        self.til
    }

    pub fn set_tidsrum(&mut self, fra: NaiveDateTime, til: NaiveDateTime) -> IntranetResult<()> {
        if fra >= til {
            return Err(IntranetError::illegal(
                "til",
                format!("{} is not after {}", til, fra),
            ));
        }
        self.fra = fra;
        self.til = til;
        Ok(())
    }

    pub fn emne(&self) -> &str {
        &self.emne
    }

    pub fn set_emne(&mut self, emne: &str) -> IntranetResult<()> {
        self.emne = require_text("emne", emne)?;
        Ok(())
    }

    pub fn notat(&self) -> Option<&str> {
        self.notat.as_deref()
    }

    pub fn set_notat(&mut self, notat: Option<&str>) {
        self.notat = optional_text(notat);
    }

    pub fn deltagere(&self) -> &[i32] {
        &self.deltagere
    }

    pub fn har_deltager(&self, bruger: i32) -> bool {
        self.deltagere.contains(&bruger)
    }

    /// Half-open overlap with [fra, til)
    pub fn overlapper(&self, fra: NaiveDateTime, til: NaiveDateTime) -> bool {
        self.fra < til && fra < self.til
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Kalender {
    brugere: Vec<Bruger>,
    aftaler: Vec<Aftale>,
}

impl Kalender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn brugere(&self) -> &[Bruger] {
        &self.brugere
    }

    pub fn bruger(&self, id: i32) -> Option<&Bruger> {
        self.brugere.iter().find(|b| b.id == id)
    }

    pub fn bruger_by_user_name(&self, user_name: &str) -> Option<&Bruger> {
        let user_name = user_name.trim().to_lowercase();
        self.brugere.iter().find(|b| b.user_name == user_name)
    }

    pub fn add_bruger(&mut self, bruger: Bruger) -> IntranetResult<()> {
        if self.bruger(bruger.id).is_some() {
            return Err(IntranetError::business(format!("bruger {} already exists", bruger.id)));
        }
        if self.bruger_by_user_name(&bruger.user_name).is_some() {
            return Err(IntranetError::business(format!(
                "user name {} is taken",
                bruger.user_name
            )));
        }
        self.brugere.push(bruger);
        Ok(())
    }

    pub fn aftaler(&self) -> &[Aftale] {
        &self.aftaler
    }

    pub fn aftale(&self, id: i32) -> Option<&Aftale> {
        self.aftaler.iter().find(|a| a.id == id)
    }

    pub fn next_aftale_id(&self) -> i32 {
        self.aftaler.iter().map(|a| a.id).max().unwrap_or(0) + 1
    }

    fn require_bruger(&self, id: i32) -> IntranetResult<&Bruger> {
        self.bruger(id).ok_or_else(|| IntranetError::not_found("Bruger", id))
    }

    fn aftale_mut(&mut self, id: i32) -> IntranetResult<&mut Aftale> {
        self.aftaler
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| IntranetError::not_found("Aftale", id))
    }

    pub fn add_aftale(&mut self, mut aftale: Aftale, deltagere: &[i32]) -> IntranetResult<()> {
        if self.aftale(aftale.id).is_some() {
            return Err(IntranetError::business(format!("aftale {} already exists", aftale.id)));
        }
        for deltager in deltagere {
            self.require_bruger(*deltager)?;
        }

        aftale.deltagere.clear();
        for deltager in deltagere {
            if !aftale.deltagere.contains(deltager) {
                aftale.deltagere.push(*deltager);
            }
        }
        self.aftaler.push(aftale);
        Ok(())
    }

    pub fn tilmeld(&mut self, aftale: i32, bruger: i32) -> IntranetResult<()> {
        self.require_bruger(bruger)?;
        let aftale = self.aftale_mut(aftale)?;
        if aftale.har_deltager(bruger) {
            return Err(IntranetError::business(format!(
                "bruger {} already takes part in aftale {}",
                bruger, aftale.id
            )));
        }
        aftale.deltagere.push(bruger);
        Ok(())
    }

    pub fn frameld(&mut self, aftale: i32, bruger: i32) -> IntranetResult<()> {
        let aftale = self.aftale_mut(aftale)?;
        if !aftale.har_deltager(bruger) {
            return Err(IntranetError::not_found("Deltager", bruger));
        }
        aftale.deltagere.retain(|d| *d != bruger);
        Ok(())
    }

    /// Appointments the user takes part in that overlap [fra, til), by start
    pub fn aftaler_for(&self, bruger: i32, fra: NaiveDateTime, til: NaiveDateTime) -> IntranetResult<Vec<&Aftale>> {
        self.require_bruger(bruger)?;
        if fra > til {
            return Err(IntranetError::illegal("til", format!("{} is before {}", til, fra)));
        }
        let mut result: Vec<&Aftale> = self
            .aftaler
            .iter()
            .filter(|a| a.har_deltager(bruger) && a.overlapper(fra, til))
            .collect();
        result.sort_by(|a, b| a.fra.cmp(&b.fra).then(a.id.cmp(&b.id)));
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn tid(dag: u32, time: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, dag)
            .unwrap()
            .and_hms_opt(time, 0, 0)
            .unwrap()
    }

    fn kalender() -> Kalender {
        let mut kalender = Kalender::new();
        kalender
            .add_bruger(Bruger::new(1, 1, "OS", "Ole Sørensen", "OLE").unwrap())
            .unwrap();
        kalender
            .add_bruger(Bruger::new(2, 1, "BR", "Bente Rasmussen", "bente").unwrap())
            .unwrap();
        kalender
    }

    #[test]
    fn test_aftale_validation() {
        assert!(Aftale::new(1, 1, tid(1, 10), tid(1, 10), "Møde").is_err());
        assert!(Aftale::new(1, 1, tid(1, 11), tid(1, 10), "Møde").is_err());
        assert!(Aftale::new(1, 1, tid(1, 10), tid(1, 11), " ").is_err());
        assert!(Aftale::new(1, 1, tid(1, 10), tid(1, 11), "Møde").is_ok());
    }

    #[test]
    fn test_bruger_unique() {
        let mut kalender = kalender();
        assert!(kalender
            .add_bruger(Bruger::new(1, 1, "XX", "Dublet", "dublet").unwrap())
            .is_err());
        assert!(kalender
            .add_bruger(Bruger::new(3, 1, "XX", "Dublet", "Ole").unwrap())
            .is_err());
        assert_eq!(kalender.bruger_by_user_name(" Ole ").unwrap().id, 1);
    }

    #[test]
    fn test_add_aftale_requires_known_participants() {
        let mut kalender = kalender();
        let aftale = Aftale::new(1, 1, tid(1, 10), tid(1, 11), "Møde").unwrap();
        assert!(matches!(
            kalender.add_aftale(aftale.clone(), &[1, 9]),
            Err(IntranetError::NotFound { .. })
        ));
        kalender.add_aftale(aftale.clone(), &[1, 1, 2]).unwrap();
        assert_eq!(kalender.aftale(1).unwrap().deltagere(), &[1, 2]);
        assert!(kalender.add_aftale(aftale, &[]).is_err());
        assert_eq!(kalender.next_aftale_id(), 2);
    }

    #[test]
    fn test_aftaler_for_overlap_ordered_by_start() {
        let mut kalender = kalender();
        kalender
            .add_aftale(Aftale::new(1, 1, tid(3, 9), tid(3, 10), "Sent").unwrap(), &[1])
            .unwrap();
        kalender
            .add_aftale(Aftale::new(2, 1, tid(1, 23), tid(2, 1), "Nat").unwrap(), &[1])
            .unwrap();
        kalender
            .add_aftale(Aftale::new(3, 1, tid(2, 12), tid(2, 13), "Frokost").unwrap(), &[2])
            .unwrap();
        kalender
            .add_aftale(Aftale::new(4, 1, tid(5, 8), tid(5, 9), "Udenfor").unwrap(), &[1])
            .unwrap();

        let aftaler = kalender.aftaler_for(1, tid(2, 0), tid(4, 0)).unwrap();
        let ids: Vec<i32> = aftaler.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![2, 1]);

        // ends exactly at the window start
        assert!(kalender.aftaler_for(1, tid(2, 1), tid(2, 2)).unwrap().is_empty());
        assert!(kalender.aftaler_for(9, tid(2, 0), tid(4, 0)).is_err());
    }

    #[test]
    fn test_tilmeld_frameld() {
        let mut kalender = kalender();
        kalender
            .add_aftale(Aftale::new(1, 1, tid(1, 10), tid(1, 11), "Møde").unwrap(), &[1])
            .unwrap();

        kalender.tilmeld(1, 2).unwrap();
        assert!(kalender.tilmeld(1, 2).is_err());
        assert!(kalender.tilmeld(1, 9).is_err());
        assert_eq!(kalender.aftaler_for(2, tid(1, 0), tid(2, 0)).unwrap().len(), 1);

        kalender.frameld(1, 2).unwrap();
        assert!(kalender.frameld(1, 2).is_err());
        assert!(kalender.aftaler_for(2, tid(1, 0), tid(2, 0)).unwrap().is_empty());
    }
}
