// Households, household members and their payments
//
// Membership between a household and a member is recorded on both sides.
// Every change goes through Household::add_member / remove_member so the two
// lists never disagree.

use super::data_provider::DataProvider;
use super::storage::Storage;
use crate::error::{IntranetError, IntranetResult};
use crate::validation::{optional_text, require_text, DomainObjectValidations};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// MEMBERSHIP
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Membership {
    Basic = 1,
    Deluxe = 2,
    Premium = 3,
}

impl Membership {
    pub fn as_str(&self) -> &'static str {
        match self {
            Membership::Basic => "Basic",
            Membership::Deluxe => "Deluxe",
            Membership::Premium => "Premium",
        }
    }

    pub fn parse(value: &str) -> IntranetResult<Self> {
        match value.trim().to_lowercase().as_str() {
            "basic" => Ok(Membership::Basic),
            "deluxe" => Ok(Membership::Deluxe),
            "premium" => Ok(Membership::Premium),
            other => Err(IntranetError::illegal("membership", format!("unknown membership {}", other))),
        }
    }
}

// ============================================================================
// PAYMENT
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub identifier: Uuid,
    pub stakeholder: Uuid,
    pub data_provider: Uuid,
    pub payment_time: DateTime<Utc>,
    payment_reference: String,
    pub payment_receipt: Option<Vec<u8>>,
    pub creation_time: DateTime<Utc>,
}

impl Payment {
    pub fn new(
        stakeholder: &HouseholdMember,
        data_provider: &DataProvider,
        payment_time: DateTime<Utc>,
        payment_reference: &str,
        payment_receipt: Option<Vec<u8>>,
    ) -> IntranetResult<Self> {
        if !data_provider.handles_payments {
            return Err(IntranetError::business(format!(
                "data provider {} does not handle payments",
                data_provider.name()
            )));
        }

        Ok(Payment {
            identifier: Uuid::new_v4(),
            stakeholder: stakeholder.identifier,
            data_provider: data_provider.identifier,
            payment_time,
            payment_reference: require_text("payment_reference", payment_reference)?,
            payment_receipt,
            creation_time: Utc::now(),
        })
    }

    pub fn payment_reference(&self) -> &str {
        &self.payment_reference
    }
}

// ============================================================================
// HOUSEHOLD MEMBER
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HouseholdMember {
    pub identifier: Uuid,
    mail_address: String,
    membership: Membership,
    membership_expire_time: Option<DateTime<Utc>>,
    activation_code: String,
    activation_time: Option<DateTime<Utc>>,
    privacy_policy_accepted_time: Option<DateTime<Utc>>,
    pub creation_time: DateTime<Utc>,
    households: Vec<Uuid>,
    payments: Vec<Payment>,
}

impl HouseholdMember {
    pub fn new(mail_address: &str) -> IntranetResult<Self> {
        Ok(HouseholdMember {
            identifier: Uuid::new_v4(),
            mail_address: validate_mail(mail_address)?,
            membership: Membership::Basic,
            membership_expire_time: None,
            activation_code: generate_activation_code(),
            activation_time: None,
            privacy_policy_accepted_time: None,
            creation_time: Utc::now(),
            households: Vec::new(),
            payments: Vec::new(),
        })
    }

    pub fn mail_address(&self) -> &str {
        &self.mail_address
    }

    pub fn set_mail_address(&mut self, mail_address: &str) -> IntranetResult<()> {
        self.mail_address = validate_mail(mail_address)?;
        Ok(())
    }

    pub fn activation_code(&self) -> &str {
        &self.activation_code
    }

    pub fn activation_time(&self) -> Option<DateTime<Utc>> {
        self.activation_time
    }

    pub fn is_activated(&self) -> bool {
        self.activation_time.is_some()
    }

    pub fn activate(&mut self, activation_code: &str) -> IntranetResult<()> {
        if self.is_activated() {
            return Err(IntranetError::business(format!(
                "household member {} is already activated",
                self.mail_address
            )));
        }
        if activation_code.trim() != self.activation_code {
            return Err(IntranetError::business("wrong activation code"));
        }
        self.activation_time = Some(Utc::now());
        Ok(())
    }

    pub fn privacy_policy_accepted_time(&self) -> Option<DateTime<Utc>> {
        self.privacy_policy_accepted_time
    }

    pub fn is_privacy_policy_accepted(&self) -> bool {
        self.privacy_policy_accepted_time.is_some()
    }

    pub fn accept_privacy_policy(&mut self) {
        if self.privacy_policy_accepted_time.is_none() {
            self.privacy_policy_accepted_time = Some(Utc::now());
        }
    }

    /// Effective membership at a point in time
    pub fn membership(&self, now: DateTime<Utc>) -> Membership {
        match self.membership_expire_time {
            Some(expires) if expires <= now => Membership::Basic,
            _ => self.membership,
        }
    }

    pub fn membership_expire_time(&self) -> Option<DateTime<Utc>> {
        self.membership_expire_time
    }

    pub fn membership_has_expired(&self, now: DateTime<Utc>) -> bool {
        self.membership != Membership::Basic && self.membership(now) == Membership::Basic
    }

    pub fn upgrade_membership(
        &mut self,
        target: Membership,
        expires: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> IntranetResult<()> {
        let current = self.membership(now);
        if !DomainObjectValidations::create().can_upgrade_membership(current, target) {
            return Err(IntranetError::business(format!(
                "membership cannot change from {} to {}",
                current.as_str(),
                target.as_str()
            )));
        }

        if target == Membership::Basic {
            self.membership = Membership::Basic;
            self.membership_expire_time = None;
            return Ok(());
        }

        match expires {
            Some(expires) if expires > now => {
                self.membership = target;
                self.membership_expire_time = Some(expires);
                Ok(())
            }
            Some(_) => Err(IntranetError::illegal(
                "membership_expire_time",
                "expire time must be in the future",
            )),
            None => Err(IntranetError::ArgumentNull("membership_expire_time")),
        }
    }

    pub fn household_limit(&self, now: DateTime<Utc>) -> usize {
        DomainObjectValidations::create().household_limit(self.membership(now))
    }

    pub fn has_reached_household_limit(&self, now: DateTime<Utc>) -> bool {
        DomainObjectValidations::create()
            .has_reached_household_limit(self.membership(now), self.households.len())
    }

    pub fn households(&self) -> &[Uuid] {
        &self.households
    }

    pub fn payments(&self) -> &[Payment] {
        &self.payments
    }

    pub fn add_payment(&mut self, payment: Payment) -> IntranetResult<()> {
        if payment.stakeholder != self.identifier {
            return Err(IntranetError::business(format!(
                "payment {} belongs to another stakeholder",
                payment.identifier
            )));
        }
        self.payments.push(payment);
        Ok(())
    }
}

fn validate_mail(mail_address: &str) -> IntranetResult<String> {
    let mail_address = require_text("mail_address", mail_address)?;
    if !DomainObjectValidations::create().is_mail_address(&mail_address) {
        return Err(IntranetError::illegal(
            "mail_address",
            format!("{} is not a mail address", mail_address),
        ));
    }
    Ok(mail_address.to_lowercase())
}

fn generate_activation_code() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_uppercase()
}

// ============================================================================
// HOUSEHOLD
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Household {
    pub identifier: Uuid,
    name: String,
    description: Option<String>,
    pub creation_time: DateTime<Utc>,
    members: Vec<Uuid>,
    storages: Vec<Storage>,
}

impl Household {
    pub fn new(name: &str, description: Option<&str>) -> IntranetResult<Self> {
        Ok(Household {
            identifier: Uuid::new_v4(),
            name: require_text("name", name)?,
            description: optional_text(description),
            creation_time: Utc::now(),
            members: Vec::new(),
            storages: Vec::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: &str) -> IntranetResult<()> {
        self.name = require_text("name", name)?;
        Ok(())
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn set_description(&mut self, description: Option<&str>) {
        self.description = optional_text(description);
    }

    pub fn members(&self) -> &[Uuid] {
        &self.members
    }

    pub fn has_member(&self, member: Uuid) -> bool {
        self.members.contains(&member)
    }

    /// Adds the member and records the household on the member
    pub fn add_member(&mut self, member: &mut HouseholdMember, now: DateTime<Utc>) -> IntranetResult<()> {
        if self.has_member(member.identifier) {
            return Err(IntranetError::business(format!(
                "{} is already a member of {}",
                member.mail_address(),
                self.name
            )));
        }
        if member.has_reached_household_limit(now) {
            return Err(IntranetError::business(format!(
                "{} has reached the household limit of {} for a {} membership",
                member.mail_address(),
                member.household_limit(now),
                member.membership(now).as_str()
            )));
        }

        self.members.push(member.identifier);
        member.households.push(self.identifier);
        Ok(())
    }

    pub fn remove_member(&mut self, member: &mut HouseholdMember) -> IntranetResult<()> {
        let Some(index) = self.members.iter().position(|id| *id == member.identifier) else {
            return Err(IntranetError::not_found("HouseholdMember", member.identifier));
        };
        self.members.remove(index);
        member.households.retain(|id| *id != self.identifier);
        Ok(())
    }

    /// Storages ordered by sort order
    pub fn storages(&self) -> Vec<&Storage> {
        let mut storages: Vec<&Storage> = self.storages.iter().collect();
        storages.sort_by_key(|s| s.sort_order());
        storages
    }

    pub fn storage(&self, identifier: Uuid) -> Option<&Storage> {
        self.storages.iter().find(|s| s.identifier == identifier)
    }

    pub fn storage_mut(&mut self, identifier: Uuid) -> Option<&mut Storage> {
        self.storages.iter_mut().find(|s| s.identifier == identifier)
    }

    pub fn add_storage(&mut self, storage: Storage) -> IntranetResult<()> {
        if storage.household() != self.identifier {
            return Err(IntranetError::business(format!(
                "storage {} belongs to another household",
                storage.identifier
            )));
        }
        if self.storages.iter().any(|s| s.sort_order() == storage.sort_order()) {
            return Err(IntranetError::business(format!(
                "{} already has a storage with sort order {}",
                self.name,
                storage.sort_order()
            )));
        }
        self.storages.push(storage);
        Ok(())
    }

    pub fn remove_storage(&mut self, identifier: Uuid) -> IntranetResult<Storage> {
        let index = self
            .storages
            .iter()
            .position(|s| s.identifier == identifier)
            .ok_or_else(|| IntranetError::not_found("Storage", identifier))?;
        Ok(self.storages.remove(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foodwaste::StorageType;
    use crate::validation::Range;
    use chrono::Duration;

    fn member(mail: &str) -> HouseholdMember {
        HouseholdMember::new(mail).unwrap()
    }

    #[test]
    fn test_member_creation() {
        let m = member("Ole@Example.dk");
        assert_eq!(m.mail_address(), "ole@example.dk");
        assert_eq!(m.membership(Utc::now()), Membership::Basic);
        assert_eq!(m.activation_code().len(), 8);
        assert!(!m.is_activated());
        assert!(!m.is_privacy_policy_accepted());

        assert!(matches!(HouseholdMember::new(""), Err(IntranetError::ArgumentNull(_))));
        assert!(matches!(
            HouseholdMember::new("not-a-mail"),
            Err(IntranetError::IllegalValue { .. })
        ));
    }

    #[test]
    fn test_member_activation() {
        let mut m = member("ole@example.dk");
        assert!(m.activate("WRONG").is_err());

        let code = m.activation_code().to_string();
        m.activate(&code).unwrap();
        assert!(m.is_activated());

        assert!(matches!(m.activate(&code), Err(IntranetError::Business(_))));
    }

    #[test]
    fn test_privacy_policy_accepted_once() {
        let mut m = member("ole@example.dk");
        m.accept_privacy_policy();
        let first = m.privacy_policy_accepted_time();
        m.accept_privacy_policy();
        assert_eq!(first, m.privacy_policy_accepted_time());
    }

    #[test]
    fn test_membership_upgrade_and_expiry() {
        let now = Utc::now();
        let mut m = member("ole@example.dk");

        m.upgrade_membership(Membership::Deluxe, Some(now + Duration::days(365)), now)
            .unwrap();
        assert_eq!(m.membership(now), Membership::Deluxe);
        assert!(!m.membership_has_expired(now));

        let later = now + Duration::days(400);
        assert_eq!(m.membership(later), Membership::Basic);
        assert!(m.membership_has_expired(later));
    }

    #[test]
    fn test_membership_cannot_downgrade() {
        let now = Utc::now();
        let mut m = member("ole@example.dk");
        m.upgrade_membership(Membership::Premium, Some(now + Duration::days(30)), now)
            .unwrap();

        let result = m.upgrade_membership(Membership::Deluxe, Some(now + Duration::days(30)), now);
        assert!(matches!(result, Err(IntranetError::Business(_))));
    }

    #[test]
    fn test_membership_upgrade_requires_future_expiry() {
        let now = Utc::now();
        let mut m = member("ole@example.dk");
        assert!(m.upgrade_membership(Membership::Deluxe, None, now).is_err());
        assert!(m
            .upgrade_membership(Membership::Deluxe, Some(now - Duration::days(1)), now)
            .is_err());
        assert_eq!(m.membership(now), Membership::Basic);
    }

    #[test]
    fn test_household_membership_both_sides() {
        let now = Utc::now();
        let mut household = Household::new("Home", Some("  ")).unwrap();
        assert_eq!(household.description(), None);

        let mut m = member("ole@example.dk");
        household.add_member(&mut m, now).unwrap();

        assert!(household.has_member(m.identifier));
        assert_eq!(m.households(), &[household.identifier]);

        household.remove_member(&mut m).unwrap();
        assert!(household.members().is_empty());
        assert!(m.households().is_empty());
        assert!(matches!(household.remove_member(&mut m), Err(IntranetError::NotFound { .. })));
    }

    #[test]
    fn test_household_limit_for_basic_membership() {
        let now = Utc::now();
        let mut first = Household::new("Home", None).unwrap();
        let mut second = Household::new("Summer house", None).unwrap();
        let mut m = member("ole@example.dk");

        first.add_member(&mut m, now).unwrap();
        let result = second.add_member(&mut m, now);
        assert!(matches!(result, Err(IntranetError::Business(_))));
        assert!(second.members().is_empty());

        m.upgrade_membership(Membership::Deluxe, Some(now + Duration::days(10)), now)
            .unwrap();
        second.add_member(&mut m, now).unwrap();
        assert_eq!(m.households().len(), 2);
    }

    #[test]
    fn test_household_rejects_duplicate_member() {
        let now = Utc::now();
        let mut household = Household::new("Home", None).unwrap();
        let mut m = member("ole@example.dk");
        m.upgrade_membership(Membership::Premium, Some(now + Duration::days(10)), now)
            .unwrap();
        household.add_member(&mut m, now).unwrap();
        assert!(household.add_member(&mut m, now).is_err());
    }

    #[test]
    fn test_household_storages() {
        let mut household = Household::new("Home", None).unwrap();
        let fridge = StorageType::new(1, 5, Range::new(2, 8).unwrap(), true, true, true).unwrap();

        let second = Storage::new(household.identifier, 2, &fridge, None, 4).unwrap();
        let first = Storage::new(household.identifier, 1, &fridge, Some("Kitchen"), 5).unwrap();
        household.add_storage(second).unwrap();
        household.add_storage(first).unwrap();

        let orders: Vec<u8> = household.storages().iter().map(|s| s.sort_order()).collect();
        assert_eq!(orders, vec![1, 2]);

        let clash = Storage::new(household.identifier, 1, &fridge, None, 5).unwrap();
        assert!(household.add_storage(clash).is_err());

        let foreign = Storage::new(Uuid::new_v4(), 3, &fridge, None, 5).unwrap();
        assert!(household.add_storage(foreign).is_err());

        let id = household.storages()[0].identifier;
        household.remove_storage(id).unwrap();
        assert_eq!(household.storages().len(), 1);
        assert!(household.remove_storage(id).is_err());
    }

    #[test]
    fn test_payment_requires_payment_handler() {
        let m = member("ole@example.dk");
        let free = DataProvider::new("Free", false).unwrap();
        assert!(Payment::new(&m, &free, Utc::now(), "REF-1", None).is_err());

        let paypal = DataProvider::new("PayPal", true).unwrap();
        let payment = Payment::new(&m, &paypal, Utc::now(), " REF-1 ", Some(vec![1, 2])).unwrap();
        assert_eq!(payment.payment_reference(), "REF-1");
        assert!(Payment::new(&m, &paypal, Utc::now(), "", None).is_err());
    }

    #[test]
    fn test_add_payment_checks_stakeholder() {
        let mut m = member("ole@example.dk");
        let other = member("anne@example.dk");
        let paypal = DataProvider::new("PayPal", true).unwrap();

        let foreign = Payment::new(&other, &paypal, Utc::now(), "REF-1", None).unwrap();
        assert!(m.add_payment(foreign).is_err());

        let own = Payment::new(&m, &paypal, Utc::now(), "REF-2", None).unwrap();
        m.add_payment(own).unwrap();
        assert_eq!(m.payments().len(), 1);
    }

    #[test]
    fn test_membership_parse() {
        assert_eq!(Membership::parse("Deluxe").unwrap(), Membership::Deluxe);
        assert!(Membership::parse("gold").is_err());
    }
}
