// Food waste queries and commands
//
// Commands acting on behalf of a household member require the member to be
// activated and to have accepted the privacy policy.

use super::{CommandHandler, QueryHandler, SERVICE_ACTOR};
use crate::error::{IntranetError, IntranetResult};
use crate::foodwaste::{
    DataProvider, FoodGroup, FoodGroupCollection, FoodItem, Household, HouseholdMember, Membership,
    Payment, Storage, StorageType, Translatable, Translation, TranslationInfo,
};
use crate::repository::{AuditRepository, Event, FoodWasteRepository};
use crate::validation::Range;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationInput {
    pub culture_name: String,
    pub value: String,
}

fn add_translations<T: Translatable>(target: &mut T, translations: &[TranslationInput]) -> IntranetResult<()> {
    for input in translations {
        let translation = Translation::new(
            target.translation_of_identifier(),
            TranslationInfo::new(&input.culture_name)?,
            &input.value,
        )?;
        target.add_translation(translation)?;
    }
    Ok(())
}

fn require_active_member(member: &HouseholdMember) -> IntranetResult<()> {
    if !member.is_activated() {
        return Err(IntranetError::business(format!(
            "household member {} is not activated",
            member.mail_address()
        )));
    }
    if !member.is_privacy_policy_accepted() {
        return Err(IntranetError::business(format!(
            "household member {} has not accepted the privacy policy",
            member.mail_address()
        )));
    }
    Ok(())
}

// ============================================================================
// HOUSEHOLD MEMBER COMMANDS
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HouseholdMemberAdd {
    pub mail_address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HouseholdMemberActivate {
    pub household_member: Uuid,
    pub activation_code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HouseholdMemberAcceptPrivacyPolicy {
    pub household_member: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentInput {
    pub data_provider: Uuid,
    pub payment_time: DateTime<Utc>,
    pub payment_reference: String,
    pub payment_receipt: Option<Vec<u8>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HouseholdMemberUpgradeMembership {
    pub household_member: Uuid,
    pub membership: Membership,
    pub membership_expire_time: Option<DateTime<Utc>>,
    pub payment: Option<PaymentInput>,
}

// ============================================================================
// HOUSEHOLD COMMANDS
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HouseholdAdd {
    pub household_member: Uuid,
    pub name: String,
    pub description: Option<String>,
}

/// Adds a member by mail address, creating the member if unknown
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HouseholdAddHouseholdMember {
    pub household: Uuid,
    pub mail_address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HouseholdRemoveHouseholdMember {
    pub household: Uuid,
    pub mail_address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageAdd {
    pub household: Uuid,
    pub sort_order: u8,
    pub storage_type: Uuid,
    pub description: Option<String>,
    pub temperature: i32,
}

// ============================================================================
// MASTER DATA COMMANDS
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataProviderAdd {
    pub name: String,
    pub handles_payments: bool,
    #[serde(default)]
    pub translations: Vec<TranslationInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageTypeAdd {
    pub sort_order: u8,
    pub temperature: i32,
    pub temperature_range: Range<i32>,
    pub creatable: bool,
    pub editable: bool,
    pub deletable: bool,
    #[serde(default)]
    pub translations: Vec<TranslationInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodGroupAdd {
    pub parent: Option<Uuid>,
    #[serde(default = "active_by_default")]
    pub is_active: bool,
    #[serde(default)]
    pub translations: Vec<TranslationInput>,
}

fn active_by_default() -> bool {
    true
}

/// Adds a food item to its primary group and any number of other groups
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodItemAdd {
    pub primary_food_group: Uuid,
    #[serde(default)]
    pub food_groups: Vec<Uuid>,
    #[serde(default)]
    pub translations: Vec<TranslationInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodGroupMove {
    pub food_group: Uuid,
    pub parent: Option<Uuid>,
}

// ============================================================================
// QUERIES
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodGroupTreeGet {
    pub culture: String,
    #[serde(default)]
    pub include_inactive: bool,
}

/// Households the member belongs to, by name
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HouseholdCollectionGet {
    pub household_member: Uuid,
}

/// Active food items, optionally limited to one food group and its descendants
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodItemCollectionGet {
    pub food_group: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodGroupTreeNode {
    pub identifier: Uuid,
    pub name: String,
    pub is_active: bool,
    pub children: Vec<FoodGroupTreeNode>,
}

fn tree_nodes(
    groups: &FoodGroupCollection,
    level: Vec<&FoodGroup>,
    culture: &str,
    include_inactive: bool,
) -> Vec<FoodGroupTreeNode> {
    let mut nodes: Vec<FoodGroupTreeNode> = level
        .into_iter()
        .filter(|g| include_inactive || groups.is_effectively_active(g.identifier))
        .map(|g| FoodGroupTreeNode {
            identifier: g.identifier,
            name: g
                .translated_value(culture)
                .map(str::to_string)
                .unwrap_or_else(|| g.identifier.to_string()),
            is_active: groups.is_effectively_active(g.identifier),
            children: tree_nodes(groups, groups.children(g.identifier), culture, include_inactive),
        })
        .collect();
    nodes.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
    nodes
}

// ============================================================================
// SERVICE
// ============================================================================

pub struct FoodWasteService<'a, R> {
    repository: &'a R,
}

impl<'a, R> FoodWasteService<'a, R>
where
    R: FoodWasteRepository + AuditRepository,
{
    pub fn new(repository: &'a R) -> Self {
        FoodWasteService { repository }
    }

    fn record(&self, event_type: &str, entity_type: &str, entity_id: Uuid, data: serde_json::Value) -> IntranetResult<()> {
        self.repository.record_event(&Event::new(
            event_type,
            entity_type,
            entity_id,
            data,
            SERVICE_ACTOR,
        ))
    }

    fn member_by_mail(&self, mail_address: &str) -> IntranetResult<HouseholdMember> {
        self.repository
            .household_member_by_mail(mail_address)?
            .ok_or_else(|| IntranetError::not_found("HouseholdMember", mail_address))
    }
}

impl<R> CommandHandler<HouseholdMemberAdd> for FoodWasteService<'_, R>
where
    R: FoodWasteRepository + AuditRepository,
{
    type Output = HouseholdMember;

    fn execute(&self, command: HouseholdMemberAdd) -> IntranetResult<Self::Output> {
        let member = HouseholdMember::new(&command.mail_address)?;
        if self
            .repository
            .household_member_by_mail(member.mail_address())?
            .is_some()
        {
            return Err(IntranetError::business(format!(
                "{} is already a household member",
                member.mail_address()
            )));
        }

        self.repository.save_household_member(&member)?;
        self.record(
            "household_member_added",
            "household_member",
            member.identifier,
            serde_json::json!({ "mail_address": member.mail_address() }),
        )?;
        info!(mail_address = member.mail_address(), "household member added");
        Ok(member)
    }
}

impl<R> CommandHandler<HouseholdMemberActivate> for FoodWasteService<'_, R>
where
    R: FoodWasteRepository + AuditRepository,
{
    type Output = HouseholdMember;

    fn execute(&self, command: HouseholdMemberActivate) -> IntranetResult<Self::Output> {
        let mut member = self.repository.household_member(command.household_member)?;
        member.activate(&command.activation_code)?;

        self.repository.save_household_member(&member)?;
        self.record(
            "household_member_activated",
            "household_member",
            member.identifier,
            serde_json::json!({ "activation_time": member.activation_time() }),
        )?;
        Ok(member)
    }
}

impl<R> CommandHandler<HouseholdMemberAcceptPrivacyPolicy> for FoodWasteService<'_, R>
where
    R: FoodWasteRepository + AuditRepository,
{
    type Output = HouseholdMember;

    fn execute(&self, command: HouseholdMemberAcceptPrivacyPolicy) -> IntranetResult<Self::Output> {
        let mut member = self.repository.household_member(command.household_member)?;
        member.accept_privacy_policy();

        self.repository.save_household_member(&member)?;
        self.record(
            "privacy_policy_accepted",
            "household_member",
            member.identifier,
            serde_json::json!({ "accepted_time": member.privacy_policy_accepted_time() }),
        )?;
        Ok(member)
    }
}

impl<R> CommandHandler<HouseholdMemberUpgradeMembership> for FoodWasteService<'_, R>
where
    R: FoodWasteRepository + AuditRepository,
{
    type Output = HouseholdMember;

    fn execute(&self, command: HouseholdMemberUpgradeMembership) -> IntranetResult<Self::Output> {
        let now = Utc::now();
        let mut member = self.repository.household_member(command.household_member)?;
        require_active_member(&member)?;

        if let Some(input) = &command.payment {
            let data_provider = self
                .repository
                .data_providers()?
                .into_iter()
                .find(|p| p.identifier == input.data_provider)
                .ok_or_else(|| IntranetError::not_found("DataProvider", input.data_provider))?;
            let payment = Payment::new(
                &member,
                &data_provider,
                input.payment_time,
                &input.payment_reference,
                input.payment_receipt.clone(),
            )?;
            member.add_payment(payment)?;
        }
        member.upgrade_membership(command.membership, command.membership_expire_time, now)?;

        self.repository.save_household_member(&member)?;
        self.record(
            "membership_upgraded",
            "household_member",
            member.identifier,
            serde_json::json!({
                "membership": command.membership.as_str(),
                "expire_time": member.membership_expire_time(),
            }),
        )?;
        info!(
            mail_address = member.mail_address(),
            membership = command.membership.as_str(),
            "membership upgraded"
        );
        Ok(member)
    }
}

impl<R> CommandHandler<HouseholdAdd> for FoodWasteService<'_, R>
where
    R: FoodWasteRepository + AuditRepository,
{
    type Output = Household;

    fn execute(&self, command: HouseholdAdd) -> IntranetResult<Self::Output> {
        let mut member = self.repository.household_member(command.household_member)?;
        require_active_member(&member)?;

        let mut household = Household::new(&command.name, command.description.as_deref())?;
        household.add_member(&mut member, Utc::now())?;

        self.repository.save_household(&household)?;
        self.repository.save_household_member(&member)?;
        self.record(
            "household_added",
            "household",
            household.identifier,
            serde_json::json!({ "name": household.name(), "member": member.identifier }),
        )?;
        info!(household = household.name(), "household added");
        Ok(household)
    }
}

impl<R> CommandHandler<HouseholdAddHouseholdMember> for FoodWasteService<'_, R>
where
    R: FoodWasteRepository + AuditRepository,
{
    type Output = Household;

    fn execute(&self, command: HouseholdAddHouseholdMember) -> IntranetResult<Self::Output> {
        let mut household = self.repository.household(command.household)?;
        let mut member = match self.repository.household_member_by_mail(&command.mail_address)? {
            Some(member) => member,
            None => {
                debug!(mail_address = %command.mail_address, "creating household member on invitation");
                HouseholdMember::new(&command.mail_address)?
            }
        };

        household.add_member(&mut member, Utc::now())?;

        self.repository.save_household_member(&member)?;
        self.repository.save_household(&household)?;
        self.record(
            "household_member_joined",
            "household",
            household.identifier,
            serde_json::json!({ "member": member.identifier }),
        )?;
        Ok(household)
    }
}

impl<R> CommandHandler<HouseholdRemoveHouseholdMember> for FoodWasteService<'_, R>
where
    R: FoodWasteRepository + AuditRepository,
{
    type Output = Household;

    fn execute(&self, command: HouseholdRemoveHouseholdMember) -> IntranetResult<Self::Output> {
        let mut household = self.repository.household(command.household)?;
        let mut member = self.member_by_mail(&command.mail_address)?;
        household.remove_member(&mut member)?;

        self.repository.save_household_member(&member)?;
        self.repository.save_household(&household)?;
        self.record(
            "household_member_removed",
            "household",
            household.identifier,
            serde_json::json!({ "member": member.identifier }),
        )?;
        Ok(household)
    }
}

impl<R> CommandHandler<StorageAdd> for FoodWasteService<'_, R>
where
    R: FoodWasteRepository + AuditRepository,
{
    type Output = Storage;

    fn execute(&self, command: StorageAdd) -> IntranetResult<Self::Output> {
        let mut household = self.repository.household(command.household)?;
        let storage_type = self.repository.storage_type(command.storage_type)?;
        let storage = Storage::new(
            household.identifier,
            command.sort_order,
            &storage_type,
            command.description.as_deref(),
            command.temperature,
        )?;
        household.add_storage(storage.clone())?;

        self.repository.save_household(&household)?;
        self.record(
            "storage_added",
            "household",
            household.identifier,
            serde_json::json!({ "storage": storage.identifier, "sort_order": storage.sort_order() }),
        )?;
        Ok(storage)
    }
}

impl<R> CommandHandler<DataProviderAdd> for FoodWasteService<'_, R>
where
    R: FoodWasteRepository + AuditRepository,
{
    type Output = DataProvider;

    fn execute(&self, command: DataProviderAdd) -> IntranetResult<Self::Output> {
        let mut data_provider = DataProvider::new(&command.name, command.handles_payments)?;
        add_translations(&mut data_provider, &command.translations)?;

        self.repository.save_data_provider(&data_provider)?;
        self.record(
            "data_provider_added",
            "data_provider",
            data_provider.identifier,
            serde_json::json!({ "name": data_provider.name() }),
        )?;
        Ok(data_provider)
    }
}

impl<R> CommandHandler<StorageTypeAdd> for FoodWasteService<'_, R>
where
    R: FoodWasteRepository + AuditRepository,
{
    type Output = StorageType;

    fn execute(&self, command: StorageTypeAdd) -> IntranetResult<Self::Output> {
        let mut storage_type = StorageType::new(
            command.sort_order,
            command.temperature,
            command.temperature_range,
            command.creatable,
            command.editable,
            command.deletable,
        )?;
        add_translations(&mut storage_type, &command.translations)?;

        self.repository.save_storage_type(&storage_type)?;
        self.record(
            "storage_type_added",
            "storage_type",
            storage_type.identifier,
            serde_json::json!({ "sort_order": storage_type.sort_order() }),
        )?;
        Ok(storage_type)
    }
}

impl<R> CommandHandler<FoodGroupAdd> for FoodWasteService<'_, R>
where
    R: FoodWasteRepository + AuditRepository,
{
    type Output = FoodGroup;

    fn execute(&self, command: FoodGroupAdd) -> IntranetResult<Self::Output> {
        let mut groups = self.repository.food_groups()?;
        let mut group = FoodGroup::new(command.parent);
        group.is_active = command.is_active;
        add_translations(&mut group, &command.translations)?;
        groups.add(group.clone())?;

        self.repository.save_food_groups(&groups)?;
        self.record(
            "food_group_added",
            "food_group",
            group.identifier,
            serde_json::json!({ "parent": group.parent() }),
        )?;
        Ok(group)
    }
}

impl<R> CommandHandler<FoodGroupMove> for FoodWasteService<'_, R>
where
    R: FoodWasteRepository + AuditRepository,
{
    type Output = ();

    fn execute(&self, command: FoodGroupMove) -> IntranetResult<Self::Output> {
        let mut groups = self.repository.food_groups()?;
        groups.set_parent(command.food_group, command.parent)?;

        self.repository.save_food_groups(&groups)?;
        self.record(
            "food_group_moved",
            "food_group",
            command.food_group,
            serde_json::json!({ "parent": command.parent }),
        )?;
        Ok(())
    }
}

impl<R> CommandHandler<FoodItemAdd> for FoodWasteService<'_, R>
where
    R: FoodWasteRepository + AuditRepository,
{
    type Output = FoodItem;

    fn execute(&self, command: FoodItemAdd) -> IntranetResult<Self::Output> {
        let groups = self.repository.food_groups()?;
        let mut food_item = FoodItem::new(command.primary_food_group);
        for food_group in &command.food_groups {
            if !food_item.belongs_to(*food_group) {
                food_item.add_food_group(*food_group)?;
            }
        }
        for food_group in food_item.food_groups() {
            if groups.get(*food_group).is_none() {
                return Err(IntranetError::not_found("FoodGroup", food_group));
            }
        }
        add_translations(&mut food_item, &command.translations)?;

        self.repository.save_food_item(&food_item)?;
        self.record(
            "food_item_added",
            "food_item",
            food_item.identifier,
            serde_json::json!({ "food_groups": food_item.food_groups() }),
        )?;
        Ok(food_item)
    }
}

impl<R> QueryHandler<HouseholdCollectionGet> for FoodWasteService<'_, R>
where
    R: FoodWasteRepository + AuditRepository,
{
    type Output = Vec<Household>;

    fn query(&self, query: HouseholdCollectionGet) -> IntranetResult<Self::Output> {
        let member = self.repository.household_member(query.household_member)?;
        require_active_member(&member)?;

        let mut households: Vec<Household> = self
            .repository
            .households()?
            .into_iter()
            .filter(|h| h.has_member(member.identifier))
            .collect();
        households.sort_by(|a, b| a.name().to_lowercase().cmp(&b.name().to_lowercase()));
        Ok(households)
    }
}

impl<R> QueryHandler<FoodItemCollectionGet> for FoodWasteService<'_, R>
where
    R: FoodWasteRepository + AuditRepository,
{
    type Output = Vec<FoodItem>;

    fn query(&self, query: FoodItemCollectionGet) -> IntranetResult<Self::Output> {
        let groups = self.repository.food_groups()?;
        let wanted: Option<Vec<Uuid>> = match query.food_group {
            Some(food_group) => {
                if groups.get(food_group).is_none() {
                    return Err(IntranetError::not_found("FoodGroup", food_group));
                }
                let mut wanted = vec![food_group];
                wanted.extend(groups.descendants(food_group).iter().map(|g| g.identifier));
                Some(wanted)
            }
            None => None,
        };

        Ok(self
            .repository
            .food_items()?
            .into_iter()
            .filter(|item| item.is_active && groups.is_effectively_active(item.primary_food_group()))
            .filter(|item| match &wanted {
                Some(wanted) => wanted.iter().any(|g| item.belongs_to(*g)),
                None => true,
            })
            .collect())
    }
}

impl<R> QueryHandler<FoodGroupTreeGet> for FoodWasteService<'_, R>
where
    R: FoodWasteRepository + AuditRepository,
{
    type Output = Vec<FoodGroupTreeNode>;

    fn query(&self, query: FoodGroupTreeGet) -> IntranetResult<Self::Output> {
        let groups = self.repository.food_groups()?;
        Ok(tree_nodes(&groups, groups.roots(), &query.culture, query.include_inactive))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::SqliteRepository;
    use chrono::Duration;

    fn active_member(service: &FoodWasteService<'_, SqliteRepository>, mail: &str) -> HouseholdMember {
        let member = service
            .execute(HouseholdMemberAdd { mail_address: mail.to_string() })
            .unwrap();
        service
            .execute(HouseholdMemberActivate {
                household_member: member.identifier,
                activation_code: member.activation_code().to_string(),
            })
            .unwrap();
        service
            .execute(HouseholdMemberAcceptPrivacyPolicy { household_member: member.identifier })
            .unwrap()
    }

    fn translations(name: &str) -> Vec<TranslationInput> {
        vec![TranslationInput { culture_name: "da-DK".to_string(), value: name.to_string() }]
    }

    #[test]
    fn test_member_lifecycle() {
        let repo = SqliteRepository::open_in_memory().unwrap();
        let service = FoodWasteService::new(&repo);

        let member = active_member(&service, "ole@example.dk");
        assert!(member.is_activated());
        assert!(member.is_privacy_policy_accepted());

        assert!(matches!(
            service.execute(HouseholdMemberAdd { mail_address: "OLE@example.dk".to_string() }),
            Err(IntranetError::Business(_))
        ));
        assert_eq!(
            repo.events_for("household_member", &member.identifier.to_string())
                .unwrap()
                .len(),
            3
        );
    }

    #[test]
    fn test_household_requires_active_member() {
        let repo = SqliteRepository::open_in_memory().unwrap();
        let service = FoodWasteService::new(&repo);
        let member = service
            .execute(HouseholdMemberAdd { mail_address: "ole@example.dk".to_string() })
            .unwrap();

        assert!(service
            .execute(HouseholdAdd {
                household_member: member.identifier,
                name: "Hjemme".to_string(),
                description: None,
            })
            .is_err());
    }

    #[test]
    fn test_household_limit_and_upgrade() {
        let repo = SqliteRepository::open_in_memory().unwrap();
        let service = FoodWasteService::new(&repo);
        let member = active_member(&service, "ole@example.dk");

        let household = service
            .execute(HouseholdAdd {
                household_member: member.identifier,
                name: "Hjemme".to_string(),
                description: Some("Eggertsvej".to_string()),
            })
            .unwrap();
        assert!(household.has_member(member.identifier));

        // basic allows one household
        let second = HouseholdAdd {
            household_member: member.identifier,
            name: "Sommerhus".to_string(),
            description: None,
        };
        assert!(matches!(service.execute(second.clone()), Err(IntranetError::Business(_))));

        let provider = service
            .execute(DataProviderAdd {
                name: "Betaling".to_string(),
                handles_payments: true,
                translations: Vec::new(),
            })
            .unwrap();
        let upgraded = service
            .execute(HouseholdMemberUpgradeMembership {
                household_member: member.identifier,
                membership: Membership::Deluxe,
                membership_expire_time: Some(Utc::now() + Duration::days(365)),
                payment: Some(PaymentInput {
                    data_provider: provider.identifier,
                    payment_time: Utc::now(),
                    payment_reference: "ref-1".to_string(),
                    payment_receipt: None,
                }),
            })
            .unwrap();
        assert_eq!(upgraded.membership(Utc::now()), Membership::Deluxe);
        assert_eq!(upgraded.payments().len(), 1);

        service.execute(second).unwrap();
        assert_eq!(repo.household_member(member.identifier).unwrap().households().len(), 2);
    }

    #[test]
    fn test_add_and_remove_household_member() {
        let repo = SqliteRepository::open_in_memory().unwrap();
        let service = FoodWasteService::new(&repo);
        let member = active_member(&service, "ole@example.dk");
        let household = service
            .execute(HouseholdAdd {
                household_member: member.identifier,
                name: "Hjemme".to_string(),
                description: None,
            })
            .unwrap();

        let household = service
            .execute(HouseholdAddHouseholdMember {
                household: household.identifier,
                mail_address: "bente@example.dk".to_string(),
            })
            .unwrap();
        assert_eq!(household.members().len(), 2);
        let bente = repo.household_member_by_mail("bente@example.dk").unwrap().unwrap();
        assert_eq!(bente.households(), &[household.identifier]);

        let household = service
            .execute(HouseholdRemoveHouseholdMember {
                household: household.identifier,
                mail_address: "bente@example.dk".to_string(),
            })
            .unwrap();
        assert_eq!(household.members().len(), 1);
        assert!(repo
            .household_member(bente.identifier)
            .unwrap()
            .households()
            .is_empty());

        assert!(service
            .execute(HouseholdRemoveHouseholdMember {
                household: household.identifier,
                mail_address: "ukendt@example.dk".to_string(),
            })
            .is_err());
    }

    #[test]
    fn test_storage_type_add_rejects_inverted_range() {
        let json = r#"{
            "sort_order": 1,
            "temperature": 5,
            "temperature_range": { "start": 8, "end": 2 },
            "creatable": true,
            "editable": true,
            "deletable": true
        }"#;
        let err = serde_json::from_str::<StorageTypeAdd>(json).unwrap_err();
        assert!(err.to_string().contains("range"));
    }

    #[test]
    fn test_storage_add() {
        let repo = SqliteRepository::open_in_memory().unwrap();
        let service = FoodWasteService::new(&repo);
        let member = active_member(&service, "ole@example.dk");
        let household = service
            .execute(HouseholdAdd {
                household_member: member.identifier,
                name: "Hjemme".to_string(),
                description: None,
            })
            .unwrap();
        let fridge = service
            .execute(StorageTypeAdd {
                sort_order: 1,
                temperature: 5,
                temperature_range: Range::new(2, 8).unwrap(),
                creatable: true,
                editable: true,
                deletable: true,
                translations: translations("Køleskab"),
            })
            .unwrap();

        let add = |sort_order, temperature| StorageAdd {
            household: household.identifier,
            sort_order,
            storage_type: fridge.identifier,
            description: None,
            temperature,
        };
        service.execute(add(1, 4)).unwrap();
        assert!(service.execute(add(1, 4)).is_err());
        assert!(service.execute(add(2, 12)).is_err());

        let stored = repo.household(household.identifier).unwrap();
        assert_eq!(stored.storages().len(), 1);
    }

    #[test]
    fn test_food_group_tree_and_move() {
        let repo = SqliteRepository::open_in_memory().unwrap();
        let service = FoodWasteService::new(&repo);

        let groent = service
            .execute(FoodGroupAdd { parent: None, is_active: true, translations: translations("Grøntsager") })
            .unwrap();
        let frugt = service
            .execute(FoodGroupAdd { parent: None, is_active: false, translations: translations("Frugt") })
            .unwrap();
        let rod = service
            .execute(FoodGroupAdd {
                parent: Some(groent.identifier),
                is_active: true,
                translations: translations("Rodfrugter"),
            })
            .unwrap();

        let tree = service
            .query(FoodGroupTreeGet { culture: "da-DK".to_string(), include_inactive: false })
            .unwrap();
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].name, "Grøntsager");
        assert_eq!(tree[0].children[0].name, "Rodfrugter");

        service
            .execute(FoodGroupMove { food_group: rod.identifier, parent: Some(frugt.identifier) })
            .unwrap();
        let tree = service
            .query(FoodGroupTreeGet { culture: "da".to_string(), include_inactive: true })
            .unwrap();
        let frugt_node = tree.iter().find(|n| n.identifier == frugt.identifier).unwrap();
        assert!(!frugt_node.is_active);
        assert_eq!(frugt_node.children.len(), 1);
        assert!(!frugt_node.children[0].is_active);

        assert!(matches!(
            service.execute(FoodGroupMove { food_group: groent.identifier, parent: Some(groent.identifier) }),
            Err(IntranetError::Business(_))
        ));
    }

    #[test]
    fn test_food_items_by_group() {
        let repo = SqliteRepository::open_in_memory().unwrap();
        let service = FoodWasteService::new(&repo);

        let groent = service
            .execute(FoodGroupAdd { parent: None, is_active: true, translations: translations("Grøntsager") })
            .unwrap();
        let rod = service
            .execute(FoodGroupAdd {
                parent: Some(groent.identifier),
                is_active: true,
                translations: translations("Rodfrugter"),
            })
            .unwrap();
        let mejeri = service
            .execute(FoodGroupAdd { parent: None, is_active: false, translations: translations("Mejeri") })
            .unwrap();

        let gulerod = service
            .execute(FoodItemAdd {
                primary_food_group: rod.identifier,
                food_groups: vec![rod.identifier, groent.identifier],
                translations: translations("Gulerod"),
            })
            .unwrap();
        assert_eq!(gulerod.food_groups().len(), 2);
        service
            .execute(FoodItemAdd {
                primary_food_group: mejeri.identifier,
                food_groups: Vec::new(),
                translations: translations("Mælk"),
            })
            .unwrap();

        let alle = service.query(FoodItemCollectionGet { food_group: None }).unwrap();
        assert_eq!(alle.len(), 1);
        let groent_items = service
            .query(FoodItemCollectionGet { food_group: Some(groent.identifier) })
            .unwrap();
        assert_eq!(groent_items[0].identifier, gulerod.identifier);

        assert!(matches!(
            service.execute(FoodItemAdd {
                primary_food_group: Uuid::new_v4(),
                food_groups: Vec::new(),
                translations: Vec::new(),
            }),
            Err(IntranetError::NotFound { .. })
        ));
    }

    #[test]
    fn test_household_collection() {
        let repo = SqliteRepository::open_in_memory().unwrap();
        let service = FoodWasteService::new(&repo);
        let ole = active_member(&service, "ole@example.dk");
        let bente = active_member(&service, "bente@example.dk");

        for (member, name) in [(&ole, "Hjemme"), (&bente, "Kolonihave")] {
            service
                .execute(HouseholdAdd {
                    household_member: member.identifier,
                    name: name.to_string(),
                    description: None,
                })
                .unwrap();
        }

        let households = service
            .query(HouseholdCollectionGet { household_member: ole.identifier })
            .unwrap();
        assert_eq!(households.len(), 1);
        assert_eq!(households[0].name(), "Hjemme");
    }
}
