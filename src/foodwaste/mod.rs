// Food waste domain - households and the food they keep
//
// Households are shared by household members; each member's membership tier
// caps how many households they may join. Storages live inside a household
// and keep their temperature within the range of their storage type. Food
// groups form a cycle-free tree and, like storage types, food items and
// data providers, carry per-culture translations.

pub mod translation;
pub mod data_provider;
pub mod household;
pub mod storage;
pub mod food_group;
pub mod food_item;

pub use translation::{Translatable, Translation, TranslationInfo, DEFAULT_CULTURE};
pub use data_provider::{DataProvider, ForeignKey};
pub use household::{Household, HouseholdMember, Membership, Payment};
pub use storage::{Storage, StorageType};
pub use food_group::{FoodGroup, FoodGroupCollection};
pub use food_item::FoodItem;
