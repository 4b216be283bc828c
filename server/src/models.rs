use crate::ids::ObjectId;
use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// The current time at the precision Postgres keeps (microseconds), so a
/// document returned from a write matches the one read back later.
pub fn timestamp_now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Declares a closed set of string values with their wire names.
macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident { $($(#[$vmeta:meta])* $variant:ident => $text:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
        pub enum $name {
            $($(#[$vmeta])* #[serde(rename = $text)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(format!("unknown {} `{}`", stringify!($name), other)),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

string_enum! {
    #[derive(Default)]
    pub enum Difficulty {
        Easy => "Easy",
        #[default]
        Medium => "Medium",
        Hard => "Hard",
    }
}

string_enum! {
    pub enum Category {
        Breakfast => "Breakfast",
        Lunch => "Lunch",
        Dinner => "Dinner",
        Appetizer => "Appetizer",
        Dessert => "Dessert",
        Snack => "Snack",
        Beverage => "Beverage",
        Soup => "Soup",
        Salad => "Salad",
        SideDish => "Side Dish",
        MainCourse => "Main Course",
    }
}

string_enum! {
    pub enum Cuisine {
        American => "American",
        Italian => "Italian",
        Mexican => "Mexican",
        Asian => "Asian",
        Chinese => "Chinese",
        Japanese => "Japanese",
        Indian => "Indian",
        French => "French",
        Mediterranean => "Mediterranean",
        Thai => "Thai",
        Greek => "Greek",
        Spanish => "Spanish",
        MiddleEastern => "Middle Eastern",
        Other => "Other",
    }
}

/// Stored account record. Never serialized directly; see [`UserProfile`].
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: ObjectId,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub avatar: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public view of a user, without the password hash.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        UserProfile {
            id: user.id.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            avatar: user.avatar.clone(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Field changes applied to a stored user. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Ingredient {
    pub name: String,
    pub amount: f64,
    pub unit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Rating {
    pub user_id: ObjectId,
    pub rating: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A recipe document as stored and returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub servings: i32,
    /// Minutes.
    pub cook_time: i32,
    pub ingredients: Vec<Ingredient>,
    pub instructions: Vec<String>,
    pub difficulty: Difficulty,
    pub category: Category,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cuisine: Option<Cuisine>,
    pub tags: Vec<String>,
    pub images: Vec<String>,
    pub created_by: ObjectId,
    pub ratings: Vec<Rating>,
    pub average_rating: f64,
    pub total_ratings: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_enum_wire_names() {
        assert_eq!(
            serde_json::to_string(&Category::SideDish).unwrap(),
            "\"Side Dish\""
        );
        assert_eq!(
            Cuisine::from_str("Middle Eastern").unwrap(),
            Cuisine::MiddleEastern
        );
        assert!(Category::from_str("Brunch").is_err());
    }

    #[test]
    fn test_enum_round_trips_through_as_str() {
        for category in Category::ALL {
            assert_eq!(Category::from_str(category.as_str()).unwrap(), *category);
        }
        for cuisine in Cuisine::ALL {
            assert_eq!(Cuisine::from_str(cuisine.as_str()).unwrap(), *cuisine);
        }
    }

    #[test]
    fn test_difficulty_defaults_to_medium() {
        assert_eq!(Difficulty::default(), Difficulty::Medium);
    }

    #[test]
    fn test_timestamps_have_microsecond_precision() {
        let now = timestamp_now();
        assert_eq!(now.timestamp_subsec_nanos() % 1_000, 0);
    }

    #[test]
    fn test_profile_omits_password() {
        let now = Utc::now();
        let user = User {
            id: ObjectId::generate(),
            username: "alice".into(),
            email: "alice@x.com".into(),
            password_hash: "$argon2id$secret".into(),
            avatar: None,
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_value(UserProfile::from(&user)).unwrap();
        assert!(json.get("password").is_none());
        assert!(json.get("passwordHash").is_none());
        assert_eq!(json["_id"], user.id.as_str());
    }
}
