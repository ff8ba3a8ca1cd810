// Wizard record: the accumulating lead captured across the three wizard steps.
//
// The record is partial between steps. Each step validates only its own slice at commit
// time and hands it to the controller as `StepData`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TravellerType {
    Adventurer,
    CultureSeeker,
    NatureLover,
    LuxuryExplorer,
    SocialButterfly,
}

impl TravellerType {
    pub const ALL: [TravellerType; 5] = [
        TravellerType::Adventurer,
        TravellerType::CultureSeeker,
        TravellerType::NatureLover,
        TravellerType::LuxuryExplorer,
        TravellerType::SocialButterfly,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TravellerType::Adventurer => "Adventurer",
            TravellerType::CultureSeeker => "Culture Seeker",
            TravellerType::NatureLover => "Nature Lover",
            TravellerType::LuxuryExplorer => "Luxury Explorer",
            TravellerType::SocialButterfly => "Social Butterfly",
        }
    }

    pub fn as_id(&self) -> &'static str {
        match self {
            TravellerType::Adventurer => "adventurer",
            TravellerType::CultureSeeker => "culture_seeker",
            TravellerType::NatureLover => "nature_lover",
            TravellerType::LuxuryExplorer => "luxury_explorer",
            TravellerType::SocialButterfly => "social_butterfly",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HearAboutUs {
    SocialMedia,
    FriendOrFamily,
    SearchEngine,
    TravelBlog,
    Event,
    Other,
}

impl HearAboutUs {
    pub const ALL: [HearAboutUs; 6] = [
        HearAboutUs::SocialMedia,
        HearAboutUs::FriendOrFamily,
        HearAboutUs::SearchEngine,
        HearAboutUs::TravelBlog,
        HearAboutUs::Event,
        HearAboutUs::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HearAboutUs::SocialMedia => "Social media",
            HearAboutUs::FriendOrFamily => "A friend or family member",
            HearAboutUs::SearchEngine => "Search engine",
            HearAboutUs::TravelBlog => "Travel blog",
            HearAboutUs::Event => "An event",
            HearAboutUs::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PioneerTraveller {
    Yes,
    Maybe,
}

impl PioneerTraveller {
    pub fn as_str(&self) -> &'static str {
        match self {
            PioneerTraveller::Yes => "Yes, feature me!",
            PioneerTraveller::Maybe => "Maybe later",
        }
    }

    pub fn toggle(&self) -> Self {
        match self {
            PioneerTraveller::Yes => PioneerTraveller::Maybe,
            PioneerTraveller::Maybe => PioneerTraveller::Yes,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Companion {
    Solo,
    Couple,
    Friends,
    Family,
}

impl Companion {
    pub const ALL: [Companion; 4] = [
        Companion::Solo,
        Companion::Couple,
        Companion::Friends,
        Companion::Family,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Companion::Solo => "Solo",
            Companion::Couple => "Couple",
            Companion::Friends => "Friends",
            Companion::Family => "Family",
        }
    }

    pub fn as_id(&self) -> &'static str {
        match self {
            Companion::Solo => "solo",
            Companion::Couple => "couple",
            Companion::Friends => "friends",
            Companion::Family => "family",
        }
    }

    /// Group size reported to the backend. Friends/family trips are quoted as a group of 4
    /// whatever head-count was typed in.
    pub fn group_size(&self) -> u32 {
        match self {
            Companion::Solo => 1,
            Companion::Couple => 2,
            Companion::Friends | Companion::Family => 4,
        }
    }

    pub fn needs_count(&self) -> bool {
        matches!(self, Companion::Friends | Companion::Family)
    }

    pub fn next(&self) -> Self {
        match self {
            Companion::Solo => Companion::Couple,
            Companion::Couple => Companion::Friends,
            Companion::Friends => Companion::Family,
            Companion::Family => Companion::Solo,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Experience {
    GorillaTrekking,
    NileAdventure,
    FoodNightlife,
    SafariGameDrive,
    CulturalVillage,
    LakeBunyonyiRetreat,
    ChimpTracking,
    MountainHiking,
    Birdwatching,
}

impl Experience {
    pub const ALL: [Experience; 9] = [
        Experience::GorillaTrekking,
        Experience::NileAdventure,
        Experience::FoodNightlife,
        Experience::SafariGameDrive,
        Experience::CulturalVillage,
        Experience::LakeBunyonyiRetreat,
        Experience::ChimpTracking,
        Experience::MountainHiking,
        Experience::Birdwatching,
    ];

    /// Used to pad `must_have_experiences` when fewer than three were chosen.
    pub const FALLBACK: [Experience; 4] = [
        Experience::SafariGameDrive,
        Experience::GorillaTrekking,
        Experience::CulturalVillage,
        Experience::NileAdventure,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Experience::GorillaTrekking => "Gorilla trekking",
            Experience::NileAdventure => "Nile adventure (rafting, bungee, kayaking)",
            Experience::FoodNightlife => "Food & nightlife",
            Experience::SafariGameDrive => "Safari game drive",
            Experience::CulturalVillage => "Cultural village visit",
            Experience::LakeBunyonyiRetreat => "Lake Bunyonyi retreat",
            Experience::ChimpTracking => "Chimp tracking",
            Experience::MountainHiking => "Mountain hiking",
            Experience::Birdwatching => "Birdwatching",
        }
    }

    pub fn as_id(&self) -> &'static str {
        match self {
            Experience::GorillaTrekking => "gorilla_trekking",
            Experience::NileAdventure => "nile_adventure",
            Experience::FoodNightlife => "food_nightlife",
            Experience::SafariGameDrive => "safari_game_drive",
            Experience::CulturalVillage => "cultural_village",
            Experience::LakeBunyonyiRetreat => "lake_bunyonyi_retreat",
            Experience::ChimpTracking => "chimp_tracking",
            Experience::MountainHiking => "mountain_hiking",
            Experience::Birdwatching => "birdwatching",
        }
    }
}

/// Step 1 slice: "Traveller Vibes".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileSlice {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub country_of_residence: String,
    pub been_to_africa_before: bool,
    pub traveller_type: Vec<TravellerType>,
    pub hear_about_us: Option<HearAboutUs>,
    pub pioneer_traveller: Option<PioneerTraveller>,
    pub photo_url: Option<String>,
}

/// Step 2 slice: "Dream Trip".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TripSlice {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub experiences: Vec<Experience>,
    pub companion: Companion,
    pub companion_count: Option<u32>,
    pub dream_words: Option<String>,
    pub special_requirements: Option<String>,
}

/// Step 3 slice: "Explorer Circle".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsentSlice {
    pub keep_updated: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepData {
    Profile(ProfileSlice),
    Trip(TripSlice),
    Consent(ConsentSlice),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WizardRecord {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub country_of_residence: String,
    pub been_to_africa_before: Option<bool>,
    pub traveller_type: Vec<TravellerType>,
    pub hear_about_us: Option<HearAboutUs>,
    pub pioneer_traveller: Option<PioneerTraveller>,
    pub photo_url: Option<String>,

    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub experiences: Vec<Experience>,
    pub companion: Option<Companion>,
    pub companion_count: Option<u32>,
    pub dream_words: Option<String>,
    pub special_requirements: Option<String>,

    pub keep_updated: bool,
}

impl WizardRecord {
    /// Merge one step's committed slice. Fields owned by other steps are untouched.
    pub fn merge(&mut self, data: StepData) {
        match data {
            StepData::Profile(p) => {
                self.name = p.name;
                self.email = p.email;
                self.phone = p.phone;
                self.country_of_residence = p.country_of_residence;
                self.been_to_africa_before = Some(p.been_to_africa_before);
                self.traveller_type = p.traveller_type;
                self.hear_about_us = p.hear_about_us;
                self.pioneer_traveller = p.pioneer_traveller;
                self.photo_url = p.photo_url;
            }
            StepData::Trip(t) => {
                self.start_date = Some(t.start_date);
                self.end_date = Some(t.end_date);
                self.experiences = t.experiences;
                self.companion = Some(t.companion);
                self.companion_count = t.companion_count;
                self.dream_words = t.dream_words;
                self.special_requirements = t.special_requirements;
            }
            StepData::Consent(c) => {
                self.keep_updated = c.keep_updated;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_ids_match_serde_names() {
        for t in TravellerType::ALL {
            assert_eq!(serde_json::to_value(t).unwrap(), t.as_id());
        }
        for e in Experience::ALL {
            assert_eq!(serde_json::to_value(e).unwrap(), e.as_id());
        }
        for c in Companion::ALL {
            assert_eq!(serde_json::to_value(c).unwrap(), c.as_id());
        }
        assert_eq!(
            serde_json::to_value(HearAboutUs::FriendOrFamily).unwrap(),
            "friend_or_family"
        );
    }

    #[test]
    fn group_size_lookup() {
        let sizes: Vec<u32> = Companion::ALL.iter().map(|c| c.group_size()).collect();
        assert_eq!(sizes, vec![1, 2, 4, 4]);
    }

    #[test]
    fn fallback_experiences_are_distinct() {
        let mut seen = std::collections::HashSet::new();
        for e in Experience::FALLBACK {
            assert!(seen.insert(e));
        }
        assert!(Experience::FALLBACK.len() >= 3);
    }

    #[test]
    fn merge_consent_leaves_profile_alone() {
        let mut record = WizardRecord {
            name: "Jo".to_string(),
            ..Default::default()
        };
        record.merge(StepData::Consent(ConsentSlice { keep_updated: true }));
        assert_eq!(record.name, "Jo");
        assert!(record.keep_updated);
    }
}
