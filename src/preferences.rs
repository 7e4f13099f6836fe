//! The expedition preference panel: seven independent settings that are
//! snapshotted on every turn and folded into the prompt.

use std::collections::BTreeSet;

use clap::ValueEnum;
use serde::Serialize;

/// A fixed set of labelled options, as shown in a select box or radio group.
pub trait Choice: Copy + Default + 'static {
    const ALL: &'static [Self];

    fn label(self) -> &'static str;

    fn from_label(label: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.label() == label)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum FocusTopic {
    #[default]
    #[value(name = "general")]
    GeneralPreparation,
    #[value(name = "clothing")]
    ClothingAndEquipment,
    #[value(name = "weather")]
    WeatherAndClimate,
    #[value(name = "safety")]
    SafetyAndEmergency,
    #[value(name = "nutrition")]
    NutritionAndHydration,
    #[value(name = "navigation")]
    NavigationAndRoutePlanning,
    #[value(name = "mental")]
    MentalReadinessAndTeamwork,
}

impl Choice for FocusTopic {
    const ALL: &'static [Self] = &[
        Self::GeneralPreparation,
        Self::ClothingAndEquipment,
        Self::WeatherAndClimate,
        Self::SafetyAndEmergency,
        Self::NutritionAndHydration,
        Self::NavigationAndRoutePlanning,
        Self::MentalReadinessAndTeamwork,
    ];

    fn label(self) -> &'static str {
        match self {
            Self::GeneralPreparation => "General Preparation",
            Self::ClothingAndEquipment => "Clothing & Equipment",
            Self::WeatherAndClimate => "Weather & Climate",
            Self::SafetyAndEmergency => "Safety & Emergency Tips",
            Self::NutritionAndHydration => "Nutrition & Hydration",
            Self::NavigationAndRoutePlanning => "Navigation & Route Planning",
            Self::MentalReadinessAndTeamwork => "Mental Readiness & Teamwork",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ExperienceLevel {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl Choice for ExperienceLevel {
    const ALL: &'static [Self] = &[Self::Beginner, Self::Intermediate, Self::Advanced];

    fn label(self) -> &'static str {
        match self {
            Self::Beginner => "Beginner",
            Self::Intermediate => "Intermediate",
            Self::Advanced => "Advanced",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum Season {
    #[default]
    #[value(name = "dry")]
    Dry,
    #[value(name = "rainy")]
    Rainy,
    #[value(name = "winter")]
    WinterHighAltitude,
    #[value(name = "all-year")]
    AllYear,
}

impl Choice for Season {
    const ALL: &'static [Self] = &[Self::Dry, Self::Rainy, Self::WinterHighAltitude, Self::AllYear];

    fn label(self) -> &'static str {
        match self {
            Self::Dry => "Dry season",
            Self::Rainy => "Rainy season",
            Self::WinterHighAltitude => "Winter (High altitude)",
            Self::AllYear => "All year",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ResponseStyle {
    #[default]
    #[value(name = "short")]
    ShortAndPractical,
    #[value(name = "detailed")]
    DetailedAndEducational,
    #[value(name = "casual")]
    CasualAndFriendly,
}

impl Choice for ResponseStyle {
    const ALL: &'static [Self] = &[
        Self::ShortAndPractical,
        Self::DetailedAndEducational,
        Self::CasualAndFriendly,
    ];

    fn label(self) -> &'static str {
        match self {
            Self::ShortAndPractical => "Short & Practical",
            Self::DetailedAndEducational => "Detailed & Educational",
            Self::CasualAndFriendly => "Casual & Friendly",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ResponseLanguage {
    #[default]
    #[value(name = "en")]
    English,
    #[value(name = "id")]
    BahasaIndonesia,
}

impl Choice for ResponseLanguage {
    const ALL: &'static [Self] = &[Self::English, Self::BahasaIndonesia];

    fn label(self) -> &'static str {
        match self {
            Self::English => "English",
            Self::BahasaIndonesia => "Bahasa Indonesia",
        }
    }
}

/// Items of the equipment checklist. Declaration order is checklist order,
/// which `Ord` (and therefore [`GearChecklist`] iteration) follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, ValueEnum)]
pub enum GearItem {
    Tent,
    SleepingBag,
    HikingBoots,
    CookingGear,
    FirstAidKit,
    #[value(name = "navigation-tools")]
    NavigationTools,
}

impl GearItem {
    pub const ALL: [Self; 6] = [
        Self::Tent,
        Self::SleepingBag,
        Self::HikingBoots,
        Self::CookingGear,
        Self::FirstAidKit,
        Self::NavigationTools,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Tent => "Tent",
            Self::SleepingBag => "Sleeping bag",
            Self::HikingBoots => "Hiking boots",
            Self::CookingGear => "Cooking gear",
            Self::FirstAidKit => "First aid kit",
            Self::NavigationTools => "Navigation tools (map/compass/GPS)",
        }
    }

    /// Whether the checkbox starts out ticked on a fresh panel.
    pub const fn checked_by_default(self) -> bool {
        matches!(self, Self::Tent | Self::HikingBoots | Self::FirstAidKit)
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|g| g.label() == label)
    }
}

/// The set of ticked checklist items.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GearChecklist(BTreeSet<GearItem>);

impl GearChecklist {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_defaults() -> Self {
        GearItem::ALL
            .into_iter()
            .filter(|g| g.checked_by_default())
            .collect()
    }

    pub fn set(&mut self, item: GearItem, checked: bool) {
        if checked {
            self.0.insert(item);
        } else {
            self.0.remove(&item);
        }
    }

    pub fn is_checked(&self, item: GearItem) -> bool {
        self.0.contains(&item)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Checked items in checklist order.
    pub fn checked(&self) -> impl Iterator<Item = GearItem> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<GearItem> for GearChecklist {
    fn from_iter<I: IntoIterator<Item = GearItem>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Snapshot of the preference panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preferences {
    pub focus_topic: FocusTopic,
    pub experience_level: ExperienceLevel,
    pub mountain_name: Option<String>,
    pub season: Season,
    pub gear: GearChecklist,
    pub response_style: ResponseStyle,
    pub response_language: ResponseLanguage,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            focus_topic: FocusTopic::default(),
            experience_level: ExperienceLevel::default(),
            mountain_name: None,
            season: Season::default(),
            gear: GearChecklist::with_defaults(),
            response_style: ResponseStyle::default(),
            response_language: ResponseLanguage::default(),
        }
    }
}

impl Preferences {
    /// Stores a mountain name, treating blank input as "not given".
    pub fn set_mountain_name(&mut self, name: &str) {
        self.mountain_name = (!name.trim().is_empty()).then(|| name.to_string());
    }

    /// Reads the panel from submitted form fields (`name=value` pairs, `gear`
    /// repeated once per ticked box). Unknown or missing select values fall
    /// back to their defaults; an absent `gear` field means nothing is ticked.
    pub fn from_form(fields: &[(String, String)]) -> Self {
        let mut prefs = Self {
            gear: GearChecklist::empty(),
            ..Self::default()
        };
        for (name, value) in fields {
            match name.as_str() {
                "focus_topic" => prefs.focus_topic = FocusTopic::from_label(value).unwrap_or_default(),
                "experience_level" => {
                    prefs.experience_level = ExperienceLevel::from_label(value).unwrap_or_default();
                }
                "mountain_name" => prefs.set_mountain_name(value),
                "season" => prefs.season = Season::from_label(value).unwrap_or_default(),
                "gear" => {
                    if let Some(item) = GearItem::from_label(value) {
                        prefs.gear.set(item, true);
                    }
                }
                "response_style" => prefs.response_style = ResponseStyle::from_label(value).unwrap_or_default(),
                "response_language" => {
                    prefs.response_language = ResponseLanguage::from_label(value).unwrap_or_default();
                }
                _ => {}
            }
        }
        prefs
    }

    /// Template-facing view of every control with its options and current selection.
    pub fn panel_view(&self) -> PanelView {
        PanelView {
            focus_topic: options(self.focus_topic),
            experience_level: options(self.experience_level),
            mountain_name: self.mountain_name.clone().unwrap_or_default(),
            season: options(self.season),
            gear: GearItem::ALL
                .into_iter()
                .map(|g| OptionView {
                    label: g.label(),
                    selected: self.gear.is_checked(g),
                })
                .collect(),
            response_style: options(self.response_style),
            response_language: options(self.response_language),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OptionView {
    pub label: &'static str,
    pub selected: bool,
}

#[derive(Debug, Serialize)]
pub struct PanelView {
    pub focus_topic: Vec<OptionView>,
    pub experience_level: Vec<OptionView>,
    pub mountain_name: String,
    pub season: Vec<OptionView>,
    pub gear: Vec<OptionView>,
    pub response_style: Vec<OptionView>,
    pub response_language: Vec<OptionView>,
}

fn options<C: Choice + PartialEq>(current: C) -> Vec<OptionView> {
    C::ALL
        .iter()
        .map(|&c| OptionView {
            label: c.label(),
            selected: c == current,
        })
        .collect()
}
