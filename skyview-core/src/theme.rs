use serde::{Deserialize, Serialize};

/// Palette identifier consumed by the rendering layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ThemeId {
    Sunny,
    Rainy,
    Stormy,
    Cloudy,
    Snowy,
    Foggy,
    Night,
}

impl ThemeId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThemeId::Sunny => "sunny",
            ThemeId::Rainy => "rainy",
            ThemeId::Stormy => "stormy",
            ThemeId::Cloudy => "cloudy",
            ThemeId::Snowy => "snowy",
            ThemeId::Foggy => "foggy",
            ThemeId::Night => "night",
        }
    }
}

impl std::fmt::Display for ThemeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// Checked in order; first match wins.
const CONDITION_THEMES: &[(&[&str], ThemeId)] = &[
    (&["rain", "drizzle"], ThemeId::Rainy),
    (&["storm", "thunder"], ThemeId::Stormy),
    (&["cloud", "overcast"], ThemeId::Cloudy),
    (&["snow", "ice"], ThemeId::Snowy),
    (&["fog", "mist"], ThemeId::Foggy),
];

/// Pick the palette for a condition label. Night overrides every condition.
pub fn derive(condition: &str, is_night: bool) -> ThemeId {
    if is_night {
        return ThemeId::Night;
    }

    let lower = condition.to_lowercase();
    CONDITION_THEMES
        .iter()
        .find(|(needles, _)| needles.iter().any(|n| lower.contains(n)))
        .map(|(_, theme)| *theme)
        .unwrap_or(ThemeId::Sunny)
}

/// Wall-clock night: before 06:00 or after 20:59.
pub fn is_night_hour(hour: u32) -> bool {
    hour < 6 || hour > 20
}
