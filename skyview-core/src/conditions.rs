//! WMO weather code labels.
//! See: https://open-meteo.com/en/docs#weathervariables

pub const UNKNOWN_CONDITION: &str = "Unknown";

/// Translate a WMO weather code into a fixed English label.
pub fn translate(code: i32) -> &'static str {
    match code {
        0 => "Clear sky",
        1 => "Mainly clear",
        2 => "Partly cloudy",
        3 => "Overcast",
        45 => "Fog",
        48 => "Depositing rime fog",
        51 => "Light drizzle",
        53 => "Moderate drizzle",
        55 => "Dense drizzle",
        56 => "Light freezing drizzle",
        57 => "Dense freezing drizzle",
        61 => "Slight rain",
        63 => "Moderate rain",
        65 => "Heavy rain",
        66 => "Light freezing rain",
        67 => "Heavy freezing rain",
        71 => "Slight snow fall",
        73 => "Moderate snow fall",
        75 => "Heavy snow fall",
        77 => "Snow grains",
        80 => "Slight rain showers",
        81 => "Moderate rain showers",
        82 => "Violent rain showers",
        85 => "Slight snow showers",
        86 => "Heavy snow showers",
        95 => "Thunderstorm",
        96 => "Thunderstorm with slight hail",
        99 => "Thunderstorm with heavy hail",
        _ => UNKNOWN_CONDITION,
    }
}

/// Like [`translate`], for payload slots that may be missing.
pub fn translate_opt(code: Option<i32>) -> &'static str {
    code.map(translate).unwrap_or(UNKNOWN_CONDITION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes() {
        assert_eq!(translate(0), "Clear sky");
        assert_eq!(translate(3), "Overcast");
        assert_eq!(translate(61), "Slight rain");
        assert_eq!(translate(95), "Thunderstorm");
        assert_eq!(translate(99), "Thunderstorm with heavy hail");
    }

    #[test]
    fn every_table_code_has_a_label() {
        let codes = [
            0, 1, 2, 3, 45, 48, 51, 53, 55, 56, 57, 61, 63, 65, 66, 67, 71, 73, 75, 77, 80, 81,
            82, 85, 86, 95, 96, 99,
        ];
        for code in codes {
            assert_ne!(translate(code), UNKNOWN_CONDITION, "code {code}");
            assert_eq!(translate(code), translate(code));
        }
    }

    #[test]
    fn unmapped_codes_are_unknown() {
        assert_eq!(translate(4), "Unknown");
        assert_eq!(translate(100), "Unknown");
        assert_eq!(translate(-1), "Unknown");
        assert_eq!(translate_opt(None), "Unknown");
    }
}
