//! OpenWeather reports air quality as a 1–5 category. This table maps each
//! category to a label and an approximate point on the US AQI scale.

/// One row of the air-quality scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AqiLevel {
    pub index: u8,
    pub label: &'static str,
    pub approx_aqi: u16,
}

/// Midpoints of the US AQI band each category roughly corresponds to.
pub static AQI_SCALE: [AqiLevel; 5] = [
    AqiLevel { index: 1, label: "Good", approx_aqi: 25 },
    AqiLevel { index: 2, label: "Fair", approx_aqi: 75 },
    AqiLevel { index: 3, label: "Moderate", approx_aqi: 125 },
    AqiLevel { index: 4, label: "Poor", approx_aqi: 175 },
    AqiLevel { index: 5, label: "Very Poor", approx_aqi: 250 },
];

pub fn lookup(index: u8) -> Option<&'static AqiLevel> {
    AQI_SCALE.iter().find(|level| level.index == index)
}

/// Sentence appended to the weather report.
pub fn describe(index: u8) -> String {
    match lookup(index) {
        Some(level) => format!(
            "Air quality: {} (index {}/5, approx. AQI {}).",
            level.label, level.index, level.approx_aqi
        ),
        None => format!("Air quality: Unknown (index {index})."),
    }
}
