//! Deterministic demo dataset served by the in-memory backend.

use models::provider::Provider;
use uuid::Uuid;

pub const SAMPLE_SIZE: usize = 40;

pub const SPECIALTIES: [&str; 6] = ["CBT", "Anxiety", "Depression", "Trauma", "Couples", "ADHD"];

const CITIES: [(&str, &str); 4] = [
    ("Austin", "TX"),
    ("Chicago", "IL"),
    ("New York", "NY"),
    ("Seattle", "WA"),
];

/// `Therapist 1` .. `Therapist 40`, cycling through four cities, each with
/// two to four distinct specialties.
pub fn sample_providers() -> Vec<Provider> {
    (0..SAMPLE_SIZE)
        .map(|i| {
            let (city, state) = CITIES[i % CITIES.len()];
            // Steps of 5 over 6 tags never repeat within four picks.
            let specialties = (0..2 + i % 3)
                .map(|k| SPECIALTIES[(i * 7 + k * 5) % SPECIALTIES.len()].to_string())
                .collect();
            Provider {
                id: Uuid::from_u128(0x5eed_0000 + i as u128).to_string(),
                name: format!("Therapist {}", i + 1),
                city: Some(city.to_string()),
                state: Some(state.to_string()),
                specialties,
            }
        })
        .collect()
}
