use crate::models::{Domain, PreferenceVector, ProfileSummary, TasteProfile};

/// Mood a genre outside every lookup table maps to
const UNIVERSAL_MOOD: &str = "Universal";

/// Maximum moods carried on a profile
const MOOD_CAP: usize = 3;

/// Intensity used when no genre in the vector has a mapped score
const NEUTRAL_INTENSITY: u8 = 5;

/// Genre to mood lookup, matched case-insensitively
const MUSIC_MOODS: &[(&str, &[&str])] = &[
    ("rock", &["Energetic", "Rebellious"]),
    ("metal", &["Intense"]),
    ("pop", &["Upbeat"]),
    ("jazz", &["Smooth", "Sophisticated"]),
    ("classical", &["Calm", "Refined"]),
    ("electronic", &["Vibrant"]),
    ("hip hop", &["Bold", "Confident"]),
    ("folk", &["Warm"]),
    ("blues", &["Soulful"]),
    ("country", &["Down-to-earth"]),
];

const FILM_MOODS: &[(&str, &[&str])] = &[
    ("action", &["Thrilling"]),
    ("drama", &["Emotional"]),
    ("comedy", &["Lighthearted"]),
    ("horror", &["Dark", "Tense"]),
    ("thriller", &["Suspenseful"]),
    ("sci-fi", &["Imaginative"]),
    ("romance", &["Tender"]),
    ("documentary", &["Curious"]),
    ("animation", &["Playful"]),
    ("fantasy", &["Whimsical"]),
];

/// Per-genre intensity scores on a 1-9 scale; unmapped genres are ignored
const MUSIC_INTENSITY: &[(&str, u8)] = &[
    ("metal", 9),
    ("rock", 7),
    ("electronic", 6),
    ("hip hop", 6),
    ("pop", 5),
    ("blues", 4),
    ("jazz", 4),
    ("country", 3),
    ("folk", 3),
    ("classical", 2),
];

const FILM_INTENSITY: &[(&str, u8)] = &[
    ("horror", 9),
    ("action", 8),
    ("thriller", 7),
    ("sci-fi", 6),
    ("drama", 5),
    ("fantasy", 5),
    ("documentary", 4),
    ("comedy", 3),
    ("romance", 3),
    ("animation", 2),
];

/// Builds the taste profile for one domain
///
/// `genres` and `secondary` are the aggregated vectors for the domain's genre
/// field and its secondary attribute (artists for music, cast for film).
/// Returns `None` when both vectors are empty, meaning the domain has no
/// signal at all yet.
pub fn profile_domain(
    domain: Domain,
    genres: &PreferenceVector,
    secondary: &PreferenceVector,
) -> Option<TasteProfile> {
    if genres.is_empty() && secondary.is_empty() {
        return None;
    }

    let genre_names: Vec<String> = genres.tokens.iter().map(|t| t.token.clone()).collect();
    let secondary_count = secondary.tokens.len();

    Some(TasteProfile {
        domain,
        moods: map_moods(domain, &genre_names),
        style: style_label(domain, &genre_names, secondary_count).to_string(),
        intensity: intensity(domain, &genre_names),
        variety: variety(genre_names.len(), secondary_count),
        genres: genre_names,
    })
}

/// Combines up to two domain profiles into a named, described summary
///
/// When both domains are fully absent there are no scores to compose from,
/// so a single generic message is returned instead of the templated text.
pub fn summarize(music: Option<TasteProfile>, film: Option<TasteProfile>) -> ProfileSummary {
    if music.is_none() && film.is_none() {
        return ProfileSummary {
            name: "Emerging Taste".to_string(),
            description: "Your taste profile is still taking shape. Rate a few more \
                          recommendations and check back soon."
                .to_string(),
            music: None,
            film: None,
        };
    }

    let present: Vec<&TasteProfile> = music.iter().chain(film.iter()).collect();

    let name = if present.iter().all(|p| p.intensity > 7) {
        "The Intensity Seeker"
    } else if present.iter().all(|p| p.variety > 7) {
        "The Explorer"
    } else if present.iter().all(|p| p.intensity < 4) {
        "The Contemplative"
    } else {
        "The Balanced Curator"
    };

    let mut sentences = Vec::new();
    if let Some(profile) = &music {
        sentences.push(domain_sentence(profile));
    }
    if let Some(profile) = &film {
        sentences.push(domain_sentence(profile));
    }

    ProfileSummary {
        name: name.to_string(),
        description: sentences.join(" "),
        music,
        film,
    }
}

fn domain_sentence(profile: &TasteProfile) -> String {
    let genres = if profile.genres.is_empty() {
        "a range of genres".to_string()
    } else {
        profile.genres.iter().take(3).cloned().collect::<Vec<_>>().join(", ")
    };
    let moods = profile.moods.join(", ").to_lowercase();

    match profile.domain {
        Domain::Music => format!(
            "In music you lean toward {genres}, giving your listening a {moods} feel ({}).",
            profile.style
        ),
        Domain::Film => format!(
            "On screen you favor {genres}, drawn to {moods} stories ({}).",
            profile.style
        ),
    }
}

/// Maps genres to moods in vector order, capped at three distinct moods
fn map_moods(domain: Domain, genres: &[String]) -> Vec<String> {
    let table = match domain {
        Domain::Music => MUSIC_MOODS,
        Domain::Film => FILM_MOODS,
    };

    let mut moods: Vec<String> = Vec::new();
    for genre in genres {
        let lookup = genre.to_lowercase();
        let mapped: &[&str] = table
            .iter()
            .find(|(name, _)| *name == lookup)
            .map(|(_, moods)| *moods)
            .unwrap_or(&[UNIVERSAL_MOOD]);

        for mood in mapped {
            if moods.len() >= MOOD_CAP {
                return moods;
            }
            if !moods.iter().any(|m| m == mood) {
                moods.push((*mood).to_string());
            }
        }
    }
    moods
}

/// Picks the style label from an ordered decision list
///
/// Rules are evaluated top to bottom and the first match wins; the order is
/// part of the contract, not an implementation detail.
fn style_label(domain: Domain, genres: &[String], secondary_count: usize) -> &'static str {
    let has = |name: &str| genres.iter().any(|g| g.eq_ignore_ascii_case(name));

    let rules: [(bool, &'static str); 4] = match domain {
        Domain::Music => [
            (has("rock") && has("metal"), "Headbanger"),
            (has("jazz") || has("classical"), "Connoisseur"),
            (secondary_count > 10, "Eclectic Listener"),
            (true, "Mainstream Listener"),
        ],
        Domain::Film => [
            (has("horror") && has("thriller"), "Edge-of-Seat Viewer"),
            (has("documentary") || has("drama"), "Serious Cinephile"),
            (secondary_count > 10, "Ensemble Explorer"),
            (true, "Casual Viewer"),
        ],
    };

    rules
        .iter()
        .find(|(matched, _)| *matched)
        .map(|(_, label)| *label)
        .unwrap_or("Casual Viewer")
}

/// Average mapped genre intensity rounded to the nearest integer
fn intensity(domain: Domain, genres: &[String]) -> u8 {
    let table = match domain {
        Domain::Music => MUSIC_INTENSITY,
        Domain::Film => FILM_INTENSITY,
    };

    let scores: Vec<u8> = genres
        .iter()
        .filter_map(|genre| {
            let lookup = genre.to_lowercase();
            table
                .iter()
                .find(|(name, _)| *name == lookup)
                .map(|(_, score)| *score)
        })
        .collect();

    if scores.is_empty() {
        return NEUTRAL_INTENSITY;
    }

    let sum: u32 = scores.iter().map(|s| u32::from(*s)).sum();
    (f64::from(sum) / scores.len() as f64).round() as u8
}

fn variety(genre_count: usize, secondary_count: usize) -> u8 {
    (genre_count.min(5) + secondary_count.min(5)) as u8
}
