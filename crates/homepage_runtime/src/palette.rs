//! Deterministic colors and icons for windows.

use crate::model::{WindowRecord, DEFAULT_HEADER_COLOR};

/// Hash fallback palette for folders that match no keyword.
pub const HASH_HEADER_COLORS: [&str; 6] = [
    "header-color-1",
    "header-color-2",
    "header-color-3",
    "header-color-4",
    "header-color-5",
    "header-color-6",
];

/// Body color rotation for windows.
pub const WINDOW_COLORS: [&str; 6] = [
    "window-color-1",
    "window-color-2",
    "window-color-3",
    "window-color-4",
    "window-color-5",
    "window-color-6",
];

// Checked in order; the first hit wins for substring matches.
const CATEGORY_KEYWORDS: &[(&str, &str)] = &[
    ("desarrollo", "header-color-development"),
    ("development", "header-color-development"),
    ("programming", "header-color-development"),
    ("coding", "header-color-development"),
    ("github", "header-color-development"),
    ("code", "header-color-development"),
    ("trabajo", "header-color-work"),
    ("work", "header-color-work"),
    ("office", "header-color-work"),
    ("business", "header-color-work"),
    ("empresa", "header-color-work"),
    ("social", "header-color-social"),
    ("redes", "header-color-social"),
    ("facebook", "header-color-social"),
    ("twitter", "header-color-social"),
    ("instagram", "header-color-social"),
    ("entretenimiento", "header-color-entertainment"),
    ("entertainment", "header-color-entertainment"),
    ("peliculas", "header-color-entertainment"),
    ("movies", "header-color-entertainment"),
    ("series", "header-color-entertainment"),
    ("youtube", "header-color-entertainment"),
    ("netflix", "header-color-entertainment"),
    ("gaming", "header-color-entertainment"),
    ("juegos", "header-color-entertainment"),
    ("compras", "header-color-shopping"),
    ("shopping", "header-color-shopping"),
    ("amazon", "header-color-shopping"),
    ("tienda", "header-color-shopping"),
    ("store", "header-color-shopping"),
    ("referencia", "header-color-reference"),
    ("reference", "header-color-reference"),
    ("docs", "header-color-reference"),
    ("documentation", "header-color-reference"),
    ("wiki", "header-color-reference"),
    ("wikipedia", "header-color-reference"),
    ("noticias", "header-color-news"),
    ("news", "header-color-news"),
    ("periodicos", "header-color-news"),
    ("newspapers", "header-color-news"),
    ("herramientas", "header-color-tools"),
    ("tools", "header-color-tools"),
    ("utilities", "header-color-tools"),
    ("utilidades", "header-color-tools"),
    ("diseño", "header-color-design"),
    ("design", "header-color-design"),
    ("graphics", "header-color-design"),
    ("creative", "header-color-design"),
    ("educacion", "header-color-education"),
    ("education", "header-color-education"),
    ("learning", "header-color-education"),
    ("courses", "header-color-education"),
    ("study", "header-color-education"),
];

const FOLDER_ICONS: &[(&str, &str)] = &[
    ("desarrollo", "💻"),
    ("development", "💻"),
    ("programming", "💻"),
    ("code", "🧑‍💻"),
    ("github", "🐙"),
    ("projects", "🔧"),
    ("trabajo", "💼"),
    ("work", "💼"),
    ("office", "🏢"),
    ("business", "💼"),
    ("empresa", "🏢"),
    ("entretenimiento", "🎬"),
    ("entertainment", "🎬"),
    ("movies", "🎬"),
    ("peliculas", "🎬"),
    ("gaming", "🎮"),
    ("juegos", "🎮"),
    ("youtube", "▶️"),
    ("netflix", "🎥"),
    ("social", "👥"),
    ("redes", "📱"),
    ("facebook", "📘"),
    ("twitter", "🐦"),
    ("instagram", "📷"),
    ("compras", "🛒"),
    ("shopping", "🛒"),
    ("amazon", "📦"),
    ("noticias", "📰"),
    ("news", "📰"),
    ("educacion", "🎓"),
    ("education", "🎓"),
    ("docs", "📚"),
    ("documentation", "📖"),
    ("herramientas", "🔨"),
    ("tools", "⚙️"),
    ("utilities", "🛠️"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorOption {
    pub name: &'static str,
    pub class: &'static str,
    pub swatch: &'static str,
}

const COLOR_OPTIONS: [ColorOption; 11] = [
    ColorOption {
        name: "Development",
        class: "header-color-development",
        swatch: "#2196F3",
    },
    ColorOption {
        name: "Work",
        class: "header-color-work",
        swatch: "#FF9800",
    },
    ColorOption {
        name: "Social",
        class: "header-color-social",
        swatch: "#E91E63",
    },
    ColorOption {
        name: "Entertainment",
        class: "header-color-entertainment",
        swatch: "#9C27B0",
    },
    ColorOption {
        name: "Shopping",
        class: "header-color-shopping",
        swatch: "#FF5722",
    },
    ColorOption {
        name: "Reference",
        class: "header-color-reference",
        swatch: "#607D8B",
    },
    ColorOption {
        name: "News",
        class: "header-color-news",
        swatch: "#795548",
    },
    ColorOption {
        name: "Tools",
        class: "header-color-tools",
        swatch: "#009688",
    },
    ColorOption {
        name: "Design",
        class: "header-color-design",
        swatch: "#CDDC39",
    },
    ColorOption {
        name: "Education",
        class: "header-color-education",
        swatch: "#3F51B5",
    },
    ColorOption {
        name: "Default",
        class: DEFAULT_HEADER_COLOR,
        swatch: "#4CAF50",
    },
];

/// Options offered by the header color picker.
pub fn color_options() -> &'static [ColorOption] {
    &COLOR_OPTIONS
}

/// Whether `class` is a header color the UI knows how to paint.
pub fn is_header_color(class: &str) -> bool {
    COLOR_OPTIONS.iter().any(|option| option.class == class) || HASH_HEADER_COLORS.contains(&class)
}

/// Header color for a folder name.
///
/// The name is lowercased and trimmed, then matched against the keyword table exactly and
/// then by substring in either direction. Names with no match fall back to a hash of the
/// name, so a folder keeps its color across sessions.
pub fn color_for_folder(name: &str) -> &'static str {
    let normalized = name.trim().to_lowercase();
    if normalized.is_empty() {
        return DEFAULT_HEADER_COLOR;
    }
    if let Some((_, class)) = CATEGORY_KEYWORDS.iter().find(|(kw, _)| *kw == normalized) {
        return class;
    }
    if let Some((_, class)) = CATEGORY_KEYWORDS
        .iter()
        .find(|(kw, _)| normalized.contains(kw) || kw.contains(normalized.as_str()))
    {
        return class;
    }
    hash_color(&normalized)
}

/// Palette pick from a 32-bit rolling hash (`h * 31 + unit`) over UTF-16 code units.
pub fn hash_color(name: &str) -> &'static str {
    let hash = name.encode_utf16().fold(0i32, |hash, unit| {
        (hash << 5).wrapping_sub(hash).wrapping_add(i32::from(unit))
    });
    let index = (hash.unsigned_abs() % HASH_HEADER_COLORS.len() as u32) as usize;
    HASH_HEADER_COLORS[index]
}

/// First body color not used by any window, or a rotation by window count.
pub fn next_window_color(windows: &[WindowRecord]) -> &'static str {
    WINDOW_COLORS
        .iter()
        .find(|color| {
            !windows
                .iter()
                .any(|w| w.color_class.as_deref() == Some(**color))
        })
        .copied()
        .unwrap_or(WINDOW_COLORS[windows.len() % WINDOW_COLORS.len()])
}

/// Emoji shown before a folder title. Path-like names get a sub-folder marker.
pub fn folder_icon(name: &str) -> String {
    if name.trim().is_empty() {
        return "📁".to_string();
    }
    let normalized = name.trim().to_lowercase();
    let nested = is_subfolder_name(name, &normalized);
    match FOLDER_ICONS
        .iter()
        .find(|(kw, _)| normalized.contains(kw) || kw.contains(normalized.as_str()))
    {
        Some((_, icon)) if nested => format!("{icon}📂"),
        Some((_, icon)) => (*icon).to_string(),
        None if nested => "📂".to_string(),
        None => "📁".to_string(),
    }
}

fn is_subfolder_name(raw: &str, normalized: &str) -> bool {
    const SEPARATORS: [&str; 5] = ["/", "\\", " - ", " > ", "::"];
    SEPARATORS.iter().any(|sep| raw.contains(sep))
        || raw.split_whitespace().take(3).count() == 3
        || normalized.contains("subfolder")
        || normalized.contains("subcarpeta")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_matches_are_exact_then_substring() {
        assert_eq!(color_for_folder("Development"), "header-color-development");
        assert_eq!(color_for_folder("  WORK  "), "header-color-work");
        assert_eq!(color_for_folder("My GitHub stars"), "header-color-development");
        assert_eq!(color_for_folder("wik"), "header-color-reference");
    }

    #[test]
    fn unmatched_names_use_stable_hash_palette() {
        let first = color_for_folder("Zzyzx");
        assert!(HASH_HEADER_COLORS.contains(&first));
        assert_eq!(color_for_folder("Zzyzx"), first);
        assert_eq!(color_for_folder("zzyzx"), first);
        assert_eq!(color_for_folder(""), DEFAULT_HEADER_COLOR);
    }

    #[test]
    fn hash_matches_reference_values() {
        // "a" = 97 -> 97 % 6 = 1; "ab" = 97 * 31 + 98 = 3105 -> 3105 % 6 = 3
        assert_eq!(hash_color("a"), "header-color-2");
        assert_eq!(hash_color("ab"), "header-color-4");
    }

    #[test]
    fn folder_icons_mark_nested_names() {
        assert_eq!(folder_icon("Development"), "💻");
        assert_eq!(folder_icon("Work / Clients"), "💼📂");
        assert_eq!(folder_icon("Qwerty"), "📁");
        assert_eq!(folder_icon("Qwerty::Asdf"), "📂");
        assert_eq!(folder_icon(""), "📁");
    }

    #[test]
    fn header_color_membership() {
        assert!(is_header_color("header-color-news"));
        assert!(is_header_color("header-color-3"));
        assert!(!is_header_color("header-color-evil"));
    }
}
