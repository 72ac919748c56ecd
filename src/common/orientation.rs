use serde::{Deserialize, Serialize};

/// Physical orientation of the device when the frame was captured.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    #[default] Portrait,
    LandscapeLeft,
    LandscapeRight,
    UpsideDown,
}

// Storing the "proper" spelling and the lowercase version.
const PORTRAIT: [&str; 2] = ["Portrait", "portrait"];
const LANDSCAPE_LEFT: [&str; 2] = ["LandscapeLeft", "landscape_left"];
const LANDSCAPE_RIGHT: [&str; 2] = ["LandscapeRight", "landscape_right"];
const UPSIDE_DOWN: [&str; 2] = ["UpsideDown", "upside_down"];

impl Orientation {
    pub fn from_str(orientation: &str) -> Option<Self> {
        match orientation.to_lowercase().replace('-', "_").as_str() {
            "portrait" => Some(Orientation::Portrait),
            "landscape_left" | "landscapeleft" => Some(Orientation::LandscapeLeft),
            "landscape_right" | "landscaperight" => Some(Orientation::LandscapeRight),
            "upside_down" | "upsidedown" => Some(Orientation::UpsideDown),
            _ => None,
        }
    }

    pub fn str(&self) -> &'static str {
        self.names()[0]
    }

    pub fn str_lowercase(&self) -> &'static str {
        self.names()[1]
    }

    fn names(&self) -> [&'static str; 2] {
        match self {
            Orientation::Portrait => PORTRAIT,
            Orientation::LandscapeLeft => LANDSCAPE_LEFT,
            Orientation::LandscapeRight => LANDSCAPE_RIGHT,
            Orientation::UpsideDown => UPSIDE_DOWN,
        }
    }

    pub fn all_orientations() -> Vec<String> {
        [
            Orientation::Portrait,
            Orientation::LandscapeLeft,
            Orientation::LandscapeRight,
            Orientation::UpsideDown,
        ]
            .iter()
            .map(|o| o.str_lowercase().to_string())
            .collect()
    }
}

impl std::fmt::Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.str_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_printed_name() {
        for name in Orientation::all_orientations() {
            let orientation = Orientation::from_str(&name).unwrap();
            assert_eq!(orientation.to_string(), name);
        }
        assert_eq!(Orientation::from_str("Landscape-Left"), Some(Orientation::LandscapeLeft));
        assert_eq!(Orientation::from_str("sideways"), None);
    }
}
