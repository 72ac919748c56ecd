use serde::{Deserialize, Serialize};

/// The decode backend used to turn raw layer tensors into observations.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecoderType {
    #[default] Cpu,
    /// Whole per-cell decode, thresholding included, runs on the compute device.
    Parallel,
    /// Box decode runs on the compute device, class thresholding on the host.
    Hybrid,
}

// Hardcoded decoder names. Storing the "proper" spelling and the lowercase version.
const CPU: [&str; 2] = ["CPU", "cpu"];
const PARALLEL: [&str; 2] = ["Parallel", "parallel"];
const HYBRID: [&str; 2] = ["Hybrid", "hybrid"];

impl DecoderType {
    pub fn from_str(decoder: &str) -> Option<Self> {
        match decoder.to_lowercase().as_str() {
            "cpu" => Some(DecoderType::Cpu),
            "parallel" | "gpu" | "metal" => Some(DecoderType::Parallel),
            "hybrid" => Some(DecoderType::Hybrid),
            _ => None,
        }
    }

    pub fn str(&self) -> &'static str {
        match self {
            DecoderType::Cpu => CPU[0],
            DecoderType::Parallel => PARALLEL[0],
            DecoderType::Hybrid => HYBRID[0],
        }
    }

    pub fn str_lowercase(&self) -> &'static str {
        match self {
            DecoderType::Cpu => CPU[1],
            DecoderType::Parallel => PARALLEL[1],
            DecoderType::Hybrid => HYBRID[1],
        }
    }

    pub fn all_decoder_types() -> Vec<String> {
        vec![
            DecoderType::Cpu.str_lowercase().to_string(),
            DecoderType::Parallel.str_lowercase().to_string(),
            DecoderType::Hybrid.str_lowercase().to_string(),
        ]
    }

    pub fn is_valid_decoder_type(decoder: &str) -> bool {
        DecoderType::from_str(decoder).is_some()
    }
}

impl std::fmt::Display for DecoderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for name in DecoderType::all_decoder_types() {
            assert!(DecoderType::is_valid_decoder_type(&name));
            assert_eq!(DecoderType::from_str(&name).unwrap().str_lowercase(), name);
        }
        assert_eq!(DecoderType::from_str("Metal"), Some(DecoderType::Parallel));
        assert!(!DecoderType::is_valid_decoder_type("tensorrt"));
    }
}
