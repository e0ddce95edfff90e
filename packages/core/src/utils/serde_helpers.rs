use serde::{Deserialize, Deserializer};

/// Numbers coming from host editors are often strings ("0.5", "20", "").
#[derive(Deserialize)]
#[serde(untagged)]
enum NumberFormat {
    Number(f64),
    Text(String),
}

fn deserialize_lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<NumberFormat>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberFormat::Number(n)) => Ok(Some(n)),
        Some(NumberFormat::Text(s)) => {
            let s = s.trim();
            if s.is_empty() {
                return Ok(None);
            }
            s.parse::<f64>()
                .map(Some)
                .map_err(|_| serde::de::Error::custom(format!("'{s}' is not a number")))
        }
    }
}

/// Deserialize an optional `f32` from a number, a numeric string or an empty string
pub fn deserialize_lenient_f32<'de, D>(deserializer: D) -> Result<Option<f32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = deserialize_lenient_number(deserializer)?;
    match value {
        Some(n) if !n.is_finite() => Err(serde::de::Error::custom("expected a finite number")),
        other => Ok(other.map(|n| n as f32)),
    }
}

/// Deserialize an optional count from a number, a numeric string or an empty string
pub fn deserialize_lenient_usize<'de, D>(deserializer: D) -> Result<Option<usize>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = deserialize_lenient_number(deserializer)?;
    match value {
        None => Ok(None),
        Some(n) if n.is_finite() && n >= 0.0 && n.fract() == 0.0 => Ok(Some(n as usize)),
        Some(n) => Err(serde::de::Error::custom(format!(
            "expected a non-negative integer, got {n}"
        ))),
    }
}
