use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A wrapper for secrets (passwords, tokens) that masks its value in Debug and
/// Display output. Serialization passes the real value through.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Masked<T>(pub T);

impl<T> fmt::Debug for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "********")
    }
}

impl<T> fmt::Display for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "********")
    }
}

impl<T: Serialize> Serialize for Masked<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Masked<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        T::deserialize(deserializer).map(Masked)
    }
}

impl<T> Masked<T> {
    pub fn expose(&self) -> &T {
        &self.0
    }

    pub fn into_inner(self) -> T {
        self.0
    }
}

impl From<String> for Masked<String> {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Masked<String> {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_and_display_are_masked() {
        let secret = Masked::from("admin123");
        assert_eq!(format!("{:?}", secret), "********");
        assert_eq!(format!("{}", secret), "********");
        assert_eq!(secret.expose(), "admin123");
    }

    #[test]
    fn test_serde_is_transparent() {
        let secret: Masked<String> = serde_json::from_str("\"hunter2\"").unwrap();
        assert_eq!(secret.expose(), "hunter2");
        assert_eq!(serde_json::to_string(&secret).unwrap(), "\"hunter2\"");
    }
}
