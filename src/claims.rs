//! Claim sets
//!
//! Claims keep insertion order and may repeat a type. On the wire a repeated
//! type becomes a JSON array placed where the type first appeared.

use serde_json::{Map, Value};

pub const SUBJECT: &str = "sub";
pub const UNIQUE_NAME: &str = "unique_name";
pub const ROLE: &str = "role";
pub const JWT_ID: &str = "jti";
pub const PATIENT_REFERENCE_ID: &str = "PatientReferenceId";

/// A single key/value fact in a token payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claim {
    pub claim_type: String,
    pub value: String,
}

impl Claim {
    pub fn new(claim_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            claim_type: claim_type.into(),
            value: value.into(),
        }
    }
}

/// Ordered claims, assembled once per issuance
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClaimSet {
    claims: Vec<Claim>,
}

impl ClaimSet {
    pub fn builder() -> ClaimSetBuilder {
        ClaimSetBuilder::default()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Claim> {
        self.claims.iter()
    }

    pub fn len(&self) -> usize {
        self.claims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }

    /// Values for a claim type, in insertion order
    pub fn values<'a>(&'a self, claim_type: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.claims
            .iter()
            .filter(move |c| c.claim_type == claim_type)
            .map(|c| c.value.as_str())
    }

    /// JSON object form used as the token payload
    pub fn to_json_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        for claim in &self.claims {
            let value = Value::String(claim.value.clone());
            match map.get_mut(&claim.claim_type) {
                None => {
                    map.insert(claim.claim_type.clone(), value);
                }
                Some(Value::Array(existing)) => existing.push(value),
                Some(existing) => {
                    let first = existing.take();
                    *existing = Value::Array(vec![first, value]);
                }
            }
        }
        map
    }
}

/// Builder for [`ClaimSet`]
#[derive(Debug, Default)]
pub struct ClaimSetBuilder {
    claims: Vec<Claim>,
}

impl ClaimSetBuilder {
    pub fn claim(mut self, claim_type: impl Into<String>, value: impl Into<String>) -> Self {
        self.claims.push(Claim::new(claim_type, value));
        self
    }

    pub fn claims<I, S>(mut self, claim_type: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.claims
            .extend(values.into_iter().map(|v| Claim::new(claim_type, v)));
        self
    }

    pub fn claim_if_some(self, claim_type: &str, value: Option<impl Into<String>>) -> Self {
        match value {
            Some(value) => self.claim(claim_type, value),
            None => self,
        }
    }

    pub fn build(self) -> ClaimSet {
        ClaimSet {
            claims: self.claims,
        }
    }
}
