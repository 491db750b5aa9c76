//! Additive lead quality score.

use serde::{Deserialize, Serialize};

pub const MAX_SCORE: u8 = 100;

/// Points awarded per present-and-valid field. The total is capped at [`MAX_SCORE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreWeights {
    #[serde(default = "default_name")]
    pub name: u8,
    #[serde(default = "default_contact")]
    pub phone: u8,
    #[serde(default = "default_contact")]
    pub email: u8,
    #[serde(default = "default_minor")]
    pub website: u8,
    #[serde(default = "default_minor")]
    pub city: u8,
}

fn default_name() -> u8 {
    20
}

fn default_contact() -> u8 {
    30
}

fn default_minor() -> u8 {
    10
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            name: default_name(),
            phone: default_contact(),
            email: default_contact(),
            website: default_minor(),
            city: default_minor(),
        }
    }
}

/// Which scored fields a candidate carries in valid form.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoreInputs {
    pub has_name: bool,
    pub phone_valid: bool,
    pub email_valid: bool,
    pub website_valid: bool,
    pub has_city: bool,
}

impl ScoreWeights {
    pub fn score(&self, inputs: ScoreInputs) -> u8 {
        let parts = [
            (inputs.has_name, self.name),
            (inputs.phone_valid, self.phone),
            (inputs.email_valid, self.email),
            (inputs.website_valid, self.website),
            (inputs.has_city, self.city),
        ];
        let total: u32 = parts
            .iter()
            .filter(|(present, _)| *present)
            .map(|(_, points)| u32::from(*points))
            .sum();
        total.min(u32::from(MAX_SCORE)) as u8
    }
}
