#![allow(dead_code)]

use cfgtype::{Config, ConfigMap, StringSource, config_map_from_json};

/// Where the warehouse lives.
#[derive(Debug, Clone, PartialEq, Config)]
pub struct Database {
    /// Host name.
    pub host: String,
    #[config(default = 5432)]
    pub port: u16,
    pub password: StringSource,
    pub user: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Config)]
pub struct Cat {
    pub meows: i64,
}

#[derive(Debug, Clone, PartialEq, Config)]
pub struct Dog {
    pub barks: f64,
    #[config(default = "woof")]
    pub sound: String,
}

#[derive(Debug, Clone, PartialEq, Config)]
#[config(discriminator = "pet_type", rename_all = "lowercase")]
pub enum Pet {
    Cat(Cat),
    Dog(Dog),
}

#[derive(Debug, Clone, Copy, PartialEq, Config)]
#[config(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Level {
    Debug,
    Info,
    Warn,
}

#[derive(Debug, Clone, PartialEq, Config)]
pub struct Household {
    pub pet: Pet,
    #[config(alias = "backup_pet")]
    pub spare: Option<Pet>,
    pub level: Level,
    #[config(default)]
    pub tags: Vec<String>,
}

pub fn raw(value: serde_json::Value) -> ConfigMap {
    config_map_from_json(value)
}
