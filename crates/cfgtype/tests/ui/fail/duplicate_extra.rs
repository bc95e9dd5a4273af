use cfgtype::{Config, ConfigMap};

#[derive(Config)]
struct Settings {
    name: String,
    #[config(extra)]
    extras: ConfigMap,
    #[config(extra)]
    more: ConfigMap,
}

fn main() {}
