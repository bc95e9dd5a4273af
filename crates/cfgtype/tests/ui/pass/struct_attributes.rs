use cfgtype::{Config, ConfigMap, StringSource};

/// Connection settings.
#[derive(Debug, Clone, Config)]
#[config(rename_all = "kebab-case", description = "Overrides the doc comment.")]
struct Connection {
    host_name: String,
    #[config(alias = "portNumber", default = 5432, meta(unit = "port"))]
    port: u16,
    #[config(default, description = "Extra labels.")]
    labels: Vec<String>,
    password: Option<StringSource>,
    #[config(extra)]
    extras: ConfigMap,
}

#[derive(Debug, Clone, Config)]
#[config(resource)]
struct Client {
    connection: Connection,
    #[config(resource)]
    token: Option<String>,
}

fn main() {}
